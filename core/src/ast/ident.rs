/// What an identifier names, decided once from its first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentCategory {
    /// Starts with a lower-case letter or `_`.
    Value,
    /// Starts with an upper-case letter.
    Type,
    /// Starts with `@`.
    Attribute,
    /// Anything else: `+`, `==`, `.` and friends.
    Operator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ident<'a> {
    pub name: &'a str,
    pub category: IdentCategory,
}

impl<'a> Ident<'a> {
    pub fn new(name: &'a str) -> Self {
        let category = match name.chars().next() {
            Some(c) if c.is_lowercase() || c == '_' => IdentCategory::Value,
            Some(c) if c.is_uppercase() => IdentCategory::Type,
            Some('@') => IdentCategory::Attribute,
            _ => IdentCategory::Operator,
        };
        Self { name, category }
    }

    pub fn is_operator(&self) -> bool {
        self.category == IdentCategory::Operator
    }

    /// Name of a builtin if this identifier uses the reserved `__` prefix.
    pub fn builtin_name(&self) -> Option<&'a str> {
        self.name.strip_prefix("__").filter(|rest| !rest.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(Ident::new("x").category, IdentCategory::Value);
        assert_eq!(Ident::new("_tmp").category, IdentCategory::Value);
        assert_eq!(Ident::new("Point").category, IdentCategory::Type);
        assert_eq!(Ident::new("@inline").category, IdentCategory::Attribute);
        assert_eq!(Ident::new("+").category, IdentCategory::Operator);
        assert_eq!(Ident::new("==").category, IdentCategory::Operator);
    }

    #[test]
    fn test_builtin_prefix() {
        assert_eq!(Ident::new("__plus").builtin_name(), Some("plus"));
        assert_eq!(Ident::new("plus").builtin_name(), None);
        assert_eq!(Ident::new("__").builtin_name(), None);
    }
}
