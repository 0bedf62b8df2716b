use hashbrown::HashMap;
use lazy_static::lazy_static;

/// Characters an operator is made of. Operators are read with maximal munch.
pub const OPERATOR_CHARS: &str = "+-*/%<>=!&|^:.~?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    pub prec: u8,
    pub assoc: Assoc,
}

pub const PREC_ASSIGN: u8 = 10;
pub const PREC_ASCRIPTION: u8 = 90;
pub const PREC_DOT: u8 = 100;

/// Precedence of an operator missing from the table.
pub const UNKNOWN: OpInfo = OpInfo {
    prec: 0,
    assoc: Assoc::Left,
};

lazy_static! {
    // Note: precedence is listed lowest to highest.
    static ref OPERATORS: HashMap<&'static str, OpInfo> = {
        use Assoc::*;
        let table: &[(&[&str], u8, Assoc)] = &[
            (&["=", "+=", "-=", "*=", "/=", "%="], PREC_ASSIGN, Right),
            (&["->"], 15, Right),
            (&["||"], 20, Left),
            (&["&&"], 25, Left),
            (&["|"], 31, Left),
            (&["^"], 33, Left),
            (&["&"], 35, Left),
            (&["==", "!="], 40, Left),
            (&["<", "<=", ">", ">="], 50, Left),
            (&["<<", ">>"], 60, Left),
            (&["+", "-"], 70, Left),
            (&["*", "/", "%"], 80, Left),
            (&[":"], PREC_ASCRIPTION, Right),
            (&["."], PREC_DOT, Left),
        ];
        table
            .iter()
            .flat_map(|(ops, prec, assoc)| {
                ops.iter().map(move |op| (*op, OpInfo { prec: *prec, assoc: *assoc }))
            })
            .collect()
    };
}

/// Precedence and associativity of a known operator.
pub fn lookup(op: &str) -> Option<OpInfo> {
    OPERATORS.get(op).copied()
}

/// For `a op= b`, the operator applied before assigning.
pub fn compound_base(op: &str) -> Option<&str> {
    match op {
        "+=" | "-=" | "*=" | "/=" | "%=" => op.strip_suffix('='),
        _ => None,
    }
}

pub fn is_operator_char(c: char) -> bool {
    OPERATOR_CHARS.contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table() {
        assert_eq!(lookup(".").unwrap().prec, PREC_DOT);
        assert_eq!(lookup(":").unwrap().assoc, Assoc::Right);
        assert_eq!(lookup("-=").unwrap().assoc, Assoc::Right);
        assert!(lookup("*").unwrap().prec > lookup("+").unwrap().prec);
        assert!(lookup("&&").unwrap().prec > lookup("||").unwrap().prec);
        assert_eq!(lookup("=>"), None);
        assert_eq!(lookup("<=>"), None);
    }

    #[test]
    fn test_compound_base() {
        assert_eq!(compound_base("+="), Some("+"));
        assert_eq!(compound_base("=="), None);
        assert_eq!(compound_base("<="), None);
    }
}
