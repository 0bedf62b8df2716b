use core::fmt;
use core::str::FromStr;

/// How loudly a diagnostic is reported. `Error` aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Suppressed entirely.
    None,
    Hint,
    Suggestion,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::None => write!(f, "none"),
            Severity::Hint => write!(f, "hint"),
            Severity::Suggestion => write!(f, "suggestion"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Severity::None),
            "hint" => Ok(Severity::Hint),
            "suggestion" => Ok(Severity::Suggestion),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

macro_rules! diagnostic_kinds {
    ($($kind:ident = $code:literal, $severity:ident, $template:literal;)*) => {
        /// Every condition the parser, interpreter and analysis passes can
        /// report.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum DiagnosticKind {
            $($kind,)*
        }

        impl DiagnosticKind {
            pub const ALL: &'static [DiagnosticKind] = &[$(DiagnosticKind::$kind,)*];

            /// Stable code used in configuration files and output.
            pub fn code(self) -> &'static str {
                match self {
                    $(DiagnosticKind::$kind => $code,)*
                }
            }

            pub fn default_severity(self) -> Severity {
                match self {
                    $(DiagnosticKind::$kind => Severity::$severity,)*
                }
            }

            pub fn default_template(self) -> &'static str {
                match self {
                    $(DiagnosticKind::$kind => $template,)*
                }
            }

            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some(DiagnosticKind::$kind),)*
                    _ => None,
                }
            }
        }
    };
}

diagnostic_kinds! {
    ExpectedIdentifier = "P001", Warning, "expected identifier after '.', found {0}";
    UnknownOperator = "P002", Warning, "unknown operator '{0}'";
    InvalidStructMember = "P003", Warning, "struct members must be 'var' declarations or imports, found {0}";
    UnterminatedString = "P004", Warning, "unterminated string literal \"{0}\"";
    DanglingAttribute = "P005", Warning, "attribute {0} is not followed by an expression";
    MissingDefault = "P006", Warning, "parameter {0} needs a default value because an earlier parameter has one";
    ExpectedToken = "P007", Warning, "expected {0}, found {1}";
    UnexpectedCharacter = "P008", Warning, "unexpected character '{0}'";
    UnterminatedComment = "P009", Warning, "unterminated block comment";
    InvalidCharLiteral = "P010", Warning, "invalid character literal {0}";
    ExpectedType = "P011", Warning, "{0} is not a type expression";
    MisplacedReceiver = "P012", Warning, "receiver parameter {0} must be the last parameter";
    ImplicitVariable = "E001", Warning, "implicit variable {0}";
    NoEffect = "E002", Hint, "expression {0} has no effect";
    NotEnoughArguments = "E003", Warning, "not enough arguments in call {0}: missing parameter {1}";
    TooManyArguments = "E004", Warning, "too many arguments in call {0}: expected at most {1}";
    NonBooleanCondition = "E005", Warning, "condition {0} is not a boolean";
    ImportOutsideConstruction = "E006", Warning, "import {0} has no construction target";
    ImportNotRecord = "E007", Warning, "import {0} does not refer to a record instance";
    ImportUninstantiated = "E008", Warning, "import {0} refers to an uninstantiated struct";
    UnsupportedStatement = "E009", Warning, "{0} is not supported by the interpreter";
    AssertionFailed = "E010", Error, "assertion {0} failed";
    AssumptionViolated = "E011", Warning, "assumption {0} does not hold";
    NotIterable = "E012", Warning, "foreach over {0}, which is not an array";
    UnresolvedIdentifier = "R001", Hint, "{0} is not declared in any enclosing scope";
    TypeMismatch = "T001", Warning, "{0} is declared as {1} but initialised with {2}";
    NonBooleanTest = "T002", Hint, "condition {0} has type {1}";
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique_and_round_trip() {
        let mut codes: Vec<&str> = DiagnosticKind::ALL.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), DiagnosticKind::ALL.len());

        for kind in DiagnosticKind::ALL {
            assert_eq!(DiagnosticKind::from_code(kind.code()), Some(*kind));
        }
        assert_eq!(DiagnosticKind::from_code("X999"), None);
    }

    #[test]
    fn test_severity_parsing_ignores_case() {
        assert_eq!("Warning".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("ERROR".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("none".parse::<Severity>(), Ok(Severity::None));
        assert!("fatal".parse::<Severity>().is_err());
        assert!(Severity::Hint < Severity::Error);
    }
}
