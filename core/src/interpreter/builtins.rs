//! Primitive operations reachable from source code through `__name(...)`.
//!
//! Builtins sit below the prelude: `var + = fn a, b => __plus(a, b)` is how
//! user code gets arithmetic. Every builtin has a fixed signature that the
//! interpreter checks before dispatch and that the type pass reads.

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use super::{Interpreter, RunError, Value};
use crate::ast::{SimpleType, TypeExpr};

/// Native implementation of a builtin. Arguments are already checked for
/// count and contain no error placeholders.
pub type Native =
    for<'a, 'r> fn(&mut Interpreter<'a, 'r>, &[Value<'a>]) -> Result<Value<'a>, RunError>;

pub struct Builtin {
    /// Name without the `__` prefix.
    pub name: &'static str,
    pub params: &'static [TypeExpr<'static>],
    pub ret: TypeExpr<'static>,
    native: Native,
}

const VOID: TypeExpr<'static> = TypeExpr::Simple(SimpleType::Void);
const ANY: TypeExpr<'static> = TypeExpr::Simple(SimpleType::Any);
const INT: TypeExpr<'static> = TypeExpr::Simple(SimpleType::Int);
const BOOL: TypeExpr<'static> = TypeExpr::Simple(SimpleType::Bool);
const ARRAY: TypeExpr<'static> = TypeExpr::Array(&ANY);

pub static BUILTINS: &[Builtin] = &[
    Builtin { name: "plus", params: &[INT, INT], ret: INT, native: plus },
    Builtin { name: "minus", params: &[INT, INT], ret: INT, native: minus },
    Builtin { name: "multiply", params: &[INT, INT], ret: INT, native: multiply },
    Builtin { name: "less", params: &[INT, INT], ret: BOOL, native: less },
    Builtin { name: "equals", params: &[ANY, ANY], ret: BOOL, native: equals },
    Builtin { name: "and", params: &[BOOL, BOOL], ret: BOOL, native: and },
    Builtin { name: "or", params: &[BOOL, BOOL], ret: BOOL, native: or },
    Builtin { name: "rest", params: &[ARRAY], ret: ARRAY, native: rest },
    Builtin { name: "at", params: &[ARRAY, INT], ret: ANY, native: at },
    Builtin { name: "add", params: &[ARRAY, ANY], ret: ARRAY, native: add },
    Builtin { name: "length", params: &[ARRAY], ret: INT, native: length },
    Builtin { name: "env", params: &[ANY], ret: VOID, native: env },
    Builtin { name: "print", params: &[ANY], ret: VOID, native: print },
];

/// Looks up a builtin by its name without the `__` prefix.
pub fn signature(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

/// Dispatches `__name(args)`.
pub(crate) fn call<'a>(
    interp: &mut Interpreter<'a, '_>,
    name: &str,
    args: Vec<Value<'a>>,
) -> Result<Value<'a>, RunError> {
    let builtin = signature(name).ok_or_else(|| RunError::UnknownBuiltin(name.to_string()))?;
    if args.len() != builtin.params.len() {
        return Err(RunError::builtin(
            name,
            format!(
                "expected {} argument(s), found {}",
                builtin.params.len(),
                args.len()
            ),
        ));
    }
    if let Some(placeholder) = args.iter().find(|arg| arg.is_error()) {
        return Ok(placeholder.clone());
    }
    tracing::trace!(builtin = name, "calling builtin");
    (builtin.native)(interp, &args)
}

fn mismatch(name: &str, expected: &str, found: &Value<'_>) -> RunError {
    RunError::builtin(name, format!("expected {expected}, found {}", found.kind_name()))
}

fn int_arg<'v>(name: &str, value: &'v Value<'_>) -> Result<&'v BigInt, RunError> {
    value.as_int().ok_or_else(|| mismatch(name, "Int", value))
}

fn bool_arg(name: &str, value: &Value<'_>) -> Result<bool, RunError> {
    value.as_bool().ok_or_else(|| mismatch(name, "Bool", value))
}

fn array_arg<'v, 'a>(name: &str, value: &'v Value<'a>) -> Result<&'v [Value<'a>], RunError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(mismatch(name, "an array", other)),
    }
}

// ============================================================================
// Arithmetic and comparison
// ============================================================================

fn plus<'a>(_: &mut Interpreter<'a, '_>, args: &[Value<'a>]) -> Result<Value<'a>, RunError> {
    Ok(Value::Int(int_arg("plus", &args[0])? + int_arg("plus", &args[1])?))
}

fn minus<'a>(_: &mut Interpreter<'a, '_>, args: &[Value<'a>]) -> Result<Value<'a>, RunError> {
    Ok(Value::Int(int_arg("minus", &args[0])? - int_arg("minus", &args[1])?))
}

fn multiply<'a>(_: &mut Interpreter<'a, '_>, args: &[Value<'a>]) -> Result<Value<'a>, RunError> {
    Ok(Value::Int(int_arg("multiply", &args[0])? * int_arg("multiply", &args[1])?))
}

fn less<'a>(_: &mut Interpreter<'a, '_>, args: &[Value<'a>]) -> Result<Value<'a>, RunError> {
    Ok(Value::Bool(int_arg("less", &args[0])? < int_arg("less", &args[1])?))
}

/// Structural on scalars and arrays, identity on everything else.
fn equals<'a>(_: &mut Interpreter<'a, '_>, args: &[Value<'a>]) -> Result<Value<'a>, RunError> {
    Ok(Value::Bool(args[0] == args[1]))
}

// ============================================================================
// Logic
// ============================================================================

fn and<'a>(_: &mut Interpreter<'a, '_>, args: &[Value<'a>]) -> Result<Value<'a>, RunError> {
    let left = bool_arg("and", &args[0])?;
    let right = bool_arg("and", &args[1])?;
    Ok(Value::Bool(left && right))
}

fn or<'a>(_: &mut Interpreter<'a, '_>, args: &[Value<'a>]) -> Result<Value<'a>, RunError> {
    let left = bool_arg("or", &args[0])?;
    let right = bool_arg("or", &args[1])?;
    Ok(Value::Bool(left || right))
}

// ============================================================================
// Arrays
// ============================================================================

/// Drops the first element. The rest of an empty array is empty.
fn rest<'a>(_: &mut Interpreter<'a, '_>, args: &[Value<'a>]) -> Result<Value<'a>, RunError> {
    let items = array_arg("rest", &args[0])?;
    Ok(Value::array(items.iter().skip(1).cloned().collect()))
}

fn at<'a>(_: &mut Interpreter<'a, '_>, args: &[Value<'a>]) -> Result<Value<'a>, RunError> {
    let items = array_arg("at", &args[0])?;
    let index = int_arg("at", &args[1])?;
    index
        .to_usize()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or_else(|| RunError::IndexOutOfBounds {
            index: index.to_string(),
            len: items.len(),
        })
}

/// Appends `item` unless an equal value is already present.
fn add<'a>(_: &mut Interpreter<'a, '_>, args: &[Value<'a>]) -> Result<Value<'a>, RunError> {
    let items = array_arg("add", &args[0])?;
    let item = &args[1];
    if items.contains(item) {
        return Ok(args[0].clone());
    }
    let mut extended = items.to_vec();
    extended.push(item.clone());
    Ok(Value::array(extended))
}

fn length<'a>(_: &mut Interpreter<'a, '_>, args: &[Value<'a>]) -> Result<Value<'a>, RunError> {
    let items = array_arg("length", &args[0])?;
    Ok(Value::int(items.len()))
}

// ============================================================================
// Output
// ============================================================================

/// Writes every binding visible from a closure or record instance, one
/// `name = value` line each.
fn env<'a>(interp: &mut Interpreter<'a, '_>, args: &[Value<'a>]) -> Result<Value<'a>, RunError> {
    let scope = match &args[0] {
        Value::Function(closure) => closure.env.flatten(),
        Value::Instance(instance) => instance.env.flatten(),
        other => return Err(mismatch("env", "a function or record instance", other)),
    };
    for (name, value) in scope.bindings() {
        let line = format!("{name} = {}", interp.printer.value(&value));
        interp.write_line(&line)?;
    }
    Ok(Value::Void)
}

fn print<'a>(interp: &mut Interpreter<'a, '_>, args: &[Value<'a>]) -> Result<Value<'a>, RunError> {
    let text = interp.printer.value(&args[0]);
    interp.write_line(&text)?;
    Ok(Value::Void)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use pretty_assertions::assert_eq;

    fn run_builtin(name: &str, args: Vec<Value<'static>>) -> (Result<Value<'static>, RunError>, String) {
        let mut diagnostics = Diagnostics::default();
        let mut output = Vec::new();
        let result = {
            let mut interp = Interpreter::new(&mut diagnostics, &mut output);
            call(&mut interp, name, args)
        };
        (result, String::from_utf8(output).unwrap())
    }

    fn ints(values: &[i64]) -> Value<'static> {
        Value::array(values.iter().map(|&n| Value::int(n)).collect())
    }

    #[test]
    fn test_arithmetic() {
        let (sum, _) = run_builtin("plus", vec![Value::int(2), Value::int(40)]);
        assert_eq!(sum.unwrap(), Value::int(42));
        let (product, _) = run_builtin("multiply", vec![Value::int(-3), Value::int(7)]);
        assert_eq!(product.unwrap(), Value::int(-21));
        let (less, _) = run_builtin("less", vec![Value::int(1), Value::int(2)]);
        assert_eq!(less.unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_integers_do_not_overflow() {
        let big: BigInt = "123456789012345678901234567890".parse().unwrap();
        let (product, _) = run_builtin("multiply", vec![Value::Int(big.clone()), Value::int(10)]);
        assert_eq!(product.unwrap(), Value::Int(big * 10));
    }

    #[test]
    fn test_array_operations() {
        let (tail, _) = run_builtin("rest", vec![ints(&[1, 2, 3])]);
        assert_eq!(tail.unwrap(), ints(&[2, 3]));
        let (empty, _) = run_builtin("rest", vec![ints(&[])]);
        assert_eq!(empty.unwrap(), ints(&[]));
        let (second, _) = run_builtin("at", vec![ints(&[1, 2, 3]), Value::int(1)]);
        assert_eq!(second.unwrap(), Value::int(2));
        let (len, _) = run_builtin("length", vec![ints(&[1, 2, 3])]);
        assert_eq!(len.unwrap(), Value::int(3));
    }

    #[test]
    fn test_add_has_set_semantics() {
        let (added, _) = run_builtin("add", vec![ints(&[1, 2]), Value::int(3)]);
        assert_eq!(added.unwrap(), ints(&[1, 2, 3]));
        let (unchanged, _) = run_builtin("add", vec![ints(&[1, 2]), Value::int(2)]);
        assert_eq!(unchanged.unwrap(), ints(&[1, 2]));
    }

    #[test]
    fn test_at_out_of_bounds() {
        let (result, _) = run_builtin("at", vec![ints(&[1]), Value::int(-1)]);
        assert!(matches!(
            result,
            Err(RunError::IndexOutOfBounds { ref index, len: 1 }) if index == "-1"
        ));
    }

    #[test]
    fn test_argument_checks() {
        let (unknown, _) = run_builtin("frobnicate", vec![]);
        assert_eq!(unknown.unwrap_err().kind_name(), "UnknownBuiltin");

        let (arity, _) = run_builtin("plus", vec![Value::int(1)]);
        assert_eq!(
            arity.unwrap_err().to_string(),
            "__plus: expected 2 argument(s), found 1"
        );

        let (types, _) = run_builtin("and", vec![Value::Bool(true), Value::int(1)]);
        assert_eq!(
            types.unwrap_err().to_string(),
            "__and: expected Bool, found integer"
        );
    }

    #[test]
    fn test_print_writes_rendered_value() {
        let (result, output) = run_builtin("print", vec![Value::string("hi")]);
        assert_eq!(result.unwrap(), Value::Void);
        assert_eq!(output, "\"hi\"\n");
    }

    #[test]
    fn test_signatures() {
        let plus = signature("plus").unwrap();
        assert_eq!(plus.params.len(), 2);
        assert!(matches!(plus.ret, TypeExpr::Simple(SimpleType::Int)));
        assert!(signature("nope").is_none());
    }
}
