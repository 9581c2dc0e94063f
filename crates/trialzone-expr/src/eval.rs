use std::collections::HashMap;

use crate::ast::{BinOp, Expr};
use crate::value::Value;

/// Evaluates a parsed expression against a variable context. Total: every
/// well-typed or ill-typed combination produces a `Value` (falling back to
/// `Value::Missing`/`false`-like comparisons) rather than erroring, since
/// the grammar was already validated at parse time.
pub fn eval(expr: &Expr, ctx: &HashMap<String, Value>) -> Value {
    match expr {
        Expr::Number(n) => Value::Number(*n),
        Expr::Text(s) => Value::Text(s.clone()),
        Expr::Bool(b) => Value::Bool(*b),
        Expr::Field(name) => ctx.get(name).cloned().unwrap_or(Value::Missing),
        Expr::Index(base, idx) => {
            let base = eval(base, ctx);
            match eval(idx, ctx).as_number() {
                Some(i) if i >= 0.0 => base.index(i as usize),
                _ => Value::Missing,
            }
        }
        Expr::First(base) => eval(base, ctx).first(),
        Expr::Last(base) => eval(base, ctx).last(),
        Expr::Not(inner) => Value::Bool(!eval(inner, ctx).as_bool()),
        Expr::Neg(inner) => match eval(inner, ctx).as_number() {
            Some(n) => Value::Number(-n),
            None => Value::Missing,
        },
        Expr::Binary(op, lhs, rhs) => eval_binary(*op, eval(lhs, ctx), eval(rhs, ctx)),
    }
}

fn eval_binary(op: BinOp, lhs: Value, rhs: Value) -> Value {
    use BinOp::*;
    match op {
        And => Value::Bool(lhs.as_bool() && rhs.as_bool()),
        Or => Value::Bool(lhs.as_bool() || rhs.as_bool()),
        Eq => Value::Bool(values_equal(&lhs, &rhs)),
        Ne => Value::Bool(!values_equal(&lhs, &rhs)),
        Lt | Le | Gt | Ge => match (lhs.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => Value::Bool(match op {
                Lt => a < b,
                Le => a <= b,
                Gt => a > b,
                Ge => a >= b,
                _ => unreachable!(),
            }),
            _ => Value::Bool(false),
        },
        Add | Sub | Mul | Div => match (lhs.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => Value::Number(match op {
                Add => a + b,
                Sub => a - b,
                Mul => a * b,
                Div => a / b,
                _ => unreachable!(),
            }),
            _ => Value::Missing,
        },
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::List(x), Value::List(y)) => x == y,
        (Value::Missing, Value::Missing) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn ctx(pairs: Vec<(&str, Value)>) -> HashMap<String, Value> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn evaluates_index_and_equality() {
        let expr = parse("value[0] == 1010").unwrap();
        let context = ctx(vec![("value", Value::List(vec![Value::Number(1010.0)]))]);
        assert_eq!(eval(&expr, &context), Value::Bool(true));
    }

    #[test]
    fn evaluates_first_accessor_chain() {
        let expr = parse("clicked_name.first() == correct_target.first()").unwrap();
        let context = ctx(vec![
            ("clicked_name", Value::List(vec![Value::Text("a".into())])),
            ("correct_target", Value::List(vec![Value::Text("a".into())])),
        ]);
        assert_eq!(eval(&expr, &context), Value::Bool(true));
    }

    #[test]
    fn missing_field_is_falsy() {
        let expr = parse("missing_field == 1").unwrap();
        assert_eq!(eval(&expr, &HashMap::new()), Value::Bool(false));
    }

    #[test]
    fn arithmetic_and_boolean_combinators() {
        let expr = parse("(1 + 2) * 2 >= 6 && !false").unwrap();
        assert_eq!(eval(&expr, &HashMap::new()), Value::Bool(true));
    }
}
