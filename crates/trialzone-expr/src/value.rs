use std::fmt;

/// A runtime value produced by evaluating an [`crate::Expr`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    List(Vec<Value>),
    /// A field referenced in a `when` clause that simply has not been
    /// computed yet (e.g. an enhancement that ran after this one). Any
    /// comparison against `Missing` evaluates to `false`.
    Missing,
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Missing => false,
            Value::Number(n) => *n != 0.0,
            _ => true,
        }
    }

    pub fn first(&self) -> Value {
        match self {
            Value::List(items) => items.first().cloned().unwrap_or(Value::Missing),
            other => other.clone(),
        }
    }

    pub fn last(&self) -> Value {
        match self {
            Value::List(items) => items.last().cloned().unwrap_or(Value::Missing),
            other => other.clone(),
        }
    }

    pub fn index(&self, i: usize) -> Value {
        match self {
            Value::List(items) => items.get(i).cloned().unwrap_or(Value::Missing),
            _ => Value::Missing,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Missing => write!(f, "<missing>"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}
