use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Property map of a stored entity.
pub type Fields = BTreeMap<String, Value>;

/// A property value in the store's native representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Blob(Vec<u8>),
    Array(Vec<Value>),
    /// An embedded entity.
    Map(Fields),
}

impl Value {
    /// Returns the position of this value's type in the cross-type sort order.
    ///
    /// Integers and doubles share a rank so they compare numerically.
    pub fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Integer(_) | Value::Double(_) => 1,
            Value::Boolean(_) => 2,
            Value::String(_) => 3,
            Value::Blob(_) => 4,
            Value::Array(_) => 5,
            Value::Map(_) => 6,
        }
    }

    /// Returns a short name for this value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Blob(_) => "blob",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// Returns true if both values belong to the same comparable type.
    pub fn is_comparable_with(&self, other: &Value) -> bool {
        self.type_rank() == other.type_rank()
    }

    /// Total order over values: first by type rank, then by content.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Integer(a), Value::Double(b)) => compare_integer_double(*a, *b),
            (Value::Double(a), Value::Integer(b)) => compare_integer_double(*b, *a).reverse(),
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => compare_sequences(a.iter(), b.iter()),
            (Value::Map(a), Value::Map(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let ordering = ka.cmp(kb).then_with(|| va.compare(vb));
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }

    /// Returns the string content if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Exact comparison of an integer against a double, without rounding the
/// integer through `f64`. NaN sorts by sign, as in `f64::total_cmp`.
fn compare_integer_double(integer: i64, double: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

    if double.is_nan() {
        return if double.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if double >= TWO_POW_63 {
        return Ordering::Less;
    }
    if double < -TWO_POW_63 {
        return Ordering::Greater;
    }

    let whole = double.trunc() as i64;
    match integer.cmp(&whole) {
        Ordering::Equal if double.fract() > 0.0 => Ordering::Less,
        Ordering::Equal if double.fract() < 0.0 => Ordering::Greater,
        ordering => ordering,
    }
}

fn compare_sequences<'a>(
    mut a: impl Iterator<Item = &'a Value>,
    mut b: impl Iterator<Item = &'a Value>,
) -> Ordering {
    loop {
        match (a.next(), b.next()) {
            (Some(x), Some(y)) => {
                let ordering = x.compare(y);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_rank_orders_across_types() {
        assert_eq!(Value::Null.compare(&Value::Integer(0)), Ordering::Less);
        assert_eq!(
            Value::Integer(100).compare(&Value::Boolean(false)),
            Ordering::Less
        );
        assert_eq!(
            Value::String("a".to_string()).compare(&Value::Boolean(true)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_integers_and_doubles_compare_numerically() {
        assert_eq!(Value::Integer(2).compare(&Value::Double(2.5)), Ordering::Less);
        assert_eq!(Value::Double(3.0).compare(&Value::Integer(3)), Ordering::Equal);
        assert!(Value::Integer(1).is_comparable_with(&Value::Double(1.0)));
    }

    #[test]
    fn test_large_integers_compare_exactly_with_doubles() {
        let two_pow_53 = 9_007_199_254_740_992i64;
        assert_eq!(
            Value::Integer(two_pow_53 + 1).compare(&Value::Double(two_pow_53 as f64)),
            Ordering::Greater
        );
        assert_eq!(
            Value::Double(two_pow_53 as f64).compare(&Value::Integer(two_pow_53 + 1)),
            Ordering::Less
        );
        assert_eq!(
            Value::Integer(i64::MAX).compare(&Value::Double(9.3e18)),
            Ordering::Less
        );
        assert_eq!(
            Value::Integer(-3).compare(&Value::Double(-2.5)),
            Ordering::Less
        );
        assert_eq!(
            Value::Integer(-2).compare(&Value::Double(-2.5)),
            Ordering::Greater
        );
        assert_eq!(
            Value::Integer(i64::MIN).compare(&Value::Double(f64::NEG_INFINITY)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_strings_compare_lexicographically() {
        let apple = Value::from("apple");
        let banana = Value::from("banana");
        assert_eq!(apple.compare(&banana), Ordering::Less);
        assert_eq!(banana.compare(&apple), Ordering::Greater);
    }

    #[test]
    fn test_arrays_compare_element_wise() {
        let short = Value::Array(vec![Value::Integer(1)]);
        let long = Value::Array(vec![Value::Integer(1), Value::Integer(0)]);
        let bigger = Value::Array(vec![Value::Integer(2)]);

        assert_eq!(short.compare(&long), Ordering::Less);
        assert_eq!(long.compare(&bigger), Ordering::Less);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some(5i64)), Value::Integer(5));
    }

    #[test]
    fn test_as_str() {
        assert_eq!(Value::from("id").as_str(), Some("id"));
        assert_eq!(Value::Integer(1).as_str(), None);
    }
}
