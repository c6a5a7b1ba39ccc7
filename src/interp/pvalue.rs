//! Program values.
//!
//! A `PValue` is the value of an expression in the scripting language and
//! the thing stored in symbol tables. Values are cheap to clone: containers
//! (lists, tables, sequences) are shared behind `Rc<RefCell<...>>` so that
//! pushing to a list bound to a variable is visible through every binding,
//! matching the language's reference semantics for containers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::node::{NodeId, Record};
use crate::sequence::Sequence;

/// A reference to a record tree node from script code.
#[derive(Debug, Clone)]
pub enum NodeRef {
    /// A node inside a database record, addressed by record key.
    Db {
        /// The record's key.
        key: String,
        /// The node within the record.
        node: NodeId,
    },
    /// A node inside a detached tree built by a script.
    Detached {
        /// The shared detached tree.
        record: Rc<RefCell<Record>>,
        /// The node within the tree.
        node: NodeId,
    },
}

/// The value of a script expression.
#[derive(Debug, Clone, Default)]
pub enum PValue {
    /// The null value.
    #[default]
    Null,
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// An owned string.
    String(String),
    /// A generic record tree node.
    Node(NodeRef),
    /// A person record, by key.
    Person(String),
    /// A family record, by key.
    Family(String),
    /// A source record, by key.
    Source(String),
    /// An event record, by key.
    Event(String),
    /// Any other record, by key.
    Other(String),
    /// A shared list of values.
    List(Rc<RefCell<Vec<PValue>>>),
    /// A shared string-keyed table of values.
    Table(Rc<RefCell<HashMap<String, PValue>>>),
    /// A shared sequence.
    Sequence(Rc<RefCell<Sequence>>),
}

impl PValue {
    /// Creates an empty shared list value.
    #[must_use]
    pub fn new_list() -> Self {
        PValue::List(Rc::new(RefCell::new(Vec::new())))
    }

    /// Creates an empty shared table value.
    #[must_use]
    pub fn new_table() -> Self {
        PValue::Table(Rc::new(RefCell::new(HashMap::new())))
    }

    /// Wraps a sequence in a shared value.
    #[must_use]
    pub fn new_sequence(sequence: Sequence) -> Self {
        PValue::Sequence(Rc::new(RefCell::new(sequence)))
    }

    /// Returns the name of the value's type, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            PValue::Null => "null",
            PValue::Int(_) => "integer",
            PValue::Float(_) => "float",
            PValue::Bool(_) => "boolean",
            PValue::String(_) => "string",
            PValue::Node(_) => "node",
            PValue::Person(_) => "person",
            PValue::Family(_) => "family",
            PValue::Source(_) => "source",
            PValue::Event(_) => "event",
            PValue::Other(_) => "other",
            PValue::List(_) => "list",
            PValue::Table(_) => "table",
            PValue::Sequence(_) => "set",
        }
    }

    /// Coerces the value to a boolean: non-null, non-zero, non-empty.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            PValue::Null => false,
            PValue::Int(i) => *i != 0,
            PValue::Float(f) => *f != 0.0,
            PValue::Bool(b) => *b,
            _ => true,
        }
    }

    /// Returns the record key behind a record-valued PValue.
    #[must_use]
    pub fn record_key(&self) -> Option<&str> {
        match self {
            PValue::Person(key)
            | PValue::Family(key)
            | PValue::Source(key)
            | PValue::Event(key)
            | PValue::Other(key) => Some(key),
            PValue::Node(NodeRef::Db { key, .. }) => Some(key),
            _ => None,
        }
    }
}

enum NumericPair {
    Ints(i64, i64),
    Floats(f64, f64),
}

/// Pairs two values for arithmetic. Integer and floating operands of the
/// same kind stay as they are; a mixed pair coerces the integer to
/// floating. Anything else is a type error.
fn numeric_pair(a: &PValue, b: &PValue) -> Result<NumericPair, String> {
    match (a, b) {
        (PValue::Int(x), PValue::Int(y)) => Ok(NumericPair::Ints(*x, *y)),
        (PValue::Float(x), PValue::Float(y)) => Ok(NumericPair::Floats(*x, *y)),
        (PValue::Int(x), PValue::Float(y)) => Ok(NumericPair::Floats(*x as f64, *y)),
        (PValue::Float(x), PValue::Int(y)) => Ok(NumericPair::Floats(*x, *y as f64)),
        _ => Err(format!(
            "operands must be numeric, not {} and {}",
            a.type_name(),
            b.type_name()
        )),
    }
}

/// Adds two numeric values.
pub fn add_values(a: &PValue, b: &PValue) -> Result<PValue, String> {
    match numeric_pair(a, b)? {
        NumericPair::Ints(x, y) => Ok(PValue::Int(x.wrapping_add(y))),
        NumericPair::Floats(x, y) => Ok(PValue::Float(x + y)),
    }
}

/// Subtracts two numeric values.
pub fn sub_values(a: &PValue, b: &PValue) -> Result<PValue, String> {
    match numeric_pair(a, b)? {
        NumericPair::Ints(x, y) => Ok(PValue::Int(x.wrapping_sub(y))),
        NumericPair::Floats(x, y) => Ok(PValue::Float(x - y)),
    }
}

/// Multiplies two numeric values.
pub fn mul_values(a: &PValue, b: &PValue) -> Result<PValue, String> {
    match numeric_pair(a, b)? {
        NumericPair::Ints(x, y) => Ok(PValue::Int(x.wrapping_mul(y))),
        NumericPair::Floats(x, y) => Ok(PValue::Float(x * y)),
    }
}

/// Divides two numeric values. Division by zero is an error.
pub fn div_values(a: &PValue, b: &PValue) -> Result<PValue, String> {
    match numeric_pair(a, b)? {
        NumericPair::Ints(_, 0) => Err("division by zero".to_string()),
        NumericPair::Ints(x, y) => Ok(PValue::Int(x.wrapping_div(y))),
        NumericPair::Floats(x, y) => {
            if y == 0.0 {
                Err("division by zero".to_string())
            } else {
                Ok(PValue::Float(x / y))
            }
        }
    }
}

/// Takes the modulus of two integer values.
pub fn mod_values(a: &PValue, b: &PValue) -> Result<PValue, String> {
    match (a, b) {
        (PValue::Int(_), PValue::Int(0)) => Err("modulus by zero".to_string()),
        (PValue::Int(x), PValue::Int(y)) => Ok(PValue::Int(x.wrapping_rem(*y))),
        _ => Err("mod needs integer operands".to_string()),
    }
}

/// Raises an integer to a non-negative integer power.
pub fn exp_values(a: &PValue, b: &PValue) -> Result<PValue, String> {
    match (a, b) {
        (PValue::Int(x), PValue::Int(y)) => {
            let exponent =
                u32::try_from(*y).map_err(|_| "exponent must be non-negative".to_string())?;
            Ok(PValue::Int(x.wrapping_pow(exponent)))
        }
        _ => Err("exp needs integer operands".to_string()),
    }
}

/// Negates a numeric value.
pub fn neg_value(a: &PValue) -> Result<PValue, String> {
    match a {
        PValue::Int(x) => Ok(PValue::Int(x.wrapping_neg())),
        PValue::Float(x) => Ok(PValue::Float(-x)),
        _ => Err(format!("cannot negate a {}", a.type_name())),
    }
}

/// Compares two values of matching type: integers, floats or strings.
pub fn compare_values(a: &PValue, b: &PValue) -> Result<std::cmp::Ordering, String> {
    match (a, b) {
        (PValue::Int(x), PValue::Int(y)) => Ok(x.cmp(y)),
        (PValue::Float(x), PValue::Float(y)) => x
            .partial_cmp(y)
            .ok_or_else(|| "cannot compare NaN".to_string()),
        (PValue::String(x), PValue::String(y)) => Ok(x.cmp(y)),
        _ => Err(format!(
            "cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        )),
    }
}

/// Tests two values of matching type for equality. Booleans and nulls are
/// allowed in addition to the comparable types.
pub fn eq_values(a: &PValue, b: &PValue) -> Result<bool, String> {
    match (a, b) {
        (PValue::Null, PValue::Null) => Ok(true),
        (PValue::Bool(x), PValue::Bool(y)) => Ok(x == y),
        (PValue::Null, _) | (_, PValue::Null) => Ok(false),
        _ => Ok(compare_values(a, b)? == std::cmp::Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_arithmetic() {
        let six = add_values(&PValue::Int(2), &PValue::Int(4)).unwrap();
        assert!(matches!(six, PValue::Int(6)));
        let two = div_values(&PValue::Int(5), &PValue::Int(2)).unwrap();
        assert!(matches!(two, PValue::Int(2)));
        let one = mod_values(&PValue::Int(5), &PValue::Int(2)).unwrap();
        assert!(matches!(one, PValue::Int(1)));
        let eight = exp_values(&PValue::Int(2), &PValue::Int(3)).unwrap();
        assert!(matches!(eight, PValue::Int(8)));
    }

    #[test]
    fn test_mixed_arithmetic_coerces_to_float() {
        let v = add_values(&PValue::Int(1), &PValue::Float(0.5)).unwrap();
        match v {
            PValue::Float(f) => assert!((f - 1.5).abs() < f64::EPSILON),
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn test_division_by_zero_is_an_error() {
        assert!(div_values(&PValue::Int(1), &PValue::Int(0)).is_err());
        assert!(mod_values(&PValue::Int(1), &PValue::Int(0)).is_err());
    }

    #[test]
    fn test_mod_and_exp_need_integers() {
        assert!(mod_values(&PValue::Float(1.0), &PValue::Float(2.0)).is_err());
        assert!(exp_values(&PValue::Float(1.0), &PValue::Int(2)).is_err());
    }

    #[test]
    fn test_non_numeric_arithmetic_is_an_error() {
        assert!(add_values(&PValue::String("a".into()), &PValue::Int(1)).is_err());
    }

    #[test]
    fn test_comparisons_need_matching_types() {
        assert!(compare_values(&PValue::Int(1), &PValue::String("1".into())).is_err());
        assert_eq!(
            compare_values(&PValue::String("a".into()), &PValue::String("b".into())).unwrap(),
            std::cmp::Ordering::Less
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!PValue::Null.is_truthy());
        assert!(!PValue::Int(0).is_truthy());
        assert!(PValue::Int(3).is_truthy());
        assert!(!PValue::Bool(false).is_truthy());
        assert!(PValue::String("x".into()).is_truthy());
        assert!(PValue::Person("@I1@".into()).is_truthy());
    }

    #[test]
    fn test_lists_share_storage() {
        let list = PValue::new_list();
        let alias = list.clone();
        if let PValue::List(inner) = &list {
            inner.borrow_mut().push(PValue::Int(1));
        }
        if let PValue::List(inner) = &alias {
            assert_eq!(inner.borrow().len(), 1);
        }
    }
}
