//! Scalar values: an owning [`Value`] for literals, defaults and result rows,
//! and a borrowing [`ValueRef`] for viewing bytes inside a table row without
//! allocating. See [`crate::error::Error::TypeMismatch`] for the cross-variant
//! discipline: two values are only ever compared or combined when their kinds agree.

use crate::error::{Error, Result};
use std::cmp::Ordering;

/// Scalar kind. INT is 32-bit signed, STRING is a user-bounded byte run,
/// BYTES is a fixed-width byte run, NONE is the "absent / use default" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Bool,
    Str,
    Bytes,
    None,
}

/// An owning scalar value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Bool(bool),
    Str(Box<str>),
    Bytes(Box<[u8]>),
    None,
}

impl Value {
    /// The DataType tag of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Bool(_) => DataType::Bool,
            Value::Str(_) => DataType::Str,
            Value::Bytes(_) => DataType::Bytes,
            Value::None => DataType::None,
        }
    }

    /// Borrow this value as a [`ValueRef`].
    pub fn as_ref(&self) -> ValueRef<'_> {
        match self {
            Value::Int(x) => ValueRef::Int(*x),
            Value::Bool(x) => ValueRef::Bool(*x),
            Value::Str(s) => ValueRef::Str(s),
            Value::Bytes(b) => ValueRef::Bytes(b),
            Value::None => ValueRef::None,
        }
    }

    /// Is this the NONE sentinel.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }
}

impl<'a> From<ValueRef<'a>> for Value {
    fn from(v: ValueRef<'a>) -> Self {
        match v {
            ValueRef::Int(x) => Value::Int(x),
            ValueRef::Bool(x) => Value::Bool(x),
            ValueRef::Str(s) => Value::Str(s.into()),
            ValueRef::Bytes(b) => Value::Bytes(b.into()),
            ValueRef::None => Value::None,
        }
    }
}

/// A scalar value borrowed from a table row's backing storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRef<'a> {
    Int(i32),
    Bool(bool),
    Str(&'a str),
    Bytes(&'a [u8]),
    None,
}

impl<'a> ValueRef<'a> {
    /// The DataType tag of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            ValueRef::Int(_) => DataType::Int,
            ValueRef::Bool(_) => DataType::Bool,
            ValueRef::Str(_) => DataType::Str,
            ValueRef::Bytes(_) => DataType::Bytes,
            ValueRef::None => DataType::None,
        }
    }

    /// Total order used by ordered indices and relational operators. Only
    /// ever called on pairs sharing a DataType; callers check that first.
    pub fn order_cmp(&self, other: &ValueRef) -> Ordering {
        match (self, other) {
            (ValueRef::Int(a), ValueRef::Int(b)) => a.cmp(b),
            (ValueRef::Bool(a), ValueRef::Bool(b)) => a.cmp(b),
            (ValueRef::Str(a), ValueRef::Str(b)) => a.cmp(b),
            (ValueRef::Bytes(a), ValueRef::Bytes(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }

    fn check_same(&self, other: &ValueRef) -> Result<()> {
        if self.data_type() != other.data_type() {
            Err(Error::TypeMismatch)
        } else {
            Ok(())
        }
    }

    /// `=`
    pub fn eq_op(&self, other: &ValueRef) -> Result<bool> {
        self.check_same(other)?;
        Ok(self.order_cmp(other) == Ordering::Equal)
    }
    /// `!=`
    pub fn ne_op(&self, other: &ValueRef) -> Result<bool> {
        Ok(!self.eq_op(other)?)
    }
    /// `<`
    pub fn lt_op(&self, other: &ValueRef) -> Result<bool> {
        self.check_same(other)?;
        Ok(self.order_cmp(other) == Ordering::Less)
    }
    /// `>`
    pub fn gt_op(&self, other: &ValueRef) -> Result<bool> {
        self.check_same(other)?;
        Ok(self.order_cmp(other) == Ordering::Greater)
    }
    /// `<=`
    pub fn le_op(&self, other: &ValueRef) -> Result<bool> {
        Ok(!self.gt_op(other)?)
    }
    /// `>=`
    pub fn ge_op(&self, other: &ValueRef) -> Result<bool> {
        Ok(!self.lt_op(other)?)
    }

    /// `+`: INT addition or STRING concatenation.
    pub fn add(&self, other: &ValueRef) -> Result<Value> {
        self.check_same(other)?;
        match (self, other) {
            (ValueRef::Int(a), ValueRef::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
            (ValueRef::Str(a), ValueRef::Str(b)) => Ok(Value::Str(format!("{}{}", a, b).into())),
            _ => Err(Error::OperatorUnsupported),
        }
    }
    /// `-`
    pub fn sub(&self, other: &ValueRef) -> Result<Value> {
        self.check_same(other)?;
        match (self, other) {
            (ValueRef::Int(a), ValueRef::Int(b)) => Ok(Value::Int(a.wrapping_sub(*b))),
            _ => Err(Error::OperatorUnsupported),
        }
    }
    /// `*`
    pub fn mul(&self, other: &ValueRef) -> Result<Value> {
        self.check_same(other)?;
        match (self, other) {
            (ValueRef::Int(a), ValueRef::Int(b)) => Ok(Value::Int(a.wrapping_mul(*b))),
            _ => Err(Error::OperatorUnsupported),
        }
    }
    /// `/`
    pub fn div(&self, other: &ValueRef) -> Result<Value> {
        self.check_same(other)?;
        match (self, other) {
            (ValueRef::Int(a), ValueRef::Int(b)) => Ok(Value::Int(a.wrapping_div(*b))),
            _ => Err(Error::OperatorUnsupported),
        }
    }
    /// `%`
    pub fn rem(&self, other: &ValueRef) -> Result<Value> {
        self.check_same(other)?;
        match (self, other) {
            (ValueRef::Int(a), ValueRef::Int(b)) => Ok(Value::Int(a.wrapping_rem(*b))),
            _ => Err(Error::OperatorUnsupported),
        }
    }
    /// unary `+`
    pub fn plus(&self) -> Result<Value> {
        match self {
            ValueRef::Int(a) => Ok(Value::Int(*a)),
            _ => Err(Error::OperatorUnsupported),
        }
    }
    /// unary `-`
    pub fn neg(&self) -> Result<Value> {
        match self {
            ValueRef::Int(a) => Ok(Value::Int(a.wrapping_neg())),
            _ => Err(Error::OperatorUnsupported),
        }
    }
    /// `&&`
    pub fn and(&self, other: &ValueRef) -> Result<Value> {
        self.check_same(other)?;
        match (self, other) {
            (ValueRef::Bool(a), ValueRef::Bool(b)) => Ok(Value::Bool(*a && *b)),
            _ => Err(Error::OperatorUnsupported),
        }
    }
    /// `||`
    pub fn or(&self, other: &ValueRef) -> Result<Value> {
        self.check_same(other)?;
        match (self, other) {
            (ValueRef::Bool(a), ValueRef::Bool(b)) => Ok(Value::Bool(*a || *b)),
            _ => Err(Error::OperatorUnsupported),
        }
    }
    /// `^^`
    pub fn xor(&self, other: &ValueRef) -> Result<Value> {
        self.check_same(other)?;
        match (self, other) {
            (ValueRef::Bool(a), ValueRef::Bool(b)) => Ok(Value::Bool(*a != *b)),
            _ => Err(Error::OperatorUnsupported),
        }
    }
    /// unary `!`
    pub fn not(&self) -> Result<Value> {
        match self {
            ValueRef::Bool(a) => Ok(Value::Bool(!a)),
            _ => Err(Error::OperatorUnsupported),
        }
    }

    /// Get the bool payload, type-checked.
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            ValueRef::Bool(b) => Ok(*b),
            _ => Err(Error::TypeMismatch),
        }
    }

    /// Get the int payload, type-checked.
    pub fn as_int(&self) -> Result<i32> {
        match self {
            ValueRef::Int(i) => Ok(*i),
            _ => Err(Error::TypeMismatch),
        }
    }

    /// Get the string payload, type-checked.
    pub fn as_str(&self) -> Result<&'a str> {
        match self {
            ValueRef::Str(s) => Ok(s),
            _ => Err(Error::TypeMismatch),
        }
    }

    /// Get the bytes payload, type-checked.
    pub fn as_bytes(&self) -> Result<&'a [u8]> {
        match self {
            ValueRef::Bytes(b) => Ok(b),
            _ => Err(Error::TypeMismatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_rejects_mismatched_types() {
        let a = Value::Int(1);
        let b = Value::Str("x".into());
        assert!(a.as_ref().eq_op(&b.as_ref()).is_err());
    }

    #[test]
    fn int_arithmetic() {
        let a = Value::Int(3);
        let b = Value::Int(4);
        assert_eq!(a.as_ref().add(&b.as_ref()).unwrap(), Value::Int(7));
        assert_eq!(a.as_ref().mul(&b.as_ref()).unwrap(), Value::Int(12));
    }

    #[test]
    fn string_concat() {
        let a = Value::Str("ab".into());
        let b = Value::Str("cd".into());
        assert_eq!(a.as_ref().add(&b.as_ref()).unwrap(), Value::Str("abcd".into()));
    }

    #[test]
    fn bool_ops_reject_non_bool() {
        let a = Value::Int(1);
        let b = Value::Int(0);
        assert!(matches!(a.as_ref().and(&b.as_ref()), Err(Error::OperatorUnsupported)));
    }
}
