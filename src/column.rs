//! Column descriptors: name, type, fixed byte width, row-relative offset,
//! and the unique/autoincrement/key/default attributes a table enforces
//! at insert time.

use crate::error::{Error, Result};
use crate::util;
use crate::value::{DataType, Value, ValueRef};
use std::io::{Read, Write};

/// Fixed byte width of an INT column.
pub const INT_SIZE: u16 = 4;
/// Fixed byte width of a BOOL column.
pub const BOOL_SIZE: u16 = 1;

/// A single column's type and storage layout, plus its constraint flags.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    /// Byte width of the column within a row. INT=4, BOOL=1, STRING=user
    /// bound (including the NUL terminator), BYTES=exact declared width.
    pub size: u16,
    /// Row-relative byte offset, assigned when the table is built.
    pub offset: u16,
    pub is_unique: bool,
    pub is_autoincrement: bool,
    pub is_key: bool,
    pub default: Option<Value>,
    /// Next value an autoincrement column will assign. Starts at 1, as in
    /// the source this is grounded on.
    pub autoincrement_value: i32,
}

impl Column {
    /// Construct a column descriptor for a fixed-size scalar type
    /// (INT or BOOL); `size` and `offset` for STRING/BYTES are filled in
    /// by the caller before the column is handed to [`crate::table::Table::new`].
    pub fn new(name: impl Into<String>, data_type: DataType, size: u16) -> Self {
        Column {
            name: name.into(),
            data_type,
            size,
            offset: 0,
            is_unique: false,
            is_autoincrement: false,
            is_key: false,
            default: None,
            autoincrement_value: 1,
        }
    }

    /// Validate the autoincrement/default invariants from the data model:
    /// autoincrement only on INT columns, default value type must match.
    pub fn validate(&self) -> Result<()> {
        if self.is_autoincrement && self.data_type != DataType::Int {
            return Err(Error::AutoincrementOnNonInt);
        }
        if let Some(def) = &self.default {
            if def.data_type() != self.data_type {
                return Err(Error::DefaultTypeMismatch);
            }
            match def {
                Value::Str(s) if s.len() + 1 > self.size as usize => return Err(Error::SizeTooLarge),
                Value::Bytes(b) if b.len() != self.size as usize => return Err(Error::SizeTooLarge),
                _ => {}
            }
        }
        Ok(())
    }

    /// Write `value` into this column's row slot. `dst.len()` must equal
    /// `self.size`. STRING values are NUL-terminated and zero-padded;
    /// BYTES values fill the slot exactly.
    pub fn encode(&self, value: &Value, dst: &mut [u8]) -> Result<()> {
        debug_assert_eq!(dst.len(), self.size as usize);
        match value {
            Value::Int(x) => dst.copy_from_slice(&x.to_le_bytes()),
            Value::Bool(b) => dst[0] = *b as u8,
            Value::Str(s) => {
                let bytes = s.as_bytes();
                dst[..bytes.len()].copy_from_slice(bytes);
                for b in &mut dst[bytes.len()..] {
                    *b = 0;
                }
            }
            Value::Bytes(b) => dst.copy_from_slice(b),
            Value::None => return Err(Error::TypeMismatch),
        }
        Ok(())
    }

    /// Read this column's value back out of a row slot, borrowing from it.
    pub fn decode<'a>(&self, src: &'a [u8]) -> ValueRef<'a> {
        match self.data_type {
            DataType::Int => ValueRef::Int(i32::from_le_bytes(src.try_into().unwrap())),
            DataType::Bool => ValueRef::Bool(src[0] != 0),
            DataType::Str => {
                let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
                let s = std::str::from_utf8(&src[..end]).unwrap_or("");
                ValueRef::Str(s)
            }
            DataType::Bytes => ValueRef::Bytes(src),
            DataType::None => ValueRef::None,
        }
    }

    fn type_tag(&self) -> i32 {
        match self.data_type {
            DataType::Int => 0,
            DataType::Bool => 1,
            DataType::Str => 2,
            DataType::Bytes => 3,
            DataType::None => 4,
        }
    }

    fn type_from_tag(tag: i32) -> Result<DataType> {
        Ok(match tag {
            0 => DataType::Int,
            1 => DataType::Bool,
            2 => DataType::Str,
            3 => DataType::Bytes,
            4 => DataType::None,
            _ => return Err(Error::Corrupt("unknown column type tag")),
        })
    }

    /// Serialize this column per the `column :=` layout: type tag, name,
    /// size, offset, the four flag bytes, then the optional autoincrement
    /// counter and default value.
    pub fn save_to_file<W: Write>(&self, w: &mut W) -> Result<()> {
        util::write_i32(w, self.type_tag())?;
        util::write_string(w, &self.name)?;
        util::write_u16(w, self.size)?;
        util::write_u16(w, self.offset)?;
        util::write_u8(w, self.is_unique as u8)?;
        util::write_u8(w, self.is_autoincrement as u8)?;
        util::write_u8(w, self.is_key as u8)?;
        util::write_u8(w, self.default.is_some() as u8)?;
        if self.is_autoincrement {
            util::write_i32(w, self.autoincrement_value)?;
        }
        if let Some(def) = &self.default {
            save_value(w, def)?;
        }
        Ok(())
    }

    /// Deserialize a column in the format written by [`Column::save_to_file`].
    pub fn load_from_file<R: Read>(r: &mut R) -> Result<Self> {
        let data_type = Column::type_from_tag(util::read_i32(r)?)?;
        let name = util::read_string(r)?;
        let size = util::read_u16(r)?;
        let offset = util::read_u16(r)?;
        let is_unique = util::read_u8(r)? != 0;
        let is_autoincrement = util::read_u8(r)? != 0;
        let is_key = util::read_u8(r)? != 0;
        let has_default = util::read_u8(r)? != 0;
        let autoincrement_value = if is_autoincrement { util::read_i32(r)? } else { 1 };
        let default = if has_default { Some(load_value(r, data_type)?) } else { None };
        Ok(Column {
            name,
            data_type,
            size,
            offset,
            is_unique,
            is_autoincrement,
            is_key,
            default,
            autoincrement_value,
        })
    }
}

/// Write a default value in its "natural representation" (int, bool-as-int,
/// length-prefixed string, length-prefixed bytes) — no type tag, since the
/// column itself already pins the type.
fn save_value<W: Write>(w: &mut W, v: &Value) -> Result<()> {
    match v {
        Value::Int(x) => util::write_i32(w, *x),
        Value::Bool(b) => util::write_u8(w, *b as u8),
        Value::Str(s) => util::write_string(w, s),
        Value::Bytes(b) => util::write_bytes(w, b),
        Value::None => Ok(()),
    }
}

fn load_value<R: Read>(r: &mut R, data_type: DataType) -> Result<Value> {
    Ok(match data_type {
        DataType::Int => Value::Int(util::read_i32(r)?),
        DataType::Bool => Value::Bool(util::read_u8(r)? != 0),
        DataType::Str => Value::Str(util::read_string(r)?.into()),
        DataType::Bytes => Value::Bytes(util::read_bytes(r)?.into()),
        DataType::None => Value::None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autoincrement_on_non_int_rejected() {
        let mut c = Column::new("id", DataType::Str, 8);
        c.is_autoincrement = true;
        assert!(matches!(c.validate(), Err(Error::AutoincrementOnNonInt)));
    }

    #[test]
    fn default_type_mismatch_rejected() {
        let mut c = Column::new("n", DataType::Int, INT_SIZE);
        c.default = Some(Value::Str("x".into()));
        assert!(matches!(c.validate(), Err(Error::DefaultTypeMismatch)));
    }

    #[test]
    fn oversized_default_string_rejected() {
        let mut c = Column::new("login", DataType::Str, 4);
        c.default = Some(Value::Str("toolong".into()));
        assert!(matches!(c.validate(), Err(Error::SizeTooLarge)));
    }

    #[test]
    fn mismatched_width_default_bytes_rejected() {
        let mut c = Column::new("tag", DataType::Bytes, 3);
        c.default = Some(Value::Bytes(vec![1, 2].into()));
        assert!(matches!(c.validate(), Err(Error::SizeTooLarge)));
    }

    #[test]
    fn roundtrip_through_bytes() {
        let mut c = Column::new("login", DataType::Str, 16);
        c.is_unique = true;
        c.default = Some(Value::Str("anon".into()));
        let mut buf = Vec::new();
        c.save_to_file(&mut buf).unwrap();
        let mut cursor = &buf[..];
        let loaded = Column::load_from_file(&mut cursor).unwrap();
        assert_eq!(loaded.name, "login");
        assert_eq!(loaded.size, 16);
        assert!(loaded.is_unique);
        assert_eq!(loaded.default, Some(Value::Str("anon".into())));
    }

    #[test]
    fn string_slot_encode_decode_pads_and_terminates() {
        let c = Column::new("login", DataType::Str, 8);
        let mut slot = [0xffu8; 8];
        c.encode(&Value::Str("bob".into()), &mut slot).unwrap();
        assert_eq!(&slot, b"bob\0\0\0\0\0");
        assert_eq!(c.decode(&slot), ValueRef::Str("bob"));
    }

    #[test]
    fn bytes_slot_fills_exactly() {
        let c = Column::new("tag", DataType::Bytes, 3);
        let mut slot = [0u8; 3];
        c.encode(&Value::Bytes(vec![1, 2, 3].into()), &mut slot).unwrap();
        assert_eq!(c.decode(&slot), ValueRef::Bytes(&[1, 2, 3]));
    }

    #[test]
    fn roundtrip_autoincrement_counter() {
        let mut c = Column::new("id", DataType::Int, INT_SIZE);
        c.is_autoincrement = true;
        c.autoincrement_value = 9;
        let mut buf = Vec::new();
        c.save_to_file(&mut buf).unwrap();
        let mut cursor = &buf[..];
        let loaded = Column::load_from_file(&mut cursor).unwrap();
        assert_eq!(loaded.autoincrement_value, 9);
    }
}
