//! Numeric column types of the binnf format.
//!
//! Every matrix column carries one of nine primitive types. The wire encodes
//! the type as a fixed `u32` ordinal and every cell in little-endian byte
//! order. [`Value`] holds one decoded cell, and the [`Scalar`] trait converts
//! between cells and host primitives using Rust `as` casts:
//!
//! - integer to float rounds to nearest, ties to even
//! - float to integer truncates toward zero and saturates at the bounds
//!   (NaN becomes 0)
//! - integer narrowing keeps the low bits (two's complement wrap)
//!
//! # Examples
//!
//! ```
//! use spikeport::{NumericType, Scalar, Value};
//!
//! let mut cell = [0u8; 4];
//! 1.5f32.to_value(NumericType::Int32).encode(&mut cell);
//! assert_eq!(Value::decode(NumericType::Int32, &cell), Value::Int32(1));
//! assert_eq!(i64::from_value(Value::Float32(-2.75)), -2);
//! ```

use crate::{Result, SpikeportError};
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column type of a binnf matrix.
///
/// Discriminants are the normative wire ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u32)]
pub enum NumericType {
    Int8 = 0,
    UInt8 = 1,
    Int16 = 2,
    UInt16 = 3,
    Int32 = 4,
    UInt32 = 5,
    Float32 = 6,
    Int64 = 7,
    Float64 = 8,
}

impl NumericType {
    /// All types in ordinal order.
    pub const ALL: [NumericType; 9] = [
        NumericType::Int8,
        NumericType::UInt8,
        NumericType::Int16,
        NumericType::UInt16,
        NumericType::Int32,
        NumericType::UInt32,
        NumericType::Float32,
        NumericType::Int64,
        NumericType::Float64,
    ];

    /// Width of one cell in bytes.
    #[inline]
    pub const fn width(self) -> usize {
        match self {
            NumericType::Int8 | NumericType::UInt8 => 1,
            NumericType::Int16 | NumericType::UInt16 => 2,
            NumericType::Int32 | NumericType::UInt32 | NumericType::Float32 => 4,
            NumericType::Int64 | NumericType::Float64 => 8,
        }
    }

    /// Wire ordinal.
    #[inline]
    pub const fn ordinal(self) -> u32 {
        self as u32
    }

    /// Resolve a wire ordinal.
    pub fn from_ordinal(ordinal: u32) -> Result<Self> {
        Self::ALL
            .get(ordinal as usize)
            .copied()
            .ok_or(SpikeportError::UnknownNumericType(ordinal))
    }

    /// Rust name of the matching primitive.
    pub const fn name(self) -> &'static str {
        match self {
            NumericType::Int8 => "i8",
            NumericType::UInt8 => "u8",
            NumericType::Int16 => "i16",
            NumericType::UInt16 => "u16",
            NumericType::Int32 => "i32",
            NumericType::UInt32 => "u32",
            NumericType::Float32 => "f32",
            NumericType::Int64 => "i64",
            NumericType::Float64 => "f64",
        }
    }

    /// True for the two floating-point types.
    pub const fn is_float(self) -> bool {
        matches!(self, NumericType::Float32 | NumericType::Float64)
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single matrix cell tagged with its type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Float32(f32),
    Int64(i64),
    Float64(f64),
}

impl Value {
    /// Decode a little-endian cell of type `ty` from the front of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than `ty.width()`.
    #[inline]
    pub fn decode(ty: NumericType, bytes: &[u8]) -> Value {
        match ty {
            NumericType::Int8 => Value::Int8(bytes[0] as i8),
            NumericType::UInt8 => Value::UInt8(bytes[0]),
            NumericType::Int16 => Value::Int16(LittleEndian::read_i16(bytes)),
            NumericType::UInt16 => Value::UInt16(LittleEndian::read_u16(bytes)),
            NumericType::Int32 => Value::Int32(LittleEndian::read_i32(bytes)),
            NumericType::UInt32 => Value::UInt32(LittleEndian::read_u32(bytes)),
            NumericType::Float32 => Value::Float32(LittleEndian::read_f32(bytes)),
            NumericType::Int64 => Value::Int64(LittleEndian::read_i64(bytes)),
            NumericType::Float64 => Value::Float64(LittleEndian::read_f64(bytes)),
        }
    }

    /// Encode the cell little-endian into the front of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than the cell width.
    #[inline]
    pub fn encode(self, bytes: &mut [u8]) {
        match self {
            Value::Int8(x) => bytes[0] = x as u8,
            Value::UInt8(x) => bytes[0] = x,
            Value::Int16(x) => LittleEndian::write_i16(bytes, x),
            Value::UInt16(x) => LittleEndian::write_u16(bytes, x),
            Value::Int32(x) => LittleEndian::write_i32(bytes, x),
            Value::UInt32(x) => LittleEndian::write_u32(bytes, x),
            Value::Float32(x) => LittleEndian::write_f32(bytes, x),
            Value::Int64(x) => LittleEndian::write_i64(bytes, x),
            Value::Float64(x) => LittleEndian::write_f64(bytes, x),
        }
    }

    /// Type tag of this cell.
    pub const fn numeric_type(self) -> NumericType {
        match self {
            Value::Int8(_) => NumericType::Int8,
            Value::UInt8(_) => NumericType::UInt8,
            Value::Int16(_) => NumericType::Int16,
            Value::UInt16(_) => NumericType::UInt16,
            Value::Int32(_) => NumericType::Int32,
            Value::UInt32(_) => NumericType::UInt32,
            Value::Float32(_) => NumericType::Float32,
            Value::Int64(_) => NumericType::Int64,
            Value::Float64(_) => NumericType::Float64,
        }
    }

    /// Convert to a host primitive.
    #[inline]
    pub fn cast<T: Scalar>(self) -> T {
        T::from_value(self)
    }
}

/// Host primitives that can be read from and written to matrix cells.
pub trait Scalar: Copy + PartialEq + fmt::Debug + 'static {
    /// Column type with the same representation.
    const NUMERIC_TYPE: NumericType;

    /// Convert a cell of any type into `Self`.
    fn from_value(value: Value) -> Self;

    /// Convert `self` into a cell of type `ty`.
    fn to_value(self, ty: NumericType) -> Value;
}

macro_rules! impl_scalar {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Scalar for $t {
                const NUMERIC_TYPE: NumericType = NumericType::$variant;

                #[inline]
                fn from_value(value: Value) -> Self {
                    match value {
                        Value::Int8(x) => x as $t,
                        Value::UInt8(x) => x as $t,
                        Value::Int16(x) => x as $t,
                        Value::UInt16(x) => x as $t,
                        Value::Int32(x) => x as $t,
                        Value::UInt32(x) => x as $t,
                        Value::Float32(x) => x as $t,
                        Value::Int64(x) => x as $t,
                        Value::Float64(x) => x as $t,
                    }
                }

                #[inline]
                fn to_value(self, ty: NumericType) -> Value {
                    match ty {
                        NumericType::Int8 => Value::Int8(self as i8),
                        NumericType::UInt8 => Value::UInt8(self as u8),
                        NumericType::Int16 => Value::Int16(self as i16),
                        NumericType::UInt16 => Value::UInt16(self as u16),
                        NumericType::Int32 => Value::Int32(self as i32),
                        NumericType::UInt32 => Value::UInt32(self as u32),
                        NumericType::Float32 => Value::Float32(self as f32),
                        NumericType::Int64 => Value::Int64(self as i64),
                        NumericType::Float64 => Value::Float64(self as f64),
                    }
                }
            }
        )*
    };
}

impl_scalar!(
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    f32 => Float32,
    i64 => Int64,
    f64 => Float64,
);
