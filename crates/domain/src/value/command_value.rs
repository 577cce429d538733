use std::fmt;

use super::ValueType;
use crate::error::{DomainError, Result};
use crate::event::{Reading, now_millis};

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Bool(bool),
    Text(String),
    /// Canonical fixed-width big-endian encoding of a numeric variant.
    Numeric(Vec<u8>),
}

/// A typed, timestamped scalar returned by (or sent to) a protocol driver
/// for a single device object.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandValue {
    resource: String,
    origin: i64,
    value_type: ValueType,
    payload: Payload,
}

/// Native types a [`CommandValue`] can be decoded into.
pub trait FromCommandValue: Sized {
    const VALUE_TYPE: ValueType;

    fn decode(value: &CommandValue) -> Result<Self>;
}

impl CommandValue {
    pub fn new_bool(resource: impl Into<String>, origin: i64, value: bool) -> Self {
        Self {
            resource: resource.into(),
            origin,
            value_type: ValueType::Bool,
            payload: Payload::Bool(value),
        }
    }

    pub fn new_string(
        resource: impl Into<String>,
        origin: i64,
        value: impl Into<String>,
    ) -> Self {
        Self {
            resource: resource.into(),
            origin,
            value_type: ValueType::String,
            payload: Payload::Text(value.into()),
        }
    }

    fn numeric(resource: String, origin: i64, value_type: ValueType, bytes: Vec<u8>) -> Self {
        Self {
            resource,
            origin,
            value_type,
            payload: Payload::Numeric(bytes),
        }
    }

    /// Name of the device object this value belongs to.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Epoch milliseconds at which the driver read the value (0 = unknown).
    pub fn origin(&self) -> i64 {
        self.origin
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Raw big-endian bytes of a numeric value.
    pub fn numeric_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Numeric(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Decodes the native value, failing with `TypeMismatch` if `T` is not
    /// the variant this value was built with.
    pub fn value_as<T: FromCommandValue>(&self) -> Result<T> {
        if self.value_type != T::VALUE_TYPE {
            return Err(DomainError::TypeMismatch {
                actual: self.value_type.as_str(),
                requested: T::VALUE_TYPE.as_str(),
            });
        }
        T::decode(self)
    }

    /// Builds a value of the declared type from its textual form.
    pub fn parse(
        value_type: ValueType,
        resource: impl Into<String>,
        origin: i64,
        text: &str,
    ) -> Result<Self> {
        let resource = resource.into();
        let invalid = |e: String| {
            DomainError::InvalidParameter(format!(
                "cannot parse {:?} as {}: {}",
                text, value_type, e
            ))
        };
        let trimmed = text.trim();

        let value = match value_type {
            ValueType::Bool => {
                Self::new_bool(resource, origin, parse_text(trimmed).map_err(invalid)?)
            }
            ValueType::String => Self::new_string(resource, origin, text),
            ValueType::Uint8 => Self::new_u8(resource, origin, parse_text(trimmed).map_err(invalid)?),
            ValueType::Uint16 => {
                Self::new_u16(resource, origin, parse_text(trimmed).map_err(invalid)?)
            }
            ValueType::Uint32 => {
                Self::new_u32(resource, origin, parse_text(trimmed).map_err(invalid)?)
            }
            ValueType::Uint64 => {
                Self::new_u64(resource, origin, parse_text(trimmed).map_err(invalid)?)
            }
            ValueType::Int8 => Self::new_i8(resource, origin, parse_text(trimmed).map_err(invalid)?),
            ValueType::Int16 => {
                Self::new_i16(resource, origin, parse_text(trimmed).map_err(invalid)?)
            }
            ValueType::Int32 => {
                Self::new_i32(resource, origin, parse_text(trimmed).map_err(invalid)?)
            }
            ValueType::Int64 => {
                Self::new_i64(resource, origin, parse_text(trimmed).map_err(invalid)?)
            }
            ValueType::Float32 => {
                Self::new_f32(resource, origin, parse_text(trimmed).map_err(invalid)?)
            }
            ValueType::Float64 => {
                Self::new_f64(resource, origin, parse_text(trimmed).map_err(invalid)?)
            }
        };
        Ok(value)
    }

    /// Parses the string rendering as a 64-bit float, the input of every
    /// numeric transform step.
    pub fn to_f64(&self) -> Result<f64> {
        let rendered = self.to_string();
        rendered.trim().parse::<f64>().map_err(|e| {
            DomainError::TransformParseError(format!(
                "{} cannot be parsed to float64: {}",
                self.describe(),
                e
            ))
        })
    }

    /// Re-encodes `v` into this value, keeping its type tag, origin and resource.
    ///
    /// Integers are truncated toward zero and must fit the declared width.
    pub fn replace_from_f64(&mut self, v: f64) -> Result<()> {
        let resource = self.resource.clone();
        let origin = self.origin;
        let replaced = match self.value_type {
            ValueType::Bool => {
                return Err(DomainError::TransformParseError(format!(
                    "cannot store {} into a Bool value",
                    v
                )));
            }
            ValueType::String => Self::new_string(resource, origin, v.to_string()),
            ValueType::Uint8 => Self::new_u8(resource, origin, fit_integer(v, "Uint8")?),
            ValueType::Uint16 => Self::new_u16(resource, origin, fit_integer(v, "Uint16")?),
            ValueType::Uint32 => Self::new_u32(resource, origin, fit_integer(v, "Uint32")?),
            ValueType::Uint64 => Self::new_u64(resource, origin, fit_integer(v, "Uint64")?),
            ValueType::Int8 => Self::new_i8(resource, origin, fit_integer(v, "Int8")?),
            ValueType::Int16 => Self::new_i16(resource, origin, fit_integer(v, "Int16")?),
            ValueType::Int32 => Self::new_i32(resource, origin, fit_integer(v, "Int32")?),
            ValueType::Int64 => Self::new_i64(resource, origin, fit_integer(v, "Int64")?),
            ValueType::Float32 => {
                if v.is_finite() && v.abs() > f32::MAX as f64 {
                    return Err(DomainError::Overflow {
                        value: v,
                        value_type: "Float32",
                    });
                }
                Self::new_f32(resource, origin, v as f32)
            }
            ValueType::Float64 => Self::new_f64(resource, origin, v),
        };

        *self = replaced;
        Ok(())
    }

    /// Builds a reading, falling back to the current time when the origin is unset.
    pub fn to_reading(&self, device_name: &str, resource_name: &str) -> Reading {
        let origin = if self.origin != 0 {
            self.origin
        } else {
            now_millis()
        };
        Reading::new(device_name, resource_name, self.to_string(), origin)
    }

    /// `"<Type>: <value>"`, used in log and error messages.
    pub fn describe(&self) -> String {
        format!("{}: {}", self.value_type, self)
    }

    fn render_numeric(&self) -> Result<String> {
        Ok(match self.value_type {
            ValueType::Uint8 => u8::decode(self)?.to_string(),
            ValueType::Uint16 => u16::decode(self)?.to_string(),
            ValueType::Uint32 => u32::decode(self)?.to_string(),
            ValueType::Uint64 => u64::decode(self)?.to_string(),
            ValueType::Int8 => i8::decode(self)?.to_string(),
            ValueType::Int16 => i16::decode(self)?.to_string(),
            ValueType::Int32 => i32::decode(self)?.to_string(),
            ValueType::Int64 => i64::decode(self)?.to_string(),
            // Display for floats never switches to exponent notation.
            ValueType::Float32 => f32::decode(self)?.to_string(),
            ValueType::Float64 => f64::decode(self)?.to_string(),
            ValueType::Bool | ValueType::String => {
                return Err(DomainError::ServerError(format!(
                    "{} value has no numeric payload",
                    self.value_type
                )));
            }
        })
    }
}

impl fmt::Display for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Payload::Bool(b) => write!(f, "{}", b),
            Payload::Text(s) => f.write_str(s),
            Payload::Numeric(_) => match self.render_numeric() {
                Ok(s) => f.write_str(&s),
                Err(e) => write!(f, "{}", e),
            },
        }
    }
}

fn parse_text<T>(text: &str) -> std::result::Result<T, String>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    text.parse::<T>().map_err(|e| e.to_string())
}

fn fit_integer<T>(v: f64, type_name: &'static str) -> Result<T>
where
    T: TryFrom<i128>,
{
    let overflow = || DomainError::Overflow {
        value: v,
        value_type: type_name,
    };
    if !v.is_finite() {
        return Err(overflow());
    }
    let truncated = v.trunc();
    if truncated < i128::MIN as f64 || truncated > i128::MAX as f64 {
        return Err(overflow());
    }
    T::try_from(truncated as i128).map_err(|_| overflow())
}

impl FromCommandValue for bool {
    const VALUE_TYPE: ValueType = ValueType::Bool;

    fn decode(value: &CommandValue) -> Result<Self> {
        match &value.payload {
            Payload::Bool(b) => Ok(*b),
            _ => Err(DomainError::TypeMismatch {
                actual: value.value_type.as_str(),
                requested: "Bool",
            }),
        }
    }
}

impl FromCommandValue for String {
    const VALUE_TYPE: ValueType = ValueType::String;

    fn decode(value: &CommandValue) -> Result<Self> {
        match &value.payload {
            Payload::Text(s) => Ok(s.clone()),
            _ => Err(DomainError::TypeMismatch {
                actual: value.value_type.as_str(),
                requested: "String",
            }),
        }
    }
}

macro_rules! numeric_variants {
    ($($ty:ty => $variant:ident, $ctor:ident;)*) => {
        impl CommandValue {
            $(
                #[doc = concat!("Creates a `", stringify!($variant), "` value.")]
                pub fn $ctor(resource: impl Into<String>, origin: i64, value: $ty) -> Self {
                    Self::numeric(
                        resource.into(),
                        origin,
                        ValueType::$variant,
                        value.to_be_bytes().to_vec(),
                    )
                }
            )*
        }

        $(
            impl FromCommandValue for $ty {
                const VALUE_TYPE: ValueType = ValueType::$variant;

                fn decode(value: &CommandValue) -> Result<Self> {
                    let bytes = value.numeric_bytes().ok_or(DomainError::TypeMismatch {
                        actual: value.value_type.as_str(),
                        requested: stringify!($variant),
                    })?;
                    let raw: [u8; std::mem::size_of::<$ty>()] =
                        bytes.try_into().map_err(|_| {
                            DomainError::ServerError(format!(
                                "{} payload has {} bytes",
                                stringify!($variant),
                                bytes.len()
                            ))
                        })?;
                    Ok(<$ty>::from_be_bytes(raw))
                }
            }
        )*
    };
}

numeric_variants! {
    u8 => Uint8, new_u8;
    u16 => Uint16, new_u16;
    u32 => Uint32, new_u32;
    u64 => Uint64, new_u64;
    i8 => Int8, new_i8;
    i16 => Int16, new_i16;
    i32 => Int32, new_i32;
    i64 => Int64, new_i64;
    f32 => Float32, new_f32;
    f64 => Float64, new_f64;
}
