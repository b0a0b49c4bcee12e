// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The tagged value model used for attributes, parameters and return values.

use crate::error::{ReflectError, ReflectResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The semantic type tag of a reflected value.
///
/// Tags are what the reflection layer compares when it checks an attribute
/// write or a call signature. The token returned by [`ValueType::token`] is
/// the spelling used inside signature strings such as `int(float,string)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// No value. Only meaningful as a return type.
    #[default]
    Void,
    /// A boolean.
    Bool,
    /// A signed 64-bit integer.
    Int,
    /// An unsigned 64-bit integer.
    UInt,
    /// A 64-bit float.
    Float,
    /// A UTF-8 string.
    String,
    /// A 32-bit set of flags.
    Flags,
    /// A named variant out of a closed list declared by the attribute.
    Enum,
}

impl ValueType {
    /// All tags, in declaration order.
    pub const ALL: [ValueType; 8] = [
        ValueType::Void,
        ValueType::Bool,
        ValueType::Int,
        ValueType::UInt,
        ValueType::Float,
        ValueType::String,
        ValueType::Flags,
        ValueType::Enum,
    ];

    /// Returns the token used for this tag in signature strings.
    pub fn token(self) -> &'static str {
        match self {
            ValueType::Void => "void",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::UInt => "uint",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Flags => "flags",
            ValueType::Enum => "enum",
        }
    }

    /// Looks a tag up by its signature token.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.token() == token)
    }

    /// Returns the default value of this type.
    pub fn default_value(self) -> Value {
        match self {
            ValueType::Void => Value::Void,
            ValueType::Bool => Value::Bool(false),
            ValueType::Int => Value::Int(0),
            ValueType::UInt => Value::UInt(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::String => Value::String(String::new()),
            ValueType::Flags => Value::Flags(0),
            ValueType::Enum => Value::Enum(String::new()),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A dynamically typed value.
///
/// This is the storage unit of every attribute and every [`DynParams`](crate::DynParams)
/// slot. It replaces untyped memory addresses with a sum type, so reading a slot
/// with the wrong type yields `None` instead of garbage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// No value.
    #[default]
    Void,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A float.
    Float(f64),
    /// A string.
    String(String),
    /// A set of flags.
    Flags(u32),
    /// An enum variant name.
    Enum(String),
}

impl Value {
    /// Returns the type tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Void => ValueType::Void,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::UInt(_) => ValueType::UInt,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Flags(_) => ValueType::Flags,
            Value::Enum(_) => ValueType::Enum,
        }
    }

    /// Returns the boolean, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the integer, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the unsigned integer, if this is a `UInt`.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float, if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a `String` or an `Enum`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) | Value::Enum(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the flag bits, if this is `Flags`.
    pub fn as_flags(&self) -> Option<u32> {
        match self {
            Value::Flags(v) => Some(*v),
            _ => None,
        }
    }

    /// Parses `text` into a value of type `ty`.
    ///
    /// Booleans accept `true`/`false`/`1`/`0` in any case. Flags accept a
    /// decimal or a `0x`-prefixed hexadecimal number. `Void` only accepts the
    /// empty string.
    pub fn parse(ty: ValueType, text: &str) -> ReflectResult<Value> {
        let trimmed = text.trim();
        let parse_error = || ReflectError::Parse {
            input: text.to_owned(),
            expected: ty,
        };

        let value = match ty {
            ValueType::Void if trimmed.is_empty() => Value::Void,
            ValueType::Void => return Err(parse_error()),
            ValueType::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" => Value::Bool(true),
                "false" | "0" => Value::Bool(false),
                _ => return Err(parse_error()),
            },
            ValueType::Int => Value::Int(trimmed.parse().map_err(|_| parse_error())?),
            ValueType::UInt => Value::UInt(trimmed.parse().map_err(|_| parse_error())?),
            ValueType::Float => Value::Float(trimmed.parse().map_err(|_| parse_error())?),
            ValueType::String => Value::String(text.to_owned()),
            ValueType::Flags => {
                let bits = match trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                {
                    Some(hex) => u32::from_str_radix(hex, 16),
                    None => trimmed.parse(),
                };
                Value::Flags(bits.map_err(|_| parse_error())?)
            }
            ValueType::Enum if trimmed.is_empty() => return Err(parse_error()),
            ValueType::Enum => Value::Enum(trimmed.to_owned()),
        };
        Ok(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => Ok(()),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) | Value::Enum(v) => f.write_str(v),
            Value::Flags(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}
