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

//! Call signatures of methods, constructors, events and handlers.

use crate::error::{ReflectError, ReflectResult};
use crate::value::{Value, ValueType};
use std::fmt;

/// The return type and ordered parameter types of a callable.
///
/// The canonical textual form is `ret(p0,p1,...)`, for example
/// `void(int,string)` or `float()`. This string is what two parties without
/// a shared compiled signature compare before exchanging a
/// [`DynParams`](crate::DynParams).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    ret: ValueType,
    params: Vec<ValueType>,
}

impl Signature {
    /// Creates a signature from a return type and parameter types.
    pub fn new(ret: ValueType, params: impl IntoIterator<Item = ValueType>) -> Self {
        Self {
            ret,
            params: params.into_iter().collect(),
        }
    }

    /// Creates a signature without a return value.
    pub fn void(params: impl IntoIterator<Item = ValueType>) -> Self {
        Self::new(ValueType::Void, params)
    }

    /// Builds the void signature matching the types of the given values.
    pub fn of_values(values: &[Value]) -> Self {
        Self::void(values.iter().map(Value::value_type))
    }

    /// The return type.
    pub fn ret(&self) -> ValueType {
        self.ret
    }

    /// The parameter types, in order.
    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    /// The number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if the callable has no return value.
    pub fn is_void(&self) -> bool {
        self.ret == ValueType::Void
    }

    /// Returns the canonical signature string.
    pub fn id(&self) -> String {
        self.to_string()
    }

    /// Parses a canonical signature string such as `int(float,string)`.
    ///
    /// Whitespace around tokens is ignored.
    pub fn parse(text: &str) -> ReflectResult<Self> {
        let malformed = |reason: &str| ReflectError::MalformedParams {
            input: text.to_owned(),
            reason: reason.to_owned(),
        };

        let trimmed = text.trim();
        let open = trimmed
            .find('(')
            .ok_or_else(|| malformed("missing '('"))?;
        let inner = trimmed[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| malformed("missing ')'"))?;

        let ret_token = trimmed[..open].trim();
        let ret = ValueType::from_token(ret_token)
            .ok_or_else(|| malformed(&format!("unknown type '{ret_token}'")))?;

        let mut params = Vec::new();
        if !inner.trim().is_empty() {
            for token in inner.split(',').map(str::trim) {
                match ValueType::from_token(token) {
                    Some(ValueType::Void) => return Err(malformed("void parameter")),
                    Some(ty) => params.push(ty),
                    None => return Err(malformed(&format!("unknown type '{token}'"))),
                }
            }
        }
        Ok(Self { ret, params })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.ret)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}
