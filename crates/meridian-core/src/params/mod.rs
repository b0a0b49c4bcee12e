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

//! Type-erased argument and return-value containers.
//!
//! A [`DynParams`] is created for one invocation of a method, constructor or
//! event. It carries its [`Signature`] so the callee can verify that caller and
//! callee agree before any slot is read.

mod parser;

pub use parser::{ParamsParser, ParsedParam};

use crate::error::{ReflectError, ReflectResult};
use crate::signature::Signature;
use crate::value::{Value, ValueType};

/// Argument slots and an optional return slot for one dynamic invocation.
///
/// Every slot always holds a value of the type declared by the signature:
/// [`DynParams::new`] fills slots with defaults and every setter is checked.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynParams {
    signature: Signature,
    params: Vec<Value>,
    ret: Option<Value>,
}

impl DynParams {
    /// Allocates default-valued slots for `signature`.
    pub fn new(signature: Signature) -> Self {
        let params = signature
            .params()
            .iter()
            .map(|ty| ty.default_value())
            .collect();
        let ret = (!signature.is_void()).then(|| signature.ret().default_value());
        Self {
            signature,
            params,
            ret,
        }
    }

    /// Parameters for a `void()` call.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds void-returning parameters whose signature follows the given values.
    pub fn with_args(values: impl IntoIterator<Item = Value>) -> Self {
        Self::with_return(ValueType::Void, values)
    }

    /// Builds parameters with a return slot of type `ret`.
    pub fn with_return(ret: ValueType, values: impl IntoIterator<Item = Value>) -> Self {
        let params: Vec<Value> = values.into_iter().collect();
        let signature = Signature::new(ret, params.iter().map(Value::value_type));
        let ret = (ret != ValueType::Void).then(|| ret.default_value());
        Self {
            signature,
            params,
            ret,
        }
    }

    /// Builds parameters for `signature` out of a parameter string.
    ///
    /// Named entries must be spelled `Param0`, `Param1`, ...; bare entries are
    /// assigned to the next positional slot. Slots that are not mentioned keep
    /// their default value.
    pub fn from_param_string(signature: Signature, input: &str) -> ReflectResult<Self> {
        let mut params = Self::new(signature);
        let mut next_positional = 0;

        for parsed in ParamsParser::new(input) {
            let parsed = parsed?;
            let index = match parsed.name.as_deref() {
                None => {
                    next_positional += 1;
                    next_positional - 1
                }
                Some(name) => name
                    .strip_prefix("Param")
                    .and_then(|n| n.parse::<usize>().ok())
                    .ok_or_else(|| ReflectError::MalformedParams {
                        input: input.to_owned(),
                        reason: format!("unexpected parameter name '{name}'"),
                    })?,
            };

            let ty = params
                .signature
                .params()
                .get(index)
                .copied()
                .ok_or(ReflectError::ParameterIndex {
                    index,
                    arity: params.len(),
                })?;
            params.params[index] = Value::parse(ty, &parsed.value)?;
        }

        Ok(params)
    }

    /// The signature these parameters were built for.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The canonical signature string.
    pub fn signature_id(&self) -> String {
        self.signature.id()
    }

    /// The number of parameter slots.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if there are no parameter slots.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// All parameter slots, in order.
    pub fn values(&self) -> &[Value] {
        &self.params
    }

    /// Returns the parameter slot at `index`, or `None` if `index` is outside the arity.
    pub fn parameter(&self, index: usize) -> Option<&Value> {
        self.params.get(index)
    }

    /// Writes the parameter slot at `index`, checking arity and type.
    pub fn set_parameter(&mut self, index: usize, value: impl Into<Value>) -> ReflectResult<()> {
        let value = value.into();
        let arity = self.params.len();
        let slot = self
            .params
            .get_mut(index)
            .ok_or(ReflectError::ParameterIndex { index, arity })?;
        if slot.value_type() != value.value_type() {
            return Err(ReflectError::TypeMismatch {
                target: format!("parameter {index}"),
                expected: slot.value_type(),
                found: value.value_type(),
            });
        }
        *slot = value;
        Ok(())
    }

    /// Returns the return slot, or `None` if the call has no return value.
    pub fn return_value(&self) -> Option<&Value> {
        self.ret.as_ref()
    }

    /// Writes the return slot, checking its type.
    pub fn set_return_value(&mut self, value: impl Into<Value>) -> ReflectResult<()> {
        let value = value.into();
        let expected = self.signature.ret();
        match &mut self.ret {
            Some(slot) if expected == value.value_type() => {
                *slot = value;
                Ok(())
            }
            _ => Err(ReflectError::TypeMismatch {
                target: "return value".to_owned(),
                expected,
                found: value.value_type(),
            }),
        }
    }

    /// Consumes the parameters and returns the return slot.
    pub fn into_return_value(self) -> Option<Value> {
        self.ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn void_signature_has_no_return_slot() {
        let params = DynParams::new(Signature::void([ValueType::Int]));
        assert!(params.return_value().is_none());
        assert_eq!(params.parameter(0), Some(&Value::Int(0)));
    }

    #[test]
    fn out_of_arity_index_is_none() {
        let params = DynParams::with_args([Value::from("a"), Value::Bool(true)]);
        assert!(params.parameter(1).is_some());
        assert!(params.parameter(2).is_none());
        assert_eq!(params.signature_id(), "void(string,bool)");
    }

    #[test]
    fn setters_are_type_checked() {
        let mut params = DynParams::new(Signature::new(ValueType::Float, [ValueType::Int]));
        assert!(params.set_parameter(0, 3).is_ok());
        assert!(matches!(
            params.set_parameter(0, 1.5),
            Err(ReflectError::TypeMismatch { .. })
        ));
        assert!(matches!(
            params.set_parameter(4, 1),
            Err(ReflectError::ParameterIndex { index: 4, arity: 1 })
        ));

        assert_eq!(params.return_value(), Some(&Value::Float(0.0)));
        params.set_return_value(2.0).unwrap();
        assert!(params.set_return_value("nope").is_err());
        assert_eq!(params.into_return_value(), Some(Value::Float(2.0)));
    }

    #[test]
    fn return_on_void_call_is_rejected() {
        let mut params = DynParams::empty();
        assert!(params.set_return_value(1).is_err());
    }

    #[test]
    fn param_string_fills_named_and_positional_slots() {
        let sig = Signature::void([ValueType::String, ValueType::Int, ValueType::Bool]);
        let params = DynParams::from_param_string(sig.clone(), "'hello world' Param2=true").unwrap();
        assert_eq!(params.parameter(0), Some(&Value::from("hello world")));
        assert_eq!(params.parameter(1), Some(&Value::Int(0)));
        assert_eq!(params.parameter(2), Some(&Value::Bool(true)));

        assert!(DynParams::from_param_string(sig.clone(), "Param7=1").is_err());
        assert!(DynParams::from_param_string(sig.clone(), "Speed=1").is_err());
        assert!(DynParams::from_param_string(sig, "Param1=abc").is_err());
    }
}
