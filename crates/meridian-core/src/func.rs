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

//! The generic call contract shared by event handlers and free functions.

use crate::error::{ReflectError, ReflectResult};
use crate::params::DynParams;
use crate::signature::Signature;

/// A callable that can be invoked without compile-time knowledge of its signature.
///
/// Implementors report their [`signature`](DynFunc::signature) as a canonical
/// string. The default is the empty string, which means "no signature": the
/// callable accepts whatever it is given and is not checked by callers.
pub trait DynFunc: Send + Sync {
    /// Returns the canonical signature string, or an empty string.
    fn signature(&self) -> String {
        String::new()
    }

    /// Invokes the callable with the given parameters.
    fn call(&self, params: &mut DynParams) -> ReflectResult<()>;
}

/// A [`DynFunc`] backed by a closure.
pub struct FnCallable<F> {
    label: String,
    signature: Option<Signature>,
    func: F,
}

impl<F> FnCallable<F>
where
    F: Fn(&mut DynParams) -> anyhow::Result<()> + Send + Sync,
{
    /// Wraps `func` with a declared signature.
    pub fn typed(label: impl Into<String>, signature: Signature, func: F) -> Self {
        Self {
            label: label.into(),
            signature: Some(signature),
            func,
        }
    }

    /// Wraps `func` without a signature.
    pub fn generic(label: impl Into<String>, func: F) -> Self {
        Self {
            label: label.into(),
            signature: None,
            func,
        }
    }
}

impl<F> DynFunc for FnCallable<F>
where
    F: Fn(&mut DynParams) -> anyhow::Result<()> + Send + Sync,
{
    fn signature(&self) -> String {
        self.signature
            .as_ref()
            .map(Signature::id)
            .unwrap_or_default()
    }

    fn call(&self, params: &mut DynParams) -> ReflectResult<()> {
        if let Some(signature) = &self.signature {
            if params.signature() != signature {
                return Err(ReflectError::SignatureMismatch {
                    target: self.label.clone(),
                    expected: signature.id(),
                    found: params.signature_id(),
                });
            }
        }
        (self.func)(params).map_err(|source| ReflectError::handler(self.label.clone(), source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Value, ValueType};

    struct Silent;

    impl DynFunc for Silent {
        fn call(&self, _params: &mut DynParams) -> ReflectResult<()> {
            Ok(())
        }
    }

    #[test]
    fn default_signature_is_empty() {
        assert_eq!(Silent.signature(), "");
    }

    #[test]
    fn typed_callable_checks_parameters() {
        let double = FnCallable::typed(
            "double",
            Signature::new(ValueType::Int, [ValueType::Int]),
            |params: &mut DynParams| {
                let n = params.parameter(0).and_then(Value::as_int).unwrap_or(0);
                params.set_return_value(n * 2)?;
                Ok(())
            },
        );
        assert_eq!(double.signature(), "int(int)");

        let mut params = DynParams::with_return(ValueType::Int, [Value::Int(21)]);
        double.call(&mut params).unwrap();
        assert_eq!(params.return_value(), Some(&Value::Int(42)));

        let mut wrong = DynParams::with_args([Value::Int(1)]);
        assert!(matches!(
            double.call(&mut wrong),
            Err(ReflectError::SignatureMismatch { .. })
        ));
    }

    #[test]
    fn body_errors_are_wrapped() {
        let failing = FnCallable::generic("boom", |_: &mut DynParams| anyhow::bail!("exploded"));
        let err = failing.call(&mut DynParams::empty()).unwrap_err();
        assert!(err.to_string().contains("exploded"));
    }
}
