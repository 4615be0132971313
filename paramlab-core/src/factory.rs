//! Consumer boundary — turning a combination into something runnable.
//!
//! The engine stops at `ParameterCombination`. Whatever builds a strategy from
//! it implements `StrategyFactory`; module selections are dispatched by type
//! key through a `ModuleRegistry`. Type keys are not checked during
//! enumeration, so an unknown key is reported here.

use std::collections::BTreeMap;

use crate::axis::{ModuleSelection, ParamValue, ParameterCombination, Scalar};

/// Named parameters of a combination or of one module selection.
pub type Params = BTreeMap<String, ParamValue>;

// ─── Error type ──────────────────────────────────────────────────────

/// Errors that can occur while building from a combination.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    #[error("unknown {capability} type: {type_key}")]
    UnknownModule {
        capability: String,
        type_key: String,
    },
    #[error("missing parameter: {0}")]
    MissingParam(String),
    #[error("parameter '{name}' is not {expected}")]
    ParamType {
        name: String,
        expected: &'static str,
    },
}

// ─── Factory traits ──────────────────────────────────────────────────

/// Builds a runnable strategy from one trial's combination.
pub trait StrategyFactory {
    type Strategy;

    fn build(&self, combination: &ParameterCombination) -> Result<Self::Strategy, FactoryError>;
}

type Constructor<T> = Box<dyn Fn(&Params) -> Result<T, FactoryError> + Send + Sync>;

/// Type-key dispatch for one module capability.
pub struct ModuleRegistry<T> {
    capability: String,
    constructors: BTreeMap<String, Constructor<T>>,
}

impl<T> ModuleRegistry<T> {
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            constructors: BTreeMap::new(),
        }
    }

    /// Register (or replace) the constructor for `type_key`.
    pub fn register<F>(mut self, type_key: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&Params) -> Result<T, FactoryError> + Send + Sync + 'static,
    {
        self.constructors
            .insert(type_key.into(), Box::new(constructor));
        self
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }

    pub fn type_keys(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Build the module chosen by `selection` from its nested params.
    pub fn build(&self, selection: &ModuleSelection) -> Result<T, FactoryError> {
        let constructor = self.constructors.get(&selection.type_key).ok_or_else(|| {
            FactoryError::UnknownModule {
                capability: self.capability.clone(),
                type_key: selection.type_key.clone(),
            }
        })?;
        constructor(&selection.params)
    }
}

impl<T> std::fmt::Debug for ModuleRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("capability", &self.capability)
            .field("type_keys", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn scalar<'a>(params: &'a Params, name: &str) -> Result<&'a Scalar, FactoryError> {
    match params.get(name) {
        Some(ParamValue::Scalar(s)) => Ok(s),
        Some(ParamValue::Module(_)) => Err(FactoryError::ParamType {
            name: name.to_string(),
            expected: "a scalar",
        }),
        None => Err(FactoryError::MissingParam(name.to_string())),
    }
}

fn typed<'a, V>(
    params: &'a Params,
    name: &str,
    expected: &'static str,
    get: impl Fn(&'a Scalar) -> Option<V>,
) -> Result<V, FactoryError> {
    get(scalar(params, name)?).ok_or_else(|| FactoryError::ParamType {
        name: name.to_string(),
        expected,
    })
}

/// Integer parameter. A float value is a type error, never truncated.
pub fn param_i64(params: &Params, name: &str) -> Result<i64, FactoryError> {
    typed(params, name, "an integer", Scalar::as_i64)
}

/// Float parameter. An integer value is a type error, never widened.
pub fn param_f64(params: &Params, name: &str) -> Result<f64, FactoryError> {
    typed(params, name, "a float", Scalar::as_f64)
}

pub fn param_bool(params: &Params, name: &str) -> Result<bool, FactoryError> {
    typed(params, name, "a bool", Scalar::as_bool)
}

pub fn param_str<'a>(params: &'a Params, name: &str) -> Result<&'a str, FactoryError> {
    typed(params, name, "text", Scalar::as_str)
}

pub fn param_module<'a>(params: &'a Params, name: &str) -> Result<&'a ModuleSelection, FactoryError> {
    match params.get(name) {
        Some(ParamValue::Module(m)) => Ok(m),
        Some(ParamValue::Scalar(_)) => Err(FactoryError::ParamType {
            name: name.to_string(),
            expected: "a module selection",
        }),
        None => Err(FactoryError::MissingParam(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum RiskFilter {
        Off,
        AtrStop { period: i64, multiplier: f64 },
    }

    fn registry() -> ModuleRegistry<RiskFilter> {
        ModuleRegistry::new("risk_filter")
            .register("none", |_| Ok(RiskFilter::Off))
            .register("atr_stop", |p| {
                Ok(RiskFilter::AtrStop {
                    period: param_i64(p, "period")?,
                    multiplier: param_f64(p, "multiplier")?,
                })
            })
    }

    fn params(entries: &[(&str, Scalar)]) -> Params {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), ParamValue::Scalar(v.clone())))
            .collect()
    }

    #[test]
    fn builds_registered_module() {
        let selection = ModuleSelection::new(
            "atr_stop",
            params(&[("period", Scalar::Int(14)), ("multiplier", Scalar::Float(2.5))]),
        );
        assert_eq!(
            registry().build(&selection).unwrap(),
            RiskFilter::AtrStop {
                period: 14,
                multiplier: 2.5
            }
        );
    }

    #[test]
    fn empty_params_variant_builds() {
        let selection = ModuleSelection::new("none", Params::new());
        assert_eq!(registry().build(&selection).unwrap(), RiskFilter::Off);
    }

    #[test]
    fn unknown_type_key_is_reported() {
        let selection = ModuleSelection::new("kelly", Params::new());
        assert_eq!(
            registry().build(&selection).unwrap_err(),
            FactoryError::UnknownModule {
                capability: "risk_filter".into(),
                type_key: "kelly".into()
            }
        );
    }

    #[test]
    fn integer_and_float_are_not_coerced() {
        let p = params(&[("period", Scalar::Float(14.0)), ("multiplier", Scalar::Int(2))]);
        assert!(matches!(
            param_i64(&p, "period"),
            Err(FactoryError::ParamType { .. })
        ));
        assert!(matches!(
            param_f64(&p, "multiplier"),
            Err(FactoryError::ParamType { .. })
        ));
    }

    #[test]
    fn missing_param_is_reported() {
        assert_eq!(
            param_str(&Params::new(), "ma_type"),
            Err(FactoryError::MissingParam("ma_type".into()))
        );
    }

    #[test]
    fn module_accessor_rejects_scalars() {
        let p = params(&[("risk", Scalar::Bool(true))]);
        assert!(param_module(&p, "risk").is_err());
        assert_eq!(param_bool(&p, "risk"), Ok(true));
    }

    #[test]
    fn registry_reports_its_capability() {
        let reg = registry();
        assert_eq!(reg.capability(), "risk_filter");
        let err = reg
            .build(&ModuleSelection::new("kelly", Params::new()))
            .unwrap_err();
        assert!(err.to_string().contains(reg.capability()));
    }

    #[test]
    fn type_keys_are_sorted() {
        let keys: Vec<_> = registry().type_keys().map(str::to_string).collect();
        assert_eq!(keys, vec!["atr_stop", "none"]);
    }
}
