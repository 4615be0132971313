//! Axis model — unresolved declarations, their resolved forms, and the values
//! a combination assigns to them.
//!
//! - `UnresolvedAxis`: what a strategy or module declares (range, discrete set, module slot).
//! - `ResolvedAxis`: the same dimension expanded into an explicit, finite candidate list.
//! - `ParameterCombination`: one concrete value per axis, the unit handed to a trial.
//!
//! Every map in this module is a `BTreeMap`, so iteration and serialization
//! order never depend on hashing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ─── Scalars ─────────────────────────────────────────────────────────

/// A typed scalar parameter value.
///
/// The variant is the value's kind and is never changed after resolution:
/// an integer axis yields `Int`, a float axis yields `Float`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Kind tag for the elements of a discrete set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Integer,
    Float,
    Bool,
    Text,
}

/// Kind of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericKind {
    Integer,
    Float,
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Int(_) => ScalarKind::Integer,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Text(_) => ScalarKind::Text,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v:?}"),
            Scalar::Text(v) => write!(f, "{v}"),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Bool => "bool",
            ScalarKind::Text => "text",
        };
        f.write_str(name)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

// ─── Unresolved axes ─────────────────────────────────────────────────

/// A tunable dimension as declared by a strategy or module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnresolvedAxis {
    NumericRange(NumericRangeAxis),
    DiscreteSet(DiscreteSetAxis),
    ModuleSlot(ModuleSlotAxis),
}

/// `min, min + step, ...` up to the last value not exceeding `max`.
///
/// Bounds are carried as `f64`. For `NumericKind::Integer` all three must be
/// exact integers within `±2^53`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericRangeAxis {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub numeric_kind: NumericKind,
}

/// An explicit, ordered list of candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscreteSetAxis {
    pub name: String,
    pub values: Vec<Scalar>,
    pub element_kind: ScalarKind,
}

/// A slot filled by one of several pluggable module implementations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSlotAxis {
    pub name: String,
    pub capability: String,
    pub variants: Vec<ModuleVariant>,
}

/// One implementation that can fill a module slot, with its own axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleVariant {
    pub type_key: String,
    #[serde(default)]
    pub axes: Vec<UnresolvedAxis>,
}

impl UnresolvedAxis {
    pub fn name(&self) -> &str {
        match self {
            UnresolvedAxis::NumericRange(a) => &a.name,
            UnresolvedAxis::DiscreteSet(a) => &a.name,
            UnresolvedAxis::ModuleSlot(a) => &a.name,
        }
    }
}

impl NumericRangeAxis {
    pub fn integer(name: impl Into<String>, min: i64, max: i64, step: i64) -> Self {
        Self {
            name: name.into(),
            min: min as f64,
            max: max as f64,
            step: step as f64,
            numeric_kind: NumericKind::Integer,
        }
    }

    pub fn float(name: impl Into<String>, min: f64, max: f64, step: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            step,
            numeric_kind: NumericKind::Float,
        }
    }
}

impl DiscreteSetAxis {
    /// Build a discrete axis, taking the element kind from the first value.
    ///
    /// An empty list gets `Text` as a placeholder kind; resolution rejects it anyway.
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        let element_kind = values.first().map(Scalar::kind).unwrap_or(ScalarKind::Text);
        Self {
            name: name.into(),
            values,
            element_kind,
        }
    }
}

impl ModuleVariant {
    pub fn new(type_key: impl Into<String>, axes: Vec<UnresolvedAxis>) -> Self {
        Self {
            type_key: type_key.into(),
            axes,
        }
    }
}

impl From<NumericRangeAxis> for UnresolvedAxis {
    fn from(axis: NumericRangeAxis) -> Self {
        UnresolvedAxis::NumericRange(axis)
    }
}

impl From<DiscreteSetAxis> for UnresolvedAxis {
    fn from(axis: DiscreteSetAxis) -> Self {
        UnresolvedAxis::DiscreteSet(axis)
    }
}

impl From<ModuleSlotAxis> for UnresolvedAxis {
    fn from(axis: ModuleSlotAxis) -> Self {
        UnresolvedAxis::ModuleSlot(axis)
    }
}

// ─── Resolved axes ───────────────────────────────────────────────────

/// An axis whose candidates are an explicit, finite, ordered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedAxis {
    Numeric {
        name: String,
        values: Vec<Scalar>,
    },
    Discrete {
        name: String,
        values: Vec<Scalar>,
    },
    ModuleSlot {
        name: String,
        variants: Vec<ResolvedModuleVariant>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedModuleVariant {
    pub type_key: String,
    pub axes: Vec<ResolvedAxis>,
}

impl ResolvedAxis {
    pub fn name(&self) -> &str {
        match self {
            ResolvedAxis::Numeric { name, .. }
            | ResolvedAxis::Discrete { name, .. }
            | ResolvedAxis::ModuleSlot { name, .. } => name,
        }
    }

    /// Number of top-level candidates: values for scalar axes, variants for slots.
    pub fn candidate_count(&self) -> usize {
        match self {
            ResolvedAxis::Numeric { values, .. } | ResolvedAxis::Discrete { values, .. } => {
                values.len()
            }
            ResolvedAxis::ModuleSlot { variants, .. } => variants.len(),
        }
    }
}

// ─── Combinations ────────────────────────────────────────────────────

/// The value of one axis inside a combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(Scalar),
    Module(ModuleSelection),
}

/// A chosen module variant together with its own resolved parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSelection {
    pub type_key: String,
    pub params: BTreeMap<String, ParamValue>,
}

impl ParamValue {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            ParamValue::Scalar(s) => Some(s),
            ParamValue::Module(_) => None,
        }
    }

    pub fn as_module(&self) -> Option<&ModuleSelection> {
        match self {
            ParamValue::Module(m) => Some(m),
            ParamValue::Scalar(_) => None,
        }
    }
}

impl From<Scalar> for ParamValue {
    fn from(v: Scalar) -> Self {
        ParamValue::Scalar(v)
    }
}

impl From<ModuleSelection> for ParamValue {
    fn from(v: ModuleSelection) -> Self {
        ParamValue::Module(v)
    }
}

impl ModuleSelection {
    pub fn new(type_key: impl Into<String>, params: BTreeMap<String, ParamValue>) -> Self {
        Self {
            type_key: type_key.into(),
            params,
        }
    }
}

/// One concrete assignment of a value to every axis of a space.
///
/// Immutable once built; each yielded combination is an independent value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterCombination {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterCombination {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> &BTreeMap<String, ParamValue> {
        &self.values
    }

    pub fn into_values(self) -> BTreeMap<String, ParamValue> {
        self.values
    }
}

impl From<BTreeMap<String, ParamValue>> for ParameterCombination {
    fn from(values: BTreeMap<String, ParamValue>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, ParamValue)> for ParameterCombination {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
