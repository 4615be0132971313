//! Combination fingerprinting — deterministic identity of a trial's parameters.
//!
//! - `CombinationHash`: BLAKE3 of the canonical JSON of a combination.
//! - `StructureHash`: same, but only the module type keys chosen, ignoring scalar values.
//!
//! Every map in a combination is a `BTreeMap`, so the JSON is canonical.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::axis::{ParamValue, ParameterCombination};

/// Exact identity of a combination (all values, all nested selections).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombinationHash(pub String);

/// Structural identity: which module variants were picked, at every depth.
///
/// Two combinations that differ only in numeric values share a `StructureHash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureHash(pub String);

impl CombinationHash {
    pub fn of(combination: &ParameterCombination) -> Self {
        let json =
            serde_json::to_string(combination).expect("ParameterCombination must serialize");
        Self(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

impl StructureHash {
    pub fn of(combination: &ParameterCombination) -> Self {
        let shape = structure(combination.values());
        let json = serde_json::to_string(&shape).expect("combination structure must serialize");
        Self(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

/// Module selections reduced to `{type_key, nested structure}`; scalars dropped.
fn structure(values: &BTreeMap<String, ParamValue>) -> BTreeMap<&str, serde_json::Value> {
    values
        .iter()
        .filter_map(|(name, value)| match value {
            ParamValue::Scalar(_) => None,
            ParamValue::Module(m) => Some((
                name.as_str(),
                serde_json::json!({
                    "type_key": m.type_key,
                    "params": structure(&m.params),
                }),
            )),
        })
        .collect()
}

impl fmt::Display for CombinationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for StructureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ParameterCombination {
    pub fn fingerprint(&self) -> CombinationHash {
        CombinationHash::of(self)
    }

    pub fn structure_hash(&self) -> StructureHash {
        StructureHash::of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{ModuleSelection, Scalar};

    fn combo(fast: i64, risk: &str, mult: f64) -> ParameterCombination {
        let mut params = BTreeMap::new();
        params.insert("mult".to_string(), ParamValue::Scalar(Scalar::Float(mult)));
        [
            ("fast".to_string(), ParamValue::Scalar(Scalar::Int(fast))),
            (
                "risk".to_string(),
                ParamValue::Module(ModuleSelection::new(risk, params)),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(combo(10, "atr", 2.0).fingerprint(), combo(10, "atr", 2.0).fingerprint());
    }

    #[test]
    fn fingerprint_differs_for_different_values() {
        assert_ne!(combo(10, "atr", 2.0).fingerprint(), combo(10, "atr", 3.0).fingerprint());
    }

    #[test]
    fn fingerprint_distinguishes_integer_from_float() {
        let int: ParameterCombination =
            [("x".to_string(), ParamValue::Scalar(Scalar::Int(2)))].into_iter().collect();
        let float: ParameterCombination =
            [("x".to_string(), ParamValue::Scalar(Scalar::Float(2.0)))].into_iter().collect();
        assert_ne!(int.fingerprint(), float.fingerprint());
    }

    #[test]
    fn structure_hash_ignores_scalar_values() {
        assert_eq!(
            combo(10, "atr", 2.0).structure_hash(),
            combo(20, "atr", 3.0).structure_hash()
        );
        assert_ne!(
            combo(10, "atr", 2.0).structure_hash(),
            combo(10, "pct", 2.0).structure_hash()
        );
    }

    #[test]
    fn fingerprint_hashes_the_serialized_json() {
        let c = combo(10, "atr", 2.0);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(c.fingerprint().0, blake3::hash(json.as_bytes()).to_hex().to_string());
    }

    #[test]
    fn hash_is_hex_blake3() {
        let h = combo(1, "atr", 1.0).fingerprint();
        assert_eq!(h.0.len(), 64);
        assert!(h.0.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
