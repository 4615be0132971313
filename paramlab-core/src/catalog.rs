//! Descriptor catalog — where strategies and module variants declare their axes.
//!
//! The engine never discovers strategies itself. It reads them from a
//! `DescriptorSource`; `Catalog` is the TOML-backed implementation:
//!
//! ```toml
//! [[strategy]]
//! name = "ma_crossover"
//!
//! [[strategy.axis]]
//! name = "fast"
//! kind = "range"
//! min = 5
//! max = 20
//! step = 5
//!
//! [[strategy.axis]]
//! name = "risk"
//! kind = "module"
//! capability = "risk_filter"
//!
//! [[module]]
//! capability = "risk_filter"
//! type_key = "atr_stop"
//!
//! [[module.axis]]
//! name = "multiplier"
//! kind = "discrete"
//! values = [1.5, 2.0, 3.0]
//! ```
//!
//! Module slots are linked to every `[[module]]` of the matching capability
//! at load time, in file order, so each strategy is held as a complete
//! unresolved tree.

use serde::Deserialize;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::axis::{
    DiscreteSetAxis, ModuleSlotAxis, ModuleVariant, NumericKind, NumericRangeAxis, Scalar,
    ScalarKind, UnresolvedAxis,
};
use crate::error::SpaceError;
use crate::resolve::ResolveLimits;
use crate::space::SpaceDescriptor;

// ─── Error type ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse catalog TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Space(#[from] SpaceError),
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
    #[error("strategy '{0}' is declared more than once")]
    DuplicateStrategy(String),
    #[error("module capability '{0}' contains a slot of itself")]
    ModuleCycle(String),
    #[error("catalog links more than {0} axes")]
    TooManyLinkedAxes(usize),
}

// ─── Source trait ────────────────────────────────────────────────────

/// An unresolved strategy: identity plus ordered axis declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyDescriptor {
    pub name: String,
    pub axes: Vec<UnresolvedAxis>,
}

/// Read-only provider of strategy and module declarations.
pub trait DescriptorSource {
    /// Strategy names in declaration order.
    fn strategy_names(&self) -> Vec<&str>;

    fn strategy(&self, name: &str) -> Option<&StrategyDescriptor>;

    /// Variants of a module capability in declaration order; empty if unknown.
    fn module_variants(&self, capability: &str) -> &[ModuleVariant];

    fn limits(&self) -> ResolveLimits {
        ResolveLimits::default()
    }
}

/// Look up a strategy and resolve its axes.
pub fn resolve_strategy(
    source: &dyn DescriptorSource,
    name: &str,
) -> Result<SpaceDescriptor, CatalogError> {
    let strategy = source
        .strategy(name)
        .ok_or_else(|| CatalogError::UnknownStrategy(name.to_string()))?;
    Ok(SpaceDescriptor::resolve_with(
        &strategy.name,
        &strategy.axes,
        &source.limits(),
    )?)
}

// ─── TOML catalog ────────────────────────────────────────────────────

/// In-memory catalog loaded from TOML.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    strategies: Vec<StrategyDescriptor>,
    modules: BTreeMap<String, Vec<ModuleVariant>>,
    limits: ResolveLimits,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    limits: ResolveLimits,
    #[serde(default)]
    strategy: Vec<StrategyDecl>,
    #[serde(default)]
    module: Vec<ModuleDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StrategyDecl {
    name: String,
    #[serde(default)]
    axis: Vec<AxisDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleDecl {
    capability: String,
    type_key: String,
    #[serde(default)]
    axis: Vec<AxisDecl>,
}

/// Raw axis table. `kind` stays a string so unknown kinds surface as
/// `SpaceError::UnresolvedAxisType` instead of a generic parse error.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AxisDecl {
    name: String,
    kind: String,
    min: Option<Scalar>,
    max: Option<Scalar>,
    step: Option<Scalar>,
    numeric: Option<NumericKind>,
    values: Option<Vec<Scalar>>,
    element: Option<ScalarKind>,
    capability: Option<String>,
    variants: Option<Vec<String>>,
}

impl Catalog {
    /// Load a catalog from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a catalog from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        let linker = Linker::new(&file.module, file.limits.max_linked_axes);

        let mut seen = BTreeSet::new();
        let mut strategies = Vec::with_capacity(file.strategy.len());
        for decl in &file.strategy {
            if !seen.insert(decl.name.as_str()) {
                return Err(CatalogError::DuplicateStrategy(decl.name.clone()));
            }
            let axes = linker.link_all(&decl.axis, &mut Vec::new())?;
            strategies.push(StrategyDescriptor {
                name: decl.name.clone(),
                axes,
            });
        }

        let mut modules: BTreeMap<String, Vec<ModuleVariant>> = BTreeMap::new();
        for decl in &file.module {
            let mut stack = vec![decl.capability.clone()];
            let axes = linker.link_all(&decl.axis, &mut stack)?;
            modules
                .entry(decl.capability.clone())
                .or_default()
                .push(ModuleVariant::new(&decl.type_key, axes));
        }

        debug!(
            strategies = strategies.len(),
            capabilities = modules.len(),
            linked_axes = linker.linked.get(),
            "loaded catalog"
        );
        Ok(Self {
            strategies,
            modules,
            limits: file.limits,
        })
    }

    /// Add or replace a strategy declared in code.
    pub fn insert_strategy(&mut self, strategy: StrategyDescriptor) {
        match self.strategies.iter_mut().find(|s| s.name == strategy.name) {
            Some(existing) => *existing = strategy,
            None => self.strategies.push(strategy),
        }
    }

    pub fn with_limits(mut self, limits: ResolveLimits) -> Self {
        self.limits = limits;
        self
    }
}

impl DescriptorSource for Catalog {
    fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name.as_str()).collect()
    }

    fn strategy(&self, name: &str) -> Option<&StrategyDescriptor> {
        self.strategies.iter().find(|s| s.name == name)
    }

    fn module_variants(&self, capability: &str) -> &[ModuleVariant] {
        self.modules.get(capability).map(Vec::as_slice).unwrap_or(&[])
    }

    fn limits(&self) -> ResolveLimits {
        self.limits
    }
}

// ─── Linking ─────────────────────────────────────────────────────────

/// Turns raw axis tables into unresolved axes, expanding module slots.
///
/// Every slot gets its own copy of the linked variants, so a capability
/// reached through several slots is copied once per path. `budget` bounds
/// the total across the whole catalog.
struct Linker<'a> {
    by_capability: BTreeMap<&'a str, Vec<&'a ModuleDecl>>,
    budget: usize,
    linked: Cell<usize>,
}

impl<'a> Linker<'a> {
    fn new(modules: &'a [ModuleDecl], budget: usize) -> Self {
        let mut by_capability: BTreeMap<&str, Vec<&ModuleDecl>> = BTreeMap::new();
        for module in modules {
            by_capability
                .entry(module.capability.as_str())
                .or_default()
                .push(module);
        }
        Self {
            by_capability,
            budget,
            linked: Cell::new(0),
        }
    }

    fn link_all(
        &self,
        decls: &[AxisDecl],
        stack: &mut Vec<String>,
    ) -> Result<Vec<UnresolvedAxis>, CatalogError> {
        decls.iter().map(|decl| self.link(decl, stack)).collect()
    }

    fn link(&self, decl: &AxisDecl, stack: &mut Vec<String>) -> Result<UnresolvedAxis, CatalogError> {
        let linked = self.linked.get() + 1;
        if linked > self.budget {
            return Err(CatalogError::TooManyLinkedAxes(self.budget));
        }
        self.linked.set(linked);
        match decl.kind.as_str() {
            "range" => Ok(range_axis(decl)?.into()),
            "discrete" => Ok(discrete_axis(decl)?.into()),
            "module" => self.module_axis(decl, stack).map(UnresolvedAxis::from),
            other => Err(SpaceError::UnresolvedAxisType {
                axis: decl.name.clone(),
                kind: other.to_string(),
            }
            .into()),
        }
    }

    fn module_axis(
        &self,
        decl: &AxisDecl,
        stack: &mut Vec<String>,
    ) -> Result<ModuleSlotAxis, CatalogError> {
        let capability = decl
            .capability
            .as_deref()
            .ok_or_else(|| SpaceError::invalid(&decl.name, "module axis needs a capability"))?;
        if stack.iter().any(|c| c == capability) {
            return Err(CatalogError::ModuleCycle(capability.to_string()));
        }

        let declared = self
            .by_capability
            .get(capability)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let chosen: Vec<&ModuleDecl> = match &decl.variants {
            None => declared.to_vec(),
            Some(keys) => keys
                .iter()
                .map(|key| {
                    declared
                        .iter()
                        .copied()
                        .find(|m| &m.type_key == key)
                        .ok_or_else(|| {
                            SpaceError::invalid(
                                &decl.name,
                                format!("'{capability}' has no variant '{key}'"),
                            )
                        })
                })
                .collect::<Result<_, _>>()?,
        };

        stack.push(capability.to_string());
        let variants = chosen
            .iter()
            .map(|m| Ok(ModuleVariant::new(&m.type_key, self.link_all(&m.axis, stack)?)))
            .collect::<Result<Vec<_>, CatalogError>>();
        stack.pop();

        Ok(ModuleSlotAxis {
            name: decl.name.clone(),
            capability: capability.to_string(),
            variants: variants?,
        })
    }
}

fn bound(decl: &AxisDecl, label: &str, value: &Option<Scalar>) -> Result<f64, SpaceError> {
    match value {
        Some(Scalar::Int(v)) => Ok(*v as f64),
        Some(Scalar::Float(v)) => Ok(*v),
        Some(other) => Err(SpaceError::invalid(
            &decl.name,
            format!("{label} must be numeric, got {other}"),
        )),
        None => Err(SpaceError::invalid(
            &decl.name,
            format!("range axis needs '{label}'"),
        )),
    }
}

fn range_axis(decl: &AxisDecl) -> Result<NumericRangeAxis, SpaceError> {
    let min = bound(decl, "min", &decl.min)?;
    let max = bound(decl, "max", &decl.max)?;
    let step = bound(decl, "step", &decl.step)?;
    let all_int = [&decl.min, &decl.max, &decl.step]
        .iter()
        .all(|v| matches!(v, Some(Scalar::Int(_))));
    let numeric_kind = decl.numeric.unwrap_or(if all_int {
        NumericKind::Integer
    } else {
        NumericKind::Float
    });
    Ok(NumericRangeAxis {
        name: decl.name.clone(),
        min,
        max,
        step,
        numeric_kind,
    })
}

fn discrete_axis(decl: &AxisDecl) -> Result<DiscreteSetAxis, SpaceError> {
    let values = decl
        .values
        .clone()
        .ok_or_else(|| SpaceError::invalid(&decl.name, "discrete axis needs 'values'"))?;
    let mut axis = DiscreteSetAxis::new(&decl.name, values);
    if let Some(kind) = decl.element {
        axis.element_kind = kind;
    }
    Ok(axis)
}
