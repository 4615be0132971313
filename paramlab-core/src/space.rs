//! Space descriptor — the resolved, read-only tunable surface of one strategy.
//!
//! Counting, enumeration, and unranking all delegate to `product`; this type
//! only ties a strategy identity to its axis list and knows how to split the
//! space into shards for independent enumeration.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::axis::{ParameterCombination, ResolvedAxis, UnresolvedAxis};
use crate::error::SpaceError;
use crate::product::{self, Combinations};
use crate::resolve::{resolve_axes_with, ResolveLimits};

/// Resolved axes of one strategy (or one module variant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceDescriptor {
    strategy: String,
    axes: Vec<ResolvedAxis>,
}

impl SpaceDescriptor {
    pub fn new(strategy: impl Into<String>, axes: Vec<ResolvedAxis>) -> Self {
        Self {
            strategy: strategy.into(),
            axes,
        }
    }

    /// Resolve a strategy's declared axes with default limits.
    pub fn resolve(strategy: impl Into<String>, axes: &[UnresolvedAxis]) -> Result<Self, SpaceError> {
        Self::resolve_with(strategy, axes, &ResolveLimits::default())
    }

    pub fn resolve_with(
        strategy: impl Into<String>,
        axes: &[UnresolvedAxis],
        limits: &ResolveLimits,
    ) -> Result<Self, SpaceError> {
        let strategy = strategy.into();
        let axes = resolve_axes_with(axes, limits)?;
        info!(
            strategy = %strategy,
            axes = axes.len(),
            total = ?product::estimate_count(&axes).ok(),
            "resolved parameter space"
        );
        Ok(Self { strategy, axes })
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn axes(&self) -> &[ResolvedAxis] {
        &self.axes
    }

    pub fn estimate_count(&self) -> Result<i64, SpaceError> {
        product::estimate_count(&self.axes)
    }

    pub fn enumerate(&self) -> Result<Combinations<'_>, SpaceError> {
        product::enumerate(&self.axes)
    }

    pub fn combination_at(&self, index: u64) -> Result<Option<ParameterCombination>, SpaceError> {
        product::combination_at(&self.axes, index)
    }

    /// Restrict the outermost axis to shard `index` of `count`.
    ///
    /// The outermost axis's top-level candidates (values, or variants for a
    /// module slot) are cut into `count` contiguous chunks, so enumerating
    /// shards `0..count` in order reproduces the full sequence. Returns `None`
    /// when `index >= count` or the shard has no candidates. A space with no
    /// axes has its single combination in shard 0.
    pub fn shard(&self, index: usize, count: usize) -> Option<SpaceDescriptor> {
        if index >= count {
            return None;
        }
        let Some((outer, rest)) = self.axes.split_first() else {
            return (index == 0).then(|| self.clone());
        };

        let n = outer.candidate_count() as u128;
        let start = (index as u128 * n / count as u128) as usize;
        let end = ((index as u128 + 1) * n / count as u128) as usize;
        if start == end {
            return None;
        }

        let restricted = match outer {
            ResolvedAxis::Numeric { name, values } => ResolvedAxis::Numeric {
                name: name.clone(),
                values: values[start..end].to_vec(),
            },
            ResolvedAxis::Discrete { name, values } => ResolvedAxis::Discrete {
                name: name.clone(),
                values: values[start..end].to_vec(),
            },
            ResolvedAxis::ModuleSlot { name, variants } => ResolvedAxis::ModuleSlot {
                name: name.clone(),
                variants: variants[start..end].to_vec(),
            },
        };

        let mut axes = Vec::with_capacity(self.axes.len());
        axes.push(restricted);
        axes.extend_from_slice(rest);
        Some(SpaceDescriptor {
            strategy: self.strategy.clone(),
            axes,
        })
    }

    /// Trial number of the first combination in shard `index` of `count`.
    pub fn shard_offset(&self, index: usize, count: usize) -> Result<i64, SpaceError> {
        (0..index.min(count))
            .filter_map(|i| self.shard(i, count))
            .try_fold(0_i64, |acc, shard| {
                acc.checked_add(shard.estimate_count()?)
                    .ok_or(SpaceError::CombinationSpaceOverflow)
            })
    }
}
