//! Axis resolver — expands declared axes into explicit candidate lists.
//!
//! Resolution is a pure function: each call builds a fresh resolved tree and
//! module-slot variants are resolved through the same entry point, so nesting
//! depth is unbounded.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::axis::{
    DiscreteSetAxis, ModuleSlotAxis, NumericKind, NumericRangeAxis, ResolvedAxis,
    ResolvedModuleVariant, Scalar, UnresolvedAxis,
};
use crate::error::SpaceError;

/// Largest magnitude at which every integer is exactly representable as `f64`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Rounding slack on `span / step`, in ULPs of the quotient, so
/// `0.1..=0.3 step 0.1` still reaches `0.3`.
const FLOAT_STEP_ULPS: f64 = 4.0;

/// Guards applied while expanding ranges and linking catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveLimits {
    /// Maximum number of values a single range axis may expand to.
    pub max_axis_values: usize,
    /// Maximum number of axes a catalog may link in total, counting every
    /// copy made when several slots share a capability.
    pub max_linked_axes: usize,
}

impl Default for ResolveLimits {
    fn default() -> Self {
        Self {
            max_axis_values: 1_000_000,
            max_linked_axes: 100_000,
        }
    }
}

/// Resolve one axis with default limits.
pub fn resolve_axis(axis: &UnresolvedAxis) -> Result<ResolvedAxis, SpaceError> {
    resolve_axis_with(axis, &ResolveLimits::default())
}

/// Resolve an ordered axis list with default limits.
pub fn resolve_axes(axes: &[UnresolvedAxis]) -> Result<Vec<ResolvedAxis>, SpaceError> {
    resolve_axes_with(axes, &ResolveLimits::default())
}

/// Resolve an ordered axis list, rejecting duplicate names within the list.
pub fn resolve_axes_with(
    axes: &[UnresolvedAxis],
    limits: &ResolveLimits,
) -> Result<Vec<ResolvedAxis>, SpaceError> {
    let mut seen = BTreeSet::new();
    let mut resolved = Vec::with_capacity(axes.len());
    for axis in axes {
        if !seen.insert(axis.name()) {
            return Err(SpaceError::invalid(axis.name(), "duplicate axis name"));
        }
        resolved.push(resolve_axis_with(axis, limits)?);
    }
    Ok(resolved)
}

/// Resolve one axis.
pub fn resolve_axis_with(
    axis: &UnresolvedAxis,
    limits: &ResolveLimits,
) -> Result<ResolvedAxis, SpaceError> {
    let resolved = match axis {
        UnresolvedAxis::NumericRange(range) => resolve_range(range, limits)?,
        UnresolvedAxis::DiscreteSet(set) => resolve_discrete(set)?,
        UnresolvedAxis::ModuleSlot(slot) => resolve_slot(slot, limits)?,
    };
    debug!(
        axis = resolved.name(),
        candidates = resolved.candidate_count(),
        "resolved axis"
    );
    Ok(resolved)
}

// ─── Numeric ranges ──────────────────────────────────────────────────

fn resolve_range(range: &NumericRangeAxis, limits: &ResolveLimits) -> Result<ResolvedAxis, SpaceError> {
    let name = range.name.as_str();
    if !(range.min.is_finite() && range.max.is_finite() && range.step.is_finite()) {
        return Err(SpaceError::invalid(name, "range bounds must be finite"));
    }
    if range.step <= 0.0 {
        return Err(SpaceError::invalid(
            name,
            format!("step must be positive, got {}", range.step),
        ));
    }
    if range.min > range.max {
        return Err(SpaceError::invalid(
            name,
            format!("min {} exceeds max {}", range.min, range.max),
        ));
    }

    let values = match range.numeric_kind {
        NumericKind::Integer => integer_steps(range, limits)?,
        NumericKind::Float => float_steps(range, limits)?,
    };
    Ok(ResolvedAxis::Numeric {
        name: range.name.clone(),
        values,
    })
}

fn exact_integer(name: &str, label: &str, v: f64) -> Result<i64, SpaceError> {
    if v.fract() != 0.0 {
        return Err(SpaceError::invalid(
            name,
            format!("{label} {v} is fractional on an integer axis"),
        ));
    }
    if v.abs() > MAX_EXACT_INT {
        return Err(SpaceError::invalid(
            name,
            format!("{label} {v} is outside the exact integer range"),
        ));
    }
    Ok(v as i64)
}

fn integer_steps(range: &NumericRangeAxis, limits: &ResolveLimits) -> Result<Vec<Scalar>, SpaceError> {
    let name = range.name.as_str();
    let min = exact_integer(name, "min", range.min)?;
    let max = exact_integer(name, "max", range.max)?;
    let step = exact_integer(name, "step", range.step)?;

    // Bounds are within ±2^53, so the span cannot overflow i64.
    let count = (max - min) / step + 1;
    check_limit(name, count as u64, limits)?;

    Ok((0..count).map(|k| Scalar::Int(min + k * step)).collect())
}

fn float_steps(range: &NumericRangeAxis, limits: &ResolveLimits) -> Result<Vec<Scalar>, SpaceError> {
    let name = range.name.as_str();
    let span = (range.max - range.min) / range.step;
    let last = (span + span * FLOAT_STEP_ULPS * f64::EPSILON).floor();
    if !last.is_finite() || last >= limits.max_axis_values as f64 {
        return Err(too_many(name, limits));
    }
    let count = last as u64 + 1;
    check_limit(name, count, limits)?;

    // Multiply instead of accumulating so error does not drift along the axis.
    // Only the last value can pass `max`, and then by rounding alone.
    Ok((0..count)
        .map(|k| Scalar::Float((range.min + k as f64 * range.step).min(range.max)))
        .collect())
}

fn check_limit(name: &str, count: u64, limits: &ResolveLimits) -> Result<(), SpaceError> {
    if count > limits.max_axis_values as u64 {
        return Err(too_many(name, limits));
    }
    Ok(())
}

fn too_many(name: &str, limits: &ResolveLimits) -> SpaceError {
    SpaceError::invalid(
        name,
        format!("range expands past {} values", limits.max_axis_values),
    )
}

// ─── Discrete sets ───────────────────────────────────────────────────

fn resolve_discrete(set: &DiscreteSetAxis) -> Result<ResolvedAxis, SpaceError> {
    let name = set.name.as_str();
    if set.values.is_empty() {
        return Err(SpaceError::invalid(name, "discrete set has no values"));
    }
    for value in &set.values {
        if value.kind() != set.element_kind {
            return Err(SpaceError::invalid(
                name,
                format!(
                    "value {value} is {} but the set holds {}",
                    value.kind(),
                    set.element_kind
                ),
            ));
        }
        if let Scalar::Float(v) = value {
            if !v.is_finite() {
                return Err(SpaceError::invalid(name, "discrete values must be finite"));
            }
        }
    }
    Ok(ResolvedAxis::Discrete {
        name: set.name.clone(),
        values: set.values.clone(),
    })
}

// ─── Module slots ────────────────────────────────────────────────────

fn resolve_slot(slot: &ModuleSlotAxis, limits: &ResolveLimits) -> Result<ResolvedAxis, SpaceError> {
    let name = slot.name.as_str();
    if slot.variants.is_empty() {
        return Err(SpaceError::invalid(
            name,
            format!("module slot '{}' has no variants", slot.capability),
        ));
    }

    let mut keys = BTreeSet::new();
    let mut variants = Vec::with_capacity(slot.variants.len());
    for variant in &slot.variants {
        if !keys.insert(variant.type_key.as_str()) {
            return Err(SpaceError::invalid(
                name,
                format!("duplicate variant '{}'", variant.type_key),
            ));
        }
        variants.push(ResolvedModuleVariant {
            type_key: variant.type_key.clone(),
            axes: resolve_axes_with(&variant.axes, limits)?,
        });
    }
    Ok(ResolvedAxis::ModuleSlot {
        name: slot.name.clone(),
        variants,
    })
}
