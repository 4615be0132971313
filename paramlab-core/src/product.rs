//! Cartesian product generator — counts and lazily enumerates combinations.
//!
//! Ordering is lexicographic over the nested structure:
//! 1. axis declaration order (the first axis varies slowest)
//! 2. each axis's declared value order
//! 3. for module slots, declared variant order, then that variant's own axes
//!
//! The iterator is an odometer: one frame per axis holding the current
//! candidate cursor, where a module-slot frame owns a nested odometer over the
//! chosen variant's axes. Memory is bounded by the depth of the axis tree and
//! cloning a `Combinations` snapshots its position.

use std::collections::BTreeSet;
use std::iter::FusedIterator;

use crate::axis::{
    ModuleSelection, ParamValue, ParameterCombination, ResolvedAxis, ResolvedModuleVariant,
    Scalar,
};
use crate::error::SpaceError;

// ─── Validation ──────────────────────────────────────────────────────

/// Reject empty axes and duplicate names anywhere in the tree.
///
/// An empty axis must never be read as cardinality 1 or as an empty space.
fn validate(axes: &[ResolvedAxis]) -> Result<(), SpaceError> {
    let mut names = BTreeSet::new();
    for axis in axes {
        if !names.insert(axis.name()) {
            return Err(SpaceError::invalid(axis.name(), "duplicate axis name"));
        }
        match axis {
            ResolvedAxis::Numeric { name, values } | ResolvedAxis::Discrete { name, values } => {
                if values.is_empty() {
                    return Err(SpaceError::invalid(name, "axis has no candidate values"));
                }
            }
            ResolvedAxis::ModuleSlot { name, variants } => {
                if variants.is_empty() {
                    return Err(SpaceError::invalid(name, "module slot has no variants"));
                }
                for variant in variants {
                    validate(&variant.axes)?;
                }
            }
        }
    }
    Ok(())
}

// ─── Counting ────────────────────────────────────────────────────────

/// Total number of combinations `enumerate` would yield, without enumerating.
///
/// An empty axis list counts as 1. Every multiplication and addition is
/// checked; a space larger than `i64::MAX` fails with
/// `CombinationSpaceOverflow`.
pub fn estimate_count(axes: &[ResolvedAxis]) -> Result<i64, SpaceError> {
    validate(axes)?;
    let total = product_count(axes);
    if total.is_err() {
        tracing::warn!(axes = axes.len(), "combination count overflowed");
    }
    total
}

fn product_count(axes: &[ResolvedAxis]) -> Result<i64, SpaceError> {
    axes.iter().try_fold(1_i64, |acc, axis| {
        acc.checked_mul(cardinality(axis)?)
            .ok_or(SpaceError::CombinationSpaceOverflow)
    })
}

/// Number of distinct values one (validated) axis can take.
fn cardinality(axis: &ResolvedAxis) -> Result<i64, SpaceError> {
    match axis {
        ResolvedAxis::Numeric { values, .. } | ResolvedAxis::Discrete { values, .. } => {
            i64::try_from(values.len()).map_err(|_| SpaceError::CombinationSpaceOverflow)
        }
        ResolvedAxis::ModuleSlot { variants, .. } => variants.iter().try_fold(0_i64, |acc, v| {
            acc.checked_add(product_count(&v.axes)?)
                .ok_or(SpaceError::CombinationSpaceOverflow)
        }),
    }
}

// ─── Enumeration ─────────────────────────────────────────────────────

/// Lazily enumerate every combination of `axes`.
///
/// The whole tree is validated before the iterator is returned, so a failure
/// never leaves a partially consumed sequence behind. Each call starts from
/// the first combination; callers bound total work with `estimate_count`.
pub fn enumerate(axes: &[ResolvedAxis]) -> Result<Combinations<'_>, SpaceError> {
    validate(axes)?;
    Ok(Combinations {
        odometer: Odometer::first(axes),
        state: CursorState::Fresh,
    })
}

/// Forward cursor over the combinations of one axis list.
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    odometer: Odometer<'a>,
    state: CursorState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Fresh,
    Active,
    Done,
}

impl Iterator for Combinations<'_> {
    type Item = ParameterCombination;

    fn next(&mut self) -> Option<ParameterCombination> {
        match self.state {
            CursorState::Fresh => {
                self.state = CursorState::Active;
                Some(self.odometer.current())
            }
            CursorState::Active => {
                if self.odometer.advance() {
                    Some(self.odometer.current())
                } else {
                    self.state = CursorState::Done;
                    None
                }
            }
            CursorState::Done => None,
        }
    }
}

impl FusedIterator for Combinations<'_> {}

#[derive(Debug, Clone)]
struct Odometer<'a> {
    frames: Vec<Frame<'a>>,
}

#[derive(Debug, Clone)]
struct Frame<'a> {
    name: &'a str,
    cursor: Cursor<'a>,
}

#[derive(Debug, Clone)]
enum Cursor<'a> {
    Value {
        values: &'a [Scalar],
        index: usize,
    },
    Module {
        variants: &'a [ResolvedModuleVariant],
        variant: usize,
        inner: Odometer<'a>,
    },
}

impl<'a> Odometer<'a> {
    /// Position on the first combination. Axes must already be validated.
    fn first(axes: &'a [ResolvedAxis]) -> Self {
        Self {
            frames: axes.iter().map(Frame::first).collect(),
        }
    }

    /// Step to the next combination; `false` once every frame has wrapped.
    ///
    /// An odometer with no frames has exactly one (empty) combination.
    fn advance(&mut self) -> bool {
        for frame in self.frames.iter_mut().rev() {
            if frame.cursor.advance() {
                return true;
            }
            frame.cursor.reset();
        }
        false
    }

    fn current(&self) -> ParameterCombination {
        self.frames
            .iter()
            .map(|frame| (frame.name.to_string(), frame.cursor.current()))
            .collect()
    }
}

impl<'a> Frame<'a> {
    fn first(axis: &'a ResolvedAxis) -> Self {
        let cursor = match axis {
            ResolvedAxis::Numeric { values, .. } | ResolvedAxis::Discrete { values, .. } => {
                Cursor::Value { values, index: 0 }
            }
            ResolvedAxis::ModuleSlot { variants, .. } => Cursor::Module {
                variants,
                variant: 0,
                inner: Odometer::first(&variants[0].axes),
            },
        };
        Self {
            name: axis.name(),
            cursor,
        }
    }
}

impl<'a> Cursor<'a> {
    fn advance(&mut self) -> bool {
        match self {
            Cursor::Value { values, index } => {
                if *index + 1 < values.len() {
                    *index += 1;
                    true
                } else {
                    false
                }
            }
            Cursor::Module {
                variants,
                variant,
                inner,
            } => {
                if inner.advance() {
                    return true;
                }
                let variants: &'a [ResolvedModuleVariant] = *variants;
                if *variant + 1 < variants.len() {
                    *variant += 1;
                    *inner = Odometer::first(&variants[*variant].axes);
                    true
                } else {
                    false
                }
            }
        }
    }

    fn reset(&mut self) {
        match self {
            Cursor::Value { index, .. } => *index = 0,
            Cursor::Module {
                variants,
                variant,
                inner,
            } => {
                let variants: &'a [ResolvedModuleVariant] = *variants;
                *variant = 0;
                *inner = Odometer::first(&variants[0].axes);
            }
        }
    }

    fn current(&self) -> ParamValue {
        match self {
            Cursor::Value { values, index } => ParamValue::Scalar(values[*index].clone()),
            Cursor::Module {
                variants,
                variant,
                inner,
            } => ParamValue::Module(ModuleSelection {
                type_key: variants[*variant].type_key.clone(),
                params: inner.current().into_values(),
            }),
        }
    }
}

// ─── Unranking ───────────────────────────────────────────────────────

/// The `index`-th combination (0-based) in `enumerate` order.
///
/// Returns `Ok(None)` when `index` is past the end of the space.
pub fn combination_at(
    axes: &[ResolvedAxis],
    index: u64,
) -> Result<Option<ParameterCombination>, SpaceError> {
    let total = estimate_count(axes)?;
    let Ok(index) = i64::try_from(index) else {
        return Ok(None);
    };
    if index >= total {
        return Ok(None);
    }
    Ok(Some(unrank(axes, index)?))
}

/// Mixed-radix decode: the last axis is the least significant digit.
fn unrank(axes: &[ResolvedAxis], mut index: i64) -> Result<ParameterCombination, SpaceError> {
    let mut digits = vec![0_i64; axes.len()];
    for (slot, axis) in axes.iter().enumerate().rev() {
        let radix = cardinality(axis)?;
        digits[slot] = index % radix;
        index /= radix;
    }

    axes.iter()
        .zip(digits)
        .map(|(axis, digit)| -> Result<(String, ParamValue), SpaceError> {
            Ok((axis.name().to_string(), candidate_at(axis, digit)?))
        })
        .collect()
}

fn candidate_at(axis: &ResolvedAxis, mut digit: i64) -> Result<ParamValue, SpaceError> {
    match axis {
        ResolvedAxis::Numeric { values, .. } | ResolvedAxis::Discrete { values, .. } => {
            Ok(ParamValue::Scalar(values[digit as usize].clone()))
        }
        ResolvedAxis::ModuleSlot { name, variants } => {
            for variant in variants {
                let size = product_count(&variant.axes)?;
                if digit < size {
                    return Ok(ParamValue::Module(ModuleSelection {
                        type_key: variant.type_key.clone(),
                        params: unrank(&variant.axes, digit)?.into_values(),
                    }));
                }
                digit -= size;
            }
            Err(SpaceError::invalid(name, "candidate index past the last variant"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(name: &str, values: &[i64]) -> ResolvedAxis {
        ResolvedAxis::Numeric {
            name: name.into(),
            values: values.iter().map(|&v| Scalar::Int(v)).collect(),
        }
    }

    fn variant(type_key: &str, axes: Vec<ResolvedAxis>) -> ResolvedModuleVariant {
        ResolvedModuleVariant {
            type_key: type_key.into(),
            axes,
        }
    }

    fn slot(name: &str, variants: Vec<ResolvedModuleVariant>) -> ResolvedAxis {
        ResolvedAxis::ModuleSlot {
            name: name.into(),
            variants,
        }
    }

    fn int_of(combo: &ParameterCombination, name: &str) -> i64 {
        combo.get(name).and_then(ParamValue::as_scalar).and_then(Scalar::as_i64).unwrap()
    }

    #[test]
    fn empty_space_has_one_empty_combination() {
        assert_eq!(estimate_count(&[]).unwrap(), 1);
        let all: Vec<_> = enumerate(&[]).unwrap().collect();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_empty());
    }

    #[test]
    fn first_axis_varies_slowest() {
        let axes = vec![ints("a", &[1, 2]), ints("b", &[10, 20, 30])];
        let pairs: Vec<(i64, i64)> = enumerate(&axes)
            .unwrap()
            .map(|c| (int_of(&c, "a"), int_of(&c, "b")))
            .collect();
        assert_eq!(
            pairs,
            vec![(1, 10), (1, 20), (1, 30), (2, 10), (2, 20), (2, 30)]
        );
    }

    #[test]
    fn slot_cardinality_sums_variants() {
        let axes = vec![slot(
            "risk",
            vec![variant("none", vec![]), variant("atr", vec![ints("p", &[1, 2, 3])])],
        )];
        assert_eq!(estimate_count(&axes).unwrap(), 4);
    }

    #[test]
    fn empty_values_are_invalid_for_count_and_enumerate() {
        let axes = vec![ints("a", &[])];
        assert!(matches!(estimate_count(&axes), Err(SpaceError::InvalidAxis { .. })));
        assert!(matches!(enumerate(&axes), Err(SpaceError::InvalidAxis { .. })));
    }

    #[test]
    fn empty_variant_list_is_invalid() {
        let axes = vec![ints("a", &[1]), slot("risk", vec![])];
        assert!(matches!(estimate_count(&axes), Err(SpaceError::InvalidAxis { .. })));
        assert!(enumerate(&axes).is_err());
    }

    #[test]
    fn nested_empty_axis_is_invalid() {
        let axes = vec![slot("risk", vec![variant("atr", vec![ints("p", &[])])])];
        assert!(enumerate(&axes).is_err());
    }

    #[test]
    fn duplicate_resolved_names_are_invalid() {
        let axes = vec![ints("a", &[1]), ints("a", &[2])];
        assert!(estimate_count(&axes).is_err());
    }

    #[test]
    fn overflow_is_reported_not_wrapped() {
        let big: Vec<i64> = (0..1 << 16).collect();
        let axes: Vec<ResolvedAxis> = (0..4).map(|i| ints(&format!("x{i}"), &big)).collect();
        // 2^64 > i64::MAX
        assert_eq!(
            estimate_count(&axes),
            Err(SpaceError::CombinationSpaceOverflow)
        );
    }

    #[test]
    fn slot_sum_overflow_is_reported() {
        let big: Vec<i64> = (0..1 << 16).collect();
        let wide: Vec<ResolvedAxis> = (0..3).map(|i| ints(&format!("y{i}"), &big)).collect();
        // 2^49 for the slot, times 2^16 outer = 2^65 overall
        let axes = vec![
            ints("outer", &big),
            slot("s", vec![variant("a", wide.clone()), variant("b", wide)]),
        ];
        assert_eq!(
            estimate_count(&axes),
            Err(SpaceError::CombinationSpaceOverflow)
        );
    }

    #[test]
    fn clone_resumes_from_same_position() {
        let axes = vec![ints("a", &[1, 2, 3]), ints("b", &[4, 5])];
        let mut it = enumerate(&axes).unwrap();
        it.next();
        it.next();
        let snapshot = it.clone();
        let rest: Vec<_> = it.collect();
        let again: Vec<_> = snapshot.collect();
        assert_eq!(rest, again);
        assert_eq!(rest.len(), 4);
    }

    #[test]
    fn iterator_is_fused() {
        let axes = vec![ints("a", &[1])];
        let mut it = enumerate(&axes).unwrap();
        assert!(it.next().is_some());
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn combination_at_matches_enumeration() {
        let axes = vec![
            ints("a", &[1, 2]),
            slot(
                "risk",
                vec![
                    variant("none", vec![]),
                    variant("atr", vec![ints("p", &[5, 6]), ints("m", &[1, 2, 3])]),
                ],
            ),
            ints("z", &[7, 8]),
        ];
        let all: Vec<_> = enumerate(&axes).unwrap().collect();
        assert_eq!(all.len() as i64, estimate_count(&axes).unwrap());
        for (i, combo) in all.iter().enumerate() {
            assert_eq!(combination_at(&axes, i as u64).unwrap().as_ref(), Some(combo));
        }
        assert_eq!(combination_at(&axes, all.len() as u64).unwrap(), None);
    }
}
