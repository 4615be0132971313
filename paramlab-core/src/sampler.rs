//! Seeded random sampling of trials from a parameter space.
//!
//! Draws distinct trial indices uniformly and decodes each one with
//! `combination_at`, so a sample never materializes the full space. Indices
//! come back in ascending trial order: the same seed always yields the same
//! sample in the same order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::axis::ParameterCombination;
use crate::error::SpaceError;
use crate::space::SpaceDescriptor;

/// A sampled trial: its position in full enumeration order and its values.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledTrial {
    pub index: u64,
    pub combination: ParameterCombination,
}

/// Draw up to `n` distinct trial indices using `rng`.
///
/// When `n` is at least the size of the space, every index is returned.
pub fn sample_indices_with<R: Rng + ?Sized>(
    space: &SpaceDescriptor,
    n: usize,
    rng: &mut R,
) -> Result<Vec<u64>, SpaceError> {
    let total = space.estimate_count()?;
    let length = usize::try_from(total).map_err(|_| SpaceError::CombinationSpaceOverflow)?;
    let amount = n.min(length);

    let mut indices: Vec<u64> = rand::seq::index::sample(rng, length, amount)
        .into_iter()
        .map(|i| i as u64)
        .collect();
    indices.sort_unstable();
    Ok(indices)
}

/// Draw up to `n` distinct trial indices from a seeded `StdRng`.
pub fn sample_indices(space: &SpaceDescriptor, n: usize, seed: u64) -> Result<Vec<u64>, SpaceError> {
    let mut rng = StdRng::seed_from_u64(seed);
    sample_indices_with(space, n, &mut rng)
}

/// Draw up to `n` distinct trials from a seeded `StdRng`.
pub fn sample_combinations(
    space: &SpaceDescriptor,
    n: usize,
    seed: u64,
) -> Result<Vec<SampledTrial>, SpaceError> {
    sample_indices(space, n, seed)?
        .into_iter()
        .filter_map(|index| match space.combination_at(index) {
            Ok(Some(combination)) => Some(Ok(SampledTrial { index, combination })),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{DiscreteSetAxis, ModuleSlotAxis, ModuleVariant, NumericRangeAxis, Scalar};

    fn space() -> SpaceDescriptor {
        SpaceDescriptor::resolve(
            "donchian",
            &[
                NumericRangeAxis::integer("lookback", 10, 200, 10).into(),
                ModuleSlotAxis {
                    name: "exit".into(),
                    capability: "exit_rule".into(),
                    variants: vec![
                        ModuleVariant::new("none", vec![]),
                        ModuleVariant::new(
                            "trailing",
                            vec![DiscreteSetAxis::new(
                                "pct",
                                vec![Scalar::Float(0.02), Scalar::Float(0.05), Scalar::Float(0.1)],
                            )
                            .into()],
                        ),
                    ],
                }
                .into(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn same_seed_same_sample() {
        let s = space();
        assert_eq!(
            sample_combinations(&s, 10, 42).unwrap(),
            sample_combinations(&s, 10, 42).unwrap()
        );
    }

    #[test]
    fn different_seeds_differ() {
        let s = space();
        assert_ne!(sample_indices(&s, 10, 1).unwrap(), sample_indices(&s, 10, 2).unwrap());
    }

    #[test]
    fn indices_are_distinct_sorted_and_in_range() {
        let s = space();
        let total = s.estimate_count().unwrap() as u64;
        let idx = sample_indices(&s, 25, 7).unwrap();
        assert_eq!(idx.len(), 25);
        assert!(idx.windows(2).all(|w| w[0] < w[1]));
        assert!(idx.iter().all(|&i| i < total));
    }

    #[test]
    fn oversized_request_returns_whole_space_in_order() {
        let s = space();
        let sampled = sample_combinations(&s, 10_000, 3).unwrap();
        let all: Vec<_> = s.enumerate().unwrap().collect();
        assert_eq!(sampled.len(), all.len());
        for (trial, combo) in sampled.iter().zip(&all) {
            assert_eq!(&trial.combination, combo);
        }
    }

    #[test]
    fn sampled_trial_matches_enumeration_position() {
        let s = space();
        let all: Vec<_> = s.enumerate().unwrap().collect();
        for trial in sample_combinations(&s, 15, 11).unwrap() {
            assert_eq!(all[trial.index as usize], trial.combination);
        }
    }
}
