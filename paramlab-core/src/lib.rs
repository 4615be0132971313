//! ParamLab Core — parameter-space definition and combinatorial enumeration.
//!
//! This crate describes what an optimizer may tune and walks every choice:
//! - Axis model (numeric ranges, discrete sets, nested module slots)
//! - Resolver that turns declarations into finite, ordered candidate lists
//! - Space descriptor with overflow-checked counting and sharding
//! - Lazy Cartesian-product enumeration plus index-based unranking
//! - Seeded sampling, combination fingerprints, and the TOML descriptor catalog
//! - Factory boundary where combinations become runnable strategies

pub mod axis;
pub mod catalog;
pub mod error;
pub mod factory;
pub mod fingerprint;
pub mod product;
pub mod resolve;
pub mod sampler;
pub mod space;

pub use axis::{
    DiscreteSetAxis, ModuleSelection, ModuleSlotAxis, ModuleVariant, NumericKind,
    NumericRangeAxis, ParamValue, ParameterCombination, ResolvedAxis, ResolvedModuleVariant,
    Scalar, ScalarKind, UnresolvedAxis,
};
pub use catalog::{resolve_strategy, Catalog, CatalogError, DescriptorSource, StrategyDescriptor};
pub use error::SpaceError;
pub use factory::{FactoryError, ModuleRegistry, StrategyFactory};
pub use fingerprint::{CombinationHash, StructureHash};
pub use product::Combinations;
pub use resolve::ResolveLimits;
pub use space::SpaceDescriptor;
