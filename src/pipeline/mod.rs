//! One-call variant runs: grouping, routing, simulation, and KPIs.
//!
//! [`run_variant`] chains every stage for one parameter set. Sweeps and
//! scenario comparisons call it once per variant.

mod config;
mod variant;

pub use config::{Grouping, VariantConfig};
pub use variant::{run_variant, VariantRun};
