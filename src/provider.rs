//! Identity-provider descriptors (data) and strategies (behavior).
//!
//! `descriptor` holds the validated, HTTPS-only token endpoint. `strategy` defines
//! [`ProviderStrategy`], the hook that maps token endpoint failures into the crate error
//! taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
