//! Domain models for the AgriSense platform

mod detection;
mod features;
mod observation;
mod prediction;
mod risk;

pub use detection::*;
pub use features::*;
pub use observation::*;
pub use prediction::*;
pub use risk::*;
