//! Keyframe sampling.
//!
//! Extracts animation sampler/channel tables from the asset description and
//! evaluates them at arbitrary clip times: step, linear and cubic-spline
//! interpolation over translation / rotation / scale / morph-weight
//! channels, written into per-worker pose state.

pub mod channel;
pub mod sampler;
mod values;

pub use channel::{Channel, ChannelValues, MorphWeightTable};
pub use sampler::Sampler;
pub use values::Interpolatable;

// The description-side enums live with the asset read contract.
pub use crate::asset::{InterpolationMode, PropertyKind};
