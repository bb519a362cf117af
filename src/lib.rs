//! rime — a CPU skeletal-animation baking engine.
//!
//! Given a node-hierarchy 3-D asset description (glTF-style: nodes, skins,
//! morph targets, animation clips), rime precomputes per clip and per
//! discrete frame the fully skinned and morph-blended vertex buffers plus a
//! bounding volume, so playback is a stateless replay by frame index.
//! A second, self-contained component evaluates centripetal Catmull-Rom
//! motion paths over polylines for the motion-control layer.
//!
//! Rendering, windowing, input and texture decoding are external
//! collaborators: rime consumes [`asset::Document`] and produces immutable
//! [`bake::Frame`]s and path points.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod asset;
pub mod bake;
pub mod errors;
pub mod geometry;
pub mod morph;
pub mod path;
pub mod scene;
pub mod skinning;

pub use asset::Document;
pub use bake::{
    AnimatedModel, AnimationBaker, BakeSettings, BakedClip, Capabilities, Frame, MaterialBinding,
    Model, Playback, StaticModel,
};
pub use errors::{Result, RimeError};
pub use geometry::{BoundingBox, MeshBuffer, Vertex};
pub use morph::{MorphTargets, MorphTransition};
pub use path::PathSpline;
pub use scene::{NodeParam, PoseOverrides, SceneTopology};
