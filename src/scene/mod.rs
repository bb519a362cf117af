//! Scene-graph resolution.
//!
//! - [`NodeParam`]: mutable per-node evaluation state (one array per worker)
//! - [`SceneTopology`]: parent-before-child visit order, built once per asset
//! - [`resolve_world`]: the top-down world-matrix pass
//! - [`PoseOverrides`]: external joint overrides addressed by node index

pub mod node_param;
pub mod resolver;
pub mod topology;

pub use node_param::{NodeParam, PoseOverrides};
pub use resolver::{DET_EPSILON, build_params, resolve_world};
pub use topology::{SceneTopology, TopoEntry};
