//! World-matrix resolution.
//!
//! Composes every node's world matrix top-down in the precomputed
//! parent-before-child order:
//!
//! ```text
//! world = parent ∘ local ∘ local⁻¹ ∘ pose
//! ```
//!
//! where `pose` is the animated delta for the current time and is replaced
//! by `local` itself when no channel wrote a delta (so an unanimated node
//! keeps its rest transform instead of collapsing to the identity). An
//! active joint override pre-multiplies into `local` before the inversion.

use glam::Affine3A;

use crate::asset::Document;
use crate::errors::{Result, RimeError};
use crate::scene::node_param::NodeParam;
use crate::scene::topology::SceneTopology;

/// Determinant threshold under which a local matrix counts as singular.
pub const DET_EPSILON: f32 = 1e-9;

/// Builds the rest-pose parameter array for a document: one [`NodeParam`]
/// per node, local matrices derived, poses identity, worlds unresolved.
#[must_use]
pub fn build_params(doc: &Document) -> Vec<NodeParam> {
    doc.nodes.iter().map(NodeParam::from_node).collect()
}

/// Resolves world matrices for every reachable node, parents first.
///
/// Fails with `DegenerateTransform` when a node's (possibly overridden)
/// local matrix is near-singular; the composition needs its inverse and a
/// silent NaN here would poison every descendant.
pub fn resolve_world(topology: &SceneTopology, params: &mut [NodeParam]) -> Result<()> {
    for entry in &topology.order {
        let parent_world = match entry.parent {
            Some(parent) => params[parent].world_matrix,
            None => Affine3A::IDENTITY,
        };
        resolve_node(entry.node, parent_world, params)?;
    }
    Ok(())
}

fn resolve_node(node: usize, parent_world: Affine3A, params: &mut [NodeParam]) -> Result<()> {
    let param = &mut params[node];

    let mut local = param.local_matrix;
    if param.updated {
        local = param.modify * local;
    }

    let pose = if param.has_identity_pose() {
        local
    } else {
        param.pose_matrix()
    };

    let det = local.matrix3.determinant();
    if det.abs() < DET_EPSILON {
        return Err(RimeError::DegenerateTransform(format!(
            "node {node} local matrix is near-singular (det = {det:e})"
        )));
    }

    // The local terms cancel unless the pose was substituted or an
    // override is active.
    param.world_matrix = parent_world * local * local.inverse() * pose;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Document, LocalTransform, Node};
    use glam::{Quat, Vec3};

    fn trs_node(translation: Vec3, children: &[u32]) -> Node {
        Node {
            transform: LocalTransform::Trs {
                translation,
                rotation: Quat::IDENTITY,
                scale: Vec3::ONE,
            },
            children: children.iter().copied().collect(),
            ..Node::default()
        }
    }

    #[test]
    fn identity_pose_world_is_local_times_parent() {
        let doc = Document {
            nodes: vec![
                trs_node(Vec3::new(1.0, 0.0, 0.0), &[1]),
                trs_node(Vec3::new(0.0, 1.0, 0.0), &[]),
            ],
            ..Document::default()
        };

        let topology = SceneTopology::build(&doc).unwrap();
        let mut params = build_params(&doc);
        resolve_world(&topology, &mut params).unwrap();

        let child_world = params[1].world_matrix.translation;
        assert!((child_world.x - 1.0).abs() < 1e-5);
        assert!((child_world.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_scale_is_rejected() {
        let mut node = trs_node(Vec3::ZERO, &[]);
        node.transform = LocalTransform::Trs {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ZERO,
        };
        let doc = Document {
            nodes: vec![node],
            ..Document::default()
        };

        let topology = SceneTopology::build(&doc).unwrap();
        let mut params = build_params(&doc);
        assert!(resolve_world(&topology, &mut params).is_err());
    }
}
