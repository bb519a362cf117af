//! Per-node evaluation state.

use glam::{Affine3A, Quat, Vec3};

use crate::asset::{LocalTransform, Node};

/// Mutable evaluation state for one node.
///
/// One array of these exists per bake worker — never shared across frames or
/// threads. `world_matrix` is only valid after a top-down resolution pass
/// ([`crate::scene::resolve_world`]) has run since the last pose change.
#[derive(Debug, Clone)]
pub struct NodeParam {
    /// Rest-pose local matrix, derived once from the asset.
    pub local_matrix: Affine3A,
    /// World matrix, recomputed every evaluation pass.
    pub world_matrix: Affine3A,

    /// Animated pose delta for the current time (identity when unanimated).
    pub pose_translation: Vec3,
    pub pose_rotation: Quat,
    pub pose_scale: Vec3,

    /// External joint override, applied only while `updated` is set.
    pub modify: Affine3A,
    pub updated: bool,
}

impl NodeParam {
    /// Builds rest-pose state from a node record. The local matrix composes
    /// scale, rotation and translation in the asset's convention; composed
    /// matrices are taken verbatim.
    #[must_use]
    pub fn from_node(node: &Node) -> Self {
        let local_matrix = match node.transform {
            LocalTransform::Trs {
                translation,
                rotation,
                scale,
            } => Affine3A::from_scale_rotation_translation(scale, rotation, translation),
            LocalTransform::Matrix(matrix) => Affine3A::from_mat4(matrix),
        };

        Self {
            local_matrix,
            world_matrix: Affine3A::IDENTITY,
            pose_translation: Vec3::ZERO,
            pose_rotation: Quat::IDENTITY,
            pose_scale: Vec3::ONE,
            modify: Affine3A::IDENTITY,
            updated: false,
        }
    }

    /// Clears the animated pose back to identity, keeping local matrix and
    /// any override intact.
    pub fn reset_pose(&mut self) {
        self.pose_translation = Vec3::ZERO;
        self.pose_rotation = Quat::IDENTITY;
        self.pose_scale = Vec3::ONE;
    }

    /// True when no channel has written a pose delta for the current frame.
    #[must_use]
    pub fn has_identity_pose(&self) -> bool {
        self.pose_translation == Vec3::ZERO
            && self.pose_rotation == Quat::IDENTITY
            && self.pose_scale == Vec3::ONE
    }

    /// The composed pose matrix `S·R·T` for the current deltas.
    #[must_use]
    pub fn pose_matrix(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(
            self.pose_scale,
            self.pose_rotation,
            self.pose_translation,
        )
    }
}

impl Default for NodeParam {
    fn default() -> Self {
        Self::from_node(&Node::default())
    }
}

// ============================================================================
// External joint overrides
// ============================================================================

/// Sparse per-node transform overrides, addressed by node index.
///
/// Used by motion-control code to pose individual joints (a head turn, a
/// hand grip) on top of the asset's rest pose or animation.
#[derive(Debug, Clone, Default)]
pub struct PoseOverrides {
    entries: Vec<(usize, Affine3A)>,
}

impl PoseOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an override composed from a TRS triple, replacing any previous
    /// override for the node.
    pub fn set(&mut self, node: usize, translation: Vec3, rotation: Quat, scale: Vec3) {
        self.set_matrix(
            node,
            Affine3A::from_scale_rotation_translation(scale, rotation, translation),
        );
    }

    /// Sets an override from an already-composed matrix.
    pub fn set_matrix(&mut self, node: usize, matrix: Affine3A) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == node) {
            entry.1 = matrix;
        } else {
            self.entries.push((node, matrix));
        }
    }

    pub fn clear(&mut self, node: usize) {
        self.entries.retain(|(n, _)| *n != node);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stamps the overrides into a parameter array before resolution.
    pub fn apply(&self, params: &mut [NodeParam]) {
        for &(node, matrix) in &self.entries {
            if let Some(param) = params.get_mut(node) {
                param.modify = matrix;
                param.updated = true;
            }
        }
    }
}
