//! Per-vertex skeletal deformation.
//!
//! A skin's joint palette is rebuilt every frame from the resolved node
//! world matrices and the asset's inverse-bind matrices; each vertex then
//! blends up to four palette entries by its (pre-normalized) joint weights
//! and is transformed homogeneously. Meshes without a skin bypass this
//! stage — their node world matrix is used directly.

use glam::{Mat4, Vec3, Vec4};

use crate::asset::{Document, Skin};
use crate::errors::Result;
use crate::scene::NodeParam;

/// Below this |determinant| a skin matrix counts as singular and the normal
/// transform falls back to the identity inverse-transpose. A single bad
/// joint must not invalidate an entire bake.
pub const SKIN_DET_EPSILON: f32 = 1e-9;

/// Reads a skin's inverse-bind matrices, one per joint (identity when the
/// asset omits them). Count mismatches are caught by document validation.
pub fn extract_inverse_bind(doc: &Document, skin: &Skin) -> Result<Vec<Mat4>> {
    match &skin.inverse_bind {
        Some(accessor) => {
            let view = doc.view(accessor)?;
            Ok((0..view.len()).map(|i| view.mat4(i)).collect())
        }
        None => Ok(vec![Mat4::IDENTITY; skin.joints.len()]),
    }
}

/// Builds the joint palette for one skin: `world ∘ inverse_bind` per joint.
#[must_use]
pub fn joint_matrices(skin: &Skin, inverse_bind: &[Mat4], params: &[NodeParam]) -> Vec<Mat4> {
    skin.joints
        .iter()
        .zip(inverse_bind)
        .map(|(&joint, ibm)| Mat4::from(params[joint].world_matrix) * *ibm)
        .collect()
}

/// Weighted sum of up to four joint matrices.
///
/// Weights are assumed pre-normalized by the asset; no renormalization
/// happens here. An out-of-palette joint index contributes the identity.
#[must_use]
pub fn blend_joint_matrices(palette: &[Mat4], joints: [u16; 4], weights: Vec4) -> Mat4 {
    let joint = |i: usize| -> Mat4 {
        palette
            .get(joints[i] as usize)
            .copied()
            .unwrap_or(Mat4::IDENTITY)
    };

    joint(0) * weights.x + joint(1) * weights.y + joint(2) * weights.z + joint(3) * weights.w
}

/// Transforms one vertex by its blended skin matrix.
///
/// The position goes through the full homogeneous transform with a w-divide;
/// the normal through the matrix's inverse-transpose, substituting the
/// identity when the matrix is singular.
#[must_use]
pub fn skin_vertex(matrix: &Mat4, position: Vec3, normal: Vec3) -> (Vec3, Vec3) {
    let h = *matrix * position.extend(1.0);
    let position = h.truncate() / h.w;

    let normal_matrix = if matrix.determinant().abs() < SKIN_DET_EPSILON {
        Mat4::IDENTITY
    } else {
        matrix.inverse().transpose()
    };
    let normal = normal_matrix
        .transform_vector3(normal)
        .normalize_or_zero();

    (position, normal)
}
