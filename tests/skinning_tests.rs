//! Skinning Tests
//!
//! Tests for:
//! - Joint palette construction (`world ∘ inverse_bind`)
//! - Skin-matrix blending being linear in the weights
//! - Homogeneous vertex transform with w-divide
//! - Singular-matrix normal fallback (identity inverse-transpose)

use glam::{Mat4, Quat, Vec3, Vec4};
use rime::asset::{Document, LocalTransform, Node, Skin};
use rime::scene::{self, SceneTopology};
use rime::skinning;

const EPSILON: f32 = 1e-5;

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

// ============================================================================
// Joint palette
// ============================================================================

#[test]
fn palette_entry_is_world_times_inverse_bind() {
    let doc = Document {
        nodes: vec![Node {
            transform: LocalTransform::Trs {
                translation: Vec3::new(0.0, 5.0, 0.0),
                rotation: Quat::IDENTITY,
                scale: Vec3::ONE,
            },
            ..Node::default()
        }],
        ..Document::default()
    };
    let topology = SceneTopology::build(&doc).unwrap();
    let mut params = scene::build_params(&doc);
    scene::resolve_world(&topology, &mut params).unwrap();

    let skin = Skin {
        name: None,
        joints: vec![0],
        inverse_bind: None,
    };
    let ibm = skinning::extract_inverse_bind(&doc, &skin).unwrap();
    assert_eq!(ibm, vec![Mat4::IDENTITY]);

    let palette = skinning::joint_matrices(&skin, &ibm, &params);
    let expected = Mat4::from(params[0].world_matrix) * Mat4::IDENTITY;
    assert_eq!(palette[0], expected);
}

// ============================================================================
// Weighted blend
// ============================================================================

fn translation_palette() -> Vec<Mat4> {
    vec![
        Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)),
        Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)),
        Mat4::from_translation(Vec3::new(0.0, 0.0, 4.0)),
        Mat4::from_translation(Vec3::new(8.0, 8.0, 8.0)),
    ]
}

#[test]
fn full_weight_on_one_joint_is_exact() {
    let palette = translation_palette();
    let blended = skinning::blend_joint_matrices(
        &palette,
        [0, 1, 2, 3],
        Vec4::new(1.0, 0.0, 0.0, 0.0),
    );
    assert_eq!(blended, palette[0]);
}

#[test]
fn blend_is_linear_in_the_weights() {
    let palette = translation_palette();
    let blended = skinning::blend_joint_matrices(
        &palette,
        [0, 1, 2, 3],
        Vec4::new(0.5, 0.5, 0.0, 0.0),
    );
    let expected = palette[0] * 0.5 + palette[1] * 0.5;
    assert_eq!(blended, expected);

    // The blended translation is the weighted average of the joints'.
    let t = blended.w_axis.truncate();
    assert!(approx_vec3(t, Vec3::new(0.5, 1.0, 0.0)));
}

#[test]
fn out_of_palette_joint_contributes_identity() {
    let palette = translation_palette();
    let blended = skinning::blend_joint_matrices(
        &palette,
        [200, 0, 0, 0],
        Vec4::new(1.0, 0.0, 0.0, 0.0),
    );
    assert_eq!(blended, Mat4::IDENTITY);
}

// ============================================================================
// Vertex transform
// ============================================================================

#[test]
fn translation_moves_position_not_normal() {
    let matrix = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
    let (position, normal) = skinning::skin_vertex(&matrix, Vec3::new(1.0, 2.0, 3.0), Vec3::Z);
    assert!(approx_vec3(position, Vec3::new(1.0, 7.0, 3.0)));
    assert!(approx_vec3(normal, Vec3::Z));
}

#[test]
fn rotation_rotates_the_normal() {
    let matrix = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
    let (_, normal) = skinning::skin_vertex(&matrix, Vec3::ZERO, Vec3::Z);
    assert!(approx_vec3(normal, Vec3::X), "got {normal}");
}

#[test]
fn nonuniform_scale_uses_inverse_transpose_for_normals() {
    // Squash in Y: a Y-facing normal must stay Y-facing (and unit) even
    // though a direct transform would shrink it.
    let matrix = Mat4::from_scale(Vec3::new(1.0, 0.1, 1.0));
    let (_, normal) = skinning::skin_vertex(&matrix, Vec3::ZERO, Vec3::Y);
    assert!(approx_vec3(normal, Vec3::Y), "got {normal}");
}

#[test]
fn singular_matrix_falls_back_to_identity_normal_transform() {
    let matrix = Mat4::from_scale(Vec3::ZERO);
    let input = Vec3::new(0.0, 0.8, 0.6);
    let (position, normal) = skinning::skin_vertex(&matrix, Vec3::ONE, input);
    // Position collapses with the scale; the normal passes through the
    // identity fallback instead of a division by zero.
    assert!(approx_vec3(position, Vec3::ZERO));
    assert!(approx_vec3(normal, input.normalize()));
}

#[test]
fn homogeneous_w_divide_is_applied() {
    // A projective matrix that doubles w: positions must be halved.
    let mut matrix = Mat4::IDENTITY;
    matrix.w_axis.w = 2.0;
    let (position, _) = skinning::skin_vertex(&matrix, Vec3::new(2.0, 4.0, 6.0), Vec3::X);
    assert!(approx_vec3(position, Vec3::new(1.0, 2.0, 3.0)));
}
