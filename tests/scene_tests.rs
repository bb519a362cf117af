//! Scene-Graph Resolution Tests
//!
//! Tests for:
//! - World = local ∘ parent for identity poses; root world = local
//! - Pose deltas replacing the rest transform during resolution
//! - Joint overrides pre-multiplying into the local matrix
//! - Degenerate (near-singular) local matrices aborting resolution
//! - Topology construction (ordering, cycles, shared children)

use glam::{Quat, Vec3};
use rime::asset::{Document, LocalTransform, Node};
use rime::errors::RimeError;
use rime::scene::{self, PoseOverrides, SceneTopology};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
}

fn node(translation: Vec3, children: &[u32]) -> Node {
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

fn chain_doc() -> Document {
    Document {
        nodes: vec![
            node(Vec3::new(1.0, 0.0, 0.0), &[1]),
            node(Vec3::new(0.0, 2.0, 0.0), &[2]),
            node(Vec3::new(0.0, 0.0, 3.0), &[]),
        ],
        ..Document::default()
    }
}

fn resolve(doc: &Document) -> Vec<rime::NodeParam> {
    let topology = SceneTopology::build(doc).unwrap();
    let mut params = scene::build_params(doc);
    scene::resolve_world(&topology, &mut params).unwrap();
    params
}

// ============================================================================
// Identity-pose resolution
// ============================================================================

#[test]
fn root_world_equals_local() {
    let doc = chain_doc();
    let params = resolve(&doc);
    assert!(approx_vec3(
        params[0].world_matrix.translation.into(),
        Vec3::new(1.0, 0.0, 0.0)
    ));
}

#[test]
fn chain_accumulates_parent_transforms() {
    let doc = chain_doc();
    let params = resolve(&doc);
    assert!(approx_vec3(
        params[1].world_matrix.translation.into(),
        Vec3::new(1.0, 2.0, 0.0)
    ));
    assert!(approx_vec3(
        params[2].world_matrix.translation.into(),
        Vec3::new(1.0, 2.0, 3.0)
    ));
}

#[test]
fn rotation_propagates_to_children() {
    // Parent rotates 90° about Y; child sits one unit down +Z locally.
    let mut doc = Document {
        nodes: vec![
            Node {
                transform: LocalTransform::Trs {
                    translation: Vec3::ZERO,
                    rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
                    scale: Vec3::ONE,
                },
                children: [1u32].into_iter().collect(),
                ..Node::default()
            },
            node(Vec3::new(0.0, 0.0, 1.0), &[]),
        ],
        ..Document::default()
    };
    doc.roots = vec![0];

    let params = resolve(&doc);
    let child: Vec3 = params[1].world_matrix.translation.into();
    // +Z rotated by +90° about Y lands on +X.
    assert!(approx_vec3(child, Vec3::new(1.0, 0.0, 0.0)), "got {child}");
}

#[test]
fn composed_matrix_transform_is_honored() {
    let doc = Document {
        nodes: vec![Node {
            transform: LocalTransform::Matrix(glam::Mat4::from_translation(Vec3::new(
                0.0, 7.0, 0.0,
            ))),
            ..Node::default()
        }],
        ..Document::default()
    };
    let params = resolve(&doc);
    assert!(approx_vec3(
        params[0].world_matrix.translation.into(),
        Vec3::new(0.0, 7.0, 0.0)
    ));
}

// ============================================================================
// Pose deltas
// ============================================================================

#[test]
fn pose_delta_replaces_rest_transform() {
    let doc = chain_doc();
    let topology = SceneTopology::build(&doc).unwrap();
    let mut params = scene::build_params(&doc);

    // Animate the middle node: the pose, not the rest translation, must
    // win.
    params[1].pose_translation = Vec3::new(0.0, 10.0, 0.0);
    scene::resolve_world(&topology, &mut params).unwrap();

    assert!(approx_vec3(
        params[1].world_matrix.translation.into(),
        Vec3::new(1.0, 10.0, 0.0)
    ));
    // The child still composes on top of the animated parent.
    assert!(approx_vec3(
        params[2].world_matrix.translation.into(),
        Vec3::new(1.0, 10.0, 3.0)
    ));
}

#[test]
fn identity_pose_keeps_rest_transform() {
    let doc = chain_doc();
    let topology = SceneTopology::build(&doc).unwrap();
    let mut params = scene::build_params(&doc);
    params[1].reset_pose();
    scene::resolve_world(&topology, &mut params).unwrap();
    assert!(approx_vec3(
        params[1].world_matrix.translation.into(),
        Vec3::new(1.0, 2.0, 0.0)
    ));
}

// ============================================================================
// Joint overrides
// ============================================================================

#[test]
fn override_premultiplies_into_local() {
    let doc = chain_doc();
    let topology = SceneTopology::build(&doc).unwrap();
    let mut params = scene::build_params(&doc);

    let mut overrides = PoseOverrides::new();
    overrides.set(
        1,
        Vec3::new(0.0, 0.0, 5.0),
        Quat::IDENTITY,
        Vec3::ONE,
    );
    overrides.apply(&mut params);
    scene::resolve_world(&topology, &mut params).unwrap();

    // modify ∘ local = T(0,0,5) ∘ T(0,2,0), under the root's T(1,0,0).
    assert!(approx_vec3(
        params[1].world_matrix.translation.into(),
        Vec3::new(1.0, 2.0, 5.0)
    ));
}

#[test]
fn cleared_override_stops_applying() {
    let mut overrides = PoseOverrides::new();
    overrides.set(0, Vec3::ONE, Quat::IDENTITY, Vec3::ONE);
    overrides.clear(0);
    assert!(overrides.is_empty());

    let doc = chain_doc();
    let topology = SceneTopology::build(&doc).unwrap();
    let mut params = scene::build_params(&doc);
    overrides.apply(&mut params);
    scene::resolve_world(&topology, &mut params).unwrap();
    assert!(approx_vec3(
        params[0].world_matrix.translation.into(),
        Vec3::new(1.0, 0.0, 0.0)
    ));
}

// ============================================================================
// Degenerate transforms
// ============================================================================

#[test]
fn near_singular_local_matrix_fails() {
    let doc = Document {
        nodes: vec![Node {
            transform: LocalTransform::Trs {
                translation: Vec3::ZERO,
                rotation: Quat::IDENTITY,
                scale: Vec3::new(0.0, 1.0, 1.0),
            },
            ..Node::default()
        }],
        ..Document::default()
    };
    let topology = SceneTopology::build(&doc).unwrap();
    let mut params = scene::build_params(&doc);
    let err = scene::resolve_world(&topology, &mut params).unwrap_err();
    assert!(matches!(err, RimeError::DegenerateTransform(_)));
}

// ============================================================================
// Topology
// ============================================================================

#[test]
fn order_visits_parents_before_children() {
    let doc = chain_doc();
    let topology = SceneTopology::build(&doc).unwrap();
    let visited: Vec<usize> = topology.order.iter().map(|e| e.node).collect();
    assert_eq!(visited, vec![0, 1, 2]);
    assert_eq!(topology.roots, vec![0]);
}

#[test]
fn shared_child_is_rejected() {
    // Two parents claiming the same child make parent-before-child order
    // ambiguous.
    let doc = Document {
        nodes: vec![
            node(Vec3::ZERO, &[2]),
            node(Vec3::ZERO, &[2]),
            node(Vec3::ZERO, &[]),
        ],
        ..Document::default()
    };
    assert!(matches!(
        SceneTopology::build(&doc),
        Err(RimeError::MalformedAsset(_))
    ));
}

#[test]
fn cycle_is_rejected() {
    let doc = Document {
        nodes: vec![node(Vec3::ZERO, &[1]), node(Vec3::ZERO, &[0])],
        roots: vec![0],
        ..Document::default()
    };
    assert!(SceneTopology::build(&doc).is_err());
}
