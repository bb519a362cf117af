//! glTF Import Tests
//!
//! Assembles a minimal GLB container in memory (JSON chunk + binary chunk)
//! and checks that the importer maps it onto the document read contract:
//! nodes and hierarchy, primitive accessors, animation samplers/channels,
//! scene roots — and that the imported document bakes.

use glam::Vec3;
use rime::asset::{self, InterpolationMode, PropertyKind};
use rime::bake::{AnimationBaker, BakeSettings};

/// Packs a GLB: 12-byte header, JSON chunk (space-padded), BIN chunk.
fn pack_glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json_bytes = json.as_bytes().to_vec();
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }

    let total = 12 + 8 + json_bytes.len() + 8 + bin.len();
    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());

    glb.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"JSON");
    glb.extend_from_slice(&json_bytes);

    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"BIN\0");
    glb.extend_from_slice(bin);
    glb
}

/// A two-node scene: a mesh node translated by (1,0,0) whose child is
/// driven by a linear translation animation.
fn sample_glb() -> Vec<u8> {
    // Binary layout: positions (36 B) | times (8 B) | translations (24 B).
    let mut bin: Vec<u8> = Vec::new();
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let times: [f32; 2] = [0.0, 1.0];
    let translations: [f32; 6] = [0.0, 0.0, 0.0, 0.0, 4.0, 0.0];
    bin.extend_from_slice(bytemuck::cast_slice(&positions));
    bin.extend_from_slice(bytemuck::cast_slice(&times));
    bin.extend_from_slice(bytemuck::cast_slice(&translations));

    let json = r#"{
        "asset": {"version": "2.0"},
        "buffers": [{"byteLength": 68}],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36},
            {"buffer": 0, "byteOffset": 36, "byteLength": 8},
            {"buffer": 0, "byteOffset": 44, "byteLength": 24}
        ],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
             "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
            {"bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR",
             "min": [0.0], "max": [1.0]},
            {"bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3"}
        ],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
        "nodes": [
            {"name": "root", "mesh": 0, "translation": [1.0, 0.0, 0.0], "children": [1]},
            {"name": "leaf"}
        ],
        "scenes": [{"nodes": [0]}],
        "scene": 0,
        "animations": [{
            "samplers": [{"input": 1, "output": 2, "interpolation": "LINEAR"}],
            "channels": [{"sampler": 0, "target": {"node": 1, "path": "translation"}}]
        }]
    }"#;

    pack_glb(json, &bin)
}

#[test]
fn import_maps_the_read_contract() {
    let doc = asset::gltf::import_slice(&sample_glb()).unwrap();

    assert_eq!(doc.nodes.len(), 2);
    assert_eq!(doc.nodes[0].name.as_deref(), Some("root"));
    assert_eq!(doc.nodes[0].mesh, Some(0));
    assert_eq!(doc.nodes[0].children.as_slice(), &[1]);
    assert_eq!(doc.roots, vec![0]);
    assert_eq!(doc.node_index_by_name("leaf"), Some(1));

    let primitive = &doc.meshes[0].primitives[0];
    let view = doc.view(&primitive.positions).unwrap();
    assert_eq!(view.len(), 3);
    assert_eq!(view.vec3(1), Vec3::new(1.0, 0.0, 0.0));

    let anim = &doc.animations[0];
    assert_eq!(anim.samplers.len(), 1);
    assert_eq!(anim.samplers[0].mode, InterpolationMode::Linear);
    assert_eq!(anim.channels[0].target_node, 1);
    assert_eq!(anim.channels[0].property, PropertyKind::Translation);
}

#[test]
fn imported_document_bakes() {
    let doc = asset::gltf::import_slice(&sample_glb()).unwrap();
    let baker = AnimationBaker::with_settings(
        &doc,
        BakeSettings {
            cycle_frames: 2,
            workers: None,
        },
    )
    .unwrap();

    let clip = baker.bake_clip(0).unwrap();
    assert_eq!(clip.frame_count(), 2);

    // The mesh node is unanimated: vertices carry its rest translation.
    let v = clip.frame(0).unwrap().primitives[0].mesh.vertices[1];
    assert!(
        (v.position - Vec3::new(2.0, 0.0, 0.0)).abs().max_element() < 1e-5,
        "got {}",
        v.position
    );
}

#[test]
fn truncated_container_is_rejected() {
    let glb = sample_glb();
    assert!(asset::gltf::import_slice(&glb[..40]).is_err());
}
