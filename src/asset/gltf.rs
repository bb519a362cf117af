//! glTF import.
//!
//! Maps a glTF/GLB container onto the engine's [`Document`] read contract.
//! Only the records the baker consumes are carried over: node hierarchy and
//! transforms, primitive attribute accessors, skins, morph targets, material
//! factors and animation sampler/channel tables. Images are never decoded
//! here — the document records base-color image indices and leaves pixel
//! data to the rendering collaborator.

use std::fs;
use std::path::Path;

use glam::{Mat4, Quat, Vec3, Vec4};
use smallvec::SmallVec;

use crate::asset::{
    Accessor, Animation, AnimationChannel, AnimationSampler, ComponentType, Dimensions, Document,
    InterpolationMode, LocalTransform, Material, Mesh, MorphTarget, Node, PropertyKind, Primitive,
    Skin,
};
use crate::errors::{Result, RimeError};

/// Imports a `.gltf` / `.glb` file, resolving external buffers relative to it.
pub fn import_path(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let file = fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let gltf = gltf::Gltf::from_reader(reader)?;

    let base_path = path.parent().unwrap_or_else(|| Path::new("./"));
    let buffers = load_buffers(&gltf, Some(base_path))?;
    build_document(&gltf, buffers)
}

/// Imports an in-memory GLB (or a self-contained `.gltf` with data URIs
/// already stripped). External buffer references fail here.
pub fn import_slice(bytes: &[u8]) -> Result<Document> {
    let gltf = gltf::Gltf::from_slice(bytes)?;
    let buffers = load_buffers(&gltf, None)?;
    build_document(&gltf, buffers)
}

fn load_buffers(gltf: &gltf::Gltf, base_path: Option<&Path>) -> Result<Vec<Vec<u8>>> {
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.to_vec());
                } else {
                    return Err(RimeError::Gltf("missing GLB binary chunk".into()));
                }
            }
            gltf::buffer::Source::Uri(uri) => {
                let Some(base) = base_path else {
                    return Err(RimeError::Gltf(format!(
                        "external buffer `{uri}` cannot be resolved from an in-memory import"
                    )));
                };
                buffer_data.push(fs::read(base.join(uri))?);
            }
        }
    }
    Ok(buffer_data)
}

fn build_document(gltf: &gltf::Gltf, buffers: Vec<Vec<u8>>) -> Result<Document> {
    let mut doc = Document {
        buffers,
        ..Document::default()
    };

    for node in gltf.nodes() {
        doc.nodes.push(map_node(&node));
    }

    for mesh in gltf.meshes() {
        doc.meshes.push(map_mesh(&mesh)?);
    }

    for skin in gltf.skins() {
        let inverse_bind = match skin.inverse_bind_matrices() {
            Some(acc) => Some(map_accessor(&acc)?),
            None => None,
        };
        doc.skins.push(Skin {
            name: skin.name().map(str::to_owned),
            joints: skin.joints().map(|n| n.index()).collect(),
            inverse_bind,
        });
    }

    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        doc.materials.push(Material {
            name: material.name().map(str::to_owned),
            base_color: Vec4::from(pbr.base_color_factor()),
            base_color_texture: pbr
                .base_color_texture()
                .map(|info| info.texture().source().index()),
        });
    }

    for animation in gltf.animations() {
        doc.animations.push(map_animation(&animation)?);
    }

    // Scene roots: the default scene when one exists, otherwise derived.
    if let Some(scene) = gltf.default_scene().or_else(|| gltf.scenes().next()) {
        doc.roots = scene.nodes().map(|n| n.index()).collect();
    }

    doc.validate()?;
    log::debug!(
        "imported glTF: {} nodes, {} meshes, {} skins, {} animations",
        doc.nodes.len(),
        doc.meshes.len(),
        doc.skins.len(),
        doc.animations.len()
    );
    Ok(doc)
}

fn map_node(node: &gltf::Node) -> Node {
    let transform = match node.transform() {
        gltf::scene::Transform::Matrix { matrix } => {
            LocalTransform::Matrix(Mat4::from_cols_array_2d(&matrix))
        }
        gltf::scene::Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => LocalTransform::Trs {
            translation: Vec3::from(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from(scale),
        },
    };

    Node {
        name: node.name().map(str::to_owned),
        transform,
        children: node
            .children()
            .map(|c| c.index() as u32)
            .collect::<SmallVec<[u32; 8]>>(),
        mesh: node.mesh().map(|m| m.index()),
        skin: node.skin().map(|s| s.index()),
    }
}

fn map_mesh(mesh: &gltf::Mesh) -> Result<Mesh> {
    let mut primitives = Vec::new();
    for primitive in mesh.primitives() {
        let positions = primitive
            .get(&gltf::Semantic::Positions)
            .ok_or_else(|| {
                RimeError::MalformedAsset(format!(
                    "mesh {} primitive without POSITION attribute",
                    mesh.index()
                ))
            })
            .and_then(|acc| map_accessor(&acc))?;

        let mut morph_targets = Vec::new();
        for target in primitive.morph_targets() {
            morph_targets.push(MorphTarget {
                positions: map_optional(target.positions())?,
                normals: map_optional(target.normals())?,
            });
        }

        primitives.push(Primitive {
            positions,
            normals: map_optional(primitive.get(&gltf::Semantic::Normals))?,
            texcoords: map_optional(primitive.get(&gltf::Semantic::TexCoords(0)))?,
            joints: map_optional(primitive.get(&gltf::Semantic::Joints(0)))?,
            weights: map_optional(primitive.get(&gltf::Semantic::Weights(0)))?,
            indices: map_optional(primitive.indices())?,
            material: primitive.material().index(),
            morph_targets,
        });
    }

    Ok(Mesh {
        name: mesh.name().map(str::to_owned),
        primitives,
        morph_weights: mesh.weights().map(<[f32]>::to_vec).unwrap_or_default(),
    })
}

fn map_animation(animation: &gltf::Animation) -> Result<Animation> {
    let mut samplers: Vec<AnimationSampler> = Vec::new();
    let mut sampler_slots: std::collections::HashMap<(usize, usize, u8), usize> =
        std::collections::HashMap::new();
    let mut channels = Vec::new();

    for channel in animation.channels() {
        let sampler = channel.sampler();
        let mode = match sampler.interpolation() {
            gltf::animation::Interpolation::Step => InterpolationMode::Step,
            gltf::animation::Interpolation::Linear => InterpolationMode::Linear,
            gltf::animation::Interpolation::CubicSpline => InterpolationMode::CubicSpline,
        };

        // Channels share samplers in the container; keep that sharing by
        // keying on the (input, output, mode) triple.
        let key = (sampler.input().index(), sampler.output().index(), mode as u8);
        let slot = match sampler_slots.get(&key) {
            Some(&slot) => slot,
            None => {
                samplers.push(AnimationSampler {
                    input: map_accessor(&sampler.input())?,
                    output: map_accessor(&sampler.output())?,
                    mode,
                });
                let slot = samplers.len() - 1;
                sampler_slots.insert(key, slot);
                slot
            }
        };

        let target = channel.target();
        let property = match target.property() {
            gltf::animation::Property::Translation => PropertyKind::Translation,
            gltf::animation::Property::Rotation => PropertyKind::Rotation,
            gltf::animation::Property::Scale => PropertyKind::Scale,
            gltf::animation::Property::MorphTargetWeights => PropertyKind::MorphWeights,
        };
        channels.push(AnimationChannel {
            sampler: slot,
            target_node: target.node().index(),
            property,
        });
    }

    Ok(Animation {
        name: animation.name().map(str::to_owned),
        samplers,
        channels,
    })
}

fn map_optional(accessor: Option<gltf::Accessor>) -> Result<Option<Accessor>> {
    accessor.as_ref().map(map_accessor).transpose()
}

fn map_accessor(accessor: &gltf::Accessor) -> Result<Accessor> {
    if accessor.sparse().is_some() {
        log::warn!(
            "accessor {} uses sparse storage, which is not supported",
            accessor.index()
        );
        return Err(RimeError::MalformedAsset(format!(
            "accessor {} uses unsupported sparse storage",
            accessor.index()
        )));
    }
    let view = accessor.view().ok_or_else(|| {
        RimeError::MalformedAsset(format!("accessor {} has no buffer view", accessor.index()))
    })?;

    let component = match accessor.data_type() {
        gltf::accessor::DataType::I8 => ComponentType::I8,
        gltf::accessor::DataType::U8 => ComponentType::U8,
        gltf::accessor::DataType::I16 => ComponentType::I16,
        gltf::accessor::DataType::U16 => ComponentType::U16,
        gltf::accessor::DataType::U32 => ComponentType::U32,
        gltf::accessor::DataType::F32 => ComponentType::F32,
    };
    let dimensions = match accessor.dimensions() {
        gltf::accessor::Dimensions::Scalar => Dimensions::Scalar,
        gltf::accessor::Dimensions::Vec2 => Dimensions::Vec2,
        gltf::accessor::Dimensions::Vec3 => Dimensions::Vec3,
        gltf::accessor::Dimensions::Vec4 => Dimensions::Vec4,
        gltf::accessor::Dimensions::Mat4 => Dimensions::Mat4,
        other => {
            return Err(RimeError::MalformedAsset(format!(
                "accessor {} has unsupported dimensions {other:?}",
                accessor.index()
            )));
        }
    };

    Ok(Accessor {
        buffer: view.buffer().index(),
        offset: view.offset() + accessor.offset(),
        stride: view.stride(),
        count: accessor.count(),
        component,
        dimensions,
    })
}
