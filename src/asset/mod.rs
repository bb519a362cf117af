//! Asset description — the minimal read contract the baker consumes.
//!
//! A [`Document`] is the node-hierarchy 3-D asset description: raw binary
//! buffers plus the records the engine actually needs — node transforms and
//! hierarchy, mesh primitives with typed attribute accessors, skins with
//! inverse-bind matrices, morph target buffers, material factors and
//! animation sampler/channel keyframe tables. Loading and decoding beyond
//! this contract (textures, extensions, scene composition) belongs to
//! external collaborators.
//!
//! Documents are addressed by index everywhere: nodes form an arena with
//! child-index lists, and meshes/skins/materials/animations are referenced
//! by their position in the owning vector.

pub mod accessor;
pub mod gltf;

pub use accessor::{Accessor, AccessorView, ComponentType, Dimensions};

use glam::{Mat4, Quat, Vec3, Vec4};
use smallvec::SmallVec;

use crate::errors::{Result, RimeError};

// ============================================================================
// Animation description
// ============================================================================

/// Keyframe interpolation mode of an animation sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Step,
    Linear,
    CubicSpline,
}

/// The node property an animation channel drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Translation,
    Rotation,
    Scale,
    MorphWeights,
}

/// Time axis + output keyframes shared by one or more channels.
#[derive(Debug, Clone)]
pub struct AnimationSampler {
    /// Scalar keyframe times, monotonically increasing.
    pub input: Accessor,
    /// Output values; layout depends on the channel property and mode.
    pub output: Accessor,
    pub mode: InterpolationMode,
}

/// One animated property of one node.
#[derive(Debug, Clone)]
pub struct AnimationChannel {
    pub sampler: usize,
    pub target_node: usize,
    pub property: PropertyKind,
}

/// One animation clip.
#[derive(Debug, Clone, Default)]
pub struct Animation {
    pub name: Option<String>,
    pub samplers: Vec<AnimationSampler>,
    pub channels: Vec<AnimationChannel>,
}

// ============================================================================
// Scene description
// ============================================================================

/// A node's rest transform: either a TRS triple or an already-composed
/// matrix, exactly as the container stores it.
#[derive(Debug, Clone, Copy)]
pub enum LocalTransform {
    Trs {
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    },
    Matrix(Mat4),
}

impl Default for LocalTransform {
    fn default() -> Self {
        LocalTransform::Trs {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// One entry in the hierarchical transform tree.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: Option<String>,
    pub transform: LocalTransform,
    /// Child node indices. Nodes carry no parent back-pointer; traversal
    /// order is precomputed by [`crate::scene::SceneTopology`].
    pub children: SmallVec<[u32; 8]>,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
}

/// Per-target morph delta accessors (position / normal displacements).
#[derive(Debug, Clone, Default)]
pub struct MorphTarget {
    pub positions: Option<Accessor>,
    pub normals: Option<Accessor>,
}

/// One drawable primitive of a mesh with its interleaved attribute views.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub positions: Accessor,
    pub normals: Option<Accessor>,
    pub texcoords: Option<Accessor>,
    /// 4-wide joint indices, present when the owning node has a skin.
    pub joints: Option<Accessor>,
    /// 4-wide joint weights, pre-normalized by the asset.
    pub weights: Option<Accessor>,
    pub indices: Option<Accessor>,
    pub material: Option<usize>,
    pub morph_targets: Vec<MorphTarget>,
}

/// A mesh: one or more primitives plus default morph weights.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
    /// Rest-pose morph weights, one per morph target.
    pub morph_weights: Vec<f32>,
}

/// Joint set binding a mesh to the node hierarchy.
#[derive(Debug, Clone, Default)]
pub struct Skin {
    pub name: Option<String>,
    /// Joint node indices; `joints[i]` pairs with inverse-bind matrix `i`.
    pub joints: Vec<usize>,
    /// Mat4 accessor with one inverse-bind matrix per joint; `None` means
    /// all-identity.
    pub inverse_bind: Option<Accessor>,
}

/// Material factors the renderer collaborator needs to bind a primitive.
/// Texture *decoding* stays external; only the source index is recorded.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: Option<String>,
    pub base_color: Vec4,
    pub base_color_texture: Option<usize>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color: Vec4::ONE,
            base_color_texture: None,
        }
    }
}

// ============================================================================
// Document
// ============================================================================

/// The full asset description consumed by the baker.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub buffers: Vec<Vec<u8>>,
    pub nodes: Vec<Node>,
    pub meshes: Vec<Mesh>,
    pub skins: Vec<Skin>,
    pub materials: Vec<Material>,
    pub animations: Vec<Animation>,
    /// Root node indices. Leave empty to have them derived (every node that
    /// is never referenced as a child).
    pub roots: Vec<usize>,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw buffer, returning its index.
    pub fn push_buffer(&mut self, data: Vec<u8>) -> usize {
        self.buffers.push(data);
        self.buffers.len() - 1
    }

    /// Takes a bounds-checked view over `accessor`.
    pub fn view(&self, accessor: &Accessor) -> Result<AccessorView<'_>> {
        accessor.view(&self.buffers)
    }

    /// Finds a node by name; used to address joints for pose overrides.
    #[must_use]
    pub fn node_index_by_name(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.name.as_deref() == Some(name))
    }

    /// Root node indices: the explicit list when provided, otherwise every
    /// node that no other node references as a child.
    #[must_use]
    pub fn root_nodes(&self) -> Vec<usize> {
        if !self.roots.is_empty() {
            return self.roots.clone();
        }
        let mut is_child = vec![false; self.nodes.len()];
        for node in &self.nodes {
            for &child in &node.children {
                if let Some(flag) = is_child.get_mut(child as usize) {
                    *flag = true;
                }
            }
        }
        (0..self.nodes.len()).filter(|&i| !is_child[i]).collect()
    }

    /// Validates the whole document against the read contract. Runs once at
    /// bake setup; any violation aborts baking with `MalformedAsset`.
    pub fn validate(&self) -> Result<()> {
        for (i, node) in self.nodes.iter().enumerate() {
            for &child in &node.children {
                if child as usize >= self.nodes.len() {
                    return Err(RimeError::MalformedAsset(format!(
                        "node {i} references missing child node {child}"
                    )));
                }
            }
            if let Some(mesh) = node.mesh {
                if mesh >= self.meshes.len() {
                    return Err(RimeError::MalformedAsset(format!(
                        "node {i} references missing mesh {mesh}"
                    )));
                }
            }
            if let Some(skin) = node.skin {
                if skin >= self.skins.len() {
                    return Err(RimeError::MalformedAsset(format!(
                        "node {i} references missing skin {skin}"
                    )));
                }
            }
        }

        for (i, mesh) in self.meshes.iter().enumerate() {
            for (p, prim) in mesh.primitives.iter().enumerate() {
                self.validate_primitive(i, p, prim, mesh.morph_weights.len())?;
            }
        }

        for (i, skin) in self.skins.iter().enumerate() {
            for &joint in &skin.joints {
                if joint >= self.nodes.len() {
                    return Err(RimeError::MalformedAsset(format!(
                        "skin {i} references missing joint node {joint}"
                    )));
                }
            }
            if let Some(ibm) = &skin.inverse_bind {
                let view = self.view(ibm)?;
                if view.dimensions() != Dimensions::Mat4 || view.component() != ComponentType::F32 {
                    return Err(RimeError::MalformedAsset(format!(
                        "skin {i}: inverse-bind accessor is not a float Mat4 run"
                    )));
                }
                if view.len() != skin.joints.len() {
                    return Err(RimeError::MalformedAsset(format!(
                        "skin {i}: {} joints but {} inverse-bind matrices",
                        skin.joints.len(),
                        view.len()
                    )));
                }
            }
        }

        for (a, anim) in self.animations.iter().enumerate() {
            for sampler in &anim.samplers {
                let input = self.view(&sampler.input)?;
                if input.dimensions() != Dimensions::Scalar {
                    return Err(RimeError::MalformedAsset(format!(
                        "animation {a}: sampler input axis is not scalar"
                    )));
                }
                self.view(&sampler.output)?;
            }
            for (c, channel) in anim.channels.iter().enumerate() {
                if channel.sampler >= anim.samplers.len() {
                    return Err(RimeError::MalformedAsset(format!(
                        "animation {a} channel {c} references missing sampler {}",
                        channel.sampler
                    )));
                }
                if channel.target_node >= self.nodes.len() {
                    return Err(RimeError::MalformedAsset(format!(
                        "animation {a} channel {c} targets missing node {}",
                        channel.target_node
                    )));
                }
            }
        }

        Ok(())
    }

    fn validate_primitive(
        &self,
        mesh: usize,
        prim: usize,
        primitive: &Primitive,
        morph_weight_count: usize,
    ) -> Result<()> {
        let positions = self.view(&primitive.positions)?;
        if positions.dimensions() != Dimensions::Vec3 || positions.component() != ComponentType::F32
        {
            return Err(RimeError::MalformedAsset(format!(
                "mesh {mesh} primitive {prim}: POSITION is not a float Vec3 run"
            )));
        }
        let vertex_count = positions.len();

        let expect = |name: &str, accessor: &Option<Accessor>| -> Result<()> {
            if let Some(acc) = accessor {
                let view = self.view(acc)?;
                if view.len() != vertex_count {
                    return Err(RimeError::MalformedAsset(format!(
                        "mesh {mesh} primitive {prim}: {name} has {} elements, POSITION has {vertex_count}",
                        view.len()
                    )));
                }
            }
            Ok(())
        };
        expect("NORMAL", &primitive.normals)?;
        expect("TEXCOORD", &primitive.texcoords)?;
        expect("JOINTS", &primitive.joints)?;
        expect("WEIGHTS", &primitive.weights)?;

        if let Some(indices) = &primitive.indices {
            self.view(indices)?;
        }
        if let Some(material) = primitive.material {
            if material >= self.materials.len() {
                return Err(RimeError::MalformedAsset(format!(
                    "mesh {mesh} primitive {prim} references missing material {material}"
                )));
            }
        }

        if !primitive.morph_targets.is_empty() && morph_weight_count != 0
            && primitive.morph_targets.len() != morph_weight_count
        {
            return Err(RimeError::MalformedAsset(format!(
                "mesh {mesh} primitive {prim}: {} morph targets but {} mesh weights",
                primitive.morph_targets.len(),
                morph_weight_count
            )));
        }
        for (t, target) in primitive.morph_targets.iter().enumerate() {
            let name = format!("morph target {t}");
            expect(&name, &target.positions)?;
            expect(&name, &target.normals)?;
        }

        Ok(())
    }
}
