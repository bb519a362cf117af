//! Animation baking.
//!
//! For every clip of an asset the baker precomputes, per discrete frame, the
//! fully skinned and morph-blended vertex buffers plus the frame's bounding
//! box — once, ahead of render time — so playback is a stateless replay by
//! frame index.
//!
//! Frames are independent of each other, so the bake is a parallel map over
//! frame indices: every worker owns an isolated scratch object (node
//! parameters + morph weight table) while the extracted sampler/channel
//! tables stay immutable and shared. No locking, no cross-frame state.

pub mod frame;
pub mod model;

pub use frame::{BakedClip, Frame, FramePrimitive, MaterialBinding, Playback};
pub use model::{AnimatedModel, Capabilities, Model, StaticModel};

use std::time::Instant;

use glam::{Mat4, Quat, Vec3, Vec4};
use rayon::prelude::*;

use crate::animation::{Channel, MorphWeightTable, Sampler};
use crate::asset::{Animation, Document};
use crate::errors::{Result, RimeError};
use crate::geometry::{BoundingBox, MeshBuffer, Vertex};
use crate::morph::{MorphTargets, MorphVertex};
use crate::scene::{self, NodeParam, PoseOverrides, SceneTopology};
use crate::skinning;

// ============================================================================
// Settings
// ============================================================================

/// Bake configuration.
#[derive(Debug, Clone, Copy)]
pub struct BakeSettings {
    /// Discrete frames per clip cycle.
    pub cycle_frames: u32,
    /// Worker thread count; `None` uses the global rayon pool.
    pub workers: Option<usize>,
}

impl Default for BakeSettings {
    fn default() -> Self {
        Self {
            cycle_frames: 60,
            workers: None,
        }
    }
}

// ============================================================================
// Baker
// ============================================================================

/// Bakes a validated document into replayable frames.
///
/// Construction validates the asset once ([`Document::validate`]) and
/// precomputes the scene traversal order; the baker itself is immutable
/// during a bake and shared by reference across workers.
pub struct AnimationBaker<'a> {
    doc: &'a Document,
    topology: SceneTopology,
    rest_params: Vec<NodeParam>,
    overrides: PoseOverrides,
    settings: BakeSettings,
}

impl<'a> AnimationBaker<'a> {
    pub fn new(doc: &'a Document) -> Result<Self> {
        Self::with_settings(doc, BakeSettings::default())
    }

    pub fn with_settings(doc: &'a Document, settings: BakeSettings) -> Result<Self> {
        doc.validate()?;
        let topology = SceneTopology::build(doc)?;
        let rest_params = scene::build_params(doc);
        Ok(Self {
            doc,
            topology,
            rest_params,
            overrides: PoseOverrides::new(),
            settings,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &BakeSettings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Joint overrides
    // ------------------------------------------------------------------

    /// The override set stamped into every evaluation (animated and rest
    /// pose alike).
    pub fn overrides_mut(&mut self) -> &mut PoseOverrides {
        &mut self.overrides
    }

    /// Overrides one joint by node name.
    pub fn set_joint_override(
        &mut self,
        name: &str,
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) -> Result<()> {
        let node = self.doc.node_index_by_name(name).ok_or_else(|| {
            RimeError::MalformedAsset(format!("no node named '{name}' in this asset"))
        })?;
        self.overrides.set(node, translation, rotation, scale);
        Ok(())
    }

    /// Resolves and returns one node's rest-pose world matrix (with the
    /// current overrides applied).
    pub fn node_world_matrix(&self, node: usize) -> Result<Mat4> {
        if node >= self.doc.nodes.len() {
            return Err(RimeError::OutOfRange {
                context: "node".into(),
                index: node,
            });
        }
        let mut params = self.rest_params.clone();
        self.overrides.apply(&mut params);
        scene::resolve_world(&self.topology, &mut params)?;
        Ok(Mat4::from(params[node].world_matrix))
    }

    // ------------------------------------------------------------------
    // Baking entry points
    // ------------------------------------------------------------------

    /// Bakes the whole asset into its tagged model shape: animated when the
    /// document carries clips, a single rest-pose frame otherwise.
    pub fn bake_model(&self) -> Result<Model> {
        if self.doc.animations.is_empty() {
            Ok(Model::Static(self.bake_rest_pose()?))
        } else {
            let clips = self.bake_all_clips()?;
            Ok(Model::Animated(AnimatedModel {
                clips,
                capabilities: self.capabilities(true),
            }))
        }
    }

    /// Bakes every clip of the document in order.
    pub fn bake_all_clips(&self) -> Result<Vec<BakedClip>> {
        (0..self.doc.animations.len())
            .map(|clip| self.bake_clip(clip))
            .collect()
    }

    /// Bakes one clip. A clip without samplers or channels bakes to zero
    /// frames.
    pub fn bake_clip(&self, clip_index: usize) -> Result<BakedClip> {
        let anim = self
            .doc
            .animations
            .get(clip_index)
            .ok_or_else(|| RimeError::OutOfRange {
                context: "animation clip".into(),
                index: clip_index,
            })?;
        let name = anim
            .name
            .clone()
            .unwrap_or_else(|| format!("clip-{clip_index}"));

        if anim.samplers.is_empty() || anim.channels.is_empty() {
            log::debug!("clip '{name}' has no samplers or channels; nothing to bake");
            return Ok(BakedClip::empty(name));
        }

        let started = Instant::now();
        let ctx = self.clip_context(anim)?;
        let times = self.frame_times(&ctx.samplers);
        let frames = self.run_frames(&ctx, &times)?;

        log::info!(
            "baked clip '{}': {} frames x {} primitives in {:.1?}",
            name,
            frames.len(),
            ctx.primitives.len(),
            started.elapsed()
        );

        Ok(BakedClip {
            name,
            frames,
            materials: ctx.materials,
            morph_sets: ctx.morph_sets,
        })
    }

    /// Bakes the rest pose (no animation applied, mesh default morph
    /// weights, overrides honored) into a static model.
    pub fn bake_rest_pose(&self) -> Result<StaticModel> {
        let ctx = self.clip_context_unanimated()?;
        let mut scratch = BakeScratch::new(&ctx, self.doc.nodes.len());
        let frame = self.bake_frame(&ctx, 0.0, &mut scratch)?;
        Ok(StaticModel {
            frame,
            materials: ctx.materials,
            morph_sets: ctx.morph_sets,
            capabilities: self.capabilities(false),
        })
    }

    fn capabilities(&self, has_animation: bool) -> Capabilities {
        Capabilities {
            has_skin: self.doc.nodes.iter().any(|n| n.skin.is_some()),
            has_morph: self
                .doc
                .meshes
                .iter()
                .any(|m| m.primitives.iter().any(|p| !p.morph_targets.is_empty())),
            has_animation,
        }
    }

    // ------------------------------------------------------------------
    // Per-clip setup (validated once; failures abort the clip)
    // ------------------------------------------------------------------

    fn clip_context(&self, anim: &Animation) -> Result<ClipContext> {
        let samplers: Vec<Sampler> = anim
            .samplers
            .iter()
            .map(|s| Sampler::extract(self.doc, s))
            .collect::<Result<_>>()?;
        let channels: Vec<Channel> = anim
            .channels
            .iter()
            .map(|c| Channel::extract(self.doc, anim, c))
            .collect::<Result<_>>()?;
        self.finish_context(samplers, channels)
    }

    fn clip_context_unanimated(&self) -> Result<ClipContext> {
        self.finish_context(Vec::new(), Vec::new())
    }

    fn finish_context(&self, samplers: Vec<Sampler>, channels: Vec<Channel>) -> Result<ClipContext> {
        let (primitives, materials, morph_sets) = self.collect_primitives()?;
        let inverse_bind: Vec<Vec<Mat4>> = self
            .doc
            .skins
            .iter()
            .map(|s| skinning::extract_inverse_bind(self.doc, s))
            .collect::<Result<_>>()?;

        let mut rest = self.rest_params.clone();
        self.overrides.apply(&mut rest);

        Ok(ClipContext {
            samplers,
            channels,
            primitives,
            materials,
            morph_sets,
            inverse_bind,
            rest,
        })
    }

    /// Decodes every mesh primitive reachable from the scene roots, in
    /// traversal order (which keeps primitive numbering deterministic).
    fn collect_primitives(
        &self,
    ) -> Result<(Vec<PrimitiveData>, Vec<MaterialBinding>, Vec<MorphTargets>)> {
        let mut primitives = Vec::new();
        let mut materials = Vec::new();
        let mut morph_sets = Vec::new();

        for entry in &self.topology.order {
            let node = &self.doc.nodes[entry.node];
            let Some(mesh_index) = node.mesh else {
                continue;
            };
            let mesh = &self.doc.meshes[mesh_index];

            for primitive in &mesh.primitives {
                let positions = self.doc.view(&primitive.positions)?;
                let normals = primitive
                    .normals
                    .as_ref()
                    .map(|a| self.doc.view(a))
                    .transpose()?;
                let texcoords = primitive
                    .texcoords
                    .as_ref()
                    .map(|a| self.doc.view(a))
                    .transpose()?;

                let vertex_count = positions.len();
                let mut vertices = Vec::with_capacity(vertex_count);
                for v in 0..vertex_count {
                    vertices.push(Vertex::new(
                        positions.vec3(v),
                        normals.as_ref().map_or(Vec3::ZERO, |n| n.vec3(v)),
                        texcoords.as_ref().map_or_else(Default::default, |t| t.vec2(v)),
                    ));
                }

                let indices: Vec<u32> = match &primitive.indices {
                    Some(accessor) => {
                        let view = self.doc.view(accessor)?;
                        (0..view.len()).map(|i| view.index(i)).collect()
                    }
                    None => (0..vertex_count as u32).collect(),
                };

                let influences = if node.skin.is_some() {
                    let (Some(joints), Some(weights)) = (&primitive.joints, &primitive.weights)
                    else {
                        return Err(RimeError::MalformedAsset(format!(
                            "skinned node {} has a primitive without JOINTS/WEIGHTS attributes",
                            entry.node
                        )));
                    };
                    let joints = self.doc.view(joints)?;
                    let weights = self.doc.view(weights)?;
                    (0..vertex_count)
                        .map(|v| (joints.joints(v), weights.vec4(v)))
                        .collect()
                } else {
                    Vec::new()
                };

                let morph_slot = match MorphTargets::extract(self.doc, primitive)? {
                    Some(targets) => {
                        morph_sets.push(targets);
                        Some(morph_sets.len() - 1)
                    }
                    None => None,
                };

                let binding = primitive
                    .material
                    .and_then(|m| self.doc.materials.get(m))
                    .map_or_else(MaterialBinding::default, |mat| MaterialBinding {
                        name: mat.name.clone(),
                        base_color: mat.base_color,
                        texture: mat.base_color_texture,
                    });
                let uses_texture = binding.uses_texture();
                materials.push(binding);

                primitives.push(PrimitiveData {
                    node: entry.node,
                    skin: node.skin,
                    vertices,
                    indices,
                    influences,
                    morph_slot,
                    default_weights: mesh.morph_weights.clone(),
                    uses_texture,
                });
            }
        }

        Ok((primitives, materials, morph_sets))
    }

    /// Discrete query times: `cycle_frames` equal steps accumulated across
    /// the clip-wide `[min, max]` time range.
    fn frame_times(&self, samplers: &[Sampler]) -> Vec<f32> {
        let min = samplers
            .iter()
            .map(|s| s.min_time)
            .fold(f32::INFINITY, f32::min);
        let max = samplers
            .iter()
            .map(|s| s.max_time)
            .fold(f32::NEG_INFINITY, f32::max);

        let cycle = self.settings.cycle_frames.max(1);
        let step = (max - min) / cycle as f32;
        (0..cycle).map(|i| min + step * (i + 1) as f32).collect()
    }

    // ------------------------------------------------------------------
    // The parallel frame loop
    // ------------------------------------------------------------------

    fn run_frames(&self, ctx: &ClipContext, times: &[f32]) -> Result<Vec<Frame>> {
        let node_count = self.doc.nodes.len();
        let bake = || {
            times
                .par_iter()
                .map_init(
                    || BakeScratch::new(ctx, node_count),
                    |scratch, &time| self.bake_frame(ctx, time, scratch),
                )
                .collect::<Result<Vec<Frame>>>()
        };

        match self.settings.workers {
            Some(workers) => rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()?
                .install(bake),
            None => bake(),
        }
    }

    /// Bakes one frame. Pure with respect to the worker: reads only the
    /// shared immutable context, writes only into `scratch` and the
    /// returned frame — which is what makes the parallel loop deterministic
    /// and order-independent.
    fn bake_frame(&self, ctx: &ClipContext, time: f32, scratch: &mut BakeScratch) -> Result<Frame> {
        scratch.params.clone_from(&ctx.rest);
        scratch.weights.reset();

        for channel in &ctx.channels {
            channel.sample_into(
                &ctx.samplers[channel.sampler],
                time,
                &mut scratch.params,
                &mut scratch.weights,
            );
        }

        scene::resolve_world(&self.topology, &mut scratch.params)?;

        let palettes: Vec<Vec<Mat4>> = self
            .doc
            .skins
            .iter()
            .zip(&ctx.inverse_bind)
            .map(|(skin, ibm)| skinning::joint_matrices(skin, ibm, &scratch.params))
            .collect();

        let mut frame_primitives = Vec::with_capacity(ctx.primitives.len());
        let mut bounds = BoundingBox::empty();
        let mut finite = true;

        for prim in &ctx.primitives {
            let node_world = Mat4::from(scratch.params[prim.node].world_matrix);

            let blended: Option<&[MorphVertex]> = match prim.morph_slot {
                Some(slot) => {
                    let weights = scratch
                        .weights
                        .get(prim.node)
                        .unwrap_or(&prim.default_weights);
                    ctx.morph_sets[slot].blend_weighted(weights, &mut scratch.blended);
                    Some(&scratch.blended)
                }
                None => None,
            };

            let mut vertices = Vec::with_capacity(prim.vertices.len());
            let mut morph_skin_matrices =
                Vec::with_capacity(if prim.morph_slot.is_some() {
                    prim.vertices.len()
                } else {
                    0
                });

            for (v, base) in prim.vertices.iter().enumerate() {
                let (position, normal) = match blended {
                    Some(morphed) => (morphed[v].position, morphed[v].normal),
                    None => (base.position, base.normal),
                };

                let matrix = match prim.skin {
                    Some(skin) => {
                        let (joints, weights) = prim.influences[v];
                        skinning::blend_joint_matrices(&palettes[skin], joints, weights)
                    }
                    None => node_world,
                };
                if prim.morph_slot.is_some() {
                    morph_skin_matrices.push(matrix);
                }

                let (position, normal) = skinning::skin_vertex(&matrix, position, normal);
                let vertex = Vertex::new(position, normal, base.uv);
                finite &= vertex.is_finite();
                bounds.grow(position);
                vertices.push(vertex);
            }

            frame_primitives.push(FramePrimitive {
                mesh: MeshBuffer {
                    vertices,
                    indices: prim.indices.clone(),
                },
                uses_texture: prim.uses_texture,
                morph_slot: prim.morph_slot,
                morph_skin_matrices,
            });
        }

        // Nothing non-finite may reach the renderer.
        if !finite {
            return Err(RimeError::DegenerateTransform(format!(
                "frame at t = {time}s produced non-finite geometry"
            )));
        }

        Ok(Frame {
            primitives: frame_primitives,
            bounds,
        })
    }
}

// ============================================================================
// Per-clip immutable context + per-worker scratch
// ============================================================================

/// Everything a frame bake reads: extracted once at setup, immutable and
/// shared across workers afterwards.
struct ClipContext {
    samplers: Vec<Sampler>,
    channels: Vec<Channel>,
    primitives: Vec<PrimitiveData>,
    materials: Vec<MaterialBinding>,
    morph_sets: Vec<MorphTargets>,
    /// Per-skin inverse-bind matrices.
    inverse_bind: Vec<Vec<Mat4>>,
    /// Rest-pose node parameters with overrides stamped in.
    rest: Vec<NodeParam>,
}

/// One decoded mesh primitive.
struct PrimitiveData {
    node: usize,
    skin: Option<usize>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    /// Per-vertex (joint indices, joint weights); empty when unskinned.
    influences: Vec<([u16; 4], Vec4)>,
    morph_slot: Option<usize>,
    default_weights: Vec<f32>,
    uses_texture: bool,
}

/// Isolated mutable state of one bake worker. No frame ever observes
/// another frame's scratch.
struct BakeScratch {
    params: Vec<NodeParam>,
    weights: MorphWeightTable,
    blended: Vec<MorphVertex>,
}

impl BakeScratch {
    fn new(ctx: &ClipContext, node_count: usize) -> Self {
        Self {
            params: ctx.rest.clone(),
            weights: MorphWeightTable::new(node_count),
            blended: Vec::new(),
        }
    }
}
