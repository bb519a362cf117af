//! Baked frame storage and playback.

use glam::{Mat4, Vec4};

use crate::errors::{Result, RimeError};
use crate::geometry::{BoundingBox, MeshBuffer, Vertex};
use crate::morph::{MorphTargets, MorphTransition};
use crate::skinning;

/// What the renderer needs to bind one primitive: color factor and, when a
/// texture is used, the source image index (decoding stays external).
#[derive(Debug, Clone)]
pub struct MaterialBinding {
    pub name: Option<String>,
    pub base_color: Vec4,
    pub texture: Option<usize>,
}

impl MaterialBinding {
    #[must_use]
    pub fn uses_texture(&self) -> bool {
        self.texture.is_some()
    }
}

impl Default for MaterialBinding {
    fn default() -> Self {
        Self {
            name: None,
            base_color: Vec4::ONE,
            texture: None,
        }
    }
}

/// One primitive of one baked frame.
#[derive(Debug, Clone)]
pub struct FramePrimitive {
    pub mesh: MeshBuffer,
    pub uses_texture: bool,
    /// Index into the owning clip's morph-target sets, when this primitive
    /// has morph targets.
    pub morph_slot: Option<usize>,
    /// Per-vertex skin matrices of morphed primitives, retained so the
    /// playback crossfade can re-deform without re-running the bake.
    pub morph_skin_matrices: Vec<Mat4>,
}

/// One fully baked animation frame: per-primitive vertex/index buffers and
/// the frame's bounding box. Immutable once baked.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub primitives: Vec<FramePrimitive>,
    pub bounds: BoundingBox,
}

/// Re-blends one morphed primitive of a baked frame under a playback
/// crossfade, then re-applies the frame's stored per-vertex skin matrices.
pub(crate) fn crossfade_primitive(
    frame: &Frame,
    morph_sets: &[MorphTargets],
    primitive: usize,
    transition: &MorphTransition,
) -> Result<MeshBuffer> {
    let prim = frame.primitives.get(primitive).ok_or_else(|| RimeError::OutOfRange {
        context: "frame primitive".into(),
        index: primitive,
    })?;

    let (Some(slot), Some(_)) = (prim.morph_slot, transition.now) else {
        // Nothing to crossfade; the baked buffer already is the answer.
        return Ok(prim.mesh.clone());
    };
    let targets = &morph_sets[slot];

    let weights = transition.weights_for(targets.target_count());
    let mut blended = Vec::new();
    targets.blend_weighted(&weights, &mut blended);

    let mut vertices = Vec::with_capacity(blended.len());
    for (v, mv) in blended.iter().enumerate() {
        let matrix = prim
            .morph_skin_matrices
            .get(v)
            .copied()
            .unwrap_or(Mat4::IDENTITY);
        let (position, normal) = skinning::skin_vertex(&matrix, mv.position, mv.normal);
        let uv = prim.mesh.vertices.get(v).map_or_else(Default::default, |b| b.uv);
        vertices.push(Vertex::new(position, normal, uv));
    }

    Ok(MeshBuffer {
        vertices,
        indices: prim.mesh.indices.clone(),
    })
}

// ============================================================================
// Baked clip
// ============================================================================

/// All frames of one baked animation clip, plus the clip-wide bindings
/// captured once at bake time.
#[derive(Debug, Clone, Default)]
pub struct BakedClip {
    pub name: String,
    pub(crate) frames: Vec<Frame>,
    /// One binding per primitive, in frame primitive order.
    pub materials: Vec<MaterialBinding>,
    /// Morph target sets addressed by `FramePrimitive::morph_slot`.
    pub(crate) morph_sets: Vec<MorphTargets>,
}

impl BakedClip {
    /// A clip that baked to nothing (no samplers/channels).
    #[must_use]
    pub fn empty(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The frame for `index`, wrapping modulo the frame count — playback is
    /// continuous and looping. Fails with `OutOfRange` only when the clip
    /// baked to zero frames.
    pub fn frame(&self, index: usize) -> Result<&Frame> {
        if self.frames.is_empty() {
            return Err(RimeError::OutOfRange {
                context: format!("frame of empty clip '{}'", self.name),
                index,
            });
        }
        Ok(&self.frames[index % self.frames.len()])
    }

    #[must_use]
    pub fn morph_sets(&self) -> &[MorphTargets] {
        &self.morph_sets
    }

    /// Playback-time morph crossfade over one primitive of one frame.
    pub fn morphed_primitive(
        &self,
        frame_index: usize,
        primitive: usize,
        transition: &MorphTransition,
    ) -> Result<MeshBuffer> {
        let frame = self.frame(frame_index)?;
        crossfade_primitive(frame, &self.morph_sets, primitive, transition)
    }
}

// ============================================================================
// Playback cursor
// ============================================================================

/// The per-instance frame counter for replaying a baked clip.
///
/// Owned by exactly one playback instance; reading frames through it never
/// touches the baker.
#[derive(Debug, Clone, Copy, Default)]
pub struct Playback {
    current: usize,
}

impl Playback {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Positions the cursor at `offset`, wrapped into the clip's range.
    pub fn set_start_frame(&mut self, clip: &BakedClip, offset: usize) {
        self.current = if clip.frame_count() == 0 {
            0
        } else {
            offset % clip.frame_count()
        };
    }

    /// Steps to the next frame, wrapping at the end of the clip. Returns
    /// the new frame index.
    pub fn advance(&mut self, clip: &BakedClip) -> usize {
        if clip.frame_count() > 0 {
            self.current = (self.current + 1) % clip.frame_count();
        }
        self.current
    }
}
