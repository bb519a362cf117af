//! Morph-target blending.
//!
//! Morph targets deform a mesh without skeletal motion: each target is a
//! per-vertex position/normal displacement buffer added onto the basis,
//! scaled by its active weight. Baking drives the weights from animated
//! weight channels; playback drives them through the two-target
//! [`MorphTransition`] crossfade.

use glam::Vec3;

use crate::asset::{Document, Primitive};
use crate::errors::Result;

/// One basis or delta sample of a morph buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MorphVertex {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Decoded morph buffers for one primitive: the basis vertices plus one
/// displacement buffer per target.
#[derive(Debug, Clone, Default)]
pub struct MorphTargets {
    pub basis: Vec<MorphVertex>,
    pub deltas: Vec<Vec<MorphVertex>>,
}

impl MorphTargets {
    /// Decodes the basis and per-target displacement buffers of a primitive.
    /// Returns `None` for primitives without morph targets.
    pub fn extract(doc: &Document, primitive: &Primitive) -> Result<Option<Self>> {
        if primitive.morph_targets.is_empty() {
            return Ok(None);
        }

        let positions = doc.view(&primitive.positions)?;
        let normals = primitive
            .normals
            .as_ref()
            .map(|a| doc.view(a))
            .transpose()?;
        let vertex_count = positions.len();

        let mut basis = Vec::with_capacity(vertex_count);
        for v in 0..vertex_count {
            basis.push(MorphVertex {
                position: positions.vec3(v),
                normal: normals.as_ref().map_or(Vec3::ZERO, |n| n.vec3(v)),
            });
        }

        let mut deltas = Vec::with_capacity(primitive.morph_targets.len());
        for target in &primitive.morph_targets {
            let d_pos = target.positions.as_ref().map(|a| doc.view(a)).transpose()?;
            let d_nor = target.normals.as_ref().map(|a| doc.view(a)).transpose()?;

            let mut buffer = Vec::with_capacity(vertex_count);
            for v in 0..vertex_count {
                buffer.push(MorphVertex {
                    position: d_pos.as_ref().map_or(Vec3::ZERO, |p| p.vec3(v)),
                    normal: d_nor.as_ref().map_or(Vec3::ZERO, |n| n.vec3(v)),
                });
            }
            deltas.push(buffer);
        }

        Ok(Some(Self { basis, deltas }))
    }

    #[must_use]
    pub fn target_count(&self) -> usize {
        self.deltas.len()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.basis.len()
    }

    /// N-way additive weighted blend: `basis + Σ weight_t · delta_t`,
    /// written into `out` (resized to the basis length). Zero weights skip
    /// their target entirely.
    pub fn blend_weighted(&self, weights: &[f32], out: &mut Vec<MorphVertex>) {
        out.clear();
        out.extend_from_slice(&self.basis);

        for (target, delta) in self.deltas.iter().enumerate() {
            let weight = weights.get(target).copied().unwrap_or(0.0);
            if weight == 0.0 {
                continue;
            }
            for (dst, src) in out.iter_mut().zip(delta) {
                dst.position += src.position * weight;
                dst.normal += src.normal * weight;
            }
        }
    }

}

// ============================================================================
// Playback transition state
// ============================================================================

/// External playback state: a crossfade between two morph target indices.
///
/// Not asset data — one of these exists per playing instance and is advanced
/// by the instance's update loop. While `now` is `None` the transition is
/// disabled and the basis shape plays unmodified.
#[derive(Debug, Clone)]
pub struct MorphTransition {
    pub now: Option<usize>,
    pub dst: usize,
    /// Progress advance per second.
    pub speed: f32,
    /// Transition progress in `[0, 1]`.
    pub progress: f32,
}

impl MorphTransition {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Some(0),
            dst: 0,
            speed: 1.0,
            progress: 0.0,
        }
    }

    /// Starts a transition from the currently shown target toward `dst`.
    pub fn begin(&mut self, dst: usize) {
        if self.progress >= 1.0 {
            self.now = Some(self.dst);
        }
        self.dst = dst;
        self.progress = 0.0;
    }

    /// Advances the transition; returns true once it has finished.
    pub fn update(&mut self, dt: f32) -> bool {
        if self.progress < 1.0 {
            self.progress = (self.progress + self.speed * dt).min(1.0);
        }
        self.progress >= 1.0
    }

    /// The current crossfade weight toward `dst`.
    #[must_use]
    pub fn weight(&self) -> f32 {
        self.progress.clamp(0.0, 1.0)
    }

    /// The full weight vector this transition implies for `target_count`
    /// targets — the two-target crossfade the playback path uses.
    #[must_use]
    pub fn weights_for(&self, target_count: usize) -> Vec<f32> {
        let mut weights = vec![0.0; target_count];
        let Some(now) = self.now else {
            return weights;
        };
        let w = self.weight();
        if let Some(slot) = weights.get_mut(now) {
            *slot += 1.0 - w;
        }
        if let Some(slot) = weights.get_mut(self.dst) {
            *slot += w;
        }
        weights
    }
}

impl Default for MorphTransition {
    fn default() -> Self {
        Self::new()
    }
}
