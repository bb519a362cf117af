//! Animated property channels.
//!
//! A [`Channel`] owns the dense per-keyframe output values of one animated
//! property of one node, decoded from the document once per bake. Sampling
//! writes straight into the worker's [`NodeParam`] pose fields or its morph
//! weight table — channels themselves are never mutated after extraction.

use glam::{Quat, Vec3};

use crate::animation::sampler::Sampler;
use crate::animation::values::Interpolatable;
use crate::asset::{Animation, AnimationChannel, Document, InterpolationMode, PropertyKind};
use crate::errors::{Result, RimeError};
use crate::scene::NodeParam;

/// Dense keyframe values of one channel. For cubic-spline samplers each
/// keyframe is an (in-tangent, value, out-tangent) triple, so the vector is
/// three entries per keyframe.
#[derive(Debug, Clone)]
pub enum ChannelValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
    MorphWeights {
        targets: usize,
        /// Flat rows of `targets` weights per (possibly triple) keyframe.
        keys: Vec<f32>,
    },
}

/// One animated property of one node.
#[derive(Debug, Clone)]
pub struct Channel {
    pub target_node: usize,
    pub sampler: usize,
    pub values: ChannelValues,
}

/// Entries per keyframe for a given interpolation mode.
fn per_key(mode: InterpolationMode) -> usize {
    if mode == InterpolationMode::CubicSpline {
        3
    } else {
        1
    }
}

impl Channel {
    /// Reads the raw keyframe output values for one channel, checking the
    /// element count against the sampler's time axis and normalizing
    /// rotation keyframes to unit quaternions.
    pub fn extract(doc: &Document, anim: &Animation, desc: &AnimationChannel) -> Result<Self> {
        let sampler_desc = &anim.samplers[desc.sampler];
        let keyframes = doc.view(&sampler_desc.input)?.len();
        let expected = keyframes * per_key(sampler_desc.mode);
        let output = doc.view(&sampler_desc.output)?;

        let values = match desc.property {
            PropertyKind::Translation | PropertyKind::Scale => {
                Self::expect_count(output.len(), expected, desc)?;
                let v: Vec<Vec3> = (0..output.len()).map(|i| output.vec3(i)).collect();
                if desc.property == PropertyKind::Translation {
                    ChannelValues::Translation(v)
                } else {
                    ChannelValues::Scale(v)
                }
            }
            PropertyKind::Rotation => {
                Self::expect_count(output.len(), expected, desc)?;
                let stride = per_key(sampler_desc.mode);
                let v: Vec<Quat> = (0..output.len())
                    .map(|i| {
                        let q = Quat::from_vec4(output.vec4(i));
                        // Only the value element of a spline triple is a
                        // rotation; tangents stay raw.
                        if i % stride == stride / 2 {
                            q.normalize()
                        } else {
                            q
                        }
                    })
                    .collect();
                ChannelValues::Rotation(v)
            }
            PropertyKind::MorphWeights => {
                let targets = doc
                    .nodes
                    .get(desc.target_node)
                    .and_then(|n| n.mesh)
                    .and_then(|m| doc.meshes.get(m))
                    .map_or(0, Self::mesh_target_count);
                if targets == 0 {
                    return Err(RimeError::MalformedAsset(format!(
                        "weights channel targets node {} which has no morph targets",
                        desc.target_node
                    )));
                }
                Self::expect_count(output.len(), expected * targets, desc)?;
                let keys: Vec<f32> = (0..output.len()).map(|i| output.scalar_f32(i)).collect();
                ChannelValues::MorphWeights { targets, keys }
            }
        };

        Ok(Self {
            target_node: desc.target_node,
            sampler: desc.sampler,
            values,
        })
    }

    fn mesh_target_count(mesh: &crate::asset::Mesh) -> usize {
        mesh.primitives
            .iter()
            .map(|p| p.morph_targets.len())
            .max()
            .unwrap_or(0)
            .max(mesh.morph_weights.len())
    }

    fn expect_count(actual: usize, expected: usize, desc: &AnimationChannel) -> Result<()> {
        if actual != expected {
            return Err(RimeError::MalformedAsset(format!(
                "channel targeting node {}: {actual} output values where {expected} were expected",
                desc.target_node
            )));
        }
        Ok(())
    }

    /// Samples this channel at `time` and writes the result into the
    /// worker's pose state.
    pub fn sample_into(
        &self,
        sampler: &Sampler,
        time: f32,
        params: &mut [NodeParam],
        weights: &mut MorphWeightTable,
    ) {
        let (low, high, mix) = sampler.locate(time);
        let dt = sampler.interval(low, high);

        match &self.values {
            ChannelValues::Translation(v) => {
                params[self.target_node].pose_translation =
                    sample_keys(v, sampler.mode, low, high, mix, dt);
            }
            ChannelValues::Rotation(v) => {
                params[self.target_node].pose_rotation =
                    sample_keys(v, sampler.mode, low, high, mix, dt);
            }
            ChannelValues::Scale(v) => {
                params[self.target_node].pose_scale =
                    sample_keys(v, sampler.mode, low, high, mix, dt);
            }
            ChannelValues::MorphWeights { targets, keys } => {
                let row = weights.row_mut(self.target_node, *targets);
                for (m, slot) in row.iter_mut().enumerate() {
                    *slot = sample_weight(keys, *targets, m, sampler.mode, low, high, mix, dt);
                }
            }
        }
    }
}

/// Interpolates one typed keyframe value.
fn sample_keys<T: Interpolatable>(
    values: &[T],
    mode: InterpolationMode,
    low: usize,
    high: usize,
    mix: f32,
    dt: f32,
) -> T {
    match mode {
        InterpolationMode::Step => values[low],
        InterpolationMode::Linear => T::lerp_value(values[low], values[high], mix),
        InterpolationMode::CubicSpline => {
            if low == high {
                return values[3 * low + 1];
            }
            let v0 = values[3 * low + 1];
            let out_tangent0 = values[3 * low + 2];
            let in_tangent1 = values[3 * high];
            let v1 = values[3 * high + 1];
            T::hermite(v0, out_tangent0, in_tangent1, v1, mix, dt)
        }
    }
}

/// Interpolates one component of a flat weight-vector channel.
fn sample_weight(
    keys: &[f32],
    targets: usize,
    component: usize,
    mode: InterpolationMode,
    low: usize,
    high: usize,
    mix: f32,
    dt: f32,
) -> f32 {
    let at = |value_index: usize| keys[value_index * targets + component];
    match mode {
        InterpolationMode::Step => at(low),
        InterpolationMode::Linear => f32::lerp_value(at(low), at(high), mix),
        InterpolationMode::CubicSpline => {
            if low == high {
                return at(3 * low + 1);
            }
            f32::hermite(
                at(3 * low + 1),
                at(3 * low + 2),
                at(3 * high),
                at(3 * high + 1),
                mix,
                dt,
            )
        }
    }
}

// ============================================================================
// Morph weight scratch
// ============================================================================

/// Per-worker table of the morph weights sampled for the current frame,
/// addressed by target node index. Rows left empty fall back to the mesh's
/// rest weights.
#[derive(Debug, Clone, Default)]
pub struct MorphWeightTable {
    rows: Vec<Vec<f32>>,
}

impl MorphWeightTable {
    #[must_use]
    pub fn new(node_count: usize) -> Self {
        Self {
            rows: vec![Vec::new(); node_count],
        }
    }

    /// Clears every row without releasing capacity.
    pub fn reset(&mut self) {
        for row in &mut self.rows {
            row.clear();
        }
    }

    /// The writable weight row for `node`, sized to `targets`.
    pub fn row_mut(&mut self, node: usize, targets: usize) -> &mut [f32] {
        let row = &mut self.rows[node];
        row.resize(targets, 0.0);
        row
    }

    /// The sampled weights for `node`, when any channel wrote them.
    #[must_use]
    pub fn get(&self, node: usize) -> Option<&[f32]> {
        match self.rows.get(node) {
            Some(row) if !row.is_empty() => Some(row.as_slice()),
            _ => None,
        }
    }
}
