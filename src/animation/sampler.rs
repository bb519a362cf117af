//! Keyframe time axes.

use crate::asset::{AnimationSampler, Document, InterpolationMode};
use crate::errors::{Result, RimeError};

/// An extracted sampler: the scalar time axis one or more channels share,
/// tagged with its min/max time and interpolation mode.
///
/// Immutable after extraction; the per-frame bracketing state lives entirely
/// in the caller's stack.
#[derive(Debug, Clone)]
pub struct Sampler {
    pub times: Vec<f32>,
    pub min_time: f32,
    pub max_time: f32,
    pub mode: InterpolationMode,
}

impl Sampler {
    /// Reads the raw per-keyframe time values for a sampler's input axis.
    /// Narrow integer time axes are widened to `f32`.
    pub fn extract(doc: &Document, desc: &AnimationSampler) -> Result<Self> {
        let view = doc.view(&desc.input)?;
        if view.is_empty() {
            return Err(RimeError::MalformedAsset(
                "animation sampler has an empty time axis".into(),
            ));
        }

        let times: Vec<f32> = (0..view.len()).map(|i| view.scalar_f32(i)).collect();
        for pair in times.windows(2) {
            if pair[1] < pair[0] {
                return Err(RimeError::MalformedAsset(format!(
                    "animation sampler time axis is not monotonic ({} after {})",
                    pair[1], pair[0]
                )));
            }
        }

        Ok(Self {
            min_time: times[0],
            max_time: times[times.len() - 1],
            times,
            mode: desc.mode,
        })
    }

    #[must_use]
    pub fn keyframe_count(&self) -> usize {
        self.times.len()
    }

    /// Finds the keyframe pair bracketing `time` and the normalized blend
    /// factor between them.
    ///
    /// Keyframes are few per clip, so a forward linear scan wins over a
    /// binary search. Outside the axis the query clamps to the end keyframe
    /// (returned as a degenerate pair with `mix = 0`).
    #[must_use]
    pub fn locate(&self, time: f32) -> (usize, usize, f32) {
        let times = &self.times;
        let last = times.len() - 1;

        if time <= times[0] || last == 0 {
            return (0, 0, 0.0);
        }
        if time >= times[last] {
            return (last, last, 0.0);
        }

        let mut high = 1;
        while high < last && times[high] <= time {
            high += 1;
        }
        let low = high - 1;

        let span = times[high] - times[low];
        let mix = if span > 1e-6 {
            (time - times[low]) / span
        } else {
            0.0
        };
        (low, high, mix)
    }

    /// Keyframe interval length in seconds, used to scale spline tangents.
    #[must_use]
    pub fn interval(&self, low: usize, high: usize) -> f32 {
        self.times[high] - self.times[low]
    }
}
