//! Baked model variants.
//!
//! A source asset bakes into exactly one of these shapes instead of a
//! loosely-typed bag of optional fields: a static rest-pose model, or an
//! animated model replaying precomputed frames by index.

use crate::errors::Result;
use crate::geometry::MeshBuffer;
use crate::morph::{MorphTargets, MorphTransition};

use super::frame::{BakedClip, Frame, MaterialBinding, crossfade_primitive};

/// What a baked model is able to do, probed once at bake time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub has_skin: bool,
    pub has_morph: bool,
    pub has_animation: bool,
}

/// A model without animation clips: one rest-pose frame, replayed as-is.
#[derive(Debug, Clone, Default)]
pub struct StaticModel {
    pub frame: Frame,
    /// One binding per primitive, in frame primitive order.
    pub materials: Vec<MaterialBinding>,
    pub(crate) morph_sets: Vec<MorphTargets>,
    pub capabilities: Capabilities,
}

impl StaticModel {
    #[must_use]
    pub fn morph_sets(&self) -> &[MorphTargets] {
        &self.morph_sets
    }

    /// Playback-time morph crossfade over one primitive of the rest frame.
    pub fn morphed_primitive(
        &self,
        primitive: usize,
        transition: &MorphTransition,
    ) -> Result<MeshBuffer> {
        crossfade_primitive(&self.frame, &self.morph_sets, primitive, transition)
    }
}

/// A model with one baked clip per source animation.
#[derive(Debug, Clone, Default)]
pub struct AnimatedModel {
    pub clips: Vec<BakedClip>,
    pub capabilities: Capabilities,
}

impl AnimatedModel {
    pub fn clip(&self, index: usize) -> Result<&BakedClip> {
        self.clips
            .get(index)
            .ok_or_else(|| crate::errors::RimeError::OutOfRange {
                context: "animation clip".into(),
                index,
            })
    }
}

/// Tagged baked-model variant.
#[derive(Debug, Clone)]
pub enum Model {
    Static(StaticModel),
    Animated(AnimatedModel),
}

impl Model {
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Model::Static(m) => m.capabilities,
            Model::Animated(m) => m.capabilities,
        }
    }

    #[must_use]
    pub fn has_skin(&self) -> bool {
        self.capabilities().has_skin
    }

    #[must_use]
    pub fn has_morph(&self) -> bool {
        self.capabilities().has_morph
    }

    #[must_use]
    pub fn has_animation(&self) -> bool {
        self.capabilities().has_animation
    }
}
