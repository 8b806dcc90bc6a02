//! Representation sets
//!
//! A [`RepresentationSet`] is the fully resolved view of one adaptation set.
//! It is built in one piece at the end of an update and shared as an
//! immutable snapshot.

use crate::manifest::{AdaptationInfo, AdaptationSetFragment, ResolvedAdaptation};
use crate::types::{MediaType, Representation};
use std::sync::Arc;

/// Resolved representations of the active adaptation set
#[derive(Debug, Clone)]
pub struct RepresentationSet {
    media_type: MediaType,
    adaptation_data: Arc<AdaptationSetFragment>,
    parent: AdaptationInfo,
    data_index: usize,
    representations: Arc<[Representation]>,
    current_quality: usize,
}

impl RepresentationSet {
    /// Build a set from a resolution result
    ///
    /// `preferred_quality` is clamped into range; absent means the lowest quality.
    pub fn new(
        media_type: MediaType,
        adaptation_data: Arc<AdaptationSetFragment>,
        parent: AdaptationInfo,
        resolved: ResolvedAdaptation,
        preferred_quality: Option<usize>,
    ) -> Self {
        debug_assert!(resolved
            .representations
            .iter()
            .enumerate()
            .all(|(i, r)| r.index == i));

        let top = resolved.representations.len().saturating_sub(1);
        Self {
            media_type,
            adaptation_data,
            parent,
            data_index: resolved.data_index,
            representations: resolved.representations.into(),
            current_quality: preferred_quality.unwrap_or(0).min(top),
        }
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// The adaptation set fragment this set was resolved from
    pub fn adaptation_data(&self) -> &Arc<AdaptationSetFragment> {
        &self.adaptation_data
    }

    /// Parent adaptation descriptor passed with the update
    pub fn parent(&self) -> &AdaptationInfo {
        &self.parent
    }

    /// Position of the adaptation set within its period
    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn representations(&self) -> &[Representation] {
        &self.representations
    }

    pub fn len(&self) -> usize {
        self.representations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.representations.is_empty()
    }

    /// Representation at an ordinal quality index
    pub fn representation_for_quality(&self, quality: Option<usize>) -> Option<&Representation> {
        self.representations.get(quality?)
    }

    /// Selected quality index
    pub fn current_quality(&self) -> usize {
        self.current_quality
    }

    /// Representation at the selected quality index
    pub fn current_representation(&self) -> Option<&Representation> {
        self.representations.get(self.current_quality)
    }

    /// Copy of this set with another quality selected, `None` if out of range
    pub fn with_current_quality(&self, quality: usize) -> Option<Self> {
        if quality >= self.representations.len() {
            return None;
        }
        Some(Self {
            current_quality: quality,
            ..self.clone()
        })
    }
}
