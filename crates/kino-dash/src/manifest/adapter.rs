//! Adaptation set resolution
//!
//! Turns an [`AdaptationSetFragment`] into the ordered representation list
//! installed by the controller.

use super::{
    AdaptationInfo, AdaptationSetFragment, Manifest, ManifestAccessor, RepresentationFragment,
    SegmentTemplate, TimelineConverter,
};
use crate::{
    error::ResolutionError,
    types::{AvailabilityWindow, MediaType, Representation, Resolution, SegmentInfo},
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Outcome of resolving one adaptation set
#[derive(Debug, Clone)]
pub struct ResolvedAdaptation {
    /// Representations ordered by ascending bandwidth, `representations[i].index == i`
    pub representations: Vec<Representation>,
    /// Position of the adaptation set within its period
    pub data_index: usize,
}

/// Converts adaptation set fragments into representations
#[async_trait]
pub trait ManifestFragmentAdapter: Send + Sync {
    async fn resolve(
        &self,
        fragment: &Arc<AdaptationSetFragment>,
        parent: &AdaptationInfo,
        media_type: MediaType,
    ) -> Result<ResolvedAdaptation, ResolutionError>;
}

/// DASH manifest adapter backed by the current manifest
pub struct DashManifestModel {
    manifest_model: Arc<dyn ManifestAccessor>,
    timeline: TimelineConverter,
}

impl DashManifestModel {
    pub fn new(manifest_model: Arc<dyn ManifestAccessor>, timeline: TimelineConverter) -> Self {
        Self {
            manifest_model,
            timeline,
        }
    }

    fn build_representation(
        manifest: &Manifest,
        fragment: &AdaptationSetFragment,
        rep: &RepresentationFragment,
        availability: AvailabilityWindow,
    ) -> Result<Representation, ResolutionError> {
        let bandwidth = rep.bandwidth.ok_or_else(|| ResolutionError::MissingBandwidth {
            id: rep.id.clone(),
        })?;

        let base_url = match rep.base_url.as_deref() {
            Some(path) => manifest.base_url.join(path).map_err(|e| ResolutionError::InvalidBaseUrl {
                id: rep.id.clone(),
                reason: e.to_string(),
            })?,
            None => manifest.base_url.clone(),
        };

        let resolution = match (rep.width, rep.height) {
            (Some(w), Some(h)) => Some(Resolution::new(w, h)),
            _ => None,
        };

        let template = rep
            .segment_template
            .as_ref()
            .or(fragment.segment_template.as_ref());

        Ok(Representation {
            // Assigned after sorting
            index: 0,
            id: rep.id.clone(),
            bandwidth,
            codecs: rep.codecs.clone().or_else(|| fragment.codecs.clone()),
            mime_type: rep.mime_type.clone().or_else(|| fragment.mime_type.clone()),
            resolution,
            base_url,
            segment_info: segment_info(&rep.id, template, availability)?,
        })
    }
}

fn segment_info(
    id: &str,
    template: Option<&SegmentTemplate>,
    availability: AvailabilityWindow,
) -> Result<SegmentInfo, ResolutionError> {
    let timescale = template
        .and_then(|t| t.timescale)
        .filter(|ts| *ts > 0)
        .unwrap_or(1);
    let segment_duration = template
        .and_then(|t| t.duration)
        .map(|d| {
            Duration::try_from_secs_f64(d as f64 / timescale as f64).map_err(|e| {
                ResolutionError::InvalidSegmentTemplate {
                    id: id.to_string(),
                    reason: format!("duration {d} at timescale {timescale}: {e}"),
                }
            })
        })
        .transpose()?;

    Ok(SegmentInfo {
        timescale,
        segment_duration,
        start_number: template.and_then(|t| t.start_number).unwrap_or(1),
        presentation_time_offset: template.and_then(|t| t.presentation_time_offset).unwrap_or(0),
        media: template.and_then(|t| t.media.clone()),
        initialization: template.and_then(|t| t.initialization.clone()),
        availability,
    })
}

#[async_trait]
impl ManifestFragmentAdapter for DashManifestModel {
    #[instrument(skip(self, fragment), fields(adaptation = ?fragment.id))]
    async fn resolve(
        &self,
        fragment: &Arc<AdaptationSetFragment>,
        parent: &AdaptationInfo,
        media_type: MediaType,
    ) -> Result<ResolvedAdaptation, ResolutionError> {
        let manifest = self.manifest_model.manifest().ok_or(ResolutionError::NoManifest)?;
        let period = manifest
            .period(parent.period_index)
            .ok_or(ResolutionError::UnknownPeriod(parent.period_index))?;
        let data_index = period
            .adaptation_index(fragment)
            .ok_or_else(|| ResolutionError::AdaptationNotInManifest {
                id: fragment.id.clone(),
                period_index: parent.period_index,
            })?;

        if let Some(declared) = fragment.media_type() {
            if declared != media_type {
                warn!(%declared, requested = %media_type, "Adaptation set content type differs from requested media type");
                return Err(ResolutionError::MediaTypeMismatch {
                    declared,
                    requested: media_type,
                });
            }
        }

        if fragment.representations.is_empty() {
            return Err(ResolutionError::NoRepresentations);
        }

        let availability = self
            .timeline
            .availability_window(&manifest, parent.period_index)
            .await?;

        let mut representations = fragment
            .representations
            .iter()
            .map(|rep| Self::build_representation(&manifest, fragment, rep, availability))
            .collect::<Result<Vec<_>, _>>()?;

        // Stable: equal bandwidths keep manifest order
        representations.sort_by_key(|r| r.bandwidth);
        for (index, rep) in representations.iter_mut().enumerate() {
            rep.index = index;
        }

        debug!(
            %media_type,
            data_index,
            count = representations.len(),
            "Adaptation set resolved"
        );

        Ok(ResolvedAdaptation {
            representations,
            data_index,
        })
    }
}
