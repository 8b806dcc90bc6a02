//! Parsed DASH manifest model
//!
//! The controller never sees raw MPD syntax. It consumes the already-parsed
//! structure below, usually deserialized from JSON, through a
//! [`ManifestAccessor`].

mod adapter;
mod timeline;

pub use adapter::{DashManifestModel, ManifestFragmentAdapter, ResolvedAdaptation};
pub use timeline::{SystemTimeSource, TimeSource, TimelineConverter};

use crate::{events::{EventBus, ManifestEvent}, types::MediaType, Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Manifest presentation types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    /// On-demand presentation
    #[default]
    Static,
    /// Live presentation, refreshed periodically
    Dynamic,
}

/// SegmentTemplate attributes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SegmentTemplate {
    pub timescale: Option<u64>,
    pub duration: Option<u64>,
    pub start_number: Option<u64>,
    pub presentation_time_offset: Option<u64>,
    pub media: Option<String>,
    pub initialization: Option<String>,
}

/// Representation element of an adaptation set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepresentationFragment {
    pub id: String,
    #[serde(default)]
    pub bandwidth: Option<u64>,
    #[serde(default)]
    pub codecs: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default, rename = "baseURL")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub segment_template: Option<SegmentTemplate>,
}

/// AdaptationSet element, the raw fragment handed to the controller
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdaptationSetFragment {
    pub id: Option<String>,
    pub content_type: Option<String>,
    pub mime_type: Option<String>,
    pub codecs: Option<String>,
    pub segment_template: Option<SegmentTemplate>,
    pub representations: Vec<RepresentationFragment>,
}

impl AdaptationSetFragment {
    /// Media type declared by `contentType`, falling back to `mimeType`
    pub fn media_type(&self) -> Option<MediaType> {
        self.content_type
            .as_deref()
            .and_then(MediaType::from_content_type)
            .or_else(|| self.mime_type.as_deref().and_then(MediaType::from_content_type))
    }
}

/// Period element
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Period {
    pub id: Option<String>,
    /// Start in seconds of presentation time
    pub start: f64,
    /// Duration in seconds, if known
    pub duration: Option<f64>,
    pub adaptation_sets: Vec<Arc<AdaptationSetFragment>>,
}

impl Period {
    /// Position of an adaptation set in this period
    ///
    /// Matches by identity first, then by `id`.
    pub fn adaptation_index(&self, fragment: &Arc<AdaptationSetFragment>) -> Option<usize> {
        self.adaptation_sets
            .iter()
            .position(|a| Arc::ptr_eq(a, fragment))
            .or_else(|| {
                let id = fragment.id.as_ref()?;
                self.adaptation_sets
                    .iter()
                    .position(|a| a.id.as_ref() == Some(id))
            })
    }
}

/// Parsed manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, rename = "type")]
    pub kind: ManifestKind,
    #[serde(rename = "baseURL")]
    pub base_url: Url,
    #[serde(default)]
    pub availability_start_time: Option<DateTime<Utc>>,
    /// Seconds of content kept behind the live edge
    #[serde(default)]
    pub time_shift_buffer_depth: Option<f64>,
    /// Total duration in seconds (static presentations)
    #[serde(default)]
    pub media_presentation_duration: Option<f64>,
    #[serde(default)]
    pub periods: Vec<Period>,
}

impl Manifest {
    /// Parse a manifest from its JSON form
    pub fn from_json(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if self.is_dynamic() && self.availability_start_time.is_none() {
            return Err(Error::InvalidManifest(
                "dynamic manifest without availabilityStartTime".to_string(),
            ));
        }
        for (index, period) in self.periods.iter().enumerate() {
            if period.duration.is_some_and(|d| d < 0.0) {
                return Err(Error::InvalidManifest(format!("period {index} has negative duration")));
            }
        }
        Ok(())
    }

    /// Is this a live presentation
    pub fn is_dynamic(&self) -> bool {
        self.kind == ManifestKind::Dynamic
    }

    /// Get a period by index
    pub fn period(&self, index: usize) -> Option<&Period> {
        self.periods.get(index)
    }

    /// Duration of a period, derived from the next period or the presentation duration when absent
    pub fn period_duration(&self, index: usize) -> Option<f64> {
        let period = self.periods.get(index)?;
        if let Some(duration) = period.duration {
            return Some(duration);
        }
        match self.periods.get(index + 1) {
            Some(next) => Some((next.start - period.start).max(0.0)),
            None => self
                .media_presentation_duration
                .map(|total| (total - period.start).max(0.0)),
        }
    }
}

/// Parent adaptation descriptor passed alongside a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptationInfo {
    /// Index of the owning period in the manifest
    pub period_index: usize,
    /// Index of the adaptation set as known by the caller
    pub index: usize,
    pub media_type: MediaType,
}

/// Read access to the current manifest
pub trait ManifestAccessor: Send + Sync {
    /// Current manifest, if one is loaded
    fn manifest(&self) -> Option<Arc<Manifest>>;

    /// Whether manifest refreshes are announced with [`ManifestEvent::Updated`]
    fn announces_refresh(&self) -> bool {
        false
    }
}

/// Holder of the current manifest for a playback context
pub struct ManifestModel {
    value: RwLock<Option<Arc<Manifest>>>,
    bus: Option<EventBus>,
}

impl ManifestModel {
    /// Create an empty model that does not announce refreshes
    pub fn new() -> Self {
        Self {
            value: RwLock::new(None),
            bus: None,
        }
    }

    /// Create an empty model announcing every stored manifest on `bus`
    pub fn with_event_bus(bus: EventBus) -> Self {
        Self {
            value: RwLock::new(None),
            bus: Some(bus),
        }
    }

    /// Store a manifest, replacing the previous one
    pub fn set_value(&self, manifest: impl Into<Arc<Manifest>>) -> Arc<Manifest> {
        let manifest = manifest.into();
        *self.value.write() = Some(manifest.clone());

        info!(
            periods = manifest.periods.len(),
            dynamic = manifest.is_dynamic(),
            "Manifest stored"
        );

        if let Some(bus) = &self.bus {
            debug!("Announcing manifest refresh");
            bus.publish(ManifestEvent::Updated {
                manifest: manifest.clone(),
            });
        }

        manifest
    }

    /// Drop the current manifest
    pub fn clear(&self) {
        *self.value.write() = None;
    }
}

impl Default for ManifestModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestAccessor for ManifestModel {
    fn manifest(&self) -> Option<Arc<Manifest>> {
        self.value.read().clone()
    }

    fn announces_refresh(&self) -> bool {
        self.bus.is_some()
    }
}
