//! Core types for Kino DASH

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Media type handled by a representation controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
    Text,
}

impl MediaType {
    /// Parse from a DASH `contentType` or MIME type prefix
    pub fn from_content_type(value: &str) -> Option<Self> {
        let prefix = value.split('/').next().unwrap_or(value);
        match prefix.to_ascii_lowercase().as_str() {
            "video" => Some(MediaType::Video),
            "audio" => Some(MediaType::Audio),
            "text" | "application" => Some(MediaType::Text),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Video => write!(f, "video"),
            MediaType::Audio => write!(f, "audio"),
            MediaType::Text => write!(f, "text"),
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "video" => Ok(MediaType::Video),
            "audio" => Ok(MediaType::Audio),
            "text" => Ok(MediaType::Text),
            other => Err(format!("unknown media type: {other}")),
        }
    }
}

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns quality tier name
    pub fn quality_name(&self) -> &'static str {
        match self.height {
            0..=240 => "240p",
            241..=360 => "360p",
            361..=480 => "480p",
            481..=720 => "720p",
            721..=1080 => "1080p",
            1081..=1440 => "1440p",
            _ => "4K",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Presentation-time range in which segments of a representation can be requested
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// Start in seconds of presentation time
    pub start: f64,
    /// End in seconds of presentation time, open-ended when unknown
    pub end: Option<f64>,
}

impl AvailabilityWindow {
    /// Check if a presentation time falls within the window
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && self.end.map_or(true, |end| time <= end)
    }

    /// Window length in seconds, if bounded
    pub fn duration(&self) -> Option<f64> {
        self.end.map(|end| (end - self.start).max(0.0))
    }
}

/// Timing and addressing metadata attached to a representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentInfo {
    /// Units per second for segment timing
    pub timescale: u64,
    /// Nominal segment duration
    pub segment_duration: Option<Duration>,
    /// Number of the first segment
    pub start_number: u64,
    /// Presentation time offset in timescale units
    pub presentation_time_offset: u64,
    /// Media segment URL template
    pub media: Option<String>,
    /// Initialization segment URL template
    pub initialization: Option<String>,
    /// Availability window at resolution time
    pub availability: AvailabilityWindow,
}

impl SegmentInfo {
    /// Number of whole or partial segments covering the availability window
    pub fn segment_count(&self) -> Option<u64> {
        let duration = self.segment_duration?.as_secs_f64();
        if duration <= 0.0 {
            return None;
        }
        let window = self.availability.duration()?;
        Some((window / duration).ceil() as u64)
    }
}

/// One encoded variant of an adaptation set
///
/// Built once per update and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Representation {
    /// Ordinal rank by ascending bandwidth, dense and 0-based
    pub index: usize,
    /// Identifier from the manifest
    pub id: String,
    /// Bandwidth in bits per second
    pub bandwidth: u64,
    /// Codecs string as found in the manifest
    pub codecs: Option<String>,
    /// MIME type as found in the manifest
    pub mime_type: Option<String>,
    /// Video resolution (if video track)
    pub resolution: Option<Resolution>,
    /// Resolved base URL for segment requests
    pub base_url: Url,
    /// Segment timing and availability
    pub segment_info: SegmentInfo,
}

/// Representation controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerState {
    /// No representation set installed
    Empty,
    /// An update is resolving
    Updating,
    /// A representation set is installed and no update is pending
    Ready,
}

impl ControllerState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: ControllerState) -> bool {
        use ControllerState::*;
        matches!(
            (self, target),
            // New update from any state
            (Empty, Updating) | (Ready, Updating) | (Updating, Updating) |
            // Resolution succeeded
            (Updating, Ready) |
            // Resolution failed before anything was installed
            (Updating, Empty) |
            // Reset
            (Ready, Empty) | (Empty, Empty)
        )
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerState::Empty => write!(f, "empty"),
            ControllerState::Updating => write!(f, "updating"),
            ControllerState::Ready => write!(f, "ready"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_content_type() {
        assert_eq!(MediaType::from_content_type("video/mp4"), Some(MediaType::Video));
        assert_eq!(MediaType::from_content_type("audio"), Some(MediaType::Audio));
        assert_eq!(MediaType::from_content_type("application/ttml+xml"), Some(MediaType::Text));
        assert_eq!(MediaType::from_content_type("image/jpeg"), None);
    }

    #[test]
    fn test_media_type_round_trips_through_str() {
        assert_eq!("audio".parse::<MediaType>(), Ok(MediaType::Audio));
        assert!("muxed".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_availability_window() {
        let window = AvailabilityWindow { start: 10.0, end: Some(40.0) };
        assert!(window.contains(10.0));
        assert!(window.contains(40.0));
        assert!(!window.contains(41.0));
        assert_eq!(window.duration(), Some(30.0));

        let open = AvailabilityWindow { start: 0.0, end: None };
        assert!(open.contains(1e9));
        assert_eq!(open.duration(), None);
    }

    #[test]
    fn test_segment_count() {
        let info = SegmentInfo {
            timescale: 1000,
            segment_duration: Some(Duration::from_secs(4)),
            start_number: 1,
            presentation_time_offset: 0,
            media: None,
            initialization: None,
            availability: AvailabilityWindow { start: 0.0, end: Some(30.0) },
        };
        assert_eq!(info.segment_count(), Some(8));
    }

    #[test]
    fn test_controller_state_transitions() {
        assert!(ControllerState::Empty.can_transition_to(ControllerState::Updating));
        assert!(ControllerState::Updating.can_transition_to(ControllerState::Ready));
        assert!(ControllerState::Ready.can_transition_to(ControllerState::Updating));
        assert!(ControllerState::Ready.can_transition_to(ControllerState::Empty));
        assert!(ControllerState::Empty.can_transition_to(ControllerState::Empty));

        assert!(!ControllerState::Empty.can_transition_to(ControllerState::Ready));
        assert!(!ControllerState::Ready.can_transition_to(ControllerState::Ready));
    }
}
