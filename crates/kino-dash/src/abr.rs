//! Quality policy boundary
//!
//! The adaptation algorithm lives outside this crate. The controller only
//! reads the index the policy currently wants and listens for
//! [`AbrEvent::QualityChangeRequested`].

use crate::events::{AbrEvent, EventBus};
use crate::types::MediaType;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Supplier of the current quality index per media type
pub trait QualityPolicy: Send + Sync {
    /// Quality index currently requested for `media_type`
    fn quality_for(&self, media_type: MediaType) -> Option<usize>;
}

/// Quality policy driven by explicit selections
pub struct ManualQualityPolicy {
    qualities: RwLock<HashMap<MediaType, usize>>,
    bus: EventBus,
}

impl ManualQualityPolicy {
    pub fn new(bus: EventBus) -> Self {
        Self {
            qualities: RwLock::new(HashMap::new()),
            bus,
        }
    }

    /// Select a quality index, announcing it when it changes
    pub fn set_quality_for(&self, media_type: MediaType, quality: usize) {
        let old_quality = self.qualities.write().insert(media_type, quality);
        if old_quality == Some(quality) {
            return;
        }

        debug!(%media_type, ?old_quality, new_quality = quality, "Quality change requested");
        self.bus.publish(AbrEvent::QualityChangeRequested {
            media_type,
            old_quality,
            new_quality: quality,
        });
    }
}

impl QualityPolicy for ManualQualityPolicy {
    fn quality_for(&self, media_type: MediaType) -> Option<usize> {
        self.qualities.read().get(&media_type).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;

    #[test]
    fn test_set_quality_publishes_change() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let policy = ManualQualityPolicy::new(bus);

        assert_eq!(policy.quality_for(MediaType::Video), None);
        policy.set_quality_for(MediaType::Video, 2);
        assert_eq!(policy.quality_for(MediaType::Video), Some(2));
        assert_eq!(policy.quality_for(MediaType::Audio), None);

        match rx.try_recv().unwrap() {
            Event::Abr(AbrEvent::QualityChangeRequested { media_type, old_quality, new_quality }) => {
                assert_eq!(media_type, MediaType::Video);
                assert_eq!(old_quality, None);
                assert_eq!(new_quality, 2);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_same_quality_is_silent() {
        let bus = EventBus::new(8);
        let policy = ManualQualityPolicy::new(bus.clone());
        policy.set_quality_for(MediaType::Audio, 1);

        let mut rx = bus.subscribe();
        policy.set_quality_for(MediaType::Audio, 1);
        assert!(rx.try_recv().is_err());
    }
}
