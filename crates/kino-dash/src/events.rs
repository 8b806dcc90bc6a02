//! Event channel for representation lifecycle notifications
//!
//! One [`EventBus`] is created per playback context and cloned into every
//! component that publishes or listens. Controllers for different media types
//! share the bus; every event that concerns a single media type carries it.

use crate::error::ResolutionError;
use crate::manifest::{AdaptationSetFragment, Manifest};
use crate::types::{MediaType, Representation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBusConfig {
    /// Events retained per subscriber before it starts lagging
    pub capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

/// Representation data lifecycle events
#[derive(Debug, Clone)]
pub enum RepresentationEvent {
    /// An update cycle started; published before any resolution work
    DataUpdateStarted { media_type: MediaType },
    /// A new representation set was installed
    DataUpdateCompleted {
        media_type: MediaType,
        data: Arc<AdaptationSetFragment>,
        current_representation: Option<Representation>,
    },
}

/// Manifest model events
#[derive(Debug, Clone)]
pub enum ManifestEvent {
    /// A new manifest was stored in the manifest model
    Updated { manifest: Arc<Manifest> },
    /// An adaptation set could not be resolved
    Error {
        media_type: MediaType,
        error: ResolutionError,
    },
}

/// Quality adaptation events
#[derive(Debug, Clone)]
pub enum AbrEvent {
    /// The quality policy selected a new quality index
    QualityChangeRequested {
        media_type: MediaType,
        old_quality: Option<usize>,
        new_quality: usize,
    },
}

/// Unified event for a playback context
#[derive(Debug, Clone)]
pub enum Event {
    Representation(RepresentationEvent),
    Manifest(ManifestEvent),
    Abr(AbrEvent),
}

impl Event {
    /// Media type tag, for events scoped to one media type
    pub fn media_type(&self) -> Option<MediaType> {
        match self {
            Event::Representation(RepresentationEvent::DataUpdateStarted { media_type })
            | Event::Representation(RepresentationEvent::DataUpdateCompleted { media_type, .. })
            | Event::Manifest(ManifestEvent::Error { media_type, .. })
            | Event::Abr(AbrEvent::QualityChangeRequested { media_type, .. }) => Some(*media_type),
            Event::Manifest(ManifestEvent::Updated { .. }) => None,
        }
    }
}

impl From<RepresentationEvent> for Event {
    fn from(e: RepresentationEvent) -> Self {
        Self::Representation(e)
    }
}

impl From<ManifestEvent> for Event {
    fn from(e: ManifestEvent) -> Self {
        Self::Manifest(e)
    }
}

impl From<AbrEvent> for Event {
    fn from(e: AbrEvent) -> Self {
        Self::Abr(e)
    }
}

/// Publish/subscribe bus scoped to one playback context.
///
/// `publish()` is synchronous: a receiver obtained before the call can
/// `try_recv()` the event as soon as `publish()` returns. Dropping a receiver
/// unsubscribes it. Events published with no subscribers are dropped.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Create a new event bus from configuration
    pub fn with_config(config: &EventBusConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Publish an event to all current subscribers
    pub fn publish<E: Into<Event>>(&self, event: E) {
        let _ = self.tx.send(event.into());
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_config(&EventBusConfig::default())
    }
}
