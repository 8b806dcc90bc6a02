//! Kino DASH - Representation tracking for Kino
//!
//! This crate owns, per media type, the set of representations resolved from
//! the active DASH adaptation set:
//! - Adaptation set resolution into bandwidth-ordered representations
//! - Quality index to representation lookup
//! - Update lifecycle with superseding of overlapping updates
//! - Lifecycle events on a per-playback event bus
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Kino DASH                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │   Manifest   │  │   Fragment   │  │   Quality    │           │
//! │  │    Model     │  │   Adapter    │  │   Policy     │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                  ┌────────┴────────┐                            │
//! │                  │ Representation  │                            │
//! │                  │   Controller    │                            │
//! │                  └────────┬────────┘                            │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │    Event    │                              │
//! │                    │     Bus     │                              │
//! │                    └─────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod abr;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod manifest;
pub mod representation;
pub mod types;

pub use abr::{ManualQualityPolicy, QualityPolicy};
pub use config::{ControllerConfig, ControllerConfigBuilder, MemoryStore, PersistentStore, StreamContext};
pub use controller::{RepresentationController, UpdateHandle, UpdateOutcome};
pub use error::{Error, ResolutionError, Result};
pub use events::{AbrEvent, Event, EventBus, EventBusConfig, ManifestEvent, RepresentationEvent};
pub use manifest::{
    AdaptationInfo, AdaptationSetFragment, DashManifestModel, Manifest, ManifestAccessor,
    ManifestFragmentAdapter, ManifestModel, Period, ResolvedAdaptation, TimelineConverter,
};
pub use representation::RepresentationSet;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
