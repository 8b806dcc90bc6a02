//! Controller configuration
//!
//! Every collaborator a representation controller needs is bound once, through
//! [`ControllerConfig`], and validated when the config is built.

use crate::{
    abr::QualityPolicy,
    manifest::{ManifestAccessor, ManifestFragmentAdapter},
    types::MediaType,
    Error, Result,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Key/value persistence handed through to collaborators
pub trait PersistentStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}

/// In-memory persistent store
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.values.write().insert(key.to_string(), value);
    }
}

/// Stream the controller belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamContext {
    /// Identifier of the owning stream
    pub stream_id: String,
    /// Media type handled by this stream, fixed for its lifetime
    pub media_type: MediaType,
}

impl StreamContext {
    pub fn new(stream_id: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            stream_id: stream_id.into(),
            media_type,
        }
    }
}

/// Collaborators bound to a representation controller
#[derive(Clone)]
pub struct ControllerConfig {
    pub abr_controller: Arc<dyn QualityPolicy>,
    pub dom_storage: Arc<dyn PersistentStore>,
    pub dash_manifest_model: Arc<dyn ManifestFragmentAdapter>,
    pub manifest_model: Arc<dyn ManifestAccessor>,
    pub stream_processor: StreamContext,
}

impl ControllerConfig {
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::default()
    }
}

impl std::fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("stream_processor", &self.stream_processor)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ControllerConfig`]
#[derive(Default)]
pub struct ControllerConfigBuilder {
    abr_controller: Option<Arc<dyn QualityPolicy>>,
    dom_storage: Option<Arc<dyn PersistentStore>>,
    dash_manifest_model: Option<Arc<dyn ManifestFragmentAdapter>>,
    manifest_model: Option<Arc<dyn ManifestAccessor>>,
    stream_processor: Option<StreamContext>,
}

impl ControllerConfigBuilder {
    pub fn abr_controller(mut self, abr_controller: Arc<dyn QualityPolicy>) -> Self {
        self.abr_controller = Some(abr_controller);
        self
    }

    pub fn dom_storage(mut self, dom_storage: Arc<dyn PersistentStore>) -> Self {
        self.dom_storage = Some(dom_storage);
        self
    }

    pub fn dash_manifest_model(mut self, adapter: Arc<dyn ManifestFragmentAdapter>) -> Self {
        self.dash_manifest_model = Some(adapter);
        self
    }

    pub fn manifest_model(mut self, manifest_model: Arc<dyn ManifestAccessor>) -> Self {
        self.manifest_model = Some(manifest_model);
        self
    }

    pub fn stream_processor(mut self, stream: StreamContext) -> Self {
        self.stream_processor = Some(stream);
        self
    }

    /// Validate that every collaborator is bound
    pub fn build(self) -> Result<ControllerConfig> {
        let mut missing = Vec::new();
        if self.abr_controller.is_none() {
            missing.push("abr_controller");
        }
        if self.dom_storage.is_none() {
            missing.push("dom_storage");
        }
        if self.dash_manifest_model.is_none() {
            missing.push("dash_manifest_model");
        }
        if self.manifest_model.is_none() {
            missing.push("manifest_model");
        }
        if self.stream_processor.is_none() {
            missing.push("stream_processor");
        }

        match (
            self.abr_controller,
            self.dom_storage,
            self.dash_manifest_model,
            self.manifest_model,
            self.stream_processor,
        ) {
            (Some(abr_controller), Some(dom_storage), Some(dash_manifest_model), Some(manifest_model), Some(stream_processor)) => {
                Ok(ControllerConfig {
                    abr_controller,
                    dom_storage,
                    dash_manifest_model,
                    manifest_model,
                    stream_processor,
                })
            }
            _ => Err(Error::InvalidConfig(format!("missing {}", missing.join(", ")))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get("lastBitrate.video"), None);
        store.set("lastBitrate.video", "1200".to_string());
        assert_eq!(store.get("lastBitrate.video").as_deref(), Some("1200"));
    }

    #[test]
    fn test_build_reports_missing_collaborators() {
        let err = ControllerConfig::builder()
            .dom_storage(Arc::new(MemoryStore::new()))
            .stream_processor(StreamContext::new("stream-0", MediaType::Video))
            .build()
            .unwrap_err();

        match err {
            Error::InvalidConfig(msg) => {
                assert_eq!(msg, "missing abr_controller, dash_manifest_model, manifest_model");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
