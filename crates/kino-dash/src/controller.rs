//! Representation Controller - active representation set for one media type
//!
//! Coordinates:
//! - Update lifecycle (`Empty -> Updating -> Ready`)
//! - Adaptation set resolution through the bound adapter
//! - Quality index lookups
//! - Lifecycle events on the playback context's event bus
//!
//! Overlapping updates are serialized: each `update_data` call supersedes any
//! resolution still in flight, and only the newest call may install its
//! result. `reset` supersedes in-flight resolutions the same way.

use crate::{
    config::{ControllerConfig, PersistentStore},
    error::ResolutionError,
    events::{AbrEvent, Event, EventBus, ManifestEvent, RepresentationEvent},
    manifest::{AdaptationInfo, AdaptationSetFragment, Manifest, ResolvedAdaptation},
    representation::RepresentationSet,
    types::{ControllerState, MediaType, Representation},
    Error, Result,
};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, instrument, warn};

/// How an update cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The resolved set was installed
    Installed,
    /// A newer update or a reset took over before the result could be installed
    Superseded,
    /// Resolution failed; the previous state was kept
    Failed(ResolutionError),
}

/// Handle to the asynchronous part of an update
#[derive(Debug)]
pub struct UpdateHandle {
    task: JoinHandle<UpdateOutcome>,
}

impl UpdateHandle {
    /// Wait for the update cycle to end
    ///
    /// A panicking adapter is reported as [`ResolutionError::AdapterPanicked`].
    pub async fn wait(self) -> UpdateOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => {
                let reason = panic_message(&*e.into_panic());
                error!(%reason, "Representation update task panicked");
                UpdateOutcome::Failed(ResolutionError::AdapterPanicked(reason))
            }
            Err(_) => UpdateOutcome::Superseded,
        }
    }

    /// Check if the update cycle has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[derive(Default)]
struct Slot {
    /// Installed set, shared as an immutable snapshot
    set: Option<Arc<RepresentationSet>>,
    /// Bumped by every update and reset; only the matching resolution may install
    generation: u64,
    /// In-flight resolution, if any
    pending: Option<AbortHandle>,
}

impl Slot {
    fn state(&self) -> ControllerState {
        // A task that died without completing leaves a finished handle behind
        match (&self.pending, &self.set) {
            (Some(pending), _) if !pending.is_finished() => ControllerState::Updating,
            (_, Some(_)) => ControllerState::Ready,
            (_, None) => ControllerState::Empty,
        }
    }

    fn supersede(&mut self) -> u64 {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        self.generation += 1;
        self.generation
    }
}

struct Inner {
    bus: EventBus,
    config: RwLock<Option<ControllerConfig>>,
    slot: RwLock<Slot>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

/// Owner of the active representation set for one media type
///
/// Cloning yields another handle to the same controller.
#[derive(Clone)]
pub struct RepresentationController {
    inner: Arc<Inner>,
}

impl RepresentationController {
    /// Create a controller publishing on `bus`
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(Inner {
                bus,
                config: RwLock::new(None),
                slot: RwLock::new(Slot::default()),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Bind collaborators and start listening on the event bus
    ///
    /// Must be called from within a Tokio runtime.
    pub fn initialize(&self, config: ControllerConfig) -> Result<()> {
        {
            let mut bound = self.inner.config.write();
            if bound.is_some() {
                return Err(Error::AlreadyInitialized);
            }
            info!(
                stream_id = %config.stream_processor.stream_id,
                media_type = %config.stream_processor.media_type,
                "Representation controller initialized"
            );
            *bound = Some(config);
        }
        self.inner.ensure_listener();
        Ok(())
    }

    /// Start an update cycle for a new adaptation set fragment
    ///
    /// [`RepresentationEvent::DataUpdateStarted`] is published before this
    /// returns. Resolution continues on a spawned task; the result is announced
    /// with [`RepresentationEvent::DataUpdateCompleted`], or with
    /// [`ManifestEvent::Error`] if it fails.
    pub fn update_data(
        &self,
        fragment: Arc<AdaptationSetFragment>,
        parent: AdaptationInfo,
        media_type: MediaType,
    ) -> Result<UpdateHandle> {
        self.inner.update_data(fragment, parent, media_type)
    }

    /// Adaptation set fragment of the installed set
    pub fn data(&self) -> Option<Arc<AdaptationSetFragment>> {
        self.snapshot().map(|set| set.adaptation_data().clone())
    }

    /// Position of the installed adaptation set within its period
    pub fn data_index(&self) -> Option<usize> {
        self.snapshot().map(|set| set.data_index())
    }

    /// Representation at an ordinal quality index
    ///
    /// Absent, out-of-range indices and an empty controller all give `None`.
    pub fn representation_for_quality(&self, quality: Option<usize>) -> Option<Representation> {
        self.snapshot()?.representation_for_quality(quality).cloned()
    }

    /// Representation at the selected quality index
    pub fn current_representation(&self) -> Option<Representation> {
        self.snapshot()?.current_representation().cloned()
    }

    /// Snapshot of the installed representation set
    pub fn snapshot(&self) -> Option<Arc<RepresentationSet>> {
        self.inner.slot.read().set.clone()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ControllerState {
        self.inner.slot.read().state()
    }

    /// Check if a resolution is in flight
    pub fn is_updating(&self) -> bool {
        self.state() == ControllerState::Updating
    }

    /// Media type fixed at initialization
    pub fn media_type(&self) -> Option<MediaType> {
        self.inner
            .config
            .read()
            .as_ref()
            .map(|config| config.stream_processor.media_type)
    }

    /// Persistent store bound at initialization
    pub fn persistent_store(&self) -> Option<Arc<dyn PersistentStore>> {
        self.inner
            .config
            .read()
            .as_ref()
            .map(|config| config.dom_storage.clone())
    }

    /// Drop the installed set, discard any in-flight resolution and stop listening
    #[instrument(skip(self))]
    pub fn reset(&self) {
        if let Some(listener) = self.inner.listener.lock().take() {
            listener.abort();
        }

        let mut slot = self.inner.slot.write();
        let previous = slot.state();
        debug_assert!(previous.can_transition_to(ControllerState::Empty));
        slot.supersede();
        slot.set = None;

        info!(from = %previous, "Representation controller reset");
    }
}

impl Inner {
    fn media_type(&self) -> Option<MediaType> {
        self.config
            .read()
            .as_ref()
            .map(|config| config.stream_processor.media_type)
    }

    fn ensure_listener(self: &Arc<Self>) {
        let mut listener = self.listener.lock();
        if listener.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        // Subscribe before spawning so nothing published from here on is missed
        let rx = self.bus.subscribe();
        let weak = Arc::downgrade(self);
        *listener = Some(tokio::spawn(listen(weak, rx)));
        debug!("Representation controller listening for events");
    }

    #[instrument(skip(self, fragment, parent), fields(adaptation = ?fragment.id))]
    fn update_data(
        self: &Arc<Self>,
        fragment: Arc<AdaptationSetFragment>,
        parent: AdaptationInfo,
        media_type: MediaType,
    ) -> Result<UpdateHandle> {
        let config = match self.config.read().clone() {
            Some(config) => config,
            None => {
                error!("update_data called before initialize");
                return Err(Error::NotInitialized);
            }
        };

        let expected = config.stream_processor.media_type;
        if media_type != expected {
            error!(%expected, actual = %media_type, "update_data called with wrong media type");
            return Err(Error::MediaTypeMismatch {
                expected,
                actual: media_type,
            });
        }

        self.ensure_listener();

        let mut slot = self.slot.write();
        let previous = slot.state();
        debug_assert!(previous.can_transition_to(ControllerState::Updating));
        if previous == ControllerState::Updating {
            debug!(%media_type, "Superseding in-flight update");
        }
        let generation = slot.supersede();

        self.bus
            .publish(RepresentationEvent::DataUpdateStarted { media_type });
        debug!(%media_type, generation, "Data update started");

        let inner = Arc::clone(self);
        let task = tokio::spawn(async move {
            let result = config
                .dash_manifest_model
                .resolve(&fragment, &parent, media_type)
                .await;
            inner.complete(generation, &config, fragment, parent, media_type, result)
        });

        // The task cannot take the slot lock before this guard drops
        slot.pending = Some(task.abort_handle());

        Ok(UpdateHandle { task })
    }

    fn complete(
        &self,
        generation: u64,
        config: &ControllerConfig,
        fragment: Arc<AdaptationSetFragment>,
        parent: AdaptationInfo,
        media_type: MediaType,
        result: std::result::Result<ResolvedAdaptation, ResolutionError>,
    ) -> UpdateOutcome {
        let preferred = match &result {
            Ok(_) => config.abr_controller.quality_for(media_type),
            Err(_) => None,
        };

        let mut slot = self.slot.write();
        if slot.generation != generation {
            debug!(%media_type, generation, current = slot.generation, "Discarding superseded resolution");
            return UpdateOutcome::Superseded;
        }
        slot.pending = None;
        let had_set = slot.set.is_some();

        match result {
            Ok(resolved) => {
                let set = Arc::new(RepresentationSet::new(
                    media_type,
                    fragment.clone(),
                    parent,
                    resolved,
                    preferred,
                ));
                debug_assert!(ControllerState::Updating.can_transition_to(ControllerState::Ready));
                slot.set = Some(set.clone());

                info!(
                    %media_type,
                    data_index = set.data_index(),
                    representations = set.len(),
                    quality = set.current_quality(),
                    "Data update completed"
                );
                self.bus.publish(RepresentationEvent::DataUpdateCompleted {
                    media_type,
                    data: fragment,
                    current_representation: set.current_representation().cloned(),
                });
                UpdateOutcome::Installed
            }
            Err(error) => {
                debug_assert!(ControllerState::Updating.can_transition_to(slot.state()));
                warn!(%media_type, error = %error, kept_previous = had_set, "Data update failed");
                self.bus.publish(ManifestEvent::Error {
                    media_type,
                    error: error.clone(),
                });
                UpdateOutcome::Failed(error)
            }
        }
    }

    fn apply_quality(&self, quality: usize) {
        let mut slot = self.slot.write();
        let Some(current) = slot.set.as_ref() else {
            debug!(quality, "Quality change with no representation set");
            return;
        };

        match current.with_current_quality(quality) {
            Some(next) => {
                info!(
                    media_type = %next.media_type(),
                    from = current.current_quality(),
                    to = quality,
                    "Current representation switched"
                );
                slot.set = Some(Arc::new(next));
            }
            None => {
                warn!(quality, available = current.len(), "Ignoring out-of-range quality change");
            }
        }
    }

    fn on_manifest_refreshed(self: &Arc<Self>, manifest: &Manifest) {
        let Some(media_type) = self.media_type() else {
            return;
        };
        let current = {
            let slot = self.slot.read();
            if slot.state() != ControllerState::Ready {
                return;
            }
            match &slot.set {
                Some(set) => set.clone(),
                None => return,
            }
        };

        let parent = *current.parent();
        let Some(period) = manifest.period(parent.period_index) else {
            warn!(%media_type, period = parent.period_index, "Refreshed manifest lost the active period");
            return;
        };
        // Positional fallback only for adaptation sets without an id
        let active = current.adaptation_data();
        let refreshed = period
            .adaptation_index(active)
            .or_else(|| active.id.is_none().then_some(current.data_index()))
            .and_then(|index| period.adaptation_sets.get(index))
            .cloned();

        match refreshed {
            Some(fragment) if Arc::ptr_eq(&fragment, current.adaptation_data()) => {
                debug!(%media_type, "Adaptation set unchanged by manifest refresh");
            }
            Some(fragment) => {
                debug!(%media_type, "Re-resolving adaptation set after manifest refresh");
                if let Err(e) = self.update_data(fragment, parent, media_type) {
                    warn!(%media_type, error = %e, "Refresh update rejected");
                }
            }
            None => {
                warn!(%media_type, "Refreshed manifest lost the active adaptation set");
            }
        }
    }
}

async fn listen(inner: Weak<Inner>, mut rx: tokio::sync::broadcast::Receiver<Event>) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Representation controller lagged behind the event bus");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let Some(controller) = inner.upgrade() else {
            break;
        };

        match event {
            Event::Abr(AbrEvent::QualityChangeRequested { media_type, new_quality, .. })
                if Some(media_type) == controller.media_type() =>
            {
                controller.apply_quality(new_quality);
            }
            Event::Manifest(ManifestEvent::Updated { manifest }) => {
                let announces = controller
                    .config
                    .read()
                    .as_ref()
                    .is_some_and(|config| config.manifest_model.announces_refresh());
                if announces {
                    controller.on_manifest_refreshed(&manifest);
                }
            }
            _ => {}
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(pending) = self.slot.get_mut().pending.take() {
            pending.abort();
        }
        if let Some(listener) = self.listener.get_mut().take() {
            listener.abort();
        }
    }
}
