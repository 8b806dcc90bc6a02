//! CLI command implementations

use crate::output::{format_report, InspectReport};
use anyhow::{anyhow, bail, Context};
use kino_dash::{
    AdaptationInfo, ControllerConfig, DashManifestModel, EventBus, Manifest, ManifestModel,
    ManualQualityPolicy, MediaType, MemoryStore, RepresentationController, StreamContext,
    TimelineConverter, UpdateOutcome,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Resolve one adaptation set and print its representation ladder
pub async fn inspect(
    path: &Path,
    media_type: Option<MediaType>,
    period_index: usize,
    adaptation_index: usize,
    quality: Option<usize>,
    format: &str,
) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let manifest = Manifest::from_json(&content)?;

    let bus = EventBus::default();
    let manifest_model = Arc::new(ManifestModel::new());
    let manifest = manifest_model.set_value(manifest);

    let fragment = manifest
        .period(period_index)
        .ok_or_else(|| anyhow!("period {} not found", period_index))?
        .adaptation_sets
        .get(adaptation_index)
        .cloned()
        .ok_or_else(|| anyhow!("adaptation set {} not found in period {}", adaptation_index, period_index))?;

    let media_type = match media_type.or_else(|| fragment.media_type()) {
        Some(media_type) => media_type,
        None => bail!("cannot infer media type, pass --type"),
    };

    let abr = Arc::new(ManualQualityPolicy::new(bus.clone()));
    if let Some(quality) = quality {
        abr.set_quality_for(media_type, quality);
    }

    let config = ControllerConfig::builder()
        .abr_controller(abr)
        .dom_storage(Arc::new(MemoryStore::new()))
        .dash_manifest_model(Arc::new(DashManifestModel::new(
            manifest_model.clone(),
            TimelineConverter::default(),
        )))
        .manifest_model(manifest_model)
        .stream_processor(StreamContext::new(format!("period-{}", period_index), media_type))
        .build()?;

    let controller = RepresentationController::new(bus);
    controller.initialize(config)?;

    let parent = AdaptationInfo {
        period_index,
        index: adaptation_index,
        media_type,
    };
    match controller.update_data(fragment, parent, media_type)?.wait().await {
        UpdateOutcome::Installed => {}
        UpdateOutcome::Failed(e) => bail!("resolution failed: {}", e),
        UpdateOutcome::Superseded => bail!("update was superseded"),
    }

    let set = controller
        .snapshot()
        .ok_or_else(|| anyhow!("no representation set installed"))?;
    info!(representations = set.len(), "Representation set resolved");

    println!("{}", format_report(&InspectReport::from_set(&set), format));

    controller.reset();
    Ok(())
}
