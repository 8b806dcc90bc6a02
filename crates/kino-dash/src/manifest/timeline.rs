//! Presentation timeline conversion
//!
//! Live availability depends on wall-clock time, which may come from a
//! synchronized source, so window computation is async.

use super::Manifest;
use crate::{error::ResolutionError, types::AvailabilityWindow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Wall-clock source for live timing
#[async_trait]
pub trait TimeSource: Send + Sync {
    async fn now(&self) -> Result<DateTime<Utc>, ResolutionError>;
}

/// Local system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

#[async_trait]
impl TimeSource for SystemTimeSource {
    async fn now(&self) -> Result<DateTime<Utc>, ResolutionError> {
        Ok(Utc::now())
    }
}

/// Converts manifest timing into availability windows
#[derive(Clone)]
pub struct TimelineConverter {
    time_source: Arc<dyn TimeSource>,
}

impl TimelineConverter {
    pub fn new(time_source: Arc<dyn TimeSource>) -> Self {
        Self { time_source }
    }

    /// Availability window of a period in presentation seconds
    pub async fn availability_window(
        &self,
        manifest: &Manifest,
        period_index: usize,
    ) -> Result<AvailabilityWindow, ResolutionError> {
        let period = manifest
            .period(period_index)
            .ok_or(ResolutionError::UnknownPeriod(period_index))?;
        let period_end = manifest
            .period_duration(period_index)
            .map(|duration| period.start + duration);

        if !manifest.is_dynamic() {
            return Ok(AvailabilityWindow {
                start: period.start,
                end: period_end,
            });
        }

        let ast = manifest
            .availability_start_time
            .ok_or_else(|| ResolutionError::TimeSource("missing availabilityStartTime".to_string()))?;
        let now = self.time_source.now().await?;
        let live_edge = (now - ast).num_milliseconds() as f64 / 1000.0;

        let mut start = period.start;
        if let Some(depth) = manifest.time_shift_buffer_depth {
            start = start.max(live_edge - depth);
        }
        let end = match period_end {
            Some(end) => end.min(live_edge),
            None => live_edge,
        };

        debug!(live_edge, start, end, "Live availability window");

        Ok(AvailabilityWindow {
            start,
            end: Some(end.max(start)),
        })
    }
}

impl Default for TimelineConverter {
    fn default() -> Self {
        Self::new(Arc::new(SystemTimeSource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ManifestKind, Period};
    use chrono::TimeZone;
    use url::Url;

    struct FixedTime(DateTime<Utc>);

    #[async_trait]
    impl TimeSource for FixedTime {
        async fn now(&self) -> Result<DateTime<Utc>, ResolutionError> {
            Ok(self.0)
        }
    }

    fn manifest(kind: ManifestKind) -> Manifest {
        Manifest {
            kind,
            base_url: Url::parse("https://live.example.com/").unwrap(),
            availability_start_time: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            time_shift_buffer_depth: Some(30.0),
            media_presentation_duration: Some(60.0),
            periods: vec![Period::default()],
        }
    }

    #[tokio::test]
    async fn test_static_window_covers_period() {
        let converter = TimelineConverter::default();
        let window = converter
            .availability_window(&manifest(ManifestKind::Static), 0)
            .await
            .unwrap();
        assert_eq!(window, AvailabilityWindow { start: 0.0, end: Some(60.0) });
    }

    #[tokio::test]
    async fn test_dynamic_window_trails_live_edge() {
        let mut live = manifest(ManifestKind::Dynamic);
        live.media_presentation_duration = None;
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 2, 0).unwrap();
        let converter = TimelineConverter::new(Arc::new(FixedTime(now)));

        let window = converter.availability_window(&live, 0).await.unwrap();
        assert_eq!(window, AvailabilityWindow { start: 90.0, end: Some(120.0) });
    }

    #[test]
    fn test_unknown_period() {
        let converter = TimelineConverter::default();
        let err = tokio_test::block_on(converter.availability_window(&manifest(ManifestKind::Static), 3))
            .unwrap_err();
        assert_eq!(err, ResolutionError::UnknownPeriod(3));
    }
}
