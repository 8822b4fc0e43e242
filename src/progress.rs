use crate::config::ProgressLogLevel;
use crate::logging::PROGRESS_TARGET;
use anyhow::Result;
use std::time::{Duration, Instant};
use wfc_core::{ProgressInfo, RunReport, WfcError};

/// Trait for reporting the progress of the WFC algorithm.
pub trait ProgressReporter {
    /// Called after every iteration with the latest snapshot.
    fn report(&mut self, info: &ProgressInfo<'_>) -> Result<()>;

    /// Called when the WFC process completes successfully.
    fn finish(&mut self, report: &RunReport) -> Result<()>;

    /// Called when the WFC process fails with an error.
    fn fail(&mut self, error: &WfcError) -> Result<()>;
}

/// A `ProgressReporter` that writes throttled status lines to the log.
pub struct LogProgressReporter {
    start_time: Instant,
    last_report_time: Option<Instant>,
    report_interval: Duration,
    level: log::Level,
}

impl LogProgressReporter {
    /// At most one line per `report_interval`, logged at `level`.
    pub fn new(report_interval: Duration, level: ProgressLogLevel) -> Self {
        Self {
            start_time: Instant::now(),
            last_report_time: None,
            report_interval,
            level: level.into(),
        }
    }

    fn format_duration(duration: Duration) -> String {
        format!("{}.{:03}s", duration.as_secs(), duration.subsec_millis())
    }

    /// Whether a report at `now` passes the throttle.
    fn due(&self, now: Instant) -> bool {
        self.last_report_time
            .map_or(true, |last| now.duration_since(last) >= self.report_interval)
    }
}

impl ProgressReporter for LogProgressReporter {
    fn report(&mut self, info: &ProgressInfo<'_>) -> Result<()> {
        let now = Instant::now();
        if !self.due(now) {
            return Ok(());
        }

        let percentage = if info.total_cells > 0 {
            (info.collapsed_cells as f32 / info.total_cells as f32) * 100.0
        } else {
            100.0
        };
        let eta = if info.collapsed_cells > 0 && info.collapsed_cells < info.total_cells {
            let per_cell = info.elapsed_time.as_secs_f64() / info.collapsed_cells as f64;
            let remaining = (info.total_cells - info.collapsed_cells) as f64;
            Self::format_duration(Duration::from_secs_f64(per_cell * remaining))
        } else {
            "N/A".to_string()
        };

        log::log!(
            target: PROGRESS_TARGET,
            self.level,
            "Progress: Iter: {} | Collapsed: {}/{} ({:.1}%) | Last: {} at {} | Elapsed: {} | ETA: {}",
            info.iterations,
            info.collapsed_cells,
            info.total_cells,
            percentage,
            info.last_step.module,
            info.last_step.position,
            Self::format_duration(info.elapsed_time),
            eta
        );
        self.last_report_time = Some(now);
        Ok(())
    }

    fn finish(&mut self, report: &RunReport) -> Result<()> {
        log::log!(
            target: PROGRESS_TARGET,
            self.level,
            "WFC finished successfully after {} iterations. Total time: {}",
            report.iterations,
            Self::format_duration(self.start_time.elapsed())
        );
        Ok(())
    }

    fn fail(&mut self, error: &WfcError) -> Result<()> {
        log::error!(
            target: PROGRESS_TARGET,
            "WFC failed: {}. Total time: {}",
            error,
            Self::format_duration(self.start_time.elapsed())
        );
        Ok(())
    }
}
