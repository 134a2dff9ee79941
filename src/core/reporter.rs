use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::core::stats_aggregator::StatsAggregator;
use crate::models::config::ReportFormat;
use crate::models::result::{RunSummary, WindowReport, WindowSnapshot};

/// 周期性地从统计器取数、计算速率并输出一行报告。
/// 是否结束压测不由这里决定。
pub struct Reporter {
    stats: Arc<StatsAggregator>,
    format: ReportFormat,
    summary: RunSummary,
}

impl Reporter {
    pub fn new(stats: Arc<StatsAggregator>, format: ReportFormat) -> Self {
        Reporter {
            stats,
            format,
            summary: RunSummary::default(),
        }
    }

    /// 空窗口跳过本次报告
    pub fn tick(&mut self, now: Instant) -> Option<WindowReport> {
        let snapshot = self.stats.snapshot_and_reset_if_active(now)?;
        self.report(&snapshot)
    }

    fn report(&mut self, snapshot: &WindowSnapshot) -> Option<WindowReport> {
        let report = WindowReport::from_snapshot(snapshot)?;
        self.summary.absorb(snapshot);
        self.emit(&report);
        Some(report)
    }

    pub fn emit(&self, report: &WindowReport) {
        let line = self.format_line(report);
        info!(target: "pt::report", "{}", line);
    }

    pub fn format_line(&self, report: &WindowReport) -> String {
        match self.format {
            ReportFormat::Text => report.to_text_line(),
            ReportFormat::Json => report.to_json_line(),
        }
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }
}
