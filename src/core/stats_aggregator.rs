use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::outcome::RequestOutcome;
use crate::models::result::WindowSnapshot;

/// 当前窗口的计数器，只在统计器的锁内读写
#[derive(Debug)]
struct WindowStats {
    count: u64,
    count_200: u64,
    errors: u64,
    total_time: Duration,
    min_time: Option<Duration>,
    max_time: Option<Duration>,
    total_bytes: u64,
    window_start: Instant,
}

impl WindowStats {
    fn new(window_start: Instant) -> Self {
        WindowStats {
            count: 0,
            count_200: 0,
            errors: 0,
            total_time: Duration::ZERO,
            min_time: None,
            max_time: None,
            total_bytes: 0,
            window_start,
        }
    }

    fn record(&mut self, outcome: &RequestOutcome) {
        self.count += 1;
        if outcome.is_ok() {
            self.count_200 += 1;
        }
        if outcome.is_transport_error() {
            self.errors += 1;
        }
        self.total_time += outcome.elapsed;
        self.total_bytes += outcome.body_size;
        self.max_time = self.max_time.max(Some(outcome.elapsed));
        self.min_time = Some(match self.min_time {
            Some(min) => min.min(outcome.elapsed),
            None => outcome.elapsed,
        });
    }

    /// 取出数据并开启新窗口
    fn take(&mut self, now: Instant) -> WindowSnapshot {
        let snapshot = WindowSnapshot {
            count: self.count,
            count_200: self.count_200,
            errors: self.errors,
            total_time: self.total_time,
            min_time: self.min_time,
            max_time: self.max_time,
            total_bytes: self.total_bytes,
            elapsed_window: now.saturating_duration_since(self.window_start),
        };
        *self = WindowStats::new(now);
        snapshot
    }
}

/// 所有worker共享的窗口统计。
///
/// 写入（每个完成的请求一次）和取数清零（每个报告周期一次）共用同一把锁，
/// 一个结果只会落在记录那一刻打开的窗口里。
#[derive(Debug)]
pub struct StatsAggregator {
    window: Mutex<WindowStats>,
}

impl StatsAggregator {
    pub fn new(start: Instant) -> Self {
        StatsAggregator {
            window: Mutex::new(WindowStats::new(start)),
        }
    }

    pub fn record(&self, outcome: RequestOutcome) {
        self.window.lock().record(&outcome);
    }

    pub fn snapshot_and_reset(&self, now: Instant) -> WindowSnapshot {
        self.window.lock().take(now)
    }

    /// 窗口内没有数据时返回None，并且不重置窗口起点
    pub fn snapshot_and_reset_if_active(&self, now: Instant) -> Option<WindowSnapshot> {
        let mut window = self.window.lock();
        if window.count == 0 {
            return None;
        }
        Some(window.take(now))
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        StatsAggregator::new(Instant::now())
    }
}
