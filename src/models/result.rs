use std::time::Duration;

use serde::{Serialize, Serializer};
use serde_json::json;

/// 一个统计窗口的原始数据，由统计器在清零前取出
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WindowSnapshot {
    pub count: u64,
    pub count_200: u64,
    pub errors: u64,
    pub total_time: Duration,
    pub min_time: Option<Duration>,
    pub max_time: Option<Duration>,
    pub total_bytes: u64,
    pub elapsed_window: Duration,
}

impl WindowSnapshot {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn avg_time(&self) -> Option<Duration> {
        average(self.total_time, self.count)
    }
}

/// 对外输出的一行报告
#[derive(Clone, Debug, PartialEq)]
pub struct WindowReport {
    pub min_rt: Duration,
    pub max_rt: Duration,
    pub avg_rt: Duration,
    pub rps: f64,
    pub mib_per_sec: f64,
    pub count: u64,
    pub count_200: u64,
    pub errors: u64,
    pub success_pct: f64,
}

impl WindowReport {
    /// 空窗口不产生报告
    pub fn from_snapshot(snapshot: &WindowSnapshot) -> Option<Self> {
        let min_rt = snapshot.min_time?;
        let max_rt = snapshot.max_time?;
        let avg_rt = snapshot.avg_time()?;
        let secs = snapshot.elapsed_window.as_secs_f64();
        let (rps, mib_per_sec) = if secs > 0.0 {
            (
                snapshot.count as f64 / secs,
                snapshot.total_bytes as f64 / secs / 1024.0 / 1024.0,
            )
        } else {
            (0.0, 0.0)
        };
        Some(WindowReport {
            min_rt,
            max_rt,
            avg_rt,
            rps,
            mib_per_sec,
            count: snapshot.count,
            count_200: snapshot.count_200,
            errors: snapshot.errors,
            success_pct: 100.0 * snapshot.count_200 as f64 / snapshot.count as f64,
        })
    }

    pub fn to_text_line(&self) -> String {
        format!(
            "Min RT: {:?}\tMax RT: {:?}\tAvg RT: {:?}\tRPS: {:.3}\tMb/s: {:.3}\tRC: {}\tSuccess(200): {:.2}%",
            self.min_rt,
            self.max_rt,
            self.avg_rt,
            self.rps,
            self.mib_per_sec,
            self.count,
            self.success_pct,
        )
    }

    pub fn to_json_line(&self) -> String {
        json!({
            "min_rt_ms": millis(self.min_rt),
            "max_rt_ms": millis(self.max_rt),
            "avg_rt_ms": millis(self.avg_rt),
            "rps": self.rps,
            "mib_per_sec": self.mib_per_sec,
            "count": self.count,
            "count_200": self.count_200,
            "errors": self.errors,
            "success_pct": self.success_pct,
        })
        .to_string()
    }
}

/// 整个压测过程的汇总，结束时打印
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunSummary {
    pub windows: u64,
    pub total_requests: u64,
    pub total_200: u64,
    pub total_errors: u64,
    pub total_bytes: u64,
    #[serde(rename = "total_rt_ms", serialize_with = "serialize_millis")]
    pub total_time: Duration,
    #[serde(rename = "min_rt_ms", serialize_with = "serialize_opt_millis")]
    pub min_time: Option<Duration>,
    #[serde(rename = "max_rt_ms", serialize_with = "serialize_opt_millis")]
    pub max_time: Option<Duration>,
    pub issued: Option<u64>,
    #[serde(rename = "wall_time_secs", serialize_with = "serialize_secs")]
    pub wall_time: Duration,
}

impl RunSummary {
    /// 合并一个已上报的窗口
    pub fn absorb(&mut self, snapshot: &WindowSnapshot) {
        if snapshot.is_empty() {
            return;
        }
        self.windows += 1;
        self.total_requests += snapshot.count;
        self.total_200 += snapshot.count_200;
        self.total_errors += snapshot.errors;
        self.total_bytes += snapshot.total_bytes;
        self.total_time += snapshot.total_time;
        self.min_time = min_opt(self.min_time, snapshot.min_time);
        self.max_time = self.max_time.max(snapshot.max_time);
    }

    pub fn avg_time(&self) -> Option<Duration> {
        average(self.total_time, self.total_requests)
    }

    pub fn success_pct(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        100.0 * self.total_200 as f64 / self.total_requests as f64
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn average(total: Duration, count: u64) -> Option<Duration> {
    if count == 0 {
        return None;
    }
    let nanos = total.as_nanos() / u128::from(count);
    Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
}

fn min_opt(a: Option<Duration>, b: Option<Duration>) -> Option<Duration> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn millis(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(millis(*d))
}

fn serialize_opt_millis<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match d {
        Some(d) => s.serialize_some(&millis(*d)),
        None => s.serialize_none(),
    }
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
