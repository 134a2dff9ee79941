use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinError;
use tokio::time::{interval_at, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::core::budget::RequestBudget;
use crate::core::client::{build_client, user_agent};
use crate::core::reporter::Reporter;
use crate::core::stats_aggregator::StatsAggregator;
use crate::core::worker::{StopReason, Worker, WorkerExit};
use crate::models::config::{LoadConfig, ReportFormat};
use crate::models::result::RunSummary;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    Starting,
    Running,
    Draining,
    Terminated,
}

/// 压测直到预算用完，或者收到Ctrl-C
pub async fn run(config: LoadConfig) -> anyhow::Result<RunSummary> {
    run_until(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("无法监听Ctrl-C: {}", e);
            futures::future::pending::<()>().await;
        }
    })
    .await
}

/// 压测直到预算用完，或者`shutdown`完成。
/// `shutdown`完成后取消所有在途请求，输出最后一个窗口的报告。
pub async fn run_until<F>(config: LoadConfig, shutdown: F) -> anyhow::Result<RunSummary>
where
    F: Future<Output = ()>,
{
    let mut state = RunState::Starting;
    debug!(?state);
    let config = Arc::new(config);
    log_banner(&config);

    // 先把客户端都建好，失败就不开始压测
    let user_agent = user_agent();
    let clients = (0..config.concurrency)
        .map(|_| build_client(&config, &user_agent))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let start = Instant::now();
    let stats = Arc::new(StatsAggregator::new(start));
    let budget = config.total_cap.map(|cap| Arc::new(RequestBudget::new(cap)));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handles: Vec<_> = clients
        .into_iter()
        .enumerate()
        .map(|(id, client)| {
            let worker = Worker {
                id,
                client,
                url: config.url.clone(),
                stats: Arc::clone(&stats),
                budget: budget.clone(),
                shutdown: shutdown_rx.clone(),
            };
            tokio::spawn(worker.run())
        })
        .collect();
    let workers = join_all(handles);
    tokio::pin!(workers);
    tokio::pin!(shutdown);

    state = RunState::Running;
    debug!(?state, workers = config.concurrency);

    let mut reporter = Reporter::new(Arc::clone(&stats), config.format);
    let mut ticker = interval_at(
        (start + config.report_interval).into(),
        config.report_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let exits = loop {
        tokio::select! {
            _ = ticker.tick() => {
                reporter.tick(Instant::now());
            }
            exits = &mut workers => {
                state = RunState::Draining;
                debug!(?state, "所有worker已停止");
                break exits;
            }
            _ = &mut shutdown => {
                state = RunState::Draining;
                info!(?state, "收到停止信号，取消在途请求");
                let _ = shutdown_tx.send(true);
                break (&mut workers).await;
            }
        }
    };

    log_worker_exits(&exits);
    // 最后一个窗口
    reporter.tick(Instant::now());

    let mut summary = reporter.into_summary();
    summary.wall_time = start.elapsed();
    summary.issued = budget.as_ref().map(|budget| budget.issued());

    state = RunState::Terminated;
    debug!(?state);
    log_summary(&summary, config.format);
    Ok(summary)
}

fn log_banner(config: &LoadConfig) {
    if let Some(identity) = &config.identity {
        info!("使用客户端证书 {:?}", identity.path());
    }
    match config.total_cap {
        Some(cap) => info!(
            "开始压测 '{}'，并发 {}，总请求数 {}（keep-alive: {}，超时: {:?}）",
            config.url, config.concurrency, cap, config.keep_alive, config.timeout
        ),
        None => info!(
            "开始压测 '{}'，并发 {}，不限请求数（keep-alive: {}，超时: {:?}）",
            config.url, config.concurrency, config.keep_alive, config.timeout
        ),
    }
}

fn log_worker_exits(exits: &[Result<WorkerExit, JoinError>]) {
    let mut exhausted = 0usize;
    let mut cancelled = 0usize;
    for exit in exits {
        match exit {
            Ok(exit) => match exit.reason {
                StopReason::BudgetExhausted => exhausted += 1,
                StopReason::Cancelled => cancelled += 1,
            },
            Err(e) => error!("worker异常退出: {}", e),
        }
    }
    debug!(exhausted, cancelled, "worker退出统计");
}

fn log_summary(summary: &RunSummary, format: ReportFormat) {
    if format == ReportFormat::Json {
        match summary.to_json_line() {
            Ok(line) => info!(target: "pt::report", "{}", line),
            Err(e) => warn!("序列化压测汇总失败: {}", e),
        }
        return;
    }
    info!(
        "压测结束: 耗时 {:?}，请求数 {}，成功(200) {:.2}%，错误 {}，平均响应时间 {:?}",
        summary.wall_time,
        summary.total_requests,
        summary.success_pct(),
        summary.total_errors,
        summary.avg_time().unwrap_or_default(),
    );
    if let Some(issued) = summary.issued {
        info!("已发出请求 {}", issued);
    }
}
