use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use reqwest::Client;
use tokio::sync::watch;
use tracing::{debug, warn};
use url::Url;

use crate::core::budget::RequestBudget;
use crate::core::stats_aggregator::StatsAggregator;
use crate::models::outcome::RequestOutcome;

/// worker退出原因
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    BudgetExhausted,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerExit {
    pub id: usize,
    pub completed: u64,
    pub reason: StopReason,
}

pub struct Worker {
    pub id: usize,
    pub client: Client,
    pub url: Url,
    pub stats: Arc<StatsAggregator>,
    pub budget: Option<Arc<RequestBudget>>,
    pub shutdown: watch::Receiver<bool>,
}

impl Worker {
    /// 不停地发请求，直到预算用完或者收到停止信号。
    /// 被取消的在途请求直接丢弃，不计入统计。
    pub async fn run(mut self) -> WorkerExit {
        let id = self.id;
        let mut completed = 0u64;
        loop {
            if *self.shutdown.borrow() {
                return exit(id, completed, StopReason::Cancelled);
            }
            if let Some(budget) = &self.budget {
                if !budget.try_claim() {
                    return exit(id, completed, StopReason::BudgetExhausted);
                }
            }
            let outcome = tokio::select! {
                biased;
                _ = self.shutdown.wait_for(|stop| *stop) => {
                    debug!(worker = id, "在途请求被取消");
                    return exit(id, completed, StopReason::Cancelled);
                }
                outcome = fetch(&self.client, &self.url, id) => outcome,
            };
            self.stats.record(outcome);
            completed += 1;
        }
    }
}

fn exit(id: usize, completed: u64, reason: StopReason) -> WorkerExit {
    debug!(worker = id, completed, ?reason, "worker退出");
    WorkerExit {
        id,
        completed,
        reason,
    }
}

/// 发一次GET并读完响应体。拿不到响应时状态码记为0
pub async fn fetch(client: &Client, url: &Url, worker: usize) -> RequestOutcome {
    let start = Instant::now();
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(worker, error = %e, "请求失败");
            return RequestOutcome::transport_error(start.elapsed());
        }
    };
    let status = response.status().as_u16();
    let body = response.bytes_stream();
    tokio::pin!(body);
    let mut body_size = 0u64;
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => body_size += bytes.len() as u64,
            Err(e) => {
                // 已经拿到状态码，保留已读取的字节数
                warn!(worker, status, error = %e, "读取响应体失败");
                break;
            }
        }
    }
    RequestOutcome::response(status, body_size, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU64;

    fn worker(budget: Option<Arc<RequestBudget>>, shutdown: watch::Receiver<bool>) -> Worker {
        Worker {
            id: 7,
            client: Client::new(),
            url: Url::parse("http://127.0.0.1:1/").unwrap(),
            stats: Arc::new(StatsAggregator::default()),
            budget,
            shutdown,
        }
    }

    #[tokio::test]
    async fn exhausted_budget_stops_before_any_request() {
        let budget = Arc::new(RequestBudget::new(NonZeroU64::new(1).unwrap()));
        assert!(budget.try_claim());
        let (_tx, rx) = watch::channel(false);

        let exit = worker(Some(Arc::clone(&budget)), rx).run().await;
        assert_eq!(exit.reason, StopReason::BudgetExhausted);
        assert_eq!(exit.completed, 0);
        assert_eq!(budget.issued(), 1);
    }

    #[tokio::test]
    async fn raised_shutdown_stops_before_claiming() {
        let budget = Arc::new(RequestBudget::new(NonZeroU64::new(5).unwrap()));
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let exit = worker(Some(Arc::clone(&budget)), rx).run().await;
        assert_eq!(
            exit,
            WorkerExit {
                id: 7,
                completed: 0,
                reason: StopReason::Cancelled,
            }
        );
        assert_eq!(budget.issued(), 0);
    }

    #[tokio::test]
    async fn refused_connection_yields_status_zero() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("http://{}/", listener.local_addr().unwrap())).unwrap();
        drop(listener);

        let outcome = fetch(&Client::new(), &url, 0).await;
        assert!(outcome.is_transport_error());
        assert_eq!(outcome.body_size, 0);
    }
}
