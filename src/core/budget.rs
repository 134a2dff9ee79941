use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// 总请求数预算，所有worker共享。
///
/// 领取用一次CAS完成，成功领取的次数恰好等于上限。
#[derive(Debug)]
pub struct RequestBudget {
    cap: u64,
    issued: AtomicU64,
}

impl RequestBudget {
    pub fn new(cap: NonZeroU64) -> Self {
        RequestBudget {
            cap: cap.get(),
            issued: AtomicU64::new(0),
        }
    }

    /// 领取一个请求名额，预算用完返回false
    pub fn try_claim(&self) -> bool {
        self.issued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |issued| {
                (issued < self.cap).then_some(issued + 1)
            })
            .is_ok()
    }

    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Acquire)
    }
}
