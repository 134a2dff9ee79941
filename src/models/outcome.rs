use std::time::Duration;

/// 状态码0表示没有拿到响应（连接失败、超时等）
pub const STATUS_TRANSPORT_ERROR: u16 = 0;

/// 单个请求的结果，交给统计器后即丢弃
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestOutcome {
    pub status: u16,
    pub body_size: u64,
    pub elapsed: Duration,
}

impl RequestOutcome {
    pub fn response(status: u16, body_size: u64, elapsed: Duration) -> Self {
        RequestOutcome {
            status,
            body_size,
            elapsed,
        }
    }

    pub fn transport_error(elapsed: Duration) -> Self {
        RequestOutcome {
            status: STATUS_TRANSPORT_ERROR,
            body_size: 0,
            elapsed,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_transport_error(&self) -> bool {
        self.status == STATUS_TRANSPORT_ERROR
    }
}
