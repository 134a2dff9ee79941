use std::path::PathBuf;

use thiserror::Error;

/// 启动阶段的配置错误，出现即终止进程
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("未指定压测地址")]
    EmptyUrl,

    #[error("无效的压测地址 '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("不支持的协议 '{0}'，只支持http和https")]
    UnsupportedScheme(String),

    #[error("并发数必须大于0")]
    ZeroConcurrency,

    #[error("超时时间必须大于0")]
    ZeroTimeout,

    #[error("读取证书文件 {path:?} 失败: {source}")]
    ReadCertificate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("解析证书 {path:?} 失败: {source}")]
    ParseCertificate {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },
}
