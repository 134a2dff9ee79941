use std::fmt;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use url::Url;

use crate::models::args::Args;
use crate::models::error::ConfigError;

/// 默认报告周期
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// 双向TLS使用的客户端证书，PEM里同时包含证书链和私钥
#[derive(Clone)]
pub struct ClientIdentity {
    path: PathBuf,
    pem: Vec<u8>,
}

impl ClientIdentity {
    /// 读取并校验证书，解析失败直接返回错误
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let pem = std::fs::read(&path).map_err(|source| ConfigError::ReadCertificate {
            path: path.clone(),
            source,
        })?;
        let identity = Self { path, pem };
        identity
            .to_identity()
            .map_err(|source| ConfigError::ParseCertificate {
                path: identity.path.clone(),
                source,
            })?;
        Ok(identity)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn to_identity(&self) -> reqwest::Result<reqwest::Identity> {
        reqwest::Identity::from_pem(&self.pem)
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// 一次压测的全部配置，启动后只读
#[derive(Clone, Debug)]
pub struct LoadConfig {
    pub url: Url,
    pub concurrency: usize,
    pub timeout: Duration,
    pub keep_alive: bool,
    pub identity: Option<ClientIdentity>,
    pub total_cap: Option<NonZeroU64>,
    pub report_interval: Duration,
    pub format: ReportFormat,
}

impl LoadConfig {
    /// 使用命令行的默认值构建配置：50并发、5秒超时、不限总数
    pub fn new(url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_target(url)?,
            concurrency: 50,
            timeout: Duration::from_secs(5),
            keep_alive: false,
            identity: None,
            total_cap: None,
            report_interval: DEFAULT_REPORT_INTERVAL,
            format: ReportFormat::Text,
        })
    }

    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let config = Self::new(&args.url)?
            .with_concurrency(args.concurrency)?
            .with_timeout(args.timeout)?
            .with_total_cap(args.count)
            .with_keep_alive(args.keep_alive)
            .with_format(args.format);
        // 地址校验通过后再加载证书
        let identity = args.cert.map(ClientIdentity::load).transpose()?;
        Ok(config.with_identity(identity))
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self, ConfigError> {
        if concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        self.concurrency = concurrency;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        self.timeout = timeout;
        Ok(self)
    }

    /// 0表示不限制总请求数
    pub fn with_total_cap(mut self, cap: u64) -> Self {
        self.total_cap = NonZeroU64::new(cap);
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_identity(mut self, identity: Option<ClientIdentity>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }
}

fn parse_target(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::EmptyUrl);
    }
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}
