use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::models::config::ReportFormat;

#[derive(Parser, Debug)]
#[command(name = "pt", version, about = "HTTP GET 并发压测工具", long_about = None)]
pub struct Args {
    /// 目标地址
    #[arg(long, env = "PT_URL", default_value = "")]
    pub url: String,

    /// 并发数
    #[arg(short = 'n', long = "concurrency", default_value_t = 50)]
    pub concurrency: usize,

    /// 客户端证书（PEM，同时包含证书和私钥）
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// 开启keep-alive
    #[arg(long = "ka", default_value_t = false)]
    pub keep_alive: bool,

    /// 总请求数（0 - 不限制）
    #[arg(short = 'c', long = "count", default_value_t = 0)]
    pub count: u64,

    /// 单个请求超时时间
    #[arg(
        short = 't',
        long = "timeout",
        default_value = "5s",
        value_parser = humantime::parse_duration
    )]
    pub timeout: Duration,

    /// 报告输出格式
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}
