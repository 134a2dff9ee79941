use anyhow::Context;
use reqwest::Client;

use crate::models::config::LoadConfig;

/// 形如 `pt 0.1.0 (Ubuntu; 22.04)`
pub fn user_agent() -> String {
    let info = os_info::get();
    format!(
        "{} {} ({}; {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        info.os_type(),
        info.version()
    )
}

/// 每个worker独享一个客户端，连接池不共享
pub fn build_client(config: &LoadConfig, user_agent: &str) -> anyhow::Result<Client> {
    let mut builder = Client::builder()
        .timeout(config.timeout)
        .user_agent(user_agent)
        // 关闭压缩，统计的是线上实际字节
        .no_gzip()
        .no_brotli()
        .no_deflate();
    // 关闭keep-alive时不保留空闲连接，每次请求新建连接
    if !config.keep_alive {
        builder = builder.pool_max_idle_per_host(0);
    }
    if let Some(identity) = &config.identity {
        let identity = identity
            .to_identity()
            .with_context(|| format!("加载客户端证书 {:?} 失败", identity.path()))?;
        builder = builder.identity(identity);
    }
    builder.build().context("构建http客户端失败")
}
