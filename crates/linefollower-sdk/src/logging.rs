//! 日志初始化
//!
//! 安装 `tracing-subscriber` fmt 订阅者，并通过 `tracing-log` 把 `log` 门面的记录
//! 转发到 `tracing`（serialport 等依赖使用 `log`）。

use tracing_subscriber::EnvFilter;

/// 默认过滤级别（`RUST_LOG` 未设置时）
pub const DEFAULT_FILTER: &str = "info";

/// 初始化日志：`RUST_LOG` 优先，否则使用 `info`
///
/// 重复调用无副作用。
pub fn init_logger() {
    init_logger_with_filter(DEFAULT_FILTER);
}

/// 以指定的默认过滤规则初始化日志（`RUST_LOG` 仍然优先）
///
/// 返回本次调用是否完成了安装。
pub fn init_logger_with_filter(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // 已有全局 logger 时 LogTracer 安装失败，忽略即可
    let _ = tracing_log::LogTracer::init();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).is_ok()
}
