//! Builder 模式实现
//!
//! 提供链式构造 `ConnectionManager` 实例的便捷方式。

use crate::config::ConnectionConfig;
use crate::connection::ConnectionManager;
use crate::error::DriverError;
use crate::events::EventBus;
use crate::logs::DataLogs;
use linefollower_serial::{SerialBackend, SystemBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// ConnectionManager Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use linefollower_driver::ConnectionManagerBuilder;
///
/// // 使用默认配置（系统串口，优先 COM3）
/// let manager = ConnectionManagerBuilder::new().build().unwrap();
///
/// // 指定端口与日志目录
/// let manager = ConnectionManagerBuilder::new()
///     .port("/dev/rfcomm0")
///     .baud_rate(115_200)
///     .log_dir("data")
///     .build()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct ConnectionManagerBuilder {
    config: ConnectionConfig,
    backend: Option<Arc<dyn SerialBackend>>,
    events: Option<Arc<EventBus>>,
}

impl ConnectionManagerBuilder {
    /// 创建新的 Builder（默认配置）
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用完整配置（覆盖之前的单项设置）
    pub fn config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    /// 启动时优先选择的端口
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.config.preferred_port = port.into();
        self
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.config.baud_rate = baud_rate;
        self
    }

    /// 读写超时（毫秒），同时决定存活阈值
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    /// 打开文件日志
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.log_dir = Some(dir.into());
        self
    }

    pub fn debug_frames(mut self, enabled: bool) -> Self {
        self.config.debug_frames = enabled;
        self
    }

    /// 指定串口后端（默认系统串口）
    pub fn backend(mut self, backend: Arc<dyn SerialBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// 共享已有的事件总线
    pub fn events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// 构建 ConnectionManager（不打开端口）
    ///
    /// # 错误
    /// - `DriverError::Config`: 配置取值非法
    /// - `DriverError::Io`: 日志目录无法创建
    pub fn build(self) -> Result<ConnectionManager, DriverError> {
        self.config.validate()?;

        let logs = match &self.config.log_dir {
            Some(dir) => {
                info!("Data logs in {}", dir.display());
                Some(Arc::new(DataLogs::open(dir, self.config.debug_frames)?))
            },
            None => None,
        };

        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(SystemBackend::new()));
        let events = self.events.unwrap_or_default();

        Ok(ConnectionManager::new(backend, self.config, events, logs))
    }
}
