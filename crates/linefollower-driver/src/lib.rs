//! 驱动层模块
//!
//! 本模块提供巡线机器人的连接与状态同步功能，包括：
//! - 连接管理（端口枚举/选择、打开/关闭、单一活动连接）
//! - 后台读线程（字节流解析、帧分发、PING 存活探测）
//! - 状态同步（ArcSwap 无锁读取、去重、变更事件）
//! - 遥测与文本日志（双速率、变化门控）
//!
//! # 使用场景
//!
//! 适用于需要直接收发协议帧的场景。
//! 大多数用户应该使用 `linefollower-sdk` 提供的 `LineFollower` 门面。

mod builder;
mod config;
mod connection;
mod error;
pub mod events;
pub mod heartbeat;
pub mod logs;
pub mod metrics;
pub mod pipeline;
pub mod state;

pub use builder::ConnectionManagerBuilder;
pub use config::ConnectionConfig;
pub use connection::{ConnectionManager, RX_THREAD_NAME};
pub use error::DriverError;
pub use events::{EventBus, RobotEvent, wait_for_event};
pub use heartbeat::LivenessMonitor;
pub use logs::{DataLogs, TelemetryLogger, TextLog};
pub use metrics::{LinkMetrics, MetricsSnapshot};
pub use pipeline::{FrameRouter, PipelineConfig, Session};
pub use state::{RobotStateRecord, StateStore};
