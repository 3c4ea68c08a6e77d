//! 驱动层错误类型定义

use linefollower_protocol::{MessageType, ProtocolError};
use linefollower_serial::SerialError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 串口错误
    #[error("Serial error: {0}")]
    Serial(#[from] SerialError),

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 文件 IO 错误（日志文件、配置文件）
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 遥测 CSV 写入错误
    #[error("Telemetry log error: {0}")]
    Telemetry(#[from] csv::Error),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(String),

    /// 事件通道已关闭
    #[error("Event channel closed")]
    ChannelClosed,

    /// 端口不可用（未选择端口或端口不在系统列表中）
    #[error("Port unavailable: {0:?}")]
    PortUnavailable(String),

    /// 存活探测超时（PING 无回显）
    #[error("Liveness probe timed out: no PING echo")]
    LivenessTimeout,

    /// 存活探测收到错误的回显
    #[error("Unexpected PING echo: got {got}")]
    UnexpectedEcho { got: MessageType },

    /// 端口从系统列表中消失
    #[error("Port {0} vanished")]
    PortVanished(String),

    /// IO 线程错误
    #[error("IO thread error: {0}")]
    IoThread(String),

    /// 操作超时
    #[error("Operation timeout")]
    Timeout,
}
