//! 下行命令构造
//!
//! 每个函数返回一个 [`Message`]；类型与值宽度不匹配时返回 `Message::INVALID`，
//! 由调用方通过 `is_valid()` 判断。

use crate::ids::MessageType;
use crate::message::Message;
use crate::robot::{RunningMode, StopMode};

/// START（开始运行）
pub fn start() -> Message {
    Message::new(MessageType::Start, &[])
}

/// STOP（停止运行）
pub fn stop() -> Message {
    Message::new(MessageType::Stop, &[])
}

/// PING（存活探测，固件原样回显）
pub fn ping() -> Message {
    Message::new(MessageType::Ping, &[])
}

/// 整数参数
pub fn set_int(kind: MessageType, value: i64) -> Message {
    Message::from_int(kind, value)
}

/// 定点参数（按类型的缩放表换算）
pub fn set_scaled(kind: MessageType, value: f64) -> Message {
    Message::from_float(kind, value)
}

/// 布尔参数
pub fn set_bool(kind: MessageType, value: bool) -> Message {
    Message::from_bool(kind, value)
}

pub fn set_running_mode(mode: RunningMode) -> Message {
    Message::from_int(MessageType::RunningMode, i64::from(u8::from(mode)))
}

pub fn set_stop_mode(mode: StopMode) -> Message {
    Message::from_int(MessageType::StopMode, i64::from(u8::from(mode)))
}

/// 开关固件端的数据记录
pub fn set_log_data(enabled: bool) -> Message {
    Message::from_bool(MessageType::LogData, enabled)
}
