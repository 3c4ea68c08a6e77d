//! # Line Follower Protocol
//!
//! 循迹小车串口（蓝牙 SPP）协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `ids`: 消息类型枚举、负载长度表、定点缩放表
//! - `message`: 单帧编码/解码与校验和
//! - `parser`: 字节流状态机（二进制帧与文本日志行混合）
//! - `robot`: 机器人状态/运行模式/停止模式枚举
//! - `telemetry`: OPERATION_DATA 遥测记录解析
//! - `commands`: 常用下行命令构造
//!
//! ## 帧格式
//!
//! ```text
//! 0xAA | TYPE_ID (1B) | PAYLOAD (0-8B) | CHECKSUM (1B)
//! ```
//!
//! 校验和为 TYPE_ID 与所有负载字节的异或（8 位）。
//! 多字节整数均为小端字节序（Little Endian）。

pub mod commands;
pub mod ids;
pub mod message;
pub mod parser;
pub mod robot;
pub mod telemetry;

// 重新导出常用类型
pub use ids::{FixedPoint, MessageType};
pub use message::{Message, checksum, encode, encode_frame};
pub use parser::{ParsedItem, ParserState, ParserStats, StreamParser};
pub use robot::{RobotState, RunningMode, StopMode};
pub use telemetry::{EdgeSensors, LineSensors, TELEMETRY_CSV_HEADER, TelemetryRecord};

use thiserror::Error;

/// 帧起始字节
pub const START_BYTE: u8 = 0xAA;

/// 最小帧长度（起始字节 + 类型 + 校验和）
pub const MIN_FRAME_LEN: usize = 3;

/// 最大负载长度（OPERATION_DATA）
pub const MAX_PAYLOAD: usize = 8;

/// 日志行结束符
pub const LOG_LINE_TERMINATOR: u8 = b'\n';

/// 协议解析错误类型
///
/// 仅在 `try_*` 系列接口中返回；对外的 fail-soft 接口（如 [`Message::decode`]）
/// 将所有错误折叠为 [`MessageType::Invalid`]。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Missing start byte: got 0x{found:02X}")]
    MissingStartByte { found: u8 },

    #[error("Unknown message type: 0x{id:02X}")]
    UnknownMessageType { id: u8 },

    #[error("Checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("Unexpected message type: expected {expected}, got {actual}")]
    UnexpectedType {
        expected: MessageType,
        actual: MessageType,
    },

    #[error("Value {value} out of range for field {field}")]
    ValueOutOfRange { field: &'static str, value: i64 },
}

/// 小端字节序转无符号整数（最多取前 4 字节）
///
/// 空切片返回 0，与零负载消息的语义一致。
pub fn bytes_to_u32_le(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .enumerate()
        .fold(0u32, |acc, (i, &b)| acc | (u32::from(b) << (8 * i)))
}

/// 小端字节序转 i16
pub fn bytes_to_i16_le(bytes: [u8; 2]) -> i16 {
    i16::from_le_bytes(bytes)
}
