//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use linefollower_sdk::prelude::*;
//! ```

pub use crate::LineFollower;
pub use crate::command::parse_command;

// 协议层
pub use crate::protocol::commands;
pub use crate::protocol::{Message, MessageType, RobotState, RunningMode, StopMode, TelemetryRecord};

// 驱动层
pub use crate::driver::{ConnectionConfig, ConnectionManagerBuilder, RobotEvent, RobotStateRecord};

// 错误类型
pub use crate::driver::DriverError;
pub use crate::protocol::ProtocolError;
pub use crate::serial::SerialError;
