//! Line Follower SDK - 巡线机器人 Rust SDK
//!
//! 通过串口（蓝牙 SPP 虚拟串口）控制巡线机器人：收发二进制协议帧、
//! 同步机器人配置与状态、记录遥测数据。
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 帧编解码、字节流解析、遥测解码
//! - **串口层** (`serial`): 串口后端抽象、端口自然排序
//! - **驱动层** (`driver`): 连接管理、读线程、存活探测、状态同步
//! - **门面** ([`LineFollower`]): 大多数用户应使用的入口
//!
//! # 快速开始
//!
//! ```no_run
//! use linefollower_sdk::prelude::*;
//!
//! linefollower_sdk::init_logger();
//!
//! let robot = LineFollower::new().unwrap();
//! let events = robot.subscribe();
//! if robot.connect() {
//!     robot.send(&commands::set_int(MessageType::BaseSpeed, 300));
//!     robot.toggle_run();
//! }
//! # drop(events);
//! ```

pub mod command;
mod line_follower;
mod logging;
pub mod prelude;

pub use linefollower_driver as driver;
pub use linefollower_protocol as protocol;
pub use linefollower_serial as serial;

pub use command::{CommandError, parse_command};
pub use line_follower::LineFollower;
pub use logging::{init_logger, init_logger_with_filter};

// 常用类型
pub use driver::{
    ConnectionConfig, ConnectionManager, ConnectionManagerBuilder, DriverError, MetricsSnapshot,
    RobotEvent, RobotStateRecord, wait_for_event,
};
pub use protocol::{
    Message, MessageType, ProtocolError, RobotState, RunningMode, StopMode, TelemetryRecord,
    commands,
};
pub use serial::SerialError;
