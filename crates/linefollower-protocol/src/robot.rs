//! 机器人状态枚举
//!
//! STATE / RUNNING_MODE / STOP_MODE 三个字段的单字节负载解码目标。
//! 固件新增的取值不会导致 panic，而是落入 `Unknown(u8)`。

use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;

/// 机器人状态（STATE 字段）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RobotState {
    Init = 0,
    Idle = 1,
    Running = 2,
    Stopped = 3,
    Error = 4,
    #[num_enum(catch_all)]
    Unknown(u8),
}

/// 运行模式（RUNNING_MODE 字段）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RunningMode {
    Init = 0,
    SensorTest = 1,
    TurbineTest = 2,
    EncoderTest = 3,
    Pid = 4,
    PurePursuit = 5,
    #[num_enum(catch_all)]
    Unknown(u8),
}

/// 停止模式（STOP_MODE 字段）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum StopMode {
    None = 0,
    Time = 1,
    Laps = 2,
    Distance = 3,
    #[num_enum(catch_all)]
    Unknown(u8),
}

impl RobotState {
    /// 由原始负载值解码（超出 u8 的部分截断）
    pub fn from_raw(raw: u32) -> Self {
        Self::from(raw as u8)
    }

    /// 是否处于运行中
    pub fn is_running(self) -> bool {
        self == RobotState::Running
    }
}

impl RunningMode {
    pub fn from_raw(raw: u32) -> Self {
        Self::from(raw as u8)
    }

    /// 按名称解析（CLI 使用）
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "init" => Some(Self::Init),
            "sensor_test" => Some(Self::SensorTest),
            "turbine_test" => Some(Self::TurbineTest),
            "encoder_test" => Some(Self::EncoderTest),
            "pid" => Some(Self::Pid),
            "pure_pursuit" => Some(Self::PurePursuit),
            _ => None,
        }
    }
}

impl StopMode {
    pub fn from_raw(raw: u32) -> Self {
        Self::from(raw as u8)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "time" => Some(Self::Time),
            "laps" => Some(Self::Laps),
            "distance" => Some(Self::Distance),
            _ => None,
        }
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobotState::Init => write!(f, "INIT"),
            RobotState::Idle => write!(f, "IDLE"),
            RobotState::Running => write!(f, "RUNNING"),
            RobotState::Stopped => write!(f, "STOPPED"),
            RobotState::Error => write!(f, "ERROR"),
            RobotState::Unknown(v) => write!(f, "UNKNOWN({})", v),
        }
    }
}

impl fmt::Display for RunningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunningMode::Init => write!(f, "INIT"),
            RunningMode::SensorTest => write!(f, "SENSOR_TEST"),
            RunningMode::TurbineTest => write!(f, "TURBINE_TEST"),
            RunningMode::EncoderTest => write!(f, "ENCODER_TEST"),
            RunningMode::Pid => write!(f, "PID"),
            RunningMode::PurePursuit => write!(f, "PURE_PURSUIT"),
            RunningMode::Unknown(v) => write!(f, "UNKNOWN({})", v),
        }
    }
}

impl fmt::Display for StopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopMode::None => write!(f, "NONE"),
            StopMode::Time => write!(f, "TIME"),
            StopMode::Laps => write!(f, "LAPS"),
            StopMode::Distance => write!(f, "DISTANCE"),
            StopMode::Unknown(v) => write!(f, "UNKNOWN({})", v),
        }
    }
}
