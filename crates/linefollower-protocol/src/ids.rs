//! 消息类型定义
//!
//! 定义所有协议消息的类型 ID，以及两张静态表：
//! - 负载长度表（类型 → 字节数）
//! - 定点缩放表（类型 → 除数）

use std::fmt;

/// 协议消息类型（封闭枚举）
///
/// ID 即线上 TYPE_ID 字节。未知 ID 统一映射为 [`MessageType::Invalid`]。
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    num_enum::TryFromPrimitive,
    num_enum::IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MessageType {
    #[default]
    Invalid = 0,
    Start = 1,
    Stop = 2,
    State = 3,
    RunningMode = 4,
    StopMode = 5,
    Laps = 6,
    StopTime = 7,
    LogData = 8,
    PidKp = 9,
    PidKi = 10,
    PidKd = 11,
    PidKb = 12,
    PidKff = 13,
    PidAccel = 14,
    PidBasePwm = 15,
    PidMaxPwm = 16,
    TurbinePwm = 17,
    Ping = 18,
    PidAlpha = 19,
    PidClamp = 20,
    StopDistance = 21,
    SpeedKp = 22,
    SpeedKi = 23,
    SpeedKd = 24,
    SpeedKff = 25,
    BaseSpeed = 26,
    Lookahead = 27,
    WheelBaseCorrection = 28,
    ImuAlpha = 29,
    OperationData = 30,
}

/// 定点缩放
///
/// 原始整数负载 = 实际值 × 除数（四舍五入）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedPoint {
    /// 不缩放（整数字段）
    None,
    /// ÷100
    Centi,
    /// ÷10000
    TenThousandth,
}

impl FixedPoint {
    /// 除数
    pub const fn divisor(self) -> f64 {
        match self {
            FixedPoint::None => 1.0,
            FixedPoint::Centi => 100.0,
            FixedPoint::TenThousandth => 10_000.0,
        }
    }

    /// 是否为定点字段
    pub const fn is_scaled(self) -> bool {
        !matches!(self, FixedPoint::None)
    }
}

impl MessageType {
    /// 所有消息类型（按 ID 升序）
    pub const ALL: [MessageType; 31] = [
        MessageType::Invalid,
        MessageType::Start,
        MessageType::Stop,
        MessageType::State,
        MessageType::RunningMode,
        MessageType::StopMode,
        MessageType::Laps,
        MessageType::StopTime,
        MessageType::LogData,
        MessageType::PidKp,
        MessageType::PidKi,
        MessageType::PidKd,
        MessageType::PidKb,
        MessageType::PidKff,
        MessageType::PidAccel,
        MessageType::PidBasePwm,
        MessageType::PidMaxPwm,
        MessageType::TurbinePwm,
        MessageType::Ping,
        MessageType::PidAlpha,
        MessageType::PidClamp,
        MessageType::StopDistance,
        MessageType::SpeedKp,
        MessageType::SpeedKi,
        MessageType::SpeedKd,
        MessageType::SpeedKff,
        MessageType::BaseSpeed,
        MessageType::Lookahead,
        MessageType::WheelBaseCorrection,
        MessageType::ImuAlpha,
        MessageType::OperationData,
    ];

    /// 线上 TYPE_ID
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// 由 TYPE_ID 解析，未知 ID 返回 `Invalid`
    pub fn from_id(id: u8) -> Self {
        Self::try_from(id).unwrap_or(MessageType::Invalid)
    }

    /// 负载长度表（字节）
    pub const fn payload_size(self) -> usize {
        use MessageType::*;
        match self {
            Invalid | Start | Stop | Ping => 0,
            State | RunningMode | StopMode | Laps | StopTime | LogData | PidKp | PidKi | PidKb
            | PidKff | Lookahead => 1,
            PidKd | PidAccel | PidBasePwm | PidMaxPwm | TurbinePwm | SpeedKp | SpeedKi
            | SpeedKd | SpeedKff | BaseSpeed | PidAlpha | PidClamp | StopDistance
            | WheelBaseCorrection | ImuAlpha => 2,
            OperationData => 8,
        }
    }

    /// 定点缩放表
    pub const fn fixed_point(self) -> FixedPoint {
        use MessageType::*;
        match self {
            SpeedKi => FixedPoint::TenThousandth,
            PidAlpha | ImuAlpha | WheelBaseCorrection | SpeedKp | SpeedKd | SpeedKff => {
                FixedPoint::Centi
            },
            _ => FixedPoint::None,
        }
    }

    /// 协议中的大写名称（用于日志与 CLI）
    pub const fn name(self) -> &'static str {
        use MessageType::*;
        match self {
            Invalid => "INVALID",
            Start => "START",
            Stop => "STOP",
            State => "STATE",
            RunningMode => "RUNNING_MODE",
            StopMode => "STOP_MODE",
            Laps => "LAPS",
            StopTime => "STOP_TIME",
            LogData => "LOG_DATA",
            PidKp => "PID_KP",
            PidKi => "PID_KI",
            PidKd => "PID_KD",
            PidKb => "PID_KB",
            PidKff => "PID_KFF",
            PidAccel => "PID_ACCEL",
            PidBasePwm => "PID_BASE_PWM",
            PidMaxPwm => "PID_MAX_PWM",
            TurbinePwm => "TURBINE_PWM",
            Ping => "PING",
            PidAlpha => "PID_ALPHA",
            PidClamp => "PID_CLAMP",
            StopDistance => "STOP_DISTANCE",
            SpeedKp => "SPEED_KP",
            SpeedKi => "SPEED_KI",
            SpeedKd => "SPEED_KD",
            SpeedKff => "SPEED_KFF",
            BaseSpeed => "BASE_SPEED",
            Lookahead => "LOOKAHEAD",
            WheelBaseCorrection => "WHEEL_BASE_CORRECTION",
            ImuAlpha => "IMU_ALPHA",
            OperationData => "OPERATION_DATA",
        }
    }

    /// 按名称查找（大小写不敏感，`-` 与 `_` 等价）
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().replace('-', "_").to_ascii_uppercase();
        Self::ALL.iter().copied().find(|kind| kind.name() == normalized)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_ids_are_sequential() {
        for (i, kind) in MessageType::ALL.iter().enumerate() {
            assert_eq!(kind.id() as usize, i, "{} has id {}", kind, kind.id());
            assert_eq!(MessageType::from_id(i as u8), *kind);
        }
    }

    #[test]
    fn test_unknown_id_maps_to_invalid() {
        assert_eq!(MessageType::from_id(0x7F), MessageType::Invalid);
        assert_eq!(MessageType::from_id(0xAA), MessageType::Invalid);
        assert!(MessageType::try_from(0xFFu8).is_err());
    }

    #[test]
    fn test_payload_sizes() {
        assert_eq!(MessageType::Ping.payload_size(), 0);
        assert_eq!(MessageType::Start.payload_size(), 0);
        assert_eq!(MessageType::Stop.payload_size(), 0);
        assert_eq!(MessageType::State.payload_size(), 1);
        assert_eq!(MessageType::Lookahead.payload_size(), 1);
        assert_eq!(MessageType::PidKd.payload_size(), 2);
        assert_eq!(MessageType::SpeedKi.payload_size(), 2);
        assert_eq!(MessageType::ImuAlpha.payload_size(), 2);
        assert_eq!(MessageType::OperationData.payload_size(), 8);
    }

    #[test]
    fn test_fixed_point_table() {
        assert_eq!(MessageType::SpeedKi.fixed_point().divisor(), 10_000.0);
        assert_eq!(MessageType::PidAlpha.fixed_point().divisor(), 100.0);
        assert_eq!(MessageType::PidKp.fixed_point(), FixedPoint::None);
        assert!(!MessageType::Laps.fixed_point().is_scaled());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(MessageType::from_name("pid_kp"), Some(MessageType::PidKp));
        assert_eq!(MessageType::from_name("SPEED-KI"), Some(MessageType::SpeedKi));
        assert_eq!(
            MessageType::from_name(" wheel_base_correction "),
            Some(MessageType::WheelBaseCorrection)
        );
        assert_eq!(MessageType::from_name("bogus"), None);
    }

    #[test]
    fn test_display_uses_protocol_name() {
        assert_eq!(MessageType::OperationData.to_string(), "OPERATION_DATA");
    }
}
