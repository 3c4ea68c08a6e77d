//! 文本命令解析
//!
//! 把 `"<name> [value]"` 形式的命令转成 [`Message`]，供 CLI 与脚本使用：
//!
//! | 命令 | 值 | 示例 |
//! |---|---|---|
//! | `start` / `stop` / `ping` | 无 | `start` |
//! | `running_mode` | 模式名或数字 | `running_mode pure_pursuit` |
//! | `stop_mode` | 模式名或数字 | `stop_mode laps` |
//! | `log_data` | `on`/`off`/`true`/`false`/`1`/`0` | `log_data on` |
//! | 其他参数名 | 数值（定点参数可带小数） | `speed_ki 0.0123` |

use crate::protocol::{Message, MessageType, ProtocolError, RunningMode, StopMode, commands};
use thiserror::Error;

/// 命令解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Command {0} requires a value")]
    MissingValue(MessageType),
    #[error("Invalid value {value:?} for {kind}")]
    InvalidValue { kind: MessageType, value: String },
    #[error("{0} is not a command")]
    NotACommand(MessageType),
    #[error(transparent)]
    OutOfRange(#[from] ProtocolError),
}

fn invalid(kind: MessageType, value: &str) -> CommandError {
    CommandError::InvalidValue {
        kind,
        value: value.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Some(true),
        "0" | "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// 解析一条命令
///
/// # Example
///
/// ```
/// use linefollower_sdk::{MessageType, parse_command};
///
/// let msg = parse_command("pid_kp", Some("12")).unwrap();
/// assert_eq!(msg.kind(), MessageType::PidKp);
/// assert_eq!(msg.raw_value(), 12);
/// ```
pub fn parse_command(name: &str, value: Option<&str>) -> Result<Message, CommandError> {
    let kind = MessageType::from_name(name)
        .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;

    let msg = match kind {
        MessageType::Start => commands::start(),
        MessageType::Stop => commands::stop(),
        MessageType::Ping => commands::ping(),
        MessageType::Invalid | MessageType::State | MessageType::OperationData => {
            return Err(CommandError::NotACommand(kind));
        },
        _ => {
            let value = value.ok_or(CommandError::MissingValue(kind))?;
            parse_value(kind, value)?
        },
    };

    if !msg.is_valid() {
        return Err(invalid(kind, value.unwrap_or_default()));
    }
    Ok(msg)
}

fn parse_value(kind: MessageType, value: &str) -> Result<Message, CommandError> {
    let msg = match kind {
        MessageType::RunningMode => match RunningMode::from_name(value) {
            Some(mode) => commands::set_running_mode(mode),
            None => numeric(kind, value)?,
        },
        MessageType::StopMode => match StopMode::from_name(value) {
            Some(mode) => commands::set_stop_mode(mode),
            None => numeric(kind, value)?,
        },
        MessageType::LogData => {
            let enabled = parse_bool(value).ok_or_else(|| invalid(kind, value))?;
            commands::set_log_data(enabled)
        },
        _ => numeric(kind, value)?,
    };
    Ok(msg)
}

fn numeric(kind: MessageType, value: &str) -> Result<Message, CommandError> {
    if kind.fixed_point().is_scaled() {
        let parsed: f64 = value.trim().parse().map_err(|_| invalid(kind, value))?;
        Ok(Message::try_from_float(kind, parsed)?)
    } else {
        let parsed: i64 = value.trim().parse().map_err(|_| invalid(kind, value))?;
        Ok(Message::try_from_int(kind, parsed)?)
    }
}
