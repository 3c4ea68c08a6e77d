//! 事件输出格式化

use linefollower_sdk::{MessageType, RobotEvent, TelemetryRecord};
use serde_json::{Value, json};

fn sensor_bits(rec: &TelemetryRecord) -> String {
    rec.sensors()
        .iter()
        .map(|&on| if on { '1' } else { '0' })
        .collect()
}

/// 原始值的可读形式（定点参数换算为小数）
fn display_value(kind: MessageType, raw: u32) -> String {
    let fp = kind.fixed_point();
    if fp.is_scaled() {
        format!("{}", f64::from(raw) / fp.divisor())
    } else {
        raw.to_string()
    }
}

/// 单行文本
pub fn format_event(event: &RobotEvent) -> String {
    match event {
        RobotEvent::ConnectionChanged { connected: true } => "[conn] connected".to_string(),
        RobotEvent::ConnectionChanged { connected: false } => "[conn] disconnected".to_string(),
        RobotEvent::ConnectionFailed { reason } => format!("[conn] failed: {}", reason),
        RobotEvent::AttributeChanged { kind, raw } => {
            format!("[attr] {} = {}", kind, display_value(*kind, *raw))
        },
        RobotEvent::StateChanged(state) => format!("[state] {}", state),
        RobotEvent::LogLine(line) => format!("[log] {}", line),
        RobotEvent::Telemetry(rec) => format!(
            "[telem] x={} y={} heading={:.4} sensors={}",
            rec.x,
            rec.y,
            rec.heading(),
            sensor_bits(rec)
        ),
    }
}

/// JSON 对象（每行一个）
pub fn event_to_json(event: &RobotEvent) -> Value {
    match event {
        RobotEvent::ConnectionChanged { connected } => {
            json!({ "event": "connection_changed", "connected": connected })
        },
        RobotEvent::ConnectionFailed { reason } => {
            json!({ "event": "connection_failed", "reason": reason })
        },
        RobotEvent::AttributeChanged { kind, raw } => json!({
            "event": "attribute_changed",
            "kind": kind.name(),
            "raw": raw,
            "value": f64::from(*raw) / kind.fixed_point().divisor(),
        }),
        RobotEvent::StateChanged(state) => {
            json!({ "event": "state_changed", "state": state.to_string() })
        },
        RobotEvent::LogLine(line) => json!({ "event": "log_line", "text": line }),
        RobotEvent::Telemetry(rec) => json!({
            "event": "telemetry",
            "x": rec.x,
            "y": rec.y,
            "heading": rec.heading(),
            "sensors": rec.sensors(),
        }),
    }
}
