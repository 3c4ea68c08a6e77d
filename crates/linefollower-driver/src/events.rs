//! 事件总线
//!
//! 观察者通过 [`EventBus::subscribe`] 获得一个 `crossbeam-channel` 接收端。
//! 发布按调用顺序投递给所有存活的订阅者；接收端被 drop 后，
//! 对应的发送端在下一次发布时被清理。

use crate::error::DriverError;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use linefollower_protocol::{MessageType, RobotState, TelemetryRecord};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// 对外事件
#[derive(Debug, Clone, PartialEq)]
pub enum RobotEvent {
    /// 连接状态变化（`disconnect()` 总会发出，即使之前未连接）
    ConnectionChanged { connected: bool },
    /// 连接失败或连接中出现致命错误
    ConnectionFailed { reason: String },
    /// 配置/状态字段值变化（已去重），携带原始整数值
    AttributeChanged { kind: MessageType, raw: u32 },
    /// 每收到一个 STATE 帧都会发出（不去重）
    StateChanged(RobotState),
    /// 固件输出的文本行
    LogLine(String),
    /// 一帧遥测数据
    Telemetry(TelemetryRecord),
}

/// 观察者注册表
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<RobotEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅事件（无界队列）
    pub fn subscribe(&self) -> Receiver<RobotEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// 发布事件，顺带清理已断开的订阅者
    pub fn publish(&self, event: RobotEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// 当前订阅者数量（含尚未清理的断开者）
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// 在 `timeout` 内等待第一个满足条件的事件，其余事件被丢弃
///
/// # 错误
/// - `DriverError::Timeout`: 超时
/// - `DriverError::ChannelClosed`: 事件总线已释放
pub fn wait_for_event<F>(
    rx: &Receiver<RobotEvent>,
    timeout: Duration,
    mut predicate: F,
) -> Result<RobotEvent, DriverError>
where
    F: FnMut(&RobotEvent) -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(event) if predicate(&event) => return Ok(event),
            Ok(_) => continue,
            Err(RecvTimeoutError::Timeout) => return Err(DriverError::Timeout),
            Err(RecvTimeoutError::Disconnected) => return Err(DriverError::ChannelClosed),
        }
    }
}
