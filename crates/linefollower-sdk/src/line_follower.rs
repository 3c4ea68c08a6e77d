//! `LineFollower` 门面
//!
//! 把连接管理、状态快照与命令发送收拢到一个句柄上。

use crate::driver::{
    ConnectionConfig, ConnectionManager, ConnectionManagerBuilder, DriverError, MetricsSnapshot,
    RobotEvent, RobotStateRecord,
};
use crate::protocol::{Message, RobotState, commands};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use tracing::{info, warn};

/// 巡线机器人句柄
///
/// # Example
///
/// ```no_run
/// use linefollower_sdk::LineFollower;
///
/// let robot = LineFollower::new().unwrap();
/// println!("ports: {:?}", robot.list_ports());
/// if robot.connect() {
///     let snapshot = robot.snapshot();
///     println!("state: {:?}", snapshot.state);
///     robot.disconnect();
/// }
/// ```
pub struct LineFollower {
    manager: ConnectionManager,
}

impl LineFollower {
    /// 默认配置 + 系统串口
    pub fn new() -> Result<Self, DriverError> {
        Self::with_config(ConnectionConfig::default())
    }

    pub fn with_config(config: ConnectionConfig) -> Result<Self, DriverError> {
        Ok(Self::from_manager(
            ConnectionManagerBuilder::new().config(config).build()?,
        ))
    }

    /// 使用自定义构造的 ConnectionManager（例如 mock 后端）
    pub fn from_manager(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    // === 连接 ===

    pub fn list_ports(&self) -> Vec<String> {
        self.manager.list_ports()
    }

    pub fn port(&self) -> String {
        self.manager.port()
    }

    pub fn set_port(&self, name: &str) -> bool {
        self.manager.set_port(name)
    }

    pub fn connect(&self) -> bool {
        self.manager.connect()
    }

    pub fn try_connect(&self) -> Result<(), DriverError> {
        self.manager.try_connect()
    }

    pub fn disconnect(&self) {
        self.manager.disconnect()
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    // === 状态 ===

    /// 当前状态快照（无锁）
    pub fn snapshot(&self) -> Arc<RobotStateRecord> {
        self.manager.state().snapshot()
    }

    pub fn robot_state(&self) -> Option<RobotState> {
        self.manager.state().robot_state()
    }

    pub fn subscribe(&self) -> Receiver<RobotEvent> {
        self.manager.subscribe()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.manager.metrics()
    }

    // === 命令 ===

    /// 发送一条消息（未连接时为 no-op）
    pub fn send(&self, msg: &Message) {
        if !msg.is_valid() {
            warn!("Refusing to send invalid message");
            return;
        }
        self.manager.send(msg);
    }

    /// 启停切换
    ///
    /// - 空闲：发送 START（同时清空遥测日志）
    /// - 运行中：发送 STOP
    /// - 其他状态或未连接：不发送，返回 `false`
    pub fn toggle_run(&self) -> bool {
        if !self.is_connected() {
            return false;
        }
        let msg = match self.robot_state() {
            Some(RobotState::Idle) => commands::start(),
            Some(RobotState::Running) => commands::stop(),
            other => {
                info!("Cannot toggle run in state {:?}", other);
                return false;
            },
        };
        self.manager.send(&msg);
        true
    }
}
