//! 连接管理模块
//!
//! [`ConnectionManager`] 独占串口句柄：端口枚举与选择、打开/关闭、后台读线程，
//! 以及命令写入。同一时刻只有一个活动连接，不自动重连。

use crate::config::ConnectionConfig;
use crate::error::DriverError;
use crate::events::{EventBus, RobotEvent};
use crate::logs::DataLogs;
use crate::metrics::{LinkMetrics, MetricsSnapshot};
use crate::pipeline::{FrameRouter, PipelineConfig, Session, fail_session, read_loop};
use crate::state::StateStore;
use crossbeam_channel::Receiver;
use linefollower_protocol::{Message, MessageType, RobotState};
use linefollower_serial::{RxTransport, SerialBackend};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{JoinHandle, spawn};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 读线程名
pub const RX_THREAD_NAME: &str = "linefollower-rx";

/// 断开时等待读线程退出的上限
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Extension trait for timeout-capable thread joins
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        use std::sync::mpsc;

        let (tx, rx) = mpsc::channel();

        // Watchdog thread joins the target so the caller can wait with a deadline
        spawn(move || {
            let result = self.join();
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result.map(|_| ()),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Thread join timeout",
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "Thread panicked during join",
            ))),
        }
    }
}

/// 当前活动连接
struct ActiveLink {
    session: Arc<Session>,
    worker: Option<JoinHandle<()>>,
}

impl ActiveLink {
    fn shutdown(mut self) {
        self.session.close();
        if let Some(handle) = self.worker.take() {
            if let Err(e) = handle.join_timeout(JOIN_TIMEOUT) {
                error!("Read thread did not exit cleanly: {:?}", e);
            }
        }
    }
}

/// 端口选择
///
/// `explicit` 为真表示端口由 [`ConnectionManager::set_port`] 指定，
/// 此后端口消失也不会被自动替换。
#[derive(Debug)]
struct PortSelection {
    name: String,
    explicit: bool,
}

/// 连接管理器
///
/// 线程模型：一个后台读线程运行 [`read_loop`]，解析、状态更新与日志都在该线程内
/// 同步执行；`write`/`send` 可以从任意线程调用。
pub struct ConnectionManager {
    backend: Arc<dyn SerialBackend>,
    config: ConnectionConfig,
    port: Mutex<PortSelection>,
    link: Mutex<Option<ActiveLink>>,
    events: Arc<EventBus>,
    state: Arc<StateStore>,
    logs: Option<Arc<DataLogs>>,
    metrics: Arc<LinkMetrics>,
}

impl ConnectionManager {
    /// 创建连接管理器（不打开端口）
    ///
    /// 初始端口：`preferred_port` 存在时选它，否则选自然顺序下的第一个，
    /// 没有可用端口时为空。
    pub fn new(
        backend: Arc<dyn SerialBackend>,
        config: ConnectionConfig,
        events: Arc<EventBus>,
        logs: Option<Arc<DataLogs>>,
    ) -> Self {
        let ports = backend.list_ports();
        let port = initial_port(&ports, &config.preferred_port);
        info!("Initial port: {:?} (available: {:?})", port, ports);

        Self {
            state: Arc::new(StateStore::new(events.clone())),
            backend,
            config,
            port: Mutex::new(PortSelection {
                name: port,
                explicit: false,
            }),
            link: Mutex::new(None),
            events,
            logs,
            metrics: Arc::new(LinkMetrics::new()),
        }
    }

    /// 按自然顺序排列的可用端口
    pub fn list_ports(&self) -> Vec<String> {
        self.backend.list_ports()
    }

    /// 当前选择的端口
    ///
    /// 未连接且当前端口已不在系统列表中时，按初始规则重新选择；
    /// 用户指定的端口保持不变。
    pub fn port(&self) -> String {
        if self.is_connected() {
            return self.port.lock().name.clone();
        }
        match self.resolve_port() {
            Ok(name) => name,
            Err(_) => self.port.lock().name.clone(),
        }
    }

    /// 确定要打开的端口
    ///
    /// 指定的端口不在系统列表中时返回 `PortUnavailable`，不回退到其他端口。
    fn resolve_port(&self) -> Result<String, DriverError> {
        let ports = self.list_ports();
        let mut port = self.port.lock();
        if ports.contains(&port.name) {
            return Ok(port.name.clone());
        }
        if port.explicit {
            return Err(DriverError::PortUnavailable(port.name.clone()));
        }
        port.name = initial_port(&ports, &self.config.preferred_port);
        Ok(port.name.clone())
    }

    /// 切换端口
    ///
    /// 以下情况返回 `false` 且不修改端口名：已连接、与当前端口相同、端口不在列表中。
    /// 与当前端口相同时仍记为用户指定。
    pub fn set_port(&self, name: &str) -> bool {
        if self.is_connected() {
            warn!("Cannot change port to {} while connected", name);
            return false;
        }
        let mut port = self.port.lock();
        if port.name == name {
            port.explicit = true;
            return false;
        }
        if !self.list_ports().iter().any(|p| p == name) {
            warn!("Port {} is not available", name);
            return false;
        }
        info!("Port changed: {} -> {}", port.name, name);
        port.name = name.to_string();
        port.explicit = true;
        true
    }

    pub fn is_connected(&self) -> bool {
        self.link
            .lock()
            .as_ref()
            .is_some_and(|link| link.session.is_open())
    }

    /// 打开当前端口并启动读线程
    ///
    /// 已连接时直接返回 `Ok(())`。打开失败时发出 `ConnectionFailed` 并返回错误。
    /// 每次成功打开都从零开始计数链路指标。
    pub fn try_connect(&self) -> Result<(), DriverError> {
        let mut link = self.link.lock();
        if link.as_ref().is_some_and(|l| l.session.is_open()) {
            return Ok(());
        }
        // 上一次连接因致命错误结束，回收读线程
        if let Some(stale) = link.take() {
            stale.shutdown();
        }

        let opened = self
            .resolve_port()
            .and_then(|port| self.open_session(&port).map(|(session, rx)| (port, session, rx)));
        let (port, session, rx) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                warn!("Failed to connect: {}", e);
                self.events.publish(RobotEvent::ConnectionFailed {
                    reason: e.to_string(),
                });
                return Err(e);
            },
        };

        info!("Connected to {} at {} baud", port, self.config.baud_rate);
        self.metrics.reset();
        self.events
            .publish(RobotEvent::ConnectionChanged { connected: true });

        // 连接事件先于读线程产生的任何事件
        let router = FrameRouter {
            state: self.state.clone(),
            events: self.events.clone(),
            logs: self.logs.clone(),
            metrics: self.metrics.clone(),
        };
        let pipeline_config = PipelineConfig::from(&self.config);
        let backend = self.backend.clone();
        let session_clone = session.clone();

        let worker = std::thread::Builder::new()
            .name(RX_THREAD_NAME.into())
            .spawn(move || read_loop(rx, session_clone, backend, router, pipeline_config));

        match worker {
            Ok(handle) => {
                *link = Some(ActiveLink {
                    session,
                    worker: Some(handle),
                });
                Ok(())
            },
            Err(e) => {
                let err = DriverError::IoThread(e.to_string());
                fail_session(&session, &self.events, err.to_string());
                Err(err)
            },
        }
    }

    fn open_session(
        &self,
        port: &str,
    ) -> Result<(Arc<Session>, Box<dyn RxTransport>), DriverError> {
        if port.is_empty() {
            return Err(DriverError::PortUnavailable(port.to_string()));
        }
        let serial = self.backend.open(port, &self.config.serial_settings())?;
        Ok((Arc::new(Session::new(serial.port, serial.tx)), serial.rx))
    }

    /// 打开连接，返回是否成功
    pub fn connect(&self) -> bool {
        self.try_connect().is_ok()
    }

    /// 断开连接（幂等），总是发出 `ConnectionChanged { connected: false }`
    pub fn disconnect(&self) {
        let active = self.link.lock().take();
        if let Some(active) = active {
            info!("Disconnecting from {}", active.session.port());
            active.shutdown();
        }
        self.events
            .publish(RobotEvent::ConnectionChanged { connected: false });
    }

    /// 写入原始字节
    ///
    /// 未连接时为 no-op；写入失败按致命错误处理（断开并发出失败事件）。
    pub fn write(&self, data: &[u8]) {
        let session = match self.link.lock().as_ref() {
            Some(link) if link.session.is_open() => link.session.clone(),
            _ => return,
        };

        match session.write(data) {
            Ok(()) => {
                self.metrics.tx_frames.fetch_add(1, Ordering::Relaxed);
                self.metrics
                    .tx_bytes
                    .fetch_add(data.len() as u64, Ordering::Relaxed);
            },
            Err(e) => fail_session(&session, &self.events, format!("Write failed: {}", e)),
        }
    }

    /// 发送一条消息
    ///
    /// 机器人空闲时发送 START 会先清空遥测日志，使每次运行的日志从头开始。
    pub fn send(&self, msg: &Message) {
        if msg.kind() == MessageType::Start
            && self.state.robot_state() == Some(RobotState::Idle)
            && let Some(logs) = &self.logs
            && let Err(e) = logs.reset_telemetry()
        {
            warn!("Failed to reset telemetry logs: {}", e);
        }
        debug!("tx {}", msg);
        self.write(&msg.to_frame());
    }

    /// 订阅事件
    pub fn subscribe(&self) -> Receiver<RobotEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn state(&self) -> &Arc<StateStore> {
        &self.state
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn logs(&self) -> Option<&Arc<DataLogs>> {
        self.logs.as_ref()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(active) = self.link.get_mut().take() {
            active.shutdown();
        }
    }
}

/// 初始端口选择规则
fn initial_port(ports: &[String], preferred: &str) -> String {
    if ports.iter().any(|p| p == preferred) {
        return preferred.to_string();
    }
    ports.first().cloned().unwrap_or_default()
}
