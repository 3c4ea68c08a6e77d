//! Pipeline 读循环模块
//!
//! 后台读线程的主体：轮询可读字节 → 字节流解析 → 帧/文本行分发，
//! 空闲时执行存活检查。
//!
//! ```text
//! loop {
//!     stop flag?                   → 退出
//!     bytes_available == 0         → 存活检查 → 空闲休眠
//!     bytes_available  > 0         → 读取 → StreamParser → route()
//! }
//! ```
//!
//! 任何致命错误（读失败、PING 超时或回显错误、端口消失）都会关闭会话，
//! 发出 `ConnectionFailed` 与 `ConnectionChanged { connected: false }`，然后退出。
//! 不自动重连。

use crate::error::DriverError;
use crate::events::{EventBus, RobotEvent};
use crate::heartbeat::LivenessMonitor;
use crate::logs::DataLogs;
use crate::metrics::LinkMetrics;
use crate::state::StateStore;
use linefollower_protocol::{
    Message, MIN_FRAME_LEN, MessageType, ParsedItem, StreamParser, TelemetryRecord, commands,
};
use linefollower_serial::{RxTransport, SerialBackend, SerialError, TxTransport};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Pipeline 配置
///
/// # Example
///
/// ```
/// use linefollower_driver::{ConnectionConfig, PipelineConfig};
///
/// let config = PipelineConfig::from(&ConnectionConfig::default());
/// assert_eq!(config.liveness_threshold.as_millis(), 1100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// 静默超过此时长后发送 PING
    pub liveness_threshold: Duration,
    /// 等待 PING 回显的时长
    pub echo_timeout: Duration,
    /// 无数据时的休眠间隔
    pub idle_poll: Duration,
    /// 单次读取的最大字节数
    pub read_chunk: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&crate::config::ConnectionConfig::default())
    }
}

impl From<&crate::config::ConnectionConfig> for PipelineConfig {
    fn from(config: &crate::config::ConnectionConfig) -> Self {
        Self {
            liveness_threshold: config.liveness_threshold(),
            echo_timeout: config.timeout(),
            idle_poll: config.idle_poll(),
            read_chunk: 4096,
        }
    }
}

/// 一次连接的共享会话
///
/// 读线程持有 RX；TX 放在锁里，读线程（PING）与调用方线程（命令）共用。
pub struct Session {
    port: String,
    tx: Mutex<Option<Box<dyn TxTransport>>>,
    open: AtomicBool,
}

impl Session {
    pub fn new(port: String, tx: Box<dyn TxTransport>) -> Self {
        Self {
            port,
            tx: Mutex::new(Some(tx)),
            open: AtomicBool::new(true),
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// 关闭会话并释放 TX
    ///
    /// 返回 `true` 表示本次调用完成了 open → closed 的转换。
    pub fn close(&self) -> bool {
        let was_open = self.open.swap(false, Ordering::AcqRel);
        self.tx.lock().take();
        was_open
    }

    /// 写入字节（会话已关闭时为 no-op）
    pub fn write(&self, data: &[u8]) -> Result<(), SerialError> {
        let mut guard = self.tx.lock();
        match guard.as_mut() {
            Some(tx) if self.is_open() => {
                tx.write_all(data)?;
                tx.flush()
            },
            _ => Ok(()),
        }
    }
}

/// 致命错误处理：关闭会话，发出失败与断开事件
///
/// 只有完成关闭转换的一方发出事件，避免与用户主动断开重复通知。
pub fn fail_session(session: &Session, events: &EventBus, reason: String) {
    if session.close() {
        warn!("Connection to {} failed: {}", session.port(), reason);
        events.publish(RobotEvent::ConnectionFailed { reason });
        events.publish(RobotEvent::ConnectionChanged { connected: false });
    }
}

/// 帧/文本行分发
///
/// - 文本行 → 文本日志 + `LogLine` 事件
/// - OPERATION_DATA → 遥测日志 + `Telemetry` 事件
/// - 其他有效帧 → StateStore
/// - 无效帧 → 丢弃
pub struct FrameRouter {
    pub state: Arc<StateStore>,
    pub events: Arc<EventBus>,
    pub logs: Option<Arc<DataLogs>>,
    pub metrics: Arc<LinkMetrics>,
}

impl FrameRouter {
    pub fn route(&self, item: ParsedItem) {
        match item {
            ParsedItem::LogLine(line) => {
                self.metrics.rx_log_lines.fetch_add(1, Ordering::Relaxed);
                debug!("LOG: {}", line);
                if let Some(logs) = &self.logs {
                    logs.log_line(&line);
                }
                self.events.publish(RobotEvent::LogLine(line));
            },
            ParsedItem::Frame(msg) if !msg.is_valid() => {
                self.metrics.rx_invalid_frames.fetch_add(1, Ordering::Relaxed);
                trace!("Dropped invalid frame");
            },
            ParsedItem::Frame(msg) => {
                self.metrics.rx_frames.fetch_add(1, Ordering::Relaxed);
                debug!("rx {}", msg);
                if let Some(logs) = &self.logs {
                    logs.log_frame(&msg);
                }
                if msg.kind() == MessageType::OperationData {
                    self.route_telemetry(&msg);
                } else {
                    self.state.on_frame(&msg);
                }
            },
        }
    }

    fn route_telemetry(&self, msg: &Message) {
        match TelemetryRecord::try_from(msg) {
            Ok(rec) => {
                self.metrics.telemetry_records.fetch_add(1, Ordering::Relaxed);
                if let Some(logs) = &self.logs {
                    logs.log_telemetry(msg.payload(), &rec);
                }
                self.events.publish(RobotEvent::Telemetry(rec));
            },
            Err(e) => warn!("Failed to decode telemetry: {}", e),
        }
    }
}

/// 存活检查
///
/// 1. 端口仍在系统列表中，否则 `PortVanished`
/// 2. 静默超过阈值时发送 PING，并在 `echo_timeout` 内读取 3 字节回显；
///    回显类型必须为 PING
pub fn check_liveness(
    rx: &mut dyn RxTransport,
    session: &Session,
    backend: &dyn SerialBackend,
    monitor: &LivenessMonitor,
    config: &PipelineConfig,
    metrics: &LinkMetrics,
) -> Result<(), DriverError> {
    let ports = backend.available_ports()?;
    if !ports.iter().any(|p| p == session.port()) {
        return Err(DriverError::PortVanished(session.port().to_string()));
    }

    if !monitor.needs_probe() {
        return Ok(());
    }

    let ping = commands::ping().to_frame();
    session.write(&ping)?;
    metrics.pings_sent.fetch_add(1, Ordering::Relaxed);
    metrics.tx_frames.fetch_add(1, Ordering::Relaxed);
    metrics.tx_bytes.fetch_add(ping.len() as u64, Ordering::Relaxed);
    trace!("Liveness probe: PING sent after {:?} of silence", monitor.time_since_last_receive());

    let mut echo = [0u8; MIN_FRAME_LEN];
    rx.read_exact_timeout(&mut echo, config.echo_timeout)
        .map_err(|e| {
            if e.is_timeout() {
                DriverError::LivenessTimeout
            } else {
                DriverError::Serial(e)
            }
        })?;

    let reply = Message::decode(&echo);
    if reply.kind() != MessageType::Ping {
        return Err(DriverError::UnexpectedEcho { got: reply.kind() });
    }

    monitor.register_receive();
    Ok(())
}

/// 读线程主循环
///
/// 停止标志（`Session::is_open`）每轮检查一次；阻塞只发生在有超时上限的读调用中。
pub fn read_loop(
    mut rx: Box<dyn RxTransport>,
    session: Arc<Session>,
    backend: Arc<dyn SerialBackend>,
    router: FrameRouter,
    config: PipelineConfig,
) {
    let monitor = LivenessMonitor::new(config.liveness_threshold);
    let mut parser = StreamParser::new();
    let mut buf = vec![0u8; config.read_chunk.max(1)];

    info!("Read loop started on {}", session.port());

    loop {
        if !session.is_open() {
            trace!("Read loop: session closed, exiting");
            break;
        }

        let available = match rx.bytes_available() {
            Ok(n) => n,
            Err(e) => {
                fail_session(&session, &router.events, format!("Read failed: {}", e));
                break;
            },
        };

        if available == 0 {
            if let Err(e) = check_liveness(
                rx.as_mut(),
                &session,
                backend.as_ref(),
                &monitor,
                &config,
                &router.metrics,
            ) {
                fail_session(&session, &router.events, e.to_string());
                break;
            }
            spin_sleep::sleep(config.idle_poll);
            continue;
        }

        let want = available.min(buf.len());
        let n = match rx.read(&mut buf[..want]) {
            Ok(n) => n,
            Err(e) => {
                fail_session(&session, &router.events, format!("Read failed: {}", e));
                break;
            },
        };
        if n == 0 {
            continue;
        }

        trace!("rx {} bytes", n);
        router.metrics.rx_bytes.fetch_add(n as u64, Ordering::Relaxed);
        monitor.register_receive();
        parser.feed(&buf[..n], |item| router.route(item));
    }

    info!("Read loop on {} exited", session.port());
}
