//! # Line Follower Serial Transport
//!
//! 串口传输抽象层，提供统一的收发接口。
//!
//! ## 后端
//!
//! - [`SystemBackend`]：基于 `serialport` crate 的系统串口（含蓝牙 SPP 虚拟串口）
//! - `MockBackend`：内存模拟串口（`mock` feature），用于无硬件测试
//!
//! 打开端口后得到一对独立的收发半部（[`SerialLink`]），
//! 读线程独占 RX，写操作可以从任意线程经 TX 完成。

use std::time::{Duration, Instant};
use thiserror::Error;

pub mod ports;
pub mod system;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use ports::{natural_sort, port_sort_key, trailing_number};
pub use system::SystemBackend;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBackend, MockHandle};

/// 默认波特率
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// 默认读写超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// 串口层统一错误类型
#[derive(Error, Debug)]
pub enum SerialError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serial port error: {0}")]
    Port(#[from] serialport::Error),
    #[error("Port not found: {0}")]
    PortNotFound(String),
    #[error("Read timeout")]
    Timeout,
    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },
    #[error("Port disconnected")]
    Disconnected,
}

impl SerialError {
    /// 是否为超时类错误
    pub fn is_timeout(&self) -> bool {
        match self {
            SerialError::Timeout | SerialError::ShortRead { .. } => true,
            SerialError::Io(e) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

/// 打开端口的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialSettings {
    pub baud_rate: u32,
    /// 单次读写的阻塞上限
    pub timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// 接收半部
pub trait RxTransport: Send {
    /// 当前可无阻塞读取的字节数
    fn bytes_available(&mut self) -> Result<usize, SerialError>;

    /// 读取到缓冲区，返回读取的字节数
    ///
    /// 超时返回 `Ok(0)` 而不是错误。
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialError>;

    /// 在 `timeout` 内读满 `buf`
    ///
    /// # 错误
    /// - `SerialError::ShortRead`: 超时前未读满
    fn read_exact_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<(), SerialError> {
        let deadline = Instant::now() + timeout;
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            filled += n;
            if filled == buf.len() {
                break;
            }
            if Instant::now() >= deadline {
                return Err(SerialError::ShortRead {
                    expected: buf.len(),
                    actual: filled,
                });
            }
            if n == 0 {
                std::thread::sleep(Duration::from_millis(1));
            }
        }
        Ok(())
    }
}

/// 发送半部
pub trait TxTransport: Send {
    /// 写入全部字节
    fn write_all(&mut self, data: &[u8]) -> Result<(), SerialError>;

    fn flush(&mut self) -> Result<(), SerialError> {
        Ok(())
    }
}

/// 已打开的串口连接（收发分离）
pub struct SerialLink {
    pub port: String,
    pub rx: Box<dyn RxTransport>,
    pub tx: Box<dyn TxTransport>,
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink").field("port", &self.port).finish_non_exhaustive()
    }
}

/// 串口后端：端口枚举与打开
pub trait SerialBackend: Send + Sync {
    /// 系统当前可见的端口名（未排序）
    fn available_ports(&self) -> Result<Vec<String>, SerialError>;

    /// 打开端口
    fn open(&self, port: &str, settings: &SerialSettings) -> Result<SerialLink, SerialError>;

    /// 按自然顺序排列的端口名
    ///
    /// 枚举失败时返回空列表。
    fn list_ports(&self) -> Vec<String> {
        match self.available_ports() {
            Ok(ports) => natural_sort(ports),
            Err(e) => {
                tracing::warn!("Failed to enumerate serial ports: {}", e);
                Vec::new()
            },
        }
    }
}
