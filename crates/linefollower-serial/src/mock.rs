//! Mock 串口后端
//!
//! 完全在内存中模拟串口，用于驱动层与 SDK 的无硬件测试：
//! - 测试侧通过 [`MockBackend::inject`] 注入"固件发出的"字节
//! - 驱动写出的字节可通过 [`MockBackend::written`] 取回
//! - 默认模拟固件行为：收到 PING 帧后原样回显
//! - 可注入打开失败、读写失败、端口消失等故障

use crate::{RxTransport, SerialBackend, SerialError, SerialLink, SerialSettings, TxTransport};
use linefollower_protocol::commands;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// 收到 PING 时的应答方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingReply {
    /// 原样回显 PING 帧
    Echo,
    /// 不应答（模拟链路静默断开）
    Silent,
    /// 应答指定字节
    Custom(Vec<u8>),
}

#[derive(Debug)]
struct MockState {
    ports: Vec<String>,
    rx_queue: VecDeque<u8>,
    written: Vec<u8>,
    ping_reply: PingReply,
    fail_open: Option<String>,
    fail_reads: bool,
    fail_writes: bool,
    open_count: usize,
    pings_seen: usize,
    last_settings: Option<SerialSettings>,
}

/// Mock 后端（可 Clone，所有副本共享同一份状态）
#[derive(Debug, Clone)]
pub struct MockBackend {
    inner: Arc<Mutex<MockState>>,
}

/// 测试侧句柄，与 [`MockBackend`] 为同一类型
pub type MockHandle = MockBackend;

impl MockBackend {
    /// 创建带有给定端口列表的 mock 后端
    pub fn new<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                ports: ports.into_iter().map(Into::into).collect(),
                rx_queue: VecDeque::new(),
                written: Vec::new(),
                ping_reply: PingReply::Echo,
                fail_open: None,
                fail_reads: false,
                fail_writes: false,
                open_count: 0,
                pings_seen: 0,
                last_settings: None,
            })),
        }
    }

    /// 注入待读取的字节
    pub fn inject(&self, data: &[u8]) {
        self.inner.lock().rx_queue.extend(data);
    }

    /// 尚未被读取的字节数
    pub fn pending_rx(&self) -> usize {
        self.inner.lock().rx_queue.len()
    }

    /// 取回所有已写出的字节
    pub fn written(&self) -> Vec<u8> {
        self.inner.lock().written.clone()
    }

    pub fn clear_written(&self) {
        self.inner.lock().written.clear();
    }

    /// 收到的 PING 帧数量
    pub fn pings_seen(&self) -> usize {
        self.inner.lock().pings_seen
    }

    /// 成功打开的次数
    pub fn open_count(&self) -> usize {
        self.inner.lock().open_count
    }

    /// 最近一次打开使用的参数
    pub fn last_settings(&self) -> Option<SerialSettings> {
        self.inner.lock().last_settings
    }

    pub fn set_ping_reply(&self, reply: PingReply) {
        self.inner.lock().ping_reply = reply;
    }

    /// 下一次及之后的打开操作失败（`None` 取消）
    pub fn set_fail_open(&self, reason: Option<&str>) {
        self.inner.lock().fail_open = reason.map(str::to_string);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.lock().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    /// 替换端口列表
    pub fn set_ports<I, S>(&self, ports: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.lock().ports = ports.into_iter().map(Into::into).collect();
    }

    /// 从端口列表中移除（模拟设备拔出/蓝牙配对消失）
    pub fn remove_port(&self, name: &str) {
        self.inner.lock().ports.retain(|p| p != name);
    }
}

impl SerialBackend for MockBackend {
    fn available_ports(&self) -> Result<Vec<String>, SerialError> {
        Ok(self.inner.lock().ports.clone())
    }

    fn open(&self, port: &str, settings: &SerialSettings) -> Result<SerialLink, SerialError> {
        let mut state = self.inner.lock();
        if let Some(reason) = &state.fail_open {
            return Err(SerialError::Io(std::io::Error::other(reason.clone())));
        }
        if !state.ports.iter().any(|p| p == port) {
            return Err(SerialError::PortNotFound(port.to_string()));
        }
        state.open_count += 1;
        state.last_settings = Some(*settings);
        drop(state);

        Ok(SerialLink {
            port: port.to_string(),
            rx: Box::new(MockRx {
                inner: Arc::clone(&self.inner),
            }),
            tx: Box::new(MockTx {
                inner: Arc::clone(&self.inner),
                ping_frame: commands::ping().to_frame(),
            }),
        })
    }
}

struct MockRx {
    inner: Arc<Mutex<MockState>>,
}

impl RxTransport for MockRx {
    fn bytes_available(&mut self) -> Result<usize, SerialError> {
        let state = self.inner.lock();
        if state.fail_reads {
            return Err(SerialError::Disconnected);
        }
        Ok(state.rx_queue.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialError> {
        let mut state = self.inner.lock();
        if state.fail_reads {
            return Err(SerialError::Disconnected);
        }
        let n = state.rx_queue.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(state.rx_queue.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

struct MockTx {
    inner: Arc<Mutex<MockState>>,
    ping_frame: Vec<u8>,
}

impl TxTransport for MockTx {
    fn write_all(&mut self, data: &[u8]) -> Result<(), SerialError> {
        let mut state = self.inner.lock();
        if state.fail_writes {
            return Err(SerialError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        state.written.extend_from_slice(data);

        if data == self.ping_frame.as_slice() {
            state.pings_seen += 1;
            let reply = match &state.ping_reply {
                PingReply::Echo => Some(self.ping_frame.clone()),
                PingReply::Silent => None,
                PingReply::Custom(bytes) => Some(bytes.clone()),
            };
            if let Some(reply) = reply {
                state.rx_queue.extend(reply);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_inject_and_read() {
        let backend = MockBackend::new(["COM1"]);
        let mut link = backend.open("COM1", &SerialSettings::default()).unwrap();
        backend.inject(&[1, 2, 3]);
        assert_eq!(link.rx.bytes_available().unwrap(), 3);

        let mut buf = [0u8; 8];
        assert_eq!(link.rx.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(link.rx.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_ping_is_echoed() {
        let backend = MockBackend::new(["COM1"]);
        let mut link = backend.open("COM1", &SerialSettings::default()).unwrap();
        link.tx.write_all(&[0xAA, 0x12, 0x12]).unwrap();
        assert_eq!(backend.pings_seen(), 1);

        let mut echo = [0u8; 3];
        link.rx.read_exact_timeout(&mut echo, Duration::from_millis(50)).unwrap();
        assert_eq!(echo, [0xAA, 0x12, 0x12]);
    }

    #[test]
    fn test_silent_ping() {
        let backend = MockBackend::new(["COM1"]);
        backend.set_ping_reply(PingReply::Silent);
        let mut link = backend.open("COM1", &SerialSettings::default()).unwrap();
        link.tx.write_all(&[0xAA, 0x12, 0x12]).unwrap();
        assert_eq!(backend.pending_rx(), 0);
        assert_eq!(backend.written(), vec![0xAA, 0x12, 0x12]);
    }

    #[test]
    fn test_open_unknown_port() {
        let backend = MockBackend::new(["COM1"]);
        assert!(matches!(
            backend.open("COM9", &SerialSettings::default()),
            Err(SerialError::PortNotFound(_))
        ));
        assert_eq!(backend.open_count(), 0);
    }

    #[test]
    fn test_fault_injection() {
        let backend = MockBackend::new(["COM1"]);
        let mut link = backend.open("COM1", &SerialSettings::default()).unwrap();
        backend.set_fail_writes(true);
        assert!(link.tx.write_all(&[0x00]).is_err());
        backend.set_fail_reads(true);
        assert!(matches!(link.rx.bytes_available(), Err(SerialError::Disconnected)));

        backend.set_fail_open(Some("busy"));
        assert!(backend.open("COM1", &SerialSettings::default()).is_err());
    }

    #[test]
    fn test_list_ports_is_naturally_sorted() {
        let backend = MockBackend::new(["COM10", "BT", "COM2"]);
        assert_eq!(backend.list_ports(), vec!["COM2", "COM10", "BT"]);
        backend.remove_port("COM10");
        assert_eq!(backend.list_ports(), vec!["COM2", "BT"]);
    }
}
