//! 系统串口后端（`serialport` crate）
//!
//! 8N1、无流控。蓝牙 SPP 在 Windows 上表现为 COMx 虚拟串口，
//! 在 Linux 上表现为 `/dev/rfcommN`，两者都通过此后端访问。
//!
//! 打开后通过 `try_clone` 拆成两个句柄，RX 与 TX 可在不同线程并发使用。

use crate::{RxTransport, SerialBackend, SerialError, SerialLink, SerialSettings, TxTransport};
use serialport::{DataBits, ErrorKind, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use tracing::{info, trace};

/// 系统串口后端
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBackend;

impl SystemBackend {
    pub fn new() -> Self {
        Self
    }
}

impl SerialBackend for SystemBackend {
    fn available_ports(&self) -> Result<Vec<String>, SerialError> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    fn open(&self, port: &str, settings: &SerialSettings) -> Result<SerialLink, SerialError> {
        let handle = serialport::new(port, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(settings.timeout)
            .open()
            .map_err(|e| match e.kind() {
                ErrorKind::NoDevice => SerialError::PortNotFound(port.to_string()),
                _ => SerialError::Port(e),
            })?;

        let tx = handle.try_clone()?;

        info!("Opened serial port: {} at {} baud", port, settings.baud_rate);

        Ok(SerialLink {
            port: port.to_string(),
            rx: Box::new(SystemRx { port: handle }),
            tx: Box::new(SystemTx { port: tx }),
        })
    }
}

/// 系统串口接收半部
pub struct SystemRx {
    port: Box<dyn SerialPort>,
}

impl RxTransport for SystemRx {
    fn bytes_available(&mut self) -> Result<usize, SerialError> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialError> {
        match self.port.read(buf) {
            Ok(n) => {
                trace!("serial rx {} bytes", n);
                Ok(n)
            },
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

/// 系统串口发送半部
pub struct SystemTx {
    port: Box<dyn SerialPort>,
}

impl TxTransport for SystemTx {
    fn write_all(&mut self, data: &[u8]) -> Result<(), SerialError> {
        self.port.write_all(data)?;
        trace!("serial tx {} bytes", data.len());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        self.port.flush()?;
        Ok(())
    }
}
