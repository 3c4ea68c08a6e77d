//! 链路指标
//!
//! 原子计数器，读线程写入，任意线程读取快照，不引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 链路实时指标
#[derive(Debug, Default)]
pub struct LinkMetrics {
    /// 接收的总字节数
    pub rx_bytes: AtomicU64,
    /// 接收的有效帧数
    pub rx_frames: AtomicU64,
    /// 接收的无效帧数（校验失败、未知类型）
    pub rx_invalid_frames: AtomicU64,
    /// 接收的文本行数
    pub rx_log_lines: AtomicU64,
    /// 解码的遥测记录数
    pub telemetry_records: AtomicU64,
    /// 发送的帧数
    pub tx_frames: AtomicU64,
    /// 发送的字节数
    pub tx_bytes: AtomicU64,
    /// 存活探测发出的 PING 数
    pub pings_sent: AtomicU64,
}

impl LinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rx_bytes: self.rx_bytes.load(Ordering::Relaxed),
            rx_frames: self.rx_frames.load(Ordering::Relaxed),
            rx_invalid_frames: self.rx_invalid_frames.load(Ordering::Relaxed),
            rx_log_lines: self.rx_log_lines.load(Ordering::Relaxed),
            telemetry_records: self.telemetry_records.load(Ordering::Relaxed),
            tx_frames: self.tx_frames.load(Ordering::Relaxed),
            tx_bytes: self.tx_bytes.load(Ordering::Relaxed),
            pings_sent: self.pings_sent.load(Ordering::Relaxed),
        }
    }

    /// 所有计数器归零
    pub fn reset(&self) {
        self.rx_bytes.store(0, Ordering::Relaxed);
        self.rx_frames.store(0, Ordering::Relaxed);
        self.rx_invalid_frames.store(0, Ordering::Relaxed);
        self.rx_log_lines.store(0, Ordering::Relaxed);
        self.telemetry_records.store(0, Ordering::Relaxed);
        self.tx_frames.store(0, Ordering::Relaxed);
        self.tx_bytes.store(0, Ordering::Relaxed);
        self.pings_sent.store(0, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub rx_bytes: u64,
    pub rx_frames: u64,
    pub rx_invalid_frames: u64,
    pub rx_log_lines: u64,
    pub telemetry_records: u64,
    pub tx_frames: u64,
    pub tx_bytes: u64,
    pub pings_sent: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_reset() {
        let metrics = LinkMetrics::new();
        metrics.rx_bytes.fetch_add(12, Ordering::Relaxed);
        metrics.pings_sent.fetch_add(1, Ordering::Relaxed);

        let snap = metrics.snapshot();
        assert_eq!(snap.rx_bytes, 12);
        assert_eq!(snap.pings_sent, 1);
        assert_eq!(snap.tx_frames, 0);

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
