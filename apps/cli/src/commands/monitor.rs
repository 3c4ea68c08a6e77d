//! 监控命令
//!
//! 连接后持续打印事件，直到 Ctrl-C 或连接断开。

use crate::utils::{event_to_json, format_event};
use anyhow::{Context, Result};
use clap::Args;
use linefollower_sdk::{ConnectionConfig, LineFollower, RobotEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

/// 监控参数
#[derive(Args, Debug)]
pub struct MonitorCommand {
    /// 串口（默认使用配置中的端口）
    #[arg(short, long)]
    pub port: Option<String>,

    /// 以 JSON 行输出
    #[arg(long)]
    pub json: bool,

    /// 不打印遥测帧
    #[arg(long)]
    pub no_telemetry: bool,
}

impl MonitorCommand {
    pub fn execute(self, mut config: ConnectionConfig) -> Result<()> {
        if let Some(port) = &self.port {
            config.preferred_port = port.clone();
        }
        let robot = LineFollower::with_config(config)?;
        if let Some(port) = &self.port
            && robot.port() != *port
        {
            anyhow::bail!("串口不可用: {}", port);
        }

        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
            .context("设置 Ctrl-C 处理失败")?;

        let events = robot.subscribe();
        robot
            .try_connect()
            .with_context(|| format!("连接 {} 失败", robot.port()))?;
        info!("Monitoring {} (Ctrl-C to stop)", robot.port());

        while running.load(Ordering::SeqCst) {
            let Ok(event) = events.recv_timeout(Duration::from_millis(100)) else {
                continue;
            };
            if self.no_telemetry && matches!(event, RobotEvent::Telemetry(_)) {
                continue;
            }
            if self.json {
                println!("{}", event_to_json(&event));
            } else {
                println!("{}", format_event(&event));
            }
            if matches!(event, RobotEvent::ConnectionChanged { connected: false }) {
                break;
            }
        }

        robot.disconnect();
        let metrics = robot.metrics();
        info!(
            "rx {} bytes, {} frames ({} invalid), {} log lines, {} pings",
            metrics.rx_bytes,
            metrics.rx_frames,
            metrics.rx_invalid_frames,
            metrics.rx_log_lines,
            metrics.pings_sent
        );
        Ok(())
    }
}
