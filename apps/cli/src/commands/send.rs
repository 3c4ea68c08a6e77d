//! 发送命令
//!
//! 连接、发送一条命令、等待片刻打印固件回应，然后断开。

use crate::utils::format_event;
use anyhow::{Context, Result};
use clap::Args;
use linefollower_sdk::{ConnectionConfig, LineFollower, parse_command};
use std::time::{Duration, Instant};

/// 发送参数
#[derive(Args, Debug)]
pub struct SendCommand {
    /// 命令或参数名（start、stop、pid_kp、running_mode ...）
    pub command: String,

    /// 参数值
    pub value: Option<String>,

    /// 串口（默认使用配置中的端口）
    #[arg(short, long)]
    pub port: Option<String>,

    /// 发送后等待回应的时长（毫秒）
    #[arg(short, long, default_value_t = 300)]
    pub wait_ms: u64,
}

impl SendCommand {
    pub fn execute(self, mut config: ConnectionConfig) -> Result<()> {
        let msg = parse_command(&self.command, self.value.as_deref())?;

        if let Some(port) = &self.port {
            config.preferred_port = port.clone();
        }
        // 单次命令不写数据日志
        config.log_dir = None;

        let robot = LineFollower::with_config(config)?;
        let events = robot.subscribe();
        robot
            .try_connect()
            .with_context(|| format!("连接 {} 失败", robot.port()))?;

        robot.send(&msg);
        println!("→ {}", msg);

        let deadline = Instant::now() + Duration::from_millis(self.wait_ms);
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            match events.recv_timeout(remaining) {
                Ok(event) => println!("{}", format_event(&event)),
                Err(_) => break,
            }
        }

        robot.disconnect();
        Ok(())
    }
}
