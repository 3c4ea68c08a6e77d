//! 端口列表命令

use anyhow::Result;
use linefollower_sdk::{ConnectionConfig, LineFollower};

/// 按自然顺序列出端口，`*` 标记启动时会选中的端口
pub fn execute(config: &ConnectionConfig) -> Result<()> {
    let robot = LineFollower::with_config(config.clone())?;
    let ports = robot.list_ports();
    if ports.is_empty() {
        println!("(没有可用串口)");
        return Ok(());
    }

    let selected = robot.port();
    for port in ports {
        let marker = if port == selected { '*' } else { ' ' };
        println!("{} {}", marker, port);
    }
    Ok(())
}
