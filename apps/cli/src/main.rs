//! # Line Follower CLI
//!
//! Command-line interface for line follower robot control.
//!
//! ```bash
//! # 列出串口（自然顺序）
//! linefollower-cli ports
//!
//! # 配置默认串口
//! linefollower-cli config set --port /dev/rfcomm0
//!
//! # 监控事件（Ctrl-C 退出）
//! linefollower-cli monitor --json
//!
//! # 发送命令
//! linefollower-cli send speed_ki 0.0123
//! linefollower-cli send start
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod utils;

use commands::config::{CliConfig, default_config_file};
use commands::{ConfigCommand, MonitorCommand, SendCommand};

/// Line Follower CLI - 巡线机器人命令行工具
#[derive(Parser, Debug)]
#[command(name = "linefollower-cli")]
#[command(about = "Command-line interface for line follower robot control", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 <config_dir>/linefollower/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 列出可用串口
    Ports,

    /// 监控机器人事件
    Monitor {
        #[command(flatten)]
        args: MonitorCommand,
    },

    /// 发送一条命令
    Send {
        #[command(flatten)]
        args: SendCommand,
    },
}

fn main() -> Result<()> {
    linefollower_sdk::init_logger_with_filter("linefollower_cli=info,linefollower_driver=info");

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_file()?,
    };

    match cli.command {
        Commands::Config(cmd) => cmd.execute(&config_path),
        Commands::Ports => {
            let config = CliConfig::load(&config_path)?;
            commands::ports::execute(&config.connection)
        },
        Commands::Monitor { args } => {
            let config = CliConfig::load(&config_path)?;
            args.execute(config.connection)
        },
        Commands::Send { args } => {
            let config = CliConfig::load(&config_path)?;
            args.execute(config.connection)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_send() {
        let cli = Cli::parse_from(["linefollower-cli", "send", "pid_kp", "12", "--port", "COM5"]);
        match cli.command {
            Commands::Send { args } => {
                assert_eq!(args.command, "pid_kp");
                assert_eq!(args.value.as_deref(), Some("12"));
                assert_eq!(args.port.as_deref(), Some("COM5"));
                assert_eq!(args.wait_ms, 300);
            },
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_monitor_json() {
        let cli = Cli::parse_from(["linefollower-cli", "--config", "x.toml", "monitor", "--json"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Commands::Monitor { args } if args.json));
    }
}
