//! 配置管理命令
//!
//! 配置文件：`<config_dir>/linefollower/config.toml`，`[connection]` 表即
//! [`ConnectionConfig`]。

use anyhow::{Context, Result};
use clap::Subcommand;
use linefollower_sdk::ConnectionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("linefollower");
    path.push("config.toml");
    Ok(path)
}

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub connection: ConnectionConfig,
}

impl CliConfig {
    /// 加载配置（文件不存在时返回默认值）
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config: Self = toml::from_str(&content).context("解析配置文件失败")?;
        config.connection.validate()?;
        Ok(config)
    }

    /// 保存配置
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("创建配置目录失败")?;
        }
        let content = toml::to_string_pretty(self).context("序列化配置失败")?;
        fs::write(path, format!("# Line Follower CLI Configuration\n\n{}", content))
            .context("写入配置文件失败")?;
        Ok(())
    }
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 设置配置项
    Set {
        /// 默认串口（如 COM3、/dev/rfcomm0）
        #[arg(short, long)]
        port: Option<String>,

        /// 波特率
        #[arg(short, long)]
        baud_rate: Option<u32>,

        /// 读写超时（毫秒）
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// 日志目录
        #[arg(short, long)]
        log_dir: Option<PathBuf>,

        /// 把每个解码帧写入文本日志
        #[arg(long)]
        debug_frames: Option<bool>,
    },

    /// 获取配置项
    Get {
        /// 配置项名称
        #[arg(default_value = "all")]
        key: String,
    },

    /// 显示配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self, path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Set {
                port,
                baud_rate,
                timeout_ms,
                log_dir,
                debug_frames,
            } => {
                let mut config = CliConfig::load(path)?;
                let conn = &mut config.connection;
                if let Some(port) = port {
                    println!("✅ 设置默认串口: {}", port);
                    conn.preferred_port = port;
                }
                if let Some(baud_rate) = baud_rate {
                    println!("✅ 设置波特率: {}", baud_rate);
                    conn.baud_rate = baud_rate;
                }
                if let Some(timeout_ms) = timeout_ms {
                    println!("✅ 设置超时: {} ms", timeout_ms);
                    conn.timeout_ms = timeout_ms;
                }
                if let Some(dir) = log_dir {
                    println!("✅ 设置日志目录: {}", dir.display());
                    conn.log_dir = Some(dir);
                }
                if let Some(enabled) = debug_frames {
                    println!("✅ 设置帧调试日志: {}", enabled);
                    conn.debug_frames = enabled;
                }
                conn.validate()?;
                config.save(path)
            },

            ConfigCommand::Get { key } => {
                let config = CliConfig::load(path)?;
                println!("{}", get_value(&config, &key)?);
                Ok(())
            },

            ConfigCommand::Path => {
                println!("{}", path.display());
                Ok(())
            },
        }
    }
}

/// 读取单个配置项（`all` 输出整个文件内容）
fn get_value(config: &CliConfig, key: &str) -> Result<String> {
    let conn = &config.connection;
    let value = match key {
        "port" | "preferred_port" => conn.preferred_port.clone(),
        "baud_rate" => conn.baud_rate.to_string(),
        "timeout_ms" => conn.timeout_ms.to_string(),
        "idle_poll_ms" => conn.idle_poll_ms.to_string(),
        "log_dir" => conn
            .log_dir
            .as_ref()
            .map_or_else(|| "(未设置)".to_string(), |d| d.display().to_string()),
        "debug_frames" => conn.debug_frames.to_string(),
        "all" => toml::to_string_pretty(config)?,
        other => anyhow::bail!("未知配置项: {}", other),
    };
    Ok(value)
}
