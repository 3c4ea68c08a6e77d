//! 连接配置
//!
//! 所有字段在 TOML 中均为可选，缺省值见 [`ConnectionConfig::default`]。
//!
//! ```toml
//! preferred_port = "COM3"
//! baud_rate = 115200
//! timeout_ms = 1000
//! idle_poll_ms = 10
//! log_dir = "data"
//! debug_frames = false
//! ```

use crate::error::DriverError;
use linefollower_serial::SerialSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 连接配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// 启动时优先选择的端口（存在时）
    pub preferred_port: String,
    /// 波特率
    pub baud_rate: u32,
    /// 读写超时（毫秒）
    pub timeout_ms: u64,
    /// 读循环空闲时的休眠间隔（毫秒）
    pub idle_poll_ms: u64,
    /// 日志文件目录，`None` 关闭文件日志
    pub log_dir: Option<PathBuf>,
    /// 将每个解码帧的描述追加到文本日志
    pub debug_frames: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            preferred_port: "COM3".to_string(),
            baud_rate: linefollower_serial::DEFAULT_BAUD_RATE,
            timeout_ms: 1000,
            idle_poll_ms: 10,
            log_dir: None,
            debug_frames: false,
        }
    }
}

impl ConnectionConfig {
    /// 读写超时
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// 存活阈值：`timeout × 1.1`
    pub fn liveness_threshold(&self) -> Duration {
        Duration::from_micros(self.timeout_ms.saturating_mul(1100))
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    /// 打开串口使用的参数
    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings {
            baud_rate: self.baud_rate,
            timeout: self.timeout(),
        }
    }

    /// 校验取值范围
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.baud_rate == 0 {
            return Err(DriverError::Config("baud_rate must be positive".into()));
        }
        if self.timeout_ms == 0 {
            return Err(DriverError::Config("timeout_ms must be positive".into()));
        }
        Ok(())
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(text: &str) -> Result<Self, DriverError> {
        let config: Self =
            toml::from_str(text).map_err(|e| DriverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// 序列化为 TOML 文本
    pub fn to_toml_string(&self) -> Result<String, DriverError> {
        toml::to_string_pretty(self).map_err(|e| DriverError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.preferred_port, "COM3");
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.timeout(), Duration::from_secs(1));
        assert_eq!(config.liveness_threshold(), Duration::from_millis(1100));
        assert!(config.log_dir.is_none());
        assert!(!config.debug_frames);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ConnectionConfig::from_toml_str("timeout_ms = 200\nlog_dir = \"data\"\n").unwrap();
        assert_eq!(config.timeout_ms, 200);
        assert_eq!(config.liveness_threshold(), Duration::from_millis(220));
        assert_eq!(config.log_dir, Some(PathBuf::from("data")));
        assert_eq!(config.baud_rate, 115_200);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ConnectionConfig::from_toml_str("baud_rate = 0"),
            Err(DriverError::Config(_))
        ));
        assert!(ConnectionConfig::from_toml_str("timeout_ms = \"soon\"").is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ConnectionConfig {
            preferred_port: "/dev/rfcomm0".into(),
            debug_frames: true,
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(ConnectionConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_serial_settings() {
        let config = ConnectionConfig {
            baud_rate: 9600,
            timeout_ms: 50,
            ..Default::default()
        };
        let settings = config.serial_settings();
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.timeout, Duration::from_millis(50));
    }
}
