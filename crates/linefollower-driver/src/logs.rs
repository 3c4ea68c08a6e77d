//! 数据日志文件
//!
//! 目录结构（`log_dir` 下）：
//!
//! | 文件 | 内容 | 速率 |
//! |---|---|---|
//! | `serial_data_log.txt` | 固件文本行（latin-1），可选附带帧描述 | 每行 |
//! | `serial_data_log.bin` | 遥测原始负载字节 | 每帧 |
//! | `sensors.csv` | 遥测 CSV | 每帧 |
//! | `encoder.csv` | 遥测 CSV | 仅位置/航向变化时 |
//!
//! 日志写入失败不会中断连接，只记录 `warn!`。

use crate::error::DriverError;
use linefollower_protocol::{Message, TELEMETRY_CSV_HEADER, TelemetryRecord};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const TEXT_LOG_FILE: &str = "serial_data_log.txt";
pub const BINARY_LOG_FILE: &str = "serial_data_log.bin";
pub const SENSOR_CSV_FILE: &str = "sensors.csv";
pub const ENCODER_CSV_FILE: &str = "encoder.csv";

fn open_append(path: &Path) -> Result<File, DriverError> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// 以追加方式打开 CSV；新文件（或空文件）先写表头
fn open_csv(path: &Path) -> Result<csv::Writer<File>, DriverError> {
    let file = open_append(path)?;
    let is_empty = file.metadata()?.len() == 0;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if is_empty {
        writer.write_record(TELEMETRY_CSV_HEADER)?;
        writer.flush()?;
    }
    Ok(writer)
}

/// 截断 CSV 并重写表头
fn truncate_csv(path: &Path) -> Result<csv::Writer<File>, DriverError> {
    File::create(path)?;
    open_csv(path)
}

/// 遥测双速率日志
///
/// 完整速率日志（原始字节 + `sensors.csv`）每帧一行；
/// 门控日志（`encoder.csv`）只在 x、y 或航向与上一次写入的行不同时追加。
pub struct TelemetryLogger {
    dir: PathBuf,
    binary: File,
    full: csv::Writer<File>,
    gated: csv::Writer<File>,
    last_gated: Option<TelemetryRecord>,
}

impl TelemetryLogger {
    /// 打开（或创建）目录下的三个遥测文件
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, DriverError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            binary: open_append(&dir.join(BINARY_LOG_FILE))?,
            full: open_csv(&dir.join(SENSOR_CSV_FILE))?,
            gated: open_csv(&dir.join(ENCODER_CSV_FILE))?,
            last_gated: None,
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 记录一帧遥测，返回门控日志是否写入了新行
    pub fn record(&mut self, payload: &[u8], rec: &TelemetryRecord) -> Result<bool, DriverError> {
        self.binary.write_all(payload)?;
        self.binary.flush()?;

        let row = rec.csv_record();
        self.full.write_record(&row)?;
        self.full.flush()?;

        if self.last_gated.is_some_and(|last| last.same_pose(rec)) {
            return Ok(false);
        }
        self.gated.write_record(&row)?;
        self.gated.flush()?;
        self.last_gated = Some(*rec);
        Ok(true)
    }

    /// 清空三个文件并重写表头（新一次运行开始时调用）
    pub fn reset(&mut self) -> Result<(), DriverError> {
        self.binary = File::create(self.dir.join(BINARY_LOG_FILE))?;
        self.full = truncate_csv(&self.dir.join(SENSOR_CSV_FILE))?;
        self.gated = truncate_csv(&self.dir.join(ENCODER_CSV_FILE))?;
        self.last_gated = None;
        info!("Telemetry logs reset in {}", self.dir.display());
        Ok(())
    }
}

/// 文本行日志（latin-1）
pub struct TextLog {
    file: File,
}

impl TextLog {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, DriverError> {
        std::fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            file: open_append(&dir.as_ref().join(TEXT_LOG_FILE))?,
        })
    }

    /// 追加一行；超出 latin-1 的字符写为 `?`
    pub fn append(&mut self, line: &str) -> Result<(), DriverError> {
        let mut bytes: Vec<u8> = line
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect();
        bytes.push(b'\n');
        self.file.write_all(&bytes)?;
        self.file.flush()?;
        Ok(())
    }
}

/// 一次会话的全部数据日志
///
/// 读线程写入，`reset_telemetry` 可由发送命令的线程调用，因此各自加锁。
pub struct DataLogs {
    text: Mutex<TextLog>,
    telemetry: Mutex<TelemetryLogger>,
    debug_frames: bool,
}

impl DataLogs {
    pub fn open(dir: impl AsRef<Path>, debug_frames: bool) -> Result<Self, DriverError> {
        Ok(Self {
            text: Mutex::new(TextLog::open(dir.as_ref())?),
            telemetry: Mutex::new(TelemetryLogger::open(dir.as_ref())?),
            debug_frames,
        })
    }

    pub fn log_line(&self, line: &str) {
        if let Err(e) = self.text.lock().append(line) {
            warn!("Failed to append log line: {}", e);
        }
    }

    /// `debug_frames` 打开时记录帧描述
    pub fn log_frame(&self, msg: &Message) {
        if self.debug_frames {
            self.log_line(&msg.to_string());
        }
    }

    pub fn log_telemetry(&self, payload: &[u8], rec: &TelemetryRecord) {
        if let Err(e) = self.telemetry.lock().record(payload, rec) {
            warn!("Failed to write telemetry log: {}", e);
        }
    }

    pub fn reset_telemetry(&self) -> Result<(), DriverError> {
        self.telemetry.lock().reset()
    }
}
