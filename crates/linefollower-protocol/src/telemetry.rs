//! 遥测记录（OPERATION_DATA）解析
//!
//! 8 字节负载布局：
//!
//! | 字节 | 内容 |
//! |---|---|
//! | 0 | 中央 8 路红外传感器位域（Bit 0 = ir1） |
//! | 1 | Bit 0 左边沿传感器，Bit 1 右边沿传感器 |
//! | 2-3 | x，i16 小端 |
//! | 4-5 | y，i16 小端 |
//! | 6-7 | 航向原始值，i16 小端，实际值 = raw / 10000 |

use crate::ids::MessageType;
use crate::message::Message;
use crate::{ProtocolError, bytes_to_i16_le};
use bilge::prelude::*;

/// 遥测 CSV 表头（完整速率与变化门控两份日志共用）
pub const TELEMETRY_CSV_HEADER: [&str; 13] = [
    "left_ir", "ir1", "ir2", "ir3", "ir4", "ir5", "ir6", "ir7", "ir8", "right_ir", "x", "y",
    "heading",
];

/// 航向定点除数
pub const HEADING_DIVISOR: f64 = 10_000.0;

/// 遥测负载长度
pub const TELEMETRY_PAYLOAD_LEN: usize = 8;

/// 中央红外传感器位域（Byte 0）
///
/// bilge 默认 LSB first，Bit 0 对应 ir1。
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineSensors {
    pub ir1: bool,
    pub ir2: bool,
    pub ir3: bool,
    pub ir4: bool,
    pub ir5: bool,
    pub ir6: bool,
    pub ir7: bool,
    pub ir8: bool,
}

/// 边沿传感器位域（Byte 1）
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeSensors {
    pub left: bool,   // Bit 0
    pub right: bool,  // Bit 1
    pub reserved: u6, // Bit 2-7: 保留
}

/// 一帧遥测数据
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryRecord {
    pub line: LineSensors,
    pub edges: EdgeSensors,
    pub x: i16,
    pub y: i16,
    pub heading_raw: i16,
}

impl TelemetryRecord {
    /// 从 8 字节负载解析
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() != TELEMETRY_PAYLOAD_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: TELEMETRY_PAYLOAD_LEN,
                actual: payload.len(),
            });
        }

        Ok(Self {
            line: LineSensors::from(u8::new(payload[0])),
            edges: EdgeSensors::from(u8::new(payload[1])),
            x: bytes_to_i16_le([payload[2], payload[3]]),
            y: bytes_to_i16_le([payload[4], payload[5]]),
            heading_raw: bytes_to_i16_le([payload[6], payload[7]]),
        })
    }

    /// 航向（弧度，raw / 10000）
    pub fn heading(&self) -> f64 {
        f64::from(self.heading_raw) / HEADING_DIVISOR
    }

    /// 传感器数组：`[left, ir1..ir8, right]`
    pub fn sensors(&self) -> [bool; 10] {
        let l = self.line;
        [
            self.edges.left(),
            l.ir1(),
            l.ir2(),
            l.ir3(),
            l.ir4(),
            l.ir5(),
            l.ir6(),
            l.ir7(),
            l.ir8(),
            self.edges.right(),
        ]
    }

    /// x、y、航向是否均与另一条记录相同（门控日志的比较依据）
    pub fn same_pose(&self, other: &TelemetryRecord) -> bool {
        self.x == other.x && self.y == other.y && self.heading_raw == other.heading_raw
    }

    /// 一行 CSV 字段，与 [`TELEMETRY_CSV_HEADER`] 对应
    ///
    /// 传感器写 0/1，航向保留 4 位小数。
    pub fn csv_record(&self) -> Vec<String> {
        let mut row: Vec<String> = self
            .sensors()
            .iter()
            .map(|&on| u8::from(on).to_string())
            .collect();
        row.push(self.x.to_string());
        row.push(self.y.to_string());
        row.push(format!("{:.4}", self.heading()));
        row
    }
}

impl TryFrom<&Message> for TelemetryRecord {
    type Error = ProtocolError;

    fn try_from(msg: &Message) -> Result<Self, Self::Error> {
        if msg.kind() != MessageType::OperationData {
            return Err(ProtocolError::UnexpectedType {
                expected: MessageType::OperationData,
                actual: msg.kind(),
            });
        }
        Self::decode(msg.payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(line: u8, edges: u8, x: i16, y: i16, heading: i16) -> [u8; 8] {
        let mut p = [0u8; 8];
        p[0] = line;
        p[1] = edges;
        p[2..4].copy_from_slice(&x.to_le_bytes());
        p[4..6].copy_from_slice(&y.to_le_bytes());
        p[6..8].copy_from_slice(&heading.to_le_bytes());
        p
    }

    #[test]
    fn test_decode_fields() {
        let rec = TelemetryRecord::decode(&payload(0b1000_0001, 0b10, 120, -45, 15708)).unwrap();
        assert_eq!(rec.x, 120);
        assert_eq!(rec.y, -45);
        assert!((rec.heading() - 1.5708).abs() < 1e-9);
        assert!(rec.line.ir1());
        assert!(!rec.line.ir2());
        assert!(rec.line.ir8());
        assert!(!rec.edges.left());
        assert!(rec.edges.right());
    }

    #[test]
    fn test_sensor_ordering() {
        let rec = TelemetryRecord::decode(&payload(0b0000_0010, 0b01, 0, 0, 0)).unwrap();
        assert_eq!(
            rec.sensors(),
            [true, false, true, false, false, false, false, false, false, false]
        );
    }

    #[test]
    fn test_negative_heading() {
        let rec = TelemetryRecord::decode(&payload(0, 0, 0, 0, -31416)).unwrap();
        assert!((rec.heading() + 3.1416).abs() < 1e-9);
    }

    #[test]
    fn test_decode_rejects_short_payload() {
        assert!(matches!(
            TelemetryRecord::decode(&[0u8; 7]),
            Err(ProtocolError::InvalidLength {
                expected: 8,
                actual: 7
            })
        ));
    }

    #[test]
    fn test_try_from_message_checks_type() {
        let msg = Message::new(MessageType::OperationData, &payload(0xFF, 0x03, 1, 2, 3));
        let rec = TelemetryRecord::try_from(&msg).unwrap();
        assert!(rec.sensors().iter().all(|&on| on));

        let other = Message::from_int(MessageType::Laps, 1);
        assert!(matches!(
            TelemetryRecord::try_from(&other),
            Err(ProtocolError::UnexpectedType { .. })
        ));
    }

    #[test]
    fn test_same_pose_ignores_sensors() {
        let a = TelemetryRecord::decode(&payload(0x01, 0, 10, 20, 30)).unwrap();
        let b = TelemetryRecord::decode(&payload(0x80, 0x03, 10, 20, 30)).unwrap();
        let c = TelemetryRecord::decode(&payload(0x01, 0, 10, 21, 30)).unwrap();
        assert!(a.same_pose(&b));
        assert!(!a.same_pose(&c));
    }

    #[test]
    fn test_csv_record_matches_header() {
        let rec = TelemetryRecord::decode(&payload(0b0000_0001, 0b11, -5, 7, 5000)).unwrap();
        let row = rec.csv_record();
        assert_eq!(row.len(), TELEMETRY_CSV_HEADER.len());
        assert_eq!(row[0], "1");
        assert_eq!(row[1], "1");
        assert_eq!(row[2], "0");
        assert_eq!(row[9], "1");
        assert_eq!(row[10], "-5");
        assert_eq!(row[11], "7");
        assert_eq!(row[12], "0.5000");
    }
}
