//! 单帧编解码（FrameCodec）
//!
//! `Message` 是协议层与传输层之间的中间抽象：
//!
//! ```text
//! Message::to_frame()                      Message::decode()
//!   0xAA · encode(kind, payload) · checksum   ←→   &[u8]
//! ```
//!
//! 所有对外解码接口均为 fail-soft：畸形帧返回 [`Message::INVALID`]，从不 panic。

use crate::ids::MessageType;
use crate::{MAX_PAYLOAD, MIN_FRAME_LEN, ProtocolError, START_BYTE, bytes_to_u32_le};
use std::fmt;

/// 计算校验和：TYPE_ID 与每个负载字节依次异或
pub fn checksum(kind: MessageType, payload: &[u8]) -> u8 {
    payload.iter().fold(kind.id(), |acc, &b| acc ^ b)
}

/// 编码消息主体：`[TYPE_ID] + payload`
///
/// 起始字节与校验和由 [`encode_frame`] 添加。
///
/// # 错误
/// - `ProtocolError::InvalidLength`: 负载长度与类型表不一致
pub fn encode(kind: MessageType, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    check_payload_len(kind, payload)?;
    let mut body = Vec::with_capacity(1 + payload.len());
    body.push(kind.id());
    body.extend_from_slice(payload);
    Ok(body)
}

/// 编码完整线上帧：`0xAA · TYPE_ID · payload · checksum`
pub fn encode_frame(kind: MessageType, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let body = encode(kind, payload)?;
    let mut frame = Vec::with_capacity(body.len() + 2);
    frame.push(START_BYTE);
    frame.extend_from_slice(&body);
    frame.push(checksum(kind, payload));
    Ok(frame)
}

fn check_payload_len(kind: MessageType, payload: &[u8]) -> Result<(), ProtocolError> {
    let expected = kind.payload_size();
    if payload.len() != expected {
        return Err(ProtocolError::InvalidLength {
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

/// 协议消息
///
/// # 不变量
///
/// `size() == kind().payload_size()` 恒成立；构造失败时得到的是
/// `MessageType::Invalid`（负载为空），而不是类型与长度不匹配的消息。
///
/// # 设计特性
///
/// - **Copy**：固定 8 字节缓冲区，无堆分配
/// - **自包含**：不携带校验和，线上帧按需重新计算
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Message {
    kind: MessageType,
    data: [u8; MAX_PAYLOAD],
    len: u8,
}

impl Message {
    /// 无效消息哨兵
    pub const INVALID: Message = Message {
        kind: MessageType::Invalid,
        data: [0; MAX_PAYLOAD],
        len: 0,
    };

    /// 构造消息，负载长度不符时返回 [`Message::INVALID`]
    pub fn new(kind: MessageType, payload: &[u8]) -> Self {
        Self::try_new(kind, payload).unwrap_or(Self::INVALID)
    }

    /// 构造消息（严格版本）
    pub fn try_new(kind: MessageType, payload: &[u8]) -> Result<Self, ProtocolError> {
        check_payload_len(kind, payload)?;
        let mut data = [0u8; MAX_PAYLOAD];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            kind,
            data,
            len: payload.len() as u8,
        })
    }

    /// 由已拆分的字段构造消息并校验校验和
    ///
    /// 流解析器在收到校验和字节后调用。长度或校验和不符时返回 `INVALID`。
    pub fn from_parts(kind: MessageType, payload: &[u8], received_checksum: u8) -> Self {
        if checksum(kind, payload) != received_checksum {
            return Self::INVALID;
        }
        Self::new(kind, payload)
    }

    /// 解析完整线上帧（fail-soft）
    pub fn decode(frame: &[u8]) -> Self {
        Self::try_decode(frame).unwrap_or(Self::INVALID)
    }

    /// 解析完整线上帧（严格版本，返回具体错误原因）
    pub fn try_decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        if frame.len() < MIN_FRAME_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: MIN_FRAME_LEN,
                actual: frame.len(),
            });
        }

        if frame[0] != START_BYTE {
            return Err(ProtocolError::MissingStartByte { found: frame[0] });
        }

        let kind = MessageType::try_from(frame[1])
            .map_err(|_| ProtocolError::UnknownMessageType { id: frame[1] })?;

        let expected_len = kind.payload_size() + MIN_FRAME_LEN;
        if frame.len() != expected_len {
            return Err(ProtocolError::InvalidLength {
                expected: expected_len,
                actual: frame.len(),
            });
        }

        let payload = &frame[2..frame.len() - 1];
        let received = frame[frame.len() - 1];
        let expected = checksum(kind, payload);
        if expected != received {
            return Err(ProtocolError::ChecksumMismatch {
                expected,
                actual: received,
            });
        }

        Self::try_new(kind, payload)
    }

    /// 由整数构造：按类型宽度转为小端无符号字节
    ///
    /// 负数或超出宽度的值返回 `INVALID`。
    pub fn from_int(kind: MessageType, value: i64) -> Self {
        Self::try_from_int(kind, value).unwrap_or(Self::INVALID)
    }

    /// [`Message::from_int`] 的带错误版本
    pub fn try_from_int(kind: MessageType, value: i64) -> Result<Self, ProtocolError> {
        let size = kind.payload_size();
        let max = match size {
            0 => 0,
            1..=7 => (1i64 << (8 * size)) - 1,
            _ => i64::MAX,
        };
        if value < 0 || value > max {
            return Err(ProtocolError::ValueOutOfRange {
                field: kind.name(),
                value,
            });
        }
        let bytes = (value as u64).to_le_bytes();
        Self::try_new(kind, &bytes[..size])
    }

    /// 由布尔值构造（1 字节，0/1）
    pub fn from_bool(kind: MessageType, value: bool) -> Self {
        Self::from_int(kind, i64::from(value))
    }

    /// 由浮点值构造：先乘以类型的定点除数并四舍五入
    pub fn from_float(kind: MessageType, value: f64) -> Self {
        Self::try_from_float(kind, value).unwrap_or(Self::INVALID)
    }

    /// [`Message::from_float`] 的带错误版本
    ///
    /// 非有限值按饱和后的整数报告越界。
    pub fn try_from_float(kind: MessageType, value: f64) -> Result<Self, ProtocolError> {
        let raw = (value * kind.fixed_point().divisor()).round();
        if !raw.is_finite() {
            return Err(ProtocolError::ValueOutOfRange {
                field: kind.name(),
                value: if raw.is_sign_negative() { i64::MIN } else { i64::MAX },
            });
        }
        Self::try_from_int(kind, raw as i64)
    }

    /// 消息类型
    pub fn kind(&self) -> MessageType {
        self.kind
    }

    /// 负载切片（只包含有效数据）
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// 负载长度
    pub fn size(&self) -> usize {
        self.len as usize
    }

    /// 是否为有效消息
    pub fn is_valid(&self) -> bool {
        self.kind != MessageType::Invalid
    }

    /// 负载按小端无符号整数解释（标量字段使用）
    pub fn raw_value(&self) -> u32 {
        bytes_to_u32_le(self.payload())
    }

    /// 负载按类型定点表换算后的浮点值
    pub fn scaled_value(&self) -> f64 {
        f64::from(self.raw_value()) / self.kind.fixed_point().divisor()
    }

    /// 本消息的校验和
    pub fn checksum(&self) -> u8 {
        checksum(self.kind, self.payload())
    }

    /// 消息主体：`[TYPE_ID] + payload`
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(1 + self.size());
        body.push(self.kind.id());
        body.extend_from_slice(self.payload());
        body
    }

    /// 完整线上帧
    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.size() + MIN_FRAME_LEN);
        frame.push(START_BYTE);
        frame.extend_from_slice(&self.encode());
        frame.push(self.checksum());
        frame
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::INVALID
    }
}

struct HexBytes<'a>(&'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", b)?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("kind", &self.kind)
            .field("payload", &self.payload())
            .finish()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} payload={} frame={}",
            self.kind,
            HexBytes(self.payload()),
            HexBytes(&self.to_frame())
        )
    }
}
