//! 字节流解析器（StreamParser）
//!
//! 同一条串口流上混合了两种数据：
//! - 以 `0xAA` 开头的二进制帧
//! - 以 `\n` 结尾的自由文本诊断行（单字节字符，latin-1）
//!
//! 解析器是纯数据驱动的状态机：每个字节调用一次 [`StreamParser::feed_byte`]，
//! 不阻塞，不做 I/O。
//!
//! ```text
//!        0xAA           size>0            len==size
//! SYNC ───────▶ ID ─────────────▶ PAYLOAD ──────────▶ CHECKSUM ──▶ SYNC (emit)
//!               │                                      ▲
//!               └───────────── size==0 ────────────────┘
//! ```
//!
//! 未知 ID 按 `INVALID`（负载长度 0）处理，仍会消耗一个校验和字节。
//! 若该 ID 实际属于一个有负载的类型，后续字节会错位，直到流中再次出现 `0xAA`。

use crate::ids::MessageType;
use crate::message::Message;
use crate::{LOG_LINE_TERMINATOR, MAX_PAYLOAD, START_BYTE};

/// 解析器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    /// 等待起始字节；其余字节进入日志行缓冲
    #[default]
    Sync,
    /// 等待类型 ID
    Id,
    /// 累积负载
    Payload,
    /// 等待校验和
    Checksum,
}

/// 解析产物
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedItem {
    /// 完整帧（校验失败时为 `Message::INVALID`）
    Frame(Message),
    /// 完整文本行（不含换行符）
    LogLine(String),
}

/// 解析统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStats {
    /// 输出的有效帧数
    pub frames: u64,
    /// 输出的无效帧数
    pub invalid_frames: u64,
    /// 输出的日志行数
    pub log_lines: u64,
}

/// 字节流状态机
#[derive(Debug, Default)]
pub struct StreamParser {
    state: ParserState,
    kind: MessageType,
    payload: [u8; MAX_PAYLOAD],
    payload_len: usize,
    log_buffer: Vec<u8>,
    stats: ParserStats,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前状态
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// 解析统计
    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    /// 已缓冲但尚未以 `\n` 结束的日志字节数
    pub fn pending_log_len(&self) -> usize {
        self.log_buffer.len()
    }

    /// 回到 SYNC，丢弃部分帧与未完成的日志行，并清零统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 输入一个字节；完成一帧或一行时返回解析产物
    pub fn feed_byte(&mut self, byte: u8) -> Option<ParsedItem> {
        match self.state {
            ParserState::Sync => {
                if byte == START_BYTE {
                    self.state = ParserState::Id;
                    return None;
                }
                if byte == LOG_LINE_TERMINATOR {
                    let line = self.log_buffer.drain(..).map(char::from).collect();
                    self.stats.log_lines += 1;
                    return Some(ParsedItem::LogLine(line));
                }
                self.log_buffer.push(byte);
                None
            },
            ParserState::Id => {
                self.kind = MessageType::from_id(byte);
                self.payload_len = 0;
                self.state = if self.kind.payload_size() == 0 {
                    ParserState::Checksum
                } else {
                    ParserState::Payload
                };
                None
            },
            ParserState::Payload => {
                self.payload[self.payload_len] = byte;
                self.payload_len += 1;
                if self.payload_len == self.kind.payload_size() {
                    self.state = ParserState::Checksum;
                }
                None
            },
            ParserState::Checksum => {
                let msg =
                    Message::from_parts(self.kind, &self.payload[..self.payload_len], byte);
                self.state = ParserState::Sync;
                self.payload_len = 0;
                if msg.is_valid() {
                    self.stats.frames += 1;
                } else {
                    self.stats.invalid_frames += 1;
                }
                Some(ParsedItem::Frame(msg))
            },
        }
    }

    /// 批量输入，每个产物回调一次（按到达顺序）
    pub fn feed<F>(&mut self, bytes: &[u8], mut on_item: F)
    where
        F: FnMut(ParsedItem),
    {
        for &b in bytes {
            if let Some(item) = self.feed_byte(b) {
                on_item(item);
            }
        }
    }

    /// 批量输入并收集所有产物
    pub fn feed_all(&mut self, bytes: &[u8]) -> Vec<ParsedItem> {
        let mut items = Vec::new();
        self.feed(bytes, |item| items.push(item));
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode_frame;

    fn frame(kind: MessageType, payload: &[u8]) -> Vec<u8> {
        encode_frame(kind, payload).unwrap()
    }

    #[test]
    fn test_initial_state_is_sync() {
        let parser = StreamParser::new();
        assert_eq!(parser.state(), ParserState::Sync);
        assert_eq!(parser.stats(), ParserStats::default());
    }

    #[test]
    fn test_state_transitions() {
        let mut parser = StreamParser::new();
        assert!(parser.feed_byte(0xAA).is_none());
        assert_eq!(parser.state(), ParserState::Id);
        assert!(parser.feed_byte(MessageType::PidKd.id()).is_none());
        assert_eq!(parser.state(), ParserState::Payload);
        assert!(parser.feed_byte(0x01).is_none());
        assert_eq!(parser.state(), ParserState::Payload);
        assert!(parser.feed_byte(0x00).is_none());
        assert_eq!(parser.state(), ParserState::Checksum);
        let item = parser.feed_byte(0x0B ^ 0x01);
        assert_eq!(parser.state(), ParserState::Sync);
        match item {
            Some(ParsedItem::Frame(msg)) => {
                assert_eq!(msg.kind(), MessageType::PidKd);
                assert_eq!(msg.raw_value(), 1);
            },
            other => panic!("expected frame, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_payload_skips_to_checksum() {
        let mut parser = StreamParser::new();
        parser.feed_byte(0xAA);
        parser.feed_byte(MessageType::Ping.id());
        assert_eq!(parser.state(), ParserState::Checksum);
        let item = parser.feed_byte(MessageType::Ping.id());
        assert!(matches!(item, Some(ParsedItem::Frame(m)) if m.kind() == MessageType::Ping));
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut bytes = frame(MessageType::State, &[1]);
        bytes.extend(frame(MessageType::PidBasePwm, &[0x2C, 0x01]));

        let items = StreamParser::new().feed_all(&bytes);
        assert_eq!(items.len(), 2);
        match (&items[0], &items[1]) {
            (ParsedItem::Frame(a), ParsedItem::Frame(b)) => {
                assert_eq!(a.kind(), MessageType::State);
                assert_eq!(b.kind(), MessageType::PidBasePwm);
                assert_eq!(b.raw_value(), 300);
            },
            other => panic!("unexpected items {:?}", other),
        }
    }

    #[test]
    fn test_log_line_before_frame() {
        let mut bytes = b"Battery ok\n".to_vec();
        bytes.extend(frame(MessageType::Laps, &[3]));

        let mut parser = StreamParser::new();
        let items = parser.feed_all(&bytes);
        assert_eq!(
            items[0],
            ParsedItem::LogLine("Battery ok".to_string())
        );
        assert!(matches!(items[1], ParsedItem::Frame(m) if m.kind() == MessageType::Laps));
        assert_eq!(items.len(), 2);
        assert_eq!(parser.stats().log_lines, 1);
        assert_eq!(parser.stats().frames, 1);
    }

    #[test]
    fn test_log_line_latin1_decoding() {
        let items = StreamParser::new().feed_all(&[b'T', 0xE9, b'\n']);
        assert_eq!(items, vec![ParsedItem::LogLine("Té".to_string())]);
    }

    #[test]
    fn test_partial_log_line_is_buffered() {
        let mut parser = StreamParser::new();
        assert!(parser.feed_all(b"no newline yet").is_empty());
        assert_eq!(parser.pending_log_len(), 14);
        let items = parser.feed_all(b"!\n");
        assert_eq!(items, vec![ParsedItem::LogLine("no newline yet!".into())]);
        assert_eq!(parser.pending_log_len(), 0);
    }

    #[test]
    fn test_frame_inside_log_line_keeps_buffer() {
        // 帧插入在一行文本中间，文本在换行时整体输出
        let mut bytes = b"abc".to_vec();
        bytes.extend(frame(MessageType::Start, &[]));
        bytes.extend(b"def\n");

        let items = StreamParser::new().feed_all(&bytes);
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], ParsedItem::Frame(m) if m.kind() == MessageType::Start));
        assert_eq!(items[1], ParsedItem::LogLine("abcdef".into()));
    }

    #[test]
    fn test_bad_checksum_emits_invalid_and_returns_to_sync() {
        let mut parser = StreamParser::new();
        let items = parser.feed_all(&[0xAA, MessageType::State.id(), 0x01, 0xFF]);
        assert_eq!(items, vec![ParsedItem::Frame(Message::INVALID)]);
        assert_eq!(parser.state(), ParserState::Sync);
        assert_eq!(parser.stats().invalid_frames, 1);

        // 后续帧正常解析
        let items = parser.feed_all(&frame(MessageType::Stop, &[]));
        assert!(matches!(items[0], ParsedItem::Frame(m) if m.kind() == MessageType::Stop));
    }

    #[test]
    fn test_unknown_id_consumes_one_checksum_byte() {
        let mut parser = StreamParser::new();
        parser.feed_byte(0xAA);
        parser.feed_byte(0xEE);
        assert_eq!(parser.state(), ParserState::Checksum);
        let item = parser.feed_byte(0x00);
        assert_eq!(item, Some(ParsedItem::Frame(Message::INVALID)));
        assert_eq!(parser.state(), ParserState::Sync);
    }

    #[test]
    fn test_reset() {
        let mut parser = StreamParser::new();
        parser.feed_all(b"xx\n");
        parser.feed_byte(0xAA);
        parser.reset();
        assert_eq!(parser.state(), ParserState::Sync);
        assert_eq!(parser.stats(), ParserStats::default());
    }
}
