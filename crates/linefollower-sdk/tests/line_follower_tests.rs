//! LineFollower 门面集成测试
//!
//! 通过 mock 串口驱动完整链路：字节流 → 解析 → 状态/遥测 → 事件与日志文件。

use linefollower_sdk::driver::logs::{ENCODER_CSV_FILE, SENSOR_CSV_FILE, TEXT_LOG_FILE};
use linefollower_sdk::prelude::*;
use linefollower_sdk::serial::MockBackend;
use linefollower_sdk::wait_for_event;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn robot(mock: &MockBackend, log_dir: Option<&Path>) -> LineFollower {
    let mut builder = ConnectionManagerBuilder::new().backend(Arc::new(mock.clone()));
    if let Some(dir) = log_dir {
        builder = builder.log_dir(dir);
    }
    LineFollower::from_manager(builder.build().unwrap())
}

fn state_frame(state: RobotState) -> Vec<u8> {
    commands::set_int(MessageType::State, i64::from(u8::from(state))).to_frame()
}

fn telemetry_frame(line: u8, x: i16, y: i16, heading: i16) -> Vec<u8> {
    let mut p = [0u8; 8];
    p[0] = line;
    p[2..4].copy_from_slice(&x.to_le_bytes());
    p[4..6].copy_from_slice(&y.to_le_bytes());
    p[6..8].copy_from_slice(&heading.to_le_bytes());
    Message::new(MessageType::OperationData, &p).to_frame()
}

fn line_count(path: &Path) -> usize {
    std::fs::read_to_string(path).unwrap().lines().count()
}

#[test]
fn test_toggle_run_follows_robot_state() {
    let mock = MockBackend::new(["COM3"]);
    let robot = robot(&mock, None);
    let rx = robot.subscribe();

    // 未连接
    assert!(!robot.toggle_run());
    assert!(robot.connect());

    // 状态未知
    assert!(!robot.toggle_run());
    assert!(mock.written().is_empty());

    mock.inject(&state_frame(RobotState::Idle));
    wait_for_event(&rx, WAIT, |e| matches!(e, RobotEvent::StateChanged(_))).unwrap();
    assert!(robot.toggle_run());
    assert_eq!(mock.written(), commands::start().to_frame());

    mock.clear_written();
    mock.inject(&state_frame(RobotState::Running));
    wait_for_event(&rx, WAIT, |e| {
        matches!(e, RobotEvent::StateChanged(RobotState::Running))
    })
    .unwrap();
    assert!(robot.toggle_run());
    assert_eq!(mock.written(), commands::stop().to_frame());

    mock.clear_written();
    mock.inject(&state_frame(RobotState::Error));
    wait_for_event(&rx, WAIT, |e| {
        matches!(e, RobotEvent::StateChanged(RobotState::Error))
    })
    .unwrap();
    assert!(!robot.toggle_run());
    assert!(mock.written().is_empty());

    robot.disconnect();
}

#[test]
fn test_parameter_snapshot() {
    let mock = MockBackend::new(["COM3"]);
    let robot = robot(&mock, None);
    let rx = robot.subscribe();
    assert!(robot.connect());

    let mut stream = Vec::new();
    stream.extend(parse_command("speed_kp", Some("1.25")).unwrap().to_frame());
    stream.extend(parse_command("stop_mode", Some("laps")).unwrap().to_frame());
    stream.extend(parse_command("laps", Some("3")).unwrap().to_frame());
    mock.inject(&stream);

    wait_for_event(&rx, WAIT, |e| {
        matches!(
            e,
            RobotEvent::AttributeChanged {
                kind: MessageType::Laps,
                ..
            }
        )
    })
    .unwrap();

    let snap = robot.snapshot();
    assert!((snap.speed_kp.unwrap() - 1.25).abs() < 1e-9);
    assert_eq!(snap.stop_mode, Some(StopMode::Laps));
    assert_eq!(snap.laps, 3);
    robot.disconnect();
}

#[test]
fn test_invalid_message_not_sent() {
    let mock = MockBackend::new(["COM3"]);
    let robot = robot(&mock, None);
    assert!(robot.connect());
    robot.send(&Message::INVALID);
    assert!(mock.written().is_empty());
    robot.disconnect();
}

#[test]
fn test_telemetry_dual_rate_logs() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockBackend::new(["COM3"]);
    let robot = robot(&mock, Some(dir.path()));
    let rx = robot.subscribe();
    assert!(robot.connect());

    let mut stream = b"run 1\n".to_vec();
    stream.extend(telemetry_frame(0x01, 10, 20, 15708));
    stream.extend(telemetry_frame(0x02, 10, 20, 15708));
    stream.extend(telemetry_frame(0x04, 11, 20, 15708));
    mock.inject(&stream);

    let mut records = Vec::new();
    while records.len() < 3 {
        if let RobotEvent::Telemetry(rec) =
            wait_for_event(&rx, WAIT, |e| matches!(e, RobotEvent::Telemetry(_))).unwrap()
        {
            records.push(rec);
        }
    }
    assert_eq!(records[0].x, 10);
    assert!((records[0].heading() - 1.5708).abs() < 1e-9);
    assert!(records[0].line.ir1());

    // 表头 + 3 行全速率；表头 + 2 行门控
    assert_eq!(line_count(&dir.path().join(SENSOR_CSV_FILE)), 4);
    assert_eq!(line_count(&dir.path().join(ENCODER_CSV_FILE)), 3);
    assert_eq!(
        std::fs::read_to_string(dir.path().join(TEXT_LOG_FILE)).unwrap(),
        "run 1\n"
    );

    assert_eq!(robot.metrics().telemetry_records, 3);
    robot.disconnect();
}

#[test]
fn test_new_run_resets_telemetry_logs() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockBackend::new(["COM3"]);
    let robot = robot(&mock, Some(dir.path()));
    let rx = robot.subscribe();
    assert!(robot.connect());

    mock.inject(&telemetry_frame(0, 1, 1, 0));
    mock.inject(&state_frame(RobotState::Idle));
    wait_for_event(&rx, WAIT, |e| matches!(e, RobotEvent::StateChanged(_))).unwrap();
    assert_eq!(line_count(&dir.path().join(SENSOR_CSV_FILE)), 2);

    assert!(robot.toggle_run());
    assert_eq!(line_count(&dir.path().join(SENSOR_CSV_FILE)), 1);
    assert_eq!(line_count(&dir.path().join(ENCODER_CSV_FILE)), 1);
    robot.disconnect();
}
