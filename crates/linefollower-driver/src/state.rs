//! 状态存储（StateStore）
//!
//! 维护机器人配置与状态的最新快照 [`RobotStateRecord`]，并对重复值去重。
//!
//! # 同步机制
//!
//! 快照存放在 `ArcSwap` 中：读线程构造新快照后整体替换，
//! 任意线程通过 [`StateStore::snapshot`] 无锁读取。只有读线程写入，
//! 因此不需要比较交换。
//!
//! # 分发
//!
//! [`RobotStateRecord::apply`] 对封闭的 `MessageType` 做 `match`，
//! 每个字段一个分支。未处理的类型（PING、START、OPERATION_DATA 等）返回 `None`。

use crate::events::{EventBus, RobotEvent};
use arc_swap::ArcSwap;
use linefollower_protocol::{Message, MessageType, RobotState, RunningMode, StopMode};
use std::sync::Arc;
use tracing::debug;

/// 机器人状态快照
///
/// 未收到过的增益类字段为 `None`；计数类字段默认 0。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotStateRecord {
    pub state: Option<RobotState>,
    pub running_mode: Option<RunningMode>,
    pub stop_mode: Option<StopMode>,
    pub laps: u32,
    pub stop_time: u32,
    pub stop_distance: u32,
    pub log_data: bool,

    // === 线路 PID ===
    pub pid_kp: Option<u32>,
    pub pid_ki: Option<u32>,
    pub pid_kd: Option<u32>,
    pub pid_kb: Option<u32>,
    pub pid_kff: Option<u32>,
    pub pid_accel: Option<u32>,
    pub pid_alpha: Option<f64>,
    pub pid_clamp: Option<u32>,
    pub base_pwm: Option<u32>,
    pub max_pwm: Option<u32>,
    pub turbine_pwm: u32,

    // === 速度环 ===
    pub speed_kp: Option<f64>,
    pub speed_ki: Option<f64>,
    pub speed_kd: Option<f64>,
    pub speed_kff: Option<f64>,
    pub base_speed: Option<u32>,

    // === 纯追踪 / 里程计 ===
    pub lookahead: Option<u32>,
    pub wheel_base_correction: Option<f64>,
    pub imu_alpha: Option<f64>,
}

/// 新旧值不同时写入，返回是否变化
fn update<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn scaled(kind: MessageType, raw: u32) -> f64 {
    f64::from(raw) / kind.fixed_point().divisor()
}

impl RobotStateRecord {
    /// 应用一个原始值
    ///
    /// 返回 `None` 表示该类型没有对应字段；`Some(changed)` 表示是否发生变化。
    pub fn apply(&mut self, kind: MessageType, raw: u32) -> Option<bool> {
        use MessageType as M;
        let changed = match kind {
            M::State => update(&mut self.state, Some(RobotState::from_raw(raw))),
            M::RunningMode => update(&mut self.running_mode, Some(RunningMode::from_raw(raw))),
            M::StopMode => update(&mut self.stop_mode, Some(StopMode::from_raw(raw))),
            M::Laps => update(&mut self.laps, raw),
            M::StopTime => update(&mut self.stop_time, raw),
            M::StopDistance => update(&mut self.stop_distance, raw),
            M::LogData => update(&mut self.log_data, raw == 1),
            M::PidKp => update(&mut self.pid_kp, Some(raw)),
            M::PidKi => update(&mut self.pid_ki, Some(raw)),
            M::PidKd => update(&mut self.pid_kd, Some(raw)),
            M::PidKb => update(&mut self.pid_kb, Some(raw)),
            M::PidKff => update(&mut self.pid_kff, Some(raw)),
            M::PidAccel => update(&mut self.pid_accel, Some(raw)),
            M::PidAlpha => update(&mut self.pid_alpha, Some(scaled(kind, raw))),
            M::PidClamp => update(&mut self.pid_clamp, Some(raw)),
            M::PidBasePwm => update(&mut self.base_pwm, Some(raw)),
            M::PidMaxPwm => update(&mut self.max_pwm, Some(raw)),
            M::TurbinePwm => update(&mut self.turbine_pwm, raw),
            M::SpeedKp => update(&mut self.speed_kp, Some(scaled(kind, raw))),
            M::SpeedKi => update(&mut self.speed_ki, Some(scaled(kind, raw))),
            M::SpeedKd => update(&mut self.speed_kd, Some(scaled(kind, raw))),
            M::SpeedKff => update(&mut self.speed_kff, Some(scaled(kind, raw))),
            M::BaseSpeed => update(&mut self.base_speed, Some(raw)),
            M::Lookahead => update(&mut self.lookahead, Some(raw)),
            M::WheelBaseCorrection => {
                update(&mut self.wheel_base_correction, Some(scaled(kind, raw)))
            },
            M::ImuAlpha => update(&mut self.imu_alpha, Some(scaled(kind, raw))),
            M::Invalid | M::Start | M::Stop | M::Ping | M::OperationData => return None,
        };
        Some(changed)
    }

    /// 机器人是否处于运行中
    pub fn is_running(&self) -> bool {
        self.state == Some(RobotState::Running)
    }
}

/// 状态存储
///
/// 显式构造、通过 `Arc` 共享，生命周期与连接管理器一致。
#[derive(Debug)]
pub struct StateStore {
    record: ArcSwap<RobotStateRecord>,
    events: Arc<EventBus>,
}

impl StateStore {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            record: ArcSwap::from_pointee(RobotStateRecord::default()),
            events,
        }
    }

    /// 当前快照
    pub fn snapshot(&self) -> Arc<RobotStateRecord> {
        self.record.load_full()
    }

    /// 当前机器人状态
    pub fn robot_state(&self) -> Option<RobotState> {
        self.record.load().state
    }

    /// 处理一个帧，返回字段是否变化
    ///
    /// - 无对应字段的帧被忽略（返回 `false`）
    /// - 值变化时替换快照并发出 `AttributeChanged { kind, raw }`
    /// - STATE 帧无论是否变化都发出 `StateChanged`
    pub fn on_frame(&self, msg: &Message) -> bool {
        let kind = msg.kind();
        let raw = msg.raw_value();

        let mut next = RobotStateRecord::clone(&self.record.load());
        let Some(changed) = next.apply(kind, raw) else {
            return false;
        };

        if changed {
            self.record.store(Arc::new(next));
        }

        if kind == MessageType::State {
            self.events
                .publish(RobotEvent::StateChanged(RobotState::from_raw(raw)));
        }

        if changed {
            debug!("{} changed to {}", kind, raw);
            self.events.publish(RobotEvent::AttributeChanged { kind, raw });
        }

        changed
    }
}
