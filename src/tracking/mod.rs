//! 人脸追踪控制器
//! Tracking controller: detections in, LED/servo actions out
//!
//! `tick` 是纯函数: 不做I/O, 输入旧状态和本帧检测结果, 输出新状态和动作序列.
//! 动作由 `dispatch` 转发给设备, 舵机角度以设备上报为准.

pub mod dispatch;

pub use dispatch::{dispatch, DispatchError};

use crate::config::TrackingConfig;
use crate::detection::{select_targets, Detection};
use crate::device::PanDirection;
use std::time::Instant;

/// 追踪状态 (每帧更新)
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingState {
    /// LED当前是否点亮
    pub led_on: bool,

    /// 最近一次检测到人脸的时间
    pub last_face_seen_at: Instant,

    /// 丢失计时器最近一次重置的时间
    pub last_face_lost_reset_at: Instant,

    /// 最近一次移动方向 (未移动过为None)
    pub direction: Option<PanDirection>,

    /// 设备上报的舵机角度
    pub last_angle: i32,
}

impl TrackingState {
    pub fn new(now: Instant, initial_angle: i32) -> Self {
        Self {
            led_on: false,
            last_face_seen_at: now,
            last_face_lost_reset_at: now,
            direction: None,
            last_angle: initial_angle,
        }
    }
}

/// 设备动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    TurnLedOn,
    TurnLedOff,
    Move {
        direction: PanDirection,
        step: u32,
        found: bool,
    },
}

/// 单帧计算结果
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub state: TrackingState,
    pub actions: Vec<Action>,
}

pub struct TrackingController {
    config: TrackingConfig,
}

impl TrackingController {
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// 初始状态 (进程启动时)
    pub fn initial_state(&self, now: Instant) -> TrackingState {
        TrackingState::new(now, self.config.initial_angle)
    }

    /// 处理一帧检测结果
    pub fn tick(&self, state: &TrackingState, detections: &[Detection], now: Instant) -> Tick {
        let mut next = state.clone();
        let mut actions = Vec::new();

        if !detections.is_empty() {
            // Found
            next.last_face_seen_at = now;

            // LED只在熄灭→点亮时发送一次, 每帧发送会拖慢响应
            if !next.led_on {
                actions.push(Action::TurnLedOn);
                next.led_on = true;
            }

            for detection in select_targets(detections, self.config.target_policy) {
                let center = detection.center_x();
                if !self.config.is_off_center(center) {
                    continue;
                }

                let direction = if center > self.config.split {
                    PanDirection::Right
                } else {
                    PanDirection::Left
                };
                next.direction = Some(direction);
                actions.push(Action::Move {
                    direction,
                    step: self.config.track_step,
                    found: true,
                });
            }

            next.last_face_lost_reset_at = now;
        } else if now.saturating_duration_since(next.last_face_lost_reset_at)
            > self.config.lost_timeout()
        {
            // Lost: 每个超时窗口最多触发一次
            next.last_face_lost_reset_at = now;

            if next.led_on {
                actions.push(Action::TurnLedOff);
                next.led_on = false;
            }

            // 沿最后的方向再转一次, 靠近限位时不动
            if self.config.can_sweep(next.last_angle) {
                if let Some(direction) = next.direction {
                    actions.push(Action::Move {
                        direction,
                        step: self.config.recovery_step,
                        found: false,
                    });
                }
            }
        }

        Tick {
            state: next,
            actions,
        }
    }
}
