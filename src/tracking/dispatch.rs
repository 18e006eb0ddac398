//! 动作下发
//!
//! 按顺序执行动作, 舵机响应的角度写回状态.
//! 任一请求失败立即停止: 调用方回到旧状态, 只保留设备已确认的舵机角度,
//! LED等其余字段不做乐观更新.

use super::{Action, Tick, TrackingState};
use crate::device::DeviceControl;
use crate::error::DeviceError;

/// 下发中途失败
#[derive(Debug)]
pub struct DispatchError {
    /// 旧状态 + 已确认的舵机角度
    pub state: TrackingState,
    pub error: DeviceError,
}

/// 执行一帧的动作, 返回设备确认后的新状态
pub fn dispatch<D: DeviceControl + ?Sized>(
    device: &mut D,
    led_brightness: u8,
    tick: Tick,
    previous: &TrackingState,
) -> Result<TrackingState, DispatchError> {
    let Tick { mut state, actions } = tick;
    let mut confirmed_angle = previous.last_angle;

    for action in actions {
        let result = match action {
            Action::TurnLedOn => device.set_led(led_brightness).map(|()| {
                tracing::debug!("💡 LED On");
            }),
            Action::TurnLedOff => device.set_led(0).map(|()| {
                tracing::debug!("🌑 LED Off");
            }),
            Action::Move {
                direction,
                step,
                found,
            } => device.move_servo(direction, step, found).map(|angle| {
                confirmed_angle = angle;
                state.last_angle = angle;
                tracing::debug!(
                    "↔️  舵机 {} {}° (found={}) → {}°",
                    direction,
                    step,
                    found,
                    angle
                );
            }),
        };

        if let Err(error) = result {
            let mut state = previous.clone();
            state.last_angle = confirmed_angle;
            return Err(DispatchError { state, error });
        }
    }

    Ok(state)
}
