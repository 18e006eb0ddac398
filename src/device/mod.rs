/// 设备控制系统 (Device Control System)
///
/// 摄像头+舵机设备通过HTTP暴露三个接口:
/// - /capture: 抓取一帧JPEG
/// - /led:     LED亮度
/// - /servo:   舵机水平转动, 返回当前角度
pub mod http;

pub use http::ZakuHeadClient;

use crate::error::DeviceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 舵机水平转动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanDirection {
    Left,
    Right,
}

impl PanDirection {
    /// 请求参数中的方向名
    pub fn as_str(&self) -> &'static str {
        match self {
            PanDirection::Left => "left",
            PanDirection::Right => "right",
        }
    }
}

impl fmt::Display for PanDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 设备控制接口 (LED + 舵机)
pub trait DeviceControl {
    /// 设置LED亮度, 0为熄灭
    fn set_led(&mut self, brightness: u8) -> Result<(), DeviceError>;

    /// 转动舵机, 返回设备上报的新角度 (0-180)
    fn move_servo(
        &mut self,
        direction: PanDirection,
        step: u32,
        found: bool,
    ) -> Result<i32, DeviceError>;
}

/// 帧源接口 (返回原始编码字节)
pub trait FrameSource {
    fn capture(&mut self) -> Result<Vec<u8>, DeviceError>;
}
