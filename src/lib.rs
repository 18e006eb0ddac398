//! ZakuHead 人脸追踪云台
//!
//! 轮询摄像头+舵机设备, 对每帧做人脸检测, 控制舵机让人脸保持在画面中央,
//! 并根据有无人脸开关LED.
pub mod config; // 命令行与JSON配置
pub mod detection; // 人脸检测
pub mod device; // 设备HTTP接口
pub mod error; // 错误类型
pub mod pipeline; // 轮询主循环
pub mod tracking; // 追踪状态机

pub use crate::config::{AppConfig, Args, DetectorConfig, DeviceConfig, TrackingConfig};
pub use crate::detection::{Detection, FaceDetector, TargetPolicy, UltraFaceDetector};
pub use crate::device::{DeviceControl, FrameSource, PanDirection, ZakuHeadClient};
pub use crate::error::{DetectorError, DeviceError};
pub use crate::pipeline::{Pipeline, SystemControl, TickOutcome};
pub use crate::tracking::{Action, DispatchError, Tick, TrackingController, TrackingState};
