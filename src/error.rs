//! 错误类型
//! Error taxonomy for the tracking loop
//!
//! - `DetectorError`: 帧无法解码或检测失败 → 跳过本帧,状态不变
//! - `DeviceError`:   LED/舵机/抓图请求失败 → 视为未执行,只保留设备已确认的角度

use thiserror::Error;

/// 检测相关错误 (帧解码 / 模型推理)
#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("frame decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("unexpected model output: {0}")]
    Output(String),
}

impl From<ort::Error> for DetectorError {
    fn from(e: ort::Error) -> Self {
        DetectorError::Inference(e.to_string())
    }
}

/// 设备相关错误 (HTTP 请求 / 响应解析)
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("device returned HTTP {0}")]
    Status(u16),

    #[error("device unreachable: {0}")]
    Transport(String),

    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid device response: {0}")]
    InvalidResponse(String),
}

impl From<ureq::Error> for DeviceError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(code, _) => DeviceError::Status(code),
            ureq::Error::Transport(t) => DeviceError::Transport(t.to_string()),
        }
    }
}
