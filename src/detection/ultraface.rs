//! UltraFace 人脸检测 (ONNX Runtime)
//!
//! 模型: Ultra-Light-Fast-Generic-Face-Detector `version-RFB-320.onnx`
//! - 输入:  [1, 3, 240, 320]  RGB, (p - 127) / 128
//! - 输出:  scores [1, N, 2] (背景, 人脸), boxes [1, N, 4] 归一化 (x1, y1, x2, y2)

use super::{non_max_suppression, Detection, FaceDetector};
use crate::config::DetectorConfig;
use crate::error::DetectorError;
use anyhow::{Context, Result};
use image::{imageops, RgbImage};
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;

const MEAN: f32 = 127.0;
const SCALE: f32 = 128.0;

pub struct UltraFaceDetector {
    session: Session,
    input_name: String,
    scores_name: String,
    boxes_name: String,
    width: u32,
    height: u32,
    min_confidence: f32,
    iou_threshold: f32,
}

impl UltraFaceDetector {
    /// 加载ONNX模型
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let session = Session::builder()
            .context("failed to create ORT session builder")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("failed to set ORT optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("failed to set ORT intra threads")?
            .commit_from_file(&config.model)
            .with_context(|| format!("failed to load face model {}", config.model))?;

        Ok(Self {
            session,
            input_name: config.input_name.clone(),
            scores_name: config.scores_name.clone(),
            boxes_name: config.boxes_name.clone(),
            width: config.input_width,
            height: config.input_height,
            min_confidence: config.min_confidence,
            iou_threshold: config.iou_threshold,
        })
    }

    /// 预处理: 缩放到模型尺寸 → NCHW 张量
    fn preprocess(&self, image: &RgbImage) -> Array4<f32> {
        let resized = imageops::resize(
            image,
            self.width,
            self.height,
            imageops::FilterType::Triangle,
        );

        let mut input = Array4::<f32>::zeros((1, 3, self.height as usize, self.width as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                input[[0, c, y, x]] = (pixel[c] as f32 - MEAN) / SCALE;
            }
        }
        input
    }
}

/// 后处理: 置信度过滤 → NMS
///
/// `scores` 每个候选框2个值, `boxes` 每个候选框4个值
pub fn decode_candidates(
    scores: &[f32],
    boxes: &[f32],
    min_confidence: f32,
    iou_threshold: f32,
) -> Result<Vec<Detection>, DetectorError> {
    let candidates = scores.len() / 2;
    if scores.len() % 2 != 0 || boxes.len() != candidates * 4 {
        return Err(DetectorError::Output(format!(
            "scores ({}) and boxes ({}) disagree",
            scores.len(),
            boxes.len()
        )));
    }

    let mut faces = Vec::new();
    for i in 0..candidates {
        let confidence = scores[i * 2 + 1];
        if confidence < min_confidence {
            continue;
        }
        let b = &boxes[i * 4..i * 4 + 4];
        faces.push(Detection::from_corners(b[0], b[1], b[2], b[3], confidence).clamped());
    }

    non_max_suppression(&mut faces, iou_threshold);
    Ok(faces)
}

impl FaceDetector for UltraFaceDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, DetectorError> {
        let input = Tensor::from_array(self.preprocess(image))?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])?;

        let (_shape, scores) = outputs[self.scores_name.as_str()].try_extract_tensor::<f32>()?;
        let (_shape, boxes) = outputs[self.boxes_name.as_str()].try_extract_tensor::<f32>()?;

        decode_candidates(scores, boxes, self.min_confidence, self.iou_threshold)
    }
}
