/// 人脸检测系统 (Face Detection System)
///
/// - Detection:   归一化人脸框
/// - FaceDetector: 检测器接口 (输入RGB帧,输出人脸框)
/// - UltraFace:   基于ONNX Runtime的轻量级人脸检测实现
pub mod types;
pub mod ultraface;

pub use types::{select_targets, Detection, TargetPolicy};
pub use ultraface::UltraFaceDetector;

use crate::error::DetectorError;
use image::RgbImage;

/// 人脸检测器接口
///
/// 输入已解码、已旋转的RGB帧, 返回0个或多个归一化人脸框
pub trait FaceDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, DetectorError>;
}

impl<T: FaceDetector + ?Sized> FaceDetector for Box<T> {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, DetectorError> {
        (**self).detect(image)
    }
}

/// 非极大值抑制 (按置信度降序, 丢弃与已保留框IoU过大的框)
pub fn non_max_suppression(xs: &mut Vec<Detection>, iou_threshold: f32) {
    xs.sort_by(|b1, b2| b2.confidence().total_cmp(&b1.confidence()));

    let mut current_index = 0;
    for index in 0..xs.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            if xs[prev_index].iou(&xs[index]) > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            xs.swap(current_index, index);
            current_index += 1;
        }
    }
    xs.truncate(current_index);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nms_drops_overlapping() {
        let mut boxes = vec![
            Detection::new(0.10, 0.10, 0.30, 0.30, 0.7),
            Detection::new(0.11, 0.10, 0.30, 0.30, 0.9),
            Detection::new(0.60, 0.50, 0.20, 0.20, 0.8),
        ];
        non_max_suppression(&mut boxes, 0.3);

        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].confidence(), 0.9);
        assert_eq!(boxes[1].confidence(), 0.8);
    }

    #[test]
    fn test_boxed_detector() {
        struct Fixed;
        impl FaceDetector for Fixed {
            fn detect(&mut self, _image: &RgbImage) -> Result<Vec<Detection>, DetectorError> {
                Ok(vec![Detection::new_horizontal(0.5, 0.1)])
            }
        }

        let mut detector: Box<dyn FaceDetector> = Box::new(Fixed);
        let faces = detector.detect(&RgbImage::new(4, 4)).unwrap();
        assert_eq!(faces.len(), 1);
    }
}
