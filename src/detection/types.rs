//! 人脸检测数据结构
//! Data structures for face detection results

use serde::{Deserialize, Serialize};

/// 人脸框 (归一化坐标, 0..1)
///
/// 追踪只关心水平范围 (`xmin`, `width`), 其余字段用于NMS和日志
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Detection {
    xmin: f32,
    ymin: f32,
    width: f32,
    height: f32,
    confidence: f32,
}

impl Detection {
    pub fn new(xmin: f32, ymin: f32, width: f32, height: f32, confidence: f32) -> Self {
        Self {
            xmin,
            ymin,
            width,
            height,
            confidence,
        }
    }

    /// 只有水平范围的检测框 (测试和手动注入用)
    pub fn new_horizontal(xmin: f32, width: f32) -> Self {
        Self {
            xmin,
            width,
            ..Default::default()
        }
    }

    /// 从左上/右下角点构造
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32) -> Self {
        Self::new(x1, y1, (x2 - x1).max(0.), (y2 - y1).max(0.), confidence)
    }

    pub fn xmin(&self) -> f32 {
        self.xmin
    }

    pub fn ymin(&self) -> f32 {
        self.ymin
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn xmax(&self) -> f32 {
        self.xmin + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.ymin + self.height
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// 水平中心 (归一化)
    pub fn center_x(&self) -> f32 {
        self.xmin + self.width / 2.
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn intersection_area(&self, another: &Detection) -> f32 {
        let l = self.xmin.max(another.xmin);
        let r = self.xmax().min(another.xmax());
        let t = self.ymin.max(another.ymin);
        let b = self.ymax().min(another.ymax());
        (r - l).max(0.) * (b - t).max(0.)
    }

    pub fn iou(&self, another: &Detection) -> f32 {
        let union = self.area() + another.area() - self.intersection_area(another);
        if union <= 0. {
            return 0.;
        }
        self.intersection_area(another) / union
    }

    /// 裁剪到图像范围 [0, 1]
    pub fn clamped(&self) -> Self {
        let x1 = self.xmin.clamp(0., 1.);
        let y1 = self.ymin.clamp(0., 1.);
        let x2 = self.xmax().clamp(0., 1.);
        let y2 = self.ymax().clamp(0., 1.);
        Self::from_corners(x1, y1, x2, y2, self.confidence)
    }
}

/// 追踪目标选择策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPolicy {
    /// 逐个处理所有人脸 (最后一个决定方向)
    #[default]
    All,
    /// 只追踪最宽 (最近) 的人脸
    Widest,
}

/// 按策略挑选驱动舵机的人脸
pub fn select_targets(detections: &[Detection], policy: TargetPolicy) -> Vec<Detection> {
    match policy {
        TargetPolicy::All => detections.to_vec(),
        TargetPolicy::Widest => {
            let mut widest: Option<&Detection> = None;
            for det in detections {
                // 宽度相同时保留先出现的
                if widest.map_or(true, |w| det.width() > w.width()) {
                    widest = Some(det);
                }
            }
            widest.into_iter().copied().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_x() {
        let det = Detection::new_horizontal(0.2, 0.4);
        assert!((det.center_x() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_iou() {
        let a = Detection::new(0.0, 0.0, 0.5, 0.5, 0.9);
        let b = Detection::new(0.25, 0.0, 0.5, 0.5, 0.8);
        // 交集 0.125, 并集 0.375
        assert!((a.iou(&b) - 1. / 3.).abs() < 1e-5);

        let far = Detection::new(0.8, 0.8, 0.1, 0.1, 0.8);
        assert_eq!(a.iou(&far), 0.);
    }

    #[test]
    fn test_clamped() {
        let det = Detection::from_corners(-0.1, 0.2, 1.2, 0.6, 0.7).clamped();
        assert_eq!(det.xmin(), 0.);
        assert!((det.xmax() - 1.).abs() < 1e-6);
        assert!((det.height() - 0.4).abs() < 1e-6);
        assert_eq!(det.confidence(), 0.7);
    }

    #[test]
    fn test_select_all_keeps_order() {
        let faces = vec![
            Detection::new_horizontal(0.1, 0.1),
            Detection::new_horizontal(0.7, 0.2),
        ];
        assert_eq!(select_targets(&faces, TargetPolicy::All), faces);
    }

    #[test]
    fn test_select_widest() {
        let faces = vec![
            Detection::new_horizontal(0.1, 0.1),
            Detection::new_horizontal(0.7, 0.2),
            Detection::new_horizontal(0.4, 0.2),
        ];
        let picked = select_targets(&faces, TargetPolicy::Widest);
        assert_eq!(picked, vec![faces[1]]);
        assert!(select_targets(&[], TargetPolicy::Widest).is_empty());
    }
}
