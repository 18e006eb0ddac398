//! 配置 - 命令行参数 + JSON配置文件
//!
//! 配置文件不存在时写入默认值, 解析失败时使用默认值; 命令行参数覆盖文件

use crate::detection::TargetPolicy;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// 人脸追踪云台
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "ZakuHead 人脸追踪云台控制", long_about = None)]
pub struct Args {
    /// JSON配置文件路径
    #[arg(short, long, default_value = "zakuhead.json")]
    pub config: String,

    /// 设备地址 (覆盖配置文件), 例: http://192.168.0.29
    #[arg(long)]
    pub host: Option<String>,

    /// 人脸检测ONNX模型 (覆盖配置文件)
    #[arg(short, long)]
    pub model: Option<String>,

    /// 日志级别 (trace/debug/info/warn/error), RUST_LOG 优先
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// 设备参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub host: String,               // 设备地址
    pub capture_timeout_ms: u64,    // 抓图超时
    pub command_timeout_ms: u64,    // LED/舵机命令超时
    pub led_brightness: u8,         // LED点亮亮度 (熄灭为0)
    pub max_frame_bytes: u64,       // 单帧最大字节数
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: "http://192.168.0.29".to_string(),
            capture_timeout_ms: 1000,
            command_timeout_ms: 2000,
            led_brightness: 10,
            max_frame_bytes: 8 * 1024 * 1024,
        }
    }
}

impl DeviceConfig {
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// 检测参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub model: String,
    pub min_confidence: f32, // 人脸置信度阈值
    pub iou_threshold: f32,  // NMS IOU阈值
    pub input_width: u32,
    pub input_height: u32,
    pub input_name: String,
    pub scores_name: String,
    pub boxes_name: String,
    pub intra_threads: usize,
    pub rotate_180: bool, // 摄像头倒装
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model: "models/version-RFB-320.onnx".to_string(),
            min_confidence: 0.6,
            iou_threshold: 0.3,
            input_width: 320,
            input_height: 240,
            input_name: "input".to_string(),
            scores_name: "scores".to_string(),
            boxes_name: "boxes".to_string(),
            intra_threads: 2,
            rotate_180: true,
        }
    }
}

/// 追踪参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    // === 死区 ===
    pub dead_zone_min: f32, // 中心低于此值 → 移动
    pub dead_zone_max: f32, // 中心高于此值 → 移动
    pub split: f32,         // 大于此值向右, 否则向左

    // === 舵机步进 ===
    pub track_step: u32,    // 追踪步进(度)
    pub recovery_step: u32, // 丢失后补偿步进(度)
    pub nudge_step: u32,    // 手动微调步进(度)

    // === 丢失判定 ===
    pub lost_timeout_ms: u64,

    // === 舵机限位保护 (开区间内才允许补偿移动) ===
    pub angle_guard_min: i32,
    pub angle_guard_max: i32,
    pub initial_angle: i32,

    pub target_policy: TargetPolicy,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            dead_zone_min: 0.4,
            dead_zone_max: 0.6,
            split: 0.5,

            track_step: 10,
            recovery_step: 30,
            nudge_step: 15,

            lost_timeout_ms: 2000,

            angle_guard_min: 20,
            angle_guard_max: 160,
            initial_angle: 90,

            target_policy: TargetPolicy::All,
        }
    }
}

impl TrackingConfig {
    pub fn lost_timeout(&self) -> Duration {
        Duration::from_millis(self.lost_timeout_ms)
    }

    /// 中心是否落在死区之外 (边界值不移动)
    pub fn is_off_center(&self, center: f32) -> bool {
        self.dead_zone_min > center || center > self.dead_zone_max
    }

    /// 舵机是否离限位足够远, 可以做补偿移动
    pub fn can_sweep(&self, angle: i32) -> bool {
        self.angle_guard_min < angle && angle < self.angle_guard_max
    }
}

/// 完整配置
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub detector: DetectorConfig,
    pub tracking: TrackingConfig,
}

impl AppConfig {
    /// 从JSON文件加载配置
    pub fn load(path: &str) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => {
                    tracing::info!("✅ 配置已从 {} 加载", path);
                    config
                }
                Err(e) => {
                    tracing::warn!("⚠️  配置文件解析失败: {}, 使用默认值", e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("📝 配置文件不存在,创建默认配置...");
                let config = Self::default();
                config.save(path);
                config
            }
        }
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: &str) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    tracing::error!("❌ 保存配置失败: {}", e);
                } else {
                    tracing::info!("💾 配置已保存到 {}", path);
                }
            }
            Err(e) => tracing::error!("❌ 序列化配置失败: {}", e),
        }
    }

    /// 命令行参数覆盖配置文件
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = &args.host {
            self.device.host = host.trim_end_matches('/').to_string();
        }
        if let Some(model) = &args.model {
            self.detector.model = model.clone();
        }
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        tracing::info!("🎛️  当前配置:");
        tracing::info!("  设备地址: {}", self.device.host);
        tracing::info!("  检测模型: {}", self.detector.model);
        tracing::info!(
            "  死区: [{:.2}, {:.2}]  追踪步进: {}°  补偿步进: {}°",
            self.tracking.dead_zone_min,
            self.tracking.dead_zone_max,
            self.tracking.track_step,
            self.tracking.recovery_step
        );
        tracing::info!(
            "  丢失超时: {}ms  限位: ({}, {})  目标策略: {:?}",
            self.tracking.lost_timeout_ms,
            self.tracking.angle_guard_min,
            self.tracking.angle_guard_max,
            self.tracking.target_policy
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_device_firmware() {
        let config = AppConfig::default();
        assert_eq!(config.device.led_brightness, 10);
        assert_eq!(config.tracking.track_step, 10);
        assert_eq!(config.tracking.recovery_step, 30);
        assert_eq!(config.tracking.lost_timeout(), Duration::from_secs(2));
        assert_eq!(config.tracking.initial_angle, 90);
    }

    #[test]
    fn test_dead_zone_is_strict() {
        let tracking = TrackingConfig::default();
        assert!(!tracking.is_off_center(0.4));
        assert!(!tracking.is_off_center(0.6));
        assert!(!tracking.is_off_center(0.5));
        assert!(tracking.is_off_center(0.39));
        assert!(tracking.is_off_center(0.61));
    }

    #[test]
    fn test_angle_guard_is_open_interval() {
        let tracking = TrackingConfig::default();
        assert!(!tracking.can_sweep(20));
        assert!(!tracking.can_sweep(160));
        assert!(!tracking.can_sweep(15));
        assert!(tracking.can_sweep(21));
        assert!(tracking.can_sweep(90));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "device": { "host": "http://10.0.0.5" }, "tracking": { "target_policy": "widest" } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.device.host, "http://10.0.0.5");
        assert_eq!(config.device.capture_timeout_ms, 1000);
        assert_eq!(config.tracking.target_policy, TargetPolicy::Widest);
        assert_eq!(config.detector, DetectorConfig::default());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let json = r#"{ "device": { "host": "http://10.0.0.7", "bogus": 1 }, "extra": true }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.device.host, "http://10.0.0.7");
        assert_eq!(config.device.led_brightness, 10);
        assert_eq!(config.detector, DetectorConfig::default());
        assert_eq!(config.tracking, TrackingConfig::default());
    }

    #[test]
    fn test_json_round_trip_keeps_custom_values() {
        let mut config = AppConfig::default();
        config.device.host = "http://192.168.5.18".to_string();
        config.device.led_brightness = 40;
        config.detector.min_confidence = 0.75;
        config.detector.rotate_180 = false;
        config.tracking.dead_zone_min = 0.35;
        config.tracking.dead_zone_max = 0.65;
        config.tracking.recovery_step = 25;
        config.tracking.lost_timeout_ms = 3500;
        config.tracking.target_policy = TargetPolicy::Widest;

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
        assert_ne!(parsed, AppConfig::default());
    }

    #[test]
    fn test_load_missing_file_writes_defaults() {
        let path = std::env::temp_dir().join(format!("zakuhead-test-{}.json", std::process::id()));
        let path = path.to_string_lossy().to_string();
        let _ = fs::remove_file(&path);

        let config = AppConfig::load(&path);
        assert_eq!(config, AppConfig::default());

        let reloaded = AppConfig::load(&path);
        assert_eq!(reloaded, config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_args_override_file() {
        let args = Args::parse_from([
            "zakuhead",
            "--host",
            "http://192.168.5.18/",
            "--model",
            "face.onnx",
        ]);
        let mut config = AppConfig::default();
        config.apply_args(&args);
        assert_eq!(config.device.host, "http://192.168.5.18");
        assert_eq!(config.detector.model, "face.onnx");
        assert_eq!(args.config, "zakuhead.json");
    }
}
