/// 追踪流水线 (Tracking Pipeline)
///
/// 单线程轮询, 一次循环 = 一帧 = 一个tick:
/// - 抓图:   FrameSource (/capture)
/// - 预处理: JPEG解码 + 旋转
/// - 检测:   FaceDetector
/// - 控制:   TrackingController::tick → dispatch
///
/// 控制消息只在两个tick之间处理, 状态不会被打断在半途
pub mod frame;

pub use frame::decode_frame;

use crate::config::AppConfig;
use crate::detection::FaceDetector;
use crate::device::{DeviceControl, FrameSource, PanDirection};
use crate::error::{DetectorError, DeviceError};
use crate::tracking::{dispatch, Action, TrackingController, TrackingState};
use crossbeam_channel::{Receiver, TryRecvError};
use std::ops::ControlFlow;
use std::time::{Duration, Instant};

// ========== 控制消息 ==========

/// 系统控制 (宿主 → 流水线)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SystemControl {
    Pause,
    Resume,
    Shutdown,
    /// 手动微调舵机
    Nudge(PanDirection),
    /// 强制LED开关 (不论当前状态都发送)
    Led(bool),
}

/// 单帧处理结果
#[derive(Debug)]
pub enum TickOutcome {
    /// 抓图失败, 跳过本帧
    CaptureFailed(DeviceError),
    /// 解码或检测失败, 跳过本帧
    DetectFailed(DetectorError),
    /// 动作下发失败, 状态不变 (仅保留设备已确认的舵机角度)
    DispatchFailed(DeviceError),
    /// 正常完成
    Applied { faces: usize, actions: Vec<Action> },
}

// ========== 帧率统计 ==========

struct LoopStats {
    count: u64,
    last: Instant,
    current_fps: f64,
}

impl LoopStats {
    fn new() -> Self {
        Self {
            count: 0,
            last: Instant::now(),
            current_fps: 0.0,
        }
    }

    fn record(&mut self) {
        self.count += 1;
        let elapsed = self.last.elapsed();
        if elapsed >= Duration::from_secs(5) {
            self.current_fps = self.count as f64 / elapsed.as_secs_f64();
            self.count = 0;
            self.last = Instant::now();
            tracing::debug!("📊 处理帧率: {:.1} fps", self.current_fps);
        }
    }
}

// ========== 流水线 ==========

pub struct Pipeline<S, D, F> {
    source: S,
    device: D,
    detector: F,
    controller: TrackingController,
    state: TrackingState,
    led_brightness: u8,
    rotate_180: bool,
    paused: bool,
    stats: LoopStats,
}

impl<S, D, F> Pipeline<S, D, F>
where
    S: FrameSource,
    D: DeviceControl,
    F: FaceDetector,
{
    pub fn new(config: &AppConfig, source: S, device: D, detector: F) -> Self {
        let controller = TrackingController::new(config.tracking.clone());
        let state = controller.initial_state(Instant::now());

        Self {
            source,
            device,
            detector,
            controller,
            state,
            led_brightness: config.device.led_brightness,
            rotate_180: config.detector.rotate_180,
            paused: false,
            stats: LoopStats::new(),
        }
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// 处理一帧
    pub fn step(&mut self, now: Instant) -> TickOutcome {
        let bytes = match self.source.capture() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("⚠️ 抓图失败: {}", e);
                return TickOutcome::CaptureFailed(e);
            }
        };

        let detections = match decode_frame(&bytes, self.rotate_180)
            .and_then(|image| self.detector.detect(&image))
        {
            Ok(detections) => detections,
            Err(e) => {
                tracing::warn!("⚠️ 人脸检测失败: {}", e);
                return TickOutcome::DetectFailed(e);
            }
        };

        let tick = self.controller.tick(&self.state, &detections, now);
        let actions = tick.actions.clone();

        match dispatch(&mut self.device, self.led_brightness, tick, &self.state) {
            Ok(state) => {
                if !actions.is_empty() {
                    tracing::debug!(
                        "🎯 人脸 {} 个, 动作 {:?}, 角度 {}°",
                        detections.len(),
                        actions,
                        state.last_angle
                    );
                }
                self.state = state;
                self.stats.record();
                TickOutcome::Applied {
                    faces: detections.len(),
                    actions,
                }
            }
            Err(failed) => {
                tracing::error!(
                    "❌ 设备命令失败: {} (舵机角度 {}°)",
                    failed.error,
                    failed.state.last_angle
                );
                // 只保留设备已确认的角度
                self.state = failed.state;
                TickOutcome::DispatchFailed(failed.error)
            }
        }
    }

    /// 处理控制消息, Break 表示退出循环
    pub fn handle_control(&mut self, msg: SystemControl) -> ControlFlow<()> {
        match msg {
            SystemControl::Shutdown => {
                tracing::info!("🛑 收到退出指令");
                return ControlFlow::Break(());
            }
            SystemControl::Pause => {
                tracing::info!("⏸️  追踪暂停");
                self.paused = true;
            }
            SystemControl::Resume => {
                tracing::info!("▶️  追踪恢复");
                self.paused = false;
            }
            SystemControl::Nudge(direction) => {
                let step = self.controller.config().nudge_step;
                match self.device.move_servo(direction, step, false) {
                    Ok(angle) => {
                        self.state.direction = Some(direction);
                        self.state.last_angle = angle;
                        tracing::info!("🕹️  手动 {} {}° → {}°", direction, step, angle);
                    }
                    Err(e) => tracing::error!("❌ 手动转动失败: {}", e),
                }
            }
            SystemControl::Led(on) => {
                let brightness = if on { self.led_brightness } else { 0 };
                match self.device.set_led(brightness) {
                    Ok(()) => {
                        self.state.led_on = on;
                        tracing::info!("💡 LED 强制{}", if on { "点亮" } else { "熄灭" });
                    }
                    Err(e) => tracing::error!("❌ LED命令失败: {}", e),
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// 主循环, 直到收到 Shutdown 或控制通道关闭
    pub fn run(&mut self, control: &Receiver<SystemControl>) {
        tracing::info!("🚀 追踪循环启动");

        loop {
            // 两个tick之间处理全部待处理消息, 暂停时阻塞等待
            loop {
                let msg = if self.paused {
                    control.recv().map_err(|_| TryRecvError::Disconnected)
                } else {
                    control.try_recv()
                };

                match msg {
                    Ok(msg) => {
                        if self.handle_control(msg).is_break() {
                            return;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        tracing::info!("📴 控制通道已关闭, 退出循环");
                        return;
                    }
                }
            }

            self.step(Instant::now());
        }
    }
}
