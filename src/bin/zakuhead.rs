/// ZakuHead 人脸追踪云台
///
/// 主线程: 抓图 → 人脸检测 → 追踪控制 (单线程轮询)
/// 键盘线程: 读取stdin命令, 通过channel发送控制消息
///
/// 直接运行: cargo run --bin zakuhead --release -- --host http://192.168.0.29
use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{unbounded, Sender};
use std::io::BufRead;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zakuhead_rs::{
    AppConfig, Args, PanDirection, Pipeline, SystemControl, UltraFaceDetector, ZakuHeadClient,
};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let mut config = AppConfig::load(&args.config);
    config.apply_args(&args);
    config.print_summary();

    let client = ZakuHeadClient::new(&config.device);
    let detector = UltraFaceDetector::new(&config.detector)?;
    tracing::info!("✅ 人脸模型加载成功: {}", config.detector.model);
    tracing::info!("📹 设备地址: {}", client.host());
    tracing::info!("⌨️  命令: q 退出 | p 暂停 | r 恢复 | a/d 左/右微调 | l/o LED开/关");

    // 主线程持有发送端, stdin关闭后循环照常运行
    let (tx, rx) = unbounded::<SystemControl>();
    spawn_keyboard(tx.clone());

    let mut pipeline = Pipeline::new(&config, client.clone(), client, detector);
    pipeline.run(&rx);

    drop(tx);
    tracing::info!("👋 已退出");
    Ok(())
}

fn init_logging(log_level: &str) -> Result<()> {
    let level: tracing::Level = log_level
        .parse()
        .with_context(|| format!("invalid log level: {}", log_level))?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(level).into())
                .from_env_lossy(),
        )
        .init();
    Ok(())
}

fn spawn_keyboard(tx: Sender<SystemControl>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(msg) => {
                    if tx.send(msg).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => tracing::warn!("⚠️ 未知命令: {}", line.trim()),
            }
        }
    });
}

fn parse_command(line: &str) -> Option<SystemControl> {
    match line.trim() {
        "q" | "quit" | "exit" => Some(SystemControl::Shutdown),
        "p" | "pause" => Some(SystemControl::Pause),
        "r" | "resume" => Some(SystemControl::Resume),
        "a" | "left" => Some(SystemControl::Nudge(PanDirection::Left)),
        "d" | "right" => Some(SystemControl::Nudge(PanDirection::Right)),
        "l" | "on" => Some(SystemControl::Led(true)),
        "o" | "off" => Some(SystemControl::Led(false)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("q\n"), Some(SystemControl::Shutdown));
        assert_eq!(
            parse_command(" d "),
            Some(SystemControl::Nudge(PanDirection::Right))
        );
        assert_eq!(parse_command("off"), Some(SystemControl::Led(false)));
        assert_eq!(parse_command("x"), None);
        assert_eq!(parse_command(""), None);
    }
}
