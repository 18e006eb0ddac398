//! ZakuHead HTTP 客户端
//!
//! 同一个 ureq Agent 负责抓图和控制命令, Clone 后共享连接池

use super::{DeviceControl, FrameSource, PanDirection};
use crate::config::DeviceConfig;
use crate::error::DeviceError;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;

/// 舵机接口响应 `{"angle": 95}`
#[derive(Debug, Deserialize)]
struct ServoResponse {
    angle: Option<i32>,
}

#[derive(Clone)]
pub struct ZakuHeadClient {
    agent: ureq::Agent,
    host: String,
    capture_timeout: Duration,
    command_timeout: Duration,
    max_frame_bytes: u64,
}

impl ZakuHeadClient {
    pub fn new(config: &DeviceConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.command_timeout())
            .build();

        Self {
            agent,
            host: config.host.trim_end_matches('/').to_string(),
            capture_timeout: config.capture_timeout(),
            command_timeout: config.command_timeout(),
            max_frame_bytes: config.max_frame_bytes,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }
}

/// 解析舵机响应中的角度
pub(crate) fn parse_angle(body: &str) -> Result<i32, DeviceError> {
    let response: ServoResponse = serde_json::from_str(body)
        .map_err(|e| DeviceError::InvalidResponse(format!("{}: {}", e, body.trim())))?;
    response
        .angle
        .ok_or_else(|| DeviceError::InvalidResponse(format!("missing angle: {}", body.trim())))
}

impl FrameSource for ZakuHeadClient {
    fn capture(&mut self) -> Result<Vec<u8>, DeviceError> {
        let response = self
            .agent
            .get(&self.url("/capture"))
            .timeout(self.capture_timeout)
            .call()?;

        // 多读一个字节, 用来区分"刚好到上限"和"超出上限"
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(self.max_frame_bytes.saturating_add(1))
            .read_to_end(&mut bytes)?;

        if bytes.len() as u64 > self.max_frame_bytes {
            return Err(DeviceError::InvalidResponse(format!(
                "frame exceeds {} bytes",
                self.max_frame_bytes
            )));
        }
        if bytes.is_empty() {
            return Err(DeviceError::InvalidResponse("empty frame".to_string()));
        }
        Ok(bytes)
    }
}

impl DeviceControl for ZakuHeadClient {
    fn set_led(&mut self, brightness: u8) -> Result<(), DeviceError> {
        self.agent
            .get(&self.url("/led"))
            .timeout(self.command_timeout)
            .query("bright", &brightness.to_string())
            .call()?;
        Ok(())
    }

    fn move_servo(
        &mut self,
        direction: PanDirection,
        step: u32,
        found: bool,
    ) -> Result<i32, DeviceError> {
        let body = self
            .agent
            .get(&self.url("/servo"))
            .timeout(self.command_timeout)
            .query("dir", direction.as_str())
            .query("step", &step.to_string())
            .query("found", if found { "true" } else { "false" })
            .call()?
            .into_string()?;

        parse_angle(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// 本地单次HTTP服务, 返回 (地址, 请求行)
    fn serve_once(status: &str, body: &'static [u8]) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());
        let status = status.to_string();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header == "\r\n" || header.is_empty() {
                    break;
                }
            }

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            )
            .unwrap();
            stream.write_all(body).unwrap();
            stream.flush().unwrap();
            request_line.trim_end().to_string()
        });

        (addr, handle)
    }

    fn client_for(host: &str) -> ZakuHeadClient {
        ZakuHeadClient::new(&DeviceConfig {
            host: host.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_parse_angle() {
        assert_eq!(parse_angle(r#"{"angle": 100}"#).unwrap(), 100);
        assert_eq!(parse_angle(r#"{"angle":15,"dir":"left"}"#).unwrap(), 15);
        assert!(matches!(
            parse_angle(r#"{"status":"ok"}"#),
            Err(DeviceError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_angle("not json"),
            Err(DeviceError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_move_servo_request() {
        let (host, server) = serve_once("200 OK", br#"{"angle": 80}"#);
        let mut client = client_for(&host);

        let angle = client.move_servo(PanDirection::Left, 10, true).unwrap();
        assert_eq!(angle, 80);
        assert_eq!(
            server.join().unwrap(),
            "GET /servo?dir=left&step=10&found=true HTTP/1.1"
        );
    }

    #[test]
    fn test_set_led_request() {
        let (host, server) = serve_once("200 OK", b"ok");
        let mut client = client_for(&host);

        client.set_led(0).unwrap();
        assert_eq!(server.join().unwrap(), "GET /led?bright=0 HTTP/1.1");
    }

    #[test]
    fn test_capture_returns_body() {
        let (host, server) = serve_once("200 OK", b"\xff\xd8jpeg");
        let mut client = client_for(&host);

        assert_eq!(client.capture().unwrap(), b"\xff\xd8jpeg".to_vec());
        assert_eq!(server.join().unwrap(), "GET /capture HTTP/1.1");
    }

    #[test]
    fn test_capture_rejects_oversized_frame() {
        let (host, server) = serve_once("200 OK", b"0123456789");
        let mut client = ZakuHeadClient::new(&DeviceConfig {
            host,
            max_frame_bytes: 8,
            ..Default::default()
        });

        assert!(matches!(
            client.capture(),
            Err(DeviceError::InvalidResponse(_))
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_capture_accepts_frame_at_limit() {
        let (host, server) = serve_once("200 OK", b"01234567");
        let mut client = ZakuHeadClient::new(&DeviceConfig {
            host,
            max_frame_bytes: 8,
            ..Default::default()
        });

        assert_eq!(client.capture().unwrap(), b"01234567".to_vec());
        server.join().unwrap();
    }

    #[test]
    fn test_http_error_status() {
        let (host, server) = serve_once("500 Internal Server Error", b"");
        let mut client = client_for(&host);

        assert!(matches!(
            client.move_servo(PanDirection::Right, 30, false),
            Err(DeviceError::Status(500))
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_trailing_slash_host() {
        let client = client_for("http://192.168.0.29/");
        assert_eq!(client.host(), "http://192.168.0.29");
    }
}
