use crate::errors::ProbeError;
use chrono::Utc;
use rand::Rng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

// 响应头的最大长度，超过即视为非RTSP服务
const MAX_HEADER_BYTES: usize = 16 * 1024;

// 随机User-Agent列表
const USER_AGENTS: &[&str] = &[
    "LibVLC/3.0.18 (LIVE555 Streaming Media v2016.11.28)",
    "LibVLC/3.0.20 (LIVE555 Streaming Media v2022.10.01)",
    "Lavf58.76.100",
    "Lavf60.16.100",
    "GStreamer/1.22.0",
];

// 随机选择一个User-Agent
pub fn select_random_user_agent() -> &'static str {
    let user_agent = {
        let mut rng = rand::thread_rng();
        USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())]
    };
    log::trace!("Selected User-Agent: {}", user_agent);
    user_agent
}

// 构建RTSP请求（只有头部，没有消息体）
pub fn build_rtsp_request(method: &str, url: &str, cseq: u32, auth_header: Option<&str>) -> String {
    let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT");
    let mut request = format!("{} {} RTSP/1.0\r\n", method, url);
    request.push_str(&format!("CSeq: {}\r\n", cseq));
    request.push_str(&format!("Date: {}\r\n", date));
    request.push_str(&format!("User-Agent: {}\r\n", select_random_user_agent()));
    request.push_str("Accept: application/sdp\r\n");

    if let Some(auth) = auth_header {
        request.push_str(&format!("Authorization: {}\r\n", auth));
    }

    request.push_str("\r\n");
    request
}

// 解析后的RTSP响应，只保留状态行和头部
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtspResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
}

impl RtspResponse {
    // 解析响应头部文本
    pub fn parse(raw: &str) -> Result<Self, ProbeError> {
        let mut lines = raw.lines();
        let status_line = lines
            .next()
            .ok_or_else(|| ProbeError::Protocol("Empty response".to_string()))?;

        let mut parts = status_line.splitn(3, ' ');
        let version = parts.next().unwrap_or_default();
        if !version.starts_with("RTSP/") {
            return Err(ProbeError::Protocol(format!(
                "Unexpected status line: {}",
                status_line
            )));
        }
        let status = parts
            .next()
            .and_then(|code| code.trim().parse::<u16>().ok())
            .ok_or_else(|| ProbeError::Protocol(format!("Missing status code: {}", status_line)))?;
        let reason = parts.next().unwrap_or_default().trim().to_string();

        let headers = lines
            .take_while(|line| !line.is_empty())
            .filter_map(|line| {
                let (name, value) = line.split_once(':')?;
                Some((name.trim().to_string(), value.trim().to_string()))
            })
            .collect();

        Ok(RtspResponse {
            status,
            reason,
            headers,
        })
    }

    // 按名称查找所有头部（不区分大小写）
    pub fn headers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

// 发送RTSP请求
pub async fn send_request(stream: &mut TcpStream, request: &str) -> Result<(), ProbeError> {
    log::trace!("Sending RTSP request:\n{}", request.replace("\r\n", "\n"));
    stream.write_all(request.as_bytes()).await?;
    Ok(())
}

// 读取RTSP响应头部，不读取消息体
pub async fn read_response(stream: &mut TcpStream) -> Result<RtspResponse, ProbeError> {
    let mut buffer = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if find_header_end(&buffer).is_some() {
            break;
        }
        if buffer.len() > MAX_HEADER_BYTES {
            return Err(ProbeError::Protocol(format!(
                "Response header exceeds {} bytes",
                MAX_HEADER_BYTES
            )));
        }
    }

    if buffer.is_empty() {
        log::debug!("Received empty response (0 bytes) - server closed connection");
        return Err(ProbeError::Protocol(
            "Empty response received from server".to_string(),
        ));
    }

    let end = find_header_end(&buffer).unwrap_or(buffer.len());
    let header = String::from_utf8_lossy(&buffer[..end]);
    log::trace!("Received response ({} bytes):\n{}", buffer.len(), header.replace("\r\n", "\n"));
    RtspResponse::parse(&header)
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_line_and_headers() {
        let raw = "RTSP/1.0 401 Unauthorized\r\nCSeq: 1\r\nWWW-Authenticate: Basic realm=\"cam\"\r\n\r\n";
        let response = RtspResponse::parse(raw).unwrap();
        assert_eq!(response.status, 401);
        assert_eq!(response.reason, "Unauthorized");
        assert_eq!(
            response.headers_named("www-authenticate").collect::<Vec<_>>(),
            vec!["Basic realm=\"cam\""]
        );
    }

    #[test]
    fn test_parse_rejects_non_rtsp() {
        assert!(RtspResponse::parse("HTTP/1.1 200 OK\r\n\r\n").is_err());
        assert!(RtspResponse::parse("RTSP/1.0 abc\r\n\r\n").is_err());
    }

    #[test]
    fn test_build_request_has_no_body() {
        let request = build_rtsp_request("DESCRIBE", "rtsp://10.0.0.1:554/live", 2, Some("Basic YTpi"));
        assert!(request.starts_with("DESCRIBE rtsp://10.0.0.1:554/live RTSP/1.0\r\nCSeq: 2\r\n"));
        assert!(request.contains("Authorization: Basic YTpi\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }
}
