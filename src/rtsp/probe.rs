use crate::errors::ProbeError;
use crate::rtsp::auth;
use crate::rtsp::common::{build_rtsp_request, read_response, send_request};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time;
use url::{Host, Url};

const DEFAULT_RTSP_PORT: u16 = 554;

pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = Result<u16, ProbeError>> + Send + 'a>>;

/// 协议探测：对一个候选RTSP URL发起一次DESCRIBE，返回状态码
///
/// 任何完成的交互都返回状态码（包括4xx）；只有连接失败、超时或URL无法使用时才返回错误。
/// 探测内部不做重试。
pub trait Probe: Send + Sync {
    fn probe<'a>(&'a self, url: &'a str, timeout: Duration) -> ProbeFuture<'a>;
}

fn decode_userinfo(raw: &str) -> Result<String, ProbeError> {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ProbeError::InvalidUrl(format!("userinfo is not valid UTF-8: {}", e)))
}

// 从URL中拆出的连接参数
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProbeTarget {
    host: String,
    port: u16,
    // 不带userinfo的请求URI
    request_uri: String,
    credentials: Option<(String, String)>,
}

impl ProbeTarget {
    fn parse(url: &str) -> Result<Self, ProbeError> {
        let parsed = Url::parse(url).map_err(|e| ProbeError::InvalidUrl(format!("{}: {}", url, e)))?;
        if parsed.scheme() != "rtsp" {
            return Err(ProbeError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let host = match parsed.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => return Err(ProbeError::InvalidUrl(format!("{}: missing host", url))),
        };
        let port = parsed.port().unwrap_or(DEFAULT_RTSP_PORT);

        let username = decode_userinfo(parsed.username())?;
        let password = match parsed.password() {
            Some(password) => decode_userinfo(password)?,
            None => String::new(),
        };
        let credentials = if username.is_empty() && password.is_empty() {
            None
        } else {
            Some((username, password))
        };

        let mut request_url = parsed.clone();
        // 对带host的rtsp URL，清空userinfo不会失败
        let _ = request_url.set_username("");
        let _ = request_url.set_password(None);

        Ok(ProbeTarget {
            host,
            port,
            request_uri: request_url.to_string(),
            credentials,
        })
    }

    async fn connect(&self) -> Result<TcpStream, ProbeError> {
        log::trace!("Connecting to RTSP server at {}:{}", self.host, self.port);
        TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                ProbeError::Connection(format!(
                    "Failed to connect to {}:{}: {}",
                    self.host, self.port, e
                ))
            })
    }
}

/// 基于TCP的RTSP DESCRIBE探测
///
/// URL带凭据且服务端返回401时，按`WWW-Authenticate`挑战（Basic或Digest）
/// 在新连接上重发一次带认证的DESCRIBE，返回第二次的状态码。
#[derive(Debug, Default, Clone, Copy)]
pub struct RtspProbe;

impl RtspProbe {
    pub fn new() -> Self {
        RtspProbe
    }

    async fn describe(&self, url: &str) -> Result<u16, ProbeError> {
        let target = ProbeTarget::parse(url)?;

        // 第一次请求，无认证头。通过响应确定使用什么认证方式
        let mut stream = target.connect().await?;
        let request = build_rtsp_request("DESCRIBE", &target.request_uri, 1, None);
        send_request(&mut stream, &request).await?;
        let response = read_response(&mut stream).await?;
        log::trace!("DESCRIBE {} -> {} {}", target.request_uri, response.status, response.reason);

        if response.status != 401 {
            return Ok(response.status);
        }

        let Some((username, password)) = &target.credentials else {
            return Ok(response.status);
        };
        let Some(challenge) = auth::parse_auth_challenge(&response)? else {
            return Ok(response.status);
        };

        let auth_header = auth::generate_auth_header(
            &challenge,
            username,
            password,
            "DESCRIBE",
            &target.request_uri,
        );

        // 很多摄像头在401之后会关闭连接，认证请求使用新连接
        drop(stream);
        let mut stream = target.connect().await?;
        let request = build_rtsp_request("DESCRIBE", &target.request_uri, 2, Some(&auth_header));
        send_request(&mut stream, &request).await?;
        let response = read_response(&mut stream).await?;
        log::trace!(
            "Authenticated DESCRIBE {} -> {} {}",
            target.request_uri,
            response.status,
            response.reason
        );

        Ok(response.status)
    }
}

impl Probe for RtspProbe {
    fn probe<'a>(&'a self, url: &'a str, timeout: Duration) -> ProbeFuture<'a> {
        Box::pin(async move {
            match time::timeout(timeout, self.describe(url)).await {
                Ok(result) => result,
                Err(_) => Err(ProbeError::Timeout(timeout)),
            }
        })
    }
}
