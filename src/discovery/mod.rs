// 目标发现：把目标表达式展开为可攻击的RTSP端点
pub mod ip_port_parser;

use crate::errors::DiscoveryError;
use crate::rtsp::common::{build_rtsp_request, read_response, send_request};
use crate::stream::Stream;
use futures::stream::{self as futures_stream, StreamExt};
use log::{debug, info, trace};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time;

pub use ip_port_parser::{parse_ip_port, parse_ports, IpPort, ParseError};

/// 速度等级，与nmap的T0-T5对应
pub const PARANOIAC: u8 = 0;
pub const SNEAKY: u8 = 1;
pub const POLITE: u8 = 2;
pub const NORMAL: u8 = 3;
pub const AGGRESSIVE: u8 = 4;
pub const INSANE: u8 = 5;

pub const DEFAULT_PORTS: &str = "554,5554,8554";

pub type DiscoverFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Stream>, DiscoveryError>> + Send + 'a>>;

/// 发现能力：给出目标表达式、默认端口和速度，返回路由/凭据为空的候选流
pub trait Discoverer: Send + Sync {
    fn discover<'a>(&'a self, targets: &'a [String], ports: &'a str, speed: u8) -> DiscoverFuture<'a>;
}

/// 速度等级对应的(并发数, 连接超时)
pub fn speed_profile(speed: u8) -> (usize, Duration) {
    match speed.min(INSANE) {
        PARANOIAC => (1, Duration::from_millis(5000)),
        SNEAKY => (4, Duration::from_millis(3000)),
        POLITE => (16, Duration::from_millis(2000)),
        NORMAL => (64, Duration::from_millis(1000)),
        AGGRESSIVE => (256, Duration::from_millis(500)),
        _ => (1024, Duration::from_millis(250)),
    }
}

/// 展开目标表达式为去重后的(主机, 端口)列表，保持首次出现的顺序
///
/// 表达式自带端口时使用自带端口，否则使用默认端口；不是IP模式的表达式按主机名处理。
pub fn expand_targets(targets: &[String], ports: &str) -> Result<Vec<(String, u16)>, DiscoveryError> {
    let default_ports =
        parse_ports(ports).map_err(|e| DiscoveryError::InvalidTarget(format!("{}: {}", ports, e)))?;

    let mut seen = HashSet::new();
    let mut endpoints = Vec::new();
    let mut push = |host: String, port: u16| {
        if seen.insert((host.clone(), port)) {
            endpoints.push((host, port));
        }
    };

    for target in targets.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        match parse_ip_port(target) {
            Ok(ip_ports) => {
                for IpPort { ip, ports } in ip_ports {
                    let ports = if ports.is_empty() { &default_ports } else { &ports };
                    for port in ports {
                        push(ip.to_string(), *port);
                    }
                }
            }
            Err(parse_err) => {
                // 不是IP模式，尝试作为主机名处理
                let (host, port_part) = target.split_once(':').unwrap_or((target, ""));
                let ports = if port_part.is_empty() {
                    default_ports.clone()
                } else {
                    parse_ports(port_part).map_err(|e| {
                        DiscoveryError::InvalidTarget(format!("{}: {}", target, e))
                    })?
                };
                if Stream::new(host, 1).validate().is_err() {
                    return Err(DiscoveryError::InvalidTarget(format!(
                        "{}: {}",
                        target, parse_err
                    )));
                }
                for port in ports {
                    push(host.to_string(), port);
                }
            }
        }
    }

    Ok(endpoints)
}

/// 基于TCP连接和RTSP OPTIONS的简单发现
///
/// 只保留能连通并返回RTSP响应的端点，响应中的`Server`头记为设备信息。
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpDiscoverer;

impl TcpDiscoverer {
    pub fn new() -> Self {
        TcpDiscoverer
    }

    // 连接端点并发送OPTIONS；不是RTSP服务时返回None
    async fn check_endpoint(host: String, port: u16, connect_timeout: Duration) -> Option<Stream> {
        let exchange = async {
            let mut stream = TcpStream::connect((host.as_str(), port)).await.ok()?;
            let url = Stream::new(&host, port).attack_url("", "", "").ok()?;
            let request = build_rtsp_request("OPTIONS", &url, 1, None);
            send_request(&mut stream, &request).await.ok()?;
            read_response(&mut stream).await.ok()
        };

        // 连接和应答各给一个超时时间
        match time::timeout(connect_timeout * 2, exchange).await {
            Ok(Some(response)) => {
                let device = response
                    .headers_named("Server")
                    .next()
                    .unwrap_or_default()
                    .to_string();
                debug!("RTSP service found at {}:{} ({})", host, port, device);
                Some(Stream::new(&host, port).with_device(&device).with_service("rtsp"))
            }
            _ => {
                trace!("No RTSP service at {}:{}", host, port);
                None
            }
        }
    }
}

impl Discoverer for TcpDiscoverer {
    fn discover<'a>(&'a self, targets: &'a [String], ports: &'a str, speed: u8) -> DiscoverFuture<'a> {
        Box::pin(async move {
            let endpoints = expand_targets(targets, ports)?;
            if endpoints.is_empty() {
                return Err(DiscoveryError::NoTargets);
            }

            let (concurrency, connect_timeout) = speed_profile(speed);
            info!(
                "Discovering {} endpoints (concurrency {}, timeout {:?})",
                endpoints.len(),
                concurrency,
                connect_timeout
            );

            let streams: Vec<Stream> = futures_stream::iter(endpoints)
                .map(|(host, port)| Self::check_endpoint(host, port, connect_timeout))
                .buffered(concurrency)
                .filter_map(|stream| async move { stream })
                .collect()
                .await;

            info!("Discovered {} RTSP streams", streams.len());
            Ok(streams)
        })
    }
}
