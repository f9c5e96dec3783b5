#![allow(dead_code)]

use rust_rtsp_auditor::discovery::{DiscoverFuture, Discoverer};
use rust_rtsp_auditor::errors::{DiscoveryError, ProbeError};
use rust_rtsp_auditor::rtsp::{Probe, ProbeFuture};
use rust_rtsp_auditor::stream::Stream;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

type Responder = Box<dyn Fn(&str) -> Result<u16, ProbeError> + Send + Sync>;

// 按URL返回预设结果的探测桩，记录每次探测的URL
pub struct ScriptedProbe {
    responder: Responder,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&str) -> Result<u16, ProbeError> + Send + Sync + 'static,
    {
        Arc::new(ScriptedProbe {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, address: &str) -> Vec<String> {
        let needle = format!("{}:", address);
        self.calls()
            .into_iter()
            .filter(|url| url.contains(&needle))
            .collect()
    }
}

impl Probe for ScriptedProbe {
    fn probe<'a>(&'a self, url: &'a str, _timeout: Duration) -> ProbeFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(url.to_string());
            // 让出执行权，使多个目标的攻击交错进行
            tokio::task::yield_now().await;
            (self.responder)(url)
        })
    }
}

// 返回固定结果的发现桩
pub struct FixedDiscoverer {
    pub streams: Vec<Stream>,
}

impl Discoverer for FixedDiscoverer {
    fn discover<'a>(&'a self, _targets: &'a [String], _ports: &'a str, _speed: u8) -> DiscoverFuture<'a> {
        Box::pin(async move {
            if self.streams.is_empty() {
                return Err(DiscoveryError::NoTargets);
            }
            Ok(self.streams.clone())
        })
    }
}

pub fn stream(address: &str) -> Stream {
    Stream::new(address, 554)
}

// 进程内的假RTSP服务器，收到的每个请求交给handler生成响应；
// handler返回None时保持连接但不应答
pub struct FakeServer {
    pub port: u16,
    pub requests: Arc<Mutex<Vec<String>>>,
}

pub async fn spawn_server<F>(handler: F) -> FakeServer
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let recorded = requests.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let handler = handler.clone();
            let recorded = recorded.clone();
            tokio::spawn(async move {
                let mut buffer = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&buffer).into_owned();
                recorded.lock().unwrap().push(request.clone());

                match handler(&request) {
                    Some(response) => {
                        let _ = socket.write_all(response.as_bytes()).await;
                    }
                    None => tokio::time::sleep(Duration::from_secs(10)).await,
                }
            });
        }
    });

    FakeServer { port, requests }
}

pub fn rtsp_response(status: &str, extra_headers: &[&str]) -> String {
    let mut response = format!("RTSP/1.0 {}\r\nCSeq: 1\r\n", status);
    for header in extra_headers {
        response.push_str(header);
        response.push_str("\r\n");
    }
    response.push_str("\r\n");
    response
}
