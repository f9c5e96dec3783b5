use crate::dictionary::{Credentials, Routes};
use crate::rtsp::Probe;
use crate::stream::Stream;
use log::{debug, trace};
use std::fmt::Display;
use std::time::Duration;

/// 攻击阶段
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AttackPhase {
    Route,
    Credentials,
}

impl Display for AttackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttackPhase::Route => write!(f, "route"),
            AttackPhase::Credentials => write!(f, "credentials"),
        }
    }
}

/// 单个目标一次攻击的结果
///
/// 路由攻击和凭据攻击是两个独立阶段，一个结果只携带其中一个标志。
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttackOutcome {
    Route { stream: Stream, found: bool },
    Credentials { stream: Stream, found: bool },
}

impl AttackOutcome {
    pub fn stream(&self) -> &Stream {
        match self {
            AttackOutcome::Route { stream, .. } | AttackOutcome::Credentials { stream, .. } => stream,
        }
    }

    pub fn into_stream(self) -> Stream {
        match self {
            AttackOutcome::Route { stream, .. } | AttackOutcome::Credentials { stream, .. } => stream,
        }
    }

    pub fn found(&self) -> bool {
        match self {
            AttackOutcome::Route { found, .. } | AttackOutcome::Credentials { found, .. } => *found,
        }
    }

    pub fn phase(&self) -> AttackPhase {
        match self {
            AttackOutcome::Route { .. } => AttackPhase::Route,
            AttackOutcome::Credentials { .. } => AttackPhase::Credentials,
        }
    }
}

/// 路由判定：只有404表示路由不存在；其他任何完成的状态码（含401/403/5xx）都视为路由存在
pub fn route_accepted(status: u16) -> bool {
    status != 404
}

/// 凭据判定：401/403表示凭据错误；其他任何完成的状态码（含404/5xx）都视为凭据有效
pub fn credentials_accepted(status: u16) -> bool {
    status != 401 && status != 403
}

/// 按字典顺序为一个目标尝试路由，首个被接受的路由胜出
///
/// 使用目标当前的用户名和密码（未知时为匿名）。探测错误按该候选失败处理。
pub async fn attack_target_route(
    probe: &dyn Probe,
    target: Stream,
    routes: &Routes,
    timeout: Duration,
) -> AttackOutcome {
    for route in routes.iter() {
        let url = match target.attack_url(&target.username, &target.password, route) {
            Ok(url) => url,
            Err(e) => {
                debug!("Skipping route '{}' for {}: {}", route, target, e);
                continue;
            }
        };

        match probe.probe(&url, timeout).await {
            Ok(status) if route_accepted(status) => {
                debug!("Route '{}' accepted for {} (status {})", route, target, status);
                let mut stream = target;
                stream.route = route.clone();
                stream.route_found = true;
                return AttackOutcome::Route {
                    stream,
                    found: true,
                };
            }
            Ok(status) => trace!("Route '{}' rejected for {} (status {})", route, target, status),
            Err(e) => debug!("Route '{}' probe failed for {}: {}", route, target, e),
        }
    }

    AttackOutcome::Route {
        stream: target,
        found: false,
    }
}

/// 按(外层用户名, 内层密码)的顺序为一个目标尝试凭据，首个被接受的组合胜出
///
/// 使用目标当前已知的路由。探测错误按该候选失败处理。
pub async fn attack_target_credentials(
    probe: &dyn Probe,
    target: Stream,
    credentials: &Credentials,
    timeout: Duration,
) -> AttackOutcome {
    for (username, password) in credentials.iter() {
        let url = match target.attack_url(username, password, &target.route) {
            Ok(url) => url,
            Err(e) => {
                debug!("Skipping credentials '{}' for {}: {}", username, target, e);
                continue;
            }
        };

        match probe.probe(&url, timeout).await {
            Ok(status) if credentials_accepted(status) => {
                debug!(
                    "Credentials '{}:{}' accepted for {} (status {})",
                    username, password, target, status
                );
                let mut stream = target;
                stream.username = username.to_string();
                stream.password = password.to_string();
                stream.credentials_found = true;
                return AttackOutcome::Credentials {
                    stream,
                    found: true,
                };
            }
            Ok(status) => trace!(
                "Credentials '{}:{}' rejected for {} (status {})",
                username, password, target, status
            ),
            Err(e) => debug!(
                "Credentials '{}:{}' probe failed for {}: {}",
                username, password, target, e
            ),
        }
    }

    AttackOutcome::Credentials {
        stream: target,
        found: false,
    }
}
