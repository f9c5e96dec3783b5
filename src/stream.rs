use crate::errors::{InvalidTargetError, ProbeError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::net::IpAddr;
use url::Url;

/// 一个待审计的摄像头RTSP端点
///
/// 地址和端口在发现阶段确定后不再改变；攻击只会改写路由或凭据字段，
/// 并且只在对应的标志位从false变为true时改写。
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Stream {
    pub address: String,
    pub port: u16,
    /// 发现阶段识别到的设备信息
    #[serde(default)]
    pub device: String,
    /// 发现阶段识别到的协议/服务名
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub route_found: bool,
    #[serde(default)]
    pub credentials_found: bool,
}

impl Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.address, self.port)?;
        if self.route_found {
            write!(f, " route=/{}", self.route.trim_start_matches('/'))?;
        }
        if self.credentials_found {
            write!(f, " credentials={}:{}", self.username, self.password)?;
        }
        Ok(())
    }
}

impl Stream {
    pub fn new(address: &str, port: u16) -> Self {
        Stream {
            address: address.to_string(),
            port,
            ..Default::default()
        }
    }

    pub fn with_device(mut self, device: &str) -> Self {
        self.device = device.to_string();
        self
    }

    pub fn with_service(mut self, service: &str) -> Self {
        self.service = service.to_string();
        self
    }

    /// 目标身份：(地址, 端口)
    pub fn identity(&self) -> (&str, u16) {
        (self.address.as_str(), self.port)
    }

    /// 用给定的用户名、密码和路由构建探测URL
    ///
    /// 用户名和密码都为空时不带userinfo；路由开头的`/`会被去掉，
    /// 查询串原样保留（很多摄像头路由形如`cam/realmonitor?channel=1`）。
    pub fn attack_url(
        &self,
        username: &str,
        password: &str,
        route: &str,
    ) -> Result<String, ProbeError> {
        let host = match self.address.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => format!("[{}]", ip),
            _ => self.address.clone(),
        };
        let raw = format!(
            "rtsp://{}:{}/{}",
            host,
            self.port,
            route.trim_start_matches('/')
        );
        let mut url =
            Url::parse(&raw).map_err(|e| ProbeError::InvalidUrl(format!("{}: {}", raw, e)))?;

        if !username.is_empty() || !password.is_empty() {
            // url不会转义'%'，先整体编码，探测端再解码
            url.set_username(&urlencoding::encode(username))
                .map_err(|_| ProbeError::InvalidUrl(format!("cannot set username on {}", raw)))?;
            url.set_password(Some(&urlencoding::encode(password)))
                .map_err(|_| ProbeError::InvalidUrl(format!("cannot set password on {}", raw)))?;
        }

        Ok(url.to_string())
    }

    /// 使用当前已知的用户名、密码和路由构建URL
    pub fn current_url(&self) -> Result<String, ProbeError> {
        self.attack_url(&self.username, &self.password, &self.route)
    }

    /// 结构校验：地址非空且是IP或合法主机名，端口非0
    pub fn validate(&self) -> Result<(), InvalidTargetError> {
        let invalid = |reason: &str| InvalidTargetError {
            address: self.address.clone(),
            port: self.port,
            reason: reason.to_string(),
        };

        let address = self.address.trim();
        if address.is_empty() {
            return Err(invalid("address is required"));
        }
        if address.len() != self.address.len() {
            return Err(invalid("address contains surrounding whitespace"));
        }
        if address.parse::<IpAddr>().is_err() && !is_hostname(address) {
            return Err(invalid("address is neither an IP address nor a hostname"));
        }
        if self.port == 0 {
            return Err(invalid("port is required"));
        }

        Ok(())
    }
}

fn is_hostname(address: &str) -> bool {
    address.len() <= 253
        && address.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

/// 校验整个目标列表：每个目标结构合法，且(地址, 端口)不重复
pub fn validate_targets(targets: &[Stream]) -> Result<(), InvalidTargetError> {
    let mut seen = HashSet::new();
    for target in targets {
        target.validate()?;
        if !seen.insert(target.identity()) {
            return Err(InvalidTargetError {
                address: target.address.clone(),
                port: target.port,
                reason: "duplicate target in list".to_string(),
            });
        }
    }
    Ok(())
}
