use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::time::Duration;

use crate::stream::Stream;

// 单次探测错误。只在单目标攻击器内部处理，不会继续向上传播
#[derive(Debug)]
pub enum ProbeError {
    // URL无法解析，相当于客户端初始化失败
    InvalidUrl(String),
    // 连接错误
    Connection(String),
    // 整个交互在超时时间内未完成
    Timeout(Duration),
    Io(io::Error),
    // 响应不是合法的RTSP报文
    Protocol(String),
    // 无法应答服务端的认证挑战
    Authentication(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::InvalidUrl(e) => write!(f, "Invalid RTSP URL: {}", e),
            ProbeError::Connection(e) => write!(f, "Connection error: {}", e),
            ProbeError::Timeout(d) => write!(f, "Probe timed out after {:?}", d),
            ProbeError::Io(e) => write!(f, "IO error: {}", e),
            ProbeError::Protocol(e) => write!(f, "Protocol error: {}", e),
            ProbeError::Authentication(e) => write!(f, "Authentication error: {}", e),
        }
    }
}

impl StdError for ProbeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ProbeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ProbeError {
    fn from(error: io::Error) -> Self {
        ProbeError::Io(error)
    }
}

// 目标结构校验失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTargetError {
    pub address: String,
    pub port: u16,
    pub reason: String,
}

impl fmt::Display for InvalidTargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid target '{}:{}': {}",
            self.address, self.port, self.reason
        )
    }
}

impl StdError for InvalidTargetError {}

// 攻击编排错误
#[derive(Debug)]
pub enum AttackError {
    // 任一目标校验失败，整个调用不会启动任何攻击
    InvalidStreams(InvalidTargetError),
    // 结果通道在收齐之前被关闭
    ChannelClosed { received: usize, expected: usize },
    // 攻击任务异常退出
    Worker(String),
}

impl fmt::Display for AttackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackError::InvalidStreams(e) => write!(f, "invalid streams: {}", e),
            AttackError::ChannelClosed { received, expected } => write!(
                f,
                "result channel closed after {} of {} outcomes",
                received, expected
            ),
            AttackError::Worker(e) => write!(f, "attack worker failed: {}", e),
        }
    }
}

impl StdError for AttackError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AttackError::InvalidStreams(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InvalidTargetError> for AttackError {
    fn from(error: InvalidTargetError) -> Self {
        AttackError::InvalidStreams(error)
    }
}

// 字典加载错误
#[derive(Debug)]
pub enum DictionaryError {
    Io(io::Error),
    Parse(String),
    Empty(String),
}

impl fmt::Display for DictionaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictionaryError::Io(e) => write!(f, "IO error: {}", e),
            DictionaryError::Parse(e) => write!(f, "could not decode dictionary: {}", e),
            DictionaryError::Empty(what) => write!(f, "dictionary has no {}", what),
        }
    }
}

impl StdError for DictionaryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DictionaryError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DictionaryError {
    fn from(error: io::Error) -> Self {
        DictionaryError::Io(error)
    }
}

impl From<toml::de::Error> for DictionaryError {
    fn from(error: toml::de::Error) -> Self {
        DictionaryError::Parse(error.to_string())
    }
}

// 发现阶段错误
#[derive(Debug)]
pub enum DiscoveryError {
    InvalidTarget(String),
    Io(io::Error),
    NoTargets,
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::InvalidTarget(e) => write!(f, "Invalid target expression: {}", e),
            DiscoveryError::Io(e) => write!(f, "IO error: {}", e),
            DiscoveryError::NoTargets => write!(f, "no targets to discover"),
        }
    }
}

impl StdError for DiscoveryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DiscoveryError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DiscoveryError {
    fn from(error: io::Error) -> Self {
        DiscoveryError::Io(error)
    }
}

// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    InvalidSpeed(i64),
    InvalidTimeout(i64),
    Dictionary(DictionaryError),
    Io(io::Error),
    Parse(String),
    InvalidArgument(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSpeed(speed) => write!(
                f,
                "invalid speed value '{}'. should be between '{}' and '{}'",
                speed,
                crate::campaign::PARANOIAC,
                crate::campaign::INSANE
            ),
            ConfigError::InvalidTimeout(timeout) => write!(
                f,
                "invalid timeout value '{}'. should be superior to 0",
                timeout
            ),
            ConfigError::Dictionary(e) => write!(f, "Dictionary error: {}", e),
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Config parse error: {}", e),
            ConfigError::InvalidArgument(e) => write!(f, "Invalid argument: {}", e),
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Dictionary(e) => Some(e),
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DictionaryError> for ConfigError {
    fn from(error: DictionaryError) -> Self {
        ConfigError::Dictionary(error)
    }
}

impl From<io::Error> for ConfigError {
    fn from(error: io::Error) -> Self {
        ConfigError::Io(error)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::Parse(error.to_string())
    }
}

// 战役阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignStage {
    Discovery,
    RouteAttack,
    CredentialAttack,
}

impl fmt::Display for CampaignStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CampaignStage::Discovery => write!(f, "discovery"),
            CampaignStage::RouteAttack => write!(f, "route attack"),
            CampaignStage::CredentialAttack => write!(f, "credential attack"),
        }
    }
}

#[derive(Debug)]
pub enum CampaignErrorKind {
    Discovery(DiscoveryError),
    Attack(AttackError),
}

/// 战役中止时的错误，附带到目前为止最好的目标列表快照
#[derive(Debug)]
pub struct CampaignError {
    pub stage: CampaignStage,
    pub kind: CampaignErrorKind,
    pub streams: Vec<Stream>,
}

impl fmt::Display for CampaignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CampaignErrorKind::Discovery(e) => {
                write!(f, "could not discover streams: {}", e)
            }
            CampaignErrorKind::Attack(e) => write!(f, "{} failed: {}", self.stage, e),
        }
    }
}

impl StdError for CampaignError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            CampaignErrorKind::Discovery(e) => Some(e),
            CampaignErrorKind::Attack(e) => Some(e),
        }
    }
}
