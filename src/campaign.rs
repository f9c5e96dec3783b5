use crate::attack::{AttackConfig, AttackOrchestrator};
use crate::dictionary::{Credentials, Routes, DEFAULT_CREDENTIALS, DEFAULT_ROUTES};
use crate::discovery::{Discoverer, TcpDiscoverer, DEFAULT_PORTS};
use crate::errors::{CampaignError, CampaignErrorKind, CampaignStage, ConfigError};
use crate::stream::Stream;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub use crate::discovery::{AGGRESSIVE, INSANE, NORMAL, PARANOIAC, POLITE, SNEAKY};

/// 一次完整扫描所需的全部选项
#[derive(Clone, Debug)]
pub struct CampaignOptions {
    pub targets: Vec<String>,
    pub ports: String,
    pub output_file: Option<PathBuf>,
    pub routes: Arc<Routes>,
    pub credentials: Arc<Credentials>,
    pub speed: u8,
    pub timeout: Duration,
}

impl Default for CampaignOptions {
    fn default() -> Self {
        CampaignOptions {
            targets: vec![],
            ports: DEFAULT_PORTS.to_string(),
            output_file: None,
            routes: Arc::new(DEFAULT_ROUTES.clone()),
            credentials: Arc::new(DEFAULT_CREDENTIALS.clone()),
            speed: AGGRESSIVE,
            timeout: Duration::from_millis(2000),
        }
    }
}

impl CampaignOptions {
    /// 取出本次编排调用使用的配置快照
    pub fn attack_config(&self) -> AttackConfig {
        AttackConfig::new(self.timeout)
    }
}

/// 战役状态
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CampaignState {
    Idle,
    Discovered,
    RoutesAttacked,
    CredentialsAttacked,
    Done,
}

/// 战役 - 依次执行发现、路由攻击和凭据攻击
///
/// 所有阶段都以`&mut self`执行，选项在阶段之间可以修改，但阶段进行中无法修改。
pub struct Campaign {
    streams: Vec<Stream>,
    options: CampaignOptions,
    state: CampaignState,
    orchestrator: AttackOrchestrator,
    discoverer: Arc<dyn Discoverer>,
}

impl Campaign {
    pub fn new(options: CampaignOptions) -> Self {
        Self::with_parts(
            options,
            AttackOrchestrator::default(),
            Arc::new(TcpDiscoverer::new()),
        )
    }

    pub fn with_parts(
        options: CampaignOptions,
        orchestrator: AttackOrchestrator,
        discoverer: Arc<dyn Discoverer>,
    ) -> Self {
        Campaign {
            streams: vec![],
            options,
            state: CampaignState::Idle,
            orchestrator,
            discoverer,
        }
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn state(&self) -> CampaignState {
        self.state
    }

    pub fn options(&self) -> &CampaignOptions {
        &self.options
    }

    /// 直接设置目标列表，跳过发现阶段
    pub fn set_streams(&mut self, streams: Vec<Stream>) {
        self.streams = streams;
        self.state = CampaignState::Discovered;
    }

    fn fail(&self, stage: CampaignStage, kind: CampaignErrorKind) -> CampaignError {
        let err = CampaignError {
            stage,
            kind,
            streams: self.streams.clone(),
        };
        error!("Campaign aborted: {}", err);
        err
    }

    /// 发现候选流
    pub async fn discover(&mut self) -> Result<Vec<Stream>, CampaignError> {
        let streams = self
            .discoverer
            .discover(&self.options.targets, &self.options.ports, self.options.speed)
            .await
            .map_err(|e| self.fail(CampaignStage::Discovery, CampaignErrorKind::Discovery(e)))?;

        info!("Discovery found {} streams", streams.len());
        self.streams = streams;
        self.state = CampaignState::Discovered;
        Ok(self.streams.clone())
    }

    /// 使用当前选项对已知目标执行路由攻击
    pub async fn attack_route(&mut self) -> Result<Vec<Stream>, CampaignError> {
        let streams = self
            .orchestrator
            .attack_route(
                self.streams.clone(),
                self.options.routes.clone(),
                self.options.attack_config(),
            )
            .await
            .map_err(|e| self.fail(CampaignStage::RouteAttack, CampaignErrorKind::Attack(e)))?;

        self.streams = streams;
        self.state = CampaignState::RoutesAttacked;
        Ok(self.streams.clone())
    }

    /// 使用当前选项对已知目标执行凭据攻击
    pub async fn attack_credentials(&mut self) -> Result<Vec<Stream>, CampaignError> {
        let streams = self
            .orchestrator
            .attack_credentials(
                self.streams.clone(),
                self.options.credentials.clone(),
                self.options.attack_config(),
            )
            .await
            .map_err(|e| {
                self.fail(CampaignStage::CredentialAttack, CampaignErrorKind::Attack(e))
            })?;

        self.streams = streams;
        self.state = CampaignState::CredentialsAttacked;
        Ok(self.streams.clone())
    }

    /// 对已有目标执行路由攻击和凭据攻击；仍有目标缺少路由时，凭据攻击只重跑一次
    pub async fn attack(&mut self) -> Result<Vec<Stream>, CampaignError> {
        self.attack_route().await?;
        let streams = self.attack_credentials().await?;

        let streams = if streams.iter().any(|stream| !stream.route_found) {
            info!("Some streams still lack a route, retrying credential attack once");
            self.attack_credentials().await?
        } else {
            streams
        };

        self.state = CampaignState::Done;
        Ok(streams)
    }

    /// 发现并攻击：discover → 路由攻击 → 凭据攻击 → (必要时)凭据攻击
    pub async fn discover_and_attack(&mut self) -> Result<Vec<Stream>, CampaignError> {
        self.discover().await?;
        self.attack().await
    }

    /// 整体替换选项
    pub fn set_options(&mut self, options: CampaignOptions) {
        self.options = options;
    }

    pub fn set_targets(&mut self, targets: Vec<String>) {
        self.options.targets = targets;
    }

    pub fn set_ports(&mut self, ports: &str) {
        self.options.ports = ports.to_string();
    }

    pub fn set_output_file(&mut self, path: PathBuf) {
        self.options.output_file = Some(path);
    }

    /// 用换行分隔的字符串覆盖路由字典
    pub fn set_routes(&mut self, routes: &str) {
        self.options.routes = Arc::new(Routes::parse(routes));
    }

    /// 用TOML字符串覆盖凭据字典
    pub fn set_credentials(&mut self, credentials: &str) -> Result<(), ConfigError> {
        self.options.credentials = Arc::new(Credentials::parse(credentials)?);
        Ok(())
    }

    pub fn set_speed(&mut self, speed: i64) -> Result<(), ConfigError> {
        self.options.speed = validate_speed(speed)?;
        Ok(())
    }

    /// 设置超时（毫秒）
    pub fn set_timeout(&mut self, timeout: i64) -> Result<(), ConfigError> {
        self.options.timeout = validate_timeout(timeout)?;
        Ok(())
    }
}

/// 速度必须在 PARANOIAC..=INSANE 之间
pub fn validate_speed(speed: i64) -> Result<u8, ConfigError> {
    if speed < i64::from(PARANOIAC) || speed > i64::from(INSANE) {
        return Err(ConfigError::InvalidSpeed(speed));
    }
    Ok(speed as u8)
}

/// 超时以毫秒给出，不能为负
pub fn validate_timeout(timeout: i64) -> Result<Duration, ConfigError> {
    if timeout < 0 {
        return Err(ConfigError::InvalidTimeout(timeout));
    }
    Ok(Duration::from_millis(timeout as u64))
}
