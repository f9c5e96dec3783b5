use crate::campaign::{validate_speed, validate_timeout, CampaignOptions};
use crate::dictionary::{
    CredentialReader, Credentials, ListSource, Routes, DEFAULT_CREDENTIALS, DEFAULT_ROUTES,
};
use crate::errors::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 从配置文件中读取的配置内容，所有字段都可省略
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// 目标表达式，空白分隔 (与targets_file二选一)
    pub targets: Option<String>,
    /// 每行一个目标表达式的文件
    pub targets_file: Option<String>,
    /// 默认端口，如 "554,8554"
    pub ports: Option<String>,
    /// 路由字典文件 (与routes_string二选一)
    pub routes_file: Option<String>,
    /// 换行分隔的路由字符串
    pub routes_string: Option<String>,
    /// TOML格式的凭据字典文件
    pub credentials_file: Option<String>,
    /// 用户名文件 (与users_string二选一)
    pub users_file: Option<String>,
    pub users_string: Option<String>,
    /// 密码文件 (与passwords_string二选一)
    pub passwords_file: Option<String>,
    pub passwords_string: Option<String>,
    /// 单次探测超时（毫秒）
    pub timeout_ms: Option<i64>,
    /// 速度等级 0-5
    pub speed: Option<i64>,
    /// 结果输出文件
    pub output: Option<String>,
}

fn pick_one(
    what: &str,
    file: Option<String>,
    literal: Option<String>,
) -> Result<Option<ListSource>, ConfigError> {
    match (file, literal) {
        (Some(_), Some(_)) => Err(ConfigError::InvalidArgument(format!(
            "{what}_file and {what}_string are mutually exclusive"
        ))),
        (Some(file), None) => Ok(Some(ListSource::FilePath(file))),
        (None, Some(literal)) => Ok(Some(ListSource::Literal(literal))),
        (None, None) => Ok(None),
    }
}

impl AppConfig {
    /// 从配置文件中加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// 加载配置文件；文件不存在或无效时使用默认值
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                log::debug!(
                    "Failed to load config file {}: {}, using default values",
                    path.as_ref().display(),
                    e
                );
                AppConfig::default()
            }
        }
    }

    /// 合并两份配置，`other` 中已设置的字段优先
    pub fn merge(self, other: AppConfig) -> Self {
        AppConfig {
            targets: other.targets.or(self.targets),
            targets_file: other.targets_file.or(self.targets_file),
            ports: other.ports.or(self.ports),
            routes_file: other.routes_file.or(self.routes_file),
            routes_string: other.routes_string.or(self.routes_string),
            credentials_file: other.credentials_file.or(self.credentials_file),
            users_file: other.users_file.or(self.users_file),
            users_string: other.users_string.or(self.users_string),
            passwords_file: other.passwords_file.or(self.passwords_file),
            passwords_string: other.passwords_string.or(self.passwords_string),
            timeout_ms: other.timeout_ms.or(self.timeout_ms),
            speed: other.speed.or(self.speed),
            output: other.output.or(self.output),
        }
    }

    fn targets(&self) -> Result<Vec<String>, ConfigError> {
        let targets = match (&self.targets, &self.targets_file) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidArgument(
                    "targets and targets_file are mutually exclusive".to_string(),
                ));
            }
            (Some(targets), None) => targets.split_whitespace().map(str::to_string).collect(),
            (None, Some(file)) => std::fs::read_to_string(file)?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect(),
            (None, None) => vec![],
        };

        if targets.is_empty() {
            return Err(ConfigError::InvalidArgument(
                "Either targets or targets_file must be provided".to_string(),
            ));
        }
        Ok(targets)
    }

    fn routes(&self) -> Result<Routes, ConfigError> {
        match pick_one("routes", self.routes_file.clone(), self.routes_string.clone())? {
            Some(ListSource::FilePath(file)) => Ok(Routes::load(file)?),
            Some(ListSource::Literal(routes)) => Ok(Routes::parse(&routes)),
            None => Ok(DEFAULT_ROUTES.clone()),
        }
    }

    // 用户名/密码列表优先；只给出一侧时另一侧用内置字典补齐
    fn credentials(&self) -> Result<Credentials, ConfigError> {
        let users = pick_one("users", self.users_file.clone(), self.users_string.clone())?;
        let passwords = pick_one(
            "passwords",
            self.passwords_file.clone(),
            self.passwords_string.clone(),
        )?;

        if users.is_none() && passwords.is_none() {
            return match &self.credentials_file {
                Some(file) => Ok(Credentials::load(file)?),
                None => Ok(DEFAULT_CREDENTIALS.clone()),
            };
        }
        if self.credentials_file.is_some() {
            return Err(ConfigError::InvalidArgument(
                "credentials_file cannot be combined with users or passwords".to_string(),
            ));
        }

        match (users, passwords) {
            (Some(users), Some(passwords)) => {
                Ok(CredentialReader::new(users, passwords).into_credentials()?)
            }
            (users, passwords) => {
                let usernames = match users {
                    Some(source) => source.read()?,
                    None => DEFAULT_CREDENTIALS.usernames.clone(),
                };
                let passwords = match passwords {
                    Some(source) => source.read()?,
                    None => DEFAULT_CREDENTIALS.passwords.clone(),
                };
                Ok(Credentials::new(usernames, passwords)?)
            }
        }
    }

    /// 解析为战役选项
    pub fn into_options(self) -> Result<CampaignOptions, ConfigError> {
        let defaults = CampaignOptions::default();
        let options = CampaignOptions {
            targets: self.targets()?,
            ports: self.ports.clone().unwrap_or(defaults.ports),
            output_file: self.output.as_ref().map(PathBuf::from),
            routes: Arc::new(self.routes()?),
            credentials: Arc::new(self.credentials()?),
            speed: match self.speed {
                Some(speed) => validate_speed(speed)?,
                None => defaults.speed,
            },
            timeout: match self.timeout_ms {
                Some(timeout) => validate_timeout(timeout)?,
                None => defaults.timeout,
            },
        };

        log::debug!(
            "Campaign options: {} targets, ports {}, {} routes, {} credential pairs, speed {}, timeout {:?}",
            options.targets.len(),
            options.ports,
            options.routes.len(),
            options.credentials.len(),
            options.speed,
            options.timeout
        );
        Ok(options)
    }
}
