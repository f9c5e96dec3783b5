// 字典模块：路由字典与凭据字典
pub mod credential_iterator;
pub mod credential_reader;

pub use credential_iterator::CredentialIterator;
pub use credential_reader::{CredentialReader, ListSource};

use crate::errors::DictionaryError;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 有序的候选路由列表，按顺序尝试，首个命中者胜出
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routes(Vec<String>);

impl Routes {
    pub fn new(routes: Vec<String>) -> Self {
        Routes(routes)
    }

    /// 从字符串解析路由，每行一个，忽略空行和#注释
    pub fn parse(content: &str) -> Self {
        Routes(credential_reader::read_lines_from_str(content))
    }

    /// 从文件加载路由字典
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DictionaryError> {
        let routes = credential_reader::read_lines_from_file(path)?;
        if routes.is_empty() {
            return Err(DictionaryError::Empty("routes".to_string()));
        }
        Ok(Routes(routes))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Routes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Routes(iter.into_iter().map(Into::into).collect())
    }
}

/// 凭据字典：用户名集合与密码集合（不成对），按笛卡尔积尝试
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub usernames: Vec<String>,
    pub passwords: Vec<String>,
}

impl Credentials {
    pub fn new(usernames: Vec<String>, passwords: Vec<String>) -> Result<Self, DictionaryError> {
        if usernames.is_empty() {
            return Err(DictionaryError::Empty("usernames".to_string()));
        }
        if passwords.is_empty() {
            return Err(DictionaryError::Empty("passwords".to_string()));
        }
        Ok(Credentials {
            usernames,
            passwords,
        })
    }

    /// 解析TOML格式的凭据字典：
    ///
    /// ```toml
    /// usernames = ["admin", "root"]
    /// passwords = ["", "12345"]
    /// ```
    pub fn parse(content: &str) -> Result<Self, DictionaryError> {
        let raw: Credentials = toml::from_str(content)?;
        Credentials::new(raw.usernames, raw.passwords)
    }

    /// 从TOML文件加载凭据字典
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DictionaryError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// 按(外层用户名, 内层密码)的顺序遍历
    pub fn iter(&self) -> CredentialIterator<'_> {
        CredentialIterator::new(&self.usernames, &self.passwords)
    }

    /// 组合总数
    pub fn len(&self) -> usize {
        self.usernames.len() * self.passwords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

lazy_static! {
    /// 内置默认路由字典
    pub static ref DEFAULT_ROUTES: Routes =
        Routes::parse(include_str!("../../dictionaries/routes.txt"));

    /// 内置默认凭据字典
    pub static ref DEFAULT_CREDENTIALS: Credentials =
        Credentials::parse(include_str!("../../dictionaries/credentials.toml")).unwrap_or_else(|e| {
            log::error!("Built-in credentials dictionary is invalid: {}", e);
            Credentials::default()
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dictionaries_are_loaded() {
        assert!(!DEFAULT_ROUTES.is_empty());
        assert_eq!(DEFAULT_ROUTES.iter().next().map(String::as_str), Some("live.sdp"));
        assert!(DEFAULT_CREDENTIALS.usernames.contains(&"admin".to_string()));
        assert!(DEFAULT_CREDENTIALS.passwords.contains(&String::new()));
    }

    #[test]
    fn test_routes_parse_skips_blank_and_comments() {
        let routes = Routes::parse("# header\n/live.sdp\n\n  stream1  \n");
        assert_eq!(routes, Routes::new(vec!["/live.sdp".into(), "stream1".into()]));
    }
}
