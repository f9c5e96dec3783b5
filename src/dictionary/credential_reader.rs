use crate::dictionary::Credentials;
use crate::errors::DictionaryError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// 辅助函数：从文件读取非空行，忽略以#开头的注释
pub(crate) fn read_lines_from_file<P: AsRef<Path>>(file_path: P) -> Result<Vec<String>, DictionaryError> {
    let file = File::open(file_path)?;
    let reader = BufReader::new(file);
    let mut lines = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if let Some(value) = clean_line(&line) {
            lines.push(value);
        }
    }

    Ok(lines)
}

// 辅助函数：从字符串读取非空行
pub(crate) fn read_lines_from_str(content: &str) -> Vec<String> {
    content.lines().filter_map(clean_line).collect()
}

// 单独一行 `""` 表示空字符串（空口令、空用户名或根路由）
pub const EMPTY_ENTRY: &str = "\"\"";

fn clean_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed == EMPTY_ENTRY {
        Some(String::new())
    } else if trimmed.is_empty() || trimmed.starts_with('#') {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// 用户名/密码的数据源：文件路径或字面字符串（每行一个）
#[derive(Clone, Debug)]
pub enum ListSource {
    FilePath(String),
    Literal(String),
}

impl ListSource {
    pub fn read(&self) -> Result<Vec<String>, DictionaryError> {
        match self {
            ListSource::FilePath(file_path) => read_lines_from_file(file_path),
            ListSource::Literal(content) => Ok(read_lines_from_str(content)),
        }
    }
}

// 凭据读取器 - 用户名和密码分别来自文件或字符串
#[derive(Clone, Debug)]
pub struct CredentialReader {
    usernames: ListSource,
    passwords: ListSource,
}

impl CredentialReader {
    pub fn new(usernames: ListSource, passwords: ListSource) -> Self {
        CredentialReader {
            usernames,
            passwords,
        }
    }

    // 从文件路径创建凭据读取器
    pub fn from_files(users_file: &str, passwords_file: &str) -> Self {
        Self::new(
            ListSource::FilePath(users_file.to_string()),
            ListSource::FilePath(passwords_file.to_string()),
        )
    }

    // 从字符串创建凭据读取器
    pub fn from_strings(usernames: &str, passwords: &str) -> Self {
        Self::new(
            ListSource::Literal(usernames.to_string()),
            ListSource::Literal(passwords.to_string()),
        )
    }

    // 读取两个列表并生成凭据字典
    pub fn into_credentials(&self) -> Result<Credentials, DictionaryError> {
        let usernames = self.usernames.read()?;
        let passwords = self.passwords.read()?;
        log::debug!(
            "Loaded {} usernames and {} passwords",
            usernames.len(),
            passwords.len()
        );
        Credentials::new(usernames, passwords)
    }
}
