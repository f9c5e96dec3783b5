use rust_rtsp_auditor::dictionary::{CredentialReader, Credentials, ListSource, Routes};
use rust_rtsp_auditor::errors::DictionaryError;
use std::io::Write;
use tempfile::NamedTempFile;

// 测试辅助函数：创建临时文件并写入内容
fn create_temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_routes_file() {
    let file = create_temp_file("# 海康\nStreaming/Channels/101\n\n# 大华\ncam/realmonitor?channel=1&subtype=0\n");
    let routes = Routes::load(file.path()).unwrap();
    assert_eq!(
        routes.iter().collect::<Vec<_>>(),
        vec!["Streaming/Channels/101", "cam/realmonitor?channel=1&subtype=0"]
    );
}

#[test]
fn test_load_empty_routes_file() {
    let file = create_temp_file("# nothing here\n\n");
    assert!(matches!(Routes::load(file.path()), Err(DictionaryError::Empty(_))));
}

#[test]
fn test_load_missing_file() {
    assert!(matches!(
        Routes::load("/nonexistent/routes.txt"),
        Err(DictionaryError::Io(_))
    ));
    assert!(matches!(
        Credentials::load("/nonexistent/credentials.toml"),
        Err(DictionaryError::Io(_))
    ));
}

#[test]
fn test_load_credentials_toml() {
    let file = create_temp_file("usernames = [\"admin\", \"\"]\npasswords = [\"\", \"9999\", \"12345\"]\n");
    let credentials = Credentials::load(file.path()).unwrap();
    assert_eq!(credentials.len(), 6);

    let pairs: Vec<(&str, &str)> = credentials.iter().collect();
    assert_eq!(pairs[0], ("admin", ""));
    assert_eq!(pairs[2], ("admin", "12345"));
    assert_eq!(pairs[3], ("", ""));
}

#[test]
fn test_credentials_require_both_lists() {
    assert!(matches!(
        Credentials::parse("usernames = []\npasswords = [\"a\"]"),
        Err(DictionaryError::Empty(_))
    ));
    assert!(matches!(
        Credentials::parse("usernames = [\"a\"]"),
        Err(DictionaryError::Parse(_))
    ));
}

// 用户名和密码分别来自文件或字符串
#[test]
fn test_credential_reader_sources() {
    let users = create_temp_file("admin\nroot\n");
    let passwords = create_temp_file("12345\n");

    let from_files = CredentialReader::from_files(
        users.path().to_str().unwrap(),
        passwords.path().to_str().unwrap(),
    )
    .into_credentials()
    .unwrap();
    let from_strings = CredentialReader::from_strings("admin\nroot", "12345").into_credentials().unwrap();
    let mixed = CredentialReader::new(
        ListSource::FilePath(users.path().to_str().unwrap().to_string()),
        ListSource::Literal("12345".to_string()),
    )
    .into_credentials()
    .unwrap();

    assert_eq!(from_files, from_strings);
    assert_eq!(from_files, mixed);
    assert_eq!(
        from_files.iter().collect::<Vec<_>>(),
        vec![("admin", "12345"), ("root", "12345")]
    );
}

#[test]
fn test_credential_reader_empty_list() {
    let result = CredentialReader::from_strings("", "12345").into_credentials();
    assert!(matches!(result, Err(DictionaryError::Empty(_))));
}

// 单独一行 "" 表示空口令，普通空行仍然被忽略
#[test]
fn test_empty_password_entry() {
    let passwords = create_temp_file("\"\"\n\n12345\n");
    let credentials = CredentialReader::new(
        ListSource::Literal("admin".to_string()),
        ListSource::FilePath(passwords.path().to_str().unwrap().to_string()),
    )
    .into_credentials()
    .unwrap();
    assert_eq!(
        credentials.iter().collect::<Vec<_>>(),
        vec![("admin", ""), ("admin", "12345")]
    );

    let from_string = CredentialReader::from_strings("admin", "\"\"\n12345").into_credentials().unwrap();
    assert_eq!(from_string, credentials);

    assert_eq!(ListSource::Literal("  \"\"  \n".to_string()).read().unwrap(), vec![String::new()]);
}
