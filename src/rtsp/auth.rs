use crate::errors::ProbeError;
use crate::rtsp::common::RtspResponse;
use base64::Engine;
use md5::{Digest, Md5};
use rand::Rng;

// RTSP认证挑战
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum AuthChallenge {
    Basic,
    Digest(DigestAuthInfo),
}

// Digest认证信息
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct DigestAuthInfo {
    pub realm: String,
    pub nonce: String,
    pub qop: Option<String>,
    pub algorithm: Option<String>,
    pub opaque: Option<String>,
}

// 从401响应中解析认证挑战；同时提供Basic和Digest时优先Digest
pub fn parse_auth_challenge(response: &RtspResponse) -> Result<Option<AuthChallenge>, ProbeError> {
    let mut challenge = None;

    for auth_str in response.headers_named("WWW-Authenticate") {
        let (scheme, params) = auth_str.split_once(' ').unwrap_or((auth_str, ""));
        if scheme.eq_ignore_ascii_case("Digest") {
            let digest_info = parse_digest_challenge(params)?;
            log::debug!(
                "Digest authentication required, realm: {}",
                digest_info.realm
            );
            return Ok(Some(AuthChallenge::Digest(digest_info)));
        } else if scheme.eq_ignore_ascii_case("Basic") {
            log::debug!("Basic authentication required");
            challenge = Some(AuthChallenge::Basic);
        }
    }

    Ok(challenge)
}

// 解析Digest认证挑战参数
pub fn parse_digest_challenge(challenge: &str) -> Result<DigestAuthInfo, ProbeError> {
    let mut realm = String::new();
    let mut nonce = String::new();
    let mut qop = None;
    let mut algorithm = None;
    let mut opaque = None;

    for param in split_params(challenge) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').to_string();

        match key.trim().to_ascii_lowercase().as_str() {
            "realm" => realm = value,
            "nonce" => nonce = value,
            "qop" => qop = Some(value),
            "algorithm" => algorithm = Some(value),
            "opaque" => opaque = Some(value),
            _ => {}
        }
    }

    if realm.is_empty() || nonce.is_empty() {
        return Err(ProbeError::Authentication(
            "Invalid Digest challenge: missing realm or nonce".to_string(),
        ));
    }

    Ok(DigestAuthInfo {
        realm,
        nonce,
        qop,
        algorithm,
        opaque,
    })
}

// 按逗号切分参数，忽略引号内的逗号（如 qop="auth,auth-int"）
fn split_params(input: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                params.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(input[start..].trim());
    params.retain(|p| !p.is_empty());
    params
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", Md5::digest(input.as_bytes()))
}

// 生成Authorization头
pub fn generate_auth_header(
    challenge: &AuthChallenge,
    username: &str,
    password: &str,
    method: &str,
    uri: &str,
) -> String {
    match challenge {
        AuthChallenge::Basic => {
            // Basic认证: base64(username:password)
            let credentials = format!("{}:{}", username, password);
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
            format!("Basic {}", encoded)
        }
        AuthChallenge::Digest(info) => generate_digest_header(info, username, password, method, uri, &generate_cnonce()),
    }
}

// 生成Digest认证头，cnonce由调用方给出
pub fn generate_digest_header(
    info: &DigestAuthInfo,
    username: &str,
    password: &str,
    method: &str,
    uri: &str,
    cnonce: &str,
) -> String {
    let nc = "00000001";
    let algorithm = info.algorithm.as_deref().unwrap_or("MD5");
    // 服务端可能给出 "auth,auth-int"，只支持auth
    let qop = info
        .qop
        .as_deref()
        .filter(|q| q.split(',').any(|v| v.trim().eq_ignore_ascii_case("auth")))
        .map(|_| "auth");

    // HA1 = MD5(username:realm:password)，MD5-sess 额外混入 nonce 和 cnonce
    let mut ha1 = md5_hex(&format!("{}:{}:{}", username, info.realm, password));
    if algorithm.eq_ignore_ascii_case("MD5-sess") {
        ha1 = md5_hex(&format!("{}:{}:{}", ha1, info.nonce, cnonce));
    }

    // HA2 = MD5(method:uri)
    let ha2 = md5_hex(&format!("{}:{}", method, uri));

    let mut header = format!(
        "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\"",
        username, info.realm, info.nonce, uri
    );

    match qop {
        Some(qop) => {
            let response = md5_hex(&format!(
                "{}:{}:{}:{}:{}:{}",
                ha1, info.nonce, nc, cnonce, qop, ha2
            ));
            header.push_str(&format!(
                ", response=\"{}\", algorithm={}, cnonce=\"{}\", nc={}, qop={}",
                response, algorithm, cnonce, nc, qop
            ));
        }
        None => {
            // RFC 2069 旧格式: MD5(HA1:nonce:HA2)
            let response = md5_hex(&format!("{}:{}:{}", ha1, info.nonce, ha2));
            header.push_str(&format!(", response=\"{}\", algorithm={}", response, algorithm));
        }
    }

    if let Some(opaque) = &info.opaque {
        header.push_str(&format!(", opaque=\"{}\"", opaque));
    }

    header
}

// 生成客户端随机数
pub fn generate_cnonce() -> String {
    let mut rng = rand::thread_rng();
    let random_bytes: [u8; 16] = rng.r#gen();
    format!("{:x}", Md5::digest(random_bytes))
}
