use std::collections::BTreeSet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

// 展开CIDR时允许的最小前缀，/16 即 65536 个地址
const MIN_CIDR_PREFIX: u8 = 16;
/// 单个表达式最多展开的地址数，与 /16 网段相同
pub const MAX_HOSTS: u64 = 1 << (32 - MIN_CIDR_PREFIX);

/// 目标表达式解析错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidIpFormat(String),
    InvalidIpSegment(String),
    InvalidIpSegmentRange(u8, u8),
    EmptySegment,
    InvalidCidr(String),
    InvalidPortNumber(String),
    InvalidPortRange(u16, u16),
    EmptyPortSpec,
    TooManyHosts(u64),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidIpFormat(e) => write!(f, "invalid IPv4 pattern '{}'", e),
            ParseError::InvalidIpSegment(e) => write!(f, "invalid IPv4 segment '{}'", e),
            ParseError::InvalidIpSegmentRange(start, end) => {
                write!(f, "invalid IPv4 segment range {}-{}", start, end)
            }
            ParseError::EmptySegment => write!(f, "empty IPv4 segment"),
            ParseError::InvalidCidr(e) => write!(f, "invalid CIDR prefix '{}'", e),
            ParseError::InvalidPortNumber(e) => write!(f, "invalid port '{}'", e),
            ParseError::InvalidPortRange(start, end) => {
                write!(f, "invalid port range {}-{}", start, end)
            }
            ParseError::EmptyPortSpec => write!(f, "empty port specification"),
            ParseError::TooManyHosts(count) => write!(
                f,
                "expression expands to {} addresses, at most {} allowed",
                count, MAX_HOSTS
            ),
        }
    }
}

impl std::error::Error for ParseError {}

pub type Result<T> = std::result::Result<T, ParseError>;

/// IP地址中的一个段
#[derive(Debug, Clone)]
enum IpSegment {
    /// 单个数值 (如 1, 255)
    Single(u8),
    /// 数值范围 (如 1-100)
    Range(u8, u8),
    /// 多个选择项，花括号与否都落到这里 (如 1,5,10-20 或 {1,5})
    Choice(Vec<IpSegment>),
}

impl IpSegment {
    fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if split_top_level(input).len() > 1 {
            return Ok(IpSegment::Choice(Self::parse_choices(input)?));
        }
        if let Some(inner) = input.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            return Ok(IpSegment::Choice(Self::parse_choices(inner)?));
        }
        if let Some((start, end)) = input.split_once('-') {
            let start = parse_octet(start, input)?;
            let end = parse_octet(end, input)?;
            if start > end {
                return Err(ParseError::InvalidIpSegmentRange(start, end));
            }
            return Ok(IpSegment::Range(start, end));
        }
        Ok(IpSegment::Single(parse_octet(input, input)?))
    }

    // 按顶层逗号切分（跳过花括号内部的逗号）
    fn parse_choices(input: &str) -> Result<Vec<IpSegment>> {
        let mut segments = Vec::new();
        for part in split_top_level(input) {
            if !part.trim().is_empty() {
                segments.push(Self::parse(part)?);
            }
        }
        if segments.is_empty() {
            return Err(ParseError::EmptySegment);
        }
        Ok(segments)
    }

    fn expand(&self) -> Vec<u8> {
        match self {
            IpSegment::Single(val) => vec![*val],
            IpSegment::Range(start, end) => (*start..=*end).collect(),
            IpSegment::Choice(segments) => segments.iter().flat_map(IpSegment::expand).collect(),
        }
    }
}

fn parse_octet(value: &str, context: &str) -> Result<u8> {
    value
        .trim()
        .parse::<u8>()
        .map_err(|_| ParseError::InvalidIpSegment(context.to_string()))
}

fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// 端口规范
#[derive(Debug, Clone)]
enum PortSpec {
    Single(u16),
    Range(u16, u16),
    Multiple(Vec<PortSpec>),
}

impl PortSpec {
    fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if let Some(inner) = input.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            return Self::parse(inner);
        }
        if input.contains(',') {
            let specs = input
                .split(',')
                .filter(|part| !part.trim().is_empty())
                .map(Self::parse)
                .collect::<Result<Vec<_>>>()?;
            if specs.is_empty() {
                return Err(ParseError::EmptyPortSpec);
            }
            return Ok(PortSpec::Multiple(specs));
        }
        if let Some((start, end)) = input.split_once('-') {
            let start = parse_port(start)?;
            let end = parse_port(end)?;
            if start > end {
                return Err(ParseError::InvalidPortRange(start, end));
            }
            return Ok(PortSpec::Range(start, end));
        }
        Ok(PortSpec::Single(parse_port(input)?))
    }

    fn expand(&self) -> Vec<u16> {
        match self {
            PortSpec::Single(port) => vec![*port],
            PortSpec::Range(start, end) => (*start..=*end).collect(),
            PortSpec::Multiple(specs) => specs.iter().flat_map(PortSpec::expand).collect(),
        }
    }
}

fn parse_port(value: &str) -> Result<u16> {
    match value.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ParseError::InvalidPortNumber(value.trim().to_string())),
        Ok(port) => Ok(port),
    }
}

/// IP与端口组合；`ports` 为空表示表达式没有指定端口
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpPort {
    pub ip: IpAddr,
    pub ports: Vec<u16>,
}

/// 解析端口列表，如 "554,8554,10554-10556"，结果去重并保持首次出现的顺序
pub fn parse_ports(input: &str) -> Result<Vec<u16>> {
    if input.trim().is_empty() {
        return Err(ParseError::EmptyPortSpec);
    }
    let mut seen = BTreeSet::new();
    Ok(PortSpec::parse(input)?
        .expand()
        .into_iter()
        .filter(|port| seen.insert(*port))
        .collect())
}

/// 解析IP端口表达式
/// 例如 "10.{1-2,{3-4}}.{{5-6},7}.8:{80,443}"、"192.168.1.0/24:554"
pub fn parse_ip_port(input: &str) -> Result<Vec<IpPort>> {
    let (ip_part, port_part) = input.trim().split_once(':').unwrap_or((input.trim(), ""));

    let (ip_part, cidr) = match ip_part.split_once('/') {
        Some((ip, prefix)) => {
            let prefix = prefix
                .trim()
                .parse::<u8>()
                .map_err(|_| ParseError::InvalidCidr(prefix.to_string()))?;
            if !(MIN_CIDR_PREFIX..=32).contains(&prefix) {
                return Err(ParseError::InvalidCidr(prefix.to_string()));
            }
            (ip, Some(prefix))
        }
        None => (ip_part, None),
    };

    let octets: Vec<&str> = ip_part.split('.').collect();
    if octets.len() != 4 {
        return Err(ParseError::InvalidIpFormat(input.to_string()));
    }
    let segments = octets
        .iter()
        .map(|octet| IpSegment::parse(octet).map(|s| s.expand()))
        .collect::<Result<Vec<_>>>()?;

    // 先算笛卡尔积的大小，超限时不分配
    let count = segments.iter().map(|s| s.len() as u64).product::<u64>();
    if count > MAX_HOSTS {
        return Err(ParseError::TooManyHosts(count));
    }

    let mut ips = Vec::with_capacity(count as usize);
    for a in &segments[0] {
        for b in &segments[1] {
            for c in &segments[2] {
                for d in &segments[3] {
                    ips.push(Ipv4Addr::new(*a, *b, *c, *d));
                }
            }
        }
    }

    if let Some(prefix) = cidr {
        ips = expand_cidr(ips, prefix)?;
    }

    let ports = if port_part.trim().is_empty() {
        vec![]
    } else {
        PortSpec::parse(port_part)?.expand()
    };

    Ok(ips
        .into_iter()
        .map(|ip| IpPort {
            ip: IpAddr::V4(ip),
            ports: ports.clone(),
        })
        .collect())
}

// 把每个地址所在的网段展开为网段内全部地址，网段去重
fn expand_cidr(ips: Vec<Ipv4Addr>, prefix: u8) -> Result<Vec<Ipv4Addr>> {
    let mask = u32::MAX << (32 - u32::from(prefix));
    let networks: BTreeSet<u32> = ips.into_iter().map(|ip| u32::from(ip) & mask).collect();
    let hosts = 1u64 << (32 - u32::from(prefix));

    let count = networks.len() as u64 * hosts;
    if count > MAX_HOSTS {
        return Err(ParseError::TooManyHosts(count));
    }

    Ok(networks
        .into_iter()
        .flat_map(|network| (0..hosts).map(move |offset| Ipv4Addr::from(network + offset as u32)))
        .collect())
}
