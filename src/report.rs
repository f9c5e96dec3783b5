use crate::stream::Stream;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

// 结果文件的顶层结构，写出为 [[streams]] 数组
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Report {
    pub streams: Vec<Stream>,
}

impl Report {
    pub fn new(streams: &[Stream]) -> Self {
        Report {
            streams: streams.to_vec(),
        }
    }

    pub fn to_toml(&self) -> Result<String, io::Error> {
        toml::to_string(self).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// 把结果写入TOML文件
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), io::Error> {
        std::fs::write(&path, self.to_toml()?)?;
        log::info!("Results written to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, io::Error> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

// 打印一行结果摘要
fn summary_line(stream: &Stream) -> String {
    let endpoint = format!("{}:{}", stream.address, stream.port);
    let device = if stream.device.is_empty() {
        "unknown device".to_string()
    } else {
        stream.device.clone()
    };

    let route = if stream.route_found {
        format!("/{}", stream.route.trim_start_matches('/')).green()
    } else {
        "route not found".red()
    };
    let credentials = if stream.credentials_found {
        format!("{}:{}", stream.username, stream.password).green()
    } else {
        "credentials not found".red()
    };

    format!("{} ({})\n    route: {}\n    credentials: {}", endpoint.bold(), device, route, credentials)
}

/// 在终端打印所有结果
pub fn print_summary(streams: &[Stream]) {
    if streams.is_empty() {
        println!("{}", "No streams were found.".yellow());
        return;
    }

    let accessed = streams
        .iter()
        .filter(|s| s.route_found && s.credentials_found)
        .count();
    println!(
        "{}",
        format!("Accessed {} of {} streams", accessed, streams.len()).bold()
    );
    for stream in streams {
        println!("  {}", summary_line(stream));
        if stream.route_found && stream.credentials_found {
            if let Ok(url) = stream.current_url() {
                println!("    url: {}", url.cyan());
            }
        }
    }
}
