use crate::campaign::{Campaign, CampaignOptions};
use crate::config::AppConfig;
use crate::errors::CampaignError;
use crate::report::{print_summary, Report};
use crate::stream::Stream;
use clap::Parser;
use std::error::Error;
use timing_macro::timing;

// 定义命令行参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub enum Cli {
    /// 发现RTSP流并猜测路由和凭据
    Attack {
        /// 配置文件路径，命令行参数优先于配置文件
        #[arg(short, long, default_value = "config.toml")]
        config: String,
        /// 目标表达式，空白分隔，如 "192.168.1.0/24 10.0.{1-3}.1:8554" (与targets_file二选一)
        #[arg(short, long, conflicts_with = "targets_file")]
        targets: Option<String>,
        /// 每行一个目标表达式的文件 (与targets二选一)
        #[arg(long, conflicts_with = "targets")]
        targets_file: Option<String>,
        /// 目标未指定端口时使用的端口
        #[arg(short, long)]
        ports: Option<String>,
        /// 路由字典文件 (与routes_string二选一)
        #[arg(long, conflicts_with = "routes_string")]
        routes_file: Option<String>,
        /// 换行分隔的路由 (与routes_file二选一)
        #[arg(long, conflicts_with = "routes_file")]
        routes_string: Option<String>,
        /// TOML格式的凭据字典文件
        #[arg(long)]
        credentials_file: Option<String>,
        /// 包含用户名的文件路径 (与users_string二选一)
        #[arg(long, conflicts_with_all = ["users_string", "credentials_file"])]
        users_file: Option<String>,
        /// 用户名字符串，每行一个 (与users_file二选一)
        #[arg(long, conflicts_with_all = ["users_file", "credentials_file"])]
        users_string: Option<String>,
        /// 包含密码的文件路径 (与passwords_string二选一)
        #[arg(long, conflicts_with_all = ["passwords_string", "credentials_file"])]
        passwords_file: Option<String>,
        /// 密码字符串，每行一个，单独一行 "" 表示空口令 (与passwords_file二选一)
        #[arg(long, conflicts_with_all = ["passwords_file", "credentials_file"])]
        passwords_string: Option<String>,
        /// 单次探测超时（毫秒）
        #[arg(long)]
        timeout_ms: Option<i64>,
        /// 速度等级 0(最慢)-5(最快)
        #[arg(short, long)]
        speed: Option<i64>,
        /// 结果输出文件 (TOML)
        #[arg(short, long)]
        output: Option<String>,
    },
}

// 解析Attack模式的命令行参数，返回配置文件路径和命令行给出的配置
pub fn parse_attack_args(cli: Cli) -> (String, AppConfig) {
    let Cli::Attack {
        config,
        targets,
        targets_file,
        ports,
        routes_file,
        routes_string,
        credentials_file,
        users_file,
        users_string,
        passwords_file,
        passwords_string,
        timeout_ms,
        speed,
        output,
    } = cli;

    log::debug!("RTSP auditor started in attack mode");
    log::debug!("Config file: {}", config);

    let cli_config = AppConfig {
        targets,
        targets_file,
        ports,
        routes_file,
        routes_string,
        credentials_file,
        users_file,
        users_string,
        passwords_file,
        passwords_string,
        timeout_ms,
        speed,
        output,
    };
    (config, cli_config)
}

/// 合并配置文件与命令行参数，得到最终的战役选项
pub fn resolve_options(cli: Cli) -> Result<CampaignOptions, Box<dyn Error>> {
    let (config_path, cli_config) = parse_attack_args(cli);
    let file_config = AppConfig::load_or_default(&config_path);
    Ok(file_config.merge(cli_config).into_options()?)
}

#[timing("campaign")]
pub async fn run_campaign(campaign: &mut Campaign) -> Result<Vec<Stream>, CampaignError> {
    campaign.discover_and_attack().await
}

// 处理命令行参数并执行相应的操作
pub async fn handle_cli(cli: Cli) -> Result<(), Box<dyn Error>> {
    let options = resolve_options(cli)?;
    let output_file = options.output_file.clone();
    let mut campaign = Campaign::new(options);

    log::debug!("Starting campaign");
    match run_campaign(&mut campaign).await {
        Ok(streams) => {
            log::debug!("Campaign completed");
            print_summary(&streams);
            if let Some(path) = output_file {
                Report::new(&streams).write_to(&path)?;
            }
            Ok(())
        }
        Err(e) => {
            log::error!("Campaign failed: {}", e);
            print_summary(&e.streams);
            Err(e.into())
        }
    }
}
