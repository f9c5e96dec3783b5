use std::error::Error;

use clap::Parser;
use log::{debug, info, warn};
use rust_rtsp_auditor::cli::{self, handle_cli};
use std::time::Instant;

// 初始化日志：优先使用log4rs配置文件，失败时退回env_logger
fn init_logging() {
    match log4rs::init_file("log4rs.yaml", Default::default()) {
        Ok(()) => debug!("Logging initialized from log4rs.yaml"),
        Err(e) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .init();
            warn!("Failed to initialize log4rs ({}), falling back to env_logger", e);
        }
    }
}

// 主函数
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // 记录开始时间
    let start_time = Instant::now();

    init_logging();

    // 处理命令行参数
    let result = handle_cli(cli::Cli::parse()).await;

    // 计算并输出总耗时
    let duration = start_time.elapsed();
    info!("Total execution time: {:?}", duration);

    result
}
