// 模块声明
pub mod attack;
pub mod campaign;
pub mod cli;
pub mod config;
pub mod dictionary;
pub mod discovery;
pub mod errors;
pub mod report;
pub mod rtsp;
pub mod stream;
