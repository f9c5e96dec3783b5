// RTSP协议探测
pub mod auth;
pub mod common;
pub mod probe;

pub use probe::{Probe, ProbeFuture, RtspProbe};
