use crate::attack::AttackPhase;
use crate::stream::Stream;
use log::{debug, info};
use std::time::Duration;
use tokio::sync::mpsc;

/// 攻击进度事件，由编排器在收集结果时发出
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttackEvent {
    PhaseStarted {
        phase: AttackPhase,
        targets: usize,
        candidates: usize,
    },
    TargetFinished {
        phase: AttackPhase,
        completed: usize,
        total: usize,
        stream: Stream,
        found: bool,
    },
    PhaseFinished {
        phase: AttackPhase,
        succeeded: usize,
        failed: usize,
        elapsed: Duration,
    },
}

/// 进度上报能力，由展示层注入
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &AttackEvent);
}

/// 把进度写入日志
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, event: &AttackEvent) {
        match event {
            AttackEvent::PhaseStarted {
                phase,
                targets,
                candidates,
            } => info!(
                "Starting {} attack on {} targets with {} candidates each",
                phase, targets, candidates
            ),
            AttackEvent::TargetFinished {
                completed,
                total,
                stream,
                found,
                ..
            } => {
                if *found {
                    info!("Stream attacked successfully: {}", stream);
                } else {
                    info!("Stream attack failed: {}", stream);
                }
                debug!("Task completed. {} remaining.", total - completed);
            }
            AttackEvent::PhaseFinished {
                phase,
                succeeded,
                failed,
                elapsed,
            } => info!(
                "{} attack completed in {:?}: {} succeeded, {} failed",
                phase, elapsed, succeeded, failed
            ),
        }
    }
}

/// 丢弃所有进度事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: &AttackEvent) {}
}

/// 把进度事件转发到通道，供界面或websocket消费
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: mpsc::UnboundedSender<AttackEvent>,
}

impl ChannelProgress {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AttackEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (ChannelProgress { sender }, receiver)
    }
}

impl ProgressReporter for ChannelProgress {
    fn report(&self, event: &AttackEvent) {
        // 接收端已关闭时直接丢弃
        if self.sender.send(event.clone()).is_err() {
            debug!("Progress receiver dropped, event discarded");
        }
    }
}
