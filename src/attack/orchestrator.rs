use crate::attack::attacker::{attack_target_credentials, attack_target_route, AttackOutcome, AttackPhase};
use crate::attack::progress::{AttackEvent, LogProgress, ProgressReporter};
use crate::dictionary::{Credentials, Routes};
use crate::errors::AttackError;
use crate::rtsp::{Probe, RtspProbe};
use crate::stream::{validate_targets, Stream};
use log::{debug, error, trace};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// 一次编排调用使用的配置，按值传入，调用期间不可变
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AttackConfig {
    pub timeout: Duration,
}

impl Default for AttackConfig {
    fn default() -> Self {
        AttackConfig {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AttackConfig {
    pub fn new(timeout: Duration) -> Self {
        AttackConfig { timeout }
    }
}

/// 攻击字典，同时决定攻击阶段
#[derive(Clone, Debug)]
pub enum AttackDictionary {
    Routes(Arc<Routes>),
    Credentials(Arc<Credentials>),
}

impl AttackDictionary {
    pub fn phase(&self) -> AttackPhase {
        match self {
            AttackDictionary::Routes(_) => AttackPhase::Route,
            AttackDictionary::Credentials(_) => AttackPhase::Credentials,
        }
    }

    fn candidates(&self) -> usize {
        match self {
            AttackDictionary::Routes(routes) => routes.len(),
            AttackDictionary::Credentials(credentials) => credentials.len(),
        }
    }
}

/// 攻击编排器 - 每个目标启动一个攻击任务，收齐全部结果后单线程合并
pub struct AttackOrchestrator {
    probe: Arc<dyn Probe>,
    progress: Arc<dyn ProgressReporter>,
}

impl Default for AttackOrchestrator {
    fn default() -> Self {
        Self::new(Arc::new(RtspProbe::new()))
    }
}

impl AttackOrchestrator {
    pub fn new(probe: Arc<dyn Probe>) -> Self {
        AttackOrchestrator {
            probe,
            progress: Arc::new(LogProgress),
        }
    }

    /// 设置进度上报
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// 为所有目标猜测路由
    pub async fn attack_route(
        &self,
        targets: Vec<Stream>,
        routes: Arc<Routes>,
        config: AttackConfig,
    ) -> Result<Vec<Stream>, AttackError> {
        self.attack(targets, AttackDictionary::Routes(routes), config)
            .await
    }

    /// 为所有目标猜测凭据
    pub async fn attack_credentials(
        &self,
        targets: Vec<Stream>,
        credentials: Arc<Credentials>,
        config: AttackConfig,
    ) -> Result<Vec<Stream>, AttackError> {
        self.attack(targets, AttackDictionary::Credentials(credentials), config)
            .await
    }

    /// 执行一个攻击阶段
    ///
    /// 先校验全部目标，任一不合法则不发起任何探测。之后每个目标一个任务，
    /// 通过通道收齐N个结果，再按(地址, 端口)把成功的结果替换回列表；失败的目标保持原样。
    pub async fn attack(
        &self,
        targets: Vec<Stream>,
        dictionary: AttackDictionary,
        config: AttackConfig,
    ) -> Result<Vec<Stream>, AttackError> {
        validate_targets(&targets)?;

        let phase = dictionary.phase();
        let total = targets.len();
        let start_time = Instant::now();
        self.progress.report(&AttackEvent::PhaseStarted {
            phase,
            targets: total,
            candidates: dictionary.candidates(),
        });

        let (outcomes, handles) = self.spawn_attacks(&targets, &dictionary, config);
        let outcomes = self.collect_outcomes(outcomes, handles, total).await?;

        let (merged, succeeded) = merge_outcomes(targets, outcomes);
        self.progress.report(&AttackEvent::PhaseFinished {
            phase,
            succeeded,
            failed: total - succeeded,
            elapsed: start_time.elapsed(),
        });

        Ok(merged)
    }

    // 为每个目标创建一个攻击任务，全部共享只读字典
    fn spawn_attacks(
        &self,
        targets: &[Stream],
        dictionary: &AttackDictionary,
        config: AttackConfig,
    ) -> (mpsc::Receiver<AttackOutcome>, Vec<JoinHandle<()>>) {
        let (sender, receiver) = mpsc::channel(targets.len().max(1));
        let mut handles = Vec::with_capacity(targets.len());

        for (task_idx, target) in targets.iter().cloned().enumerate() {
            let sender = sender.clone();
            let probe = self.probe.clone();
            let dictionary = dictionary.clone();

            trace!("Creating task {} of {}", task_idx + 1, targets.len());
            handles.push(tokio::spawn(async move {
                let outcome = match &dictionary {
                    AttackDictionary::Routes(routes) => {
                        attack_target_route(&*probe, target, routes, config.timeout).await
                    }
                    AttackDictionary::Credentials(credentials) => {
                        attack_target_credentials(&*probe, target, credentials, config.timeout)
                            .await
                    }
                };
                if let Err(e) = sender.send(outcome).await {
                    error!("Failed to send attack outcome: {}", e);
                }
            }));
        }

        (receiver, handles)
    }

    // 阻塞直到收齐全部结果；通道提前关闭说明有任务异常退出
    async fn collect_outcomes(
        &self,
        mut receiver: mpsc::Receiver<AttackOutcome>,
        handles: Vec<JoinHandle<()>>,
        total: usize,
    ) -> Result<Vec<AttackOutcome>, AttackError> {
        let mut outcomes = Vec::with_capacity(total);

        while outcomes.len() < total {
            let Some(outcome) = receiver.recv().await else {
                break;
            };
            self.progress.report(&AttackEvent::TargetFinished {
                phase: outcome.phase(),
                completed: outcomes.len() + 1,
                total,
                stream: outcome.stream().clone(),
                found: outcome.found(),
            });
            outcomes.push(outcome);
        }

        let received = outcomes.len();
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Attack task failed: {:?}", e);
                if received < total {
                    return Err(AttackError::Worker(e.to_string()));
                }
            }
        }

        if received < total {
            return Err(AttackError::ChannelClosed {
                received,
                expected: total,
            });
        }

        Ok(outcomes)
    }
}

// 单线程合并：按身份替换成功的结果，返回合并后的列表和成功数
fn merge_outcomes(mut targets: Vec<Stream>, outcomes: Vec<AttackOutcome>) -> (Vec<Stream>, usize) {
    let positions: HashMap<(String, u16), usize> = targets
        .iter()
        .enumerate()
        .map(|(idx, target)| ((target.address.clone(), target.port), idx))
        .collect();

    let mut succeeded = 0;
    for outcome in outcomes {
        if !outcome.found() {
            continue;
        }
        let stream = outcome.into_stream();
        match positions.get(&(stream.address.clone(), stream.port)) {
            Some(&idx) => {
                debug!("Replacing {} with attacked stream", targets[idx]);
                targets[idx] = stream;
                succeeded += 1;
            }
            None => error!("Attack outcome for unknown target {}", stream),
        }
    }

    (targets, succeeded)
}

/// 使用RTSP探测为目标猜测路由
pub async fn attack_route(
    targets: Vec<Stream>,
    routes: &Routes,
    timeout: Duration,
) -> Result<Vec<Stream>, AttackError> {
    AttackOrchestrator::default()
        .attack_route(targets, Arc::new(routes.clone()), AttackConfig::new(timeout))
        .await
}

/// 使用RTSP探测为目标猜测凭据
pub async fn attack_credentials(
    targets: Vec<Stream>,
    credentials: &Credentials,
    timeout: Duration,
) -> Result<Vec<Stream>, AttackError> {
    AttackOrchestrator::default()
        .attack_credentials(
            targets,
            Arc::new(credentials.clone()),
            AttackConfig::new(timeout),
        )
        .await
}
