// 攻击引擎：单目标攻击器 + 并发编排器
pub mod attacker;
pub mod orchestrator;
pub mod progress;

pub use attacker::{
    attack_target_credentials, attack_target_route, credentials_accepted, route_accepted,
    AttackOutcome, AttackPhase,
};
pub use orchestrator::{attack_credentials, attack_route, AttackConfig, AttackDictionary, AttackOrchestrator};
pub use progress::{AttackEvent, ChannelProgress, LogProgress, NoProgress, ProgressReporter};
