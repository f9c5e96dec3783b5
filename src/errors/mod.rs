pub mod errors;

pub use errors::{
    AttackError, CampaignError, CampaignErrorKind, CampaignStage, ConfigError, DictionaryError,
    DiscoveryError, InvalidTargetError, ProbeError,
};
