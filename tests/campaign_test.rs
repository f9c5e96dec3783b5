mod common;

use common::{stream, FixedDiscoverer, ScriptedProbe};
use rstest::rstest;
use rust_rtsp_auditor::attack::{AttackOrchestrator, NoProgress};
use rust_rtsp_auditor::campaign::{Campaign, CampaignOptions, CampaignState, INSANE, PARANOIAC};
use rust_rtsp_auditor::errors::{CampaignErrorKind, CampaignStage, ConfigError};
use rust_rtsp_auditor::stream::Stream;
use std::sync::Arc;
use std::time::Duration;

const CREDENTIALS: &str = r#"
usernames = ["admin", "root"]
passwords = ["admin", "12345"]
"#;

// 10.0.0.1: 路由live，凭据admin:12345；10.0.0.2: 没有任何路由，凭据全部401
fn camera_probe() -> Arc<ScriptedProbe> {
    ScriptedProbe::new(|url| {
        if url.contains("10.0.0.1:") {
            if !url.ends_with("/live") {
                return Ok(404);
            }
            return Ok(if url.starts_with("rtsp://admin:12345@") { 200 } else { 401 });
        }
        Ok(if url.ends_with(":554/") { 401 } else { 404 })
    })
}

fn campaign(probe: Arc<ScriptedProbe>, discovered: Vec<Stream>) -> Campaign {
    let mut campaign = Campaign::with_parts(
        CampaignOptions {
            targets: vec!["10.0.0.0/24".to_string()],
            ..CampaignOptions::default()
        },
        AttackOrchestrator::new(probe).with_progress(Arc::new(NoProgress)),
        Arc::new(FixedDiscoverer {
            streams: discovered,
        }),
    );
    campaign.set_routes("live\nother");
    campaign.set_credentials(CREDENTIALS).unwrap();
    campaign.set_timeout(100).unwrap();
    campaign
}

#[tokio::test]
async fn test_discover_and_attack() {
    let probe = camera_probe();
    let mut campaign = campaign(probe.clone(), vec![stream("10.0.0.1"), stream("10.0.0.2")]);

    let streams = campaign.discover_and_attack().await.unwrap();
    assert_eq!(campaign.state(), CampaignState::Done);
    assert_eq!(campaign.streams(), streams.as_slice());

    assert_eq!(streams[0].route, "live");
    assert_eq!(streams[0].username, "admin");
    assert_eq!(streams[0].password, "12345");
    assert!(streams[0].route_found && streams[0].credentials_found);

    assert!(!streams[1].route_found);
    assert!(!streams[1].credentials_found);
    assert_eq!(streams[1], stream("10.0.0.2"));
}

// 有目标缺少路由时凭据阶段只重跑一次
#[tokio::test]
async fn test_credential_phase_retried_once() {
    let probe = camera_probe();
    let mut campaign = campaign(probe.clone(), vec![stream("10.0.0.1"), stream("10.0.0.2")]);
    campaign.discover_and_attack().await.unwrap();

    // 路由: 2次；凭据: 4个组合 × 2轮
    assert_eq!(probe.calls_for("10.0.0.2").len(), 2 + 4 * 2);
    // 路由: 1次；凭据: 第2个组合成功 × 2轮
    assert_eq!(probe.calls_for("10.0.0.1").len(), 1 + 2 * 2);
}

#[tokio::test]
async fn test_no_retry_when_all_routes_found() {
    let probe = camera_probe();
    let mut campaign = campaign(probe.clone(), vec![stream("10.0.0.1")]);
    campaign.discover_and_attack().await.unwrap();

    assert_eq!(probe.calls().len(), 1 + 2);
}

#[tokio::test]
async fn test_discovery_failure() {
    let probe = camera_probe();
    let mut campaign = campaign(probe.clone(), vec![]);

    let err = campaign.discover_and_attack().await.unwrap_err();
    assert_eq!(err.stage, CampaignStage::Discovery);
    assert!(matches!(err.kind, CampaignErrorKind::Discovery(_)));
    assert!(err.streams.is_empty());
    assert!(err.to_string().starts_with("could not discover streams"));
    assert!(probe.calls().is_empty());
}

// 攻击失败时错误带上当前的目标快照
#[tokio::test]
async fn test_attack_failure_keeps_snapshot() {
    let probe = camera_probe();
    let mut campaign = campaign(probe.clone(), vec![]);
    let streams = vec![stream("10.0.0.1"), stream("10.0.0.1")];
    campaign.set_streams(streams.clone());

    let err = campaign.attack().await.unwrap_err();
    assert_eq!(err.stage, CampaignStage::RouteAttack);
    assert!(matches!(err.kind, CampaignErrorKind::Attack(_)));
    assert_eq!(err.streams, streams);
    assert!(probe.calls().is_empty());
}

// 阶段之间修改的选项在下一阶段生效
#[tokio::test]
async fn test_options_apply_between_stages() {
    let probe = camera_probe();
    let mut campaign = campaign(probe.clone(), vec![]);
    campaign.set_streams(vec![stream("10.0.0.1")]);

    campaign.set_routes("other");
    let streams = campaign.attack_route().await.unwrap();
    assert!(!streams[0].route_found);
    assert_eq!(campaign.state(), CampaignState::RoutesAttacked);

    campaign.set_routes("other\nlive");
    let streams = campaign.attack_route().await.unwrap();
    assert_eq!(streams[0].route, "live");

    let streams = campaign.attack_credentials().await.unwrap();
    assert!(streams[0].credentials_found);
    assert_eq!(campaign.state(), CampaignState::CredentialsAttacked);
}

#[rstest]
#[case(PARANOIAC as i64, true)]
#[case(INSANE as i64, true)]
#[case(-1, false)]
#[case(6, false)]
fn test_set_speed(#[case] speed: i64, #[case] valid: bool) {
    let mut campaign = Campaign::new(CampaignOptions::default());
    let result = campaign.set_speed(speed);
    if valid {
        assert!(result.is_ok());
        assert_eq!(i64::from(campaign.options().speed), speed);
    } else {
        assert!(matches!(result, Err(ConfigError::InvalidSpeed(s)) if s == speed));
    }
}

#[test]
fn test_set_timeout() {
    let mut campaign = Campaign::new(CampaignOptions::default());
    assert!(matches!(campaign.set_timeout(-5), Err(ConfigError::InvalidTimeout(-5))));
    campaign.set_timeout(0).unwrap();
    assert_eq!(campaign.options().timeout, Duration::ZERO);
    campaign.set_timeout(1500).unwrap();
    assert_eq!(campaign.options().timeout, Duration::from_millis(1500));
}

#[test]
fn test_set_credentials_rejects_garbage() {
    let mut campaign = Campaign::new(CampaignOptions::default());
    let before = campaign.options().credentials.clone();

    assert!(matches!(
        campaign.set_credentials("usernames = [1, 2"),
        Err(ConfigError::Dictionary(_))
    ));
    assert_eq!(campaign.options().credentials, before);

    campaign.set_credentials(CREDENTIALS).unwrap();
    assert_eq!(campaign.options().credentials.len(), 4);
}

#[test]
fn test_set_routes_skips_comments() {
    let mut campaign = Campaign::new(CampaignOptions::default());
    campaign.set_routes("# comment\nlive.sdp\n\n  h264  \n");
    let routes: Vec<&String> = campaign.options().routes.iter().collect();
    assert_eq!(routes, vec!["live.sdp", "h264"]);
}
