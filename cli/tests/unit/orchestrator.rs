//! Lifecycle tests for `Orchestrator` over in-memory ports.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::time::Duration;

use gateway_common::{ButtonState, DomainConfig, EnvVar, UiEvent};
use gatewayctl::application::ports::LocalFs;
use gatewayctl::application::services::orchestrator::Orchestrator;

use crate::mocks::{
    Answer, FakeCaps, MANIFEST, MANIFEST_V2, RecordingSink, err_output, healthy_docker,
    node_paths, ok_output, test_config,
};

type Orch<'a> = Orchestrator<FakeCaps<Answer, &'a RecordingSink>>;

fn orchestrator(caps: FakeCaps<Answer, &RecordingSink>) -> Orch<'_> {
    Orchestrator::new(
        caps,
        test_config(),
        node_paths(),
        Some(PathBuf::from("/usr/local/bin/gatewayctl")),
    )
    .with_temp_dir(PathBuf::from("/tmp"))
}

fn domain(with_key: bool) -> DomainConfig {
    DomainConfig {
        fqdn: "gw.example.com".to_string(),
        use_registrar_api: with_key,
        api_user: with_key.then(|| "alice".to_string()),
        api_key: with_key.then(|| "s3cret".to_string()),
    }
}

#[tokio::test(start_paused = true)]
async fn startup_bootstraps_node_and_reports_running_group() {
    let sink = RecordingSink::default();
    let orch = orchestrator(FakeCaps::new(Answer(false), &sink));

    assert!(orch.startup().await);

    let paths = node_paths();
    let fs = &orch.capabilities().fs;
    let env = fs.get(&paths.env_file()).unwrap();
    assert!(env.contains("AR_IO_WALLET="));
    assert_eq!(fs.get(&paths.manifest()).as_deref(), Some(MANIFEST));

    let events = sink.events();
    assert!(events.contains(&UiEvent::DomainLoaded { domain: None }));
    assert!(events.iter().any(|e| matches!(
        e,
        UiEvent::RuntimeStatus {
            installed: true,
            daemon_running: true,
            ..
        }
    )));
    assert!(events.contains(&UiEvent::ButtonState {
        state: ButtonState::Stop
    }));
}

#[tokio::test(start_paused = true)]
async fn missing_runtime_stops_startup_before_compose() {
    let sink = RecordingSink::default();
    let caps = FakeCaps::new(Answer(false), &sink).with_runner(|cmd| {
        if cmd == "docker --version" {
            err_output("docker: command not found")
        } else {
            ok_output("")
        }
    });
    let orch = orchestrator(caps);

    assert!(!orch.startup().await);

    assert!(sink.events().iter().any(|e| matches!(
        e,
        UiEvent::RuntimeStatus {
            installed: false,
            daemon_running: false,
            ..
        }
    )));
    assert_eq!(orch.capabilities().runner.count("docker compose"), 0);
}

#[tokio::test(start_paused = true)]
async fn rejected_manifest_drift_keeps_local_copy_pending() {
    let sink = RecordingSink::default();
    let mut caps = FakeCaps::new(Answer(false), &sink);
    let paths = node_paths();
    caps.fs.put(paths.env_file(), "AR_IO_WALLET=\n");
    caps.fs.put(paths.manifest(), MANIFEST);
    caps.http.body = MANIFEST_V2.to_string();
    let fs = caps.fs.clone();
    let orch = orchestrator(caps);

    assert!(orch.prepare_environment().await);

    assert_eq!(fs.get(&paths.manifest()).as_deref(), Some(MANIFEST));
    assert_eq!(fs.get(&paths.pending_manifest()).as_deref(), Some(MANIFEST_V2));
    assert!(sink.events().iter().any(|e| matches!(
        e,
        UiEvent::ManifestUpdateAvailable { .. }
    )));

    assert!(orch.confirm_manifest(true, Some(&paths.pending_manifest())));
    assert_eq!(fs.get(&paths.manifest()).as_deref(), Some(MANIFEST_V2));
    assert!(!fs.exists(&paths.pending_manifest()));
}

#[tokio::test(start_paused = true)]
async fn accepted_manifest_drift_replaces_local_copy() {
    let sink = RecordingSink::default();
    let mut caps = FakeCaps::new(Answer(true), &sink);
    let paths = node_paths();
    caps.fs.put(paths.manifest(), MANIFEST);
    caps.http.body = MANIFEST_V2.to_string();
    let fs = caps.fs.clone();
    let orch = orchestrator(caps);

    assert!(orch.prepare_environment().await);

    assert_eq!(fs.get(&paths.manifest()).as_deref(), Some(MANIFEST_V2));
    assert!(!fs.exists(&paths.pending_manifest()));
}

#[tokio::test(start_paused = true)]
async fn confirm_manifest_rejects_foreign_pending_path() {
    let sink = RecordingSink::default();
    let orch = orchestrator(FakeCaps::new(Answer(false), &sink));

    assert!(!orch.confirm_manifest(true, Some(std::path::Path::new("/etc/passwd"))));
    assert!(sink.contains("Unknown pending manifest"));
}

#[tokio::test(start_paused = true)]
async fn save_env_restarts_the_group_in_order() {
    let sink = RecordingSink::default();
    let caps = FakeCaps::new(Answer(false), &sink);
    let paths = node_paths();
    caps.fs.put(paths.env_file(), "AR_IO_WALLET=\nOTHER_ENV_VARIABLE=default_value\n");
    caps.fs.put(paths.manifest(), MANIFEST);
    let fs = caps.fs.clone();
    let orch = orchestrator(caps);

    let vars = [EnvVar {
        key: "AR_IO_WALLET".to_string(),
        value: "abc".to_string(),
    }];
    assert!(orch.save_env(&vars).await);

    let env = fs.get(&paths.env_file()).unwrap();
    assert!(env.starts_with("AR_IO_WALLET=abc\n"));
    let runner = &orch.capabilities().runner;
    let down = runner.position(" down").unwrap();
    let up = runner.position(" up -d").unwrap();
    assert!(down < up, "calls: {:?}", runner.calls());
}

#[tokio::test(start_paused = true)]
async fn failed_stop_skips_start() {
    let sink = RecordingSink::default();
    let caps = FakeCaps::new(Answer(false), &sink).with_runner(|cmd| {
        if cmd.ends_with(" down") {
            err_output("network ar-io-network has active endpoints")
        } else {
            healthy_docker(cmd)
        }
    });
    let paths = node_paths();
    caps.fs.put(paths.env_file(), "AR_IO_WALLET=\n");
    caps.fs.put(paths.manifest(), MANIFEST);
    let orch = orchestrator(caps);

    let vars = [EnvVar {
        key: "AR_IO_WALLET".to_string(),
        value: "abc".to_string(),
    }];
    assert!(!orch.save_env(&vars).await);

    assert!(orch.capabilities().runner.position(" up -d").is_none());
    assert!(sink.contains("active endpoints"));
    assert!(sink.contains("did not stop cleanly"));
}

#[tokio::test(start_paused = true)]
async fn saved_domain_is_checked_and_status_masks_the_key() {
    let sink = RecordingSink::default();
    let caps = FakeCaps::new(Answer(false), &sink);
    caps.fs.put(node_paths().manifest(), MANIFEST);
    let orch = orchestrator(caps);

    let saved = orch.save_domain(domain(true)).await.unwrap();
    assert_eq!(saved.api_key.as_deref(), Some("s3cret"));
    assert!(sink.contains("gw.example.com points to this machine"));
    assert!(sink.contains("potato.gw.example.com points to this machine"));
    assert_eq!(*orch.capabilities().registrar.sets.borrow(), 0);

    let status = orch.status().await;
    let masked = status.domain.unwrap();
    assert_eq!(masked.fqdn, "gw.example.com");
    assert_ne!(masked.api_key.as_deref(), Some("s3cret"));
    assert_eq!(status.network.as_deref(), Some("ar-io-network"));
    assert_eq!(status.containers.unwrap().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn invalid_domain_is_not_saved() {
    let sink = RecordingSink::default();
    let orch = orchestrator(FakeCaps::new(Answer(false), &sink));

    let mut bad = domain(true);
    bad.api_key = None;
    assert!(orch.save_domain(bad).await.is_none());
    assert!(orch.load_domain().is_none());
    assert!(sink.contains("Could not save the domain"));
}

#[tokio::test(start_paused = true)]
async fn deploy_proxy_without_domain_fails_cleanly() {
    let sink = RecordingSink::default();
    let orch = orchestrator(FakeCaps::new(Answer(false), &sink));

    assert!(!orch.deploy_proxy().await);
    assert!(sink.contains("Cannot deploy the proxy"));
    assert_eq!(sink.failure_kinds(), ["unavailable"]);
    assert_eq!(orch.capabilities().runner.count("docker"), 0);
}

#[tokio::test(start_paused = true)]
async fn deploy_proxy_without_hook_binary_fails_before_any_container_work() {
    let sink = RecordingSink::default();
    let caps = FakeCaps::new(Answer(false), &sink);
    caps.fs.put(node_paths().manifest(), MANIFEST);
    let orch = Orchestrator::new(caps, test_config(), node_paths(), None);
    orch.save_domain(domain(true)).await.unwrap();

    assert!(!orch.deploy_proxy().await);
    assert!(sink.contains("hook_binary"));
    assert_eq!(sink.failure_kinds(), ["unavailable"]);
    assert_eq!(orch.capabilities().runner.count("docker compose -f"), 0);
    assert!(!orch.capabilities().fs.exists(&node_paths().proxy_compose()));
    assert_eq!(orch.status().await.hook_binary, None);
}

#[tokio::test(start_paused = true)]
async fn install_runtime_runs_installer_then_prepares() {
    let sink = RecordingSink::default();
    let orch = orchestrator(FakeCaps::new(Answer(false), &sink));

    assert!(orch.install_runtime().await);

    assert_eq!(orch.capabilities().host.installs.borrow().len(), 1);
    assert!(sink.events().contains(&UiEvent::InstallComplete));
    assert!(!orch.install_status().is_installing());
}

#[tokio::test(start_paused = true)]
async fn reconcile_loop_polls_on_the_interval_and_reports_once() {
    let sink = RecordingSink::default();
    let caps = FakeCaps::new(Answer(false), &sink);
    caps.fs.put(node_paths().manifest(), MANIFEST);
    let orch = orchestrator(caps);

    // Ticks at 0s, 10s and 20s.
    let _ = tokio::time::timeout(Duration::from_secs(25), orch.run_reconcile_loop()).await;

    assert_eq!(orch.capabilities().runner.count("docker ps"), 3);
    let buttons = sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, UiEvent::ButtonState { .. }))
        .count();
    assert_eq!(buttons, 1);
}

#[tokio::test(start_paused = true)]
async fn unforwarded_ports_are_returned_for_manual_setup() {
    let sink = RecordingSink::default();
    let mut caps = FakeCaps::new(Answer(false), &sink);
    caps.router.accept = false;
    let orch = orchestrator(caps);

    let manual = orch.provision_network().await;

    assert_eq!(manual.into_iter().collect::<Vec<_>>(), [80, 443]);
    assert!(sink.contains("portforward.com"));
}
