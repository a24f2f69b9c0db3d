//! UI-channel sessions driven over in-memory input.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::time::Duration;

use gateway_common::UiEvent;
use gatewayctl::application::services::orchestrator::Orchestrator;
use gatewayctl::commands::serve::{ChannelConfirmer, run_session};
use tokio::io::{AsyncWriteExt, BufReader};

use crate::mocks::{FakeCaps, MANIFEST, MANIFEST_V2, RecordingSink, node_paths, test_config};

type Caps<'a> = FakeCaps<&'a ChannelConfirmer<&'a RecordingSink>, &'a RecordingSink>;

fn orchestrator(caps: Caps<'_>) -> Orchestrator<Caps<'_>> {
    Orchestrator::new(
        caps,
        test_config(),
        node_paths(),
        Some(PathBuf::from("/usr/local/bin/gatewayctl")),
    )
}

#[tokio::test(start_paused = true)]
async fn queued_commands_run_in_order_until_eof() {
    let sink = RecordingSink::default();
    let confirmer = ChannelConfirmer::new(&sink);
    let orch = orchestrator(FakeCaps::new(&confirmer, &sink));

    let input: &[u8] = b"{\"command\":\"stop-gateway\"}\nhello\n{\"command\":\"start-gateway\"}\n";
    run_session(&orch, &confirmer, &sink, input).await.unwrap();

    let calls = orch.capabilities().runner.calls();
    let down = calls.iter().position(|c| c.ends_with(" down")).unwrap();
    let up = calls.iter().position(|c| c.contains(" up -d")).unwrap();
    assert!(down < up, "calls: {calls:?}");
    assert!(sink.contains("Unrecognized command"));
    assert!(sink.contains("Gateway started."));
}

#[tokio::test(start_paused = true)]
async fn manifest_question_is_answered_over_the_channel() {
    let sink = RecordingSink::default();
    let confirmer = ChannelConfirmer::new(&sink);
    let mut caps = FakeCaps::new(&confirmer, &sink);
    let paths = node_paths();
    caps.fs.put(paths.env_file(), "AR_IO_WALLET=\n");
    caps.fs.put(paths.manifest(), MANIFEST);
    caps.http.body = MANIFEST_V2.to_string();
    let fs = caps.fs.clone();
    let orch = orchestrator(caps);

    let (mut client, server) = tokio::io::duplex(1024);
    let front_end = async {
        while !sink
            .events()
            .iter()
            .any(|e| matches!(e, UiEvent::ConfirmationRequest { id: 1, .. }))
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        client
            .write_all(b"{\"command\":\"confirm\",\"id\":1,\"accepted\":true}\n")
            .await
            .unwrap();
        drop(client);
    };

    let (session, ()) = tokio::join!(
        run_session(&orch, &confirmer, &sink, BufReader::new(server)),
        front_end
    );
    session.unwrap();

    assert_eq!(fs.get(&paths.manifest()).as_deref(), Some(MANIFEST_V2));
    assert!(fs.get(&paths.pending_manifest()).is_none());
    assert_eq!(confirmer.open_questions(), 0);
}

#[tokio::test(start_paused = true)]
async fn eof_releases_an_unanswered_question() {
    let sink = RecordingSink::default();
    let confirmer = ChannelConfirmer::new(&sink);
    let mut caps = FakeCaps::new(&confirmer, &sink);
    let paths = node_paths();
    caps.fs.put(paths.manifest(), MANIFEST);
    caps.http.body = MANIFEST_V2.to_string();
    let fs = caps.fs.clone();
    let orch = orchestrator(caps);

    let (client, server) = tokio::io::duplex(64);
    let front_end = async {
        while confirmer.open_questions() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        drop(client);
    };

    let (session, ()) = tokio::join!(
        run_session(&orch, &confirmer, &sink, BufReader::new(server)),
        front_end
    );
    session.unwrap();

    // An abandoned question counts as a rejection.
    assert_eq!(fs.get(&paths.manifest()).as_deref(), Some(MANIFEST));
    assert_eq!(fs.get(&paths.pending_manifest()).as_deref(), Some(MANIFEST_V2));
}
