//! `gatewayctl serve`: JSON-lines channel for the desktop front-end.
//!
//! Each stdin line is a `UiCommand`, each stdout line a `UiEvent`. The
//! session runs the startup sequence, then keeps the reconciliation loop
//! and network provisioning going in the background while commands are
//! dispatched one at a time. `confirm` answers bypass the queue so a
//! command waiting on a question can be unblocked. EOF ends the session.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use gateway_common::{UiCommand, UiEvent};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::app::AppContext;
use crate::application::ports::{Capabilities, Confirmer, EventSink};
use crate::application::services::orchestrator::Orchestrator;
use crate::infra::system::SystemCapabilities;
use crate::output::JsonLineSink;

/// Asks questions as `confirmation-request` events and waits for the
/// matching `confirm` command.
pub struct ChannelConfirmer<S> {
    sink: S,
    next_id: Cell<u64>,
    pending: RefCell<HashMap<u64, oneshot::Sender<bool>>>,
}

impl<S: EventSink> ChannelConfirmer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            next_id: Cell::new(0),
            pending: RefCell::new(HashMap::new()),
        }
    }

    /// Deliver an answer. Returns `false` when no question has this id.
    pub fn answer(&self, id: u64, accepted: bool) -> bool {
        match self.pending.borrow_mut().remove(&id) {
            Some(tx) => tx.send(accepted).is_ok(),
            None => false,
        }
    }

    /// Abandon every open question; their askers get an error.
    pub fn cancel_all(&self) {
        self.pending.borrow_mut().clear();
    }

    #[must_use]
    pub fn open_questions(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl<S: EventSink> Confirmer for ChannelConfirmer<S> {
    async fn confirm(&self, title: &str, message: &str) -> Result<bool> {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().insert(id, tx);
        self.sink.emit(UiEvent::ConfirmationRequest {
            id,
            title: title.to_string(),
            message: message.to_string(),
        });
        rx.await
            .context("the UI channel closed before the question was answered")
    }
}

/// Run `gatewayctl serve` on stdin/stdout.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or the production
/// capabilities cannot be built.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let sink = JsonLineSink::stdout();
    let confirmer = ChannelConfirmer::new(&sink);
    let caps = SystemCapabilities::new(&confirmer, &sink)?;
    let orchestrator = Orchestrator::new(
        caps,
        app.config.clone(),
        app.paths.clone(),
        app.hook_binary()?,
    );

    info!(node = %app.paths.root().display(), "UI session started");
    run_session(
        &orchestrator,
        &confirmer,
        &sink,
        BufReader::new(tokio::io::stdin()),
    )
    .await?;
    info!("UI session ended");
    Ok(ExitCode::SUCCESS)
}

/// Drive one session until `input` reaches EOF and every queued command
/// has run.
///
/// # Errors
///
/// Returns an error if reading `input` fails.
pub async fn run_session<C, Q, R>(
    orchestrator: &Orchestrator<C>,
    confirmer: &ChannelConfirmer<Q>,
    sink: &impl EventSink,
    input: R,
) -> Result<()>
where
    C: Capabilities,
    Q: EventSink,
    R: AsyncBufRead + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel();

    let reader = async move {
        let mut lines = input.lines();
        let result = loop {
            match lines.next_line().await {
                Ok(Some(line)) => route(&line, confirmer, sink, &tx),
                Ok(None) => break Ok(()),
                Err(e) => break Err(anyhow::Error::from(e).context("reading the UI channel")),
            }
        };
        // A command blocked on a question would otherwise never finish.
        confirmer.cancel_all();
        result
    };

    let session = async {
        orchestrator.startup().await;
        let commands = async {
            while let Some(cmd) = rx.recv().await {
                dispatch(orchestrator, cmd).await;
            }
        };
        let background = async {
            tokio::join!(
                orchestrator.run_reconcile_loop(),
                orchestrator.provision_network()
            );
        };
        tokio::select! {
            () = commands => {}
            () = background => {}
        }
    };

    let (read, ()) = tokio::join!(reader, session);
    read
}

fn route<Q: EventSink>(
    line: &str,
    confirmer: &ChannelConfirmer<Q>,
    sink: &impl EventSink,
    queue: &mpsc::UnboundedSender<UiCommand>,
) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match serde_json::from_str::<UiCommand>(line) {
        Ok(UiCommand::Confirm { id, accepted }) => {
            if !confirmer.answer(id, accepted) {
                sink.warn(&format!("No open question with id {id}."));
            }
        }
        Ok(cmd) => {
            if queue.send(cmd).is_err() {
                debug!("command queue closed; dropping command");
            }
        }
        Err(e) => sink.error(&format!("Unrecognized command: {e}")),
    }
}

async fn dispatch<C: Capabilities>(orchestrator: &Orchestrator<C>, cmd: UiCommand) {
    match cmd {
        UiCommand::InstallRuntime => {
            orchestrator.install_runtime().await;
        }
        UiCommand::StartGateway => {
            orchestrator.start().await;
        }
        UiCommand::StopGateway => {
            orchestrator.stop().await;
        }
        UiCommand::SaveEnv { vars } => {
            orchestrator.save_env(&vars).await;
        }
        UiCommand::SaveDomain { domain } => {
            orchestrator.save_domain(domain).await;
        }
        UiCommand::DeployProxy => {
            orchestrator.deploy_proxy().await;
        }
        UiCommand::LoadWalletFile { path } => {
            orchestrator.load_wallet(Path::new(&path));
        }
        UiCommand::ConfirmManifest { accepted, pending } => {
            let pending = Some(pending.as_str())
                .filter(|p| !p.is_empty())
                .map(Path::new);
            orchestrator.confirm_manifest(accepted, pending);
        }
        UiCommand::Confirm { id, .. } => debug!(id, "late confirmation ignored"),
    }
}
