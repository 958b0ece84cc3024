//! Runtime bridge between the UI command queue and the submission controller.
//!
//! The worker owns the only [`SubmissionController`]. It runs on a
//! `current_thread` runtime, so every submit future is interleaved on one
//! thread and the controller's busy guard needs no locking.

use std::{cell::RefCell, thread, time::Duration};

use client_core::{
    FormSurface, GreetError, GreeterConfig, HttpGreeter, RemoteGreeter, SubmissionController,
    SubmitEvent, SubmitOutcome,
};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use futures::{
    future::LocalBoxFuture,
    stream::{FuturesUnordered, StreamExt},
    FutureExt,
};
use tokio::sync::mpsc;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::ui::StartupConfig;

/// `FormSurface` whose writes become `UiEvent`s for the egui thread.
pub struct ChannelSurface {
    name: RefCell<String>,
    ui_tx: Sender<UiEvent>,
}

impl ChannelSurface {
    pub fn new(ui_tx: Sender<UiEvent>) -> Self {
        Self {
            name: RefCell::new(String::new()),
            ui_tx,
        }
    }

    pub fn set_name(&self, name: String) {
        *self.name.borrow_mut() = name;
    }

    /// Enable/disable transitions wait for queue space; the view keeps the
    /// last one it saw, so losing one could leave the trigger disabled.
    fn emit_state(&self, event: UiEvent) {
        if self.ui_tx.send(event).is_err() {
            tracing::debug!("ui event receiver gone");
        }
    }

    fn emit(&self, event: UiEvent) {
        match self.ui_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(?event, "ui event queue full; dropping event");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("ui event receiver gone");
            }
        }
    }
}

impl FormSurface for ChannelSurface {
    fn name_value(&self) -> String {
        self.name.borrow().clone()
    }

    fn set_submit_enabled(&self, enabled: bool) {
        self.emit_state(UiEvent::SubmitEnabled(enabled));
    }

    fn write_greeting(&self, text: &str) {
        self.emit(UiEvent::Greeting(text.to_string()));
    }

    fn report_failure(&self, error: &GreetError) {
        self.emit(UiEvent::Error(UiError::from_greet_error(
            UiErrorContext::Greet,
            error,
        )));
    }
}

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    startup: StartupConfig,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let greeter = match GreeterConfig::new(&startup.server_url)
            .and_then(|config| HttpGreeter::new(&config))
        {
            Ok(greeter) => greeter,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    err.to_string(),
                )));
                tracing::error!(server_url = %startup.server_url, "unusable greeting service config: {err}");
                return;
            }
        };

        tracing::info!(server_url = greeter.server_url(), "backend worker ready");
        runtime.block_on(run_bridge(greeter, cmd_rx, ui_tx, startup.call_timeout));
    })
}

pub(crate) async fn run_bridge<G: RemoteGreeter>(
    greeter: G,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    call_timeout: Option<Duration>,
) {
    let controller = SubmissionController::new(greeter, ChannelSurface::new(ui_tx.clone()))
        .with_call_timeout(call_timeout);
    let mut commands = forward_commands(cmd_rx);
    let mut in_flight: FuturesUnordered<LocalBoxFuture<'_, SubmitOutcome>> =
        FuturesUnordered::new();

    let _ = ui_tx.try_send(UiEvent::Info("Ready".to_string()));

    loop {
        // In-flight submits are polled first so a freshly pushed one reads the
        // field and enters Pending before the next command is taken.
        tokio::select! {
            biased;
            Some(outcome) = in_flight.next(), if !in_flight.is_empty() => {
                tracing::debug!(?outcome, "submit finished");
            }
            cmd = commands.recv() => match cmd {
                Some(BackendCommand::Submit { name }) => {
                    controller.surface().set_name(name);
                    let controller = &controller;
                    in_flight.push(
                        async move {
                            let mut event = SubmitEvent::new();
                            controller.submit(&mut event).await
                        }
                        .boxed_local(),
                    );
                }
                Some(BackendCommand::Shutdown) | None => break,
            }
        }
    }

    tracing::info!(abandoned = in_flight.len(), "backend worker stopping");
}

fn forward_commands(cmd_rx: Receiver<BackendCommand>) -> mpsc::UnboundedReceiver<BackendCommand> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            let shutdown = cmd == BackendCommand::Shutdown;
            if tx.send(cmd).is_err() || shutdown {
                break;
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crossbeam_channel::bounded;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct GatedGreeter {
        gate: Mutex<Option<oneshot::Receiver<()>>>,
        calls: Mutex<Vec<String>>,
    }

    impl GatedGreeter {
        fn close_gate(&self) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            *self.gate.lock().expect("gate lock") = Some(rx);
            tx
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl RemoteGreeter for GatedGreeter {
        async fn greet(&self, name: &str) -> Result<String, GreetError> {
            self.calls.lock().expect("calls lock").push(name.to_string());
            let gate = self.gate.lock().expect("gate lock").take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(format!("Hello, {name}!"))
        }
    }

    async fn next_event(ui_rx: &Receiver<UiEvent>) -> UiEvent {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Ok(event) = ui_rx.try_recv() {
                    return event;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("ui event within 5s")
    }

    async fn wait_for(ui_rx: &Receiver<UiEvent>, wanted: &UiEvent) -> Vec<UiEvent> {
        let mut seen = Vec::new();
        loop {
            let event = next_event(ui_rx).await;
            let done = &event == wanted;
            seen.push(event);
            if done {
                return seen;
            }
        }
    }

    #[tokio::test]
    async fn submit_burst_reaches_the_greeter_once() {
        let (cmd_tx, cmd_rx) = bounded(16);
        let (ui_tx, ui_rx) = bounded(64);
        let greeter = GatedGreeter::default();
        let release = greeter.close_gate();

        for name in ["Ann", "Bob", "Cleo"] {
            cmd_tx
                .send(BackendCommand::Submit {
                    name: name.to_string(),
                })
                .expect("queue submit");
        }

        let driver = async {
            wait_for(&ui_rx, &UiEvent::SubmitEnabled(false)).await;
            // let the bridge drain the rest of the burst while Ann is pending
            tokio::time::sleep(Duration::from_millis(100)).await;
            release.send(()).expect("open gate");

            let seen = wait_for(&ui_rx, &UiEvent::Greeting("Hello, Ann!".to_string())).await;
            assert!(seen.contains(&UiEvent::SubmitEnabled(true)));
            assert!(!seen.contains(&UiEvent::SubmitEnabled(false)));
            cmd_tx.send(BackendCommand::Shutdown).expect("shutdown");
        };

        tokio::join!(run_bridge(&greeter, cmd_rx, ui_tx, None), driver);

        assert_eq!(greeter.calls(), vec!["Ann".to_string()]);
    }

    #[tokio::test]
    async fn submits_after_settle_are_accepted_again() {
        let (cmd_tx, cmd_rx) = bounded(16);
        let (ui_tx, ui_rx) = bounded(64);
        let greeter = GatedGreeter::default();

        let driver = async {
            cmd_tx
                .send(BackendCommand::Submit {
                    name: "Ann".to_string(),
                })
                .expect("queue submit");
            wait_for(&ui_rx, &UiEvent::Greeting("Hello, Ann!".to_string())).await;

            cmd_tx
                .send(BackendCommand::Submit {
                    name: String::new(),
                })
                .expect("queue submit");
            wait_for(&ui_rx, &UiEvent::Greeting("Hello, !".to_string())).await;
            cmd_tx.send(BackendCommand::Shutdown).expect("shutdown");
        };

        tokio::join!(run_bridge(&greeter, cmd_rx, ui_tx, None), driver);

        assert_eq!(greeter.calls(), vec!["Ann".to_string(), String::new()]);
    }

    #[test]
    fn channel_surface_maps_writes_to_ui_events() {
        let (ui_tx, ui_rx) = bounded(8);
        let surface = ChannelSurface::new(ui_tx);
        surface.set_name("Ann".to_string());

        assert_eq!(surface.name_value(), "Ann");
        surface.set_submit_enabled(false);
        surface.write_greeting("Hello, Ann!");
        surface.report_failure(&GreetError::transport("connection reset"));

        assert_eq!(ui_rx.try_recv().ok(), Some(UiEvent::SubmitEnabled(false)));
        assert_eq!(
            ui_rx.try_recv().ok(),
            Some(UiEvent::Greeting("Hello, Ann!".to_string()))
        );
        match ui_rx.try_recv() {
            Ok(UiEvent::Error(err)) => assert_eq!(err.context(), UiErrorContext::Greet),
            other => panic!("expected error event, got {other:?}"),
        }
    }

    #[test]
    fn channel_surface_drops_greetings_when_queue_is_full() {
        let (ui_tx, ui_rx) = bounded(1);
        let surface = ChannelSurface::new(ui_tx);

        surface.write_greeting("Hello, Ann!");
        surface.write_greeting("Hello, Bob!");

        assert_eq!(
            ui_rx.try_recv().ok(),
            Some(UiEvent::Greeting("Hello, Ann!".to_string()))
        );
        assert!(ui_rx.try_recv().is_err());
    }

    #[test]
    fn submit_enabled_waits_for_a_full_queue_instead_of_dropping() {
        let (ui_tx, ui_rx) = bounded(1);
        let surface = ChannelSurface::new(ui_tx);
        surface.write_greeting("Hello, Ann!");

        let drain = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            ui_rx.iter().collect::<Vec<_>>()
        });
        surface.set_submit_enabled(true);
        drop(surface);

        assert_eq!(
            drain.join().expect("drain thread"),
            vec![
                UiEvent::Greeting("Hello, Ann!".to_string()),
                UiEvent::SubmitEnabled(true),
            ]
        );
    }

    #[tokio::test]
    async fn command_forwarder_exits_after_shutdown() {
        let (cmd_tx, cmd_rx) = bounded(4);
        let mut commands = forward_commands(cmd_rx);

        cmd_tx.send(BackendCommand::Shutdown).expect("shutdown");

        assert_eq!(commands.recv().await, Some(BackendCommand::Shutdown));
        // the sender half lives on the forwarder thread, so None means it exited
        // even though cmd_tx is still open
        assert_eq!(commands.recv().await, None);
        drop(cmd_tx);
    }

    #[test]
    fn invalid_server_url_is_reported_as_startup_failure() {
        let (_cmd_tx, cmd_rx) = bounded(1);
        let (ui_tx, ui_rx) = bounded(8);

        launch(
            cmd_rx,
            ui_tx,
            StartupConfig {
                server_url: "not a url".to_string(),
                call_timeout: None,
            },
        )
        .join()
        .expect("worker thread");

        let events: Vec<UiEvent> = ui_rx.try_iter().collect();
        assert!(events.iter().any(|event| matches!(
            event,
            UiEvent::Error(err) if err.context() == UiErrorContext::BackendStartup
        )));
    }
}
