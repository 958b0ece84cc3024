use std::{
    cell::{Cell, RefCell},
    io,
    time::Duration,
};

use anyhow::{bail, Result};
use clap::Parser;
use client_core::{
    FormSurface, GreetError, GreeterConfig, HttpGreeter, RemoteGreeter, SubmissionController,
    SubmitEvent, SubmitOutcome, DEFAULT_SERVER_URL,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Send each NAME to the greeting service and print the reply. Without NAMEs,
/// every line read from stdin is one submission.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "GREET_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,
    #[arg(long)]
    timeout_ms: Option<u64>,
    names: Vec<String>,
}

/// Terminal rendition of the greet form.
#[derive(Default)]
struct TerminalSurface {
    name: RefCell<String>,
    failures: Cell<usize>,
}

impl TerminalSurface {
    fn set_name(&self, name: &str) {
        *self.name.borrow_mut() = name.to_string();
    }
}

impl FormSurface for TerminalSurface {
    fn name_value(&self) -> String {
        self.name.borrow().clone()
    }

    fn set_submit_enabled(&self, enabled: bool) {
        tracing::debug!(enabled, "submit control toggled");
    }

    fn write_greeting(&self, text: &str) {
        println!("{text}");
    }

    fn report_failure(&self, error: &GreetError) {
        self.failures.set(self.failures.get() + 1);
        eprintln!("greet failed: {error}");
    }
}

async fn submit_all<G, I>(controller: &SubmissionController<G, TerminalSurface>, names: I) -> usize
where
    G: RemoteGreeter,
    I: IntoIterator<Item = String>,
{
    let mut submitted = 0;
    for name in names {
        controller.surface().set_name(&name);
        let mut event = SubmitEvent::new();
        if controller.submit(&mut event).await != SubmitOutcome::Ignored {
            submitted += 1;
        }
    }
    submitted
}

/// Submits each line as soon as it is read, so interactive input gets its
/// reply before the next line is typed.
async fn submit_lines<G, R>(
    controller: &SubmissionController<G, TerminalSurface>,
    reader: R,
) -> io::Result<usize>
where
    G: RemoteGreeter,
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut submitted = 0;
    while let Some(line) = lines.next_line().await? {
        submitted += submit_all(controller, [line]).await;
    }
    Ok(submitted)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let args = Args::parse();

    let config = GreeterConfig::new(&args.server_url)?;
    let greeter = HttpGreeter::new(&config)?;
    let controller = SubmissionController::new(greeter, TerminalSurface::default())
        .with_call_timeout(args.timeout_ms.map(Duration::from_millis));

    let submitted = if args.names.is_empty() {
        submit_lines(&controller, BufReader::new(tokio::io::stdin())).await?
    } else {
        submit_all(&controller, args.names).await
    };

    let failed = controller.surface().failures.get();
    if failed > 0 {
        bail!("{failed} of {submitted} submissions failed");
    }
    Ok(())
}
