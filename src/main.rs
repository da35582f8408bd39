//! Terminal tic-tac-toe client (default binary).
//!
//! Runs the single consumer thread: reads keys, drains network events once per
//! tick, and redraws. All socket I/O happens on the network runtime.
//!
//! Usage: `tui-tictactoe [PORT]`. The port argument overrides `TICTACTOE_PORT`.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use tui_tictactoe::core::TurnFlow;
use tui_tictactoe::input::{handle_key_event, should_quit, InputAction};
use tui_tictactoe::net::{ClientConfig, NetClient, NetOutbox};
use tui_tictactoe::term::{FrameBuffer, Status, TermBoard, TerminalRenderer};
use tui_tictactoe::types::TICK_MS;

type Flow = TurnFlow<TermBoard, NetOutbox>;

fn main() -> Result<()> {
    init_logging(&ClientConfig::log_path_from_env())?;
    let config = load_config()?;
    info!(host = %config.host, port = config.port, "starting tic-tac-toe client");

    let mut client = NetClient::start(&config).context("failed to start network runtime")?;
    let mut flow = TurnFlow::new(TermBoard::new(), client.outbox());
    if let Err(e) = flow.start() {
        warn!(error = %e, "could not announce initial state");
    }

    let mut term = TerminalRenderer::new();
    term.enter()?;
    let result = run(&mut term, &mut client, &mut flow);

    // Always try to restore terminal state.
    let _ = term.exit();

    drop(flow);
    client.shutdown();
    info!("client stopped");
    result
}

fn init_logging(path: &Path) -> Result<()> {
    let log_file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    // Don't fail if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn load_config() -> Result<ClientConfig> {
    let config = ClientConfig::from_env();
    match std::env::args().nth(1) {
        Some(arg) => config
            .with_port_arg(&arg)
            .with_context(|| format!("invalid port argument {:?}", arg)),
        None => Ok(config),
    }
}

fn run(term: &mut TerminalRenderer, client: &mut NetClient, flow: &mut Flow) -> Result<()> {
    let (w, h) = TermBoard::size_hint();
    let mut fb = FrameBuffer::new(w, h);
    let tick = Duration::from_millis(TICK_MS as u64);
    let mut last_tick = Instant::now();

    loop {
        let (w, h) = crossterm::terminal::size().unwrap_or_else(|_| TermBoard::size_hint());
        fb.resize(w, h);
        let status = Status {
            connection: client.state(),
            flow: flow.state(),
            active: flow.active_role(),
        };
        flow.view().render_into(&status, &mut fb);
        term.draw(&fb)?;

        let timeout = tick.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if should_quit(key) {
                        return Ok(());
                    }
                    if let Some(action) = handle_key_event(key) {
                        flow.view_mut().dismiss_notice();
                        apply_input(flow, action);
                    }
                }
                Event::Resize(..) => term.invalidate(),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick {
            last_tick = Instant::now();
            let handled = client.pump(flow);
            if handled > 0 {
                debug!(handled, "network events applied");
            }
        }
    }
}

fn apply_input(flow: &mut Flow, action: InputAction) {
    match action {
        InputAction::Choose(index) => {
            if let Err(e) = flow.choose_cell(index) {
                debug!(index, reason = %e, "move ignored");
            }
        }
        InputAction::Restart => {
            if let Err(e) = flow.restart() {
                warn!(error = %e, "restart could not be sent");
            }
        }
    }
}
