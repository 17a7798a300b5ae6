//! Cosmic Connect Transfer Demo
//!
//! Runs one file transfer against a simulated peer and records every state of
//! the chat log entry into an HTML page. Clicks on the rendered controls are
//! scripted from the command line.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────┐  CoreRequest   ┌──────────────────┐
//!   │ TransferRegistry         │───────────────▶│  SimulatedPeer   │
//!   │   TransferWidget         │                │  (tokio task)    │
//!   │   ManualClock            │◀───────────────│                  │
//!   └──────────────────────────┘ TransferEvent  └──────────────────┘
//!               │
//!               ▼
//!        FrameLog ──▶ transfer-demo.html
//! ```

use anyhow::Context;
use clap::{Parser, ValueEnum};
use cosmic_connect_transfer::{
    ClickTarget, ControlButton, FileTransferInfo, ManualClock, SavePathPrompt, TransferEvent,
    TransferRegistry, TransferStatus, WidgetConfig, WidgetId,
};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod page;
mod peer;

use page::FrameLog;
use peer::{ChannelCore, PeerScript, SimulatedPeer};

const PEER_ID: u32 = 1;
const TRANSFER_ID: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// We send the file to the peer
    Send,
    /// The peer offers the file to us
    Receive,
}

/// Cosmic Connect Transfer Demo - scripted transfer rendered as a chat log
#[derive(Parser, Debug)]
#[command(name = "cosmic-connect-transfer-demo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to transfer
    file: PathBuf,

    /// Direction of the transfer
    #[arg(long, value_enum, default_value_t = Mode::Send)]
    direction: Mode,

    /// Answer for the save dialog when receiving (defaults to the suggestion)
    #[arg(long)]
    save_to: Option<PathBuf>,

    /// Reject the offered file instead of accepting it
    #[arg(long)]
    reject: bool,

    /// Page the rendered frames are written to
    #[arg(short, long, default_value = "transfer-demo.html")]
    output: PathBuf,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of progress notifications
    #[arg(long, default_value_t = 5)]
    steps: u32,

    /// Delay between progress notifications in milliseconds
    #[arg(long, default_value_t = 250)]
    tick_ms: u64,

    /// Click pause after this progress step, then resume
    #[arg(long)]
    pause_at: Option<u32>,

    /// Click stop after this progress step
    #[arg(long)]
    cancel_at: Option<u32>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

/// Save dialog answering from the command line
///
/// Gives the scripted answer first, then the suggested path once. Any further
/// question dismisses the dialog.
struct ScriptedPrompt {
    answer: Option<PathBuf>,
    suggestion_used: bool,
}

impl ScriptedPrompt {
    fn new(answer: Option<PathBuf>) -> Self {
        Self {
            answer,
            suggestion_used: false,
        }
    }
}

impl SavePathPrompt for ScriptedPrompt {
    fn choose_save_path(&mut self, suggested: &Path) -> Option<PathBuf> {
        let chosen = match self.answer.take() {
            Some(answer) => answer,
            None if !self.suggestion_used => {
                self.suggestion_used = true;
                suggested.to_path_buf()
            }
            None => {
                info!("Save dialog dismissed");
                return None;
            }
        };
        info!("Save dialog: {}", chosen.display());
        Some(chosen)
    }

    fn warn_not_writable(&mut self, path: &Path) {
        warn!("Cannot write to {}, asking again", path.display());
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<WidgetConfig> {
    match path {
        Some(path) => WidgetConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => WidgetConfig::load().or_else(|e| {
            warn!("Using default config: {}", e);
            Ok(WidgetConfig::default())
        }),
    }
}

fn transfer_info(args: &Args) -> anyhow::Result<FileTransferInfo> {
    let file_size = std::fs::metadata(&args.file)
        .with_context(|| format!("Cannot read {}", args.file.display()))?
        .len();
    let filename = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());

    Ok(match args.direction {
        Mode::Send => {
            FileTransferInfo::outgoing(PEER_ID, TRANSFER_ID, filename, file_size, &args.file)
        }
        Mode::Receive => FileTransferInfo::incoming(PEER_ID, TRANSFER_ID, filename, file_size),
    })
}

fn click(
    registry: &mut TransferRegistry,
    frames: &mut FrameLog,
    prompt: &mut ScriptedPrompt,
    widget_id: WidgetId,
    button: ControlButton,
    caption: &str,
) -> anyhow::Result<()> {
    let code = ClickTarget::new(widget_id, button).code();
    debug!("Clicking {}", code);
    registry.dispatch_click(&code, prompt)?;
    frames.capture(caption, registry.render_all());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    info!("Starting Cosmic Connect Transfer Demo");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = load_config(args.config.as_deref())?;
    let info = transfer_info(&args)?;

    let (requests_tx, requests_rx) = mpsc::unbounded_channel();
    let (events_tx, mut events_rx) = mpsc::channel(32);

    let script = PeerScript {
        identity: info.identity,
        source: args.file.clone(),
        file_size: info.file_size,
        steps: args.steps.max(1),
        tick: Duration::from_millis(args.tick_ms),
    };
    let peer = tokio::spawn(SimulatedPeer::new(script, requests_rx, events_tx).run());

    let clock = Rc::new(ManualClock::starting_now());
    let mut registry = TransferRegistry::with_clock(
        Rc::new(ChannelCore::new(requests_tx)),
        clock.clone(),
        config,
    );
    registry.subscribe(|change| {
        debug!(
            "Widget {} is now {} (remote paused: {})",
            change.widget_id, change.status, change.remote_paused
        );
    });

    let mut frames = FrameLog::new();
    let mut prompt = ScriptedPrompt::new(args.save_to.clone());

    let id = registry.add_transfer(info)?;
    frames.capture("announced", registry.render_all());

    if args.direction == Mode::Receive {
        let (button, caption) = if args.reject {
            (ControlButton::Primary, "reject clicked")
        } else {
            (ControlButton::Secondary, "accept clicked")
        };
        click(&mut registry, &mut frames, &mut prompt, id, button, caption)?;

        // The peer waits for an answer, so a dismissed dialog turns into a reject
        let still_pending = registry
            .widget(id)
            .is_some_and(|widget| widget.status() == TransferStatus::Pending);
        if still_pending {
            warn!("No writable destination chosen, rejecting the file");
            click(
                &mut registry,
                &mut frames,
                &mut prompt,
                id,
                ControlButton::Primary,
                "reject clicked",
            )?;
        }
    }

    let mut progress_steps = 0;
    let mut paused_once = false;
    while let Some((identity, event)) = events_rx.recv().await {
        let caption = event.kind();
        let is_progress = matches!(event, TransferEvent::Progress { .. });
        let is_paused = matches!(event, TransferEvent::Paused);
        if is_progress {
            clock.advance_secs(1);
            progress_steps += 1;
        }

        if !registry.dispatch(&identity, event) {
            debug!("Ignored {} notification for {}", caption, identity);
            continue;
        }
        frames.capture(caption, registry.render_all());

        if is_paused {
            click(
                &mut registry,
                &mut frames,
                &mut prompt,
                id,
                ControlButton::Secondary,
                "resume clicked",
            )?;
        } else if is_progress && args.cancel_at == Some(progress_steps) {
            click(
                &mut registry,
                &mut frames,
                &mut prompt,
                id,
                ControlButton::Primary,
                "stop clicked",
            )?;
        } else if is_progress && !paused_once && args.pause_at == Some(progress_steps) {
            paused_once = true;
            click(
                &mut registry,
                &mut frames,
                &mut prompt,
                id,
                ControlButton::Secondary,
                "pause clicked",
            )?;
        }
    }

    // Closing the request channel lets a waiting peer exit
    drop(registry);
    peer.await.context("Peer task panicked")??;

    frames.write_to(&args.output, "Cosmic Connect transfer")?;
    info!(
        "Wrote {} frames to {}",
        frames.frames().len(),
        args.output.display()
    );
    Ok(())
}
