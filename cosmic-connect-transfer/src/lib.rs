//! Cosmic Connect File Transfer Widget
//!
//! Chat-log controller for file transfers. Each [`TransferWidget`] tracks one
//! send or receive, turns byte counters from the transfer core into speed and
//! ETA strings, and renders itself as an HTML fragment with clickable
//! controls. The transfer protocol itself lives in the core; this crate only
//! talks to it through [`TransferCore`] and [`TransferEvent`].
//!
//! ## Architecture
//!
//! ```text
//!   transfer core                         chat log view
//!        │  TransferEvent                       ▲  render / click code
//!        ▼                                      │
//!  ┌──────────────────────────────────────────────────┐
//!  │ TransferRegistry                                 │
//!  │   routes: TransferIdentity ──▶ TransferWidget    │
//!  │   ids:    WidgetIdSequence                       │
//!  └──────────────────────────────────────────────────┘
//!        │  cancel / reject / accept / toggle pause
//!        ▼
//!   transfer core
//! ```

pub mod backend;
pub mod clock;
pub mod config;
pub mod controls;
pub mod format;
pub mod fs_utils;
pub mod glyphs;
pub mod preview;
pub mod registry;
pub mod render;
pub mod transfer;
pub mod widget;

mod error;

/// Identifier namespacing a widget's controls in the rendered markup
pub type WidgetId = u64;

pub use backend::{CoreRequest, RecordingCore, SavePathPrompt, TransferCore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DownloadConfig, PreviewConfig, WidgetConfig};
pub use controls::{ClickTarget, ControlButton};
pub use error::{Result, TransferError};
pub use glyphs::ButtonGlyph;
pub use preview::Thumbnail;
pub use registry::{TransferRegistry, WidgetIdSequence};
pub use transfer::{
    FileTransferInfo, PeerId, TransferDirection, TransferEvent, TransferId, TransferIdentity,
    TransferStatus,
};
pub use widget::{StateChange, TransferWidget};
