//! Transfer Widget
//!
//! Chat-log entry for one file transfer. The widget holds display state for a
//! single transfer, reacts to notifications from the transfer core, forwards
//! user actions back to it and renders itself as a markup fragment.
//!
//! ## State Machine
//!
//! ```text
//!            accepted                 paused
//! Pending ─────────────▶ Processing ─────────▶ Paused
//!    │                    ▲    │                 │
//!    │                    │    └──── accepted ◀──┘
//!    │                    │
//!    └──── cancel / reject / cancelled ──▶ Canceled
//!          finished ────────────────────▶ Finished
//! ```
//!
//! Local pause and resume requests only reach the core; the state flips when
//! the core answers with `Paused` or `Accepted`. Once Canceled or Finished the
//! widget detaches and ignores every further notification.
//!
//! ## Change Notification
//!
//! Every applied notification and every user action invokes the registered
//! listeners synchronously with a [`StateChange`]. Listeners only see a copy
//! of the new state, so they cannot call back into the widget.

use crate::backend::{SavePathPrompt, TransferCore};
use crate::clock::{Clock, SystemClock};
use crate::config::WidgetConfig;
use crate::controls::ControlButton;
use crate::format::{format_duration, human_readable_size, human_readable_speed, Throughput};
use crate::fs_utils;
use crate::preview::Thumbnail;
use crate::render::{render_transfer, TransferView};
use crate::transfer::{
    FileTransferInfo, TransferDirection, TransferEvent, TransferIdentity, TransferStatus,
};
use crate::WidgetId;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Snapshot handed to change listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub widget_id: WidgetId,
    pub identity: TransferIdentity,
    pub status: TransferStatus,
    pub remote_paused: bool,
}

type Listener = Box<dyn FnMut(&StateChange)>;

/// Chat-log controller for a single file transfer
pub struct TransferWidget {
    id: WidgetId,
    identity: TransferIdentity,
    status: TransferStatus,
    remote_paused: bool,
    detached: bool,

    filename: String,
    save_path: Option<PathBuf>,
    size: String,
    speed: String,
    eta: String,

    last_update: DateTime<Utc>,
    last_bytes_transferred: u64,
    last_throughput: Throughput,

    preview: Option<Thumbnail>,
    config: WidgetConfig,

    core: Rc<dyn TransferCore>,
    clock: Rc<dyn Clock>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for TransferWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferWidget")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("status", &self.status)
            .field("remote_paused", &self.remote_paused)
            .field("detached", &self.detached)
            .field("filename", &self.filename)
            .field("save_path", &self.save_path)
            .field("size", &self.size)
            .field("speed", &self.speed)
            .field("eta", &self.eta)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TransferWidget {
    /// Create a widget for a newly announced transfer using the system clock
    pub fn new(
        id: WidgetId,
        info: FileTransferInfo,
        core: Rc<dyn TransferCore>,
        config: WidgetConfig,
    ) -> Self {
        Self::with_clock(id, info, core, Rc::new(SystemClock), config)
    }

    /// Create a widget reading time from `clock`
    ///
    /// Outgoing image files get their thumbnail right away.
    pub fn with_clock(
        id: WidgetId,
        info: FileTransferInfo,
        core: Rc<dyn TransferCore>,
        clock: Rc<dyn Clock>,
        config: WidgetConfig,
    ) -> Self {
        let preview = match (&info.source_path, info.identity.direction) {
            (Some(path), TransferDirection::Sending) => Thumbnail::load(path, &config.preview),
            _ => None,
        };

        debug!(
            "Created transfer widget {} for {} ({})",
            id, info.identity, info.filename
        );

        Self {
            id,
            identity: info.identity,
            status: TransferStatus::Pending,
            remote_paused: false,
            detached: false,
            filename: info.filename,
            save_path: None,
            size: human_readable_size(info.file_size),
            speed: human_readable_speed(0.0),
            eta: format_duration(0),
            last_update: clock.now(),
            last_bytes_transferred: 0,
            last_throughput: Throughput::between(0, 0, 0),
            preview,
            config,
            core,
            clock,
            listeners: Vec::new(),
        }
    }

    /// Register a change listener
    pub fn on_state_changed(&mut self, listener: impl FnMut(&StateChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn identity(&self) -> &TransferIdentity {
        &self.identity
    }

    pub fn direction(&self) -> TransferDirection {
        self.identity.direction
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }

    pub fn is_remote_paused(&self) -> bool {
        self.remote_paused
    }

    /// Whether the widget stopped listening to the core
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn save_path(&self) -> Option<&Path> {
        self.save_path.as_deref()
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn speed(&self) -> &str {
        &self.speed
    }

    pub fn eta(&self) -> &str {
        &self.eta
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.last_bytes_transferred
    }

    /// Throughput computed by the last applied progress notification
    pub fn last_throughput(&self) -> Throughput {
        self.last_throughput
    }

    pub fn preview(&self) -> Option<&Thumbnail> {
        self.preview.as_ref()
    }

    /// Current markup fragment for the chat log
    pub fn render(&self) -> String {
        let transferred = human_readable_size(self.last_bytes_transferred);
        render_transfer(&TransferView {
            widget_id: self.id,
            direction: self.identity.direction,
            status: self.status,
            remote_paused: self.remote_paused,
            filename: &self.filename,
            size: &self.size,
            transferred: &transferred,
            speed: &self.speed,
            eta: &self.eta,
            preview: self.preview.as_ref(),
        })
    }

    /// Apply a notification from the core
    ///
    /// Returns `false` when the notification was ignored, either because it
    /// belongs to another transfer or because this one already ended.
    pub fn handle_event(&mut self, identity: &TransferIdentity, event: TransferEvent) -> bool {
        if !self.accepts(identity) {
            return false;
        }

        match event {
            TransferEvent::Progress {
                total_size,
                bytes_transferred,
            } => self.report_progress(identity, total_size, bytes_transferred),
            TransferEvent::Cancelled => self.report_cancelled(identity),
            TransferEvent::Finished { file_path } => self.report_finished(identity, &file_path),
            TransferEvent::Accepted => self.report_accepted(identity),
            TransferEvent::RemotePauseChanged { paused } => {
                self.report_remote_pause(identity, paused)
            }
            TransferEvent::Paused => self.report_paused(identity),
        }
        true
    }

    /// Byte counter update from the core
    ///
    /// Updates arriving within the same second as the previous baseline are
    /// dropped. A counter that went backwards counts as zero throughput, and
    /// zero throughput leaves the ETA untouched.
    pub fn report_progress(
        &mut self,
        identity: &TransferIdentity,
        total_size: u64,
        bytes_transferred: u64,
    ) {
        if !self.accepts(identity) {
            return;
        }

        let now = self.clock.now();
        let elapsed = (now - self.last_update).num_seconds();
        if elapsed <= 0 {
            return;
        }

        let throughput =
            Throughput::between(self.last_bytes_transferred, bytes_transferred, elapsed as u64);
        if throughput.clamped {
            warn!(
                "Negative transfer speed for {} ({} -> {} bytes)",
                self.identity, self.last_bytes_transferred, bytes_transferred
            );
        }

        self.speed = human_readable_speed(throughput.bytes_per_sec);
        self.size = human_readable_size(total_size);
        if let Some(eta_secs) = throughput.eta_secs(total_size, bytes_transferred) {
            self.eta = format_duration(eta_secs);
        }

        self.last_update = now;
        self.last_bytes_transferred = bytes_transferred;
        self.last_throughput = throughput;

        self.emit_changed();
    }

    /// The core cancelled the transfer
    pub fn report_cancelled(&mut self, identity: &TransferIdentity) {
        if !self.accepts(identity) {
            return;
        }

        info!("Transfer {} cancelled", self.identity);
        self.terminate(TransferStatus::Canceled);
    }

    /// The core finished the transfer; `file_path` is the final location
    pub fn report_finished(&mut self, identity: &TransferIdentity, file_path: &Path) {
        if !self.accepts(identity) {
            return;
        }

        if self.identity.direction == TransferDirection::Receiving {
            self.preview = Thumbnail::load(file_path, &self.config.preview);
        }

        info!("Transfer {} finished ({})", self.identity, file_path.display());
        self.terminate(TransferStatus::Finished);
    }

    /// The receiver accepted, or the core resumed a paused transfer
    pub fn report_accepted(&mut self, identity: &TransferIdentity) {
        if !self.accepts(identity) {
            return;
        }

        self.remote_paused = false;
        self.set_status(TransferStatus::Processing);
        self.emit_changed();
    }

    /// The peer paused or resumed its side
    pub fn report_remote_pause(&mut self, identity: &TransferIdentity, paused: bool) {
        if !self.accepts(identity) {
            return;
        }

        debug!("Transfer {} remote paused: {}", self.identity, paused);
        self.remote_paused = paused;
        self.emit_changed();
    }

    /// The local side of the transfer is now paused
    pub fn report_paused(&mut self, identity: &TransferIdentity) {
        if !self.accepts(identity) {
            return;
        }

        self.set_status(TransferStatus::Paused);
        self.emit_changed();
    }

    /// Cancel the transfer from this side
    pub fn cancel(&mut self) {
        if self.status.is_terminal() {
            return;
        }

        self.core
            .cancel_send(self.identity.peer_id, self.identity.transfer_id);
        info!("Cancelled transfer {}", self.identity);
        self.terminate(TransferStatus::Canceled);
    }

    /// Refuse an incoming transfer
    ///
    /// Goes through the same path as a cancellation reported by the core.
    pub fn reject_receive(&mut self) {
        if self.status.is_terminal() {
            return;
        }

        self.core
            .reject_receive(self.identity.peer_id, self.identity.transfer_id);
        let identity = self.identity;
        self.report_cancelled(&identity);
    }

    /// Ask the user for a destination and accept the incoming transfer
    ///
    /// The prompt repeats until a writable path is chosen. Dismissing it
    /// aborts without any change. Returns whether the transfer was accepted.
    pub fn accept_receive(&mut self, prompt: &mut dyn SavePathPrompt) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        let suggested = self.config.downloads.suggested_path(&self.filename);
        let path = loop {
            let Some(path) = prompt.choose_save_path(&suggested) else {
                debug!("Save dialog dismissed for {}", self.identity);
                return false;
            };
            if path.as_os_str().is_empty() {
                debug!("Save dialog returned no path for {}", self.identity);
                return false;
            }

            if fs_utils::is_writable(&path) {
                break path;
            }

            warn!("Location {} is not writable", path.display());
            prompt.warn_not_writable(&path);
        };

        self.core
            .accept_receive(self.identity.peer_id, self.identity.transfer_id, &path);
        info!("Accepted transfer {} into {}", self.identity, path.display());

        self.save_path = Some(path);
        self.set_status(TransferStatus::Processing);
        self.emit_changed();
        true
    }

    /// Request a pause or resume of an incoming transfer
    pub fn toggle_pause_receive(&mut self) {
        if !self.can_toggle_pause() {
            return;
        }

        self.core
            .toggle_pause_receive(self.identity.peer_id, self.identity.transfer_id);
        self.emit_changed();
    }

    /// Request a pause or resume of an outgoing transfer
    pub fn toggle_pause_send(&mut self) {
        if !self.can_toggle_pause() {
            return;
        }

        self.core
            .toggle_pause_send(self.identity.peer_id, self.identity.transfer_id);
        self.emit_changed();
    }

    /// Handle a click on one of the rendered controls
    ///
    /// The left control cancels a send or rejects a receive. The right control
    /// accepts a pending receive and otherwise toggles pause.
    pub fn press(&mut self, button: ControlButton, prompt: &mut dyn SavePathPrompt) {
        if self.status.is_terminal() {
            return;
        }

        match (self.identity.direction, button) {
            (TransferDirection::Sending, ControlButton::Primary) => self.cancel(),
            (TransferDirection::Sending, ControlButton::Secondary) => self.toggle_pause_send(),
            (TransferDirection::Receiving, ControlButton::Primary) => self.reject_receive(),
            (TransferDirection::Receiving, ControlButton::Secondary) => {
                if self.status == TransferStatus::Pending {
                    self.accept_receive(prompt);
                } else {
                    self.toggle_pause_receive();
                }
            }
        }
    }

    fn accepts(&self, identity: &TransferIdentity) -> bool {
        if self.detached || self.status.is_terminal() {
            return false;
        }
        *identity == self.identity
    }

    fn can_toggle_pause(&self) -> bool {
        self.status.is_running() && !self.remote_paused
    }

    fn set_status(&mut self, status: TransferStatus) {
        if self.status != status {
            debug!("Transfer {}: {} -> {}", self.identity, self.status, status);
            self.status = status;
        }
    }

    fn terminate(&mut self, status: TransferStatus) {
        self.set_status(status);
        self.detached = true;
        self.emit_changed();
    }

    fn emit_changed(&mut self) {
        let change = StateChange {
            widget_id: self.id,
            identity: self.identity,
            status: self.status,
            remote_paused: self.remote_paused,
        };
        for listener in &mut self.listeners {
            listener(&change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CoreRequest, RecordingCore};
    use crate::clock::ManualClock;
    use std::cell::RefCell;
    use std::io;
    use std::sync::{Arc, Mutex};

    struct NoPrompt;

    /// Log sink shared with a test subscriber
    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl LogCapture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SavePathPrompt for NoPrompt {
        fn choose_save_path(&mut self, _suggested: &Path) -> Option<PathBuf> {
            None
        }

        fn warn_not_writable(&mut self, _path: &Path) {}
    }

    fn sender() -> (TransferWidget, Rc<RecordingCore>, Rc<ManualClock>) {
        let core = Rc::new(RecordingCore::new());
        let clock = Rc::new(ManualClock::starting_now());
        let info = FileTransferInfo {
            identity: TransferIdentity::new(1, 0, TransferDirection::Sending),
            filename: "archive.tar".to_string(),
            file_size: 10 * 1024,
            source_path: None,
        };
        let widget = TransferWidget::with_clock(
            0,
            info,
            core.clone(),
            clock.clone(),
            WidgetConfig::default(),
        );
        (widget, core, clock)
    }

    #[test]
    fn test_initial_state() {
        let (widget, _, _) = sender();
        assert_eq!(widget.status(), TransferStatus::Pending);
        assert_eq!(widget.size(), "10.00kiB");
        assert_eq!(widget.speed(), "0.00B/s");
        assert_eq!(widget.eta(), "00:00");
        assert!(!widget.is_remote_paused());
        assert!(widget.preview().is_none());
    }

    #[test]
    fn test_progress_updates_statistics() {
        let (mut widget, _, clock) = sender();
        let identity = *widget.identity();

        clock.advance_secs(2);
        widget.report_progress(&identity, 10 * 1024, 2048);

        assert_eq!(widget.speed(), "1.00kiB/s");
        assert_eq!(widget.eta(), "00:08");
        assert_eq!(widget.bytes_transferred(), 2048);
        assert_eq!(widget.last_throughput().bytes_per_sec, 1024.0);
    }

    #[test]
    fn test_progress_within_same_second_is_dropped() {
        let (mut widget, _, _) = sender();
        let identity = *widget.identity();

        widget.report_progress(&identity, 10 * 1024, 2048);
        assert_eq!(widget.bytes_transferred(), 0);
        assert_eq!(widget.speed(), "0.00B/s");
    }

    #[test]
    fn test_backwards_progress_clamps_and_keeps_eta() {
        let (mut widget, _, clock) = sender();
        let identity = *widget.identity();

        clock.advance_secs(1);
        widget.report_progress(&identity, 10 * 1024, 4096);
        assert_eq!(widget.eta(), "00:01");

        clock.advance_secs(1);
        widget.report_progress(&identity, 10 * 1024, 1024);
        assert!(widget.last_throughput().clamped);
        assert_eq!(widget.speed(), "0.00B/s");
        assert_eq!(widget.eta(), "00:01");
        assert_eq!(widget.bytes_transferred(), 1024);
    }

    #[test]
    fn test_backwards_progress_logs_warning() {
        let logs = LogCapture::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let (mut widget, _, clock) = sender();
            let identity = *widget.identity();

            clock.advance_secs(1);
            widget.report_progress(&identity, 10 * 1024, 4096);
            assert!(!logs.contents().contains("Negative transfer speed"));

            clock.advance_secs(1);
            widget.report_progress(&identity, 10 * 1024, 1024);
        });

        let output = logs.contents();
        assert!(output.contains("WARN"));
        assert!(output.contains("Negative transfer speed"));
        assert!(output.contains("4096 -> 1024 bytes"));
    }

    #[test]
    fn test_listeners_are_notified() {
        let (mut widget, _, _) = sender();
        let identity = *widget.identity();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        widget.on_state_changed(move |change| sink.borrow_mut().push(change.status));

        widget.report_accepted(&identity);
        widget.report_paused(&identity);
        widget.report_accepted(&identity);

        assert_eq!(
            *seen.borrow(),
            vec![
                TransferStatus::Processing,
                TransferStatus::Paused,
                TransferStatus::Processing
            ]
        );
    }

    #[test]
    fn test_cancel_forwards_and_detaches() {
        let (mut widget, core, _) = sender();
        widget.cancel();

        assert_eq!(widget.status(), TransferStatus::Canceled);
        assert!(widget.is_detached());
        assert_eq!(
            core.take_requests(),
            vec![CoreRequest::CancelSend {
                peer_id: 1,
                transfer_id: 0
            }]
        );

        widget.cancel();
        assert_eq!(core.pending_requests(), 0);
    }

    #[test]
    fn test_toggle_pause_requires_running_transfer() {
        let (mut widget, core, _) = sender();
        let identity = *widget.identity();

        widget.toggle_pause_send();
        assert_eq!(core.pending_requests(), 0);

        widget.report_accepted(&identity);
        widget.toggle_pause_send();
        assert_eq!(
            core.take_requests(),
            vec![CoreRequest::TogglePauseSend {
                peer_id: 1,
                transfer_id: 0
            }]
        );
        assert_eq!(widget.status(), TransferStatus::Processing);

        widget.report_remote_pause(&identity, true);
        widget.toggle_pause_send();
        assert_eq!(core.pending_requests(), 0);
    }

    #[test]
    fn test_press_routes_sender_controls() {
        let (mut widget, core, _) = sender();
        let identity = *widget.identity();
        widget.report_accepted(&identity);

        widget.press(ControlButton::Secondary, &mut NoPrompt);
        assert_eq!(core.take_requests().len(), 1);

        widget.press(ControlButton::Primary, &mut NoPrompt);
        assert_eq!(widget.status(), TransferStatus::Canceled);

        widget.press(ControlButton::Secondary, &mut NoPrompt);
        assert_eq!(core.take_requests().len(), 1);
    }
}
