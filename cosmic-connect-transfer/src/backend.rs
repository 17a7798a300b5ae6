//! Collaborator seams
//!
//! The widget never moves bytes itself. User actions are forwarded to a
//! [`TransferCore`], and destination paths come from a [`SavePathPrompt`]
//! supplied by the host view.

use crate::transfer::{PeerId, TransferId};
use std::path::{Path, PathBuf};

/// Requests the widget makes on the transfer engine
///
/// Every request is fire-and-forget. The engine reports the outcome later
/// through a [`crate::TransferEvent`] carrying the same identity.
pub trait TransferCore {
    /// Cancel an outgoing transfer
    fn cancel_send(&self, peer_id: PeerId, transfer_id: TransferId);

    /// Refuse an incoming transfer request
    fn reject_receive(&self, peer_id: PeerId, transfer_id: TransferId);

    /// Accept an incoming transfer, writing it to `destination`
    fn accept_receive(&self, peer_id: PeerId, transfer_id: TransferId, destination: &Path);

    /// Pause a running receive, or resume a paused one
    fn toggle_pause_receive(&self, peer_id: PeerId, transfer_id: TransferId);

    /// Pause a running send, or resume a paused one
    fn toggle_pause_send(&self, peer_id: PeerId, transfer_id: TransferId);
}

/// Destination picker shown when the user accepts a receive
pub trait SavePathPrompt {
    /// Ask the user where to save; `None` means the dialog was dismissed
    fn choose_save_path(&mut self, suggested: &Path) -> Option<PathBuf>;

    /// Tell the user the chosen location cannot be written
    fn warn_not_writable(&mut self, path: &Path);
}

/// Request recorded by [`RecordingCore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreRequest {
    CancelSend {
        peer_id: PeerId,
        transfer_id: TransferId,
    },
    RejectReceive {
        peer_id: PeerId,
        transfer_id: TransferId,
    },
    AcceptReceive {
        peer_id: PeerId,
        transfer_id: TransferId,
        destination: PathBuf,
    },
    TogglePauseReceive {
        peer_id: PeerId,
        transfer_id: TransferId,
    },
    TogglePauseSend {
        peer_id: PeerId,
        transfer_id: TransferId,
    },
}

/// Core that queues requests instead of acting on them
///
/// Hosts that process requests on their own loop drain the queue with
/// [`RecordingCore::take_requests`].
#[derive(Debug, Default)]
pub struct RecordingCore {
    requests: std::cell::RefCell<Vec<CoreRequest>>,
}

impl RecordingCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_requests(&self) -> Vec<CoreRequest> {
        std::mem::take(&mut *self.requests.borrow_mut())
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.borrow().len()
    }

    fn record(&self, request: CoreRequest) {
        self.requests.borrow_mut().push(request);
    }
}

impl TransferCore for RecordingCore {
    fn cancel_send(&self, peer_id: PeerId, transfer_id: TransferId) {
        self.record(CoreRequest::CancelSend {
            peer_id,
            transfer_id,
        });
    }

    fn reject_receive(&self, peer_id: PeerId, transfer_id: TransferId) {
        self.record(CoreRequest::RejectReceive {
            peer_id,
            transfer_id,
        });
    }

    fn accept_receive(&self, peer_id: PeerId, transfer_id: TransferId, destination: &Path) {
        self.record(CoreRequest::AcceptReceive {
            peer_id,
            transfer_id,
            destination: destination.to_path_buf(),
        });
    }

    fn toggle_pause_receive(&self, peer_id: PeerId, transfer_id: TransferId) {
        self.record(CoreRequest::TogglePauseReceive {
            peer_id,
            transfer_id,
        });
    }

    fn toggle_pause_send(&self, peer_id: PeerId, transfer_id: TransferId) {
        self.record(CoreRequest::TogglePauseSend {
            peer_id,
            transfer_id,
        });
    }
}
