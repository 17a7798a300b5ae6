//! Transfer identity, status and notification types
//!
//! The widget and the transfer core never share object references. Every
//! notification carries a [`TransferIdentity`], the `(peer, transfer,
//! direction)` triple that scopes it to exactly one widget.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Peer number assigned by the transfer core
pub type PeerId = u32;

/// Per-peer transfer number assigned by the transfer core
pub type TransferId = u32;

/// Direction of a file transfer, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Sending,
    Receiving,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::Sending => write!(f, "sending"),
            TransferDirection::Receiving => write!(f, "receiving"),
        }
    }
}

/// Lifecycle state of a transfer as seen by the chat log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Waiting for the receiving side to accept
    Pending,
    /// Bytes are flowing
    Processing,
    /// Paused locally
    Paused,
    /// Cancelled or rejected by either side
    Canceled,
    /// All bytes transferred
    Finished,
}

impl TransferStatus {
    /// Canceled and Finished accept no further notifications
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Canceled | TransferStatus::Finished)
    }

    /// States in which pause/resume requests are meaningful
    pub fn is_running(&self) -> bool {
        matches!(self, TransferStatus::Processing | TransferStatus::Paused)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Processing => "processing",
            TransferStatus::Paused => "paused",
            TransferStatus::Canceled => "canceled",
            TransferStatus::Finished => "finished",
        };
        write!(f, "{}", name)
    }
}

/// The `(peer, transfer, direction)` triple identifying a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferIdentity {
    pub peer_id: PeerId,
    pub transfer_id: TransferId,
    pub direction: TransferDirection,
}

impl TransferIdentity {
    pub fn new(peer_id: PeerId, transfer_id: TransferId, direction: TransferDirection) -> Self {
        Self {
            peer_id,
            transfer_id,
            direction,
        }
    }
}

impl fmt::Display for TransferIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "peer {} / transfer {} ({})",
            self.peer_id, self.transfer_id, self.direction
        )
    }
}

/// Notification delivered by the transfer core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferEvent {
    /// Periodic byte counter update
    Progress {
        total_size: u64,
        bytes_transferred: u64,
    },
    /// The transfer was cancelled by either side
    Cancelled,
    /// The transfer completed; `file_path` is where the bytes now live
    Finished { file_path: PathBuf },
    /// The receiver accepted, or a paused transfer resumed
    Accepted,
    /// The peer paused or resumed its side of the transfer
    RemotePauseChanged { paused: bool },
    /// The local side is now paused
    Paused,
}

impl TransferEvent {
    /// Short name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            TransferEvent::Progress { .. } => "progress",
            TransferEvent::Cancelled => "cancelled",
            TransferEvent::Finished { .. } => "finished",
            TransferEvent::Accepted => "accepted",
            TransferEvent::RemotePauseChanged { .. } => "remote_pause_changed",
            TransferEvent::Paused => "paused",
        }
    }
}

/// Description of a transfer handed over by the core when it is announced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransferInfo {
    pub identity: TransferIdentity,
    /// Display name of the file
    pub filename: String,
    /// Announced size in bytes
    pub file_size: u64,
    /// Local file being sent, used for the sender-side preview
    pub source_path: Option<PathBuf>,
}

impl FileTransferInfo {
    /// Outgoing transfer of a local file
    pub fn outgoing(
        peer_id: PeerId,
        transfer_id: TransferId,
        filename: impl Into<String>,
        file_size: u64,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            identity: TransferIdentity::new(peer_id, transfer_id, TransferDirection::Sending),
            filename: filename.into(),
            file_size,
            source_path: Some(source_path.into()),
        }
    }

    /// Incoming transfer request from a peer
    pub fn incoming(
        peer_id: PeerId,
        transfer_id: TransferId,
        filename: impl Into<String>,
        file_size: u64,
    ) -> Self {
        Self {
            identity: TransferIdentity::new(peer_id, transfer_id, TransferDirection::Receiving),
            filename: filename.into(),
            file_size,
            source_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TransferStatus::Canceled.is_terminal());
        assert!(TransferStatus::Finished.is_terminal());
        assert!(!TransferStatus::Pending.is_terminal());
        assert!(!TransferStatus::Processing.is_terminal());
        assert!(!TransferStatus::Paused.is_terminal());
    }

    #[test]
    fn test_running_states() {
        assert!(TransferStatus::Processing.is_running());
        assert!(TransferStatus::Paused.is_running());
        assert!(!TransferStatus::Pending.is_running());
        assert!(!TransferStatus::Finished.is_running());
    }

    #[test]
    fn test_identity_distinguishes_direction() {
        let send = TransferIdentity::new(1, 0, TransferDirection::Sending);
        let recv = TransferIdentity::new(1, 0, TransferDirection::Receiving);
        assert_ne!(send, recv);
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"progress","total_size":2048,"bytes_transferred":512}"#;
        let event: TransferEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            TransferEvent::Progress {
                total_size: 2048,
                bytes_transferred: 512
            }
        );

        let json = r#"{"type":"remote_pause_changed","paused":true}"#;
        let event: TransferEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, TransferEvent::RemotePauseChanged { paused: true });
        assert_eq!(event.kind(), "remote_pause_changed");
    }

    #[test]
    fn test_file_info_constructors() {
        let info = FileTransferInfo::incoming(3, 9, "photo.png", 100);
        assert_eq!(info.identity.direction, TransferDirection::Receiving);
        assert!(info.source_path.is_none());

        let info = FileTransferInfo::outgoing(3, 9, "photo.png", 100, "/tmp/photo.png");
        assert_eq!(info.identity.direction, TransferDirection::Sending);
        assert_eq!(info.source_path, Some(PathBuf::from("/tmp/photo.png")));
    }
}
