//! Simulated remote device
//!
//! Plays the transfer core for a single transfer. Requests from the widget
//! arrive over a channel, notifications go back over another one, and bytes
//! move in fixed steps on a timer.

use cosmic_connect_transfer::{
    CoreRequest, PeerId, TransferCore, TransferDirection, TransferEvent, TransferId,
    TransferIdentity,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Notification for the widget side
pub type PeerEvent = (TransferIdentity, TransferEvent);

/// [`TransferCore`] forwarding every request to the simulated peer
pub struct ChannelCore {
    requests: mpsc::UnboundedSender<CoreRequest>,
}

impl ChannelCore {
    pub fn new(requests: mpsc::UnboundedSender<CoreRequest>) -> Self {
        Self { requests }
    }

    fn send(&self, request: CoreRequest) {
        if let Err(e) = self.requests.send(request) {
            debug!("Peer already gone, dropping {:?}", e.0);
        }
    }
}

impl TransferCore for ChannelCore {
    fn cancel_send(&self, peer_id: PeerId, transfer_id: TransferId) {
        self.send(CoreRequest::CancelSend {
            peer_id,
            transfer_id,
        });
    }

    fn reject_receive(&self, peer_id: PeerId, transfer_id: TransferId) {
        self.send(CoreRequest::RejectReceive {
            peer_id,
            transfer_id,
        });
    }

    fn accept_receive(&self, peer_id: PeerId, transfer_id: TransferId, destination: &Path) {
        self.send(CoreRequest::AcceptReceive {
            peer_id,
            transfer_id,
            destination: destination.to_path_buf(),
        });
    }

    fn toggle_pause_receive(&self, peer_id: PeerId, transfer_id: TransferId) {
        self.send(CoreRequest::TogglePauseReceive {
            peer_id,
            transfer_id,
        });
    }

    fn toggle_pause_send(&self, peer_id: PeerId, transfer_id: TransferId) {
        self.send(CoreRequest::TogglePauseSend {
            peer_id,
            transfer_id,
        });
    }
}

/// Script for one simulated transfer
#[derive(Debug, Clone)]
pub struct PeerScript {
    pub identity: TransferIdentity,
    /// File being sent, or offered to us when receiving
    pub source: PathBuf,
    pub file_size: u64,
    pub steps: u32,
    pub tick: Duration,
}

enum Outcome {
    Continue,
    Stop,
}

/// Remote side of the transfer
pub struct SimulatedPeer {
    script: PeerScript,
    requests: mpsc::UnboundedReceiver<CoreRequest>,
    events: mpsc::Sender<PeerEvent>,
    destination: Option<PathBuf>,
    paused: bool,
}

impl SimulatedPeer {
    pub fn new(
        script: PeerScript,
        requests: mpsc::UnboundedReceiver<CoreRequest>,
        events: mpsc::Sender<PeerEvent>,
    ) -> Self {
        Self {
            script,
            requests,
            events,
            destination: None,
            paused: false,
        }
    }

    /// Drive the transfer to completion, cancellation or rejection
    pub async fn run(mut self) -> anyhow::Result<()> {
        match self.script.identity.direction {
            TransferDirection::Sending => self.emit(TransferEvent::Accepted).await?,
            TransferDirection::Receiving => {
                if !self.wait_for_answer().await? {
                    return Ok(());
                }
            }
        }

        let mut interval = tokio::time::interval(self.script.tick);
        interval.tick().await;

        let mut step = 0;
        while step < self.script.steps {
            tokio::select! {
                request = self.requests.recv() => {
                    let Some(request) = request else {
                        debug!("Widget side closed, stopping peer");
                        return Ok(());
                    };
                    if let Outcome::Stop = self.handle_request(request).await? {
                        return Ok(());
                    }
                }
                _ = interval.tick() => {
                    if self.paused {
                        continue;
                    }
                    step += 1;
                    let transferred = self.script.file_size * u64::from(step)
                        / u64::from(self.script.steps.max(1));
                    self.emit(TransferEvent::Progress {
                        total_size: self.script.file_size,
                        bytes_transferred: transferred,
                    })
                    .await?;
                }
            }
        }

        let file_path = self.finish().await?;
        self.emit(TransferEvent::Finished { file_path }).await
    }

    /// Wait for the user to accept or reject an offered file
    async fn wait_for_answer(&mut self) -> anyhow::Result<bool> {
        while let Some(request) = self.requests.recv().await {
            match request {
                CoreRequest::AcceptReceive { destination, .. } => {
                    info!("Peer: receiver accepted into {}", destination.display());
                    self.destination = Some(destination);
                    self.emit(TransferEvent::Accepted).await?;
                    return Ok(true);
                }
                CoreRequest::RejectReceive { .. } => {
                    info!("Peer: receiver rejected the file");
                    return Ok(false);
                }
                other => warn!("Peer: unexpected request before accept: {:?}", other),
            }
        }
        Ok(false)
    }

    async fn handle_request(&mut self, request: CoreRequest) -> anyhow::Result<Outcome> {
        match request {
            CoreRequest::TogglePauseSend { .. } | CoreRequest::TogglePauseReceive { .. } => {
                self.paused = !self.paused;
                info!("Peer: transfer paused: {}", self.paused);
                let event = if self.paused {
                    TransferEvent::Paused
                } else {
                    TransferEvent::Accepted
                };
                self.emit(event).await?;
                Ok(Outcome::Continue)
            }
            CoreRequest::CancelSend { .. } | CoreRequest::RejectReceive { .. } => {
                info!("Peer: transfer aborted by the widget");
                self.emit(TransferEvent::Cancelled).await?;
                Ok(Outcome::Stop)
            }
            CoreRequest::AcceptReceive { .. } => {
                warn!("Peer: transfer already accepted");
                Ok(Outcome::Continue)
            }
        }
    }

    async fn finish(&self) -> anyhow::Result<PathBuf> {
        match &self.destination {
            Some(destination) => {
                tokio::fs::copy(&self.script.source, destination).await?;
                Ok(destination.clone())
            }
            None => Ok(self.script.source.clone()),
        }
    }

    async fn emit(&self, event: TransferEvent) -> anyhow::Result<()> {
        debug!("Peer: emitting {}", event.kind());
        self.events.send((self.script.identity, event)).await?;
        Ok(())
    }
}
