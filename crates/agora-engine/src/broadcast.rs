//! Background broadcast queue. Mutations enqueue point events
//! synchronously; a dedicated worker task owns the [`Broadcaster`] and
//! drains the queue, so delivery happens after the mutating call has
//! already returned and can never fail it. The worker's lifecycle is
//! explicit: it runs until every [`EventBus`] handle is dropped.

use std::sync::Arc;

use agora_protocol::CommunityEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, thiserror::Error)]
#[error("broadcast: {0}")]
pub struct BroadcastError(String);

impl BroadcastError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Delivery collaborator. Point events arrive exactly once per mutation;
/// expanding roster-wide notifications into batches is this side's job.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, event: CommunityEvent) -> Result<(), BroadcastError>;
}

/// Sending half of the broadcast queue. Cheap to clone; `enqueue` never
/// blocks.
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<CommunityEvent>,
}

impl EventBus {
    /// Spawns the worker task and returns the bus plus the worker's
    /// handle. The worker exits once all bus clones are dropped and the
    /// queue has drained.
    #[must_use]
    pub fn start(broadcaster: Arc<dyn Broadcaster>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<CommunityEvent>();
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let sub_type = event.sub_type;
                let key = event.key.clone();
                if let Err(error) = broadcaster.broadcast(event).await {
                    tracing::warn!(
                        event = "broadcast.delivery_failed",
                        sub_type = %sub_type,
                        key = %key,
                        error = %error,
                        "community event dropped after failed delivery"
                    );
                }
            }
        });
        (Self { tx }, handle)
    }

    pub fn enqueue(&self, event: CommunityEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!(
                event = "broadcast.queue_closed",
                "community event dropped, worker no longer running"
            );
        }
    }
}
