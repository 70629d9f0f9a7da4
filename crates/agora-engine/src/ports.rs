//! Outbound collaborator seams. Voice and presence are best-effort (the
//! engine logs and continues on failure); the name registry is a hard
//! dependency of ownership transfer; analytics is fire-and-forget.

use agora_core::{Address, CommunityId};
use agora_protocol::{AnalyticsEvent, PresenceUpdate};
use async_trait::async_trait;

#[derive(Debug, Clone, thiserror::Error)]
#[error("voice gateway: {0}")]
pub struct VoiceError(String);

impl VoiceError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("name registry: {0}")]
pub struct RegistryError(String);

impl RegistryError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("presence channel: {0}")]
pub struct PresenceError(String);

impl PresenceError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Live voice-session control for a community.
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    async fn kick_from_voice(
        &self,
        community_id: &CommunityId,
        address: &Address,
    ) -> Result<(), VoiceError>;
}

/// Resolves whether an address holds at least one claimable identity
/// name. Consulted only by ownership transfer.
#[async_trait]
pub trait NameRegistry: Send + Sync {
    async fn has_claimed_name(&self, address: &Address) -> Result<bool, RegistryError>;
}

/// Connectivity fan-out for membership changes.
#[async_trait]
pub trait PresencePublisher: Send + Sync {
    async fn publish(&self, update: PresenceUpdate) -> Result<(), PresenceError>;
}

/// Fire-and-forget analytics. Implementations own transport, batching,
/// and any buffering; `record` must not block.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: AnalyticsEvent);
}
