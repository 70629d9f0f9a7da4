//! Community membership lifecycle engine: joins, leaves, kicks, bans,
//! the invite/request workflow, and ownership transfer.
//!
//! The engine owns authorization and orchestration only. Persistence,
//! voice sessions, name resolution, presence, analytics, and broadcast
//! delivery are collaborators reached through the traits in [`storage`],
//! [`ports`], and [`broadcast`]. Every mutation follows the same order:
//! permission check, storage mutation, best-effort side effects, then a
//! broadcast enqueued onto a background queue so delivery never blocks or
//! fails the caller.

mod bans;
mod broadcast;
mod error;
mod members;
mod ownership;
mod ports;
mod requests;
mod storage;


use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use agora_core::{Address, CommunityId};
use agora_protocol::{ConnectivityStatus, PresenceUpdate};

pub use broadcast::{BroadcastError, Broadcaster, EventBus};
pub use error::EngineError;
pub use ports::{
    AnalyticsSink, NameRegistry, PresenceError, PresencePublisher, RegistryError, VoiceError,
    VoiceGateway,
};
pub use storage::{
    BanRecord, Community, CommunityStore, JoinRequest, Member, Page, Pagination, RequestStatus,
    RequestType, StorageError,
};

/// The membership engine. One instance serves all communities; it holds
/// no per-community state of its own.
pub struct CommunityEngine {
    store: Arc<dyn CommunityStore>,
    voice: Arc<dyn VoiceGateway>,
    names: Arc<dyn NameRegistry>,
    presence: Arc<dyn PresencePublisher>,
    analytics: Arc<dyn AnalyticsSink>,
    events: EventBus,
}

impl CommunityEngine {
    #[must_use]
    pub fn new(
        store: Arc<dyn CommunityStore>,
        voice: Arc<dyn VoiceGateway>,
        names: Arc<dyn NameRegistry>,
        presence: Arc<dyn PresencePublisher>,
        analytics: Arc<dyn AnalyticsSink>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            voice,
            names,
            presence,
            analytics,
            events,
        }
    }

    pub(crate) async fn require_community(
        &self,
        community_id: &CommunityId,
    ) -> Result<Community, EngineError> {
        self.store
            .get_community(community_id)
            .await?
            .ok_or(EngineError::NotFound("community"))
    }

    /// Best-effort voice-session removal. The membership mutation has
    /// already been applied when this runs; a gateway failure is logged
    /// and swallowed.
    pub(crate) async fn remove_from_voice(&self, community_id: &CommunityId, address: &Address) {
        if let Err(error) = self.voice.kick_from_voice(community_id, address).await {
            tracing::warn!(
                event = "voice.kick_failed",
                community_id = %community_id,
                member = %address,
                error = %error,
                "voice removal failed after membership change"
            );
        }
    }

    /// Best-effort presence publish, same failure policy as voice.
    pub(crate) async fn publish_presence(
        &self,
        community_id: &CommunityId,
        address: &Address,
        status: ConnectivityStatus,
    ) {
        let update = PresenceUpdate {
            community_id: community_id.to_string(),
            member_address: address.to_string(),
            status,
        };
        if let Err(error) = self.presence.publish(update).await {
            tracing::warn!(
                event = "presence.publish_failed",
                community_id = %community_id,
                member = %address,
                error = %error,
                "presence update dropped"
            );
        }
    }
}

pub(crate) fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
        })
}

/// Installs a JSON `tracing` subscriber filtered by `RUST_LOG`
/// (default `info`). For binaries embedding the engine.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .init();
}
