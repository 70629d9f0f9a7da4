//! Ownership transfer. Reached only through
//! [`CommunityEngine::update_member_role`] with a requested role of
//! `Owner`; there is no direct entry point.

use agora_core::{Address, CommunityId};
use agora_protocol::ownership_transferred;

use crate::error::EngineError;
use crate::now_unix;
use crate::CommunityEngine;

impl CommunityEngine {
    /// Only the current owner may initiate. The incoming owner must not
    /// be banned and must hold a claimed identity name, since an unnamed
    /// address cannot front a public community. The storage layer
    /// reassigns ownership atomically and decides what role the previous
    /// owner keeps.
    pub(crate) async fn transfer_ownership(
        &self,
        community_id: &CommunityId,
        updater: &Address,
        new_owner: &Address,
    ) -> Result<(), EngineError> {
        let community = self.require_community(community_id).await?;
        if community.owner_address != *updater {
            return Err(EngineError::NotAuthorized(
                "only the current owner may transfer ownership",
            ));
        }
        if updater == new_owner {
            return Err(EngineError::NotAuthorized(
                "ownership is already held by this address",
            ));
        }
        if self.store.is_banned(community_id, new_owner).await? {
            return Err(EngineError::NotAuthorized(
                "address is banned from this community",
            ));
        }
        if !self.names.has_claimed_name(new_owner).await? {
            return Err(EngineError::InvalidRequest(
                "the new owner must hold a claimed name",
            ));
        }
        self.store.transfer_ownership(community_id, new_owner).await?;
        self.events.enqueue(ownership_transferred(
            &community_id.to_string(),
            updater.as_str(),
            new_owner.as_str(),
            now_unix(),
        ));
        Ok(())
    }
}
