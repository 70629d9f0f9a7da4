//! Ban enforcement. A ban is a persistent block, independent of
//! membership: banning a member kicks them first, banning a non-member
//! writes the block pre-emptively, and unbanning never restores
//! membership.

use agora_core::{
    can_act_on_member, has_permission, Address, CommunityId, Permission, Privacy, Role,
};
use agora_protocol::{member_banned, member_banned_event, ConnectivityStatus, ROSTER_PAGE_SIZE};

use crate::error::EngineError;
use crate::now_unix;
use crate::storage::{BanRecord, Page, Pagination};
use crate::CommunityEngine;

impl CommunityEngine {
    pub async fn ban(
        &self,
        community_id: &CommunityId,
        banner: &Address,
        target: &Address,
    ) -> Result<(), EngineError> {
        let community = self.require_community(community_id).await?;
        let (banner_role, target_role) = self.role_pair(community_id, banner, target).await?;
        Self::authorize_ban(banner_role, target_role)?;

        if target_role.is_member() {
            self.store.remove_member(community_id, target).await?;
            self.store.unlike_posts(community_id, target).await?;
            self.analytics
                .record(member_banned_event(&community_id.to_string(), target.as_str()));
        }
        let ban = BanRecord {
            community_id: *community_id,
            address: target.clone(),
            banned_by: banner.clone(),
            banned_at_unix: now_unix(),
        };
        self.store.ban_member(&ban).await?;

        // Voice sessions only exist for private communities.
        if community.privacy == Privacy::Private {
            self.remove_from_voice(community_id, target).await;
        }
        self.publish_presence(community_id, target, ConnectivityStatus::Offline)
            .await;
        self.events.enqueue(member_banned(
            &community_id.to_string(),
            target.as_str(),
            now_unix(),
        ));
        Ok(())
    }

    /// No-op when the target is not banned; the permission check still
    /// runs first.
    pub async fn unban(
        &self,
        community_id: &CommunityId,
        unbanner: &Address,
        target: &Address,
    ) -> Result<(), EngineError> {
        self.require_community(community_id).await?;
        let (unbanner_role, target_role) = self.role_pair(community_id, unbanner, target).await?;
        Self::authorize_ban(unbanner_role, target_role)?;

        if !self.store.is_banned(community_id, target).await? {
            return Ok(());
        }
        self.store.unban_member(community_id, target).await?;
        Ok(())
    }

    /// Paginated ban list, `ban_players` gated. Profile hydration of the
    /// returned addresses belongs to the caller.
    pub async fn banned_members(
        &self,
        community_id: &CommunityId,
        caller: &Address,
        pagination: Pagination,
    ) -> Result<Page<BanRecord>, EngineError> {
        self.require_community(community_id).await?;
        let role = self.store.member_role(community_id, caller).await?;
        if !has_permission(role, Permission::BanPlayers) {
            return Err(EngineError::NotAuthorized(
                "insufficient role to view the ban list",
            ));
        }
        let page = self
            .store
            .banned_members(community_id, pagination.clamped(ROSTER_PAGE_SIZE))
            .await?;
        Ok(page)
    }

    /// Ban and unban share one rule: `ban_players` permission, and the
    /// action table must allow the pair, with `Role::None` targets
    /// explicitly permitted so non-members can be blocked pre-emptively.
    fn authorize_ban(actor: Role, target: Role) -> Result<(), EngineError> {
        if !has_permission(actor, Permission::BanPlayers)
            || !(can_act_on_member(actor, target) || target == Role::None)
        {
            return Err(EngineError::NotAuthorized(
                "insufficient role to ban or unban this member",
            ));
        }
        Ok(())
    }
}
