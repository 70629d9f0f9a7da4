//! Membership mutations: join, leave, kick, and role updates.
//!
//! Every entry point here is idempotent where the target may already be
//! in the desired state; duplicate concurrent calls are safe without
//! locks.

use agora_core::{
    can_act_on_member, has_permission, Address, CommunityId, Permission, Privacy, Role,
};
use agora_protocol::{
    member_joined_event, member_kicked_event, member_left_event, member_removed,
    ConnectivityStatus,
};

use crate::error::EngineError;
use crate::now_unix;
use crate::storage::Member;
use crate::CommunityEngine;

impl CommunityEngine {
    /// Direct join. Public communities only; a private community is
    /// entered through the request workflow.
    pub async fn join(
        &self,
        community_id: &CommunityId,
        address: &Address,
    ) -> Result<(), EngineError> {
        let community = self.require_community(community_id).await?;
        if self.store.is_member(community_id, address).await? {
            return Ok(());
        }
        if self.store.is_banned(community_id, address).await? {
            return Err(EngineError::NotAuthorized(
                "address is banned from this community",
            ));
        }
        if community.privacy == Privacy::Private {
            return Err(EngineError::NotAuthorized(
                "private communities are joined through the request workflow",
            ));
        }
        let member = Member {
            community_id: *community_id,
            address: address.clone(),
            role: Role::Member,
            joined_at_unix: now_unix(),
        };
        self.store.add_member(&member).await?;
        self.analytics
            .record(member_joined_event(&community_id.to_string(), address.as_str()));
        self.publish_presence(community_id, address, ConnectivityStatus::Online)
            .await;
        Ok(())
    }

    /// Voluntary leave. Owners may never self-remove; everyone else
    /// leaves freely, and leaving twice is a no-op.
    pub async fn leave(
        &self,
        community_id: &CommunityId,
        address: &Address,
    ) -> Result<(), EngineError> {
        self.require_community(community_id).await?;
        let role = self.store.member_role(community_id, address).await?;
        if role == Role::None {
            return Ok(());
        }
        if role == Role::Owner {
            return Err(EngineError::NotAuthorized(
                "owners may not leave their own community",
            ));
        }
        self.store.remove_member(community_id, address).await?;
        self.store.unlike_posts(community_id, address).await?;
        self.analytics
            .record(member_left_event(&community_id.to_string(), address.as_str()));
        self.publish_presence(community_id, address, ConnectivityStatus::Offline)
            .await;
        Ok(())
    }

    /// Moderation removal. No-op when the target is not a member, so the
    /// no-op check precedes authorization.
    pub async fn kick(
        &self,
        community_id: &CommunityId,
        kicker: &Address,
        target: &Address,
    ) -> Result<(), EngineError> {
        self.require_community(community_id).await?;
        let (kicker_role, target_role) = self.role_pair(community_id, kicker, target).await?;
        if target_role == Role::None {
            return Ok(());
        }
        if !can_act_on_member(kicker_role, target_role) {
            return Err(EngineError::NotAuthorized(
                "insufficient role to remove this member",
            ));
        }
        self.store.remove_member(community_id, target).await?;
        self.store.unlike_posts(community_id, target).await?;
        self.analytics
            .record(member_kicked_event(&community_id.to_string(), target.as_str()));
        self.remove_from_voice(community_id, target).await;
        self.publish_presence(community_id, target, ConnectivityStatus::Offline)
            .await;
        self.events.enqueue(member_removed(
            &community_id.to_string(),
            target.as_str(),
            now_unix(),
        ));
        Ok(())
    }

    /// Writes a new role for `target`. A requested role of `Owner` routes
    /// through ownership transfer instead of the generic role write;
    /// `None` is never assignable (removal goes through leave/kick/ban).
    pub async fn update_member_role(
        &self,
        community_id: &CommunityId,
        updater: &Address,
        target: &Address,
        new_role: Role,
    ) -> Result<(), EngineError> {
        if new_role == Role::Owner {
            return self.transfer_ownership(community_id, updater, target).await;
        }
        if new_role == Role::None {
            return Err(EngineError::InvalidRequest(
                "role none is not assignable",
            ));
        }
        self.require_community(community_id).await?;
        if updater == target {
            return Err(EngineError::NotAuthorized(
                "members may not change their own role",
            ));
        }
        let (updater_role, target_role) = self.role_pair(community_id, updater, target).await?;
        if !has_permission(updater_role, Permission::AssignRoles)
            || !can_act_on_member(updater_role, target_role)
        {
            return Err(EngineError::NotAuthorized(
                "insufficient role to assign roles to this member",
            ));
        }
        self.store
            .update_member_role(community_id, target, new_role)
            .await?;
        Ok(())
    }

    /// Batch lookup of two roles; absent addresses come back as
    /// `Role::None`.
    pub(crate) async fn role_pair(
        &self,
        community_id: &CommunityId,
        first: &Address,
        second: &Address,
    ) -> Result<(Role, Role), EngineError> {
        let roles = self
            .store
            .member_roles(community_id, &[first.clone(), second.clone()])
            .await?;
        Ok((
            roles.get(first).copied().unwrap_or(Role::None),
            roles.get(second).copied().unwrap_or(Role::None),
        ))
    }
}
