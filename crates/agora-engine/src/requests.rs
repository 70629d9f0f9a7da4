//! Invite / request-to-join workflow. A stored request is always
//! pending; the terminal states (accepted, rejected, cancelled) resolve
//! by removing the row, with accept running the store's atomic
//! member-insert-plus-removal transaction.

use agora_core::{has_permission, Address, CommunityId, Permission, Privacy, RequestId, Role};
use agora_protocol::{member_joined_event, ConnectivityStatus};

use crate::error::EngineError;
use crate::now_unix;
use crate::storage::{JoinRequest, Member, RequestStatus, RequestType};
use crate::CommunityEngine;

impl CommunityEngine {
    /// Creates a pending request. `caller` is the inviter for
    /// [`RequestType::Invite`] (and must hold `invite_users`); for
    /// [`RequestType::RequestToJoin`] the caller must be the requester
    /// itself.
    ///
    /// Collision rule: a request-to-join that finds a pending invite for
    /// the same member does not insert a row. It accepts the invite
    /// atomically and returns it re-labeled as an accepted
    /// request-to-join.
    pub async fn create_request(
        &self,
        community_id: &CommunityId,
        caller: &Address,
        member_address: &Address,
        request_type: RequestType,
    ) -> Result<JoinRequest, EngineError> {
        let community = self.require_community(community_id).await?;

        match request_type {
            RequestType::Invite => {
                if caller == member_address {
                    return Err(EngineError::InvalidRequest("cannot invite yourself"));
                }
                let caller_role = self.store.member_role(community_id, caller).await?;
                if !has_permission(caller_role, Permission::InviteUsers) {
                    return Err(EngineError::NotAuthorized(
                        "insufficient role to invite users",
                    ));
                }
            }
            RequestType::RequestToJoin => {
                if caller != member_address {
                    return Err(EngineError::NotAuthorized(
                        "join requests are created by the requester itself",
                    ));
                }
                if community.privacy == Privacy::Public {
                    return Err(EngineError::InvalidRequest(
                        "public communities are joined directly",
                    ));
                }
            }
        }

        if self.store.is_banned(community_id, member_address).await? {
            return Err(EngineError::NotAuthorized(
                "address is banned from this community",
            ));
        }
        let member_role = self.store.member_role(community_id, member_address).await?;
        if member_role != Role::None {
            return Err(EngineError::InvalidRequest("already a member"));
        }
        if self
            .store
            .pending_request(community_id, member_address, request_type)
            .await?
            .is_some()
        {
            return Err(EngineError::InvalidRequest("request already exists"));
        }

        if request_type == RequestType::RequestToJoin {
            if let Some(invite) = self
                .store
                .pending_request(community_id, member_address, RequestType::Invite)
                .await?
            {
                self.accept_pending(&invite).await?;
                return Ok(JoinRequest {
                    request_type: RequestType::RequestToJoin,
                    status: RequestStatus::Accepted,
                    ..invite
                });
            }
        }

        let request = JoinRequest {
            id: RequestId::new(),
            community_id: *community_id,
            member_address: member_address.clone(),
            request_type,
            status: RequestStatus::Pending,
            created_at_unix: now_unix(),
        };
        self.store.create_request(&request).await?;
        Ok(request)
    }

    /// Resolves a pending request with a terminal `intent`. Who may do
    /// what depends on the request type:
    /// invites are accepted or rejected by the invited address and
    /// cancelled only by an `invite_users` holder; join requests are
    /// cancelled by the requester and accepted or rejected only by an
    /// `invite_users` holder.
    pub async fn resolve_request(
        &self,
        request_id: &RequestId,
        caller: &Address,
        intent: RequestStatus,
    ) -> Result<(), EngineError> {
        if intent == RequestStatus::Pending {
            return Err(EngineError::InvalidRequest(
                "pending is not a resolution",
            ));
        }
        let request = self
            .store
            .get_request(request_id)
            .await?
            .ok_or(EngineError::NotFound("request"))?;

        match (request.request_type, intent) {
            (RequestType::Invite, RequestStatus::Cancelled) => {
                if *caller == request.member_address {
                    return Err(EngineError::NotAuthorized(
                        "the invited address may not cancel its invite",
                    ));
                }
                self.require_invite_permission(&request.community_id, caller)
                    .await?;
            }
            (RequestType::Invite, _) => {
                if *caller != request.member_address {
                    return Err(EngineError::NotAuthorized(
                        "only the invited address may resolve its invite",
                    ));
                }
            }
            (RequestType::RequestToJoin, RequestStatus::Cancelled) => {
                if *caller != request.member_address {
                    return Err(EngineError::NotAuthorized(
                        "only the requester may cancel its join request",
                    ));
                }
            }
            (RequestType::RequestToJoin, _) => {
                if *caller == request.member_address {
                    return Err(EngineError::NotAuthorized(
                        "requesters may not resolve their own join request",
                    ));
                }
                self.require_invite_permission(&request.community_id, caller)
                    .await?;
            }
        }

        if intent == RequestStatus::Accepted {
            self.accept_pending(&request).await?;
        } else {
            self.store.remove_request(request_id).await?;
        }
        Ok(())
    }

    async fn require_invite_permission(
        &self,
        community_id: &CommunityId,
        caller: &Address,
    ) -> Result<(), EngineError> {
        let role = self.store.member_role(community_id, caller).await?;
        if !has_permission(role, Permission::InviteUsers) {
            return Err(EngineError::NotAuthorized(
                "insufficient role to resolve this request",
            ));
        }
        Ok(())
    }

    /// Runs the atomic accept-transaction, then the same post-join side
    /// effects a direct join performs. A ban written after the request
    /// was created still blocks acceptance.
    async fn accept_pending(&self, request: &JoinRequest) -> Result<(), EngineError> {
        if self
            .store
            .is_banned(&request.community_id, &request.member_address)
            .await?
        {
            return Err(EngineError::NotAuthorized(
                "address is banned from this community",
            ));
        }
        let member = Member {
            community_id: request.community_id,
            address: request.member_address.clone(),
            role: Role::Member,
            joined_at_unix: now_unix(),
        };
        self.store
            .accept_request_transaction(&request.id, &member)
            .await?;
        self.analytics.record(member_joined_event(
            &request.community_id.to_string(),
            request.member_address.as_str(),
        ));
        self.publish_presence(
            &request.community_id,
            &request.member_address,
            ConnectivityStatus::Online,
        )
        .await;
        Ok(())
    }
}
