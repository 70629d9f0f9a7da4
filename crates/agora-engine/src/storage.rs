//! Persistence boundary. The engine talks to one `CommunityStore`; the
//! concrete implementation (and its transactional guarantees) live with
//! the embedding service.

use std::collections::HashMap;

use agora_core::{Address, CommunityId, CommunityName, Privacy, RequestId, Role, Visibility};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque storage failure. The engine propagates these unchanged; it
/// never inspects or retries them.
#[derive(Debug, Clone, thiserror::Error)]
#[error("storage error: {0}")]
pub struct StorageError(String);

impl StorageError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub id: CommunityId,
    pub name: CommunityName,
    pub privacy: Privacy,
    pub visibility: Visibility,
    pub owner_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub community_id: CommunityId,
    pub address: Address,
    pub role: Role,
    pub joined_at_unix: i64,
}

/// Persists independently of membership; removal requires an explicit
/// unban.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanRecord {
    pub community_id: CommunityId,
    pub address: Address,
    pub banned_by: Address,
    pub banned_at_unix: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Invite,
    RequestToJoin,
}

/// `Pending` is the only state a stored request can hold; the three
/// terminal states exist on the wire (resolution intent, collision
/// results) and resolve by removing the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub id: RequestId,
    pub community_id: CommunityId,
    pub member_address: Address,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub created_at_unix: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Pagination {
    #[must_use]
    pub fn clamped(self, max_limit: usize) -> Self {
        Self {
            limit: self.limit.min(max_limit),
            offset: self.offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// All persistence the engine needs, one method per storage operation.
///
/// Two guarantees are delegated here rather than re-implemented in the
/// engine: at most one pending request per (community, member, type), and
/// the atomicity of [`accept_request_transaction`].
///
/// [`accept_request_transaction`]: CommunityStore::accept_request_transaction
#[async_trait]
pub trait CommunityStore: Send + Sync {
    async fn get_community(
        &self,
        community_id: &CommunityId,
    ) -> Result<Option<Community>, StorageError>;

    async fn community_exists(&self, community_id: &CommunityId) -> Result<bool, StorageError>;

    /// `Role::None` when the address is not a member.
    async fn member_role(
        &self,
        community_id: &CommunityId,
        address: &Address,
    ) -> Result<Role, StorageError>;

    /// Batch variant of [`member_role`]; addresses absent from the result
    /// are not members.
    ///
    /// [`member_role`]: CommunityStore::member_role
    async fn member_roles(
        &self,
        community_id: &CommunityId,
        addresses: &[Address],
    ) -> Result<HashMap<Address, Role>, StorageError>;

    async fn is_member(
        &self,
        community_id: &CommunityId,
        address: &Address,
    ) -> Result<bool, StorageError>;

    async fn is_banned(
        &self,
        community_id: &CommunityId,
        address: &Address,
    ) -> Result<bool, StorageError>;

    /// Inserting an existing membership must be a no-op, not an error.
    async fn add_member(&self, member: &Member) -> Result<(), StorageError>;

    async fn remove_member(
        &self,
        community_id: &CommunityId,
        address: &Address,
    ) -> Result<(), StorageError>;

    async fn ban_member(&self, ban: &BanRecord) -> Result<(), StorageError>;

    async fn unban_member(
        &self,
        community_id: &CommunityId,
        address: &Address,
    ) -> Result<(), StorageError>;

    async fn banned_members(
        &self,
        community_id: &CommunityId,
        pagination: Pagination,
    ) -> Result<Page<BanRecord>, StorageError>;

    async fn update_member_role(
        &self,
        community_id: &CommunityId,
        address: &Address,
        role: Role,
    ) -> Result<(), StorageError>;

    /// Atomically reassigns ownership. What role the previous owner is
    /// left with is this layer's decision; the engine does not read or
    /// rewrite it.
    async fn transfer_ownership(
        &self,
        community_id: &CommunityId,
        new_owner: &Address,
    ) -> Result<(), StorageError>;

    async fn create_request(&self, request: &JoinRequest) -> Result<(), StorageError>;

    async fn get_request(
        &self,
        request_id: &RequestId,
    ) -> Result<Option<JoinRequest>, StorageError>;

    async fn pending_request(
        &self,
        community_id: &CommunityId,
        address: &Address,
        request_type: RequestType,
    ) -> Result<Option<JoinRequest>, StorageError>;

    /// Atomic accept: insert the member row and remove the request in one
    /// transaction. No observer may see one effect without the other.
    async fn accept_request_transaction(
        &self,
        request_id: &RequestId,
        member: &Member,
    ) -> Result<(), StorageError>;

    async fn remove_request(&self, request_id: &RequestId) -> Result<(), StorageError>;

    /// Withdraws the address's likes on posts in the community; runs on
    /// kick, ban, and voluntary leave.
    async fn unlike_posts(
        &self,
        community_id: &CommunityId,
        address: &Address,
    ) -> Result<(), StorageError>;
}
