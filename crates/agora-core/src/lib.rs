//! Core domain types for the community membership engine: identifiers,
//! roles, the static role/permission matrix, and the role action table.
//!
//! Everything in this crate is pure data and pure functions. Storage,
//! transport, and side effects live in `agora-engine`.

use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid community id: {0}")]
    InvalidCommunityId(String),
    #[error("invalid request id: {0}")]
    InvalidRequestId(String),
    #[error("invalid community name: {0}")]
    InvalidCommunityName(String),
}

/// A wallet address in canonical form: `0x` followed by 40 lowercase hex
/// digits. Parsing lowercases its input, so two addresses that differ only
/// in case compare equal after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let canonical = value.trim().to_ascii_lowercase();
        let hex = canonical
            .strip_prefix("0x")
            .ok_or_else(|| DomainError::InvalidAddress(value.clone()))?;
        if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidAddress(value));
        }
        Ok(Self(canonical))
    }
}

impl TryFrom<&str> for Address {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_owned())
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! ulid_id {
    ($name:ident, $error:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Ulid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Ulid::from_string(&value)
                    .map(Self)
                    .map_err(|_| DomainError::$error(value))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

ulid_id!(CommunityId, InvalidCommunityId);
ulid_id!(RequestId, InvalidRequestId);

/// Display name of a community: 1 to 64 characters after trimming, no
/// control characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommunityName(String);

impl CommunityName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CommunityName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty()
            || trimmed.chars().count() > 64
            || trimmed.chars().any(char::is_control)
        {
            return Err(DomainError::InvalidCommunityName(value));
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl From<CommunityName> for String {
    fn from(value: CommunityName) -> Self {
        value.0
    }
}

impl fmt::Display for CommunityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether non-members may join directly or must go through the request
/// workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    Public,
    Private,
}

/// Directory listing flag. Carried on the community record; membership
/// operations never consult it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Role of an address within a community. `None` means the address is not
/// a member; it participates in the action table so that moderation of
/// non-members (ban, unban) stays table-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    None,
    Member,
    Moderator,
    Owner,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::None, Role::Member, Role::Moderator, Role::Owner];

    #[must_use]
    pub const fn is_member(self) -> bool {
        !matches!(self, Role::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    EditInfo,
    DeleteCommunity,
    BanPlayers,
    AssignRoles,
    InviteUsers,
    ModerateContent,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Permission::EditInfo,
        Permission::DeleteCommunity,
        Permission::BanPlayers,
        Permission::AssignRoles,
        Permission::InviteUsers,
        Permission::ModerateContent,
    ];
}

const fn permission_mask(permission: Permission) -> u64 {
    match permission {
        Permission::EditInfo => 1 << 0,
        Permission::DeleteCommunity => 1 << 1,
        Permission::BanPlayers => 1 << 2,
        Permission::AssignRoles => 1 << 3,
        Permission::InviteUsers => 1 << 4,
        Permission::ModerateContent => 1 << 5,
    }
}

/// Set of permissions packed into a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionSet(u64);

impl PermissionSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, permission: Permission) -> bool {
        self.0 & permission_mask(permission) != 0
    }

    #[must_use]
    pub const fn with(self, permission: Permission) -> Self {
        Self(self.0 | permission_mask(permission))
    }
}

/// Static permission grants per role. Owners hold every permission;
/// moderators a fixed operational subset; plain members and non-members
/// hold none.
#[must_use]
pub const fn base_permissions(role: Role) -> PermissionSet {
    match role {
        Role::Owner => PermissionSet::empty()
            .with(Permission::EditInfo)
            .with(Permission::DeleteCommunity)
            .with(Permission::BanPlayers)
            .with(Permission::AssignRoles)
            .with(Permission::InviteUsers)
            .with(Permission::ModerateContent),
        Role::Moderator => PermissionSet::empty()
            .with(Permission::EditInfo)
            .with(Permission::BanPlayers)
            .with(Permission::InviteUsers)
            .with(Permission::ModerateContent),
        Role::Member | Role::None => PermissionSet::empty(),
    }
}

#[must_use]
pub const fn has_permission(role: Role, permission: Permission) -> bool {
    base_permissions(role).contains(permission)
}

/// The roles allowed to perform moderation actions (kick, ban, role
/// changes) against a member holding `target`. This is a lookup table,
/// not a rank comparison: moderators may not act on fellow moderators,
/// and nobody acts on the owner.
#[must_use]
pub const fn allowed_actors(target: Role) -> &'static [Role] {
    match target {
        Role::Owner | Role::None => &[],
        Role::Moderator => &[Role::Owner],
        Role::Member => &[Role::Owner, Role::Moderator],
    }
}

/// Whether `actor` may moderate a member currently holding `target`.
/// Returns `false` when the target is not a member; ban and unban layer
/// their own non-member allowance on top of this.
#[must_use]
pub fn can_act_on_member(actor: Role, target: Role) -> bool {
    allowed_actors(target).contains(&actor)
}
