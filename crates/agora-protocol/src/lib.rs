//! Outbound wire contracts: the community broadcast event envelope,
//! presence payloads, and analytics event payloads.
//!
//! This crate owns the shape of everything the engine hands to its
//! collaborators; it knows nothing about storage or permissions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Page size the broadcaster uses when expanding a point event into the
/// full member roster.
pub const ROSTER_PAGE_SIZE: usize = 100;
/// Maximum number of addresses per outbound delivery batch.
pub const ROSTER_BATCH_SIZE: usize = 100;

pub const COMMUNITY_EVENT_TYPE: &str = "community";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown community event sub type: {0}")]
    UnknownSubType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityEventSubType {
    MemberRemoved,
    MemberBanned,
    OwnershipTransferred,
}

impl CommunityEventSubType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CommunityEventSubType::MemberRemoved => "member_removed",
            CommunityEventSubType::MemberBanned => "member_banned",
            CommunityEventSubType::OwnershipTransferred => "ownership_transferred",
        }
    }
}

impl fmt::Display for CommunityEventSubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommunityEventSubType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member_removed" => Ok(CommunityEventSubType::MemberRemoved),
            "member_banned" => Ok(CommunityEventSubType::MemberBanned),
            "ownership_transferred" => Ok(CommunityEventSubType::OwnershipTransferred),
            other => Err(ProtocolError::UnknownSubType(other.to_owned())),
        }
    }
}

/// Envelope for a point event about one community. `key` deduplicates
/// redeliveries downstream; it is `{community}-{subject}-{timestamp}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityEvent {
    pub event_type: String,
    pub sub_type: CommunityEventSubType,
    pub key: String,
    pub timestamp_unix: i64,
    pub metadata: serde_json::Value,
}

fn build_event(
    sub_type: CommunityEventSubType,
    community_id: &str,
    subject: &str,
    timestamp_unix: i64,
    metadata: serde_json::Value,
) -> CommunityEvent {
    CommunityEvent {
        event_type: COMMUNITY_EVENT_TYPE.to_owned(),
        sub_type,
        key: format!("{community_id}-{subject}-{timestamp_unix}"),
        timestamp_unix,
        metadata,
    }
}

#[must_use]
pub fn member_removed(
    community_id: &str,
    member_address: &str,
    timestamp_unix: i64,
) -> CommunityEvent {
    build_event(
        CommunityEventSubType::MemberRemoved,
        community_id,
        member_address,
        timestamp_unix,
        json!({
            "community_id": community_id,
            "member_address": member_address,
        }),
    )
}

#[must_use]
pub fn member_banned(
    community_id: &str,
    member_address: &str,
    timestamp_unix: i64,
) -> CommunityEvent {
    build_event(
        CommunityEventSubType::MemberBanned,
        community_id,
        member_address,
        timestamp_unix,
        json!({
            "community_id": community_id,
            "member_address": member_address,
        }),
    )
}

#[must_use]
pub fn ownership_transferred(
    community_id: &str,
    previous_owner: &str,
    new_owner: &str,
    timestamp_unix: i64,
) -> CommunityEvent {
    build_event(
        CommunityEventSubType::OwnershipTransferred,
        community_id,
        new_owner,
        timestamp_unix,
        json!({
            "community_id": community_id,
            "previous_owner": previous_owner,
            "new_owner": new_owner,
        }),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectivityStatus {
    Online,
    Offline,
}

/// Presence change published when an address gains or loses membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdate {
    pub community_id: String,
    pub member_address: String,
    pub status: ConnectivityStatus,
}

/// Named analytics event with loose properties. Delivery is
/// fire-and-forget; the sink owns transport and batching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsEvent {
    pub name: &'static str,
    pub properties: serde_json::Value,
}

fn membership_analytics(
    name: &'static str,
    community_id: &str,
    member_address: &str,
) -> AnalyticsEvent {
    AnalyticsEvent {
        name,
        properties: json!({
            "community_id": community_id,
            "member_address": member_address,
        }),
    }
}

#[must_use]
pub fn member_joined_event(community_id: &str, member_address: &str) -> AnalyticsEvent {
    membership_analytics("member_joined", community_id, member_address)
}

#[must_use]
pub fn member_left_event(community_id: &str, member_address: &str) -> AnalyticsEvent {
    membership_analytics("member_left", community_id, member_address)
}

#[must_use]
pub fn member_kicked_event(community_id: &str, member_address: &str) -> AnalyticsEvent {
    membership_analytics("member_kicked", community_id, member_address)
}

#[must_use]
pub fn member_banned_event(community_id: &str, member_address: &str) -> AnalyticsEvent {
    membership_analytics("member_banned", community_id, member_address)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMUNITY: &str = "01J0000000000000000000COMM";
    const ALICE: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const BOB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    #[test]
    fn member_banned_event_shape() {
        let event = member_banned(COMMUNITY, ALICE, 1_700_000_000);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event_type"], "community");
        assert_eq!(value["sub_type"], "member_banned");
        assert_eq!(
            value["key"],
            format!("{COMMUNITY}-{ALICE}-1700000000")
        );
        assert_eq!(value["metadata"]["community_id"], COMMUNITY);
        assert_eq!(value["metadata"]["member_address"], ALICE);
    }

    #[test]
    fn ownership_transferred_keys_on_new_owner() {
        let event = ownership_transferred(COMMUNITY, ALICE, BOB, 42);
        assert_eq!(event.key, format!("{COMMUNITY}-{BOB}-42"));
        assert_eq!(event.metadata["previous_owner"], ALICE);
        assert_eq!(event.metadata["new_owner"], BOB);
    }

    #[test]
    fn sub_type_round_trips_through_str() {
        for sub_type in [
            CommunityEventSubType::MemberRemoved,
            CommunityEventSubType::MemberBanned,
            CommunityEventSubType::OwnershipTransferred,
        ] {
            assert_eq!(sub_type.as_str().parse(), Ok(sub_type));
        }
        assert!("member_promoted".parse::<CommunityEventSubType>().is_err());
    }

    #[test]
    fn presence_status_serializes_screaming() {
        let update = PresenceUpdate {
            community_id: COMMUNITY.to_owned(),
            member_address: ALICE.to_owned(),
            status: ConnectivityStatus::Offline,
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["status"], "OFFLINE");
    }

    #[test]
    fn analytics_events_carry_names_and_properties() {
        let event = member_joined_event(COMMUNITY, ALICE);
        assert_eq!(event.name, "member_joined");
        assert_eq!(event.properties["community_id"], COMMUNITY);
    }
}
