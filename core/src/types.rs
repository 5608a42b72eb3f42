//! Domain DTOs for the user API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! the integration tests catch drift between the two crates. A blank city is
//! the same as no city everywhere in this crate: it deserializes to `None`
//! and `None` is never serialized.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::error::ApiError;

/// Rejected identifier text or value.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("user id is invalid")]
pub struct InvalidUserId;

impl From<InvalidUserId> for ApiError {
    fn from(err: InvalidUserId) -> Self {
        ApiError::Validation(err.to_string())
    }
}

/// Server-assigned, strictly positive user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct UserId(u64);

impl UserId {
    pub fn new(id: u64) -> Result<Self, InvalidUserId> {
        if id == 0 {
            return Err(InvalidUserId);
        }
        Ok(Self(id))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for UserId {
    type Error = InvalidUserId;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for u64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl FromStr for UserId {
    type Err = InvalidUserId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidUserId);
        }
        trimmed.parse::<u64>().map_err(|_| InvalidUserId).and_then(Self::new)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A user record as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub age: i64,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Request payload for creating a user.
///
/// Produced by `FormState::submit` with trimmed fields, but re-validated by
/// `UserClient::build_create_user` before it is sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: i64,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Response of `GET /api/users/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserList {
    pub users: Vec<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_users: Option<usize>,
}

/// The `{success, message, data}` wrapper used by the mutation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: T,
}

/// Response of the `GET /api/hello/` connectivity probe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hello {
    pub message: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Response of `GET /api/info/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiInfo {
    pub api_name: String,
    pub version: String,
    pub description: String,
    pub total_endpoints: u32,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rejects_zero_negative_and_garbage() {
        assert!("0".parse::<UserId>().is_err());
        assert!("-3".parse::<UserId>().is_err());
        assert!("abc".parse::<UserId>().is_err());
        assert!("".parse::<UserId>().is_err());
        assert!("1.5".parse::<UserId>().is_err());
        assert_eq!(" 7 ".parse::<UserId>().unwrap().get(), 7);
    }

    #[test]
    fn user_with_blank_city_has_no_city() {
        let user: User =
            serde_json::from_str(r#"{"id":1,"name":"Ann","email":"a@b.c","age":30,"city":""}"#).unwrap();
        assert!(user.city.is_none());

        let user: User = serde_json::from_str(r#"{"id":1,"name":"Ann","email":"a@b.c","age":30}"#).unwrap();
        assert!(user.city.is_none());

        let user: User =
            serde_json::from_str(r#"{"id":1,"name":"Ann","email":"a@b.c","age":30,"city":null}"#).unwrap();
        assert!(user.city.is_none());
    }

    #[test]
    fn user_with_zero_id_is_rejected() {
        let result: Result<User, _> =
            serde_json::from_str(r#"{"id":0,"name":"Ann","email":"a@b.c","age":30}"#);
        assert!(result.is_err());
    }

    #[test]
    fn new_user_omits_missing_city() {
        let input = NewUser {
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            age: 30,
            city: None,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert!(json.get("city").is_none());
        assert_eq!(json["age"], 30);
    }

    #[test]
    fn user_list_tolerates_extra_fields() {
        let list: UserList = serde_json::from_str(
            r#"{"total_users":1,"users":[{"id":1,"name":"John Doe","email":"john@example.com","age":25,"city":"Jakarta"}],"page_info":{"current_page":1}}"#,
        )
        .unwrap();
        assert_eq!(list.users.len(), 1);
        assert_eq!(list.total_users, Some(1));
        assert_eq!(list.users[0].city.as_deref(), Some("Jakarta"));
    }
}
