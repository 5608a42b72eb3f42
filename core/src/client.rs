//! Stateless HTTP request builder and response parser for the user API.
//!
//! # Design
//! `UserClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Preconditions that can be checked locally (payload validation, id shape)
//! are enforced in `build_*`, so a rejected call never reaches the network.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, JSON_CONTENT_TYPE};
use crate::types::{ApiInfo, Envelope, Hello, NewUser, User, UserId, UserList};
use crate::validation::validate_new_user;

#[derive(Debug, Clone)]
pub struct UserClient {
    base_url: String,
}

impl UserClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_hello(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/hello/", None)
    }

    pub fn build_api_info(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/info/", None)
    }

    pub fn build_list_users(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/users/", None)
    }

    pub fn build_get_user(&self, id: UserId) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/api/users/{id}/"), None)
    }

    /// Re-validates `input` with the form rules and rejects it with every
    /// violation comma-joined.
    pub fn build_create_user(&self, input: &NewUser) -> Result<HttpRequest, ApiError> {
        let errors = validate_new_user(input);
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors.message()));
        }
        let body = to_json(input)?;
        Ok(self.request(HttpMethod::Post, "/api/users/create/", Some(body)))
    }

    pub fn build_delete_user(&self, id: UserId) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/api/users/{id}/delete/"), None)
    }

    pub fn build_test_post<P: Serialize>(&self, payload: &P) -> Result<HttpRequest, ApiError> {
        let body = to_json(payload)?;
        Ok(self.request(HttpMethod::Post, "/api/test-post/", Some(body)))
    }

    pub fn parse_hello(&self, response: HttpResponse) -> Result<Hello, ApiError> {
        decode(&response)
    }

    pub fn parse_api_info(&self, response: HttpResponse) -> Result<ApiInfo, ApiError> {
        decode(&response)
    }

    pub fn parse_list_users(&self, response: HttpResponse) -> Result<UserList, ApiError> {
        decode(&response)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        decode::<Envelope<User>>(&response).map(|envelope| envelope.data)
    }

    /// Returns the record as stored by the server, not as submitted.
    pub fn parse_create_user(&self, response: HttpResponse) -> Result<Envelope<User>, ApiError> {
        decode(&response)
    }

    /// Returns the deleted record.
    pub fn parse_delete_user(&self, response: HttpResponse) -> Result<Envelope<User>, ApiError> {
        decode(&response)
    }

    pub fn parse_test_post(
        &self,
        response: HttpResponse,
    ) -> Result<Envelope<serde_json::Value>, ApiError> {
        decode(&response)
    }

    fn request(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        let (key, value) = JSON_CONTENT_TYPE;
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: vec![(key.to_string(), value.to_string())],
            body,
        }
    }
}

fn to_json<P: Serialize + ?Sized>(payload: &P) -> Result<String, ApiError> {
    serde_json::to_string(payload).map_err(|e| ApiError::unknown(e.to_string()))
}

/// Map non-2xx statuses to a server error, then decode the body.
fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(ApiError::from_response(response));
    }
    serde_json::from_str(&response.body)
        .map_err(|e| ApiError::unknown(format!("unexpected response from server: {e}")))
}
