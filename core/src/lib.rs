//! Synchronous client core for the user directory API.
//!
//! # Overview
//! Validates user input, builds `HttpRequest` values, parses `HttpResponse`
//! values and keeps a local copy of the user collection in sync with
//! server-confirmed outcomes. Network I/O is delegated to a `Transport`
//! implementation supplied by the host, which keeps everything here
//! deterministic and testable.
//!
//! # Design
//! - `validation` / `form`: pure per-field rules and the interactive form.
//! - `client::UserClient`: stateless `build_*` / `parse_*` pairs.
//! - `state::UserState`: reducer over server-confirmed events.
//! - `notify::NotificationCenter`: self-expiring user-facing messages.
//! - `manager::UserManager`: the single owner of mutable client state.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod manager;
pub mod notify;
pub mod outcome;
pub mod state;
pub mod types;
pub mod validation;

pub use client::UserClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{ApiError, ErrorKind};
pub use form::{FieldStatus, FormState};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use manager::{Action, ConnectionStatus, UserManager};
pub use notify::{Notification, NotificationCenter, Severity};
pub use outcome::ApiResult;
pub use state::{UserEvent, UserState};
pub use types::{ApiInfo, Envelope, Hello, NewUser, User, UserId, UserList};
pub use validation::{validate_field, validate_form, Field, FieldError, UserForm, ValidationErrors};
