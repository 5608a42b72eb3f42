//! Top-level controller tying validation, transport and local state together.
//!
//! # Design
//! `UserManager` owns every piece of mutable client state: the user
//! collection, the selection, notifications, connection status and the last
//! action (for `retry`). Front-ends get read-only views and mutate only by
//! calling the operations below. Each operation follows the same path:
//! validate locally, execute one request through the `Transport`, feed the
//! confirmed outcome to `UserState::apply`, and push exactly one
//! notification. Errors never escape as `Err`; they come back as a failed
//! `ApiResult`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::client::UserClient;
use crate::error::ApiError;
use crate::form::FormState;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::notify::NotificationCenter;
use crate::outcome::ApiResult;
use crate::state::{UserEvent, UserState};
use crate::types::{ApiInfo, Hello, NewUser, User, UserId};

/// Result of the last `test_connection` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Connected,
    Failed,
}

/// A network-bound action, kept so `retry` can repeat it verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Refresh,
    Create(NewUser),
    Delete(String),
    Get(String),
    TestConnection,
    LoadApiInfo,
    TestPost(serde_json::Value),
}

pub struct UserManager<T> {
    client: UserClient,
    transport: T,
    state: UserState,
    notifications: NotificationCenter,
    connection: ConnectionStatus,
    last_test: Option<DateTime<Utc>>,
    api_info: Option<ApiInfo>,
    last_action: Option<Action>,
}

impl<T: Transport> UserManager<T> {
    pub fn new(client: UserClient, transport: T) -> Self {
        Self::with_notifications(client, transport, NotificationCenter::default())
    }

    pub fn with_notifications(client: UserClient, transport: T, notifications: NotificationCenter) -> Self {
        Self {
            client,
            transport,
            state: UserState::new(),
            notifications,
            connection: ConnectionStatus::Unknown,
            last_test: None,
            api_info: None,
            last_action: None,
        }
    }

    pub fn state(&self) -> &UserState {
        &self.state
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn last_test(&self) -> Option<DateTime<Utc>> {
        self.last_test
    }

    pub fn api_info(&self) -> Option<&ApiInfo> {
        self.api_info.as_ref()
    }

    pub fn last_action(&self) -> Option<&Action> {
        self.last_action.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Replace the collection with the server's listing.
    pub fn refresh(&mut self) -> ApiResult<usize> {
        self.last_action = Some(Action::Refresh);
        let request = self.client.build_list_users();
        match self.call(request, UserClient::parse_list_users) {
            Ok(list) => {
                let now = Utc::now();
                self.transition(UserEvent::Loaded { users: list.users, at: now });
                let total = self.state.total();
                tracing::info!(total, "users loaded");
                let message = format!("loaded {total} users");
                self.notifications.info(message.clone(), now);
                ApiResult::ok(total, message)
            }
            Err(err) => self.fail(&err, "failed to load users"),
        }
    }

    /// Validate the form and, if it passes, create the user.
    ///
    /// A form that fails validation issues no request and no notification;
    /// the field errors stay on `form` for display.
    pub fn submit(&mut self, form: &mut FormState) -> ApiResult<User> {
        match form.submit() {
            Ok(input) => self.create_user(&input),
            Err(errors) => ApiResult::failed(&ApiError::Validation(errors.message())),
        }
    }

    /// Create a user and append the server's record to the collection.
    pub fn create_user(&mut self, input: &NewUser) -> ApiResult<User> {
        self.last_action = Some(Action::Create(input.clone()));
        let result = self
            .client
            .build_create_user(input)
            .and_then(|request| self.call(request, UserClient::parse_create_user));
        match result {
            Ok(envelope) => {
                let user = envelope.data;
                tracing::info!(id = %user.id, name = %user.name, "user created");
                self.transition(UserEvent::Created(user.clone()));
                let message = format!("user {} created", user.name);
                self.notifications.success(message.clone(), Utc::now());
                ApiResult::ok(user, message)
            }
            Err(err) => self.fail(&err, "failed to create user"),
        }
    }

    /// Delete a user by its textual id and drop it from the collection.
    pub fn delete_user(&mut self, raw_id: &str) -> ApiResult<User> {
        self.last_action = Some(Action::Delete(raw_id.to_string()));
        let result = raw_id
            .parse::<UserId>()
            .map_err(ApiError::from)
            .and_then(|id| {
                let request = self.client.build_delete_user(id);
                self.call(request, UserClient::parse_delete_user)
                    .map(|envelope| (id, envelope.data))
            });
        match result {
            Ok((id, deleted)) => {
                tracing::info!(%id, "user deleted");
                self.transition(UserEvent::Deleted(id));
                let message = format!("user {} deleted", deleted.name);
                self.notifications.success(message.clone(), Utc::now());
                ApiResult::ok(deleted, message)
            }
            Err(err) => self.fail(&err, "failed to delete user"),
        }
    }

    /// Fetch one user from the server. The local collection is not touched.
    pub fn get_user(&mut self, raw_id: &str) -> ApiResult<User> {
        self.last_action = Some(Action::Get(raw_id.to_string()));
        let result = raw_id
            .parse::<UserId>()
            .map_err(ApiError::from)
            .and_then(|id| {
                let request = self.client.build_get_user(id);
                self.call(request, UserClient::parse_get_user)
            });
        match result {
            Ok(user) => {
                let message = format!("found user {}", user.name);
                self.notifications.info(message.clone(), Utc::now());
                ApiResult::ok(user, message)
            }
            Err(err) => self.fail(&err, "failed to find user"),
        }
    }

    /// Select a user from the local collection for detail display.
    pub fn select_user(&mut self, raw_id: &str) -> ApiResult<User> {
        let found = raw_id
            .parse::<UserId>()
            .map_err(ApiError::from)
            .and_then(|id| {
                self.state
                    .find(id)
                    .cloned()
                    .ok_or_else(|| ApiError::Validation(format!("user {id} is not in the list")))
            });
        match found {
            Ok(user) => {
                self.transition(UserEvent::Selected(user.id));
                let message = format!("showing details for {}", user.name);
                self.notifications.info(message.clone(), Utc::now());
                ApiResult::ok(user, message)
            }
            Err(err) => self.fail(&err, "failed to select user"),
        }
    }

    pub fn clear_selection(&mut self) {
        self.transition(UserEvent::SelectionCleared);
    }

    /// Probe `/api/hello/` and record the connection status.
    pub fn test_connection(&mut self) -> ApiResult<Hello> {
        self.last_action = Some(Action::TestConnection);
        let request = self.client.build_hello();
        match self.call(request, UserClient::parse_hello) {
            Ok(hello) => {
                let now = Utc::now();
                self.connection = ConnectionStatus::Connected;
                self.last_test = Some(now);
                let message = "connected to the API".to_string();
                self.notifications.success(message.clone(), now);
                ApiResult::ok(hello, message)
            }
            Err(err) => {
                self.connection = ConnectionStatus::Failed;
                self.fail(&err, "connection test failed")
            }
        }
    }

    pub fn load_api_info(&mut self) -> ApiResult<ApiInfo> {
        self.last_action = Some(Action::LoadApiInfo);
        let request = self.client.build_api_info();
        match self.call(request, UserClient::parse_api_info) {
            Ok(info) => {
                let message = format!("{} v{}", info.api_name, info.version);
                self.api_info = Some(info.clone());
                self.notifications.info(message.clone(), Utc::now());
                ApiResult::ok(info, message)
            }
            Err(err) => self.fail(&err, "failed to load API info"),
        }
    }

    /// Send an arbitrary payload to the echo endpoint.
    pub fn test_post(&mut self, payload: serde_json::Value) -> ApiResult<serde_json::Value> {
        let result = self
            .client
            .build_test_post(&payload)
            .and_then(|request| self.call(request, UserClient::parse_test_post));
        self.last_action = Some(Action::TestPost(payload));
        match result {
            Ok(envelope) => {
                self.notifications.success(envelope.message.clone(), Utc::now());
                ApiResult::ok(envelope.data, envelope.message)
            }
            Err(err) => self.fail(&err, "test post failed"),
        }
    }

    /// Repeat the last network-bound action exactly. `None` if there is none.
    pub fn retry(&mut self) -> Option<ApiResult<()>> {
        let action = self.last_action.clone()?;
        tracing::info!(?action, "retrying");
        let outcome = match action {
            Action::Refresh => self.refresh().map(drop),
            Action::Create(input) => self.create_user(&input).map(drop),
            Action::Delete(raw_id) => self.delete_user(&raw_id).map(drop),
            Action::Get(raw_id) => self.get_user(&raw_id).map(drop),
            Action::TestConnection => self.test_connection().map(drop),
            Action::LoadApiInfo => self.load_api_info().map(drop),
            Action::TestPost(payload) => self.test_post(payload).map(drop),
        };
        Some(outcome)
    }

    pub fn dismiss(&mut self, id: Uuid) -> bool {
        self.notifications.dismiss(id)
    }

    pub fn expire_notifications(&mut self, now: DateTime<Utc>) -> usize {
        self.notifications.expire(now)
    }

    pub fn clear_notifications(&mut self) {
        self.notifications.clear();
    }

    fn transition(&mut self, event: UserEvent) {
        self.state = std::mem::take(&mut self.state).apply(event);
    }

    fn fail<R>(&mut self, err: &ApiError, context: &str) -> ApiResult<R> {
        tracing::warn!(kind = ?err.kind(), error = %err, "{context}");
        self.notifications.error(err.to_string(), Utc::now());
        ApiResult::failed(err)
    }

    fn call<R>(
        &self,
        request: HttpRequest,
        parse: impl FnOnce(&UserClient, HttpResponse) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        tracing::debug!(method = %request.method, path = %request.path, body = ?request.body, "api request");
        let response = self.transport.execute(&request)?;
        tracing::debug!(status = response.status, path = %request.path, "api response");
        parse(&self.client, response)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::error::ErrorKind;
    use crate::http::{HttpMethod, TransportError};
    use crate::notify::Severity;
    use crate::validation::Field;

    /// Replays canned outcomes in order and records every request.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
        sent: RefCell<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn reply(self, status: u16, body: &str) -> Self {
            self.replies.borrow_mut().push_back(Ok(HttpResponse::new(status, body)));
            self
        }

        fn fail(self, err: TransportError) -> Self {
            self.replies.borrow_mut().push_back(Err(err));
            self
        }

        fn sent(&self) -> Vec<HttpRequest> {
            self.sent.borrow().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.sent.borrow_mut().push(request.clone());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("no scripted reply".to_string())))
        }
    }

    const LIST: &str = r#"{"users":[
        {"id":1,"name":"John Doe","email":"john@example.com","age":25,"city":"Jakarta"},
        {"id":2,"name":"Jane Smith","email":"jane@example.com","age":30,"city":"Bandung"}]}"#;

    const CREATED_ANN: &str = r#"{"success":true,"message":"User Ann created","data":{"id":7,"name":"Ann","email":"ann@example.com","age":30}}"#;

    fn manager(transport: ScriptedTransport) -> UserManager<ScriptedTransport> {
        UserManager::new(UserClient::new("http://api.test"), transport)
    }

    fn ann() -> NewUser {
        NewUser {
            name: "  Ann ".to_string(),
            email: "ann@example.com".to_string(),
            age: 30,
            city: None,
        }
    }

    #[test]
    fn create_appends_server_record_without_refetch() {
        let mut mgr = manager(ScriptedTransport::default().reply(200, LIST).reply(201, CREATED_ANN));
        mgr.refresh();
        let before = mgr.state().total();

        let result = mgr.create_user(&ann());
        assert!(result.success);
        assert_eq!(mgr.state().total(), before + 1);
        let created = mgr.state().users().last().unwrap();
        assert_eq!(created.id.get(), 7);
        // The server's trimmed name wins over the submitted one.
        assert_eq!(created.name, "Ann");

        let sent = mgr.transport().sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].method, HttpMethod::Post);
        assert_eq!(
            sent.iter().filter(|r| r.path.ends_with("/api/users/")).count(),
            1,
            "no refetch after create"
        );
    }

    #[test]
    fn failed_create_leaves_state_and_adds_one_error() {
        let mut mgr = manager(
            ScriptedTransport::default()
                .reply(200, LIST)
                .reply(500, r#"{"message":"database unavailable"}"#),
        );
        mgr.refresh();
        let before = mgr.state().clone();
        let errors_before = mgr.notifications().count(Severity::Error);

        let result = mgr.create_user(&ann());
        assert!(!result.success);
        assert_eq!(result.kind, Some(ErrorKind::Server));
        assert_eq!(result.message, "database unavailable");
        assert_eq!(mgr.state(), &before);
        assert_eq!(mgr.notifications().count(Severity::Error), errors_before + 1);
    }

    #[test]
    fn delete_removes_record_and_clears_selection() {
        let deleted = r#"{"success":true,"message":"User Jane Smith deleted","data":{"id":2,"name":"Jane Smith","email":"jane@example.com","age":30}}"#;
        let mut mgr = manager(ScriptedTransport::default().reply(200, LIST).reply(200, deleted));
        mgr.refresh();
        assert!(mgr.select_user("2").success);
        assert_eq!(mgr.state().selected().map(UserId::get), Some(2));

        let result = mgr.delete_user("2");
        assert!(result.success);
        assert!(mgr.state().users().iter().all(|u| u.id.get() != 2));
        assert!(mgr.state().selected().is_none());
        assert_eq!(mgr.transport().sent().len(), 2);
    }

    #[test]
    fn delete_with_malformed_id_short_circuits() {
        let mut mgr = manager(ScriptedTransport::default());
        for raw in ["", "abc", "0", "-1"] {
            let result = mgr.delete_user(raw);
            assert_eq!(result.kind, Some(ErrorKind::Validation), "{raw:?}");
            assert_eq!(result.message, "user id is invalid");
        }
        assert!(mgr.transport().sent().is_empty());
    }

    #[test]
    fn get_with_malformed_id_short_circuits() {
        let mut mgr = manager(ScriptedTransport::default());
        for raw in ["", "abc", "0", "-1", "1.5"] {
            let result = mgr.get_user(raw);
            assert_eq!(result.kind, Some(ErrorKind::Validation), "{raw:?}");
            assert_eq!(result.message, "user id is invalid");
        }
        assert!(mgr.transport().sent().is_empty());
    }

    #[test]
    fn clear_selection_keeps_the_collection() {
        let mut mgr = manager(ScriptedTransport::default().reply(200, LIST));
        mgr.refresh();
        assert!(mgr.select_user("1").success);
        mgr.clear_selection();
        assert!(mgr.state().selected().is_none());
        assert_eq!(mgr.state().total(), 2);
        assert_eq!(mgr.transport().sent().len(), 1);
    }

    #[test]
    fn failed_delete_leaves_state_unchanged() {
        let mut mgr = manager(
            ScriptedTransport::default()
                .reply(200, LIST)
                .reply(404, r#"{"success":false,"message":"User with ID 9 not found"}"#),
        );
        mgr.refresh();
        let before = mgr.state().clone();
        let result = mgr.delete_user("9");
        assert_eq!(result.message, "User with ID 9 not found");
        assert_eq!(mgr.state(), &before);
    }

    #[test]
    fn invalid_form_issues_no_request() {
        let mut mgr = manager(ScriptedTransport::default());
        let mut form = FormState::new();
        form.set(Field::Name, "42");
        form.set(Field::Email, "x@y.com");
        form.set(Field::Age, "30");
        form.set(Field::City, "");

        let result = mgr.submit(&mut form);
        assert!(!result.success);
        assert_eq!(result.message, "name must not be purely numeric");
        assert!(mgr.transport().sent().is_empty());
        assert!(mgr.notifications().is_empty());
        assert!(mgr.last_action().is_none());
    }

    #[test]
    fn transport_failures_are_classified() {
        let mut mgr = manager(
            ScriptedTransport::default()
                .fail(TransportError::Timeout)
                .fail(TransportError::Connect("refused".to_string()))
                .fail(TransportError::Other(String::new())),
        );
        assert_eq!(mgr.refresh().kind, Some(ErrorKind::Connectivity));
        let result = mgr.test_connection();
        assert_eq!(result.kind, Some(ErrorKind::Connectivity));
        assert_eq!(mgr.connection(), ConnectionStatus::Failed);
        let result = mgr.load_api_info();
        assert_eq!(result.kind, Some(ErrorKind::Unknown));
        assert_eq!(result.message, "an unknown error occurred");
    }

    #[test]
    fn retry_repeats_the_same_request() {
        let mut mgr = manager(
            ScriptedTransport::default()
                .fail(TransportError::Timeout)
                .reply(201, CREATED_ANN),
        );
        assert!(!mgr.create_user(&ann()).success);
        assert_eq!(mgr.state().total(), 0);

        let outcome = mgr.retry().unwrap();
        assert!(outcome.success);
        assert_eq!(mgr.state().total(), 1);

        let sent = mgr.transport().sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], sent[1]);
    }

    #[test]
    fn retry_without_history_does_nothing() {
        let mut mgr = manager(ScriptedTransport::default());
        assert!(mgr.retry().is_none());
    }

    #[test]
    fn connection_test_records_status() {
        let mut mgr = manager(ScriptedTransport::default().reply(
            200,
            r#"{"message":"Hello World","status":"success","timestamp":"2024-05-01T10:00:00Z"}"#,
        ));
        let result = mgr.test_connection();
        assert!(result.success);
        assert_eq!(mgr.connection(), ConnectionStatus::Connected);
        assert!(mgr.last_test().is_some());
    }

    #[test]
    fn notifications_expire_and_dismiss() {
        let mut mgr = manager(ScriptedTransport::default().reply(200, LIST));
        mgr.refresh();
        let id = mgr.notifications().items()[0].id;
        assert!(mgr.dismiss(id));

        mgr.select_user("1");
        let later = Utc::now() + chrono::Duration::seconds(6);
        assert_eq!(mgr.expire_notifications(later), 1);
        assert!(mgr.notifications().is_empty());
    }
}
