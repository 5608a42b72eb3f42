use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};

const NAME_MAX_CHARS: usize = 100;
const CITY_MAX_CHARS: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub age: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Create payload. Every field is optional here so missing fields produce a
/// per-field error instead of a blanket extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CreateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<Value>,
    pub city: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Hello {
    pub message: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiInfo {
    pub api_name: String,
    pub version: String,
    pub description: String,
    pub total_endpoints: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserList {
    pub total_users: usize,
    pub users: Vec<User>,
    pub page_info: PageInfo,
}

#[derive(Debug)]
pub struct Store {
    users: Vec<User>,
    next_id: u64,
}

impl Store {
    pub fn new(users: Vec<User>) -> Self {
        let next_id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        Self { users, next_id }
    }
}

pub type Db = Arc<RwLock<Store>>;

type Rejection = (StatusCode, Json<ErrorBody>);

pub fn seed_users() -> Vec<User> {
    let seed = [
        (1, "John Doe", "john@example.com", 25, "Jakarta"),
        (2, "Jane Smith", "jane@example.com", 30, "Bandung"),
        (3, "Bob Wilson", "bob@example.com", 28, "Surabaya"),
    ];
    seed.into_iter()
        .map(|(id, name, email, age, city)| User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            age,
            city: Some(city.to_string()),
        })
        .collect()
}

/// Router seeded with the three sample users.
pub fn app() -> Router {
    app_with(seed_users())
}

pub fn app_with(users: Vec<User>) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::new(users)));
    Router::new()
        .route("/api/hello/", get(hello))
        .route("/api/info/", get(api_info))
        .route("/api/test-post/", post(test_post))
        .route("/api/users/", get(list_users))
        .route("/api/users/create/", post(create_user))
        .route("/api/users/{id}/", get(get_user))
        .route("/api/users/{id}/delete/", delete(delete_user))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn hello() -> Json<Hello> {
    Json(Hello {
        message: "Hello World from the user API!".to_string(),
        status: "success".to_string(),
        timestamp: Utc::now(),
    })
}

async fn api_info() -> Json<ApiInfo> {
    Json(ApiInfo {
        api_name: "User Directory API".to_string(),
        version: "1.1.0".to_string(),
        description: "Small REST API with user management for client development".to_string(),
        total_endpoints: 7,
    })
}

async fn test_post(Json(payload): Json<Value>) -> Json<Envelope<Value>> {
    tracing::info!(%payload, "test post");
    Json(Envelope {
        success: true,
        message: format!("Data received: {payload}"),
        data: payload,
    })
}

async fn list_users(State(db): State<Db>) -> Json<UserList> {
    let store = db.read().await;
    Json(UserList {
        total_users: store.users.len(),
        users: store.users.clone(),
        page_info: PageInfo {
            current_page: 1,
            total_pages: 1,
            has_next: false,
        },
    })
}

async fn create_user(
    State(db): State<Db>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<Envelope<User>>), Rejection> {
    let mut store = db.write().await;
    let id = store.next_id;
    let user = validate(id, input).map_err(|errors| {
        tracing::info!(?errors, "create rejected");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                success: false,
                message: "submitted data is invalid".to_string(),
                errors,
            }),
        )
    })?;
    store.next_id += 1;
    store.users.push(user.clone());
    tracing::info!(id, name = %user.name, "user created");
    Ok((
        StatusCode::CREATED,
        Json(Envelope {
            success: true,
            message: format!("User {} created", user.name),
            data: user,
        }),
    ))
}

async fn get_user(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Envelope<User>>, Rejection> {
    let store = db.read().await;
    let user = store.users.iter().find(|u| u.id == id).cloned().ok_or_else(|| not_found(id))?;
    Ok(Json(Envelope {
        success: true,
        message: "User found".to_string(),
        data: user,
    }))
}

async fn delete_user(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Envelope<User>>, Rejection> {
    let mut store = db.write().await;
    let index = store.users.iter().position(|u| u.id == id).ok_or_else(|| not_found(id))?;
    let user = store.users.remove(index);
    tracing::info!(id, "user deleted");
    Ok(Json(Envelope {
        success: true,
        message: format!("User {} deleted", user.name),
        data: user,
    }))
}

fn not_found(id: u64) -> Rejection {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            success: false,
            message: format!("User with ID {id} not found"),
            errors: BTreeMap::new(),
        }),
    )
}

fn validate(id: u64, input: CreateUser) -> Result<User, BTreeMap<String, Vec<String>>> {
    let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut reject = |field: &str, msg: &str| {
        errors.entry(field.to_string()).or_default().push(msg.to_string());
    };

    let name = input.name.as_deref().map(str::trim).unwrap_or_default().to_string();
    if name.is_empty() {
        reject("name", "This field is required.");
    } else if name.chars().count() > NAME_MAX_CHARS {
        reject("name", "Ensure this field has no more than 100 characters.");
    }

    let email = input.email.as_deref().map(str::trim).unwrap_or_default().to_string();
    if email.is_empty() {
        reject("email", "This field is required.");
    } else if !looks_like_email(&email) {
        reject("email", "Enter a valid email address.");
    }

    let age = match input.age.as_ref().and_then(parse_age) {
        Some(age) if (1..=120).contains(&age) => age,
        Some(_) => {
            reject("age", "Ensure this value is between 1 and 120.");
            0
        }
        None => {
            reject("age", "A valid integer is required.");
            0
        }
    };

    let city = input.city.as_deref().map(str::trim).filter(|c| !c.is_empty()).map(str::to_string);
    if city.as_ref().is_some_and(|c| c.chars().count() > CITY_MAX_CHARS) {
        reject("city", "Ensure this field has no more than 50 characters.");
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(User { id, name, email, age, city })
}

fn parse_age(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        }
        None => false,
    }
}
