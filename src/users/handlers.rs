use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::AccountError,
    state::AppState,
    users::{
        dto::{ChangePasswordRequest, LoginRequest, ProfileUpdateRequest, PublicUser, RegisterRequest},
        validation::{check_password_policy, is_valid_email, normalize_email},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/:id/password", put(change_password))
}

#[derive(Debug, Deserialize)]
pub struct UserFilter {
    pub email: Option<String>,
}

fn validate_email(email: &str) -> Result<(), AccountError> {
    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(AccountError::Validation("Invalid email".into()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AccountError> {
    let failed = check_password_policy(password);
    if !failed.is_empty() {
        warn!(rules = ?failed, "weak password");
        return Err(AccountError::Validation(format!(
            "Password must contain: {}",
            failed.join(", ")
        )));
    }
    Ok(())
}

/// Trims a required text field; blank values are rejected.
fn required_text(field: &str, value: &str) -> Result<String, AccountError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        warn!(field = %field, "blank field");
        return Err(AccountError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AccountError> {
    payload.email = normalize_email(&payload.email);
    validate_email(&payload.email)?;

    payload.name = required_text("name", &payload.name)?;
    if let Some(password) = payload.password.as_deref().filter(|p| !p.is_empty()) {
        validate_password(password)?;
    }

    // Friendly early answer; the unique index still decides under a race.
    if state.accounts.count_by_email(&payload.email).await? > 0 {
        warn!(email = %payload.email, "email already registered");
        return Err(AccountError::Conflict("Email already registered".into()));
    }

    let user = state.accounts.insert(payload).await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<PublicUser>, AccountError> {
    payload.email = normalize_email(&payload.email);
    validate_email(&payload.email)?;

    let user = state
        .accounts
        .verify_credentials(&payload.email, &payload.password)
        .await?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<PublicUser>>, AccountError> {
    let users = match filter.email {
        Some(email) => state
            .accounts
            .find_by_email(&normalize_email(&email))
            .await?
            .into_iter()
            .collect(),
        None => state.accounts.list().await?,
    };
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, AccountError> {
    let user = state
        .accounts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AccountError::NotFound(id.to_string()))?;
    Ok(Json(user.into()))
}

/// Profile update. Role and password changes are not reachable from here;
/// passwords go through `PUT /users/:id/password`.
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<ProfileUpdateRequest>,
) -> Result<Json<PublicUser>, AccountError> {
    if let Some(name) = payload.name.as_deref() {
        payload.name = Some(required_text("name", name)?);
    }
    if let Some(username) = payload.username.as_deref() {
        payload.username = Some(required_text("username", username)?);
    }
    if let Some(email) = payload.email.as_deref() {
        let email = normalize_email(email);
        validate_email(&email)?;
        payload.email = Some(email);
    }

    let user = state.accounts.update(id, payload.into()).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AccountError> {
    validate_password(&payload.new_password)?;
    state
        .accounts
        .change_password(id, &payload.password, &payload.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, AccountError> {
    let user = state.accounts.destroy(id).await?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .merge(auth_routes())
            .merge(user_routes())
            .with_state(AppState::fake())
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register_ann(app: &Router) -> Value {
        let (status, body) = call(
            app,
            Method::POST,
            "/auth/register",
            Some(json!({"name": "Ann", "email": " Ann@X.com ", "password": "Secret123!"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn register_returns_public_user() {
        let app = app();
        let body = register_ann(&app).await;
        assert_eq!(body["email"], "ann@x.com");
        assert_eq!(body["role"], "USER");
        assert_eq!(body["provider"], "credentials");
        assert!(body.get("password").is_none());
        assert!(body["username"].as_str().unwrap().starts_with("user-"));
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_bad_input() {
        let app = app();
        register_ann(&app).await;

        let (status, _) = call(
            &app,
            Method::POST,
            "/auth/register",
            Some(json!({"name": "Ann", "email": "ann@x.com", "password": "Secret123!"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(
            &app,
            Method::POST,
            "/auth/register",
            Some(json!({"name": "Bob", "email": "not-an-email", "password": "Secret123!"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::POST,
            "/auth/register",
            Some(json!({"name": "Bob", "email": "bob@x.com", "password": "weak"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_accepts_right_password_only() {
        let app = app();
        register_ann(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/auth/login",
            Some(json!({"email": "ann@x.com", "password": "Secret123!"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ann@x.com");

        let (status, _) = call(
            &app,
            Method::POST,
            "/auth/login",
            Some(json!({"email": "ann@x.com", "password": "Wrong123!"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn patch_keeps_unspecified_fields() {
        let app = app();
        let ann = register_ann(&app).await;
        let id = ann["id"].as_str().unwrap();

        let (status, body) = call(
            &app,
            Method::PATCH,
            &format!("/users/{id}"),
            Some(json!({"name": "Annie"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Annie");
        assert_eq!(body["email"], ann["email"]);
        assert_eq!(body["username"], ann["username"]);
        assert_eq!(body["role"], ann["role"]);
    }

    #[tokio::test]
    async fn patch_rejects_role_and_password_and_leaves_record_unchanged() {
        let app = app();
        let ann = register_ann(&app).await;
        let uri = format!("/users/{}", ann["id"].as_str().unwrap());

        for body in [
            json!({"role": "ADMIN"}),
            json!({"password": "Hacked123!"}),
            json!({"role": "ADMIN", "password": "Hacked123!", "name": "Eve"}),
        ] {
            let (status, _) = call(&app, Method::PATCH, &uri, Some(body)).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        }

        let (status, body) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, ann);

        let (status, _) = call(
            &app,
            Method::POST,
            "/auth/login",
            Some(json!({"email": "ann@x.com", "password": "Hacked123!"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            &app,
            Method::POST,
            "/auth/login",
            Some(json!({"email": "ann@x.com", "password": "Secret123!"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn patch_rejects_blank_name_and_username() {
        let app = app();
        let ann = register_ann(&app).await;
        let uri = format!("/users/{}", ann["id"].as_str().unwrap());

        for body in [json!({"name": ""}), json!({"name": "   "}), json!({"username": ""})] {
            let (status, _) = call(&app, Method::PATCH, &uri, Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let (_, body) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(body["name"], "Ann");
        assert_eq!(body["username"], ann["username"]);
    }

    #[tokio::test]
    async fn names_are_stored_trimmed() {
        let app = app();
        let (status, bob) = call(
            &app,
            Method::POST,
            "/auth/register",
            Some(json!({"name": "  Bob  ", "email": "bob@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(bob["name"], "Bob");

        let (status, body) = call(
            &app,
            Method::PATCH,
            &format!("/users/{}", bob["id"].as_str().unwrap()),
            Some(json!({"name": " Robert ", "username": " bobby "})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Robert");
        assert_eq!(body["username"], "bobby");
    }

    #[tokio::test]
    async fn register_rejects_blank_name() {
        let app = app();
        let (status, _) = call(
            &app,
            Method::POST,
            "/auth/register",
            Some(json!({"name": "  ", "email": "bob@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let app = app();
        let uri = format!("/users/{}", Uuid::new_v4());

        let (status, _) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, Method::PATCH, &uri, Some(json!({"name": "x"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let app = app();
        let ann = register_ann(&app).await;
        let uri = format!("/users/{}", ann["id"].as_str().unwrap());

        let (status, body) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], ann["id"]);

        let (status, _) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_filters_by_email() {
        let app = app();
        register_ann(&app).await;

        let (status, body) = call(&app, Method::GET, "/users", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = call(&app, Method::GET, "/users?email=nobody@x.com", None).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn change_password_flow() {
        let app = app();
        let ann = register_ann(&app).await;
        let uri = format!("/users/{}/password", ann["id"].as_str().unwrap());

        let (status, _) = call(
            &app,
            Method::PUT,
            &uri,
            Some(json!({"password": "Secret123!", "new_password": "N3wSecret!"})),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(
            &app,
            Method::POST,
            "/auth/login",
            Some(json!({"email": "ann@x.com", "password": "N3wSecret!"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
