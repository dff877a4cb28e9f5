//! Account endpoints backed by the identity provider.
//!
//! JSON in, JSON out. Field names are camelCase to match the GraphQL API.

use axum::{Json, extract::State, http::StatusCode};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::Customer;
use crate::services::{RegistrationRequest, TokenSet, register_customer};
use crate::state::AppState;

/// Body of `POST /auth/register`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Body of `POST /auth/login`.
#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/refresh`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshBody {
    pub refresh_token: String,
}

/// Create an identity-provider user and the matching customer.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<Customer>)> {
    let request = RegistrationRequest {
        first_name: body.first_name,
        last_name: body.last_name,
        email: body.email,
        phone: body.phone,
        password: SecretString::from(body.password),
    };

    let customer = register_customer(state.pool(), state.identity(), &request).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Exchange email and password for tokens.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<TokenSet>> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "email and password are required".to_string(),
        ));
    }

    let tokens = state
        .tokens()
        .login(email, &SecretString::from(body.password))
        .await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for a new token set.
#[instrument(skip(state, body))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshBody>,
) -> Result<Json<TokenSet>> {
    if body.refresh_token.trim().is_empty() {
        return Err(AppError::BadRequest("refreshToken is required".to_string()));
    }

    let tokens = state
        .tokens()
        .refresh(&SecretString::from(body.refresh_token))
        .await?;
    Ok(Json(tokens))
}
