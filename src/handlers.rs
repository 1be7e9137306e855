use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;

use crate::models::*;
use crate::rate_limit;
use crate::session;
use crate::state::AppState;
use crate::store::StoreError;

const RATE_LIMIT_MESSAGE: &str = "Too many requests from this network. Please try again later.";
const HISTORY_NOTE: &str = "Invited from the admin page";

fn store_error(context: &str, err: StoreError) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("{}: {}", context, err);
    match err {
        StoreError::Transport(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("store_error", "The data store is unreachable")),
        ),
        StoreError::Api { status, message } => {
            let status =
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let code = if status == StatusCode::CONFLICT {
                "conflict"
            } else {
                "store_error"
            };
            (status, Json(ErrorResponse::new(code, &message)))
        }
    }
}

// ============================
// Registration Handlers
// ============================

pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<RegisterResponse>, (StatusCode, Json<ErrorResponse>)> {
    // The limiter runs before the body is even parsed; a rejected request
    // touches neither the store nor the mailer.
    let client_key = rate_limit::client_key(&headers);
    if !state.limiter.check_and_record(client_key.as_deref()) {
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new("rate_limited", RATE_LIMIT_MESSAGE)),
        ));
    }

    let payload: RegisterRequest = serde_json::from_str(&body).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("invalid_body", "Invalid request body")),
        )
    })?;

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let email = payload
        .email
        .as_deref()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty());

    let platform = payload.platform.as_deref().and_then(Platform::parse);
    let (Some(name), Some(email), Some(platform)) = (name, email, platform) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "missing_fields",
                "Name, email, and platform are required",
            )),
        ));
    };

    state
        .store
        .insert_tester(name, &email, platform.type_code())
        .await
        .map_err(|e| store_error("Failed to insert tester", e))?;

    // A failed confirmation email must not fail the registration; it is
    // logged and surfaced as a warning alongside the success.
    let mut email_warning = None;
    if let Some(mailer) = &state.mailer {
        if let Err(e) = mailer.send_confirmation(name, &email, platform.label()).await {
            tracing::error!("Failed to send confirmation email to {}: {}", email, e);
            email_warning = Some(e.to_string());
        }
    }

    Ok(Json(RegisterResponse {
        success: true,
        email_warning,
    }))
}

pub async fn send_confirmation_email(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<SuccessResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(mailer) = state.mailer.as_ref() else {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(
                "mailer_unconfigured",
                "Mail server is not configured",
            )),
        ));
    };

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let email = payload
        .email
        .as_deref()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty());

    let (Some(name), Some(email)) = (name, email) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "missing_fields",
                "Name and email are required",
            )),
        ));
    };

    let label = payload
        .platform
        .as_deref()
        .and_then(Platform::parse)
        .map(Platform::label)
        .unwrap_or("Beta");
    mailer
        .send_confirmation(name, &email, label)
        .await
        .map_err(|e| {
            tracing::error!("Failed to send confirmation email to {}: {}", email, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("mail_error", "Failed to send email")),
            )
        })?;

    Ok(Json(SuccessResponse { success: true }))
}

// ============================
// Admin Session Handlers
// ============================

pub async fn admin_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<AuthRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), (StatusCode, Json<ErrorResponse>)> {
    let Some(password) = payload.password.filter(|value| !value.is_empty()) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("missing_password", "Password is required")),
        ));
    };

    let stored = state.store.admin_password().await.map_err(|e| {
        tracing::error!("Failed to fetch admin password: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("server_error", "Server configuration error")),
        )
    })?;

    if password != stored {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("unauthorized", "Invalid password")),
        ));
    }

    let token = session::generate_token();
    let jar = jar.add(session::auth_cookie(token, state.config.cookie_secure));

    Ok((jar, Json(MessageResponse::new("Login successful"))))
}

pub async fn admin_verify() -> Json<MessageResponse> {
    // Reaching this handler means the session middleware accepted the cookie.
    Json(MessageResponse::new("Authenticated"))
}

pub async fn admin_logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.remove(session::removal_cookie());
    (jar, Json(MessageResponse::new("Logout successful")))
}

// ============================
// Admin Tester Handlers
// ============================

pub async fn list_testers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TestersResponse>, (StatusCode, Json<ErrorResponse>)> {
    let testers = state
        .store
        .list_testers()
        .await
        .map_err(|e| store_error("Failed to fetch testers", e))?;

    Ok(Json(TestersResponse {
        success: true,
        total: testers.len(),
        data: testers,
    }))
}

pub async fn delete_testers(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TesterIdsRequest>,
) -> Result<Json<DeleteTestersResponse>, (StatusCode, Json<ErrorResponse>)> {
    if payload.tester_ids.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "missing_tester_ids",
                "Tester ids to delete are required",
            )),
        ));
    }

    state
        .store
        .delete_testers(&payload.tester_ids)
        .await
        .map_err(|e| store_error("Failed to delete testers", e))?;

    let deleted_count = payload.tester_ids.len();
    Ok(Json(DeleteTestersResponse {
        success: true,
        message: format!("Deleted {} testers.", deleted_count),
        deleted_count,
    }))
}

pub async fn invite_testers(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TesterIdsRequest>,
) -> Result<Json<InviteTestersResponse>, (StatusCode, Json<ErrorResponse>)> {
    if payload.tester_ids.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "missing_tester_ids",
                "Select testers to invite",
            )),
        ));
    }

    state
        .store
        .mark_invited(&payload.tester_ids)
        .await
        .map_err(|e| store_error("Failed to update invite flags", e))?;

    let invited_at = Utc::now();
    let records: Vec<HistoryRecord> = payload
        .tester_ids
        .iter()
        .map(|id| HistoryRecord {
            tester_id: *id,
            invited: true,
            invited_at,
            notes: HISTORY_NOTE.to_string(),
        })
        .collect();

    state
        .store
        .append_history(&records)
        .await
        .map_err(|e| store_error("Failed to record invite history", e))?;

    let invited_count = payload.tester_ids.len();
    Ok(Json(InviteTestersResponse {
        success: true,
        message: format!("Invited {} testers.", invited_count),
        invited_count,
    }))
}

pub async fn invite_android(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<InviteEmailRequest>,
) -> Result<Json<InviteEmailResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(mailer) = state.mailer.as_ref() else {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(
                "mailer_unconfigured",
                "Mail server is not configured",
            )),
        ));
    };

    if payload.testers.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "missing_testers",
                "Testers to invite are required",
            )),
        ));
    }

    let Some(invite_link) = payload.invite_link.as_deref().filter(|value| !value.is_empty())
    else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "missing_invite_link",
                "Invite link is required",
            )),
        ));
    };

    // Send to everyone even when some addresses fail; failures are logged
    // and reported back in the counts.
    let mut success_count = 0;
    let mut fail_count = 0;
    for tester in &payload.testers {
        match mailer
            .send_invitation(&tester.name, &tester.email, invite_link)
            .await
        {
            Ok(()) => success_count += 1,
            Err(e) => {
                tracing::error!(
                    "Failed to send invitation to {} ({}): {}",
                    tester.email,
                    tester.id,
                    e
                );
                fail_count += 1;
            }
        }
    }

    let message = if fail_count > 0 {
        format!("Sent invitation emails to {} testers ({} failed).", success_count, fail_count)
    } else {
        format!("Sent invitation emails to {} testers.", success_count)
    };

    Ok(Json(InviteEmailResponse {
        success: true,
        message,
        success_count,
        fail_count,
    }))
}

// ============================
// Keep-Alive Handler
// ============================

/// Hit on a schedule by an external cron so the hosted store's free tier
/// does not pause the project for inactivity.
pub async fn keep_alive(
    State(state): State<Arc<AppState>>,
) -> Result<Json<KeepAliveResponse>, (StatusCode, Json<ErrorResponse>)> {
    let testers = state
        .store
        .list_testers()
        .await
        .map_err(|e| store_error("Keep-alive store check failed", e))?;

    tracing::info!("Keep-alive ping succeeded: {} records", testers.len());
    Ok(Json(KeepAliveResponse {
        success: true,
        count: testers.len(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}
