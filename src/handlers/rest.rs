/// REST API handlers for HTTP endpoints.
/// Handles admin bootstrap and login, the presale end date, the progress bar and
/// wallet address registration.

use crate::auth::{self, AdminSession};
use crate::bootstrap::{self, BootstrapOutcome};
use crate::config::ServerConfig;
use crate::db::{models::*, Database, DbPool};
use crate::error::{ApiError, ApiResult};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

/// Body-parse failures become 400s with a JSON error body
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        ApiError::Validation(format!("Invalid request body: {}", err)).into()
    })
}

fn parse_end_date(input: &DateInput) -> ApiResult<DateTime<Utc>> {
    match input {
        DateInput::Millis(ms) => DateTime::from_timestamp_millis(*ms)
            .ok_or_else(|| ApiError::Validation("endDateTime is out of range".to_string())),
        DateInput::Text(s) if s.trim().is_empty() => Err(ApiError::required("endDateTime")),
        DateInput::Text(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|d| d.with_timezone(&Utc))
            .map_err(|_| {
                ApiError::Validation(
                    "endDateTime must be an RFC 3339 date or Unix milliseconds".to_string(),
                )
            }),
    }
}

/// Clamp a progress value into [0, 100]
pub fn clamp_progress(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn parse_progress(input: &NumericInput) -> ApiResult<f64> {
    let value = match input {
        NumericInput::Number(n) => *n,
        NumericInput::Text(s) if s.trim().is_empty() => return Err(ApiError::required("value")),
        NumericInput::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ApiError::Validation("value must be numeric".to_string()))?,
    };

    if !value.is_finite() {
        return Err(ApiError::Validation("value must be a finite number".to_string()));
    }
    Ok(clamp_progress(value))
}

/// Bootstrap the admin credential
/// GET /api/init-admin
pub async fn init_admin(
    pool: web::Data<DbPool>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    let result = bootstrap::initialize_admin(&pool, &config).await;

    if config.lenient_init_admin {
        if let Err(e) = &result {
            log::error!("Admin initialization failed: {}", e);
        }
        return HttpResponse::Ok()
            .content_type("text/plain")
            .body("Admin initialization complete");
    }

    match result {
        Ok(BootstrapOutcome::AlreadyInitialized) => HttpResponse::Ok()
            .content_type("text/plain")
            .body("Admin already initialized"),
        Ok(_) => HttpResponse::Ok()
            .content_type("text/plain")
            .body("Admin initialized"),
        Err(e) => {
            log::error!("Admin initialization failed: {}", e);
            HttpResponse::InternalServerError()
                .content_type("text/plain")
                .body("Admin initialization failed")
        }
    }
}

/// Exchange the admin password for a session token
/// POST /api/authenticate
pub async fn authenticate(
    pool: web::Data<DbPool>,
    config: web::Data<ServerConfig>,
    req: web::Json<AuthenticateRequest>,
) -> ApiResult<HttpResponse> {
    let password = req
        .password
        .as_deref()
        .ok_or_else(|| ApiError::required("password"))?;

    let token = auth::authenticate(&pool, &config, password).await?;
    Ok(HttpResponse::Ok().json(AuthenticateResponse { token }))
}

/// GET /api/verify-token
pub async fn verify_token(_session: AdminSession) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Token is valid"
    }))
}

/// Set the presale end date
/// POST /api/presale-end
pub async fn set_presale_end(
    _session: AdminSession,
    pool: web::Data<DbPool>,
    req: web::Json<PresaleEndRequest>,
) -> ApiResult<HttpResponse> {
    let input = req
        .end_date_time
        .as_ref()
        .ok_or_else(|| ApiError::required("endDateTime"))?;
    let end = parse_end_date(input)?.to_rfc3339_opts(SecondsFormat::Millis, true);

    let record = Database::upsert_presale_end(&pool, &end).await?;
    Ok(HttpResponse::Ok().json(SavedResponse {
        message: "Presale end date saved".to_string(),
        data: record,
    }))
}

/// GET /api/presale-end
pub async fn get_presale_end(pool: web::Data<DbPool>) -> ApiResult<HttpResponse> {
    match Database::get_presale_end(&pool).await? {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::Ok().json(json!({
            "message": "No presale end date set"
        }))),
    }
}

/// Set the progress bar value, clamped into [0, 100]
/// POST /api/progress-bar
pub async fn set_progress_bar(
    _session: AdminSession,
    pool: web::Data<DbPool>,
    req: web::Json<ProgressBarRequest>,
) -> ApiResult<HttpResponse> {
    let input = req.value.as_ref().ok_or_else(|| ApiError::required("value"))?;
    let value = parse_progress(input)?;

    let record = Database::upsert_progress_bar(&pool, value).await?;
    Ok(HttpResponse::Ok().json(SavedResponse {
        message: "Progress bar value saved".to_string(),
        data: record,
    }))
}

/// GET /api/progress-bar
pub async fn get_progress_bar(pool: web::Data<DbPool>) -> ApiResult<HttpResponse> {
    match Database::get_progress_bar(&pool).await? {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::Ok().json(json!({
            "message": "No progress bar value set"
        }))),
    }
}

/// Register a wallet address
/// POST /api/wallet-address
pub async fn register_wallet_address(
    pool: web::Data<DbPool>,
    req: web::Json<WalletAddressRequest>,
) -> ApiResult<HttpResponse> {
    let address = req
        .address
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| ApiError::required("address"))?;

    if let Some(existing) = Database::get_wallet_address(&pool, address).await? {
        return Err(ApiError::Conflict(format!(
            "{} is already registered",
            existing.address
        )));
    }

    // The UNIQUE constraint still catches a concurrent insert of the same address
    let record = Database::create_wallet_address(&pool, address).await?;
    Ok(HttpResponse::Created().json(SavedResponse {
        message: "Wallet address registered".to_string(),
        data: record,
    }))
}

/// List wallet addresses, newest first
/// GET /api/wallet-address
pub async fn list_wallet_addresses(pool: web::Data<DbPool>) -> ApiResult<HttpResponse> {
    let addresses = Database::list_wallet_addresses(&pool).await?;
    Ok(HttpResponse::Ok().json(addresses))
}

/// Health check endpoint
/// GET /api/health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok"
    }))
}
