/// Data models for database operations.
/// Represents the admin credential, presale end date, progress bar and wallet addresses.
use serde::{Deserialize, Serialize};

/// The single administrator credential.
///
/// Never serialized to clients.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminCredential {
    pub id: i64,
    pub password_hash: Option<String>,
    pub initialized: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresaleEnd {
    pub id: i64,
    pub end_date_time: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressBarValue {
    pub id: i64,
    pub value: f64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletAddress {
    pub id: i64,
    pub address: String,
    pub created_at: String,
    pub updated_at: String,
}

// Request/Response DTOs
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthenticateResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresaleEndRequest {
    pub end_date_time: Option<DateInput>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressBarRequest {
    pub value: Option<NumericInput>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletAddressRequest {
    pub address: Option<String>,
}

/// A date given either as an RFC 3339 string or as Unix milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Millis(i64),
    Text(String),
}

/// A number given either as JSON number or as a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

/// Write acknowledgment: `{message, data}`
#[derive(Debug, Serialize, Deserialize)]
pub struct SavedResponse<T> {
    pub message: String,
    pub data: T,
}
