use crate::domain::model::{Branch, Headquarter};
use crate::utils::error::{BankError, ErrorCategory, Result};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Branch as listed inside a headquarter or a country listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankSummary {
    pub address: String,
    pub bank_name: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    pub is_headquarter: bool,
    pub swift_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchResponse {
    pub address: String,
    pub bank_name: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    pub country_name: String,
    pub is_headquarter: bool,
    pub swift_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadquarterResponse {
    pub address: String,
    pub bank_name: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    pub country_name: String,
    pub is_headquarter: bool,
    pub swift_code: String,
    pub branches: Vec<BankSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryResponse {
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    pub country_name: String,
    pub count: usize,
    pub banks: Vec<BankSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&Branch> for BankSummary {
    fn from(branch: &Branch) -> Self {
        Self {
            address: branch.address.clone(),
            bank_name: branch.bank_name.clone(),
            country_iso2: branch.country_iso2.to_string(),
            is_headquarter: branch.is_headquarter,
            swift_code: branch.swift_code.to_string(),
        }
    }
}

impl From<&Headquarter> for BankSummary {
    fn from(hq: &Headquarter) -> Self {
        Self {
            address: hq.address.clone(),
            bank_name: hq.bank_name.clone(),
            country_iso2: hq.country_iso2.to_string(),
            is_headquarter: hq.is_headquarter,
            swift_code: hq.swift_code.to_string(),
        }
    }
}

impl From<Branch> for BranchResponse {
    fn from(branch: Branch) -> Self {
        Self {
            address: branch.address,
            bank_name: branch.bank_name,
            country_iso2: branch.country_iso2.into(),
            country_name: branch.country_name,
            is_headquarter: branch.is_headquarter,
            swift_code: branch.swift_code.into(),
        }
    }
}

impl From<Headquarter> for HeadquarterResponse {
    fn from(hq: Headquarter) -> Self {
        Self {
            branches: hq.branches.iter().map(BankSummary::from).collect(),
            address: hq.address,
            bank_name: hq.bank_name,
            country_iso2: hq.country_iso2.into(),
            country_name: hq.country_name,
            is_headquarter: hq.is_headquarter,
            swift_code: hq.swift_code.into(),
        }
    }
}

impl CountryResponse {
    /// Flattens headquarters and their branches into one list.
    pub fn from_headquarters(country_iso2: &str, headquarters: &[Headquarter]) -> Result<Self> {
        let first = headquarters.first().ok_or_else(|| BankError::FormattingError {
            message: format!("no banks to format for country {}", country_iso2),
        })?;

        let banks: Vec<BankSummary> = headquarters
            .iter()
            .flat_map(|hq| {
                std::iter::once(BankSummary::from(hq)).chain(hq.branches.iter().map(BankSummary::from))
            })
            .collect();

        Ok(Self {
            country_iso2: country_iso2.to_string(),
            country_name: first.country_name.clone(),
            count: banks.len(),
            banks,
        })
    }
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error wrapper rendering a [`BankError`] as `{"error": ...}` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub BankError);

impl From<BankError> for ApiError {
    fn from(err: BankError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &BankError) -> StatusCode {
    match (err.category(), err) {
        (_, BankError::Timeout { .. }) => StatusCode::SERVICE_UNAVAILABLE,
        (ErrorCategory::Client, _) => StatusCode::BAD_REQUEST,
        (ErrorCategory::NotFound, _) => StatusCode::NOT_FOUND,
        (ErrorCategory::Conflict, _) => StatusCode::CONFLICT,
        (ErrorCategory::Storage, _)
        | (ErrorCategory::Internal, _)
        | (ErrorCategory::Configuration, _) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = match self.0.category() {
            ErrorCategory::Storage if matches!(self.0, BankError::Timeout { .. }) => {
                tracing::warn!("⏱️ {}", self.0);
                "Request timed out".to_string()
            }
            ErrorCategory::Storage => {
                tracing::error!("❌ {}", self.0);
                "Database error".to_string()
            }
            ErrorCategory::Internal | ErrorCategory::Configuration => {
                tracing::error!("❌ {}", self.0);
                "Internal server error".to_string()
            }
            _ => self.0.to_string(),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
