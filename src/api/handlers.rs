use crate::api::responses::{
    ApiError, BranchResponse, CountryResponse, HeadquarterResponse, MessageResponse,
};
use crate::api::AppState;
use crate::core::service::BankKind;
use crate::domain::model::{BankDetails, BankEntity};
use crate::utils::error::BankError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

type ApiResult = std::result::Result<Response, ApiError>;

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /v1/swift-codes/:swift_code
///
/// Headquarter view (with branches) for `XXX` codes, branch view otherwise.
pub async fn get_swift_code(
    State(state): State<AppState>,
    Path(swift_code): Path<String>,
) -> ApiResult {
    let entity = state
        .service
        .get_swift_code(&swift_code, state.deadline())
        .await?;

    Ok(match entity {
        BankEntity::Headquarter(hq) => Json(HeadquarterResponse::from(hq)).into_response(),
        BankEntity::Branch(branch) => Json(BranchResponse::from(branch)).into_response(),
    })
}

/// GET /v1/swift-codes/country/:country_iso2
pub async fn get_swift_codes_by_country(
    State(state): State<AppState>,
    Path(country_iso2): Path<String>,
) -> ApiResult {
    let headquarters = state
        .service
        .get_banks_by_country(&country_iso2, state.deadline())
        .await?;

    let view = CountryResponse::from_headquarters(&country_iso2, &headquarters)?;
    Ok(Json(view).into_response())
}

/// POST /v1/swift-codes
pub async fn add_swift_code(
    State(state): State<AppState>,
    payload: std::result::Result<Json<BankDetails>, JsonRejection>,
) -> ApiResult {
    let Json(details) = payload.map_err(|rejection| {
        BankError::validation(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let created = state
        .service
        .add_swift_code(details, state.deadline())
        .await?;

    let message = match created {
        BankEntity::Headquarter(hq) => format!("Headquarter {} created successfully", hq.swift_code),
        BankEntity::Branch(branch) => format!("Branch {} added successfully", branch.swift_code),
    };
    Ok((StatusCode::CREATED, Json(MessageResponse::new(message))).into_response())
}

/// DELETE /v1/swift-codes/:swift_code
pub async fn delete_swift_code(
    State(state): State<AppState>,
    Path(swift_code): Path<String>,
) -> ApiResult {
    let kind = state
        .service
        .delete_swift_code(&swift_code, state.deadline())
        .await?;

    let message = match kind {
        BankKind::Headquarter => "Headquarter was deleted successfully",
        BankKind::Branch => "Branch was deleted successfully",
    };
    Ok(Json(MessageResponse::new(message)).into_response())
}
