//! Loan lifecycle endpoints

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::transaction::{CreateLoanRequest, ReturnLoanRequest, SetDueDateRequest, TransactionDetails},
    AppState,
};

use super::AuthenticatedUser;

/// Request a copy. Students borrow for themselves; staff must name the borrower.
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Request created", body = TransactionDetails),
        (status = 403, description = "Requesting for another user", body = crate::error::ErrorResponse),
        (status = 404, description = "User or copy not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Copy not available", body = crate::error::ErrorResponse)
    )
)]
pub async fn request_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<TransactionDetails>)> {
    let user_id = match request.user_id {
        Some(user_id) => user_id,
        None if claims.is_staff() => {
            return Err(AppError::BadRequest("user_id is required for staff requests".to_string()))
        }
        None => claims.user_id,
    };
    claims.require_self_or_staff(user_id)?;

    let details = state
        .services
        .loans
        .request_loan(user_id, request.book_copy_id)
        .await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// Pending requests, oldest first
#[utoipa::path(
    get,
    path = "/loans/pending",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending requests", body = Vec<TransactionDetails>),
        (status = 403, description = "Staff only", body = crate::error::ErrorResponse)
    )
)]
pub async fn pending_requests(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    claims.require_staff()?;
    Ok(Json(state.services.loans.pending_requests().await?))
}

/// Loans currently out
#[utoipa::path(
    get,
    path = "/loans/active",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active loans", body = Vec<TransactionDetails>),
        (status = 403, description = "Staff only", body = crate::error::ErrorResponse)
    )
)]
pub async fn active_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    claims.require_staff()?;
    Ok(Json(state.services.loans.active_loans().await?))
}

/// Get one transaction
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Transaction", body = TransactionDetails),
        (status = 403, description = "Another borrower's transaction", body = crate::error::ErrorResponse),
        (status = 404, description = "Transaction not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<TransactionDetails>> {
    let details = state.services.loans.get_transaction(transaction_id).await?;
    claims.require_self_or_staff(details.borrower.id)?;
    Ok(Json(details))
}

/// Issue a requested copy; the authenticated clerk is recorded
#[utoipa::path(
    post,
    path = "/loans/{id}/issue",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Loan issued", body = TransactionDetails),
        (status = 404, description = "Transaction not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Not pending or copy unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn issue_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<TransactionDetails>> {
    claims.require_staff()?;
    let details = state
        .services
        .loans
        .issue_loan(transaction_id, claims.user_id)
        .await?;
    Ok(Json(details))
}

/// The return body is optional; an empty one means no remarks
fn return_body(body: &[u8]) -> AppResult<ReturnLoanRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ReturnLoanRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid return body: {}", e)))
}

/// Return an issued copy. Students may only return their own loans.
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Transaction ID")
    ),
    request_body = ReturnLoanRequest,
    responses(
        (status = 200, description = "Loan returned", body = TransactionDetails),
        (status = 403, description = "Not the borrower", body = crate::error::ErrorResponse),
        (status = 404, description = "Transaction not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Not issued or already returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(transaction_id): Path<Uuid>,
    body: Bytes,
) -> AppResult<Json<TransactionDetails>> {
    let request = return_body(&body)?;
    let requested_by = if claims.is_staff() { None } else { Some(claims.user_id) };

    let details = state
        .services
        .loans
        .return_loan(transaction_id, requested_by, request.remarks)
        .await?;
    Ok(Json(details))
}

/// Reject a request
#[utoipa::path(
    post,
    path = "/loans/{id}/reject",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Request rejected", body = TransactionDetails),
        (status = 404, description = "Transaction not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn reject_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<TransactionDetails>> {
    claims.require_staff()?;
    Ok(Json(state.services.loans.reject_request(transaction_id).await?))
}

/// Override the due date
#[utoipa::path(
    put,
    path = "/loans/{id}/due-date",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Transaction ID")
    ),
    request_body = SetDueDateRequest,
    responses(
        (status = 200, description = "Due date changed", body = TransactionDetails),
        (status = 400, description = "Due date before issue", body = crate::error::ErrorResponse),
        (status = 409, description = "Transaction closed", body = crate::error::ErrorResponse)
    )
)]
pub async fn set_due_date(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(transaction_id): Path<Uuid>,
    Json(request): Json<SetDueDateRequest>,
) -> AppResult<Json<TransactionDetails>> {
    claims.require_staff()?;
    let details = state
        .services
        .loans
        .set_due_date(transaction_id, request.due_date)
        .await?;
    Ok(Json(details))
}

/// Active loans of one borrower, most recent first
#[utoipa::path(
    get,
    path = "/users/{id}/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's active loans", body = Vec<TransactionDetails>),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    claims.require_self_or_staff(user_id)?;
    Ok(Json(state.services.loans.user_active_loans(user_id).await?))
}
