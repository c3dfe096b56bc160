use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{require_field, AppState};
use crate::db::models::{Complaint, ComplaintWithStudent};
use crate::db::{ComplaintRepository, UserRepository};
use crate::error::AppError;

const MIN_DESCRIPTION_CHARS: usize = 10;

#[derive(Debug, Deserialize)]
pub struct SubmitComplaintRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub student_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SubmitComplaintResponse {
    pub success: bool,
    pub message: String,
    pub complaint: Complaint,
}

#[derive(Debug, Deserialize)]
pub struct ComplaintsQuery {
    pub student_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ComplaintListResponse {
    pub success: bool,
    pub message: String,
    pub complaints: Vec<ComplaintWithStudent>,
    pub total: usize,
}

/// POST /submit_complaint
pub async fn submit_complaint(
    State(state): State<AppState>,
    payload: Result<Json<SubmitComplaintRequest>, JsonRejection>,
) -> Result<Json<SubmitComplaintResponse>, AppError> {
    let Json(req) = payload.map_err(|_| AppError::Validation("Invalid JSON data".to_string()))?;

    let title = require_field(&req.title, "title")?;
    let category = require_field(&req.category, "category")?;
    let description = require_field(&req.description, "description")?;

    if description.chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(AppError::Validation(
            "Description must be at least 10 characters long".to_string(),
        ));
    }

    let student_id = match req.student_id {
        Some(id) if id > 0 => id,
        _ => return Err(AppError::Validation("Student ID is required".to_string())),
    };

    if UserRepository::get_by_id(&state.db, student_id).await?.is_none() {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    let complaint =
        ComplaintRepository::create(&state.db, student_id, title, category, description).await?;

    tracing::info!("complaint {} submitted by student {}", complaint.id, student_id);

    Ok(Json(SubmitComplaintResponse {
        success: true,
        message: "Complaint submitted successfully".to_string(),
        complaint,
    }))
}

/// GET /get_complaints?student_id=<optional>
pub async fn get_complaints(
    State(state): State<AppState>,
    query: Result<Query<ComplaintsQuery>, QueryRejection>,
) -> Result<Json<ComplaintListResponse>, AppError> {
    let Query(query) =
        query.map_err(|_| AppError::Validation("Invalid query parameters".to_string()))?;

    let complaints = match query.student_id {
        Some(student_id) if student_id > 0 => {
            ComplaintRepository::list_for_student(&state.db, student_id).await?
        }
        _ => ComplaintRepository::list_all(&state.db).await?,
    };

    let total = complaints.len();

    Ok(Json(ComplaintListResponse {
        success: true,
        message: "Complaints retrieved successfully".to_string(),
        complaints,
        total,
    }))
}
