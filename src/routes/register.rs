use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sqlx::SqlitePool;

use crate::error::{ApiError, ApiResult, OrFail};
use crate::models::user::RegisterReq;
use crate::services::auth_service::{self, Registration};

/// POST /api/register (JSON: name, email, password)
pub async fn register(
    State(pool): State<SqlitePool>,
    req: Result<Json<RegisterReq>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = req.map_err(|_| ApiError::validation("Invalid input"))?;
    let new_user = req.validate().map_err(ApiError::validation)?;

    match auth_service::register_user(&pool, new_user)
        .await
        .or_fail("Something went wrong")?
    {
        Registration::Created(_) => Ok((
            StatusCode::CREATED,
            Json(serde_json::json!({
                "success": true,
                "message": "Account created successfully"
            })),
        )),
        Registration::EmailTaken => Err(ApiError::validation("Email already registered")),
    }
}
