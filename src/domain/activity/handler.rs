use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use validator::Validate;

use super::dto::{
    ActivityListQuery, ActivityListResponse, ActivityResponse, BatchDeleteRequest,
    BatchDeleteResponse, CreateActivityRequest, DeleteActivityResponse, RegisterActivityRequest,
    RegistrationListQuery, RegistrationListResponse, RegistrationResponse, UpdateActivityRequest,
};
use super::registration_service::RegistrationService;
use super::service::ActivityService;
use crate::state::AppState;
use crate::utils::auth::{AdminUser, AuthUser};
use crate::utils::error::AppError;
use crate::utils::BaseResponse;

/// 활동 목록 조회 API
///
/// 분류, 상태, 작성자로 필터링합니다. 상태는 요청 시각 기준으로 계산됩니다.
#[utoipa::path(
    get,
    path = "/api/activities",
    params(ActivityListQuery),
    responses(
        (status = 200, description = "활동 목록 조회 성공", body = SuccessActivityListResponse),
        (status = 400, description = "잘못된 요청", body = ErrorResponse)
    ),
    tag = "Activity"
)]
pub async fn list_activities(
    State(state): State<AppState>,
    query: Result<Query<ActivityListQuery>, QueryRejection>,
) -> Result<Json<BaseResponse<ActivityListResponse>>, AppError> {
    let Query(query) = query?;
    query.validate()?;

    let result = ActivityService::list_activities(&state.db, query, Utc::now()).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// 활동 상세 조회 API
#[utoipa::path(
    get,
    path = "/api/activities/{activity_id}",
    params(("activity_id" = i64, Path, description = "활동 ID")),
    responses(
        (status = 200, description = "활동 조회 성공", body = SuccessActivityResponse),
        (status = 404, description = "존재하지 않는 활동", body = ErrorResponse)
    ),
    tag = "Activity"
)]
pub async fn get_activity(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<BaseResponse<ActivityResponse>>, AppError> {
    let Path(activity_id) = path?;

    let result = ActivityService::get_activity(&state.db, activity_id, Utc::now()).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// 활동 생성 API (관리자)
///
/// 생성 후 활성 사용자 전원에게 공지 알림을 비동기로 생성합니다.
#[utoipa::path(
    post,
    path = "/api/activities",
    request_body = CreateActivityRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "활동 생성 성공", body = SuccessActivityResponse),
        (status = 400, description = "잘못된 요청", body = ErrorResponse),
        (status = 401, description = "인증 실패", body = ErrorResponse),
        (status = 403, description = "관리자 권한 없음", body = ErrorResponse)
    ),
    tag = "Activity"
)]
pub async fn create_activity(
    State(state): State<AppState>,
    admin: AdminUser,
    body: Result<Json<CreateActivityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BaseResponse<ActivityResponse>>), AppError> {
    let Json(req) = body?;
    req.validate()?;

    let result = ActivityService::create_activity(
        &state.db,
        state.notifier.clone(),
        admin.user_id(),
        req,
        Utc::now(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(BaseResponse::created(result))))
}

/// 활동 수정 API (관리자)
///
/// 보낸 필드만 수정합니다. 시간 필드가 바뀌면 상태를 다시 계산합니다.
#[utoipa::path(
    patch,
    path = "/api/activities/{activity_id}",
    params(("activity_id" = i64, Path, description = "활동 ID")),
    request_body = UpdateActivityRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "활동 수정 성공", body = SuccessActivityResponse),
        (status = 400, description = "잘못된 요청", body = ErrorResponse),
        (status = 403, description = "관리자 권한 없음", body = ErrorResponse),
        (status = 404, description = "존재하지 않는 활동", body = ErrorResponse)
    ),
    tag = "Activity"
)]
pub async fn update_activity(
    State(state): State<AppState>,
    _admin: AdminUser,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateActivityRequest>, JsonRejection>,
) -> Result<Json<BaseResponse<ActivityResponse>>, AppError> {
    let Path(activity_id) = path?;
    let Json(req) = body?;
    req.validate()?;

    let result =
        ActivityService::update_activity(&state.db, activity_id, req, Utc::now()).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// 활동 삭제 API (관리자)
#[utoipa::path(
    delete,
    path = "/api/activities/{activity_id}",
    params(("activity_id" = i64, Path, description = "활동 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "활동 삭제 성공", body = SuccessDeleteActivityResponse),
        (status = 403, description = "관리자 권한 없음", body = ErrorResponse),
        (status = 404, description = "존재하지 않는 활동", body = ErrorResponse),
        (status = 409, description = "유효한 신청이 남아 있음", body = ErrorResponse)
    ),
    tag = "Activity"
)]
pub async fn delete_activity(
    State(state): State<AppState>,
    _admin: AdminUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<BaseResponse<DeleteActivityResponse>>, AppError> {
    let Path(activity_id) = path?;

    ActivityService::delete_activity(&state.db, activity_id).await?;

    Ok(Json(BaseResponse::success(DeleteActivityResponse {
        activity_id,
        deleted_at: Utc::now(),
    })))
}

/// 활동 일괄 삭제 API (관리자)
///
/// 하나라도 삭제할 수 없으면 전체를 취소합니다.
#[utoipa::path(
    post,
    path = "/api/activities/batch-delete",
    request_body = BatchDeleteRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "일괄 삭제 성공", body = SuccessBatchDeleteResponse),
        (status = 400, description = "잘못된 요청", body = ErrorResponse),
        (status = 403, description = "관리자 권한 없음", body = ErrorResponse),
        (status = 404, description = "존재하지 않는 활동 포함", body = ErrorResponse),
        (status = 409, description = "유효한 신청이 남아 있음", body = ErrorResponse)
    ),
    tag = "Activity"
)]
pub async fn batch_delete_activities(
    State(state): State<AppState>,
    _admin: AdminUser,
    body: Result<Json<BatchDeleteRequest>, JsonRejection>,
) -> Result<Json<BaseResponse<BatchDeleteResponse>>, AppError> {
    let Json(req) = body?;
    req.validate()?;

    let deleted_count =
        ActivityService::batch_delete_activities(&state.db, req.activity_ids).await?;

    Ok(Json(BaseResponse::success(BatchDeleteResponse {
        deleted_count,
    })))
}

/// 활동 신청 API
///
/// 이름/학번을 생략하면 사용자 정보로 채웁니다.
#[utoipa::path(
    post,
    path = "/api/activities/{activity_id}/register",
    params(("activity_id" = i64, Path, description = "활동 ID")),
    request_body = RegisterActivityRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "신청 성공", body = SuccessRegistrationResponse),
        (status = 400, description = "신청 불필요 또는 신청 기간 아님", body = ErrorResponse),
        (status = 401, description = "인증 실패", body = ErrorResponse),
        (status = 404, description = "존재하지 않는 활동", body = ErrorResponse),
        (status = 409, description = "정원 마감 또는 중복 신청", body = ErrorResponse)
    ),
    tag = "Registration"
)]
pub async fn register_activity(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<RegisterActivityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BaseResponse<RegistrationResponse>>), AppError> {
    let user_id = user.user_id()?;
    let Path(activity_id) = path?;
    let Json(req) = body?;
    req.validate()?;

    let result =
        RegistrationService::register(&state.db, activity_id, user_id, req, Utc::now()).await?;

    Ok((StatusCode::CREATED, Json(BaseResponse::created(result))))
}

/// 내 신청 목록 API
#[utoipa::path(
    get,
    path = "/api/activities/my-registrations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "조회 성공", body = SuccessMyRegistrationsResponse),
        (status = 401, description = "인증 실패", body = ErrorResponse)
    ),
    tag = "Registration"
)]
pub async fn my_registrations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<BaseResponse<Vec<RegistrationResponse>>>, AppError> {
    let user_id = user.user_id()?;

    let result = RegistrationService::my_registrations(&state.db, user_id).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// 활동별 신청 목록 API (관리자)
#[utoipa::path(
    get,
    path = "/api/activities/{activity_id}/registrations",
    params(
        ("activity_id" = i64, Path, description = "활동 ID"),
        RegistrationListQuery
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "조회 성공", body = SuccessRegistrationListResponse),
        (status = 403, description = "관리자 권한 없음", body = ErrorResponse),
        (status = 404, description = "존재하지 않는 활동", body = ErrorResponse)
    ),
    tag = "Registration"
)]
pub async fn list_registrations(
    State(state): State<AppState>,
    _admin: AdminUser,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<RegistrationListQuery>, QueryRejection>,
) -> Result<Json<BaseResponse<RegistrationListResponse>>, AppError> {
    let Path(activity_id) = path?;
    let Query(query) = query?;
    query.validate()?;

    let result = RegistrationService::list_registrations(&state.db, activity_id, query).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// 신청 취소 API (본인)
#[utoipa::path(
    delete,
    path = "/api/activities/registrations/{registration_id}",
    params(("registration_id" = i64, Path, description = "신청 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "취소 성공", body = SuccessRegistrationResponse),
        (status = 400, description = "이미 취소되었거나 참석 처리된 신청", body = ErrorResponse),
        (status = 401, description = "인증 실패", body = ErrorResponse),
        (status = 404, description = "존재하지 않는 신청", body = ErrorResponse)
    ),
    tag = "Registration"
)]
pub async fn cancel_registration(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<BaseResponse<RegistrationResponse>>, AppError> {
    let user_id = user.user_id()?;
    let Path(registration_id) = path?;

    let result =
        RegistrationService::cancel(&state.db, registration_id, user_id, Utc::now()).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// 참석 처리 API (관리자)
#[utoipa::path(
    post,
    path = "/api/activities/registrations/{registration_id}/attendance",
    params(("registration_id" = i64, Path, description = "신청 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "참석 처리 성공", body = SuccessRegistrationResponse),
        (status = 400, description = "확정 상태가 아닌 신청", body = ErrorResponse),
        (status = 403, description = "관리자 권한 없음", body = ErrorResponse),
        (status = 404, description = "존재하지 않는 신청", body = ErrorResponse)
    ),
    tag = "Registration"
)]
pub async fn mark_attendance(
    State(state): State<AppState>,
    admin: AdminUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<BaseResponse<RegistrationResponse>>, AppError> {
    let Path(registration_id) = path?;

    let result =
        RegistrationService::mark_attended(&state.db, registration_id, admin.user_id()).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// 신청 명단 내보내기 API (관리자)
///
/// UTF-8 BOM이 붙은 CSV 파일을 내려줍니다.
#[utoipa::path(
    get,
    path = "/api/activities/{activity_id}/registrations/export",
    params(("activity_id" = i64, Path, description = "활동 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "CSV 파일", content_type = "text/csv"),
        (status = 403, description = "관리자 권한 없음", body = ErrorResponse),
        (status = 404, description = "존재하지 않는 활동", body = ErrorResponse)
    ),
    tag = "Registration"
)]
pub async fn export_registrations(
    State(state): State<AppState>,
    _admin: AdminUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(activity_id) = path?;

    let sheet =
        RegistrationService::export_registrations(&state.db, activity_id, Utc::now()).await?;

    let disposition = HeaderValue::from_str(&sheet.content_disposition())
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        sheet.bytes,
    )
        .into_response())
}
