use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::entity::activity::{self, ActivityCategory, ActivityStatus};
use super::entity::activity_registration::{self, RegistrationStatus};
use super::status::{evaluate_status, ActivitySchedule};
use crate::domain::user::entity::user;

/// 목록 조회 기본/최대 건수
pub const DEFAULT_PAGE_LIMIT: u64 = 100;
pub const MAX_PAGE_LIMIT: u64 = 100;

/// 배치 삭제 최대 건수
pub const MAX_BATCH_DELETE: usize = 100;

/// 필드가 없으면 None, null이면 Some(None)
fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============== 활동 생성 ==============

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    #[validate(length(min = 1, max = 100, message = "활동 제목은 1~100자여야 합니다."))]
    pub title: String,

    #[validate(length(max = 5000, message = "활동 설명은 5000자를 초과할 수 없습니다."))]
    #[serde(default)]
    pub description: String,

    #[validate(length(min = 1, max = 100, message = "활동 장소는 1~100자여야 합니다."))]
    pub location: String,

    #[validate(length(min = 1, max = 100, message = "주최 측은 1~100자여야 합니다."))]
    pub organizer: String,

    #[validate(length(max = 2000, message = "유의 사항은 2000자를 초과할 수 없습니다."))]
    pub notes: Option<String>,

    #[validate(length(max = 500, message = "이미지 경로는 500자를 초과할 수 없습니다."))]
    #[serde(default)]
    pub image: String,

    pub category: ActivityCategory,

    #[validate(range(min = 0, message = "정원은 0 이상이어야 합니다."))]
    #[serde(default)]
    pub capacity: i32,

    pub registration_start: Option<DateTime<Utc>>,
    pub registration_end: Option<DateTime<Utc>>,
    pub activity_start: DateTime<Utc>,
    pub activity_end: Option<DateTime<Utc>>,
}

// ============== 활동 수정 ==============

/// 부분 수정 요청
///
/// nullable 필드는 생략하면 유지, `null`이면 비웁니다. `status`는 받지 않습니다.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivityRequest {
    #[validate(length(min = 1, max = 100, message = "활동 제목은 1~100자여야 합니다."))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "활동 설명은 5000자를 초과할 수 없습니다."))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 100, message = "활동 장소는 1~100자여야 합니다."))]
    pub location: Option<String>,

    #[validate(length(min = 1, max = 100, message = "주최 측은 1~100자여야 합니다."))]
    pub organizer: Option<String>,

    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,

    #[validate(length(max = 500, message = "이미지 경로는 500자를 초과할 수 없습니다."))]
    pub image: Option<String>,

    pub category: Option<ActivityCategory>,

    #[validate(range(min = 0, message = "정원은 0 이상이어야 합니다."))]
    pub capacity: Option<i32>,

    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub registration_start: Option<Option<DateTime<Utc>>>,

    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub registration_end: Option<Option<DateTime<Utc>>>,

    pub activity_start: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub activity_end: Option<Option<DateTime<Utc>>>,
}

impl UpdateActivityRequest {
    /// 상태 재계산이 필요한 시간 필드 변경 여부
    pub fn touches_schedule(&self) -> bool {
        self.registration_start.is_some()
            || self.registration_end.is_some()
            || self.activity_start.is_some()
            || self.activity_end.is_some()
    }
}

// ============== 활동 조회 ==============

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "snake_case")]
#[into_params(parameter_in = Query)]
pub struct ActivityListQuery {
    /// 활동 분류 (文艺/讲座/体育/科创)
    #[param(value_type = Option<String>)]
    pub category: Option<ActivityCategory>,
    /// 현재 시각 기준 상태
    #[param(value_type = Option<String>)]
    pub status: Option<ActivityStatus>,
    /// 작성 관리자 ID
    #[serde(alias = "createdBy")]
    pub created_by: Option<i64>,
    pub skip: Option<u64>,
    #[validate(range(min = 1, max = 100, message = "limit은 1~100 사이여야 합니다."))]
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub activity_id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub organizer: String,
    pub notes: Option<String>,
    pub image: String,
    pub category: ActivityCategory,
    pub capacity: i32,
    pub registration_start: Option<DateTime<Utc>>,
    pub registration_end: Option<DateTime<Utc>>,
    pub activity_start: DateTime<Utc>,
    pub activity_end: Option<DateTime<Utc>>,
    /// 응답 시점에 다시 계산한 상태
    pub status: ActivityStatus,
    #[schema(example = "报名中")]
    pub status_label: String,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActivityResponse {
    pub fn from_model(model: activity::Model, now: DateTime<Utc>) -> Self {
        let status = evaluate_status(now, &ActivitySchedule::of(&model));

        Self {
            activity_id: model.activity_id,
            title: model.title,
            description: model.description,
            location: model.location,
            organizer: model.organizer,
            notes: model.notes,
            image: model.image,
            category: model.category,
            capacity: model.capacity,
            registration_start: model.registration_start,
            registration_end: model.registration_end,
            activity_start: model.activity_start,
            activity_end: model.activity_end,
            status,
            status_label: status.label().to_string(),
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityListResponse {
    pub activities: Vec<ActivityResponse>,
    pub total: u64,
}

// ============== 활동 삭제 ==============

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteRequest {
    #[validate(length(min = 1, max = 100, message = "삭제할 활동은 1~100개여야 합니다."))]
    pub activity_ids: Vec<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteActivityResponse {
    pub activity_id: i64,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteResponse {
    pub deleted_count: u64,
}

// ============== 활동 신청 ==============

/// 생략하거나 공백만 보낸 이름/학번은 사용자 정보로 채웁니다.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterActivityRequest {
    #[validate(length(max = 50, message = "이름은 50자를 초과할 수 없습니다."))]
    pub name: Option<String>,

    #[validate(length(max = 30, message = "학번은 30자를 초과할 수 없습니다."))]
    pub student_id: Option<String>,

    #[validate(length(max = 20, message = "연락처는 20자를 초과할 수 없습니다."))]
    pub phone: Option<String>,

    #[validate(length(max = 500, message = "비고는 500자를 초과할 수 없습니다."))]
    pub remark: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RegistrationListQuery {
    /// 신청 상태 (confirmed/cancelled/attended)
    #[param(value_type = Option<String>)]
    pub status: Option<RegistrationStatus>,
    pub skip: Option<u64>,
    #[validate(range(min = 1, max = 100, message = "limit은 1~100 사이여야 합니다."))]
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub registration_id: i64,
    pub activity_id: i64,
    pub user_id: i64,
    pub name: String,
    pub student_id: String,
    pub phone: Option<String>,
    pub remark: Option<String>,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    /// 관리자 목록에서만 채워집니다.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

impl From<activity_registration::Model> for RegistrationResponse {
    fn from(model: activity_registration::Model) -> Self {
        Self {
            registration_id: model.registration_id,
            activity_id: model.activity_id,
            user_id: model.user_id,
            name: model.name,
            student_id: model.student_id,
            phone: model.phone,
            remark: model.remark,
            status: model.status,
            created_at: model.created_at,
            cancelled_at: model.cancelled_at,
            user_name: None,
            user_email: None,
        }
    }
}

impl RegistrationResponse {
    pub fn with_user(model: activity_registration::Model, user: Option<user::Model>) -> Self {
        let mut response = Self::from(model);
        if let Some(user) = user {
            response.user_name = Some(user.name);
            response.user_email = Some(user.email);
        }
        response
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationListResponse {
    pub registrations: Vec<RegistrationResponse>,
    pub total: u64,
    pub activity_name: String,
}

// ============== Swagger 응답 스키마 ==============

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessActivityResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: ActivityResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessActivityListResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: ActivityListResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessDeleteActivityResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: DeleteActivityResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessBatchDeleteResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: BatchDeleteResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessRegistrationResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: RegistrationResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessRegistrationListResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: RegistrationListResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessMyRegistrationsResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: Vec<RegistrationResponse>,
}
