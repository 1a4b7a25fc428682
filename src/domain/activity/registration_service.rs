//! 활동 신청 엔진
//!
//! 신청 검사 순서는 고정입니다: 활동 존재, 신청 필요 여부, 신청 기간, 정원, 중복.
//! 앞 단계에서 실패하면 뒤 단계는 실행하지 않으며 쓰기 전에 모두 끝납니다.

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use tracing::{info, warn};

use super::capacity::CapacityCounter;
use super::dto::{
    RegisterActivityRequest, RegistrationListQuery, RegistrationListResponse,
    RegistrationResponse, DEFAULT_PAGE_LIMIT,
};
use super::entity::activity;
use super::export::{RegistrationExport, RegistrationSheet};
use super::registration_store::{NewRegistration, Page, RegistrationStore};
use super::service::ActivityService;
use super::status::{check_registration_window, ActivitySchedule};
use crate::domain::user::service::UserService;
use crate::utils::error::{AppError, WindowViolation};

pub struct RegistrationService;

impl RegistrationService {
    /// 활동 신청
    pub async fn register(
        db: &DatabaseConnection,
        activity_id: i64,
        user_id: i64,
        req: RegisterActivityRequest,
        now: DateTime<Utc>,
    ) -> Result<RegistrationResponse, AppError> {
        let txn = db.begin().await?;

        // 1. 활동 행 잠금 (같은 활동에 대한 동시 신청/삭제 직렬화)
        let activity_model = ActivityService::lock_activity(&txn, activity_id)
            .await?
            .ok_or_else(|| AppError::ActivityNotFound("존재하지 않는 활동입니다.".to_string()))?;

        // 2. 신청 기간이 없는 활동은 신청 대상이 아님
        let schedule = ActivitySchedule::of(&activity_model);
        if schedule.registration_window().is_none() {
            return Err(AppError::RegistrationNotRequired(
                "신청이 필요하지 않은 활동입니다.".to_string(),
            ));
        }

        // 3. 신청 기간
        if let Err(violation) = check_registration_window(now, &schedule) {
            let message = match violation {
                WindowViolation::NotYetOpen => "아직 신청 기간이 아닙니다.",
                WindowViolation::AlreadyClosed => "신청 기간이 종료되었습니다.",
            };
            return Err(AppError::RegistrationWindowClosed(
                violation,
                message.to_string(),
            ));
        }

        // 4. 정원 (0은 무제한)
        if activity_model.capacity > 0 {
            let confirmed = CapacityCounter::count_confirmed(&txn, activity_id).await?;
            if !CapacityCounter::has_room(activity_model.capacity, confirmed) {
                return Err(AppError::ActivityFull(
                    "신청 정원이 마감되었습니다.".to_string(),
                ));
            }
        }

        // 5. 중복 신청
        if RegistrationStore::find_active(&txn, activity_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyRegistered(
                "이미 신청한 활동입니다.".to_string(),
            ));
        }

        // 6. 이름/학번은 요청값 우선, 없으면 사용자 정보
        let directory_user = UserService::find_active(&txn, user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("유효하지 않은 사용자입니다.".to_string()))?;

        let name = non_blank(req.name).unwrap_or(directory_user.name);
        let student_id = non_blank(req.student_id).unwrap_or(directory_user.student_id);

        let created = RegistrationStore::insert(
            &txn,
            NewRegistration {
                activity_id,
                user_id,
                name,
                student_id,
                phone: non_blank(req.phone),
                remark: non_blank(req.remark),
                created_at: now,
            },
        )
        .await?;

        txn.commit().await?;

        info!(
            activity_id = activity_id,
            user_id = user_id,
            registration_id = created.registration_id,
            "활동 신청 완료"
        );

        Ok(RegistrationResponse::from(created))
    }

    /// 본인 신청 취소
    pub async fn cancel(
        db: &DatabaseConnection,
        registration_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<RegistrationResponse, AppError> {
        let cancelled = RegistrationStore::cancel(db, registration_id, user_id, now)
            .await
            .inspect_err(|e| {
                warn!(
                    registration_id = registration_id,
                    user_id = user_id,
                    reason = %e,
                    "신청 취소 거부"
                )
            })?;

        info!(
            registration_id = registration_id,
            activity_id = cancelled.activity_id,
            user_id = user_id,
            "활동 신청 취소 완료"
        );

        Ok(RegistrationResponse::from(cancelled))
    }

    /// 참석 처리 (관리자)
    pub async fn mark_attended(
        db: &DatabaseConnection,
        registration_id: i64,
        admin_id: i64,
    ) -> Result<RegistrationResponse, AppError> {
        let attended = RegistrationStore::mark_attended(db, registration_id).await?;

        info!(
            registration_id = registration_id,
            activity_id = attended.activity_id,
            admin_id = admin_id,
            "참석 처리 완료"
        );

        Ok(RegistrationResponse::from(attended))
    }

    /// 활동별 신청 목록 (관리자)
    pub async fn list_registrations(
        db: &DatabaseConnection,
        activity_id: i64,
        query: RegistrationListQuery,
    ) -> Result<RegistrationListResponse, AppError> {
        let activity_model = Self::find_activity(db, activity_id).await?;

        let page = Page {
            skip: query.skip.unwrap_or(0),
            limit: query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        };
        let (rows, total) =
            RegistrationStore::list_for_activity(db, activity_id, query.status, Some(page))
                .await?;

        let registrations = rows
            .into_iter()
            .map(|(registration, user)| RegistrationResponse::with_user(registration, user))
            .collect();

        Ok(RegistrationListResponse {
            registrations,
            total,
            activity_name: activity_model.title,
        })
    }

    /// 내 신청 목록 (취소 포함, 최신순)
    pub async fn my_registrations(
        db: &DatabaseConnection,
        user_id: i64,
    ) -> Result<Vec<RegistrationResponse>, AppError> {
        let rows = RegistrationStore::list_for_user(db, user_id).await?;

        Ok(rows.into_iter().map(RegistrationResponse::from).collect())
    }

    /// 신청 명단 CSV 내보내기 (관리자)
    pub async fn export_registrations(
        db: &DatabaseConnection,
        activity_id: i64,
        now: DateTime<Utc>,
    ) -> Result<RegistrationSheet, AppError> {
        let activity_model = Self::find_activity(db, activity_id).await?;

        let (rows, total) =
            RegistrationStore::list_for_activity(db, activity_id, None, None).await?;

        let sheet = RegistrationExport::build(&activity_model.title, &rows, now)?;

        info!(
            activity_id = activity_id,
            rows = total,
            bytes = sheet.bytes.len(),
            "신청 명단 내보내기 완료"
        );

        Ok(sheet)
    }

    async fn find_activity(
        db: &DatabaseConnection,
        activity_id: i64,
    ) -> Result<activity::Model, AppError> {
        activity::Entity::find_by_id(activity_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::ActivityNotFound("존재하지 않는 활동입니다.".to_string()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
