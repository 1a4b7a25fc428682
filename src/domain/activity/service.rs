use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use tracing::{debug, info};

use super::dto::{
    ActivityListQuery, ActivityListResponse, ActivityResponse, CreateActivityRequest,
    UpdateActivityRequest, DEFAULT_PAGE_LIMIT, MAX_BATCH_DELETE,
};
use super::entity::activity::{self, ActivityStatus};
use super::registration_store::RegistrationStore;
use super::status::{evaluate_status, ActivitySchedule};
use crate::domain::notification::{dispatch_activity_published, NotificationDispatcher};
use crate::utils::error::AppError;

pub struct ActivityService;

impl ActivityService {
    /// 활동 생성 (관리자)
    ///
    /// 상태는 요청 값이 아니라 시간 필드로 계산합니다. 알림은 응답과 별개로 발송됩니다.
    pub async fn create_activity(
        db: &DatabaseConnection,
        notifier: Arc<dyn NotificationDispatcher>,
        admin_id: i64,
        req: CreateActivityRequest,
        now: DateTime<Utc>,
    ) -> Result<ActivityResponse, AppError> {
        let schedule = ActivitySchedule {
            registration_start: req.registration_start,
            registration_end: req.registration_end,
            activity_start: req.activity_start,
            activity_end: req.activity_end,
        };
        schedule.validate()?;

        let status = evaluate_status(now, &schedule);

        let created = activity::ActiveModel {
            title: Set(req.title.trim().to_string()),
            description: Set(req.description),
            location: Set(req.location),
            organizer: Set(req.organizer),
            notes: Set(req.notes),
            image: Set(req.image),
            category: Set(req.category),
            capacity: Set(req.capacity),
            registration_start: Set(schedule.registration_start),
            registration_end: Set(schedule.registration_end),
            activity_start: Set(schedule.activity_start),
            activity_end: Set(schedule.activity_end),
            status: Set(status),
            created_by: Set(Some(admin_id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(
            activity_id = created.activity_id,
            admin_id = admin_id,
            status = ?status,
            "활동 생성 완료"
        );

        dispatch_activity_published(notifier, created.clone());

        Ok(ActivityResponse::from_model(created, now))
    }

    /// 활동 단건 조회
    pub async fn get_activity(
        db: &DatabaseConnection,
        activity_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ActivityResponse, AppError> {
        let model = Self::find_activity(db, activity_id).await?;

        Ok(ActivityResponse::from_model(model, now))
    }

    /// 활동 목록 조회
    ///
    /// 상태 필터는 응답과 같은 기준(현재 시각으로 다시 계산한 상태)으로 적용합니다.
    pub async fn list_activities(
        db: &DatabaseConnection,
        query: ActivityListQuery,
        now: DateTime<Utc>,
    ) -> Result<ActivityListResponse, AppError> {
        let skip = query.skip.unwrap_or(0);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

        let mut select = activity::Entity::find();
        if let Some(category) = query.category {
            select = select.filter(activity::Column::Category.eq(category));
        }
        if let Some(created_by) = query.created_by {
            select = select.filter(activity::Column::CreatedBy.eq(created_by));
        }
        let select = select
            .order_by_desc(activity::Column::ActivityStart)
            .order_by_desc(activity::Column::ActivityId);

        let Some(wanted) = query.status else {
            let total = select.clone().count(db).await?;
            let models = select.offset(skip).limit(limit).all(db).await?;

            return Ok(ActivityListResponse {
                activities: models
                    .into_iter()
                    .map(|m| ActivityResponse::from_model(m, now))
                    .collect(),
                total,
            });
        };

        let matched: Vec<ActivityResponse> = select
            .all(db)
            .await?
            .into_iter()
            .map(|m| ActivityResponse::from_model(m, now))
            .filter(|a| a.status == wanted)
            .collect();
        let total = matched.len() as u64;

        Ok(ActivityListResponse {
            activities: matched
                .into_iter()
                .skip(skip as usize)
                .take(limit as usize)
                .collect(),
            total,
        })
    }

    /// 활동 부분 수정 (관리자)
    pub async fn update_activity(
        db: &DatabaseConnection,
        activity_id: i64,
        req: UpdateActivityRequest,
        now: DateTime<Utc>,
    ) -> Result<ActivityResponse, AppError> {
        let txn = db.begin().await?;

        let current = Self::lock_activity(&txn, activity_id)
            .await?
            .ok_or_else(|| AppError::ActivityNotFound("존재하지 않는 활동입니다.".to_string()))?;

        let schedule_changed = req.touches_schedule();
        let schedule = ActivitySchedule {
            registration_start: req
                .registration_start
                .unwrap_or(current.registration_start),
            registration_end: req.registration_end.unwrap_or(current.registration_end),
            activity_start: req.activity_start.unwrap_or(current.activity_start),
            activity_end: req.activity_end.unwrap_or(current.activity_end),
        };
        if schedule_changed {
            schedule.validate()?;
        }

        let mut model: activity::ActiveModel = current.into();

        if let Some(title) = req.title {
            model.title = Set(title.trim().to_string());
        }
        if let Some(description) = req.description {
            model.description = Set(description);
        }
        if let Some(location) = req.location {
            model.location = Set(location);
        }
        if let Some(organizer) = req.organizer {
            model.organizer = Set(organizer);
        }
        if let Some(notes) = req.notes {
            model.notes = Set(notes);
        }
        if let Some(image) = req.image {
            model.image = Set(image);
        }
        if let Some(category) = req.category {
            model.category = Set(category);
        }
        if let Some(capacity) = req.capacity {
            model.capacity = Set(capacity);
        }
        if schedule_changed {
            model.registration_start = Set(schedule.registration_start);
            model.registration_end = Set(schedule.registration_end);
            model.activity_start = Set(schedule.activity_start);
            model.activity_end = Set(schedule.activity_end);
            model.status = Set(evaluate_status(now, &schedule));
        }
        model.updated_at = Set(now);

        let updated = model.update(&txn).await?;
        txn.commit().await?;

        info!(
            activity_id = activity_id,
            schedule_changed = schedule_changed,
            "활동 수정 완료"
        );

        Ok(ActivityResponse::from_model(updated, now))
    }

    /// 활동 삭제 (관리자)
    ///
    /// 확정/참석 신청이 남아 있으면 거부합니다. 취소된 신청은 함께 삭제됩니다.
    pub async fn delete_activity(
        db: &DatabaseConnection,
        activity_id: i64,
    ) -> Result<(), AppError> {
        let txn = db.begin().await?;

        // 신청과 같은 행 잠금으로 직렬화
        Self::lock_activity(&txn, activity_id)
            .await?
            .ok_or_else(|| AppError::ActivityNotFound("존재하지 않는 활동입니다.".to_string()))?;

        if !RegistrationStore::activities_with_active(&txn, &[activity_id])
            .await?
            .is_empty()
        {
            return Err(AppError::ActivityHasActiveRegistrations(
                "유효한 신청이 남아 있는 활동은 삭제할 수 없습니다.".to_string(),
            ));
        }

        let cleaned = RegistrationStore::delete_cancelled(&txn, &[activity_id]).await?;
        activity::Entity::delete_by_id(activity_id).exec(&txn).await?;

        txn.commit().await?;

        info!(
            activity_id = activity_id,
            cancelled_registrations_removed = cleaned,
            "활동 삭제 완료"
        );

        Ok(())
    }

    /// 활동 일괄 삭제 (관리자)
    ///
    /// 하나라도 삭제할 수 없으면 아무것도 삭제하지 않습니다.
    pub async fn batch_delete_activities(
        db: &DatabaseConnection,
        activity_ids: Vec<i64>,
    ) -> Result<u64, AppError> {
        let ids: Vec<i64> = {
            let mut seen = HashSet::new();
            activity_ids
                .into_iter()
                .filter(|id| seen.insert(*id))
                .collect()
        };
        if ids.is_empty() || ids.len() > MAX_BATCH_DELETE {
            return Err(AppError::validation_error(
                "삭제할 활동은 1~100개여야 합니다.",
            ));
        }

        let txn = db.begin().await?;

        let existing: HashSet<i64> = Self::lock_activities(&txn, &ids)
            .await?
            .into_iter()
            .map(|m| m.activity_id)
            .collect();
        if existing.len() != ids.len() {
            let missing: Vec<String> = ids
                .iter()
                .filter(|id| !existing.contains(id))
                .map(|id| id.to_string())
                .collect();
            return Err(AppError::ActivityNotFound(format!(
                "존재하지 않는 활동입니다: {}",
                missing.join(", ")
            )));
        }

        let blocked = RegistrationStore::activities_with_active(&txn, &ids).await?;
        if !blocked.is_empty() {
            let blocked: Vec<String> = blocked.iter().map(|id| id.to_string()).collect();
            return Err(AppError::ActivityHasActiveRegistrations(format!(
                "유효한 신청이 남아 있는 활동은 삭제할 수 없습니다: {}",
                blocked.join(", ")
            )));
        }

        RegistrationStore::delete_cancelled(&txn, &ids).await?;
        let result = activity::Entity::delete_many()
            .filter(activity::Column::ActivityId.is_in(ids.clone()))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(
            requested = ids.len(),
            deleted = result.rows_affected,
            "활동 일괄 삭제 완료"
        );

        Ok(result.rows_affected)
    }

    /// 저장된 상태 값 갱신
    ///
    /// 종료되지 않은 활동만 다시 계산하고, 바뀐 행만 UPDATE합니다. 갱신된 행 수를 반환합니다.
    pub async fn refresh_statuses(
        db: &DatabaseConnection,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let candidates = activity::Entity::find()
            .filter(activity::Column::Status.ne(ActivityStatus::Ended))
            .all(db)
            .await?;

        let mut updated = 0u64;
        for candidate in candidates {
            let status = evaluate_status(now, &ActivitySchedule::of(&candidate));
            if status == candidate.status {
                continue;
            }

            let result = activity::Entity::update_many()
                .col_expr(activity::Column::Status, Expr::value(status))
                .filter(activity::Column::ActivityId.eq(candidate.activity_id))
                .filter(activity::Column::Status.eq(candidate.status))
                .exec(db)
                .await?;
            updated += result.rows_affected;

            debug!(
                activity_id = candidate.activity_id,
                from = ?candidate.status,
                to = ?status,
                "활동 상태 갱신"
            );
        }

        Ok(updated)
    }

    /// 활동 행을 잠그고 조회
    ///
    /// 신청/수정/삭제가 같은 활동에 대해 서로 직렬화됩니다. MySQL은 `SELECT ... FOR UPDATE`를 쓰고,
    /// 행 잠금 구문이 없는 SQLite는 값이 바뀌지 않는 UPDATE로 쓰기 잠금을 먼저 잡습니다.
    /// 트랜잭션의 첫 구문으로 호출해야 합니다.
    pub(crate) async fn lock_activities<C>(
        conn: &C,
        activity_ids: &[i64],
    ) -> Result<Vec<activity::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        if conn.get_database_backend() == DbBackend::Sqlite {
            activity::Entity::update_many()
                .col_expr(
                    activity::Column::UpdatedAt,
                    Expr::col(activity::Column::UpdatedAt).into(),
                )
                .filter(activity::Column::ActivityId.is_in(activity_ids.to_vec()))
                .exec(conn)
                .await?;
        }

        activity::Entity::find()
            .filter(activity::Column::ActivityId.is_in(activity_ids.to_vec()))
            .lock_exclusive()
            .all(conn)
            .await
    }

    pub(crate) async fn lock_activity<C>(
        conn: &C,
        activity_id: i64,
    ) -> Result<Option<activity::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Ok(Self::lock_activities(conn, &[activity_id])
            .await?
            .into_iter()
            .next())
    }

    async fn find_activity<C>(conn: &C, activity_id: i64) -> Result<activity::Model, AppError>
    where
        C: ConnectionTrait,
    {
        activity::Entity::find_by_id(activity_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::ActivityNotFound("존재하지 않는 활동입니다.".to_string()))
    }
}
