//! 활동 신청 저장소
//!
//! (활동, 사용자)당 활성(confirmed/attended) 신청은 최대 1건입니다.
//! 조회 후 검사만으로는 동시 요청을 막을 수 없으므로 INSERT는
//! `uq_activity_registration_active` 유니크 인덱스 위반을 중복으로 해석합니다.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

use super::entity::activity_registration::{self, RegistrationStatus};
use crate::domain::user::entity::user;
use crate::utils::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum RegistrationStoreError {
    #[error("이미 신청한 활동입니다.")]
    DuplicateActiveRegistration,
    #[error("존재하지 않는 신청입니다.")]
    NotFound,
    #[error("이미 취소된 신청입니다.")]
    AlreadyCancelled,
    #[error("{0:?} 상태의 신청은 변경할 수 없습니다.")]
    InvalidTransition(RegistrationStatus),
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<RegistrationStoreError> for AppError {
    fn from(err: RegistrationStoreError) -> Self {
        let message = err.to_string();
        match err {
            RegistrationStoreError::DuplicateActiveRegistration => {
                AppError::AlreadyRegistered(message)
            }
            RegistrationStoreError::NotFound => AppError::RegistrationNotFound(message),
            RegistrationStoreError::AlreadyCancelled => AppError::AlreadyCancelled(message),
            RegistrationStoreError::InvalidTransition(RegistrationStatus::Attended) => {
                AppError::RegistrationStateConflict(
                    "이미 참석 처리된 신청입니다.".to_string(),
                )
            }
            RegistrationStoreError::InvalidTransition(_) => {
                AppError::RegistrationStateConflict(message)
            }
            RegistrationStoreError::Db(e) => AppError::InternalError(e.to_string()),
        }
    }
}

/// 새 신청 (항상 confirmed로 생성)
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub activity_id: i64,
    pub user_id: i64,
    pub name: String,
    pub student_id: String,
    pub phone: Option<String>,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 목록 조회 범위
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

pub type RegistrationWithUser = (activity_registration::Model, Option<user::Model>);

pub struct RegistrationStore;

impl RegistrationStore {
    /// 활성 신청 조회
    pub async fn find_active<C>(
        conn: &C,
        activity_id: i64,
        user_id: i64,
    ) -> Result<Option<activity_registration::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        activity_registration::Entity::find()
            .filter(activity_registration::Column::ActivityId.eq(activity_id))
            .filter(activity_registration::Column::UserId.eq(user_id))
            .filter(activity_registration::Column::Status.is_in([
                RegistrationStatus::Confirmed,
                RegistrationStatus::Attended,
            ]))
            .one(conn)
            .await
    }

    /// confirmed 신청 생성
    pub async fn insert<C>(
        conn: &C,
        new: NewRegistration,
    ) -> Result<activity_registration::Model, RegistrationStoreError>
    where
        C: ConnectionTrait,
    {
        if Self::find_active(conn, new.activity_id, new.user_id)
            .await?
            .is_some()
        {
            return Err(RegistrationStoreError::DuplicateActiveRegistration);
        }

        Self::insert_row(conn, new).await
    }

    /// 사전 조회 없이 INSERT. 동시 요청이 검사를 통과했더라도 유니크 인덱스가 막습니다.
    async fn insert_row<C>(
        conn: &C,
        new: NewRegistration,
    ) -> Result<activity_registration::Model, RegistrationStoreError>
    where
        C: ConnectionTrait,
    {
        let status = RegistrationStatus::Confirmed;
        let model = activity_registration::ActiveModel {
            activity_id: Set(new.activity_id),
            user_id: Set(new.user_id),
            name: Set(new.name),
            student_id: Set(new.student_id),
            phone: Set(new.phone),
            remark: Set(new.remark),
            status: Set(status),
            active_marker: Set(status.active_marker()),
            created_at: Set(new.created_at),
            cancelled_at: Set(None),
            ..Default::default()
        };

        model.insert(conn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                RegistrationStoreError::DuplicateActiveRegistration
            }
            _ => RegistrationStoreError::Db(e),
        })
    }

    /// 본인 신청 취소 (confirmed -> cancelled)
    ///
    /// 상태 조건을 건 UPDATE 한 번으로 전이하므로 동시 취소에도 한 번만 성공합니다.
    pub async fn cancel<C>(
        conn: &C,
        registration_id: i64,
        owner_user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<activity_registration::Model, RegistrationStoreError>
    where
        C: ConnectionTrait,
    {
        let result = activity_registration::Entity::update_many()
            .col_expr(
                activity_registration::Column::Status,
                Expr::value(RegistrationStatus::Cancelled),
            )
            .col_expr(
                activity_registration::Column::ActiveMarker,
                Expr::value(Option::<bool>::None),
            )
            .col_expr(
                activity_registration::Column::CancelledAt,
                Expr::value(Some(now)),
            )
            .filter(activity_registration::Column::RegistrationId.eq(registration_id))
            .filter(activity_registration::Column::UserId.eq(owner_user_id))
            .filter(activity_registration::Column::Status.eq(RegistrationStatus::Confirmed))
            .exec(conn)
            .await?;

        let current = activity_registration::Entity::find_by_id(registration_id)
            .filter(activity_registration::Column::UserId.eq(owner_user_id))
            .one(conn)
            .await?
            .ok_or(RegistrationStoreError::NotFound)?;

        if result.rows_affected == 1 {
            return Ok(current);
        }

        match current.status {
            RegistrationStatus::Cancelled => Err(RegistrationStoreError::AlreadyCancelled),
            other => Err(RegistrationStoreError::InvalidTransition(other)),
        }
    }

    /// 참석 처리 (confirmed -> attended). 관리자 전용 흐름에서만 호출
    pub async fn mark_attended<C>(
        conn: &C,
        registration_id: i64,
    ) -> Result<activity_registration::Model, RegistrationStoreError>
    where
        C: ConnectionTrait,
    {
        let result = activity_registration::Entity::update_many()
            .col_expr(
                activity_registration::Column::Status,
                Expr::value(RegistrationStatus::Attended),
            )
            .filter(activity_registration::Column::RegistrationId.eq(registration_id))
            .filter(activity_registration::Column::Status.eq(RegistrationStatus::Confirmed))
            .exec(conn)
            .await?;

        let current = activity_registration::Entity::find_by_id(registration_id)
            .one(conn)
            .await?
            .ok_or(RegistrationStoreError::NotFound)?;

        if result.rows_affected == 1 {
            return Ok(current);
        }

        match current.status {
            RegistrationStatus::Cancelled => Err(RegistrationStoreError::AlreadyCancelled),
            other => Err(RegistrationStoreError::InvalidTransition(other)),
        }
    }

    /// 활동별 신청 목록 (최신순) + 페이지와 무관한 전체 건수
    pub async fn list_for_activity<C>(
        conn: &C,
        activity_id: i64,
        status_filter: Option<RegistrationStatus>,
        page: Option<Page>,
    ) -> Result<(Vec<RegistrationWithUser>, u64), DbErr>
    where
        C: ConnectionTrait,
    {
        let mut condition = activity_registration::Entity::find()
            .filter(activity_registration::Column::ActivityId.eq(activity_id));
        if let Some(status) = status_filter {
            condition = condition.filter(activity_registration::Column::Status.eq(status));
        }

        let total = condition.clone().count(conn).await?;

        let mut query = condition
            .find_also_related(user::Entity)
            .order_by_desc(activity_registration::Column::CreatedAt)
            .order_by_desc(activity_registration::Column::RegistrationId);
        if let Some(page) = page {
            query = query.offset(page.skip).limit(page.limit);
        }

        let rows = query.all(conn).await?;

        Ok((rows, total))
    }

    /// 사용자 본인의 신청 목록 (최신순, 취소 포함)
    pub async fn list_for_user<C>(
        conn: &C,
        user_id: i64,
    ) -> Result<Vec<activity_registration::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        activity_registration::Entity::find()
            .filter(activity_registration::Column::UserId.eq(user_id))
            .order_by_desc(activity_registration::Column::CreatedAt)
            .order_by_desc(activity_registration::Column::RegistrationId)
            .all(conn)
            .await
    }

    /// 활성 신청이 남아 있는 활동 ID 목록
    pub async fn activities_with_active<C>(
        conn: &C,
        activity_ids: &[i64],
    ) -> Result<Vec<i64>, DbErr>
    where
        C: ConnectionTrait,
    {
        activity_registration::Entity::find()
            .filter(activity_registration::Column::ActivityId.is_in(activity_ids.to_vec()))
            .filter(activity_registration::Column::Status.is_in([
                RegistrationStatus::Confirmed,
                RegistrationStatus::Attended,
            ]))
            .select_only()
            .column(activity_registration::Column::ActivityId)
            .distinct()
            .into_tuple()
            .all(conn)
            .await
    }

    /// 취소된 신청 정리 (활동 삭제 시 같은 트랜잭션에서 호출)
    pub async fn delete_cancelled<C>(conn: &C, activity_ids: &[i64]) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        let result = activity_registration::Entity::delete_many()
            .filter(activity_registration::Column::ActivityId.is_in(activity_ids.to_vec()))
            .filter(activity_registration::Column::Status.eq(RegistrationStatus::Cancelled))
            .exec(conn)
            .await?;

        Ok(result.rows_affected)
    }
}
