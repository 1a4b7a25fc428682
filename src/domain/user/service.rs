use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};

use crate::domain::user::entity::user;
use crate::utils::error::AppError;

/// 사용자 디렉터리 조회
pub struct UserService;

impl UserService {
    /// 활성 사용자 조회 (비활성/미존재는 None)
    pub async fn find_active<C>(conn: &C, user_id: i64) -> Result<Option<user::Model>, AppError>
    where
        C: ConnectionTrait,
    {
        let found = user::Entity::find_by_id(user_id)
            .filter(user::Column::IsActive.eq(true))
            .one(conn)
            .await?;

        Ok(found)
    }

    /// 알림 대상이 되는 활성 사용자 ID 목록
    pub async fn list_active_ids<C>(conn: &C) -> Result<Vec<i64>, AppError>
    where
        C: ConnectionTrait,
    {
        let ids = user::Entity::find()
            .filter(user::Column::IsActive.eq(true))
            .select_only()
            .column(user::Column::UserId)
            .into_tuple()
            .all(conn)
            .await?;

        Ok(ids)
    }
}
