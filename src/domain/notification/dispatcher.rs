//! 활동 공지 알림 발송
//!
//! 활동 생성 흐름은 알림 결과를 기다리지 않습니다. 발송 실패는 로그로만 남깁니다.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use tracing::{info, warn};

use crate::domain::activity::entity::activity;
use crate::domain::notification::entity::user_notification;
use crate::domain::user::service::UserService;
use crate::utils::error::AppError;

/// 한 번의 INSERT에 담는 최대 알림 수
const INSERT_CHUNK_SIZE: usize = 500;

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// 새 활동 공지를 활성 사용자 전원에게 생성하고, 생성된 알림 수를 반환
    async fn activity_published(&self, activity: &activity::Model) -> Result<usize, AppError>;
}

/// 사용자별 알림 레코드를 DB에 직접 쌓는 구현
pub struct DbNotificationDispatcher {
    db: DatabaseConnection,
}

impl DbNotificationDispatcher {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationDispatcher for DbNotificationDispatcher {
    async fn activity_published(&self, activity: &activity::Model) -> Result<usize, AppError> {
        let user_ids = UserService::list_active_ids(&self.db).await?;
        if user_ids.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let content = if activity.description.trim().is_empty() {
            format!("快来报名参加{}！", activity.title)
        } else {
            activity.description.clone()
        };

        for chunk in user_ids.chunks(INSERT_CHUNK_SIZE) {
            let models = chunk.iter().map(|user_id| user_notification::ActiveModel {
                user_id: Set(*user_id),
                notification_type: Set("activity".to_string()),
                title: Set(format!("新活动发布：{}", activity.title)),
                content: Set(content.clone()),
                link_url: Set(Some(format!("/activities/{}", activity.activity_id))),
                is_read: Set(false),
                related_id: Set(Some(activity.activity_id)),
                created_at: Set(now),
                ..Default::default()
            });

            user_notification::Entity::insert_many(models)
                .exec(&self.db)
                .await?;
        }

        Ok(user_ids.len())
    }
}

/// 응답을 막지 않도록 별도 태스크에서 발송
pub fn dispatch_activity_published(
    dispatcher: Arc<dyn NotificationDispatcher>,
    activity: activity::Model,
) {
    tokio::spawn(async move {
        match dispatcher.activity_published(&activity).await {
            Ok(count) => info!(
                activity_id = activity.activity_id,
                notified = count,
                "활동 공지 알림 생성 완료"
            ),
            Err(e) => warn!(
                activity_id = activity.activity_id,
                error = %e,
                "활동 공지 알림 생성 실패"
            ),
        }
    });
}
