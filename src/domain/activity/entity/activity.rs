use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 활동 분류
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ActivityCategory {
    #[sea_orm(string_value = "文艺")]
    #[serde(rename = "文艺")]
    Arts,
    #[sea_orm(string_value = "讲座")]
    #[serde(rename = "讲座")]
    Lecture,
    #[sea_orm(string_value = "体育")]
    #[serde(rename = "体育")]
    Sports,
    #[sea_orm(string_value = "科创")]
    #[serde(rename = "科创")]
    Tech,
}

/// 시간으로부터 파생되는 활동 상태
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "kebab-case")]
pub enum ActivityStatus {
    #[sea_orm(string_value = "upcoming-registration")]
    UpcomingRegistration,
    #[sea_orm(string_value = "registering")]
    Registering,
    #[sea_orm(string_value = "registration-closed")]
    RegistrationClosed,
    #[sea_orm(string_value = "in-progress")]
    InProgress,
    #[sea_orm(string_value = "ended")]
    Ended,
}

impl ActivityStatus {
    /// 화면 표시용 문구
    pub fn label(&self) -> &'static str {
        match self {
            ActivityStatus::UpcomingRegistration => "即将开始报名",
            ActivityStatus::Registering => "报名中",
            ActivityStatus::RegistrationClosed => "报名截止",
            ActivityStatus::InProgress => "进行中",
            ActivityStatus::Ended => "已结束",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub activity_id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub location: String,
    pub organizer: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub image: String,
    pub category: ActivityCategory,
    /// 0이면 인원 제한 없음
    pub capacity: i32,
    pub registration_start: Option<DateTimeUtc>,
    pub registration_end: Option<DateTimeUtc>,
    pub activity_start: DateTimeUtc,
    pub activity_end: Option<DateTimeUtc>,
    /// 목록 필터용 캐시 값. 기준은 항상 시간 필드
    pub status: ActivityStatus,
    pub created_by: Option<i64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::activity_registration::Entity")]
    ActivityRegistration,
    #[sea_orm(
        belongs_to = "crate::domain::user::entity::user::Entity",
        from = "Column::CreatedBy",
        to = "crate::domain::user::entity::user::Column::UserId",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Creator,
}

impl Related<super::activity_registration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivityRegistration.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
