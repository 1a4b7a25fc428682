use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

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
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "attended")]
    Attended,
}

impl RegistrationStatus {
    /// confirmed/attended는 (활동, 사용자)당 하나만 허용되는 활성 상태
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RegistrationStatus::Confirmed | RegistrationStatus::Attended
        )
    }

    /// 유니크 인덱스용 마커 값 (취소 시 NULL)
    pub fn active_marker(&self) -> Option<bool> {
        self.is_active().then_some(true)
    }

    /// 명단 내보내기용 문구
    pub fn label(&self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "已确认",
            RegistrationStatus::Cancelled => "已取消",
            RegistrationStatus::Attended => "已参加",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_registration")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub registration_id: i64,
    pub activity_id: i64,
    pub user_id: i64,
    /// 신청 시점의 이름/학번 (이후 프로필이 바뀌어도 유지)
    pub name: String,
    pub student_id: String,
    pub phone: Option<String>,
    pub remark: Option<String>,
    pub status: RegistrationStatus,
    #[serde(skip)]
    pub active_marker: Option<bool>,
    pub created_at: DateTimeUtc,
    pub cancelled_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::activity::Entity",
        from = "Column::ActivityId",
        to = "super::activity::Column::ActivityId",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Activity,
    #[sea_orm(
        belongs_to = "crate::domain::user::entity::user::Entity",
        from = "Column::UserId",
        to = "crate::domain::user::entity::user::Column::UserId",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    User,
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activity.def()
    }
}

impl Related<crate::domain::user::entity::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
