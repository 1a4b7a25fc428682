use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};

use super::entity::activity_registration::{self, RegistrationStatus};

/// 정원 계산
///
/// 신청과 같은 트랜잭션 연결로 호출해야 이후 INSERT와 같은 스냅샷을 봅니다.
pub struct CapacityCounter;

impl CapacityCounter {
    /// confirmed 상태의 신청 수 (cancelled/attended 제외)
    pub async fn count_confirmed<C>(conn: &C, activity_id: i64) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        activity_registration::Entity::find()
            .filter(activity_registration::Column::ActivityId.eq(activity_id))
            .filter(activity_registration::Column::Status.eq(RegistrationStatus::Confirmed))
            .count(conn)
            .await
    }

    /// 정원 0은 무제한
    pub fn has_room(capacity: i32, confirmed: u64) -> bool {
        capacity <= 0 || confirmed < capacity as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_always_have_room_when_unlimited() {
        assert!(CapacityCounter::has_room(0, 0));
        assert!(CapacityCounter::has_room(0, 10_000));
    }

    #[test]
    fn should_have_room_below_capacity() {
        assert!(CapacityCounter::has_room(3, 2));
    }

    #[test]
    fn should_be_full_at_capacity() {
        assert!(!CapacityCounter::has_room(3, 3));
        assert!(!CapacityCounter::has_room(3, 4));
    }
}
