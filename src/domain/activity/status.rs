//! 활동 상태 계산
//!
//! 상태는 저장된 값이 아니라 네 개의 시간 필드와 현재 시각(UTC)으로부터 파생됩니다.
//! 같은 입력이면 항상 같은 결과를 내는 순수 함수만 둡니다.

use chrono::{DateTime, Utc};

use super::entity::activity::{self, ActivityStatus};
use crate::utils::error::{AppError, WindowViolation};

/// 상태 계산에 필요한 시간 필드 묶음
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivitySchedule {
    pub registration_start: Option<DateTime<Utc>>,
    pub registration_end: Option<DateTime<Utc>>,
    pub activity_start: DateTime<Utc>,
    pub activity_end: Option<DateTime<Utc>>,
}

impl ActivitySchedule {
    pub fn of(model: &activity::Model) -> Self {
        Self {
            registration_start: model.registration_start,
            registration_end: model.registration_end,
            activity_start: model.activity_start,
            activity_end: model.activity_end,
        }
    }

    /// 시작/종료가 모두 있을 때만 신청 기간으로 인정
    pub fn registration_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.registration_start, self.registration_end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// 시간 필드 간 선후 관계 검증
    ///
    /// registration_start <= registration_end <= activity_start <= activity_end
    pub fn validate(&self) -> Result<(), AppError> {
        match (self.registration_start, self.registration_end) {
            (Some(start), Some(end)) => {
                if start > end {
                    return Err(AppError::validation_error(
                        "신청 시작 시각은 신청 마감 시각보다 늦을 수 없습니다.",
                    ));
                }
                if end > self.activity_start {
                    return Err(AppError::validation_error(
                        "신청 마감 시각은 활동 시작 시각보다 늦을 수 없습니다.",
                    ));
                }
            }
            (None, None) => {}
            _ => {
                return Err(AppError::validation_error(
                    "신청 시작/마감 시각은 함께 설정하거나 함께 비워야 합니다.",
                ));
            }
        }

        if let Some(end) = self.activity_end {
            if end < self.activity_start {
                return Err(AppError::validation_error(
                    "활동 종료 시각은 활동 시작 시각보다 빠를 수 없습니다.",
                ));
            }
        }

        Ok(())
    }
}

/// 현재 시각 기준 활동 상태 (먼저 일치하는 규칙이 우선)
///
/// 1. 종료 시각이 지났으면 `Ended`
/// 2. 시작 시각이 지났으면 `InProgress`
/// 3. 신청 기간이 있으면 그 안에서의 위치에 따라 판정
/// 4. 신청 기간이 없으면 `Registering`
pub fn evaluate_status(now: DateTime<Utc>, schedule: &ActivitySchedule) -> ActivityStatus {
    if schedule.activity_end.is_some_and(|end| now >= end) {
        return ActivityStatus::Ended;
    }

    if now >= schedule.activity_start {
        return ActivityStatus::InProgress;
    }

    match schedule.registration_window() {
        Some((start, _)) if now < start => ActivityStatus::UpcomingRegistration,
        Some((_, end)) if now < end => ActivityStatus::Registering,
        Some(_) => ActivityStatus::RegistrationClosed,
        None => ActivityStatus::Registering,
    }
}

/// 지금 신청을 받을 수 있는지 판정
///
/// 신청 기간이 설정된 활동에만 의미가 있습니다. 시작/종료된 활동은 마감으로 취급합니다.
pub fn check_registration_window(
    now: DateTime<Utc>,
    schedule: &ActivitySchedule,
) -> Result<(), WindowViolation> {
    match evaluate_status(now, schedule) {
        ActivityStatus::Registering => Ok(()),
        ActivityStatus::UpcomingRegistration => Err(WindowViolation::NotYetOpen),
        ActivityStatus::RegistrationClosed | ActivityStatus::InProgress | ActivityStatus::Ended => {
            Err(WindowViolation::AlreadyClosed)
        }
    }
}
