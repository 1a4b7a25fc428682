//! 활동 상태 주기 갱신
//!
//! 조회 응답과 목록 필터는 항상 다시 계산한 상태를 쓰며, 여기서는 저장된 값만 현재 시각에 맞춥니다.

use std::time::Duration;

use chrono::Utc;
use sea_orm::DatabaseConnection;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::service::ActivityService;

/// 상태 갱신 태스크 시작
///
/// `interval`이 0이면 태스크를 띄우지 않습니다. `shutdown`이 true가 되면 종료합니다.
pub fn spawn_status_sweep(
    db: DatabaseConnection,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        info!("활동 상태 주기 갱신 비활성화");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(interval_secs = interval.as_secs(), "활동 상태 주기 갱신 시작");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match ActivityService::refresh_statuses(&db, Utc::now()).await {
                        Ok(0) => {}
                        Ok(updated) => info!(updated = updated, "활동 상태 갱신 완료"),
                        Err(e) => warn!(error = %e, "활동 상태 갱신 실패"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("활동 상태 주기 갱신 종료");
    }))
}
