use std::time::{Duration, Instant};

use sea_orm::DatabaseConnection;
use tokio::time::timeout;

use super::dto::{DatabaseCheck, HealthState, HealthStatus};

/// 서버 시작 시간
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// DB ping 타임아웃
const DB_PING_TIMEOUT: Duration = Duration::from_secs(3);

/// 이 시간 이상 걸리면 Degraded
const DEGRADED_THRESHOLD: Duration = Duration::from_millis(500);

/// main에서 서버 기동 시 호출
pub fn init_start_time() {
    START_TIME.get_or_init(Instant::now);
}

pub fn get_uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

pub async fn check_health(db: &DatabaseConnection) -> HealthStatus {
    let database = ping_database(db, DB_PING_TIMEOUT).await;

    HealthStatus {
        status: classify(&database),
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: get_uptime_secs(),
        database,
    }
}

fn classify(check: &DatabaseCheck) -> HealthState {
    if !check.reachable {
        HealthState::Unhealthy
    } else if check.latency_ms >= DEGRADED_THRESHOLD.as_millis() as u64 {
        HealthState::Degraded
    } else {
        HealthState::Healthy
    }
}

async fn ping_database(db: &DatabaseConnection, limit: Duration) -> DatabaseCheck {
    let start = Instant::now();
    let result = timeout(limit, db.ping()).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(Ok(())) => DatabaseCheck {
            reachable: true,
            latency_ms,
            error: None,
        },
        Ok(Err(e)) => {
            tracing::warn!(latency_ms, error = %e, "DB ping 실패");
            DatabaseCheck {
                reachable: false,
                latency_ms,
                error: Some(e.to_string()),
            }
        }
        Err(_) => {
            let limit_ms = limit.as_millis() as u64;
            tracing::warn!(limit_ms, "DB ping 타임아웃");
            DatabaseCheck {
                reachable: false,
                latency_ms: limit_ms,
                error: Some(format!("{}ms 안에 응답이 없습니다.", limit_ms)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::establish_connection;
    use sea_orm::ConnectOptions;

    fn check(reachable: bool, latency_ms: u64) -> DatabaseCheck {
        DatabaseCheck {
            reachable,
            latency_ms,
            error: None,
        }
    }

    #[test]
    fn init_start_time_should_set_once() {
        init_start_time();
        let first = START_TIME.get();

        init_start_time();
        let second = START_TIME.get();

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn should_degrade_from_threshold_latency() {
        assert_eq!(classify(&check(true, 499)), HealthState::Healthy);
        assert_eq!(classify(&check(true, 500)), HealthState::Degraded);
        assert_eq!(classify(&check(false, 1)), HealthState::Unhealthy);
    }

    #[tokio::test]
    async fn should_report_reachable_database() {
        // Arrange
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let db = establish_connection(options, false).await.unwrap();

        // Act
        let status = check_health(&db).await;

        // Assert
        assert!(status.database.reachable);
        assert!(status.database.error.is_none());
        assert_ne!(status.status, HealthState::Unhealthy);
    }

    #[tokio::test]
    async fn should_report_unhealthy_when_disconnected() {
        // Arrange
        let db = DatabaseConnection::Disconnected;

        // Act
        let status = check_health(&db).await;

        // Assert
        assert_eq!(status.status, HealthState::Unhealthy);
        assert!(!status.database.reachable);
        assert!(status.database.error.is_some());
    }

    #[test]
    fn should_hide_error_field_when_reachable() {
        let json = serde_json::to_value(check(true, 12)).unwrap();

        assert_eq!(json["reachable"], true);
        assert_eq!(json["latencyMs"], 12);
        assert!(json.get("error").is_none());
    }
}
