use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use campus_hub::config::{establish_connection, AppConfig};
use campus_hub::domain::activity::sweep::spawn_status_sweep;
use campus_hub::domain::health::init_start_time;
use campus_hub::domain::notification::DbNotificationDispatcher;
use campus_hub::shutdown::shutdown_signal;
use campus_hub::state::AppState;
use campus_hub::utils::logging::init_logging;
use sea_orm::ConnectOptions;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 환경변수 로드
    dotenvy::dotenv().ok();

    // 2. 로깅 초기화 (guard는 종료 시까지 유지)
    let _log_guard = init_logging();

    // 3. 설정 로드
    let config = Arc::new(AppConfig::from_env()?);
    init_start_time();

    // 4. DB 연결
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.db_max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let db = establish_connection(options, config.db_schema_update).await?;

    // 5. 상태 주기 갱신 태스크
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep = spawn_status_sweep(
        db.clone(),
        Duration::from_secs(config.status_sweep_interval_secs),
        shutdown_rx,
    );

    // 6. 라우터 설정
    let state = AppState {
        db: db.clone(),
        config: config.clone(),
        notifier: Arc::new(DbNotificationDispatcher::new(db)),
    };
    let app = campus_hub::app(state);

    // 7. 서버 실행
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    if let Some(handle) = sweep {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "상태 갱신 태스크 종료 대기 실패");
        }
    }

    tracing::info!("Server stopped");

    Ok(())
}
