use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

/// 종료 시그널 대기
///
/// SIGTERM 또는 Ctrl+C를 받으면 백그라운드 태스크에 종료를 알리고 반환합니다.
/// axum은 반환 이후 진행 중인 요청을 마친 뒤 종료합니다.
pub async fn shutdown_signal(notify: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C 핸들러 등록 실패");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM 핸들러 등록 실패");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C 수신"),
        _ = terminate => info!("SIGTERM 수신"),
    }

    // 수신 측이 모두 종료된 경우는 무시
    let _ = notify.send(true);

    info!("Graceful shutdown 시작");
}
