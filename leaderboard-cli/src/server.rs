/// HTTP boundary for the leaderboard display.
///
/// The display page polls `GET /api/getStudentRankings` (with a `?t=`
/// cache-buster). Every request ranks a fresh snapshot; nothing is cached
/// here and every response tells clients and proxies not to cache it either.
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{
        HeaderValue, Method,
        header::{CACHE_CONTROL, CONTENT_TYPE, EXPIRES, PRAGMA},
    },
    routing::get,
};
use leaderboard_core::{EventParticipation, Participant, RankedEntry, compute_rankings};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::output::RankingsBody;
use crate::supabase::{FetchError, LeaderboardSource};

pub const RANKINGS_PATH: &str = "/api/getStudentRankings";
pub const HEALTH_PATH: &str = "/health";

/// Build the router over any row source.
pub fn router<S: LeaderboardSource>(source: Arc<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route(RANKINGS_PATH, get(rankings_handler::<S>))
        .route(HEALTH_PATH, get(|| async { "ok" }))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(PRAGMA, HeaderValue::from_static("no-cache")))
        .layer(SetResponseHeaderLayer::overriding(EXPIRES, HeaderValue::from_static("0")))
        .layer(cors)
        .with_state(source)
}

async fn rankings_handler<S: LeaderboardSource>(
    State(source): State<Arc<S>>,
) -> Result<Json<RankingsBody>, AppError> {
    let rankings = load_rankings(source.as_ref()).await?;
    Ok(Json(RankingsBody::new(&rankings)))
}

/// Fetch a snapshot and rank it.
///
/// Students are mandatory: a failed fetch is an error and an empty set is
/// "no data" (checked before the second query is spent). Participations are
/// optional: a failed fetch ranks everyone at zero.
pub async fn load_rankings<S: LeaderboardSource>(source: &S) -> Result<Vec<RankedEntry>, AppError> {
    let students = source.fetch_eligible_participants().await?;
    if students.is_empty() {
        return Err(AppError::NoData);
    }
    info!("Found students: {}", students.len());

    let events = source.fetch_event_participations().await;
    rank_snapshot(&students, events)
}

/// Rank one fetched snapshot, degrading a failed participation fetch to zero totals.
pub fn rank_snapshot(
    students: &[Participant],
    events: Result<Vec<EventParticipation>, FetchError>,
) -> Result<Vec<RankedEntry>, AppError> {
    let events = match events {
        Ok(events) => {
            debug!("Event data found: {}", events.len());
            Some(events)
        }
        Err(e) => {
            warn!("Error fetching event data, ranking with 0 points: {e}");
            None
        }
    };

    let rankings = compute_rankings(students, events.as_deref())?;
    debug!("Total rankings created: {}", rankings.len());
    Ok(rankings)
}

/// Serve until Ctrl+C or SIGTERM.
pub async fn serve<S: LeaderboardSource>(source: Arc<S>, address: &str) -> std::io::Result<()> {
    let app = router(source);

    info!("Binding to {address}");
    let listener = TcpListener::bind(address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
