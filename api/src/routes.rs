use axum::extract::{Path as AxumPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use region_watch_common::region::{Point, Region};
use region_watch_common::settings::Settings;
use region_watch_engine::{EngineError, EngineHandle, EngineStatus};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RegionRequest {
    press: Point,
    release: Point,
}

/// Raw spin-box values; anything out of range is clamped, not rejected.
#[derive(Debug, Deserialize)]
struct SettingsRequest {
    capacity: i64,
    threshold: i64,
    interval_ms: i64,
}

#[derive(Debug, Serialize)]
struct FrameSummary {
    index: usize,
    seq: u64,
    captured_at_ms: i64,
    captured_at: String,
    width: u32,
    height: u32,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn status_response(result: Result<EngineStatus, EngineError>) -> Response {
    match result {
        Ok(status) => Json(status).into_response(),
        Err(e) => {
            error!(error = %e, "engine unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

/// GET /status
async fn get_status(State(engine): State<EngineHandle>) -> Response {
    status_response(engine.status().await)
}

/// PUT /region
/// Body: { "press": {"x":..,"y":..}, "release": {"x":..,"y":..} }
async fn put_region(
    State(engine): State<EngineHandle>,
    Json(body): Json<RegionRequest>,
) -> Response {
    let region = Region::from_points(body.press, body.release);
    status_response(engine.set_region(region).await)
}

/// POST /capture/start
async fn start_capture(State(engine): State<EngineHandle>) -> Response {
    status_response(engine.start_capture().await)
}

/// POST /capture/stop
async fn stop_capture(State(engine): State<EngineHandle>) -> Response {
    status_response(engine.stop_capture().await)
}

/// POST /reset stops capture and clears history and region
async fn reset(State(engine): State<EngineHandle>) -> Response {
    status_response(engine.reset_all().await)
}

/// PUT /settings
/// Body: { "capacity": .., "threshold": .., "interval_ms": .. }
async fn put_settings(
    State(engine): State<EngineHandle>,
    Json(body): Json<SettingsRequest>,
) -> Response {
    let settings = Settings::clamped(body.capacity, body.threshold, body.interval_ms);
    status_response(engine.commit_settings(settings).await)
}

/// GET /history, newest first
async fn list_history(State(engine): State<EngineHandle>) -> impl IntoResponse {
    let summaries: Vec<FrameSummary> = engine
        .history()
        .frames
        .iter()
        .enumerate()
        .map(|(index, frame)| FrameSummary {
            index,
            seq: frame.seq,
            captured_at_ms: frame.captured_at_ms,
            captured_at: frame
                .captured_at()
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            width: frame.width(),
            height: frame.height(),
        })
        .collect();
    Json(summaries)
}

/// GET /history/:index returns the PNG of one stored frame, 0 = newest
async fn get_history_frame(
    State(engine): State<EngineHandle>,
    AxumPath(index): AxumPath<usize>,
) -> Response {
    let Some(frame) = engine.history().frames.get(index).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::task::spawn_blocking(move || frame.to_png()).await {
        Ok(Ok(png)) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Ok(Err(e)) => {
            error!(error = %e, index, "failed to encode frame");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            error!(error = %e, "spawn_blocking failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(engine: EngineHandle) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/region", put(put_region))
        .route("/capture/start", post(start_capture))
        .route("/capture/stop", post(stop_capture))
        .route("/reset", post(reset))
        .route("/settings", put(put_settings))
        .route("/history", get(list_history))
        .route("/history/:index", get(get_history_frame))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use image::{Rgb, RgbImage};
    use region_watch_engine::capture::InMemorySource;
    use region_watch_engine::CaptureEngine;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app_with(source: InMemorySource) -> (Router, EngineHandle) {
        let engine = CaptureEngine::new(Arc::new(source), Settings::new(10, 10, 5).unwrap());
        let (handle, _task) = EngineHandle::spawn(engine);
        (router(handle.clone()), handle)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Value {
        let (status, bytes) = send(app, method, uri, body).await;
        assert_eq!(status, StatusCode::OK, "{method} {uri}");
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn status_starts_idle() {
        let (app, _) = app_with(InMemorySource::new());
        let status = send_json(&app, "GET", "/status", None).await;
        assert_eq!(status["state"], "idle");
        assert_eq!(status["region"], Value::Null);
        assert_eq!(status["history_len"], 0);
        assert_eq!(status["settings"]["capacity"], 10);
    }

    #[tokio::test]
    async fn region_is_normalized_from_points() {
        let (app, _) = app_with(InMemorySource::new());
        let body = json!({"press": {"x": 300, "y": 20}, "release": {"x": 100, "y": 200}});
        let status = send_json(&app, "PUT", "/region", Some(body)).await;
        assert_eq!(
            status["region"],
            json!({"left": 100, "top": 20, "right": 300, "bottom": 200})
        );
    }

    #[tokio::test]
    async fn settings_are_clamped() {
        let (app, _) = app_with(InMemorySource::new());
        let body = json!({"capacity": 0, "threshold": 999, "interval_ms": 250});
        let status = send_json(&app, "PUT", "/settings", Some(body)).await;
        assert_eq!(
            status["settings"],
            json!({"capacity": 1, "threshold": 255, "interval_ms": 250})
        );
    }

    #[tokio::test]
    async fn capture_round_trip_serves_png() {
        let source = InMemorySource::with_frames([RgbImage::from_pixel(4, 3, Rgb([9, 9, 9]))]);
        let (app, handle) = app_with(source);
        let mut rx = handle.subscribe();

        let body = json!({"press": {"x": 0, "y": 0}, "release": {"x": 4, "y": 3}});
        send_json(&app, "PUT", "/region", Some(body)).await;
        let status = send_json(&app, "POST", "/capture/start", None).await;
        assert_eq!(status["state"], "running");

        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();

        let history = send_json(&app, "GET", "/history", None).await;
        assert_eq!(history[0]["index"], 0);
        assert_eq!(history[0]["width"], 4);
        assert_eq!(history[0]["height"], 3);

        let (status, png) = send(&app, "GET", "/history/0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&png[..4], &[0x89, 0x50, 0x4E, 0x47]);

        let (status, _) = send(&app, "GET", "/history/7", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let status = send_json(&app, "POST", "/capture/stop", None).await;
        assert_eq!(status["state"], "idle");
    }

    #[tokio::test]
    async fn reset_clears_region_and_history() {
        let (app, _) = app_with(InMemorySource::new());
        let body = json!({"press": {"x": 0, "y": 0}, "release": {"x": 4, "y": 3}});
        send_json(&app, "PUT", "/region", Some(body)).await;
        send_json(&app, "POST", "/capture/start", None).await;

        let status = send_json(&app, "POST", "/reset", None).await;
        assert_eq!(status["state"], "idle");
        assert_eq!(status["region"], Value::Null);
        assert_eq!(status["history_len"], 0);
        let history = send_json(&app, "GET", "/history", None).await;
        assert_eq!(history, json!([]));
    }
}
