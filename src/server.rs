use crate::data::{RegenInput, RegenOutput, SolveInput, SolveOutput};
use crate::solver::{self, SolveOptions};
use crate::{error::SolveError, regen};
use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::{BoxError, Json, Router, routing::post};
use std::time::Duration;
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;

/// Wall-clock backstop for one solve request; the search itself cannot be
/// cancelled, so the request is cut off at the service layer.
const SOLVE_TIMEOUT: Duration = Duration::from_secs(30);

fn error_response(err: SolveError) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}

fn join_error(err: tokio::task::JoinError) -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("solver task failed: {err}"),
    )
}

// solves are CPU-bound, so they run on the blocking pool to keep the
// runtime free for other requests
async fn solve_handler(
    Json(input): Json<SolveInput>,
) -> Result<Json<SolveOutput>, (StatusCode, String)> {
    let result = tokio::task::spawn_blocking(move || {
        solver::solve(&input, &SolveOptions::default())
    })
    .await
    .map_err(join_error)?;
    match result {
        Ok(output) => Ok(Json(output)),
        Err(e) => Err(error_response(e)),
    }
}

async fn regenerate_handler(
    Json(input): Json<RegenInput>,
) -> Result<Json<RegenOutput>, (StatusCode, String)> {
    let result = tokio::task::spawn_blocking(move || regen::regenerate(&input))
        .await
        .map_err(join_error)?;
    match result {
        Ok(output) => Ok(Json(output)),
        Err(e) => Err(error_response(e)),
    }
}

async fn handle_timeout(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            "solve exceeded the request time limit".to_string(),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("unhandled error: {err}"),
        )
    }
}

pub async fn run_server() {
    let app = Router::new()
        .route("/v1/schedule/solve", post(solve_handler))
        .route("/v1/schedule/regenerate", post(regenerate_handler))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .layer(TimeoutLayer::new(SOLVE_TIMEOUT)),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
        .await
        .unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
