//! Request handlers for the execution endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use kiln_compiler::{compile, run, RunIo, RunLimits};
use kiln_core::{SourceFile, Submission};

use crate::models::{ExecuteRequest, ExecuteResponse};

/// Shared application state.
pub struct AppState {
    /// Limits applied to every run.
    pub limits: RunLimits,
}

/// Handler for `POST /api/execute`.
///
/// Rejects empty submissions with 400 before any compilation; compile
/// errors and runtime faults are data and come back as 200 with the
/// message in `output`.
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, (StatusCode, String)> {
    if request.files.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No files provided".to_string()));
    }

    let files: Vec<SourceFile> = request
        .files
        .into_iter()
        .filter(|f| !f.code.trim().is_empty())
        .map(|f| SourceFile::new(f.file_name, f.code))
        .collect();

    if files.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "No valid code provided".to_string(),
        ));
    }

    let mut submission = Submission::new(files);
    submission.stdin = request.input;

    let limits = state.limits.clone();
    // Compilation and execution are CPU-bound; keep them off the
    // async worker threads.
    let output = tokio::task::spawn_blocking(move || run_submission(&submission, &limits))
        .await
        .map_err(|e| {
            tracing::error!("execution task failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "execution failed".to_string())
        })?;

    Ok(Json(ExecuteResponse { output }))
}

/// Compile and run one submission, rendering every failure as output.
fn run_submission(submission: &Submission, limits: &RunLimits) -> String {
    let artifact = match compile(submission) {
        Ok(artifact) => artifact,
        Err(diagnostics) => {
            tracing::debug!(count = diagnostics.len(), "compilation failed");
            return diagnostics
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
        }
    };

    let mut io = RunIo::new(submission.stdin.clone().unwrap_or_default());
    match run(&artifact, &mut io, limits) {
        Ok(()) => io.into_output(),
        Err(fault) => {
            tracing::debug!(%fault, "run faulted");
            fault.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let state = Arc::new(AppState {
            limits: RunLimits::default(),
        });
        Router::new()
            .route("/api/execute", post(execute))
            .with_state(state)
    }

    async fn post_json(app: Router, body: Value) -> (StatusCode, String) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/execute")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn output_of(body: &str) -> String {
        let value: Value = serde_json::from_str(body).unwrap();
        value["output"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_execute_success() {
        let body = json!({
            "files": [
                { "fileName": "main.kiln", "code": "fn main() { println(\"hi\"); }" }
            ]
        });
        let (status, body) = post_json(app(), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(output_of(&body), "hi\n");
    }

    #[tokio::test]
    async fn test_execute_with_input() {
        let body = json!({
            "files": [
                { "fileName": "main.kiln", "code": "fn main() { println(read_line()); }" }
            ],
            "input": "hello\n"
        });
        let (status, body) = post_json(app(), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(output_of(&body), "hello\n");
    }

    #[tokio::test]
    async fn test_empty_file_list_is_rejected() {
        let (status, body) = post_json(app(), json!({ "files": [] })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "No files provided");
    }

    #[tokio::test]
    async fn test_all_blank_files_are_rejected() {
        let body = json!({
            "files": [
                { "fileName": "a.kiln", "code": "   " },
                { "fileName": "b.kiln", "code": "\n\t" }
            ]
        });
        let (status, body) = post_json(app(), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "No valid code provided");
    }

    #[tokio::test]
    async fn test_blank_files_are_skipped() {
        let body = json!({
            "files": [
                { "fileName": "empty.kiln", "code": "  " },
                { "fileName": "main.kiln", "code": "fn main() { println(\"ok\"); }" }
            ]
        });
        let (status, body) = post_json(app(), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(output_of(&body), "ok\n");
    }

    #[tokio::test]
    async fn test_compile_errors_come_back_as_output() {
        let body = json!({
            "files": [
                { "fileName": "main.kiln", "code": "fn main() {\n    println(x);\n}" }
            ]
        });
        let (status, body) = post_json(app(), body).await;
        assert_eq!(status, StatusCode::OK);
        let output = output_of(&body);
        assert!(output.contains("main.kiln(2,"), "got: {output}");
        assert!(output.contains("error: unknown variable `x`"));
    }

    #[tokio::test]
    async fn test_runtime_fault_comes_back_as_output() {
        let body = json!({
            "files": [
                { "fileName": "main.kiln", "code": "fn main() { let x = 1 / 0; println(x); }" }
            ]
        });
        let (status, body) = post_json(app(), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(output_of(&body), "attempted to divide by zero");
    }

    #[tokio::test]
    async fn test_multi_file_submission() {
        let body = json!({
            "files": [
                { "fileName": "lib.kiln", "code": "fn square(n) { return n * n; }" },
                { "fileName": "main.kiln", "code": "fn main() { println(square(7)); }" }
            ]
        });
        let (status, body) = post_json(app(), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(output_of(&body), "49\n");
    }
}
