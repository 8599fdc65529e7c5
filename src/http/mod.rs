//! HTTP transport for the inference entrypoint.
//!
//! `POST /predict` takes a multipart upload (field `file`) and always answers
//! 200 with either a prediction or the fixed invalid-audio error. `GET /health`
//! reports the loaded model's labels and vector width.

mod routes;

pub use routes::{build_router, run_server, AppState, HealthResponse, MAX_UPLOAD_BYTES};
