use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::registration::{parse_cutoff, MemberRegistry, PreviousCycle, RegistrationImportError};
use super::service::{RaffleRunOptions, RaffleService};

#[derive(Debug, Deserialize)]
pub struct AllocationRequest {
    pub registrations_csv: String,
    #[serde(default)]
    pub previous_groups_csv: Option<String>,
    #[serde(default)]
    pub members_csv: Option<String>,
    #[serde(default)]
    pub raffle_cutoff: Option<String>,
}

/// Router builder exposing the raffle over HTTP.
pub fn raffle_router(service: Arc<RaffleService>) -> Router {
    Router::new()
        .route("/api/v1/raffle/allocations", post(allocate_handler))
        .with_state(service)
}

pub(crate) async fn allocate_handler(
    State(service): State<Arc<RaffleService>>,
    axum::Json(request): axum::Json<AllocationRequest>,
) -> Response {
    let cutoff = match request.raffle_cutoff.as_deref().map(parse_cutoff).transpose() {
        Ok(cutoff) => cutoff,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let previous = match request.previous_groups_csv {
        Some(csv) => match PreviousCycle::from_reader(Cursor::new(csv.into_bytes())) {
            Ok(previous) => Some(previous),
            Err(err) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("invalid previous groups CSV data: {err}"),
                )
            }
        },
        None => None,
    };

    let members = match request.members_csv {
        Some(csv) => match MemberRegistry::from_reader(Cursor::new(csv.into_bytes())) {
            Ok(members) => Some(members),
            Err(err) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("invalid members CSV data: {err}"),
                )
            }
        },
        None => None,
    };

    let options = RaffleRunOptions {
        cutoff,
        previous,
        members,
    };
    match service.run(Cursor::new(request.registrations_csv.into_bytes()), options) {
        Ok(run) => (StatusCode::OK, axum::Json(run)).into_response(),
        Err(err @ RegistrationImportError::Validation(_)) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        Err(err @ RegistrationImportError::Csv(_)) => {
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        Err(err @ RegistrationImportError::Io(_)) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    let payload = json!({ "error": message });
    (status, axum::Json(payload)).into_response()
}
