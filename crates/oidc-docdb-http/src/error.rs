//! Mapping of CouchDB HTTP failures onto `DatabaseError`.

use oidc_docdb::DatabaseError;
use reqwest::StatusCode;
use serde::Deserialize;

/// Error body returned by CouchDB (`{"error": "...", "reason": "..."}`).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) error: String,
    #[serde(default)]
    pub(crate) reason: String,
}

/// Maps a non-success response to a database error.
///
/// `target` names the document, view or database the request addressed.
pub(crate) fn map_status(status: StatusCode, body: ErrorBody, target: &str) -> DatabaseError {
    match status {
        StatusCode::CONFLICT => DatabaseError::conflict(target, body.reason),
        StatusCode::NOT_FOUND => DatabaseError::not_found(target),
        StatusCode::BAD_REQUEST if body.error == "no_usable_index" => {
            DatabaseError::NoUsableIndex {
                reason: body.reason,
            }
        }
        StatusCode::BAD_REQUEST => DatabaseError::bad_request(body.error, body.reason),
        other => DatabaseError::Http {
            status: other.as_u16(),
            error: body.error,
            reason: body.reason,
        },
    }
}

/// Maps a transport failure to a database error.
pub(crate) fn map_transport(error: reqwest::Error) -> DatabaseError {
    if error.is_decode() {
        DatabaseError::internal(format!("Invalid response body: {error}"))
    } else {
        DatabaseError::connection(error.to_string())
    }
}

/// Reads the error body of a failed response and maps it.
pub(crate) async fn from_response(response: reqwest::Response, target: &str) -> DatabaseError {
    let status = response.status();
    let body = response.json::<ErrorBody>().await.unwrap_or_default();
    tracing::debug!(
        %status,
        error = %body.error,
        reason = %body.reason,
        target,
        "CouchDB request failed"
    );
    map_status(status, body, target)
}
