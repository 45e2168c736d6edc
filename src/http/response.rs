//! Response construction.
//!
//! # Responsibilities
//! - Turn a successful dispatch into bytes, content type and request ID
//! - Map every dispatch failure to a single 500 with the error text
//!
//! # Design Decisions
//! - No success code other than 200 is used
//! - Header values that cannot be encoded are dropped, not turned into errors

use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::chain::{DispatchError, Reply};
use crate::http::request::{RequestId, X_REQUEST_ID};

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Body {
                request_id,
                content_type,
                body,
            } => {
                let mut response = (StatusCode::OK, body).into_response();
                set_header(&mut response, CONTENT_TYPE, &content_type);
                set_request_id(&mut response, &request_id);
                response
            }
            Reply::Accepted { request_id } => {
                let mut response = StatusCode::OK.into_response();
                set_request_id(&mut response, &request_id);
                response
            }
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

fn set_request_id(response: &mut Response, request_id: &RequestId) {
    set_header(response, HeaderName::from_static(X_REQUEST_ID), request_id.as_str());
}

fn set_header(response: &mut Response, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            response.headers_mut().insert(name, value);
        }
        Err(_) => tracing::debug!(header = %name, "Dropping unencodable header value"),
    }
}
