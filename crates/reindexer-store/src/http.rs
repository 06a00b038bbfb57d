use crate::error::HttpError;
use reindexer_core::StoreError;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub(crate) fn build_client(endpoint: &str, timeout: Duration) -> Result<Client, StoreError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| StoreError::connection(endpoint, e))
}

/// Sends `request`. Transport failures and rejected credentials are
/// connection errors; every other status is left to the caller.
pub(crate) fn send(request: RequestBuilder, endpoint: &str) -> Result<Response, StoreError> {
    let response = request
        .send()
        .map_err(|e| StoreError::connection(endpoint, e))?;
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(StoreError::connection(endpoint, HttpError::Auth(status)));
    }
    Ok(response)
}

/// Sends a liveness request. Any failure, whatever the status, means the
/// store cannot be used and is reported as a connection error.
pub(crate) fn probe(request: RequestBuilder, endpoint: &str) -> Result<(), StoreError> {
    let response = send(request, endpoint)?;
    let status = response.status();
    if !status.is_success() {
        let body = body_text(response);
        return Err(StoreError::connection(
            endpoint,
            HttpError::Status { status, body },
        ));
    }
    Ok(())
}

pub(crate) fn body_text(response: Response) -> String {
    response.text().unwrap_or_default().trim().to_string()
}

/// Decodes a successful JSON answer; non-success statuses become query
/// errors carrying the store's own message.
pub(crate) fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let body = body_text(response);
        return Err(StoreError::query_caused_by(
            format!("store answered {}: {}", status, body),
            HttpError::Status { status, body },
        ));
    }
    response
        .json::<T>()
        .map_err(|e| StoreError::query_caused_by(format!("cannot decode store response: {}", e), e))
}
