use axum::{
    body::{Body, Bytes},
    http::header,
    response::{IntoResponse, Response},
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::fmt::Display;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Serialize a fallible stream as newline-delimited JSON.
///
/// Every item is flushed as soon as it is produced. An `Err` item aborts the
/// body, which the client observes as a truncated stream.
pub fn ndjson_response<S, T, E>(items: S) -> Response
where
    S: Stream<Item = Result<T, E>> + Send + 'static,
    T: Serialize,
    E: Display,
{
    let lines = items.map(|item| {
        let item = item.map_err(|e| {
            tracing::warn!(error = %e, "Stream terminated");
            std::io::Error::other(e.to_string())
        })?;
        let mut line = serde_json::to_vec(&item)?;
        line.push(b'\n');
        Ok::<_, std::io::Error>(Bytes::from(line))
    });

    (
        [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
        Body::from_stream(lines),
    )
        .into_response()
}
