//! Asynchronous dispatch with an exactly-once completion contract.
//!
//! Submitting a request returns a [`Completion`] immediately; the request
//! itself runs on a spawned tokio task. Exactly one terminal result (success
//! or failure, never both, never zero) is delivered through the completion,
//! and never synchronously within the submitting call.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::Stream;
use log::debug;
use serde::de::DeserializeOwned;
use tokio::io::AsyncRead;
use tokio::sync::oneshot;
use tokio_util::io::{ReaderStream, StreamReader};

use crate::compression::gzip_stream;
use crate::error::{ApiLinkError, Result};
use crate::request::{Body, FormValue, Request, CONTENT_TYPE_JSON};
use crate::response::decode_response;

/// Pending outcome of a dispatched request.
///
/// Awaiting the completion yields the single terminal `Result<T>`. The
/// underlying channel is a `oneshot`, which makes the exactly-once,
/// mutually-exclusive success/failure contract structural: the dispatch task
/// holds the only sender and sends exactly one value.
///
/// If the dispatch task is torn down before completing (e.g. the runtime is
/// shutting down), awaiting reports a transport failure rather than hanging.
pub struct Completion<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Future for Completion<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(ApiLinkError::Transport(
                    "request task dropped before completing".to_string(),
                ))
            })
        })
    }
}

/// Spawn a request onto the runtime and hand back its completion.
///
/// Must be called from within a tokio runtime.
pub(crate) fn dispatch<T>(client: reqwest::Client, request: Request) -> Completion<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = execute(client, request).await;
        if tx.send(result).is_err() {
            debug!("[HTTP] Completion receiver dropped before delivery");
        }
    });
    Completion { rx }
}

/// A completion that already carries its terminal result.
///
/// Used for build-time failures (bad payload serialization); the result is
/// still delivered through the channel when awaited, never synchronously
/// within the submitting call.
pub(crate) fn completed<T>(result: Result<T>) -> Completion<T> {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(result);
    Completion { rx }
}

/// Run one request to a terminal outcome: build the transport request,
/// send it, and decode the response payload.
async fn execute<T: DeserializeOwned>(client: reqwest::Client, request: Request) -> Result<T> {
    let Request {
        method,
        endpoint,
        body,
    } = request;

    let url = endpoint.to_url()?;
    debug!("[HTTP] Sending {} {}", method, url);

    let mut builder = client.request(method.to_reqwest(), url.clone());
    if let Some(body) = body {
        builder = attach_body(builder, body).await?;
    }

    let response = builder.send().await?;
    let status = response.status();
    let bytes = response.bytes().await?;
    debug!(
        "[HTTP] Response for {} {}: status={} bytes={}",
        method,
        url,
        status,
        bytes.len()
    );

    if bytes.is_empty() {
        return Err(ApiLinkError::EmptyBody);
    }
    decode_response(&bytes)
}

/// Attach a body to the transport request builder, setting the content type
/// (and `Content-Encoding: gzip` for wrapped bodies).
async fn attach_body(
    builder: reqwest::RequestBuilder,
    body: Body,
) -> Result<reqwest::RequestBuilder> {
    match body {
        Body::Json(value) => {
            let data = serde_json::to_vec(&value)
                .map_err(|e| ApiLinkError::Serialization(e.to_string()))?;
            Ok(builder
                .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE_JSON)
                .body(data))
        }
        Body::Bytes { data, content_type } => Ok(builder
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)),
        Body::File { path, content_type } => {
            let file = open_file(&path).await?;
            Ok(builder
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(reqwest::Body::wrap_stream(ReaderStream::new(file))))
        }
        Body::Multipart(fields) => {
            let mut form = reqwest::multipart::Form::new();
            for field in fields {
                match field.value {
                    FormValue::Text(text) => form = form.text(field.name, text),
                    FormValue::Body { body, filename } => {
                        let encoded = body.is_gzipped();
                        let (reader, content_type) = body_source(*body).await?;
                        let part_body = reqwest::Body::wrap_stream(ReaderStream::new(reader));
                        let mut part = reqwest::multipart::Part::stream(part_body)
                            .mime_str(&content_type)
                            .map_err(|e| ApiLinkError::Configuration(e.to_string()))?;
                        if let Some(filename) = filename {
                            part = part.file_name(filename);
                        }
                        if encoded {
                            debug!("[HTTP] Multipart part {:?} is gzip-wrapped", field.name);
                        }
                        form = form.part(field.name, part);
                    }
                }
            }
            Ok(builder.multipart(form))
        }
        Body::Gzip(inner) => {
            let (reader, content_type) = body_source(Body::Gzip(inner)).await?;
            Ok(builder
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .header(reqwest::header::CONTENT_ENCODING, "gzip")
                .body(reqwest::Body::wrap_stream(ReaderStream::new(reader))))
        }
    }
}

type BoxRead = Box<dyn AsyncRead + Send + Unpin + 'static>;
type BoxByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + 'static>>;

/// Turn a leaf body (or a gzip wrapping of one) into an async byte source
/// plus its advertised content type.
///
/// Gzip wrappers nest naturally: each layer pipes the inner source through
/// its own encoder. A multipart form has no single byte source and cannot be
/// wrapped.
fn body_source(body: Body) -> BoxFuture<'static, Result<(BoxRead, String)>> {
    async move {
        match body {
            Body::Json(value) => {
                let data = serde_json::to_vec(&value)
                    .map_err(|e| ApiLinkError::Serialization(e.to_string()))?;
                Ok((
                    Box::new(std::io::Cursor::new(data)) as BoxRead,
                    CONTENT_TYPE_JSON.to_string(),
                ))
            }
            Body::Bytes { data, content_type } => Ok((
                Box::new(std::io::Cursor::new(data)) as BoxRead,
                content_type,
            )),
            Body::File { path, content_type } => {
                let file = open_file(&path).await?;
                Ok((Box::new(file) as BoxRead, content_type))
            }
            Body::Multipart(_) => Err(ApiLinkError::Configuration(
                "gzip wrapper cannot wrap a multipart form".to_string(),
            )),
            Body::Gzip(inner) => {
                let (reader, content_type) = body_source(*inner).await?;
                let stream: BoxByteStream = Box::pin(gzip_stream(reader));
                Ok((Box::new(StreamReader::new(stream)) as BoxRead, content_type))
            }
        }
    }
    .boxed()
}

async fn open_file(path: &std::path::Path) -> Result<tokio::fs::File> {
    tokio::fs::File::open(path)
        .await
        .map_err(|e| ApiLinkError::Io(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_completed_delivers_value() {
        let completion = completed::<u32>(Ok(7));
        assert_eq!(completion.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_completed_delivers_failure() {
        let completion = completed::<u32>(Err(ApiLinkError::EmptyBody));
        let err = completion.await.unwrap_err();
        assert_eq!(err.to_string(), "Response body is null");
    }

    #[tokio::test]
    async fn test_dropped_sender_reports_transport_failure() {
        let (tx, rx) = oneshot::channel::<Result<u32>>();
        drop(tx);
        let completion = Completion { rx };
        let err = completion.await.unwrap_err();
        assert!(matches!(err, ApiLinkError::Transport(_)));
    }

    #[tokio::test]
    async fn test_body_source_gzip_round_trip() {
        let payload = vec![42u8; 50_000];
        let body = Body::bytes(payload.clone()).gzip();
        let (mut reader, content_type) = body_source(body).await.unwrap();
        assert_eq!(content_type, "application/octet-stream");

        let mut compressed = Vec::new();
        reader.read_to_end(&mut compressed).await.unwrap();
        assert!(crate::compression::is_gzip(&compressed));
        assert_eq!(
            crate::compression::decompress_gzip(&compressed).unwrap(),
            payload
        );
    }

    #[tokio::test]
    async fn test_body_source_nested_gzip() {
        let payload = b"nested wrapper".to_vec();
        let body = Body::bytes(payload.clone()).gzip().gzip();
        let (mut reader, _) = body_source(body).await.unwrap();

        let mut twice = Vec::new();
        reader.read_to_end(&mut twice).await.unwrap();
        let once = crate::compression::decompress_gzip(&twice).unwrap();
        assert_eq!(crate::compression::decompress_gzip(&once).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_gzip_over_multipart_rejected() {
        let body = Body::multipart(vec![]).gzip();
        let err = match body_source(body).await {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, ApiLinkError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let body = Body::file("/nonexistent/apilink-test-file");
        let err = match body_source(body).await {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, ApiLinkError::Io(_)));
    }
}
