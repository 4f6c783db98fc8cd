use std::{net::SocketAddr, sync::Arc};

use axum::{extract::State, routing::post, Json, Router};
use futures::{Stream, StreamExt};
use meter_core::domain::Reading;
use time::PrimitiveDateTime;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::pipeline::{PipelineError, Source, Submission};
use crate::timefmt;

#[derive(Clone)]
struct SharedSender {
    tx: mpsc::Sender<Submission<Reading>>,
}

/// HTTP entry point for new readings.
///
/// `POST /readings` takes a JSON array of `{taken_at, value, note?}` objects
/// with timestamps in `2025-01-01 08:00:00` form; accepted rows are queued
/// for the pipeline in the order they appear.
#[derive(Clone)]
pub struct HttpReadingSource {
    receiver: Arc<tokio::sync::Mutex<Option<mpsc::Receiver<Submission<Reading>>>>>,
}

#[derive(serde::Deserialize)]
struct IncomingReading {
    #[serde(deserialize_with = "timefmt::deserialize_timestamp")]
    taken_at: PrimitiveDateTime,
    value: f64,
    #[serde(default)]
    note: Option<String>,
}

impl From<IncomingReading> for Reading {
    fn from(i: IncomingReading) -> Self {
        Reading {
            taken_at: i.taken_at,
            value: i.value,
            note: i.note,
        }
    }
}

impl HttpReadingSource {
    pub async fn new(bind_addr: &str, channel_capacity: usize) -> Result<Self, PipelineError> {
        let (tx, rx) = mpsc::channel(channel_capacity);
        let shared = SharedSender { tx };

        let app = Router::new()
            .route("/readings", post(submit_readings))
            .with_state(shared.clone());

        let addr: SocketAddr = bind_addr
            .parse()
            .map_err(|e| PipelineError::Source(format!("invalid bind addr: {e}")))?;

        tokio::spawn(async move {
            match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => {
                    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                        tracing::error!(error = %e, "reading submission server error");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to bind reading submission listener");
                }
            }
        });

        Ok(Self {
            receiver: Arc::new(tokio::sync::Mutex::new(Some(rx))),
        })
    }
}

#[async_trait::async_trait]
impl Source<Reading> for HttpReadingSource {
    async fn stream(
        &self,
    ) -> std::pin::Pin<Box<dyn Stream<Item = Result<Submission<Reading>, PipelineError>> + Send>>
    {
        let mut guard = self.receiver.lock().await;
        let rx = guard
            .take()
            .expect("HttpReadingSource stream already taken; only one consumer supported");

        let stream = ReceiverStream::new(rx).map(Ok);
        Box::pin(stream)
    }
}

async fn submit_readings(
    State(sender): State<SharedSender>,
    Json(payload): Json<Vec<IncomingReading>>,
) -> Result<(), axum::http::StatusCode> {
    metrics::counter!("http_submit_requests_total").increment(1);

    for incoming in payload {
        let reading: Reading = incoming.into();
        let submission = Submission::now(reading);

        if sender.tx.send(submission).await.is_err() {
            // Channel closed; the pipeline is gone
            metrics::counter!("http_submit_failed_total").increment(1);
            return Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn incoming_json_parses_the_canonical_timestamp() {
        let parsed: IncomingReading =
            serde_json::from_str(r#"{"taken_at":"2025-01-01 08:00:00","value":100.0,"note":"app"}"#)
                .unwrap();

        let reading: Reading = parsed.into();
        assert_eq!(reading.taken_at, datetime!(2025-01-01 08:00));
        assert_eq!(reading.value, 100.0);
        assert_eq!(reading.note.as_deref(), Some("app"));
    }

    #[test]
    fn a_missing_note_defaults_to_none() {
        let parsed: IncomingReading =
            serde_json::from_str(r#"{"taken_at":"2025-01-01 08:00:00","value":100.0}"#).unwrap();
        assert_eq!(parsed.note, None);
    }

    #[test]
    fn a_malformed_timestamp_is_rejected() {
        let res: Result<IncomingReading, _> =
            serde_json::from_str(r#"{"taken_at":"08:00 on Jan 1","value":100.0}"#);
        assert!(res.is_err());
    }
}
