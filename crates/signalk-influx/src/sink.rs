//! Point sinks.
//!
//! [`PointSink`] is the seam between the pipeline and the time-series
//! store. [`InfluxSink`] posts Line Protocol to InfluxDB over HTTP, using
//! the v1 `/write` endpoint or, when an organization is configured, the v2
//! `/api/v2/write` endpoint.

use std::future::Future;

use reqwest::{Client, Url};
use thiserror::Error;
use tracing::debug;

use crate::config::InfluxConfig;
use crate::line_protocol::{encode_batch, PRECISION};
use crate::point::Point;

/// Errors that can occur while writing a batch.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Invalid InfluxDB URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("InfluxDB responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Write timed out after {0} ms")]
    Timeout(u64),
}

/// Destination for batches of points.
///
/// Writes may run concurrently; implementations must tolerate that.
pub trait PointSink: Send + Sync + 'static {
    fn write_batch(
        &self,
        points: Vec<Point>,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// InfluxDB HTTP sink.
#[derive(Debug, Clone)]
pub struct InfluxSink {
    client: Client,
    write_url: Url,
    token: Option<String>,
}

impl InfluxSink {
    /// Create a sink for the configured database.
    pub fn new(config: &InfluxConfig) -> Result<Self, SinkError> {
        let write_url = write_url(config)?;
        let client = Client::builder().build()?;
        debug!("InfluxDB write endpoint: {}", write_url);

        Ok(Self {
            client,
            write_url,
            token: config.token.clone(),
        })
    }

    /// The endpoint batches are posted to.
    pub fn write_url(&self) -> &Url {
        &self.write_url
    }
}

impl PointSink for InfluxSink {
    async fn write_batch(&self, points: Vec<Point>) -> Result<(), SinkError> {
        let body = encode_batch(&points);

        let mut request = self.client.post(self.write_url.clone()).body(body);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Token {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Build the write endpoint for a connection config.
pub fn write_url(config: &InfluxConfig) -> Result<Url, SinkError> {
    let invalid = |reason: String| SinkError::InvalidUrl {
        url: config.url.clone(),
        reason,
    };

    let mut url = Url::parse(&config.url).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("not a base URL".to_string()));
    }

    let api_path = if config.org.is_some() {
        "api/v2/write"
    } else {
        "write"
    };
    let base_path = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{}/{}", base_path, api_path));

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        match &config.org {
            Some(org) => {
                query
                    .append_pair("org", org)
                    .append_pair("bucket", &config.database);
            }
            None => {
                query.append_pair("db", &config.database);
                if let Some(rp) = &config.retention_policy {
                    query.append_pair("rp", rp);
                }
            }
        }
        query.append_pair("precision", PRECISION);
    }

    Ok(url)
}
