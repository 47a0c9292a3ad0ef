//! HTTP client for the remote content-quality data source.
//!
//! Wraps `reqwest` with bearer auth, typed endpoints, and retry. Non-2xx
//! responses carry an `{"error": {"code", "message"}}` envelope and surface
//! as [`SourceError::Api`]; transient failures are retried with exponential
//! back-off before an error reaches the caller.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use cqrd_core::{AppConfig, MetricsPeriod};

use crate::error::SourceError;
use crate::retry::retry_with_backoff;
use crate::types::{
    AggregateReport, AggregateRequest, ApiErrorEnvelope, ContentValidationRequest, LinkCheckRow,
    LinkResults, LinkValidationRequest, MetricsSnapshot, MetricsSnapshots, ScheduleRecord,
    ScheduleRecords, TelemetryEvent, ValidationReport,
};

/// Client for the remote content-quality data source.
///
/// Holds the HTTP client, base URL, optional bearer token, and retry policy.
/// Use [`SourceClient::new`] with the process configuration, or
/// [`SourceClient::with_base_url`] to point at a mock server in tests.
pub struct SourceClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl SourceClient {
    /// Creates a client from the process configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SourceError::InvalidBaseUrl`] if the
    /// configured source URL does not parse.
    pub fn new(cfg: &AppConfig) -> Result<Self, SourceError> {
        Self::with_base_url(
            &cfg.source_url,
            cfg.source_api_key.as_deref(),
            cfg.source_timeout_secs,
            cfg.source_max_retries,
            cfg.source_backoff_base_ms,
        )
    }

    /// Creates a client with explicit connection settings (for testing with
    /// wiremock, or for one-shot tools that bypass `AppConfig`).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SourceError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        base_url: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("cqrd/0.1 (content-quality)")
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // Url::join appends endpoint paths instead of replacing the last
        // path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| SourceError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.map(str::to_owned),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Submits a content blob for validation.
    ///
    /// Calls `POST /v1/validation/content` and returns the parsed
    /// [`ValidationReport`].
    ///
    /// # Errors
    ///
    /// - [`SourceError::Api`] if the source rejects the request.
    /// - [`SourceError::Http`] on network failure after retries.
    /// - [`SourceError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn validate_content(
        &self,
        request: &ContentValidationRequest,
    ) -> Result<ValidationReport, SourceError> {
        let url = self.endpoint("v1/validation/content")?;
        self.post_json(url, request, "validate_content").await
    }

    /// Submits a URL set for link checking.
    ///
    /// Calls `POST /v1/validation/links` and returns the per-URL rows.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Api`] if the source rejects the request.
    /// - [`SourceError::Http`] on network failure after retries.
    /// - [`SourceError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn validate_links(
        &self,
        request: &LinkValidationRequest,
    ) -> Result<Vec<LinkCheckRow>, SourceError> {
        let url = self.endpoint("v1/validation/links")?;
        let envelope: LinkResults = self.post_json(url, request, "validate_links").await?;
        Ok(envelope.results)
    }

    /// Fetches stored quality snapshots for one content item over a trailing
    /// window.
    ///
    /// Calls `GET /v1/metrics/quality?content_id=&period=`. Ordering of the
    /// returned snapshots is not guaranteed by the source.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Api`] if the source rejects the request.
    /// - [`SourceError::Http`] on network failure after retries.
    /// - [`SourceError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn get_quality_metrics(
        &self,
        content_id: &str,
        period: MetricsPeriod,
    ) -> Result<Vec<MetricsSnapshot>, SourceError> {
        let mut url = self.endpoint("v1/metrics/quality")?;
        url.query_pairs_mut()
            .append_pair("content_id", content_id)
            .append_pair("period", period.as_str());
        let context = format!("get_quality_metrics(content_id={content_id})");
        let envelope: MetricsSnapshots = self.get_json(url, &context).await?;
        Ok(envelope.snapshots)
    }

    /// Requests an aggregation over an explicit date range.
    ///
    /// Calls `POST /v1/metrics/aggregate`.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Api`] if the source rejects the request.
    /// - [`SourceError::Http`] on network failure after retries.
    /// - [`SourceError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn aggregate_metrics(
        &self,
        request: &AggregateRequest,
    ) -> Result<AggregateReport, SourceError> {
        let url = self.endpoint("v1/metrics/aggregate")?;
        self.post_json(url, request, "aggregate_metrics").await
    }

    /// Fetches every persisted report schedule.
    ///
    /// Calls `GET /v1/schedules`.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Api`] if the source rejects the request.
    /// - [`SourceError::Http`] on network failure after retries.
    /// - [`SourceError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn list_schedules(&self) -> Result<Vec<ScheduleRecord>, SourceError> {
        let url = self.endpoint("v1/schedules")?;
        let envelope: ScheduleRecords = self.get_json(url, "list_schedules").await?;
        Ok(envelope.schedules)
    }

    /// Upserts one persisted schedule record.
    ///
    /// Calls `PUT /v1/schedules/{id}` with the record as the body.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Api`] if the source rejects the record.
    /// - [`SourceError::Http`] on network failure after retries.
    pub async fn put_schedule(&self, record: &ScheduleRecord) -> Result<(), SourceError> {
        let url = self.endpoint(&format!("v1/schedules/{}", record.id))?;
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .authorize(self.client.put(url).json(record))
                    .send()
                    .await?;
                Self::require_success(response).await
            }
        })
        .await
    }

    /// Posts one telemetry event.
    ///
    /// Calls `POST /v1/events` with a single attempt and no retry; callers
    /// treat this as fire-and-forget and only log failures.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Api`] if the source rejects the event.
    /// - [`SourceError::Http`] on network failure.
    pub async fn post_event(&self, event: &TelemetryEvent) -> Result<(), SourceError> {
        let url = self.endpoint("v1/events")?;
        let response = self
            .authorize(self.client.post(url).json(event))
            .send()
            .await?;
        Self::require_success(response).await
    }

    /// Resolves an endpoint path against the normalised base URL.
    fn endpoint(&self, path: &str) -> Result<Url, SourceError> {
        self.base_url
            .join(path)
            .map_err(|e| SourceError::InvalidBaseUrl(format!("'{path}': {e}")))
    }

    /// Attaches the bearer token when one is configured.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Sends a GET request with retry and decodes the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        context: &str,
    ) -> Result<T, SourceError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self.authorize(self.client.get(url)).send().await?;
                Self::decode(response, context).await
            }
        })
        .await
    }

    /// Sends a POST request with retry and decodes the JSON body.
    async fn post_json<B, T>(&self, url: Url, body: &B, context: &str) -> Result<T, SourceError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .authorize(self.client.post(url).json(body))
                    .send()
                    .await?;
                Self::decode(response, context).await
            }
        })
        .await
    }

    /// Maps a non-2xx response to [`SourceError::Api`], otherwise parses the
    /// body as JSON.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, SourceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::api_error(status, &body));
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }

    /// Maps a non-2xx response to [`SourceError::Api`] and discards the body
    /// otherwise.
    async fn require_success(response: reqwest::Response) -> Result<(), SourceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::api_error(status, &body));
        }
        Ok(())
    }

    /// Parses the error envelope out of a failed response body, falling back
    /// to a generic message when the body is not the expected shape.
    fn api_error(status: StatusCode, body: &str) -> SourceError {
        match serde_json::from_str::<ApiErrorEnvelope>(body) {
            Ok(envelope) => SourceError::Api {
                status: status.as_u16(),
                code: envelope.error.code,
                message: envelope.error.message,
            },
            Err(_) => SourceError::Api {
                status: status.as_u16(),
                code: "unknown".to_owned(),
                message: format!("HTTP {status}"),
            },
        }
    }
}
