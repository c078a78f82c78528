//! WFS client struct and builder.

use std::time::Duration;

use async_trait::async_trait;
use geolayer_core::{
    CommitResponse, Feature, FeatureCollection, FeatureService, ProtocolDescriptor,
    ProtocolError,
};

use crate::error::{map_http_status, map_reqwest_error};
use crate::request::{GEOJSON_OUTPUT_FORMAT, get_feature_params, type_name};
use crate::response::{exception_text, parse_transaction_response};
use crate::transaction::write_transaction;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for a WFS 1.1.0 endpoint.
///
/// The endpoint URL is not stored here: every call is addressed by the
/// [`ProtocolDescriptor`] it receives, so one `WfsService` can serve every
/// vector layer of an application.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use geolayer_wfs::WfsService;
///
/// let service = WfsService::new().timeout(Duration::from_secs(10));
/// ```
#[derive(Clone)]
pub struct WfsService {
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
    /// Per-request timeout.
    pub(crate) timeout: Duration,
    /// `outputFormat` requested for reads.
    pub(crate) output_format: String,
}

impl WfsService {
    /// Create a client with a 30 second timeout reading GeoJSON.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
            output_format: GEOJSON_OUTPUT_FORMAT.into(),
        }
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a preconfigured HTTP client (proxies, auth headers, TLS roots).
    #[must_use]
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Override the read `outputFormat`. It must still produce GeoJSON,
    /// e.g. `"json"` on servers that do not accept the MIME type.
    #[must_use]
    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = format.into();
        self
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ProtocolError> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;

        if !status.is_success() {
            return Err(map_http_status(status, &body));
        }
        Ok(body)
    }
}

impl Default for WfsService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeatureService for WfsService {
    /// Issue a GetFeature request and decode the GeoJSON answer.
    async fn read(
        &self,
        protocol: &ProtocolDescriptor,
    ) -> Result<FeatureCollection, ProtocolError> {
        let params = get_feature_params(protocol, &self.output_format)?;

        tracing::debug!(
            url = %protocol.service_url(),
            type_name = %type_name(protocol),
            filtered = protocol.filter().is_some(),
            "sending GetFeature request"
        );

        let body = self
            .send(self.client.get(protocol.service_url()).query(&params))
            .await?;

        // Exceptions can come back with a 200 when the output format fails.
        if !body.trim_start().starts_with('{') {
            if let Some(text) = exception_text(&body) {
                return Err(ProtocolError::ServiceException(text));
            }
        }

        let collection: FeatureCollection = serde_json::from_str(&body).map_err(|e| {
            ProtocolError::InvalidResponse(format!("invalid GeoJSON response: {e}"))
        })?;
        tracing::debug!(features = collection.len(), "GetFeature response decoded");
        Ok(collection)
    }

    /// POST a Transaction for the dirty features and read the outcome.
    ///
    /// With nothing to commit no request is sent and an accepted, empty
    /// response is returned.
    async fn commit(
        &self,
        protocol: &ProtocolDescriptor,
        features: &[Feature],
    ) -> Result<CommitResponse, ProtocolError> {
        let dirty: Vec<Feature> = features.iter().filter(|f| f.is_dirty()).cloned().collect();
        if dirty.is_empty() {
            tracing::debug!(type_name = %type_name(protocol), "nothing to commit");
            return Ok(CommitResponse::accepted());
        }

        let body = write_transaction(protocol, &dirty)?;

        tracing::debug!(
            url = %protocol.service_url(),
            type_name = %type_name(protocol),
            actions = dirty.len(),
            "sending Transaction request"
        );

        let answer = self
            .send(
                self.client
                    .post(protocol.service_url())
                    .header("content-type", "text/xml")
                    .body(body),
            )
            .await?;

        parse_transaction_response(&answer)
    }
}
