//! Obvius AcquiSuite requester.
//!
//! Polls one device behind an AcquiSuite data acquisition server over HTTP.
//! The server exposes every attached Modbus device through a single CGI
//! endpoint, selected by address.

use std::time::Duration;

use async_trait::async_trait;
use contracts::{CollectorError, MetaMap, Requester, RequesterType};
use tracing::{instrument, trace};

/// HTTP requester against an Obvius AcquiSuite endpoint.
pub struct ObviusRequester {
    device_id: u32,
    endpoint: String,
    user: String,
    pass: String,
    client: reqwest::Client,
    meta: MetaMap,
}

impl ObviusRequester {
    /// Build a requester for the device at `device_id` behind `host:port`.
    ///
    /// # Errors
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(
        host: &str,
        port: u16,
        device_id: u32,
        user: &str,
        pass: &str,
        timeout_secs: u64,
        meta: MetaMap,
    ) -> Result<Self, CollectorError> {
        let endpoint = format!("http://{host}:{port}/setup/devicexml.cgi");
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CollectorError::connectivity(&endpoint, e.to_string()))?;

        Ok(Self {
            device_id,
            endpoint,
            user: user.to_string(),
            pass: pass.to_string(),
            client,
            meta,
        })
    }

    /// The CGI endpoint this requester polls.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Requester for ObviusRequester {
    fn requester_type(&self) -> RequesterType {
        RequesterType::Obvius
    }

    fn meta(&self) -> &MetaMap {
        &self.meta
    }

    #[instrument(name = "obvius_fetch", skip(self), fields(endpoint = %self.endpoint, device_id = self.device_id))]
    async fn fetch(&self) -> Result<String, CollectorError> {
        let response = self
            .client
            .get(&self.endpoint)
            .basic_auth(&self.user, Some(&self.pass))
            .query(&[
                ("ADDRESS", self.device_id.to_string()),
                ("TYPE", "DATA".to_string()),
            ])
            .send()
            .await
            .map_err(|e| CollectorError::connectivity(&self.endpoint, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::connectivity(
                &self.endpoint,
                format!("unexpected status {status}"),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CollectorError::connectivity(&self.endpoint, e.to_string()))?;

        trace!(bytes = body.len(), "payload fetched");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_format() {
        let requester =
            ObviusRequester::new("10.0.0.5", 8080, 4, "readonly", "secret", 10, MetaMap::new())
                .unwrap();
        assert_eq!(
            requester.endpoint(),
            "http://10.0.0.5:8080/setup/devicexml.cgi"
        );
        assert_eq!(requester.requester_type(), RequesterType::Obvius);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connectivity_error() {
        // reserved TEST-NET-1 address, nothing listens there
        let requester =
            ObviusRequester::new("192.0.2.1", 80, 4, "readonly", "secret", 1, MetaMap::new())
                .unwrap();
        let err = requester.fetch().await.unwrap_err();
        assert!(matches!(err, CollectorError::Connectivity { .. }));
    }
}
