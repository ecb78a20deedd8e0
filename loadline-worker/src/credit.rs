/// Broker credit-check collaborator
///
/// Before an emailed load becomes a board entry, the broker gets a credit
/// check against an external service. The service is strictly advisory:
/// any failure (timeout, non-2xx, unparseable body) degrades the rating to
/// `Unknown` and ingestion continues. No retries, no circuit breaking.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Broker credit rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditRating {
    /// Broker is in good standing
    Approved,

    /// Broker failed the check; the load is still ingested, flagged
    Declined,

    /// Service unavailable or broker not on file
    Unknown,
}

impl CreditRating {
    /// Converts rating to string for the loads column
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditRating::Approved => "approved",
            CreditRating::Declined => "declined",
            CreditRating::Unknown => "unknown",
        }
    }
}

/// Credit-check client seam
///
/// The processor takes this as a trait object so tests can swap in
/// [`MockCreditClient`] and deployments without a configured service get
/// [`DisabledCreditClient`].
#[async_trait]
pub trait CreditCheckClient: Send + Sync {
    /// Rates a broker by name and MC number
    async fn check(&self, broker_name: Option<&str>, broker_mc: Option<&str>) -> CreditRating;
}

/// HTTP credit-check client
pub struct HttpCreditClient {
    http: reqwest::Client,
    base_url: String,
}

/// Request body for the credit service
#[derive(Debug, Serialize)]
struct CreditCheckRequest<'a> {
    broker_name: Option<&'a str>,
    broker_mc: Option<&'a str>,
}

/// Response body from the credit service
#[derive(Debug, Deserialize)]
struct CreditCheckResponse {
    rating: CreditRating,
}

impl HttpCreditClient {
    /// Creates a client for a credit service base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");

        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CreditCheckClient for HttpCreditClient {
    async fn check(&self, broker_name: Option<&str>, broker_mc: Option<&str>) -> CreditRating {
        let url = format!("{}/check", self.base_url.trim_end_matches('/'));
        let request = CreditCheckRequest {
            broker_name,
            broker_mc,
        };

        let response = match self.http.post(&url).json(&request).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "credit check request failed");
                return CreditRating::Unknown;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "credit check returned an error");
            return CreditRating::Unknown;
        }

        match response.json::<CreditCheckResponse>().await {
            Ok(body) => body.rating,
            Err(e) => {
                warn!(error = %e, "credit check response was unparseable");
                CreditRating::Unknown
            }
        }
    }
}

/// Client used when no credit service is configured
pub struct DisabledCreditClient;

#[async_trait]
impl CreditCheckClient for DisabledCreditClient {
    async fn check(&self, _broker_name: Option<&str>, _broker_mc: Option<&str>) -> CreditRating {
        CreditRating::Unknown
    }
}

/// Fixed-rating client for tests
#[derive(Debug, Clone)]
pub struct MockCreditClient {
    rating: CreditRating,
}

impl MockCreditClient {
    /// Creates a mock that always returns `rating`
    pub fn new(rating: CreditRating) -> Self {
        Self { rating }
    }
}

#[async_trait]
impl CreditCheckClient for MockCreditClient {
    async fn check(&self, _broker_name: Option<&str>, _broker_mc: Option<&str>) -> CreditRating {
        self.rating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_as_str() {
        assert_eq!(CreditRating::Approved.as_str(), "approved");
        assert_eq!(CreditRating::Declined.as_str(), "declined");
        assert_eq!(CreditRating::Unknown.as_str(), "unknown");
    }

    #[test]
    fn test_rating_serde_round_trip() {
        let json = serde_json::to_string(&CreditRating::Approved).unwrap();
        assert_eq!(json, "\"approved\"");

        let back: CreditRating = serde_json::from_str("\"declined\"").unwrap();
        assert_eq!(back, CreditRating::Declined);
    }

    #[tokio::test]
    async fn test_disabled_client_is_unknown() {
        let client = DisabledCreditClient;
        assert_eq!(
            client.check(Some("Prime Freight"), Some("654321")).await,
            CreditRating::Unknown
        );
    }

    #[tokio::test]
    async fn test_mock_client_returns_fixed_rating() {
        let client = MockCreditClient::new(CreditRating::Approved);
        assert_eq!(client.check(None, None).await, CreditRating::Approved);
    }
}
