use std::time::Duration;

use gm_common::Points;
use gophermart_engine::db_types::{OrderNumber, OrderStatus};
use log::*;
use reqwest::{
    header::{CONTENT_TYPE, RETRY_AFTER},
    Client,
    StatusCode,
};
use serde::Deserialize;

use crate::config::AccrualConfig;

/// Status vocabulary of the external accrual service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl AccrualStatus {
    /// Maps the accrual service's vocabulary onto the ledger's. `REGISTERED`
    /// is not terminal, so it keeps the order in `PROCESSING` and the claim
    /// cycle will ask again.
    pub fn into_order_status(self) -> OrderStatus {
        match self {
            AccrualStatus::Registered | AccrualStatus::Processing => OrderStatus::Processing,
            AccrualStatus::Invalid => OrderStatus::Invalid,
            AccrualStatus::Processed => OrderStatus::Processed,
        }
    }
}

/// A 200 response body from `GET /api/orders/{number}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccrualReply {
    pub order: String,
    pub status: AccrualStatus,
    #[serde(default)]
    pub accrual: Points,
}

/// Classified result of one accrual lookup.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The service knows the order and returned a status.
    Known(AccrualReply),
    /// 429: back off for the given duration before any further lookups.
    RateLimited(Duration),
    /// The service could not be reached.
    Transport,
    /// Any other response; treated as transient and retried on a later claim.
    HttpOther,
}

/// The lookup capability the workers need; the HTTP client implements it and
/// worker tests script it.
#[allow(async_fn_in_trait)]
pub trait AccrualSource {
    async fn fetch(&self, number: &OrderNumber) -> FetchOutcome;
}

#[derive(Clone)]
pub struct AccrualClient {
    client: Client,
    base_url: String,
    default_retry_after: Duration,
}

impl AccrualClient {
    pub fn new(config: &AccrualConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.address.trim_end_matches('/').to_string(),
            default_retry_after: config.default_retry_after,
        })
    }
}

impl AccrualSource for AccrualClient {
    async fn fetch(&self, number: &OrderNumber) -> FetchOutcome {
        let url = format!("{}/api/orders/{}", self.base_url, number);
        trace!("🎁️ Querying accrual service: {url}");
        let response = match self.client.get(&url).header(CONTENT_TYPE, "application/json").send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("🎁️ Failed to reach the accrual service: {e}");
                return FetchOutcome::Transport;
            },
        };
        match response.status() {
            StatusCode::OK => match response.json::<AccrualReply>().await {
                Ok(reply) => FetchOutcome::Known(reply),
                Err(e) => {
                    warn!("🎁️ Could not decode the accrual response for {number}: {e}");
                    FetchOutcome::HttpOther
                },
            },
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(self.default_retry_after);
                FetchOutcome::RateLimited(retry_after)
            },
            status => {
                debug!("🎁️ Accrual service returned {status} for order {number}");
                FetchOutcome::HttpOther
            },
        }
    }
}
