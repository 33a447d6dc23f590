//! HTTP client for the agency's read-only batch endpoints

use super::types::{Batch, BatchSummary};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

/// Credentials for the agency's basic auth
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Source of batch records for one agency
#[async_trait]
pub trait BatchSource: Send + Sync {
    /// All batches tagged with `experiment_id`
    async fn list_batches(&self, experiment_id: &str) -> Result<Vec<BatchSummary>>;

    /// One batch's full record including its history
    async fn get_batch_detail(&self, batch_id: &str) -> Result<Batch>;
}

/// Agency client
///
/// Requests are sent once; transport, status and decoding failures are
/// returned to the caller as they are.
pub struct AgencyClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl AgencyClient {
    pub fn new(agency_url: &str, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, agency_url, credentials))
    }

    pub fn with_client(client: Client, agency_url: &str, credentials: Credentials) -> Self {
        Self {
            client,
            base_url: agency_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn batches_url(&self) -> String {
        format!("{}/batches", self.base_url)
    }
}

#[async_trait]
impl BatchSource for AgencyClient {
    async fn list_batches(&self, experiment_id: &str) -> Result<Vec<BatchSummary>> {
        let batches: Vec<BatchSummary> = self
            .client
            .get(self.batches_url())
            .query(&[("experimentId", experiment_id)])
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let total = batches.len();
        let batches = retain_experiment(batches, experiment_id);
        if batches.len() != total {
            warn!(
                "Agency returned {} batches not belonging to experiment {}",
                total - batches.len(),
                experiment_id
            );
        }
        debug!("Listed {} batches for {}", batches.len(), experiment_id);

        Ok(batches)
    }

    async fn get_batch_detail(&self, batch_id: &str) -> Result<Batch> {
        let batch = self
            .client
            .get(format!("{}/{}", self.batches_url(), batch_id))
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(batch)
    }
}

/// Drop listing entries tagged with a different experiment
pub fn retain_experiment(batches: Vec<BatchSummary>, experiment_id: &str) -> Vec<BatchSummary> {
    batches
        .into_iter()
        .filter(|b| b.experiment_id == experiment_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agency::BatchState;

    fn summary(id: &str, experiment_id: &str) -> BatchSummary {
        BatchSummary {
            id: id.to_string(),
            experiment_id: experiment_id.to_string(),
            state: BatchState::Registered,
        }
    }

    #[test]
    fn test_retain_experiment_filters_foreign_batches() {
        let batches = vec![summary("a", "e1"), summary("b", "e2"), summary("c", "e1")];

        let kept = retain_experiment(batches, "e1");
        let ids: Vec<_> = kept.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = AgencyClient::new("http://agency.local/", Credentials::new("u", "p")).unwrap();
        assert_eq!(client.base_url(), "http://agency.local");
        assert_eq!(client.batches_url(), "http://agency.local/batches");
    }
}
