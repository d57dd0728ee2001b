use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, error};

use super::results::TabularResult;
use crate::error::{Error, Result};

const QUERY_CONTENT_TYPE: &str = "application/sparql-query";
const RESULTS_CONTENT_TYPE: &str = "application/sparql-results+json";
const SERVICE: &str = "graph store";

/// Sends query text to the remote graph store and decodes the tabular result.
///
/// Queries travel as a POST body. A failed call is reported once and never retried.
#[derive(Debug, Clone)]
pub struct StoreGateway {
    client: Client,
    endpoint: String,
}

impl StoreGateway {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn execute(&self, query: &str) -> Result<TabularResult> {
        debug!(endpoint = %self.endpoint, bytes = query.len(), "executing store query");
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, QUERY_CONTENT_TYPE)
            .header(ACCEPT, RESULTS_CONTENT_TYPE)
            .body(query.to_owned())
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, "graph store unreachable");
                Error::upstream(SERVICE, err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let status_text = status.canonical_reason().unwrap_or(status.as_str());
            error!(%status, "graph store rejected query");
            return Err(Error::upstream(SERVICE, format!("Server error: {status_text}")));
        }

        response
            .json::<TabularResult>()
            .await
            .map_err(|err| Error::upstream(SERVICE, format!("invalid result body: {err}")))
    }
}
