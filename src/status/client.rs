use log::debug;
use reqwest::Client;
use url::Url;

use crate::error::{FlowmapError, Result};
use crate::model::Snapshot;

use super::SnapshotSource;

/// HTTP client for the `flowdata` endpoint of a flow status service.
pub struct StatusClient {
    client: Client,
    endpoint: Url,
}

impl StatusClient {
    /// Creates a client polling `<root>/flowdata/<server>/<flow>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or `root` is not a valid
    /// base URL.
    pub fn new(root: &str, server: &str, flow: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("flowmap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FlowmapError::Config(format!("Failed to create HTTP client: {e}")))?;

        let endpoint = flowdata_url(root, server, flow)?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Strips surrounding whitespace and trailing slashes so `root` joins cleanly.
fn normalize_root(root: &str) -> String {
    format!("{}/", root.trim().trim_end_matches('/'))
}

fn flowdata_url(root: &str, server: &str, flow: &str) -> Result<Url> {
    let mut url = Url::parse(&normalize_root(root))
        .map_err(|e| FlowmapError::Config(format!("Invalid status URL: {e}")))?;

    url.path_segments_mut()
        .map_err(|()| FlowmapError::Config(format!("Status URL cannot be a base: {root}")))?
        .pop_if_empty()
        .extend(["flowdata", server, flow]);

    Ok(url)
}

impl SnapshotSource for StatusClient {
    async fn fetch(&self) -> Result<Snapshot> {
        debug!("GET {}", self.endpoint);

        let response = self.client.get(self.endpoint.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(FlowmapError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let snapshot: Snapshot = response.json().await?;
        debug!("Fetched {} jobs", snapshot.len());
        Ok(snapshot)
    }
}
