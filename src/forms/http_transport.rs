use std::time::Duration;

use fractal_form::{FormRecord, Transport, TransportError};
use log::{debug, info, warn};
use reqwest::blocking::Client;
use snafu::ResultExt;

use crate::forms::{FormsResult, HttpClientSnafu};

/// Posts the records as JSON to the collector.
///
/// The collector does not give a usable answer: any response counts as a
/// delivery. Only network errors and timeouts are failures.
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: &str, timeout: Duration) -> FormsResult<HttpTransport> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context(HttpClientSnafu {})?;
        Ok(HttpTransport {
            client,
            url: url.to_string(),
        })
    }
}

impl Transport for HttpTransport {
    fn deliver(&self, record: &FormRecord) -> Result<(), TransportError> {
        debug!("deliver: {} -> {}", record.response_id, self.url);
        let resp = self
            .client
            .post(&self.url)
            .json(record)
            .send()
            .map_err(|e| TransportError::new(e.to_string()))?;
        if !resp.status().is_success() {
            warn!(
                "deliver: {}: the collector answered {}",
                record.response_id,
                resp.status()
            );
        }
        Ok(())
    }
}

/// Logs the records instead of sending them.
pub struct DryRunTransport;

impl Transport for DryRunTransport {
    fn deliver(&self, record: &FormRecord) -> Result<(), TransportError> {
        match serde_json::to_string(record) {
            Ok(s) => info!("dry run: {}", s),
            Err(e) => warn!("dry run: cannot serialize {}: {}", record.response_id, e),
        }
        Ok(())
    }
}
