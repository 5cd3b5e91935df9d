use crate::oracle::Oracle;
use crate::timeline::CommitRecord;
use std::time::Duration;

/// Probes an HTTP endpoint of the service under test.
///
/// `true` iff a GET to `url` answers with exactly `expect_status` inside
/// the timeout. Connection refusals, timeouts, and transport errors all
/// read as `false` — the service simply is not serving the feature here.
pub struct HttpStatusOracle {
    url: String,
    expect_status: u16,
    timeout: Duration,
}

impl HttpStatusOracle {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(url: impl Into<String>, expect_status: u16) -> Self {
        Self {
            url: url.into(),
            expect_status,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Oracle for HttpStatusOracle {
    fn evaluate(&self, _commit: &CommitRecord) -> bool {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();

        match agent.get(&self.url).call() {
            Ok(resp) => resp.status().as_u16() == self.expect_status,
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "http probe failed");
                false
            }
        }
    }

    fn describe(&self) -> String {
        format!("GET {} == {}", self.url, self.expect_status)
    }
}
