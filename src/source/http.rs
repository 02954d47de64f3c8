//! Live HTTP source.

use async_trait::async_trait;
use stopmon_adapters::siri::StopMonitoringAdapter;
use stopmon_adapters::AdapterError;

use super::ArrivalSource;
use crate::config::Settings;

/// A source that fetches responses from a StopMonitoring endpoint.
#[derive(Debug)]
pub struct HttpSource {
    adapter: StopMonitoringAdapter,
    description: String,
}

impl HttpSource {
    /// Wrap an already configured adapter.
    pub fn new(adapter: StopMonitoringAdapter) -> Self {
        let description = format!("http: {}", adapter.redacted_url());
        Self {
            adapter,
            description,
        }
    }

    /// Build a source from validated settings.
    ///
    /// Fails if the settings lack an API key or stop code.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let (api_key, stop_code) = settings.live_target()?;
        let adapter = StopMonitoringAdapter::builder()
            .endpoint(settings.endpoint.as_str())
            .api_key(api_key)
            .agency(settings.agency.as_str())
            .stop_code(stop_code)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self::new(adapter))
    }

    /// Returns the underlying adapter.
    pub fn adapter(&self) -> &StopMonitoringAdapter {
        &self.adapter
    }
}

#[async_trait]
impl ArrivalSource for HttpSource {
    async fn fetch(&mut self) -> Result<Vec<u8>, AdapterError> {
        self.adapter.fetch().await
    }

    fn description(&self) -> &str {
        &self.description
    }
}
