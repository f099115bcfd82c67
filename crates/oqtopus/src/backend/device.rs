//! Device listing.

use std::fmt;
use std::sync::Arc;

use tracing::instrument;

use crate::api::{Device, DeviceApi, OqtopusClient};
use crate::config::OqtopusConfig;
use crate::error::OqtopusResult;

/// Lists the devices of an OQTOPUS Cloud account.
#[derive(Clone)]
pub struct DeviceBackend {
    api: Arc<dyn DeviceApi>,
}

impl fmt::Debug for DeviceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBackend").finish_non_exhaustive()
    }
}

impl DeviceBackend {
    /// Connect to OQTOPUS Cloud with the given configuration.
    pub fn new(config: &OqtopusConfig) -> OqtopusResult<Self> {
        Ok(Self::with_api(Arc::new(OqtopusClient::new(config)?)))
    }

    pub fn with_api(api: Arc<dyn DeviceApi>) -> Self {
        Self { api }
    }

    /// All devices visible to the account.
    #[instrument(skip(self))]
    pub async fn get_devices(&self) -> OqtopusResult<Vec<Device>> {
        self.api.list_devices().await
    }

    /// One device by id.
    #[instrument(skip(self))]
    pub async fn get_device(&self, device_id: &str) -> OqtopusResult<Device> {
        self.api.get_device(device_id).await
    }
}
