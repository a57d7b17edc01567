//! Requester construction from blueprint specs.

use std::sync::Arc;

use contracts::{CollectorError, DeviceConfig, Requester, RequesterSpec};
use tracing::{debug, instrument};

use crate::mock::MockRequester;

/// Build the configured requester for one device.
///
/// # Errors
/// - Mock spec without a usable payload source
/// - Obvius spec when built without the `http-requester` feature
/// - HTTP client construction failure
#[instrument(name = "build_requester", skip(device), fields(device = %device.name))]
pub fn build_requester(device: &DeviceConfig) -> Result<Arc<dyn Requester>, CollectorError> {
    match &device.requester {
        #[cfg(feature = "http-requester")]
        RequesterSpec::Obvius {
            host,
            port,
            device_id,
            user,
            pass,
            timeout_secs,
        } => {
            let requester = crate::obvius::ObviusRequester::new(
                host,
                *port,
                *device_id,
                user,
                pass,
                *timeout_secs,
                device.meta.clone(),
            )?;
            debug!(endpoint = %requester.endpoint(), "built obvius requester");
            Ok(Arc::new(requester))
        }

        #[cfg(not(feature = "http-requester"))]
        RequesterSpec::Obvius { .. } => Err(CollectorError::config_validation(
            format!("devices[{}].requester", device.name),
            "obvius requester requires the http-requester feature",
        )),

        RequesterSpec::Mock { payload, fixture } => match (payload, fixture) {
            (Some(payload), None) => {
                debug!("built inline mock requester");
                Ok(Arc::new(MockRequester::inline(
                    payload.clone(),
                    device.meta.clone(),
                )))
            }
            (None, Some(fixture)) => {
                debug!(fixture = %fixture.display(), "built fixture mock requester");
                Ok(Arc::new(MockRequester::fixture(
                    fixture.clone(),
                    device.meta.clone(),
                )))
            }
            _ => Err(CollectorError::config_validation(
                format!("devices[{}].requester", device.name),
                "mock requester needs exactly one of payload / fixture",
            )),
        },
    }
}
