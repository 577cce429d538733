use std::sync::Arc;

use tracing::{error, warn};

use domain::{CommandRequest, CommandValue, MetadataClient, OperatingState, Reading, Result};

use super::numeric::{check_assertion, map_value, transform_read_value};
use crate::cache::MetadataIndex;

/// Readings that survived normalization.
#[derive(Debug, Clone, Default)]
pub struct TransformOutcome {
    pub readings: Vec<Reading>,
    /// False when at least one value was dropped.
    pub all_ok: bool,
}

/// Turns raw driver values into readings.
///
/// Shared by the command path and the async path. A failed assertion also
/// disables the device, locally and upstream.
pub struct TransformEngine {
    index: Arc<MetadataIndex>,
    metadata: Arc<dyn MetadataClient>,
    data_transform: bool,
}

impl TransformEngine {
    pub fn new(
        index: Arc<MetadataIndex>,
        metadata: Arc<dyn MetadataClient>,
        data_transform: bool,
    ) -> Self {
        Self {
            index,
            metadata,
            data_transform,
        }
    }

    /// Numeric transform, assertion and mapping for one value.
    pub async fn apply(
        &self,
        device_name: &str,
        request: &CommandRequest,
        mut value: CommandValue,
    ) -> Result<CommandValue> {
        let pv = request.object.property_value();

        if self.data_transform {
            transform_read_value(pv, &mut value)?;
        }

        if let Err(e) = check_assertion(pv, &value) {
            self.disable_device(device_name).await;
            return Err(e);
        }

        map_value(&request.operation, value)
    }

    /// Applies [`apply`](Self::apply) to every value independently.
    ///
    /// The driver answers one value per request, in request order, so values
    /// are paired with requests by position. When the counts differ each
    /// value is matched by resource name instead. Values without a request
    /// and values that fail any step are dropped.
    pub async fn transform_all(
        &self,
        device_name: &str,
        requests: &[CommandRequest],
        values: Vec<CommandValue>,
    ) -> TransformOutcome {
        let mut outcome = TransformOutcome {
            readings: Vec::with_capacity(values.len()),
            all_ok: true,
        };
        let positional = values.len() == requests.len();
        if !positional {
            warn!(
                device = %device_name,
                requested = requests.len(),
                returned = values.len(),
                "Driver returned a different number of values, matching by name"
            );
        }

        for (i, value) in values.into_iter().enumerate() {
            let request = if positional {
                Some(&requests[i])
            } else {
                requests.iter().find(|r| r.object_name() == value.resource())
            };
            let Some(request) = request else {
                warn!(
                    device = %device_name,
                    resource = %value.resource(),
                    "Value does not match any requested resource"
                );
                outcome.all_ok = false;
                continue;
            };

            match self.apply(device_name, request, value).await {
                Ok(value) => {
                    outcome
                        .readings
                        .push(value.to_reading(device_name, request.object_name()));
                }
                Err(e) if e.is_transform_error() => {
                    warn!(
                        device = %device_name,
                        resource = %request.object_name(),
                        error = %e,
                        "Value dropped"
                    );
                    outcome.all_ok = false;
                }
                Err(e) => {
                    error!(
                        device = %device_name,
                        resource = %request.object_name(),
                        error = %e,
                        "Transform failed, value dropped"
                    );
                    outcome.all_ok = false;
                }
            }
        }

        outcome
    }

    async fn disable_device(&self, device_name: &str) {
        if let Err(e) = self
            .index
            .update_operating_state(device_name, OperatingState::Disabled)
            .await
        {
            warn!(device = %device_name, error = %e, "Could not disable device locally");
        }

        let metadata = self.metadata.clone();
        let name = device_name.to_string();
        tokio::spawn(async move {
            if let Err(e) = metadata
                .update_operating_state(&name, OperatingState::Disabled)
                .await
            {
                error!(device = %name, error = %e, "Failed to report disabled operating state");
            }
        });
    }
}
