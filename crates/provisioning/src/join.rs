use std::fmt;
use std::future::Future;

use tracing::warn;

use crate::error::{HalfOutcome, ProvisioningError};

/// Drives the store save and the remote create to completion together and
/// returns the saved customer only when both succeeded.
///
/// Neither half is cancelled when the other fails, and nothing is rolled
/// back: a half that succeeded stays applied and is named in the error.
pub(crate) async fn save_and_create<C, R, SE, GE>(
    variant: &'static str,
    identifier: &str,
    save: impl Future<Output = Result<C, SE>>,
    create: impl Future<Output = Result<R, GE>>,
) -> Result<C, ProvisioningError>
where
    SE: fmt::Display,
    GE: fmt::Display,
{
    let (saved, created) = tokio::join!(save, create);

    match (saved, created) {
        (Ok(customer), Ok(_)) => Ok(customer),
        (saved, created) => {
            let store = HalfOutcome::of(&saved);
            let gateway = HalfOutcome::of(&created);
            if store.succeeded() != gateway.succeeded() {
                warn!(
                    event_name = "provisioning.partial_failure",
                    variant,
                    identifier,
                    store = %store,
                    gateway = %gateway,
                    "one half of provisioning was applied; no compensation is attempted"
                );
            }
            Err(ProvisioningError::Join { store, gateway })
        }
    }
}
