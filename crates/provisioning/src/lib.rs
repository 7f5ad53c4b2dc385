//! Account provisioning workflows for personal and enterprise customers.
//!
//! Every workflow runs `CHECKING -> {SKIPPED | CREATING -> DONE} | FAILED`:
//! the requested account is stamped with the owner's identifier, the
//! duplicate detector consults the remote services, and only when nothing
//! conflicts are the record-store save and the remote create issued together.
//!
//! Two concurrent calls for the same identifier can both pass detection and
//! both create an account. Nothing here serialises callers per identifier.

pub mod detector;
pub mod enterprise;
pub mod error;
mod join;
pub mod outcome;
pub mod personal;

#[cfg(test)]
mod fakes;

pub use detector::{AccountFamily, DuplicateDetector};
pub use enterprise::{EnterpriseProvisioner, EnterpriseVariant};
pub use error::{HalfOutcome, ProvisioningError};
pub use outcome::{ProvisioningOutcome, SkipReason};
pub use personal::{PersonalProvisioner, PersonalVariant};
