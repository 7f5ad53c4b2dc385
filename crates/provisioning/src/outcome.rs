use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The detector found an account of the same family for the identifier.
    Duplicate,
    /// The variant requires an existing credit account and none was found.
    MissingPrerequisite,
}

/// Result of a provisioning call. Both variants hand the customer back; only
/// `Created` means anything was saved or sent to a remote service.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProvisioningOutcome<C> {
    Created { customer: C },
    Skipped { reason: SkipReason, customer: C },
}

impl<C> ProvisioningOutcome<C> {
    pub fn customer(&self) -> &C {
        match self {
            Self::Created { customer } | Self::Skipped { customer, .. } => customer,
        }
    }

    pub fn into_customer(self) -> C {
        match self {
            Self::Created { customer } | Self::Skipped { customer, .. } => customer,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Created { .. } => None,
            Self::Skipped { reason, .. } => Some(*reason),
        }
    }
}
