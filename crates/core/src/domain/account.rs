use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Which remote account service owns an account kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceSide {
    Passive,
    Active,
}

impl fmt::Display for ServiceSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passive => f.write_str("passive"),
            Self::Active => f.write_str("active"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Current,
    Saving,
    FixedTerm,
    Credit,
}

impl AccountKind {
    pub const PASSIVE: [AccountKind; 3] = [Self::Saving, Self::Current, Self::FixedTerm];

    /// Resource segment used by the remote services, e.g. `/savingAccount`.
    pub fn resource(self) -> &'static str {
        match self {
            Self::Current => "currentAccount",
            Self::Saving => "savingAccount",
            Self::FixedTerm => "fixedTermAccount",
            Self::Credit => "creditAccount",
        }
    }

    pub fn service(self) -> ServiceSide {
        match self {
            Self::Current | Self::Saving | Self::FixedTerm => ServiceSide::Passive,
            Self::Credit => ServiceSide::Active,
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => f.write_str("current"),
            Self::Saving => f.write_str("saving"),
            Self::FixedTerm => f.write_str("fixed-term"),
            Self::Credit => f.write_str("credit"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Pen,
    Usd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrentAccountType {
    Normal,
    Pyme,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SavingAccountType {
    Normal,
    Vip,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAccount {
    pub balance: Decimal,
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<CurrentAccountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvc: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingAccount {
    pub balance: Decimal,
    pub currency: Currency,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<SavingAccountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvc: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedTermAccount {
    pub balance: Decimal,
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvc: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditAccount {
    pub balance: Decimal,
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvc: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

/// An account payload embedded in a customer and forwarded to a remote service.
///
/// Every request carries the identifier (`dni` or `ruc`) of the customer that
/// owns it. Stamping is the only way the provisioning workflow sets it.
pub trait AccountRequest {
    const KIND: AccountKind;

    fn identifier(&self) -> Option<&str>;

    fn stamp_identifier(&mut self, identifier: &str);

    fn ensure_owned_by(&self, owner: &str) -> Result<(), DomainError> {
        match self.identifier() {
            Some(found) if found != owner => Err(DomainError::IdentifierMismatch {
                kind: Self::KIND,
                expected: owner.to_string(),
                found: found.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

macro_rules! account_request {
    ($ty:ty, $kind:expr) => {
        impl AccountRequest for $ty {
            const KIND: AccountKind = $kind;

            fn identifier(&self) -> Option<&str> {
                self.identifier.as_deref()
            }

            fn stamp_identifier(&mut self, identifier: &str) {
                self.identifier = Some(identifier.to_string());
            }
        }
    };
}

account_request!(CurrentAccount, AccountKind::Current);
account_request!(SavingAccount, AccountKind::Saving);
account_request!(FixedTermAccount, AccountKind::FixedTerm);
account_request!(CreditAccount, AccountKind::Credit);

impl CurrentAccount {
    pub fn stamp(&mut self, identifier: &str, account_type: CurrentAccountType) {
        self.stamp_identifier(identifier);
        self.account_type = Some(account_type);
    }
}

impl SavingAccount {
    pub fn stamp(&mut self, identifier: &str, account_type: SavingAccountType) {
        self.stamp_identifier(identifier);
        self.account_type = Some(account_type);
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        AccountKind, AccountRequest, Currency, CurrentAccount, CurrentAccountType, SavingAccount,
        ServiceSide,
    };
    use crate::errors::DomainError;

    fn current_account() -> CurrentAccount {
        CurrentAccount {
            balance: Decimal::new(10_000, 2),
            currency: Currency::Usd,
            account_number: Some("191-0001".to_string()),
            account_type: None,
            cvc: Some(123),
            identifier: None,
        }
    }

    #[test]
    fn kinds_route_to_owning_service() {
        assert_eq!(AccountKind::Credit.service(), ServiceSide::Active);
        assert!(AccountKind::PASSIVE.iter().all(|kind| kind.service() == ServiceSide::Passive));
        assert_eq!(AccountKind::FixedTerm.resource(), "fixedTermAccount");
    }

    #[test]
    fn stamping_sets_identifier_and_type() {
        let mut account = current_account();
        account.stamp("20123456789", CurrentAccountType::Pyme);

        assert_eq!(account.identifier(), Some("20123456789"));
        assert_eq!(account.account_type, Some(CurrentAccountType::Pyme));
        assert!(account.ensure_owned_by("20123456789").is_ok());
    }

    #[test]
    fn ownership_check_rejects_foreign_stamp() {
        let mut account = current_account();
        account.stamp_identifier("11111111111");

        let error = account.ensure_owned_by("12345678901").expect_err("mismatch");
        assert!(matches!(
            error,
            DomainError::IdentifierMismatch { kind: AccountKind::Current, ref found, .. }
                if found == "11111111111"
        ));
    }

    #[test]
    fn wire_format_uses_camel_case_and_upper_case_tags() {
        let mut account = SavingAccount {
            balance: Decimal::new(5_000, 2),
            currency: Currency::Pen,
            account_type: None,
            account_number: Some("200-17".to_string()),
            cvc: None,
            identifier: None,
        };
        account.stamp("12345678901", super::SavingAccountType::Vip);

        let json = serde_json::to_value(&account).expect("serialize");
        assert_eq!(json["type"], "VIP");
        assert_eq!(json["currency"], "PEN");
        assert_eq!(json["accountNumber"], "200-17");
        assert_eq!(json["identifier"], "12345678901");
        assert!(json.get("cvc").is_none());
    }
}
