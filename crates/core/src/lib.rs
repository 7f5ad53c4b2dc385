pub mod config;
pub mod domain;
pub mod errors;
pub mod gateway;

pub use domain::account::{
    AccountKind, AccountRequest, CreditAccount, Currency, CurrentAccount, CurrentAccountType,
    FixedTermAccount, SavingAccount, SavingAccountType, ServiceSide,
};
pub use domain::customer::{
    Enterprise, EnterpriseId, EnterpriseUpdate, Personal, PersonalId, PersonalUpdate,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use gateway::{AccountGateway, GatewayError};
