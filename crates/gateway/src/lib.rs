//! HTTP client for the passive (current, saving, fixed-term) and active
//! (credit) account services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use custodia_core::config::GatewayConfig;
use custodia_core::domain::account::{
    AccountKind, CreditAccount, CurrentAccount, FixedTermAccount, SavingAccount, ServiceSide,
};
use custodia_core::gateway::{AccountGateway, GatewayError};

#[derive(Clone, Debug)]
pub struct HttpAccountGateway {
    client: Client,
    passive_base_url: String,
    active_base_url: String,
}

impl HttpAccountGateway {
    /// Builds a client whose every request is bounded by `timeout_secs`.
    pub fn new(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &GatewayConfig) -> Self {
        Self {
            client,
            passive_base_url: config.passive_base_url.trim_end_matches('/').to_string(),
            active_base_url: config.active_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, kind: AccountKind, path: &str) -> String {
        let base = match kind.service() {
            ServiceSide::Passive => &self.passive_base_url,
            ServiceSide::Active => &self.active_base_url,
        };
        format!("{base}/{}{path}", kind.resource())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        service: ServiceSide,
        url: String,
    ) -> Result<T, GatewayError> {
        debug!(
            event_name = "gateway.request_started",
            service = %service,
            endpoint = %url,
            "account service query"
        );
        let response = self.client.get(&url).send().await.map_err(|error| {
            warn!(
                event_name = "gateway.request_failed",
                service = %service,
                endpoint = %url,
                error = %error,
                "account service query failed"
            );
            GatewayError::Transport { service, endpoint: url.clone(), message: error.to_string() }
        })?;
        decode(service, url, response).await
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        service: ServiceSide,
        url: String,
        body: &B,
    ) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(
            event_name = "gateway.request_started",
            service = %service,
            endpoint = %url,
            method = %method,
            "account service write"
        );
        let response =
            self.client.request(method, &url).json(body).send().await.map_err(|error| {
                warn!(
                    event_name = "gateway.request_failed",
                    service = %service,
                    endpoint = %url,
                    error = %error,
                    "account service write failed"
                );
                GatewayError::Transport {
                    service,
                    endpoint: url.clone(),
                    message: error.to_string(),
                }
            })?;
        decode(service, url, response).await
    }
}

async fn decode<T: DeserializeOwned>(
    service: ServiceSide,
    endpoint: String,
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::Status { service, endpoint, status: status.as_u16() });
    }

    response.json::<T>().await.map_err(|error| GatewayError::Decode {
        service,
        endpoint,
        message: error.to_string(),
    })
}

#[async_trait]
impl AccountGateway for HttpAccountGateway {
    async fn account_exists(
        &self,
        kind: AccountKind,
        identifier: &str,
    ) -> Result<bool, GatewayError> {
        let url = self.endpoint(kind, &format!("/identifier/{identifier}"));
        self.get_json::<bool>(kind.service(), url).await
    }

    async fn has_any_accounts(
        &self,
        kind: AccountKind,
        identifier: &str,
    ) -> Result<bool, GatewayError> {
        let url = self.endpoint(kind, &format!("/all/identifier/{identifier}"));
        let accounts = self.get_json::<Vec<serde_json::Value>>(kind.service(), url).await?;
        Ok(!accounts.is_empty())
    }

    async fn create_current_account(
        &self,
        account: &CurrentAccount,
    ) -> Result<CurrentAccount, GatewayError> {
        let kind = AccountKind::Current;
        self.send_json(Method::POST, kind.service(), self.endpoint(kind, ""), account).await
    }

    async fn create_current_accounts(
        &self,
        accounts: &[CurrentAccount],
    ) -> Result<Vec<CurrentAccount>, GatewayError> {
        let kind = AccountKind::Current;
        self.send_json(Method::POST, kind.service(), self.endpoint(kind, "/all"), accounts).await
    }

    async fn create_saving_account(
        &self,
        account: &SavingAccount,
    ) -> Result<SavingAccount, GatewayError> {
        let kind = AccountKind::Saving;
        self.send_json(Method::POST, kind.service(), self.endpoint(kind, ""), account).await
    }

    async fn create_fixed_term_account(
        &self,
        account: &FixedTermAccount,
    ) -> Result<FixedTermAccount, GatewayError> {
        let kind = AccountKind::FixedTerm;
        self.send_json(Method::POST, kind.service(), self.endpoint(kind, ""), account).await
    }

    async fn create_credit_account(
        &self,
        account: &CreditAccount,
    ) -> Result<CreditAccount, GatewayError> {
        let kind = AccountKind::Credit;
        self.send_json(Method::POST, kind.service(), self.endpoint(kind, ""), account).await
    }

    async fn create_credit_accounts(
        &self,
        accounts: &[CreditAccount],
    ) -> Result<Vec<CreditAccount>, GatewayError> {
        let kind = AccountKind::Credit;
        self.send_json(Method::POST, kind.service(), self.endpoint(kind, "/all"), accounts).await
    }

    async fn update_current_account(
        &self,
        account: &CurrentAccount,
    ) -> Result<CurrentAccount, GatewayError> {
        let kind = AccountKind::Current;
        // The passive service routes updates as `/identifier{id}`, with no separator.
        let path = format!(
            "/identifier{}/account/{}",
            account.identifier.as_deref().unwrap_or_default(),
            account.account_number.as_deref().unwrap_or_default()
        );
        self.send_json(Method::PUT, kind.service(), self.endpoint(kind, &path), account).await
    }
}
