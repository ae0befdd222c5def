use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{Client, Url, header::AUTHORIZATION};
use tracing::{debug, error};

use crate::{
    config::{CredentialMode, OAuthConfig},
    error::{ProxyError, Service, parse_body},
    types::TokenPair,
};

const EXCHANGE_FAILED: &str = "Failed to exchange code for token";
const REFRESH_FAILED: &str = "Failed to refresh token";

/// Confidential-client side of the OAuth authorization-code flow.
///
/// Holds the client credentials; they are attached to outgoing token
/// requests only and never appear in a response to the caller.
#[derive(Debug, Clone)]
pub struct TokenExchange {
    client: Client,
    config: OAuthConfig,
}

impl TokenExchange {
    pub fn new(client: Client, config: OAuthConfig) -> Self {
        TokenExchange { client, config }
    }

    /// Builds the provider URL the user is sent to for consent.
    ///
    /// `state` is echoed back on the redirect and must be checked by whoever
    /// receives the callback.
    pub fn authorize_url(&self, state: &str) -> Result<String, ProxyError> {
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scope.as_str()),
                ("state", state),
                ("show_dialog", "true"),
            ],
        )
        .map_err(|e| ProxyError::InvalidPayload {
            service: Service::IdentityProvider,
            reason: format!("invalid authorize url: {e}"),
        })?;

        Ok(url.into())
    }

    /// Exchanges a single-use authorization code for a token pair.
    ///
    /// Issues exactly one request to the token endpoint. The pair is returned
    /// as the provider sent it. A failed exchange is terminal: the caller has
    /// to restart the redirect flow.
    ///
    /// # Errors
    ///
    /// - [`ProxyError::InvalidInput`] for a blank code, without any request
    /// - [`ProxyError::Upstream`] with the provider's status on a non-2xx reply
    /// - [`ProxyError::EmptyBody`] / [`ProxyError::InvalidPayload`] for a
    ///   malformed success reply
    pub async fn exchange(&self, code: &str) -> Result<TokenPair, ProxyError> {
        if code.trim().is_empty() {
            return Err(ProxyError::invalid("No code provided"));
        }

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        self.request_token(&form, EXCHANGE_FAILED).await
    }

    /// Trades a refresh token for a fresh access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ProxyError> {
        if refresh_token.trim().is_empty() {
            return Err(ProxyError::invalid("No refresh token provided"));
        }

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        self.request_token(&form, REFRESH_FAILED).await
    }

    async fn request_token(
        &self,
        grant: &[(&str, &str)],
        failure: &str,
    ) -> Result<TokenPair, ProxyError> {
        let mut form: Vec<(&str, &str)> = grant.to_vec();
        let mut request = self.client.post(&self.config.token_url);

        match self.config.credential_mode {
            CredentialMode::Basic => {
                request = request.header(AUTHORIZATION, self.basic_credentials());
            }
            CredentialMode::Body => {
                form.push(("client_id", self.config.client_id.as_str()));
                form.push(("client_secret", self.config.client_secret.as_str()));
            }
        }

        debug!(
            grant = grant.first().map(|(_, v)| *v).unwrap_or_default(),
            mode = %self.config.credential_mode,
            "requesting token"
        );

        let response = request
            .form(&form)
            .send()
            .await
            .map_err(|e| ProxyError::from_transport(Service::IdentityProvider, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProxyError::from_transport(Service::IdentityProvider, e))?;

        if !status.is_success() {
            error!(%status, body = %text, "token endpoint rejected request");
            return Err(ProxyError::Upstream {
                service: Service::IdentityProvider,
                status,
                message: failure.to_string(),
            });
        }

        parse_body(Service::IdentityProvider, &text)
    }

    fn basic_credentials(&self) -> String {
        let raw = format!("{}:{}", self.config.client_id, self.config.client_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}
