//! OIDC identity strategy using the openidconnect crate.

use async_trait::async_trait;
use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreProviderMetadata};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, Nonce, OAuth2TokenResponse,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse,
};
use passage_session::strategy::verify;
use passage_session::{
    CallbackParams, HandshakeError, HandshakeStart, HandshakeState, IdentityConfig,
    IdentityStrategy, Principal, ProviderProfile, ProviderTokens,
};
use rootcause::prelude::Report;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

/// Token response fields that are carried separately from the extra params.
const TOKEN_FIELDS: [&str; 3] = ["access_token", "refresh_token", "id_token"];

/// Identity strategy backed by an OpenID Connect provider.
pub struct OidcStrategy {
    provider_metadata: CoreProviderMetadata,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
    issuer: String,
    config: IdentityConfig,
}

impl OidcStrategy {
    /// Creates a strategy by discovering the provider metadata.
    pub async fn discover(
        config: IdentityConfig,
        public_url: &str,
    ) -> Result<Self, Report<HandshakeError>> {
        let issuer = config.issuer_url();
        let issuer_url = IssuerUrl::new(issuer.clone()).map_err(|e| HandshakeError::Discovery {
            reason: format!("invalid issuer URL: {e}"),
        })?;

        let http_client = http_client().map_err(|e| HandshakeError::Discovery {
            reason: format!("failed to create HTTP client: {e}"),
        })?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| HandshakeError::Discovery {
                reason: format!("failed to discover provider: {e}"),
            })?;

        let redirect_url =
            RedirectUrl::new(config.redirect_uri(public_url)).map_err(|e| {
                HandshakeError::Discovery {
                    reason: format!("invalid redirect URI: {e}"),
                }
            })?;

        let client_id = ClientId::new(config.client_id().to_string());
        let client_secret = ClientSecret::new(config.client_secret().to_string());

        Ok(Self {
            provider_metadata,
            client_id,
            client_secret,
            redirect_url,
            issuer,
            config,
        })
    }
}

#[async_trait]
impl IdentityStrategy for OidcStrategy {
    fn begin_handshake(&self) -> HandshakeStart {
        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        for scope in self.config.scopes() {
            auth_request = auth_request.add_scope(Scope::new(scope.to_string()));
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        HandshakeStart {
            authorization_url: auth_url.to_string(),
            state: HandshakeState {
                csrf_token: csrf_token.secret().clone(),
                pkce_verifier: pkce_verifier.secret().clone(),
                nonce: nonce.secret().clone(),
            },
        }
    }

    #[instrument(skip_all)]
    async fn complete_handshake(
        &self,
        callback: &CallbackParams,
        state: &HandshakeState,
    ) -> Result<Principal, Report<HandshakeError>> {
        let code = callback.authorization_code()?;

        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let http_client = http_client().map_err(|e| HandshakeError::TokenExchange {
            reason: format!("failed to create HTTP client: {e}"),
        })?;

        let token_request = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| HandshakeError::TokenExchange {
                reason: format!("token endpoint error: {e}"),
            })?;

        let token_response = token_request
            .set_pkce_verifier(PkceCodeVerifier::new(state.pkce_verifier.clone()))
            .request_async(&http_client)
            .await
            .map_err(|e| HandshakeError::TokenExchange {
                reason: format!("token exchange failed: {e}"),
            })?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| HandshakeError::TokenValidation {
                reason: "no ID token in response".to_string(),
            })?;

        let nonce = Nonce::new(state.nonce.clone());
        let claims = id_token
            .claims(&client.id_token_verifier(), &nonce)
            .map_err(|e| HandshakeError::TokenValidation {
                reason: e.to_string(),
            })?;

        let profile = ProviderProfile {
            subject: claims.subject().to_string(),
            name: claims
                .name()
                .and_then(|n| n.get(None))
                .map(|n| n.as_str().to_string()),
            nickname: claims
                .nickname()
                .and_then(|n| n.get(None))
                .map(|n| n.as_str().to_string())
                .or_else(|| claims.preferred_username().map(|u| u.as_str().to_string())),
            email: claims.email().map(|e| e.as_str().to_string()),
            email_verified: claims.email_verified(),
            picture: claims
                .picture()
                .and_then(|p| p.get(None))
                .map(|p| p.as_str().to_string()),
            provider: self.issuer.clone(),
        };
        debug!(subject = %profile.subject, "ID token validated");

        let tokens = ProviderTokens {
            access_token: token_response.access_token().secret().clone(),
            refresh_token: token_response.refresh_token().map(|t| t.secret().clone()),
            extra_params: extra_params(&token_response),
        };

        verify(tokens, profile)
    }
}

fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

/// Collects the token endpoint's extra parameters (e.g. `expires_in`,
/// `token_type`) by serializing the response and dropping the tokens.
fn extra_params<TR>(token_response: &TR) -> Map<String, Value>
where
    TR: serde::Serialize,
{
    match serde_json::to_value(token_response) {
        Ok(Value::Object(mut fields)) => {
            for field in TOKEN_FIELDS {
                fields.remove(field);
            }
            fields
        }
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct FakeTokenResponse {
        access_token: &'static str,
        id_token: &'static str,
        token_type: &'static str,
        expires_in: u64,
    }

    #[test]
    fn extra_params_drop_token_values() {
        let params = extra_params(&FakeTokenResponse {
            access_token: "at",
            id_token: "header.payload.sig",
            token_type: "Bearer",
            expires_in: 86400,
        });

        assert!(!params.contains_key("access_token"));
        assert!(!params.contains_key("id_token"));
        assert_eq!(params["token_type"], "Bearer");
        assert_eq!(params["expires_in"], 86400);
    }

    #[test]
    fn extra_params_of_non_object_is_empty() {
        assert!(extra_params(&"just a string").is_empty());
    }
}
