//! OAuth2 client for the Viessmann identity service
//!
//! Tokens are looked up in the [`TokenStore`] first. On a miss the configured
//! [`AuthFlow`] runs against the authorize endpoint with the account
//! credentials in HTTP Basic auth. The endpoint answers with a 302 whose
//! `Location` carries either an authorization code (PKCE) or the access token
//! itself in the fragment (implicit).

use crate::config::IamConfig;
use crate::error::{HeliosError, Result};
use crate::logging::{LogContext, get_logger_with_context};
use crate::persistence::TokenStore;
use crate::viessmann::pkce::PkcePair;
use crate::viessmann::token::{BearerToken, is_valid};
use chrono::{DateTime, Utc};
use reqwest::header::LOCATION;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const PKCE_SCOPE: &str = "IoT User offline_access";
const IMPLICIT_NONCE: &str = "anything_goes";

/// OAuth2 flow used on a cache miss
#[derive(Debug, Clone)]
pub enum AuthFlow {
    /// Authorization code with proof key; the pair lives as long as the client
    Pkce(PkcePair),
    /// Token delivered directly in the redirect fragment
    Implicit,
}

impl AuthFlow {
    /// Flow selected by `use_pkce_flow`
    pub fn from_config(config: &IamConfig) -> Result<Self> {
        if config.use_pkce_flow {
            Ok(Self::Pkce(PkcePair::generate()?))
        } else {
            Ok(Self::Implicit)
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pkce(_) => "pkce",
            Self::Implicit => "implicit",
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

pub struct IdentityClient {
    config: IamConfig,
    flow: AuthFlow,
    http: reqwest::Client,
    store: Arc<dyn TokenStore>,
    logger: crate::logging::StructuredLogger,
}

impl IdentityClient {
    /// Client with its own HTTP connection pool and redirects disabled
    pub fn new(config: IamConfig, store: Arc<dyn TokenStore>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        let flow = AuthFlow::from_config(&config)?;
        Ok(Self::with_flow(config, flow, store, http))
    }

    /// Client with an explicit flow and HTTP client.
    ///
    /// The HTTP client must not follow redirects.
    pub fn with_flow(
        config: IamConfig,
        flow: AuthFlow,
        store: Arc<dyn TokenStore>,
        http: reqwest::Client,
    ) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("identity").with_field("flow", flow.name().to_string()),
        );
        Self {
            config,
            flow,
            http,
            store,
            logger,
        }
    }

    /// Bearer token for this pass
    pub async fn token(&self) -> Result<BearerToken> {
        self.token_at(Utc::now()).await
    }

    /// Cache-first lookup evaluated against `now`
    pub async fn token_at(&self, now: DateTime<Utc>) -> Result<BearerToken> {
        if let Some(cached) = self.store.load() {
            if is_valid(&cached, now) {
                self.logger.info("Using cached access token");
                return Ok(cached);
            }
            self.logger
                .info("Cached token expired or undecodable, requesting new token");
        }

        let token = match self.obtain_token().await {
            Ok(token) => token,
            Err(e) => {
                self.logger
                    .error(&format!("Failed to retrieve access token: {}", e));
                return Err(e);
            }
        };
        self.logger.info("Successfully obtained access token");
        self.store.save(&token)?;
        Ok(token)
    }

    /// Run the configured flow, bypassing the cache
    pub async fn obtain_token(&self) -> Result<BearerToken> {
        match &self.flow {
            AuthFlow::Pkce(pair) => {
                let code = self.authorization_code(pair).await?;
                self.exchange_code(pair, &code).await
            }
            AuthFlow::Implicit => self.implicit_token().await,
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), name)
    }

    /// GET the authorize endpoint; `Some(location)` on a 302
    async fn authorize(&self, params: &[(&str, &str)]) -> Result<Option<Url>> {
        let response = self
            .http
            .get(self.endpoint("authorize"))
            .query(params)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::FOUND {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|raw| self.resolve_location(raw));
            if location.is_none() {
                self.logger.warn("Authorize redirect has no usable Location header");
            }
            return Ok(location);
        }
        if status.is_success() {
            self.logger
                .warn(&format!("Authorize endpoint answered {} instead of a redirect", status));
            return Ok(None);
        }
        Err(HeliosError::from_status("identity authorize", status))
    }

    fn resolve_location(&self, raw: &str) -> Option<Url> {
        Url::parse(raw)
            .or_else(|_| {
                let base = format!("{}/", self.config.base_url.trim_end_matches('/'));
                Url::parse(&base).and_then(|b| b.join(raw))
            })
            .ok()
    }

    async fn authorization_code(&self, pair: &PkcePair) -> Result<String> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("scope", PKCE_SCOPE),
            ("response_type", "code"),
            ("code_challenge", pair.challenge()),
            ("code_challenge_method", "S256"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        let code = self.authorize(&params).await?.and_then(|location| {
            location
                .query_pairs()
                .find(|(key, _)| key == "code")
                .map(|(_, value)| value.into_owned())
        });
        match code {
            Some(code) if !code.is_empty() => Ok(code),
            _ => self.missing_credential("authorization code"),
        }
    }

    async fn exchange_code(&self, pair: &PkcePair, code: &str) -> Result<BearerToken> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
            ("code_verifier", pair.verifier()),
            ("code", code),
        ];
        let response = self
            .http
            .post(self.endpoint("token"))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HeliosError::from_status("identity token", status));
        }
        let body: TokenResponse = response.json().await?;
        match body.access_token {
            Some(token) if !token.is_empty() => Ok(BearerToken::new(token)),
            _ => self.missing_credential("access token").map(BearerToken::new),
        }
    }

    async fn implicit_token(&self) -> Result<BearerToken> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("response_type", "id_token token"),
            ("nonce", IMPLICIT_NONCE),
        ];
        let token = self
            .authorize(&params)
            .await?
            .and_then(|location| location.fragment().and_then(fragment_access_token));
        match token {
            Some(token) if !token.is_empty() => Ok(BearerToken::new(token)),
            _ => self.missing_credential("access token").map(BearerToken::new),
        }
    }

    /// Empty credential: fatal in strict mode, passed through otherwise
    fn missing_credential(&self, what: &str) -> Result<String> {
        if self.config.strict_redirect {
            return Err(HeliosError::auth(format!(
                "Authorize redirect carried no {}",
                what
            )));
        }
        self.logger.warn(&format!(
            "Authorize redirect carried no {}; continuing with an empty value",
            what
        ));
        Ok(String::new())
    }
}

/// `access_token` from a form-encoded URL fragment
pub fn fragment_access_token(fragment: &str) -> Option<String> {
    fragment
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "access_token")
        .and_then(|(_, value)| {
            urlencoding::decode(&value.replace('+', " "))
                .ok()
                .map(|v| v.into_owned())
        })
}
