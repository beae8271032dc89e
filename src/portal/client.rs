//! HTTP client for the portal's login and account endpoints

use crate::config::PortalOptions;
use crate::error::{Error, Result};
use crate::portal::markup;
use crate::portal::{CardToken, Credentials};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Unauthenticated portal client
///
/// Wraps a `reqwest` client with a shared cookie jar. Redirects are disabled
/// because the login contract is a raw `302` whose cookies must be observed.
#[derive(Debug)]
pub struct PortalClient {
    http: Client,
    jar: Arc<Jar>,
    base: Url,
    options: PortalOptions,
}

impl PortalClient {
    /// Build a client for the portal described by `options`.
    pub fn new(options: &PortalOptions) -> Result<Self> {
        let base = Url::parse(&options.base_url).map_err(|e| {
            Error::Config(format!("Invalid portal URL '{}': {e}", options.base_url))
        })?;

        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .redirect(Policy::none())
            .timeout(Duration::from_secs(options.timeout_secs.max(1)))
            .user_agent(concat!("payqr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            jar,
            base,
            options: options.clone(),
        })
    }

    /// Perform the CSRF-protected form login.
    ///
    /// Consumes the client: after a successful login the returned session owns
    /// the cookie jar and is the only handle to the portal.
    pub async fn login(self, credentials: &Credentials) -> Result<PortalSession> {
        let login_url = self.endpoint(&self.options.login_path)?;

        tracing::debug!(url = %login_url, "Requesting login form");
        let form_page = self
            .http
            .get(login_url.clone())
            .send()
            .await
            .map_err(|e| Error::Authentication(format!("portal unreachable: {e}")))?;

        if form_page.status() != StatusCode::OK {
            return Err(Error::Authentication(format!(
                "login form returned HTTP {}",
                form_page.status()
            )));
        }

        let body = form_page
            .text()
            .await
            .map_err(|e| Error::Authentication(format!("failed to read login form: {e}")))?;
        let csrf = markup::extract_csrf(&body, &self.options.csrf_field)?;

        let response = self
            .http
            .post(login_url.clone())
            .form(&[
                (self.options.csrf_field.as_str(), csrf.as_str()),
                (self.options.username_field.as_str(), credentials.username()),
                (self.options.password_field.as_str(), credentials.password()),
            ])
            .send()
            .await
            .map_err(|e| Error::Authentication(format!("portal unreachable: {e}")))?;

        // A successful login answers with a redirect to the account page;
        // anything else is the login form served again.
        if !response.status().is_redirection() {
            return Err(Error::Authentication(
                "credentials rejected by portal".to_string(),
            ));
        }

        if !self.has_cookie(&login_url, &self.options.auth_cookie) {
            return Err(Error::Authentication(format!(
                "portal did not issue the '{}' session cookie",
                self.options.auth_cookie
            )));
        }

        tracing::info!(
            host = login_url.host_str().unwrap_or("<unknown>"),
            user_len = credentials.username().len(),
            "Portal login succeeded"
        );

        Ok(PortalSession { client: self })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid portal path '{path}': {e}")))
    }

    fn has_cookie(&self, url: &Url, name: &str) -> bool {
        let Some(header) = self.jar.cookies(url) else {
            return false;
        };
        let Ok(cookies) = header.to_str() else {
            return false;
        };
        cookies
            .split(';')
            .any(|pair| pair.trim().split('=').next() == Some(name))
    }
}

/// Authenticated portal session
///
/// Used read-only after login; lives for the duration of one run.
#[derive(Debug)]
pub struct PortalSession {
    client: PortalClient,
}

impl PortalSession {
    /// Fetch the account page and extract the balance-card token.
    pub async fn card_token(&self) -> Result<CardToken> {
        let url = self.client.endpoint(&self.client.options.account_path)?;

        tracing::debug!(url = %url, "Requesting account page");
        let response = self
            .client
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Authentication(format!("portal unreachable: {e}")))?;

        if response.status() != StatusCode::OK {
            return Err(Error::Authentication(format!(
                "account page returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Authentication(format!("failed to read account page: {e}")))?;

        let token = markup::extract_token(&body, &self.client.options.token_rule())?;
        tracing::info!(token_len = token.as_str().len(), "Card token extracted");
        Ok(token)
    }
}
