//! Hosted gateway client over HTTP.
//!
//! Auth calls go to `/auth/v1` (GoTrue), table calls to `/rest/v1`
//! (PostgREST). Every request carries the `apikey` header.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use student_portal_core::AccountId;

use super::{
    AccessToken, GatewayError, GatewaySession, GatewayUser, IdentityGateway, SelectQuery,
    SignUpOutcome,
};
use crate::config::GatewayConfig;

/// Media type asking PostgREST for a single JSON object instead of an array.
const SINGLE_OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

/// Longest error body excerpt kept in logs and error messages.
const MAX_ERROR_BODY_CHARS: usize = 500;

// =============================================================================
// SupabaseClient
// =============================================================================

/// Client for a hosted Supabase project.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base_url: Url,
    anon_key: String,
    service_role_key: Option<String>,
}

impl SupabaseClient {
    /// Create a new gateway client.
    #[must_use]
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            inner: Arc::new(SupabaseClientInner {
                client: reqwest::Client::new(),
                base_url: config.url.clone(),
                anon_key: config.anon_key.expose_secret().to_string(),
                service_role_key: config
                    .service_role_key
                    .as_ref()
                    .map(|key| key.expose_secret().to_string()),
            }),
        }
    }

    /// Build an endpoint URL under the project URL.
    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.inner.base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url
    }

    /// Start a request with the `apikey` header and a bearer token.
    ///
    /// Without a user token the anon key is used as the bearer.
    fn request(
        &self,
        method: reqwest::Method,
        url: Url,
        token: Option<&AccessToken>,
    ) -> reqwest::RequestBuilder {
        let bearer = token.map_or(self.inner.anon_key.as_str(), AccessToken::expose);
        self.inner
            .client
            .request(method, url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(bearer)
    }
}

#[async_trait]
impl IdentityGateway for SupabaseClient {
    #[instrument(skip_all)]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<GatewaySession, GatewayError> {
        let mut url = self.endpoint("auth/v1/token");
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .request(reqwest::Method::POST, url, None)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            return Err(GatewayError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip_all)]
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, GatewayError> {
        let url = self.endpoint("auth/v1/signup");

        let response = self
            .request(reqwest::Method::POST, url, None)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = api_error(response).await;
            if is_already_registered(&error) {
                return Err(GatewayError::AlreadyRegistered);
            }
            return Err(error);
        }

        let body = response.text().await?;
        let outcome = match serde_json::from_str::<SignUpResponse>(&body)? {
            SignUpResponse::Session(session) => SignUpOutcome::Session(session),
            SignUpResponse::User(user) => SignUpOutcome::ConfirmationRequired(user),
        };
        debug!(
            confirmed = matches!(outcome, SignUpOutcome::Session(_)),
            "Credential created"
        );
        Ok(outcome)
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, token: &AccessToken) -> Result<(), GatewayError> {
        let url = self.endpoint("auth/v1/logout");

        let response = self
            .request(reqwest::Method::POST, url, Some(token))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // Token already revoked or expired
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(api_error(response).await),
        }
    }

    #[instrument(skip_all)]
    async fn get_user(&self, token: &AccessToken) -> Result<Option<GatewayUser>, GatewayError> {
        let url = self.endpoint("auth/v1/user");

        let response = self
            .request(reqwest::Method::GET, url, Some(token))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let body = response.text().await?;
                Ok(Some(serde_json::from_str(&body)?))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => Err(api_error(response).await),
        }
    }

    #[instrument(skip(self, token), fields(table = %query.table()))]
    async fn select(
        &self,
        query: &SelectQuery,
        token: Option<&AccessToken>,
    ) -> Result<Vec<serde_json::Value>, GatewayError> {
        let mut url = self.endpoint(&format!("rest/v1/{}", query.table()));
        url.query_pairs_mut().extend_pairs(query.to_query_pairs());

        let mut request = self.request(reqwest::Method::GET, url, token);
        if query.is_single() {
            request = request.header(reqwest::header::ACCEPT, SINGLE_OBJECT_MEDIA_TYPE);
        }
        let response = request.send().await?;

        let status = response.status();
        // Object mode answers 406 when no row matches
        if query.is_single() && status == StatusCode::NOT_ACCEPTABLE {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }

        let body = response.text().await?;
        if query.is_single() {
            Ok(vec![serde_json::from_str(&body)?])
        } else {
            Ok(serde_json::from_str(&body)?)
        }
    }

    #[instrument(skip(self, rows, token), fields(rows = rows.len()))]
    async fn insert(
        &self,
        table: &str,
        rows: Vec<serde_json::Value>,
        token: Option<&AccessToken>,
    ) -> Result<(), GatewayError> {
        let url = self.endpoint(&format!("rest/v1/{table}"));

        let response = self
            .request(reqwest::Method::POST, url, token)
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: AccountId) -> Result<(), GatewayError> {
        let Some(service_key) = self.inner.service_role_key.as_deref() else {
            return Err(GatewayError::NotConfigured("SUPABASE_SERVICE_ROLE_KEY"));
        };
        let url = self.endpoint(&format!("auth/v1/admin/users/{id}"));

        let response = self
            .inner
            .client
            .delete(url)
            .header("apikey", service_key)
            .bearer_auth(service_key)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            _ => Err(api_error(response).await),
        }
    }

    async fn health(&self) -> Result<(), GatewayError> {
        let url = self.endpoint("auth/v1/health");

        let response = self.request(reqwest::Method::GET, url, None).send().await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Sign-up answers with a session when auto-confirm is on, otherwise with
/// the bare user record.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(GatewaySession),
    User(GatewayUser),
}

/// Error body shapes used by the auth and table APIs.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    error_code: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .or(self.error_code)
    }
}

/// Consume a non-success response into `GatewayError::Api`.
async fn api_error(response: reqwest::Response) -> GatewayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();

    tracing::warn!(
        status = %status,
        body = %excerpt,
        "Gateway returned non-success status"
    );

    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or(excerpt);

    GatewayError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Whether a sign-up rejection means the email is taken.
fn is_already_registered(error: &GatewayError) -> bool {
    match error {
        GatewayError::Api { status, message } => {
            (*status == 400 || *status == 422)
                && (message.contains("already registered") || message.contains("already_exists"))
        }
        _ => false,
    }
}
