//! Thin async client for the platform REST endpoints used by the engine.
//!
//! Wraps `reqwest::Client` and provides the token-authenticated webhook
//! operations handlers use after their interaction has been answered
//! (edit/delete the original response, post a follow-up), plus the
//! bot-authenticated bulk overwrite used to register command declarations.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::response::Message;

/// Base URL for the platform REST API.
pub const API_BASE: &str = "https://discord.com/api/v10";

/// Thin async REST client.
///
/// Cloning is cheap; the underlying connection pool is shared.
///
/// # Examples
///
/// ```
/// use chime_core::RestClient;
///
/// let client = RestClient::new();
/// let followup = client.followup("1234", "interaction-token");
/// assert_eq!(followup.application_id(), "1234");
/// ```
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for RestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Error body returned by the platform on failed calls.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

impl RestClient {
    /// Creates a client against the production API.
    pub fn new() -> Self {
        Self::with_base_url(API_BASE)
    }

    /// Creates a client against another base URL (tests, proxies).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Binds the client to one interaction's follow-up token.
    pub fn followup(&self, application_id: &str, token: &str) -> FollowUp {
        FollowUp {
            client: self.clone(),
            application_id: application_id.to_string(),
            token: token.to_string(),
        }
    }

    /// Replaces every global command declaration of the application.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Rest` if the request fails or is rejected.
    pub async fn overwrite_global_commands(
        &self,
        application_id: &str,
        bot_token: &str,
        declarations: &Value,
    ) -> Result<Value, CoreError> {
        let url = format!("{}/applications/{application_id}/commands", self.base_url);
        self.put_commands(&url, bot_token, declarations).await
    }

    /// Replaces every command declaration of the application in one guild.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Rest` if the request fails or is rejected.
    pub async fn overwrite_guild_commands(
        &self,
        application_id: &str,
        guild_id: &str,
        bot_token: &str,
        declarations: &Value,
    ) -> Result<Value, CoreError> {
        let url = format!(
            "{}/applications/{application_id}/guilds/{guild_id}/commands",
            self.base_url
        );
        self.put_commands(&url, bot_token, declarations).await
    }

    async fn put_commands(
        &self,
        url: &str,
        bot_token: &str,
        declarations: &Value,
    ) -> Result<Value, CoreError> {
        debug!(url, "Overwriting command declarations");
        let resp = self
            .http
            .put(url)
            .header("Authorization", format!("Bot {bot_token}"))
            .json(declarations)
            .send()
            .await
            .map_err(|e| CoreError::Rest(format!("command overwrite request failed: {e}")))?;
        let resp = check_status("command overwrite", resp).await?;
        resp.json()
            .await
            .map_err(|e| CoreError::Rest(format!("command overwrite response parse failed: {e}")))
    }
}

/// Token-authenticated operations on one interaction's conversation turn.
///
/// Valid only after the interaction has been answered; the platform rejects
/// edits to a turn that has not yet been acknowledged. The engine imposes no
/// ordering between calls made through the same handle.
#[derive(Debug, Clone)]
pub struct FollowUp {
    client: RestClient,
    application_id: String,
    token: String,
}

impl FollowUp {
    /// Returns the application id this handle addresses.
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    fn webhook_url(&self) -> String {
        format!(
            "{}/webhooks/{}/{}",
            self.client.base_url, self.application_id, self.token
        )
    }

    /// Edits the original response (or fills in a deferred placeholder).
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Rest` if the request fails or is rejected.
    pub async fn edit_original(&self, message: &Message) -> Result<(), CoreError> {
        debug!(application_id = %self.application_id, "Editing original response");
        let resp = self
            .client
            .http
            .patch(format!("{}/messages/@original", self.webhook_url()))
            .json(message)
            .send()
            .await
            .map_err(|e| CoreError::Rest(format!("edit original request failed: {e}")))?;
        check_status("edit original", resp).await?;
        Ok(())
    }

    /// Deletes the original response.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Rest` if the request fails or is rejected.
    pub async fn delete_original(&self) -> Result<(), CoreError> {
        debug!(application_id = %self.application_id, "Deleting original response");
        let resp = self
            .client
            .http
            .delete(format!("{}/messages/@original", self.webhook_url()))
            .send()
            .await
            .map_err(|e| CoreError::Rest(format!("delete original request failed: {e}")))?;
        check_status("delete original", resp).await?;
        Ok(())
    }

    /// Posts an additional message in the same conversation turn.
    ///
    /// Returns the created message object.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Rest` if the request fails or is rejected.
    pub async fn send(&self, message: &Message) -> Result<Value, CoreError> {
        debug!(application_id = %self.application_id, "Posting follow-up message");
        let resp = self
            .client
            .http
            .post(format!("{}?wait=true", self.webhook_url()))
            .json(message)
            .send()
            .await
            .map_err(|e| CoreError::Rest(format!("follow-up request failed: {e}")))?;
        let resp = check_status("follow-up", resp).await?;
        resp.json()
            .await
            .map_err(|e| CoreError::Rest(format!("follow-up response parse failed: {e}")))
    }
}

/// Turns a non-success status into `CoreError::Rest` with the platform's
/// error message when one is present.
async fn check_status(
    operation: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, CoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let detail = match resp.json::<ApiErrorBody>().await {
        Ok(body) => format!(
            "{} (code {})",
            body.message.unwrap_or_default(),
            body.code.unwrap_or_default()
        ),
        Err(_) => String::new(),
    };
    warn!(operation, status = status.as_u16(), detail, "Platform API error");
    Err(CoreError::Rest(format!("{operation} failed with {status}: {detail}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_should_edit_original() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/webhooks/app1/tok/messages/@original"))
            .and(body_json(json!({"content": "done"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "m1"})))
            .expect(1)
            .mount(&server)
            .await;

        let followup = RestClient::with_base_url(&server.uri()).followup("app1", "tok");
        followup
            .edit_original(&Message::text("done"))
            .await
            .expect("edit");
    }

    #[tokio::test]
    async fn test_should_delete_original() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/webhooks/app1/tok/messages/@original"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let followup = RestClient::with_base_url(&server.uri()).followup("app1", "tok");
        followup.delete_original().await.expect("delete");
    }

    #[tokio::test]
    async fn test_should_post_followup_and_wait() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhooks/app1/tok"))
            .and(query_param("wait", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "m2"})))
            .expect(1)
            .mount(&server)
            .await;

        let followup = RestClient::with_base_url(&server.uri()).followup("app1", "tok");
        let created = followup.send(&Message::text("more")).await.expect("send");
        assert_eq!(created["id"], "m2");
    }

    #[tokio::test]
    async fn test_should_surface_platform_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"message": "Unknown Webhook", "code": 10015})),
            )
            .mount(&server)
            .await;

        let followup = RestClient::with_base_url(&server.uri()).followup("app1", "expired");
        let err = followup
            .edit_original(&Message::text("late"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown Webhook"));
        assert!(err.to_string().contains("10015"));
    }

    #[tokio::test]
    async fn test_should_overwrite_guild_commands_with_bot_token() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/applications/app1/guilds/g1/commands"))
            .and(header("Authorization", "Bot secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "c1"}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = RestClient::with_base_url(&format!("{}/", server.uri()));
        let created = client
            .overwrite_guild_commands("app1", "g1", "secret", &json!([{"name": "ping"}]))
            .await
            .expect("overwrite");
        assert_eq!(created[0]["id"], "c1");
    }
}
