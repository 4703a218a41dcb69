use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::delivery::{DeliveryError, Transport};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Longest text the Bot API accepts in one message.
pub const MAX_MESSAGE_LEN: usize = 4096;

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// [`Transport`] posting to the Telegram Bot API `sendMessage` method with
/// HTML parse mode.
pub struct TelegramTransport {
    client: Client,
    api_base: String,
    token: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramTransport {
    pub fn new(token: &str, api_base: &str, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("feed-courier/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    fn max_message_len(&self) -> usize {
        MAX_MESSAGE_LEN
    }

    async fn send(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError> {
        let payload = SendMessage {
            chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: false,
        };

        // The endpoint URL embeds the bot token; keep it out of error messages.
        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Http(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DeliveryError::Http(e.without_url()))?;
        tracing::debug!("sendMessage responded {}: {}", status, body);

        let api = serde_json::from_str::<ApiResponse>(&body).ok();
        match api {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            api => Err(DeliveryError::Rejected {
                status: status.as_u16(),
                description: api.and_then(|a| a.description).unwrap_or(body),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> TelegramTransport {
        TelegramTransport::new("123:secret", &server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_send_message_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:secret/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": "@channel",
                "text": "<b>Hello</b>",
                "parse_mode": "HTML",
                "disable_web_page_preview": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": { "message_id": 1 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        transport(&server).send("@channel", "<b>Hello</b>").await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_carries_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: can't parse entities"
            })))
            .mount(&server)
            .await;

        let err = transport(&server).send("@channel", "<b>").await.unwrap_err();

        match err {
            DeliveryError::Rejected {
                status,
                description,
            } => {
                assert_eq!(status, 400);
                assert_eq!(description, "Bad Request: can't parse entities");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_ok_false_is_rejected_even_with_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": false,
                "description": "Forbidden: bot was blocked"
            })))
            .mount(&server)
            .await;

        let err = transport(&server).send("1", "x").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Rejected { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = transport(&server).send("1", "x").await.unwrap_err();
        assert!(matches!(
            err,
            DeliveryError::Rejected { status: 502, ref description } if description == "Bad Gateway"
        ));
    }

    #[tokio::test]
    async fn test_timeout_does_not_leak_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let err = TelegramTransport::new("123:secret", &server.uri(), Duration::from_millis(200))
            .unwrap()
            .send("1", "x")
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Http(ref e) if e.is_timeout()));
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let transport =
            TelegramTransport::new("tok", "https://api.telegram.org/", DEFAULT_SEND_TIMEOUT).unwrap();
        assert_eq!(
            transport.endpoint(),
            "https://api.telegram.org/bottok/sendMessage"
        );
    }
}
