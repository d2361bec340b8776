//! Minimal Telegram Bot API client over reqwest

use std::path::Path;
use std::time::Duration;

use log::debug;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use super::types::{ApiResponse, BotUser, File, Update};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Long-poll window passed to `getUpdates`.
pub const LONG_POLL_SECS: u64 = 60;

/// HTTP timeout; must exceed the long-poll window.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(LONG_POLL_SECS + 15);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    token: String,
    api_url: String,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Result<Self, TelegramError> {
        Self::with_api_url(token, DEFAULT_API_URL)
    }

    /// Client against a non-default API host (self-hosted Bot API server).
    pub fn with_api_url(
        token: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Result<Self, TelegramError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            token: token.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T, TelegramError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response: ApiResponse<T> = self
            .http
            .post(self.method_url(method))
            .json(params)
            .send()
            .await?
            .json()
            .await?;
        unwrap_response(method, response)
    }

    pub async fn get_me(&self) -> Result<BotUser, TelegramError> {
        self.call("getMe", &json!({})).await
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        self.send(chat_id, text, None).await
    }

    pub async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        self.send(chat_id, text, Some("Markdown")).await
    }

    async fn send(&self, chat_id: i64, text: &str, parse_mode: Option<&str>) -> Result<(), TelegramError> {
        let mut params = json!({ "chat_id": chat_id, "text": text });
        if let Some(mode) = parse_mode {
            params["parse_mode"] = json!(mode);
        }
        let _: serde_json::Value = self.call("sendMessage", &params).await?;
        debug!("Sent message to chat {}", chat_id);
        Ok(())
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File, TelegramError> {
        self.call("getFile", &json!({ "file_id": file_id })).await
    }

    /// Download the content behind a `File::file_path`.
    pub async fn download(&self, file_path: &str) -> Result<Vec<u8>, TelegramError> {
        let url = format!("{}/file/bot{}/{}", self.api_url, self.token, file_path);
        let bytes = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }

    /// Upload a local file as a document.
    pub async fn send_document(&self, chat_id: i64, path: &Path) -> Result<(), TelegramError> {
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", Part::bytes(content).file_name(name));

        let response: ApiResponse<serde_json::Value> = self
            .http
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;
        unwrap_response("sendDocument", response).map(|_| ())
    }
}

fn unwrap_response<T>(method: &str, response: ApiResponse<T>) -> Result<T, TelegramError> {
    match response {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        ApiResponse { description, .. } => Err(TelegramError::Api(format!(
            "{} failed: {}",
            method,
            description.unwrap_or_else(|| "no description".to_string())
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Sent = Arc<Mutex<Vec<Value>>>;

    async fn fake_api() -> (String, Sent) {
        let sent: Sent = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route(
                "/botT0KEN/getMe",
                post(|| async {
                    Json(json!({"ok": true, "result": {"id": 1, "is_bot": true, "first_name": "Toll", "username": "toll_bot"}}))
                }),
            )
            .route(
                "/botT0KEN/sendMessage",
                post(|State(sent): State<Sent>, Json(body): Json<Value>| async move {
                    sent.lock().unwrap().push(body);
                    Json(json!({"ok": true, "result": {"message_id": 9}}))
                }),
            )
            .route(
                "/botT0KEN/getFile",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({"ok": true, "result": {"file_id": body["file_id"], "file_path": "documents/file_1.csv"}}))
                }),
            )
            .route(
                "/botT0KEN/getUpdates",
                post(|| async { Json(json!({"ok": false, "description": "Conflict: terminated by other getUpdates request"})) }),
            )
            .route("/file/botT0KEN/documents/file_1.csv", get(|| async { "a,b\n1,2\n" }))
            .with_state(sent.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), sent)
    }

    #[tokio::test]
    async fn talks_to_bot_api() {
        let (url, sent) = fake_api().await;
        let client = TelegramClient::with_api_url("T0KEN", url).unwrap();

        let me = client.get_me().await.unwrap();
        assert_eq!(me.username.as_deref(), Some("toll_bot"));

        client.send_markdown(42, "*hi*").await.unwrap();
        client.send_message(42, "plain").await.unwrap();
        {
            let sent = sent.lock().unwrap();
            assert_eq!(sent.len(), 2);
            assert_eq!(sent[0]["chat_id"], 42);
            assert_eq!(sent[0]["parse_mode"], "Markdown");
            assert!(sent[1].get("parse_mode").is_none());
        }

        let file = client.get_file("F1").await.unwrap();
        assert_eq!(file.file_id, "F1");
        let bytes = client.download(file.file_path.as_deref().unwrap()).await.unwrap();
        assert_eq!(bytes, b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn api_errors_carry_description() {
        let (url, _sent) = fake_api().await;
        let client = TelegramClient::with_api_url("T0KEN", url).unwrap();

        let err = client.get_updates(0, 0).await.unwrap_err();
        assert!(matches!(err, TelegramError::Api(ref msg) if msg.contains("Conflict")));
    }
}
