//! Chat relay client
//!
//! Sends a project's conversation, together with a summary of the project,
//! to the relay endpoint and records the assistant's reply in the store.

use crate::error::{AppError, Result};
use crate::sections;
use crate::services::settings::ChatSettings;
use crate::workspace::{Canvas, ChatMessage, ChatRole, WorkspaceStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Summary of a project sent alongside the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    pub project_id: String,
    pub title: String,
    pub nodes: Vec<String>,
    pub writing: String,
    pub todos: Vec<TodoContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoContext {
    pub text: String,
    pub completed: bool,
}

impl ProjectContext {
    pub fn from_canvas(canvas: &Canvas) -> Self {
        let writing = sections::to_plain_text(&sections::decode(&canvas.writing_content));

        Self {
            project_id: canvas.id.clone(),
            title: canvas.display_name().to_string(),
            nodes: canvas
                .nodes
                .iter()
                .map(|n| n.data.label.clone())
                .filter(|label| !label.trim().is_empty())
                .collect(),
            writing,
            todos: canvas
                .todos
                .iter()
                .map(|t| TodoContext {
                    text: t.text.clone(),
                    completed: t.completed,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayRequest<'a> {
    messages: &'a [ChatMessage],
    project_context: &'a ProjectContext,
}

#[derive(Deserialize)]
struct RelayResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Error body returned by the relay on failure.
///
/// The relay forwards whatever the upstream provider produced, so both a
/// bare string and a nested `{ "message": .. }` object are accepted.
#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Text(String),
    Object { message: String },
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: Some(ErrorDetail::Text(message)),
            ..
        })
        | Ok(ErrorEnvelope {
            error: Some(ErrorDetail::Object { message }),
            ..
        }) => message,
        Ok(ErrorEnvelope {
            message: Some(message),
            ..
        }) => message,
        _ if body.trim().is_empty() => "Empty error response".to_string(),
        _ => body.trim().to_string(),
    }
}

/// HTTP client for the chat relay
#[derive(Clone)]
pub struct ChatRelayClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ChatRelayClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("Stratabin/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_settings(settings: &ChatSettings) -> Result<Self> {
        Self::new(
            settings.endpoint.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// Post the conversation and return the first text block of the reply
    pub async fn send(&self, messages: &[ChatMessage], context: &ProjectContext) -> Result<String> {
        tracing::debug!(
            "Posting {} messages for project {} to {}",
            messages.len(),
            context.project_id,
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&RelayRequest {
                messages,
                project_context: context,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            tracing::warn!("Chat relay returned {}: {}", status, message);
            return Err(AppError::Relay {
                status: status.as_u16(),
                message,
            });
        }

        let body: RelayResponse = response.json().await?;
        body.content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(|| AppError::Relay {
                status: status.as_u16(),
                message: "Response contained no text".to_string(),
            })
    }
}

/// Records chat turns in the store around relay calls
#[derive(Clone)]
pub struct ChatService {
    store: Arc<Mutex<WorkspaceStore>>,
    client: ChatRelayClient,
    fallback_message: String,
}

impl ChatService {
    pub fn new(
        store: Arc<Mutex<WorkspaceStore>>,
        client: ChatRelayClient,
        fallback_message: impl Into<String>,
    ) -> Self {
        Self {
            store,
            client,
            fallback_message: fallback_message.into(),
        }
    }

    /// Send a user message for a canvas and return the recorded assistant turn.
    ///
    /// The store lock is released while the request is in flight. A failed
    /// relay call is recorded as an ordinary assistant message carrying the
    /// fallback text.
    pub async fn send_message(&self, canvas_id: &str, text: &str) -> Result<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidInput("Message is empty".to_string()));
        }

        let (history, context) = {
            let mut store = self.store.lock().await;
            let context = ProjectContext::from_canvas(store.canvas(canvas_id)?);
            store.append_chat_message(canvas_id, ChatRole::User, text);
            (store.chat_history(canvas_id).to_vec(), context)
        };

        let reply = match self.client.send(&history, &context).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Chat relay failed for canvas {}: {}", canvas_id, e);
                self.fallback_message.clone()
            }
        };

        let mut store = self.store.lock().await;
        store.append_chat_message(canvas_id, ChatRole::Assistant, &reply);

        Ok(ChatMessage::assistant(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::Section;
    use crate::workspace::{Node, Position};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response and hand back the request body
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            let request_body = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let headers = text[..split].to_ascii_lowercase();
                    let length: usize = headers
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .map(|v| v.trim().parse().unwrap())
                        .unwrap_or(0);
                    let body = &text[split + 4..];
                    if body.len() >= length {
                        break body.to_string();
                    }
                }
                if n == 0 {
                    break String::new();
                }
            };

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request_body
        });

        (format!("http://{}/api/chat", addr), handle)
    }

    fn store_with_project() -> (Arc<Mutex<WorkspaceStore>>, String) {
        let mut store = WorkspaceStore::new();
        let id = store.create_canvas();
        store.rename_canvas(&id, "Launch").unwrap();
        store.add_node(Node::new("n1", "Design", Position::new(0.0, 0.0)));
        store.add_todo(&id, "Write copy").unwrap();
        store
            .set_canvas_sections(&id, &[Section::plain("Ship it in May")])
            .unwrap();
        (Arc::new(Mutex::new(store)), id)
    }

    #[test]
    fn test_error_message_parsing() {
        assert_eq!(error_message(r#"{"error":"API key not configured"}"#), "API key not configured");
        assert_eq!(
            error_message(r#"{"error":{"type":"overloaded","message":"Overloaded"}}"#),
            "Overloaded"
        );
        assert_eq!(error_message(r#"{"message":"Bad gateway"}"#), "Bad gateway");
        assert_eq!(error_message("upstream timeout"), "upstream timeout");
        assert_eq!(error_message(""), "Empty error response");
    }

    #[test]
    fn test_project_context_from_canvas() {
        let (store, id) = store_with_project();
        let store = store.try_lock().unwrap();
        let context = ProjectContext::from_canvas(store.canvas(&id).unwrap());

        assert_eq!(context.project_id, id);
        assert_eq!(context.title, "Launch");
        assert_eq!(context.nodes, vec!["Design".to_string()]);
        assert_eq!(context.writing, "Ship it in May");
        assert_eq!(context.todos.len(), 1);
        assert!(!context.todos[0].completed);

        let json = serde_json::to_value(&context).unwrap();
        assert!(json.get("projectId").is_some());
    }

    #[tokio::test]
    async fn test_send_extracts_first_text_block() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"id":"msg_1","content":[{"type":"text","text":"Hello there"}]}"#,
        )
        .await;
        let client = ChatRelayClient::new(endpoint, Duration::from_secs(5)).unwrap();
        let context = ProjectContext {
            project_id: "p1".to_string(),
            title: "Launch".to_string(),
            nodes: vec![],
            writing: String::new(),
            todos: vec![],
        };

        let reply = client
            .send(&[ChatMessage::user("Hi")], &context)
            .await
            .unwrap();
        assert_eq!(reply, "Hello there");

        let body: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hi");
        assert_eq!(body["projectContext"]["projectId"], "p1");
    }

    #[tokio::test]
    async fn test_send_maps_error_envelope() {
        let (endpoint, _server) = serve_once(
            "500 Internal Server Error",
            r#"{"error":"API key not configured"}"#,
        )
        .await;
        let client = ChatRelayClient::new(endpoint, Duration::from_secs(5)).unwrap();
        let context = ProjectContext {
            project_id: "p1".to_string(),
            title: String::new(),
            nodes: vec![],
            writing: String::new(),
            todos: vec![],
        };

        match client.send(&[ChatMessage::user("Hi")], &context).await {
            Err(AppError::Relay { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "API key not configured");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_message_records_both_turns() {
        let (endpoint, _server) =
            serve_once("200 OK", r#"{"content":[{"type":"text","text":"Sounds good"}]}"#).await;
        let (store, id) = store_with_project();
        let client = ChatRelayClient::new(endpoint, Duration::from_secs(5)).unwrap();
        let service = ChatService::new(store.clone(), client, "fallback");

        let reply = service.send_message(&id, "Plan the launch").await.unwrap();
        assert_eq!(reply.content, "Sounds good");

        let store = store.lock().await;
        let history = store.chat_history(&id);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], ChatMessage::user("Plan the launch"));
        assert_eq!(history[1], ChatMessage::assistant("Sounds good"));
    }

    #[tokio::test]
    async fn test_unreachable_relay_records_fallback() {
        let (store, id) = store_with_project();
        let client = ChatRelayClient::new("http://127.0.0.1:9/api/chat", Duration::from_secs(2)).unwrap();
        let service = ChatService::new(store.clone(), client, "Assistant unavailable");

        let reply = service.send_message(&id, "Hello?").await.unwrap();
        assert_eq!(reply.content, "Assistant unavailable");

        let store = store.lock().await;
        let history = store.chat_history(&id);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, ChatRole::Assistant);
        assert_eq!(history[1].content, "Assistant unavailable");
    }

    #[tokio::test]
    async fn test_send_message_rejects_unknown_canvas_and_empty_text() {
        let (store, id) = store_with_project();
        let client = ChatRelayClient::new("http://127.0.0.1:9/api/chat", Duration::from_secs(1)).unwrap();
        let service = ChatService::new(store.clone(), client, "fallback");

        assert!(matches!(
            service.send_message("missing", "Hi").await,
            Err(AppError::CanvasNotFound(_))
        ));
        assert!(matches!(
            service.send_message(&id, "   ").await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(store.lock().await.chat_history(&id).is_empty());
    }
}
