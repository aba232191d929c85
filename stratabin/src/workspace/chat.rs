//! Chat history operations
//!
//! One append-only message list per canvas id; lists are only ever cleared
//! as a whole.

use super::models::{ChatMessage, ChatRole};
use super::store::WorkspaceStore;

impl WorkspaceStore {
    pub fn append_chat_message(&mut self, canvas_id: &str, role: ChatRole, content: &str) {
        self.chat_history
            .entry(canvas_id.to_string())
            .or_default()
            .push(ChatMessage {
                role,
                content: content.to_string(),
            });
        self.mark_changed();
    }

    pub fn chat_history(&self, canvas_id: &str) -> &[ChatMessage] {
        self.chat_history
            .get(canvas_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn clear_chat_history(&mut self, canvas_id: &str) {
        if self.chat_history.remove(canvas_id).is_some() {
            self.mark_changed();
        }
    }
}
