use chrono::Utc;
use serde::{ Serialize, Deserialize };
use std::collections::VecDeque;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// Bounded chat log for one session. Oldest entries fall off first.
#[derive(Clone, Debug)]
pub struct Transcript {
    messages: VecDeque<ChatMessage>,
    limit: usize,
}

impl Transcript {
    pub fn new(limit: usize, greeting: &str) -> Self {
        let mut transcript = Self {
            messages: VecDeque::new(),
            limit: limit.max(1),
        };
        transcript.push("assistant", greeting);
        transcript
    }

    pub fn push(&mut self, role: &str, content: &str) {
        if self.messages.len() == self.limit {
            self.messages.pop_front();
        }
        self.messages.push_back(ChatMessage::new(role, content));
    }

    /// Drops everything and starts over with a single assistant line.
    pub fn reset(&mut self, greeting: &str) {
        self.messages.clear();
        self.push("assistant", greeting);
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The last `window` turns rendered as `role: content` lines.
    pub fn window(&self, window: usize) -> String {
        let skip = self.messages.len().saturating_sub(window);
        self.messages
            .iter()
            .skip(skip)
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_transcript_starts_with_greeting() {
        let t = Transcript::new(10, "Welcome back!");
        assert_eq!(t.len(), 1);
        assert_eq!(t.messages()[0].role, "assistant");
    }

    #[test]
    fn transcript_is_bounded() {
        let mut t = Transcript::new(3, "hi");
        t.push("user", "one");
        t.push("assistant", "two");
        t.push("user", "three");
        let contents: Vec<String> = t
            .messages()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[test]
    fn window_renders_last_turns() {
        let mut t = Transcript::new(20, "hi");
        for i in 0..6 {
            t.push("user", &format!("msg {}", i));
        }
        let rendered = t.window(2);
        assert_eq!(rendered, "user: msg 4\nuser: msg 5");
    }

    #[test]
    fn reset_keeps_only_new_greeting() {
        let mut t = Transcript::new(20, "hi");
        t.push("user", "hello");
        t.reset("Chat cleared. How can I help?");
        assert_eq!(t.len(), 1);
        assert_eq!(t.messages()[0].content, "Chat cleared. How can I help?");
    }
}
