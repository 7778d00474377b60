// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller-owned conversation state.
//!
//! A [`Conversation`] belongs to one session. The orchestrator only ever sees
//! `&ConversationContext`, so nothing in the query path can mutate it.

use std::time::Duration;

use chrono::Utc;
use querygate_core::{ConversationContext, ConversationMessage, Language, Role, SessionValue};
use tracing::debug;

use crate::language::detect_language;

/// Default number of messages in [`Conversation::summary`].
pub const DEFAULT_SUMMARY_MESSAGES: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    context: ConversationContext,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view passed to generators.
    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// Records a user turn and adopts its detected language as preferred.
    pub fn add_user_message(&mut self, text: impl Into<String>) -> Language {
        let content = text.into();
        let language = detect_language(&content);
        self.context.preferred_language = language;
        self.push(Role::User, content);
        debug!(%language, "user message added");
        language
    }

    pub fn add_system_response(&mut self, text: impl Into<String>) {
        self.push(Role::System, text.into());
    }

    fn push(&mut self, role: Role, content: String) {
        self.context.messages.push(ConversationMessage {
            role,
            content,
            timestamp: Utc::now(),
        });
    }

    /// Starts a new session: messages, variables and language are reset.
    pub fn clear(&mut self) {
        tracing::info!("clearing conversation context");
        self.context = ConversationContext::new();
    }

    pub fn set_session_variable(&mut self, key: impl Into<String>, value: impl Into<SessionValue>) {
        let key = key.into();
        let value = value.into();
        debug!(%key, %value, "session variable set");
        self.context.session_variables.insert(key, value);
    }

    pub fn session_variable(&self, key: &str) -> Option<&SessionValue> {
        self.context.session_variables.get(key)
    }

    pub fn session_text(&self, key: &str) -> Option<&str> {
        match self.session_variable(key)? {
            SessionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn session_integer(&self, key: &str) -> Option<i64> {
        match self.session_variable(key)? {
            SessionValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn session_float(&self, key: &str) -> Option<f64> {
        match self.session_variable(key)? {
            SessionValue::Float(f) => Some(*f),
            SessionValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn session_bool(&self, key: &str) -> Option<bool> {
        match self.session_variable(key)? {
            SessionValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn remove_session_variable(&mut self, key: &str) -> Option<SessionValue> {
        self.context.session_variables.remove(key)
    }

    pub fn set_preferred_language(&mut self, language: Language) {
        self.context.preferred_language = language;
    }

    pub fn preferred_language(&self) -> Language {
        self.context.preferred_language
    }

    /// The last `max_messages` messages as `role: content` lines.
    pub fn summary(&self, max_messages: usize) -> String {
        let messages = &self.context.messages;
        messages[messages.len().saturating_sub(max_messages)..]
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn message_count(&self) -> usize {
        self.context.messages.len()
    }

    pub fn session_duration(&self) -> Duration {
        (Utc::now() - self.context.session_start)
            .to_std()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_update_language() {
        let mut conversation = Conversation::new();
        assert_eq!(
            conversation.add_user_message("Mumbai ke orders dikhao"),
            Language::Hinglish
        );
        assert_eq!(conversation.preferred_language(), Language::Hinglish);
        conversation.add_user_message("Now only last week");
        assert_eq!(conversation.preferred_language(), Language::English);
        assert_eq!(conversation.message_count(), 2);
    }

    #[test]
    fn summary_takes_last_messages() {
        let mut conversation = Conversation::new();
        for i in 0..12 {
            conversation.add_user_message(format!("question {i}"));
            conversation.add_system_response(format!("answer {i}"));
        }
        let summary = conversation.summary(DEFAULT_SUMMARY_MESSAGES);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "user: question 7");
        assert_eq!(lines[9], "system: answer 11");

        assert_eq!(conversation.summary(100).lines().count(), 24);
        assert_eq!(conversation.summary(0), "");
    }

    #[test]
    fn typed_session_variables() {
        let mut conversation = Conversation::new();
        conversation.set_session_variable("city", "Delhi");
        conversation.set_session_variable("year", 2024i64);
        conversation.set_session_variable("active", true);

        assert_eq!(conversation.session_text("city"), Some("Delhi"));
        assert_eq!(conversation.session_integer("year"), Some(2024));
        assert_eq!(conversation.session_float("year"), Some(2024.0));
        assert_eq!(conversation.session_bool("active"), Some(true));
        assert_eq!(conversation.session_integer("city"), None);

        assert_eq!(
            conversation.remove_session_variable("city"),
            Some(SessionValue::Text("Delhi".into()))
        );
        assert!(conversation.session_variable("city").is_none());
    }

    #[test]
    fn clear_resets_everything() {
        let mut conversation = Conversation::new();
        conversation.add_user_message("kya haal hai");
        conversation.set_session_variable("k", 1i64);
        conversation.clear();
        assert_eq!(conversation.message_count(), 0);
        assert!(conversation.context().session_variables.is_empty());
        assert_eq!(conversation.preferred_language(), Language::English);
        assert!(conversation.session_duration() < Duration::from_secs(5));
    }
}
