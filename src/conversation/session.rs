//! Conversation sessions and their turn history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used when rendering history into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "Human",
            Role::Assistant => "AI",
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A question-answering conversation about one piece of condensed content.
///
/// The two opening turns are pinned; only the question/answer exchanges
/// that follow are subject to the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    opening: Vec<Turn>,
    exchanges: VecDeque<(Turn, Turn)>,
    window: usize,
}

impl Session {
    /// Start a session whose history opens with `content` and `acknowledgment`.
    pub fn seeded(content: &str, acknowledgment: &str, window: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            opening: vec![Turn::user(content), Turn::assistant(acknowledgment)],
            exchanges: VecDeque::new(),
            window,
        }
    }

    /// The condensed content this session is about.
    pub fn content(&self) -> &str {
        self.opening
            .first()
            .map(|t| t.content.as_str())
            .unwrap_or_default()
    }

    /// Record a question and its answer, evicting the oldest exchange past the window.
    pub fn record(&mut self, question: &str, answer: &str) {
        self.exchanges
            .push_back((Turn::user(question), Turn::assistant(answer)));
        while self.exchanges.len() > self.window {
            self.exchanges.pop_front();
        }
    }

    /// All turns in order, opening first.
    pub fn turns(&self) -> Vec<Turn> {
        let mut turns = self.opening.clone();
        for (question, answer) in &self.exchanges {
            turns.push(question.clone());
            turns.push(answer.clone());
        }
        turns
    }

    /// Number of question/answer exchanges after the opening.
    pub fn exchange_count(&self) -> usize {
        self.exchanges.len()
    }

    /// Forget all exchanges but keep the opening turns.
    pub fn clear(&mut self) {
        self.exchanges.clear();
    }

    /// History rendered as `Human:`/`AI:` lines.
    pub fn render_history(&self) -> String {
        self.turns()
            .iter()
            .map(|t| format!("{}: {}", t.role.label(), t.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
