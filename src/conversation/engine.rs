//! Answering follow-up questions with a generative backend.

use super::Session;
use crate::backend::{complete, Backend, GenerationMode};
use crate::config::Prompts;
use crate::error::{RecapError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Question-answering engine over condensed content.
pub struct Conversation {
    backend: Arc<dyn Backend>,
    prompts: Prompts,
    window: usize,
    mode: GenerationMode,
}

impl Conversation {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            prompts: Prompts::default(),
            window: 100,
            mode: GenerationMode::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Number of exchanges remembered after the opening.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Open a session seeded with the condensed content.
    pub fn start(&self, condensed: &str) -> Session {
        Session::seeded(
            condensed,
            &self.prompts.conversation.acknowledgment,
            self.window,
        )
    }

    /// Build the prompt for `question` in `session`.
    pub fn prompt_for(&self, session: &Session, question: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert(
            "system".to_string(),
            self.prompts
                .render_with_custom(&self.prompts.conversation.system, &HashMap::new()),
        );
        vars.insert("history".to_string(), session.render_history());
        vars.insert("question".to_string(), question.to_string());
        Prompts::render(&self.prompts.conversation.template, &vars)
    }

    /// Answer `question` and record the exchange in `session`.
    #[instrument(skip(self, session), fields(session = %session.id))]
    pub async fn ask(&self, session: &mut Session, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RecapError::InvalidInput("Question is empty".to_string()));
        }

        info!("Answering question in session {}", session.id);
        let prompt = self.prompt_for(session, question);

        let answer = complete(self.backend.as_ref(), &prompt, self.mode)
            .await
            .map_err(|e| match e {
                RecapError::BackendUnavailable(msg) => {
                    RecapError::Session(format!("Failed to generate answer: {}", msg))
                }
                other => other,
            })?
            .trim()
            .to_string();

        debug!("Answer: {} chars", answer.len());
        session.record(question, &answer);
        Ok(answer)
    }
}
