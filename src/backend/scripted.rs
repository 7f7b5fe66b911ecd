//! In-process backend that replays scripted replies.
//!
//! Used to exercise the pipeline without a network: it records every prompt
//! it receives and answers either from a queue of canned replies or from a
//! function of the prompt.

use super::{Backend, FragmentStream};
use crate::error::{RecapError, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One canned backend reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Answer with this text.
    Text(String),
    /// Fail the call as if the backend could not be reached.
    Unavailable(String),
}

impl ScriptedReply {
    pub fn text(text: impl Into<String>) -> Self {
        ScriptedReply::Text(text.into())
    }
}

type Responder = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Backend that replays scripted replies and records prompts.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<ScriptedReply>>,
    responder: Option<Responder>,
    prompts: Mutex<Vec<String>>,
    fragment_size: usize,
    delays: Vec<Duration>,
}

impl ScriptedBackend {
    /// Answer calls with `replies`, in order.
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            responder: None,
            prompts: Mutex::new(Vec::new()),
            fragment_size: 0,
            delays: Vec::new(),
        }
    }

    /// Answer every call with `responder(prompt)`.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::new(Vec::new())
        }
    }

    /// Stream replies in fragments of `size` characters (0 = one fragment).
    pub fn with_fragment_size(mut self, size: usize) -> Self {
        self.fragment_size = size;
        self
    }

    /// Sleep before answering call `n` for `delays[n]`.
    pub fn with_delays(mut self, delays: Vec<Duration>) -> Self {
        self.delays = delays;
        self
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }

    async fn answer(&self, prompt: &str) -> Result<String> {
        let call = {
            let mut prompts = self
                .prompts
                .lock()
                .map_err(|_| RecapError::BackendUnavailable("scripted backend poisoned".to_string()))?;
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };

        if let Some(delay) = self.delays.get(call) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(responder) = &self.responder {
            return Ok(responder(prompt));
        }

        let reply = self
            .replies
            .lock()
            .map_err(|_| RecapError::BackendUnavailable("scripted backend poisoned".to_string()))?
            .pop_front();

        match reply {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Unavailable(reason)) => Err(RecapError::BackendUnavailable(reason)),
            None => Err(RecapError::BackendUnavailable(format!(
                "no scripted reply for call {}",
                call + 1
            ))),
        }
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> String {
        "scripted".to_string()
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.answer(prompt).await
    }

    async fn generate_stream(&self, prompt: &str) -> Result<FragmentStream> {
        let text = self.answer(prompt).await?;

        let fragments: Vec<Result<String>> = if self.fragment_size == 0 {
            vec![Ok(text)]
        } else {
            let chars: Vec<char> = text.chars().collect();
            chars
                .chunks(self.fragment_size)
                .map(|c| Ok(c.iter().collect::<String>()))
                .collect()
        };

        Ok(stream::iter(fragments).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::collect_stream;

    #[tokio::test]
    async fn test_replays_in_order_then_runs_dry() {
        let backend = ScriptedBackend::new(vec![
            ScriptedReply::text("one"),
            ScriptedReply::Unavailable("down".to_string()),
        ]);

        assert_eq!(backend.generate("a").await.unwrap(), "one");
        assert!(matches!(
            backend.generate("b").await,
            Err(RecapError::BackendUnavailable(r)) if r == "down"
        ));
        assert!(backend.generate("c").await.is_err());
        assert_eq!(backend.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_fragments_reassemble() {
        let backend = ScriptedBackend::new(vec![ScriptedReply::text("ünïcode text")])
            .with_fragment_size(2);
        let stream = backend.generate_stream("p").await.unwrap();
        assert_eq!(collect_stream(stream).await.unwrap(), "ünïcode text");
    }
}
