//! Prompt templates for Recap.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory:
//! `condense.toml` for the map-reduce templates and `conversation.toml` for
//! question answering.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Opening marker of the authoritative answer in a backend response.
pub const SCRIPT_OPEN: &str = "<final_script>";
/// Closing marker of the authoritative answer in a backend response.
pub const SCRIPT_CLOSE: &str = "</final_script>";

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub condense: CondensePrompts,
    pub conversation: ConversationPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Templates for the map-reduce condensation pipeline.
///
/// Every template except `system` must instruct the backend to wrap its
/// answer in `<final_script>` tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CondensePrompts {
    /// Shared instructions embedded at the top of every pipeline prompt.
    pub system: String,
    /// Envelope combining `{{system}}` and `{{input}}` into the final prompt.
    pub envelope: String,
    /// Per-chunk condensation. Variables: `{{chunk_text}}`.
    pub map: String,
    /// Merge of map results. Variables: `{{combined_map_results}}`.
    pub reduce: String,
    /// Merge of a later batch. Variables: `{{previous_context}}`, `{{combined_map_results}}`.
    pub reduce_with_context: String,
}

impl Default for CondensePrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a transcript condensing expert specializing in technical, scientific, and business content. Your output will be read aloud by a text to speech model.

Core objective: convert the content into an efficient spoken form while retaining all of its informational value. The listener should learn everything the original teaches.

Start with a brief two to three sentence introduction such as "This content explores" followed by the main topic and key areas, then continue with the full detailed explanation.

Never remove: numbers, statistics, percentages, dates and metrics; facts and claims; examples and case studies; names of people, companies, products and technologies; comparisons and technical specifications; step by step processes; arguments, methodologies and research findings; tools and frameworks mentioned.

Remove: filler words, repetition, greetings and sign offs, off topic tangents, ads and promotions.

Speech rules: natural spoken language in complete sentences. No markdown, bullet symbols, URLs or special characters. Write numbers as words, for example forty seven percent or two point five million. Spell out acronyms on first use. Use "and" instead of an ampersand. Prefer short to medium sentences and clear transitions such as First, Additionally, However.

Tone: conversational but authoritative, technically accurate, direct and clear. No meta statements after the introduction."#
                .to_string(),

            envelope: "System:\n{{system}}\n\nInput:\n{{input}}\n".to_string(),

            map: r#"Condense the following section of a longer document for listening.

Keep every fact, number, name, example and technical detail. Drop filler, repetition and promotional material. Do not add an introduction; this is one part of a larger whole.

Section:
{{chunk_text}}

Think as much as you need, then write the condensed section inside a single <final_script></final_script> block. Only the text inside the block will be used."#
                .to_string(),

            reduce: r#"The following are condensed sections of one document, in order, separated by "---".

Merge them into a single flowing script for listening. Open with the short introduction described in your instructions, remove repetition between sections, and keep every fact, number, name and example.

Sections:
{{combined_map_results}}

Write the final script inside a single <final_script></final_script> block. Only the text inside the block will be used."#
                .to_string(),

            reduce_with_context: r#"You are continuing a script for listening that has already been partly written. This is how the previous part ended:

Previous section:
{{previous_context}}

The following are the next condensed sections of the same document, in order, separated by "---".

Continue the script from where the previous section stopped. Do not repeat an introduction and do not restate material already covered above. Keep every new fact, number, name and example, and keep transitions natural.

Sections:
{{combined_map_results}}

Write only the continuation inside a single <final_script></final_script> block. Only the text inside the block will be used."#
                .to_string(),
        }
    }
}

/// Templates for question answering over condensed content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationPrompts {
    /// System instructions for the explainer.
    pub system: String,
    /// Full prompt. Variables: `{{system}}`, `{{history}}`, `{{question}}`.
    pub template: String,
    /// Assistant turn registered right after the condensed content.
    pub acknowledgment: String,
}

impl Default for ConversationPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a technical news explainer.

You have been given the condensed content of an article or video. Help the user understand it: explain what happened, how it works and why it matters; break down technical concepts and acronyms; summarize concisely unless more detail is requested; answer follow-up questions using the content and careful inference, and say clearly when information is not present.

All responses are fed directly into a text to speech system. Use plain text only: no markdown symbols, code blocks, URLs, emojis, tables or bullet symbols. Avoid slashes, pipes, arrows and brackets. Expand acronyms on first use, read numbers naturally, and prefer short, well-formed sentences. Be clear, calm and explanatory, with no meta commentary."#
                .to_string(),

            template: "{{system}}\n\nConversation History:\n{{history}}\n\nUser Question:\n{{question}}\n".to_string(),

            acknowledgment: "I have read the content and I am ready to explain it or answer your questions about it."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let condense_path = custom_path.join("condense.toml");
            if condense_path.exists() {
                let content = std::fs::read_to_string(&condense_path)?;
                prompts.condense = toml::from_str(&content)?;
            }

            let conversation_path = custom_path.join("conversation.toml");
            if conversation_path.exists() {
                let content = std::fs::read_to_string(&conversation_path)?;
                prompts.conversation = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single left-to-right pass, so `{{...}}` sequences
    /// inside substituted values are never expanded. Unknown variables are
    /// left as-is.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match vars.get(key.trim()) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Wrap a rendered pipeline prompt in the system envelope.
    pub fn envelope(&self, input: String) -> String {
        let mut vars = HashMap::new();
        vars.insert(
            "system".to_string(),
            self.render_with_custom(&self.condense.system, &HashMap::new()),
        );
        vars.insert("input".to_string(), input);
        Self::render(&self.condense.envelope, &vars)
    }

    /// Prompt for condensing a single chunk.
    pub fn map_prompt(&self, chunk_text: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("chunk_text".to_string(), chunk_text.to_string());
        self.envelope(self.render_with_custom(&self.condense.map, &vars))
    }

    /// Prompt for reducing map results without prior context.
    pub fn reduce_prompt(&self, combined_map_results: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert(
            "combined_map_results".to_string(),
            combined_map_results.to_string(),
        );
        self.envelope(self.render_with_custom(&self.condense.reduce, &vars))
    }

    /// Prompt for reducing a later batch, continuing from `previous_context`.
    pub fn reduce_with_context_prompt(
        &self,
        previous_context: &str,
        combined_map_results: &str,
    ) -> String {
        let mut vars = HashMap::new();
        vars.insert("previous_context".to_string(), previous_context.to_string());
        vars.insert(
            "combined_map_results".to_string(),
            combined_map_results.to_string(),
        );
        self.envelope(self.render_with_custom(&self.condense.reduce_with_context, &vars))
    }
}
