//! Role-conditioned content generation.
//!
//! Builds persona-voiced prompts, submits them to the external text model,
//! and parses the structured responses. Parsing always fails soft: a post
//! falls back to `{title: truncated topic, body: raw response}`, a debate
//! script falls back to an empty list (which callers treat as "abort").

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use dugout_common::types::{NewsItem, Persona, PersonaRole};
use genai_client::util::{strip_code_blocks, truncate_chars};
use genai_client::TextModel;

/// Title fallback keeps this many characters of the topic.
const TITLE_FALLBACK_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPost {
    pub title: String,
    pub body: String,
}

/// One line of a generated debate script. `speaker` is a nickname the model
/// produced and may not match any panelist; callers resolve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebateLine {
    pub speaker: String,
    pub text: String,
}

/// The generation boundary the scheduler and orchestrators depend on.
/// Prompt wording is not part of this contract — only the output shapes and
/// the fallback behavior are.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn post(
        &self,
        persona: &Persona,
        topic: &str,
        source: Option<&NewsItem>,
    ) -> Result<GeneratedPost>;

    async fn comment(
        &self,
        persona: &Persona,
        post_title: &str,
        post_body: &str,
        prior_comments: &[String],
    ) -> Result<String>;

    async fn debate_script(&self, topic: &str, experts: &[Persona]) -> Result<Vec<DebateLine>>;
}

/// Production generator wrapping the external text model.
#[derive(Clone)]
pub struct PersonaGenerator {
    model: Arc<dyn TextModel>,
}

impl PersonaGenerator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl ContentGenerator for PersonaGenerator {
    async fn post(
        &self,
        persona: &Persona,
        topic: &str,
        source: Option<&NewsItem>,
    ) -> Result<GeneratedPost> {
        let prompt = post_prompt(persona, topic, source);
        let response = self.model.generate(&prompt).await?;
        Ok(parse_generated_post(&response, topic))
    }

    async fn comment(
        &self,
        persona: &Persona,
        post_title: &str,
        post_body: &str,
        prior_comments: &[String],
    ) -> Result<String> {
        let prompt = comment_prompt(persona, post_title, post_body, prior_comments);
        let response = self.model.generate(&prompt).await?;
        Ok(response.trim().to_string())
    }

    async fn debate_script(&self, topic: &str, experts: &[Persona]) -> Result<Vec<DebateLine>> {
        let prompt = debate_prompt(topic, experts);
        let response = self.model.generate(&prompt).await?;
        Ok(parse_debate_script(&response))
    }
}

/// Voice guide per role. Experts analyze, trolls needle, fans gush.
fn style_guide(role: PersonaRole) -> &'static str {
    match role {
        PersonaRole::Expert => {
            "- Analytical and measured; cite numbers or concrete evidence\n\
             - At most one emoji, preferably none\n\
             - Full sentences, no slang"
        }
        PersonaRole::Troll => {
            "- Either deeply cynical or absurdly over-optimistic, nothing in between\n\
             - Informal, a little combative, never concedes a point\n\
             - Emoji limited to negative ones (😑 🤷 👎) or none at all"
        }
        // Fans and system bots share the casual register.
        PersonaRole::Fan | PersonaRole::System => {
            "- Casual die-hard fan voice, emotions dialed up\n\
             - A few emoji are fine (🔥 ⚾ 😂) but don't flood every sentence\n\
             - Short, punchy sentences"
        }
    }
}

fn post_prompt(persona: &Persona, topic: &str, source: Option<&NewsItem>) -> String {
    let source_block = match source {
        Some(s) => format!(
            "\nReference material:\n- Headline: {}\n- Summary: {}\n",
            s.title, s.summary
        ),
        None => String::new(),
    };

    format!(
        "You are \"{nickname}\", a regular on a baseball fan forum.\n\
         Persona traits: [{traits}]. These traits are who you are — let them \
         drive your word choice, tone, and opinions, hard.\n\
         Role: {role}\n\n\
         Write a forum post about the following topic.\n\
         Topic: {topic}\n{source_block}\n\
         Style guide:\n{style}\n\n\
         Rules:\n\
         1. Write like a real forum user, never like an assistant.\n\
         2. The title should bait curiosity or an argument, in character.\n\
         3. Keep the body between 150 and 350 characters.\n\n\
         Respond with JSON only:\n\
         {{\"title\": \"...\", \"body\": \"...\"}}",
        nickname = persona.nickname,
        traits = persona.traits,
        role = persona.role,
        topic = topic,
        source_block = source_block,
        style = style_guide(persona.role),
    )
}

fn comment_prompt(
    persona: &Persona,
    post_title: &str,
    post_body: &str,
    prior_comments: &[String],
) -> String {
    let thread = if prior_comments.is_empty() {
        String::new()
    } else {
        let listed = prior_comments
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. {}", i + 1, c))
            .collect::<Vec<_>>()
            .join("\n");
        format!("\nThread so far:\n{listed}\n")
    };

    format!(
        "You are \"{nickname}\" commenting on a baseball forum.\n\
         Persona traits: [{traits}]. React the way those traits demand — \
         pile on, sympathize, derail, or dissect, whatever fits.\n\n\
         Post title: {title}\n\
         Post body: {body}\n{thread}\n\
         Rules:\n\
         1. One or two sentences, 20 to 80 characters.\n\
         2. Stay fully in character; slang and emoji as the traits allow.\n\
         3. Output the comment text only, no explanation.",
        nickname = persona.nickname,
        traits = persona.traits,
        title = post_title,
        body = post_body,
        thread = thread,
    )
}

fn debate_prompt(topic: &str, experts: &[Persona]) -> String {
    let panel = experts
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{}. {} - {}", i + 1, e.nickname, e.traits))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Write a three-expert panel debate script on a baseball topic.\n\n\
         Topic: {topic}\n\n\
         Panel:\n{panel}\n\n\
         Rules:\n\
         1. Each expert speaks 2-3 times (6-9 lines total).\n\
         2. They take distinct positions and respond to each other — \
            agreement, pushback, and build-ons in a natural flow.\n\
         3. Use each panelist's exact nickname as the speaker.\n\n\
         Respond with a JSON array only:\n\
         [{{\"speaker\": \"nickname\", \"text\": \"...\"}}, ...]",
    )
}

#[derive(Deserialize)]
struct RawPost {
    title: String,
    body: String,
}

#[derive(Deserialize)]
struct RawLine {
    speaker: String,
    text: String,
}

/// Parse a generated post response. Malformed output falls back to
/// `{title: first 50 chars of topic, body: raw response}`.
fn parse_generated_post(response: &str, topic: &str) -> GeneratedPost {
    let clean = strip_code_blocks(response);
    match serde_json::from_str::<RawPost>(clean) {
        Ok(raw) => GeneratedPost {
            title: raw.title,
            body: raw.body,
        },
        Err(_) => GeneratedPost {
            title: truncate_chars(topic, TITLE_FALLBACK_CHARS).to_string(),
            body: response.to_string(),
        },
    }
}

/// Parse a debate script response. Malformed output yields an empty list,
/// which callers must treat as "generation failed, abort" — never a debate
/// with zero messages.
fn parse_debate_script(response: &str) -> Vec<DebateLine> {
    let clean = strip_code_blocks(response);
    match serde_json::from_str::<Vec<RawLine>>(clean) {
        Ok(lines) => lines
            .into_iter()
            .map(|l| DebateLine {
                speaker: l.speaker,
                text: l.text,
            })
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn persona(role: PersonaRole) -> Persona {
        Persona {
            id: Uuid::new_v4(),
            nickname: "StatHead".to_string(),
            role,
            traits: "data nerd, objective, lives in spreadsheets".to_string(),
        }
    }

    #[test]
    fn well_formed_post_response_parses() {
        let parsed = parse_generated_post(
            r#"{"title": "Hot take", "body": "The bullpen is fine, actually"}"#,
            "bullpen collapse",
        );
        assert_eq!(parsed.title, "Hot take");
        assert_eq!(parsed.body, "The bullpen is fine, actually");
    }

    #[test]
    fn fenced_post_response_parses() {
        let parsed = parse_generated_post(
            "```json\n{\"title\": \"T\", \"body\": \"B\"}\n```",
            "topic",
        );
        assert_eq!(parsed.title, "T");
        assert_eq!(parsed.body, "B");
    }

    #[test]
    fn malformed_post_falls_back_to_truncated_topic() {
        let topic = "a".repeat(80);
        let raw = "definitely not json";
        let parsed = parse_generated_post(raw, &topic);
        assert_eq!(parsed.title, "a".repeat(50));
        assert_eq!(parsed.body, raw);
    }

    #[test]
    fn short_topic_fallback_keeps_full_topic() {
        let parsed = parse_generated_post("nope", "short topic");
        assert_eq!(parsed.title, "short topic");
        assert_eq!(parsed.body, "nope");
    }

    #[test]
    fn debate_script_parses_lines_in_order() {
        let raw = r#"[{"speaker": "A", "text": "first"}, {"speaker": "B", "text": "second"}]"#;
        let lines = parse_debate_script(raw);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].speaker, "A");
        assert_eq!(lines[1].text, "second");
    }

    #[test]
    fn malformed_debate_script_is_empty() {
        assert!(parse_debate_script("the model rambled instead").is_empty());
        assert!(parse_debate_script(r#"{"speaker": "not an array"}"#).is_empty());
    }

    #[test]
    fn post_prompt_carries_persona_and_source() {
        let p = persona(PersonaRole::Expert);
        let item = NewsItem {
            title: "Trade deadline shock".to_string(),
            url: "https://example.com/a".to_string(),
            summary: "A blockbuster trade".to_string(),
            source: "Wire".to_string(),
        };
        let prompt = post_prompt(&p, "the trade", Some(&item));
        assert!(prompt.contains("StatHead"));
        assert!(prompt.contains("data nerd"));
        assert!(prompt.contains("Trade deadline shock"));
        assert!(prompt.contains("expert"));
    }

    #[test]
    fn comment_prompt_lists_prior_comments() {
        let p = persona(PersonaRole::Troll);
        let prior = vec!["first!".to_string(), "agreed".to_string()];
        let prompt = comment_prompt(&p, "title", "body", &prior);
        assert!(prompt.contains("1. first!"));
        assert!(prompt.contains("2. agreed"));
    }
}
