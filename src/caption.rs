//! Caption generation: goal-specific prompt assembly and a single completion call.

use std::sync::Arc;

use crate::llm_client::{CompletionRequest, CompletionService, LlmError};
use crate::models::{CaptionResult, GenerateRequest};

pub const MODEL: &str = "llama-3.1-8b-instant";
pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 200;

#[derive(Debug, thiserror::Error)]
pub enum CaptionError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Failed to generate caption: {0}")]
    Generation(#[from] LlmError),
}

/// What the caption should try to achieve. Steers tone only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Goal {
    Sell,
    #[default]
    Consistency,
    Event,
    Educate,
}

impl Goal {
    pub const ALL: [Goal; 4] = [Goal::Sell, Goal::Consistency, Goal::Event, Goal::Educate];

    pub fn key(self) -> &'static str {
        match self {
            Goal::Sell => "sell",
            Goal::Consistency => "consistency",
            Goal::Event => "event",
            Goal::Educate => "educate",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Goal::Sell => "Focus on the value proposition and benefits. Create urgency and desire.",
            Goal::Consistency => "Keep it engaging but professional. Maintain brand voice.",
            Goal::Event => "Highlight key details like date, time, and what makes it special.",
            Goal::Educate => "Make it informative but accessible. Share useful insights.",
        }
    }

    /// Missing or unrecognized keys resolve to [`Goal::Consistency`].
    pub fn resolve(input: Option<&str>) -> Self {
        input
            .and_then(|key| Self::ALL.into_iter().find(|g| g.key() == key))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CaptionRequest {
    pub title: String,
    pub description: String,
    pub goal: Goal,
}

impl From<GenerateRequest> for CaptionRequest {
    fn from(req: GenerateRequest) -> Self {
        Self {
            goal: Goal::resolve(req.goal.as_deref()),
            title: req.title.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
        }
    }
}

pub fn build_prompt(title: &str, description: &str, goal: Goal) -> String {
    format!(
        "Write a natural, human-sounding social media caption for this content:

Title: {title}
Description: {description}
Goal: {instruction}

Style guidelines:
- Write like a busy business owner, not AI
- Keep it conversational and slightly imperfect
- Avoid clichés like \"stunning\", \"amazing\", \"beautiful\"
- Use short, varied sentences
- Maximum 1 emoji, placed naturally
- Be specific, not generic
- Keep under 150 words
- Don't mention the website URL

Caption:",
        instruction = goal.instruction(),
    )
}

/// Turns page metadata into caption text via an injected completion service.
#[derive(Clone)]
pub struct Captioner {
    service: Arc<dyn CompletionService>,
}

impl Captioner {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    pub async fn caption(&self, request: &CaptionRequest) -> Result<CaptionResult, CaptionError> {
        if request.title.is_empty() && request.description.is_empty() {
            return Err(CaptionError::InvalidInput(
                "Title or description is required".to_string(),
            ));
        }

        let completion = CompletionRequest {
            model: MODEL.to_string(),
            prompt: build_prompt(&request.title, &request.description, request.goal),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        tracing::debug!(goal = request.goal.key(), "requesting caption");
        let text = self.service.complete(&completion).await?;

        // Length and emoji limits are prompt guidance only; output is not checked.
        Ok(CaptionResult {
            caption: text.map(|t| t.trim().to_string()).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<CompletionRequest>>,
        reply: Option<String>,
        fail: bool,
    }

    #[async_trait]
    impl CompletionService for Recorder {
        async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, LlmError> {
            self.seen.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(LlmError::Api {
                    status: 429,
                    message: "rate limited".to_string(),
                });
            }
            Ok(self.reply.clone())
        }
    }

    fn captioner(recorder: Arc<Recorder>) -> Captioner {
        Captioner::new(recorder)
    }

    fn request(goal: Goal) -> CaptionRequest {
        CaptionRequest {
            title: "Fresh Pasta".to_string(),
            description: "Handmade daily".to_string(),
            goal,
        }
    }

    #[test]
    fn goal_resolution_defaults_to_consistency() {
        assert_eq!(Goal::resolve(Some("sell")), Goal::Sell);
        assert_eq!(Goal::resolve(Some("event")), Goal::Event);
        assert_eq!(Goal::resolve(Some("educate")), Goal::Educate);
        assert_eq!(Goal::resolve(Some("consistency")), Goal::Consistency);
        assert_eq!(Goal::resolve(None), Goal::Consistency);
        assert_eq!(Goal::resolve(Some("")), Goal::Consistency);
        assert_eq!(Goal::resolve(Some("SELL")), Goal::Consistency);
        assert_eq!(Goal::resolve(Some("viral")), Goal::Consistency);
    }

    #[test]
    fn prompt_embeds_fields_and_instruction() {
        let prompt = build_prompt("Fresh Pasta", "Handmade daily", Goal::Event);
        assert!(prompt.contains("Title: Fresh Pasta\n"));
        assert!(prompt.contains("Description: Handmade daily\n"));
        assert!(prompt.contains(&format!("Goal: {}\n", Goal::Event.instruction())));
        assert!(prompt.contains("- Keep under 150 words"));
        assert!(prompt.contains("- Maximum 1 emoji, placed naturally"));
        assert!(prompt.ends_with("Caption:"));
    }

    #[tokio::test]
    async fn caption_sends_fixed_generation_settings() {
        let recorder = Arc::new(Recorder {
            reply: Some("  Come hungry.  \n".to_string()),
            ..Default::default()
        });
        let result = captioner(recorder.clone())
            .caption(&request(Goal::Sell))
            .await
            .unwrap();
        assert_eq!(result.caption, "Come hungry.");

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, MODEL);
        assert_eq!(seen[0].temperature, TEMPERATURE);
        assert_eq!(seen[0].max_tokens, MAX_TOKENS);
        assert!(seen[0].prompt.contains(Goal::Sell.instruction()));
    }

    #[tokio::test]
    async fn unrecognized_goal_prompts_with_consistency() {
        let recorder = Arc::new(Recorder {
            reply: Some("ok".to_string()),
            ..Default::default()
        });
        let req = CaptionRequest::from(GenerateRequest {
            title: Some("Fresh Pasta".to_string()),
            description: None,
            goal: Some("go-viral".to_string()),
        });
        captioner(recorder.clone()).caption(&req).await.unwrap();

        let seen = recorder.seen.lock().unwrap();
        assert!(seen[0].prompt.contains(Goal::Consistency.instruction()));
    }

    #[tokio::test]
    async fn empty_title_and_description_rejected_without_call() {
        let recorder = Arc::new(Recorder::default());
        let req = CaptionRequest {
            title: String::new(),
            description: String::new(),
            goal: Goal::Sell,
        };
        let err = captioner(recorder.clone()).caption(&req).await.unwrap_err();
        assert!(matches!(err, CaptionError::InvalidInput(_)));
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn whitespace_title_counts_as_present() {
        let recorder = Arc::new(Recorder {
            reply: Some("ok".to_string()),
            ..Default::default()
        });
        let req = CaptionRequest {
            title: "   ".to_string(),
            description: String::new(),
            goal: Goal::Consistency,
        };
        captioner(recorder.clone()).caption(&req).await.unwrap();
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_content_yields_empty_caption() {
        let recorder = Arc::new(Recorder::default());
        let result = captioner(recorder).caption(&request(Goal::Educate)).await.unwrap();
        assert_eq!(result.caption, "");
    }

    #[tokio::test]
    async fn service_failure_becomes_generation_error() {
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let err = captioner(recorder).caption(&request(Goal::Sell)).await.unwrap_err();
        assert!(matches!(err, CaptionError::Generation(_)));
        assert!(err.to_string().contains("rate limited"));
    }
}
