use async_trait::async_trait;

use crate::models::{Intent, Stage};
use crate::services::ai::{LlmProvider, Message};
use crate::services::intent::{keyword_classify, IntentClassifier};

const SYSTEM_PROMPT: &str = r#"You are an intent extraction engine for a salon booking assistant. Classify the customer's message given the current conversation stage.

Return ONLY valid JSON (no markdown, no explanation) in one of these shapes:
{"intent": "greet"}
{"intent": "list_services"}
{"intent": "select_service", "key": "haircut|shaving|beard_trimming|manicure|pedicure|styling"}
{"intent": "select_service_index", "index": 2}
{"intent": "select_slot", "index": 2}
{"intent": "reschedule"}
{"intent": "cancel_booking"}
{"intent": "cancel_session"}
{"intent": "price_inquiry"}
{"intent": "location_inquiry"}
{"intent": "waitlist"}
{"intent": "farewell"}
{"intent": "unknown"}

Rules:
- "select_slot" only applies when the stage is "show_times" and the customer picks one of the offered time slots by number.
- A bare number while the stage is "show_times" is always "select_slot", never "select_service_index".
- A recognized service name is "select_service" regardless of stage.
- "cancel_booking" is about an existing appointment; a plain "no"/"cancel" mid-conversation is "cancel_session".
- A day-and-time phrase like "friday 2pm" while slots are offered is "unknown" (the assistant resolves times itself).
"#;

/// LLM-backed implementation of the classifier contract. Any provider or
/// parse failure falls back to the deterministic keyword rules, so the
/// conversation never depends on the model being up.
pub struct LlmClassifier {
    provider: Box<dyn LlmProvider>,
}

impl LlmClassifier {
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    async fn try_classify(&self, message: &str, stage: &Stage) -> anyhow::Result<Intent> {
        let user = Message {
            role: "user".to_string(),
            content: format!("Stage: {}\nMessage: {}", stage.as_str(), message),
        };
        let response = self.provider.chat(SYSTEM_PROMPT, &[user]).await?;
        parse_intent_response(&response)
    }
}

#[async_trait]
impl IntentClassifier for LlmClassifier {
    async fn classify(&self, message: &str, stage: &Stage) -> Intent {
        match self.try_classify(message, stage).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!(error = %e, "LLM classification failed, using keyword rules");
                keyword_classify(message, stage)
            }
        }
    }
}

fn parse_intent_response(response: &str) -> anyhow::Result<Intent> {
    if let Ok(intent) = serde_json::from_str::<Intent>(response) {
        return Ok(intent);
    }

    // Strip markdown code fences
    let cleaned = response
        .trim()
        .strip_prefix("```json")
        .or_else(|| response.trim().strip_prefix("```"))
        .unwrap_or(response.trim());
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(intent) = serde_json::from_str::<Intent>(cleaned) {
        return Ok(intent);
    }

    // Last resort: find a JSON object somewhere in the response
    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            if let Ok(intent) = serde_json::from_str::<Intent>(&cleaned[start..=end]) {
                return Ok(intent);
            }
        }
    }

    anyhow::bail!("unparseable intent response: {response}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let intent = parse_intent_response(r#"{"intent":"select_slot","index":2}"#).unwrap();
        assert_eq!(intent, Intent::SelectSlot { index: 2 });
    }

    #[test]
    fn test_parse_markdown_fenced_json() {
        let intent =
            parse_intent_response("```json\n{\"intent\":\"cancel_booking\"}\n```").unwrap();
        assert_eq!(intent, Intent::CancelBooking);
    }

    #[test]
    fn test_parse_embedded_json() {
        let intent =
            parse_intent_response("Sure! {\"intent\":\"select_service\",\"key\":\"haircut\"}")
                .unwrap();
        assert_eq!(intent, Intent::SelectService { key: "haircut".to_string() });
    }

    #[test]
    fn test_parse_garbage_is_an_error() {
        assert!(parse_intent_response("I can't help with that").is_err());
    }

    #[tokio::test]
    async fn test_fallback_on_provider_error() {
        struct FailingProvider;

        #[async_trait]
        impl LlmProvider for FailingProvider {
            async fn chat(&self, _system: &str, _messages: &[Message]) -> anyhow::Result<String> {
                anyhow::bail!("model offline")
            }
        }

        let classifier = LlmClassifier::new(Box::new(FailingProvider));
        let intent = classifier.classify("hello", &Stage::Greeting).await;
        assert_eq!(intent, Intent::Greet);
    }
}
