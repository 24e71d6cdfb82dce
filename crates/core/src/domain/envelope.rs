use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Substituted whenever every stage fails to produce answer text.
pub const DEFAULT_ANSWER: &str =
    "Sorry, I couldn't find an answer to that. Please rephrase or ask to speak to a human agent.";

/// The only value handed back to the transport layer. Field names on the
/// wire are fixed: `question`, `answer`, `detected_or_target_language`,
/// `handoff`, `structured_payload` (null when there is no record).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub question: String,
    pub answer: String,
    #[serde(rename = "detected_or_target_language")]
    pub language: String,
    pub handoff: bool,
    #[serde(rename = "structured_payload", default)]
    pub payload: Option<Value>,
}

impl ResponseEnvelope {
    /// Builds an envelope, replacing a blank answer with [`DEFAULT_ANSWER`].
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        let answer = answer.into();
        let answer =
            if answer.trim().is_empty() { DEFAULT_ANSWER.to_string() } else { answer };
        Self {
            question: question.into(),
            answer,
            language: language.into(),
            handoff: false,
            payload: None,
        }
    }

    pub fn with_handoff(mut self, handoff: bool) -> Self {
        self.handoff = handoff;
        self
    }

    pub fn with_payload(mut self, payload: Option<Value>) -> Self {
        self.payload = payload;
        self
    }

    /// Replaces the answer text, keeping the non-empty invariant.
    pub fn set_answer(&mut self, answer: String) {
        if !answer.trim().is_empty() {
            self.answer = answer;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ResponseEnvelope, DEFAULT_ANSWER};

    #[test]
    fn blank_answers_are_replaced_with_default() {
        let envelope = ResponseEnvelope::new("hm?", "   ", "en");
        assert_eq!(envelope.answer, DEFAULT_ANSWER);
        assert!(!envelope.handoff);
    }

    #[test]
    fn set_answer_ignores_blank_text() {
        let mut envelope = ResponseEnvelope::new("hi", "Hello!", "en");
        envelope.set_answer(String::new());
        assert_eq!(envelope.answer, "Hello!");
    }

    #[test]
    fn wire_keys_are_fixed() {
        let envelope = ResponseEnvelope::new("Where is SH124?", "Order SH124: Processing.", "en")
            .with_payload(Some(serde_json::json!({ "id": "SH124" })));
        let json = serde_json::to_value(&envelope).expect("serialize envelope");

        let mut keys = json.as_object().expect("object").keys().cloned().collect::<Vec<_>>();
        keys.sort();
        assert_eq!(
            keys,
            vec!["answer", "detected_or_target_language", "handoff", "question", "structured_payload"]
        );
        assert_eq!(json["detected_or_target_language"], "en");
        assert_eq!(json["structured_payload"]["id"], "SH124");
    }

    #[test]
    fn absent_payload_is_null_on_the_wire() {
        let envelope = ResponseEnvelope::new("hi", "Hello!", "en");
        let json = serde_json::to_value(&envelope).expect("serialize envelope");
        assert!(json["structured_payload"].is_null());
        assert_eq!(json["handoff"], false);

        let decoded: ResponseEnvelope = serde_json::from_str(
            r#"{"question":"hi","answer":"Hello!","detected_or_target_language":"en","handoff":false}"#,
        )
        .expect("decode envelope");
        assert_eq!(decoded, envelope);
    }
}
