//! Request types for `POST /run-model`.

use relay_core::ChatTurn;
use serde::Deserialize;
use utoipa::ToSchema;

/// One prior turn of the conversation, as documented in the OpenAPI schema.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ChatTurnDoc {
    /// `"system"`, `"user"` or `"assistant"`.
    pub role: String,
    pub content: String,
}

/// Request body for `POST /run-model`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PromptRequest {
    /// The new user message. Must contain something other than whitespace.
    pub prompt: String,
    /// Earlier turns, oldest first. Sent to the model between the system
    /// instruction and `prompt`.
    #[serde(default)]
    #[schema(value_type = Vec<ChatTurnDoc>)]
    pub history: Vec<ChatTurn>,
}

#[cfg(test)]
mod test {
    use super::*;
    use relay_core::ChatRole;

    #[test]
    fn history_is_optional() {
        let req: PromptRequest = serde_json::from_str(r#"{"prompt":"hi"}"#).unwrap();
        assert_eq!(req.prompt, "hi");
        assert!(req.history.is_empty());
    }

    #[test]
    fn history_roles_are_typed() {
        let req: PromptRequest = serde_json::from_str(
            r#"{"prompt":"and now?","history":[{"role":"user","content":"a"},{"role":"assistant","content":"b"}]}"#,
        )
        .unwrap();
        assert_eq!(req.history[0].role, ChatRole::User);
        assert_eq!(req.history[1].role, ChatRole::Assistant);

        let bad: Result<PromptRequest, _> =
            serde_json::from_str(r#"{"prompt":"x","history":[{"role":"robot","content":"a"}]}"#);
        assert!(bad.is_err());
    }
}
