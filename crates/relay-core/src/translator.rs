use crate::types::{ChatRole, ChatTurn, OutboundChatPayload};

/// Build the upstream chat request for one prompt.
///
/// The message list is always: one system turn (emitted even when
/// `system_prompt` is empty, the engine expects it in first position), every
/// `history` turn in its original order, then a user turn holding `prompt`.
pub fn build_payload(
    prompt: &str,
    history: &[ChatTurn],
    system_prompt: &str,
    model: &str,
) -> OutboundChatPayload {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatTurn::new(ChatRole::System, system_prompt));
    messages.extend_from_slice(history);
    messages.push(ChatTurn::new(ChatRole::User, prompt));

    OutboundChatPayload {
        model: model.to_owned(),
        messages,
        stream: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_yields_system_then_user() {
        let p = build_payload("hello", &[], "be nice", "qwen2:1.5b");
        assert_eq!(p.messages.len(), 2);
        assert_eq!(p.messages[0], ChatTurn::new(ChatRole::System, "be nice"));
        assert_eq!(p.messages[1], ChatTurn::new(ChatRole::User, "hello"));
        assert_eq!(p.model, "qwen2:1.5b");
        assert!(p.stream);
    }

    #[test]
    fn history_is_kept_in_order_between_system_and_prompt() {
        let history: Vec<ChatTurn> = (0..5)
            .map(|i| {
                let role = if i % 2 == 0 { ChatRole::User } else { ChatRole::Assistant };
                ChatTurn::new(role, format!("turn {i}"))
            })
            .collect();

        let p = build_payload("next", &history, "", "m");

        assert_eq!(p.messages.len(), history.len() + 2);
        assert_eq!(p.messages[0].role, ChatRole::System);
        assert_eq!(&p.messages[1..=history.len()], history.as_slice());
        assert_eq!(p.messages.last(), Some(&ChatTurn::new(ChatRole::User, "next")));
    }

    #[test]
    fn empty_system_prompt_is_still_emitted() {
        let p = build_payload("hi", &[], "", "m");
        assert_eq!(p.messages[0], ChatTurn::new(ChatRole::System, ""));
    }

    #[test]
    fn serializes_to_engine_shape() {
        let p = build_payload("hi", &[], "sys", "m");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "m",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ],
                "stream": true
            })
        );
    }
}
