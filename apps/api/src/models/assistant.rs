use serde::{Deserialize, Serialize};

/// An analysis model the backend can run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiModel {
    pub id: String,
    pub name: String,
    pub provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    pub models: Vec<AiModel>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Follow-up question about the analysed candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(rename = "modelId")]
    pub model_id: String,
    #[serde(
        rename = "chatHistory",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub chat_history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(rename = "modelId")]
    pub model_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_wire_names() {
        let req = ChatRequest {
            message: "¿Quién tiene más experiencia?".to_string(),
            model_id: "gpt-4".to_string(),
            chat_history: vec![ChatTurn {
                role: ChatRole::Assistant,
                content: "Hola".to_string(),
            }],
        };
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["modelId"], "gpt-4");
        assert_eq!(body["chatHistory"][0]["role"], "assistant");

        let bare: ChatRequest =
            serde_json::from_value(json!({"message": "hola", "modelId": "gpt-4"})).unwrap();
        assert!(bare.chat_history.is_empty());
        assert!(serde_json::to_value(&bare).unwrap().get("chatHistory").is_none());
    }
}
