//! Transformers for OpenAI-compatible providers
//!
//! Canonical contents become chat messages: text stays text, inline data
//! becomes an `image_url` data URI, function calls become assistant
//! `tool_calls` and function responses become `tool` messages.

use crate::error::LlmError;
use crate::types::{
    Candidate, Content, FinishReason, FunctionCall, GenerateContentRequest,
    GenerateContentResponse, MessageRole, Part, Role, Tool, UsageMetadata,
};

use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ContentPart, FunctionCallWire,
    FunctionDefinition, ImageUrl, MessageContent, OpenAiMessage, OpenAiTool, OpenAiUsage,
    ToolCall,
};

/// Build the chat completions body. `strip_tools` drops every tool declaration.
pub fn transform_chat(
    request: &GenerateContentRequest,
    model: &str,
    stream: bool,
    strip_tools: bool,
) -> ChatCompletionRequest {
    let mut messages = Vec::with_capacity(request.contents.len() + 1);
    if let Some(system) = &request.system_instruction {
        messages.push(OpenAiMessage::text(MessageRole::System.as_str(), system.text()));
    }
    for content in &request.contents {
        convert_content(content, &mut messages);
    }

    let tools = if strip_tools {
        None
    } else {
        request.tools.as_deref().and_then(convert_tools)
    };

    ChatCompletionRequest {
        model: model.to_string(),
        messages,
        stream,
        temperature: request.config.temperature,
        top_p: request.config.top_p,
        max_tokens: request.config.max_output_tokens,
        tools,
    }
}

fn convert_tools(tools: &[Tool]) -> Option<Vec<OpenAiTool>> {
    let converted: Vec<_> = tools
        .iter()
        .flat_map(|t| t.function_declarations.iter())
        .map(|f| OpenAiTool {
            r#type: "function".to_string(),
            function: FunctionDefinition {
                name: f.name.clone(),
                description: f.description.clone(),
                parameters: f.parameters.clone(),
            },
        })
        .collect();
    (!converted.is_empty()).then_some(converted)
}

/// Append the messages for one content item.
fn convert_content(content: &Content, out: &mut Vec<OpenAiMessage>) {
    let role = MessageRole::from(content.role).as_str();

    // tool results answer earlier calls, so they go first
    for response in content.parts.iter().filter_map(|p| p.function_response.as_ref()) {
        out.push(OpenAiMessage {
            role: "tool".to_string(),
            content: Some(MessageContent::Text(response.response.to_string())),
            tool_calls: None,
            tool_call_id: Some(response.id.clone().unwrap_or_else(|| response.name.clone())),
        });
    }

    let tool_calls: Vec<ToolCall> = content
        .parts
        .iter()
        .filter_map(|p| p.function_call.as_ref())
        .map(|call| ToolCall {
            id: call.id.clone().unwrap_or_else(|| call.name.clone()),
            r#type: "function".to_string(),
            function: FunctionCallWire {
                name: call.name.clone(),
                arguments: call.args.to_string(),
            },
        })
        .collect();

    let has_text = content.parts.iter().any(|p| p.text.is_some());
    let has_images = content.parts.iter().any(|p| p.inline_data.is_some());
    if !has_text && !has_images && tool_calls.is_empty() {
        return;
    }

    let body = if has_images {
        let parts = content
            .parts
            .iter()
            .filter_map(|p| match (&p.text, &p.inline_data) {
                (Some(text), _) => Some(ContentPart::Text { text: text.clone() }),
                (None, Some(blob)) => Some(ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:{};base64,{}", blob.mime_type, blob.data),
                    },
                }),
                _ => None,
            })
            .collect();
        Some(MessageContent::Parts(parts))
    } else if has_text {
        Some(MessageContent::Text(content.text()))
    } else {
        None
    };

    out.push(OpenAiMessage {
        role: role.to_string(),
        content: body,
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        tool_call_id: None,
    });
}

/// `stop`/`tool_calls` → STOP, `length` → MAX_TOKENS, anything else → OTHER.
pub fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" | "tool_calls" | "function_call" => FinishReason::Stop,
        "length" => FinishReason::MaxTokens,
        _ => FinishReason::Other,
    }
}

/// Arguments that are not valid JSON are kept as a JSON string.
pub fn parse_arguments(arguments: &str) -> serde_json::Value {
    if arguments.trim().is_empty() {
        return serde_json::Value::Object(Default::default());
    }
    serde_json::from_str(arguments)
        .unwrap_or_else(|_| serde_json::Value::String(arguments.to_string()))
}

pub fn convert_usage(usage: &OpenAiUsage) -> Option<UsageMetadata> {
    let mut out = UsageMetadata::from_counts(usage.prompt_tokens, usage.completion_tokens)?;
    if usage.total_tokens.is_some() {
        out.total_token_count = usage.total_tokens;
    }
    Some(out)
}

/// Normalize a non-streaming response.
///
/// A choice without `finish_reason` is reported as `MAX_TOKENS`.
pub fn transform_response(
    response: ChatCompletionResponse,
) -> Result<GenerateContentResponse, LlmError> {
    if response.choices.is_empty() {
        return Err(LlmError::ParseError(
            "chat completion response has no choices".to_string(),
        ));
    }
    let candidates = response
        .choices
        .into_iter()
        .map(|choice| {
            let mut parts = Vec::new();
            if let Some(text) = choice.message.content {
                parts.push(Part::text(text));
            }
            for call in choice.message.tool_calls.unwrap_or_default() {
                parts.push(Part::function_call(FunctionCall {
                    id: Some(call.id),
                    name: call.function.name,
                    args: parse_arguments(&call.function.arguments),
                }));
            }
            Candidate {
                content: Content::new(Role::Model, parts),
                finish_reason: Some(
                    choice
                        .finish_reason
                        .as_deref()
                        .map_or(FinishReason::MaxTokens, map_finish_reason),
                ),
                index: choice.index,
                safety_ratings: Vec::new(),
            }
        })
        .collect();

    Ok(GenerateContentResponse {
        candidates,
        prompt_feedback: Some(Default::default()),
        usage_metadata: response.usage.as_ref().and_then(convert_usage),
        model_version: response.model,
        response_id: response.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FunctionDeclaration, FunctionResponse};
    use serde_json::json;

    fn weather_tool() -> Tool {
        Tool::functions(vec![FunctionDeclaration {
            name: "get_weather".into(),
            description: Some("Look up the weather".into()),
            parameters: Some(json!({"type": "object"})),
        }])
    }

    #[test]
    fn passes_tools_through_unless_stripped() {
        let req = GenerateContentRequest::new("m", vec![Content::user("hi")])
            .with_tools(vec![weather_tool()]);

        let kept = transform_chat(&req, "m", false, false);
        let tools = kept.tools.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].function.name, "get_weather");
        assert_eq!(tools[0].function.parameters, Some(json!({"type": "object"})));

        let stripped = transform_chat(&req, "m", false, true);
        assert!(stripped.tools.is_none());
        let body = serde_json::to_value(&stripped).unwrap();
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn sampling_parameters_pass_through_unchanged() {
        let req = GenerateContentRequest::new("m", vec![Content::user("hi")]).with_config(
            crate::types::GenerationConfig::default()
                .with_temperature(0.2)
                .with_max_output_tokens(64),
        );
        let body = serde_json::to_value(transform_chat(&req, "gpt", true, false)).unwrap();
        assert_eq!(body["model"], "gpt");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 64);
        assert!(body.get("top_p").is_none());
        assert_eq!(body["messages"][0], json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn converts_images_calls_and_results() {
        let call = FunctionCall {
            id: Some("call_1".into()),
            name: "get_weather".into(),
            args: json!({"city": "Paris"}),
        };
        let req = GenerateContentRequest::new(
            "m",
            vec![
                Content::new(
                    Role::User,
                    vec![Part::text("what is this"), Part::inline_data("image/png", "AAAA")],
                ),
                Content::new(Role::Model, vec![Part::function_call(call)]),
                Content::new(
                    Role::User,
                    vec![Part::function_response(FunctionResponse {
                        id: Some("call_1".into()),
                        name: "get_weather".into(),
                        response: json!({"temp": 21}),
                    })],
                ),
            ],
        )
        .with_system_instruction(Content::system("be brief"));

        let body = serde_json::to_value(transform_chat(&req, "m", false, false)).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], json!({"role": "system", "content": "be brief"}));
        assert_eq!(
            messages[1]["content"][1],
            json!({"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}})
        );
        assert_eq!(messages[2]["role"], "assistant");
        assert!(messages[2].get("content").is_none());
        assert_eq!(messages[2]["tool_calls"][0]["function"]["arguments"], "{\"city\":\"Paris\"}");
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "call_1");
        assert_eq!(messages[3]["content"], "{\"temp\":21}");
    }

    #[test]
    fn finish_reason_mapping() {
        assert_eq!(map_finish_reason("stop"), FinishReason::Stop);
        assert_eq!(map_finish_reason("tool_calls"), FinishReason::Stop);
        assert_eq!(map_finish_reason("length"), FinishReason::MaxTokens);
        assert_eq!(map_finish_reason("content_filter"), FinishReason::Other);
    }

    #[test]
    fn normalizes_response_with_tool_calls_and_usage() {
        let raw: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "get_weather", "arguments": "{\"city\":\"Paris\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))
        .unwrap();
        let resp = transform_response(raw).unwrap();
        assert_eq!(resp.finish_reason(), Some(FinishReason::Stop));
        let calls = resp.function_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, json!({"city": "Paris"}));
        assert_eq!(resp.usage_metadata.unwrap().total_token_count, Some(15));
        assert_eq!(resp.response_id.as_deref(), Some("chatcmpl-1"));
    }

    #[test]
    fn missing_finish_reason_falls_back_to_max_tokens() {
        let raw: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "hi"}}]
        }))
        .unwrap();
        let resp = transform_response(raw).unwrap();
        assert_eq!(resp.finish_reason(), Some(FinishReason::MaxTokens));
        assert_eq!(resp.text().as_deref(), Some("hi"));
    }

    #[test]
    fn empty_choices_is_a_parse_error() {
        let raw: ChatCompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(transform_response(raw), Err(LlmError::ParseError(_))));
    }
}
