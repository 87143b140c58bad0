//! Gemini request/response conversion

use crate::types::{
    Content, FinishReason, GenerateContentRequest, GenerateContentResponse, Part, Role,
};

use super::types::GeminiGenerateRequest;

/// Build the generate body.
///
/// `system`-role turns found in `contents` are folded into the system
/// instruction, since the API only accepts `user` and `model` there.
pub fn build_generate_request(request: &GenerateContentRequest) -> GeminiGenerateRequest {
    let (system_turns, contents): (Vec<&Content>, Vec<&Content>) = request
        .contents
        .iter()
        .partition(|c| c.role == Role::System);

    let mut system_parts: Vec<Part> = request
        .system_instruction
        .iter()
        .chain(system_turns)
        .flat_map(|c| c.parts.iter().cloned())
        .collect();
    system_parts.retain(|p| p.text.as_deref().is_some_and(|t| !t.is_empty()));
    let system_instruction =
        (!system_parts.is_empty()).then(|| Content::new(Role::User, system_parts));

    let config = &request.config;
    let generation_config = (config.temperature.is_some()
        || config.top_p.is_some()
        || config.top_k.is_some()
        || config.max_output_tokens.is_some())
    .then(|| config.clone());

    GeminiGenerateRequest {
        contents: contents.into_iter().cloned().collect(),
        system_instruction,
        generation_config,
        tools: request.tools.clone().filter(|t| !t.is_empty()),
    }
}

/// Fill the gaps a Gemini response may leave.
///
/// `complete` marks a single-shot response: a candidate without a finish
/// reason is then reported as `MAX_TOKENS`. Stream increments keep `None`.
pub fn normalize_response(
    mut response: GenerateContentResponse,
    complete: bool,
) -> GenerateContentResponse {
    if response.prompt_feedback.is_none() {
        response.prompt_feedback = Some(Default::default());
    }
    for candidate in &mut response.candidates {
        candidate.content.role = Role::Model;
        if complete && candidate.finish_reason.is_none() {
            candidate.finish_reason = Some(FinishReason::MaxTokens);
        }
    }
    response
}

/// Model id as it appears in a URL path: without any `models/` prefix, percent-encoded.
pub fn model_path_segment(model: &str) -> String {
    let model = model.strip_prefix("models/").unwrap_or(model);
    urlencoding::encode(model).into_owned()
}
