//! OpenAI Compatible Streaming Implementation
//!
//! Converts `chat.completion.chunk` SSE payloads into canonical increments.
//! Text deltas are yielded as they arrive. Tool-call fragments are
//! accumulated per choice and call index; they are emitted as function-call
//! parts together with the finish reason. The finishing increment is held
//! until the stream ends so a trailing usage-only chunk can be attached.

use std::collections::BTreeMap;

use crate::streaming::SseFrameConverter;
use crate::types::{
    Candidate, Content, FunctionCall, GenerateContentResponse, Part, PartialResponse, Role,
    UsageMetadata,
};

use super::transformers::{convert_usage, map_finish_reason, parse_arguments};
use super::types::{ChatCompletionChunk, ToolCallDelta};

#[derive(Debug, Default)]
struct PendingToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// Per-stream conversion state.
#[derive(Debug, Default)]
pub struct OpenAiStreamConverter {
    /// keyed by (choice index, tool call index)
    tool_calls: BTreeMap<(u32, u32), PendingToolCall>,
    finished: Vec<Candidate>,
    usage: Option<UsageMetadata>,
    model: Option<String>,
    response_id: Option<String>,
}

impl OpenAiStreamConverter {
    pub fn new() -> Self {
        Self::default()
    }

    fn accumulate(&mut self, choice: u32, deltas: Vec<ToolCallDelta>) {
        for delta in deltas {
            let pending = self.tool_calls.entry((choice, delta.index)).or_default();
            if let Some(id) = delta.id {
                pending.id = Some(id);
            }
            if let Some(function) = delta.function {
                if let Some(name) = function.name {
                    pending.name.push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    pending.arguments.push_str(&arguments);
                }
            }
        }
    }

    fn drain_tool_calls(&mut self, choice: u32) -> Vec<Part> {
        let keys: Vec<_> = self
            .tool_calls
            .range((choice, 0)..=(choice, u32::MAX))
            .map(|(k, _)| *k)
            .collect();
        keys.into_iter()
            .filter_map(|k| self.tool_calls.remove(&k))
            .map(|call| {
                Part::function_call(FunctionCall {
                    id: call.id,
                    args: parse_arguments(&call.arguments),
                    name: call.name,
                })
            })
            .collect()
    }

    fn increment(&self, candidates: Vec<Candidate>) -> PartialResponse {
        GenerateContentResponse {
            candidates,
            prompt_feedback: Some(Default::default()),
            usage_metadata: None,
            model_version: self.model.clone(),
            response_id: self.response_id.clone(),
        }
    }
}

impl SseFrameConverter for OpenAiStreamConverter {
    type Frame = ChatCompletionChunk;

    fn convert(&mut self, chunk: ChatCompletionChunk) -> Vec<PartialResponse> {
        if chunk.model.is_some() {
            self.model = chunk.model;
        }
        if chunk.id.is_some() {
            self.response_id = chunk.id;
        }
        if let Some(usage) = chunk.usage.as_ref().and_then(convert_usage) {
            self.usage = Some(usage);
        }

        let mut candidates = Vec::new();
        for choice in chunk.choices {
            if let Some(deltas) = choice.delta.tool_calls {
                self.accumulate(choice.index, deltas);
            }
            let text = choice.delta.content.filter(|t| !t.is_empty());

            match choice.finish_reason {
                Some(reason) => {
                    let mut parts: Vec<Part> = text.into_iter().map(Part::text).collect();
                    parts.extend(self.drain_tool_calls(choice.index));
                    self.finished.push(Candidate {
                        content: Content::new(Role::Model, parts),
                        finish_reason: Some(map_finish_reason(&reason)),
                        index: choice.index,
                        safety_ratings: Vec::new(),
                    });
                }
                None => {
                    if let Some(text) = text {
                        let mut candidate = Candidate::model_text(text, None);
                        candidate.index = choice.index;
                        candidates.push(candidate);
                    }
                }
            }
        }

        if candidates.is_empty() {
            Vec::new()
        } else {
            vec![self.increment(candidates)]
        }
    }

    fn handle_stream_end(&mut self) -> Vec<PartialResponse> {
        let mut candidates = std::mem::take(&mut self.finished);
        if !self.tool_calls.is_empty() {
            // no finish reason arrived for these choices; surface the calls anyway
            let choices: Vec<u32> = self.tool_calls.keys().map(|(c, _)| *c).collect();
            for choice in choices {
                let parts = self.drain_tool_calls(choice);
                if !parts.is_empty() {
                    candidates.push(Candidate {
                        content: Content::new(Role::Model, parts),
                        finish_reason: None,
                        index: choice,
                        safety_ratings: Vec::new(),
                    });
                }
            }
        }
        if candidates.is_empty() {
            return Vec::new();
        }
        let mut last = self.increment(candidates);
        last.usage_metadata = self.usage.take();
        vec![last]
    }
}
