use crate::{
    core::{
        agent::Agent,
        memory::AgentMemory,
        steps::AgentStep,
        tool_call::{ToolCall, ToolExecution, ToolOutput},
    },
    error::{AgentError, Result},
    services::{
        openai_client::ChatCompletionRequest,
        tool_call_utils::{extract_function_name, parse_tool_call},
    },
    types::result::{AnswerResult, TokenUsage},
};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::debug;

type PendingCall = std::result::Result<ToolCall, (String, AgentError)>;

/// Where a single question currently is in the request/tool-call exchange
enum TurnState {
    /// Send the conversation and tool declarations to the model
    Request,
    /// Run the tool calls the model asked for, then request again
    ToolExecuting(Vec<PendingCall>),
    /// The model answered without asking for tools
    Final(String),
}

impl Agent {
    pub(crate) async fn answer(
        &self,
        prompt: &str,
        max_tokens: Option<u32>,
    ) -> Result<AnswerResult> {
        let start_time = Instant::now();
        let mut memory = AgentMemory::new(self.system_prompt().map(str::to_owned));
        memory.add_step(AgentStep::Task {
            content: prompt.to_string(),
        });

        let tools = self.function_factory().get_openai_tools();
        let mut tokens: Option<TokenUsage> = None;
        let mut iterations = 0;
        let mut state = TurnState::Request;

        loop {
            state = match state {
                TurnState::Request => {
                    if iterations >= self.max_iterations() {
                        return Err(AgentError::MaxIterations(self.max_iterations()));
                    }
                    iterations += 1;

                    let mut chat_request =
                        ChatCompletionRequest::new(self.model().to_owned(), memory.as_messages())
                            .with_max_tokens(max_tokens);

                    if !tools.is_empty() {
                        chat_request = chat_request
                            .with_tools(tools.clone())
                            .with_tool_choice(json!("auto"));
                    }

                    debug!(iteration = iterations, "requesting completion");
                    let response = self.make_raw_request(&chat_request.into_value()).await?;
                    tokens = TokenUsage::accumulate(tokens, TokenUsage::from_response(&response));

                    let assistant_message = extract_assistant_message(&response)?;
                    let content = assistant_message
                        .get("content")
                        .and_then(|value| value.as_str())
                        .map(str::to_owned);

                    match assistant_message
                        .get("tool_calls")
                        .and_then(|value| value.as_array())
                        .filter(|calls| !calls.is_empty())
                    {
                        Some(raw_calls) => {
                            let pending: Vec<PendingCall> =
                                raw_calls.iter().map(parse_tool_call).collect();
                            let recorded = raw_calls
                                .iter()
                                .zip(&pending)
                                .map(|(raw, call)| match call {
                                    Ok(call) => call.clone(),
                                    Err((id, _)) => ToolCall::new(
                                        id.clone(),
                                        extract_function_name(raw).unwrap_or("unknown"),
                                        Value::Object(Default::default()),
                                    ),
                                })
                                .collect();

                            memory.add_step(AgentStep::Action {
                                content: content.filter(|text| !text.is_empty()),
                                tool_calls: recorded,
                            });
                            TurnState::ToolExecuting(pending)
                        }
                        None => TurnState::Final(content.unwrap_or_default().trim().to_string()),
                    }
                }
                TurnState::ToolExecuting(pending) => {
                    for call in pending {
                        let output = self.execute_tool_call(call).await;
                        debug!(
                            tool = %output.tool_name,
                            duration_ms = ?output.duration_ms,
                            is_error = output.is_error,
                            "tool call finished"
                        );
                        memory.add_step(AgentStep::Observation {
                            tool_call_id: output.tool_call_id,
                            result: output.output,
                            is_error: output.is_error,
                        });
                    }
                    TurnState::Request
                }
                TurnState::Final(answer) => {
                    memory.add_step(AgentStep::FinalAnswer {
                        answer: answer.clone(),
                    });
                    return Ok(AnswerResult {
                        text: answer,
                        elapsed: start_time.elapsed(),
                        steps: memory.into_steps(),
                        tokens,
                        iterations,
                    });
                }
            };
        }
    }

    /// Run one requested tool. Failures become error observations for the model.
    async fn execute_tool_call(&self, call: PendingCall) -> ToolOutput {
        let tool_call = match call {
            Ok(tool_call) => tool_call,
            Err((tool_call_id, error)) => {
                return ToolOutput::error(
                    tool_call_id,
                    "unknown".to_string(),
                    error.to_error_payload(),
                )
            }
        };

        let name = tool_call.name.clone();
        let arguments = tool_call.arguments.clone();
        let execution = ToolExecution::start(tool_call);

        match self
            .function_factory()
            .execute_function(&name, arguments)
            .await
        {
            Ok(Value::String(text)) => execution.complete(text),
            Ok(other) => execution.complete(other.to_string()),
            Err(error) => execution.complete_with_error(&error),
        }
    }
}

fn extract_assistant_message(response: &Value) -> Result<&Value> {
    let choices = response
        .get("choices")
        .and_then(|value| value.as_array())
        .ok_or_else(|| {
            AgentError::InvalidResponse(
                "Missing 'choices' array in completion response".to_string(),
            )
        })?;

    let first_choice = choices.first().ok_or_else(|| {
        AgentError::InvalidResponse("Completion response contained no choices".to_string())
    })?;

    first_choice.get("message").ok_or_else(|| {
        AgentError::InvalidResponse("Completion response missing assistant message".to_string())
    })
}
