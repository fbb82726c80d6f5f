use anyhow::Result;
use futures::stream::BoxStream;
use futures::TryStreamExt;

use crate::errors::{AgentError, AgentResult};
use crate::files::FileRegistry;
use crate::models::content::Content;
use crate::models::message::{Message, ToolRequest};
use crate::models::tool::Tool;
use crate::prompt_template::{render_system_prompt, PromptStyle};
use crate::providers::base::Provider;
use crate::tools::{ToolArguments, ToolHandler};

/// Where the reply loop currently is
enum LoopState {
    /// The model is being called with the transcript so far
    Invoking,
    /// The last response requested tools; they are answered before the next call
    Dispatching(Vec<ToolRequest>),
    /// The model answered without requesting tools
    Done,
}

/// Failures inside a tool reach the model as one standard execution error
fn execution_error(error: AgentError) -> AgentError {
    match error {
        AgentError::ExecutionError(_) => error,
        other => AgentError::ExecutionError(other.to_string()),
    }
}

/// Outcome of a complete reply
#[derive(Debug, Clone)]
pub struct AgentReply {
    /// The final assistant message
    pub message: Message,
    /// Number of tool rounds that ran before the final message
    pub rounds: usize,
    /// Every message produced during the reply, in order
    pub messages: Vec<Message>,
}

/// Agent integrates a foundational LLM with the validation tools it can call
pub struct Agent {
    provider: Box<dyn Provider>,
    tools: Vec<Box<dyn ToolHandler>>,
    prompt: PromptStyle,
    max_turns: Option<usize>,
}

impl Agent {
    /// Create a new Agent with the specified provider
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self {
            provider,
            tools: Vec::new(),
            prompt: PromptStyle::default(),
            max_turns: None,
        }
    }

    pub fn with_prompt(mut self, prompt: PromptStyle) -> Self {
        self.prompt = prompt;
        self
    }

    /// Cap the number of model calls a single reply may make
    pub fn with_max_turns(mut self, max_turns: Option<usize>) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Add a tool to the agent
    pub fn add_tool(&mut self, tool: Box<dyn ToolHandler>) {
        self.tools.push(tool);
    }

    fn tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|handler| handler.tool().clone()).collect()
    }

    fn get_tool(&self, name: &str) -> Option<&dyn ToolHandler> {
        self.tools
            .iter()
            .find(|handler| handler.name() == name)
            .map(|v| &**v)
    }

    fn get_system_prompt(&self, tools: &[Tool]) -> AgentResult<String> {
        render_system_prompt(self.prompt, tools).map_err(|e| AgentError::Internal(e.to_string()))
    }

    /// Dispatch a single tool call, injecting the registered file when the model left it out
    async fn dispatch_tool_call(
        &self,
        request: &ToolRequest,
        files: &FileRegistry,
    ) -> AgentResult<Vec<Content>> {
        let call = request.tool_call.clone()?;
        let handler = self
            .get_tool(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        let mut arguments = ToolArguments::from_model(call.arguments).map_err(execution_error)?;
        if let Some(file) = files.sole() {
            if !arguments.declares_file() {
                tracing::debug!(tool = %call.name, file = %file.name, "injecting registered file");
                arguments = arguments.with_file(file.base64.clone());
            }
        }

        tracing::info!(tool = %call.name, arguments = ?arguments.declared_keys(), "calling tool");
        let outcome = handler.call(arguments).await.map_err(execution_error)?;
        tracing::info!(tool = %call.name, success = outcome.success, "tool finished");

        Ok(vec![Content::text(outcome.to_json_string())])
    }

    /// Create a stream that yields each message as it's generated by the agent.
    /// This includes both the assistant's responses and the tool results.
    ///
    /// The stream ends after the first assistant message without tool requests, or
    /// with an error if the model cannot be reached.
    pub fn reply<'a>(
        &'a self,
        messages: &[Message],
        files: &'a FileRegistry,
    ) -> BoxStream<'a, Result<Message>> {
        let mut messages = messages.to_vec();

        Box::pin(async_stream::try_stream! {
            let tools = self.tools();
            let system_prompt = self.get_system_prompt(&tools)?;
            let mut turns = 0;
            let mut state = LoopState::Invoking;

            loop {
                state = match state {
                    LoopState::Invoking => {
                        if let Some(limit) = self.max_turns {
                            if turns >= limit {
                                Err::<(), _>(AgentError::TurnLimitExceeded(limit))?;
                            }
                        }
                        turns += 1;

                        tracing::info!(turn = turns, messages = messages.len(), "invoking model");
                        let (response, usage) = self
                            .provider
                            .complete(&system_prompt, &messages, &tools)
                            .await?;
                        tracing::debug!(?usage, "model responded");

                        let requests = response.tool_requests();
                        messages.push(response.clone());
                        yield response;

                        if requests.is_empty() {
                            LoopState::Done
                        } else {
                            LoopState::Dispatching(requests)
                        }
                    }
                    LoopState::Dispatching(requests) => {
                        tracing::info!(calls = requests.len(), "dispatching tool calls");

                        // Calls in one round are independent; results keep the request order
                        let outputs = futures::future::join_all(
                            requests
                                .iter()
                                .map(|request| self.dispatch_tool_call(request, files)),
                        )
                        .await;

                        for (request, output) in requests.iter().zip(outputs.into_iter()) {
                            if let Err(e) = &output {
                                tracing::warn!(id = %request.id, error = %e, "tool call failed");
                            }
                            let result = Message::tool().with_tool_response(request.id.clone(), output);
                            messages.push(result.clone());
                            yield result;
                        }

                        LoopState::Invoking
                    }
                    LoopState::Done => break,
                };
            }
        })
    }

    /// Drive a reply to completion and return its final assistant message
    pub async fn run(&self, messages: &[Message], files: &FileRegistry) -> Result<AgentReply> {
        let mut stream = self.reply(messages, files);
        let mut produced = Vec::new();
        let mut rounds = 0;

        while let Some(message) = stream.try_next().await? {
            if message.has_tool_requests() {
                rounds += 1;
            }
            produced.push(message);
        }

        let message = produced
            .last()
            .cloned()
            .ok_or_else(|| AgentError::Internal("model produced no response".to_string()))?;

        Ok(AgentReply {
            message,
            rounds,
            messages: produced,
        })
    }
}
