//! End-to-end dialogue tests wiring the registry, orchestrator, deterministic
//! tools, and the chat tool over a scripted LLM backend.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use augent_agent::{AgentService, ToolOrchestrator, ToolRegistry};
use augent_core::agent::AgentRequest;
use augent_core::llm::{LlmResponse, LlmService};
use augent_core::tool::Tool;
use augent_tools::{CalculatorTool, ChatTool, SearchTool, WeatherTool};

struct ScriptedLlm {
    responses: Mutex<Vec<LlmResponse>>,
    prompts: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedLlm {
    fn new(mut responses: Vec<LlmResponse>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn generate(
        &self,
        query: &str,
        _context: Option<&str>,
        system_prompt: Option<&str>,
    ) -> LlmResponse {
        self.prompts
            .lock()
            .unwrap()
            .push((query.to_string(), system_prompt.map(String::from)));
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| LlmResponse::failure("script exhausted"))
    }
}

/// Build the full stack: deterministic tools + chat over a scripted backend.
fn build_service(llm: Arc<ScriptedLlm>) -> AgentService {
    let deterministic: Vec<Arc<dyn Tool>> = vec![
        Arc::new(CalculatorTool),
        Arc::new(WeatherTool),
        Arc::new(SearchTool),
    ];

    // The orchestrator the chat tool dispatches through sees only the
    // deterministic tools, so the denylist has nothing to hide here.
    let inner_registry = Arc::new(ToolRegistry::new(deterministic.clone()));
    let orchestrator = Arc::new(ToolOrchestrator::new(inner_registry));
    let chat: Arc<dyn Tool> = Arc::new(ChatTool::new(llm, orchestrator));

    let mut tools = deterministic;
    tools.push(chat);
    AgentService::new(Arc::new(ToolRegistry::new(tools)))
}

#[tokio::test]
async fn calculator_query_routes_past_chat() {
    let llm = Arc::new(ScriptedLlm::new(vec![]));
    let service = build_service(llm.clone());

    let response = service
        .process(AgentRequest::new("calculate (2 + 3) * 4"))
        .await;

    assert!(response.success);
    assert_eq!(response.tool_used, "calculator");
    assert!(response.response.contains("20"));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn weather_query_routes_to_weather_tool() {
    let llm = Arc::new(ScriptedLlm::new(vec![]));
    let service = build_service(llm);

    let response = service
        .process(AgentRequest::new("what's the weather in Oslo"))
        .await;

    assert!(response.success);
    assert_eq!(response.tool_used, "weather");
    assert!(response.response.contains("Oslo"));
}

#[tokio::test]
async fn general_query_falls_through_to_chat() {
    let llm = Arc::new(ScriptedLlm::new(vec![LlmResponse::ok(
        "Lifetimes tie borrows to scopes.",
        15,
    )]));
    let service = build_service(llm.clone());

    let response = service
        .process(AgentRequest::new("tell me about lifetimes please"))
        .await;

    assert!(response.success);
    assert_eq!(response.tool_used, "chat");
    assert_eq!(response.response, "Lifetimes tie borrows to scopes.");
    assert_eq!(llm.call_count(), 1);

    // The system prompt advertised the deterministic tools.
    let prompts = llm.prompts.lock().unwrap();
    let system = prompts[0].1.as_deref().unwrap();
    assert!(system.contains("- calculator:"));
    assert!(system.contains("- weather:"));
    assert!(!system.contains("- chat:"));
}

#[tokio::test]
async fn tagged_tool_request_is_executed_and_answer_cleaned() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        LlmResponse::ok(
            "Let me calculate that.\n<tool name=\"calculator\">\n(2 + 3) * 4\n</tool>",
            25,
        ),
        LlmResponse::ok("The answer is 20.", 8),
    ]));
    let service = build_service(llm.clone());

    let response = service
        .process(AgentRequest::new(
            "tell me the total of two plus three, all times four",
        ))
        .await;

    assert!(response.success);
    assert_eq!(response.tool_used, "chat");
    assert_eq!(response.response, "The answer is 20.");
    assert!(!response.response.contains("<tool"));
    assert_eq!(response.data["used_tools"], true);
    assert_eq!(llm.call_count(), 2);

    // The second prompt carried the real calculator output.
    let prompts = llm.prompts.lock().unwrap();
    assert!(prompts[1].0.contains("The result is: 20"));
}

#[tokio::test]
async fn trivial_greeting_never_touches_the_backend() {
    let llm = Arc::new(ScriptedLlm::new(vec![]));
    let service = build_service(llm.clone());

    let response = service.process(AgentRequest::new("hello")).await;

    assert!(response.success);
    assert_eq!(response.tool_used, "chat");
    assert!(response.response.contains("Hello"));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn empty_query_is_rejected() {
    let llm = Arc::new(ScriptedLlm::new(vec![]));
    let service = build_service(llm);

    let response = service.process(AgentRequest::new("  ")).await;
    assert!(!response.success);
}

#[tokio::test]
async fn available_tools_lists_the_full_set() {
    let llm = Arc::new(ScriptedLlm::new(vec![]));
    let service = build_service(llm);

    let names: Vec<_> = service
        .available_tools()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["calculator", "weather", "search", "chat"]);
}
