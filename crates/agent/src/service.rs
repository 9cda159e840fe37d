//! The agent service facade.
//!
//! Validates incoming requests, runs optional NLP enrichment, selects a tool
//! honouring the request's tool constraints, and executes it. Every path
//! produces an `AgentResponse`; no internal error escapes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use augent_config::SelectionConfig;
use augent_core::agent::{AgentRequest, AgentResponse};
use augent_core::llm::StreamingChunk;
use augent_core::nlp::NlpService;
use augent_core::tool::{QueryContext, StreamingTool, Tool, ToolDescriptor};

use crate::registry::ToolRegistry;

/// Urgency attribute level above which the query is marked urgent.
const URGENCY_THRESHOLD: f64 = 0.7;

/// Caller-facing entry point for query processing.
pub struct AgentService {
    registry: Arc<ToolRegistry>,
    nlp: Option<Arc<dyn NlpService>>,
    streaming_tool: Option<Arc<dyn StreamingTool>>,
    selection: SelectionConfig,
}

impl AgentService {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            nlp: None,
            streaming_tool: None,
            selection: SelectionConfig::default(),
        }
    }

    /// Wire in NLP enrichment, builder-style.
    pub fn with_nlp(mut self, nlp: Arc<dyn NlpService>) -> Self {
        self.nlp = Some(nlp);
        self
    }

    /// Wire in the streaming conversational tool, builder-style.
    pub fn with_streaming_tool(mut self, tool: Arc<dyn StreamingTool>) -> Self {
        self.streaming_tool = Some(tool);
        self
    }

    pub fn with_selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    /// Process a request to completion.
    pub async fn process(&self, request: AgentRequest) -> AgentResponse {
        if request.query.trim().is_empty() {
            return AgentResponse::failure("Query cannot be empty");
        }

        let mut context =
            QueryContext::with_parameters(request.query.clone(), request.parameters.clone());
        self.enrich(&mut context).await;

        let Some(tool) = self.select_tool(&request).await else {
            return AgentResponse::failure("No tool available to handle this query");
        };

        info!(tool = tool.name(), "Dispatching query");

        let result = match tool.execute(&context.query, &context.parameters).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = tool.name(), error = %e, "Tool execution failed");
                let mut response = AgentResponse::failure(e.to_string());
                response.tool_used = tool.name().to_string();
                return response;
            }
        };

        AgentResponse {
            response: result.result,
            tool_used: tool.name().to_string(),
            data: result.data,
            success: result.success,
            error_message: result.error_message,
        }
    }

    /// Process a request on the streaming path.
    ///
    /// Delegates to the wired streaming tool; without one, the receiver
    /// carries a single terminal error chunk.
    pub async fn process_streaming(
        &self,
        request: AgentRequest,
        cancel: CancellationToken,
    ) -> mpsc::UnboundedReceiver<StreamingChunk> {
        if request.query.trim().is_empty() {
            return single_chunk(StreamingChunk::error("Query cannot be empty"));
        }

        let Some(tool) = &self.streaming_tool else {
            return single_chunk(StreamingChunk::error("Streaming is not configured"));
        };

        let mut context =
            QueryContext::with_parameters(request.query.clone(), request.parameters.clone());
        self.enrich(&mut context).await;

        info!(tool = tool.name(), "Dispatching streaming query");
        tool.execute_streaming(&context.query, &context.parameters, cancel)
            .await
    }

    /// List every registered tool.
    pub fn available_tools(&self) -> Vec<ToolDescriptor> {
        self.registry.descriptors()
    }

    /// Augment the parameter map from the NLP helpers.
    ///
    /// Caller-supplied keys always win; any helper failure is logged and the
    /// request continues un-enriched.
    async fn enrich(&self, context: &mut QueryContext) {
        let Some(nlp) = &self.nlp else {
            return;
        };

        match nlp.extract_entities(&context.query).await {
            Ok(extracted) => {
                for (key, value) in extracted.parameters {
                    context.add_if_absent(key, value);
                }
            }
            Err(e) => warn!(error = %e, "Entity extraction failed, continuing"),
        }

        match nlp.analyze_sentiment(&context.query).await {
            Ok(sentiment) => {
                if sentiment.score > self.selection.sentiment_threshold {
                    context.add_if_absent("sentiment", sentiment.sentiment.clone());
                }
                let urgency = sentiment.attributes.get("urgency").copied().unwrap_or(0.0);
                if urgency > URGENCY_THRESHOLD {
                    context.add_if_absent("urgency", "high");
                }
            }
            Err(e) => warn!(error = %e, "Sentiment analysis failed, continuing"),
        }
    }

    /// Pick a tool honouring the request's constraints.
    async fn select_tool(&self, request: &AgentRequest) -> Option<Arc<dyn Tool>> {
        if !request.use_all_tools && !request.specific_tools.is_empty() {
            let candidates: Vec<_> = request
                .specific_tools
                .iter()
                .filter_map(|name| self.registry.resolve(name))
                .collect();
            if candidates.is_empty() {
                debug!("None of the requested tools are registered");
                return None;
            }
            return candidates
                .iter()
                .find(|t| t.can_handle(&request.query))
                .or_else(|| candidates.first())
                .cloned();
        }
        self.registry.select_best_async(&request.query).await
    }
}

fn single_chunk(chunk: StreamingChunk) -> mpsc::UnboundedReceiver<StreamingChunk> {
    let (tx, rx) = mpsc::unbounded_channel();
    let _ = tx.send(chunk);
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use augent_core::error::{NlpError, ToolError};
    use augent_core::nlp::{ExtractedEntities, IntentClassification, SentimentAnalysis};
    use augent_core::tool::ToolResult;
    use std::sync::Mutex;

    struct RecordingTool {
        name: &'static str,
        handles: &'static str,
        conversational: bool,
        seen_parameters: Mutex<Vec<HashMap<String, String>>>,
    }

    impl RecordingTool {
        fn new(name: &'static str, handles: &'static str, conversational: bool) -> Self {
            Self {
                name,
                handles,
                conversational,
                seen_parameters: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "recording stub"
        }
        fn can_handle(&self, query: &str) -> bool {
            !self.handles.is_empty() && query.contains(self.handles)
        }
        fn is_conversational(&self) -> bool {
            self.conversational
        }
        async fn execute(
            &self,
            query: &str,
            parameters: &HashMap<String, String>,
        ) -> Result<ToolResult, ToolError> {
            self.seen_parameters.lock().unwrap().push(parameters.clone());
            Ok(ToolResult::ok(format!("{}: {query}", self.name)))
        }
    }

    struct EnrichingNlp;

    #[async_trait]
    impl NlpService for EnrichingNlp {
        async fn classify_intent(&self, _query: &str) -> Result<IntentClassification, NlpError> {
            Ok(IntentClassification::default())
        }
        async fn extract_entities(&self, _query: &str) -> Result<ExtractedEntities, NlpError> {
            let mut parameters = HashMap::new();
            parameters.insert("location".to_string(), "Oslo".to_string());
            Ok(ExtractedEntities {
                entities: HashMap::new(),
                parameters,
            })
        }
        async fn analyze_sentiment(&self, _query: &str) -> Result<SentimentAnalysis, NlpError> {
            let mut attributes = HashMap::new();
            attributes.insert("urgency".to_string(), 0.9);
            Ok(SentimentAnalysis {
                sentiment: "negative".into(),
                score: 0.85,
                attributes,
            })
        }
    }

    fn service_with(tools: Vec<Arc<dyn Tool>>) -> AgentService {
        AgentService::new(Arc::new(ToolRegistry::new(tools)))
    }

    #[tokio::test]
    async fn empty_query_is_rejected_without_dispatch() {
        let service = service_with(vec![Arc::new(RecordingTool::new("chat", "", true))]);
        let response = service.process(AgentRequest::new("   ")).await;
        assert!(!response.success);
        assert!(response.tool_used.is_empty());
    }

    #[tokio::test]
    async fn dispatches_to_matching_tool() {
        let weather = Arc::new(RecordingTool::new("weather", "weather", false));
        let service = service_with(vec![
            weather.clone(),
            Arc::new(RecordingTool::new("chat", "", true)),
        ]);

        let response = service
            .process(AgentRequest::new("what's the weather in Oslo"))
            .await;
        assert!(response.success);
        assert_eq!(response.tool_used, "weather");
        assert_eq!(weather.seen_parameters.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn specific_tools_restrict_dispatch() {
        let calc = Arc::new(RecordingTool::new("calculator", "calculate", false));
        let weather = Arc::new(RecordingTool::new("weather", "weather", false));
        let service = service_with(vec![calc, weather.clone()]);

        let mut request = AgentRequest::new("what's the weather");
        request.use_all_tools = false;
        request.specific_tools = vec!["weather".to_string()];

        let response = service.process(request).await;
        assert_eq!(response.tool_used, "weather");
    }

    #[tokio::test]
    async fn unknown_specific_tools_fail_cleanly() {
        let service = service_with(vec![Arc::new(RecordingTool::new("chat", "", true))]);
        let mut request = AgentRequest::new("hello");
        request.use_all_tools = false;
        request.specific_tools = vec!["frobnicator".to_string()];

        let response = service.process(request).await;
        assert!(!response.success);
    }

    #[tokio::test]
    async fn enrichment_adds_parameters_without_overriding_caller() {
        let weather = Arc::new(RecordingTool::new("weather", "weather", false));
        let service = service_with(vec![weather.clone()]).with_nlp(Arc::new(EnrichingNlp));

        let mut request = AgentRequest::new("weather please, urgently");
        request
            .parameters
            .insert("location".to_string(), "Bergen".to_string());

        let response = service.process(request).await;
        assert!(response.success);

        let seen = weather.seen_parameters.lock().unwrap();
        let params = &seen[0];
        // Caller-supplied location wins over the extracted one.
        assert_eq!(params["location"], "Bergen");
        assert_eq!(params["sentiment"], "negative");
        assert_eq!(params["urgency"], "high");
    }

    #[tokio::test]
    async fn streaming_without_wired_tool_reports_error() {
        let service = service_with(vec![Arc::new(RecordingTool::new("chat", "", true))]);
        let mut rx = service
            .process_streaming(AgentRequest::new("hello"), CancellationToken::new())
            .await;
        let chunk = rx.recv().await.unwrap();
        assert!(chunk.is_terminal());
        assert!(chunk.error.is_some());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn available_tools_lists_descriptors() {
        let service = service_with(vec![
            Arc::new(RecordingTool::new("calculator", "calc", false)),
            Arc::new(RecordingTool::new("chat", "", true)),
        ]);
        let names: Vec<_> = service
            .available_tools()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["calculator", "chat"]);
    }
}
