//! Tool registry and selection.

use std::sync::Arc;

use tracing::{debug, warn};

use augent_core::nlp::NlpService;
use augent_core::tool::{Tool, ToolDescriptor};

/// Default minimum classifier confidence for accepting a recommended tool.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.65;

/// Holds registered tools in registration order and selects the best tool for
/// a query.
///
/// Selection is deterministic when no classifier is wired in: the first
/// non-conversational tool whose `can_handle` accepts the query wins, the
/// conversational tool is the fallback, and the first registered tool is the
/// last resort. `select_best` returns `None` only for an empty registry.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    nlp: Option<Arc<dyn NlpService>>,
    confidence_threshold: f64,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self {
            tools,
            nlp: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// Wire in an intent classifier, builder-style.
    pub fn with_nlp(mut self, nlp: Arc<dyn NlpService>, confidence_threshold: f64) -> Self {
        self.nlp = Some(nlp);
        self.confidence_threshold = confidence_threshold;
        self
    }

    /// Exact case-insensitive lookup by tool name.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// All registered tool descriptors, in registration order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    /// All registered tool names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Deterministic selection fallback chain.
    pub fn select_best(&self, query: &str) -> Option<Arc<dyn Tool>> {
        if let Some(tool) = self
            .tools
            .iter()
            .find(|t| !t.is_conversational() && t.can_handle(query))
        {
            return Some(tool.clone());
        }
        if let Some(tool) = self.tools.iter().find(|t| t.is_conversational()) {
            return Some(tool.clone());
        }
        self.tools.first().cloned()
    }

    /// Classifier-assisted selection.
    ///
    /// Accepts the classifier's recommended tool when its confidence clears
    /// the threshold and the name resolves; every other outcome, including a
    /// classifier error, falls back to `select_best`.
    pub async fn select_best_async(&self, query: &str) -> Option<Arc<dyn Tool>> {
        if let Some(nlp) = &self.nlp {
            match nlp.classify_intent(query).await {
                Ok(classification) => {
                    if classification.confidence >= self.confidence_threshold {
                        if let Some(tool) = self.resolve(&classification.recommended_tool) {
                            debug!(
                                tool = tool.name(),
                                confidence = classification.confidence,
                                "Classifier selected tool"
                            );
                            return Some(tool);
                        }
                    }
                    debug!(
                        intent = %classification.primary_intent,
                        confidence = classification.confidence,
                        "Classification below threshold or unresolvable, using heuristics"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "Intent classification failed, using heuristics");
                }
            }
        }
        self.select_best(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use augent_core::error::{NlpError, ToolError};
    use augent_core::nlp::{ExtractedEntities, IntentClassification, SentimentAnalysis};
    use augent_core::tool::ToolResult;
    use std::collections::HashMap;

    struct StubTool {
        name: &'static str,
        handles: &'static str,
        conversational: bool,
    }

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "stub"
        }
        fn can_handle(&self, query: &str) -> bool {
            query.contains(self.handles)
        }
        fn is_conversational(&self) -> bool {
            self.conversational
        }
        async fn execute(
            &self,
            _query: &str,
            _parameters: &HashMap<String, String>,
        ) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::ok(self.name))
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new(vec![
            Arc::new(StubTool {
                name: "calculator",
                handles: "calculate",
                conversational: false,
            }),
            Arc::new(StubTool {
                name: "weather",
                handles: "weather",
                conversational: false,
            }),
            Arc::new(StubTool {
                name: "chat",
                handles: "",
                conversational: true,
            }),
        ])
    }

    struct FixedClassifier {
        tool: &'static str,
        confidence: f64,
        fail: bool,
    }

    #[async_trait]
    impl NlpService for FixedClassifier {
        async fn classify_intent(&self, _query: &str) -> Result<IntentClassification, NlpError> {
            if self.fail {
                return Err(NlpError::Classification("model offline".into()));
            }
            Ok(IntentClassification {
                primary_intent: "test".into(),
                confidence: self.confidence,
                recommended_tool: self.tool.into(),
                all_intents: HashMap::new(),
            })
        }
        async fn extract_entities(&self, _query: &str) -> Result<ExtractedEntities, NlpError> {
            Ok(ExtractedEntities::default())
        }
        async fn analyze_sentiment(&self, _query: &str) -> Result<SentimentAnalysis, NlpError> {
            Ok(SentimentAnalysis::default())
        }
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let reg = registry();
        assert!(reg.resolve("Calculator").is_some());
        assert!(reg.resolve("WEATHER").is_some());
        assert!(reg.resolve("nope").is_none());
    }

    #[test]
    fn select_prefers_matching_non_conversational_tool() {
        let reg = registry();
        let tool = reg.select_best("what's the weather in Oslo").unwrap();
        assert_eq!(tool.name(), "weather");
    }

    #[test]
    fn select_falls_back_to_conversational_tool() {
        let reg = registry();
        let tool = reg.select_best("tell me about rust").unwrap();
        assert_eq!(tool.name(), "chat");
    }

    #[test]
    fn select_falls_back_to_first_tool_without_conversational() {
        let reg = ToolRegistry::new(vec![Arc::new(StubTool {
            name: "calculator",
            handles: "calculate",
            conversational: false,
        })]);
        let tool = reg.select_best("unrelated").unwrap();
        assert_eq!(tool.name(), "calculator");
    }

    #[test]
    fn empty_registry_selects_nothing() {
        let reg = ToolRegistry::new(vec![]);
        assert!(reg.select_best("anything").is_none());
    }

    #[tokio::test]
    async fn confident_classification_wins() {
        let reg = registry().with_nlp(
            Arc::new(FixedClassifier {
                tool: "calculator",
                confidence: 0.9,
                fail: false,
            }),
            DEFAULT_CONFIDENCE_THRESHOLD,
        );
        let tool = reg.select_best_async("what's the weather").await.unwrap();
        assert_eq!(tool.name(), "calculator");
    }

    #[tokio::test]
    async fn low_confidence_falls_back_to_heuristics() {
        let reg = registry().with_nlp(
            Arc::new(FixedClassifier {
                tool: "calculator",
                confidence: 0.3,
                fail: false,
            }),
            DEFAULT_CONFIDENCE_THRESHOLD,
        );
        let tool = reg.select_best_async("what's the weather").await.unwrap();
        assert_eq!(tool.name(), "weather");
    }

    #[tokio::test]
    async fn unresolvable_recommendation_falls_back() {
        let reg = registry().with_nlp(
            Arc::new(FixedClassifier {
                tool: "frobnicator",
                confidence: 0.99,
                fail: false,
            }),
            DEFAULT_CONFIDENCE_THRESHOLD,
        );
        let tool = reg.select_best_async("what's the weather").await.unwrap();
        assert_eq!(tool.name(), "weather");
    }

    #[tokio::test]
    async fn classifier_failure_falls_back() {
        let reg = registry().with_nlp(
            Arc::new(FixedClassifier {
                tool: "calculator",
                confidence: 0.9,
                fail: true,
            }),
            DEFAULT_CONFIDENCE_THRESHOLD,
        );
        let tool = reg.select_best_async("what's the weather").await.unwrap();
        assert_eq!(tool.name(), "weather");
    }
}
