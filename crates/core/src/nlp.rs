//! NLP helper contracts — intent classification, entity extraction, and
//! sentiment analysis.
//!
//! These are optional collaborators: the registry and agent service take an
//! `Option<Arc<dyn NlpService>>` and must treat "absent" as a first-class
//! branch, falling back to the non-enhanced path. No implementation ships in
//! this workspace; tests use hand-rolled mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::NlpError;

/// The result of intent classification for a query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentClassification {
    /// The primary intent identified in the query
    pub primary_intent: String,

    /// Confidence score for the primary intent, in [0, 1]
    pub confidence: f64,

    /// The tool recommended to handle this intent, if any
    #[serde(default)]
    pub recommended_tool: String,

    /// All identified intents with their confidence scores
    #[serde(default)]
    pub all_intents: HashMap<String, f64>,
}

/// Entities and tool parameters extracted from a query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedEntities {
    /// Named entities and their types
    #[serde(default)]
    pub entities: HashMap<String, String>,

    /// Key/value parameters usable by tools
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

/// Sentiment label, score, and auxiliary attributes for a query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    /// Overall sentiment label (positive, negative, neutral)
    pub sentiment: String,

    /// Score for the identified sentiment, in [0, 1]
    pub score: f64,

    /// Additional attributes (urgency, frustration, satisfaction, ...)
    #[serde(default)]
    pub attributes: HashMap<String, f64>,
}

/// Model-backed NLP helpers consumed at the dispatch boundary.
#[async_trait]
pub trait NlpService: Send + Sync {
    /// Classify the intent of a user query.
    async fn classify_intent(
        &self,
        query: &str,
    ) -> std::result::Result<IntentClassification, NlpError>;

    /// Extract entities and tool parameters from a query.
    async fn extract_entities(
        &self,
        query: &str,
    ) -> std::result::Result<ExtractedEntities, NlpError>;

    /// Analyze the sentiment of a query.
    async fn analyze_sentiment(
        &self,
        query: &str,
    ) -> std::result::Result<SentimentAnalysis, NlpError>;
}
