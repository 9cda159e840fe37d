//! Query heuristics shared by the conversational tools.

/// Phrasings that mark a query as conversational.
const CHAT_PATTERNS: &[&str] = &[
    "hello", "hi", "hey", "help", "thanks", "thank you",
    "how are you", "what can you do", "tell me", "chat",
    "talk", "converse", "assist", "guide", "explain",
];

/// Phrasings that suggest a lengthy response would be appropriate.
const LONG_FORM_INDICATORS: &[&str] = &[
    "explain in detail", "comprehensive", "elaborate", "in depth",
    "tell me everything", "write a", "generate a", "create a",
    "detailed explanation", "extensive", "thorough", "analyze", "list all",
    "compare and contrast", "history of", "essay", "article", "tutorial",
    "step by step", "guide", "how do i", "examples of",
];

/// Whether the conversational tools should accept this query.
///
/// Queries another tool specifically targets are declined so chat stays the
/// low-priority fallback; very short queries must look like a greeting.
pub(crate) fn accepts_conversation(query: &str) -> bool {
    if is_specific_tool_query(query) {
        return false;
    }
    let lower = query.to_lowercase();
    if query.len() < 10 {
        return CHAT_PATTERNS.iter().any(|p| lower.contains(p));
    }
    true
}

/// Whether the query is trivial enough for a canned reply, skipping the LLM.
pub(crate) fn is_trivial_query(query: &str) -> bool {
    let lower = query.to_lowercase();
    lower.len() < 10 && CHAT_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Canned reply for a trivial query.
pub(crate) fn canned_response(query: &str) -> String {
    let lower = query.to_lowercase();

    if lower.contains("hello") || lower.contains("hi") || lower.contains("hey") {
        return "Hello! How can I assist you today?".into();
    }
    if lower.contains("help") || lower.contains("what can you do") {
        return "I can help you with several tasks. You can ask me to search for information, \
                calculate mathematical expressions, check the weather, or just chat about any topic!"
            .into();
    }
    if lower.contains("thank") {
        return "You're welcome! Is there anything else I can help you with?".into();
    }
    if lower.contains("how are you") {
        return "I'm functioning well, thank you for asking! How can I assist you today?".into();
    }

    "I'm here to help. You can ask me to search for information, calculate expressions, \
     check the weather, or just chat. What would you like to know?"
        .into()
}

/// Whether the query specifically targets one of the deterministic tools.
pub(crate) fn is_specific_tool_query(query: &str) -> bool {
    let lower = query.to_lowercase();

    // Weather
    if lower.contains("weather") || lower.contains("temperature") || lower.contains("forecast") {
        return true;
    }
    // Calculator
    if lower.contains("calculate")
        || lower.contains("compute")
        || query.contains(['+', '-', '*', '/'])
    {
        return true;
    }
    // Search
    if lower.contains("search for") || lower.contains("find info") || lower.contains("look up") {
        return true;
    }

    false
}

/// Whether the query is likely to need a long-form, streamed response.
pub(crate) fn is_long_form_query(query: &str) -> bool {
    let lower = query.to_lowercase();
    if LONG_FORM_INDICATORS.iter().any(|i| lower.contains(i)) {
        return true;
    }
    if query.len() > 100 {
        return true;
    }
    query.chars().filter(|c| *c == '?').count() > 1
}
