//! Built-in tools for Augent.
//!
//! The deterministic tools (`calculator`, `weather`, `search`) answer
//! directly. The conversational tools (`chat`, `streaming_chat`) delegate to
//! an LLM backend; `chat` additionally runs the tool-augmented dialogue loop,
//! asking the model to emit tagged tool requests and splicing the results
//! back in before a final generation pass.

pub mod calculator;
pub mod chat;
pub(crate) mod heuristics;
pub mod markup;
pub mod search;
pub mod streaming_chat;
pub mod weather;

pub use calculator::CalculatorTool;
pub use chat::ChatTool;
pub use search::SearchTool;
pub use streaming_chat::StreamingChatTool;
pub use weather::WeatherTool;
