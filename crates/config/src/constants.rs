//! Centralized constants for the assistant
//!
//! Single source of truth for endpoints, generation defaults, and the fixed
//! strings that shape prompts and replies.

/// Service endpoints
pub mod endpoints {
    /// IBM Cloud IAM token exchange
    pub const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

    /// watsonx.ai regional endpoint (Frankfurt)
    pub const WATSONX_DEFAULT: &str = "https://eu-de.ml.cloud.ibm.com";

    /// Text generation path, relative to the watsonx.ai base URL
    pub const TEXT_GENERATION_PATH: &str = "/ml/v1/text/generation";

    /// watsonx.ai API version pinned for text generation
    pub const WATSONX_API_VERSION: &str = "2023-05-29";

    /// Qdrant vector store endpoint (gRPC port used by qdrant-client)
    pub const QDRANT_DEFAULT: &str = "http://127.0.0.1:6334";

    /// Ollama endpoint serving the embedding model
    pub const OLLAMA_DEFAULT: &str = "http://localhost:11434";
}

/// Generation defaults
pub mod generation {
    pub const MODEL_ID: &str = "sdaia/allam-1-13b-instruct";
    pub const DECODING_METHOD: &str = "greedy";
    pub const MAX_NEW_TOKENS: u32 = 400;
    pub const TEMPERATURE: f32 = 0.7;
    pub const TOP_P: f32 = 1.0;
    pub const REPETITION_PENALTY: f32 = 1.0;
    pub const TIMEOUT_SECS: u64 = 60;

    /// Refresh the bearer token this long before it expires
    pub const TOKEN_REFRESH_MARGIN_SECS: u64 = 300;

    /// Returned when the response carries no generated text
    pub const NO_TEXT_GENERATED: &str = "No text generated";

    /// Placeholder request id stamped on every emitted chunk
    pub const REQUEST_ID: &str = "watsonx_request_id";
}

/// Retrieval defaults
pub mod rag {
    pub const COLLECTION: &str = "knowledge";
    pub const EMBEDDING_MODEL: &str = "bge-m3";
    pub const EMBEDDING_DIM: usize = 1024;

    /// One best-matching fragment per turn
    pub const TOP_K: usize = 1;
}

/// Prompt and speech strings
pub mod prompts {
    /// Opens the retrieved-context block of the system message
    pub const CONTEXT_HEADER: &str = "Context that might help answer the user's question:";

    /// Separates retrieved context from the original system prompt
    pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

    pub const SYSTEM_PROMPT_PATH: &str = "system_prompt.txt";

    pub const GREETING: &str = "Hello, I'm مُرْشِدْ. Your assistant in your journey to Saudi Arabia. How can I help you today?";
}

/// Session defaults
pub mod session {
    /// Pending typed chat messages before new ones are rejected
    pub const CHAT_QUEUE_CAPACITY: usize = 8;
}
