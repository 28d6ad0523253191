use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Data Files ---
    /// Path to the product catalog (JSON array of products).
    #[arg(long, env = "CATALOG_PATH", default_value = "products.json")]
    pub catalog_path: String,

    /// Order ledger backend (json, memory)
    #[arg(long, env = "LEDGER_TYPE", default_value = "json")]
    pub ledger_type: String,

    /// Path to the order ledger when LEDGER_TYPE=json.
    #[arg(long, env = "LEDGER_PATH", default_value = "purchase_history.json")]
    pub ledger_path: String,

    /// Path to the prompt configuration file. Built-in prompts are used when it is missing.
    #[arg(long, env = "PROMPTS_PATH", default_value = "json/prompts.json")]
    pub prompts_path: String,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for the assistant (gemini, openai, ollama)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "gemini")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gemini-2.5-flash, gpt-4o-mini, llama3.2)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    // --- Assistant Behaviour ---
    /// Number of most recent chat turns re-sent with every assistant prompt.
    #[arg(long, env = "HISTORY_WINDOW", default_value = "5")]
    pub history_window: usize,

    /// Maximum number of chat messages kept per session.
    #[arg(long, env = "TRANSCRIPT_LIMIT", default_value = "50")]
    pub transcript_limit: usize,

    /// Ask the user before applying cart commands emitted by the assistant.
    #[arg(long, env = "CONFIRM_ASSISTANT_COMMANDS", default_value = "false")]
    pub confirm_assistant_commands: bool,

    // --- Server Args ---
    /// Host address and port for the WebSocket server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Port for the JSON HTTP API. Disabled when not set.
    #[arg(long, env = "HTTP_PORT")]
    pub http_port: Option<u16>,

    /// Optional shared secret. When set, clients must sign the handshake timestamp with HMAC-SHA256.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    /// Optional path to the TLS certificate file (PEM format) for enabling WSS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling WSS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
