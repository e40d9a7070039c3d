// Remote service clients: text embeddings and chat completions

pub mod embedding;
pub mod suggestion;

use std::time::Duration;

/// Per-request timeout shared by the remote service clients
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Re-exports
pub use embedding::{Embedder, InputType, VoyageClient};
pub use suggestion::{AnthropicClient, ChatCompleter, ChatRequest};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_share_thirty_second_timeout() {
        assert_eq!(REQUEST_TIMEOUT, Duration::from_secs(30));
    }
}
