//! reqwest implementations of the prover seams.

mod prover;
mod session;

pub use prover::HttpProverService;
pub use session::HttpSessionManager;

/// Body text of a failed response, for error messages.
async fn error_text(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}
