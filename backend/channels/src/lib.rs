pub mod line;
pub mod line_receive;
pub mod line_send;

pub use line::{LineAdapter, LineConfig};
pub use line_send::{LineMessagingClient, MessagingApi, Profile};

/// All channel adapters implement this trait.
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Build the Axum sub-router for the adapter's inbound webhook endpoints.
    fn build_router(&self) -> axum::Router;
}
