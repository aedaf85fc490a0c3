//! # chat-hub
//!
//! Real-time chat fan-out hub. Clients stream events over Server-Sent
//! Events, receive a bounded replay of recent history on connect, and then
//! every message published after that, in publish order.
//!
//! ## Features
//!
//! - **Bounded replay**: the most recent messages are sent as a single `history` event
//! - **Ordered fan-out**: every subscriber sees messages in publish order
//! - **Failure isolation**: a broken or stalled subscriber is dropped without
//!   affecting publishers or other subscribers
//! - **Keep-alive**: per-connection ping comments detect dead streams
//!
//! ## Modules
//!
//! - [`hub`]: History log, subscriber registry, event hub and connection lifecycle
//! - [`api`]: HTTP endpoints with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chat_hub::{serve, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (config, _) = Config::load_default();
//!     let state = AppState::with_hub_config(config.hub.to_hub_config(), config.server);
//!
//!     // Runs until Ctrl+C / SIGTERM
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod hub;

// Re-export top-level types for convenience
pub use hub::{
    ChannelSink, ChatMessage, CloseReason, Connection, ConnectionState, DraftError, EventHub,
    EventSink, Frame, HubConfig, MessageDraft, MessageLimits, SinkError, Subscriber,
    SubscriberId,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError, ConfigLoad, HubSettings, LoggingConfig, ServerConfig};
