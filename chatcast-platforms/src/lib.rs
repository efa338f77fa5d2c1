//! Platform chat adapters.
//!
//! Each module implements `chatcast_core::ChannelHandler` for one upstream
//! source. The `factory` module exposes the `HandlerFactory` the registry
//! uses to construct them.

pub mod factory;
pub mod ingest;
pub mod tiktok;
pub mod twitch;
pub mod youtube;

pub use factory::PlatformHandlerFactory;
