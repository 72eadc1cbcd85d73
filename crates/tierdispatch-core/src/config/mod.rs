//! Host detection and dispatch configuration.

pub mod features;

// Re-export key items
pub use features::{
    detect_host, dispatch_config, host_capabilities, DispatchConfig, DispatchConfigBuilder,
    DISABLE_ENV, REQUIRE_IMPLIED_ENV,
};
