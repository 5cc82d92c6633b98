//! Realtime Listener - Main Library
//!
//! Hosts the shared pieces of the `listen` binary on top of the
//! `realtime` workspace library.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, logging,
//!   runner, shutdown)
//! - **realtime**: Event client (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use realtime_listener::bin_common::{load_config_from_env, ConfigType};
//! use realtime_listener::realtime::RealtimeClient;
//! ```

// Re-export workspace library for convenience
pub use realtime;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod logging;
    pub mod runner;
    pub mod shutdown;

    pub use cli::{auth_from_env, load_config_from_env, parse_args, ConfigType, USER_ID_ENV_VAR};
    pub use logging::init_tracing;
    pub use runner::{BinaryRunner, RunConfig};
    pub use shutdown::ShutdownSignal;
}
