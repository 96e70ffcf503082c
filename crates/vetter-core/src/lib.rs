//! vetter-core library.
//!
//! Everything a review client needs apart from the terminal: the code
//! hierarchy resolver, the classification cache, the conflict model, search
//! ranking, key routing and the [`session::ReviewSession`] state machine,
//! plus the HTTP and in-memory backends they talk to.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums in the library, `anyhow::Result` where a
//!   caller only needs context (config and fixture loading).
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).
//! - **Remote calls**: never on the session thread; see [`executor`].

pub mod backend;
pub mod cache;
pub mod clock;
pub mod config;
pub mod conflict;
pub mod error;
pub mod executor;
pub mod hierarchy;
pub mod model;
pub mod prefs;
pub mod router;
pub mod search;
pub mod session;
pub mod timer;
