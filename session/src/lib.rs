//! # Crosstab Session
//!
//! Client session lifecycle and cross-tab synchronization for the crosstab
//! back office.
//!
//! Every tab of the application runs one instance of the session state
//! machine. Tabs share a durable key-value store (tokens, timestamps,
//! identity and organization snapshots) and coordinate through a broadcast
//! channel with a storage-key fallback, so a logout or restoration in one tab
//! reaches all of them without going through the server.
//!
//! ## Architecture
//!
//! The lifecycle is a reducer over [`SessionState`]:
//!
//! ```text
//! Trigger → SessionReducer → (SessionState, Effects) → effect execution → more actions
//! ```
//!
//! Triggers: page load, visibility regained, peer signal, storage mutation,
//! a 401 from any authenticated call, explicit `validate`/`logout`, and a
//! low-frequency periodic safety net.
//!
//! ## Lifecycle at a glance
//!
//! - **Validation** (single entry point): token set present and decodable →
//!   expiry policy (absolute ceiling before inactivity) → extend
//!   `last_activity`.
//! - **Teardown** (idempotent): announce to peers first, clear the exhaustive
//!   session key list (the language preference survives), notify unless the
//!   user signed out themselves, navigate to the login route.
//! - **Restoration**: a fresh tab with valid durable tokens rebuilds its
//!   in-memory state from the persisted snapshots and announces it, so other
//!   open tabs adopt instead of re-deriving.
//!
//! ## Example
//!
//! ```ignore
//! use crosstab_session::{SessionBus, SessionConfig, Tab};
//! use crosstab_session::stores::MemoryKeyValueStore;
//!
//! let origin = MemoryKeyValueStore::new();
//! let bus = SessionBus::new();
//! let tab = Tab::open(&origin, &bus, gateway, navigator, notifier, clock, SessionConfig::default()).await;
//!
//! if !tab.validate_session().await {
//!     // torn down and already navigated to the login route
//! }
//! ```

// Public modules
pub mod actions;
pub mod activity;
pub mod broadcast;
pub mod config;
pub mod environment;
pub mod error;
pub mod expiry;
pub mod keys;
pub mod providers;
pub mod reducers;
pub mod restore;
pub mod state;
pub mod stores;
pub mod tab;
pub mod token;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use actions::SessionAction;
pub use activity::{ActivityTracker, InteractionKind};
pub use broadcast::{PeerSignal, PeerSignalKind, SessionBus};
pub use config::SessionConfig;
pub use environment::SessionEnvironment;
pub use error::{GatewayError, StorageError};
pub use expiry::{ExpiryReason, ExpiryVerdict};
pub use reducers::SessionReducer;
pub use state::{SessionPhase, SessionState, TabId, TeardownReason, TokenSet, UserSnapshot};
pub use tab::Tab;
