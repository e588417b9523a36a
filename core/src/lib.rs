//! # Crosstab Core
//!
//! Core traits and types for the crosstab session architecture.
//!
//! Crosstab models each browser tab as a small, single-threaded state machine
//! coordinating with its peers through shared durable storage and a broadcast
//! channel. This crate provides the abstractions those machines are built on:
//!
//! - **State**: the in-memory session state of one tab
//! - **Action**: every possible input to a reducer (triggers, peer signals,
//!   results of async work)
//! - **Reducer**: transition function `(State, Action, Environment) →
//!   (State, Effects)`
//! - **Effect**: side-effect descriptions (not execution)
//! - **Environment**: injected dependencies behind traits
//!
//! ## Architecture Principles
//!
//! - Functional core, imperative shell
//! - Unidirectional data flow
//! - Explicit effects (no hidden I/O in transitions)
//! - Dependency injection via Environment
//!
//! ## Example
//!
//! ```ignore
//! use crosstab_core::{effect::Effects, reducer::Reducer, smallvec};
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = i64;
//!     type Action = i64;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut i64, action: i64, _env: &()) -> Effects<i64> {
//!         *state += action;
//!         smallvec![]
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Reducer module - the core trait for transition logic.
///
/// Reducers are transition functions: `(State, Action, Environment) →
/// (State, Effects)`. They contain all decision logic and are deterministic
/// given a deterministic environment (in particular, a fixed
/// [`environment::Clock`]).
pub mod reducer {
    use super::effect::Effects;

    /// The Reducer trait - core abstraction for transition logic.
    ///
    /// # Type Parameters
    ///
    /// - `State`: the state this reducer operates on
    /// - `Action`: the action type this reducer processes
    /// - `Environment`: the injected dependencies this reducer needs
    ///
    /// # Contract
    ///
    /// `reduce` must not perform blocking I/O. Reads of cheap, synchronous
    /// resources exposed by the environment (clock, key-value storage) are
    /// permitted; every mutation of the outside world must be described as an
    /// [`super::effect::Effect`] and left to the runtime.
    pub trait Reducer {
        /// The state type this reducer operates on.
        type State;

        /// The action type this reducer processes.
        type Action;

        /// The environment type with injected dependencies.
        type Environment;

        /// Reduce an action into state changes and effects.
        ///
        /// 1. Validates the action against the current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions for the runtime to execute
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Effects<Self::Action>;
    }
}

/// Effect module - side-effect descriptions.
///
/// Effects describe side effects to be performed by the runtime. They are
/// values (not execution), composable, and may feed actions back into the
/// reducer that produced them.
pub mod effect {
    use smallvec::SmallVec;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// The effects returned by one reducer step.
    ///
    /// Most transitions produce zero or one effect; teardown produces a short
    /// chain. Four inline slots cover every path without allocation.
    pub type Effects<Action> = SmallVec<[Effect<Action>; 4]>;

    /// Effect type - describes a side effect to be executed.
    ///
    /// Effects are NOT executed immediately. They are descriptions of what
    /// should happen, returned from reducers and executed by the Store
    /// runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: the action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect.
        None,

        /// Run effects concurrently.
        Parallel(Vec<Effect<Action>>),

        /// Run effects in order, each starting after the previous finished.
        ///
        /// Teardown depends on this ordering: peers must be notified *before*
        /// local state is cleared.
        Sequential(Vec<Effect<Action>>),

        /// Dispatch an action after a delay.
        Delay {
            /// How long to wait.
            duration: Duration,
            /// Action to dispatch after the delay.
            action: Box<Action>,
        },

        /// Arbitrary async computation.
        ///
        /// Returns `Option<Action>` - if `Some`, the action is fed back into
        /// the reducer.
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run concurrently.
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially.
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Wrap an async computation that may produce a feedback action.
        pub fn future<F>(fut: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Dispatch `action` after `duration`.
        #[must_use]
        pub fn delay(duration: Duration, action: Action) -> Effect<Action> {
            Effect::Delay {
                duration,
                action: Box::new(action),
            }
        }
    }
}

/// Environment module - dependency injection traits.
///
/// All external dependencies are abstracted behind traits and injected via
/// the Environment parameter of a reducer. Time is the one dependency every
/// reducer in this workspace shares, so the clock lives here.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability.
    ///
    /// Production code injects [`SystemClock`]; tests inject a fixed or
    /// stepping clock so expiry arithmetic is deterministic.
    pub trait Clock: Send + Sync {
        /// Get the current time.
        fn now(&self) -> DateTime<Utc>;

        /// Current time as epoch milliseconds.
        ///
        /// Storage timestamps are persisted as epoch-millisecond strings, so
        /// most callers want this form.
        fn now_millis(&self) -> i64 {
            self.now().timestamp_millis()
        }
    }

    /// System clock - the production [`Clock`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
