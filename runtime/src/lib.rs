//! # Crosstab Runtime
//!
//! Runtime for the crosstab session architecture.
//!
//! This crate provides the [`Store`]: the runtime that owns a reducer's state,
//! feeds actions through the reducer, and executes the effects it returns.
//!
//! ## Core Components
//!
//! - **Store**: owns state, reducer, and environment
//! - **Effect execution**: interprets effect descriptions and feeds produced
//!   actions back into the reducer
//!
//! ## Scheduling model
//!
//! Everything is cooperative. [`Store::send`] reduces the action while holding
//! the state lock, releases the lock, then drives the returned effects to
//! completion before returning:
//!
//! - `Sequential` effects run in order (later steps start only after earlier
//!   ones finished - teardown relies on this),
//! - `Parallel` effects are joined,
//! - `Delay` sleeps on the tokio timer and then dispatches,
//! - `Future` is awaited and its produced action (if any) dispatched.
//!
//! Reducer steps for one store are serialized by the state lock, so two
//! overlapping triggers can never interleave *inside* a transition; they only
//! interleave between transitions, which is exactly the reentrancy model the
//! session state machine is written for.
//!
//! ## Example
//!
//! ```ignore
//! use crosstab_runtime::Store;
//!
//! let store = Store::new(initial_state, reducer, environment);
//!
//! // Send an action and wait for its effects to settle.
//! store.send(Action::PageLoaded).await;
//!
//! // Read state.
//! let phase = store.state(|s| s.phase.clone()).await;
//! ```

use crosstab_core::effect::Effect;
use crosstab_core::reducer::Reducer;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The Store - runtime coordinator for a reducer.
///
/// The Store manages:
/// 1. State (behind `RwLock` for concurrent access from listener tasks)
/// 2. Reducer (transition logic)
/// 3. Environment (injected dependencies)
/// 4. Effect execution (with action feedback loop)
///
/// # Type Parameters
///
/// - `S`: state type
/// - `A`: action type
/// - `E`: environment type
/// - `R`: reducer implementation
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: Arc<R>,
    environment: Arc<E>,
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: std::fmt::Debug + Send + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a new store with initial state, reducer, and environment.
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer: Arc::new(reducer),
            environment: Arc::new(environment),
        }
    }

    /// Dispatch an action and drive its effects to completion.
    ///
    /// Returns once the action and every action transitively produced by its
    /// effects have been reduced. Callers that need fire-and-forget semantics
    /// spawn this on their runtime.
    pub async fn send(&self, action: A) {
        self.dispatch(action).await;
    }

    /// Read the current state through a projection function.
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let guard = self.state.read().await;
        f(&guard)
    }

    /// Shared handle to the environment this store was built with.
    #[must_use]
    pub fn environment(&self) -> Arc<E> {
        Arc::clone(&self.environment)
    }

    // Recursion (effects produce actions produce effects) requires boxing.
    fn dispatch<'a>(&'a self, action: A) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            tracing::debug!(?action, "dispatch");
            let effects = {
                let mut guard = self.state.write().await;
                self.reducer.reduce(&mut guard, action, &self.environment)
            };
            for effect in effects {
                self.run_effect(effect).await;
            }
        })
    }

    fn run_effect<'a>(
        &'a self,
        effect: Effect<A>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            match effect {
                Effect::None => {},
                Effect::Parallel(effects) => {
                    futures::future::join_all(
                        effects.into_iter().map(|effect| self.run_effect(effect)),
                    )
                    .await;
                },
                Effect::Sequential(effects) => {
                    for effect in effects {
                        self.run_effect(effect).await;
                    }
                },
                Effect::Delay { duration, action } => {
                    tokio::time::sleep(duration).await;
                    self.dispatch(*action).await;
                },
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        self.dispatch(action).await;
                    }
                },
            }
        })
    }
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: Arc::clone(&self.reducer),
            environment: Arc::clone(&self.environment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosstab_core::effect::Effects;
    use crosstab_core::smallvec;
    use std::time::Duration;

    #[derive(Debug, Default, Clone)]
    struct CounterState {
        count: i64,
        echoes: u32,
    }

    #[derive(Debug)]
    enum CounterAction {
        Add(i64),
        AddLater { amount: i64, after: Duration },
        Echo,
    }

    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = CounterState;
        type Action = CounterAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut CounterState,
            action: CounterAction,
            _env: &(),
        ) -> Effects<CounterAction> {
            match action {
                CounterAction::Add(amount) => {
                    state.count += amount;
                    smallvec![Effect::future(async { Some(CounterAction::Echo) })]
                },
                CounterAction::AddLater { amount, after } => {
                    smallvec![Effect::delay(after, CounterAction::Add(amount))]
                },
                CounterAction::Echo => {
                    state.echoes += 1;
                    smallvec![]
                },
            }
        }
    }

    #[tokio::test]
    async fn send_reduces_and_feeds_back_effect_actions() {
        let store = Store::new(CounterState::default(), CounterReducer, ());

        store.send(CounterAction::Add(2)).await;

        let state = store.state(Clone::clone).await;
        assert_eq!(state.count, 2);
        assert_eq!(state.echoes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_effect_dispatches_after_sleeping() {
        let store = Store::new(CounterState::default(), CounterReducer, ());

        store
            .send(CounterAction::AddLater {
                amount: 5,
                after: Duration::from_secs(3),
            })
            .await;

        let state = store.state(Clone::clone).await;
        assert_eq!(state.count, 5);
    }

    #[tokio::test]
    async fn sequential_effects_run_in_order() {
        // Sequential([future(Add 1), future(Add 10)]) must leave both applied.
        struct SeqReducer;
        impl Reducer for SeqReducer {
            type State = CounterState;
            type Action = CounterAction;
            type Environment = ();

            fn reduce(
                &self,
                state: &mut CounterState,
                action: CounterAction,
                _env: &(),
            ) -> Effects<CounterAction> {
                match action {
                    CounterAction::Echo => {
                        smallvec![Effect::chain(vec![
                            Effect::future(async { Some(CounterAction::Add(1)) }),
                            Effect::future(async { Some(CounterAction::Add(10)) }),
                        ])]
                    },
                    CounterAction::Add(amount) => {
                        state.count = state.count * 100 + amount;
                        smallvec![]
                    },
                    CounterAction::AddLater { .. } => smallvec![],
                }
            }
        }

        let store = Store::new(CounterState::default(), SeqReducer, ());
        store.send(CounterAction::Echo).await;

        // 0 * 100 + 1 = 1, then 1 * 100 + 10 = 110: order preserved.
        assert_eq!(store.state(|s| s.count).await, 110);
    }
}
