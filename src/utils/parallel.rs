//! Ordered concurrent mapper.
//!
//! A bounded pool of `tokio` tasks applies one async unit of work to every
//! input and returns the results in input order, whatever order they
//! completed in.
//!
//! # Modes
//!
//! - **Fail-fast**: the first error cancels the batch; workers stop pulling
//!   inputs and the call returns that error alone. When several units fail
//!   at the same time, which one counts as first is a race.
//! - **Settled**: every input is attempted and each slot holds its own
//!   `Result`, so the output always has one entry per input.
//!
//! Cancellation is cooperative and coarse: workers check the signal between
//! units, never during one. An in-flight unit always runs to completion.
//! Each batch owns its cancellation flag; an external [`CancelSignal`] is only
//! ever read, so one failed batch never poisons the next.
//!
//! # Examples
//!
//! ```rust
//! use panel_core::core::PanelError;
//! use panel_core::utils::{MapOptions, OrderedMapper};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), PanelError> {
//! let mapper = OrderedMapper::new(MapOptions::new(4));
//! let doubled = mapper
//!     .try_map(vec![3, 1, 2], |_ctx, n: u32| async move { Ok::<_, PanelError>(n * 2) })
//!     .await?;
//! assert_eq!(doubled, vec![6, 2, 4]);
//! # Ok(())
//! # }
//! ```

use futures::future::join_all;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::constants::default_max_workers;
use crate::core::PanelError;

/// Shared cooperative cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    /// Fresh, uncancelled signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Cancellation state of one batch: its own flag plus the caller's signal.
#[derive(Debug, Clone)]
struct BatchCancel {
    batch: CancelSignal,
    external: Option<CancelSignal>,
}

impl BatchCancel {
    fn new(external: Option<CancelSignal>) -> Self {
        Self {
            batch: CancelSignal::new(),
            external,
        }
    }

    fn abort(&self) {
        self.batch.cancel();
    }

    fn is_cancelled(&self) -> bool {
        self.batch.is_cancelled() || self.external.as_ref().is_some_and(CancelSignal::is_cancelled)
    }
}

/// What a unit of work can see about its batch.
#[derive(Debug, Clone)]
pub struct WorkContext {
    position: usize,
    cancel: BatchCancel,
}

impl WorkContext {
    /// Input position of this unit.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Whether the batch has been cancelled.
    ///
    /// Long units may poll this to give up early; the mapper itself only
    /// checks between units.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Lifecycle of one batch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Inputs received, nothing spawned yet
    Pending,
    /// Workers are pulling inputs
    Dispatching,
    /// Workers finished, results being placed into slots
    Collecting,
    /// Every slot filled (settled mode, or fail-fast without errors)
    Completed,
    /// Fail-fast batch stopped on an error
    Aborted,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Dispatching => "dispatching",
            Self::Collecting => "collecting",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Mapper settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapOptions {
    /// Worker cap; `0` is treated as `1`.
    pub workers: usize,
    /// Stop at the first error instead of settling every input.
    pub fail_fast: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self::new(default_max_workers())
    }
}

impl MapOptions {
    /// Settled mode with `workers` workers.
    #[must_use]
    pub const fn new(workers: usize) -> Self {
        Self {
            workers,
            fail_fast: false,
        }
    }

    /// Switch fail-fast on or off.
    #[must_use]
    pub const fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

/// Bounded, order-preserving concurrent map.
#[derive(Debug, Clone, Default)]
pub struct OrderedMapper {
    options: MapOptions,
    cancel: Option<CancelSignal>,
}

type Slot<R, E> = Option<Result<R, E>>;

impl OrderedMapper {
    /// Mapper with the given options.
    #[must_use]
    pub const fn new(options: MapOptions) -> Self {
        Self {
            options,
            cancel: None,
        }
    }

    /// Let an external signal cancel batches run by this mapper.
    ///
    /// Units that were never started come back as [`PanelError::Cancelled`].
    /// The mapper never sets this signal itself.
    #[must_use]
    pub fn with_cancel_signal(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// Configured options.
    #[must_use]
    pub const fn options(&self) -> MapOptions {
        self.options
    }

    /// Apply `unit` to every input.
    ///
    /// In fail-fast mode the first error is returned and no results are.
    /// Otherwise the result vector has exactly one entry per input, in input
    /// order; units skipped because of external cancellation hold
    /// [`PanelError::Cancelled`].
    ///
    /// A panicking unit panics the caller.
    pub async fn run<T, R, E, F, Fut>(&self, inputs: Vec<T>, unit: F) -> Result<Vec<Result<R, E>>, E>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: From<PanelError> + fmt::Display + Send + 'static,
        F: Fn(WorkContext, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let fail_fast = self.options.fail_fast;
        let (slots, first_error) = self.dispatch(inputs, unit).await;

        if fail_fast {
            if let Some(error) = first_error {
                tracing::error!("Batch {}: {}", BatchState::Aborted, error);
                return Err(error);
            }
        }

        let results: Vec<Result<R, E>> = slots
            .into_iter()
            .enumerate()
            .map(|(position, slot)| {
                slot.unwrap_or_else(|| {
                    Err(PanelError::Cancelled {
                        position,
                    }
                    .into())
                })
            })
            .collect();
        tracing::debug!("Batch {} with {} results", BatchState::Completed, results.len());
        Ok(results)
    }

    /// Fail-fast map returning plain values.
    pub async fn try_map<T, R, E, F, Fut>(&self, inputs: Vec<T>, unit: F) -> Result<Vec<R>, E>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: From<PanelError> + fmt::Display + Send + 'static,
        F: Fn(WorkContext, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let mapper = Self {
            options: self.options.fail_fast(true),
            cancel: self.cancel.clone(),
        };
        mapper.run(inputs, unit).await?.into_iter().collect()
    }

    /// Settled map: one `Result` per input, never short-circuits.
    pub async fn map_settled<T, R, E, F, Fut>(&self, inputs: Vec<T>, unit: F) -> Vec<Result<R, E>>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: From<PanelError> + fmt::Display + Send + 'static,
        F: Fn(WorkContext, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let n = inputs.len();
        let mapper = Self {
            options: self.options.fail_fast(false),
            cancel: self.cancel.clone(),
        };
        match mapper.run(inputs, unit).await {
            Ok(results) => results,
            // Only reachable in fail-fast mode; keep the length contract anyway.
            Err(error) => {
                let message = error.to_string();
                let mut results = Vec::with_capacity(n);
                results.push(Err(error));
                results.extend((1..n).map(|position| {
                    tracing::trace!("Slot {} lost to batch error: {}", position, message);
                    Err(PanelError::Cancelled {
                        position,
                    }
                    .into())
                }));
                results
            }
        }
    }

    async fn dispatch<T, R, E, F, Fut>(&self, inputs: Vec<T>, unit: F) -> (Vec<Slot<R, E>>, Option<E>)
    where
        T: Send + 'static,
        R: Send + 'static,
        E: From<PanelError> + fmt::Display + Send + 'static,
        F: Fn(WorkContext, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let n = inputs.len();
        tracing::trace!("Batch {} with {} inputs", BatchState::Pending, n);
        if n == 0 {
            return (Vec::new(), None);
        }

        let workers = self.options.workers.max(1).min(n);
        let fail_fast = self.options.fail_fast;
        let cancel = BatchCancel::new(self.cancel.clone());
        let cursor = Arc::new(Mutex::new(inputs.into_iter().enumerate()));
        let first_error: Arc<Mutex<Option<E>>> = Arc::new(Mutex::new(None));
        let unit = Arc::new(unit);

        tracing::debug!("Batch {}: {} inputs over {} workers", BatchState::Dispatching, n, workers);

        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let cursor = Arc::clone(&cursor);
                let first_error = Arc::clone(&first_error);
                let unit = Arc::clone(&unit);
                let cancel = cancel.clone();

                tokio::spawn(async move {
                    let mut finished: Vec<(usize, Result<R, E>)> = Vec::new();
                    loop {
                        if cancel.is_cancelled() {
                            break;
                        }
                        let next = cursor.lock().await.next();
                        let Some((position, input)) = next else {
                            break;
                        };

                        let context = WorkContext {
                            position,
                            cancel: cancel.clone(),
                        };
                        match unit(context, input).await {
                            Err(error) if fail_fast => {
                                cancel.abort();
                                let mut first = first_error.lock().await;
                                if first.is_none() {
                                    tracing::debug!("Unit {} failed, cancelling batch", position);
                                    *first = Some(error);
                                }
                                break;
                            }
                            result => finished.push((position, result)),
                        }
                    }
                    finished
                })
            })
            .collect();

        let joined = join_all(handles).await;
        tracing::trace!("Batch {}", BatchState::Collecting);

        let mut slots: Vec<Slot<R, E>> = (0..n).map(|_| None).collect();
        for outcome in joined {
            match outcome {
                Ok(finished) => {
                    for (position, result) in finished {
                        slots[position] = Some(result);
                    }
                }
                Err(join_error) if join_error.is_panic() => {
                    std::panic::resume_unwind(join_error.into_panic());
                }
                Err(join_error) => {
                    tracing::error!("Mapper worker ended abnormally: {}", join_error);
                }
            }
        }

        let first_error = first_error.lock().await.take();
        (slots, first_error)
    }
}
