//! Completion signals
//!
//! One-shot notifications that an animation reached a terminal state. Signals
//! are futures; dropping the animation (or the engine) resolves waiters with
//! [`AnimationOutcome::Cancelled`] instead of leaving them pending.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use smallvec::SmallVec;
use tokio::sync::oneshot;

/// How an animation ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationOutcome {
    /// Ran all of its passes
    Finished,
    /// Stopped by the caller
    Stopped,
    /// Replaced by another animation on the same property
    Evicted,
    /// Its render target went away
    TargetLost,
    /// The animation was dropped before reaching a terminal state
    Cancelled,
}

/// Awaitable completion of one animation
#[derive(Debug)]
pub struct CompletionSignal {
    rx: oneshot::Receiver<AnimationOutcome>,
    outcome: Option<AnimationOutcome>,
}

impl CompletionSignal {
    /// Outcome if already resolved, without blocking
    pub fn try_outcome(&mut self) -> Option<AnimationOutcome> {
        if self.outcome.is_none() {
            self.outcome = match self.rx.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(oneshot::error::TryRecvError::Empty) => None,
                Err(oneshot::error::TryRecvError::Closed) => Some(AnimationOutcome::Cancelled),
            };
        }
        self.outcome
    }

    pub fn is_resolved(&mut self) -> bool {
        self.try_outcome().is_some()
    }
}

impl Future for CompletionSignal {
    type Output = AnimationOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.outcome {
            return Poll::Ready(outcome);
        }
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(result) => {
                let outcome = result.unwrap_or(AnimationOutcome::Cancelled);
                self.outcome = Some(outcome);
                Poll::Ready(outcome)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Sending half held by an animation instance
#[derive(Debug, Default)]
pub(crate) struct Completer {
    waiters: SmallVec<[oneshot::Sender<AnimationOutcome>; 1]>,
    resolved: Option<AnimationOutcome>,
}

impl Completer {
    pub fn new() -> Self {
        Self::default()
    }

    /// New waiter; resolves immediately if the outcome is already known
    pub fn subscribe(&mut self) -> CompletionSignal {
        let (tx, rx) = oneshot::channel();
        match self.resolved {
            Some(outcome) => {
                let _ = tx.send(outcome);
            }
            None => self.waiters.push(tx),
        }
        CompletionSignal { rx, outcome: None }
    }

    /// Resolve every waiter. Only the first call has any effect.
    pub fn resolve(&mut self, outcome: AnimationOutcome) -> bool {
        if self.resolved.is_some() {
            return false;
        }
        self.resolved = Some(outcome);
        for tx in self.waiters.drain(..) {
            // Receiver may already be gone
            let _ = tx.send(outcome);
        }
        true
    }
}
