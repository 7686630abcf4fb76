//! Awaiting a promise from async code.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::promise::Promise;

/// Future returned by [`Promise::settled`].
///
/// Resolves with the promise's outcome. If the promise is dropped while still
/// pending it can never settle, and neither does this future.
#[must_use = "futures do nothing unless polled"]
pub struct Settled<T, E> {
    /// `None` once the sender is gone without a value.
    receiver: Option<oneshot::Receiver<Result<T, E>>>,
}

impl<T, E> Future for Settled<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Poll::Pending;
        };
        match Pin::new(receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => {
                self.receiver = None;
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// A future for the eventual outcome. Resolution still goes through the
    /// host, so the host must be driven for the future to complete.
    pub fn settled(&self) -> Settled<T, E> {
        let (sender, receiver) = oneshot::channel();
        self.on_settle(move |result| {
            // The receiver may be gone; nobody is waiting then.
            let _ = sender.send(result);
        });
        Settled {
            receiver: Some(receiver),
        }
    }
}

impl<T, E> IntoFuture for Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    type Output = Result<T, E>;
    type IntoFuture = Settled<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.settled()
    }
}
