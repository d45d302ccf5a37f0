use std::{
    future::Future,
    task::{Context, Poll},
    thread,
    time::Duration,
};

use futures::task::noop_waker_ref;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Drives `future` to completion on the calling thread.
///
/// Must be called from inside a tokio runtime context so the SDK's
/// connection tasks are driven by the runtime workers.
pub fn block_until_ready<Fut>(future: Fut) -> Fut::Output
where
    Fut: Future,
{
    let mut future = Box::pin(future);
    let mut context = Context::from_waker(noop_waker_ref());

    loop {
        match future.as_mut().poll(&mut context) {
            Poll::Ready(result) => return result,
            Poll::Pending => thread::sleep(POLL_INTERVAL),
        }
    }
}
