use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use pin_project_lite::pin_project;
use tokio::time::{Instant, Sleep, sleep_until};

pin_project! {
    /// Future that resolves once a deadline has passed.
    ///
    /// Without a deadline it stays pending forever, which lets it sit in a `select!` branch
    /// unconditionally.
    #[derive(Debug)]
    pub struct DeadlineElapsed {
        #[pin]
        sleep: Option<Sleep>,
    }
}

impl DeadlineElapsed {
    /// Creates a new [`DeadlineElapsed`] for the optional `deadline`.
    pub fn new(deadline: Option<Instant>) -> Self {
        Self {
            sleep: deadline.map(sleep_until),
        }
    }
}

impl Future for DeadlineElapsed {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match this.sleep.as_pin_mut() {
            Some(sleep) => sleep.poll(cx),
            None => Poll::Pending,
        }
    }
}
