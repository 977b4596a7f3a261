use crate::{clock::TokioClock, Window};
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower_service::Service;

/// Wraps a [`Service`], recording each response in a [`Window`].
///
/// `Ok` responses are recorded as successes and `Err` responses as failures.
/// Deciding what to do with the resulting error rate is left to the caller.
#[derive(Debug)]
pub struct Recorded<S, C = TokioClock> {
    inner: S,
    window: Arc<Window<C>>,
}

pin_project_lite::pin_project! {
    #[derive(Debug)]
    pub struct ResponseFuture<C, F> {
        #[pin]
        future: F,
        window: Arc<Window<C>>,
    }
}

// === impl Recorded ===

impl<S, C> Recorded<S, C> {
    pub fn new(window: Arc<Window<C>>, inner: S) -> Self {
        Recorded { inner, window }
    }

    pub fn window(&self) -> &Arc<Window<C>> {
        &self.window
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Clone, C> Clone for Recorded<S, C> {
    fn clone(&self) -> Self {
        Recorded {
            inner: self.inner.clone(),
            window: self.window.clone(),
        }
    }
}

impl<S, C, Req> Service<Req> for Recorded<S, C>
where
    S: Service<Req>,
    C: crate::Clock,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<C, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        ResponseFuture {
            future: self.inner.call(req),
            window: self.window.clone(),
        }
    }
}

// === impl ResponseFuture ===

impl<C, F, T, E> Future for ResponseFuture<C, F>
where
    F: Future<Output = Result<T, E>>,
    C: crate::Clock,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match this.future.poll(cx) {
            Poll::Ready(Ok(res)) => {
                this.window.success();
                Poll::Ready(Ok(res))
            }
            Poll::Ready(Err(err)) => {
                this.window.fail();
                tracing::trace!(
                    error_rate = this.window.error_rate(),
                    "recorded failed response"
                );
                Poll::Ready(Err(err))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
