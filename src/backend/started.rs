//! One-shot readiness signal for development servers.
//!
//! The sending half is consumed when fired, so firing twice does not
//! compile. The receiving half resolves with the bound address, or with an
//! error if the server gave up before it started accepting.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::oneshot;

/// The server stopped before signalling readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("server stopped before it started accepting connections")]
pub struct NeverStarted;

/// Sending half: fired once by the server after bind, before first accept.
#[derive(Debug)]
pub struct Started {
    tx: oneshot::Sender<SocketAddr>,
}

/// Receiving half: awaited by whoever needs the server to be ready.
#[derive(Debug)]
pub struct StartedListener {
    rx: oneshot::Receiver<SocketAddr>,
}

impl Started {
    /// Create a connected signal pair.
    pub fn channel() -> (Started, StartedListener) {
        let (tx, rx) = oneshot::channel();
        (Started { tx }, StartedListener { rx })
    }

    /// Fire the signal with the address the server bound to.
    pub fn fire(self, addr: SocketAddr) {
        if self.tx.send(addr).is_err() {
            tracing::debug!(address = %addr, "Started listener dropped before signal");
        }
    }
}

impl StartedListener {
    /// Non-blocking check; `Some` once the server is accepting.
    pub fn try_addr(&mut self) -> Option<Result<SocketAddr, NeverStarted>> {
        match self.rx.try_recv() {
            Ok(addr) => Some(Ok(addr)),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(NeverStarted)),
        }
    }
}

impl Future for StartedListener {
    type Output = Result<SocketAddr, NeverStarted>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|res| res.map_err(|_| NeverStarted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_delivers_address() {
        let (started, listener) = Started::channel();
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        started.fire(addr);
        assert_eq!(listener.await, Ok(addr));
    }

    #[tokio::test]
    async fn test_dropped_sender_reports_never_started() {
        let (started, mut listener) = Started::channel();
        assert_eq!(listener.try_addr(), None);
        drop(started);
        assert_eq!(listener.try_addr(), Some(Err(NeverStarted)));
    }
}
