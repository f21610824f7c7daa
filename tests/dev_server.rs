//! Development server lifecycle: started signal, bind failures, shutdown.

mod common;

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use render_backend::backend::{AnyBackend, BackendError, BackendKind, CommonOptions};
use render_backend::{NeverStarted, Started};

use common::{echo_component, start_server};

#[tokio::test]
async fn test_started_fires_only_once_accepting() {
    for kind in BackendKind::ALL {
        let backend = AnyBackend::new(kind);
        let mut app = backend.create_development_app().unwrap();
        backend.configure(&mut app, echo_component(), None).unwrap();

        let (started, mut listener) = Started::channel();
        assert!(listener.try_addr().is_none());

        let server = tokio::spawn(async move {
            backend
                .serve_development_app(app, "127.0.0.1", 0, Some(started))
                .await
        });

        let addr = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(result) = listener.try_addr() {
                    return result;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("started never fired")
        .expect("server never started");

        // Accepting as soon as the signal is observed.
        TcpStream::connect(addr).await.unwrap();

        server.abort();
        let _ = server.await;
    }
}

#[tokio::test]
async fn test_connect_refused_until_started() {
    for kind in BackendKind::ALL {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let backend = AnyBackend::new(kind);
        let app = backend.create_development_app().unwrap();
        let (started, listener) = Started::channel();
        let serve = backend.serve_development_app(app, "127.0.0.1", port, Some(started));
        tokio::pin!(serve);

        // Nothing is bound until the server future is polled.
        let refused = TcpStream::connect(("127.0.0.1", port)).await;
        assert!(refused.is_err());

        let connect_after_started = async {
            let addr = listener.await.unwrap();
            assert_eq!(addr.port(), port);
            TcpStream::connect(addr).await
        };
        tokio::select! {
            result = &mut serve => panic!("server exited early: {:?}", result),
            connected = connect_after_started => assert!(connected.is_ok()),
        }
    }
}

#[tokio::test]
async fn test_port_in_use_fails_without_started() {
    for kind in BackendKind::ALL {
        let first = start_server(kind, CommonOptions::new()).await;

        let backend = AnyBackend::new(kind);
        let app = backend.create_development_app().unwrap();
        let (started, listener) = Started::channel();
        let err = backend
            .serve_development_app(app, "127.0.0.1", first.addr.port(), Some(started))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Bind { .. }));
        assert!(err.is_addr_in_use());
        assert_eq!(listener.await, Err(NeverStarted));

        // The server already holding the port keeps serving.
        let response = reqwest::get(first.http_url("/")).await.unwrap();
        assert_eq!(response.status(), 200);
        let response = reqwest::get(first.http_url("/_reactpy/stream")).await.unwrap();
        assert_ne!(response.status(), 404);

        first.stop().await.unwrap();
    }
}

#[tokio::test]
async fn test_shutdown_releases_port() {
    for kind in BackendKind::ALL {
        let server = start_server(kind, CommonOptions::new()).await;
        let addr = server.addr;

        server.stop().await.unwrap();
        std::net::TcpListener::bind(addr).expect("port still held after shutdown");
    }
}

#[tokio::test]
async fn test_dropping_server_future_releases_port() {
    for kind in BackendKind::ALL {
        let backend = AnyBackend::new(kind);
        let app = backend.create_development_app().unwrap();
        let (started, listener) = Started::channel();

        let server = tokio::spawn(async move {
            backend
                .serve_development_app(app, "127.0.0.1", 0, Some(started))
                .await
        });
        let addr = listener.await.unwrap();

        server.abort();
        assert!(server.await.unwrap_err().is_cancelled());
        std::net::TcpListener::bind(addr).expect("port still held after cancellation");
    }
}

#[tokio::test]
async fn test_shutdown_closes_idle_connections() {
    for kind in BackendKind::ALL {
        let server = start_server(kind, CommonOptions::new()).await;

        let mut stream = TcpStream::connect(server.addr).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut buf = [0u8; 1024];
        let n = stream.read(&mut buf).await.unwrap();
        assert!(buf[..n].starts_with(b"HTTP/1.1 200"));

        server.stop().await.unwrap();

        // A kept-alive connection is closed by the server, not left dangling.
        let mut rest = Vec::new();
        tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut rest))
            .await
            .expect("connection left open after shutdown")
            .unwrap();
    }
}
