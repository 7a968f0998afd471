//!
//! Loopback listener handing every connection to its own task
//!

use crate::{error::ConfigError, signal, Proxy};
use hyper::{body::Incoming, server::conn::http1, service::service_fn, Request};
use hyper_util::rt::{TokioIo, TokioTimer};
use sigproxy_config::server::Configuration as ServerConfiguration;
use std::{convert::Infallible, io, net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn};

pub struct Listener {
    inner: TcpListener,
    header_read_timeout: Duration,
}

impl Listener {
    /// Bind to the configured loopback address
    ///
    /// Port 0 binds to a random free port, see [`Listener::local_addr`]
    pub async fn bind(config: &ServerConfiguration) -> Result<Self, ConfigError> {
        if !config.bind_address.is_loopback() {
            return Err(ConfigError::NotLoopback(config.bind_address));
        }

        let inner = TcpListener::bind((config.bind_address, config.port)).await?;

        Ok(Self {
            inner,
            header_read_timeout: Duration::from_secs(config.header_read_timeout_secs),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accept connections until the shutdown signal fires
    ///
    /// In-flight connections are shut down gracefully before this returns
    #[instrument(skip_all, fields(address = ?self.inner.local_addr().ok()))]
    pub async fn run(self, proxy: Arc<Proxy>, shutdown: signal::Receiver) {
        info!("accepting connections");

        let tracker = TaskTracker::new();
        let shutdown_fut = shutdown.clone().wait();
        tokio::pin!(shutdown_fut);

        loop {
            tokio::select! {
                accepted = self.inner.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted connection");
                        tracker.spawn(serve(
                            stream,
                            Arc::clone(&proxy),
                            self.header_read_timeout,
                            shutdown.clone(),
                        ));
                    }
                    Err(error) => warn!(?error, "failed to accept connection"),
                },
                () = &mut shutdown_fut => break,
            }
        }

        info!("shutting down");
        tracker.close();
        tracker.wait().await;
    }
}

async fn serve(
    stream: TcpStream,
    proxy: Arc<Proxy>,
    header_read_timeout: Duration,
    shutdown: signal::Receiver,
) {
    let service = service_fn(move |request: Request<Incoming>| {
        let proxy = Arc::clone(&proxy);
        async move { Ok::<_, Infallible>(proxy.handle(request).await) }
    });

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(header_read_timeout);

    let connection = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    let result = tokio::select! {
        result = connection.as_mut() => result,
        () = shutdown.wait() => {
            connection.as_mut().graceful_shutdown();
            connection.as_mut().await
        }
    };

    if let Err(error) = result {
        debug!(?error, "connection closed with error");
    }
}
