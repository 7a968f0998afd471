use tokio_util::sync::CancellationToken;
use tracing::warn;

#[cfg(target_family = "unix")]
use tokio::signal::unix::{signal, SignalKind};

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(target_family = "unix")]
    let second_signal = async {
        match (signal(SignalKind::terminate()), signal(SignalKind::quit())) {
            (Ok(mut terminate), Ok(mut quit)) => {
                tokio::select! {
                    _ = terminate.recv() => (),
                    _ = quit.recv() => (),
                }
            }
            (Err(error), _) | (_, Err(error)) => {
                warn!(?error, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(target_family = "unix"))]
    let second_signal = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => (),
        () = second_signal => (),
    }
}

#[derive(Clone)]
pub struct Receiver {
    inner: CancellationToken,
}

impl Receiver {
    pub async fn wait(self) {
        self.inner.cancelled_owned().await;
    }
}

impl From<CancellationToken> for Receiver {
    fn from(inner: CancellationToken) -> Self {
        Self { inner }
    }
}

#[must_use]
pub fn shutdown() -> Receiver {
    let notifier = CancellationToken::new();

    {
        let notifier = notifier.clone();

        tokio::spawn(async move {
            shutdown_signal().await;
            notifier.cancel();
        });
    }

    Receiver { inner: notifier }
}
