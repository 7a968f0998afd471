//!
//! Lifecycle of a single proxied request
//!

use crate::error::Error;
use http::{Method, StatusCode};
use sigproxy_config::proxy::Mode;
use std::time::{Duration, Instant};
use strum::{AsRefStr, Display};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(AsRefStr, Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    /// Request head and body were read
    Received,
    /// Upstream request and signature string were built
    Canonicalized,
    Signed,
    Verified,
    /// Request was handed to the upstream
    Forwarded,
    Completed,
    Rejected,
}

impl Stage {
    /// Whether the exchange may move from `self` to `next`
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Received, Self::Canonicalized | Self::Rejected)
                | (
                    Self::Canonicalized,
                    Self::Signed | Self::Verified | Self::Forwarded | Self::Rejected
                )
                | (Self::Signed, Self::Forwarded)
                | (Self::Verified, Self::Forwarded | Self::Rejected)
                | (Self::Forwarded, Self::Completed | Self::Rejected)
        )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

/// State carried through the lifetime of one request/response pair
#[derive(Debug)]
pub struct Exchange {
    id: Uuid,
    mode: Mode,
    method: Method,
    path: String,
    stage: Stage,
    started_at: Instant,
}

impl Exchange {
    #[must_use]
    pub fn new(mode: Mode, method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            method,
            path: path.into(),
            stage: Stage::Received,
            started_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Move to the next stage
    ///
    /// Invalid transitions are logged and ignored
    pub fn transition(&mut self, next: Stage) {
        if !self.stage.can_transition_to(next) {
            warn!(
                exchange_id = %self.id,
                from = %self.stage,
                to = %next,
                "invalid stage transition"
            );
            return;
        }

        debug!(exchange_id = %self.id, from = %self.stage, to = %next, "stage transition");
        self.stage = next;
    }

    pub fn complete(&mut self, status: StatusCode) {
        self.transition(Stage::Completed);
        info!(
            exchange_id = %self.id,
            mode = ?self.mode,
            method = %self.method,
            path = %self.path,
            status = status.as_u16(),
            elapsed_ms = self.elapsed().as_millis(),
            "exchange completed",
        );
    }

    pub fn reject(&mut self, error: &Error) {
        let status = error.status();

        // Transport-level failures can end the exchange from any stage
        if !self.stage.can_transition_to(Stage::Rejected) {
            debug!(exchange_id = %self.id, from = %self.stage, "forced rejection");
        }
        self.stage = Stage::Rejected;

        info!(
            exchange_id = %self.id,
            mode = ?self.mode,
            method = %self.method,
            path = %self.path,
            status = status.as_u16(),
            reason = %error,
            elapsed_ms = self.elapsed().as_millis(),
            "exchange rejected",
        );
    }
}

#[cfg(test)]
mod test {
    use super::{Exchange, Stage};
    use crate::error::Error;
    use http::{Method, StatusCode};
    use sigproxy_config::proxy::Mode;

    const ALL: [Stage; 7] = [
        Stage::Received,
        Stage::Canonicalized,
        Stage::Signed,
        Stage::Verified,
        Stage::Forwarded,
        Stage::Completed,
        Stage::Rejected,
    ];

    #[test]
    fn terminal_stages_are_final() {
        for stage in ALL.into_iter().filter(|stage| stage.is_terminal()) {
            assert!(ALL.iter().all(|next| !stage.can_transition_to(*next)));
        }
    }

    #[test]
    fn outbound_path() {
        let mut exchange = Exchange::new(Mode::Outbound, Method::GET, "/ping");
        for stage in [Stage::Canonicalized, Stage::Signed, Stage::Forwarded] {
            exchange.transition(stage);
            assert_eq!(exchange.stage(), stage);
        }

        exchange.complete(StatusCode::OK);
        assert_eq!(exchange.stage(), Stage::Completed);
    }

    #[test]
    fn invalid_transition_is_ignored() {
        let mut exchange = Exchange::new(Mode::Inbound, Method::GET, "/ping");
        exchange.transition(Stage::Completed);
        assert_eq!(exchange.stage(), Stage::Received);

        exchange.transition(Stage::Signed);
        assert_eq!(exchange.stage(), Stage::Received);
    }

    #[test]
    fn rejection() {
        let mut exchange = Exchange::new(Mode::Inbound, Method::GET, "/ping");
        exchange.transition(Stage::Canonicalized);
        exchange.reject(&Error::MissingSignature);

        assert_eq!(exchange.stage(), Stage::Rejected);
        assert_ne!(exchange.id(), Exchange::new(Mode::Inbound, Method::GET, "/").id());
    }
}
