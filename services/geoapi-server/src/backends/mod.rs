//! Web framework backends.
//!
//! Each backend reduces its native request to `RequestParts`, runs the
//! shared pipeline and renders the `ApiResponse` in its own response type:
//!
//! - [`blocking`]: in-memory `http` requests, routed and executed inline
//! - [`axum`]: async router, business logic offloaded to the blocking pool
//! - [`hyper`]: own accept loop, blocking dispatch on one worker thread per
//!   request

pub mod axum;
pub mod blocking;
pub mod hyper;

use std::error::Error as StdError;

use http_body_util::LengthLimitError;
use tracing::{error, info};

/// Largest request body a backend reads into an envelope.
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Whether a body read failed because the body is over [`MAX_BODY_BYTES`].
pub fn exceeds_body_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// Resolves on the first SIGTERM or Ctrl-C the process receives.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = sigterm => {}
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{BodyExt, Full, Limited};

    #[tokio::test]
    async fn test_exceeds_body_limit() {
        let body = Limited::new(Full::new(bytes::Bytes::from(vec![0u8; 16])), 8);
        let err = body.collect().await.unwrap_err();
        assert!(exceeds_body_limit(&*err));

        let other = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "connection reset");
        assert!(!exceeds_body_limit(&other));
    }
}
