//! Common utilities

use std::{future::Future, time::Duration};

use crate::connection::Error;

/// Runs `fut` to completion, failing with [`Error::ClientTimeout`] if it does
/// not finish within `duration`
pub(crate) async fn with_timeout<F, T>(duration: Duration, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::ClientTimeout),
    }
}
