//! Deadlines for collaborator calls.
//!
//! Every store, cache and role-store call made on behalf of a request is
//! wrapped in [`with_deadline`]. Dropping the request future (client gone,
//! request timeout fired) cancels the wrapped call as well.

use std::future::Future;
use std::time::Duration;

use crate::error::{GateError, GateResult};

/// Run `fut`, failing with an infrastructure error once `deadline` elapses.
///
/// A `None` deadline leaves the call unbounded.
pub async fn with_deadline<T, F>(what: &'static str, deadline: Option<Duration>, fut: F) -> GateResult<T>
where
    F: Future<Output = GateResult<T>>,
{
    match deadline {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(call = what, timeout = ?limit, "Collaborator call timed out");
                Err(GateError::Infrastructure(format!("{} timed out after {:?}", what, limit)))
            }
        },
        None => fut.await,
    }
}
