use std::{future::Future, time::Duration};

use anyhow::{anyhow, Result};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Outcome of a best-effort call: either the real value or the fallback that
/// replaced a failure. Both carry a usable `T`.
#[derive(Debug, Clone, PartialEq)]
pub enum Recovered<T> {
    Fresh(T),
    Fallback(T),
}

impl<T> Recovered<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Recovered::Fallback(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Recovered::Fresh(value) | Recovered::Fallback(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Recovered::Fresh(value) | Recovered::Fallback(value) => value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Recovered<U> {
        match self {
            Recovered::Fresh(value) => Recovered::Fresh(f(value)),
            Recovered::Fallback(value) => Recovered::Fallback(f(value)),
        }
    }
}

/// Resolves `result` into a [`Recovered`], logging the failure it swallows.
pub fn recover<T>(operation: &str, result: Result<T>, fallback: impl FnOnce() -> T) -> Recovered<T> {
    match result {
        Ok(value) => Recovered::Fresh(value),
        Err(err) => {
            log_warn!("{operation} failed, using fallback: {err:#}");
            Recovered::Fallback(fallback())
        }
    }
}

/// Awaits `fut`, turning an elapsed deadline into an ordinary error.
pub(crate) async fn with_deadline<T, F>(operation: &str, limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| anyhow!("{operation} timed out after {}ms", limit.as_millis()))?,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recover_keeps_successful_values() {
        let value = recover("test", Ok(7), || 0);
        assert_eq!(value, Recovered::Fresh(7));
        assert!(!value.is_fallback());
    }

    #[test]
    fn recover_replaces_errors_with_fallback() {
        let value: Recovered<i32> = recover("test", Err(anyhow!("boom")), || 42);
        assert!(value.is_fallback());
        assert_eq!(value.into_inner(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_turns_into_error() {
        let result: Result<()> = with_deadline(
            "slow call",
            Some(Duration::from_millis(10)),
            std::future::pending(),
        )
        .await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
