//! Fan-in over a fixed primary + secondary endpoint pair.
//!
//! Both requests are in flight at once and may settle in any order. A failed
//! primary decides the outcome on its own, so the join returns as soon as it
//! fails and drops the secondary request. Otherwise the merge decision is made
//! once both have reached a terminal state, and depends only on the two
//! outcomes, never on which one arrived first.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::WeatherError;

/// A request against one named endpoint.
#[derive(Debug)]
pub struct Endpoint<F> {
    name: &'static str,
    request: F,
}

impl<F> Endpoint<F> {
    pub fn new(name: &'static str, request: F) -> Self {
        Self { name, request }
    }
}

/// Result of a successful join.
///
/// `secondary` is `None` when the secondary endpoint failed; the primary
/// data alone is still a usable record.
#[derive(Debug, Clone, PartialEq)]
pub struct Joined<P, S> {
    pub primary: P,
    pub secondary: Option<S>,
}

/// Run both endpoints concurrently and settle them.
pub async fn join_endpoints<P, S, FP, FS>(
    primary: Endpoint<FP>,
    secondary: Endpoint<FS>,
) -> Result<Joined<P, S>, WeatherError>
where
    FP: Future<Output = Result<P, WeatherError>>,
    FS: Future<Output = Result<S, WeatherError>>,
{
    let (primary_name, primary_request) = (primary.name, primary.request);
    let (secondary_name, secondary_request) = (secondary.name, secondary.request);
    tokio::pin!(primary_request, secondary_request);

    tokio::select! {
        primary_outcome = &mut primary_request => {
            if let Err(err) = primary_outcome {
                debug!(
                    endpoint = primary_name,
                    abandoned = secondary_name,
                    "primary endpoint failed; not waiting for secondary"
                );
                return Err(err);
            }
            let secondary_outcome = secondary_request.await;
            settle(primary_name, primary_outcome, secondary_name, secondary_outcome)
        }
        secondary_outcome = &mut secondary_request => {
            let primary_outcome = primary_request.await;
            settle(primary_name, primary_outcome, secondary_name, secondary_outcome)
        }
    }
}
/// Merge decision over two terminal outcomes.
///
/// * primary failed: its error is the result, the secondary is discarded;
/// * secondary failed: logged and dropped, the primary still succeeds;
/// * both succeeded: both are returned.
pub fn settle<P, S>(
    primary_name: &str,
    primary: Result<P, WeatherError>,
    secondary_name: &str,
    secondary: Result<S, WeatherError>,
) -> Result<Joined<P, S>, WeatherError> {
    let primary = match primary {
        Ok(primary) => primary,
        Err(err) => {
            if secondary.is_ok() {
                warn!(
                    endpoint = primary_name,
                    discarded = secondary_name,
                    "primary endpoint failed; discarding secondary result"
                );
            }
            return Err(err);
        }
    };

    let secondary = match secondary {
        Ok(secondary) => Some(secondary),
        Err(err) => {
            warn!(
                endpoint = secondary_name,
                error = %err,
                "secondary endpoint failed; continuing without it"
            );
            None
        }
    };

    Ok(Joined { primary, secondary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{future::pending, time::Duration};
    use tokio::time::sleep;

    async fn after<T>(ms: u64, value: Result<T, WeatherError>) -> Result<T, WeatherError> {
        sleep(Duration::from_millis(ms)).await;
        value
    }

    #[test]
    fn both_ok_keeps_both() {
        let joined = settle::<_, Vec<u8>>("current", Ok(1), "forecast", Ok(vec![1, 2])).unwrap();
        assert_eq!(joined.primary, 1);
        assert_eq!(joined.secondary, Some(vec![1, 2]));
    }

    #[test]
    fn primary_failure_dominates_secondary_success() {
        let err = settle::<u8, u8>(
            "current",
            Err(WeatherError::HttpStatus(401)),
            "forecast",
            Ok(7),
        )
        .unwrap_err();
        assert_eq!(err, WeatherError::HttpStatus(401));
    }

    #[test]
    fn primary_error_wins_when_both_fail() {
        let err = settle::<u8, u8>(
            "current",
            Err(WeatherError::Parse("bad".into())),
            "forecast",
            Err(WeatherError::Network("reset".into())),
        )
        .unwrap_err();
        assert_eq!(err, WeatherError::Parse("bad".into()));
    }

    #[test]
    fn secondary_failure_is_not_fatal() {
        let joined = settle::<u8, u8>(
            "current",
            Ok(3),
            "forecast",
            Err(WeatherError::HttpStatus(500)),
        )
        .unwrap();
        assert_eq!(joined.primary, 3);
        assert!(joined.secondary.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn outcome_does_not_depend_on_completion_order() {
        let slow_primary = join_endpoints(
            Endpoint::new("current", after(50, Ok::<_, WeatherError>("now"))),
            Endpoint::new("forecast", after(5, Ok::<_, WeatherError>("later"))),
        )
        .await
        .unwrap();

        let slow_secondary = join_endpoints(
            Endpoint::new("current", after(5, Ok::<_, WeatherError>("now"))),
            Endpoint::new("forecast", after(50, Ok::<_, WeatherError>("later"))),
        )
        .await
        .unwrap();

        assert_eq!(slow_primary, slow_secondary);
    }

    #[tokio::test(start_paused = true)]
    async fn late_primary_failure_still_dominates() {
        let err = join_endpoints(
            Endpoint::new(
                "current",
                after(100, Err::<u8, _>(WeatherError::HttpStatus(404))),
            ),
            Endpoint::new("forecast", after(1, Ok::<_, WeatherError>(1u8))),
        )
        .await
        .unwrap_err();

        assert_eq!(err, WeatherError::HttpStatus(404));
    }

    #[tokio::test(start_paused = true)]
    async fn requests_run_concurrently() {
        let started = tokio::time::Instant::now();
        join_endpoints(
            Endpoint::new("current", after(100, Ok::<_, WeatherError>(()))),
            Endpoint::new("forecast", after(100, Ok::<_, WeatherError>(()))),
        )
        .await
        .unwrap();

        assert!(started.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_primary_does_not_wait_for_a_hung_secondary() {
        let started = tokio::time::Instant::now();
        let outcome = tokio::time::timeout(
            Duration::from_secs(3600),
            join_endpoints(
                Endpoint::new(
                    "current",
                    after(1, Err::<u8, _>(WeatherError::HttpStatus(502))),
                ),
                Endpoint::new("forecast", pending::<Result<u8, WeatherError>>()),
            ),
        )
        .await
        .expect("join should settle once the primary has failed");

        assert_eq!(outcome.unwrap_err(), WeatherError::HttpStatus(502));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn successful_primary_waits_for_secondary() {
        let joined = join_endpoints(
            Endpoint::new("current", after(1, Ok::<_, WeatherError>(1u8))),
            Endpoint::new("forecast", after(500, Ok::<_, WeatherError>(2u8))),
        )
        .await
        .unwrap();

        assert_eq!(joined.secondary, Some(2));
    }
}
