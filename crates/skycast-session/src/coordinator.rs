//! Request coordination: generation tokens, cancellation, and the shared
//! request deadline.
//!
//! Every network operation belongs to a family. Starting a new operation in
//! a family cancels the in-flight one and hands out a ticket carrying a
//! fresh generation number; results are applied only while the ticket is
//! still current. This makes "latest request wins" hold even when an older
//! request settles after a newer one.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use skycast_core::LookupError;

/// Deadline applied to every supervised network operation.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(14_000);

/// Independent request families. A new search never cancels a weather
/// fetch, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Search,
    Weather,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    inflight: Option<CancellationToken>,
}

/// Pass to attempt an operation in a family. Holding a ticket does not
/// guarantee the result will be applied; check [`Coordinator::is_current`]
/// after the operation settles.
#[derive(Debug)]
pub struct Ticket {
    family: Family,
    generation: u64,
    cancel: CancellationToken,
}

impl Ticket {
    pub fn family(&self) -> Family {
        self.family
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Per-family generation counters and cancellation tokens.
#[derive(Debug, Default)]
pub struct Coordinator {
    search: Mutex<Slot>,
    weather: Mutex<Slot>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, family: Family) -> &Mutex<Slot> {
        match family {
            Family::Search => &self.search,
            Family::Weather => &self.weather,
        }
    }

    /// Start a new operation: cancels the family's in-flight operation (if
    /// any) and returns a ticket for the fresh generation.
    pub fn begin(&self, family: Family) -> Ticket {
        self.begin_linked(family, None)
    }

    /// Like [`begin`](Self::begin), but the ticket's token is a child of
    /// `external`, so an outside abort cancels this operation too.
    pub fn begin_linked(&self, family: Family, external: Option<&CancellationToken>) -> Ticket {
        let mut slot = self.slot(family).lock();
        slot.generation += 1;
        if let Some(previous) = slot.inflight.take() {
            previous.cancel();
        }
        let cancel = match external {
            Some(token) => token.child_token(),
            None => CancellationToken::new(),
        };
        slot.inflight = Some(cancel.clone());
        tracing::debug!(?family, generation = slot.generation, "request began");
        Ticket {
            family,
            generation: slot.generation,
            cancel,
        }
    }

    /// Cancel the family's in-flight operation without starting a new one.
    /// Used when the triggering input is withdrawn (query cleared).
    pub fn invalidate(&self, family: Family) {
        let mut slot = self.slot(family).lock();
        slot.generation += 1;
        if let Some(previous) = slot.inflight.take() {
            previous.cancel();
        }
    }

    /// Whether the ticket still represents the family's latest operation.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.slot(ticket.family).lock().generation == ticket.generation
    }
}

/// Race an operation against its ticket's cancellation and the shared
/// deadline. Dropping the losing future aborts the underlying request.
pub async fn supervise<T, F>(ticket: &Ticket, operation: F) -> Result<T, LookupError>
where
    F: Future<Output = Result<T, LookupError>>,
{
    tokio::select! {
        () = ticket.cancel.cancelled() => Err(LookupError::Cancelled),
        () = tokio::time::sleep(REQUEST_TIMEOUT) => Err(LookupError::Timeout),
        out = operation => out,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::future::pending;

    #[test]
    fn test_begin_supersedes_previous() {
        let coordinator = Coordinator::new();
        let first = coordinator.begin(Family::Search);
        let second = coordinator.begin(Family::Search);

        assert!(first.cancel.is_cancelled());
        assert!(!second.cancel.is_cancelled());
        assert!(!coordinator.is_current(&first));
        assert!(coordinator.is_current(&second));
    }

    #[test]
    fn test_families_are_independent() {
        let coordinator = Coordinator::new();
        let search = coordinator.begin(Family::Search);
        let weather = coordinator.begin(Family::Weather);
        coordinator.begin(Family::Search);

        assert!(!coordinator.is_current(&search));
        assert!(coordinator.is_current(&weather));
        assert!(!weather.cancel.is_cancelled());
    }

    #[test]
    fn test_invalidate_cancels_without_successor() {
        let coordinator = Coordinator::new();
        let ticket = coordinator.begin(Family::Search);
        coordinator.invalidate(Family::Search);

        assert!(ticket.cancel.is_cancelled());
        assert!(!coordinator.is_current(&ticket));
    }

    #[tokio::test(start_paused = true)]
    async fn test_supervise_passes_through_results() {
        let coordinator = Coordinator::new();
        let ticket = coordinator.begin(Family::Weather);
        let out = supervise(&ticket, async { Ok::<_, LookupError>(7) }).await;
        assert_eq!(out.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_supervise_times_out() {
        let coordinator = Coordinator::new();
        let ticket = coordinator.begin(Family::Weather);
        let out = supervise(&ticket, pending::<Result<(), LookupError>>()).await;
        assert!(matches!(out, Err(LookupError::Timeout)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_supervise_allows_slow_success_inside_deadline() {
        let coordinator = Coordinator::new();
        let ticket = coordinator.begin(Family::Weather);
        let out = supervise(&ticket, async {
            tokio::time::sleep(Duration::from_millis(13_999)).await;
            Ok::<_, LookupError>("late but in time")
        })
        .await;
        assert_eq!(out.unwrap(), "late but in time");
    }

    #[tokio::test(start_paused = true)]
    async fn test_supervise_reports_supersession_as_cancelled() {
        let coordinator = Coordinator::new();
        let ticket = coordinator.begin(Family::Search);
        coordinator.begin(Family::Search);

        let out = supervise(&ticket, pending::<Result<(), LookupError>>()).await;
        assert!(matches!(out, Err(LookupError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_token_aborts_linked_ticket() {
        let coordinator = Coordinator::new();
        let external = CancellationToken::new();
        let ticket = coordinator.begin_linked(Family::Weather, Some(&external));

        external.cancel();
        let out = supervise(&ticket, pending::<Result<(), LookupError>>()).await;
        assert!(matches!(out, Err(LookupError::Cancelled)));
    }
}
