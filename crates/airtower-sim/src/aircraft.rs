//! One simulated aircraft: asks the tower for a runway once, then is done.

use std::sync::Arc;

use airtower::{CancellationToken, ControlTower, FlightClass, OperationId, TowerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aircraft {
    id: OperationId,
    class: FlightClass,
}

/// How an aircraft's single request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlightOutcome {
    Completed,
    Interrupted,
    Rejected(TowerError),
}

impl Aircraft {
    pub fn new(id: u64, class: FlightClass) -> Self {
        Self {
            id: OperationId::new(id),
            class,
        }
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn class(&self) -> FlightClass {
        self.class
    }

    pub async fn run(self, tower: Arc<ControlTower>, cancel: CancellationToken) -> FlightOutcome {
        match tower.request(self.class, self.id, &cancel).await {
            Ok(()) => FlightOutcome::Completed,
            Err(e) if e.is_interrupted() => {
                tracing::warn!(id = %self.id, class = %self.class, "aircraft {} was interrupted during its operation", self.id);
                FlightOutcome::Interrupted
            }
            Err(e) => {
                tracing::error!(id = %self.id, class = %self.class, error = %e, "Aircraft request rejected");
                FlightOutcome::Rejected(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airtower::{MemoryTrace, TowerConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tracing::{Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Counts events at WARN or above.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S> Layer<S> for WarnCounter
    where
        S: Subscriber,
    {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() <= Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn tower() -> Arc<ControlTower> {
        let config = TowerConfig::live_count(2).with_hold(Duration::from_millis(100));
        Arc::new(ControlTower::new(config, Arc::new(MemoryTrace::new())).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn landing_completes() {
        let aircraft = Aircraft::new(1, FlightClass::Landing);
        let outcome = aircraft.run(tower(), CancellationToken::new()).await;
        assert_eq!(outcome, FlightOutcome::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_aircraft_is_interrupted() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = Aircraft::new(2, FlightClass::Takeoff)
            .run(tower(), cancel)
            .await;
        assert_eq!(outcome, FlightOutcome::Interrupted);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_id_is_rejected() {
        let tower = tower();
        let first = tokio::spawn(Aircraft::new(3, FlightClass::Landing).run(
            Arc::clone(&tower),
            CancellationToken::new(),
        ));
        while tower.operation_state(OperationId::new(3)).is_none() {
            tokio::task::yield_now().await;
        }

        let outcome = Aircraft::new(3, FlightClass::Takeoff)
            .run(Arc::clone(&tower), CancellationToken::new())
            .await;
        assert_eq!(
            outcome,
            FlightOutcome::Rejected(TowerError::DuplicateOperation(OperationId::new(3)))
        );
        assert_eq!(first.await.unwrap(), FlightOutcome::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn interruption_mid_hold_logs_one_warning() {
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));
        let _guard = tracing::subscriber::set_default(subscriber);

        let config = TowerConfig::live_count(1).with_hold(Duration::from_secs(5));
        let tower = Arc::new(ControlTower::new(config, Arc::new(MemoryTrace::new())).unwrap());
        let cancel = CancellationToken::new();

        let (outcome, ()) = tokio::join!(
            Aircraft::new(1, FlightClass::Landing).run(Arc::clone(&tower), cancel.clone()),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                cancel.cancel();
            }
        );

        assert_eq!(outcome, FlightOutcome::Interrupted);
        assert_eq!(tower.snapshot().counters.processed, 1);
        assert_eq!(warnings.load(Ordering::SeqCst), 1);
    }
}
