use crate::state::messages::NetworkRequest;
use bc_api::client::DivisionScope;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Periodic re-fetch of the live panels (ladder, fixtures, summary) for
/// the active division. Competition/division lists are loaded once at
/// startup and not refreshed.
pub struct PeriodicRefresher {
    requests: mpsc::Sender<NetworkRequest>,
    scope: DivisionScope,
    period: Duration,
}

impl PeriodicRefresher {
    pub fn new(
        requests: mpsc::Sender<NetworkRequest>,
        scope: DivisionScope,
        period: Duration,
    ) -> Self {
        Self { requests, scope, period }
    }

    pub async fn run(self) {
        let mut ticks = interval(self.period);
        // Skip the immediate first tick so startup loading isn't
        // double-triggered.
        ticks.tick().await;

        loop {
            ticks.tick().await;
            let batch = [
                NetworkRequest::LoadLadder { scope: self.scope.clone() },
                NetworkRequest::LoadFixtures {
                    competition_id: self.scope.competition_id.clone(),
                    division_id: self.scope.division_id,
                },
                NetworkRequest::LoadSummary { scope: self.scope.clone() },
            ];
            for request in batch {
                if self.requests.send(request).await.is_err() {
                    return;
                }
            }
        }
    }
}
