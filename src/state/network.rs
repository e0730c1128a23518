use crate::state::messages::{NetworkRequest, NetworkResponse};
use bc_api::client::{ApiError, BcApi};
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::mpsc;

/// Owns the API client and drains the request channel. Errors become
/// inline `Error` responses — a failed panel never takes the app down.
pub struct NetworkWorker {
    client: BcApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    /// Cooperative cancellation for the player-stats pagination loop;
    /// raised on shutdown.
    cancel: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client: BcApi::new(),
            requests,
            responses,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let result = self.handle(request).await;
            debug!("network request complete");

            let response = match result {
                Ok(response) => response,
                // A cancelled pagination loop means we're shutting down;
                // there is nothing useful to report.
                Err(ApiError::Cancelled) => continue,
                Err(err) => NetworkResponse::Error { message: err.to_string() },
            };

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle(&self, request: NetworkRequest) -> Result<NetworkResponse, ApiError> {
        match request {
            NetworkRequest::LoadLadder { scope } => {
                debug!("loading ladder for division {}", scope.division_id);
                let rows = self.client.fetch_ladder(&scope).await?;
                Ok(NetworkResponse::LadderLoaded { rows })
            }
            NetworkRequest::LoadFixtures { competition_id, division_id } => {
                debug!("loading fixtures for division {division_id}");
                let matches = self
                    .client
                    .fetch_fixtures(competition_id.as_deref(), division_id, &[])
                    .await?;
                Ok(NetworkResponse::FixturesLoaded { matches })
            }
            NetworkRequest::LoadPlayerStats { scope } => {
                debug!("loading player statistics for division {}", scope.division_id);
                let index = self
                    .client
                    .fetch_player_statistics(&scope, &self.cancel)
                    .await?;
                Ok(NetworkResponse::PlayerStatsLoaded { index })
            }
            NetworkRequest::LoadSummary { scope } => {
                debug!("computing stats summary for division {}", scope.division_id);
                let summary = self.client.fetch_stats_summary(&scope).await?;
                Ok(NetworkResponse::SummaryLoaded { summary })
            }
        }
    }
}
