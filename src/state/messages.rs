use bc_api::client::DivisionScope;
use bc_api::scorers::PlayerStatsIndex;
use bc_api::{Competition, Division, Fixture, LadderRow, StatsSummary};

/// Requests for the live panels. Competition and division lists are
/// resolved once at startup, directly, and never refreshed.
#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadLadder {
        scope: DivisionScope,
    },
    LoadFixtures {
        competition_id: Option<String>,
        division_id: i64,
    },
    LoadPlayerStats {
        scope: DivisionScope,
    },
    LoadSummary {
        scope: DivisionScope,
    },
}

#[derive(Debug)]
pub enum NetworkResponse {
    CompetitionsLoaded { competitions: Vec<Competition> },
    DivisionsLoaded { divisions: Vec<Division> },
    LadderLoaded { rows: Vec<LadderRow> },
    FixturesLoaded { matches: Vec<Fixture> },
    PlayerStatsLoaded { index: PlayerStatsIndex },
    SummaryLoaded { summary: StatsSummary },
    Error { message: String },
}
