mod app;
mod render;
mod state;

use crate::app::App;
use crate::state::app_settings::AppSettings;
use crate::state::favourites::{JsonFileStore, default_storage_path};
use crate::state::messages::{NetworkRequest, NetworkResponse};
use crate::state::network::NetworkWorker;
use crate::state::refresher::PeriodicRefresher;
use anyhow::Context;
use bc_api::client::BcApi;
use bc_api::summary;
use bc_api::{LadderRow, SavedTeam};
use chrono::Utc;
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Default)]
struct CliOptions {
    watch: bool,
    json: bool,
    /// Team to focus (id, or case-insensitive name); saved teams from
    /// other divisions are jumped to.
    team: Option<String>,
    /// Team to pin/unpin as a favourite.
    pin: Option<String>,
    unpin: Option<String>,
    /// Round name to filter fixtures by.
    round: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(options) = handle_cli_args() else {
        return Ok(());
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let settings = AppSettings::load()?;
    let store = JsonFileStore::open(default_storage_path());
    let mut app = App::new(settings, Box::new(store));

    bootstrap(&mut app).await?;

    if options.watch {
        watch(app).await
    } else {
        one_shot(app, options).await
    }
}

fn handle_cli_args() -> Option<CliOptions> {
    let mut options = CliOptions::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", usage_text());
                return None;
            }
            "-V" | "--version" => {
                println!("hoopshub {}", env!("CARGO_PKG_VERSION"));
                return None;
            }
            "--watch" => options.watch = true,
            "--json" => options.json = true,
            "--team" => options.team = Some(expect_value(&mut args, "--team")),
            "--pin" => options.pin = Some(expect_value(&mut args, "--pin")),
            "--unpin" => options.unpin = Some(expect_value(&mut args, "--unpin")),
            "--round" => options.round = Some(expect_value(&mut args, "--round")),
            _ => {
                eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
                std::process::exit(2);
            }
        }
    }
    Some(options)
}

fn expect_value(args: &mut impl Iterator<Item = String>, flag: &str) -> String {
    args.next().unwrap_or_else(|| {
        eprintln!("Missing value for {flag}\n\n{}", usage_text());
        std::process::exit(2);
    })
}

fn usage_text() -> &'static str {
    "hoopshub - BasketballConnect ladders, fixtures, and player stats

Usage:
  hoopshub                Fetch everything once and print it
  hoopshub --json         Same, as a JSON document
  hoopshub --watch        Keep refreshing the live panels until Ctrl-C
  hoopshub --team TEAM    Focus a team (id or name) and filter fixtures
  hoopshub --round NAME   Filter fixtures to one round
  hoopshub --pin TEAM     Toggle a team as a saved favourite
  hoopshub --unpin TEAM   Remove a saved favourite
  hoopshub --help
  hoopshub --version

Environment:
  HOOPS_ORG_KEY          BasketballConnect organisation key (required)
  HOOPS_YEAR_REF_ID      Registration year reference id (required)
  HOOPS_COMPETITION_ID   Preferred competition (any of its identifiers)
  HOOPS_REFRESH_SECS     Refresh period for --watch (default 30)
  HOOPS_STATS_JSON       Path to a static player-stats snapshot document"
}

/// Resolve the competition and division selection: competitions list,
/// default-or-first competition, that competition's divisions.
async fn bootstrap(app: &mut App) -> anyhow::Result<()> {
    let client = BcApi::new();

    let competitions = client
        .fetch_competitions(&app.settings.organisation_key, app.settings.year_ref_id)
        .await
        .context("could not load competitions")?;
    anyhow::ensure!(!competitions.is_empty(), "no competitions found for this organisation/year");
    app.apply(NetworkResponse::CompetitionsLoaded { competitions });

    let competition = app
        .state
        .selected_competition()
        .context("no competition selected")?;
    info!("competition: {}", competition.display_name());

    let division_competition_id = competition
        .id
        .clone()
        .or_else(|| competition.unique_key.clone())
        .context("selected competition has no identifier")?;
    let divisions = client
        .fetch_divisions(&division_competition_id)
        .await
        .context("could not load divisions")?;
    anyhow::ensure!(!divisions.is_empty(), "no divisions found for this competition");
    app.apply(NetworkResponse::DivisionsLoaded { divisions });

    Ok(())
}

/// Fetch the three live panels concurrently, derive the summary, print.
/// A failed panel renders an inline error in its place; the others still
/// show.
async fn one_shot(mut app: App, options: CliOptions) -> anyhow::Result<()> {
    let client = BcApi::new();

    // A --team naming a saved favourite is jumped to before fetching, the
    // way the saved-teams list drives division switches.
    if let Some(query) = &options.team
        && let Some(saved) = find_saved_team(&app.state.saved_teams, query).cloned()
    {
        app.state.select_saved_team(&saved);
    }

    let scope = app
        .division_scope()
        .context("competition/division selection incomplete")?;
    let cancel = AtomicBool::new(false);

    let (ladder, fixtures, stats) = tokio::join!(
        client.fetch_ladder(&scope),
        client.fetch_fixtures(scope.competition_id.as_deref(), scope.division_id, &[]),
        client.fetch_player_statistics(&scope, &cancel),
    );

    let mut panel_errors: Vec<(&str, String)> = Vec::new();
    match ladder {
        Ok(rows) => app.apply(NetworkResponse::LadderLoaded { rows }),
        Err(e) => panel_errors.push(("ladder", e.to_string())),
    }
    match fixtures {
        Ok(matches) => app.apply(NetworkResponse::FixturesLoaded { matches }),
        Err(e) => panel_errors.push(("fixtures", e.to_string())),
    }
    match stats {
        Ok(index) => app.apply(NetworkResponse::PlayerStatsLoaded { index }),
        Err(e) => panel_errors.push(("player stats", e.to_string())),
    }

    let stats_summary =
        summary::compute_summary(&app.state.ladder, &app.state.matches, Utc::now());
    app.apply(NetworkResponse::SummaryLoaded { summary: stats_summary });

    apply_team_flags(&mut app, &options);

    if options.json {
        print_json(&app)?;
    } else {
        print_panels(&app, &panel_errors);
    }
    Ok(())
}

fn apply_team_flags(app: &mut App, options: &CliOptions) {
    if let Some(query) = &options.team
        && app.state.selected_team().is_none()
    {
        match find_ladder_team(&app.state.ladder, query).and_then(|row| row.id.clone()) {
            Some(id) => app.select_team(Some(id.as_str())),
            None => warn!("--team {query}: no such team in this ladder"),
        }
    }
    if let Some(query) = &options.pin {
        match find_ladder_team(&app.state.ladder, query).cloned() {
            Some(row) => app.toggle_favourite(&row),
            None => warn!("--pin {query}: no such team in this ladder"),
        }
    }
    if let Some(query) = &options.unpin {
        let id = find_saved_team(&app.state.saved_teams, query)
            .map(|team| team.id.clone())
            .or_else(|| {
                find_ladder_team(&app.state.ladder, query).and_then(|row| row.id.clone())
            });
        match id {
            Some(id) => app.remove_favourite(&id),
            None => warn!("--unpin {query}: no such saved team"),
        }
    }
    if let Some(round) = &options.round {
        let known = app
            .state
            .available_rounds()
            .into_iter()
            .find(|name| name.eq_ignore_ascii_case(round.trim()));
        match known {
            Some(name) => app.state.select_round(Some(name.as_str())),
            None => warn!("--round {round}: no such round in these fixtures"),
        }
    }
}

/// Match by id first, then case-insensitive name.
fn find_ladder_team<'a>(rows: &'a [LadderRow], query: &str) -> Option<&'a LadderRow> {
    rows.iter()
        .find(|row| row.id.as_deref() == Some(query))
        .or_else(|| {
            rows.iter().find(|row| {
                row.name
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(query))
            })
        })
}

fn find_saved_team<'a>(teams: &'a [SavedTeam], query: &str) -> Option<&'a SavedTeam> {
    teams
        .iter()
        .find(|team| team.id == query)
        .or_else(|| teams.iter().find(|team| team.name.eq_ignore_ascii_case(query)))
}

fn print_panels(app: &App, panel_errors: &[(&str, String)]) {
    let now = Utc::now();
    let state = &app.state;

    if let Some(competition) = state.selected_competition() {
        let division = state
            .selected_division()
            .and_then(|d| d.name.clone())
            .unwrap_or_else(|| "Unnamed division".to_owned());
        println!("{} — {division}\n", competition.display_name());
    }

    let error_for = |panel: &str| {
        panel_errors
            .iter()
            .find(|(name, _)| *name == panel)
            .map(|(_, message)| format!("Error: {message}\n"))
    };

    println!("{}", error_for("ladder").unwrap_or_else(|| render::ladder_table(&state.ladder)));

    let saved = render::saved_teams_view(&state.saved_teams_for_selection());
    if !saved.is_empty() {
        println!("{saved}");
    }

    println!(
        "{}",
        error_for("fixtures").unwrap_or_else(|| render::fixtures_view(&state.filtered_matches(), now))
    );

    match (error_for("player stats"), &state.player_stats) {
        (Some(message), _) => println!("{message}"),
        (None, Some(index)) => {
            println!("{}", render::scorers_table(index, 20));
            if let Some(row) = state.selected_team()
                && let Some(team_stats) = state.player_stats_for(row)
            {
                println!("{}", render::team_scorers(team_stats));
            }
        }
        (None, None) => {}
    }

    if let Some(stats_summary) = &state.summary {
        println!("{}", render::summary_block(stats_summary));
    }
}

fn print_json(app: &App) -> anyhow::Result<()> {
    let state = &app.state;
    let doc = serde_json::json!({
        "competition": state.selected_competition(),
        "division": state.selected_division(),
        "ladder": state.ladder,
        "fixtures": state.matches,
        "topScorers": state.player_stats.as_ref().map(|index| index.leaders()),
        "summary": state.summary,
        "savedTeams": state.enriched_saved_teams(),
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

/// Watch mode: a network worker drains requests, a periodic refresher
/// re-requests the live panels, and the main loop applies responses until
/// Ctrl-C.
async fn watch(mut app: App) -> anyhow::Result<()> {
    let scope = app
        .division_scope()
        .context("competition/division selection incomplete")?;

    let (request_tx, request_rx) = mpsc::channel::<NetworkRequest>(100);
    let (response_tx, mut response_rx) = mpsc::channel::<NetworkResponse>(100);

    let worker = NetworkWorker::new(request_rx, response_tx);
    let cancel = worker.cancel_flag();
    let worker_task = tokio::spawn(worker.run());

    let refresher = PeriodicRefresher::new(
        request_tx.clone(),
        scope.clone(),
        Duration::from_secs(app.settings.refresh_secs),
    );
    let refresher_task = tokio::spawn(refresher.run());

    for request in [
        NetworkRequest::LoadLadder { scope: scope.clone() },
        NetworkRequest::LoadFixtures {
            competition_id: scope.competition_id.clone(),
            division_id: scope.division_id,
        },
        NetworkRequest::LoadPlayerStats { scope: scope.clone() },
        NetworkRequest::LoadSummary { scope: scope.clone() },
    ] {
        request_tx.send(request).await?;
    }

    loop {
        tokio::select! {
            Some(response) = response_rx.recv() => {
                let reprint = matches!(response, NetworkResponse::SummaryLoaded { .. });
                match &response {
                    NetworkResponse::Error { message } => error!("panel failed: {message}"),
                    _ => {}
                }
                app.apply(response);
                if reprint {
                    // The summary is the last response in each refresh
                    // batch, so one reprint per cycle.
                    print_panels(&app, &[]);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    cancel.store(true, Ordering::Relaxed);
    refresher_task.abort();
    worker_task.abort();
    Ok(())
}
