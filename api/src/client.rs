use crate::value::{pick_number, pick_string};
use crate::{
    Competition, Division, Fixture, LadderRow, StatsSummary, fixtures, ladder, scorers,
    scorers::PlayerStatsIndex, summary,
};
use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use serde_json::{Value, json};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

const API_BASE: &str = "https://api-basketball.squadi.com/livescores";
const LADDER_BASE: &str = "https://registration.basketballconnect.com/livescorePublicLadder";
const PLAYER_STATS_BASE: &str =
    "https://registration.basketballconnect.com/liveScorePlayerStatistics";

/// Matches with status 1 (drafts) are excluded from fixture queries.
const IGNORE_STATUSES: &str = "[1]";

/// Where a statistics page reports the offset of the next page.
const NEXT_OFFSET_FIELDS: &[&[&str]] = &[&["nextOffset"], &["page", "nextOffset"], &["nextPage"]];

/// BasketballConnect/Squadi live-scores client.
#[derive(Debug, Clone)]
pub struct BcApi {
    client: Client,
    timeout: Duration,
    api_base: String,
    ladder_base: String,
    player_stats_base: String,
}

impl Default for BcApi {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("hoopshub/0.1 (terminal ladder viewer)")
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_secs(10),
            api_base: API_BASE.to_owned(),
            ladder_base: LADDER_BASE.to_owned(),
            player_stats_base: PLAYER_STATS_BASE.to_owned(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    /// Non-OK response; the message is lifted from the payload's
    /// `message`/`error` field when one exists.
    Api {
        status: u16,
        message: String,
        url: String,
    },
    /// The cooperative cancel flag was raised between pagination pages.
    Cancelled,
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api { status, message, url } => {
                write!(f, "Request failed with status {status} for {url}: {message}")
            }
            ApiError::Cancelled => write!(f, "Request cancelled"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Everything needed to address one division of one competition.
#[derive(Debug, Clone, PartialEq)]
pub struct DivisionScope {
    pub organisation_key: String,
    pub year_ref_id: i64,
    pub competition_id: Option<String>,
    pub competition_unique_key: String,
    pub division_id: i64,
}

impl BcApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at different base URLs (tests, self-hosted
    /// mirrors of the upstream endpoints).
    pub fn with_endpoints(
        api_base: impl Into<String>,
        ladder_base: impl Into<String>,
        player_stats_base: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            ladder_base: ladder_base.into(),
            player_stats_base: player_stats_base.into(),
            ..Self::default()
        }
    }

    /// List an organisation's competitions for a registration year.
    pub async fn fetch_competitions(
        &self,
        organisation_key: &str,
        year_ref_id: i64,
    ) -> ApiResult<Vec<Competition>> {
        let url = self.url(
            &format!("{}/competitions/list", self.api_base),
            &[
                ("organisationUniqueKey", organisation_key.to_owned()),
                ("yearRefId", year_ref_id.to_string()),
            ],
        )?;
        let payload = self.get_ok(&url, &[]).await?;
        let competitions = payload
            .as_array()
            .map(|entries| entries.iter().map(map_competition).collect())
            .unwrap_or_default();
        Ok(competitions)
    }

    pub async fn fetch_divisions(&self, competition_id: &str) -> ApiResult<Vec<Division>> {
        let url = self.url(
            &format!("{}/division", self.api_base),
            &[("competitionId", competition_id.to_owned())],
        )?;
        let payload = self.get_ok(&url, &[]).await?;
        let divisions = payload
            .as_array()
            .map(|entries| entries.iter().filter_map(map_division).collect())
            .unwrap_or_default();
        Ok(divisions)
    }

    /// Flattened match list for a division, optionally restricted to
    /// specific teams.
    pub async fn fetch_fixtures(
        &self,
        competition_id: Option<&str>,
        division_id: i64,
        team_ids: &[String],
    ) -> ApiResult<Vec<Fixture>> {
        let payload = self.fetch_fixtures_payload(competition_id, division_id, team_ids).await?;
        Ok(fixtures::normalize_fixtures(&payload))
    }

    async fn fetch_fixtures_payload(
        &self,
        competition_id: Option<&str>,
        division_id: i64,
        team_ids: &[String],
    ) -> ApiResult<Value> {
        let mut params = Vec::new();
        if let Some(id) = competition_id {
            params.push(("competitionId", id.to_owned()));
        }
        params.push(("divisionId", division_id.to_string()));
        params.push(("ignoreStatuses", IGNORE_STATUSES.to_owned()));
        params.push(("teamIds", team_ids.join(",")));
        let url = self.url(&format!("{}/round/matches", self.api_base), &params)?;
        self.get_ok(&url, &[]).await
    }

    /// Ladder rows with recent form merged in.
    ///
    /// Retry contract: try the public-ladder endpoint; on any failure
    /// retry the teams/ladder/v2 endpoint once and surface ITS
    /// status/body if that also fails. No further retries, no backoff.
    pub async fn fetch_ladder(&self, scope: &DivisionScope) -> ApiResult<Vec<LadderRow>> {
        let payload = self.fetch_ladder_payload(scope).await?;
        Ok(ladder::build_ladder(&payload))
    }

    pub async fn fetch_ladder_payload(&self, scope: &DivisionScope) -> ApiResult<Value> {
        let primary = self.url(
            &self.ladder_base,
            &[
                ("organisationKey", scope.organisation_key.clone()),
                ("yearId", scope.year_ref_id.to_string()),
                ("includeRecentMatchData", "true".to_owned()),
                ("competitionUniqueKey", scope.competition_unique_key.clone()),
                ("divisionId", scope.division_id.to_string()),
            ],
        )?;
        match self.get_ok(&primary, &[]).await {
            Ok(payload) => Ok(payload),
            Err(_) => {
                let fallback = self.url(
                    &format!("{}/teams/ladder/v2", self.api_base),
                    &[
                        ("divisionIds", scope.division_id.to_string()),
                        ("competitionKey", scope.competition_unique_key.clone()),
                    ],
                )?;
                self.get_ok(&fallback, &[]).await
            }
        }
    }

    /// Paginated player statistics, aggregated into an index.
    ///
    /// Pages are fetched strictly sequentially; the loop stops when the
    /// reported next-page offset fails to advance or a page comes back
    /// empty. `cancel` is checked between pages (cooperative
    /// cancellation); any page failure aborts the whole aggregation and
    /// the pages already fetched are discarded.
    pub async fn fetch_player_statistics(
        &self,
        scope: &DivisionScope,
        cancel: &AtomicBool,
    ) -> ApiResult<PlayerStatsIndex> {
        // `HOOPS_STATS_JSON` — load a static snapshot document instead of
        // hitting the paginated endpoint (offline use, fixtures).
        if let Ok(path) = std::env::var("HOOPS_STATS_JSON")
            && !path.trim().is_empty()
        {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| ApiError::Other(format!("could not read {path}: {e}")))?;
            let doc: Value = serde_json::from_str(&content)
                .map_err(|e| ApiError::Other(format!("invalid stats json at {path}: {e}")))?;
            return Ok(scorers::build_from_static(&doc));
        }

        let mut rows: Vec<Value> = Vec::new();
        let mut offset: u64 = 0;

        loop {
            if cancel.load(Ordering::Relaxed) {
                return Err(ApiError::Cancelled);
            }

            let mut params = vec![
                ("organisationKey", scope.organisation_key.clone()),
                ("yearId", scope.year_ref_id.to_string()),
                ("competitionUniqueKey", scope.competition_unique_key.clone()),
                ("divisionId", scope.division_id.to_string()),
                ("offset", offset.to_string()),
            ];
            if let Some(id) = &scope.competition_id {
                params.push(("competitionId", id.clone()));
            }
            let url = self.url(&self.player_stats_base, &params)?;
            let payload = self
                .get_ok(
                    &url,
                    &[
                        ("accept", "application/json, text/plain, */*"),
                        ("x-requested-with", "XMLHttpRequest"),
                    ],
                )
                .await?;

            let page_rows = scorers::player_rows(&payload);
            if page_rows.is_empty() {
                break;
            }
            rows.extend_from_slice(page_rows);

            match pick_number(&payload, NEXT_OFFSET_FIELDS).map(|n| n as u64) {
                Some(next) if next > offset => offset = next,
                _ => break,
            }
        }

        Ok(scorers::build_player_stats_index(&rows))
    }

    /// Ladder (with fallback) + fixtures + derived summary in one call.
    pub async fn fetch_stats_summary(&self, scope: &DivisionScope) -> ApiResult<StatsSummary> {
        let ladder_payload = self.fetch_ladder_payload(scope).await?;
        let rows = ladder::build_ladder(&ladder_payload);
        let matches = self
            .fetch_fixtures(scope.competition_id.as_deref(), scope.division_id, &[])
            .await?;
        Ok(summary::compute_summary(&rows, &matches, Utc::now()))
    }

    fn url(&self, base: &str, params: &[(&str, String)]) -> ApiResult<Url> {
        Url::parse_with_params(base, params)
            .map_err(|e| ApiError::Other(format!("invalid url {base}: {e}")))
    }

    /// GET a JSON payload. Non-JSON bodies become `{"message": <text>}`
    /// so downstream code always receives an object; non-OK statuses
    /// become [`ApiError::Api`] carrying the payload's message.
    async fn get_ok(&self, url: &Url, headers: &[(&str, &str)]) -> ApiResult<Value> {
        let (status, payload) = self.get_payload(url, headers).await?;
        if status.is_success() {
            return Ok(payload);
        }
        let message = pick_string(&payload, &[&["message"], &["error"]])
            .unwrap_or_else(|| format!("request failed with status {status}"));
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
            url: url.to_string(),
        })
    }

    async fn get_payload(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
    ) -> ApiResult<(StatusCode, Value)> {
        let mut request = self.client.get(url.clone()).timeout(self.timeout);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e, url.to_string()))?;

        let payload = if text.is_empty() {
            json!({})
        } else {
            serde_json::from_str(&text).unwrap_or_else(|_| json!({ "message": text }))
        };
        Ok((status, payload))
    }
}

fn map_competition(entry: &Value) -> Competition {
    Competition {
        id: pick_string(entry, &[&["id"], &["competitionId"]]),
        unique_key: pick_string(entry, &[&["uniqueKey"], &["competitionUniqueKey"]]),
        name: pick_string(
            entry,
            &[&["longName"], &["name"], &["competitionName"], &["description"]],
        ),
    }
}

fn map_division(entry: &Value) -> Option<Division> {
    Some(Division {
        id: pick_number(entry, &[&["id"]])? as i64,
        name: pick_string(entry, &[&["name"], &["longName"], &["divisionName"]]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn scope() -> DivisionScope {
        DivisionScope {
            organisation_key: "org-1".into(),
            year_ref_id: 2026,
            competition_id: Some("31".into()),
            competition_unique_key: "comp-key".into(),
            division_id: 7,
        }
    }

    fn api_for(server: &mockito::ServerGuard) -> BcApi {
        BcApi::with_endpoints(
            format!("{}/livescores", server.url()),
            format!("{}/ladder", server.url()),
            format!("{}/playerStats", server.url()),
        )
    }

    #[tokio::test]
    async fn ladder_retries_the_fallback_endpoint_once() {
        let mut server = mockito::Server::new_async().await;
        let primary = server
            .mock("GET", "/ladder")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("<html>down</html>")
            .create_async()
            .await;
        let fallback = server
            .mock("GET", "/livescores/teams/ladder/v2")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("divisionIds".into(), "7".into()),
                Matcher::UrlEncoded("competitionKey".into(), "comp-key".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"ladder": [{"id": 1, "name": "Hawks"}]}"#)
            .create_async()
            .await;

        let rows = api_for(&server).fetch_ladder(&scope()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name.as_deref(), Some("Hawks"));
        primary.assert_async().await;
        fallback.assert_async().await;
    }

    #[tokio::test]
    async fn ladder_surfaces_the_fallback_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ladder")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        server
            .mock("GET", "/livescores/teams/ladder/v2")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message": "no ladder for division"}"#)
            .create_async()
            .await;

        let err = api_for(&server).fetch_ladder(&scope()).await.unwrap_err();
        match err {
            ApiError::Api { status, message, .. } => {
                assert_eq!(status, 404);
                assert_eq!(message, "no ladder for division");
            }
            other => panic!("expected Api error, got {other}"),
        }
    }

    #[tokio::test]
    async fn non_json_bodies_become_message_payloads() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ladder")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("gateway busy")
            .create_async()
            .await;
        server
            .mock("GET", "/livescores/teams/ladder/v2")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("gateway busy")
            .create_async()
            .await;

        let err = api_for(&server).fetch_ladder(&scope()).await.unwrap_err();
        match err {
            ApiError::Api { status, message, .. } => {
                assert_eq!(status, 503);
                assert_eq!(message, "gateway busy");
            }
            other => panic!("expected Api error, got {other}"),
        }
    }

    #[tokio::test]
    async fn player_statistics_concatenate_pages_until_offset_stalls() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/playerStats")
            .match_query(Matcher::UrlEncoded("offset".into(), "0".into()))
            .with_status(200)
            .with_body(
                r#"{"players": [{"teamId": "t1", "firstName": "Alex", "lastName": "One",
                    "totalPoints": 30}], "nextOffset": 50}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/playerStats")
            .match_query(Matcher::UrlEncoded("offset".into(), "50".into()))
            .with_status(200)
            .with_body(
                // nextOffset fails to advance — the loop must stop here.
                r#"{"players": [{"teamId": "t1", "firstName": "Blake", "lastName": "Two",
                    "totalPoints": 60}], "nextOffset": 50}"#,
            )
            .create_async()
            .await;

        let cancel = AtomicBool::new(false);
        let index = api_for(&server)
            .fetch_player_statistics(&scope(), &cancel)
            .await
            .unwrap();
        assert_eq!(index.leaders().len(), 2);
        assert_eq!(index.team_by_id("t1").unwrap().players.len(), 2);
    }

    #[tokio::test]
    async fn an_empty_page_ends_pagination() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/playerStats")
            .match_query(Matcher::UrlEncoded("offset".into(), "0".into()))
            .with_status(200)
            .with_body(r#"{"players": [], "nextOffset": 50}"#)
            .expect(1)
            .create_async()
            .await;

        let cancel = AtomicBool::new(false);
        let index = api_for(&server)
            .fetch_player_statistics(&scope(), &cancel)
            .await
            .unwrap();
        assert!(!index.has_data());
    }

    #[tokio::test]
    async fn a_failing_page_aborts_the_whole_aggregation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/playerStats")
            .match_query(Matcher::UrlEncoded("offset".into(), "0".into()))
            .with_status(200)
            .with_body(r#"{"players": [{"teamId": "t1", "totalPoints": 5}], "nextOffset": 25}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/playerStats")
            .match_query(Matcher::UrlEncoded("offset".into(), "25".into()))
            .with_status(500)
            .with_body(r#"{"message": "upstream exploded"}"#)
            .create_async()
            .await;

        let cancel = AtomicBool::new(false);
        let err = api_for(&server)
            .fetch_player_statistics(&scope(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn a_raised_cancel_flag_stops_before_the_next_page() {
        let server = mockito::Server::new_async().await;
        let cancel = AtomicBool::new(true);
        let err = api_for(&server)
            .fetch_player_statistics(&scope(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Cancelled));
    }

    #[tokio::test]
    async fn competitions_and_divisions_normalize_identifier_variants() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/livescores/competitions/list")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"[{"competitionId": 31, "competitionUniqueKey": "comp-key",
                     "longName": "Winter League 2026"},
                    {"uniqueKey": "other", "name": "Other Cup"}]"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/livescores/division")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"id": 7, "divisionName": "U18 Boys"}, {"name": "no id"}]"#)
            .create_async()
            .await;

        let api = api_for(&server);
        let competitions = api.fetch_competitions("org-1", 2026).await.unwrap();
        assert_eq!(competitions.len(), 2);
        assert_eq!(competitions[0].id.as_deref(), Some("31"));
        assert_eq!(competitions[0].unique_key.as_deref(), Some("comp-key"));
        assert_eq!(competitions[0].display_name(), "Winter League 2026");
        assert!(competitions[0].matches_identifier(" COMP-KEY "));

        let divisions = api.fetch_divisions("31").await.unwrap();
        assert_eq!(divisions.len(), 1);
        assert_eq!(divisions[0].id, 7);
        assert_eq!(divisions[0].name.as_deref(), Some("U18 Boys"));
    }
}
