use anyhow::{Context, bail};

/// Connection settings, loaded from `.env.local`/`.env` and the process
/// environment. An organisation key and year reference id are required to
/// reach live data at all.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub organisation_key: String,
    pub year_ref_id: i64,
    /// Preferred competition, matched against any of its identifiers.
    pub default_competition_id: Option<String>,
    pub refresh_secs: u64,
}

impl AppSettings {
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        let organisation_key = trimmed_var("HOOPS_ORG_KEY");
        let Some(organisation_key) = organisation_key else {
            bail!("HOOPS_ORG_KEY is not set — provide your BasketballConnect organisation key");
        };

        let year_ref_id = trimmed_var("HOOPS_YEAR_REF_ID")
            .context("HOOPS_YEAR_REF_ID is not set — provide the registration year reference id")?
            .parse::<i64>()
            .context("HOOPS_YEAR_REF_ID must be a number")?;

        let refresh_secs = trimmed_var("HOOPS_REFRESH_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30)
            .max(5);

        Ok(Self {
            organisation_key,
            year_ref_id,
            default_competition_id: trimmed_var("HOOPS_COMPETITION_ID"),
            refresh_secs,
        })
    }
}

fn trimmed_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
