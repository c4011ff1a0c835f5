use crate::state::app_settings::AppSettings;
use anyhow::{Context, bail};
use hub_api::client::{ApiError, HubApi};
use hub_api::registration::validate_registration;
use hub_api::{Collection, Event, Registration, Team};
use std::path::PathBuf;

/// Arguments of `esports-hub register`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterArgs {
    pub event_id: String,
    pub team_name: String,
    pub captain: String,
    pub email: Option<String>,
    pub members: Vec<String>,
    pub logo: Option<PathBuf>,
}

impl RegisterArgs {
    pub fn parse<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = RegisterArgs::default();
        let mut positional = Vec::new();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| args.next().with_context(|| format!("{flag} needs a value"));
            match arg.as_str() {
                "--captain" => parsed.captain = value("--captain")?,
                "--email" => parsed.email = Some(value("--email")?),
                "--member" => parsed.members.push(value("--member")?),
                "--logo" => parsed.logo = Some(PathBuf::from(value("--logo")?)),
                flag if flag.starts_with("--") => bail!("unknown option {flag}"),
                _ => positional.push(arg.clone()),
            }
        }

        let mut positional = positional.into_iter();
        parsed.event_id = positional.next().context("missing <event-id>")?;
        parsed.team_name = positional.next().context("missing <team>")?;
        if let Some(extra) = positional.next() {
            bail!("unexpected argument {extra}");
        }
        if parsed.captain.trim().is_empty() {
            bail!("--captain is required");
        }
        Ok(parsed)
    }

    /// Registration document for these arguments. The captain is always on
    /// the roster.
    pub fn draft(&self) -> Registration {
        let captain = self.captain.trim().to_string();
        let mut members: Vec<String> = self.members.iter().map(|m| m.trim().to_string()).collect();
        if !members.iter().any(|m| m.eq_ignore_ascii_case(&captain)) {
            members.insert(0, captain.clone());
        }
        Registration {
            event_id: self.event_id.clone(),
            team_name: self.team_name.trim().to_string(),
            captain,
            captain_email: self.email.clone(),
            members,
            ..Registration::default()
        }
    }
}

/// Validate and submit a registration, uploading the logo first. Returns the
/// new registration id.
pub async fn run(args: RegisterArgs, settings: &AppSettings) -> anyhow::Result<String> {
    let mut api = HubApi::new(settings.backend.clone());
    if let Some(token) = settings.id_token.as_deref() {
        api = api.with_id_token(token);
    } else if let Some((email, password)) = settings.credentials() {
        let session = api.sign_in(&email, &password).await.context("sign-in failed")?;
        api = api.with_id_token(session.id_token);
    }

    let event: Event = match api.get(Collection::Events, &args.event_id).await {
        Err(ApiError::NotFound(_)) => bail!("no event with id {}", args.event_id),
        other => other.context("loading event")?,
    };
    let teams: Vec<Team> = api.list(Collection::Teams).await.context("loading teams")?;
    let registrations: Vec<Registration> = api.list(Collection::Registrations).await.context("loading registrations")?;

    let mut draft = args.draft();
    validate_registration(&event, &teams, &registrations, &draft)?;

    if let Some(logo) = args.logo.as_deref() {
        let url = api
            .upload_image(logo)
            .await
            .with_context(|| format!("uploading logo {}", logo.display()))?;
        draft.logo_url = Some(url);
    }

    let id = api.submit_registration(&draft).await.context("submitting registration")?;
    Ok(id)
}
