use crate::state::messages::LiveUpdate;
use futures_util::{Stream, StreamExt};
use hub_api::client::{ApiResult, HubApi};
use hub_api::{Collection, Event, Match, NewsPost, Registration, Rule, SITE_CONFIG_ID, SiteConfig, Team};
use log::{debug, warn};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Live subscriptions for every collection the dashboard shows, one task each.
///
/// Tasks are aborted when the feeds are dropped or restarted, which drops the
/// underlying streams and stops polling.
pub struct LiveFeeds {
    tasks: Vec<JoinHandle<()>>,
}

impl LiveFeeds {
    pub fn start(api: &HubApi, every: Duration, updates: mpsc::Sender<LiveUpdate>) -> Self {
        let tasks = vec![
            forward(api.subscribe::<Event>(Collection::Events, every), "events", updates.clone(), LiveUpdate::Events),
            forward(api.subscribe::<Team>(Collection::Teams, every), "teams", updates.clone(), LiveUpdate::Teams),
            forward(
                api.subscribe::<Registration>(Collection::Registrations, every),
                "registrations",
                updates.clone(),
                LiveUpdate::Registrations,
            ),
            forward(api.subscribe::<Match>(Collection::Matches, every), "matches", updates.clone(), LiveUpdate::Matches),
            forward(api.subscribe::<NewsPost>(Collection::News, every), "news", updates.clone(), LiveUpdate::News),
            forward(api.subscribe::<Rule>(Collection::Rules, every), "rules", updates.clone(), LiveUpdate::Rules),
            forward(api.subscribe::<SiteConfig>(Collection::Config, every), "config", updates, |configs: Vec<SiteConfig>| {
                LiveUpdate::SiteConfig(site_config_from(configs))
            }),
        ];
        debug!("started {} live feeds every {:?}", tasks.len(), every);
        Self { tasks }
    }

    /// Replace the running feeds, e.g. once a signed-in client is available.
    pub fn restart(&mut self, api: &HubApi, every: Duration, updates: mpsc::Sender<LiveUpdate>) {
        self.stop();
        *self = Self::start(api, every, updates);
    }

    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for LiveFeeds {
    fn drop(&mut self) {
        self.stop();
    }
}

fn forward<T, S, F>(stream: S, source: &'static str, updates: mpsc::Sender<LiveUpdate>, wrap: F) -> JoinHandle<()>
where
    T: Send + 'static,
    S: Stream<Item = ApiResult<Vec<T>>> + Send + 'static,
    F: Fn(Vec<T>) -> LiveUpdate + Send + 'static,
{
    tokio::spawn(async move {
        let mut stream = Box::pin(stream);
        while let Some(snapshot) = stream.next().await {
            let update = match snapshot {
                Ok(items) => wrap(items),
                Err(e) => {
                    warn!("live {source} feed: {e}");
                    LiveUpdate::Error { source, message: e.to_string() }
                }
            };
            if updates.send(update).await.is_err() {
                break;
            }
        }
    })
}

/// The site document out of a `config` snapshot; defaults when absent.
pub fn site_config_from(configs: Vec<SiteConfig>) -> SiteConfig {
    configs.into_iter().find(|c| c.id == SITE_CONFIG_ID).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_config_picks_site_document() {
        let configs = vec![
            SiteConfig { id: "theme".into(), chat_enabled: false, ..SiteConfig::default() },
            SiteConfig { id: SITE_CONFIG_ID.into(), livestream_url: Some("https://live.example/club".into()), ..SiteConfig::default() },
        ];
        let site = site_config_from(configs);
        assert_eq!(site.livestream_url.as_deref(), Some("https://live.example/club"));
        assert!(site.chat_enabled);
    }

    #[test]
    fn missing_site_document_means_defaults() {
        let site = site_config_from(vec![]);
        assert!(site.chat_enabled);
        assert!(site.livestream_url.is_none());
    }
}
