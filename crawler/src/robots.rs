use parking_lot::RwLock;
use reqwest::Client;
use std::collections::HashMap;

/// Decides whether an origin may be crawled at all.
#[allow(async_fn_in_trait)]
pub trait ExclusionPolicy {
    /// `origin` is scheme + host (+ port), e.g. `https://web-scraping.dev`.
    async fn is_allowed(&self, origin: &str) -> bool;
}

/// Directives of the `User-agent: *` group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Robots {
    pub disallows: Vec<String>,
}

impl Robots {
    /// `Disallow: /` for every agent shuts the whole origin.
    pub fn disallows_everything(&self) -> bool {
        self.disallows.iter().any(|d| d == "/")
    }
}

pub fn parse_robots(txt: &str) -> Robots {
    let mut robots = Robots::default();
    let mut active = false;
    let mut in_agent_lines = false;
    for line in txt.lines() {
        let l = line.split('#').next().unwrap_or("").trim();
        if l.is_empty() { continue; }
        let Some((k, v)) = l.split_once(':') else { continue };
        let key = k.trim().to_lowercase();
        let val = v.trim();
        if key == "user-agent" {
            // consecutive user-agent lines share one group
            let is_star = val == "*";
            active = if in_agent_lines { active || is_star } else { is_star };
            in_agent_lines = true;
            continue;
        }
        in_agent_lines = false;
        if key == "disallow" && active && !val.is_empty() {
            robots.disallows.push(val.to_string());
        }
    }
    robots
}

/// robots.txt gate with a per-origin decision cache.
///
/// Fail-open: when robots.txt cannot be fetched (transport error or non-2xx)
/// the origin counts as unrestricted. Switching to fail-closed would shrink
/// crawl coverage on flaky hosts.
pub struct RobotsGate {
    client: Client,
    cache: RwLock<HashMap<String, bool>>,
}

impl RobotsGate {
    pub fn new(client: Client) -> Self {
        Self { client, cache: RwLock::new(HashMap::new()) }
    }

    async fn fetch_rules(&self, origin: &str) -> Option<Robots> {
        let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));
        match self.client.get(&robots_url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(txt) => Some(parse_robots(&txt)),
                Err(e) => {
                    tracing::warn!(url = %robots_url, error = %e, "robots.txt body unreadable, treating as unrestricted");
                    None
                }
            },
            Ok(resp) => {
                tracing::debug!(url = %robots_url, status = resp.status().as_u16(), "no robots.txt");
                None
            }
            Err(e) => {
                tracing::warn!(url = %robots_url, error = %e, "robots.txt fetch failed, treating as unrestricted");
                None
            }
        }
    }
}

impl ExclusionPolicy for RobotsGate {
    async fn is_allowed(&self, origin: &str) -> bool {
        if let Some(allowed) = self.cache.read().get(origin).copied() {
            return allowed;
        }
        let allowed = !self
            .fetch_rules(origin)
            .await
            .is_some_and(|rules| rules.disallows_everything());
        self.cache.write().insert(origin.to_string(), allowed);
        allowed
    }
}
