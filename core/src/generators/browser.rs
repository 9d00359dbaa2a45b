//! Browser generator: history databases, saved logins and cookies for
//! Chrome, Firefox and Edge.
//!
//! RULE: Visit timestamps lie in `[max(account_created, browser install,
//! now - history_window_days), now]` and are unique per
//! `(site, timestamp)`. Saved logins are the credential ledger entries,
//! so every browser stores the same secret for a site.
//!
//! The stage ends with `Downloads/Download_History.txt`, built from the
//! installer artifacts already in the manifest. Each download precedes
//! the install it led to.

use super::{application, credentials, DomainGenerator, GenerationContext};
use crate::{
    artifact::{Artifact, HistoryStore, Location, PageVisits, Record},
    error::{PopError, PopResult},
    facts::{ApplicationRecord, CredentialEntry},
    ledger::FactKey,
    rng::{GeneratorRng, GeneratorSlot},
    types::ArtifactCategory,
};
use chrono::{Duration, NaiveDateTime};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

const MAX_TIMESTAMP_DRAWS: usize = 32;

/// (category, weight, sites ordered by popularity)
const SITE_POOL: [(&str, f64, &[&str]); 7] = [
    (
        "work",
        35.0,
        &[
            "github.com",
            "stackoverflow.com",
            "docs.microsoft.com",
            "aws.amazon.com",
            "gitlab.com",
            "jenkins.io",
            "docker.com",
            "kubernetes.io",
        ],
    ),
    ("social", 15.0, &["linkedin.com", "twitter.com", "reddit.com", "facebook.com"]),
    (
        "news",
        20.0,
        &["news.ycombinator.com", "techcrunch.com", "arstechnica.com", "theverge.com", "wired.com"],
    ),
    (
        "finance",
        10.0,
        &["chase.com", "wellsfargo.com", "mint.com", "robinhood.com", "fidelity.com", "vanguard.com"],
    ),
    ("shopping", 10.0, &["amazon.com", "ebay.com", "walmart.com", "target.com", "bestbuy.com"]),
    ("entertainment", 8.0, &["youtube.com", "netflix.com", "spotify.com", "twitch.tv"]),
    ("email", 2.0, &["gmail.com", "outlook.com", "yahoo.com"]),
];

const PAGE_PATHS: [&str; 8] = [
    "",
    "/dashboard",
    "/search?q=python+tutorial",
    "/docs",
    "/settings",
    "/profile",
    "/notifications",
    "/about",
];

const KNOWN_TITLES: [(&str, &str); 8] = [
    ("github.com", "GitHub: Where the world builds software"),
    ("stackoverflow.com", "Stack Overflow - Where Developers Learn"),
    ("linkedin.com", "LinkedIn: Log In or Sign Up"),
    ("amazon.com", "Amazon.com: Online Shopping"),
    ("youtube.com", "YouTube"),
    ("gmail.com", "Gmail - Email by Google"),
    ("netflix.com", "Netflix - Watch TV Shows Online"),
    ("reddit.com", "Reddit - Dive into anything"),
];

const COOKIE_TYPES: [(&str, &str); 7] = [
    ("session_id", "Session identifier"),
    ("auth_token", "Authentication token"),
    ("user_prefs", "User preferences"),
    ("tracking_id", "Analytics tracking"),
    ("csrf_token", "CSRF protection"),
    ("language", "Language preference"),
    ("timezone", "Timezone setting"),
];

/// Where installers are fetched from. Others get a vendor-style URL.
const DOWNLOAD_SOURCES: [(&str, &str); 6] = [
    ("Google Chrome", "https://dl.google.com/chrome/install"),
    ("Mozilla Firefox", "https://download.mozilla.org/?product=firefox-latest"),
    ("Microsoft Edge", "https://go.microsoft.com/fwlink/?linkid=2108834"),
    ("Visual Studio Code", "https://update.code.visualstudio.com/latest/win32-x64-user/stable"),
    ("Docker Desktop", "https://desktop.docker.com/win/main/amd64"),
    ("Slack", "https://slack.com/ssb/download-win64"),
];

// ── Browsers ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    Chrome,
    Firefox,
    Edge,
}

impl BrowserKind {
    pub const ALL: [BrowserKind; 3] = [Self::Chrome, Self::Firefox, Self::Edge];

    /// The application whose install date bounds this browser's history.
    pub fn application(&self) -> &'static str {
        match self {
            Self::Chrome => "Google Chrome",
            Self::Firefox => "Mozilla Firefox",
            Self::Edge => "Microsoft Edge",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Chrome => "Chrome",
            Self::Firefox => "Firefox",
            Self::Edge => "Edge",
        }
    }

    fn is_chromium(&self) -> bool {
        !matches!(self, Self::Firefox)
    }

    fn history_count(&self, ctx: &GenerationContext<'_>) -> usize {
        let counts = &ctx.config.counts;
        match self {
            Self::Chrome => counts.chrome_history,
            Self::Firefox => counts.firefox_history,
            Self::Edge => counts.edge_history,
        }
    }

    /// Profile folder and the root it lives under.
    pub fn profile(&self, username: &str) -> (Location, String) {
        match self {
            Self::Chrome => (Location::LocalAppData, "Google/Chrome/User Data/Default".into()),
            Self::Edge => (Location::LocalAppData, "Microsoft/Edge/User Data/Default".into()),
            Self::Firefox => (
                Location::RoamingAppData,
                format!("Mozilla/Firefox/Profiles/{username}.default-release"),
            ),
        }
    }

    pub fn history_file(&self) -> &'static str {
        if self.is_chromium() {
            "History"
        } else {
            "places.sqlite"
        }
    }

    fn logins_file(&self) -> &'static str {
        if self.is_chromium() {
            "Login Data.json"
        } else {
            "logins.json"
        }
    }
}

// ── History ───────────────────────────────────────────────────

fn site_weights(sites: &[&str]) -> Vec<f64> {
    (0..sites.len()).map(|rank| 1.0 / (rank as f64 + 1.0)).collect()
}

/// Category by weight, then a site by rank within it.
pub fn pick_site(rng: &mut GeneratorRng) -> PopResult<&'static str> {
    let category_weights: Vec<f64> = SITE_POOL.iter().map(|(_, w, _)| *w).collect();
    let (_, _, sites) = SITE_POOL[rng.weighted_index(&category_weights)?];
    Ok(sites[rng.weighted_index(&site_weights(sites))?])
}

pub fn page_title(site: &str, path: &str) -> String {
    if let Some((_, title)) = KNOWN_TITLES.iter().find(|(s, _)| *s == site) {
        return title.to_string();
    }
    let mut label = site.split('.').next().unwrap_or(site).to_string();
    if let Some(first) = label.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    match path.trim_start_matches('/').split(['?', '/']).next() {
        Some(section) if !section.is_empty() => {
            let mut section = section.to_string();
            if let Some(first) = section.get_mut(..1) {
                first.make_ascii_uppercase();
            }
            format!("{section} - {label}")
        }
        _ => format!("{label} - Home"),
    }
}

/// The history window for a browser installed at `installed_at`.
pub fn history_window(
    ctx: &GenerationContext<'_>,
    installed_at: NaiveDateTime,
) -> PopResult<(NaiveDateTime, NaiveDateTime)> {
    let now = ctx.clock.now();
    let created = ctx.persona.account_created.and_hms_opt(0, 0, 0).unwrap_or(now);
    let start = created
        .max(installed_at)
        .max(ctx.clock.days_ago(ctx.config.counts.history_window_days));
    if start > now {
        return Err(PopError::config(
            "counts.history_window_days",
            format!("history window starts {start} after the reference time {now}"),
        ));
    }
    Ok((start, now))
}

/// Draw `visits` browsing events in `[start, end]` and aggregate them
/// per URL, most visited page first.
pub fn draw_history(
    rng: &mut GeneratorRng,
    start: NaiveDateTime,
    end: NaiveDateTime,
    visits: usize,
) -> PopResult<HistoryStore> {
    let mut taken: HashSet<(&'static str, NaiveDateTime)> = HashSet::with_capacity(visits);
    let mut by_url: BTreeMap<String, PageVisits> = BTreeMap::new();

    for _ in 0..visits {
        let site = pick_site(rng)?;
        let path = *rng.choose(&PAGE_PATHS)?;
        let mut at = None;
        for _ in 0..MAX_TIMESTAMP_DRAWS {
            let candidate = rng.draw_datetime(start, end)?;
            if taken.insert((site, candidate)) {
                at = Some(candidate);
                break;
            }
        }
        let at = at.ok_or_else(|| {
            PopError::violation(
                ArtifactCategory::Browser,
                format!("no free timestamp for {site} between {start} and {end}"),
            )
        })?;
        let duration = rng.range(5, 180)? as u32;

        let url = format!("https://{site}{path}");
        let page = by_url.entry(url.clone()).or_insert_with(|| PageVisits {
            site: site.to_string(),
            url,
            title: page_title(site, path),
            typed_count: 0,
            visits: Vec::new(),
            durations: Vec::new(),
        });
        page.visits.push(at);
        page.durations.push(duration);
    }

    let mut pages: Vec<PageVisits> = by_url
        .into_values()
        .map(|mut page| {
            let mut pairs: Vec<(NaiveDateTime, u32)> =
                page.visits.iter().copied().zip(page.durations.iter().copied()).collect();
            pairs.sort_unstable();
            (page.visits, page.durations) = pairs.into_iter().unzip();
            page.typed_count = (page.visits.len() / 3) as u32;
            page
        })
        .collect();
    pages.sort_by(|a, b| b.visit_count().cmp(&a.visit_count()).then_with(|| a.url.cmp(&b.url)));
    Ok(HistoryStore { pages })
}

// ── Logins & cookies ──────────────────────────────────────────

fn saved_logins(
    ctx: &GenerationContext<'_>,
    rng: &mut GeneratorRng,
) -> PopResult<Vec<CredentialEntry>> {
    let mut services: Vec<&str> = ctx.config.credential_services.iter().map(String::as_str).collect();
    services.sort_unstable();
    services
        .into_iter()
        .map(|service| credentials::credential(ctx, rng, service))
        .collect()
}

fn chromium_logins(entries: &[CredentialEntry]) -> serde_json::Value {
    serde_json::Value::Array(
        entries
            .iter()
            .map(|e| {
                json!({
                    "origin_url": format!("https://{}", e.host),
                    "username": e.login(),
                    "password": e.secret,
                    "date_created": e.created.and_hms_opt(0, 0, 0).map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
                    "times_used": e.times_used,
                })
            })
            .collect(),
    )
}

fn firefox_logins(rng: &mut GeneratorRng, entries: &[CredentialEntry]) -> serde_json::Value {
    let logins: Vec<serde_json::Value> = entries
        .iter()
        .enumerate()
        .map(|(idx, e)| {
            let created = e
                .created
                .and_hms_opt(0, 0, 0)
                .map(|t| t.and_utc().timestamp_millis())
                .unwrap_or_default();
            json!({
                "id": idx + 1,
                "hostname": format!("https://{}", e.host),
                "httpRealm": null,
                "formSubmitURL": format!("https://{}", e.host),
                "usernameField": "username",
                "passwordField": "password",
                "encryptedUsername": e.login(),
                "encryptedPassword": e.secret,
                "guid": format!("{{{}}}", rng.uuid()),
                "timeCreated": created,
                "timePasswordChanged": created,
                "timesUsed": e.times_used,
            })
        })
        .collect();
    json!({ "nextId": entries.len() + 1, "logins": logins })
}

struct Cookie {
    domain: String,
    name: &'static str,
    description: &'static str,
    value: String,
}

fn draw_cookies(rng: &mut GeneratorRng) -> PopResult<Vec<Cookie>> {
    let mut cookies = Vec::with_capacity(SITE_POOL.len());
    for (_, _, sites) in SITE_POOL {
        let site = rng.choose(sites)?;
        let (name, description) = *rng.choose(&COOKIE_TYPES)?;
        let value = if name == "tracking_id" {
            rng.uuid().to_string()
        } else {
            rng.alphanumeric(32)
        };
        cookies.push(Cookie {
            domain: format!(".{site}"),
            name,
            description,
            value,
        });
    }
    Ok(cookies)
}

// ── Generator ─────────────────────────────────────────────────

pub struct BrowserGenerator;

impl BrowserGenerator {
    pub fn new() -> Self {
        Self
    }

    fn profile_artifacts(
        &self,
        ctx: &GenerationContext<'_>,
        rng: &mut GeneratorRng,
        browser: BrowserKind,
        logins: &[CredentialEntry],
    ) -> PopResult<Vec<Artifact>> {
        let c = self.category();
        let app = application::application(ctx, rng, browser.application())?;
        let (start, end) = history_window(ctx, app.installed_at)?;
        let history = draw_history(rng, start, end, browser.history_count(ctx))?;
        log::debug!(
            "browser: {} history {} pages, {} visits, window {start} .. {end}",
            browser.short_name(),
            history.pages.len(),
            history.visit_total()
        );

        let (location, profile) = browser.profile(&ctx.persona.username);
        let summary_dir = format!("Documents/Browser_Data_{}", browser.short_name());
        let summary = history_summary(ctx, browser, &history);
        let record = if browser.is_chromium() {
            Record::ChromiumHistory(history)
        } else {
            Record::FirefoxHistory(history)
        };

        let logins_json = if browser.is_chromium() {
            chromium_logins(logins)
        } else {
            firefox_logins(rng, logins)
        };
        let cite_logins = |mut a: Artifact| {
            for e in logins {
                a = a.citing(FactKey::credential(&e.service));
            }
            a
        };
        let cookies = draw_cookies(rng)?;
        let expires = (ctx.clock.today() + Duration::days(365)).format("%Y-%m-%d").to_string();
        let cookies_json = serde_json::Value::Array(
            cookies
                .iter()
                .map(|k| {
                    json!({
                        "domain": k.domain,
                        "name": k.name,
                        "value": k.value,
                        "expirationDate": expires,
                        "secure": true,
                        "httpOnly": true,
                    })
                })
                .collect(),
        );

        Ok(vec![
            Artifact::new(c, location, format!("{profile}/{}", browser.history_file()), record)
                .citing(FactKey::application(browser.application())),
            Artifact::home(c, format!("{summary_dir}/History_Summary.txt"), Record::Text(summary)),
            cite_logins(Artifact::new(
                c,
                location,
                format!("{profile}/{}", browser.logins_file()),
                Record::Json(logins_json),
            )),
            cite_logins(Artifact::home(
                c,
                format!("{summary_dir}/Saved_Passwords.txt"),
                Record::Text(passwords_summary(ctx, browser, logins)),
            )),
            Artifact::new(c, location, format!("{profile}/Cookies.json"), Record::Json(cookies_json)),
            Artifact::home(
                c,
                format!("{summary_dir}/Cookies_Info.txt"),
                Record::Text(cookies_summary(ctx, browser, &cookies, &expires)),
            ),
        ])
    }
}

impl Default for BrowserGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainGenerator for BrowserGenerator {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn category(&self) -> ArtifactCategory {
        ArtifactCategory::Browser
    }

    fn slot(&self) -> GeneratorSlot {
        GeneratorSlot::Browser
    }

    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        rng: &mut GeneratorRng,
    ) -> PopResult<Vec<Artifact>> {
        let logins = saved_logins(ctx, rng)?;
        let mut artifacts = Vec::new();
        for browser in BrowserKind::ALL {
            artifacts.extend(self.profile_artifacts(ctx, rng, browser, &logins)?);
        }
        if let Some(downloads) = download_history(ctx, rng)? {
            artifacts.push(downloads);
        }

        log::info!(
            "browser: {} profiles, {} saved logins, {} files",
            BrowserKind::ALL.len(),
            logins.len(),
            artifacts.len()
        );
        Ok(artifacts)
    }
}

// ── Download history ──────────────────────────────────────────

/// Installers in the manifest with the app record each one cites.
fn installers<'m>(ctx: &GenerationContext<'m>) -> PopResult<Vec<(&'m Artifact, ApplicationRecord)>> {
    let mut found = Vec::new();
    for artifact in ctx.manifest {
        if artifact.category != ArtifactCategory::Application
            || !artifact.relative_path.starts_with(application::INSTALLERS_DIR)
            || !matches!(artifact.record, Record::Binary(_))
        {
            continue;
        }
        for key in &artifact.cites {
            if let Some(app) = ctx.ledger.get::<ApplicationRecord>(key)? {
                found.push((artifact, app));
            }
        }
    }
    Ok(found)
}

fn download_history(
    ctx: &GenerationContext<'_>,
    rng: &mut GeneratorRng,
) -> PopResult<Option<Artifact>> {
    let mut items = installers(ctx)?;
    if items.is_empty() {
        return Ok(None);
    }
    items.sort_by_key(|(_, app)| app.installed_at);

    let mut out = format!(
        "DOWNLOAD HISTORY\nUser: {}\nGenerated: {}\n\n{}\n\n",
        ctx.persona.full_name,
        ctx.clock.now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(75)
    );
    let mut artifact = Artifact::home(ArtifactCategory::Browser, "Downloads/Download_History.txt", Record::Text(String::new()));
    let account_start = ctx
        .persona
        .account_created
        .and_hms_opt(0, 0, 0)
        .unwrap_or(NaiveDateTime::MIN);
    for (installer, app) in &items {
        let lead = rng.range(2, application::MAX_DOWNLOAD_LEAD_MINUTES)?;
        let downloaded_at = (app.installed_at - Duration::minutes(lead)).max(account_start);
        let via = ctx
            .ledger
            .get::<ApplicationRecord>(&FactKey::application(BrowserKind::Chrome.application()))?
            .filter(|browser| browser.installed_at <= downloaded_at)
            .map(|browser| browser.name)
            .unwrap_or_else(|| BrowserKind::Edge.application().to_string());
        let source = DOWNLOAD_SOURCES
            .iter()
            .find(|(name, _)| *name == app.name)
            .map(|(_, url)| url.to_string())
            .unwrap_or_else(|| format!("https://downloads.{}.com/windows/latest", app.safe_name.to_lowercase()));
        let size = match &installer.record {
            Record::Binary(bytes) => bytes.len(),
            _ => 0,
        };
        let _ = write!(
            out,
            "File: {}\n  Source: {source}\n  Saved To: {}\n  Downloaded: {}\n  Size: {size} bytes\n  Browser: {via}\n  Installed: {}\n{}\n\n",
            installer.file_name(),
            installer.display_path(),
            downloaded_at.format("%Y-%m-%d %H:%M:%S"),
            app.installed_at.format("%Y-%m-%d %H:%M:%S"),
            "-".repeat(70)
        );
        artifact = artifact.citing(FactKey::application(&app.name));
    }
    artifact.record = Record::Text(out);
    Ok(Some(artifact))
}

// ── Rendering ─────────────────────────────────────────────────

fn history_summary(ctx: &GenerationContext<'_>, browser: BrowserKind, history: &HistoryStore) -> String {
    let mut visits: Vec<(NaiveDateTime, &PageVisits)> = history
        .pages
        .iter()
        .flat_map(|page| page.visits.iter().map(move |v| (*v, page)))
        .collect();
    visits.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.url.cmp(&b.1.url)));

    let mut out = format!(
        "# {} Browsing History Summary\n# User: {}\n# Pages: {}  Visits: {}\n\n",
        browser.application(),
        ctx.persona.full_name,
        history.pages.len(),
        history.visit_total()
    );
    for (at, page) in visits.iter().rev().take(50).rev() {
        let _ = write!(
            out,
            "[{}] {}\n  URL: {}\n  Visits: {}\n\n",
            at.format("%Y-%m-%d %H:%M:%S"),
            page.title,
            page.url,
            page.visit_count()
        );
    }
    out
}

fn passwords_summary(ctx: &GenerationContext<'_>, browser: BrowserKind, logins: &[CredentialEntry]) -> String {
    let mut out = format!(
        "# {} - Saved Passwords (summary)\n# User: {} ({})\n\nTotal saved passwords: {}\n\n{}\n\n",
        browser.application(),
        ctx.persona.full_name,
        ctx.persona.email,
        logins.len(),
        "=".repeat(70)
    );
    for e in logins {
        let _ = write!(
            out,
            "Website: https://{}\nUsername: {}\nPassword: {}\nCreated: {}\nTimes Used: {}\n{}\n\n",
            e.host,
            e.login(),
            e.secret,
            e.created.format("%Y-%m-%d"),
            e.times_used,
            "-".repeat(70)
        );
    }
    out
}

fn cookies_summary(ctx: &GenerationContext<'_>, browser: BrowserKind, cookies: &[Cookie], expires: &str) -> String {
    let mut out = format!(
        "# {} - Cookies Information\n# User: {}\n# Generated: {}\n\nCommon cookies stored:\n\n",
        browser.application(),
        ctx.persona.full_name,
        ctx.clock.now().format("%Y-%m-%d %H:%M:%S")
    );
    for k in cookies {
        let _ = write!(
            out,
            "Domain: {}\n  Cookie: {}\n  Description: {}\n  Value: {}\n  Expires: {expires}\n  Secure: Yes\n  HttpOnly: Yes\n\n",
            k.domain, k.name, k.description, k.value
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::fixture::Fixture;
    use super::*;
    use crate::config::RunConfig;
    use chrono::NaiveDate;

    fn at(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn history_is_bounded_unique_and_ranked() {
        let fx = Fixture::new();
        let mut rng = fx.rng(GeneratorSlot::Browser);
        let history = draw_history(&mut rng, at(1), at(20), 300).unwrap();

        assert_eq!(history.visit_total(), 300);
        let mut seen = HashSet::new();
        for page in &history.pages {
            assert_eq!(page.visits.len(), page.durations.len());
            assert!(page.visits.windows(2).all(|w| w[0] <= w[1]));
            for v in &page.visits {
                assert!(*v >= at(1) && *v <= at(20));
                assert!(seen.insert((page.site.clone(), *v)), "duplicate visit for {}", page.site);
            }
        }
        assert!(history
            .pages
            .windows(2)
            .all(|w| w[0].visit_count() >= w[1].visit_count()));
    }

    #[test]
    fn window_starts_no_earlier_than_install() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let installed = fx.clock.days_ago(10);
        let (start, end) = history_window(&ctx, installed).unwrap();
        assert_eq!(start, installed);
        assert_eq!(end, fx.clock.now());
    }

    #[test]
    fn browsers_share_one_secret_per_site() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let artifacts = BrowserGenerator::new()
            .generate(&ctx, &mut fx.rng(GeneratorSlot::Browser))
            .unwrap();

        let chrome = artifacts
            .iter()
            .find(|a| a.display_path().contains("Google/Chrome") && a.file_name() == "Login Data.json")
            .unwrap();
        let firefox = artifacts.iter().find(|a| a.file_name() == "logins.json").unwrap();
        let (Record::Json(chrome), Record::Json(firefox)) = (&chrome.record, &firefox.record) else {
            panic!("logins are json")
        };
        let chrome_secrets: Vec<&str> = chrome
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["password"].as_str().unwrap())
            .collect();
        let firefox_secrets: Vec<&str> = firefox["logins"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["encryptedPassword"].as_str().unwrap())
            .collect();
        assert_eq!(chrome_secrets, firefox_secrets);
        assert_eq!(chrome_secrets.len(), fx.config.credential_services.len());
    }

    #[test]
    fn downloads_precede_installs() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let manifest = application::ApplicationGenerator::new()
            .generate(&ctx, &mut fx.rng(GeneratorSlot::Application))
            .unwrap();
        let ctx = GenerationContext { manifest: &manifest, ..fx.ctx() };

        let artifact = download_history(&ctx, &mut fx.rng(GeneratorSlot::Browser))
            .unwrap()
            .expect("installers in manifest");
        let Record::Text(text) = &artifact.record else { panic!("text") };
        assert_eq!(artifact.cites.len(), fx.config.applications.len());

        let stamp = |line: &str| NaiveDateTime::parse_from_str(line, "%Y-%m-%d %H:%M:%S").unwrap();
        let downloaded: Vec<_> = text
            .lines()
            .filter_map(|l| l.trim().strip_prefix("Downloaded: "))
            .map(stamp)
            .collect();
        let installed: Vec<_> = text
            .lines()
            .filter_map(|l| l.trim().strip_prefix("Installed: "))
            .map(stamp)
            .collect();
        assert_eq!(downloaded.len(), installed.len());
        assert!(downloaded.iter().zip(&installed).all(|(d, i)| d < i));
    }

    #[test]
    fn downloads_never_predate_a_new_account() {
        let mut config = RunConfig::default_test();
        // Leaves an install window of eleven days starting at account creation.
        config.identity.account_created = NaiveDate::from_ymd_opt(2025, 5, 5);
        let fx = Fixture::with_config(config);
        let ctx = fx.ctx();
        let manifest = application::ApplicationGenerator::new()
            .generate(&ctx, &mut fx.rng(GeneratorSlot::Application))
            .unwrap();
        let ctx = GenerationContext { manifest: &manifest, ..fx.ctx() };

        let artifact = download_history(&ctx, &mut fx.rng(GeneratorSlot::Browser))
            .unwrap()
            .expect("installers in manifest");
        let Record::Text(text) = &artifact.record else { panic!("text") };
        let account_start = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let downloaded: Vec<NaiveDateTime> = text
            .lines()
            .filter_map(|l| l.trim().strip_prefix("Downloaded: "))
            .map(|d| NaiveDateTime::parse_from_str(d, "%Y-%m-%d %H:%M:%S").unwrap())
            .collect();
        assert_eq!(downloaded.len(), fx.config.applications.len());
        assert!(downloaded.iter().all(|d| *d >= account_start), "{downloaded:?}");
    }
}
