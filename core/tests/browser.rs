//! Browser history written to disk and read back through SQLite.

use populator_core::{
    config::RunConfig,
    pipeline,
    store::{firefox_time, from_chromium_time, HistoryDb},
};
use std::collections::HashSet;

fn host(url: &str) -> &str {
    url.split("://").nth(1).unwrap_or(url).split(['/', '?']).next().unwrap_or(url)
}

#[test]
fn history_databases_are_bounded_and_unique() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = RunConfig::default_test();
    let summary = pipeline::run(Some(dir.path()), &config).expect("file run");

    let created = summary.account_created.and_hms_opt(0, 0, 0).expect("midnight");
    let now = summary.reference_time;
    let window_start = now - chrono::Duration::days(config.counts.history_window_days);

    for (profile, expected) in [
        ("AppData/Local/Google/Chrome/User Data/Default/History", config.counts.chrome_history),
        ("AppData/Local/Microsoft/Edge/User Data/Default/History", config.counts.edge_history),
    ] {
        let db = HistoryDb::open(&dir.path().join(profile)).expect("open chromium history");
        let visits = db.chromium_visits().expect("read visits");
        assert_eq!(visits.len(), expected, "{profile}");

        let mut seen = HashSet::new();
        for (url, micros) in &visits {
            let at = from_chromium_time(*micros).expect("valid timestamp");
            assert!(at >= created && at >= window_start && at <= now, "{url} visited at {at}");
            assert!(seen.insert((host(url).to_string(), *micros)), "duplicate visit {url} {at}");
        }

        let urls = db.chromium_urls().expect("read urls");
        assert!(urls.windows(2).all(|w| w[0].1 >= w[1].1), "{profile} not most-visited first");
        assert_eq!(urls.iter().map(|(_, n)| n).sum::<i64>() as usize, expected);
    }

    let places = dir
        .path()
        .join("AppData/Roaming/Mozilla/Firefox/Profiles")
        .join(format!("{}.default-release", summary.username))
        .join("places.sqlite");
    let db = HistoryDb::open(&places).expect("open places");
    let visits = db.firefox_visits().expect("read visits");
    assert_eq!(visits.len(), config.counts.firefox_history);
    assert!(visits.windows(2).all(|w| w[0].1 <= w[1].1));
    assert!(visits.iter().all(|(_, t)| *t >= firefox_time(created) && *t <= firefox_time(now)));
}

#[test]
fn logins_json_is_identical_for_chromium_browsers() {
    let dir = tempfile::tempdir().expect("tempdir");
    pipeline::run(Some(dir.path()), &RunConfig::default_test()).expect("file run");

    let read = |rel: &str| -> serde_json::Value {
        let raw = std::fs::read_to_string(dir.path().join(rel)).expect("logins file");
        serde_json::from_str(&raw).expect("valid json")
    };
    let chrome = read("AppData/Local/Google/Chrome/User Data/Default/Login Data.json");
    let edge = read("AppData/Local/Microsoft/Edge/User Data/Default/Login Data.json");
    assert_eq!(chrome, edge);
    assert!(!chrome.as_array().expect("array of logins").is_empty());
}
