//! Application generator: installed software and its footprint.
//!
//! RULE: Each configured application has one ApplicationRecord under
//! `application/{name}`. The installed list, usage logs, install logs,
//! installer manifest and the browser stage's download history all read
//! it. Install dates lie in `[max(account_created, now - 1000d),
//! now - 30d]` and every session is strictly after the install.
//!
//! Footprint folders under Program Files and roaming AppData are derived
//! from the name; two applications mapping to the same folder is a
//! ConsistencyViolation.

use super::{safe_name, shared, DomainGenerator, GenerationContext};
use crate::{
    artifact::{Artifact, Location, Record},
    error::{PopError, PopResult},
    facts::ApplicationRecord,
    ledger::FactKey,
    rng::{GeneratorRng, GeneratorSlot},
    types::ArtifactCategory,
};
use chrono::Duration;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as _;

pub const INSTALLERS_DIR: &str = "Downloads/Software_Installers";
pub const INSTALLERS_MANIFEST: &str = "INSTALLERS_MANIFEST.txt";

const INSTALL_WINDOW_DAYS: i64 = 1_000;
const MIN_INSTALL_AGE_DAYS: i64 = 30;
/// Longest gap between an installer's download and its install. No
/// install is drawn earlier than this after the account was created.
pub const MAX_DOWNLOAD_LEAD_MINUTES: i64 = 180;

/// Known installer names and publishers. Others get `{safe}_Setup.exe`.
const KNOWN: [(&str, &str, &str); 20] = [
    ("Google Chrome", "ChromeSetup.exe", "Google LLC"),
    ("Mozilla Firefox", "FirefoxInstaller.exe", "Mozilla Corporation"),
    ("Microsoft Edge", "MicrosoftEdgeSetup.exe", "Microsoft Corporation"),
    ("Microsoft Teams", "TeamsSetup.exe", "Microsoft Corporation"),
    ("Microsoft OneDrive", "OneDriveSetup.exe", "Microsoft Corporation"),
    ("Microsoft Office 365", "OfficeSetup.exe", "Microsoft Corporation"),
    ("Zoom", "ZoomInstallerFull.msi", "Zoom Video Communications"),
    ("VLC Media Player", "vlc-3.0.20-win64.exe", "VideoLAN"),
    ("WinRAR", "winrar-x64-701.exe", "win.rar GmbH"),
    ("7-Zip", "7z2408-x64.exe", "Igor Pavlov"),
    ("Visual Studio Code", "VSCodeUserSetup-x64.exe", "Microsoft Corporation"),
    ("Docker Desktop", "Docker Desktop Installer.exe", "Docker Inc."),
    ("Git", "Git-64-bit.exe", "The Git Development Community"),
    ("Google Drive", "GoogleDriveSetup.exe", "Google LLC"),
    ("Dropbox", "DropboxInstaller.exe", "Dropbox, Inc."),
    ("Box", "BoxDrive.msi", "Box, Inc."),
    ("Spotify", "SpotifySetup.exe", "Spotify AB"),
    ("Slack", "SlackSetup.exe", "Slack Technologies"),
    ("Notepad++", "npp-x64-Installer.exe", "Notepad++ Team"),
    ("Adobe Acrobat Reader DC", "AcroRdrDC_Installer.exe", "Adobe Inc."),
];

/// (product, license type, billing, monthly or one-time cost)
const LICENSES: [(&str, &str, &str, &str); 5] = [
    ("Microsoft Office 365", "Subscription", "Annual", "$99.99/year"),
    ("Adobe Acrobat Pro", "Perpetual", "One-time", "$449.99"),
    ("Zoom Pro", "Subscription", "Monthly", "$14.99/month"),
    ("Spotify Premium", "Subscription", "Monthly", "$11.99/month"),
    ("JetBrains All Products", "Subscription", "Annual", "$289.00/year"),
];

/// (file, description, size in KB)
const DOWNLOAD_PLACEHOLDERS: [(&str, &str, i64); 4] = [
    ("project_budget.xlsx", "Budget worksheet", 900),
    ("client_contract.docx", "Client contract draft", 400),
    ("design_assets_v3.zip", "Design assets", 2_048),
    ("aws_architecture_diagram.png", "Architecture diagram", 800),
];

fn installer_name(name: &str) -> String {
    KNOWN
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, file, _)| file.to_string())
        .unwrap_or_else(|| format!("{}_Setup.exe", safe_name(name)))
}

fn publisher(name: &str) -> String {
    KNOWN
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, _, publisher)| publisher.to_string())
        .unwrap_or_else(|| format!("{name} Developers"))
}

// ── Ledger resolver ───────────────────────────────────────────

/// The install record of `name`.
pub fn application(
    ctx: &GenerationContext<'_>,
    rng: &mut GeneratorRng,
    name: &str,
) -> PopResult<ApplicationRecord> {
    ctx.ledger.get_or_create(FactKey::application(name), || {
        let now = ctx.clock.now();
        let created = ctx
            .persona
            .account_created
            .and_hms_opt(0, 0, 0)
            .unwrap_or(now);
        let earliest = ctx
            .clock
            .days_ago(INSTALL_WINDOW_DAYS)
            .max(created + Duration::minutes(MAX_DOWNLOAD_LEAD_MINUTES));
        let latest = ctx.clock.days_ago(MIN_INSTALL_AGE_DAYS);
        if earliest > latest {
            return Err(PopError::config(
                "identity.account_created",
                format!(
                    "account created {} leaves no room to install {name} at least {MIN_INSTALL_AGE_DAYS} days before {}",
                    ctx.persona.account_created,
                    ctx.clock.today()
                ),
            ));
        }
        let installed_at = rng.draw_datetime(earliest, latest)?;

        let count = rng.range(3, 45)? as usize;
        let mut sessions = Vec::with_capacity(count);
        for _ in 0..count {
            sessions.push(rng.draw_datetime(installed_at + Duration::seconds(1), now)?);
        }
        sessions.sort_unstable();
        let last_used = sessions.last().copied().unwrap_or(installed_at);

        let safe = safe_name(name);
        Ok(ApplicationRecord {
            name: name.to_string(),
            safe_name: safe.clone(),
            publisher: publisher(name),
            version: format!(
                "{}.{}.{}",
                rng.range(1, 20)?,
                rng.range(0, 9)?,
                rng.range(0, 99)?
            ),
            installed_at,
            last_used,
            size_mb: rng.range(50, 2_000)? as u32,
            sessions,
            installer_file: installer_name(name),
            installer_bytes: rng.range(64, 768)? as u64 * 1_024,
            program_dir: safe.clone(),
            appdata_dir: safe,
        })
    })
}

/// Fail when two applications would share a footprint folder or an
/// installer file name. Folder names compare case-insensitively.
pub fn check_footprints(records: &[ApplicationRecord]) -> PopResult<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for r in records {
        for path in [
            format!("program files/{}", r.program_dir.to_lowercase()),
            format!("appdata/{}", r.appdata_dir.to_lowercase()),
            format!("installer/{}", r.installer_file.to_lowercase()),
        ] {
            if let Some(other) = seen.insert(path.clone(), &r.name) {
                return Err(PopError::violation(
                    ArtifactCategory::Application,
                    format!("{} and {} both map to {path}", other, r.name),
                ));
            }
        }
    }
    Ok(())
}

fn installer_bytes(rng: &mut GeneratorRng, len: u64) -> Vec<u8> {
    let mut bytes = vec![0u8; len as usize];
    rng.fill_bytes(&mut bytes);
    bytes[0] = b'M';
    bytes[1] = b'Z';
    bytes
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// ── Generator ─────────────────────────────────────────────────

pub struct ApplicationGenerator;

impl ApplicationGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ApplicationGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainGenerator for ApplicationGenerator {
    fn name(&self) -> &'static str {
        "application"
    }

    fn category(&self) -> ArtifactCategory {
        ArtifactCategory::Application
    }

    fn slot(&self) -> GeneratorSlot {
        GeneratorSlot::Application
    }

    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        rng: &mut GeneratorRng,
    ) -> PopResult<Vec<Artifact>> {
        let c = self.category();
        let mut records = Vec::with_capacity(ctx.config.applications.len());
        for name in &ctx.config.applications {
            records.push(application(ctx, rng, name)?);
        }
        check_footprints(&records)?;

        let mut artifacts = Vec::new();
        let cite_all = |mut a: Artifact| {
            for r in &records {
                a = a.citing(FactKey::application(&r.name));
            }
            a
        };
        artifacts.push(cite_all(Artifact::home(
            c,
            "Downloads/Installed_Applications.txt",
            Record::Text(installed_list(ctx, &records)),
        )));
        artifacts.push(cite_all(Artifact::home(
            c,
            "Downloads/Recent_App_Activity.txt",
            Record::Text(recent_activity(ctx, &records)),
        )));
        artifacts.push(cite_all(Artifact::home(
            c,
            "Downloads/Application_Usage_History.txt",
            Record::Text(usage_history(ctx, &records)),
        )));

        let card = shared::payment_card(ctx, rng)?;
        artifacts.push(
            Artifact::home(
                c,
                "Downloads/Software_Licenses.txt",
                Record::Text(licenses(ctx, rng, &card)?),
            )
            .citing(FactKey::payment_card("primary")),
        );

        let mut manifest = String::from("INSTALLERS MANIFEST\n\n");
        for r in &records {
            let key = FactKey::application(&r.name);
            let bytes = installer_bytes(rng, r.installer_bytes);
            let _ = writeln!(
                manifest,
                "{} | v{} | {} | sha256={}",
                r.installer_file,
                r.version,
                r.installed_at.format("%Y-%m-%d"),
                sha256_hex(&bytes)
            );
            artifacts.push(
                Artifact::home(c, format!("{INSTALLERS_DIR}/{}", r.installer_file), Record::Binary(bytes))
                    .citing(key.clone()),
            );

            artifacts.push(
                Artifact::new(
                    c,
                    Location::ProgramFiles,
                    format!("{}/install.log", r.program_dir),
                    Record::Text(format!(
                        "{} installation log\nPublisher: {}\nVersion: {}\nInstalled: {}\nLast Launched: {}\nStatus: Completed successfully\n",
                        r.name,
                        r.publisher,
                        r.version,
                        r.installed_at.format("%Y-%m-%d %H:%M:%S"),
                        r.last_used.format("%Y-%m-%d %H:%M:%S")
                    )),
                )
                .citing(key.clone()),
            );
            artifacts.push(
                Artifact::new(
                    c,
                    Location::ProgramFiles,
                    format!("{}/config.ini", r.program_dir),
                    Record::Text(format!(
                        "[General]\ninstall_dir={}\nuser={}\nauto_update=true\nlast_update_check={}\n",
                        r.program_dir,
                        ctx.persona.username,
                        r.last_used.format("%Y-%m-%d")
                    )),
                )
                .citing(key.clone()),
            );
            artifacts.push(
                Artifact::new(
                    c,
                    Location::RoamingAppData,
                    format!("{}/usage.log", r.appdata_dir),
                    Record::Text(usage_log(r)),
                )
                .citing(key),
            );
        }
        artifacts.push(cite_all(Artifact::home(
            c,
            format!("{INSTALLERS_DIR}/{INSTALLERS_MANIFEST}"),
            Record::Text(manifest),
        )));

        for (file, description, kb) in DOWNLOAD_PLACEHOLDERS {
            let mut bytes = vec![0u8; kb as usize * 1_024];
            rng.fill_bytes(&mut bytes);
            log::debug!("application: placeholder {file} ({description})");
            artifacts.push(Artifact::home(c, format!("Downloads/{file}"), Record::Binary(bytes)));
        }

        log::info!(
            "application: {} applications, {} files",
            records.len(),
            artifacts.len()
        );
        Ok(artifacts)
    }
}

// ── Rendering ─────────────────────────────────────────────────

fn human_size(mb: u32) -> String {
    if mb >= 1_024 {
        format!("{:.1} GB", mb as f64 / 1_024.0)
    } else {
        format!("{mb} MB")
    }
}

fn installed_list(ctx: &GenerationContext<'_>, records: &[ApplicationRecord]) -> String {
    let mut out = format!(
        "INSTALLED APPLICATIONS\nComputer: {}'s Workstation\nLast Updated: {}\n\n{}\n",
        ctx.persona.full_name,
        ctx.clock.now().format("%B %d, %Y %H:%M:%S"),
        "=".repeat(75)
    );
    for (i, r) in records.iter().enumerate() {
        let _ = write!(
            out,
            "\n{}. {}\n   Publisher: {}\n   Version: {}\n   Installed: {}\n   Size: {}\n   Last Used: {}\n",
            i + 1,
            r.name,
            r.publisher,
            r.version,
            r.installed_at.format("%m/%d/%Y"),
            human_size(r.size_mb),
            r.last_used.format("%m/%d/%Y")
        );
    }
    out
}

fn recent_activity(ctx: &GenerationContext<'_>, records: &[ApplicationRecord]) -> String {
    let since = ctx.clock.days_ago(30);
    let mut out = format!(
        "RECENT APPLICATION ACTIVITY\nUser: {}\nPeriod: Last 30 Days\n\n{}\n\n",
        ctx.persona.full_name,
        "=".repeat(75)
    );
    for r in records {
        let recent = r.sessions.iter().filter(|s| **s >= since).count();
        if recent == 0 {
            continue;
        }
        let _ = write!(
            out,
            "{}\n  Last Used: {}\n  Sessions: {recent}\n{}\n\n",
            r.name,
            r.last_used.format("%B %d, %Y at %I:%M %p"),
            "-".repeat(70)
        );
    }
    out
}

fn usage_history(ctx: &GenerationContext<'_>, records: &[ApplicationRecord]) -> String {
    let mut out = format!(
        "APPLICATION USAGE HISTORY\nUser: {}\nGenerated: {}\n\n",
        ctx.persona.full_name,
        ctx.clock.now().format("%Y-%m-%d %H:%M:%S")
    );
    for r in records {
        let _ = write!(
            out,
            "{}\n  Installed: {}\n  Sessions: {}\n  First Session: {}\n  Last Used: {}\n  Launch Method: Start Menu / Taskbar\n{}\n",
            r.name,
            r.installed_at.format("%Y-%m-%d %H:%M:%S"),
            r.sessions.len(),
            r.sessions.first().map(|s| s.format("%Y-%m-%d %H:%M:%S").to_string()).unwrap_or_default(),
            r.last_used.format("%Y-%m-%d %H:%M:%S"),
            "-".repeat(70)
        );
    }
    out
}

fn usage_log(r: &ApplicationRecord) -> String {
    let mut out = format!("App: {}\nVersion: {}\n", r.name, r.version);
    for s in r.sessions.iter().rev().take(10) {
        let _ = writeln!(out, "{} session started", s.format("%Y-%m-%d %H:%M:%S"));
    }
    out
}

fn licenses(
    ctx: &GenerationContext<'_>,
    rng: &mut GeneratorRng,
    card: &crate::facts::PaymentCard,
) -> PopResult<String> {
    let p = ctx.persona;
    let mut out = format!(
        "SOFTWARE LICENSE INFORMATION\n{}\n{}\nGenerated: {}\n\n{}\n\n",
        p.full_name,
        p.email,
        ctx.clock.today().format("%B %d, %Y"),
        "=".repeat(75)
    );
    for (product, kind, billing, cost) in LICENSES {
        let _ = write!(
            out,
            "SOFTWARE: {product}\nLicense Type: {kind}\nBilling: {billing}\nCost: {cost}\nLicense Key: {}\n",
            rng.draw_identifier("*****-*****-*****-*****")?
        );
        if kind == "Subscription" {
            let renewal = ctx.clock.today() + Duration::days(rng.range(30, 365)?);
            let _ = writeln!(out, "Next Renewal: {}", renewal.format("%B %d, %Y"));
        }
        let _ = write!(out, "{}\n\n", "-".repeat(70));
    }
    let _ = write!(
        out,
        "NOTES:\n* All subscriptions set to auto-renew\n* Payment method: {} ending in {}\n* Renewal notifications sent to {}\n",
        card.network, card.last_four, p.email
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::fixture::Fixture;
    use super::*;

    #[test]
    fn installs_and_sessions_respect_bounds() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let mut rng = fx.rng(GeneratorSlot::Application);
        let created = fx.persona.account_created.and_hms_opt(0, 0, 0).unwrap();

        for name in &fx.config.applications {
            let r = application(&ctx, &mut rng, name).unwrap();
            assert!(r.installed_at >= created + Duration::minutes(MAX_DOWNLOAD_LEAD_MINUTES));
            assert!(r.installed_at >= fx.clock.days_ago(INSTALL_WINDOW_DAYS));
            assert!(r.installed_at <= fx.clock.days_ago(MIN_INSTALL_AGE_DAYS));
            assert!(r.sessions.iter().all(|s| *s > r.installed_at && *s <= fx.clock.now()));
            assert!(r.sessions.windows(2).all(|w| w[0] <= w[1]));
            assert_eq!(r.last_used, *r.sessions.last().unwrap());
        }
    }

    #[test]
    fn colliding_folders_are_a_violation() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let mut rng = fx.rng(GeneratorSlot::Application);
        let a = application(&ctx, &mut rng, "Python 3.11").unwrap();
        let b = application(&ctx, &mut rng, "Python_3.11").unwrap();
        assert_eq!(a.program_dir, b.program_dir);

        let err = check_footprints(&[a.clone(), b]).unwrap_err();
        assert!(matches!(err, PopError::ConsistencyViolation { .. }));
        assert!(check_footprints(&[a]).is_ok());
    }

    #[test]
    fn manifest_checksums_match_installers() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let artifacts = ApplicationGenerator::new()
            .generate(&ctx, &mut fx.rng(GeneratorSlot::Application))
            .unwrap();
        let manifest = artifacts
            .iter()
            .find(|a| a.file_name() == INSTALLERS_MANIFEST)
            .unwrap();
        let Record::Text(text) = &manifest.record else { panic!("manifest is text") };

        for line in text.lines().filter(|l| l.contains("sha256=")) {
            let file = line.split(" | ").next().unwrap();
            let digest = line.rsplit("sha256=").next().unwrap();
            let installer = artifacts
                .iter()
                .find(|a| a.file_name() == file)
                .expect("installer present");
            let Record::Binary(bytes) = &installer.record else { panic!("installer is binary") };
            assert_eq!(sha256_hex(bytes), digest);
            assert_eq!(&bytes[..2], b"MZ");
        }
    }
}
