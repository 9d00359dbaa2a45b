//! Personal generator: music, photos, health papers and receipts.
//!
//! RULE: Every date here lies in `[account_created, now]`. Receipts
//! are charged to the ledger's payment card, and their sales tax is
//! computed in cents so `subtotal + tax == total` exactly.

use super::{shared, DomainGenerator, GenerationContext};
use crate::{
    artifact::{Artifact, Record, Report},
    error::PopResult,
    facts::PaymentCard,
    ledger::FactKey,
    money::Money,
    rng::{GeneratorRng, GeneratorSlot},
    types::ArtifactCategory,
};
use chrono::{Duration, NaiveDateTime};
use std::fmt::Write as _;

const DIR: &str = "Desktop/Personal";
pub const SALES_TAX_RATE: f64 = 0.0875;

/// (title, artist, seconds)
const SONGS: [(&str, &str, u32); 16] = [
    ("Bohemian Rhapsody", "Queen", 355),
    ("Hotel California", "Eagles", 390),
    ("Imagine", "John Lennon", 183),
    ("Billie Jean", "Michael Jackson", 294),
    ("Smells Like Teen Spirit", "Nirvana", 301),
    ("Wonderwall", "Oasis", 258),
    ("Lose Yourself", "Eminem", 326),
    ("Rolling in the Deep", "Adele", 228),
    ("Shape of You", "Ed Sheeran", 233),
    ("Blinding Lights", "The Weeknd", 200),
    ("Uptown Funk", "Mark Ronson ft. Bruno Mars", 270),
    ("Levitating", "Dua Lipa", 203),
    ("Good 4 U", "Olivia Rodrigo", 178),
    ("Mr. Brightside", "The Killers", 222),
    ("Take On Me", "a-ha", 225),
    ("Dreams", "Fleetwood Mac", 257),
];

const PLAYLISTS: [&str; 3] = ["Workout Mix", "Chill Vibes", "Road Trip"];
const TRACK_STUBS: [&str; 3] = ["morning_run.mp3", "focus_beats.mp3", "weekend_chill.mp3"];

const PHOTO_CATEGORIES: [&str; 10] = [
    "Vacation", "Family", "Friends", "Work Event", "Birthday", "Holiday", "Weekend Trip", "Concert",
    "Sports", "Nature",
];
const RESOLUTIONS: [&str; 4] = ["4032x3024", "3024x4032", "1920x1080", "3840x2160"];

const STORES: [(&str, &str); 7] = [
    ("Whole Foods Market", "Groceries"),
    ("Best Buy", "Electronics"),
    ("Target", "General Merchandise"),
    ("CVS Pharmacy", "Pharmacy/Health"),
    ("Home Depot", "Home Improvement"),
    ("Amazon.com", "Online Shopping"),
    ("Costco", "Wholesale"),
];

/// (item, price in cents)
const ITEMS: [(&str, i64); 10] = [
    ("Organic Bananas", 399),
    ("Greek Yogurt", 549),
    ("Whole Wheat Bread", 429),
    ("Chicken Breast", 1_299),
    ("Mixed Greens", 499),
    ("Coffee Beans", 1_499),
    ("Almond Milk", 379),
    ("Pasta", 299),
    ("Olive Oil", 999),
    ("Tomatoes", 450),
];

// ── Stub payloads ─────────────────────────────────────────────

/// A JFIF header, random scan bytes and an end-of-image marker.
fn jpeg_stub(rng: &mut GeneratorRng) -> PopResult<Vec<u8>> {
    let mut bytes = vec![
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00,
        0x48, 0x00, 0x48, 0x00, 0x00,
    ];
    let mut body = vec![0u8; rng.range(512, 2_048)? as usize];
    rng.fill_bytes(&mut body);
    bytes.extend(body);
    bytes.extend([0xFF, 0xD9]);
    Ok(bytes)
}

/// An ID3v2.3 tag header followed by random frame bytes.
fn mp3_stub(rng: &mut GeneratorRng) -> PopResult<Vec<u8>> {
    let mut bytes = b"ID3\x03\x00\x00\x00\x00\x00\x00".to_vec();
    let mut body = vec![0u8; rng.range(1_500, 4_000)? as usize];
    rng.fill_bytes(&mut body);
    bytes.extend(body);
    Ok(bytes)
}

// ── Receipts ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub store: String,
    pub category: String,
    pub at: NaiveDateTime,
    pub items: Vec<(String, Money)>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

fn draw_receipt(rng: &mut GeneratorRng, start: NaiveDateTime, end: NaiveDateTime) -> PopResult<Receipt> {
    let (store, category) = rng.choose(&STORES)?;
    let count = rng.range(3, 7)? as usize;
    let items: Vec<(String, Money)> = rng
        .sample(&ITEMS, count)?
        .into_iter()
        .map(|(name, cents)| (name.to_string(), Money::from_cents(*cents)))
        .collect();
    let subtotal: Money = items.iter().map(|(_, m)| *m).sum();
    let tax = subtotal.percent(SALES_TAX_RATE);
    Ok(Receipt {
        store: store.to_string(),
        category: category.to_string(),
        at: rng.draw_datetime(start, end)?,
        items,
        subtotal,
        tax,
        total: subtotal + tax,
    })
}

fn receipt_report(ctx: &GenerationContext<'_>, rng: &mut GeneratorRng, r: &Receipt, card: &PaymentCard) -> PopResult<Report> {
    let p = ctx.persona;
    let mut doc = Report::new(r.store.clone());
    doc.line(r.category.clone())
        .line(format!("Customer: {}", p.full_name))
        .line(p.address.one_line())
        .line(format!("Transaction #{}", rng.draw_identifier("######")?))
        .line(format!("Date: {}", r.at.format("%m/%d/%Y %I:%M %p")))
        .heading("Items purchased");
    for (name, price) in &r.items {
        doc.field(name, price);
    }
    doc.blank()
        .field("SUBTOTAL", r.subtotal)
        .field("TAX (8.75%)", r.tax)
        .field("TOTAL", r.total)
        .blank()
        .line(format!("PAYMENT METHOD: {} ending in {}", card.network, card.last_four))
        .line(format!("APPROVAL CODE: {}", rng.draw_identifier("######")?))
        .blank()
        .line("Thank you for shopping with us!");
    Ok(doc)
}

// ── Generator ─────────────────────────────────────────────────

pub struct PersonalGenerator;

impl PersonalGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PersonalGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainGenerator for PersonalGenerator {
    fn name(&self) -> &'static str {
        "personal"
    }

    fn category(&self) -> ArtifactCategory {
        ArtifactCategory::Personal
    }

    fn slot(&self) -> GeneratorSlot {
        GeneratorSlot::Personal
    }

    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        rng: &mut GeneratorRng,
    ) -> PopResult<Vec<Artifact>> {
        let c = self.category();
        let now = ctx.clock.now();
        let created = ctx
            .persona
            .account_created
            .and_hms_opt(0, 0, 0)
            .unwrap_or(now);
        let mut artifacts = Vec::new();

        // Music
        artifacts.push(Artifact::home(
            c,
            format!("{DIR}/Music/My_Playlist.m3u"),
            Record::Text(playlist(&SONGS.iter().collect::<Vec<_>>())),
        ));
        for name in PLAYLISTS {
            let picks = rng.sample(&SONGS, 6)?;
            artifacts.push(Artifact::home(
                c,
                format!("{DIR}/Music/{}.m3u", name.replace(' ', "_")),
                Record::Text(playlist(&picks)),
            ));
        }
        for track in TRACK_STUBS {
            artifacts.push(Artifact::home(c, format!("{DIR}/Music/{track}"), Record::Binary(mp3_stub(rng)?)));
        }

        // Photos
        let owner = FactKey::new("photo_library", ctx.persona.username.clone());
        let mut photos = Vec::with_capacity(ctx.config.counts.photos);
        for _ in 0..ctx.config.counts.photos {
            let file = shared::claim_unique(ctx, rng, c, "IMG_####.jpg", &owner)?;
            let taken = rng.draw_datetime(created, now)?;
            let category = *rng.choose(&PHOTO_CATEGORIES)?;
            let resolution = *rng.choose(&RESOLUTIONS)?;
            photos.push((file, taken, category, resolution));
        }
        photos.sort_by_key(|(_, taken, _, _)| *taken);

        let mut catalog = format!(
            "PHOTO CATALOG\nOwner: {}\nLast Updated: {}\n\n{}\n\n",
            ctx.persona.full_name,
            now.format("%B %d, %Y"),
            "=".repeat(70)
        );
        for (file, taken, category, resolution) in &photos {
            let bytes = jpeg_stub(rng)?;
            let _ = write!(
                catalog,
                "File: {file}\nDate: {}\nCategory: {category}\nSize: {} bytes\nResolution: {resolution}\n{}\n\n",
                taken.format("%Y-%m-%d %H:%M:%S"),
                bytes.len(),
                "-".repeat(70)
            );
            let stem = file.trim_end_matches(".jpg");
            artifacts.push(Artifact::home(
                c,
                format!("{DIR}/Photos/metadata/{stem}.xmp"),
                Record::Text(format!(
                    "filename={file}\ncaptured_at={}\ncategory={category}\nresolution={resolution}\ncamera=Pixel 7 Pro\n",
                    taken.format("%Y-%m-%dT%H:%M:%S")
                )),
            ));
            artifacts.push(Artifact::home(c, format!("{DIR}/Photos/{file}"), Record::Binary(bytes)));
        }
        artifacts.push(Artifact::home(c, format!("{DIR}/Photos/Photo_Catalog.txt"), Record::Text(catalog)));

        // Health
        let member_id = rng.draw_identifier("BC###########")?;
        artifacts.push(Artifact::home(
            c,
            format!("{DIR}/Health/Health_Records.pdf"),
            Record::Report(health_records(ctx, rng, &member_id)?),
        ));
        let year = ctx.clock.current_year();
        artifacts.push(Artifact::home(
            c,
            format!("Documents/Personal/Insurance/Health_Insurance_Policy_{year}.txt"),
            Record::Text(insurance_policy(ctx, rng, &member_id)?),
        ));

        // Receipts
        let card = shared::payment_card(ctx, rng)?;
        let start = ctx.clock.days_ago(90).max(created);
        let end = now - Duration::hours(1);
        for i in 1..=ctx.config.counts.receipts {
            let receipt = draw_receipt(rng, start, end.max(start))?;
            let report = receipt_report(ctx, rng, &receipt, &card)?;
            artifacts.push(
                Artifact::home(
                    c,
                    format!("{DIR}/Receipts/Receipt_{}_{i}.pdf", receipt.at.format("%Y%m%d")),
                    Record::Report(report),
                )
                .citing(FactKey::payment_card("primary")),
            );
        }

        log::info!(
            "personal: {} files ({} photos, {} receipts)",
            artifacts.len(),
            photos.len(),
            ctx.config.counts.receipts
        );
        Ok(artifacts)
    }
}

// ── Rendering ─────────────────────────────────────────────────

fn playlist(songs: &[&(&str, &str, u32)]) -> String {
    let mut out = String::from("#EXTM3U\n");
    for (title, artist, secs) in songs.iter().copied() {
        let file = title
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
            .collect::<String>()
            .replace(' ', "_");
        let _ = writeln!(out, "#EXTINF:{secs},{artist} - {title}\n{file}.mp3");
    }
    out
}

fn health_records(ctx: &GenerationContext<'_>, rng: &mut GeneratorRng, member_id: &str) -> PopResult<Report> {
    let p = ctx.persona;
    let today = ctx.clock.today();
    let mut doc = Report::new(format!("Personal Health Records: {}", p.full_name));
    doc.heading("Personal information")
        .line(format!("Name: {}", p.full_name))
        .line(format!("Date of Birth: {}", p.date_of_birth.format("%B %d, %Y")))
        .line(format!("Blood Type: {}", rng.choose(&["O+", "A+", "B+", "AB+", "O-", "A-"])?))
        .line("Allergies: None known");

    doc.heading("Primary care physician")
        .line("Dr. Emily Rodriguez, MD")
        .line(format!("{} Medical Group", p.address.city))
        .line(format!("Phone: {}", p.phone));

    doc.heading("Recent visits");
    let earliest = (today - Duration::days(365)).max(p.account_created);
    let mut visits = Vec::new();
    for _ in 0..3 {
        visits.push(rng.draw_date(earliest, today - Duration::days(1))?);
    }
    visits.sort_unstable_by(|a, b| b.cmp(a));
    for (date, kind) in visits.iter().zip(["Annual Physical Examination", "Follow-up Appointment", "Flu Vaccination"]) {
        doc.line(format!("{}  {kind}", date.format("%B %d, %Y")));
    }

    doc.heading("Insurance information")
        .line("Provider: Blue Cross Blue Shield")
        .line("Plan: PPO Gold Plus")
        .line(format!("Member ID: {member_id}"));
    Ok(doc)
}

fn insurance_policy(ctx: &GenerationContext<'_>, rng: &mut GeneratorRng, member_id: &str) -> PopResult<String> {
    let p = ctx.persona;
    let year = ctx.clock.current_year();
    let premium = Money::from_dollars(rng.range(38, 52)? * 10);
    Ok(format!(
        "INSURANCE POLICY DOCUMENT\nPolicy Number: {policy}\n{rule}\n\n\
         POLICYHOLDER INFORMATION\n\nName: {name}\nAddress: {addr}\nEmail: {email}\nMember ID: {member_id}\n\n{rule}\n\n\
         POLICY DETAILS\n\nPolicy Type: Comprehensive Health Insurance\nInsurance Company: Blue Cross Blue Shield\n\
         Plan Name: PPO Gold Plus\nGroup: {group}\nEffective Date: January 1, {year}\nExpiration Date: December 31, {year}\n\
         Premium: {premium}/month\n\n{rule}\n\n\
         COVERAGE SUMMARY\n\nAnnual Deductible: $1,500 individual / $3,000 family\n\
         Out-of-Pocket Maximum: $6,000 individual / $12,000 family\n\
         Coinsurance: 80/20 (Plan pays 80% after deductible)\n\n{rule}\n\n\
         COVERED SERVICES\n\nPrimary Care: $25 copay\nSpecialist: $50 copay\nUrgent Care: $75 copay\n\
         Preventive Care: Covered 100%\n",
        policy = rng.draw_identifier("POL-#########")?,
        rule = "=".repeat(75),
        name = p.full_name,
        addr = p.address.one_line(),
        email = p.email,
        group = super::safe_name(&p.employer.name).to_uppercase(),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::fixture::Fixture;
    use super::*;

    #[test]
    fn receipt_tax_is_exact_in_cents() {
        let mut rng = GeneratorRng::new(5, 5);
        let start = NaiveDateTime::parse_from_str("2025-03-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let end = start + Duration::days(90);
        for _ in 0..50 {
            let r = draw_receipt(&mut rng, start, end).unwrap();
            assert_eq!(r.subtotal, r.items.iter().map(|(_, m)| *m).sum::<Money>());
            assert_eq!(r.tax, Money::from_cents((r.subtotal.cents() as f64 * SALES_TAX_RATE).round() as i64));
            assert_eq!(r.total, r.subtotal + r.tax);
            assert!(r.at >= start && r.at <= end);
        }
    }

    #[test]
    fn receipts_use_the_ledger_card_and_photos_stay_in_range() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let artifacts = PersonalGenerator::new()
            .generate(&ctx, &mut fx.rng(GeneratorSlot::Personal))
            .unwrap();
        let card = fx
            .ledger
            .get::<PaymentCard>(&FactKey::payment_card("primary"))
            .unwrap()
            .expect("card created");

        let receipts: Vec<_> = artifacts
            .iter()
            .filter(|a| a.file_name().starts_with("Receipt_"))
            .collect();
        assert_eq!(receipts.len(), fx.config.counts.receipts);
        for r in receipts {
            let Record::Report(report) = &r.record else { panic!("receipt is a report") };
            assert!(report.lines.iter().any(|l| l.ends_with(&format!("ending in {}", card.last_four))));
        }

        let photos = artifacts
            .iter()
            .filter(|a| a.file_name().starts_with("IMG_") && a.file_name().ends_with(".jpg"))
            .count();
        assert_eq!(photos, fx.config.counts.photos);
    }
}
