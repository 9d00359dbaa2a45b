//! Persona model: the one synthetic identity of a run.
//!
//! RULE: The persona is built once, before any generator runs, and is
//! immutable afterwards. Every generator reads identity facts from
//! here; none draws its own name, email or dates of record.
//!
//! Identifiers are fake by construction:
//!   - SSN-like ids use area numbers 900–999, which are never issued.
//!   - Phone numbers use the 555-01xx block reserved for fiction.

use crate::{
    clock::RunClock,
    config::IdentityConfig,
    error::{PopError, PopResult},
    name_generator::NameGenerator,
    rng::GeneratorRng,
};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

pub const HOME_STATE: &str = "California";
pub const HOME_STATE_CODE: &str = "CA";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub state_code: String,
    pub zip: String,
}

impl Address {
    /// `"Oakland, CA 94612"`
    pub fn city_line(&self) -> String {
        format!("{}, {} {}", self.city, self.state_code, self.zip)
    }

    pub fn one_line(&self) -> String {
        format!("{}, {}", self.street, self.city_line())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employer {
    pub name: String,
    pub domain: String,
    pub ein: String,
    pub address: Address,
    pub job_title: String,
    pub department: String,
    pub hire_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub username: String,
    pub ssn: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub address: Address,
    pub employer: Employer,
    pub account_created: NaiveDate,
}

impl Persona {
    /// `"Smith, John"`, the order tax forms print.
    pub fn name_last_first(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    /// `"***-**-1234"`
    pub fn ssn_masked(&self) -> String {
        format!("***-**-{}", &self.ssn[self.ssn.len().saturating_sub(4)..])
    }

    pub fn company_name(&self) -> &str {
        &self.employer.name
    }

    /// Profile folder name used by browsers and shells.
    pub fn profile_name(&self) -> &str {
        &self.username
    }
}

/// Builds the persona from configuration overrides and the persona
/// RNG stream.
pub struct PersonaBuilder<'a> {
    identity: &'a IdentityConfig,
    clock: &'a RunClock,
}

impl<'a> PersonaBuilder<'a> {
    pub fn new(identity: &'a IdentityConfig, clock: &'a RunClock) -> Self {
        Self { identity, clock }
    }

    pub fn build(&self, rng: &mut GeneratorRng) -> PopResult<Persona> {
        let (first_name, last_name) = match &self.identity.full_name {
            Some(full) => split_name(full)?,
            None => (
                NameGenerator::generate_first_name(rng).to_string(),
                NameGenerator::generate_last_name(rng).to_string(),
            ),
        };
        let full_name = format!("{first_name} {last_name}");

        let (company, drawn_domain) = NameGenerator::generate_company(rng);
        let (company, domain) = match &self.identity.company_name {
            Some(name) => (name.trim().to_string(), NameGenerator::domain_for(name, ".com")),
            None => (company, drawn_domain),
        };

        let username = username_for(&first_name, &last_name);
        let email = match &self.identity.email {
            Some(email) => email.clone(),
            None => format!("{}.{}@{domain}", ascii_lower(&first_name), ascii_lower(&last_name)),
        };

        let today = self.clock.today();
        let account_created = match self.identity.account_created {
            Some(date) => date,
            None => rng.draw_date(years_before(today, 12), years_before(today, 6))?,
        };
        if account_created >= today {
            return Err(PopError::config(
                "identity.account_created",
                format!("{account_created} is not before {today}"),
            ));
        }

        let date_of_birth =
            rng.draw_date(years_before(today, 55), years_before(today, 28))?;

        let home_city = NameGenerator::generate_city(rng);
        let address = Address {
            street: NameGenerator::generate_street(rng),
            city: home_city.city.to_string(),
            state: HOME_STATE.to_string(),
            state_code: HOME_STATE_CODE.to_string(),
            zip: format!("{}{}", home_city.zip_prefix, rng.draw_identifier("##")?),
        };
        let phone = format!("({}) {}", home_city.area_code, rng.draw_identifier("555-01##")?);
        let ssn = rng.draw_identifier("9##-##-####")?;

        // Hired in the account-creation year, at most four months before
        // the account existed.
        let year_start = NaiveDate::from_ymd_opt(account_created.year(), 1, 1)
            .ok_or_else(|| PopError::config("identity.account_created", "year out of range"))?;
        let hire_from = (account_created - Duration::days(120)).max(year_start);
        let hire_date = rng.draw_date(hire_from, account_created)?;

        let work_city = NameGenerator::generate_city(rng);
        let employer = Employer {
            name: company,
            domain,
            ein: rng.draw_identifier("##-#######")?,
            address: Address {
                street: NameGenerator::generate_street(rng),
                city: work_city.city.to_string(),
                state: HOME_STATE.to_string(),
                state_code: HOME_STATE_CODE.to_string(),
                zip: format!("{}{}", work_city.zip_prefix, rng.draw_identifier("##")?),
            },
            job_title: NameGenerator::generate_job_title(rng).to_string(),
            department: rng
                .choose(&["Engineering", "Platform", "Data", "Product", "Infrastructure"])?
                .to_string(),
            hire_date,
        };

        log::info!(
            "persona: {full_name} <{email}>, account created {account_created}, employer {}",
            employer.name
        );

        Ok(Persona {
            first_name,
            last_name,
            full_name,
            username,
            ssn,
            email,
            phone,
            date_of_birth,
            address,
            employer,
            account_created,
        })
    }
}

/// First and last word of a configured name. Each must carry an ASCII
/// letter or digit, or the username and email would come out empty.
pub(crate) fn split_name(full: &str) -> PopResult<(String, String)> {
    let parts: Vec<&str> = full.split_whitespace().collect();
    let (first, last) = match (parts.first(), parts.last()) {
        (Some(first), Some(last)) if parts.len() >= 2 => (*first, *last),
        _ => {
            return Err(PopError::config(
                "identity.full_name",
                format!("'{full}' must contain a first and a last name"),
            ))
        }
    };
    if ascii_lower(first).is_empty() || ascii_lower(last).is_empty() {
        return Err(PopError::config(
            "identity.full_name",
            format!("'{full}' needs ASCII letters in the first and last name to derive a username"),
        ));
    }
    Ok((first.to_string(), last.to_string()))
}

fn ascii_lower(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// First initial plus last name, lowercase: `John Smith` -> `jsmith`.
pub fn username_for(first: &str, last: &str) -> String {
    let initial = ascii_lower(first).chars().next().map(String::from).unwrap_or_default();
    format!("{initial}{}", ascii_lower(last))
}

/// Same month and day `years` earlier, Feb 29 falling back to Feb 28.
fn years_before(date: NaiveDate, years: i32) -> NaiveDate {
    let year = date.year() - years;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{GeneratorSlot, RngBank};

    fn clock() -> RunClock {
        RunClock::new(
            NaiveDate::from_ymd_opt(2025, 6, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    fn build(identity: &IdentityConfig, seed: u64) -> PopResult<Persona> {
        let clock = clock();
        let mut rng = RngBank::new(seed).for_generator(GeneratorSlot::Persona);
        PersonaBuilder::new(identity, &clock).build(&mut rng)
    }

    #[test]
    fn identifiers_are_fake_by_construction() {
        for seed in 0..50 {
            let p = build(&IdentityConfig::default(), seed).unwrap();
            let area: u32 = p.ssn[..3].parse().unwrap();
            assert!((900..=999).contains(&area), "SSN area {area} must be unissuable");
            assert_eq!(p.ssn.len(), 11);
            assert!(p.phone.contains(" 555-01"), "phone {} must be fictional", p.phone);
        }
    }

    #[test]
    fn email_and_username_follow_the_name() {
        for seed in 0..20 {
            let p = build(&IdentityConfig::default(), seed).unwrap();
            let local = format!("{}.{}", p.first_name.to_lowercase(), p.last_name.to_lowercase());
            assert_eq!(p.email, format!("{local}@{}", p.employer.domain));
            assert!(p.username.ends_with(&p.last_name.to_lowercase()));
            assert_eq!(p.full_name, format!("{} {}", p.first_name, p.last_name));
        }
    }

    #[test]
    fn account_creation_is_six_to_twelve_years_back() {
        for seed in 0..50 {
            let p = build(&IdentityConfig::default(), seed).unwrap();
            assert!(p.account_created >= NaiveDate::from_ymd_opt(2013, 6, 15).unwrap());
            assert!(p.account_created <= NaiveDate::from_ymd_opt(2019, 6, 15).unwrap());
            assert_eq!(p.employer.hire_date.year(), p.account_created.year());
            assert!(p.employer.hire_date <= p.account_created);
        }
    }

    #[test]
    fn overrides_are_kept_consistent() {
        let identity = IdentityConfig {
            full_name: Some("Mary Ann Walker".into()),
            email: None,
            company_name: Some("Acme Analytics".into()),
            account_created: NaiveDate::from_ymd_opt(2017, 3, 1),
        };
        let p = build(&identity, 1).unwrap();
        assert_eq!(p.first_name, "Mary");
        assert_eq!(p.last_name, "Walker");
        assert_eq!(p.username, "mwalker");
        assert_eq!(p.email, "mary.walker@acmeanalytics.com");
        assert_eq!(p.employer.name, "Acme Analytics");
        assert_eq!(p.account_created, NaiveDate::from_ymd_opt(2017, 3, 1).unwrap());
    }

    #[test]
    fn explicit_email_is_kept_verbatim() {
        let identity = IdentityConfig {
            email: Some("j.doe@example.org".into()),
            ..IdentityConfig::default()
        };
        assert_eq!(build(&identity, 3).unwrap().email, "j.doe@example.org");
    }

    #[test]
    fn name_without_ascii_letters_is_rejected() {
        let identity = IdentityConfig {
            full_name: Some("Łódź 山田".into()),
            ..IdentityConfig::default()
        };
        let err = build(&identity, 1).unwrap_err();
        assert!(matches!(err, PopError::Configuration { ref field, .. } if field == "identity.full_name"));

        let identity = IdentityConfig {
            full_name: Some("José Núñez".into()),
            ..IdentityConfig::default()
        };
        let p = build(&identity, 1).unwrap();
        assert_eq!(p.username, "jnez");
        assert!(p.email.starts_with("jos.nez@"));
    }

    #[test]
    fn same_seed_same_persona() {
        let a = build(&IdentityConfig::default(), 77).unwrap();
        let b = build(&IdentityConfig::default(), 77).unwrap();
        assert_eq!(a, b);
    }
}
