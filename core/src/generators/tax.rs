//! Tax generator: wage history and federal/state returns.
//!
//! RULE: Wage and tax figures exist once per year, in the ledger under
//! `tax_year/{year}`. The W-2, 1040, 540, investment statement and
//! performance reviews all render the same FinancialYearRecord.
//!
//! Documented policy (internal, not real tax law):
//!   - Wages in the hire year are the starting salary ($78k–$112k).
//!     Each later year is the prior year × (1 + g), g in [-2%, +9%].
//!   - Federal withholding is 16% of wages.
//!   - Federal liability applies the 2024 single-filer brackets to
//!     wages less the standard deduction. Married filing jointly
//!     doubles the bracket thresholds; head of household uses 1.5×.
//!   - State wages equal federal wages. State withholding is 6.2%;
//!     state liability is 5.8% of wages less the state standard
//!     deduction, minus a $60 renter's credit, floored at zero.
//!   - Social security 6.2% up to the year's wage base; medicare 1.45%.
//!   - Refunds are withholding − liability, negative when owed.

use super::{shared, DomainGenerator, GenerationContext};
use crate::{
    artifact::{Artifact, Record, Report},
    config::FilingStatus,
    error::{PopError, PopResult},
    facts::{EmploymentRecord, FinancialYearRecord},
    ledger::FactKey,
    money::Money,
    name_generator::NameGenerator,
    rng::{GeneratorRng, GeneratorSlot},
    types::{ArtifactCategory, Year},
};
use chrono::{Datelike, NaiveDate};

pub const FEDERAL_WITHHOLDING_RATE: f64 = 0.16;
pub const STATE_WITHHOLDING_RATE: f64 = 0.062;
pub const STATE_TAX_RATE: f64 = 0.058;
pub const STATE_WAGE_RATIO: f64 = 1.0;
pub const SOCIAL_SECURITY_RATE: f64 = 0.062;
pub const MEDICARE_RATE: f64 = 0.0145;
pub const RENTERS_CREDIT: Money = Money::from_dollars(60);
pub const WAGE_GROWTH_MIN: f64 = -0.02;
pub const WAGE_GROWTH_MAX: f64 = 0.09;
pub const STARTING_SALARY_MIN: Money = Money::from_dollars(78_000);
pub const STARTING_SALARY_MAX: Money = Money::from_dollars(112_000);

/// 2024 single-filer brackets: (upper bound in dollars, rate).
const FEDERAL_BRACKETS: [(Option<i64>, f64); 7] = [
    (Some(11_600), 0.10),
    (Some(47_150), 0.12),
    (Some(100_525), 0.22),
    (Some(191_950), 0.24),
    (Some(243_725), 0.32),
    (Some(609_350), 0.35),
    (None, 0.37),
];

// ── Policy ────────────────────────────────────────────────────

/// Federal standard deduction. Years before 2022 use the 2022 figure,
/// years after 2024 the 2024 figure.
pub fn standard_deduction(year: Year, status: FilingStatus) -> Money {
    // (through 2022, 2023, 2024 onwards)
    let (y2022, y2023, y2024) = match status {
        FilingStatus::Single => (12_950, 13_850, 14_600),
        FilingStatus::MarriedFilingJointly => (25_900, 27_700, 29_200),
        FilingStatus::HeadOfHousehold => (19_400, 20_800, 21_900),
    };
    let dollars = if year <= 2022 {
        y2022
    } else if year == 2023 {
        y2023
    } else {
        y2024
    };
    Money::from_dollars(dollars)
}

fn bracket_scale(status: FilingStatus) -> (i64, i64) {
    match status {
        FilingStatus::Single => (1, 1),
        FilingStatus::MarriedFilingJointly => (2, 1),
        FilingStatus::HeadOfHousehold => (3, 2),
    }
}

/// Progressive tax on `taxable` income. Each bracket's share is
/// rounded to the cent before summing.
pub fn bracket_tax(taxable: Money, status: FilingStatus) -> Money {
    let (num, den) = bracket_scale(status);
    let mut tax = Money::ZERO;
    let mut lower = Money::ZERO;
    for (upper, rate) in FEDERAL_BRACKETS {
        if taxable <= lower {
            break;
        }
        let top = match upper {
            Some(dollars) => Money::from_cents(dollars * 100 * num / den).min(taxable),
            None => taxable,
        };
        tax += (top - lower).percent(rate);
        lower = top;
    }
    tax
}

/// The documented liability estimate for a year's wages.
pub fn estimated_liability(wages: Money, year: Year, status: FilingStatus) -> Money {
    let taxable = (wages - standard_deduction(year, status)).max(Money::ZERO);
    bracket_tax(taxable, status)
}

pub fn state_standard_deduction(year: Year, status: FilingStatus) -> Money {
    let single = if year <= 2022 {
        5_202
    } else if year == 2023 {
        5_363
    } else {
        5_552
    };
    let dollars = match status {
        FilingStatus::MarriedFilingJointly => single * 2,
        _ => single,
    };
    Money::from_dollars(dollars)
}

pub fn state_liability(state_wages: Money, year: Year, status: FilingStatus) -> Money {
    let taxable = (state_wages - state_standard_deduction(year, status)).max(Money::ZERO);
    (taxable.percent(STATE_TAX_RATE) - RENTERS_CREDIT).max(Money::ZERO)
}

/// Social security wage base. Years before 2022 use the 2022 base.
pub fn social_security_wage_base(year: Year) -> Money {
    Money::from_dollars(match year {
        2023 => 160_200,
        2024 => 168_600,
        y if y <= 2022 => 147_000,
        _ => 176_100,
    })
}

/// All derived figures for a year with the given wages.
pub fn compute_year(year: Year, wages: Money, status: FilingStatus) -> FinancialYearRecord {
    let deduction = standard_deduction(year, status);
    let federal_withholding = wages.percent(FEDERAL_WITHHOLDING_RATE);
    let federal_liability = estimated_liability(wages, year, status);
    let ss_wages = wages.min(social_security_wage_base(year));
    let state_wages = wages.percent(STATE_WAGE_RATIO);
    let state_withholding = state_wages.percent(STATE_WITHHOLDING_RATE);
    let state_liability = state_liability(state_wages, year, status);

    FinancialYearRecord {
        year,
        filing_status: status,
        wages,
        standard_deduction: deduction,
        taxable_income: (wages - deduction).max(Money::ZERO),
        federal_withholding,
        federal_liability,
        federal_refund: federal_withholding - federal_liability,
        social_security_wages: ss_wages,
        social_security_tax: ss_wages.percent(SOCIAL_SECURITY_RATE),
        medicare_tax: wages.percent(MEDICARE_RATE),
        state_wages,
        state_withholding,
        state_liability,
        state_refund: state_withholding - state_liability,
    }
}

// ── Ledger resolvers ──────────────────────────────────────────

/// Employment terms, fixed at hire.
pub fn employment(ctx: &GenerationContext<'_>, rng: &mut GeneratorRng) -> PopResult<EmploymentRecord> {
    let employer = &ctx.persona.employer;
    let key = FactKey::employment(&employer.name);
    ctx.ledger.get_or_create(key.clone(), || {
        let raw = rng.draw_money(STARTING_SALARY_MIN, STARTING_SALARY_MAX)?;
        // Offers are made in whole hundreds.
        let starting_salary = Money::from_cents(raw.cents() / 10_000 * 10_000);
        let employee_id = shared::claim_unique(ctx, rng, ArtifactCategory::Tax, "EMP-######", &key)?;
        let manager = format!(
            "{} {}",
            NameGenerator::generate_first_name(rng),
            NameGenerator::generate_last_name(rng)
        );
        Ok(EmploymentRecord {
            employer: employer.name.clone(),
            employee_id,
            hire_date: employer.hire_date,
            starting_salary,
            manager,
        })
    })
}

/// The first year with wages on record.
pub fn first_wage_year(ctx: &GenerationContext<'_>) -> Year {
    ctx.persona.employer.hire_date.year()
}

/// The FinancialYearRecord for `year`, creating the wage chain from the
/// hire year up to `year` as needed.
pub fn year_record(
    ctx: &GenerationContext<'_>,
    rng: &mut GeneratorRng,
    year: Year,
) -> PopResult<FinancialYearRecord> {
    let first = first_wage_year(ctx);
    if year < first {
        return Err(PopError::config(
            "tax_years",
            format!(
                "{year} precedes the account-creation year {} (account created {})",
                first, ctx.persona.account_created
            ),
        ));
    }
    if year >= ctx.clock.current_year() {
        return Err(PopError::config(
            "tax_years",
            format!("{year} has not ended by the reference date {}", ctx.clock.today()),
        ));
    }

    ctx.ledger.get_or_create(FactKey::tax_year(year), || {
        let wages = if year == first {
            employment(ctx, rng)?.starting_salary
        } else {
            let prior = year_record(ctx, rng, year - 1)?;
            let growth = rng.draw_amount(WAGE_GROWTH_MIN, WAGE_GROWTH_MAX, 4)?;
            prior.wages.percent(1.0 + growth)
        };
        Ok(compute_year(year, wages, ctx.config.filing_status))
    })
}

// ── Generator ─────────────────────────────────────────────────

pub struct TaxGenerator;

impl TaxGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TaxGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainGenerator for TaxGenerator {
    fn name(&self) -> &'static str {
        "tax"
    }

    fn category(&self) -> ArtifactCategory {
        ArtifactCategory::Tax
    }

    fn slot(&self) -> GeneratorSlot {
        GeneratorSlot::Tax
    }

    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        rng: &mut GeneratorRng,
    ) -> PopResult<Vec<Artifact>> {
        // Resolve every year before rendering anything, so a bad year
        // fails the stage with no tax files produced.
        let mut records = Vec::with_capacity(ctx.config.tax_years.len());
        for &year in &ctx.config.tax_years {
            records.push(year_record(ctx, rng, year)?);
        }
        let checking = shared::checking_account(ctx, rng)?;

        let mut artifacts = Vec::new();
        for record in &records {
            let year = record.year;
            let income = shared::investment_income(ctx, rng, year)?;
            let dir = format!("Desktop/Tax Documents/{year}");

            let federal = federal_return(ctx, record, &income, &checking);
            let state = state_return(ctx, record, &checking);
            let w2 = w2_form(ctx, record);

            artifacts.push(
                Artifact::home(self.category(), format!("{dir}/Form_1040_Federal_{year}.pdf"), Record::Report(federal))
                    .citing(FactKey::tax_year(year))
                    .citing(FactKey::investment_income(year))
                    .citing(FactKey::account(&checking.institution)),
            );
            artifacts.push(
                Artifact::home(self.category(), format!("{dir}/Form_540_California_{year}.pdf"), Record::Report(state))
                    .citing(FactKey::tax_year(year))
                    .citing(FactKey::account(&checking.institution)),
            );
            artifacts.push(
                Artifact::home(self.category(), format!("{dir}/W2_Form_{year}.pdf"), Record::Report(w2))
                    .citing(FactKey::tax_year(year))
                    .citing(FactKey::employment(&ctx.persona.employer.name)),
            );
            log::debug!(
                "tax: {year} wages {} refund {} state refund {}",
                record.wages, record.federal_refund, record.state_refund
            );
        }

        log::info!(
            "tax: {} returns for years {:?}",
            records.len(),
            ctx.config.tax_years
        );
        Ok(artifacts)
    }
}

// ── Rendering ─────────────────────────────────────────────────

/// `month/day` of the year after `year`, or today if that is still ahead.
fn dated_after_year(ctx: &GenerationContext<'_>, year: Year, month: u32, day: u32) -> NaiveDate {
    let today = ctx.clock.today();
    NaiveDate::from_ymd_opt(year + 1, month, day).map_or(today, |d| d.min(today))
}

fn signed_on(ctx: &GenerationContext<'_>, year: Year) -> String {
    dated_after_year(ctx, year, 4, 12).format("%m/%d/%Y").to_string()
}

fn filing_boxes(status: FilingStatus) -> String {
    [
        FilingStatus::Single,
        FilingStatus::MarriedFilingJointly,
        FilingStatus::HeadOfHousehold,
    ]
    .iter()
    .map(|s| format!("[{}] {}", if *s == status { "X" } else { " " }, s.label()))
    .collect::<Vec<_>>()
    .join("  ")
}

fn federal_return(
    ctx: &GenerationContext<'_>,
    r: &FinancialYearRecord,
    income: &crate::facts::InvestmentIncome,
    checking: &crate::facts::Account,
) -> Report {
    let p = ctx.persona;
    let total_income = r.wages + income.interest + income.ordinary_dividends;
    let mut doc = Report::new(format!("Form 1040 U.S. Individual Income Tax Return {}", r.year));

    doc.heading("Taxpayer information")
        .line(format!("Name: {}", p.full_name))
        .line(format!("Social Security Number: {}", p.ssn))
        .line(format!("Address: {}", p.address.street))
        .line(format!("City, State, ZIP: {}", p.address.city_line()))
        .line(format!("Filing Status: {}", filing_boxes(r.filing_status)));

    doc.heading("Income")
        .field("1a  Wages, salaries, tips (Form W-2, box 1)", r.wages)
        .field("2b  Taxable interest", income.interest)
        .field("3a  Qualified dividends", income.qualified_dividends)
        .field("3b  Ordinary dividends", income.ordinary_dividends)
        .field("9   Total income", total_income)
        .field("11  Adjusted gross income", total_income);

    doc.heading("Deductions")
        .field("12  Standard deduction", r.standard_deduction)
        .field("15  Taxable wages after deduction", r.taxable_income);

    doc.heading("Tax and payments")
        .field("16  Tax", r.federal_liability)
        .field("24  Total tax", r.federal_liability)
        .field("25a Federal income tax withheld (Form W-2)", r.federal_withholding)
        .field("33  Total payments", r.federal_withholding);

    doc.heading("Refund or amount owed");
    if r.federal_refund.is_negative() {
        doc.field("37  Amount you owe", r.federal_refund.abs())
            .line(format!("    Payment due: 04/15/{}", r.year + 1));
    } else {
        doc.field("35a Refund", r.federal_refund)
            .line("    [X] Direct deposit  Type: [X] Checking  [ ] Savings")
            .line(format!("    Routing number: {}", checking.routing_number))
            .line(format!("    Account number: {}", checking.number))
            .line(format!("    Bank: {}", checking.institution));
    }

    doc.heading("Sign here")
        .line("Under penalties of perjury, I declare that I have examined this return")
        .line("and to the best of my knowledge and belief, it is true, correct, and complete.")
        .line(format!("Your signature: {}    Date: {}", p.full_name, signed_on(ctx, r.year)))
        .line(format!("Occupation: {}", p.employer.job_title));
    doc
}

fn state_return(
    ctx: &GenerationContext<'_>,
    r: &FinancialYearRecord,
    checking: &crate::facts::Account,
) -> Report {
    let p = ctx.persona;
    let state_deduction = state_standard_deduction(r.year, r.filing_status);
    let taxable = (r.state_wages - state_deduction).max(Money::ZERO);
    let mut doc = Report::new(format!("Form 540 California Resident Income Tax Return {}", r.year));

    doc.heading("Taxpayer information")
        .line(format!("Name: {}", p.full_name))
        .line(format!("SSN: {}", p.ssn))
        .line(format!("Address: {}", p.address.one_line()))
        .line(format!("Filing Status: {}", r.filing_status.label()));

    doc.heading("Taxable income")
        .field("13  Federal wages (CA wages, ratio 1.0)", r.state_wages)
        .field("18  CA standard deduction", state_deduction)
        .field("19  CA taxable income", taxable);

    doc.heading("Tax")
        .field("31  Tax (5.8% of taxable income)", taxable.percent(STATE_TAX_RATE))
        .field("46  Nonrefundable renter's credit", RENTERS_CREDIT)
        .field("64  Total tax", r.state_liability)
        .field("71  California income tax withheld", r.state_withholding);

    doc.heading("Refund or amount owed");
    if r.state_refund.is_negative() {
        doc.field("111 Amount you owe", r.state_refund.abs());
    } else {
        doc.field("115 Refund", r.state_refund)
            .line(format!(
                "    Direct deposit: routing {} account {}",
                checking.routing_number,
                checking.masked()
            ));
    }

    doc.blank()
        .line(format!("Signature: {}    Date: {}", p.full_name, signed_on(ctx, r.year)))
        .line("Franchise Tax Board, Sacramento, CA 95827");
    doc
}

fn w2_form(ctx: &GenerationContext<'_>, r: &FinancialYearRecord) -> Report {
    let p = ctx.persona;
    let e = &p.employer;
    let mut doc = Report::new(format!("Form W-2 Wage and Tax Statement {}", r.year));

    doc.heading("Employer")
        .line(format!("b  Employer identification number (EIN): {}", e.ein))
        .line(format!("c  {}", e.name))
        .line(format!("   {}", e.address.one_line()));

    doc.heading("Employee")
        .line(format!("a  Employee's SSN: {}", p.ssn))
        .line(format!("e  {}", p.full_name))
        .line(format!("f  {}", p.address.one_line()));

    doc.heading("Wages and withholding")
        .field("1  Wages, tips, other compensation", r.wages)
        .field("2  Federal income tax withheld", r.federal_withholding)
        .field("3  Social security wages", r.social_security_wages)
        .field("4  Social security tax withheld", r.social_security_tax)
        .field("5  Medicare wages and tips", r.wages)
        .field("6  Medicare tax withheld", r.medicare_tax)
        .line(format!("15 State: {}   Employer's state ID: {}", p.address.state_code, e.ein))
        .field("16 State wages, tips, etc.", r.state_wages)
        .field("17 State income tax", r.state_withholding);

    let issued = dated_after_year(ctx, r.year, 1, 28);
    doc.blank().line(format!("Issued: {}", issued.format("%B %d, %Y")));
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::RunConfig, generators::fixture::Fixture};

    #[test]
    fn bracket_tax_is_progressive() {
        let single = FilingStatus::Single;
        assert_eq!(bracket_tax(Money::ZERO, single), Money::ZERO);
        // 10% of 11,600
        assert_eq!(bracket_tax(Money::from_dollars(11_600), single), Money::from_dollars(1_160));
        // 1,160 + 12% of 35,550 = 1,160 + 4,266
        assert_eq!(bracket_tax(Money::from_dollars(47_150), single), Money::from_dollars(5_426));
        // plus 22% of 2,850
        assert_eq!(bracket_tax(Money::from_dollars(50_000), single), Money::from_dollars(6_053));
    }

    #[test]
    fn joint_filers_get_doubled_thresholds() {
        let joint = bracket_tax(Money::from_dollars(23_200), FilingStatus::MarriedFilingJointly);
        assert_eq!(joint, Money::from_dollars(2_320));
    }

    #[test]
    fn refund_is_withholding_minus_liability() {
        for dollars in [60_000, 95_432, 150_000] {
            let wages = Money::from_cents(dollars * 100 + 37);
            let r = compute_year(2024, wages, FilingStatus::Single);
            assert_eq!(r.federal_refund, r.federal_withholding - r.federal_liability);
            assert_eq!(r.federal_liability, estimated_liability(wages, 2024, FilingStatus::Single));
            assert_eq!(r.state_refund, r.state_withholding - r.state_liability);
            assert_eq!(r.state_wages, r.wages);
        }
    }

    #[test]
    fn social_security_stops_at_wage_base() {
        let r = compute_year(2023, Money::from_dollars(200_000), FilingStatus::Single);
        assert_eq!(r.social_security_wages, Money::from_dollars(160_200));
        assert_eq!(r.social_security_tax, Money::from_dollars(160_200).percent(SOCIAL_SECURITY_RATE));
    }

    fn dates_in(text: &str) -> Vec<NaiveDate> {
        text.lines()
            .filter_map(|line| {
                if let Some((_, d)) = line.split_once("Date: ") {
                    NaiveDate::parse_from_str(d.trim(), "%m/%d/%Y").ok()
                } else if let Some(d) = line.strip_prefix("Issued: ") {
                    NaiveDate::parse_from_str(d.trim(), "%B %d, %Y").ok()
                } else {
                    None
                }
            })
            .collect()
    }

    #[test]
    fn filings_are_never_dated_after_today() {
        let mut config = RunConfig::default_test();
        config.reference_time = NaiveDate::from_ymd_opt(2025, 2, 10).and_then(|d| d.and_hms_opt(9, 0, 0));
        let fx = Fixture::with_config(config);
        let artifacts = TaxGenerator.generate(&fx.ctx(), &mut fx.rng(GeneratorSlot::Tax)).unwrap();

        let mut seen = 0;
        for artifact in &artifacts {
            let Record::Report(report) = &artifact.record else { panic!("tax forms are reports") };
            for date in dates_in(&report.lines.join("\n")) {
                assert!(date <= fx.clock.today(), "{} dated {date}", artifact.file_name());
                seen += 1;
            }
        }
        // 1040, 540 and W-2 for 2023 and 2024
        assert_eq!(seen, 6);
    }

    #[test]
    fn unfinished_reference_year_is_rejected() {
        let fx = Fixture::new();
        let err = year_record(&fx.ctx(), &mut fx.rng(GeneratorSlot::Tax), 2025).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn state_liability_never_negative() {
        assert_eq!(state_liability(Money::from_dollars(5_000), 2024, FilingStatus::Single), Money::ZERO);
    }
}
