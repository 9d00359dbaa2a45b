//! Office generator: work documents of the persona's employer.
//!
//! RULE: Employment terms come from `employment/{employer}` and salaries
//! from `tax_year/{year}`. The contract shows the starting salary the
//! hire-year W-2 reports; each performance review shows exactly the
//! wages of the year it reviews. Totals and variances in reports and
//! spreadsheets are summed from their own rows.

use super::{safe_name, tax, DomainGenerator, GenerationContext};
use crate::{
    artifact::{Artifact, Record, Report, Table},
    error::{PopError, PopResult},
    facts::FinancialYearRecord,
    ledger::FactKey,
    money::Money,
    rng::{GeneratorRng, GeneratorSlot},
    types::{ArtifactCategory, Year},
};
use chrono::{Datelike, Duration, NaiveDate};
use std::fmt::Write as _;

const REPORTS_DIR: &str = "Desktop/Office/Reports";
const PRESENTATIONS_DIR: &str = "Desktop/Office/Presentations";
const SPREADSHEETS_DIR: &str = "Desktop/Office/Spreadsheets";
const PROJECTS_DIR: &str = "Desktop/Office/Projects";

/// Completed quarters covered by quarterly reports.
const REPORT_QUARTERS: usize = 4;

const PROJECT_NAMES: [&str; 5] = [
    "Customer Portal Redesign",
    "Mobile App Enhancement",
    "Data Analytics Platform",
    "Payment System Upgrade",
    "Real-time Notification Service",
];

const PRESENTATION_TOPICS: [&str; 5] = [
    "Quarterly Roadmap",
    "System Architecture Review",
    "Incident Postmortem",
    "Recruiting Update",
    "Technology Stack Modernization",
];

const COURSES: [&str; 5] = [
    "AWS Solutions Architect Professional",
    "Kubernetes Administration",
    "Advanced Python Programming",
    "Microservices Architecture Patterns",
    "Security Best Practices for Developers",
];

/// Budget lines: (category, low, high) monthly spend in dollars.
const BUDGET_LINES: [(&str, i64, i64); 8] = [
    ("Salaries", 80_000, 90_000),
    ("Cloud Services", 11_000, 14_000),
    ("Software Licenses", 5_000, 6_000),
    ("Office Supplies", 300, 600),
    ("Training", 1_000, 3_000),
    ("Travel & Meals", 800, 2_200),
    ("Equipment", 0, 6_000),
    ("Contractors", 7_000, 9_500),
];

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

// ── Budget arithmetic ─────────────────────────────────────────

/// One spreadsheet row: three monthly actuals against a quarter budget.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetLine {
    pub category: String,
    pub months: [Money; 3],
    pub budget: Money,
}

impl BudgetLine {
    pub fn total(&self) -> Money {
        self.months.iter().sum()
    }

    /// Budget minus actual; negative when over budget.
    pub fn variance(&self) -> Money {
        self.budget - self.total()
    }
}

fn draw_budget(rng: &mut GeneratorRng) -> PopResult<Vec<BudgetLine>> {
    let mut lines = Vec::with_capacity(BUDGET_LINES.len());
    for (category, lo, hi) in BUDGET_LINES {
        let mut months = [Money::ZERO; 3];
        for m in months.iter_mut() {
            *m = Money::from_dollars(rng.range(lo / 10, hi / 10)? * 10);
        }
        let total: Money = months.iter().sum();
        // Budgets are set in round hundreds, within ±6% of spend.
        let drift = rng.draw_amount(-0.06, 0.06, 3)?;
        let budget = Money::from_cents(total.percent(1.0 + drift).cents() / 10_000 * 10_000);
        lines.push(BudgetLine {
            category: category.to_string(),
            months,
            budget,
        });
    }
    Ok(lines)
}

fn budget_table(lines: &[BudgetLine], quarter: u32) -> Table {
    let first = ((quarter - 1) * 3) as usize;
    let mut headers = vec!["Category".to_string()];
    headers.extend(MONTH_NAMES[first..first + 3].iter().map(|m| m[..3].to_string()));
    headers.extend([format!("Q{quarter} Total"), "Budget".into(), "Variance".into()]);

    let mut table = Table::new(headers);
    for line in lines {
        let mut row = vec![line.category.clone()];
        row.extend(line.months.iter().map(|m| m.plain()));
        row.extend([line.total().plain(), line.budget.plain(), line.variance().plain()]);
        table.push(row);
    }
    let mut totals = vec!["TOTAL".to_string()];
    for i in 0..3 {
        totals.push(lines.iter().map(|l| l.months[i]).sum::<Money>().plain());
    }
    totals.push(lines.iter().map(BudgetLine::total).sum::<Money>().plain());
    totals.push(lines.iter().map(|l| l.budget).sum::<Money>().plain());
    totals.push(lines.iter().map(BudgetLine::variance).sum::<Money>().plain());
    table.push(totals);
    table
}

// ── Calendar helpers ──────────────────────────────────────────

fn quarter_of(date: NaiveDate) -> u32 {
    (date.month0() / 3) + 1
}

fn quarter_end(year: Year, quarter: u32) -> Option<NaiveDate> {
    let next_month = quarter * 3 + 1;
    let first_of_next = if next_month > 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, next_month, 1)
    };
    first_of_next.map(|d| d - Duration::days(1))
}

/// The last `n` quarters that ended before `today`, oldest first.
fn completed_quarters(today: NaiveDate, n: usize) -> Vec<(Year, u32)> {
    let (mut year, mut quarter) = (today.year(), quarter_of(today));
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        if quarter == 1 {
            year -= 1;
            quarter = 4;
        } else {
            quarter -= 1;
        }
        out.push((year, quarter));
    }
    out.reverse();
    out
}

fn long_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

// ── Generator ─────────────────────────────────────────────────

pub struct OfficeGenerator;

impl OfficeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OfficeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainGenerator for OfficeGenerator {
    fn name(&self) -> &'static str {
        "office"
    }

    fn category(&self) -> ArtifactCategory {
        ArtifactCategory::Office
    }

    fn slot(&self) -> GeneratorSlot {
        GeneratorSlot::Office
    }

    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        rng: &mut GeneratorRng,
    ) -> PopResult<Vec<Artifact>> {
        let c = self.category();
        let employment = tax::employment(ctx, rng)?;
        let employment_key = FactKey::employment(&employment.employer);
        let hire = employment.hire_date;
        let mut artifacts = Vec::new();

        for (year, quarter) in completed_quarters(ctx.clock.today(), REPORT_QUARTERS) {
            let ends = quarter_end(year, quarter)
                .ok_or_else(|| PopError::violation(c, format!("no end date for Q{quarter} {year}")))?;
            if ends < hire {
                continue;
            }
            let report = quarterly_report(ctx, rng, year, quarter, ends)?;
            artifacts.push(Artifact::home(
                c,
                format!("{REPORTS_DIR}/Q{quarter}_{year}_Report.pdf"),
                Record::Report(report),
            ));
        }

        for topic in PRESENTATION_TOPICS {
            artifacts.push(Artifact::home(
                c,
                format!("{PRESENTATIONS_DIR}/{}_Outline.txt", safe_name(topic)),
                Record::Text(presentation(ctx, rng, topic)?),
            ));
        }

        let quarter = quarter_of(ctx.clock.today());
        for i in 1..=ctx.config.counts.budget_sheets {
            let lines = draw_budget(rng)?;
            artifacts.push(Artifact::home(
                c,
                format!("{SPREADSHEETS_DIR}/Budget_Tracking_{i}.csv"),
                Record::Workbook(budget_table(&lines, quarter)),
            ));
        }

        for i in 1..=ctx.config.counts.project_proposals {
            artifacts.push(Artifact::home(
                c,
                format!("{PROJECTS_DIR}/Project_Proposal_{i}.pdf"),
                Record::Report(proposal(ctx, rng)?),
            ));
        }

        artifacts.push(
            Artifact::home(
                c,
                format!("Documents/Contracts/Employment_Contract_{}.txt", hire.year()),
                Record::Text(contract(ctx, &employment)),
            )
            .citing(employment_key.clone()),
        );

        // Reviews exist only for finished years.
        for &year in &ctx.config.tax_years {
            if year >= ctx.clock.current_year() || year < hire.year() {
                continue;
            }
            let record = tax::year_record(ctx, rng, year)?;
            let next = ctx.ledger.get::<FinancialYearRecord>(&FactKey::tax_year(year + 1))?;
            let review = performance_review(ctx, rng, &employment, &record, next.as_ref())?;
            artifacts.push(
                Artifact::home(
                    c,
                    format!("Documents/Work/Performance_Reviews/Performance_Review_{year}.txt"),
                    Record::Text(review),
                )
                .citing(FactKey::tax_year(year))
                .citing(employment_key.clone()),
            );
        }

        for i in 1..=ctx.config.counts.training_certificates {
            artifacts.push(Artifact::home(
                c,
                format!("Documents/Work/Training_Materials/Training_Certificate_{i}.txt"),
                Record::Text(training_certificate(ctx, rng)?),
            ));
        }

        log::info!("office: {} documents for {}", artifacts.len(), employment.employer);
        Ok(artifacts)
    }
}

// ── Rendering ─────────────────────────────────────────────────

fn quarterly_report(
    ctx: &GenerationContext<'_>,
    rng: &mut GeneratorRng,
    year: Year,
    quarter: u32,
    ends: NaiveDate,
) -> PopResult<Report> {
    let p = ctx.persona;
    let first = ((quarter - 1) * 3) as usize;
    let mut doc = Report::new(format!("Quarterly Business Report Q{quarter} {year}"));

    doc.line(format!("Company: {}", p.employer.name))
        .line(format!("Prepared by: {}, {}", p.full_name, p.employer.job_title))
        .line(format!("Department: {}", p.employer.department))
        .line(format!("Date: {}", long_date(ends)))
        .line(format!(
            "Period: {} - {} {year}",
            MONTH_NAMES[first],
            MONTH_NAMES[first + 2]
        ));

    doc.heading("Performance metrics")
        .field("Story points completed", rng.range(180, 250)?)
        .field("Sprint velocity (points/sprint)", rng.range(35, 50)?)
        .field("Code commits", rng.range(450, 750)?)
        .field("Pull requests merged", rng.range(120, 200)?)
        .field("Uptime (%)", format!("99.{}", rng.range(90, 99)?))
        .field("Average response time (ms)", rng.range(85, 150)?)
        .field("Test coverage (%)", rng.range(82, 94)?)
        .field("Production incidents", rng.range(2, 6)?);

    let lines = draw_budget(rng)?;
    doc.heading("Budget summary").line(format!(
        "{:<22}{:>16}{:>16}{:>16}",
        "Category", "Budgeted", "Actual", "Variance"
    ));
    for l in &lines {
        doc.line(format!(
            "{:<22}{:>16}{:>16}{:>16}",
            l.category,
            l.budget.to_string(),
            l.total().to_string(),
            l.variance().to_string()
        ));
    }
    doc.line(format!(
        "{:<22}{:>16}{:>16}{:>16}",
        "TOTAL",
        lines.iter().map(|l| l.budget).sum::<Money>().to_string(),
        lines.iter().map(BudgetLine::total).sum::<Money>().to_string(),
        lines.iter().map(BudgetLine::variance).sum::<Money>().to_string()
    ));

    let (next_q, next_y) = if quarter == 4 { (1, year + 1) } else { (quarter + 1, year) };
    doc.heading(&format!("Priorities for Q{next_q} {next_y}"));
    for (i, item) in [
        "Complete migration to Kubernetes",
        "Implement real-time analytics dashboard",
        "Enhance monitoring and alerting",
    ]
    .iter()
    .enumerate()
    {
        doc.line(format!("{}. {item}", i + 1));
    }
    Ok(doc)
}

fn presentation(ctx: &GenerationContext<'_>, rng: &mut GeneratorRng, topic: &str) -> PopResult<String> {
    let p = ctx.persona;
    let latest = ctx.clock.today() - Duration::days(1);
    let earliest = (ctx.clock.today() - Duration::days(180)).max(p.employer.hire_date).min(latest);
    let date = rng.draw_date(earliest, latest)?;

    let mut out = String::new();
    let _ = writeln!(out, "PRESENTATION OUTLINE\n{topic}\n");
    let _ = writeln!(out, "Presenter: {}\nDate: {}", p.full_name, long_date(date));
    let _ = writeln!(out, "Audience: {} leadership\nDuration: {} minutes\n", p.employer.department, rng.choose(&[30, 45, 60])?);
    let slides: [(&str, &[&str]); 6] = [
        ("Title", &[topic, p.employer.name.as_str()]),
        ("Agenda", &["Current state", "Key challenges", "Proposed solutions", "Timeline", "Q&A"]),
        ("Current State", &["Architecture overview", "Performance metrics", "Team structure"]),
        ("Key Challenges", &["Technical debt", "Scaling limits", "Slow deployment cycles"]),
        ("Next Steps", &["Executive approval", "Budget allocation", "Form project team"]),
        ("Q&A", &[p.email.as_str()]),
    ];
    for (i, (title, bullets)) in slides.iter().enumerate() {
        let _ = writeln!(out, "SLIDE {}: {}", i + 1, title.to_uppercase());
        for b in bullets.iter() {
            let _ = writeln!(out, "  - {b}");
        }
        out.push('\n');
    }
    Ok(out)
}

fn proposal(ctx: &GenerationContext<'_>, rng: &mut GeneratorRng) -> PopResult<Report> {
    let p = ctx.persona;
    let name = rng.choose(&PROJECT_NAMES)?;
    let mut doc = Report::new(format!("Project Proposal: {name}"));
    doc.line(format!("Submitted by: {}", p.full_name))
        .line(format!("Department: {}", p.employer.department))
        .line(format!("Date: {}", long_date(ctx.clock.today())))
        .line("Version: 1.0");

    doc.heading("Project overview").line(format!(
        "This proposal outlines the plan to develop and implement {name} at {}.",
        p.employer.name
    ));

    let weeks = rng.range(10, 20)?;
    doc.heading("Timeline")
        .line("Phase 1: Planning & Design")
        .line("Phase 2: Development")
        .line("Phase 3: Testing & QA")
        .line("Phase 4: Deployment")
        .line(format!("Total duration: {weeks} weeks"));

    let mut items = Vec::new();
    for (label, lo, hi) in [
        ("Personnel", 200_000, 320_000),
        ("Infrastructure & Tools", 30_000, 60_000),
        ("Software Licenses", 10_000, 20_000),
        ("Training & Documentation", 5_000, 15_000),
    ] {
        items.push((label, Money::from_dollars(rng.range(lo / 1_000, hi / 1_000)? * 1_000)));
    }
    let subtotal: Money = items.iter().map(|(_, m)| *m).sum();
    let contingency = subtotal.percent(0.10);
    doc.heading("Budget estimate");
    for (label, amount) in &items {
        doc.field(label, amount);
    }
    doc.field("Contingency (10%)", contingency)
        .field("TOTAL PROJECT COST", subtotal + contingency);

    doc.heading("Approvals")
        .line(format!("Prepared by: {}, {}", p.full_name, p.employer.job_title))
        .line("Approved by: ____________________  Title: VP of Engineering");
    Ok(doc)
}

fn contract(ctx: &GenerationContext<'_>, employment: &crate::facts::EmploymentRecord) -> String {
    let p = ctx.persona;
    let e = &p.employer;
    let start = long_date(employment.hire_date);
    let rule = "=".repeat(75);
    format!(
        "EMPLOYMENT CONTRACT\n{rule}\n\n\
         THIS AGREEMENT is entered into as of {start}\n\n\
         BETWEEN:\n{employer}\n{employer_addr}\n(\"Employer\")\n\n\
         AND:\n{name}\n{street}\n{city}\n(\"Employee\")\n\n{rule}\n\n\
         1. POSITION AND DUTIES\n\n\
         The Employee is employed as {title} in the {dept} department,\n\
         reporting to {manager}.\n\
         Employee ID: {id}\nStart Date: {start}\n\n{rule}\n\n\
         2. COMPENSATION\n\n\
         Base Salary: {salary} per year, payable bi-weekly\n\
         Performance Bonus: Up to 15% of base salary annually\n\n{rule}\n\n\
         3. BENEFITS\n\n\
         - Health insurance (medical, dental, vision)\n\
         - 401(k) retirement plan with 4% company match\n\
         - 15 days paid vacation per year\n\n{rule}\n\n\
         4. TERMINATION\n\n\
         Either party may terminate this agreement with 30 days written notice.\n\n{rule}\n\n\
         SIGNATURES:\n\n\
         Employee: {name}\nSignature: ________________________    Date: {start}\n\n\
         Employer: {manager}, on behalf of {employer}\n\
         Signature: ________________________    Date: {start}\n",
        employer = e.name,
        employer_addr = e.address.one_line(),
        name = p.full_name,
        street = p.address.street,
        city = p.address.city_line(),
        title = e.job_title,
        dept = e.department,
        manager = employment.manager,
        id = employment.employee_id,
        salary = employment.starting_salary,
    )
}

fn performance_review(
    ctx: &GenerationContext<'_>,
    rng: &mut GeneratorRng,
    employment: &crate::facts::EmploymentRecord,
    record: &FinancialYearRecord,
    next: Option<&FinancialYearRecord>,
) -> PopResult<String> {
    let p = ctx.persona;
    let year = record.year;
    let rule = "=".repeat(75);
    let mut out = String::new();
    let _ = writeln!(out, "ANNUAL PERFORMANCE REVIEW\n{year}\n{rule}\n");
    let _ = writeln!(out, "EMPLOYEE INFORMATION\n");
    let _ = writeln!(out, "Name: {}\nEmployee ID: {}", p.full_name, employment.employee_id);
    let _ = writeln!(out, "Position: {}\nDepartment: {}", p.employer.job_title, p.employer.department);
    let _ = writeln!(out, "Review Period: January 1, {year} - December 31, {year}");
    let _ = writeln!(out, "Review Date: January 15, {}", year + 1);
    let _ = writeln!(out, "Manager: {}\n\n{rule}\n", employment.manager);

    let _ = writeln!(out, "PERFORMANCE RATINGS\n(Scale: 1=Needs Improvement ... 4=Outstanding)\n");
    let mut sum = 0i64;
    let areas = [
        "Technical Skills",
        "Problem Solving",
        "Communication",
        "Teamwork & Collaboration",
        "Leadership & Mentorship",
    ];
    for area in areas {
        let score = rng.range(2, 4)?;
        sum += score;
        let _ = writeln!(out, "{area:<46}{score}");
    }
    let overall = sum as f64 / areas.len() as f64;
    let _ = writeln!(out, "\nOVERALL RATING: {overall:.1}\n\n{rule}\n");

    let _ = writeln!(out, "COMPENSATION\n");
    let _ = writeln!(out, "Base Salary ({year}): {}", record.wages);
    if let Some(next) = next {
        let raise = (next.wages.as_f64() / record.wages.as_f64() - 1.0) * 100.0;
        let _ = writeln!(out, "New Base Salary: {}", next.wages);
        let _ = writeln!(out, "Adjustment: {raise:.1}%\nEffective Date: January 1, {}", year + 1);
    }
    let bonus = rng.draw_money(Money::from_dollars(2_000), record.wages.percent(0.15).max(Money::from_dollars(2_000)))?;
    let _ = writeln!(out, "Performance Bonus: {bonus}\n\n{rule}\n");

    let _ = writeln!(out, "SIGNATURES\n");
    let _ = writeln!(out, "Employee: {}\nSignature: ________________________", p.full_name);
    let _ = writeln!(out, "Manager: {}\nSignature: ________________________", employment.manager);
    Ok(out)
}

fn training_certificate(ctx: &GenerationContext<'_>, rng: &mut GeneratorRng) -> PopResult<String> {
    let p = ctx.persona;
    let today = ctx.clock.today();
    let latest = (today - Duration::days(30)).max(p.account_created);
    let earliest = (today - Duration::days(365)).max(p.account_created).min(latest);
    let completed = rng.draw_date(earliest, latest)?;
    let course = rng.choose(&COURSES)?;
    Ok(format!(
        "CERTIFICATE OF COMPLETION\n{rule}\n\n\
         This is to certify that\n\n    {name}\n\n\
         has successfully completed the course\n\n    {course}\n\n\
         Date of Completion: {date}\nDuration: {hours} hours\n\
         Provider: TechAcademy Online Learning\n\
         Final assessment score: {score}%\n\n\
         Certificate ID: {id}\nVerify at: www.techacademy.com/verify\n",
        rule = "=".repeat(75),
        name = p.full_name,
        date = long_date(completed),
        hours = rng.choose(&[8, 16, 24, 40])?,
        score = rng.range(85, 98)?,
        id = rng.draw_identifier("CERT-######")?,
    ))
}
