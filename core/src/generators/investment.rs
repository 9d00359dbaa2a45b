//! Investment generator: brokerage trades, FIFO lots and yearly statements.
//!
//! RULE: Every trade is replayed through FIFO lots before anything is
//! rendered. A SELL never exceeds the open quantity of its instrument;
//! a replay that ends below zero is a ConsistencyViolation, never a
//! statement.
//!
//! Prices are whole cents. Stocks and ETFs trade per share; bonds trade
//! in $1,000 face units priced per unit, so `quantity × price == total`
//! holds exactly for every row.

use super::{shared, tax, DomainGenerator, GenerationContext};
use crate::{
    artifact::{Artifact, Record, Report, Table},
    error::{PopError, PopResult},
    facts::Account,
    ledger::FactKey,
    money::Money,
    rng::{GeneratorRng, GeneratorSlot},
    types::{ArtifactCategory, Year},
};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, VecDeque};

/// A lot held longer than this many days realizes a long-term gain.
const LONG_TERM_DAYS: i64 = 365;

const STOCK_QUANTITIES: [i64; 7] = [5, 10, 15, 20, 25, 50, 100];
const ETF_QUANTITIES: [i64; 5] = [10, 20, 30, 50, 100];
const BOND_UNITS: [i64; 3] = [1, 5, 10];

/// Per-share (stocks, ETFs) or per-$1,000-unit (bonds) price ranges in dollars.
const STOCK_PRICES: [(&str, i64, i64); 15] = [
    ("AAPL", 150, 195),
    ("GOOGL", 90, 145),
    ("MSFT", 250, 380),
    ("AMZN", 95, 175),
    ("TSLA", 150, 410),
    ("NVDA", 200, 495),
    ("META", 120, 350),
    ("NFLX", 300, 600),
    ("AMD", 75, 165),
    ("INTC", 25, 50),
    ("JPM", 120, 165),
    ("BAC", 25, 40),
    ("V", 200, 275),
    ("MA", 320, 450),
    ("DIS", 80, 180),
];

const ETF_PRICES: [(&str, i64, i64); 10] = [
    ("SPY", 360, 470),
    ("QQQ", 300, 420),
    ("VTI", 190, 250),
    ("VOO", 350, 450),
    ("IVV", 360, 470),
    ("VEA", 40, 52),
    ("VWO", 38, 50),
    ("AGG", 95, 108),
    ("BND", 70, 82),
    ("TLT", 90, 105),
];

const BOND_PRICES: [(&str, i64, i64); 5] = [
    ("US Treasury 10Y", 950, 1_020),
    ("US Treasury 5Y", 970, 1_010),
    ("Corporate Bond AAA", 980, 1_030),
    ("Municipal Bond CA", 990, 1_040),
    ("TIPS 2030", 960, 1_010),
];

// ── Trades & lots ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetClass {
    Stock,
    Etf,
    Bond,
}

impl AssetClass {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stock => "Stock",
            Self::Etf => "ETF",
            Self::Bond => "Bond",
        }
    }

    fn quantities(&self) -> &'static [i64] {
        match self {
            Self::Stock => &STOCK_QUANTITIES,
            Self::Etf => &ETF_QUANTITIES,
            Self::Bond => &BOND_UNITS,
        }
    }

    /// Dollar price range for `symbol`, with a class default for
    /// instruments outside the table.
    pub fn price_range(&self, symbol: &str) -> (i64, i64) {
        let (table, default): (&[(&str, i64, i64)], (i64, i64)) = match self {
            Self::Stock => (&STOCK_PRICES, (50, 200)),
            Self::Etf => (&ETF_PRICES, (100, 300)),
            Self::Bond => (&BOND_PRICES, (950, 1_050)),
        };
        table
            .iter()
            .find(|(s, _, _)| *s == symbol)
            .map(|&(_, lo, hi)| (lo, hi))
            .unwrap_or(default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeKind {
    Buy,
    Sell,
}

impl TradeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub kind: TradeKind,
    pub class: AssetClass,
    pub symbol: String,
    pub quantity: i64,
    pub price: Money,
    pub total: Money,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Lot {
    acquired: NaiveDate,
    quantity: i64,
    price: Money,
}

/// Gains realized by one sell, split by holding period.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Realized {
    pub short_term: Money,
    pub long_term: Money,
}

impl Realized {
    fn add(&mut self, other: Realized) {
        self.short_term += other.short_term;
        self.long_term += other.long_term;
    }
}

/// Open position of one instrument at some point of the replay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Position {
    pub quantity: i64,
    pub cost_basis: Money,
}

/// FIFO lot book for every instrument of the account.
#[derive(Debug, Default)]
pub struct LotBook {
    lots: BTreeMap<String, VecDeque<Lot>>,
}

impl LotBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_quantity(&self, symbol: &str) -> i64 {
        self.lots
            .get(symbol)
            .map(|lots| lots.iter().map(|l| l.quantity).sum())
            .unwrap_or(0)
    }

    pub fn position(&self, symbol: &str) -> Position {
        let lots = match self.lots.get(symbol) {
            Some(lots) => lots,
            None => return Position::default(),
        };
        Position {
            quantity: lots.iter().map(|l| l.quantity).sum(),
            cost_basis: lots.iter().map(|l| l.price * l.quantity).sum(),
        }
    }

    /// Apply one trade. Sells consume the oldest lots first.
    pub fn apply(&mut self, trade: &Trade) -> PopResult<Realized> {
        let lots = self.lots.entry(trade.symbol.clone()).or_default();
        match trade.kind {
            TradeKind::Buy => {
                lots.push_back(Lot {
                    acquired: trade.date,
                    quantity: trade.quantity,
                    price: trade.price,
                });
                Ok(Realized::default())
            }
            TradeKind::Sell => {
                let open: i64 = lots.iter().map(|l| l.quantity).sum();
                if trade.quantity > open {
                    return Err(PopError::violation(
                        ArtifactCategory::Investment,
                        format!(
                            "sell of {} {} on {} exceeds open quantity {}",
                            trade.quantity, trade.symbol, trade.date, open
                        ),
                    ));
                }
                let mut remaining = trade.quantity;
                let mut realized = Realized::default();
                while remaining > 0 {
                    let Some(front) = lots.front_mut() else { break };
                    let used = remaining.min(front.quantity);
                    let gain = (trade.price - front.price) * used;
                    if (trade.date - front.acquired).num_days() > LONG_TERM_DAYS {
                        realized.long_term += gain;
                    } else {
                        realized.short_term += gain;
                    }
                    front.quantity -= used;
                    remaining -= used;
                    if front.quantity == 0 {
                        lots.pop_front();
                    }
                }
                Ok(realized)
            }
        }
    }
}

/// Replay `trades` in order and confirm no instrument ever goes short.
pub fn verify_inventory(trades: &[Trade]) -> PopResult<()> {
    let mut held: BTreeMap<&str, i64> = BTreeMap::new();
    for trade in trades {
        let qty = held.entry(trade.symbol.as_str()).or_insert(0);
        match trade.kind {
            TradeKind::Buy => *qty += trade.quantity,
            TradeKind::Sell => *qty -= trade.quantity,
        }
        if *qty < 0 {
            return Err(PopError::violation(
                ArtifactCategory::Investment,
                format!("{} inventory is negative ({}) after {}", trade.symbol, qty, trade.date),
            ));
        }
    }
    Ok(())
}

fn draw_price(rng: &mut GeneratorRng, class: AssetClass, symbol: &str) -> PopResult<Money> {
    let (lo, hi) = class.price_range(symbol);
    rng.draw_money(Money::from_dollars(lo), Money::from_dollars(hi))
}

/// The trade sequence of one instrument between `start` and `end`.
fn instrument_trades(
    rng: &mut GeneratorRng,
    class: AssetClass,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> PopResult<Vec<Trade>> {
    let count = rng.range(2, 6)? as usize;
    let mut dates = (0..count)
        .map(|_| rng.draw_date(start, end))
        .collect::<PopResult<Vec<_>>>()?;
    dates.sort();

    let mut open = 0i64;
    let mut trades = Vec::with_capacity(count);
    for date in dates {
        let price = draw_price(rng, class, symbol)?;
        let (kind, quantity) = if open > 0 && rng.chance(0.35) {
            (TradeKind::Sell, rng.range(1, open)?)
        } else {
            (TradeKind::Buy, *rng.choose(class.quantities())?)
        };
        match kind {
            TradeKind::Buy => open += quantity,
            TradeKind::Sell => open -= quantity,
        }
        trades.push(Trade {
            date,
            kind,
            class,
            symbol: symbol.to_string(),
            quantity,
            price,
            total: price * quantity,
        });
    }
    Ok(trades)
}

// ── Generator ─────────────────────────────────────────────────

pub struct InvestmentGenerator;

impl InvestmentGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InvestmentGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// One year of account activity, as the statement shows it.
struct YearActivity<'a> {
    year: Year,
    trades: Vec<&'a Trade>,
    realized: Realized,
    positions: Vec<(&'a str, AssetClass, Position)>,
}

impl DomainGenerator for InvestmentGenerator {
    fn name(&self) -> &'static str {
        "investment"
    }

    fn category(&self) -> ArtifactCategory {
        ArtifactCategory::Investment
    }

    fn slot(&self) -> GeneratorSlot {
        GeneratorSlot::Investment
    }

    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        rng: &mut GeneratorRng,
    ) -> PopResult<Vec<Artifact>> {
        let account = shared::brokerage_account(ctx, rng)?;
        let start = account.opened;
        let end = (ctx.clock.today() - Duration::days(1)).max(start);

        let cfg = ctx.config;
        let instruments: Vec<(AssetClass, &str)> = cfg
            .holdings
            .iter()
            .map(|s| (AssetClass::Stock, s.as_str()))
            .chain(cfg.etf_holdings.iter().map(|s| (AssetClass::Etf, s.as_str())))
            .chain(cfg.bond_holdings.iter().map(|s| (AssetClass::Bond, s.as_str())))
            .collect();

        let mut trades = Vec::new();
        for &(class, symbol) in &instruments {
            trades.extend(instrument_trades(rng, class, symbol, start, end)?);
        }
        // Stable: same-day trades keep instrument order.
        trades.sort_by_key(|t| t.date);
        verify_inventory(&trades)?;

        // Replay once, snapshotting each statement year.
        let mut years: Vec<Year> = cfg.tax_years.clone();
        years.sort_unstable();
        years.dedup();

        let mut book = LotBook::new();
        let mut activity: Vec<YearActivity<'_>> = years
            .iter()
            .map(|&year| YearActivity {
                year,
                trades: Vec::new(),
                realized: Realized::default(),
                positions: Vec::new(),
            })
            .collect();

        let mut next = 0;
        for entry in activity.iter_mut() {
            while next < trades.len() && trades[next].date.year() <= entry.year {
                let trade = &trades[next];
                let realized = book.apply(trade)?;
                if trade.date.year() == entry.year {
                    entry.trades.push(trade);
                    entry.realized.add(realized);
                }
                next += 1;
            }
            entry.positions = instruments
                .iter()
                .map(|&(class, symbol)| (symbol, class, book.position(symbol)))
                .filter(|(_, _, p)| p.quantity > 0)
                .collect();
        }

        let mut artifacts = Vec::new();
        for entry in &activity {
            let year = entry.year;
            let record = tax::year_record(ctx, rng, year)?;
            let income = shared::investment_income(ctx, rng, year)?;
            let mut marks = Vec::with_capacity(entry.positions.len());
            for (symbol, class, _) in &entry.positions {
                marks.push(draw_price(rng, *class, symbol)?);
            }

            let statement = statement(ctx, &account, entry, &marks, record.wages, &income);
            artifacts.push(
                Artifact::home(
                    self.category(),
                    format!("Desktop/Investments/Investment_Statement_{year}.pdf"),
                    Record::Report(statement),
                )
                .citing(FactKey::account(&account.institution))
                .citing(FactKey::tax_year(year))
                .citing(FactKey::investment_income(year)),
            );
            artifacts.push(
                Artifact::home(
                    self.category(),
                    format!("Desktop/Investments/Transactions_{year}.csv"),
                    Record::Workbook(transactions_table(&entry.trades)),
                )
                .citing(FactKey::account(&account.institution)),
            );
            log::debug!(
                "investment: {year} {} trades, realized ST {} LT {}",
                entry.trades.len(),
                entry.realized.short_term,
                entry.realized.long_term
            );
        }

        log::info!(
            "investment: {} trades across {} instruments at {}",
            trades.len(),
            instruments.len(),
            account.institution
        );
        Ok(artifacts)
    }
}

// ── Rendering ─────────────────────────────────────────────────

fn transactions_table(trades: &[&Trade]) -> Table {
    let mut table = Table::new(["Date", "Type", "Class", "Symbol", "Quantity", "Price", "Total"]);
    for t in trades {
        table.push([
            t.date.format("%Y-%m-%d").to_string(),
            t.kind.label().to_string(),
            t.class.label().to_string(),
            t.symbol.clone(),
            t.quantity.to_string(),
            t.price.plain(),
            t.total.plain(),
        ]);
    }
    table
}

fn statement(
    ctx: &GenerationContext<'_>,
    account: &Account,
    entry: &YearActivity<'_>,
    marks: &[Money],
    wages: Money,
    income: &crate::facts::InvestmentIncome,
) -> Report {
    let year = entry.year;
    let p = ctx.persona;
    let purchases: Money = entry
        .trades
        .iter()
        .filter(|t| t.kind == TradeKind::Buy)
        .map(|t| t.total)
        .sum();
    let proceeds: Money = entry
        .trades
        .iter()
        .filter(|t| t.kind == TradeKind::Sell)
        .map(|t| t.total)
        .sum();
    let market_value: Money = entry
        .positions
        .iter()
        .zip(marks)
        .map(|((_, _, pos), price)| *price * pos.quantity)
        .sum();

    let mut doc = Report::new(format!("Annual Investment Statement {year}"));
    doc.heading("Account information")
        .line(format!("Account Holder: {}", p.full_name))
        .line(format!("Address: {}", p.address.one_line()))
        .line(format!("Account Number: {}", account.masked()))
        .line(format!("Account Type: {}", account.kind.label()))
        .line(format!("Account Opened: {}", account.opened.format("%m/%d/%Y")))
        .line(format!("Statement Period: January 1, {year} - December 31, {year}"))
        .line(format!("Brokerage Firm: {}", account.institution));

    doc.heading("Account summary")
        .field("Purchases", purchases)
        .field("Sale proceeds", proceeds)
        .field("Realized short-term gain/loss", entry.realized.short_term)
        .field("Realized long-term gain/loss", entry.realized.long_term)
        .field(&format!("Market value (Dec 31, {year})"), market_value);

    doc.heading("Transactions")
        .line(format!(
            "{:<12}{:<6}{:<22}{:>8}{:>14}{:>16}",
            "Date", "Type", "Instrument", "Qty", "Price", "Total"
        ));
    if entry.trades.is_empty() {
        doc.line("No activity this period.");
    }
    for t in &entry.trades {
        doc.line(format!(
            "{:<12}{:<6}{:<22}{:>8}{:>14}{:>16}",
            t.date.format("%m/%d/%Y").to_string(),
            t.kind.label(),
            t.symbol,
            t.quantity,
            t.price.to_string(),
            t.total.to_string()
        ));
    }

    doc.heading(&format!("Holdings as of December 31, {year}"));
    if entry.positions.is_empty() {
        doc.line("No open positions.");
    }
    for ((symbol, class, pos), price) in entry.positions.iter().zip(marks) {
        doc.line(format!(
            "{:<22}{:<6}{:>8} @ {:>12}  value {:>14}  basis {:>14}",
            symbol,
            class.label(),
            pos.quantity,
            price.to_string(),
            (*price * pos.quantity).to_string(),
            pos.cost_basis.to_string()
        ));
    }

    doc.heading("Year-end tax information")
        .field("Ordinary dividends (1099-DIV box 1a)", income.ordinary_dividends)
        .field("Qualified dividends (1099-DIV box 1b)", income.qualified_dividends)
        .field("Interest income (1099-INT box 1)", income.interest)
        .field("Short-term capital gain/loss", entry.realized.short_term)
        .field("Long-term capital gain/loss", entry.realized.long_term)
        .field("W-2 wages on file for this year", wages)
        .blank()
        .line(format!(
            "Form 1099-DIV and 1099-INT will be mailed by January 31, {}.",
            year + 1
        ));

    doc.blank()
        .line("This statement is provided for informational purposes. Contact us")
        .line("immediately if you notice any discrepancies.")
        .line(format!("Thank you for choosing {}.", account.institution));
    doc
}
