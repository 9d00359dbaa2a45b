//! Deterministic random fact provider.
//!
//! RULE: No generator may call any platform RNG.
//! All randomness flows through GeneratorRng instances derived
//! from the single master seed of the run.
//!
//! Each generator gets its own RNG stream, seeded deterministically
//! from (master_seed XOR slot_index). This means:
//!   - Adding a new generator never changes existing generators' streams.
//!   - Each generator's stream is fully reproducible in isolation.
//!
//! The only draw that may fail is one with invalid bounds
//! (min > max, empty pool, malformed pattern); it is reported as a
//! configuration error because bounds always come from configuration
//! or from previously drawn facts.

use crate::error::{PopError, PopResult};
use crate::money::Money;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const HEX_UPPER: &[u8] = b"0123456789ABCDEF";
const HEX_LOWER: &[u8] = b"0123456789abcdef";

/// A named, deterministic RNG for a single generator.
pub struct GeneratorRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl GeneratorRng {
    /// Create a generator RNG from the master seed and a stable
    /// slot index. The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    pub fn fill_bytes(&mut self, buf: &mut [u8]) {
        self.inner.fill_bytes(buf);
    }

    /// Uniform integer in [lo, hi].
    pub fn range(&mut self, lo: i64, hi: i64) -> PopResult<i64> {
        if lo > hi {
            return Err(bounds_error("range", lo, hi));
        }
        let span = (hi - lo) as u64 + 1;
        Ok(lo + self.next_u64_below(span) as i64)
    }

    /// Uniform amount in [min, max] rounded to `decimals` places.
    pub fn draw_amount(&mut self, min: f64, max: f64, decimals: u32) -> PopResult<f64> {
        if !(min <= max) {
            return Err(bounds_error("draw_amount", min, max));
        }
        if decimals > 6 {
            return Err(PopError::config(
                "rng.draw_amount",
                format!("at most 6 decimals supported, got {decimals}"),
            ));
        }
        let raw = min + self.next_f64() * (max - min);
        let scale = 10f64.powi(decimals as i32);
        Ok(((raw * scale).round() / scale).clamp(min, max))
    }

    /// Uniform cent amount in [min, max].
    pub fn draw_money(&mut self, min: Money, max: Money) -> PopResult<Money> {
        self.range(min.cents(), max.cents()).map(Money::from_cents)
    }

    /// Uniform calendar date in [start, end].
    pub fn draw_date(&mut self, start: NaiveDate, end: NaiveDate) -> PopResult<NaiveDate> {
        if start > end {
            return Err(bounds_error("draw_date", start, end));
        }
        let days = (end - start).num_days();
        let offset = self.range(0, days)?;
        Ok(start + Duration::days(offset))
    }

    /// Uniform timestamp in [start, end] at one-second resolution.
    pub fn draw_datetime(
        &mut self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> PopResult<NaiveDateTime> {
        if start > end {
            return Err(bounds_error("draw_datetime", start, end));
        }
        let secs = (end - start).num_seconds();
        let offset = self.range(0, secs)?;
        Ok(start + Duration::seconds(offset))
    }

    /// Pick one element of a non-empty pool.
    pub fn choose<'a, T>(&mut self, pool: &'a [T]) -> PopResult<&'a T> {
        if pool.is_empty() {
            return Err(PopError::config("rng.choose", "cannot choose from an empty pool"));
        }
        let idx = self.next_u64_below(pool.len() as u64) as usize;
        Ok(&pool[idx])
    }

    /// Pick `n` distinct elements, preserving draw order.
    pub fn sample<'a, T>(&mut self, pool: &'a [T], n: usize) -> PopResult<Vec<&'a T>> {
        if n > pool.len() {
            return Err(PopError::config(
                "rng.sample",
                format!("cannot sample {n} items from a pool of {}", pool.len()),
            ));
        }
        let mut indices: Vec<usize> = (0..pool.len()).collect();
        for i in 0..n {
            let j = i + self.next_u64_below((pool.len() - i) as u64) as usize;
            indices.swap(i, j);
        }
        Ok(indices[..n].iter().map(|&i| &pool[i]).collect())
    }

    /// Index drawn proportionally to `weights`.
    pub fn weighted_index(&mut self, weights: &[f64]) -> PopResult<usize> {
        let total: f64 = weights.iter().sum();
        if weights.is_empty() || !(total > 0.0) || weights.iter().any(|w| *w < 0.0) {
            return Err(PopError::config(
                "rng.weighted_index",
                "weights must be non-negative with a positive sum",
            ));
        }
        let roll = self.next_f64() * total;
        let mut cumulative = 0.0;
        for (i, w) in weights.iter().enumerate() {
            cumulative += w;
            if roll < cumulative {
                return Ok(i);
            }
        }
        Ok(weights.len() - 1)
    }

    /// Render an identifier from a pattern.
    ///
    /// `#` digit, `A` upper letter, `a` lower letter, `X` upper hex,
    /// `x` lower hex, `*` alphanumeric, `\` takes the next char literally.
    /// Anything else is copied as-is.
    pub fn draw_identifier(&mut self, pattern: &str) -> PopResult<String> {
        if pattern.is_empty() {
            return Err(PopError::config("rng.draw_identifier", "empty pattern"));
        }
        let mut out = String::with_capacity(pattern.len());
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            let alphabet: &[u8] = match c {
                '#' => DIGITS,
                'A' => UPPER,
                'a' => LOWER,
                'X' => HEX_UPPER,
                'x' => HEX_LOWER,
                '*' => ALPHANUMERIC,
                '\\' => {
                    let literal = chars.next().ok_or_else(|| {
                        PopError::config("rng.draw_identifier", "dangling escape at end of pattern")
                    })?;
                    out.push(literal);
                    continue;
                }
                other => {
                    out.push(other);
                    continue;
                }
            };
            out.push(self.pick_byte(alphabet) as char);
        }
        Ok(out)
    }

    /// Random string over an explicit alphabet.
    pub fn string_from(&mut self, alphabet: &[u8], len: usize) -> String {
        (0..len).map(|_| self.pick_byte(alphabet) as char).collect()
    }

    pub fn alphanumeric(&mut self, len: usize) -> String {
        self.string_from(ALPHANUMERIC, len)
    }

    /// Random v4-shaped UUID built from this stream (not the OS RNG).
    pub fn uuid(&mut self) -> uuid::Uuid {
        let mut bytes = [0u8; 16];
        self.fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }

    fn pick_byte(&mut self, alphabet: &[u8]) -> u8 {
        alphabet[self.next_u64_below(alphabet.len() as u64) as usize]
    }
}

fn bounds_error<T: std::fmt::Display>(op: &str, lo: T, hi: T) -> PopError {
    PopError::config(format!("rng.{op}"), format!("invalid bounds: {lo} > {hi}"))
}

/// All generator RNGs for a single run, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_generator(&self, slot: GeneratorSlot) -> GeneratorRng {
        GeneratorRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable generator slot assignments.
/// NEVER reorder or remove entries; only append.
/// Reordering changes every generator's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum GeneratorSlot {
    Persona = 0,
    Tax = 1,
    Investment = 2,
    Credentials = 3,
    Office = 4,
    Personal = 5,
    Application = 6,
    Browser = 7,
    // Add new generators here, append only.
}

impl GeneratorSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Persona => "persona",
            Self::Tax => "tax",
            Self::Investment => "investment",
            Self::Credentials => "credentials",
            Self::Office => "office",
            Self::Personal => "personal",
            Self::Application => "application",
            Self::Browser => "browser",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng(seed: u64) -> GeneratorRng {
        RngBank::new(seed).for_generator(GeneratorSlot::Persona)
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = rng(12345);
        let mut b = rng(12345);
        for _ in 0..32 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn slots_are_independent_streams() {
        let bank = RngBank::new(7);
        let mut tax = bank.for_generator(GeneratorSlot::Tax);
        let mut browser = bank.for_generator(GeneratorSlot::Browser);
        assert_ne!(tax.next_u64(), browser.next_u64());
    }

    #[test]
    fn draw_amount_respects_bounds_and_decimals() {
        let mut r = rng(1);
        for _ in 0..500 {
            let v = r.draw_amount(10.0, 20.0, 2).unwrap();
            assert!((10.0..=20.0).contains(&v));
            assert!(((v * 100.0).round() - v * 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn inverted_bounds_are_configuration_errors() {
        let mut r = rng(1);
        assert!(r.draw_amount(5.0, 1.0, 2).unwrap_err().is_configuration());
        let a = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(r.draw_date(a, b).unwrap_err().is_configuration());
        let empty: [u8; 0] = [];
        assert!(r.choose(&empty).unwrap_err().is_configuration());
    }

    #[test]
    fn draw_date_is_inclusive() {
        let mut r = rng(3);
        let day = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        assert_eq!(r.draw_date(day, day).unwrap(), day);
    }

    #[test]
    fn identifier_pattern_classes() {
        let mut r = rng(99);
        for _ in 0..100 {
            let id = r.draw_identifier("9##-##-####").unwrap();
            assert_eq!(id.len(), 11);
            assert!(id.starts_with('9'));
            let parts: Vec<&str> = id.split('-').collect();
            assert_eq!(parts.len(), 3);
            assert!(parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));
        }
        let escaped = r.draw_identifier("\\#AA").unwrap();
        assert!(escaped.starts_with('#'));
        assert!(escaped[1..].chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn sample_returns_distinct_items() {
        let mut r = rng(5);
        let pool: Vec<u32> = (0..20).collect();
        let picked = r.sample(&pool, 20).unwrap();
        let mut seen: Vec<u32> = picked.into_iter().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, pool);
        assert!(r.sample(&pool, 21).is_err());
    }
}
