//! Resolvers for facts several generators surface.
//!
//! Each function returns the ledger value for its key, creating it on
//! first use with the caller's RNG stream.

use super::GenerationContext;
use crate::{
    error::{PopError, PopResult},
    facts::{Account, AccountKind, InvestmentIncome, PaymentCard},
    ledger::FactKey,
    money::Money,
    rng::GeneratorRng,
    types::{ArtifactCategory, Year},
};
use chrono::{Datelike, Duration};

const MAX_IDENTIFIER_DRAWS: usize = 64;

/// Draw from `pattern` until the value is unclaimed, then claim it
/// for `owner`.
pub fn claim_unique(
    ctx: &GenerationContext<'_>,
    rng: &mut GeneratorRng,
    category: ArtifactCategory,
    pattern: &str,
    owner: &FactKey,
) -> PopResult<String> {
    claim_with(ctx, rng, category, owner, |rng| rng.draw_identifier(pattern))
}

/// Like `claim_unique`, for values a pattern cannot describe.
pub fn claim_with<F>(
    ctx: &GenerationContext<'_>,
    rng: &mut GeneratorRng,
    category: ArtifactCategory,
    owner: &FactKey,
    mut draw: F,
) -> PopResult<String>
where
    F: FnMut(&mut GeneratorRng) -> PopResult<String>,
{
    for _ in 0..MAX_IDENTIFIER_DRAWS {
        let candidate = draw(rng)?;
        if !ctx.ledger.is_claimed(&candidate) {
            ctx.ledger.claim_identifier(category, &candidate, owner)?;
            return Ok(candidate);
        }
    }
    Err(PopError::violation(
        category,
        format!("could not draw an unused identifier for {owner}"),
    ))
}

/// The persona's account at `institution`. One account number per
/// institution for the whole run.
pub fn account(
    ctx: &GenerationContext<'_>,
    rng: &mut GeneratorRng,
    institution: &str,
    kind: AccountKind,
) -> PopResult<Account> {
    let key = FactKey::account(institution);
    let account = ctx.ledger.get_or_create(key.clone(), || {
        let category = match kind {
            AccountKind::Brokerage => ArtifactCategory::Investment,
            AccountKind::Checking => ArtifactCategory::Tax,
        };
        let (pattern, balance_range) = match kind {
            AccountKind::Brokerage => ("Z########", (5_000, 25_000)),
            AccountKind::Checking => ("############", (1_000, 8_000)),
        };
        let number = claim_unique(ctx, rng, category, pattern, &key)?;
        let routing_number = rng.draw_identifier("0########")?;

        let created = ctx.persona.account_created;
        let latest = (created + Duration::days(180)).min(ctx.clock.today() - Duration::days(1));
        let opened = rng.draw_date(created, latest.max(created))?;
        let opening_balance = rng.draw_money(
            Money::from_dollars(balance_range.0),
            Money::from_dollars(balance_range.1),
        )?;

        log::debug!("account: {institution} {} opened {opened}", kind.label());
        Ok(Account {
            institution: institution.to_string(),
            number,
            routing_number,
            kind,
            opened,
            opening_balance,
        })
    })?;
    if account.kind != kind {
        let category = match kind {
            AccountKind::Brokerage => ArtifactCategory::Investment,
            AccountKind::Checking => ArtifactCategory::Tax,
        };
        return Err(PopError::violation(
            category,
            format!(
                "{institution} already holds a {} account, not a {} one",
                account.kind.label(),
                kind.label()
            ),
        ));
    }
    Ok(account)
}

/// The persona's everyday checking account, used for direct deposit.
pub fn checking_account(ctx: &GenerationContext<'_>, rng: &mut GeneratorRng) -> PopResult<Account> {
    account(ctx, rng, &ctx.config.bank, AccountKind::Checking)
}

pub fn brokerage_account(ctx: &GenerationContext<'_>, rng: &mut GeneratorRng) -> PopResult<Account> {
    account(ctx, rng, &ctx.config.brokerage, AccountKind::Brokerage)
}

/// The card receipts and software licenses are charged to.
pub fn payment_card(ctx: &GenerationContext<'_>, rng: &mut GeneratorRng) -> PopResult<PaymentCard> {
    let key = FactKey::payment_card("primary");
    ctx.ledger.get_or_create(key.clone(), || {
        let network = rng.choose(&["Visa", "Mastercard", "American Express", "Discover"])?;
        let last_four = claim_unique(ctx, rng, ArtifactCategory::Personal, "####", &key)?;
        let month = rng.range(1, 12)?;
        let year = ctx.clock.today().year() + rng.range(1, 4)? as i32;
        Ok(PaymentCard {
            network: network.to_string(),
            last_four,
            expires: format!("{month:02}/{:02}", year % 100),
        })
    })
}

/// Dividends and interest for `year`.
pub fn investment_income(
    ctx: &GenerationContext<'_>,
    rng: &mut GeneratorRng,
    year: Year,
) -> PopResult<InvestmentIncome> {
    ctx.ledger.get_or_create(FactKey::investment_income(year), || {
        let ordinary = rng.draw_money(Money::from_dollars(200), Money::from_dollars(2_400))?;
        let qualified_share = rng.draw_amount(0.70, 0.90, 2)?;
        Ok(InvestmentIncome {
            year,
            ordinary_dividends: ordinary,
            qualified_dividends: ordinary.percent(qualified_share),
            interest: rng.draw_money(Money::from_dollars(15), Money::from_dollars(600))?,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::RunConfig, generators::fixture::Fixture, rng::GeneratorSlot};

    #[test]
    fn account_is_one_per_institution() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let first = checking_account(&ctx, &mut fx.rng(GeneratorSlot::Tax)).unwrap();
        let again = checking_account(&ctx, &mut fx.rng(GeneratorSlot::Credentials)).unwrap();
        assert_eq!(first, again);
        assert_ne!(brokerage_account(&ctx, &mut fx.rng(GeneratorSlot::Investment)).unwrap().number, first.number);
    }

    #[test]
    fn institution_cannot_change_account_kind() {
        let mut config = RunConfig::default_test();
        config.brokerage = config.bank.clone();
        let fx = Fixture::with_config(config);
        let ctx = fx.ctx();
        checking_account(&ctx, &mut fx.rng(GeneratorSlot::Tax)).unwrap();

        let err = brokerage_account(&ctx, &mut fx.rng(GeneratorSlot::Investment)).unwrap_err();
        assert!(matches!(
            err,
            PopError::ConsistencyViolation { category: ArtifactCategory::Investment, .. }
        ));
    }
}
