//! Balance derivation.
//!
//! The balance is never an independent counter: it is the reduction "entries
//! add, exits subtract" over the current movement set. [`LedgerSummary`] can be
//! maintained incrementally, but `apply`/`revert` must always agree with
//! [`LedgerSummary::scan`] over the same set.
//!
//! All arithmetic is checked. A movement that would push any total past the
//! decimal range is rejected as a validation error and leaves the summary
//! untouched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashbook_core::{DomainError, DomainResult};

use crate::movement::{Movement, MovementKind};

fn overflow(movement: &Movement) -> DomainError {
    DomainError::validation(format!(
        "{} of {} would overflow the ledger totals",
        movement.kind, movement.amount
    ))
}

/// Signed sum over `movements`.
pub fn balance_of<'a>(movements: impl IntoIterator<Item = &'a Movement>) -> DomainResult<Decimal> {
    movements.into_iter().try_fold(Decimal::ZERO, |acc, m| {
        acc.checked_add(m.signed_amount()).ok_or_else(|| overflow(m))
    })
}

/// Totals over the movement set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total_entries: Decimal,
    pub total_exits: Decimal,
    pub balance: Decimal,
    pub movement_count: u64,
}

impl LedgerSummary {
    /// From-scratch reduction.
    pub fn scan<'a>(movements: impl IntoIterator<Item = &'a Movement>) -> DomainResult<Self> {
        let mut summary = Self::default();
        for m in movements {
            summary.apply(m)?;
        }
        Ok(summary)
    }

    /// Account for a movement joining the set.
    pub fn apply(&mut self, movement: &Movement) -> DomainResult<()> {
        *self = self.with(movement)?;
        Ok(())
    }

    /// Account for a movement leaving the set.
    pub fn revert(&mut self, movement: &Movement) -> DomainResult<()> {
        *self = self.without(movement)?;
        Ok(())
    }

    /// Account for `before` being replaced by `after`.
    ///
    /// Either both steps land or neither does.
    pub fn replace(&mut self, before: &Movement, after: &Movement) -> DomainResult<()> {
        *self = self.without(before)?.with(after)?;
        Ok(())
    }

    fn with(&self, movement: &Movement) -> DomainResult<Self> {
        let amount = movement.amount.value();
        let mut next = *self;
        match movement.kind {
            MovementKind::Entry => {
                next.total_entries = next
                    .total_entries
                    .checked_add(amount)
                    .ok_or_else(|| overflow(movement))?;
            }
            MovementKind::Exit => {
                next.total_exits = next
                    .total_exits
                    .checked_add(amount)
                    .ok_or_else(|| overflow(movement))?;
            }
        }
        next.balance = next
            .balance
            .checked_add(movement.signed_amount())
            .ok_or_else(|| overflow(movement))?;
        next.movement_count += 1;
        Ok(next)
    }

    fn without(&self, movement: &Movement) -> DomainResult<Self> {
        let amount = movement.amount.value();
        let mut next = *self;
        match movement.kind {
            MovementKind::Entry => {
                next.total_entries = next
                    .total_entries
                    .checked_sub(amount)
                    .ok_or_else(|| overflow(movement))?;
            }
            MovementKind::Exit => {
                next.total_exits = next
                    .total_exits
                    .checked_sub(amount)
                    .ok_or_else(|| overflow(movement))?;
            }
        }
        next.balance = next
            .balance
            .checked_sub(movement.signed_amount())
            .ok_or_else(|| overflow(movement))?;
        next.movement_count = next.movement_count.saturating_sub(1);
        Ok(next)
    }
}
