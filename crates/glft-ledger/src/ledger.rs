//! The inventory ledger: fills in, trades out.
//!
//! Accounting rules:
//! - Cash moves by the fill's signed notional plus its fee, atomically with
//!   the position update. Fees are never deferred.
//! - A reducing fill realizes PnL on the closed portion at the prior cost
//!   basis. A flip realizes the whole old position, then opens the
//!   remainder fresh at the fill price.
//! - Fill application is idempotent by fill id: replaying an exchange fill
//!   report must not double-apply.

use crate::error::{LedgerError, LedgerResult};
use crate::position::Position;
use glft_core::{ExitReason, Fill, FillId, OrderSide, Price, Size, Trade};
use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Single-writer bookkeeping state for one strategy instance.
#[derive(Debug)]
pub struct InventoryLedger {
    position: Position,
    cash: Decimal,
    realized_pnl: Decimal,
    fees_paid: Decimal,
    /// Append-only reduction/closure log.
    trades: Vec<Trade>,
    /// Fill ids already applied, for idempotent replay.
    applied: HashSet<FillId>,
}

impl InventoryLedger {
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            position: Position::default(),
            cash: initial_cash,
            realized_pnl: Decimal::ZERO,
            fees_paid: Decimal::ZERO,
            trades: Vec::new(),
            applied: HashSet::new(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    pub fn fees_paid(&self) -> Decimal {
        self.fees_paid
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Completed round-trips: reductions that took the position to zero.
    pub fn round_trip_count(&self) -> usize {
        self.trades.iter().filter(|t| t.full_close).count()
    }

    /// Mark-to-market equity: cash + position * mark.
    pub fn equity(&self, mark: Price) -> Decimal {
        self.cash + self.position.quantity * mark.inner()
    }

    /// Whether a fill id has been applied already.
    pub fn has_fill(&self, id: &str) -> bool {
        self.applied.contains(id)
    }

    /// Apply one fill.
    ///
    /// Returns the `Trade` emitted if the fill reduced or closed a
    /// position, `None` for a pure open/add or an idempotent replay.
    pub fn apply_fill(&mut self, fill: &Fill, reason: ExitReason) -> LedgerResult<Option<Trade>> {
        if !fill.quantity.is_positive() {
            return Err(LedgerError::InvalidFill(format!(
                "non-positive quantity {} on fill {}",
                fill.quantity, fill.id
            )));
        }
        if !fill.price.is_positive() {
            return Err(LedgerError::InvalidFill(format!(
                "non-positive price {} on fill {}",
                fill.price, fill.id
            )));
        }
        if !self.applied.insert(fill.id.clone()) {
            debug!(fill_id = %fill.id, "duplicate fill report ignored");
            return Ok(None);
        }

        // Cash and position move together; fees are charged now.
        self.cash -= fill.signed_notional();
        self.cash -= fill.fee;
        self.fees_paid += fill.fee;

        let old_qty = self.position.quantity;
        let signed = fill.signed_quantity();
        let new_qty = old_qty + signed;
        let reducing = !old_qty.is_zero() && old_qty.signum() != signed.signum();

        let trade = if reducing {
            let closed = signed.abs().min(old_qty.abs());
            let direction = old_qty.signum();
            let pnl = (fill.price.inner() - self.position.avg_entry.inner()) * closed * direction;
            self.realized_pnl += pnl;

            let full_close = closed == old_qty.abs();
            let trade = Trade {
                side: if old_qty > Decimal::ZERO {
                    OrderSide::Buy
                } else {
                    OrderSide::Sell
                },
                entry_price: self.position.avg_entry,
                exit_price: fill.price,
                quantity: Size::new(closed),
                fees: fill.fee,
                realized_pnl: pnl,
                full_close,
                exit_reason: reason,
                opened_at: self.position.opened_at.unwrap_or(fill.timestamp),
                closed_at: fill.timestamp,
            };
            self.trades.push(trade.clone());
            Some(trade)
        } else {
            None
        };

        // Cost basis for the surviving position.
        if new_qty.is_zero() {
            self.position.avg_entry = Price::ZERO;
            self.position.opened_at = None;
        } else if reducing && new_qty.signum() != old_qty.signum() {
            // Flip: remainder opens fresh at the fill price.
            self.position.avg_entry = fill.price;
            self.position.opened_at = Some(fill.timestamp);
        } else if !reducing {
            // Opening or adding: volume-weighted basis.
            let old_notional = old_qty.abs() * self.position.avg_entry.inner();
            let add_notional = fill.quantity.inner() * fill.price.inner();
            self.position.avg_entry = Price::new((old_notional + add_notional) / new_qty.abs());
            if old_qty.is_zero() {
                self.position.opened_at = Some(fill.timestamp);
            }
        }
        // else: plain reduction keeps the old basis.

        self.position.quantity = new_qty;

        trace!(
            fill_id = %fill.id,
            side = %fill.side,
            price = %fill.price,
            qty = %fill.quantity,
            position = %new_qty,
            cash = %self.cash,
            "fill applied"
        );

        Ok(trade)
    }
}
