//! Chronological ledger of closed trades plus the trade in progress.

use crate::domain::error::EngineError;
use crate::domain::num::Num;
use crate::domain::trade::{Order, OrderKind, Side, Trade, TradeState};

/// Orders strictly alternate entry, exit, entry, ... An exit closes the
/// current trade, moves it to [`trades`](Self::trades) and starts a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingRecord {
    starting_side: Side,
    trades: Vec<Trade>,
    current: Trade,
    last_order: Option<Order>,
}

impl Default for TradingRecord {
    fn default() -> Self {
        TradingRecord::new(Side::Buy)
    }
}

impl TradingRecord {
    pub fn new(starting_side: Side) -> Self {
        TradingRecord {
            starting_side,
            trades: Vec::new(),
            current: Trade::new(starting_side),
            last_order: None,
        }
    }

    pub fn starting_side(&self) -> Side {
        self.starting_side
    }

    /// The trade in progress: always new or opened.
    pub fn current_trade(&self) -> &Trade {
        &self.current
    }

    /// Closed trades, oldest first.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    /// `true` when no position is open.
    pub fn is_closed(&self) -> bool {
        !self.current.is_opened()
    }

    /// Records an entry. Fails unless the current trade is new.
    pub fn enter(&mut self, index: usize, price: Num, amount: Num) -> Result<(), EngineError> {
        self.record(OrderKind::Entry, index, price, amount)
    }

    /// Records an exit. Fails unless the current trade is opened.
    pub fn exit(&mut self, index: usize, price: Num, amount: Num) -> Result<(), EngineError> {
        self.record(OrderKind::Exit, index, price, amount)
    }

    /// Records whichever order the current trade expects next.
    pub fn operate(&mut self, index: usize, price: Num, amount: Num) -> Result<(), EngineError> {
        let kind = match self.current.state() {
            TradeState::New => OrderKind::Entry,
            TradeState::Opened | TradeState::Closed => OrderKind::Exit,
        };
        self.record(kind, index, price, amount)
    }

    fn record(
        &mut self,
        kind: OrderKind,
        index: usize,
        price: Num,
        amount: Num,
    ) -> Result<(), EngineError> {
        let order = match kind {
            OrderKind::Entry => self.current.enter(index, price, amount)?,
            OrderKind::Exit => self.current.close(index, price, amount)?,
        };
        self.last_order = Some(order);
        if self.current.is_closed() {
            let closed = std::mem::replace(&mut self.current, Trade::new(self.starting_side));
            self.trades.push(closed);
        }
        Ok(())
    }

    pub fn last_order(&self) -> Option<&Order> {
        self.last_order.as_ref()
    }

    /// Most recent entry order, including the one of an open trade.
    pub fn last_entry(&self) -> Option<&Order> {
        self.current
            .entry()
            .or_else(|| self.trades.last().and_then(Trade::entry))
    }

    pub fn last_exit(&self) -> Option<&Order> {
        self.trades.last().and_then(Trade::exit)
    }

    /// Last closed trade.
    pub fn last_trade(&self) -> Option<&Trade> {
        self.trades.last()
    }
}
