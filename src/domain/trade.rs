//! Orders and the trade lifecycle.
//!
//! A [`Trade`] moves `New → Opened → Closed`: the first order is its entry,
//! the second its exit. A closed trade accepts no further orders.

use std::fmt;

use crate::domain::error::EngineError;
use crate::domain::num::Num;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderKind {
    Entry,
    Exit,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Entry => write!(f, "entry"),
            OrderKind::Exit => write!(f, "exit"),
        }
    }
}

/// Direction of an order. A trade starting with `Buy` is long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" | "long" => Ok(Side::Buy),
            "sell" | "short" => Ok(Side::Sell),
            other => Err(format!("unknown side '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Order {
    pub kind: OrderKind,
    pub side: Side,
    pub index: usize,
    pub price: Num,
    pub amount: Num,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeState {
    New,
    Opened,
    Closed,
}

impl fmt::Display for TradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeState::New => write!(f, "new"),
            TradeState::Opened => write!(f, "opened"),
            TradeState::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    starting_side: Side,
    entry: Option<Order>,
    exit: Option<Order>,
}

impl Trade {
    pub fn new(starting_side: Side) -> Self {
        Trade {
            starting_side,
            entry: None,
            exit: None,
        }
    }

    /// A closed long or short trade from explicit prices.
    pub fn closed(
        starting_side: Side,
        entry: (usize, Num),
        exit: (usize, Num),
        amount: Num,
    ) -> Result<Self, EngineError> {
        let mut trade = Trade::new(starting_side);
        trade.enter(entry.0, entry.1, amount)?;
        trade.close(exit.0, exit.1, amount)?;
        Ok(trade)
    }

    pub fn starting_side(&self) -> Side {
        self.starting_side
    }

    pub fn state(&self) -> TradeState {
        match (&self.entry, &self.exit) {
            (None, _) => TradeState::New,
            (Some(_), None) => TradeState::Opened,
            (Some(_), Some(_)) => TradeState::Closed,
        }
    }

    pub fn is_new(&self) -> bool {
        self.state() == TradeState::New
    }

    pub fn is_opened(&self) -> bool {
        self.state() == TradeState::Opened
    }

    pub fn is_closed(&self) -> bool {
        self.state() == TradeState::Closed
    }

    pub fn entry(&self) -> Option<&Order> {
        self.entry.as_ref()
    }

    pub fn exit(&self) -> Option<&Order> {
        self.exit.as_ref()
    }

    /// Records the entry order. Only valid on a new trade.
    pub fn enter(&mut self, index: usize, price: Num, amount: Num) -> Result<Order, EngineError> {
        self.expect_state(TradeState::New, OrderKind::Entry)?;
        let order = Order {
            kind: OrderKind::Entry,
            side: self.starting_side,
            index,
            price,
            amount,
        };
        self.entry = Some(order);
        Ok(order)
    }

    /// Records the exit order. Only valid on an opened trade, at or after the
    /// entry index.
    pub fn close(&mut self, index: usize, price: Num, amount: Num) -> Result<Order, EngineError> {
        self.expect_state(TradeState::Opened, OrderKind::Exit)?;
        if let Some(entry) = self.entry.filter(|entry| index < entry.index) {
            return Err(EngineError::ExitBeforeEntry {
                entry: entry.index,
                exit: index,
            });
        }
        let order = Order {
            kind: OrderKind::Exit,
            side: self.starting_side.opposite(),
            index,
            price,
            amount,
        };
        self.exit = Some(order);
        Ok(order)
    }

    /// Records whichever order the current state expects.
    pub fn operate(&mut self, index: usize, price: Num, amount: Num) -> Result<Order, EngineError> {
        match self.state() {
            TradeState::New => self.enter(index, price, amount),
            TradeState::Opened | TradeState::Closed => self.close(index, price, amount),
        }
    }

    fn expect_state(&self, expected: TradeState, attempted: OrderKind) -> Result<(), EngineError> {
        let state = self.state();
        if state == expected {
            Ok(())
        } else {
            Err(EngineError::OrderSequence { attempted, state })
        }
    }

    /// `1 + profit ratio`: exit/entry for a long trade, entry/exit for a
    /// short one. `None` until the trade is closed.
    pub fn gross_return(&self) -> Option<Num> {
        let (entry, exit) = (self.entry?, self.exit?);
        Some(match self.starting_side {
            Side::Buy => exit.price / entry.price,
            Side::Sell => entry.price / exit.price,
        })
    }

    /// Absolute profit: (exit - entry) * amount for a long trade, the
    /// opposite for a short one. `None` until the trade is closed.
    pub fn profit(&self) -> Option<Num> {
        let (entry, exit) = (self.entry?, self.exit?);
        let diff = match self.starting_side {
            Side::Buy => exit.price - entry.price,
            Side::Sell => entry.price - exit.price,
        };
        Some(diff * entry.amount)
    }

    /// Bars spanned by a closed trade, both ends included.
    pub fn bar_count(&self) -> Option<usize> {
        let (entry, exit) = (self.entry?, self.exit?);
        exit.index.checked_sub(entry.index).map(|span| span + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::num::NumBackend;

    fn n(v: f64) -> Num {
        NumBackend::Decimal.num_of(v)
    }

    #[test]
    fn lifecycle_new_opened_closed() {
        let mut trade = Trade::new(Side::Buy);
        assert!(trade.is_new());
        let entry = trade.enter(2, n(50.0), n(1.0)).unwrap();
        assert_eq!(entry.kind, OrderKind::Entry);
        assert_eq!(entry.side, Side::Buy);
        assert!(trade.is_opened());
        let exit = trade.close(5, n(55.0), n(1.0)).unwrap();
        assert_eq!(exit.side, Side::Sell);
        assert!(trade.is_closed());
        assert_eq!(trade.bar_count(), Some(4));
    }

    #[test]
    fn exit_on_new_trade_fails() {
        let mut trade = Trade::new(Side::Buy);
        let err = trade.close(0, n(1.0), n(1.0)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::OrderSequence {
                attempted: OrderKind::Exit,
                state: TradeState::New
            }
        ));
        assert!(trade.is_new());
    }

    #[test]
    fn exit_before_entry_fails() {
        let mut trade = Trade::new(Side::Buy);
        trade.enter(5, n(10.0), n(1.0)).unwrap();
        let err = trade.close(2, n(11.0), n(1.0)).unwrap_err();
        assert!(matches!(err, EngineError::ExitBeforeEntry { entry: 5, exit: 2 }));
        assert!(trade.is_opened());
        assert_eq!(trade.exit(), None);
        assert!(Trade::closed(Side::Sell, (3, n(1.0)), (1, n(1.0)), n(1.0)).is_err());
    }

    #[test]
    fn exit_on_entry_bar_spans_one_bar() {
        let trade = Trade::closed(Side::Buy, (4, n(10.0)), (4, n(10.5)), n(1.0)).unwrap();
        assert_eq!(trade.bar_count(), Some(1));
    }

    #[test]
    fn entry_on_opened_trade_fails() {
        let mut trade = Trade::new(Side::Buy);
        trade.enter(0, n(1.0), n(1.0)).unwrap();
        assert!(trade.enter(1, n(1.0), n(1.0)).is_err());
        assert_eq!(trade.entry().map(|o| o.index), Some(0));
    }

    #[test]
    fn closed_trade_is_immutable() {
        let mut trade = Trade::closed(Side::Buy, (0, n(10.0)), (1, n(11.0)), n(1.0)).unwrap();
        let before = trade.clone();
        assert!(matches!(
            trade.operate(2, n(12.0), n(1.0)),
            Err(EngineError::OrderSequence {
                state: TradeState::Closed,
                ..
            })
        ));
        assert_eq!(trade, before);
    }

    #[test]
    fn operate_follows_state() {
        let mut trade = Trade::new(Side::Sell);
        assert_eq!(trade.operate(0, n(10.0), n(1.0)).unwrap().kind, OrderKind::Entry);
        assert_eq!(trade.operate(1, n(8.0), n(1.0)).unwrap().kind, OrderKind::Exit);
    }

    #[test]
    fn long_returns() {
        let trade = Trade::closed(Side::Buy, (0, n(100.0)), (3, n(110.0)), n(2.0)).unwrap();
        assert_eq!(trade.gross_return(), Some(n(1.1)));
        assert_eq!(trade.profit(), Some(n(20.0)));
    }

    #[test]
    fn short_returns() {
        let trade = Trade::closed(Side::Sell, (0, n(100.0)), (3, n(80.0)), n(1.0)).unwrap();
        assert_eq!(trade.gross_return(), Some(n(1.25)));
        assert_eq!(trade.profit(), Some(n(20.0)));
    }

    #[test]
    fn open_trade_has_no_returns() {
        let mut trade = Trade::new(Side::Buy);
        trade.enter(0, n(1.0), n(1.0)).unwrap();
        assert_eq!(trade.gross_return(), None);
        assert_eq!(trade.profit(), None);
        assert_eq!(trade.bar_count(), None);
    }

    #[test]
    fn side_parsing() {
        assert_eq!("BUY".parse::<Side>(), Ok(Side::Buy));
        assert_eq!("short".parse::<Side>(), Ok(Side::Sell));
        assert!("hold".parse::<Side>().is_err());
    }
}
