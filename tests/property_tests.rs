//! Property tests for the paper account and sizing rules.

use algotrader::domain::execution::{ExecutionConfig, OrderSide};
use algotrader::domain::portfolio::PaperAccount;
use algotrader::domain::sizing::{capped_size, replay_caps, SizeCap};
use algotrader::ports::broker_port::Broker;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Buy { sym: usize, qty: f64, price: f64 },
    Sell { sym: usize, qty: f64, price: f64 },
    Close { sym: usize, price: f64 },
    Mark { sym: usize, price: f64 },
}

const SYMBOLS: [&str; 3] = ["AAA", "BBB", "CCC"];

/// Mostly valid sizes, with zero and negative ones mixed in.
fn quantity() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => 0.1..500.0_f64,
        1 => Just(0.0),
        1 => -500.0..0.0_f64,
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, quantity(), 1.0..1000.0_f64)
            .prop_map(|(sym, qty, price)| Op::Buy { sym, qty, price }),
        (0..3usize, quantity(), 1.0..1000.0_f64)
            .prop_map(|(sym, qty, price)| Op::Sell { sym, qty, price }),
        (0..3usize, 1.0..1000.0_f64).prop_map(|(sym, price)| Op::Close { sym, price }),
        (0..3usize, 1.0..1000.0_f64).prop_map(|(sym, price)| Op::Mark { sym, price }),
    ]
}

fn apply(account: &mut PaperAccount, op: &Op) {
    match *op {
        Op::Buy { sym, qty, price } => {
            account.place_order(SYMBOLS[sym], OrderSide::Buy, qty, price, None);
        }
        Op::Sell { sym, qty, price } => {
            account.place_order(SYMBOLS[sym], OrderSide::Sell, qty, price, None);
        }
        Op::Close { sym, price } => {
            account.close_position(SYMBOLS[sym], price);
        }
        Op::Mark { sym, price } => account.update_price(SYMBOLS[sym], price),
    }
}

proptest! {
    #[test]
    fn value_is_cash_plus_marked_positions(
        ops in prop::collection::vec(op(), 1..40),
        commission in 0.0..0.01_f64,
        slippage in 0.0..0.01_f64,
    ) {
        let mut account = PaperAccount::new(
            100_000.0,
            ExecutionConfig { commission_pct: commission, slippage_pct: slippage },
        );
        for op in &ops {
            apply(&mut account, op);
            let marked: f64 = account
                .get_positions()
                .iter()
                .map(|p| p.current_price * p.quantity)
                .sum();
            let value = account.get_portfolio_value();
            prop_assert!((value - (account.get_balance() + marked)).abs() <= 1e-6 * value.abs().max(1.0));
        }
    }

    #[test]
    fn cash_never_negative(ops in prop::collection::vec(op(), 1..40)) {
        let mut account = PaperAccount::new(10_000.0, ExecutionConfig::default());
        for op in &ops {
            apply(&mut account, op);
            prop_assert!(account.cash() >= 0.0);
        }
    }

    #[test]
    fn invalid_quantity_never_changes_state(
        ops in prop::collection::vec(op(), 0..20),
        qty in prop_oneof![Just(0.0), -1000.0..0.0_f64],
        buy in any::<bool>(),
    ) {
        let mut account = PaperAccount::new(10_000.0, ExecutionConfig::default());
        for op in &ops {
            apply(&mut account, op);
        }
        let before = (account.cash(), account.get_positions(), account.trade_log().len());
        let side = if buy { OrderSide::Buy } else { OrderSide::Sell };
        let result = account.place_order(SYMBOLS[0], side, qty, 100.0, None);
        prop_assert!(!result.is_filled());
        prop_assert_eq!(before, (account.cash(), account.get_positions(), account.trade_log().len()));
    }

    #[test]
    fn at_most_one_position_per_symbol(ops in prop::collection::vec(op(), 1..40)) {
        let mut account = PaperAccount::new(100_000.0, ExecutionConfig::default());
        for op in &ops {
            apply(&mut account, op);
            let positions = account.get_positions();
            let mut symbols: Vec<&str> = positions.iter().map(|p| p.symbol.as_str()).collect();
            symbols.sort_unstable();
            symbols.dedup();
            prop_assert_eq!(symbols.len(), positions.len());
            prop_assert!(positions.iter().all(|p| p.quantity > 0.0));
        }
    }

    #[test]
    fn capped_size_is_non_negative_and_bounded(
        a in -1000.0..1000.0_f64,
        b in -10.0..10.0_f64,
        c in -1000.0..1000.0_f64,
        d in -10.0..10.0_f64,
    ) {
        let size = capped_size(&[SizeCap::new(a, b), SizeCap::new(c, d)]);
        prop_assert!(size >= 0.0);
        if b > 0.0 && d > 0.0 {
            prop_assert!(size <= (a / b).max(0.0) + 1e-12);
            prop_assert!(size <= (c / d).max(0.0) + 1e-12);
        }
    }

    #[test]
    fn replay_entry_never_exceeds_capital(
        capital in 1.0..1_000_000.0_f64,
        risk in 0.001..0.5_f64,
        stop in 0.001..0.5_f64,
        price in 0.01..5000.0_f64,
    ) {
        let qty = capped_size(&replay_caps(capital, risk, stop, price));
        prop_assert!(qty >= 0.0);
        prop_assert!(qty * price <= capital * 0.95 + 1e-6);
    }
}
