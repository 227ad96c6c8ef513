//! Property tests: rollback fidelity, canonical endpoints, scan coherence

use poolsim_amm::sqrt_price::price_to_sqrt_price;
use poolsim_amm::{Pool, SwapDirection};
use proptest::prelude::*;

fn three_range_pool() -> Pool {
    let mut pool = Pool::new(2000.0, 0.003);
    pool.add_liquidity(1, 10.0, 20_000.0, 1500.0, 2000.0);
    pool.add_liquidity(2, 10.0, 20_000.0, 1800.0, 2200.0);
    pool.add_liquidity(3, 10.0, 20_000.0, 2000.0, 2500.0);
    pool
}

proptest! {
    #[test]
    fn endpoints_always_canonical(
        price_a in 100.0f64..5000.0,
        price_b in 100.0f64..5000.0,
        x in 0.1f64..100.0,
        y in 100.0f64..100_000.0,
    ) {
        prop_assume!((price_a - price_b).abs() > 1.0);

        let mut pool = Pool::new(2000.0, 0.003);
        pool.add_liquidity(1, x, y, price_a, price_b);

        let position = pool.position(1).unwrap();
        prop_assert!(position.lower_sqrt_price < position.upper_sqrt_price);
        prop_assert!(position.liquidity >= 0.0);
    }

    #[test]
    fn simulate_never_mutates_state(
        amount in 0.001f64..50.0,
        downward in any::<bool>(),
    ) {
        let mut pool = three_range_pool();
        let before = pool.clone();

        let direction = if downward {
            SwapDirection::ZeroForOne
        } else {
            SwapDirection::OneForZero
        };

        // The swap may succeed or fail with insufficient liquidity; either
        // way the observable state must be untouched.
        let _ = pool.swap(amount, direction, true);

        prop_assert_eq!(pool.positions(), before.positions());
        prop_assert_eq!(pool.current_price, before.current_price);
        prop_assert_eq!(pool.sqrt_price, before.sqrt_price);
        prop_assert_eq!(pool.fee, before.fee);
    }

    #[test]
    fn failed_commit_never_mutates_state(amount in 50_000.0f64..1_000_000.0) {
        let mut pool = three_range_pool();
        let before = pool.clone();

        // Amounts this large always exhaust the configured ranges.
        let result = pool.swap(amount, SwapDirection::OneForZero, false);

        prop_assert!(result.is_err());
        prop_assert_eq!(pool.positions(), before.positions());
        prop_assert_eq!(pool.current_price, before.current_price);
        prop_assert_eq!(pool.sqrt_price, before.sqrt_price);
    }

    #[test]
    fn scan_is_coherent_at_any_price(price in 1000.0f64..3000.0) {
        let pool = three_range_pool();
        let sqrt_price = price_to_sqrt_price(price);

        let down = pool.scan_ranges(sqrt_price, SwapDirection::ZeroForOne);
        prop_assert!(down.nearest_boundary < sqrt_price);
        let down_total: f64 = down
            .active_ids
            .iter()
            .map(|id| pool.position(*id).unwrap().liquidity)
            .sum();
        prop_assert_eq!(down.total_liquidity, down_total);
        for id in &down.active_ids {
            prop_assert!(pool.position(*id).unwrap().active_downward(sqrt_price));
        }

        let up = pool.scan_ranges(sqrt_price, SwapDirection::OneForZero);
        prop_assert!(up.nearest_boundary > sqrt_price);
        for id in &up.active_ids {
            prop_assert!(pool.position(*id).unwrap().active_upward(sqrt_price));
        }
    }
}
