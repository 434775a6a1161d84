mod common;

use marketplace_ledger::application::ledger::ShipOrder;
use marketplace_ledger::domain::ports::LedgerStore;
use marketplace_ledger::domain::pricing::PricingPolicy;
use marketplace_ledger::domain::transaction::{PaymentMethod, TransactionType};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn random_price(rng: &mut impl Rng) -> Decimal {
    // 0.01 to 99,999.99 in whole fils
    Decimal::new(rng.gen_range(1..10_000_000), 2)
}

#[test]
fn test_quote_invariants_hold_for_random_prices() {
    let mut rng = rand::thread_rng();
    let policy = PricingPolicy::default();

    for _ in 0..1_000 {
        let price = random_price(&mut rng);
        let shipping = if rng.gen_bool(0.5) {
            Some(Decimal::new(rng.gen_range(0..10_000), 2))
        } else {
            None
        };
        let quote = policy.quote(price, shipping).unwrap();

        assert_eq!(
            quote.total_price,
            quote
                .item_price
                .checked_add(quote.shipping_cost)
                .and_then(|sum| sum.checked_add(quote.buyer_protection_fee))
                .unwrap()
        );
        assert_eq!(quote.buyer_protection_fee.value().scale(), 2);
        let exact = price * dec!(0.05) + dec!(2.50);
        assert!((quote.buyer_protection_fee.value() - exact).abs() <= dec!(0.005));
        assert!(quote.payout().unwrap() < quote.total_price);
        assert_eq!(quote.shipping_cost.value(), shipping.unwrap_or(dec!(15.00)));
    }
}

#[test]
fn test_non_positive_prices_rejected() {
    let policy = PricingPolicy::default();
    assert!(policy.quote(Decimal::ZERO, None).is_err());
    assert!(policy.quote(dec!(-10.00), None).is_err());
    assert!(policy.quote(dec!(10.00), Some(dec!(-1))).is_err());
}

#[tokio::test]
async fn test_stored_breakdown_survives_lifecycle() {
    let market = common::Marketplace::new().await;
    let mut rng = rand::thread_rng();
    let prices: Vec<Decimal> = (0..20).map(|_| random_price(&mut rng)).collect();

    for price in prices {
        let item = market.list_item(price).await;
        let placed = market.ledger.create_order(market.place(item)).await.unwrap();
        let id = placed.id;

        market
            .ledger
            .confirm_payment(id, market.buyer, PaymentMethod::Cod)
            .await
            .unwrap();
        market
            .ledger
            .ship_order(id, market.seller, ShipOrder::default())
            .await
            .unwrap();
        market.ledger.confirm_delivery(id, market.buyer).await.unwrap();
        let completed = market.ledger.complete_order(id, market.buyer).await.unwrap();

        assert_eq!(completed.total_price, placed.total_price);
        assert_eq!(completed.buyer_protection_fee, placed.buyer_protection_fee);

        let ledger = market.store.transactions(id).await.unwrap();
        let paid = ledger
            .iter()
            .find(|tx| tx.r#type == TransactionType::Payment)
            .unwrap();
        let payout = ledger
            .iter()
            .find(|tx| tx.r#type == TransactionType::Payout)
            .unwrap();
        assert_eq!(paid.amount, placed.total_price);
        assert_eq!(payout.amount, placed.payout_amount().unwrap());
    }
}
