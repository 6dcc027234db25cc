//! End-to-end: the $30 dinner with one unavailable item.

use std::collections::BTreeMap;

use tabsplit_core::{CoreError, Item, Money, Receipt, ReceiptDocument, ReceiptLimits, ReceiptTotals};

fn dinner() -> Receipt {
    let totals = ReceiptTotals::new(
        Money::from_cents(3000),
        Money::from_cents(300),
        Money::from_cents(500),
    );
    let mut receipt = Receipt::new("dinner", totals).unwrap();
    receipt
        .add_item(Item::new("item-a", "Item A", 1, Money::from_cents(2000)))
        .unwrap();
    receipt
        .add_item(Item::new("item-b", "Item B", 1, Money::from_cents(1000)).with_available(false))
        .unwrap();

    let split = BTreeMap::from([("user1".to_string(), 1), ("user2".to_string(), 1)]);
    receipt.set_split("item-a", &split).unwrap();
    receipt
}

#[test]
fn test_worked_example_exact_amounts() {
    let mut receipt = dinner();
    let snapshot = receipt.finalize().unwrap();

    assert_eq!(snapshot.available_subtotal.to_decimal_string(), "20.00");
    assert_eq!(snapshot.adjusted_tax.to_decimal_string(), "2.00");
    assert_eq!(snapshot.tip.to_decimal_string(), "5.00");

    for user in ["user1", "user2"] {
        let share = snapshot.share(user).unwrap();
        assert_eq!(share.subtotal.to_decimal_string(), "10.00");
        assert_eq!(share.tax.to_decimal_string(), "1.00");
        assert_eq!(share.tip.to_decimal_string(), "2.50");
        assert_eq!(share.total.to_decimal_string(), "13.50");
    }
    assert_eq!(snapshot.grand_total.to_decimal_string(), "27.00");
}

#[test]
fn test_worked_example_snapshot_json() {
    let mut receipt = dinner();
    let snapshot = receipt.finalize().unwrap();
    let json = serde_json::to_value(snapshot).unwrap();

    assert_eq!(json["shares"]["user1"]["total"], "13.50");
    assert_eq!(json["shares"]["user2"]["tip"], "2.50");
    assert_eq!(json["grand_total"], "27.00");
    assert_eq!(json["unclaimed"], "0.00");
}

#[test]
fn test_worked_example_reopen_and_refinalize() {
    let mut receipt = dinner();
    let first = receipt.finalize().unwrap().clone();

    assert!(matches!(
        receipt.set_claim("item-a", "user3", 1),
        Err(CoreError::ReceiptFinalized { .. })
    ));

    receipt.reopen().unwrap();
    let second = receipt.finalize().unwrap();
    assert_eq!(&first, second);
}

#[test]
fn test_worked_example_from_document() {
    let raw = r#"{
        "id": "dinner",
        "totals": { "subtotal": "30.00", "tax_total": "3.00", "tip_total": "5.00", "total": "38.00" },
        "items": [
            { "id": "item-a", "name": "Item A", "quantity": 1, "total_price": "20.00" },
            { "id": "item-b", "name": "Item B", "quantity": 1, "total_price": "10.00", "available": false }
        ],
        "claims": [
            { "item_id": "item-a", "user_id": "user1", "claimed_quantity": 1 },
            { "item_id": "item-a", "user_id": "user2", "claimed_quantity": 1 }
        ]
    }"#;
    let document: ReceiptDocument = serde_json::from_str(raw).unwrap();
    let mut receipt = Receipt::from_document(document, ReceiptLimits::default()).unwrap();

    // Two weights of 1 on a one-unit item: loaded as a split.
    assert!(receipt.ledger().is_split("item-a"));

    let snapshot = receipt.finalize().unwrap();
    assert_eq!(snapshot.shares["user1"].total.cents(), 1350);
    assert_eq!(snapshot.shares["user2"].total.cents(), 1350);
    assert_eq!(snapshot.grand_total.cents(), 2700);
}
