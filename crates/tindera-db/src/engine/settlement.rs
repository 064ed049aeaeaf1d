//! # Cashier Settlement
//!
//! Converting a pending pickup order into a completed sale at the counter,
//! and ringing up walk-up customers who never placed an order.
//!
//! Settlement is a single transaction: the sale appears, the line items
//! re-parent onto it, the order row disappears, the payment record flips to
//! paid, and the cashier log gains an entry, or none of that happens.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::engine::{intake, names_match, new_id, Engine, EngineError, EngineResult};
use crate::ledger;
use crate::repository::{cashier, item, order, payment, sale};
use tindera_core::{
    validation, CartLine, CashierAction, CashierLogEntry, FulfillmentType, LineItem, LineOwner,
    PaymentOwner, PaymentState, Sale,
};

/// A counter sale with no prior order behind it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkUpSale {
    pub customer_name: String,
    pub contact: String,
    pub lines: Vec<CartLine>,
    pub cashier_id: String,
}

impl Engine {
    /// Settles a pending order: payment collected, goods handed over.
    ///
    /// The presented name must match the order on record. Works for any
    /// pending order regardless of fulfillment type, since a delivery
    /// customer may choose to collect in person before dispatch.
    pub async fn settle_order(
        &self,
        order_id: &str,
        presented_name: &str,
        cashier_id: &str,
    ) -> EngineResult<Sale> {
        validation::validate_customer_name(presented_name)?;
        validation::validate_staff_id(cashier_id)?;

        let mut tx = self.pool().begin().await?;

        let order = match order::get(&mut tx, order_id).await? {
            Some(order) => order,
            None => return Err(intake::missing_order(&mut tx, order_id).await?),
        };

        if !names_match(&order.customer_name, presented_name) {
            return Err(EngineError::Conflict(format!(
                "presented name does not match order {order_id}"
            )));
        }

        let sale = Sale {
            id: new_id(),
            source_order_id: Some(order.id.clone()),
            source_delivery_id: None,
            customer_name: order.customer_name.clone(),
            contact: order.contact.clone(),
            fulfillment: order.fulfillment,
            shipping_fee_cents: order.shipping_fee_cents,
            subtotal_cents: order.subtotal_cents,
            total_cents: order.total_cents,
            cashier_id: cashier_id.to_string(),
            created_at: Utc::now(),
        };

        sale::insert(&mut tx, &sale).await?;
        item::transfer(&mut tx, LineOwner::Order, &order.id, LineOwner::Sale, &sale.id).await?;

        let deleted = order::delete(&mut tx, &order.id).await?;
        if deleted == 0 {
            return Err(EngineError::Conflict(format!(
                "order {order_id} was fulfilled by another cashier"
            )));
        }

        payment::upsert_with(&mut tx, PaymentOwner::Sale, &sale.id, PaymentState::Paid).await?;
        cashier::append(
            &mut tx,
            &CashierLogEntry {
                id: new_id(),
                cashier_id: cashier_id.to_string(),
                action: CashierAction::Sale,
                reference_id: sale.id.clone(),
                amount_cents: sale.total_cents,
                created_at: sale.created_at,
            },
        )
        .await?;

        tx.commit().await?;

        info!(sale = %sale.id, order = %order_id, cashier = %cashier_id, "Order settled");

        Ok(sale)
    }

    /// Rings up a walk-up sale: stock deducted, sale recorded, payment
    /// marked paid, all in one transaction.
    pub async fn settle_walk_up(&self, input: WalkUpSale) -> EngineResult<Sale> {
        validation::validate_customer_name(&input.customer_name)?;
        validation::validate_staff_id(&input.cashier_id)?;
        validation::validate_cart(&input.lines)?;

        let mut tx = self.pool().begin().await?;

        let reserved = ledger::reserve_and_deduct(&mut tx, &input.lines).await?;

        let sale_id = new_id();
        let now = Utc::now();

        let items: Vec<LineItem> = reserved
            .into_iter()
            .map(|line| LineItem {
                id: new_id(),
                owner_kind: LineOwner::Sale,
                owner_id: sale_id.clone(),
                product_id: line.product_id,
                name_snapshot: line.name_snapshot,
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
                line_total_cents: line.line_total_cents,
                created_at: now,
            })
            .collect();

        let subtotal_cents: i64 = items.iter().map(|i| i.line_total_cents).sum();

        let sale = Sale {
            id: sale_id,
            source_order_id: None,
            source_delivery_id: None,
            customer_name: input.customer_name.trim().to_string(),
            contact: input.contact,
            fulfillment: FulfillmentType::Pickup,
            shipping_fee_cents: 0,
            subtotal_cents,
            total_cents: subtotal_cents,
            cashier_id: input.cashier_id.clone(),
            created_at: now,
        };

        sale::insert(&mut tx, &sale).await?;
        item::insert_many(&mut tx, &items).await?;
        payment::upsert_with(&mut tx, PaymentOwner::Sale, &sale.id, PaymentState::Paid).await?;
        cashier::append(
            &mut tx,
            &CashierLogEntry {
                id: new_id(),
                cashier_id: input.cashier_id.clone(),
                action: CashierAction::Sale,
                reference_id: sale.id.clone(),
                amount_cents: sale.total_cents,
                created_at: now,
            },
        )
        .await?;

        tx.commit().await?;

        info!(sale = %sale.id, cashier = %input.cashier_id, total = sale.total_cents, "Walk-up sale recorded");

        Ok(sale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_item, test_db};
    use tindera_core::NewOrder;

    const CASHIER: &str = "cashier-ana";

    async fn pending_order(db: &crate::pool::Database, product_id: &str) -> tindera_core::Order {
        db.engine()
            .create_order(NewOrder {
                customer_name: "Maria Santos".to_string(),
                contact: "0917-555-0101".to_string(),
                address: "12 Mabini St".to_string(),
                place: "Poblacion".to_string(),
                fulfillment: FulfillmentType::Pickup,
                shipping_fee_cents: 0,
                lines: vec![CartLine {
                    product_id: product_id.to_string(),
                    quantity: 2,
                }],
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_settle_moves_order_to_sale() {
        let db = test_db().await;
        let product_id = seed_item(&db, "Canned Tuna", 5000, 10).await;
        let order = pending_order(&db, &product_id).await;

        let sale = db
            .engine()
            .settle_order(&order.id, "maria santos", CASHIER)
            .await
            .unwrap();

        assert_eq!(sale.source_order_id.as_deref(), Some(order.id.as_str()));
        assert_eq!(sale.total_cents, order.total_cents);

        // The order is gone and its items now belong to the sale.
        assert!(db.orders().get_by_id(&order.id).await.unwrap().is_none());
        assert!(db
            .items()
            .for_owner(LineOwner::Order, &order.id)
            .await
            .unwrap()
            .is_empty());
        let sale_items = db.items().for_owner(LineOwner::Sale, &sale.id).await.unwrap();
        assert_eq!(sale_items.len(), 1);
        assert_eq!(sale_items[0].quantity, 2);

        let status = db
            .payments()
            .get(PaymentOwner::Sale, &sale.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status.status, PaymentState::Paid);

        let log = db.cashier_log().for_reference(&sale.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].cashier_id, CASHIER);
        assert_eq!(log[0].amount_cents, sale.total_cents);
    }

    #[tokio::test]
    async fn test_settle_twice_is_a_conflict() {
        let db = test_db().await;
        let product_id = seed_item(&db, "Soap", 2500, 5).await;
        let order = pending_order(&db, &product_id).await;

        db.engine()
            .settle_order(&order.id, "Maria Santos", CASHIER)
            .await
            .unwrap();

        let err = db
            .engine()
            .settle_order(&order.id, "Maria Santos", CASHIER)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_settle_unknown_order_is_not_found() {
        let db = test_db().await;
        let product_id = seed_item(&db, "Soap", 2500, 5).await;

        let err = db
            .engine()
            .settle_order("no-such-order", "Maria Santos", CASHIER)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { entity: "order", .. }));

        // Nothing moved: stock, sales, and the log are all untouched.
        assert_eq!(db.stock().quantity_of(&product_id).await.unwrap(), Some(5));
        assert!(db.sales().list(10).await.unwrap().is_empty());
        assert!(db.cashier_log().list(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settle_wrong_name_is_a_conflict() {
        let db = test_db().await;
        let product_id = seed_item(&db, "Soap", 2500, 5).await;
        let order = pending_order(&db, &product_id).await;

        let err = db
            .engine()
            .settle_order(&order.id, "Juan Cruz", CASHIER)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));

        // Failed settlement leaves the order pending.
        assert!(db.orders().get_by_id(&order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_walk_up_sale_deducts_stock() {
        let db = test_db().await;
        let product_id = seed_item(&db, "Instant Noodles", 1500, 20).await;

        let sale = db
            .engine()
            .settle_walk_up(WalkUpSale {
                customer_name: "Walk-in".to_string(),
                contact: String::new(),
                lines: vec![CartLine {
                    product_id: product_id.clone(),
                    quantity: 6,
                }],
                cashier_id: CASHIER.to_string(),
            })
            .await
            .unwrap();

        assert_eq!(sale.shipping_fee_cents, 0);
        assert_eq!(sale.total_cents, 9000);
        assert!(sale.source_order_id.is_none());
        assert_eq!(db.stock().quantity_of(&product_id).await.unwrap(), Some(14));

        let status = db
            .payments()
            .get(PaymentOwner::Sale, &sale.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status.status, PaymentState::Paid);
    }

    #[tokio::test]
    async fn test_walk_up_insufficient_stock_leaves_no_trace() {
        let db = test_db().await;
        let product_id = seed_item(&db, "Soap", 2500, 2).await;

        let err = db
            .engine()
            .settle_walk_up(WalkUpSale {
                customer_name: "Walk-in".to_string(),
                contact: String::new(),
                lines: vec![CartLine {
                    product_id: product_id.clone(),
                    quantity: 3,
                }],
                cashier_id: CASHIER.to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientStock { .. }));

        assert_eq!(db.stock().quantity_of(&product_id).await.unwrap(), Some(2));
        assert!(db.sales().list(10).await.unwrap().is_empty());
    }
}
