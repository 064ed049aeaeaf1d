//! # Order Intake
//!
//! Accepting a remote cart as a pending order, verifying the customer at
//! pickup, and cancelling orders that were never fulfilled.
//!
//! Stock is deducted at the moment the order is accepted, inside the same
//! transaction that writes the order row. A cancelled order puts every
//! deducted unit back before its rows disappear.

use chrono::Utc;
use tracing::info;

use crate::engine::{names_match, new_id, Engine, EngineError, EngineResult};
use crate::ledger;
use crate::repository::{delivery, item, order, sale};
use tindera_core::{
    validation, FulfillmentType, LineItem, LineOwner, NewOrder, Order,
};

impl Engine {
    /// Accepts a cart as a pending order, deducting stock atomically.
    ///
    /// The whole operation runs in one transaction: if any cart line cannot
    /// be covered by current stock, nothing is deducted and no order exists.
    pub async fn create_order(&self, input: NewOrder) -> EngineResult<Order> {
        validation::validate_customer_name(&input.customer_name)?;
        validation::validate_cart(&input.lines)?;
        validation::validate_fee_cents(input.shipping_fee_cents)?;

        // Pickup orders carry no shipping fee regardless of what the
        // caller resolved.
        let shipping_fee_cents = match input.fulfillment {
            FulfillmentType::Delivery => input.shipping_fee_cents,
            FulfillmentType::Pickup => 0,
        };

        let mut tx = self.pool().begin().await?;

        let reserved = ledger::reserve_and_deduct(&mut tx, &input.lines).await?;

        let order_id = new_id();
        let now = Utc::now();

        let items: Vec<LineItem> = reserved
            .into_iter()
            .map(|line| LineItem {
                id: new_id(),
                owner_kind: LineOwner::Order,
                owner_id: order_id.clone(),
                product_id: line.product_id,
                name_snapshot: line.name_snapshot,
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
                line_total_cents: line.line_total_cents,
                created_at: now,
            })
            .collect();

        let subtotal_cents: i64 = items.iter().map(|i| i.line_total_cents).sum();

        let order = Order {
            id: order_id,
            customer_name: input.customer_name.trim().to_string(),
            contact: input.contact,
            address: input.address,
            place: input.place,
            fulfillment: input.fulfillment,
            shipping_fee_cents,
            subtotal_cents,
            total_cents: subtotal_cents + shipping_fee_cents,
            created_at: now,
        };

        order::insert(&mut tx, &order).await?;
        item::insert_many(&mut tx, &items).await?;

        tx.commit().await?;

        info!(
            id = %order.id,
            customer = %order.customer_name,
            total = order.total_cents,
            "Order accepted"
        );

        Ok(order)
    }

    /// Cancels a pending order and restores every deducted unit to stock.
    pub async fn cancel_order(&self, order_id: &str) -> EngineResult<()> {
        let mut tx = self.pool().begin().await?;

        let order = match order::get(&mut tx, order_id).await? {
            Some(order) => order,
            None => return Err(missing_order(&mut tx, order_id).await?),
        };

        let items = item::fetch_for_owner(&mut tx, LineOwner::Order, order_id).await?;
        let restock: Vec<(String, i64)> = items
            .iter()
            .map(|i| (i.product_id.clone(), i.quantity))
            .collect();

        ledger::restore(&mut tx, &restock).await?;
        item::delete_for_owner(&mut tx, LineOwner::Order, order_id).await?;

        let deleted = order::delete(&mut tx, order_id).await?;
        if deleted == 0 {
            return Err(EngineError::Conflict(format!(
                "order {order_id} was fulfilled while being cancelled"
            )));
        }

        tx.commit().await?;

        info!(id = %order_id, customer = %order.customer_name, "Order cancelled, stock restored");

        Ok(())
    }

    /// Checks a presented name against the order on record. Used at the
    /// counter before settling a pickup order.
    pub async fn verify_customer(&self, order_id: &str, presented_name: &str) -> EngineResult<Order> {
        validation::validate_customer_name(presented_name)?;

        let mut conn = self.pool().acquire().await?;

        let order = match order::get(&mut conn, order_id).await? {
            Some(order) => order,
            None => return Err(missing_order(&mut conn, order_id).await?),
        };

        if !names_match(&order.customer_name, presented_name) {
            return Err(EngineError::Conflict(format!(
                "presented name does not match order {order_id}"
            )));
        }

        Ok(order)
    }

}

/// Distinguishes an order that never existed from one that already moved
/// on to a sale or a delivery. Runs on the caller's connection so it can
/// participate in an open transaction.
pub(crate) async fn missing_order(
    conn: &mut sqlx::SqliteConnection,
    order_id: &str,
) -> EngineResult<EngineError> {
    if sale::exists_for_source_order(conn, order_id).await? {
        return Ok(EngineError::Conflict(format!(
            "order {order_id} has already been settled"
        )));
    }
    if delivery::exists_for_source_order(conn, order_id).await? {
        return Ok(EngineError::Conflict(format!(
            "order {order_id} has already been dispatched"
        )));
    }

    Ok(EngineError::NotFound {
        entity: "order",
        id: order_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_item, test_db};
    use tindera_core::CartLine;

    fn delivery_order(product_id: &str, quantity: i64, fee: i64) -> NewOrder {
        NewOrder {
            customer_name: "Maria Santos".to_string(),
            contact: "0917-555-0101".to_string(),
            address: "12 Mabini St".to_string(),
            place: "Lamingan".to_string(),
            fulfillment: FulfillmentType::Delivery,
            shipping_fee_cents: fee,
            lines: vec![CartLine {
                product_id: product_id.to_string(),
                quantity,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_order_deducts_stock_and_totals() {
        let db = test_db().await;
        let product_id = seed_item(&db, "Canned Tuna", 5000, 10).await;

        let order = db
            .engine()
            .create_order(delivery_order(&product_id, 3, 7000))
            .await
            .unwrap();

        assert_eq!(order.subtotal_cents, 15_000);
        assert_eq!(order.total_cents, 22_000);
        assert_eq!(db.stock().quantity_of(&product_id).await.unwrap(), Some(7));

        let items = db
            .items()
            .for_owner(LineOwner::Order, &order.id)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name_snapshot, "Canned Tuna");
    }

    #[tokio::test]
    async fn test_pickup_order_has_no_shipping_fee() {
        let db = test_db().await;
        let product_id = seed_item(&db, "Soap", 2500, 5).await;

        let mut input = delivery_order(&product_id, 1, 7000);
        input.fulfillment = FulfillmentType::Pickup;

        let order = db.engine().create_order(input).await.unwrap();

        assert_eq!(order.shipping_fee_cents, 0);
        assert_eq!(order.total_cents, 2500);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rejects_whole_order() {
        let db = test_db().await;
        let tuna = seed_item(&db, "Canned Tuna", 5000, 10).await;
        let soap = seed_item(&db, "Soap", 2500, 1).await;

        let input = NewOrder {
            lines: vec![
                CartLine {
                    product_id: tuna.clone(),
                    quantity: 2,
                },
                CartLine {
                    product_id: soap.clone(),
                    quantity: 5,
                },
            ],
            ..delivery_order(&tuna, 1, 5000)
        };

        let err = db.engine().create_order(input).await.unwrap_err();
        assert!(matches!(err, EngineError::InsufficientStock { .. }));

        // First line's deduction rolled back with the transaction.
        assert_eq!(db.stock().quantity_of(&tuna).await.unwrap(), Some(10));
        assert_eq!(db.stock().quantity_of(&soap).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_concurrent_orders_never_oversell() {
        let db = test_db().await;
        let product_id = seed_item(&db, "Last Unit", 9900, 1).await;

        let engine = db.engine();
        let (a, b) = tokio::join!(
            engine.create_order(delivery_order(&product_id, 1, 5000)),
            engine.create_order(delivery_order(&product_id, 1, 5000)),
        );

        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);
        assert_eq!(db.stock().quantity_of(&product_id).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_and_removes_order() {
        let db = test_db().await;
        let product_id = seed_item(&db, "Rice 5kg", 30_000, 4).await;

        let order = db
            .engine()
            .create_order(delivery_order(&product_id, 4, 5000))
            .await
            .unwrap();
        assert_eq!(db.stock().quantity_of(&product_id).await.unwrap(), Some(0));

        db.engine().cancel_order(&order.id).await.unwrap();

        assert_eq!(db.stock().quantity_of(&product_id).await.unwrap(), Some(4));
        assert!(db.orders().get_by_id(&order.id).await.unwrap().is_none());
        assert!(db
            .items()
            .for_owner(LineOwner::Order, &order.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_cancel_unknown_order_is_not_found() {
        let db = test_db().await;

        let err = db.engine().cancel_order("no-such-order").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { entity: "order", .. }));
    }

    #[tokio::test]
    async fn test_verify_customer_name_mismatch() {
        let db = test_db().await;
        let product_id = seed_item(&db, "Soap", 2500, 5).await;

        let order = db
            .engine()
            .create_order(delivery_order(&product_id, 1, 5000))
            .await
            .unwrap();

        let verified = db
            .engine()
            .verify_customer(&order.id, "  MARIA santos ")
            .await
            .unwrap();
        assert_eq!(verified.id, order.id);

        let err = db
            .engine()
            .verify_customer(&order.id, "Juan Cruz")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let db = test_db().await;

        let input = NewOrder {
            lines: vec![],
            ..delivery_order("unused", 1, 5000)
        };

        let err = db.engine().create_order(input).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
