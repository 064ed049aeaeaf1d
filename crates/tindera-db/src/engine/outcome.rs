//! # Delivery Outcomes
//!
//! Resolving a consignment once the rider reports back, plus the small
//! in-flight updates (status, rider) that happen before then.
//!
//! A successful delivery becomes a completed sale with its own copy of the
//! line items; the consignment is retained as history. A failed delivery
//! opens a return record and leaves stock untouched until staff physically
//! receive the goods back and restock them.

use chrono::Utc;
use tracing::info;

use crate::engine::{new_id, Engine, EngineError, EngineResult};
use crate::repository::{cashier, delivery, item, payment, returns, sale};
use tindera_core::{
    validation, CashierAction, CashierLogEntry, Delivery, DeliveryStatus, FulfillmentType,
    LineItem, LineOwner, PaymentOwner, PaymentState, ReturnRecord, Sale,
};

impl Engine {
    /// Resolves a delivery as handed over and paid.
    ///
    /// Creates the completed sale, copies the consignment's line items onto
    /// it, marks both payment records paid, and clears any return record
    /// from an earlier failed attempt. Calling this on a delivery that is
    /// already delivered returns the existing sale unchanged.
    pub async fn mark_delivered(&self, delivery_id: &str, staff_id: &str) -> EngineResult<Sale> {
        validation::validate_staff_id(staff_id)?;

        let mut tx = self.pool().begin().await?;

        let consignment = match delivery::get(&mut tx, delivery_id).await? {
            Some(consignment) => consignment,
            None => {
                return Err(EngineError::NotFound {
                    entity: "delivery",
                    id: delivery_id.to_string(),
                })
            }
        };

        if consignment.status == DeliveryStatus::Delivered {
            return match sale::get_by_source_delivery(&mut tx, delivery_id).await? {
                Some(existing) => Ok(existing),
                None => Err(EngineError::Conflict(format!(
                    "delivery {delivery_id} is marked delivered but has no sale on record"
                ))),
            };
        }

        let now = Utc::now();
        delivery::set_status(&mut tx, delivery_id, DeliveryStatus::Delivered, now).await?;

        let completed = Sale {
            id: new_id(),
            source_order_id: Some(consignment.source_order_id.clone()),
            source_delivery_id: Some(consignment.id.clone()),
            customer_name: consignment.customer_name.clone(),
            contact: consignment.contact.clone(),
            fulfillment: FulfillmentType::Delivery,
            shipping_fee_cents: consignment.shipping_fee_cents,
            subtotal_cents: consignment.subtotal_cents,
            total_cents: consignment.total_cents,
            cashier_id: staff_id.to_string(),
            created_at: now,
        };

        sale::insert(&mut tx, &completed).await?;

        // The consignment keeps its own line items as dispatch history;
        // the sale gets fresh copies.
        let source_items =
            item::fetch_for_owner(&mut tx, LineOwner::Delivery, delivery_id).await?;
        let copies: Vec<LineItem> = source_items
            .into_iter()
            .map(|line| LineItem {
                id: new_id(),
                owner_kind: LineOwner::Sale,
                owner_id: completed.id.clone(),
                created_at: now,
                ..line
            })
            .collect();
        item::insert_many(&mut tx, &copies).await?;

        payment::upsert_with(&mut tx, PaymentOwner::Sale, &completed.id, PaymentState::Paid)
            .await?;
        payment::upsert_with(
            &mut tx,
            PaymentOwner::Delivery,
            delivery_id,
            PaymentState::Paid,
        )
        .await?;

        // A successful re-delivery supersedes the failed attempt.
        returns::delete_for_delivery(&mut tx, delivery_id).await?;

        cashier::append(
            &mut tx,
            &CashierLogEntry {
                id: new_id(),
                cashier_id: staff_id.to_string(),
                action: CashierAction::Sale,
                reference_id: completed.id.clone(),
                amount_cents: completed.total_cents,
                created_at: now,
            },
        )
        .await?;

        tx.commit().await?;

        info!(delivery = %delivery_id, sale = %completed.id, "Delivery completed");

        Ok(completed)
    }

    /// Resolves a delivery as failed, opening a return record.
    ///
    /// Stock is not restored here. The goods are still in the rider's hands;
    /// staff restock them through the stock endpoints once they are
    /// physically back on the shelf.
    pub async fn mark_not_delivered(
        &self,
        delivery_id: &str,
        reason: &str,
        staff_id: &str,
    ) -> EngineResult<ReturnRecord> {
        validation::validate_staff_id(staff_id)?;

        let mut tx = self.pool().begin().await?;

        let consignment = match delivery::get(&mut tx, delivery_id).await? {
            Some(consignment) => consignment,
            None => {
                return Err(EngineError::NotFound {
                    entity: "delivery",
                    id: delivery_id.to_string(),
                })
            }
        };

        match consignment.status {
            DeliveryStatus::Delivered => {
                return Err(EngineError::Conflict(format!(
                    "delivery {delivery_id} was already completed"
                )))
            }
            DeliveryStatus::NotDelivered => {
                return Err(EngineError::Conflict(format!(
                    "delivery {delivery_id} is already marked not delivered"
                )))
            }
            DeliveryStatus::Pending | DeliveryStatus::OnTheWay => {}
        }

        let now = Utc::now();
        delivery::set_status(&mut tx, delivery_id, DeliveryStatus::NotDelivered, now).await?;

        let payment_state = payment::get_with(&mut tx, PaymentOwner::Delivery, delivery_id)
            .await?
            .map(|p| p.status)
            .unwrap_or(PaymentState::Unpaid);

        let record = ReturnRecord {
            id: new_id(),
            delivery_id: consignment.id.clone(),
            customer_name: consignment.customer_name.clone(),
            address: consignment.address.clone(),
            total_cents: consignment.total_cents,
            payment_status: payment_state,
            reason: reason.trim().to_string(),
            staff_id: staff_id.to_string(),
            created_at: now,
        };

        returns::insert(&mut tx, &record).await?;

        tx.commit().await?;

        info!(delivery = %delivery_id, reason = %record.reason, "Delivery failed, return recorded");

        Ok(record)
    }

    /// Moves an unresolved delivery between the in-flight statuses.
    pub async fn update_delivery_status(
        &self,
        delivery_id: &str,
        status: DeliveryStatus,
    ) -> EngineResult<Delivery> {
        if status.is_resolved() {
            return Err(EngineError::Conflict(
                "delivered and not_delivered are set through the outcome operations".to_string(),
            ));
        }

        let mut tx = self.pool().begin().await?;

        let consignment = self.unresolved(&mut tx, delivery_id).await?;

        let now = Utc::now();
        delivery::set_status(&mut tx, delivery_id, status, now).await?;

        tx.commit().await?;

        Ok(Delivery {
            status,
            updated_at: now,
            ..consignment
        })
    }

    /// Assigns or replaces the rider on an unresolved delivery.
    pub async fn assign_rider(&self, delivery_id: &str, rider: &str) -> EngineResult<Delivery> {
        validation::validate_staff_id(rider)?;

        let mut tx = self.pool().begin().await?;

        let consignment = self.unresolved(&mut tx, delivery_id).await?;

        let now = Utc::now();
        delivery::set_rider(&mut tx, delivery_id, rider.trim(), now).await?;

        tx.commit().await?;

        Ok(Delivery {
            rider: Some(rider.trim().to_string()),
            updated_at: now,
            ..consignment
        })
    }

    async fn unresolved(
        &self,
        conn: &mut sqlx::SqliteConnection,
        delivery_id: &str,
    ) -> EngineResult<Delivery> {
        let consignment = match delivery::get(conn, delivery_id).await? {
            Some(consignment) => consignment,
            None => {
                return Err(EngineError::NotFound {
                    entity: "delivery",
                    id: delivery_id.to_string(),
                })
            }
        };

        if consignment.status.is_resolved() {
            return Err(EngineError::Conflict(format!(
                "delivery {delivery_id} is already resolved as {}",
                consignment.status
            )));
        }

        Ok(consignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_item, test_db};
    use tindera_core::{CartLine, NewOrder};

    const STAFF: &str = "cashier-ana";

    async fn dispatched(db: &crate::pool::Database) -> Delivery {
        let product_id = seed_item(db, "Rice 5kg", 25_000, 10).await;
        let order = db
            .engine()
            .create_order(NewOrder {
                customer_name: "Maria Santos".to_string(),
                contact: "0917-555-0101".to_string(),
                address: "12 Mabini St".to_string(),
                place: "Lamingan".to_string(),
                fulfillment: FulfillmentType::Delivery,
                shipping_fee_cents: 7000,
                lines: vec![CartLine {
                    product_id,
                    quantity: 2,
                }],
            })
            .await
            .unwrap();

        db.engine()
            .dispatch_order(&order.id, Some("rider-jo".to_string()), STAFF)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_delivered_creates_sale_and_keeps_history() {
        let db = test_db().await;
        let consignment = dispatched(&db).await;

        let sale = db
            .engine()
            .mark_delivered(&consignment.id, STAFF)
            .await
            .unwrap();

        assert_eq!(sale.source_delivery_id.as_deref(), Some(consignment.id.as_str()));
        assert_eq!(sale.total_cents, 57_000);

        // Both the sale and the retained consignment carry a full item set.
        let sale_items = db.items().for_owner(LineOwner::Sale, &sale.id).await.unwrap();
        let delivery_items = db
            .items()
            .for_owner(LineOwner::Delivery, &consignment.id)
            .await
            .unwrap();
        assert_eq!(sale_items.len(), 1);
        assert_eq!(delivery_items.len(), 1);
        assert_ne!(sale_items[0].id, delivery_items[0].id);

        let retained = db
            .deliveries()
            .get_by_id(&consignment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retained.status, DeliveryStatus::Delivered);

        for (owner, id) in [
            (PaymentOwner::Sale, sale.id.as_str()),
            (PaymentOwner::Delivery, consignment.id.as_str()),
        ] {
            let status = db.payments().get(owner, id).await.unwrap().unwrap();
            assert_eq!(status.status, PaymentState::Paid);
        }
    }

    #[tokio::test]
    async fn test_mark_delivered_is_idempotent() {
        let db = test_db().await;
        let consignment = dispatched(&db).await;

        let first = db
            .engine()
            .mark_delivered(&consignment.id, STAFF)
            .await
            .unwrap();
        let second = db
            .engine()
            .mark_delivered(&consignment.id, STAFF)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(db.sales().list(10).await.unwrap().len(), 1);
        assert_eq!(db.cashier_log().for_reference(&first.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_not_delivered_opens_return_without_restock() {
        let db = test_db().await;
        let consignment = dispatched(&db).await;

        let record = db
            .engine()
            .mark_not_delivered(&consignment.id, "customer not home", STAFF)
            .await
            .unwrap();

        assert_eq!(record.delivery_id, consignment.id);
        assert_eq!(record.total_cents, 57_000);
        assert_eq!(record.payment_status, PaymentState::Unpaid);
        assert_eq!(record.reason, "customer not home");

        // Stock stays deducted until the goods come back physically.
        let items = db
            .items()
            .for_owner(LineOwner::Delivery, &consignment.id)
            .await
            .unwrap();
        let qty = db
            .stock()
            .quantity_of(&items[0].product_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(qty, 8);

        let err = db
            .engine()
            .mark_not_delivered(&consignment.id, "again", STAFF)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_redelivery_clears_return_record() {
        let db = test_db().await;
        let consignment = dispatched(&db).await;

        db.engine()
            .mark_not_delivered(&consignment.id, "customer not home", STAFF)
            .await
            .unwrap();
        assert!(db
            .returns()
            .get_for_delivery(&consignment.id)
            .await
            .unwrap()
            .is_some());

        db.engine().mark_delivered(&consignment.id, STAFF).await.unwrap();

        assert!(db
            .returns()
            .get_for_delivery(&consignment.id)
            .await
            .unwrap()
            .is_none());
        assert!(db.returns().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_updates_only_in_flight() {
        let db = test_db().await;
        let consignment = dispatched(&db).await;

        let updated = db
            .engine()
            .update_delivery_status(&consignment.id, DeliveryStatus::OnTheWay)
            .await
            .unwrap();
        assert_eq!(updated.status, DeliveryStatus::OnTheWay);

        let err = db
            .engine()
            .update_delivery_status(&consignment.id, DeliveryStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));

        db.engine().mark_delivered(&consignment.id, STAFF).await.unwrap();

        let err = db
            .engine()
            .update_delivery_status(&consignment.id, DeliveryStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_assign_rider_on_resolved_delivery_fails() {
        let db = test_db().await;
        let consignment = dispatched(&db).await;

        let updated = db
            .engine()
            .assign_rider(&consignment.id, "rider-mel")
            .await
            .unwrap();
        assert_eq!(updated.rider.as_deref(), Some("rider-mel"));

        db.engine().mark_delivered(&consignment.id, STAFF).await.unwrap();

        let err = db
            .engine()
            .assign_rider(&consignment.id, "rider-mel")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }
}
