//! # Delivery Dispatch
//!
//! Handing a pending delivery order to a rider. The order row disappears,
//! a delivery consignment appears with the same line items, and a
//! cash-on-delivery payment record opens as unpaid.

use chrono::Utc;
use tracing::info;

use crate::engine::{intake, new_id, Engine, EngineError, EngineResult};
use crate::repository::{cashier, delivery, item, order, payment};
use tindera_core::{
    validation, CashierAction, CashierLogEntry, Delivery, DeliveryStatus, FulfillmentType,
    LineOwner, PaymentOwner, PaymentState, COD_PAYMENT_LABEL,
};

impl Engine {
    /// Dispatches a pending delivery order to a rider.
    ///
    /// The rider may be assigned later; dispatch without one leaves the
    /// consignment pending with no rider on record.
    pub async fn dispatch_order(
        &self,
        order_id: &str,
        rider: Option<String>,
        staff_id: &str,
    ) -> EngineResult<Delivery> {
        validation::validate_staff_id(staff_id)?;
        if let Some(rider) = &rider {
            validation::validate_staff_id(rider)?;
        }

        let mut tx = self.pool().begin().await?;

        let order = match order::get(&mut tx, order_id).await? {
            Some(order) => order,
            None => return Err(intake::missing_order(&mut tx, order_id).await?),
        };

        if order.fulfillment != FulfillmentType::Delivery {
            return Err(EngineError::Conflict(format!(
                "order {order_id} is for pickup, not delivery"
            )));
        }

        let now = Utc::now();
        let consignment = Delivery {
            id: new_id(),
            source_order_id: order.id.clone(),
            customer_name: order.customer_name.clone(),
            contact: order.contact.clone(),
            address: order.address.clone(),
            place: order.place.clone(),
            status: DeliveryStatus::Pending,
            rider,
            payment_label: COD_PAYMENT_LABEL.to_string(),
            shipping_fee_cents: order.shipping_fee_cents,
            subtotal_cents: order.subtotal_cents,
            total_cents: order.total_cents,
            created_at: now,
            updated_at: now,
        };

        delivery::insert(&mut tx, &consignment).await?;
        item::transfer(
            &mut tx,
            LineOwner::Order,
            &order.id,
            LineOwner::Delivery,
            &consignment.id,
        )
        .await?;

        let deleted = order::delete(&mut tx, &order.id).await?;
        if deleted == 0 {
            return Err(EngineError::Conflict(format!(
                "order {order_id} was fulfilled while being dispatched"
            )));
        }

        // Cash on delivery: nothing collected until the rider comes back.
        payment::upsert_with(
            &mut tx,
            PaymentOwner::Delivery,
            &consignment.id,
            PaymentState::Unpaid,
        )
        .await?;

        cashier::append(
            &mut tx,
            &CashierLogEntry {
                id: new_id(),
                cashier_id: staff_id.to_string(),
                action: CashierAction::Dispatch,
                reference_id: consignment.id.clone(),
                amount_cents: consignment.total_cents,
                created_at: now,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            delivery = %consignment.id,
            order = %order_id,
            rider = consignment.rider.as_deref().unwrap_or("unassigned"),
            "Order dispatched"
        );

        Ok(consignment)
    }
}
