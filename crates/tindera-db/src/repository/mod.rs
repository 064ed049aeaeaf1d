//! # Repository Module
//!
//! Database repository implementations for Tindera POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Each repository struct wraps the pool and serves the READ side and    │
//! │  standalone single-record writes.                                      │
//! │                                                                         │
//! │  The WRITE side of every multi-record fulfillment transition is a      │
//! │  set of pub(crate) functions taking `&mut SqliteConnection`, so the    │
//! │  engine can compose them on ONE transaction:                           │
//! │                                                                         │
//! │      let mut tx = pool.begin().await?;                                 │
//! │      sale::insert(&mut *tx, &sale).await?;                             │
//! │      item::transfer(&mut *tx, ...).await?;                             │
//! │      payment::upsert_with(&mut *tx, ...).await?;                       │
//! │      cashier::append(&mut *tx, &entry).await?;                         │
//! │      order::delete(&mut *tx, &order.id).await?;                        │
//! │      tx.commit().await?;   ← all five records move together            │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place per entity                             │
//! │  • A failed step aborts the whole transition                           │
//! │  • Easy to test against an in-memory database                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cashier;
pub mod delivery;
pub mod item;
pub mod order;
pub mod payment;
pub mod returns;
pub mod sale;
