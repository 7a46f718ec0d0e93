use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{product, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Attempts before a contended deduction gives up.
const MAX_CAS_ATTEMPTS: u32 = 5;

/// Product stock writes. The stock column is the one piece of shared state
/// concurrent submissions fight over, so every write goes through the
/// compare-and-set loop below.
#[derive(Clone)]
pub struct StockService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl StockService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    /// Deducts `quantity` units from the product's stock, flooring at
    /// zero. NULL stock reads as zero available.
    ///
    /// The write only lands when the stock column still holds the value
    /// that was read; a concurrent submission that got there first makes
    /// the update match zero rows, and this attempt re-reads and retries.
    /// Returns the remaining stock.
    #[instrument(skip(self))]
    pub async fn deduct(&self, product_id: Uuid, quantity: i32) -> Result<i32, ServiceError> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let current = Product::find_by_id(product_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", product_id))
                })?
                .stock;

            let available = current.unwrap_or(0);
            let remaining = (available - quantity).max(0);

            let mut update = Product::update_many()
                .col_expr(product::Column::Stock, Expr::value(remaining))
                .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(product::Column::Id.eq(product_id));
            update = match current {
                Some(read) => update.filter(product::Column::Stock.eq(read)),
                None => update.filter(product::Column::Stock.is_null()),
            };

            let result = update.exec(&*self.db).await?;
            if result.rows_affected == 1 {
                self.emit(product_id, available, remaining).await;
                return Ok(remaining);
            }
            warn!(%product_id, attempt, "stock write contended, retrying");
        }
        Err(ServiceError::InternalError(format!(
            "Stock update for product {} did not settle after {} attempts",
            product_id, MAX_CAS_ATTEMPTS
        )))
    }

    async fn emit(&self, product_id: Uuid, previous: i32, remaining: i32) {
        let Some(sender) = &self.event_sender else {
            return;
        };
        let event = if remaining == 0 {
            Event::StockDepleted { product_id }
        } else {
            Event::StockDeducted {
                product_id,
                previous,
                remaining,
            }
        };
        if let Err(error) = sender.send(event).await {
            warn!(%product_id, error, "failed to send stock event");
        }
    }
}
