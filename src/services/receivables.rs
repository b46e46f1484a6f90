use crate::{
    entities::{order, receivable},
    errors::ServiceError,
};
use chrono::{Duration, Utc};
use rust_decimal::prelude::*;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Splits a total into `n` installment amounts rounded to cents, half up.
/// The last installment absorbs the rounding remainder so the sum always
/// equals the total.
pub fn installment_amounts(total: Decimal, n: i32) -> Vec<Decimal> {
    let n = n.max(1);
    let base = (total / Decimal::from(n))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let mut amounts = vec![base; n as usize];
    let last = total - base * Decimal::from(n - 1);
    amounts[n as usize - 1] = last.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    amounts
}

#[derive(Clone)]
pub struct ReceivableService {
    db: Arc<DatabaseConnection>,
}

impl ReceivableService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Writes the receivable entries for an approved order. A single-shot
    /// payment falls due on the approval day; installment `i` of a plan
    /// falls due 30 * i days later. Runs on the caller's connection so the
    /// status transition and its ledger entries commit together.
    #[instrument(skip(conn, order))]
    pub async fn record_for_order<C>(
        conn: &C,
        order: &order::Model,
    ) -> Result<Vec<receivable::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let approval_date = Utc::now().date_naive();
        let amounts = installment_amounts(order.total, order.installments);
        let single = amounts.len() == 1;

        let mut entries = Vec::with_capacity(amounts.len());
        for (idx, amount) in amounts.into_iter().enumerate() {
            let installment = idx as i32 + 1;
            let due_date = if single {
                approval_date
            } else {
                approval_date + Duration::days(30 * installment as i64)
            };

            let entry = receivable::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                installment: Set(installment),
                due_date: Set(due_date),
                amount: Set(amount),
                created_at: Set(Utc::now()),
            }
            .insert(conn)
            .await?;
            entries.push(entry);
        }

        info!(
            "Recorded {} receivable(s) for order {}",
            entries.len(),
            order.order_number
        );
        Ok(entries)
    }

    pub async fn list_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<receivable::Model>, ServiceError> {
        order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let entries = receivable::Entity::find()
            .filter(receivable::Column::OrderId.eq(order_id))
            .order_by_asc(receivable::Column::Installment)
            .all(&*self.db)
            .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(100.00), 3)]
    #[case(dec!(200.00), 7)]
    #[case(dec!(99.90), 1)]
    #[case(dec!(1234.56), 12)]
    #[case(dec!(0.01), 2)]
    fn installments_always_sum_to_total(#[case] total: Decimal, #[case] n: i32) {
        let amounts = installment_amounts(total, n);
        assert_eq!(amounts.len(), n.max(1) as usize);
        let sum: Decimal = amounts.iter().sum();
        assert_eq!(sum, total);
    }

    #[test]
    fn single_installment_is_the_total() {
        assert_eq!(installment_amounts(dec!(150.00), 1), vec![dec!(150.00)]);
    }

    #[test]
    fn even_split_has_equal_installments() {
        assert_eq!(
            installment_amounts(dec!(300.00), 3),
            vec![dec!(100.00), dec!(100.00), dec!(100.00)]
        );
    }

    #[test]
    fn last_installment_absorbs_rounding_remainder() {
        let amounts = installment_amounts(dec!(100.00), 3);
        assert_eq!(amounts, vec![dec!(33.33), dec!(33.33), dec!(33.34)]);
        let sum: Decimal = amounts.iter().sum();
        assert_eq!(sum, dec!(100.00));
    }

    #[test]
    fn remainder_can_shrink_the_last_installment() {
        // 200.00 / 7 = 28.571... -> 28.57, last = 200 - 6 * 28.57 = 28.58.
        let amounts = installment_amounts(dec!(200.00), 7);
        assert_eq!(amounts[0], dec!(28.57));
        assert_eq!(amounts[6], dec!(28.58));
        let sum: Decimal = amounts.iter().sum();
        assert_eq!(sum, dec!(200.00));
    }

    #[test]
    fn non_positive_count_falls_back_to_one() {
        assert_eq!(installment_amounts(dec!(99.90), 0), vec![dec!(99.90)]);
    }
}
