//! Inventory ledger: the only place `available_quantity` is recomputed.
//!
//! Every transition yields a [`LedgerEntry`]; posting it against the locked
//! equipment row gives the new available count. Approve reserves
//! (`-quantity`), a return releases (`+returned_now`), decline posts nothing.
//! Keeping the deltas paired with transitions maintains, for every equipment:
//!
//! ```text
//! total_quantity - available_quantity
//!     == Σ (quantity - returned_quantity) over APPROVED / PARTIALLY_RETURNED requests
//! ```

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{equipment::Equipment, request::BorrowRequest},
};

/// Signed adjustment of an equipment's available units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    pub equipment_id: Uuid,
    pub delta: i32,
}

impl LedgerEntry {
    pub fn reserve(equipment_id: Uuid, quantity: i32) -> Self {
        Self {
            equipment_id,
            delta: -quantity,
        }
    }

    pub fn release(equipment_id: Uuid, quantity: i32) -> Self {
        Self {
            equipment_id,
            delta: quantity,
        }
    }

    pub fn empty(equipment_id: Uuid) -> Self {
        Self {
            equipment_id,
            delta: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.delta == 0
    }

    /// New available count after posting this entry to `equipment`.
    ///
    /// Guards have already run at this point, so a result outside
    /// `0..=total_quantity` means the stored counts were inconsistent.
    pub fn post(&self, equipment: &Equipment) -> AppResult<i32> {
        if equipment.id != self.equipment_id {
            return Err(AppError::Internal(format!(
                "Ledger entry for equipment {} posted to {}",
                self.equipment_id, equipment.id
            )));
        }

        let available = equipment
            .available_quantity
            .checked_add(self.delta)
            .filter(|a| (0..=equipment.total_quantity).contains(a))
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Inventory for {} out of range: {} available of {}, adjustment {}",
                    equipment.name,
                    equipment.available_quantity,
                    equipment.total_quantity,
                    self.delta
                ))
            })?;

        Ok(available)
    }
}

/// Available count after an administrator changes the physical total.
///
/// Units on loan stay on loan; the total may not drop below them.
pub fn rebase_total(equipment: &Equipment, new_total: i32) -> AppResult<i32> {
    if new_total < 0 {
        return Err(AppError::Validation(
            "Total quantity must not be negative".to_string(),
        ));
    }

    let on_loan = equipment.on_loan().max(0);
    if new_total < on_loan {
        return Err(AppError::Validation(format!(
            "Cannot set total quantity of {} to {}: {} unit(s) are on loan",
            equipment.name, new_total, on_loan
        )));
    }

    Ok(new_total - on_loan)
}

/// Units that `requests` hold against `equipment_id`
pub fn outstanding<'a, I>(equipment_id: Uuid, requests: I) -> i64
where
    I: IntoIterator<Item = &'a BorrowRequest>,
{
    requests
        .into_iter()
        .filter(|r| r.equipment_id == equipment_id)
        .map(|r| i64::from(r.on_loan()))
        .sum()
}

/// Whether `equipment` satisfies the reconciliation invariant against `requests`
pub fn is_reconciled<'a, I>(equipment: &Equipment, requests: I) -> bool
where
    I: IntoIterator<Item = &'a BorrowRequest>,
{
    i64::from(equipment.on_loan()) == outstanding(equipment.id, requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::request::RequestStatus;

    fn equipment(total: i32, available: i32) -> Equipment {
        let now = Utc::now();
        Equipment {
            id: Uuid::new_v4(),
            name: "CAMERA".to_string(),
            total_quantity: total,
            available_quantity: available,
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn request(equipment_id: Uuid, quantity: i32, returned: i32, status: RequestStatus) -> BorrowRequest {
        let now = Utc::now();
        BorrowRequest {
            id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            equipment_id,
            equipment_type: "CAMERA".to_string(),
            quantity,
            returned_quantity: returned,
            status,
            purpose: String::new(),
            campus: String::new(),
            pickup_date: now,
            return_date: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_post_reserve_and_release() {
        let e = equipment(10, 10);
        assert_eq!(LedgerEntry::reserve(e.id, 4).post(&e).unwrap(), 6);

        let e = equipment(10, 6);
        assert_eq!(LedgerEntry::release(e.id, 3).post(&e).unwrap(), 9);
        assert_eq!(LedgerEntry::empty(e.id).post(&e).unwrap(), 6);
    }

    #[test]
    fn test_post_out_of_range() {
        let e = equipment(10, 2);
        assert!(matches!(
            LedgerEntry::reserve(e.id, 3).post(&e),
            Err(AppError::Internal(_))
        ));
        assert!(matches!(
            LedgerEntry::release(e.id, 9).post(&e),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_post_wrong_equipment() {
        let e = equipment(10, 10);
        assert!(LedgerEntry::reserve(Uuid::new_v4(), 1).post(&e).is_err());
    }

    #[test]
    fn test_rebase_total() {
        let e = equipment(10, 6);
        assert_eq!(rebase_total(&e, 12).unwrap(), 8);
        assert_eq!(rebase_total(&e, 4).unwrap(), 0);
        assert!(matches!(rebase_total(&e, 3), Err(AppError::Validation(_))));
        assert!(rebase_total(&e, -1).is_err());
    }

    #[test]
    fn test_outstanding_counts_only_open_loans() {
        let e = equipment(20, 13);
        let other = Uuid::new_v4();
        let requests = vec![
            request(e.id, 4, 0, RequestStatus::Approved),
            request(e.id, 5, 2, RequestStatus::PartiallyReturned),
            request(e.id, 3, 3, RequestStatus::Returned),
            request(e.id, 9, 0, RequestStatus::Pending),
            request(e.id, 2, 0, RequestStatus::Declined),
            request(other, 7, 0, RequestStatus::Approved),
        ];
        assert_eq!(outstanding(e.id, &requests), 7);
        assert!(is_reconciled(&e, &requests));
        assert!(!is_reconciled(&equipment(20, 14), &requests));
    }
}
