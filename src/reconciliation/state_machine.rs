//! Borrow request state machine.
//!
//! ```text
//! PENDING ──approve──> APPROVED ──return(partial)──> PARTIALLY_RETURNED ──return(rest)──> RETURNED
//!    │                     │                               │    ▲
//!    │                     │                               └────┘ return(partial)
//!    │                     └──────return(all)─────────────────────────────────────────> RETURNED
//!    └──decline──> DECLINED
//! ```
//!
//! Guards are evaluated against rows the caller has locked; the returned
//! [`Transition`] carries both the new request state and the ledger entry
//! that must be written in the same transaction.

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::Equipment,
        request::{BorrowRequest, RequestStatus},
    },
};

use super::{ledger::LedgerEntry, returns};

/// A guarded, not yet persisted, state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub returned_quantity: i32,
    pub ledger: LedgerEntry,
}

impl Transition {
    /// Apply the new state to an in-memory copy of the request
    pub fn apply(&self, request: &mut BorrowRequest) {
        request.status = self.to;
        request.returned_quantity = self.returned_quantity;
    }
}

/// Edges of the state machine
pub fn can_transition(from: RequestStatus, to: RequestStatus) -> bool {
    use RequestStatus::*;
    matches!(
        (from, to),
        (Pending, Approved)
            | (Pending, Declined)
            | (Approved, PartiallyReturned)
            | (Approved, Returned)
            | (PartiallyReturned, PartiallyReturned)
            | (PartiallyReturned, Returned)
    )
}

fn require(request: &BorrowRequest, to: RequestStatus, expected: &'static str) -> AppResult<()> {
    if can_transition(request.status, to) {
        Ok(())
    } else {
        Err(AppError::InvalidState {
            id: request.id,
            current: request.status,
            expected,
        })
    }
}

/// PENDING → APPROVED, reserving `quantity` units
pub fn approve(request: &BorrowRequest, equipment: &Equipment) -> AppResult<Transition> {
    require(request, RequestStatus::Approved, "PENDING")?;

    if request.equipment_id != equipment.id {
        return Err(AppError::Internal(format!(
            "Request {} references equipment {}, got {}",
            request.id, request.equipment_id, equipment.id
        )));
    }

    if equipment.available_quantity < request.quantity {
        return Err(AppError::InsufficientInventory {
            equipment: equipment.name.clone(),
            available: equipment.available_quantity,
            requested: request.quantity,
        });
    }

    Ok(Transition {
        from: request.status,
        to: RequestStatus::Approved,
        returned_quantity: request.returned_quantity,
        ledger: LedgerEntry::reserve(equipment.id, request.quantity),
    })
}

/// PENDING → DECLINED; nothing was reserved so nothing is released
pub fn decline(request: &BorrowRequest) -> AppResult<Transition> {
    require(request, RequestStatus::Declined, "PENDING")?;

    Ok(Transition {
        from: request.status,
        to: RequestStatus::Declined,
        returned_quantity: request.returned_quantity,
        ledger: LedgerEntry::empty(request.equipment_id),
    })
}

/// APPROVED | PARTIALLY_RETURNED → PARTIALLY_RETURNED | RETURNED, releasing `returned_now` units
pub fn record_return(request: &BorrowRequest, returned_now: i32) -> AppResult<Transition> {
    if !request.status.is_outstanding() {
        return Err(AppError::InvalidState {
            id: request.id,
            current: request.status,
            expected: "APPROVED or PARTIALLY_RETURNED",
        });
    }

    let accumulated = returns::accumulate(
        request.id,
        request.quantity,
        request.returned_quantity,
        returned_now,
    )?;
    debug_assert!(can_transition(request.status, accumulated.status));

    Ok(Transition {
        from: request.status,
        to: accumulated.status,
        returned_quantity: accumulated.returned_quantity,
        ledger: LedgerEntry::release(request.equipment_id, returned_now),
    })
}
