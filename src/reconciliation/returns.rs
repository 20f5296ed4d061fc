//! Partial-return arithmetic.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::request::RequestStatus,
};

/// Result of accumulating a return onto a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accumulated {
    pub returned_quantity: i32,
    pub status: RequestStatus,
}

impl Accumulated {
    pub fn remaining(&self, quantity: i32) -> i32 {
        quantity - self.returned_quantity
    }
}

/// Add `returned_now` units to a request that has `returned` of `quantity`
/// units back, classifying the outcome.
pub fn accumulate(
    request_id: Uuid,
    quantity: i32,
    returned: i32,
    returned_now: i32,
) -> AppResult<Accumulated> {
    if returned_now <= 0 {
        return Err(AppError::Validation(format!(
            "Returned quantity for request {} must be positive, got {}",
            request_id, returned_now
        )));
    }

    let over_return = || AppError::OverReturn {
        id: request_id,
        quantity,
        returned,
        returned_now,
    };

    let returned_quantity = returned.checked_add(returned_now).ok_or_else(over_return)?;
    if returned_quantity > quantity {
        return Err(over_return());
    }

    let status = if returned_quantity == quantity {
        RequestStatus::Returned
    } else {
        RequestStatus::PartiallyReturned
    };

    Ok(Accumulated {
        returned_quantity,
        status,
    })
}
