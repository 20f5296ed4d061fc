//! Post-commit notifications for request lifecycle events.
//!
//! Every method is fire-and-log: delivery failures are reported at `warn`
//! and never propagate, since the transaction they describe has already
//! committed.

use std::sync::Arc;

use crate::models::{request::BorrowRequest, user::UserShort};

use super::{
    email::{Mailer, OutgoingEmail},
    lending::{ApprovalOutcome, DeclineOutcome, ReturnItemResult, ReturnsOutcome},
};

const DATE_FORMAT: &str = "%A, %B %-d, %Y";

#[derive(Clone)]
pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    admin_emails: Vec<String>,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn Mailer>, admin_emails: Vec<String>) -> Self {
        Self {
            mailer,
            admin_emails,
        }
    }

    pub async fn request_submitted(&self, request: &BorrowRequest, user: &UserShort) {
        self.deliver(render_submitted_user(request, user)).await;
        self.deliver(render_submitted_admin(request, user, &self.admin_emails))
            .await;
    }

    pub async fn request_approved(&self, outcome: &ApprovalOutcome) {
        let Some(user) = &outcome.user else {
            tracing::warn!(request_id = %outcome.request.id, "No contact for approved request");
            return;
        };
        let email = render_decision(&outcome.request, user, "Approved", &self.admin_emails);
        self.deliver(email).await;
    }

    pub async fn request_declined(&self, outcome: &DeclineOutcome) {
        let Some(user) = &outcome.user else {
            tracing::warn!(request_id = %outcome.request.id, "No contact for declined request");
            return;
        };
        let email = render_decision(&outcome.request, user, "Declined", &self.admin_emails);
        self.deliver(email).await;
    }

    pub async fn returns_processed(&self, outcome: &ReturnsOutcome) {
        for line in &outcome.results {
            match &line.user {
                Some(user) => self.deliver(render_return(line, user, &self.admin_emails)).await,
                None => {
                    tracing::warn!(request_id = %line.request.id, "No contact for returned request")
                }
            }
        }
    }

    async fn deliver(&self, email: OutgoingEmail) {
        let subject = email.subject.clone();
        if let Err(e) = self.mailer.send(email).await {
            tracing::warn!(%subject, "Failed to send notification: {}", e);
        }
    }
}

fn request_summary(request: &BorrowRequest) -> String {
    format!(
        "Equipment: {}\nQuantity: {}\nPurpose: {}\nCampus: {}\nPickup date: {}\nReturn date: {}\nRequest ID: {}",
        request.equipment_type,
        request.quantity,
        request.purpose,
        request.campus,
        request.pickup_date.format(DATE_FORMAT),
        request.return_date.format(DATE_FORMAT),
        request.id,
    )
}

fn render_submitted_user(request: &BorrowRequest, user: &UserShort) -> OutgoingEmail {
    OutgoingEmail {
        to: vec![user.email.clone()],
        subject: format!("Equipment Request Submitted - {}", request.equipment_type),
        body: format!(
            "Hello {},\n\nYour equipment request was submitted and is pending review.\n\n{}",
            user.name,
            request_summary(request)
        ),
    }
}

fn render_submitted_admin(request: &BorrowRequest, user: &UserShort, admins: &[String]) -> OutgoingEmail {
    OutgoingEmail {
        to: admins.to_vec(),
        subject: format!("New Equipment Request - {}", request.equipment_type),
        body: format!(
            "New request from {} <{}>.\n\n{}",
            user.name,
            user.email,
            request_summary(request)
        ),
    }
}

fn render_decision(request: &BorrowRequest, user: &UserShort, decision: &str, admins: &[String]) -> OutgoingEmail {
    let mut to = vec![user.email.clone()];
    to.extend(admins.iter().filter(|a| !a.eq_ignore_ascii_case(&user.email)).cloned());
    OutgoingEmail {
        to,
        subject: format!("Equipment Request {} - {}", decision, request.equipment_type),
        body: format!(
            "Hello {},\n\nYour equipment request has been {}.\n\n{}",
            user.name,
            decision.to_lowercase(),
            request_summary(request)
        ),
    }
}

fn render_return(line: &ReturnItemResult, user: &UserShort, admins: &[String]) -> OutgoingEmail {
    let request = &line.request;
    let mut to = vec![user.email.clone()];
    to.extend(admins.iter().filter(|a| !a.eq_ignore_ascii_case(&user.email)).cloned());
    OutgoingEmail {
        to,
        subject: format!("Equipment Return Confirmation - {}", request.equipment_type),
        body: format!(
            "Hello {},\n\nWe received {} unit(s) of {}.\nReturned so far: {} of {}\nStatus: {}\nRequest ID: {}",
            user.name,
            line.returned_now,
            request.equipment_type,
            request.returned_quantity,
            request.quantity,
            request.status,
            request.id,
        ),
    }
}
