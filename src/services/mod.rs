//! Business logic services

pub mod email;
pub mod equipment;
pub mod lending;
pub mod notifications;
pub mod requests;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, EmailConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub lending: lending::LendingService,
    pub equipment: equipment::EquipmentService,
    pub requests: requests::RequestsService,
    pub notifications: notifications::NotificationService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: &AuthConfig, email_config: EmailConfig) -> Self {
        let mailer = Arc::new(email::EmailService::new(email_config));
        Self {
            lending: lending::LendingService::new(Arc::new(repository.clone())),
            equipment: equipment::EquipmentService::new(repository.clone()),
            requests: requests::RequestsService::new(repository.clone()),
            notifications: notifications::NotificationService::new(
                mailer,
                auth_config.admin_emails.clone(),
            ),
            repository,
        }
    }
}
