//! Equipment service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::equipment::{CreateEquipment, Equipment, UpdateEquipment},
    repository::Repository,
};

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
}

impl EquipmentService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Equipment>> {
        self.repository.equipment.list().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Equipment> {
        self.repository.equipment.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        data.validate()?;
        let equipment = self.repository.equipment.create(data).await?;
        tracing::info!(name = %equipment.name, total = equipment.total_quantity, "Equipment created");
        Ok(equipment)
    }

    pub async fn update(&self, id: Uuid, data: &UpdateEquipment) -> AppResult<Equipment> {
        data.validate()?;
        self.repository.equipment.update(id, data).await
    }

    /// Insert [`starter_catalog`] when no equipment exists yet; returns rows created
    pub async fn seed_if_empty(&self) -> AppResult<usize> {
        if self.repository.equipment.count().await? > 0 {
            tracing::info!("Equipment already present, skipping seed");
            return Ok(0);
        }

        let catalog = starter_catalog();
        for data in &catalog {
            let equipment = self.create(data).await?;
            tracing::info!(name = %equipment.name, "Seeded equipment");
        }
        Ok(catalog.len())
    }

    /// Delete equipment and its requests
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let removed = self.repository.equipment.delete(id).await?;
        tracing::info!(%id, requests_removed = removed, "Equipment deleted");
        Ok(())
    }
}

/// Initial inventory for a fresh install
pub fn starter_catalog() -> Vec<CreateEquipment> {
    [
        (
            "LONG SLEEVE T-SHIRT",
            50,
            "https://bkstr.scene7.com/is/image/Bkstr/939-R64LT-WA17253-Black?$HomePageRecs_ET$",
        ),
        (
            "POLO SHIRT",
            30,
            "https://bkstr.scene7.com/is/image/Bkstr/939-MQK00075-WSP1-Black?$HomePageRecs_ET$&fmt=png-alpha",
        ),
        (
            "GRAD HOODIE",
            25,
            "https://bkstr.scene7.com/is/image/Bkstr/939-4186KH-GRAD-Black?$GMCategory_ET$",
        ),
        (
            "BEAN HAT",
            40,
            "https://bkstr.scene7.com/is/image/Bkstr/939-T-CS4003-WDMK-D-Black?$GMCategory_ET$",
        ),
    ]
    .into_iter()
    .map(|(name, total_quantity, image_url)| CreateEquipment {
        name: name.to_string(),
        total_quantity,
        image_url: Some(image_url.to_string()),
    })
    .collect()
}
