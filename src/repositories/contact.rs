//! Contact form submission repository

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

use crate::models::contact_submission;

#[derive(Debug, Clone)]
pub struct ContactRepository {
    pub db: Arc<DatabaseConnection>,
}

impl ContactRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        name: String,
        email: String,
        message: String,
        inquiry_type: String,
    ) -> Result<contact_submission::Model, DbErr> {
        contact_submission::ActiveModel {
            name: Set(name),
            email: Set(email),
            message: Set(message),
            inquiry_type: Set(inquiry_type),
            created_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
    }
}
