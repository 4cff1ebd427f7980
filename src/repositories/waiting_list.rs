//! Waiting list submission repository

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

use crate::models::waiting_list_submission;

/// Validated waiting-list form fields
#[derive(Debug, Clone)]
pub struct WaitingListInput {
    pub name: String,
    pub email: String,
    pub business_name: String,
    pub project_nature: String,
    pub budget: String,
}

#[derive(Debug, Clone)]
pub struct WaitingListRepository {
    pub db: Arc<DatabaseConnection>,
}

impl WaitingListRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        input: WaitingListInput,
    ) -> Result<waiting_list_submission::Model, DbErr> {
        waiting_list_submission::ActiveModel {
            name: Set(input.name),
            email: Set(input.email),
            business_name: Set(input.business_name),
            project_nature: Set(input.project_nature),
            budget: Set(input.budget),
            mailerlite_subscribed: Set(false),
            created_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
    }

    pub async fn mark_subscribed(
        &self,
        submission: waiting_list_submission::Model,
    ) -> Result<waiting_list_submission::Model, DbErr> {
        let mut active: waiting_list_submission::ActiveModel = submission.into();
        active.mailerlite_subscribed = Set(true);
        active.update(&*self.db).await
    }
}
