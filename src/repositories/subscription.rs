//! Subscription session repository
//!
//! One session row per (landing page, email) plus an append-only log of the
//! transitions it went through.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::models::subscription_session::{self, Entity as SubscriptionSession};
use crate::models::subscription_transition::{self, Entity as SubscriptionTransition};
use crate::subscription::{SubscriptionState, SubscriptionStep};

/// One accepted step to persist
#[derive(Debug, Clone)]
pub struct StepRecord<'a> {
    pub landing_page_id: i32,
    pub email: &'a str,
    pub step: SubscriptionStep,
    pub business_type: Option<&'a str>,
}

/// Session after a step, with the state it moved from
#[derive(Debug, Clone)]
pub struct RecordedStep {
    pub session: subscription_session::Model,
    pub from_state: Option<SubscriptionState>,
}

#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pub db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_session(
        &self,
        landing_page_id: i32,
        email: &str,
    ) -> Result<Option<subscription_session::Model>, DbErr> {
        Self::find_in(&*self.db, landing_page_id, email).await
    }

    async fn find_in<C: ConnectionTrait>(
        conn: &C,
        landing_page_id: i32,
        email: &str,
    ) -> Result<Option<subscription_session::Model>, DbErr> {
        SubscriptionSession::find()
            .filter(subscription_session::Column::LandingPageId.eq(landing_page_id))
            .filter(subscription_session::Column::Email.eq(email))
            .one(conn)
            .await
    }

    /// Moves the session through `record.step` and appends the transition,
    /// atomically.
    ///
    /// The session row is created with `ON CONFLICT DO NOTHING`, so repeated
    /// or concurrent first submissions for the same (page, email) converge on
    /// one row. The source state is the one read inside the transaction.
    pub async fn record_step(&self, record: StepRecord<'_>) -> Result<RecordedStep, DbErr> {
        let txn = self.db.begin().await?;
        let now = Utc::now().fixed_offset();

        let fresh_state = record.step.transition(None);
        let inserted = SubscriptionSession::insert(subscription_session::ActiveModel {
            landing_page_id: Set(record.landing_page_id),
            email: Set(record.email.to_string()),
            state: Set(fresh_state.as_str().to_string()),
            business_type: Set(record.business_type.map(str::to_string)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                subscription_session::Column::LandingPageId,
                subscription_session::Column::Email,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let existing = Self::find_in(&txn, record.landing_page_id, record.email)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("subscription session".to_string()))?;

        let (session, from_state) = if inserted > 0 {
            (existing, None)
        } else {
            let from_state = parse_state(&existing);
            let to_state = record.step.transition(from_state);
            let mut session: subscription_session::ActiveModel = existing.into();
            session.state = Set(to_state.as_str().to_string());
            if let Some(business_type) = record.business_type {
                session.business_type = Set(Some(business_type.to_string()));
            }
            session.updated_at = Set(now);
            (session.update(&txn).await?, from_state)
        };

        subscription_transition::ActiveModel {
            session_id: Set(session.id),
            from_state: Set(from_state.map(|s| s.as_str().to_string())),
            to_state: Set(session.state.clone()),
            step: Set(record.step.as_str().to_string()),
            occurred_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(RecordedStep { session, from_state })
    }

    /// Transition history of a session, oldest first
    pub async fn transitions(
        &self,
        session_id: i32,
    ) -> Result<Vec<subscription_transition::Model>, DbErr> {
        SubscriptionTransition::find()
            .filter(subscription_transition::Column::SessionId.eq(session_id))
            .order_by_asc(subscription_transition::Column::OccurredAt)
            .order_by_asc(subscription_transition::Column::Id)
            .all(&*self.db)
            .await
    }
}

fn parse_state(session: &subscription_session::Model) -> Option<SubscriptionState> {
    match SubscriptionState::from_str(&session.state) {
        Ok(state) => Some(state),
        Err(err) => {
            tracing::warn!(session_id = session.id, error = %err, "Ignoring unreadable session state");
            None
        }
    }
}
