//! # Landing page subscription workflow
//!
//! Two steps, `email` then `business_type`, modelled as an explicit state
//! machine. External calls go through [`SubscriberDirectory`] and local
//! state is only recorded once they succeed.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::integrations::mailerlite::{MailerLiteClient, MailerLiteError, SubscriberFields};

/// Per (landing page, email) progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    EmailCaptured,
    Completed,
}

impl SubscriptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionState::EmailCaptured => "email_captured",
            SubscriptionState::Completed => "completed",
        }
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_captured" => Ok(SubscriptionState::EmailCaptured),
            "completed" => Ok(SubscriptionState::Completed),
            other => Err(format!("unknown subscription state: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStep {
    Email,
    BusinessType,
}

impl SubscriptionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStep::Email => "email",
            SubscriptionStep::BusinessType => "business_type",
        }
    }

    /// State after accepting this step from `current`.
    ///
    /// Replaying `email` never moves a completed session backwards.
    pub fn transition(&self, current: Option<SubscriptionState>) -> SubscriptionState {
        match (self, current) {
            (SubscriptionStep::Email, Some(SubscriptionState::Completed)) => {
                SubscriptionState::Completed
            }
            (SubscriptionStep::Email, _) => SubscriptionState::EmailCaptured,
            (SubscriptionStep::BusinessType, _) => SubscriptionState::Completed,
        }
    }
}

impl FromStr for SubscriptionStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(SubscriptionStep::Email),
            "business_type" => Ok(SubscriptionStep::BusinessType),
            other => Err(format!("Invalid step: {}", other)),
        }
    }
}

/// Answer to the business-type question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessType {
    /// Uses automation in their own business
    Implement,
    /// Sells AI services to others
    SellServices,
}

impl BusinessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessType::Implement => "implement",
            BusinessType::SellServices => "sell_services",
        }
    }

    /// Custom field values written to the subscriber.
    pub fn subscriber_fields(&self) -> SubscriberFields {
        let (uses_automation, sells_services) = match self {
            BusinessType::Implement => (1, 0),
            BusinessType::SellServices => (0, 1),
        };
        SubscriberFields {
            uses_automation_in_their_business: Some(uses_automation),
            sell_ai_services: Some(sells_services),
            ..SubscriberFields::default()
        }
    }
}

impl FromStr for BusinessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "implement" => Ok(BusinessType::Implement),
            "sell_services" => Ok(BusinessType::SellServices),
            _ => Err("Invalid business type".to_string()),
        }
    }
}

/// Subscriber operations the workflow needs from the mailing-list provider.
#[async_trait]
pub trait SubscriberDirectory: Send + Sync {
    /// Id of the subscriber with `email`, if one exists
    async fn find_subscriber(&self, email: &str) -> Result<Option<String>, MailerLiteError>;

    /// Creates a subscriber, optionally in `group_id`, returning its id
    async fn create_subscriber(
        &self,
        email: &str,
        group_id: Option<&str>,
        name: &str,
    ) -> Result<String, MailerLiteError>;

    async fn add_to_group(&self, email: &str, group_id: &str) -> Result<(), MailerLiteError>;

    async fn update_fields(
        &self,
        subscriber_id: &str,
        fields: &SubscriberFields,
    ) -> Result<(), MailerLiteError>;
}

#[async_trait]
impl SubscriberDirectory for MailerLiteClient {
    async fn find_subscriber(&self, email: &str) -> Result<Option<String>, MailerLiteError> {
        Ok(self.get_subscriber(email).await?.map(|s| s.id))
    }

    async fn create_subscriber(
        &self,
        email: &str,
        group_id: Option<&str>,
        name: &str,
    ) -> Result<String, MailerLiteError> {
        Ok(MailerLiteClient::create_subscriber(self, email, group_id, Some(name))
            .await?
            .id)
    }

    async fn add_to_group(&self, email: &str, group_id: &str) -> Result<(), MailerLiteError> {
        self.add_subscriber_to_group(email, group_id).await
    }

    async fn update_fields(
        &self,
        subscriber_id: &str,
        fields: &SubscriberFields,
    ) -> Result<(), MailerLiteError> {
        self.update_subscriber(subscriber_id, fields).await
    }
}

/// Runs the external side of the `email` step.
///
/// A new subscriber is created in the first group and then joined to the
/// rest; an existing one is joined to every group and has its name updated.
pub async fn subscribe_email<D>(
    directory: &D,
    email: &str,
    first_name: &str,
    group_ids: &[String],
) -> Result<(), MailerLiteError>
where
    D: SubscriberDirectory + ?Sized,
{
    match directory.find_subscriber(email).await? {
        Some(subscriber_id) => {
            for group_id in group_ids {
                directory.add_to_group(email, group_id).await?;
            }
            let fields = SubscriberFields {
                name: Some(first_name.to_string()),
                ..SubscriberFields::default()
            };
            directory.update_fields(&subscriber_id, &fields).await?;
            tracing::info!(groups = group_ids.len(), "Existing subscriber joined landing page groups");
        }
        None => {
            let first_group = group_ids.first().map(String::as_str);
            directory
                .create_subscriber(email, first_group, first_name)
                .await?;
            for group_id in group_ids.iter().skip(1) {
                directory.add_to_group(email, group_id).await?;
            }
            tracing::info!(groups = group_ids.len(), "New subscriber created for landing page");
        }
    }
    Ok(())
}

/// Runs the external side of the `business_type` step.
pub async fn record_business_type<D>(
    directory: &D,
    email: &str,
    business_type: BusinessType,
) -> Result<(), MailerLiteError>
where
    D: SubscriberDirectory + ?Sized,
{
    let Some(subscriber_id) = directory.find_subscriber(email).await? else {
        return Err(MailerLiteError::Api {
            status: 404,
            body: "subscriber not found".to_string(),
        });
    };

    directory
        .update_fields(&subscriber_id, &business_type.subscriber_fields())
        .await?;
    tracing::info!(business_type = business_type.as_str(), "Subscriber business type recorded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeDirectory {
        // email -> (id, groups, fields)
        subscribers: Mutex<HashMap<String, (String, BTreeSet<String>, Vec<SubscriberFields>)>>,
        fail_adds: bool,
    }

    impl FakeDirectory {
        fn groups_of(&self, email: &str) -> Vec<String> {
            self.subscribers.lock().unwrap()[email].1.iter().cloned().collect()
        }

        fn last_fields(&self, email: &str) -> SubscriberFields {
            self.subscribers.lock().unwrap()[email].2.last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl SubscriberDirectory for FakeDirectory {
        async fn find_subscriber(&self, email: &str) -> Result<Option<String>, MailerLiteError> {
            Ok(self.subscribers.lock().unwrap().get(email).map(|s| s.0.clone()))
        }

        async fn create_subscriber(
            &self,
            email: &str,
            group_id: Option<&str>,
            name: &str,
        ) -> Result<String, MailerLiteError> {
            let mut subscribers = self.subscribers.lock().unwrap();
            let id = format!("sub-{}", subscribers.len() + 1);
            let groups = group_id.map(str::to_string).into_iter().collect();
            let fields = SubscriberFields {
                name: Some(name.to_string()),
                ..SubscriberFields::default()
            };
            subscribers.insert(email.to_string(), (id.clone(), groups, vec![fields]));
            Ok(id)
        }

        async fn add_to_group(&self, email: &str, group_id: &str) -> Result<(), MailerLiteError> {
            if self.fail_adds {
                return Err(MailerLiteError::Api {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            let mut subscribers = self.subscribers.lock().unwrap();
            let entry = subscribers.get_mut(email).ok_or(MailerLiteError::Api {
                status: 404,
                body: String::new(),
            })?;
            entry.1.insert(group_id.to_string());
            Ok(())
        }

        async fn update_fields(
            &self,
            subscriber_id: &str,
            fields: &SubscriberFields,
        ) -> Result<(), MailerLiteError> {
            let mut subscribers = self.subscribers.lock().unwrap();
            let entry = subscribers
                .values_mut()
                .find(|s| s.0 == subscriber_id)
                .ok_or(MailerLiteError::Api {
                    status: 404,
                    body: String::new(),
                })?;
            entry.2.push(fields.clone());
            Ok(())
        }
    }

    fn groups(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[tokio::test]
    async fn new_subscriber_joins_every_group() {
        let directory = FakeDirectory::default();
        subscribe_email(&directory, "a@b.com", "Ada", &groups(&["G1", "G2"]))
            .await
            .unwrap();
        assert_eq!(directory.groups_of("a@b.com"), vec!["G1", "G2"]);
    }

    #[tokio::test]
    async fn existing_subscriber_joins_groups_and_gets_renamed() {
        let directory = FakeDirectory::default();
        directory
            .create_subscriber("a@b.com", Some("G0"), "Old")
            .await
            .unwrap();

        subscribe_email(&directory, "a@b.com", "Ada", &groups(&["G1", "G2"]))
            .await
            .unwrap();

        assert_eq!(directory.groups_of("a@b.com"), vec!["G0", "G1", "G2"]);
        assert_eq!(directory.last_fields("a@b.com").name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn page_without_groups_still_creates_subscriber() {
        let directory = FakeDirectory::default();
        subscribe_email(&directory, "a@b.com", "Ada", &[]).await.unwrap();
        assert!(directory.groups_of("a@b.com").is_empty());
    }

    #[tokio::test]
    async fn group_failure_propagates() {
        let directory = FakeDirectory {
            fail_adds: true,
            ..FakeDirectory::default()
        };
        let result = subscribe_email(&directory, "a@b.com", "Ada", &groups(&["G1", "G2"])).await;
        assert!(matches!(result, Err(MailerLiteError::Api { status: 500, .. })));
    }

    #[tokio::test]
    async fn business_type_sets_opposite_flags() {
        let directory = FakeDirectory::default();
        subscribe_email(&directory, "a@b.com", "Ada", &groups(&["G1"]))
            .await
            .unwrap();

        record_business_type(&directory, "a@b.com", BusinessType::Implement)
            .await
            .unwrap();
        let fields = directory.last_fields("a@b.com");
        assert_eq!(fields.uses_automation_in_their_business, Some(1));
        assert_eq!(fields.sell_ai_services, Some(0));

        record_business_type(&directory, "a@b.com", BusinessType::SellServices)
            .await
            .unwrap();
        let fields = directory.last_fields("a@b.com");
        assert_eq!(fields.uses_automation_in_their_business, Some(0));
        assert_eq!(fields.sell_ai_services, Some(1));
    }

    #[tokio::test]
    async fn business_type_for_unknown_subscriber_fails() {
        let directory = FakeDirectory::default();
        let result = record_business_type(&directory, "x@y.com", BusinessType::Implement).await;
        assert!(result.is_err());
    }

    #[test]
    fn transitions() {
        use SubscriptionState::*;
        assert_eq!(SubscriptionStep::Email.transition(None), EmailCaptured);
        assert_eq!(SubscriptionStep::Email.transition(Some(EmailCaptured)), EmailCaptured);
        assert_eq!(SubscriptionStep::Email.transition(Some(Completed)), Completed);
        assert_eq!(SubscriptionStep::BusinessType.transition(None), Completed);
        assert_eq!(SubscriptionStep::BusinessType.transition(Some(EmailCaptured)), Completed);
    }

    #[test]
    fn parsing() {
        assert_eq!("email".parse::<SubscriptionStep>(), Ok(SubscriptionStep::Email));
        assert!("payment".parse::<SubscriptionStep>().is_err());
        assert_eq!("sell_services".parse::<BusinessType>(), Ok(BusinessType::SellServices));
        assert!("other".parse::<BusinessType>().is_err());
        assert_eq!("completed".parse::<SubscriptionState>(), Ok(SubscriptionState::Completed));
        assert_eq!(SubscriptionState::EmailCaptured.to_string(), "email_captured");
    }
}
