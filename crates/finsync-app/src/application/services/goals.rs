use serde::Serialize;
use tracing::{info, warn};

use finsync_domain::goal::{Contribution, ContributionDraft, Goal, GoalDraft, GoalStatus};
use finsync_domain::shared::GoalId;
use finsync_infrastructure::config::CacheConfig;
use finsync_infrastructure::http::{Acknowledgement, ApiClient, ApiEnvelope, QueryParams};

use super::fetchers;
use super::resources::{DASHBOARD, GOALS};
use crate::application::cache::{
    KeyPrefix, MutationOptions, QueryCache, QueryError, QueryKey, QueryOptions, QueryResult,
};
use crate::application::dtos::GoalFilters;

#[derive(Serialize)]
struct StatusChange {
    status: GoalStatus,
}

#[derive(Clone)]
pub struct GoalsApi {
    client: ApiClient,
    cache: QueryCache,
    options: QueryOptions,
}

impl GoalsApi {
    pub fn new(client: ApiClient, cache: QueryCache, config: &CacheConfig) -> Self {
        Self {
            client,
            cache,
            options: QueryOptions::from_config(config),
        }
    }

    pub fn list_key(filters: &GoalFilters) -> QueryKey {
        filters.key(QueryKey::new(GOALS).segment("list"))
    }

    pub fn detail_key(id: &GoalId) -> QueryKey {
        QueryKey::new(GOALS).segment(id)
    }

    pub fn contributions_key(id: &GoalId) -> QueryKey {
        Self::detail_key(id).segment("contributions")
    }

    pub async fn list(&self, filters: &GoalFilters) -> Result<QueryResult<Vec<Goal>>, QueryError> {
        let fetch = fetchers::list(&self.client, "/goals".to_string(), filters.params());
        self.cache
            .query(&Self::list_key(filters), &self.options, fetch)
            .await
    }

    pub async fn get(&self, id: &GoalId) -> Result<QueryResult<Goal>, QueryError> {
        let fetch = fetchers::entity(&self.client, format!("/goals/{}", id), QueryParams::new());
        self.cache
            .query(&Self::detail_key(id), &self.options, fetch)
            .await
    }

    pub async fn contributions(
        &self,
        id: &GoalId,
    ) -> Result<QueryResult<Vec<Contribution>>, QueryError> {
        let fetch = fetchers::list(
            &self.client,
            format!("/goals/{}/contributions", id),
            QueryParams::new(),
        );
        self.cache
            .query(&Self::contributions_key(id), &self.options, fetch)
            .await
    }

    pub async fn create(&self, draft: &GoalDraft) -> Result<Goal, QueryError> {
        draft.validate()?;
        let created = self
            .cache
            .mutate(
                async {
                    let envelope: ApiEnvelope<Goal> = self.client.post("/goals", draft).await?;
                    envelope.into_data()
                },
                Self::write_effects(),
            )
            .await?;
        info!(id = %created.id, "Goal created");
        Ok(created)
    }

    pub async fn update(&self, id: &GoalId, draft: &GoalDraft) -> Result<Goal, QueryError> {
        draft.validate()?;
        let path = format!("/goals/{}", id);
        self.cache
            .mutate(
                async {
                    let envelope: ApiEnvelope<Goal> = self.client.put(&path, draft).await?;
                    envelope.into_data()
                },
                Self::write_effects(),
            )
            .await
    }

    pub async fn delete(&self, id: &GoalId) -> Result<(), QueryError> {
        let path = format!("/goals/{}", id);
        self.cache
            .mutate(
                async {
                    let ack: Option<Acknowledgement> = self.client.delete(&path).await?;
                    ack.map_or(Ok(()), Acknowledgement::into_result)
                },
                Self::write_effects().remove(KeyPrefix::new(GOALS).segment(id)),
            )
            .await?;
        info!(id = %id, "Goal deleted");
        Ok(())
    }

    /// Append to the goal's contribution ledger. Only active goals accept
    /// contributions; the check runs against the cached goal before any
    /// request is sent.
    pub async fn add_contribution(
        &self,
        goal_id: &GoalId,
        draft: &ContributionDraft,
    ) -> Result<Contribution, QueryError> {
        draft.validate()?;
        let goal = self.get(goal_id).await?;
        if let Err(e) = goal.data.ensure_accepts_contributions() {
            warn!(id = %goal_id, "Contribution refused: {}", e);
            return Err(e.into());
        }

        let path = format!("/goals/{}/contributions", goal_id);
        let contribution = self
            .cache
            .mutate(
                async {
                    let envelope: ApiEnvelope<Contribution> =
                        self.client.post(&path, draft).await?;
                    envelope.into_data()
                },
                Self::write_effects(),
            )
            .await?;
        info!(id = %goal_id, amount = %contribution.amount, "Contribution recorded");
        Ok(contribution)
    }

    pub async fn set_status(&self, goal_id: &GoalId, status: GoalStatus) -> Result<Goal, QueryError> {
        let goal = self.get(goal_id).await?;
        goal.data.ensure_transition(status)?;

        let path = format!("/goals/{}", goal_id);
        let body = StatusChange { status };
        let updated = self
            .cache
            .mutate(
                async {
                    let envelope: ApiEnvelope<Goal> = self.client.put(&path, &body).await?;
                    envelope.into_data()
                },
                Self::write_effects(),
            )
            .await?;
        info!(id = %goal_id, status = status.as_str(), "Goal status changed");
        Ok(updated)
    }

    fn write_effects() -> MutationOptions {
        MutationOptions::new().invalidate(GOALS).invalidate(DASHBOARD)
    }
}
