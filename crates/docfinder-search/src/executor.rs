//! Doctor search agent: extract, search, format, publish.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use docfinder_a2a::{
    A2aResult, AgentExecutor, AgentSkill, Artifact, EventBus, Part, RequestContext, TaskState,
    TaskStatus, codes,
};

use crate::collaborator::DoctorSearch;
use crate::extract::extract;
use crate::format::{format_results, summarize};
use crate::query::RequiredFields;

/// Artifact id for search results
pub const RESULTS_ARTIFACT: &str = "doctor-search-results";

/// Skill id advertised in the agent card
pub const SKILL_ID: &str = "search_doctors";

/// [`AgentExecutor`] that answers doctor search requests
#[derive(Clone)]
pub struct DoctorSearchExecutor {
    search: Arc<dyn DoctorSearch>,
    policy: RequiredFields,
}

impl DoctorSearchExecutor {
    pub fn new(search: Arc<dyn DoctorSearch>) -> Self {
        Self {
            search,
            policy: RequiredFields::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RequiredFields) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RequiredFields {
        self.policy
    }

    async fn fail(&self, ctx: &RequestContext, bus: &dyn EventBus, code: i32, message: String) {
        bus.emit_status(ctx.status_event(TaskStatus::failed(code, message), true))
            .await;
    }
}

#[async_trait]
impl AgentExecutor for DoctorSearchExecutor {
    fn skills(&self) -> Vec<AgentSkill> {
        vec![
            AgentSkill::new(SKILL_ID, "Search Doctors")
                .with_description(
                    "Find doctors by 5-digit zipcode, last name, specialty and gender. \
                     Accepts free text or a structured searchDoctors object.",
                )
                .with_tags(["doctors", "healthcare", "search", "directory"])
                .with_examples([
                    "Find doctors named Smith in 10001",
                    "female doctor with specialty cardiology in 94110",
                    "last name Patel",
                ]),
        ]
    }

    async fn execute(&self, ctx: &RequestContext, bus: &dyn EventBus) -> A2aResult<()> {
        bus.emit_status(ctx.status_event(TaskStatus::new(TaskState::Working), false))
            .await;

        let query = match extract(&ctx.message, &ctx.metadata, self.policy) {
            Ok(query) => query,
            Err(e) => {
                info!(task_id = %ctx.task_id, error = %e, "Search parameters rejected");
                self.fail(ctx, bus, codes::INVALID_PARAMS, e.to_string()).await;
                return Ok(());
            }
        };

        let records = match self.search.search(&query).await {
            Ok(records) => records,
            Err(e) => {
                warn!(task_id = %ctx.task_id, error = %e, "Doctor search failed");
                self.fail(ctx, bus, codes::COLLABORATOR_ERROR, e.to_string())
                    .await;
                return Ok(());
            }
        };

        let text = format_results(&records);
        let summary = serde_json::to_value(summarize(&records, &query))?;

        bus.emit_artifact(
            ctx.artifact_event(
                Artifact::new(RESULTS_ARTIFACT)
                    .with_name("Doctor search results")
                    .with_part(Part::text(&text))
                    .with_part(Part::data(summary)),
            ),
        )
        .await;

        info!(task_id = %ctx.task_id, count = records.len(), "Doctor search completed");
        bus.emit_status(ctx.status_event(
            TaskStatus::new(TaskState::Completed).with_message(ctx.agent_message(text)),
            true,
        ))
        .await;

        Ok(())
    }
}
