use crate::core::career_terms::{PlanRoleGroups, SingleRoleRule};
use crate::core::hash_converter::camelize;
use crate::core::proxy::ProxyClient;
use crate::domain::model::{AcademicPlan, CareerTerm, CareerTermRole, CompositeFeed};
use crate::domain::ports::{CollegeAndLevelSource, FeatureFlags, LinkResolver, RoleChecker};
use crate::utils::error::{EnrollmentError, Result};
use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub const ENROLLMENT_CARD_FLAG: &str = "cs_enrollment_card";
pub const STUDENT_ROLE: &str = "student";
pub const TERM_PARAM: &str = "STRM";

/// One deep link: its key in the feed and its code in the link service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSetting {
    pub feed_key: String,
    pub link_key: String,
    pub params: Vec<(String, String)>,
}

impl LinkSetting {
    pub fn new(feed_key: &str, link_key: &str) -> Self {
        Self {
            feed_key: feed_key.to_string(),
            link_key: link_key.to_string(),
            params: Vec::new(),
        }
    }
}

pub fn default_link_settings() -> Vec<LinkSetting> {
    vec![
        LinkSetting::new("uc_add_class_enrollment", "UC_CX_GT_SSCNTENRL_ADD"),
        LinkSetting::new("uc_edit_class_enrollment", "UC_CX_GT_SSCNTENRL_UPD"),
        LinkSetting::new("uc_view_class_enrollment", "UC_CX_GT_SSCNTENRL_VIEW"),
    ]
}

#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub feature_flag: String,
    pub student_role: String,
    pub term_param: String,
    pub concurrent_requests: usize,
    pub single_role: SingleRoleRule,
    pub links: Vec<LinkSetting>,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            feature_flag: ENROLLMENT_CARD_FLAG.to_string(),
            student_role: STUDENT_ROLE.to_string(),
            term_param: TERM_PARAM.to_string(),
            concurrent_requests: 4,
            single_role: SingleRoleRule::default(),
            links: default_link_settings(),
        }
    }
}

/// Proxy-backed sub-feeds the aggregator reads from.
#[derive(Clone)]
pub struct EnrollmentSources {
    /// Active career-terms for the student.
    pub enrollment_terms: ProxyClient,
    /// Enrollment instructions for one term.
    pub enrollment_term: ProxyClient,
    /// Academic planner for one term.
    pub academic_plan: ProxyClient,
}

#[derive(Clone)]
pub struct Collaborators {
    pub flags: Arc<dyn FeatureFlags>,
    pub roles: Arc<dyn RoleChecker>,
    pub college_and_level: Arc<dyn CollegeAndLevelSource>,
    pub links: Arc<dyn LinkResolver>,
}

/// Request-scoped values, each computed at most once.
pub struct RequestContext {
    student_id: String,
    career_terms: OnceCell<Vec<CareerTerm>>,
    college_and_level: OnceCell<Option<Value>>,
}

impl RequestContext {
    pub fn new(student_id: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            career_terms: OnceCell::new(),
            college_and_level: OnceCell::new(),
        }
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }
}

pub struct EnrollmentAggregator {
    sources: EnrollmentSources,
    collaborators: Collaborators,
    settings: AggregatorSettings,
}

impl EnrollmentAggregator {
    pub fn new(sources: EnrollmentSources, collaborators: Collaborators, settings: AggregatorSettings) -> Self {
        Self {
            sources,
            collaborators,
            settings,
        }
    }

    /// The class-enrollment feed with camelCase keys, or `{}` when the card is
    /// disabled or the user is not a student.
    pub async fn build(&self, student_id: &str) -> Result<Value> {
        match self.build_composite(student_id).await? {
            Some(feed) => Ok(camelize(serde_json::to_value(&feed)?)),
            None => Ok(Value::Object(Map::new())),
        }
    }

    pub async fn build_composite(&self, student_id: &str) -> Result<Option<CompositeFeed>> {
        if !self.collaborators.flags.enabled(&self.settings.feature_flag) {
            tracing::debug!("Feature '{}' disabled; empty enrollment feed", self.settings.feature_flag);
            return Ok(None);
        }
        if !self.is_student(student_id).await {
            tracing::debug!("User {} is not a student; empty enrollment feed", student_id);
            return Ok(None);
        }

        let ctx = RequestContext::new(student_id);
        let term_ids = self.active_term_ids(&ctx).await?;
        tracing::info!("Building class enrollments for {} across {} terms", student_id, term_ids.len());

        let (instruction_types, instructions, planner, links, has_holds) = tokio::join!(
            self.career_term_roles(&ctx),
            self.per_term_feeds(&ctx, &term_ids, &self.sources.enrollment_term, enrollment_term_instructions),
            self.per_term_feeds(&ctx, &term_ids, &self.sources.academic_plan, Some),
            self.links(student_id),
            self.has_holds(&ctx),
        );

        Ok(Some(CompositeFeed {
            enrollment_term_instruction_types: instruction_types?,
            enrollment_term_instructions: instructions,
            enrollment_term_academic_planner: planner,
            has_holds: has_holds?,
            links,
        }))
    }

    async fn is_student(&self, student_id: &str) -> bool {
        match self
            .collaborators
            .roles
            .has_role(student_id, &self.settings.student_role)
            .await
        {
            Ok(has_role) => has_role,
            Err(e) => {
                tracing::warn!("Role lookup failed for {}: {}", student_id, e);
                false
            }
        }
    }

    /// Sorted by termId; one term may map to several careers.
    pub async fn active_career_terms<'a>(&self, ctx: &'a RequestContext) -> Result<&'a Vec<CareerTerm>> {
        ctx.career_terms
            .get_or_try_init(|| async {
                let response = self.sources.enrollment_terms.get(ctx.student_id()).await?;
                let items = response
                    .feed()
                    .and_then(|feed| feed.get("enrollmentTerms"))
                    .map(wrap_array)
                    .unwrap_or_default();
                let mut terms: Vec<CareerTerm> = parse_items(items, "career term");
                terms.sort_by(|a, b| a.term_id.cmp(&b.term_id));
                Ok::<_, EnrollmentError>(terms)
            })
            .await
    }

    pub async fn active_term_ids(&self, ctx: &RequestContext) -> Result<Vec<String>> {
        let mut term_ids: Vec<String> = Vec::new();
        for term in self.active_career_terms(ctx).await? {
            if !term_ids.contains(&term.term_id) {
                term_ids.push(term.term_id.clone());
            }
        }
        Ok(term_ids)
    }

    /// Only transport faults propagate; any other failure leaves the segment
    /// empty (no plans, no holds) for the rest of the request.
    async fn college_and_level<'a>(&self, ctx: &'a RequestContext) -> Result<Option<&'a Value>> {
        let value = ctx
            .college_and_level
            .get_or_try_init(|| async {
                match self.collaborators.college_and_level.college_and_level(ctx.student_id()).await {
                    Err(e) if !e.is_transport() => {
                        tracing::error!("College and level unavailable for {}: {}", ctx.student_id(), e);
                        Ok(None)
                    }
                    other => other,
                }
            })
            .await?;
        Ok(value.as_ref())
    }

    async fn active_plans(&self, ctx: &RequestContext) -> Result<Vec<AcademicPlan>> {
        let plans = self
            .college_and_level(ctx)
            .await?
            .and_then(|cl| cl.get("plans"))
            .map(wrap_array)
            .unwrap_or_default();
        Ok(parse_items(plans, "academic plan"))
    }

    async fn has_holds(&self, ctx: &RequestContext) -> Result<bool> {
        let holds = self
            .college_and_level(ctx)
            .await?
            .and_then(|cl| cl.get("holds"))
            .and_then(|holds| holds.get("hasHolds"));
        Ok(holds.is_some_and(is_truthy))
    }

    /// Plan roles joined to active career terms, with the single-FPF rule
    /// applied.
    pub async fn career_term_roles(&self, ctx: &RequestContext) -> Result<Vec<CareerTermRole>> {
        let career_terms = self.active_career_terms(ctx).await?;
        let groups = PlanRoleGroups::group(self.active_plans(ctx).await?);
        let joined = groups.join_with_career_terms(career_terms);
        Ok(self.settings.single_role.resolve(joined))
    }

    /// Called once per term. Terms that fail or lack data are skipped.
    async fn per_term_feeds(
        &self,
        ctx: &RequestContext,
        term_ids: &[String],
        client: &ProxyClient,
        extract: fn(Value) -> Option<Value>,
    ) -> Map<String, Value> {
        let student_id = ctx.student_id();
        let term_param = self.settings.term_param.as_str();
        let endpoint = client.endpoint().name.as_str();

        let results: Vec<(String, Option<Value>)> = stream::iter(term_ids.iter().cloned())
            .map(|term_id| async move {
                let params = vec![(term_param.to_string(), term_id.clone())];
                let feed = match client.get_with(student_id, &params).await {
                    Ok(response) if response.is_errored() => {
                        tracing::warn!("{}: upstream error for term {}; skipping", endpoint, term_id);
                        None
                    }
                    Ok(response) => {
                        let extracted = response.into_feed().and_then(extract);
                        if extracted.is_none() {
                            tracing::warn!("{}: no data for term {}; skipping", endpoint, term_id);
                        }
                        extracted
                    }
                    Err(e) => {
                        tracing::error!("{}: request for term {} failed: {}", endpoint, term_id, e);
                        None
                    }
                };
                (term_id, feed)
            })
            .buffer_unordered(self.settings.concurrent_requests.max(1))
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(term_id, feed)| feed.map(|feed| (term_id, feed)))
            .collect()
    }

    async fn links(&self, student_id: &str) -> Map<String, Value> {
        let results: Vec<(String, Option<String>)> = stream::iter(self.settings.links.iter())
            .map(|setting| async move { (setting.feed_key.clone(), self.fetch_link(student_id, setting).await) })
            .buffer_unordered(self.settings.concurrent_requests.max(1))
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(key, link)| link.map(|link| (key, Value::String(link))))
            .collect()
    }

    async fn fetch_link(&self, student_id: &str, setting: &LinkSetting) -> Option<String> {
        match self
            .collaborators
            .links
            .resolve_link(&setting.link_key, &setting.params)
            .await
        {
            Ok(Some(link)) if !link.trim().is_empty() => Some(link),
            Ok(_) => {
                tracing::error!(
                    "Could not retrieve CS link {} for Class Enrollments feed, uid = {}",
                    setting.link_key,
                    student_id
                );
                None
            }
            Err(e) => {
                tracing::error!(
                    "Could not retrieve CS link {} for Class Enrollments feed, uid = {}: {}",
                    setting.link_key,
                    student_id,
                    e
                );
                None
            }
        }
    }
}

fn enrollment_term_instructions(feed: Value) -> Option<Value> {
    match feed {
        Value::Object(mut map) => map.remove("enrollmentTerm").filter(|v| !v.is_null()),
        _ => None,
    }
}

/// A single object counts as a one-element array.
fn wrap_array(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

fn parse_items<T: DeserializeOwned>(items: Vec<Value>, label: &str) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Skipping malformed {}: {}", label, e);
                None
            }
        })
        .collect()
}

fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}
