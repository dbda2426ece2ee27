use crate::adapters::{
    ConfigFeatureFlags, ConfigLinkResolver, FixtureFetcher, ReqwestFetcher, StaticTermCatalog, UserAttributesRoles,
};
use crate::core::aggregator::{
    default_link_settings, AggregatorSettings, Collaborators, EnrollmentAggregator, EnrollmentSources,
};
use crate::core::cache::RemoteFetchCache;
use crate::core::career_terms::SingleRoleRule;
use crate::core::proxy::{CacheConfig, Endpoint, ProxyClient, DEFAULT_IDENTITY_PARAM, DEFAULT_LANGUAGE_CD};
use crate::core::row_adapter::RowAdapter;
use crate::core::term_dates::{DefaultDatePolicy, TermDateResolver, WeekdayRoll};
use crate::domain::model::{FeedEnvelope, Term};
use crate::domain::ports::{CollegeAndLevelSource, Fetcher};
use crate::utils::error::{EnrollmentError, Result};
use crate::utils::validation::{self, Validate};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_CACHE_EXPIRY_SECONDS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    pub campus_solutions: CampusSolutionsConfig,
    pub features: Option<HashMap<String, bool>>,
    pub term_dates: Option<TermDatesConfig>,
    pub aggregator: Option<AggregatorConfig>,
    pub terms: Option<Vec<TermConfig>>,
    pub links: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampusSolutionsConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
    pub cache_expiry_seconds: Option<u64>,
    pub serve_stale_on_error: Option<bool>,
    pub identity_param: Option<String>,
    pub language_cd: Option<String>,
    pub fake: Option<bool>,
    pub fixture_path: Option<String>,
    pub endpoints: Option<EndpointsConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointsConfig {
    pub enrollment_terms: Option<EndpointConfig>,
    pub enrollment_term: Option<EndpointConfig>,
    pub academic_plan: Option<EndpointConfig>,
    pub user_attributes: Option<EndpointConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub path: String,
    pub root_node: Option<String>,
    pub feature_flag: Option<String>,
}

impl EndpointConfig {
    fn with_path(path: &str) -> Self {
        Self {
            path: path.to_string(),
            root_node: None,
            feature_flag: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermDatesConfig {
    pub start_offset_days: Option<i64>,
    pub start_weekday: Option<String>,
    pub end_offset_days: Option<i64>,
    pub end_weekday: Option<String>,
    pub roll: Option<WeekdayRoll>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub concurrent_requests: Option<usize>,
    pub feature_flag: Option<String>,
    pub student_role: Option<String>,
    pub singleton_role: Option<String>,
    pub default_role: Option<String>,
    pub term_param: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermConfig {
    pub slug: String,
    pub classes_start: NaiveDate,
    pub classes_end: NaiveDate,
}

fn parse_weekday(field: &str, value: &Option<String>, default: Weekday) -> Result<Weekday> {
    match value {
        Some(name) => name
            .parse::<Weekday>()
            .map_err(|_| EnrollmentError::InvalidConfigValueError {
                field: field.to_string(),
                value: name.clone(),
                reason: "Expected a weekday name such as 'Wed' or 'Friday'".to_string(),
            }),
        None => Ok(default),
    }
}

impl FeedsConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EnrollmentError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EnrollmentError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CS_BASE_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EnrollmentError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        let cs = &self.campus_solutions;
        validation::validate_url("campus_solutions.base_url", &cs.base_url)?;
        validation::validate_range("campus_solutions.timeout_seconds", self.timeout().as_secs(), 1, 300)?;
        validation::validate_non_empty_string("campus_solutions.identity_param", &self.identity_param())?;
        validation::validate_non_empty_string("campus_solutions.language_cd", &self.language_cd())?;

        if self.is_fake() {
            let fixture_path = validation::validate_required_field("campus_solutions.fixture_path", &cs.fixture_path)?;
            validation::validate_path("campus_solutions.fixture_path", fixture_path)?;
        }

        if let Some(aggregator) = &self.aggregator {
            if let Some(concurrent) = aggregator.concurrent_requests {
                validation::validate_positive_number("aggregator.concurrent_requests", concurrent, 1)?;
            }
        }

        if let Some(term_dates) = &self.term_dates {
            if let Some(days) = term_dates.start_offset_days {
                validation::validate_range("term_dates.start_offset_days", days, -60, 60)?;
            }
            if let Some(days) = term_dates.end_offset_days {
                validation::validate_range("term_dates.end_offset_days", days, -60, 60)?;
            }
        }
        self.date_policy()?;

        for term in self.terms.iter().flatten() {
            if term.classes_end < term.classes_start {
                return Err(EnrollmentError::InvalidConfigValueError {
                    field: format!("terms.{}", term.slug),
                    value: term.classes_end.to_string(),
                    reason: "classes_end precedes classes_start".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.campus_solutions.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn cache_expiry(&self) -> Duration {
        Duration::from_secs(
            self.campus_solutions
                .cache_expiry_seconds
                .unwrap_or(DEFAULT_CACHE_EXPIRY_SECONDS),
        )
    }

    pub fn identity_param(&self) -> String {
        self.campus_solutions
            .identity_param
            .clone()
            .unwrap_or_else(|| DEFAULT_IDENTITY_PARAM.to_string())
    }

    pub fn language_cd(&self) -> String {
        self.campus_solutions
            .language_cd
            .clone()
            .unwrap_or_else(|| DEFAULT_LANGUAGE_CD.to_string())
    }

    /// 是否使用假資料 (從 fixture 讀取)
    pub fn is_fake(&self) -> bool {
        self.campus_solutions.fake.unwrap_or(false)
    }

    pub fn date_policy(&self) -> Result<DefaultDatePolicy> {
        let defaults = DefaultDatePolicy::default();
        let Some(cfg) = &self.term_dates else {
            return Ok(defaults);
        };
        Ok(DefaultDatePolicy {
            start_offset_days: cfg.start_offset_days.unwrap_or(defaults.start_offset_days),
            start_weekday: parse_weekday("term_dates.start_weekday", &cfg.start_weekday, defaults.start_weekday)?,
            end_offset_days: cfg.end_offset_days.unwrap_or(defaults.end_offset_days),
            end_weekday: parse_weekday("term_dates.end_weekday", &cfg.end_weekday, defaults.end_weekday)?,
            roll: cfg.roll.unwrap_or(defaults.roll),
        })
    }

    pub fn term_catalog(&self) -> StaticTermCatalog {
        StaticTermCatalog::new(
            self.terms
                .iter()
                .flatten()
                .map(|t| Term {
                    slug: t.slug.clone(),
                    classes_start: t.classes_start,
                    classes_end: t.classes_end,
                })
                .collect(),
        )
    }

    pub fn row_adapter(&self) -> Result<RowAdapter> {
        let resolver = TermDateResolver::new(Arc::new(self.term_catalog()), self.date_policy()?);
        Ok(RowAdapter::new(resolver))
    }

    pub fn feature_flags(&self) -> ConfigFeatureFlags {
        ConfigFeatureFlags::new(self.features.clone().unwrap_or_default())
    }

    pub fn link_resolver(&self) -> ConfigLinkResolver {
        ConfigLinkResolver::new(self.links.clone().unwrap_or_default())
    }

    pub fn aggregator_settings(&self) -> AggregatorSettings {
        let defaults = AggregatorSettings::default();
        let Some(cfg) = &self.aggregator else {
            return defaults;
        };
        let rule_defaults = SingleRoleRule::default();
        AggregatorSettings {
            feature_flag: cfg.feature_flag.clone().unwrap_or(defaults.feature_flag),
            student_role: cfg.student_role.clone().unwrap_or(defaults.student_role),
            term_param: cfg.term_param.clone().unwrap_or(defaults.term_param),
            concurrent_requests: cfg.concurrent_requests.unwrap_or(defaults.concurrent_requests),
            single_role: SingleRoleRule {
                singleton_role: cfg.singleton_role.clone().unwrap_or(rule_defaults.singleton_role),
                fallback_role: cfg.default_role.clone().unwrap_or(rule_defaults.fallback_role),
            },
            links: default_link_settings(),
        }
    }

    fn endpoint_config(&self, name: &str) -> EndpointConfig {
        let configured = self.campus_solutions.endpoints.clone().unwrap_or_default();
        let (configured, default_path) = match name {
            "enrollment_terms" => (configured.enrollment_terms, "/UC_SR_CURR_TERMS.v1/GetCurrentItems"),
            "enrollment_term" => (configured.enrollment_term, "/UC_SR_STDNT_CLASS_ENROLL.v1/Get"),
            "academic_plan" => (configured.academic_plan, "/UC_SR_ACADEMIC_PLANNER.v1/get"),
            _ => (configured.user_attributes, "/UC_CC_USER_ATTRIBUTES.v1/get"),
        };
        configured.unwrap_or_else(|| EndpointConfig::with_path(default_path))
    }

    pub fn endpoint(&self, name: &str) -> Endpoint {
        let cfg = self.endpoint_config(name);
        let url = format!("{}{}", self.campus_solutions.base_url.trim_end_matches('/'), cfg.path);
        let endpoint = Endpoint::new(name, &url);
        match &cfg.root_node {
            Some(node) => endpoint.with_root_node(node),
            None => endpoint,
        }
    }

    /// 真實 HTTP 或假資料模式
    pub fn fetcher(&self) -> Result<Arc<dyn Fetcher>> {
        if !self.is_fake() {
            return Ok(Arc::new(ReqwestFetcher::new().with_timeout(self.timeout())));
        }
        let fixture_path =
            validation::validate_required_field("campus_solutions.fixture_path", &self.campus_solutions.fixture_path)?;
        let mut fetcher = FixtureFetcher::new(fixture_path.clone());
        for name in ["enrollment_terms", "enrollment_term", "academic_plan", "user_attributes"] {
            fetcher = fetcher.with_fixture(&self.endpoint(name).url, &format!("{}.json", name));
        }
        Ok(Arc::new(fetcher))
    }

    pub fn cache_store(&self) -> Arc<RemoteFetchCache<FeedEnvelope>> {
        Arc::new(
            RemoteFetchCache::new().with_stale_on_error(self.campus_solutions.serve_stale_on_error.unwrap_or(false)),
        )
    }

    pub fn proxy_client(
        &self,
        name: &str,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<RemoteFetchCache<FeedEnvelope>>,
        flags: Arc<ConfigFeatureFlags>,
    ) -> ProxyClient {
        let client = ProxyClient::new(self.endpoint(name), CacheConfig::new(store, self.cache_expiry()), fetcher)
            .with_identity_param(&self.identity_param())
            .with_language(&self.language_cd());
        match self.endpoint_config(name).feature_flag {
            Some(flag) => client.with_feature_flag(flags, &flag),
            None => client,
        }
    }

    /// 組裝 proxy、功能旗標、連結與角色成 aggregator
    /// college-and-level feed 由外部提供
    pub fn build_aggregator(&self, college_and_level: Arc<dyn CollegeAndLevelSource>) -> Result<EnrollmentAggregator> {
        self.validate()?;
        let fetcher = self.fetcher()?;
        let store = self.cache_store();
        let flags = Arc::new(self.feature_flags());
        let client = |name: &str| self.proxy_client(name, fetcher.clone(), store.clone(), flags.clone());

        let sources = EnrollmentSources {
            enrollment_terms: client("enrollment_terms"),
            enrollment_term: client("enrollment_term"),
            academic_plan: client("academic_plan"),
        };
        let collaborators = Collaborators {
            flags: flags.clone(),
            roles: Arc::new(UserAttributesRoles::new(client("user_attributes"))),
            college_and_level,
            links: Arc::new(self.link_resolver()),
        };

        Ok(EnrollmentAggregator::new(sources, collaborators, self.aggregator_settings()))
    }
}

impl Validate for FeedsConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
