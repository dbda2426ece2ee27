use async_trait::async_trait;
use enrollment_feeds::domain::ports::CollegeAndLevelSource;
use enrollment_feeds::utils::logger;
use enrollment_feeds::{FeedsConfig, Result};
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

struct NoPlans;

#[async_trait]
impl CollegeAndLevelSource for NoPlans {
    async fn college_and_level(&self, _student_id: &str) -> Result<Option<Value>> {
        Ok(Some(json!({"plans": [], "holds": {"hasHolds": false}})))
    }
}

fn config_toml(base_url: &str) -> String {
    format!(
        r#"
[campus_solutions]
base_url = "{}"
timeout_seconds = 5

[features]
cs_enrollment_card = true

[links]
UC_CX_GT_SSCNTENRL_VIEW = "https://cs.example.edu/view"
"#,
        base_url
    )
}

#[tokio::test]
async fn test_aggregator_from_config_over_http() {
    logger::try_init_test_logger();
    let server = MockServer::start();

    let attributes = server.mock(|when, then| {
        when.method(GET)
            .path("/UC_CC_USER_ATTRIBUTES.v1/get")
            .query_param("SCC_PROFILE_ID", "61889");
        then.status(200)
            .json_body(json!({"ROLES": {"STUDENT": true}}));
    });
    let terms = server.mock(|when, then| {
        when.method(GET)
            .path("/UC_SR_CURR_TERMS.v1/GetCurrentItems")
            .query_param("SCC_PROFILE_ID", "61889")
            .query_param("languageCd", "ENG");
        then.status(200)
            .json_body(json!({"ENROLLMENT_TERMS": {"TERM_ID": "2168", "TERM_DESCR": "2016 Fall", "ACAD_CAREER": "UGRD"}}));
    });
    let term = server.mock(|when, then| {
        when.method(GET)
            .path("/UC_SR_STDNT_CLASS_ENROLL.v1/Get")
            .query_param("STRM", "2168");
        then.status(200)
            .json_body(json!({"ENROLLMENT_TERM": {"TERM_ID": "2168", "ENROLLED_CLASSES": []}}));
    });
    let planner = server.mock(|when, then| {
        when.method(GET)
            .path("/UC_SR_ACADEMIC_PLANNER.v1/get")
            .query_param("STRM", "2168");
        then.status(503).body("Service Unavailable");
    });

    let config = FeedsConfig::from_toml_str(&config_toml(&server.base_url())).unwrap();
    let aggregator = config.build_aggregator(Arc::new(NoPlans)).unwrap();

    let feed = aggregator.build("61889").await.unwrap();

    attributes.assert();
    terms.assert();
    term.assert();
    planner.assert();
    assert_eq!(feed["enrollmentTermInstructions"]["2168"]["termId"], "2168");
    assert_eq!(feed["enrollmentTermAcademicPlanner"], json!({}));
    assert_eq!(feed["enrollmentTermInstructionTypes"], json!([]));
    assert_eq!(feed["hasHolds"], false);
    assert_eq!(feed["links"], json!({"ucViewClassEnrollment": "https://cs.example.edu/view"}));
}

#[tokio::test]
async fn test_non_student_from_attributes_feed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/UC_CC_USER_ATTRIBUTES.v1/get");
        then.status(200)
            .json_body(json!({"ROLES": {"STUDENT": false, "APPLICANT": true}}));
    });
    let terms = server.mock(|when, then| {
        when.method(GET).path("/UC_SR_CURR_TERMS.v1/GetCurrentItems");
        then.status(200).json_body(json!({"ENROLLMENT_TERMS": []}));
    });

    let config = FeedsConfig::from_toml_str(&config_toml(&server.base_url())).unwrap();
    let aggregator = config.build_aggregator(Arc::new(NoPlans)).unwrap();

    assert_eq!(aggregator.build("61889").await.unwrap(), json!({}));
    terms.assert_hits(0);
}

#[tokio::test]
async fn test_fake_mode_reads_fixtures() {
    let dir = TempDir::new().unwrap();
    let write = |name: &str, body: Value| {
        std::fs::write(dir.path().join(name), body.to_string()).unwrap();
    };
    write("user_attributes.json", json!({"ROLES": {"STUDENT": true}}));
    write(
        "enrollment_terms.json",
        json!({"ENROLLMENT_TERMS": [{"TERM_ID": "2172", "TERM_DESCR": "2017 Spring", "ACAD_CAREER": "UGRD"}]}),
    );
    write("enrollment_term.json", json!({"ENROLLMENT_TERM": {"TERM_ID": "2172"}}));
    write("academic_plan.json", json!({"PLANNED_CLASSES": []}));

    let toml_content = config_toml("https://cs.example.edu").replace(
        "timeout_seconds = 5",
        &format!("timeout_seconds = 5\nfake = true\nfixture_path = \"{}\"", dir.path().display()),
    );
    let config = FeedsConfig::from_toml_str(&toml_content).unwrap();
    assert!(config.is_fake());

    let feed = config
        .build_aggregator(Arc::new(NoPlans))
        .unwrap()
        .build("61889")
        .await
        .unwrap();

    assert_eq!(feed["enrollmentTermInstructions"]["2172"]["termId"], "2172");
    assert_eq!(feed["enrollmentTermAcademicPlanner"]["2172"], json!({"plannedClasses": []}));
}

#[test]
fn test_invalid_config_is_rejected_before_wiring() {
    let config = FeedsConfig::from_toml_str(&config_toml("not-a-url")).unwrap();
    assert!(config.build_aggregator(Arc::new(NoPlans)).is_err());
}
