use crate::core::row_adapter::RowAdapter;
use crate::core::term_codes;
use crate::domain::model::{RowQuery, SectionRow};
use crate::domain::ports::RowSource;
use crate::utils::error::Result;
use std::sync::Arc;

pub const COURSES_QUERY: &str = "oec_courses";
pub const ENROLLMENTS_QUERY: &str = "oec_enrollments";

/// 評鑑用課程／選課資料：從倉儲取列，再交給 RowAdapter 整理
#[derive(Clone)]
pub struct OecCourses {
    source: Arc<dyn RowSource>,
    adapter: RowAdapter,
}

impl OecCourses {
    pub fn new(source: Arc<dyn RowSource>, adapter: RowAdapter) -> Self {
        Self { source, adapter }
    }

    fn query(name: &str, term_code: &str, filter: &[(String, String)]) -> Result<RowQuery> {
        let mut query = RowQuery::new(name).param("term_id", &term_codes::to_edo_id(term_code)?);
        for (key, value) in filter {
            query = query.param(key, value);
        }
        Ok(query)
    }

    pub async fn get_courses(&self, term_code: &str, filter: &[(String, String)]) -> Result<Vec<SectionRow>> {
        let query = Self::query(COURSES_QUERY, term_code, filter)?;
        let mut rows = self.source.fetch_rows(&query).await?;
        tracing::info!("Fetched {} course rows for term {}", rows.len(), term_code);
        self.adapter.adapt_courses(&mut rows, term_code)?;
        Ok(rows)
    }

    pub async fn get_enrollments(&self, term_code: &str, filter: &[(String, String)]) -> Result<Vec<SectionRow>> {
        let query = Self::query(ENROLLMENTS_QUERY, term_code, filter)?;
        let mut rows = self.source.fetch_rows(&query).await?;
        tracing::info!("Fetched {} enrollment rows for term {}", rows.len(), term_code);
        self.adapter.adapt_enrollments(&mut rows, term_code);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term_dates::{DefaultDatePolicy, TermDateResolver};
    use crate::domain::model::Term;
    use crate::domain::ports::TermCatalog;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    struct RecordingSource {
        rows: Vec<SectionRow>,
        queries: Mutex<Vec<RowQuery>>,
    }

    #[async_trait]
    impl RowSource for RecordingSource {
        async fn fetch_rows(&self, query: &RowQuery) -> Result<Vec<SectionRow>> {
            self.queries.lock().unwrap().push(query.clone());
            Ok(self.rows.clone())
        }
    }

    struct FallOnly;

    impl TermCatalog for FallOnly {
        fn lookup_term(&self, slug: &str) -> Option<Term> {
            (slug == "fall-2016").then(|| Term {
                slug: slug.to_string(),
                classes_start: NaiveDate::from_ymd_opt(2016, 8, 10).unwrap(),
                classes_end: NaiveDate::from_ymd_opt(2016, 12, 23).unwrap(),
            })
        }
    }

    fn courses(rows: Vec<SectionRow>) -> (OecCourses, Arc<RecordingSource>) {
        let source = Arc::new(RecordingSource {
            rows,
            queries: Mutex::new(Vec::new()),
        });
        let adapter = RowAdapter::new(TermDateResolver::new(Arc::new(FallOnly), DefaultDatePolicy::default()));
        (OecCourses::new(source.clone(), adapter), source)
    }

    #[tokio::test]
    async fn test_get_courses_queries_by_warehouse_term_id() {
        let rows = vec![[("section_id", "31031"), ("dept_name", "ENGLISH")].into_iter().collect()];
        let (oec, source) = courses(rows);

        let adapted = oec
            .get_courses("2016-D", &[("dept_name".to_string(), "ENGLISH".to_string())])
            .await
            .unwrap();

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries[0].name, COURSES_QUERY);
        assert_eq!(
            queries[0].params,
            vec![
                ("term_id".to_string(), "2168".to_string()),
                ("dept_name".to_string(), "ENGLISH".to_string())
            ]
        );
        assert_eq!(adapted[0].get_str("course_id"), Some("2016-D-31031"));
        assert_eq!(adapted[0].get_str("blue_role"), Some("23"));
    }

    #[tokio::test]
    async fn test_get_enrollments_only_synthesizes_course_id() {
        let rows = vec![[("section_id", "31031"), ("ldap_uid", "1234")].into_iter().collect()];
        let (oec, _) = courses(rows);

        let adapted = oec.get_enrollments("2016-D", &[]).await.unwrap();

        assert_eq!(adapted[0].get_str("course_id"), Some("2016-D-31031"));
        assert!(!adapted[0].contains_key("blue_role"));
    }

    #[tokio::test]
    async fn test_unknown_term_fails_course_adaptation() {
        let (oec, _) = courses(vec![]);
        assert!(oec.get_courses("2017-B", &[]).await.is_err());
    }
}
