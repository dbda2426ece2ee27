use crate::domain::model::{RowQuery, RowValue, SectionRow};
use crate::domain::ports::RowSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::Path;

/// 倉儲查詢結果的 CSV 匯出：每個查詢名稱對應 `{base_path}/{name}.csv`
#[derive(Debug, Clone)]
pub struct CsvRowSource {
    base_path: String,
}

impl CsvRowSource {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

fn parse_cell(cell: &str) -> RowValue {
    if cell.is_empty() {
        return RowValue::Null;
    }
    if cell.len() == 10 {
        if let Ok(date) = NaiveDate::parse_from_str(cell, "%Y-%m-%d") {
            return RowValue::Date(date);
        }
    }
    RowValue::text(cell)
}

/// 參數名稱對應到欄位時必須相符，其餘參數忽略
fn matches(row: &SectionRow, query: &RowQuery) -> bool {
    query.params.iter().all(|(key, expected)| match row.get(key) {
        Some(value) => value.display() == *expected,
        None => true,
    })
}

#[async_trait]
impl RowSource for CsvRowSource {
    async fn fetch_rows(&self, query: &RowQuery) -> Result<Vec<SectionRow>> {
        let path = Path::new(&self.base_path).join(format!("{}.csv", query.name));
        let mut reader = csv::Reader::from_path(&path)?;
        let headers = reader.headers()?.clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: SectionRow = headers
                .iter()
                .zip(record.iter())
                .map(|(header, cell)| (header, parse_cell(cell)))
                .collect();
            if matches(&row, query) {
                rows.push(row);
            }
        }

        tracing::debug!("{}: {} rows matched {:?}", query.name, rows.len(), query.params);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_rows_are_filtered_and_typed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("sections.csv"),
            "term_id,section_id,start_date,cross_listed_ccns\n\
             2168,31031,2016-08-24,\n\
             2168,31032,,31032\n\
             2172,40001,,\n",
        )
        .unwrap();

        let source = CsvRowSource::new(dir.path().to_str().unwrap().to_string());
        let rows = source
            .fetch_rows(&RowQuery::new("sections").param("term_id", "2168").param("ldap_uid", "30"))
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].get("start_date"),
            Some(&RowValue::Date(NaiveDate::from_ymd_opt(2016, 8, 24).unwrap()))
        );
        assert_eq!(rows[0].get("cross_listed_ccns"), Some(&RowValue::Null));
        assert_eq!(rows[1].get_str("section_id"), Some("31032"));
    }

    #[tokio::test]
    async fn test_missing_export_is_an_error() {
        let dir = TempDir::new().unwrap();
        let source = CsvRowSource::new(dir.path().to_str().unwrap().to_string());

        assert!(source.fetch_rows(&RowQuery::new("nope")).await.is_err());
    }
}
