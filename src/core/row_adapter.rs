use crate::core::term_dates::{DefaultDates, TermDateResolver};
use crate::domain::model::{RowValue, SectionRow};
use crate::utils::error::Result;
use chrono::NaiveDate;

/// Date format of the evaluation worksheets.
pub const WORKSHEET_DATE_FORMAT: &str = "%m-%d-%Y";

/// Fixed downstream routing tag carried by every course row.
pub const BLUE_ROLE: &str = "23";

const CCN_LIST_KEYS: [&str; 2] = ["co_scheduled_ccns", "cross_listed_ccns"];

const COURSE_NAME_KEYS: [&str; 5] = [
    "dept_name",
    "catalog_id",
    "instruction_format",
    "section_num",
    "course_title_short",
];

/// Reshapes warehouse rows into evaluation course/enrollment records. Rows
/// must be adapted exactly once.
#[derive(Clone)]
pub struct RowAdapter {
    dates: TermDateResolver,
}

impl RowAdapter {
    pub fn new(dates: TermDateResolver) -> Self {
        Self { dates }
    }

    pub fn adapt_courses(&self, rows: &mut [SectionRow], term_code: &str) -> Result<()> {
        let default_dates = self.dates.resolve(term_code)?;
        tracing::debug!(
            "Adapting {} course rows for {} (default dates {} to {})",
            rows.len(),
            term_code,
            default_dates.start,
            default_dates.end
        );
        for row in rows.iter_mut() {
            adapt_course(row, term_code, &default_dates);
        }
        Ok(())
    }

    pub fn adapt_enrollments(&self, rows: &mut [SectionRow], term_code: &str) {
        for row in rows.iter_mut() {
            adapt_course_id(row, term_code);
        }
    }
}

/// Order matters: course_cntl_num must be read before section_id is removed.
pub fn adapt_course(row: &mut SectionRow, term_code: &str, default_dates: &DefaultDates) {
    uniq_ccn_lists(row);
    adapt_course_name(row);
    adapt_course_cntl_num(row);
    adapt_course_id(row, term_code);
    adapt_cross_listed_flag(row);
    adapt_dates(row, default_dates);
    adapt_evaluation_type(row);
    adapt_instructor_func(row);
    adapt_primary_secondary_cd(row);
    row.insert("blue_role", BLUE_ROLE);
}

pub fn uniq_ccn_lists(row: &mut SectionRow) {
    for key in CCN_LIST_KEYS {
        let Some(list) = row.get_str(key).filter(|s| !s.trim().is_empty()) else {
            continue;
        };
        let mut ccns: Vec<&str> = Vec::new();
        for ccn in list.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            if !ccns.contains(&ccn) {
                ccns.push(ccn);
            }
        }
        if ccns.len() > 1 {
            let joined = ccns.join(",");
            row.insert(key, joined.as_str());
        } else {
            row.remove(key);
        }
    }
}

pub fn adapt_course_name(row: &mut SectionRow) {
    if row.get_non_null("dept_name").is_none() {
        return;
    }
    let name = COURSE_NAME_KEYS
        .iter()
        .map(|key| row.get(key).map(RowValue::display).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ");
    row.insert("course_name", name.as_str());
}

pub fn adapt_course_cntl_num(row: &mut SectionRow) {
    if let Some(section_id) = row.get_non_null("section_id").cloned() {
        row.insert("course_cntl_num", section_id);
    }
}

pub fn adapt_course_id(row: &mut SectionRow, term_code: &str) {
    if row.get_non_null("section_id").is_none() {
        return;
    }
    if let Some(section_id) = row.remove("section_id") {
        let course_id = format!("{}-{}", term_code, section_id.display());
        row.insert("course_id", course_id.as_str());
    }
}

pub fn adapt_cross_listed_flag(row: &mut SectionRow) {
    if row.is_present("cross_listed_ccns") {
        row.insert("cross_listed_flag", "Y");
    }
}

fn parse_row_date(value: &RowValue) -> Option<NaiveDate> {
    match value {
        RowValue::Date(date) => Some(*date),
        RowValue::Text(text) => {
            let text = text.trim();
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
                .ok()
        }
        RowValue::Null => None,
    }
}

/// Drops both dates when they match the default range. Otherwise marks the
/// row modular and formats the dates for the worksheet.
pub fn adapt_dates(row: &mut SectionRow, default_dates: &DefaultDates) {
    let (Some(start), Some(end)) = (row.get_non_null("start_date"), row.get_non_null("end_date")) else {
        return;
    };
    let start = parse_row_date(start);
    let end = parse_row_date(end);

    if start == Some(default_dates.start) && end == Some(default_dates.end) {
        row.remove("start_date");
        row.remove("end_date");
        return;
    }

    row.insert("modular_course", "Y");
    for (key, date) in [("start_date", start), ("end_date", end)] {
        match date {
            Some(date) => {
                let formatted = date.format(WORKSHEET_DATE_FORMAT).to_string();
                row.insert(key, formatted.as_str());
            }
            None => tracing::warn!("Unparseable {} left as-is: {:?}", key, row.get(key)),
        }
    }
}

pub fn adapt_evaluation_type(row: &mut SectionRow) {
    let evaluation_type = match row.get_str("affiliations") {
        Some(a) if a.contains("STUDENT") => RowValue::text("G"),
        Some(a) if a.contains("INSTRUCTOR") => RowValue::text("F"),
        _ => RowValue::Null,
    };
    row.insert("evaluation_type", evaluation_type);
}

pub fn adapt_instructor_func(row: &mut SectionRow) {
    if !row.contains_key("role_code") {
        return;
    }
    let func = match row.get_str("role_code").map(str::trim) {
        Some("PI") => RowValue::text("1"),
        Some("TNIC") => RowValue::text("2"),
        Some("ICNT") => RowValue::text("3"),
        Some("INVT") => RowValue::text("4"),
        _ => RowValue::Null,
    };
    row.insert("instructor_func", func);
}

pub fn adapt_primary_secondary_cd(row: &mut SectionRow) {
    let Some(primary) = row.get_non_null("primary") else {
        return;
    };
    let cd = match primary.as_str() {
        Some(p) if p.trim().eq_ignore_ascii_case("true") => "P",
        _ => "S",
    };
    row.insert("primary_secondary_cd", cd);
}
