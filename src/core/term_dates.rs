use crate::core::term_codes;
use crate::domain::model::Term;
use crate::domain::ports::TermCatalog;
use crate::utils::error::{EnrollmentError, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What to do when the date already falls on the target weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekdayRoll {
    /// First matching weekday strictly after the date.
    StrictlyNext,
    /// Matching weekday of the following Monday-based calendar week.
    FollowingWeek,
}

pub fn roll_forward(date: NaiveDate, weekday: Weekday, roll: WeekdayRoll) -> NaiveDate {
    match roll {
        WeekdayRoll::StrictlyNext => {
            let current = date.weekday().num_days_from_monday() as i64;
            let target = weekday.num_days_from_monday() as i64;
            let mut days = (target - current).rem_euclid(7);
            if days == 0 {
                days = 7;
            }
            date + Duration::days(days)
        }
        WeekdayRoll::FollowingWeek => {
            let next_monday =
                date - Duration::days(date.weekday().num_days_from_monday() as i64) + Duration::days(7);
            next_monday + Duration::days(weekday.num_days_from_monday() as i64)
        }
    }
}

/// Heuristic bridging legacy term data and warehouse section dates. Only
/// valid for the term regime it was tuned on; swap it per regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultDatePolicy {
    pub start_offset_days: i64,
    pub start_weekday: Weekday,
    pub end_offset_days: i64,
    pub end_weekday: Weekday,
    pub roll: WeekdayRoll,
}

impl Default for DefaultDatePolicy {
    fn default() -> Self {
        Self {
            start_offset_days: 7,
            start_weekday: Weekday::Wed,
            end_offset_days: -21,
            end_weekday: Weekday::Fri,
            roll: WeekdayRoll::StrictlyNext,
        }
    }
}

impl DefaultDatePolicy {
    pub fn apply(&self, term: &Term) -> DefaultDates {
        DefaultDates {
            start: roll_forward(
                term.classes_start + Duration::days(self.start_offset_days),
                self.start_weekday,
                self.roll,
            ),
            end: roll_forward(
                term.classes_end + Duration::days(self.end_offset_days),
                self.end_weekday,
                self.roll,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultDates {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Clone)]
pub struct TermDateResolver {
    catalog: Arc<dyn TermCatalog>,
    policy: DefaultDatePolicy,
}

impl TermDateResolver {
    pub fn new(catalog: Arc<dyn TermCatalog>, policy: DefaultDatePolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn policy(&self) -> &DefaultDatePolicy {
        &self.policy
    }

    /// Term code → default class date range.
    pub fn resolve(&self, term_code: &str) -> Result<DefaultDates> {
        let slug = term_codes::to_slug(term_code)?;
        let term = self
            .catalog
            .lookup_term(&slug)
            .ok_or(EnrollmentError::UnknownTerm { slug })?;
        Ok(self.policy.apply(&term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapCatalog(HashMap<String, Term>);

    impl TermCatalog for MapCatalog {
        fn lookup_term(&self, slug: &str) -> Option<Term> {
            self.0.get(slug).cloned()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn resolver(policy: DefaultDatePolicy) -> TermDateResolver {
        let term = Term {
            slug: "fall-2016".to_string(),
            classes_start: date(2016, 8, 10),
            classes_end: date(2016, 12, 23),
        };
        let catalog = MapCatalog(HashMap::from([(term.slug.clone(), term)]));
        TermDateResolver::new(Arc::new(catalog), policy)
    }

    #[test]
    fn test_strictly_next_skips_same_weekday() {
        // 2016-08-31 is a Wednesday
        assert_eq!(
            roll_forward(date(2016, 8, 31), Weekday::Wed, WeekdayRoll::StrictlyNext),
            date(2016, 9, 7)
        );
        assert_eq!(
            roll_forward(date(2016, 8, 29), Weekday::Wed, WeekdayRoll::StrictlyNext),
            date(2016, 8, 31)
        );
    }

    #[test]
    fn test_following_week_uses_calendar_week() {
        assert_eq!(
            roll_forward(date(2016, 8, 29), Weekday::Wed, WeekdayRoll::FollowingWeek),
            date(2016, 9, 7)
        );
        assert_eq!(
            roll_forward(date(2016, 9, 4), Weekday::Fri, WeekdayRoll::FollowingWeek),
            date(2016, 9, 9)
        );
    }

    #[test]
    fn test_reference_term_window() {
        let dates = resolver(DefaultDatePolicy::default()).resolve("2016-D").unwrap();

        assert_eq!(dates.start, date(2016, 8, 24));
        assert_eq!(dates.end, date(2016, 12, 9));
    }

    #[test]
    fn test_both_roll_modes_agree_on_reference_term() {
        let policy = DefaultDatePolicy {
            roll: WeekdayRoll::FollowingWeek,
            ..DefaultDatePolicy::default()
        };
        let dates = resolver(policy).resolve("2168").unwrap();

        assert_eq!(dates.start, date(2016, 8, 24));
        assert_eq!(dates.end, date(2016, 12, 9));
    }

    #[test]
    fn test_unknown_term() {
        let err = resolver(DefaultDatePolicy::default()).resolve("2017-B").unwrap_err();
        assert!(matches!(err, EnrollmentError::UnknownTerm { slug } if slug == "spring-2017"));
    }
}
