pub mod aggregator;
pub mod cache;
pub mod career_terms;
pub mod hash_converter;
pub mod oec;
pub mod proxy;
pub mod row_adapter;
pub mod term_codes;
pub mod term_dates;

pub use crate::domain::model::{CareerTermRole, FeedEnvelope, ProxyResponse, SectionRow};
pub use crate::domain::ports::{Fetcher, RowSource, TermCatalog};
pub use crate::utils::error::Result;
