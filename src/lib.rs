pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::FeedsConfig;
pub use core::{
    aggregator::EnrollmentAggregator, cache::RemoteFetchCache, oec::OecCourses, proxy::ProxyClient,
    row_adapter::RowAdapter, term_dates::TermDateResolver,
};
pub use utils::error::{EnrollmentError, Result};
