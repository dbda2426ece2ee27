pub mod toml_config;

pub use toml_config::{
    AggregatorConfig, CampusSolutionsConfig, EndpointConfig, EndpointsConfig, FeedsConfig, TermConfig,
    TermDatesConfig,
};
