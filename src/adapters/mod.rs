// Adapters layer: concrete implementations of the domain ports (http, fixtures,
// warehouse rows, catalog, flags, links, roles).

pub mod catalog;
pub mod csv_rows;
pub mod fixture;
pub mod flags;
pub mod http;
pub mod links;
pub mod roles;

pub use catalog::StaticTermCatalog;
pub use csv_rows::CsvRowSource;
pub use fixture::FixtureFetcher;
pub use flags::ConfigFeatureFlags;
pub use http::ReqwestFetcher;
pub use links::ConfigLinkResolver;
pub use roles::UserAttributesRoles;
