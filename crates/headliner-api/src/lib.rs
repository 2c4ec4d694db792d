// HTTP clients for the outside services we read from
pub mod geo;
pub mod gnews;

// Re-export common types
pub use geo::{GeoClient, GeoError, GeoFix};
pub use gnews::{ArticlesEnvelope, GNewsArticle, GNewsClient, GNewsError, GNewsSource};
