// Concrete backends behind the core traits
pub mod geo;
pub mod gnews;

pub use geo::{IpLocationProvider, NominatimGeocoder};
pub use gnews::GNewsProvider;
