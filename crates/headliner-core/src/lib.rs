// Core logic: the article model, location resolution and the three feeds
pub mod config;
pub mod error;
pub mod feeds;
pub mod locale;
pub mod location;
pub mod models;
pub mod providers;
pub mod source;

pub use config::Config;
pub use error::Error;
pub use feeds::{ArticleCache, GlobalFeed, LocationFeed, SearchFeed};
pub use locale::{FixedRegion, LocaleProvider, SystemLocale};
pub use location::{
    LocationFailure, LocationProvider, LocationResolver, LocationSignal, PermissionState,
    ResolverState, ReverseGeocoder,
};
pub use models::{Article, FeedState};
pub use source::NewsSource;

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
