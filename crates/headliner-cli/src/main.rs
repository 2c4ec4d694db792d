use clap::Parser;
use headliner_api::{GNewsClient, GeoClient};
use headliner_core::{
    providers::{GNewsProvider, IpLocationProvider, NominatimGeocoder},
    ArticleCache, Config, FixedRegion, GlobalFeed, LocaleProvider, LocationFeed, LocationResolver,
    NewsSource, PermissionState, SearchFeed, SystemLocale,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

#[derive(Parser)]
#[command(name = "headliner")]
#[command(version, about = "Terminal news reader: global, local and search feeds", long_about = None)]
struct Cli {
    /// GNews API key (overrides the config file)
    #[arg(long, env = "HEADLINER_API_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Top headlines worldwide
    Global,
    /// Headlines for where you are
    Local {
        /// Skip precise location and use only the system region
        #[arg(long)]
        no_geolocation: bool,
        /// Timeout for each location lookup
        #[arg(long, default_value_t = 10)]
        wait_secs: u64,
    },
    /// Search articles, local matches first
    Search {
        /// Search query
        query: String,
        /// Country to prioritise (defaults to the system region)
        #[arg(long)]
        country: Option<String>,
    },
    /// Show the config file location and effective settings
    Config {
        /// Write a config file with default settings if none exists
        #[arg(long)]
        init: bool,
    },
}

/// Long-lived services shared by every feed
struct Services {
    source: Arc<dyn NewsSource>,
    cache: Arc<ArticleCache>,
    locale: Arc<dyn LocaleProvider>,
}

impl Services {
    fn build(config: &Config) -> anyhow::Result<Self> {
        if config.api.token.is_none() {
            tracing::warn!("No API token configured; requests will likely be rejected");
        }

        let client = GNewsClient::with_base_url(config.api.token.clone(), config.api.base_url.clone())?
            .with_language(config.api.language.clone())
            .with_max_articles(config.api.max_articles);

        let locale: Arc<dyn LocaleProvider> = match config.location.region {
            Some(ref region) => Arc::new(FixedRegion(Some(region.clone()))),
            None => Arc::new(SystemLocale),
        };

        Ok(Self {
            source: Arc::new(GNewsProvider::new(client)),
            cache: Arc::new(ArticleCache::with_settings(
                config.cache.ttl(),
                config.cache.capacity,
            )),
            locale,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "headliner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(token) = cli.token {
        config.api.token = Some(token);
    }

    match cli.command {
        Some(Commands::Global) => {
            let services = Services::build(&config)?;
            let feed = GlobalFeed::new(services.source, services.cache);
            feed.refresh().await;
            render::print_feed("Top headlines", &feed.state());
        }
        Some(Commands::Local {
            no_geolocation,
            wait_secs,
        }) => {
            let services = Services::build(&config)?;
            run_local(&config, services, no_geolocation, Duration::from_secs(wait_secs)).await?;
        }
        Some(Commands::Search { query, country }) => {
            let services = Services::build(&config)?;
            let country = country
                .map(|c| c.trim().to_lowercase())
                .or_else(|| services.locale.region_code());

            tracing::info!("Searching for: {}", query);
            let feed = SearchFeed::new(services.source, services.cache);
            feed.refresh(&query, country.as_deref()).await;
            render::print_feed(&format!("Results for \"{}\"", query.trim()), &feed.state());
        }
        Some(Commands::Config { init }) => {
            let path = Config::config_path()?;
            if init {
                if path.exists() {
                    println!("Config already exists at {}", path.display());
                } else {
                    let written = Config::default().save()?;
                    println!("Wrote default config to {}", written.display());
                }
            }
            println!("# {}", path.display());
            print!("{}", config.redacted().to_toml()?);
        }
        None => {
            println!("No command specified. Try --help");
        }
    }

    Ok(())
}

/// Device region right away, precise location as soon as it shows up
async fn run_local(
    config: &Config,
    services: Services,
    no_geolocation: bool,
    wait: Duration,
) -> anyhow::Result<()> {
    let geo = Arc::new(
        GeoClient::with_urls(
            config.location.geolocation_url.clone(),
            config.location.geocoder_url.clone(),
        )?
        .with_timeout(wait),
    );
    let permission = if no_geolocation {
        PermissionState::Denied
    } else {
        config.location.permission
    };
    let provider = Arc::new(IpLocationProvider::new(
        geo.clone(),
        permission,
        config.location.grant_on_request,
    ));
    let geocoder = Arc::new(NominatimGeocoder::new(geo));

    let feed = LocationFeed::new(services.source, services.cache, services.locale);
    let resolver = LocationResolver::new(provider, geocoder);

    feed.refresh(&resolver).await;
    tracing::debug!("Location resolver finished as {:?}", resolver.state());

    let state = feed.state();
    let title = match state.country {
        Some(ref country) => format!("Headlines for {}", country.to_uppercase()),
        None => "Local headlines".to_string(),
    };
    render::print_feed(&title, &state);
    Ok(())
}
