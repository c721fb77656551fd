use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sun_moon_dial::{
    DialConfig, DialImageGenerator, DirectorySink, ImageRequest, IpGeolocationProvider, TtlCache,
};

/// Render a 24-hour sun and moon dial for one location as a JPEG.
#[derive(Parser, Debug)]
#[command(name = "sun_moon_dial", version, about)]
struct Args {
    /// Place name shown as the dial title
    #[arg(long)]
    location: String,

    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// IANA time zone of the location, e.g. America/New_York
    #[arg(long, default_value = "UTC", value_parser = parse_time_zone)]
    time_zone: Tz,

    /// Calendar date (YYYY-MM-DD); today in the location's time zone if omitted
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Output file name inside the output directory
    #[arg(long, default_value = "dial.jpg")]
    output: String,

    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    #[arg(long, default_value = "cache/astronomy.json")]
    cache_file: PathBuf,

    #[arg(long, env = "IPGEOLOCATION_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long)]
    regular_font: Option<PathBuf>,

    #[arg(long)]
    bold_font: Option<PathBuf>,
}

fn parse_time_zone(value: &str) -> Result<Tz, String> {
    value.parse::<Tz>().map_err(|e| e.to_string())
}

fn init_tracing() {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let provider = match IpGeolocationProvider::new() {
        Ok(provider) => provider,
        Err(e) => {
            error!("Could not build HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut config = DialConfig::default();
    if let Some(path) = args.regular_font {
        config.regular_font = path;
    }
    if let Some(path) = args.bold_font {
        config.bold_font = path;
    }

    let cache = TtlCache::open(&args.cache_file);
    let generator = DialImageGenerator::new(provider, &cache, DirectorySink::new(&args.output_dir), config);

    let request = ImageRequest {
        location: args.location,
        file_name: args.output,
        lat: args.lat,
        lon: args.lon,
        api_key: args.api_key,
        time_zone: args.time_zone,
        date_override: args.date,
    };

    if generator.create_image(&request) {
        info!("Dial written to {}", args.output_dir.join(&request.file_name).display());
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
