use clap::Parser;
use ila_match::config::{LoggingSettings, Settings};
use ila_match::models::{BusinessProfileInput, Locale};
use ila_match::RegistryStore;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Score, match and export a list of businesses
#[derive(Parser, Debug)]
#[command(name = "ila-match", version, about)]
struct Args {
    /// JSON array of business profiles to register
    input: PathBuf,
    /// Generate pitch content for each business' best match in this locale (fr, en, es)
    #[arg(short, long)]
    locale: Option<Locale>,
}

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let args = Args::parse();

    let loaded = Settings::load();
    let logging = loaded
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default();
    init_logging(&logging);

    let settings = loaded.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    let store = RegistryStore::from_settings(&settings)?;

    let raw = std::fs::read_to_string(&args.input)?;
    let inputs: Vec<BusinessProfileInput> = serde_json::from_str(&raw)?;
    info!("Registering {} businesses from {}", inputs.len(), args.input.display());

    let mut registered = Vec::with_capacity(inputs.len());
    for input in inputs {
        let name = input.name.clone();
        match store.add_business(input).await {
            Ok(profile) => registered.push(profile),
            Err(e) => warn!("Skipping {}: {}", name, e),
        }
    }

    if let Some(locale) = args.locale {
        let mut requested = HashSet::new();
        for profile in &registered {
            let best = store.get_matches(&profile.id).await?.into_iter().next();
            if let Some(best) = best.filter(|m| requested.insert(m.id.clone())) {
                // Failures are recorded on the match and shown in the export
                if let Err(e) = store.request_content(&best.id, locale.as_str()).await {
                    warn!("No content for {}: {}", profile.name, e);
                }
            }
        }
    }

    println!("{}", store.export_json().await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_flag_forms() {
        let short = Args::try_parse_from(["ila-match", "in.json", "-l", "es"]).unwrap();
        let inline = Args::try_parse_from(["ila-match", "in.json", "--locale=fr"]).unwrap();

        assert_eq!(short.locale, Some(Locale::Es));
        assert_eq!(inline.locale, Some(Locale::Fr));
        assert_eq!(inline.input, PathBuf::from("in.json"));
    }

    #[test]
    fn test_locale_is_optional() {
        let args = Args::try_parse_from(["ila-match", "in.json"]).unwrap();
        assert!(args.locale.is_none());
    }

    #[test]
    fn test_rejects_unsupported_locale_and_missing_input() {
        assert!(Args::try_parse_from(["ila-match", "in.json", "--locale", "de"]).is_err());
        assert!(Args::try_parse_from(["ila-match", "--locale", "fr"]).is_err());
    }
}
