use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use weather_core::{Config, WeatherService};

use crate::display;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Current weather for a city")]
pub struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Without a subcommand the city is asked for interactively.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and request URL templates.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name, e.g. "Krakow".
        city: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Command::Configure) => configure(),
            Some(Command::Show { city }) => show(&city).await,
            None => match prompt(Text::new("City to fetch weather data for:").prompt())? {
                Some(city) if !city.trim().is_empty() => show(city.trim()).await,
                Some(_) => {
                    println!("No city entered.");
                    Ok(())
                }
                None => Ok(()),
            },
        }
    }
}

async fn show(city: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let service = WeatherService::from_config(&config)?;

    match service.lookup(city).await {
        Ok(lookup) => println!("{}", display::render_lookup(city, &lookup)),
        Err(err) => println!("{}", display::error_message(&err)),
    }

    Ok(())
}

fn configure() -> anyhow::Result<()> {
    // Environment overrides are not written back to disk.
    let mut config = Config::load_file()?;

    let mut key_prompt = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation();
    if config.api_key().is_some() {
        key_prompt = key_prompt.with_help_message("Leave empty to keep the current key");
    }
    let Some(api_key) = prompt(key_prompt.prompt())? else {
        return Ok(());
    };
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }

    let Some(geocoding_url) = prompt(
        Text::new("Geocoding URL template:")
            .with_default(&config.geocoding_url)
            .with_help_message("Placeholders: {City}, {APIkey}")
            .prompt(),
    )?
    else {
        return Ok(());
    };
    config.geocoding_url = geocoding_url;

    let Some(weather_url) = prompt(
        Text::new("Weather URL template:")
            .with_default(&config.weather_url)
            .with_help_message("Placeholders: {lat}, {lon}, {APIkey}")
            .prompt(),
    )?
    else {
        return Ok(());
    };
    config.weather_url = weather_url;

    config.validate().context("Configuration not saved")?;
    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

/// `None` when the user cancels the prompt (Esc / Ctrl-C).
fn prompt(answer: Result<String, InquireError>) -> anyhow::Result<Option<String>> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err).context("Failed to read input"),
    }
}
