//! `ohsd` - CLI for openhealth
//!
//! This binary provides the command-line interface for finding nearby aid
//! resources and managing minimal health profiles.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{debug, warn};

use openhealth::catalog::{self, CategoryFilter, Query, ResourceCatalog, TextFilter};
use openhealth::cli::{
    new_visit, AdviseCommand, Cli, Command, ConfigCommand, DirectoryCommand, LocationArgs,
    MapCommand, OutputFormat, ProfileCommand,
};
use openhealth::records::{Profile, ProfileCard, RecordStore};
use openhealth::weather::{self, FixedWeather, NoWeather, WeatherProvider, WeatherReport};
use openhealth::{init_logging, Config, Coordinate, Error, MapView, RankedMatch, ResourceRecord};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Validation reports problems instead of failing on them
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        handle_validate(file.clone().or_else(|| cli.config.clone()));
        return Ok(());
    }

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Map(cmd) => handle_map(&config, &cmd),
        Command::Directory(cmd) => handle_directory(&config, &cmd),
        Command::Categories(cmd) => handle_categories(&config, cmd.json),
        Command::Advise(cmd) => handle_advise(&config, &cmd),
        Command::Profile(cmd) => handle_profile(&config, cmd),
        Command::Config(cmd) => handle_config(&config, &cmd),
    }
}

fn load_catalog(config: &Config) -> ResourceCatalog {
    let catalog = ResourceCatalog::load(&config.catalog.data_path);
    if catalog.is_empty() {
        warn!(
            "No resources loaded from {}",
            config.catalog.data_path.display()
        );
    }
    catalog
}

/// Resolve the query origin and radius from arguments and config.
fn resolve_location(config: &Config, location: LocationArgs) -> anyhow::Result<(Coordinate, f64)> {
    let default = config.catalog.default_origin;
    let lat = location.lat.unwrap_or(default.lat);
    let lon = location.lon.unwrap_or(default.lon);
    let origin = Coordinate::new(lat, lon).ok_or(Error::InvalidCoordinate { lat, lon })?;

    let requested = location.radius.unwrap_or(config.catalog.default_radius_km);
    let (radius_km, adjusted) = config.clamp_radius(requested);
    if adjusted {
        warn!(
            "Radius {requested} km is outside {}..={} km, using {radius_km} km",
            config.catalog.min_radius_km, config.catalog.max_radius_km
        );
    }

    Ok((origin, radius_km))
}

fn handle_map(config: &Config, cmd: &MapCommand) -> anyhow::Result<()> {
    let catalog = load_catalog(config);
    let (origin, radius_km) = resolve_location(config, cmd.location)?;

    let mut query = Query::new(origin, radius_km)
        .with_categories(CategoryFilter::only(cmd.types.iter().cloned()))
        .with_text(TextFilter::map_view(cmd.search.as_deref().unwrap_or_default()));
    if let Some(limit) = cmd.limit {
        query = query.with_limit(limit);
    }

    let matches = catalog.query(&query);
    debug!(found = matches.len(), %origin, radius_km, "Map query");

    match cmd.format {
        OutputFormat::Json => {
            let view = MapView::new(origin, &matches, &config.palette());
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        OutputFormat::Csv => {
            catalog::write_csv(matches.iter().map(|m| m.record), io::stdout().lock())?;
        }
        OutputFormat::Table => print_match_table(&matches),
        OutputFormat::Plain => {
            for m in &matches {
                println!(
                    "{:.2} km  {} ({})  {}",
                    m.distance_km,
                    m.record.display_name(),
                    m.record.category,
                    m.record.address
                );
            }
        }
    }

    if matches.is_empty() && cmd.format != OutputFormat::Json && cmd.format != OutputFormat::Csv {
        println!("No resources within {radius_km} km of {origin}.");
    }
    Ok(())
}

fn print_match_table(matches: &[RankedMatch<'_>]) {
    if matches.is_empty() {
        return;
    }
    println!(
        "{:>3}  {:>8}  {:<10}  {:<30}  Address",
        "#", "Distance", "Type", "Name"
    );
    println!("{}", "-".repeat(80));
    for (index, m) in matches.iter().enumerate() {
        println!(
            "{:>3}  {:>5.2} km  {:<10}  {:<30}  {}",
            index + 1,
            m.distance_km,
            truncate(&m.record.category, 10),
            truncate(m.record.display_name(), 30),
            m.record.address
        );
    }
}

fn handle_directory(config: &Config, cmd: &DirectoryCommand) -> anyhow::Result<()> {
    let catalog = load_catalog(config);
    let categories = CategoryFilter::only(cmd.types.iter().cloned());
    let text = TextFilter::directory_view(cmd.search.as_deref().unwrap_or_default());
    let records = catalog.browse(&categories, &text);

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Csv => catalog::write_csv(records.iter().copied(), io::stdout().lock())?,
        OutputFormat::Table => {
            if !records.is_empty() {
                println!(
                    "{:<10}  {:<30}  {:<30}  {:<12}  Phone",
                    "Type", "Name", "Address", "Hours"
                );
                println!("{}", "-".repeat(100));
            }
            for record in &records {
                println!(
                    "{:<10}  {:<30}  {:<30}  {:<12}  {}",
                    truncate(&record.category, 10),
                    truncate(record.display_name(), 30),
                    truncate(&record.address, 30),
                    truncate(record.hours.as_deref().unwrap_or_default(), 12),
                    record.phone.as_deref().unwrap_or_default()
                );
            }
        }
        OutputFormat::Plain => {
            for record in &records {
                print_record(record);
                println!();
            }
        }
    }
    Ok(())
}

fn print_record(record: &ResourceRecord) {
    println!("{} ({})", record.display_name(), record.category);
    println!("  Address: {}", record.address);
    if let Some(hours) = &record.hours {
        println!("  Hours:   {hours}");
    }
    if let Some(phone) = &record.phone {
        println!("  Phone:   {phone}");
    }
    if let Some(notes) = &record.notes {
        println!("  Notes:   {notes}");
    }
}

fn handle_categories(config: &Config, json: bool) -> anyhow::Result<()> {
    let catalog = load_catalog(config);
    let categories = catalog.categories();
    if json {
        println!("{}", serde_json::to_string_pretty(&categories)?);
    } else {
        let palette = config.palette();
        for category in &categories {
            let [r, g, b] = palette.color_for(category).0;
            println!("{category:<12} rgb({r}, {g}, {b})");
        }
    }
    Ok(())
}

fn handle_advise(config: &Config, cmd: &AdviseCommand) -> anyhow::Result<()> {
    let city = cmd
        .city
        .clone()
        .unwrap_or_else(|| config.weather.default_city.clone());

    let report = match cmd.temp {
        Some(temp_c) => FixedWeather(WeatherReport {
            temp_c,
            description: cmd.desc.clone().unwrap_or_default(),
        })
        .current(&city),
        None => NoWeather.current(&city),
    };

    let report = match report {
        Ok(report) => report,
        Err(err) => {
            println!("Weather unavailable for {city}: {err}");
            return Ok(());
        }
    };

    let catalog = load_catalog(config);
    let (origin, radius_km) = resolve_location(config, cmd.location)?;
    let advisory = weather::advise(
        &catalog,
        report,
        origin,
        radius_km,
        config.weather.recommend_limit,
        &config.thresholds(),
    );

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&advisory)?),
        OutputFormat::Csv => bail!("CSV output is only available for resource listings"),
        OutputFormat::Plain | OutputFormat::Table => {
            println!(
                "{city}: {:.1} °C, {}",
                advisory.report.temp_c, advisory.report.description
            );
            println!("{}", advisory.message);
            if !advisory.recommendations.is_empty() {
                println!();
                print_match_table(&advisory.recommendations);
            }
        }
    }
    Ok(())
}

fn handle_profile(config: &Config, cmd: ProfileCommand) -> anyhow::Result<()> {
    let store = RecordStore::open(config.database_path())
        .with_context(|| format!("opening {}", config.database_path().display()))?;

    match cmd {
        ProfileCommand::Register { fields, json } => {
            let profile = store.register(fields.into())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("Registered profile {}", profile.id);
                println!("Keep this id; providers use it to find your record.");
            }
        }
        ProfileCommand::Update { id, fields } => {
            let profile = store.update(&id, fields.into())?;
            println!("Updated profile {}", profile.id);
        }
        ProfileCommand::Show { id, format } => {
            let card = store.card(&id, config.records.card_url_prefix.as_deref())?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&card)?),
                OutputFormat::Csv => bail!("CSV output is only available for resource listings"),
                OutputFormat::Plain | OutputFormat::Table => print_card(&card),
            }
        }
        ProfileCommand::Visit {
            id,
            when,
            provider,
            summary,
        } => {
            let visit = store.add_visit(&id, new_visit(when, provider, summary))?;
            println!("Recorded visit for {} at {}", id.trim(), visit.when);
        }
        ProfileCommand::Card { id } => {
            let card = store.card(&id, config.records.card_url_prefix.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
        ProfileCommand::Stats => {
            let stats = store.stats()?;
            println!("Database:  {}", store.path().display());
            println!("Profiles:  {}", stats.profiles);
            println!("Visits:    {}", stats.visits);
        }
    }
    Ok(())
}

fn print_card(card: &ProfileCard) {
    let Profile {
        id,
        alias,
        birth_year,
        conditions,
        meds,
        allergies,
        critical_flags,
        notes,
        updated_at,
    } = &card.profile;

    println!("Profile {id}");
    println!("===============");
    println!("Alias:           {alias}");
    println!(
        "Birth year:      {}",
        birth_year.map_or_else(|| "-".to_string(), |y| y.to_string())
    );
    println!("Conditions:      {conditions}");
    println!("Medications:     {meds}");
    println!("Allergies:       {allergies}");
    println!("Critical flags:  {critical_flags}");
    println!("Notes:           {notes}");
    println!("Updated:         {}", updated_at.format("%Y-%m-%d %H:%M UTC"));
    println!("Access code:     {}", card.access_code);
    println!();

    if card.visits.is_empty() {
        println!("No visits recorded.");
        return;
    }
    println!("Visits");
    println!("------");
    for visit in &card.visits {
        println!("{}  {}", visit.when, visit.provider);
        if !visit.summary.is_empty() {
            println!("    {}", visit.summary);
        }
    }
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Catalog]");
                println!("  Data path:          {}", config.catalog.data_path.display());
                println!("  Default origin:     {}", config.catalog.default_origin);
                println!(
                    "  Radius (km):        {} (allowed {}..={})",
                    config.catalog.default_radius_km,
                    config.catalog.min_radius_km,
                    config.catalog.max_radius_km
                );
                println!();
                println!("[Palette]");
                for (category, [r, g, b]) in &config.palette.colors {
                    println!("  {category:<18}  rgb({r}, {g}, {b})");
                }
                let [r, g, b] = config.palette.fallback;
                println!("  {:<18}  rgb({r}, {g}, {b})", "(other)");
                println!();
                println!("[Weather]");
                println!("  Cold at or below:   {} °C", config.weather.cold_max_c);
                println!("  Heat at or above:   {} °C", config.weather.heat_min_c);
                println!("  Cold keyword:       {}", config.weather.cold_keyword);
                println!("  Recommendations:    {}", config.weather.recommend_limit);
                println!("  Default city:       {}", config.weather.default_city);
                println!();
                println!("[Records]");
                println!("  Database path:      {}", config.database_path().display());
                println!(
                    "  Card URL prefix:    {}",
                    config.records.card_url_prefix.as_deref().unwrap_or("(none)")
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            handle_validate(file.clone());
        }
    }
    Ok(())
}

fn handle_validate(file: Option<std::path::PathBuf>) {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => println!("Configuration error: {e}"),
    }
}

/// Cut `text` to at most `width` characters for table columns.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}
