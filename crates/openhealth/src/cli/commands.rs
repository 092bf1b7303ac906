//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::records::{NewProfile, NewVisit};

/// Map command arguments: nearby resources ranked by distance.
#[derive(Debug, Args)]
pub struct MapCommand {
    /// Only show these resource types (comma-separated or repeated)
    #[arg(short = 't', long = "type", value_name = "TYPE", value_delimiter = ',')]
    pub types: Vec<String>,

    /// Case-insensitive search over name and address
    #[arg(short, long)]
    pub search: Option<String>,

    /// Query origin and radius
    #[command(flatten)]
    pub location: LocationArgs,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Directory command arguments: browse without a distance cut-off.
#[derive(Debug, Args)]
pub struct DirectoryCommand {
    /// Only show these resource types (comma-separated or repeated)
    #[arg(short = 't', long = "type", value_name = "TYPE", value_delimiter = ',')]
    pub types: Vec<String>,

    /// Case-insensitive search over name, address and notes
    #[arg(short, long)]
    pub search: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Categories command arguments.
#[derive(Debug, Args)]
pub struct CategoriesCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Advise command arguments: weather-driven recommendations.
#[derive(Debug, Args)]
pub struct AdviseCommand {
    /// Current temperature in degrees Celsius
    #[arg(long, allow_negative_numbers = true)]
    pub temp: Option<f64>,

    /// Weather description, e.g. "light rain"
    #[arg(long)]
    pub desc: Option<String>,

    /// City to ask the weather provider about
    #[arg(long)]
    pub city: Option<String>,

    /// Query origin and radius
    #[command(flatten)]
    pub location: LocationArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Query origin and radius shared by location-aware commands.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct LocationArgs {
    /// Latitude of the query origin
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of the query origin
    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Search radius in kilometers
    #[arg(short, long)]
    pub radius: Option<f64>,
}

/// Health profile commands.
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Register a new profile and print its id
    Register {
        /// Profile fields
        #[command(flatten)]
        fields: ProfileFields,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Replace the fields of an existing profile
    Update {
        /// Profile id
        id: String,

        /// Profile fields
        #[command(flatten)]
        fields: ProfileFields,
    },

    /// Show a profile and its visits
    Show {
        /// Profile id
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Record a provider visit
    Visit {
        /// Profile id
        id: String,

        /// Visit time (YYYY-MM-DDTHH:MM); defaults to now
        #[arg(short, long)]
        when: Option<String>,

        /// Clinic, team or worker who saw the person
        #[arg(short, long, default_value = "")]
        provider: String,

        /// Clinical summary
        #[arg(short, long, default_value = "")]
        summary: String,
    },

    /// Print the card data for a profile as JSON
    Card {
        /// Profile id
        id: String,
    },

    /// Show record store counts
    Stats,
}

/// Editable profile fields.
#[derive(Debug, Clone, Default, Args)]
pub struct ProfileFields {
    /// Nickname (never a legal name)
    #[arg(short, long, default_value = "")]
    pub alias: String,

    /// Birth year
    #[arg(short, long)]
    pub birth_year: Option<i32>,

    /// Chronic conditions
    #[arg(long, default_value = "")]
    pub conditions: String,

    /// Current medications
    #[arg(long, default_value = "")]
    pub meds: String,

    /// Known allergies
    #[arg(long, default_value = "")]
    pub allergies: String,

    /// Critical flags (anticoagulants, epilepsy, ...)
    #[arg(long, default_value = "")]
    pub critical_flags: String,

    /// Notes for medical staff
    #[arg(long, default_value = "")]
    pub notes: String,
}

impl From<ProfileFields> for NewProfile {
    fn from(fields: ProfileFields) -> Self {
        Self {
            alias: fields.alias,
            birth_year: fields.birth_year,
            conditions: fields.conditions,
            meds: fields.meds,
            allergies: fields.allergies,
            critical_flags: fields.critical_flags,
            notes: fields.notes,
        }
    }
}

/// Build visit input from command arguments.
#[must_use]
pub fn new_visit(when: Option<String>, provider: String, summary: String) -> NewVisit {
    NewVisit {
        when,
        provider,
        summary,
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
    /// CSV in the dataset layout (resource listings only)
    Csv,
}
