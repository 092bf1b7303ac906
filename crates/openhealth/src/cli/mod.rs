//! Command-line interface for openhealth.
//!
//! This module provides the CLI structure for the `ohsd` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    new_visit, AdviseCommand, CategoriesCommand, ConfigCommand, DirectoryCommand, LocationArgs,
    MapCommand, OutputFormat, ProfileCommand, ProfileFields,
};

/// ohsd - Find nearby help and carry your health record
///
/// Lists shelters, food, medical, hygiene and community resources near a
/// location, suggests where to go in extreme weather, and keeps minimal
/// anonymised health profiles that providers can look up by a short id.
#[derive(Debug, Parser)]
#[command(name = "ohsd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Nearby resources ranked by distance
    Map(MapCommand),

    /// Browse every resource, filtered by type and text
    Directory(DirectoryCommand),

    /// List resource types present in the catalog
    Categories(CategoriesCommand),

    /// Weather-based recommendations
    Advise(AdviseCommand),

    /// Manage health profiles and visits
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
