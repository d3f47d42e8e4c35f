//! Command-line interface for the `ckanft` binary.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ckanft")]
#[command(version, about = "Compare CKAN API responses against expected shapes and prepare fixtures")]
pub struct Cli {
    /// Suite variables file (JSON); `CKANFT_*` environment variables override it.
    #[arg(long, global = true, env = "CKANFT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that an actual response matches an expected one.
    ///
    /// Without flags the comparison is a non-recursive superset: every
    /// top-level key of the expected object must be present and equal.
    Check(CheckArgs),

    /// Scrub instance-specific data from a stored response and print it.
    Scrub(ScrubArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Expected response (JSON).
    #[arg(long)]
    pub expected: PathBuf,

    /// Actual response (JSON).
    #[arg(long)]
    pub actual: PathBuf,

    /// Apply superset semantics to nested objects and arrays.
    #[arg(long)]
    pub recursive: bool,

    /// Compare arrays without regard to element order.
    #[arg(long)]
    pub normalize_order: bool,

    /// Adapt the expected response for this CKAN version before comparing.
    #[arg(long)]
    pub ckan_version: Option<String>,
}

#[derive(Args, Debug)]
pub struct ScrubArgs {
    /// Stored response (JSON).
    pub file: PathBuf,

    /// Drop unstable keys and key-value pairs (after `--clean`, if both are given).
    #[arg(long)]
    pub strip: bool,

    /// Replace unstable values with `<<name>>` placeholders.
    #[arg(long)]
    pub clean: bool,

    /// Fill `<<name>>` placeholders from a `name=value` file.
    #[arg(long)]
    pub vars: Option<PathBuf>,

    /// Adapt the response for this CKAN version.
    #[arg(long)]
    pub ckan_version: Option<String>,
}
