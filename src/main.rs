//! `ckanft`: compare stored CKAN API responses and prepare fixtures.
//!
//! ```text
//! ckanft check --expected stable/package_show.json --actual /tmp/response.json --recursive
//! ckanft scrub /tmp/response.json --clean > stable/package_show.json
//! ```

#![forbid(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use ckanft::ckan_version::CkanVersion;
use ckanft::comparisons::{AnySupersetOf, SupersetOptions};
use ckanft::config::SuiteVariables;
use ckanft::fixtures::{
    clean_unstable_elements, load_fixture, load_vars, strip_unstable_data, substitute_vars,
};
use ckanft::pattern_cache::PatternCache;
use clap::Parser;
use cli::{CheckArgs, Cli, Command, ScrubArgs};
use serde_json::Value;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match main_impl() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn main_impl() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let vars = SuiteVariables::resolve(cli.config.as_deref()).context("loading suite variables")?;
    if !PatternCache::install_global(vars.pattern_cache_capacity) {
        tracing::warn!(
            event = "pattern_cache.configure",
            capacity = vars.pattern_cache_capacity,
            "pattern cache already initialised; keeping its capacity"
        );
    }

    match cli.command {
        Command::Check(args) => run_check(&args, &vars),
        Command::Scrub(args) => run_scrub(&args, &vars).map(|()| ExitCode::SUCCESS),
    }
}

fn resolve_version(flag: Option<&str>, vars: &SuiteVariables) -> Result<CkanVersion> {
    let version = match flag {
        Some(raw) => raw.parse()?,
        None => vars.ckan_version()?,
    };
    Ok(version)
}

fn run_check(args: &CheckArgs, vars: &SuiteVariables) -> Result<ExitCode> {
    let expected = load_fixture(&args.expected)
        .with_context(|| format!("reading expected response {}", args.expected.display()))?;
    let actual = load_fixture(&args.actual)
        .with_context(|| format!("reading actual response {}", args.actual.display()))?;

    let version = resolve_version(args.ckan_version.as_deref(), vars)?;
    let expected = version.adapt_expected(&expected);

    let matcher = AnySupersetOf::new(expected)
        .options(SupersetOptions {
            recursive: args.recursive,
            seq_norm_order: args.normalize_order,
        })
        .build();
    tracing::debug!(event = "cli.check", %version, expected = %matcher);

    match matcher.explain(&actual) {
        None => {
            println!("match");
            Ok(ExitCode::SUCCESS)
        }
        Some(mismatch) => {
            println!("mismatch {mismatch}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_scrub(args: &ScrubArgs, vars: &SuiteVariables) -> Result<()> {
    let mut value: Value = load_fixture(&args.file)
        .with_context(|| format!("reading response {}", args.file.display()))?;

    if args.ckan_version.is_some() || vars.ckan_version.is_some() {
        let version = resolve_version(args.ckan_version.as_deref(), vars)?;
        value = version.adapt_expected(&value);
    }
    value = scrub(value, args.clean, args.strip);
    if let Some(path) = &args.vars {
        let substitutions = load_vars(path)?;
        value = substitute_vars(&value, &substitutions)
            .with_context(|| format!("substituting variables from {}", path.display()))?;
    }

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Placeholder cleaning runs before stripping.
fn scrub(mut value: Value, clean: bool, strip: bool) -> Value {
    if clean {
        clean_unstable_elements(&mut value);
    }
    if strip {
        value = strip_unstable_data(&value);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_then_strip_keeps_nothing_unstable() {
        let stored = json!({
            "id": "org-id",
            "name": "example-org",
            "package_count": 3,
            "extras": [{"key": "harvest_source_id", "value": "h-1"}, {"key": "sector", "value": "x"}],
            "users": [{"name": "admin", "id": "u-1"}],
        });
        assert_eq!(
            scrub(stored, true, true),
            json!({
                "name": "example-org",
                "extras": [{"key": "sector", "value": "<<sector-value>>"}],
                "users": [{"name": "admin"}],
            })
        );
    }

    #[test]
    fn each_step_runs_alone() {
        let stored = json!({"id": "root", "owner_org": "o", "tags": [{"id": "t"}]});
        assert_eq!(
            scrub(stored.clone(), true, false),
            json!({"id": "root", "owner_org": "<<owner_org>>", "tags": [{"id": "<<id>>"}]})
        );
        assert_eq!(scrub(stored.clone(), false, true), json!({"tags": [{}]}));
        assert_eq!(scrub(stored.clone(), false, false), stored);
    }
}
