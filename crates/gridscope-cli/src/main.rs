// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod demo;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::{Config, SourceKind};
use demo::DemoSource;
use gridscope_app::{GridCommand, GridState};
use gridscope_source::HttpSource;
use runtime::{Backend, SourceRuntime};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `gridscope --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    init_logging(&config)?;

    let backend = build_backend(&config, options.demo).with_context(|| {
        format!(
            "invalid [source] config in {}; fix kind/base_url/timeout values",
            options.config_path.display()
        )
    })?;

    if options.check_only {
        if let Backend::Http(source) = &backend {
            source.ping()?;
        }
        println!("ok: {}", backend.describe());
        return Ok(());
    }

    let mut state = GridState::with_columns(config.columns());
    let filter = options
        .filter
        .clone()
        .unwrap_or_else(|| config.initial_filter().to_owned());
    state.dispatch(GridCommand::SetFilter(filter));

    info!(source = %backend.describe(), "starting gridscope");
    let mut runtime = SourceRuntime::new(backend);
    let result = gridscope_tui::run_app(&mut state, &mut runtime);
    info!(ok = result.is_ok(), "gridscope exited");
    result
}

fn build_backend(config: &Config, force_demo: bool) -> Result<Backend> {
    let kind = if force_demo {
        SourceKind::Demo
    } else {
        config.source_kind()
    };
    match kind {
        SourceKind::Http => Ok(Backend::Http(HttpSource::new(
            config.base_url(),
            config.timeout()?,
        )?)),
        SourceKind::Demo => Ok(Backend::Demo(DemoSource::new(
            config.demo_seed(),
            config.demo_copies(),
            config.data_latency()?,
            config.detail_latency()?,
        ))),
    }
}

// The terminal belongs to the TUI, so logs go to a file.
fn init_logging(config: &Config) -> Result<()> {
    let filter = config.log_filter();
    let env_filter = EnvFilter::try_new(&filter)
        .map_err(|error| anyhow!("invalid log filter {filter:?}: {error}"))?;

    let path = config.log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| {
            format!(
                "open log file {}; set [log].path to a writable location",
                path.display()
            )
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    demo: bool,
    filter: Option<String>,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        demo: false,
        filter: None,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--filter" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--filter requires the text to match"))?;
                options.filter = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("gridscope: filterable grid with a per-row details panel");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Use the built-in demo source regardless of [source].kind");
    println!("  --filter <text>          Start with this filter text");
    println!("  --check                  Validate config and reach the source, then exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, build_backend, parse_cli_args};
    use crate::config::Config;
    use crate::runtime::Backend;
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/gridscope-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                demo: false,
                filter: None,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_and_filter() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml", "--filter", "Bloomberg ID"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(options.filter.as_deref(), Some("Bloomberg ID"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--filter"], default_options_path())
            .expect_err("missing filter value should fail");
        assert!(error.to_string().contains("--filter requires"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check", "--demo"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(options.demo);
        assert!(!options.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn demo_flag_overrides_http_source() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "version = 1\n[source]\nkind = \"http\"\nbase_url = \"http://localhost:9/api\"\n",
        )?;
        let config = Config::load(&path)?;

        assert!(matches!(build_backend(&config, false)?, Backend::Http(_)));
        assert!(matches!(build_backend(&config, true)?, Backend::Demo(_)));
        Ok(())
    }
}
