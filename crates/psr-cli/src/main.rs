// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;

use anyhow::{Context, Result, anyhow};
use config::{Config, parse_port};
use logging::LogTarget;
use psr_app::{AppState, ViewMode};
use psr_data::{Cleaned, LoadOptions};
use psr_web::DashboardServer;
use std::env;
use std::path::PathBuf;
use tracing::info;

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
            "load config {}; run `psr-dashboard --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    let settings = Settings::resolve(&options, &config)?;

    logging::init(
        config.log_level(),
        &LogTarget::for_mode(options.serve, config.log_file()),
    )?;

    let cleaned = if options.demo {
        psr_data::demo_cleaned().context("build demo rule table")?
    } else {
        let load_options = LoadOptions {
            sheet: settings.sheet.clone(),
        };
        psr_data::load_with(&settings.data_path, &load_options)
            .context("load product specific rules")?
    };

    if options.check_only {
        println!("{}", check_report(&settings, options.demo, &cleaned));
        return Ok(());
    }

    if options.serve {
        let addr = format!("{}:{}", settings.bind, settings.port);
        let server = DashboardServer::bind(&addr, cleaned.table, settings.view)?;
        info!(addr = %server.local_addr(), "serving dashboard");
        return server.serve();
    }

    let mut state = AppState::new(settings.view);
    psr_tui::run_app(&mut state, &cleaned.table)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    data_path: Option<PathBuf>,
    sheet: Option<String>,
    view: Option<ViewMode>,
    bind: Option<String>,
    port: Option<u16>,
    serve: bool,
    demo: bool,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn next_value<I, S>(iter: &mut I, flag: &str, what: &str) -> Result<String>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    iter.next()
        .map(|value| value.as_ref().to_owned())
        .ok_or_else(|| anyhow!("{flag} requires {what}"))
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        data_path: None,
        sheet: None,
        view: None,
        bind: None,
        port: None,
        serve: false,
        demo: false,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = next_value(&mut iter, "--config", "a file path")?;
                options.config_path = PathBuf::from(value);
            }
            "--data" => {
                let value = next_value(&mut iter, "--data", "a spreadsheet path")?;
                options.data_path = Some(PathBuf::from(value));
            }
            "--sheet" => {
                options.sheet = Some(next_value(&mut iter, "--sheet", "a worksheet name")?);
            }
            "--view" => {
                let value = next_value(&mut iter, "--view", "table or treemap")?;
                let view = ViewMode::parse(&value)
                    .ok_or_else(|| anyhow!("--view must be table or treemap, got {value:?}"))?;
                options.view = Some(view);
            }
            "--bind" => {
                options.bind = Some(next_value(&mut iter, "--bind", "an address")?);
            }
            "--port" => {
                let value = next_value(&mut iter, "--port", "a port number")?;
                options.port = Some(parse_port(&value).context("--port")?);
            }
            "--serve" => {
                options.serve = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
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

/// Effective runtime settings: CLI flags, then the config file, then
/// environment variables, then built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    data_path: PathBuf,
    sheet: Option<String>,
    view: ViewMode,
    bind: String,
    port: u16,
}

impl Settings {
    fn resolve(options: &CliOptions, config: &Config) -> Result<Self> {
        let port = match options.port {
            Some(port) => port,
            None => config.port()?,
        };
        Ok(Self {
            data_path: options
                .data_path
                .clone()
                .unwrap_or_else(|| config.data_path()),
            sheet: options
                .sheet
                .clone()
                .or_else(|| config.sheet().map(str::to_owned)),
            view: options.view.unwrap_or_else(|| config.view()),
            bind: options.bind.clone().unwrap_or_else(|| config.bind()),
            port,
        })
    }
}

fn check_report(settings: &Settings, demo: bool, cleaned: &Cleaned) -> String {
    let source = if demo {
        "demo data".to_owned()
    } else {
        settings.data_path.display().to_string()
    };
    let summary = &cleaned.summary;
    format!(
        "{source}: {} rules in {} chapters ({} rows read; dropped {} without chapter/subheading, {} with blank rules, {} duplicate subheadings)",
        summary.kept_rows,
        cleaned.table.chapter_count(),
        summary.raw_rows,
        summary.missing_key_rows,
        summary.blank_rule_rows,
        summary.duplicate_rows,
    )
}

fn print_help() {
    println!("psr-dashboard: CKFTA product specific rules browser");
    println!("  --config <path>          Use a specific config path");
    println!("  --data <path>            Spreadsheet to load (.xlsx, .xlsm, .csv)");
    println!("  --sheet <name>           Worksheet name (default: first sheet)");
    println!("  --view <table|treemap>   Initial view");
    println!("  --serve                  Serve the web dashboard instead of the terminal UI");
    println!("  --bind <addr>            Web bind address (default 0.0.0.0, env HOST)");
    println!("  --port <port>            Web port (default 8050, env PORT)");
    println!("  --demo                   Use built-in sample rules instead of a spreadsheet");
    println!("  --check                  Load and clean the data, print a summary, and exit");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, Settings, check_report, parse_cli_args};
    use crate::config::Config;
    use anyhow::Result;
    use psr_app::ViewMode;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/psr-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                data_path: None,
                sheet: None,
                view: None,
                bind: None,
                port: None,
                serve: false,
                demo: false,
                print_config_path: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_reads_value_flags() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--config",
                "/custom/config.toml",
                "--data",
                "annex.csv",
                "--sheet",
                "Annex 3-A",
                "--view",
                "treemap",
                "--bind",
                "127.0.0.1",
                "--port",
                "9000",
                "--serve",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(options.data_path, Some(PathBuf::from("annex.csv")));
        assert_eq!(options.sheet.as_deref(), Some("Annex 3-A"));
        assert_eq!(options.view, Some(ViewMode::Treemap));
        assert_eq!(options.bind.as_deref(), Some("127.0.0.1"));
        assert_eq!(options.port, Some(9000));
        assert!(options.serve);
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        for flag in ["--config", "--data", "--sheet", "--view", "--bind", "--port"] {
            let error = parse_cli_args(vec![flag], default_options_path())
                .expect_err("missing value should fail");
            assert!(error.to_string().contains(&format!("{flag} requires")));
        }
    }

    #[test]
    fn parse_cli_args_rejects_bad_view_and_port() {
        let error = parse_cli_args(vec!["--view", "grid"], default_options_path())
            .expect_err("unknown view should fail");
        assert!(error.to_string().contains("table or treemap"));

        let error = parse_cli_args(vec!["--port", "0"], default_options_path())
            .expect_err("port zero should fail");
        assert!(format!("{error:#}").contains("between 1 and 65535"));
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
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check", "--demo"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(options.demo);
        assert!(!options.serve);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn cli_flags_win_over_config_values() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "version = 1\n[data]\npath = \"/from/config.xlsx\"\nsheet = \"Config\"\n[server]\nbind = \"127.0.0.1\"\nport = 9000\n[ui]\nview = \"table\"\n",
        )?;
        let config = Config::load(&path)?;
        let options = parse_cli_args(
            vec![
                "--data",
                "/from/cli.csv",
                "--sheet",
                "Cli",
                "--view",
                "treemap",
                "--bind",
                "::1",
                "--port",
                "9100",
            ],
            path.clone(),
        )?;

        let settings = Settings::resolve(&options, &config)?;
        assert_eq!(
            settings,
            Settings {
                data_path: PathBuf::from("/from/cli.csv"),
                sheet: Some("Cli".to_owned()),
                view: ViewMode::Treemap,
                bind: "::1".to_owned(),
                port: 9100,
            }
        );

        let config_only = Settings::resolve(
            &parse_cli_args(Vec::<String>::new(), path)?,
            &config,
        )?;
        assert_eq!(config_only.data_path, PathBuf::from("/from/config.xlsx"));
        assert_eq!(config_only.sheet.as_deref(), Some("Config"));
        assert_eq!(config_only.port, 9000);
        Ok(())
    }

    #[test]
    fn check_report_summarizes_demo_data() -> Result<()> {
        let cleaned = psr_data::demo_cleaned()?;
        let settings = Settings {
            data_path: PathBuf::from("annex.xlsx"),
            sheet: None,
            view: ViewMode::Table,
            bind: "0.0.0.0".to_owned(),
            port: 8050,
        };
        let report = check_report(&settings, true, &cleaned);
        assert!(report.starts_with("demo data: 19 rules in 7 chapters"));
        assert!(report.contains("1 duplicate subheadings"));
        Ok(())
    }
}
