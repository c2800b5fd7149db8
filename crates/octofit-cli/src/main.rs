// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use octofit_api::{Client, resolve_endpoint};
use octofit_app::{ResourceLabels, TableProjection, ViewCommand, ViewState};
use octofit_tui::{AppRuntime, ViewOptions};
use runtime::{ApiRuntime, DemoRuntime};
use std::env;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
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
            "load config {}; run `octofit --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let context = config.endpoint_context(options.resource.as_deref(), |name| {
        env::var(name).ok()
    });
    if options.print_endpoint {
        println!("{}", resolve_endpoint(&context));
        return Ok(());
    }

    init_tracing(&config, options.dump || options.check_only)?;

    let labels = ResourceLabels::for_resource(&context.resource);
    let view_options = ViewOptions {
        labels,
        columns: config.columns(),
    };
    let query = options.query.clone().unwrap_or_default();

    if options.demo {
        let mut runtime = DemoRuntime::new(&context.resource, octofit_app::demo_activities());
        return launch(&mut runtime, &options, view_options, query);
    }

    let timeout = config.timeout()?;
    let client = Client::from_context(&context, timeout).with_context(|| {
        format!(
            "invalid [api] config in {}; fix codespace_name/host_suffix/base_url/timeout values",
            options.config_path.display()
        )
    })?;
    tracing::info!(endpoint = client.endpoint(), ?timeout, "api client ready");

    let mut runtime = ApiRuntime::new(client);
    launch(&mut runtime, &options, view_options, query)
}

fn launch<R: AppRuntime>(
    runtime: &mut R,
    options: &CliOptions,
    view_options: ViewOptions,
    query: String,
) -> Result<()> {
    if options.check_only {
        return Ok(());
    }

    if options.dump {
        let table = dump_table(
            runtime,
            &view_options.labels,
            &query,
            view_options.columns.as_deref(),
        )?;
        print!("{table}");
        return Ok(());
    }

    let mut state = ViewState::default();
    state.dispatch(ViewCommand::SetQuery(query));
    octofit_tui::run_app(&mut state, runtime, view_options)
}

/// One synchronous fetch rendered as aligned text, or the error banner text.
fn dump_table<R: AppRuntime>(
    runtime: &mut R,
    labels: &ResourceLabels,
    query: &str,
    columns: Option<&[String]>,
) -> Result<String> {
    let items = runtime
        .fetch_records()
        .map_err(|error| anyhow!(labels.error_message(&format!("{error:#}"))))?;
    Ok(TableProjection::build(&items, query, columns).to_plain_text())
}

fn init_tracing(config: &Config, to_stderr: bool) -> Result<()> {
    let filter = match env::var("OCTOFIT_LOG") {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::try_new(&directive)
            .with_context(|| format!("invalid OCTOFIT_LOG filter {directive:?}"))?,
        _ => EnvFilter::try_new(config.log_level())
            .with_context(|| format!("invalid [log].level {:?}", config.log_level()))?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    // The TUI owns the terminal, so interactive runs log to a file.
    let installed = if to_stderr {
        builder.with_writer(io::stderr).try_init()
    } else {
        let path = config.log_file()?;
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
                    "open log file {} -- set [log].file to a writable path",
                    path.display()
                )
            })?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    };
    installed.map_err(|error| anyhow!("install log subscriber: {error}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_endpoint: bool,
    print_example: bool,
    resource: Option<String>,
    query: Option<String>,
    dump: bool,
    demo: bool,
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
        print_endpoint: false,
        print_example: false,
        resource: None,
        query: None,
        dump: false,
        demo: false,
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
            "--resource" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--resource requires a name, for example teams"))?;
                let resource = value.as_ref().trim_matches('/');
                if resource.is_empty() {
                    return Err(anyhow!("--resource must not be empty"));
                }
                options.resource = Some(resource.to_owned());
            }
            "--query" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--query requires filter text"))?;
                options.query = Some(value.as_ref().to_owned());
            }
            "--endpoint" => {
                options.print_endpoint = true;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--dump" => {
                options.dump = true;
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
    println!("octofit");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --endpoint               Print the resolved API endpoint");
    println!("  --resource <name>        Browse another API resource (default activities)");
    println!("  --query <text>           Start with a filter applied");
    println!("  --dump                   Fetch once and print the table as plain text");
    println!("  --demo                   Use built-in sample records instead of the API");
    println!("  --check                  Validate config and the API client, then exit");
    println!("  --help                   Show this help");
}
