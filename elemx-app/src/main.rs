use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use elemx_config::{AppConfig, ConfigError};
use elemx_core::document::Document;
use elemx_engine::demo::populate_demo;
use elemx_engine::import::{ImportOptions, ImportReport, import_catalog};
use elemx_io::{Catalog, CatalogLoader, ExportOptions, JsonFacade};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "elemx")]
#[command(about = "Export and reconcile element catalogs against a host document")]
struct Cli {
    /// 配置文件路径，缺省时自动发现
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export the demo document as a JSON catalog
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Strip document identity so the catalog can seed other documents
        #[arg(long)]
        template: bool,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Apply a JSON catalog to the demo document
    Import {
        file: PathBuf,
        /// Create missing types by duplicating a template
        #[arg(long)]
        create_missing: bool,
        /// Repoint instances of alias types to the canonical type
        #[arg(long)]
        merge_aliases: bool,
        /// Export the reconciled document to this file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Export, re-import and export again, failing if the two exports differ
    Roundtrip,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = load_configuration(cli.config.clone());
    init_logging(&config);
    info!("启动 elemx");

    match run(cli.command, &config) {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "执行失败");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &AppConfig) -> anyhow::Result<ExitCode> {
    let mut document = Document::new();
    populate_demo(&mut document);

    match command {
        Command::Export {
            out,
            template,
            compact,
        } => {
            let options = ExportOptions {
                template: template || config.export.template,
            };
            let facade = JsonFacade::with_pretty(config.export.pretty && !compact);
            let text = export_text(&document, options, facade)?;
            emit(&text, out.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Import {
            file,
            create_missing,
            merge_aliases,
            out,
        } => {
            let catalog = JsonFacade::new()
                .load(&file)
                .with_context(|| format!("failed to load catalog {}", file.display()))?;
            let options = ImportOptions {
                create_missing: create_missing || config.import.create_missing,
                merge_aliases: merge_aliases || config.import.merge_aliases,
            };
            let report = import_catalog(&mut document, catalog, options);
            println!("{}", summary(&report));
            if let Some(path) = out {
                let facade = JsonFacade::with_pretty(config.export.pretty);
                let text = export_text(&document, ExportOptions::default(), facade)?;
                emit(&text, Some(&path))?;
            }
            if report.failed.is_empty() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Roundtrip => {
            let facade = JsonFacade::new();
            let first = export_text(&document, ExportOptions::default(), facade)?;
            let catalog = facade.decode(&first)?;
            let report = import_catalog(&mut document, catalog, ImportOptions::default());
            if !report.failed.is_empty() {
                bail!("{} record(s) failed to import", report.failed.len());
            }
            let second = export_text(&document, ExportOptions::default(), facade)?;
            if first != second {
                bail!("second export differs from the first");
            }
            println!(
                "roundtrip ok: {} records, {} bytes",
                report.outcomes().count(),
                first.len()
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn export_text(
    document: &Document,
    options: ExportOptions,
    facade: JsonFacade,
) -> anyhow::Result<String> {
    let catalog = Catalog::export_document(document, options).context("failed to export catalog")?;
    info!(records = catalog.len(), template = options.template, "已导出目录");
    Ok(facade.encode(&catalog)?)
}

fn emit(text: &str, out: Option<&Path>) -> anyhow::Result<()> {
    match out {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn summary(report: &ImportReport) -> String {
    let mut line = format!(
        "reconciled={} created={} merged={} failed={} parameter_errors={}",
        report.outcomes().count(),
        report.created(),
        report.merges.len(),
        report.failed.len(),
        report.parameter_errors(),
    );
    for failure in &report.failed {
        line.push_str(&format!(
            "\n  {} `{}`: {}",
            failure.kind.label(),
            failure.name,
            failure.error
        ));
    }
    line
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout 留给目录输出
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
