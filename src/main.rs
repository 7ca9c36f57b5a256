mod cli;

use clap::Parser;
use cli::{Args, Command};
use owo_colors::OwoColorize;
use sbom_cataloger::adapters::outbound::analyzers::{DpkgAnalyzer, PythonPackageAnalyzer};
use sbom_cataloger::adapters::outbound::console::{QuietProgressReporter, StderrProgressReporter};
use sbom_cataloger::adapters::outbound::distro::OsReleaseDetector;
use sbom_cataloger::application::dto::{CatalogRequest, OutputFormat};
use sbom_cataloger::application::factories::{PresenterFactory, PresenterType};
use sbom_cataloger::application::source::SourceOptions;
use sbom_cataloger::application::use_cases::{CatalogSourceUseCase, ConvertDocumentUseCase};
use sbom_cataloger::cataloging::domain::Scope;
use sbom_cataloger::config::{self, ConfigFile};
use sbom_cataloger::ports::inbound::{CatalogingPort, ConversionPort};
use sbom_cataloger::ports::outbound::{PackageAnalyzer, ProgressReporter};
use sbom_cataloger::shared::error::{CatalogerError, ExitCode};
use sbom_cataloger::shared::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Effective options for a catalog run after merging config and flags
#[derive(Debug)]
struct CatalogSettings {
    source: String,
    format: OutputFormat,
    scope: Scope,
    file: Option<PathBuf>,
    analyzers: Option<Vec<String>>,
    work_dir: Option<PathBuf>,
    max_file_size: Option<u64>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_tracing();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::InvalidArguments
            } else {
                ExitCode::Success
            };
            return exit_code(code);
        }
    };

    let code = match run(args).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            print_error(&e);
            ExitCode::ApplicationError
        }
    };
    exit_code(code)
}

fn exit_code(code: ExitCode) -> std::process::ExitCode {
    std::process::ExitCode::from(code.as_i32() as u8)
}

/// Logs go to stderr; `RUST_LOG` overrides the default `warn` level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_error(e: &anyhow::Error) {
    eprintln!("\n{}\n", "❌ An error occurred:".red().bold());
    eprintln!("{}", e);

    // Display error chain
    for cause in e.chain().skip(1) {
        eprintln!("\n{} {}", "Caused by:".yellow(), cause);
    }

    eprintln!();
}

async fn run(args: Args) -> Result<()> {
    match args.command {
        Some(Command::Convert {
            ref document,
            output,
            ref file,
        }) => {
            if args.quiet {
                convert(QuietProgressReporter, document, output, file.clone())
            } else {
                convert(StderrProgressReporter::new(), document, output, file.clone())
            }
        }
        None => {
            let config = load_config(args.config.as_deref())?;
            let settings = resolve_settings(&args, config.unwrap_or_default())?;
            if args.quiet {
                catalog(QuietProgressReporter, settings).await
            } else {
                catalog(StderrProgressReporter::new(), settings).await
            }
        }
    }
}

/// Loads the explicit config file, or the one in the current directory
fn load_config(path: Option<&Path>) -> Result<Option<ConfigFile>> {
    match path {
        Some(path) => config::load_config_from_path(path).map(Some),
        None => config::discover_config(&std::env::current_dir()?),
    }
}

/// Merges config values with command-line flags; flags win
fn resolve_settings(args: &Args, config: ConfigFile) -> Result<CatalogSettings> {
    let source = args
        .source
        .clone()
        .ok_or_else(|| anyhow::anyhow!("a source to catalog is required"))?;

    let format = match args.output {
        Some(format) => format,
        None => config.output_format()?.unwrap_or_default(),
    };
    let scope = match args.scope {
        Some(scope) => scope,
        None => config.scope()?.unwrap_or(Scope::Squashed),
    };
    let analyzers = if args.analyzers.is_empty() {
        config.analyzers
    } else {
        Some(args.analyzers.clone())
    };

    Ok(CatalogSettings {
        source,
        format,
        scope,
        file: args.file.clone().or(config.file),
        analyzers,
        work_dir: config.work_dir,
        max_file_size: config.max_file_size,
    })
}

async fn catalog<PR>(progress_reporter: PR, settings: CatalogSettings) -> Result<()>
where
    PR: ProgressReporter + 'static,
{
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            signal_token.cancel();
        }
    });

    let mut options = SourceOptions {
        cancel,
        work_dir: settings.work_dir,
        ..SourceOptions::default()
    };
    if let Some(max_file_size) = settings.max_file_size {
        options.max_file_size = max_file_size;
    }

    let analyzers: Vec<Arc<dyn PackageAnalyzer>> = vec![
        Arc::new(DpkgAnalyzer::new()),
        Arc::new(PythonPackageAnalyzer::new()),
    ];
    let use_case = CatalogSourceUseCase::new(
        analyzers,
        Arc::new(OsReleaseDetector::new()),
        progress_reporter,
        options,
    );

    let mut request = CatalogRequest::new(settings.source, settings.scope, settings.format);
    if let Some(names) = settings.analyzers {
        request = request.with_analyzers(names);
    }

    let response = use_case.catalog(request).await?;
    print_warnings(&response.warnings);

    PresenterFactory::create(PresenterType::from_output(settings.file))
        .present(&response.document)
}

fn convert<PR: ProgressReporter>(
    progress_reporter: PR,
    document: &Path,
    target: OutputFormat,
    file: Option<PathBuf>,
) -> Result<()> {
    let content = std::fs::read(document).map_err(|e| CatalogerError::FileReadError {
        path: document.to_path_buf(),
        details: e.to_string(),
    })?;

    let use_case = ConvertDocumentUseCase::new(progress_reporter);
    let encoded = use_case.convert(&content, target)?;

    PresenterFactory::create(PresenterType::from_output(file)).present(&encoded)
}

fn print_warnings(warnings: &[CatalogerError]) {
    if warnings.is_empty() {
        return;
    }
    eprintln!(
        "\n{}",
        format!("⚠️  Catalog completed with {} warning(s):", warnings.len()).yellow()
    );
    for warning in warnings {
        let summary = warning.to_string();
        let first_line = summary.lines().next().unwrap_or_default();
        eprintln!("   - {}", first_line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_resolve_settings_defaults() {
        let settings =
            resolve_settings(&args(&["sbom-cataloger", "."]), ConfigFile::default()).unwrap();
        assert_eq!(settings.source, ".");
        assert_eq!(settings.format, OutputFormat::Json);
        assert_eq!(settings.scope, Scope::Squashed);
        assert!(settings.file.is_none());
        assert!(settings.analyzers.is_none());
    }

    #[test]
    fn test_resolve_settings_uses_config() {
        let config = ConfigFile {
            output: Some("spdx-json".to_string()),
            scope: Some("all-layers".to_string()),
            file: Some(PathBuf::from("out.json")),
            analyzers: Some(vec!["python".to_string()]),
            max_file_size: Some(1024),
            ..ConfigFile::default()
        };
        let settings = resolve_settings(&args(&["sbom-cataloger", "."]), config).unwrap();
        assert_eq!(settings.format, OutputFormat::SpdxJson);
        assert_eq!(settings.scope, Scope::AllLayers);
        assert_eq!(settings.file, Some(PathBuf::from("out.json")));
        assert_eq!(settings.analyzers, Some(vec!["python".to_string()]));
        assert_eq!(settings.max_file_size, Some(1024));
    }

    #[test]
    fn test_resolve_settings_flags_override_config() {
        let config = ConfigFile {
            output: Some("spdx-json".to_string()),
            analyzers: Some(vec!["python".to_string()]),
            ..ConfigFile::default()
        };
        let settings = resolve_settings(
            &args(&[
                "sbom-cataloger",
                ".",
                "-o",
                "cyclonedx-json",
                "--analyzers",
                "dpkg",
            ]),
            config,
        )
        .unwrap();
        assert_eq!(
            settings.format,
            OutputFormat::from_str("cyclonedx-json").unwrap()
        );
        assert_eq!(settings.analyzers, Some(vec!["dpkg".to_string()]));
    }
}
