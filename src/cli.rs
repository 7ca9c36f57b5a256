use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sbom_cataloger::application::dto::OutputFormat;
use sbom_cataloger::cataloging::domain::Scope;

/// Catalog packages in directories and container images
#[derive(Parser, Debug)]
#[command(name = "sbom-cataloger")]
#[command(version)]
#[command(
    about = "Catalog packages in directories and container images",
    long_about = None
)]
#[command(subcommand_negates_reqs = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Source to catalog: a directory, `dir:PATH` or `docker-archive:FILE.tar`
    #[arg(required = true, value_name = "SOURCE")]
    pub source: Option<String>,

    /// Output format: json, spdx-json or cyclonedx-json
    #[arg(short, long, value_name = "FORMAT")]
    pub output: Option<OutputFormat>,

    /// Image scope: squashed (default) or all-layers
    #[arg(short, long)]
    pub scope: Option<Scope>,

    /// Write the document to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Config file (defaults to ./sbom-cataloger.config.yml when present)
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Comma-separated analyzers to run, e.g. python,dpkg
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub analyzers: Vec<String>,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode an existing document and re-encode it in another format
    Convert {
        /// Native JSON or SPDX JSON document to read
        document: PathBuf,

        /// Target format: json, spdx-json or cyclonedx-json
        #[arg(short, long, value_name = "FORMAT")]
        output: OutputFormat,

        /// Write the document to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_source_with_options() {
        let args = Args::try_parse_from([
            "sbom-cataloger",
            "docker-archive:app.tar",
            "-o",
            "spdx-json",
            "-s",
            "all-layers",
            "--analyzers",
            "python,dpkg",
        ])
        .unwrap();

        assert!(args.command.is_none());
        assert_eq!(args.source.as_deref(), Some("docker-archive:app.tar"));
        assert_eq!(args.output, Some(OutputFormat::SpdxJson));
        assert_eq!(args.scope, Some(Scope::AllLayers));
        assert_eq!(args.analyzers, vec!["python", "dpkg"]);
        assert!(!args.quiet);
    }

    #[test]
    fn test_parse_defaults() {
        let args = Args::try_parse_from(["sbom-cataloger", "."]).unwrap();
        assert!(args.output.is_none());
        assert!(args.scope.is_none());
        assert!(args.file.is_none());
        assert!(args.config.is_none());
        assert!(args.analyzers.is_empty());
    }

    #[test]
    fn test_source_is_required() {
        let err = Args::try_parse_from(["sbom-cataloger"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_invalid_format_rejected() {
        let result = Args::try_parse_from(["sbom-cataloger", ".", "-o", "markdown"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_convert_subcommand() {
        let args = Args::try_parse_from([
            "sbom-cataloger",
            "convert",
            "sbom.json",
            "-o",
            "cyclonedx-json",
            "--quiet",
        ])
        .unwrap();

        assert!(args.quiet);
        match args.command {
            Some(Command::Convert {
                document,
                output,
                file,
            }) => {
                assert_eq!(document, PathBuf::from("sbom.json"));
                assert_eq!(output, OutputFormat::CycloneDxJson);
                assert!(file.is_none());
            }
            None => panic!("expected convert subcommand"),
        }
    }

    #[test]
    fn test_convert_requires_output() {
        let result = Args::try_parse_from(["sbom-cataloger", "convert", "sbom.json"]);
        assert!(result.is_err());
    }
}
