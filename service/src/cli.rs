//! Command-line interface for `gen-pandera`
//!
//! - `generate`: render a schema into Pandera/Polars model source
//! - `validate`: check JSON or YAML records against a class of a schema

use clap::{Parser, Subcommand};
use linkml_core::Value;
use linkml_core::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::generator::{Generator, PanderaGenerator};
use crate::validator::{FrameValidationError, ModelRegistry};

/// Generate Pandera validators from `LinkML` schemas
#[derive(Parser, Debug)]
#[command(name = "gen-pandera", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate model source from a schema
    Generate {
        /// Schema file path
        schema: PathBuf,

        /// Output template
        #[arg(short = 't', long = "template-path")]
        template: Option<String>,

        /// Package name recorded in the module header
        #[arg(short, long)]
        package: Option<String>,

        /// Coerce column values to their declared types
        #[arg(long)]
        coerce: bool,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate records against a class of a schema
    Validate {
        /// Schema file path
        schema: PathBuf,

        /// Data file (JSON or YAML, a list of records or one record)
        data: PathBuf,

        /// Target class name
        #[arg(short = 'C', long = "class")]
        class_name: String,

        /// Maximum errors to show
        #[arg(long, default_value = "10")]
        max_errors: usize,
    },
}

/// CLI application
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    #[must_use]
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Build the application from the process arguments
    #[must_use]
    pub fn from_args() -> Self {
        Self::new(Cli::parse())
    }

    /// Run the selected subcommand
    ///
    /// # Errors
    ///
    /// Returns an error if the schema, data or configuration cannot be
    /// loaded, generation fails or the data does not validate
    pub fn run(&self) -> Result<()> {
        self.init_logging();

        let result = match &self.cli.command {
            Commands::Generate { output, .. } => self.generate().and_then(|code| match output {
                Some(path) => {
                    std::fs::write(path, code)?;
                    info!("Wrote {}", path.display());
                    Ok(())
                }
                None => {
                    print!("{code}");
                    Ok(())
                }
            }),
            Commands::Validate { .. } => self.validate(),
        };

        if let Err(err) = &result {
            error!("Command failed: {err}");
        }
        result
    }

    /// Configure the tracing subscriber from the verbosity flags
    ///
    /// `RUST_LOG` applies when neither `-v` nor `-q` is given.
    fn init_logging(&self) {
        let filter = if self.cli.verbose {
            EnvFilter::new("debug")
        } else if self.cli.quiet {
            EnvFilter::new("error")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        };

        // a subscriber may already be installed, e.g. by tests
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Configuration file values, overridden by command-line flags
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file or template name is invalid
    pub fn config(&self) -> Result<PanderaGenConfig> {
        let mut config = match &self.cli.config {
            Some(path) => PanderaGenConfig::from_yaml_file(path)?,
            None => PanderaGenConfig::default(),
        };

        if let Commands::Generate {
            template,
            package,
            coerce,
            ..
        } = &self.cli.command
        {
            if let Some(template) = template {
                config.generation.template = TemplateKind::parse(template)?;
            }
            if package.is_some() {
                config.generation.package.clone_from(package);
            }
            if *coerce {
                config.generation.coerce = true;
            }
        }
        Ok(config)
    }

    /// Generated source for the `generate` subcommand
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be loaded or rendered, or if
    /// the subcommand is not `generate`
    pub fn generate(&self) -> Result<String> {
        let Commands::Generate { schema, .. } = &self.cli.command else {
            return Err(LinkMLError::config("not a generate command"));
        };

        let config = self.config()?;
        let schema = load_schema(schema)?;
        info!(
            schema = %schema.name,
            template = %config.generation.template,
            "generating validators"
        );
        let generator = PanderaGenerator::with_config(config.generation);
        Ok(generator.generate(&schema)?)
    }

    /// Validate records for the `validate` subcommand
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::DataValidationError` if the records violate the
    /// class, or an error if inputs cannot be loaded
    pub fn validate(&self) -> Result<()> {
        let Commands::Validate {
            schema,
            data,
            class_name,
            max_errors,
        } = &self.cli.command
        else {
            return Err(LinkMLError::config("not a validate command"));
        };

        let config = self.config()?;
        let schema = load_schema(schema)?;
        let document = PanderaGenerator::with_config(config.generation).render(&schema)?;
        let registry = ModelRegistry::from_document(&document, &config.validation)?;
        let model = crate::generator::BaseCodeFormatter::to_pascal_case(class_name);
        let records = load_records(data)?;

        info!(class = %model, records = records.len(), "validating records");
        match registry.validate_records(&model, &records) {
            Ok(()) => {
                if !self.cli.quiet {
                    println!("✓ {} records valid against {model}", records.len());
                }
                Ok(())
            }
            Err(FrameValidationError::Schema(errors)) => {
                println!("✗ {} errors validating {model}", errors.len());
                for error in errors.errors().iter().take(*max_errors) {
                    println!("  {error}");
                }
                if errors.len() > *max_errors {
                    println!("  ... and {} more", errors.len() - max_errors);
                }
                Err(FrameValidationError::Schema(errors).into())
            }
            Err(other) => Err(other.into()),
        }
    }
}

fn load_schema(path: &Path) -> Result<SchemaDefinition> {
    crate::parser::Parser::new().parse_file(path)
}

/// Records of a JSON or YAML data file
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or holds neither a
/// record nor a list of records
pub fn load_records(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let value: Value = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    match value {
        Value::Array(records) => Ok(records),
        record @ Value::Object(_) => Ok(vec![record]),
        other => Err(LinkMLError::data_validation(format!(
            "{} holds neither records nor a record: {other}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn app(args: &[&str]) -> CliApp {
        CliApp::new(Cli::try_parse_from(args).expect("arguments should parse"))
    }

    #[test]
    fn test_flags_override_config_file() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
        file.write_all(b"generation:\n  template: panderagen_polars_schema\n  package: from_file\n")?;
        let config_path = file.path().to_string_lossy().to_string();

        let config = app(&[
            "gen-pandera",
            "--config",
            &config_path,
            "generate",
            "schema.yaml",
            "--package",
            "from_flag",
            "--coerce",
        ])
        .config()?;

        assert_eq!(config.generation.template, TemplateKind::PolarsSchema);
        assert_eq!(config.generation.package.as_deref(), Some("from_flag"));
        assert!(config.generation.coerce);
        Ok(())
    }

    #[test]
    fn test_unknown_template_is_rejected() {
        let result = app(&["gen-pandera", "generate", "schema.yaml", "-t", "jinja"]).config();
        assert!(matches!(result, Err(LinkMLError::ConfigError(_))));
    }

    #[test]
    fn test_load_records_accepts_single_record() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
        file.write_all(b"id: a\nsize: 3\n")?;
        let records = load_records(file.path())?;
        assert_eq!(records, vec![serde_json::json!({"id": "a", "size": 3})]);
        Ok(())
    }
}
