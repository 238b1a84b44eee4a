//! Configuration management for stacklint.
//!
//! Handles:
//! - Command-line arguments, each backed by a `STACKLINT_*` environment variable
//! - The optional project file (`.stacklint.toml`)
//! - Template variables from the environment, the variables file and `--var`
//!
//! Everything is collected once into [`Config`] at startup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::core::Severity;
use crate::report::OutputFormat;
use crate::validation::RuleConfig;
use crate::validation::cfn_lint::DEFAULT_PROGRAM;
use crate::variables::Variables;

/// Project file looked up in the root directory
pub const PROJECT_FILE: &str = ".stacklint.toml";
/// Variables file used when none is given explicitly
pub const DEFAULT_VARIABLES_FILE: &str = "variables.yaml";
/// Verdict threshold when nothing else is configured
pub const DEFAULT_THRESHOLD: Severity = Severity::Warning;

/// Invalid or missing settings; fatal before any document is processed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid severity threshold: {0}")]
    InvalidSeverity(String),

    #[error("invalid output format '{0}' (expected text or json)")]
    InvalidFormat(String),

    #[error("invalid variable assignment '{0}' (expected NAME=VALUE)")]
    InvalidAssignment(String),

    #[error("path does not exist: {}", .0.display())]
    MissingPath(PathBuf),

    #[error("root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid project file {}: {source}", .path.display())]
    ProjectFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid variables file {}: {source}", .path.display())]
    Variables {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("variables file {} must contain a mapping", .path.display())]
    InvalidVariables { path: PathBuf },
}

/// Command-line arguments for stacklint
#[derive(Debug, Default, Parser)]
#[command(name = "stacklint")]
#[command(about = "Render and lint infrastructure-as-code templates")]
#[command(version)]
pub struct Args {
    /// Template files or directories; the root is scanned when empty
    #[arg(env = "STACKLINT_PATHS", value_delimiter = ',')]
    pub paths: Vec<PathBuf>,

    /// Project root holding templates, configs and variables.yaml
    #[arg(long, env = "STACKLINT_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// YAML file with template variables
    #[arg(long, env = "STACKLINT_VARS")]
    pub vars: Option<PathBuf>,

    /// Set a template variable (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub var: Vec<String>,

    /// Minimum severity that fails the run (info, warning, error)
    #[arg(long, env = "STACKLINT_THRESHOLD")]
    pub threshold: Option<String>,

    /// Lint engine program
    #[arg(long, env = "STACKLINT_ENGINE")]
    pub engine: Option<String>,

    /// Engine rules to ignore
    #[arg(long, env = "STACKLINT_IGNORE_CHECKS", value_delimiter = ',')]
    pub ignore_checks: Vec<String>,

    /// Engine rules to include on top of the defaults
    #[arg(long, env = "STACKLINT_INCLUDE_CHECKS", value_delimiter = ',')]
    pub include_checks: Vec<String>,

    /// Regions to validate against
    #[arg(long, env = "STACKLINT_REGIONS", value_delimiter = ',')]
    pub regions: Vec<String>,

    /// Only process documents whose path ends with this suffix
    #[arg(short = 'c', long, env = "STACKLINT_ONLY")]
    pub only: Option<String>,

    /// Skip documents whose path ends with any of these suffixes
    #[arg(short = 's', long, env = "STACKLINT_SKIP", value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Report format (text or json)
    #[arg(long, env = "STACKLINT_FORMAT")]
    pub format: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "STACKLINT_LOG", default_value = "warn")]
    pub log_level: String,
}

/// Settings from `.stacklint.toml`; command line and environment win
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectFile {
    pub threshold: Option<String>,
    pub engine: Option<String>,
    pub format: Option<String>,
    pub skip: Vec<String>,
    pub ignore_checks: Vec<String>,
    pub include_checks: Vec<String>,
    pub regions: Vec<String>,
}

impl ProjectFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ProjectFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Project file in `root`, else the user-level one in the config directory
    pub fn locate(root: &Path) -> Option<PathBuf> {
        let project = root.join(PROJECT_FILE);
        if project.is_file() {
            return Some(project);
        }
        let user = dirs::config_dir()?.join("stacklint").join("config.toml");
        user.is_file().then_some(user)
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    /// Explicit documents or directories; empty means scan `root`
    pub paths: Vec<PathBuf>,
    pub variables: Variables,
    pub threshold: Severity,
    /// Engine program to run
    pub engine: String,
    pub rules: RuleConfig,
    pub only: Option<String>,
    pub skip: Vec<String>,
    pub format: OutputFormat,
    pub log_level: String,
    /// Project file that contributed settings, if any
    pub project_file: Option<PathBuf>,
}

impl Config {
    /// Create configuration from explicit arguments, ignoring the environment
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        Self::from_parts(args, std::iter::empty())
    }

    /// Create configuration from arguments plus an environment snapshot
    pub fn from_parts<I>(args: Args, env: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let root = args.root;
        if !root.exists() {
            return Err(ConfigError::MissingPath(root));
        }
        if !root.is_dir() {
            return Err(ConfigError::NotADirectory(root));
        }

        let project_file = ProjectFile::locate(&root);
        let project = match &project_file {
            Some(path) => {
                log::info!("Using project file {}", path.display());
                ProjectFile::load(path)?
            }
            None => ProjectFile::default(),
        };

        let threshold = match args.threshold.or(project.threshold) {
            Some(raw) => raw.parse().map_err(ConfigError::InvalidSeverity)?,
            None => DEFAULT_THRESHOLD,
        };
        let format = match args.format.or(project.format) {
            Some(raw) => raw.parse()?,
            None => OutputFormat::default(),
        };
        let engine = args
            .engine
            .or(project.engine)
            .unwrap_or_else(|| DEFAULT_PROGRAM.to_string());

        let rules = RuleConfig {
            ignore_checks: prefer(args.ignore_checks, project.ignore_checks),
            include_checks: prefer(args.include_checks, project.include_checks),
            regions: prefer(args.regions, project.regions),
        };

        let variables = resolve_variables(&root, args.vars.as_deref(), &args.var, env)?;

        Ok(Config {
            root,
            paths: args.paths,
            variables,
            threshold,
            engine,
            rules,
            only: args.only.filter(|s| !s.is_empty()),
            skip: prefer(args.skip, project.skip),
            format,
            log_level: args.log_level,
            project_file,
        })
    }
}

/// Command-line list if given, else the project file's
fn prefer(cli: Vec<String>, project: Vec<String>) -> Vec<String> {
    let cli: Vec<String> = cli.into_iter().filter(|s| !s.trim().is_empty()).collect();
    if cli.is_empty() { project } else { cli }
}

fn resolve_variables<I>(
    root: &Path,
    vars_file: Option<&Path>,
    assignments: &[String],
    env: I,
) -> Result<Variables, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut variables = Variables::from_env(env);

    let file = match vars_file {
        Some(path) if !path.is_file() => return Err(ConfigError::MissingPath(path.to_path_buf())),
        Some(path) => Some(path.to_path_buf()),
        None => Some(root.join(DEFAULT_VARIABLES_FILE)).filter(|p| p.is_file()),
    };
    if let Some(file) = file {
        log::info!("Loading variables from {}", file.display());
        variables.merge(Variables::load_file(&file)?);
    }

    for assignment in assignments {
        let (name, value) = Variables::parse_assignment(assignment)?;
        variables.insert(name, value);
    }

    Ok(variables)
}
