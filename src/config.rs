//! Command-line arguments and the layered application settings.
//!
//! Settings are resolved from, lowest to highest priority: built-in
//! defaults, an optional TOML file, `TILE_COLLAPSE_*` environment variables
//! and finally the flags passed on the command line.

use crate::error::AppError;
use clap::{Parser, ValueEnum};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use wfc_core::DepthLimit;
use wfc_rules::SymmetryPolicy;

/// Prefix for environment variables that override settings.
pub const ENV_PREFIX: &str = "TILE_COLLAPSE_";

/// Represents the different visualization modes available.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    #[default]
    None,
    /// Redraw the grid in the terminal after every iteration.
    Terminal,
}

/// Log level for progress reports.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
}

/// Log level for everything that is not a progress report.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Command-line interface of the `tile-collapse` binary.
///
/// Only flags that were actually passed are serialized, so an absent flag
/// never shadows a value coming from the config file or the environment.
#[derive(Parser, Debug, Default, Serialize)]
#[command(name = "tile-collapse", author, version, about, long_about = None)]
pub struct AppConfig {
    /// TOML file with settings. Command-line flags take precedence over it.
    #[arg(long, value_name = "FILE")]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Module catalog to load (JSON or RON). [default: modules.json]
    #[arg(short, long, value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,

    /// Side length of the square grid. [default: 64]
    #[arg(short = 'n', long, value_name = "N")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<usize>,

    /// How far one propagation may travel: "unbounded" or a step count.
    #[arg(long, value_name = "unbounded|N")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_limit: Option<DepthLimit>,

    /// Seed for the random number generator. A random one is used when absent.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// How one-way adjacency declarations are treated.
    #[arg(long, value_name = "directional|symmetrize|strict")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symmetry: Option<SymmetryPolicy>,

    /// Give up after this many iterations.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,

    /// Minimum time between two rendered frames (e.g. "50ms").
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "duration_opt::serialize"
    )]
    pub frame_interval: Option<Duration>,

    /// Report progress updates every specified interval (e.g., "1s", "500ms").
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "duration_opt::serialize"
    )]
    pub report_progress_interval: Option<Duration>,

    /// Choose the visualization mode.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization_mode: Option<VisualizationMode>,

    /// Write the finished grid here, one row of module names per line.
    #[arg(short, long, value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Write every collapse decision to this CSV file.
    #[arg(long, value_name = "CSV_FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_csv: Option<PathBuf>,

    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_log_level: Option<GlobalLogLevel>,

    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_log_level: Option<ProgressLogLevel>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub catalog: PathBuf,
    pub grid_size: usize,
    pub depth_limit: DepthLimit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub symmetry: SymmetryPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,
    #[serde(with = "duration_opt", skip_serializing_if = "Option::is_none")]
    pub frame_interval: Option<Duration>,
    #[serde(with = "duration_opt", skip_serializing_if = "Option::is_none")]
    pub report_progress_interval: Option<Duration>,
    pub visualization_mode: VisualizationMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_csv: Option<PathBuf>,
    pub global_log_level: GlobalLogLevel,
    pub progress_log_level: ProgressLogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("modules.json"),
            grid_size: 64,
            depth_limit: DepthLimit::Unbounded,
            seed: None,
            symmetry: SymmetryPolicy::Directional,
            max_iterations: None,
            frame_interval: None,
            report_progress_interval: None,
            visualization_mode: VisualizationMode::None,
            output_path: None,
            history_csv: None,
            global_log_level: GlobalLogLevel::Info,
            progress_log_level: ProgressLogLevel::Info,
        }
    }
}

impl Settings {
    /// The provider stack behind [`Settings::load`].
    pub fn figment(cli: &AppConfig) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = &cli.config {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(cli))
    }

    /// Resolves the settings for `cli` and validates them.
    pub fn load(cli: &AppConfig) -> Result<Self, AppError> {
        if let Some(path) = &cli.config {
            if !path.is_file() {
                return Err(AppError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }
        let settings: Self = Self::figment(cli).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.grid_size == 0 {
            return Err(AppError::Config("grid_size must be at least 1".into()));
        }
        if self.max_iterations == Some(0) {
            return Err(AppError::Config(
                "max_iterations must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}

/// Durations are written as humantime strings ("250ms", "1s").
mod duration_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_str(&humantime::format_duration(*d).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|text| humantime::parse_duration(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_basic_args() {
        let args = vec![
            "tile-collapse",
            "--catalog",
            "rules.ron",
            "--grid-size",
            "20",
            "--output-path",
            "out.txt",
        ];
        let config = AppConfig::try_parse_from(args).unwrap();
        assert_eq!(config.catalog, Some(PathBuf::from("rules.ron")));
        assert_eq!(config.grid_size, Some(20));
        assert_eq!(config.output_path, Some(PathBuf::from("out.txt")));
        assert_eq!(config.depth_limit, None);
        assert_eq!(config.report_progress_interval, None);
        assert_eq!(config.visualization_mode, None);
    }

    #[test]
    fn test_depth_limit_and_symmetry_args() {
        let args = vec![
            "tile-collapse",
            "--depth-limit",
            "3",
            "--symmetry",
            "strict",
        ];
        let config = AppConfig::try_parse_from(args).unwrap();
        assert_eq!(config.depth_limit, Some(DepthLimit::Limited(3)));
        assert_eq!(config.symmetry, Some(SymmetryPolicy::Strict));

        let args = vec!["tile-collapse", "--depth-limit", "unbounded"];
        let config = AppConfig::try_parse_from(args).unwrap();
        assert_eq!(config.depth_limit, Some(DepthLimit::Unbounded));

        let args_err = vec!["tile-collapse", "--depth-limit", "-1"];
        assert!(AppConfig::try_parse_from(args_err).is_err());
    }

    #[test]
    fn test_progress_interval() {
        let args = vec!["tile-collapse", "--report-progress-interval", "2s"];
        let config = AppConfig::try_parse_from(args).unwrap();
        assert_eq!(
            config.report_progress_interval,
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_visualization_mode() {
        let args = vec!["tile-collapse", "--visualization-mode", "terminal"];
        let config = AppConfig::try_parse_from(args).unwrap();
        assert_eq!(config.visualization_mode, Some(VisualizationMode::Terminal));

        let args_err = vec!["tile-collapse", "--visualization-mode", "window"];
        assert!(AppConfig::try_parse_from(args_err).is_err());
    }

    #[test]
    fn test_defaults_without_any_source() {
        Jail::expect_with(|_jail| {
            let settings = Settings::load(&AppConfig::default()).map_err(|e| e.to_string())?;
            assert_eq!(settings, Settings::default());
            assert_eq!(settings.grid_size, 64);
            assert_eq!(settings.catalog, PathBuf::from("modules.json"));
            Ok(())
        });
    }

    #[test]
    fn test_layer_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "tile.toml",
                r#"
                    grid_size = 12
                    seed = 1
                    depth_limit = "unbounded"
                    frame_interval = "250ms"
                    symmetry = "symmetrize"
                "#,
            )?;
            jail.set_env("TILE_COLLAPSE_SEED", 2);
            jail.set_env("TILE_COLLAPSE_DEPTH_LIMIT", 4);

            let cli = AppConfig {
                config: Some(PathBuf::from("tile.toml")),
                depth_limit: Some(DepthLimit::Limited(1)),
                ..AppConfig::default()
            };
            let settings = Settings::load(&cli).map_err(|e| e.to_string())?;

            assert_eq!(settings.grid_size, 12); // file
            assert_eq!(settings.seed, Some(2)); // env over file
            assert_eq!(settings.depth_limit, DepthLimit::Limited(1)); // cli over env
            assert_eq!(settings.frame_interval, Some(Duration::from_millis(250)));
            assert_eq!(settings.symmetry, SymmetryPolicy::Symmetrize);
            Ok(())
        });
    }

    #[test]
    fn test_missing_config_file() {
        Jail::expect_with(|_jail| {
            let cli = AppConfig {
                config: Some(PathBuf::from("nope.toml")),
                ..AppConfig::default()
            };
            assert!(matches!(Settings::load(&cli), Err(AppError::Config(_))));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        Jail::expect_with(|jail| {
            let cli = AppConfig {
                grid_size: Some(0),
                ..AppConfig::default()
            };
            assert!(matches!(Settings::load(&cli), Err(AppError::Config(_))));

            jail.set_env("TILE_COLLAPSE_FRAME_INTERVAL", "soon");
            let err = Settings::load(&AppConfig::default()).unwrap_err();
            assert!(matches!(err, AppError::Settings(_)));
            assert_eq!(err.exit_code(), 2);
            Ok(())
        });
    }
}
