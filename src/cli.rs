//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::ReportFormat;
use crate::models::VehicleDraft;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FleetLens - vehicle inventory client and analytics
///
/// List, add, edit and delete vehicles on a /vehicle REST API, and
/// summarize the inventory by manufacturer, fuel type and model year.
///
/// Examples:
///   fleetlens list
///   fleetlens --api-url http://127.0.0.1:5000 analytics --format markdown -o fleet.md
///   fleetlens analytics --input vehicles.json --format json
///   fleetlens add --vin 1HGCM82633A004352 --manufacturer Honda ...
///   fleetlens init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Base URL of the vehicle API
    ///
    /// Can also be set via FLEETLENS_API_URL or .fleetlens.toml.
    #[arg(long, global = true, value_name = "URL", env = "FLEETLENS_API_URL")]
    pub api_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .fleetlens.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List all vehicles
    List {
        /// Print the raw records as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a single vehicle
    Show {
        /// Vehicle identification number
        vin: String,
    },

    /// Add a new vehicle
    Add {
        #[command(flatten)]
        fields: VehicleFields,
    },

    /// Replace the fields of an existing vehicle
    Edit {
        #[command(flatten)]
        fields: VehicleFields,
    },

    /// Delete a vehicle
    Delete {
        /// Vehicle identification number
        vin: String,
    },

    /// Summarize the inventory
    Analytics {
        /// Read vehicles from a JSON file instead of the API
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Report format (defaults to the config file setting)
        #[arg(long, value_name = "FORMAT")]
        format: Option<ReportFormat>,

        /// Number of most expensive vehicles to list
        #[arg(long, value_name = "COUNT")]
        top: Option<usize>,
    },

    /// Generate a default .fleetlens.toml configuration file
    InitConfig,
}

/// Fields of the add/edit form. All are required.
#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct VehicleFields {
    /// Vehicle identification number
    #[arg(long)]
    pub vin: String,

    /// Manufacturer name
    #[arg(long = "manufacturer")]
    pub manufacturer_name: String,

    /// Description
    #[arg(long)]
    pub description: String,

    /// Horse power
    #[arg(long = "horse-power")]
    pub horse_power: f64,

    /// Model name
    #[arg(long = "model")]
    pub model_name: String,

    /// Model year
    #[arg(long = "year")]
    pub model_year: i32,

    /// Purchase price
    #[arg(long = "price")]
    pub purchase_price: f64,

    /// Fuel type
    #[arg(long = "fuel-type")]
    pub fuel_type: String,
}

impl From<VehicleFields> for VehicleDraft {
    fn from(fields: VehicleFields) -> Self {
        Self {
            vin: fields.vin,
            manufacturer_name: fields.manufacturer_name,
            description: fields.description,
            horse_power: fields.horse_power,
            model_name: fields.model_name,
            model_year: fields.model_year,
            purchase_price: fields.purchase_price,
            fuel_type: fields.fuel_type,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        match &self.command {
            Command::Add { fields } | Command::Edit { fields } => {
                let draft = VehicleDraft::from(fields.clone());
                let blank = draft.blank_fields();
                if !blank.is_empty() {
                    return Err(format!("Required fields are empty: {}", blank.join(", ")));
                }
            }
            Command::Analytics {
                input: Some(path), ..
            } => {
                if !path.is_file() {
                    return Err(format!("Input file does not exist: {}", path.display()));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the config file's `general.verbose`; `--quiet`
    /// still wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            api_url: None,
            config: None,
            timeout: None,
            verbose: false,
            quiet: false,
            command,
        }
    }

    fn make_fields() -> VehicleFields {
        VehicleFields {
            vin: "1HGCM82633A004352".to_string(),
            manufacturer_name: "Honda".to_string(),
            description: "Compact sedan".to_string(),
            horse_power: 158.0,
            model_name: "Civic".to_string(),
            model_year: 2022,
            purchase_price: 23950.0,
            fuel_type: "gas".to_string(),
        }
    }

    #[test]
    fn test_parse_add_command() {
        let args = Args::try_parse_from([
            "fleetlens",
            "add",
            "--vin",
            "1HGCM82633A004352",
            "--manufacturer",
            "Honda",
            "--description",
            "Compact sedan",
            "--horse-power",
            "158",
            "--model",
            "Civic",
            "--year",
            "2022",
            "--price",
            "23950",
            "--fuel-type",
            "gas",
        ])
        .unwrap();

        match args.command {
            Command::Add { fields } => assert_eq!(fields, make_fields()),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_add_requires_all_fields() {
        let result = Args::try_parse_from(["fleetlens", "add", "--vin", "X"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_analytics_with_global_flags() {
        let args = Args::try_parse_from([
            "fleetlens",
            "analytics",
            "--format",
            "json",
            "--top",
            "3",
            "--api-url",
            "http://localhost:9000",
        ])
        .unwrap();

        assert_eq!(args.api_url.as_deref(), Some("http://localhost:9000"));
        match args.command {
            Command::Analytics { format, top, .. } => {
                assert_eq!(format, Some(ReportFormat::Json));
                assert_eq!(top, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::List { json: false });
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args(Command::List { json: false });
        args.api_url = Some("localhost:5000".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_blank_field() {
        let mut fields = make_fields();
        fields.model_name = " ".to_string();
        let args = make_args(Command::Edit { fields });

        let err = args.validate().unwrap_err();
        assert!(err.contains("model_name"));
    }

    #[test]
    fn test_validation_missing_input_file() {
        let args = make_args(Command::Analytics {
            input: Some(PathBuf::from("/definitely/not/here.json")),
            output: None,
            format: None,
            top: None,
        });
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config() {
        let mut args = make_args(Command::List { json: false });
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
