//! ILMerge build task CLI
//!
//! Entry point for the `ilmerge-task` command, invoked by the host build
//! after compilation.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ilmerge_task::pipeline::log_failure;
use ilmerge_task::{BuildContext, MergeTask, ProcessMergeTool};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "ilmerge-task")]
#[command(about = "Merge a build's output assemblies with ILMerge", version)]
struct Cli {
    /// TOML file with build properties; flags override its values
    #[arg(long)]
    context: Option<PathBuf>,

    /// Merge configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    solution_dir: Option<String>,

    #[arg(long)]
    solution_path: Option<String>,

    #[arg(long)]
    project_dir: Option<String>,

    #[arg(long)]
    project_file_name: Option<String>,

    #[arg(long)]
    project_path: Option<String>,

    #[arg(long)]
    target_dir: Option<String>,

    #[arg(long)]
    target_path: Option<String>,

    #[arg(long)]
    target_file_name: Option<String>,

    #[arg(long)]
    intermediate_output_path: Option<String>,

    /// e.g. v4.7.2
    #[arg(long)]
    target_framework_version: Option<String>,

    #[arg(long)]
    target_architecture: Option<String>,

    /// Full path of ILMerge.exe as published by its package
    #[arg(long)]
    console_path: Option<String>,

    /// Signing key file, relative to the project directory
    #[arg(long)]
    key_file: Option<String>,

    /// Referenced assembly copied next to the output (repeatable)
    #[arg(long = "input")]
    inputs: Vec<String>,

    /// Extra directory to search for references (repeatable)
    #[arg(long = "additional-location")]
    additional_locations: Vec<String>,

    /// Program that launches the executable, e.g. mono
    #[arg(long)]
    runtime: Option<PathBuf>,

    /// Log debug detail
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    /// Flags that were given, keyed like [`BuildContext`] fields.
    fn overrides(&self) -> Value {
        let mut map = Map::new();
        let text = [
            ("solution_dir", &self.solution_dir),
            ("solution_path", &self.solution_path),
            ("project_dir", &self.project_dir),
            ("project_file_name", &self.project_file_name),
            ("project_path", &self.project_path),
            ("target_dir", &self.target_dir),
            ("target_path", &self.target_path),
            ("target_file_name", &self.target_file_name),
            ("intermediate_output_path", &self.intermediate_output_path),
            ("target_framework_version", &self.target_framework_version),
            ("target_architecture", &self.target_architecture),
            ("console_path", &self.console_path),
            ("key_file", &self.key_file),
        ];
        for (key, value) in text {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::String(value.clone()));
            }
        }

        if let Some(config) = &self.config {
            map.insert(
                "configuration_file".to_string(),
                Value::String(config.to_string_lossy().into_owned()),
            );
        }
        if !self.inputs.is_empty() {
            map.insert("input_assemblies".to_string(), Value::from(self.inputs.clone()));
        }
        if !self.additional_locations.is_empty() {
            map.insert(
                "additional_locations".to_string(),
                Value::from(self.additional_locations.clone()),
            );
        }

        Value::Object(map)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let context = match BuildContext::from_layers(cli.context.as_deref(), cli.overrides()) {
        Ok(context) => context,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(4);
        }
    };

    let task = MergeTask::new(context);
    let runtime = cli.runtime.clone();
    match task.run(|exe| ProcessMergeTool::new(exe).with_runtime(runtime)) {
        Ok(report) => {
            log::info!(
                "Merged {} assemblies into {}",
                report.settings.general.input_assemblies.len(),
                report.settings.general.output_file.as_deref().unwrap_or_default()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_failure(&e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}
