//! Settings defaulting
//!
//! Fills the gaps in a loaded configuration from the build context. A value
//! the configuration sets explicitly is never overridden. Stages run in
//! dependency order:
//! 1. General: signing key, output file, target platform
//! 2. Input assemblies (primary build output always first)
//! 3. Search directories (target directory plus additional locations)

use std::path::{Path, PathBuf};

use ilmerge_settings::{specified, AdvancedSettings, GeneralSettings, MergerSettings};

use super::platform::{PlatformError, PlatformResolver};
use crate::context::BuildContext;
use crate::locator::{ExecutableLocator, FileSystem, LocateError};
use crate::paths;

/// Resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("cannot derive the target platform: {0}")]
    Platform(#[from] PlatformError),

    #[error("An alternative path for {executable} was provided but the file was not found: {path}")]
    AlternativePathMissing { executable: String, path: PathBuf },

    #[error(transparent)]
    ConsolePathMissing(LocateError),

    #[error(
        "{executable} was not located. Make sure you have the {package} package installed. \
         If you defined a custom packages folder it is possible we are having a hard time figuring it out. \
         In this case please use attribute 'AlternativeILMergePath' in the configuration file to indicate the full path for {executable}."
    )]
    ToolNotFound {
        executable: String,
        package: String,
        #[source]
        source: LocateError,
    },
}

/// Applies build-context defaults to a loaded configuration.
pub struct SettingsResolver<'a> {
    context: &'a BuildContext,
    platforms: &'a dyn PlatformResolver,
}

impl<'a> SettingsResolver<'a> {
    pub fn new(context: &'a BuildContext, platforms: &'a dyn PlatformResolver) -> Self {
        Self { context, platforms }
    }

    /// Fill in every unset field.
    pub fn resolve(&self, settings: MergerSettings) -> Result<MergerSettings, ResolveError> {
        let MergerSettings { general, advanced } = settings;

        let general = self.resolve_general(general)?;
        let general = self.resolve_inputs(general);
        let advanced = self.resolve_search_directories(advanced);

        Ok(MergerSettings { general, advanced })
    }

    fn resolve_general(&self, mut general: GeneralSettings) -> Result<GeneralSettings, ResolveError> {
        let ctx = self.context;

        if specified(&general.key_file).is_none() && !ctx.key_file.trim().is_empty() {
            let key_file = ctx.project_relative(Path::new(&ctx.key_file));
            log::info!("Applying default value for KeyFile: {}", key_file.display());
            general.key_file = Some(path_text(&key_file));
        }

        if specified(&general.output_file).is_none() {
            let file_name = match ctx.target_file_name.trim() {
                "" => ctx.target_path().file_name().map(PathBuf::from).unwrap_or_default(),
                name => PathBuf::from(name),
            };
            let output = ctx.project_relative(&Path::new(&ctx.target_dir).join(file_name));
            log::info!("Applying default value for OutputFile: {}", output.display());
            general.output_file = Some(path_text(&output));
        }

        if specified(&general.target_platform).is_none() {
            let platform = self
                .platforms
                .target_platform(&ctx.target_framework_version, &ctx.target_architecture)?;
            log::info!("Applying default value for TargetPlatform: {}", platform);
            general.target_platform = Some(platform);
        }

        Ok(general)
    }

    fn resolve_inputs(&self, mut general: GeneralSettings) -> GeneralSettings {
        let primary = path_text(&self.context.primary_assembly());

        if general.input_assemblies.is_empty() {
            log::info!("No input assemblies were found in configuration.");
            log::info!("Adding target assembly: {}", primary);
            general.input_assemblies.push(primary);

            // reference-copy lists can carry .pdb and .xml files alongside
            // the libraries
            for item in self.context.input_assemblies.iter().filter(|i| is_library(i)) {
                log::info!("Adding assembly: {}", item);
                general.input_assemblies.push(item.clone());
            }
        } else {
            for item in &general.input_assemblies {
                log::info!("Config input assembly: {}", item);
            }
            log::info!("Adding target assembly at position [0]: {}", primary);
            general.input_assemblies.insert(0, primary);
        }

        general
    }

    fn resolve_search_directories(&self, mut advanced: AdvancedSettings) -> AdvancedSettings {
        if advanced.add_search_directory(&self.context.target_dir) {
            log::debug!("Adding search directory: {}", self.context.target_dir);
        }

        for location in &self.context.additional_locations {
            if advanced.add_search_directory(location) {
                log::debug!("Adding search directory: {}", location);
            }
        }

        advanced
    }
}

/// Decide which executable to run.
///
/// An `AlternativeILMergePath` in the configuration must exist and is used
/// without searching; otherwise the locator runs.
pub fn resolve_tool_path<F: FileSystem>(
    settings: &MergerSettings,
    locator: &ExecutableLocator<F>,
) -> Result<PathBuf, ResolveError> {
    let tool = locator.tool();

    if let Some(alternative) = specified(&settings.general.alternative_ilmerge_path) {
        let path = PathBuf::from(alternative);
        if !path.is_file() {
            return Err(ResolveError::AlternativePathMissing {
                executable: tool.executable.clone(),
                path,
            });
        }
        log::info!("Using alternative {} path: {}", tool.executable, path.display());
        return Ok(path);
    }

    match locator.locate() {
        Ok(located) => Ok(located.path),
        Err(e @ LocateError::ConsolePathMissing { .. }) => Err(ResolveError::ConsolePathMissing(e)),
        Err(e @ LocateError::NotFound { .. }) => Err(ResolveError::ToolNotFound {
            executable: tool.executable.clone(),
            package: tool.package_prefix.clone(),
            source: e,
        }),
    }
}

/// Only `.dll` files are merge inputs.
fn is_library(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("dll"))
}

fn path_text(path: &Path) -> String {
    paths::normalize(path).to_string_lossy().into_owned()
}
