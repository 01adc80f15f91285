//! Merge configuration pipeline
//!
//! Raw configuration text moves through these stages:
//! 1. Load (`store`): read the file, empty when absent
//! 2. Substitute (`tokens`): replace build-property placeholders
//! 3. Parse (`store`): JSON into [`MergerSettings`]
//! 4. Resolve (`resolve`): fill gaps from the build context
//!
//! `merge` layers the build-context sources themselves.

mod merge;
mod platform;
mod resolve;
mod store;
mod tokens;

pub use ilmerge_settings::MergerSettings;
pub use merge::deep_merge;
pub use platform::{FrameworkTable, PlatformError, PlatformResolver, DEFAULT_WINDOWS_DIR};
pub use resolve::{resolve_tool_path, ResolveError, SettingsResolver};
pub use store::{load_config, parse_config, serialize_config, write_snapshot, ConfigError};
pub use tokens::{escape_path, TokenSubstitutor, TOKENS};
