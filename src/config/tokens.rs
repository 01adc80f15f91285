//! Build-property placeholders in configuration text.
//!
//! Replacement is plain substring substitution on the raw JSON text, before
//! it is parsed. Values are escaped for use inside a JSON string literal by
//! doubling every backslash, so `C:\src` lands in the file as `C:\\src`.

use crate::context::BuildContext;

/// Recognized placeholders, in substitution order.
pub const TOKENS: [&str; 10] = [
    "$(SolutionDir)",
    "$(SolutionPath)",
    "$(ProjectDir)",
    "$(ProjectFileName)",
    "$(ProjectPath)",
    "$(TargetDir)",
    "$(TargetPath)",
    "$(IntermediateOutputPath)",
    "$(TargetFileName)",
    "$(AssemblyOriginatorKeyFile)",
];

/// Replaces placeholders with build-context values.
#[derive(Debug, Clone)]
pub struct TokenSubstitutor {
    replacements: Vec<(&'static str, String)>,
}

impl TokenSubstitutor {
    /// Take the placeholder values from a build context. Properties the
    /// host did not provide substitute as the empty string.
    pub fn from_context(context: &BuildContext) -> Self {
        let values = [
            &context.solution_dir,
            &context.solution_path,
            &context.project_dir,
            &context.project_file_name,
            &context.project_path,
            &context.target_dir,
            &context.target_path,
            &context.intermediate_output_path,
            &context.target_file_name,
            &context.key_file,
        ];

        Self {
            replacements: TOKENS
                .iter()
                .zip(values)
                .map(|(token, value)| (*token, escape_path(value)))
                .collect(),
        }
    }

    /// Substitute every recognized placeholder in `text`.
    ///
    /// Placeholder-like text that is not in [`TOKENS`] is left as is.
    pub fn substitute(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        self.replacements
            .iter()
            .fold(text.to_string(), |acc, (token, value)| {
                if acc.contains(token) {
                    log::debug!("Replacing {} with {}", token, value);
                    acc.replace(token, value)
                } else {
                    acc
                }
            })
    }
}

/// Double every backslash so the value stays valid inside a JSON string.
pub fn escape_path(value: &str) -> String {
    value.replace('\\', "\\\\")
}
