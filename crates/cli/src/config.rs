use anyhow::{Context, Error, Result};
use serde::Deserialize;
use serde_json::error::Category;
use std::{fs::read_to_string, path::Path, path::PathBuf};
use type_inference::InferenceOptions;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Config {
    /// Externs files, read before the sources.
    #[serde(default)]
    pub externs: Vec<PathBuf>,
    #[serde(default)]
    pub inference: InferenceOptions,
}

fn convert_json_err(e: serde_json::Error) -> Error {
    let line = e.line();
    let column = e.column();

    let msg = match e.classify() {
        Category::Io => "io error",
        Category::Syntax => "syntax error",
        Category::Data => "unmatched data",
        Category::Eof => "unexpected eof",
    };
    Error::new(e).context(format!(
        "Failed to deserialize config (json) file: {}: {}:{}",
        msg, line, column
    ))
}

pub fn parse_config(content: &str) -> Result<Config> {
    serde_json::from_str::<Config>(content).map_err(convert_json_err)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use type_inference::{CheckLevel, CodingConventionKind};

    #[test]
    fn testEmptyConfigUsesDefaults() {
        let config = parse_config("{}").unwrap();
        assert!(config.externs.is_empty());
        assert_eq!(config.inference.coding_convention, CodingConventionKind::Closure);
        assert!(config.inference.record_escaped_vars);
    }

    #[test]
    fn testInferenceOptions() {
        let config = parse_config(
            r#"{
                "externs": ["es3.js"],
                "inference": {
                    "codingConvention": "default",
                    "recordEscapedVars": false,
                    "checkLevels": { "JSC_UNKNOWN_LENDS": "ERROR" },
                    "maxStepsPerNode": 10
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.externs, vec![PathBuf::from("es3.js")]);
        assert_eq!(config.inference.coding_convention, CodingConventionKind::Default);
        assert!(!config.inference.record_escaped_vars);
        assert_eq!(
            config.inference.check_levels.get("JSC_UNKNOWN_LENDS"),
            Some(&CheckLevel::ERROR)
        );
        assert_eq!(config.inference.max_steps_per_node, 10);
    }

    #[test]
    fn testUnknownFieldIsRejected() {
        let err = parse_config(r#"{ "inference": { "bogus": true } }"#).unwrap_err();
        assert!(err.to_string().starts_with("Failed to deserialize config (json) file: unmatched data"));
    }
}
