use crate::diagnostics::CheckLevel;
use crate::DataFlowAnalysis::MAX_STEPS_PER_NODE;
use rustc_hash::FxHashMap;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CodingConventionKind {
    Default,
    Closure,
}

impl Default for CodingConventionKind {
    fn default() -> Self {
        CodingConventionKind::Closure
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct InferenceOptions {
    #[serde(default)]
    pub coding_convention: CodingConventionKind,

    /// Whether a local assigned from an inner function is marked escaped.
    /// Escaped locals are never narrowed in the function declaring them.
    #[serde(default = "default_true")]
    pub record_escaped_vars: bool,

    /// Severity overrides by diagnostic key, e.g. `"JSC_UNKNOWN_LENDS": "OFF"`.
    #[serde(default)]
    pub check_levels: FxHashMap<String, CheckLevel>,

    #[serde(default = "default_max_steps_per_node")]
    pub max_steps_per_node: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_steps_per_node() -> usize {
    MAX_STEPS_PER_NODE
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            coding_convention: CodingConventionKind::default(),
            record_escaped_vars: true,
            check_levels: FxHashMap::default(),
            max_steps_per_node: MAX_STEPS_PER_NODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn testDeserializeDefaults() {
        let options: InferenceOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.coding_convention, CodingConventionKind::Closure);
        assert!(options.record_escaped_vars);
        assert!(options.check_levels.is_empty());
        assert_eq!(options.max_steps_per_node, MAX_STEPS_PER_NODE);
    }

    #[test]
    fn testDeserializeCheckLevels() {
        let options: InferenceOptions = serde_json::from_str(
            r#"{ "codingConvention": "default", "checkLevels": { "JSC_DUP_VAR_DECLARATION": "OFF" } }"#,
        )
        .unwrap();
        assert_eq!(options.coding_convention, CodingConventionKind::Default);
        assert_eq!(
            options.check_levels.get("JSC_DUP_VAR_DECLARATION"),
            Some(&CheckLevel::OFF)
        );
    }

    #[test]
    fn testUnknownFieldIsRejected() {
        assert!(serde_json::from_str::<InferenceOptions>(r#"{ "maxSteps": 3 }"#).is_err());
    }
}
