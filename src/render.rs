//! Tool result rendering
//!
//! Maps a completed tool invocation to the fragment that replaces its
//! in-flight badge. Total by contract: an unrecognized tool name falls back
//! to the generic structured-data view rather than erroring, so a rendering
//! miss can never abort a turn that otherwise succeeded.

use crate::turn::FragmentDescriptor;
use serde_json::Value;

/// Tools whose UI fragment replaces the model's prose entirely.
///
/// Model text synthesized around these calls is shown while streaming but
/// excluded from the assistant transcript entry; the tool fragment carries
/// the meaning instead. Membership is by exact tool name.
const PROSE_SUPPRESSING_TOOLS: &[&str] = &["getSwap"];

/// Whether a model segment attributed to `tool_name` is excluded from the
/// assistant-text buffer.
pub fn suppresses_prose(tool_name: &str) -> bool {
    PROSE_SUPPRESSING_TOOLS.contains(&tool_name)
}

/// Render a tool's parsed output as a UI fragment.
pub fn render_tool_result(name: &str, output: &Value) -> FragmentDescriptor {
    match name {
        "getSwap" => FragmentDescriptor::Swap {
            details: output.clone(),
        },
        "getLatestPrice" => FragmentDescriptor::LatestPrice {
            data: output.clone(),
        },
        "getCryptoPriceHistory" => FragmentDescriptor::PriceHistory {
            points: output.clone(),
        },
        "getFinancialData" => FragmentDescriptor::Financials {
            data: output.clone(),
        },
        "getNews" => FragmentDescriptor::News {
            articles: output.clone(),
        },
        _ => FragmentDescriptor::Json {
            name: name.to_string(),
            data: output.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_tools_specialize() {
        let out = json!({"status": "ok"});
        assert!(matches!(
            render_tool_result("getSwap", &out),
            FragmentDescriptor::Swap { .. }
        ));
        assert!(matches!(
            render_tool_result("getLatestPrice", &out),
            FragmentDescriptor::LatestPrice { .. }
        ));
        assert!(matches!(
            render_tool_result("getCryptoPriceHistory", &out),
            FragmentDescriptor::PriceHistory { .. }
        ));
        assert!(matches!(
            render_tool_result("getNews", &out),
            FragmentDescriptor::News { .. }
        ));
    }

    #[test]
    fn test_unknown_tool_falls_back() {
        // Totality: any (name, output) pair produces a fragment.
        let cases = [
            ("someFutureTool", json!({"a": 1})),
            ("", Value::Null),
            ("getswap", json!([])), // case-sensitive, not a known name
        ];
        for (name, output) in cases {
            let fragment = render_tool_result(name, &output);
            assert!(
                matches!(fragment, FragmentDescriptor::Json { .. }),
                "expected generic view for {name:?}"
            );
        }
    }

    #[test]
    fn test_prose_suppression_is_exact_match() {
        assert!(suppresses_prose("getSwap"));
        assert!(!suppresses_prose("getLatestPrice"));
        assert!(!suppresses_prose("getswap"));
        assert!(!suppresses_prose(""));
    }
}
