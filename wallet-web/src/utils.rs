//! Conversions between loosely typed JS values and the core types.
//!
//! Kept free of `JsValue` so they run in native tests.

use lib_connect::chain::to_hex;
use lib_connect::ProviderError;

/// JSON-RPC "internal error", used when a thrown value carries no code.
pub const INTERNAL_ERROR: i64 = -32603;

pub fn provider_error_from_parts(code: Option<f64>, message: Option<String>) -> ProviderError {
    let code = code
        .filter(|code| code.fract() == 0.0)
        .map(|code| code as i64)
        .unwrap_or(INTERNAL_ERROR);
    ProviderError::new(code, message.unwrap_or_else(|| "unknown provider error".to_string()))
}

/// Chain id from a `chainChanged` payload: hex string as-is, numbers re-encoded.
pub fn chain_id_from_parts(text: Option<String>, number: Option<f64>) -> Option<String> {
    if let Some(text) = text {
        return (!text.is_empty()).then_some(text);
    }
    number
        .filter(|n| *n >= 0.0 && n.fract() == 0.0)
        .map(|n| to_hex(n as u64))
}

/// `start()` result as reported to JS.
pub fn outcome_label(outcome: &lib_connect::ResumeOutcome) -> &'static str {
    match outcome {
        lib_connect::ResumeOutcome::NoSession => "none",
        lib_connect::ResumeOutcome::Resumed { .. } => "resumed",
        lib_connect::ResumeOutcome::Dormant { .. } => "dormant",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_connect::ResumeOutcome;

    #[test]
    fn test_provider_error_with_code() {
        let err = provider_error_from_parts(Some(4001.0), Some("User rejected".to_string()));
        assert!(err.is_user_rejection());
        assert_eq!(err.message, "User rejected");
    }

    #[test]
    fn test_provider_error_without_code() {
        let err = provider_error_from_parts(None, None);
        assert_eq!(err.code, INTERNAL_ERROR);
        assert!(!err.is_unsupported());
    }

    #[test]
    fn test_unsupported_code_maps() {
        assert!(provider_error_from_parts(Some(4200.0), None).is_unsupported());
    }

    #[test]
    fn test_chain_id_from_payload() {
        assert_eq!(chain_id_from_parts(Some("0xa".to_string()), None).as_deref(), Some("0xa"));
        assert_eq!(chain_id_from_parts(None, Some(8453.0)).as_deref(), Some("0x2105"));
        assert_eq!(chain_id_from_parts(Some(String::new()), None), None);
        assert_eq!(chain_id_from_parts(None, Some(1.5)), None);
        assert_eq!(chain_id_from_parts(None, None), None);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome_label(&ResumeOutcome::NoSession), "none");
        assert_eq!(
            outcome_label(&ResumeOutcome::Dormant { provider_name: "Acme".to_string() }),
            "dormant"
        );
    }
}
