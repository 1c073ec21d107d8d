//! Structured-output validation for `AgentCommand::response_format`.

use reactor_core::command::ResponseFormat;

/// Validate that `text` actually parses as the requested response format.
///
/// `ResponseFormat::Text` always passes — there is nothing to validate.
/// Returns the parse error message on failure so the engine can attempt a
/// single repair turn.
pub fn validate_response_format(format: ResponseFormat, text: &str) -> Result<(), String> {
    match format {
        ResponseFormat::Text => Ok(()),
        ResponseFormat::Json => serde_json::from_str::<serde_json::Value>(text)
            .map(|_| ())
            .map_err(|e| e.to_string()),
        ResponseFormat::Yaml => serde_yaml::from_str::<serde_yaml::Value>(text)
            .map(|_| ())
            .map_err(|e| e.to_string()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_format_always_passes() {
        assert!(validate_response_format(ResponseFormat::Text, "anything at all").is_ok());
    }

    #[test]
    fn valid_json_passes() {
        assert!(validate_response_format(ResponseFormat::Json, r#"{"a": 1}"#).is_ok());
    }

    #[test]
    fn invalid_json_fails() {
        assert!(validate_response_format(ResponseFormat::Json, "{not json").is_err());
    }

    #[test]
    fn valid_yaml_passes() {
        assert!(validate_response_format(ResponseFormat::Yaml, "a: 1\nb: 2\n").is_ok());
    }

    #[test]
    fn invalid_yaml_fails() {
        assert!(validate_response_format(ResponseFormat::Yaml, "a: [unterminated").is_err());
    }
}
