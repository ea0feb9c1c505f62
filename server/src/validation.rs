use crate::error::ApiError;

/// Maximum text length for synthesis requests
const MAX_TEXT_LENGTH: usize = 5000;

/// Validate an instruct synthesis request
pub fn validate_synthesis_request(text: &str, instruct: &str) -> Result<(), ApiError> {
    if text.is_empty() {
        return Err(ApiError::InvalidInput(
            "tts_text cannot be empty".to_string(),
        ));
    }
    if text.len() > MAX_TEXT_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "tts_text too long (max {} characters)",
            MAX_TEXT_LENGTH
        )));
    }
    if instruct.is_empty() {
        return Err(ApiError::InvalidInput(
            "instruct_text cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_synthesis_request_valid() {
        assert!(validate_synthesis_request("Hello", "Speak slowly").is_ok());
    }

    #[test]
    fn test_validate_synthesis_request_empty_text() {
        let result = validate_synthesis_request("", "Speak slowly");
        assert!(result.is_err());
        if let Err(ApiError::InvalidInput(msg)) = result {
            assert!(msg.contains("empty"));
        }
    }

    #[test]
    fn test_validate_synthesis_request_too_long() {
        let long_text = "a".repeat(6000);
        let result = validate_synthesis_request(&long_text, "Speak slowly");
        assert!(result.is_err());
        if let Err(ApiError::InvalidInput(msg)) = result {
            assert!(msg.contains("too long"));
        }
    }

    #[test]
    fn test_validate_synthesis_request_empty_instruct() {
        let result = validate_synthesis_request("Hello", "");
        assert!(result.is_err());
        if let Err(ApiError::InvalidInput(msg)) = result {
            assert!(msg.contains("instruct_text"));
        }
    }
}
