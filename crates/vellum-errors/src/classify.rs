//! Classification of error codes into the four buckets every component's
//! failure modes fall into: input, transient, resource, and integrity.

/// The four classes every component error code falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Surfaced to the caller; never retried (bad input, unsupported format).
    Input,
    /// Retryable under the component's retry policy.
    Transient,
    /// Surfaced; may trigger restart/user-prompt strategies.
    Resource,
    /// Non-retryable; data is suspect (checksum mismatch, corrupted model).
    Integrity,
}

/// Classify a stable error code into its failure-class bucket.
///
/// Unrecognized codes default to [`ErrorClass::Transient`] so an unknown
/// failure is retried rather than silently dropped; callers that need a
/// harder default should match on their own enum variant instead.
#[must_use]
pub fn classify_code(code: &str) -> ErrorClass {
    match code {
        "invalid_file" | "invalid_url" | "invalid_audio_format" | "unsupported_language"
        | "invalid_model" | "invalid_input" | "unsupported_format" | "unsupported" => {
            ErrorClass::Input
        }
        "network_error" | "timeout_error" | "server_error" | "audio_processing_failed" => {
            ErrorClass::Transient
        }
        "resource_exhausted" | "out_of_memory" | "insufficient_disk_space"
        | "permission_denied" | "disk_error" => ErrorClass::Resource,
        "checksum_mismatch" | "corrupted_model" | "inference_failed" => ErrorClass::Integrity,
        _ => ErrorClass::Transient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_codes() {
        assert_eq!(classify_code("invalid_file"), ErrorClass::Input);
        assert_eq!(classify_code("network_error"), ErrorClass::Transient);
        assert_eq!(classify_code("out_of_memory"), ErrorClass::Resource);
        assert_eq!(classify_code("checksum_mismatch"), ErrorClass::Integrity);
    }

    #[test]
    fn unknown_code_defaults_to_transient() {
        assert_eq!(classify_code("something_new"), ErrorClass::Transient);
    }
}
