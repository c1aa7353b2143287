use regex::Regex;

use crate::error::AppError;

const RESERVED_NAMES: &[&str] = &[".", ".."];

/// Checks a new file or folder name before anything is sent to the server.
pub fn validate_node_name(name: &str, blacklist: Option<&Regex>) -> Result<(), AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }

    if trimmed.contains('/') {
        return Err(AppError::Validation(
            "\"/\" is not allowed inside a name".to_string(),
        ));
    }

    if RESERVED_NAMES.contains(&trimmed) {
        return Err(AppError::Validation(format!(
            "\"{trimmed}\" is a reserved name"
        )));
    }

    if let Some(pattern) = blacklist {
        if pattern.is_match(trimmed) {
            return Err(AppError::Validation(format!(
                "\"{trimmed}\" is not an allowed name"
            )));
        }
    }

    Ok(())
}

pub fn validate_tag_name(name: &str) -> Result<(), AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("tag name must not be empty".to_string()));
    }
    if trimmed.contains('/') {
        return Err(AppError::Validation(
            "tag name must not contain \"/\"".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_message(message: &str) -> Result<(), AppError> {
    if message.trim().is_empty() {
        return Err(AppError::Validation(
            "comment must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blacklist() -> Regex {
        Regex::new(r"\.(part|filepart)$").unwrap()
    }

    #[test]
    fn test_valid_names() {
        assert!(validate_node_name("Photos", None).is_ok());
        assert!(validate_node_name("  report 2024.pdf ", Some(&blacklist())).is_ok());
        assert!(validate_node_name(".config", None).is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(validate_node_name("", None).is_err());
        assert!(validate_node_name("   ", None).is_err());
    }

    #[test]
    fn test_slash_and_reserved_rejected() {
        assert!(validate_node_name("a/b", None).is_err());
        assert!(validate_node_name("..", None).is_err());
        assert!(validate_node_name(" . ", None).is_err());
    }

    #[test]
    fn test_blacklisted_name_rejected() {
        let err = validate_node_name("upload.part", Some(&blacklist())).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(validate_node_name("upload.part", None).is_ok());
    }

    #[test]
    fn test_tag_names() {
        assert!(validate_tag_name("urgent").is_ok());
        assert!(validate_tag_name(" ").is_err());
        assert!(validate_tag_name("a/b").is_err());
    }

    #[test]
    fn test_comment_message() {
        assert!(validate_message("hi").is_ok());
        assert!(validate_message("\n ").is_err());
    }
}
