//! Ownership checks shared by mutating services.

use quill_common::{AppError, AppResult};

/// Reject the request unless `user_id` authored the resource.
pub fn ensure_author(author_id: &str, user_id: &str) -> AppResult<()> {
    if author_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the author can modify this resource".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_allowed() {
        assert!(ensure_author("u1", "u1").is_ok());
    }

    #[test]
    fn test_other_user_rejected() {
        match ensure_author("u1", "u2") {
            Err(AppError::Forbidden(_)) => {}
            _ => panic!("Expected Forbidden error"),
        }
    }
}
