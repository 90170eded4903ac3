//! Comment validation

use super::model::{NewAuthor, NewComment};
use crate::error::{CommentsError, Result};

/// Maximum comment length (default)
pub const MAX_COMMENT_LENGTH: usize = 10000;

/// Minimum comment length
pub const MIN_COMMENT_LENGTH: usize = 1;

/// Validator for submitted comments
pub struct CommentValidator {
    max_length: usize,
    min_length: usize,
}

impl CommentValidator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self {
            max_length: MAX_COMMENT_LENGTH,
            min_length: MIN_COMMENT_LENGTH,
        }
    }

    /// Create a new validator with custom max length
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            min_length: MIN_COMMENT_LENGTH,
        }
    }

    /// Validate comment content
    pub fn validate_content(&self, content: &str) -> Result<()> {
        let length = content.trim().chars().count();

        if length < self.min_length {
            return Err(CommentsError::Validation(
                "Comment content cannot be empty".to_string(),
            ));
        }

        if length > self.max_length {
            return Err(CommentsError::Validation(format!(
                "Comment content exceeds maximum length of {} characters",
                self.max_length
            )));
        }

        Ok(())
    }

    /// Validate the author descriptor
    pub fn validate_author(&self, author: &NewAuthor) -> Result<()> {
        if let NewAuthor::Anonymous { name, email, .. } = author {
            if name.trim().is_empty() {
                return Err(CommentsError::Validation(
                    "Author name cannot be empty".to_string(),
                ));
            }
            if !email.contains('@') {
                return Err(CommentsError::Validation(format!(
                    "Author email '{}' is not valid",
                    email
                )));
            }
        }
        Ok(())
    }

    /// Validate a complete submission
    pub fn validate(&self, comment: &NewComment) -> Result<()> {
        self.validate_content(&comment.content)?;
        self.validate_author(&comment.author)
    }
}

impl Default for CommentValidator {
    fn default() -> Self {
        Self::new()
    }
}
