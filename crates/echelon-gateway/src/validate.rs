use thiserror::Error;

/// Default upper bound on task length, in characters.
pub const MAX_TASK_LEN: usize = 5000;

/// Markup patterns rejected in task text, matched case-insensitively.
const DISALLOWED_PATTERNS: &[&str] = &["<script", "javascript:", "eval("];

/// Why a task was rejected before orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTask {
    /// Empty or whitespace-only task text.
    #[error("Task text must not be empty")]
    Empty,

    /// Task text longer than the configured limit.
    #[error("Task text exceeds the {max} character limit")]
    TooLong {
        /// The configured limit.
        max: usize,
    },

    /// Task text contains a disallowed markup pattern.
    #[error("Task text contains a disallowed pattern: {pattern}")]
    DisallowedPattern {
        /// The pattern that matched.
        pattern: String,
    },
}

/// Validates task text against the default length limit.
pub fn validate_task_input(task: &str) -> Result<(), InvalidTask> {
    validate_task_with_limit(task, MAX_TASK_LEN)
}

/// Validates task text against an explicit length limit.
///
/// Runs before any stream or background task is created, so a rejected
/// request allocates nothing.
pub fn validate_task_with_limit(task: &str, max_len: usize) -> Result<(), InvalidTask> {
    if task.trim().is_empty() {
        return Err(InvalidTask::Empty);
    }
    if task.chars().count() > max_len {
        return Err(InvalidTask::TooLong { max: max_len });
    }
    let lower = task.to_lowercase();
    for pattern in DISALLOWED_PATTERNS {
        if lower.contains(pattern) {
            return Err(InvalidTask::DisallowedPattern {
                pattern: (*pattern).to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_task_rejected_with_message() {
        let err = validate_task_input("").unwrap_err();
        assert_eq!(err, InvalidTask::Empty);
        assert!(!err.to_string().is_empty());

        assert_eq!(validate_task_input("   \n\t "), Err(InvalidTask::Empty));
    }

    #[test]
    fn test_over_limit_rejected() {
        let task = "a".repeat(5001);
        assert_eq!(
            validate_task_input(&task),
            Err(InvalidTask::TooLong { max: MAX_TASK_LEN })
        );
        // Exactly at the limit passes.
        assert!(validate_task_input(&"a".repeat(5000)).is_ok());
    }

    #[test]
    fn test_plain_task_accepted() {
        assert!(validate_task_input("hello").is_ok());
    }

    #[test]
    fn test_markup_patterns_rejected_case_insensitively() {
        for task in [
            "please <script>alert(1)</script>",
            "try JavaScript:void(0)",
            "run EVAL(payload)",
        ] {
            assert!(matches!(
                validate_task_input(task),
                Err(InvalidTask::DisallowedPattern { .. })
            ));
        }
    }

    #[test]
    fn test_custom_limit() {
        assert!(validate_task_with_limit("short", 10).is_ok());
        assert!(validate_task_with_limit("this one is too long", 10).is_err());
    }
}
