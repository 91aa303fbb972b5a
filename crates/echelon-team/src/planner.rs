/// Produces a human-readable execution-plan preview for a task.
///
/// The preview feeds only cosmetic `thinking` events at the start of a run.
/// It has no influence on routing — actual sequencing is decided by the
/// supervisors — so implementations are free to be as rough as they like.
pub trait Planner: Send + Sync {
    /// Plan lines to surface before execution starts, in order.
    fn preview(&self, task: &str) -> Vec<String>;
}

/// Keyword-based plan preview.
///
/// Classifies the task into the teams it appears to need by substring
/// matching. A task matching nothing is assumed to need both teams.
pub struct KeywordPlanner;

const RESEARCH_KEYWORDS: &[&str] = &["research", "search", "find", "investigate", "look up"];
const WRITING_KEYWORDS: &[&str] = &["write", "report", "document", "draft", "summar", "chart", "note"];

impl KeywordPlanner {
    /// Creates the planner.
    pub fn new() -> Self {
        Self
    }
}

impl Default for KeywordPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Planner for KeywordPlanner {
    fn preview(&self, task: &str) -> Vec<String> {
        let lower = task.to_lowercase();
        let wants_research = RESEARCH_KEYWORDS.iter().any(|k| lower.contains(k));
        let wants_writing = WRITING_KEYWORDS.iter().any(|k| lower.contains(k));
        // No signal at all: plan for the full hierarchy.
        let (research, writing) = if wants_research || wants_writing {
            (wants_research, wants_writing)
        } else {
            (true, true)
        };

        let mut lines = vec![
            "Evaluating task complexity...".to_string(),
            "Planning the execution strategy...".to_string(),
        ];
        if research {
            lines.push("Assigning the task to the research team...".to_string());
        }
        if writing {
            lines.push("Assigning the task to the document writing team...".to_string());
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_research_only_task() {
        let lines = KeywordPlanner::new().preview("Find papers on Rust async runtimes");
        assert!(lines.iter().any(|l| l.contains("research team")));
        assert!(!lines.iter().any(|l| l.contains("document writing team")));
    }

    #[test]
    fn test_mixed_task_plans_both_teams() {
        let lines =
            KeywordPlanner::new().preview("Research AI agents and write a brief report about them.");
        assert!(lines.iter().any(|l| l.contains("research team")));
        assert!(lines.iter().any(|l| l.contains("document writing team")));
    }

    #[test]
    fn test_unclassifiable_task_plans_both_teams() {
        let lines = KeywordPlanner::new().preview("xyzzy");
        assert!(lines.iter().any(|l| l.contains("research team")));
        assert!(lines.iter().any(|l| l.contains("document writing team")));
    }
}
