use async_trait::async_trait;
use echelon_core::{EchelonResult, Message};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Mutex;

/// The terminal routing choice: no further members, end the graph.
pub const FINISH: &str = "FINISH";

/// Raw output of a decision function.
///
/// `next` may be missing or name something the supervisor does not know
/// about; the supervisor tolerates both via its fallback policy instead of
/// failing the graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteDecision {
    /// The member to route to next, or [`FINISH`].
    #[serde(default)]
    pub next: Option<String>,
}

impl RouteDecision {
    /// A decision routing to the given member.
    pub fn to(next: impl Into<String>) -> Self {
        Self {
            next: Some(next.into()),
        }
    }

    /// The terminal decision.
    pub fn finish() -> Self {
        Self {
            next: Some(FINISH.to_string()),
        }
    }
}

/// The decision-function seam of a supervisor.
///
/// Production deployments bind a language-model-backed implementation here;
/// this crate ships deterministic routers so the engine is fully testable
/// without one. A router returning an error fails the enclosing graph run;
/// a router returning garbage does not (see [`crate::SupervisorNode`]).
#[async_trait]
pub trait Router: Send + Sync {
    /// Picks the next member for `team`, given the configured member names
    /// and the running history.
    async fn decide(
        &self,
        team: &str,
        members: &[String],
        history: &[Message],
    ) -> EchelonResult<RouteDecision>;
}

/// Routes to each member exactly once, in configuration order, then FINISH.
///
/// A member counts as visited once any message in the history carries its
/// identifier as `origin_node` — including error-flagged messages, so a
/// failing member is not retried forever.
pub struct SequentialRouter;

impl SequentialRouter {
    /// Creates the router.
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequentialRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Router for SequentialRouter {
    async fn decide(
        &self,
        _team: &str,
        members: &[String],
        history: &[Message],
    ) -> EchelonResult<RouteDecision> {
        let visited: HashSet<&str> = history
            .iter()
            .filter_map(|m| m.origin_node.as_deref())
            .collect();

        for member in members {
            if !visited.contains(member.as_str()) {
                return Ok(RouteDecision::to(member));
            }
        }
        Ok(RouteDecision::finish())
    }
}

/// Replays a fixed sequence of decisions, then FINISH.
///
/// Intended for tests that need full control over routing, including
/// malformed decisions (`next: None`) to exercise the fallback policy.
pub struct ScriptedRouter {
    script: Mutex<std::collections::VecDeque<RouteDecision>>,
}

impl ScriptedRouter {
    /// Creates a router that replays `decisions` in order.
    pub fn new(decisions: Vec<RouteDecision>) -> Self {
        Self {
            script: Mutex::new(decisions.into()),
        }
    }
}

#[async_trait]
impl Router for ScriptedRouter {
    async fn decide(
        &self,
        _team: &str,
        _members: &[String],
        _history: &[Message],
    ) -> EchelonResult<RouteDecision> {
        let mut script = self
            .script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(script.pop_front().unwrap_or_else(RouteDecision::finish))
    }
}
