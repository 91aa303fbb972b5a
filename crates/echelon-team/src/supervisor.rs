use crate::router::{RouteDecision, Router, FINISH};
use echelon_core::{EchelonError, EchelonResult, Message};
use std::sync::Arc;
use tracing::{debug, warn};

/// A resolved routing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Execute the named member next.
    Member(String),
    /// Terminate the enclosing graph.
    Finish,
}

/// The decision node of one team graph.
///
/// Wraps the injected [`Router`] and resolves its raw output against the
/// team's configured members. An unrecognized or missing `next` value falls
/// back deterministically to the first configured member — the graph keeps
/// running instead of crashing on a malformed decision. Router errors are
/// not tolerated and propagate to the caller.
pub struct SupervisorNode {
    team: String,
    members: Vec<String>,
    router: Arc<dyn Router>,
}

impl SupervisorNode {
    /// Creates a supervisor for `team` over the given member names.
    pub fn new(team: impl Into<String>, members: Vec<String>, router: Arc<dyn Router>) -> Self {
        Self {
            team: team.into(),
            members,
            router,
        }
    }

    /// The member names this supervisor can route to.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Decides the next step for the given history.
    pub async fn route(&self, history: &[Message]) -> EchelonResult<Route> {
        let decision = self
            .router
            .decide(&self.team, &self.members, history)
            .await?;
        Ok(self.resolve(decision))
    }

    fn resolve(&self, decision: RouteDecision) -> Route {
        match decision.next {
            Some(next) if next == FINISH => Route::Finish,
            Some(next) if self.members.contains(&next) => {
                debug!(team = %self.team, next = %next, "Supervisor routed");
                Route::Member(next)
            }
            other => {
                // Fallback policy: an unknown or missing member name routes
                // to the first configured member. A memberless team (rejected
                // by the builder, but constructible by hand) finishes.
                match self.members.first() {
                    Some(fallback) => {
                        warn!(
                            team = %self.team,
                            decision = ?other,
                            fallback = %fallback,
                            "Unrecognized routing decision, using fallback member"
                        );
                        Route::Member(fallback.clone())
                    }
                    None => Route::Finish,
                }
            }
        }
    }

    /// Validates that the supervisor has at least one member to fall back to.
    pub fn validate(&self) -> EchelonResult<()> {
        if self.members.is_empty() {
            return Err(EchelonError::Compose(format!(
                "team '{}' has no members",
                self.team
            )));
        }
        Ok(())
    }
}
