use crate::supervisor::{Route, SupervisorNode};
use echelon_core::{EchelonError, EchelonResult, Message};
use echelon_workers::Worker;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A member a supervisor can route to: a worker capability or a nested team.
///
/// Sub-teams are owned by value, so cycles across levels are impossible by
/// construction.
pub enum Member {
    /// A leaf task-executing capability.
    Worker(Arc<dyn Worker>),
    /// A nested team graph, exposed to the parent as a single member.
    SubTeam(TeamGraph),
}

/// One member visit, reported through the progress channel in emission order.
#[derive(Debug, Clone)]
pub struct NodeVisit {
    /// The visited node's identifier.
    pub node: String,
    /// The messages the visit appended to its history.
    pub messages: Vec<Message>,
}

/// One supervisor plus its members, forming a repeat-until-FINISH loop.
///
/// Execution starts at the supervisor. Each decision either selects a member
/// — whose output is appended to history, tagged with the member's
/// identifier, before control returns to the supervisor — or terminates the
/// graph. Workers never invoke each other directly; all sequencing lives in
/// the supervisor.
pub struct TeamGraph {
    name: String,
    supervisor: SupervisorNode,
    members: Vec<(String, Member)>,
    step_limit: usize,
}

impl TeamGraph {
    pub(crate) fn from_parts(
        name: String,
        supervisor: SupervisorNode,
        members: Vec<(String, Member)>,
        step_limit: usize,
    ) -> Self {
        Self {
            name,
            supervisor,
            members,
            step_limit,
        }
    }

    /// The graph's name (also its member identifier when nested).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member names in configuration order.
    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Members in configuration order.
    pub fn members(&self) -> &[(String, Member)] {
        &self.members
    }

    /// Nesting depth: 1 for a leaf team, 1 + deepest sub-team otherwise.
    pub fn depth(&self) -> usize {
        1 + self
            .members
            .iter()
            .map(|(_, m)| match m {
                Member::Worker(_) => 0,
                Member::SubTeam(graph) => graph.depth(),
            })
            .max()
            .unwrap_or(0)
    }

    /// Runs the graph to terminal, appending all produced messages to
    /// `history` and reporting each member visit through `progress`.
    ///
    /// The supervisor is consulted at most `step_limit` times; a supervisor
    /// that never selects FINISH fails the task with
    /// [`EchelonError::StepLimit`] rather than looping forever.
    ///
    /// Boxed because sub-team invocation recurses through this function.
    pub fn run<'a>(
        &'a self,
        history: &'a mut Vec<Message>,
        progress: Option<&'a mpsc::UnboundedSender<NodeVisit>>,
    ) -> Pin<Box<dyn Future<Output = EchelonResult<()>> + Send + 'a>> {
        Box::pin(self.run_inner(history, progress))
    }

    async fn run_inner(
        &self,
        history: &mut Vec<Message>,
        progress: Option<&mpsc::UnboundedSender<NodeVisit>>,
    ) -> EchelonResult<()> {
        let mut decisions = 0usize;

        loop {
            if decisions >= self.step_limit {
                return Err(EchelonError::StepLimit {
                    team: self.name.clone(),
                    limit: self.step_limit,
                });
            }

            let route = self.supervisor.route(history).await?;
            decisions += 1;

            let member_name = match route {
                Route::Finish => {
                    info!(team = %self.name, decisions, "Team graph finished");
                    return Ok(());
                }
                Route::Member(name) => name,
            };

            let member = self
                .members
                .iter()
                .find(|(n, _)| *n == member_name)
                .map(|(_, m)| m)
                .ok_or_else(|| {
                    EchelonError::Graph(format!(
                        "team '{}' routed to unknown member '{member_name}'",
                        self.name
                    ))
                })?;

            let produced = self
                .invoke_member(&member_name, member, history, progress)
                .await?;

            history.extend(produced.iter().cloned());
            if let Some(tx) = progress {
                // The consumer may already be gone; late visits are dropped.
                let _ = tx.send(NodeVisit {
                    node: member_name,
                    messages: produced,
                });
            }
        }
    }

    /// Convenience entry point: seeds the history with the task text and
    /// runs to terminal, returning the full history.
    pub async fn run_to_completion(&self, task: &str) -> EchelonResult<Vec<Message>> {
        let mut history = vec![Message::user(task)];
        self.run(&mut history, None).await?;
        Ok(history)
    }

    async fn invoke_member(
        &self,
        name: &str,
        member: &Member,
        history: &[Message],
        progress: Option<&mpsc::UnboundedSender<NodeVisit>>,
    ) -> EchelonResult<Vec<Message>> {
        // The sub-task instruction is whatever seeded this graph's history:
        // the user task at the root, the parent's latest message below it.
        let instruction = history.first().map(|m| m.content.clone()).unwrap_or_default();

        match member {
            Member::Worker(worker) => {
                debug!(team = %self.name, worker = name, "Invoking worker");
                match worker.invoke(&instruction, history).await {
                    Ok(messages) => Ok(messages
                        .into_iter()
                        .map(|mut m| {
                            // Enforce tagging regardless of worker behavior.
                            m.origin_node = Some(name.to_string());
                            m
                        })
                        .collect()),
                    Err(e) => {
                        // Worker failure becomes data the supervisor can
                        // observe and route around; it never crashes the
                        // graph.
                        warn!(team = %self.name, worker = name, error = %e, "Worker failed");
                        Ok(vec![Message::error_from_node(
                            name,
                            format!("Worker '{name}' failed: {e}"),
                        )])
                    }
                }
            }
            Member::SubTeam(graph) => {
                debug!(team = %self.name, sub_team = name, "Invoking sub-team");
                // The sub-team sees only the parent's most recent message,
                // not the whole parent history.
                let seed = history
                    .last()
                    .cloned()
                    .unwrap_or_else(|| Message::user(&instruction));
                let mut sub_history = vec![seed];
                graph.run(&mut sub_history, progress).await?;

                // Fold the sub-team's final message back into the parent,
                // tagged with the sub-team's identifier.
                let folded = sub_history
                    .last()
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                Ok(vec![Message::from_node(name, folded)])
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::composer::TeamBuilder;
    use crate::router::{RouteDecision, Router, ScriptedRouter, SequentialRouter};
    use async_trait::async_trait;
    use echelon_workers::WebSearch;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Worker that always fails.
    struct BrokenWorker;

    #[async_trait]
    impl Worker for BrokenWorker {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always fails."
        }

        async fn invoke(
            &self,
            _instruction: &str,
            _history: &[Message],
        ) -> EchelonResult<Vec<Message>> {
            Err(EchelonError::Worker("deliberate failure".to_string()))
        }
    }

    /// Router that never finishes and counts its decisions.
    struct StubbornRouter {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Router for StubbornRouter {
        async fn decide(
            &self,
            _team: &str,
            members: &[String],
            _history: &[Message],
        ) -> EchelonResult<RouteDecision> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RouteDecision::to(members[0].clone()))
        }
    }

    #[tokio::test]
    async fn test_worker_output_appended_and_tagged() {
        let graph = TeamBuilder::new("search_team", Arc::new(SequentialRouter::new()))
            .worker(Arc::new(WebSearch::new()))
            .build()
            .unwrap();

        let history = graph.run_to_completion("find AI agents").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].origin_node.as_deref(), Some("searcher"));
        assert!(history[1].content.contains("find AI agents"));
    }

    #[tokio::test]
    async fn test_worker_failure_becomes_error_message() {
        let graph = TeamBuilder::new("t", Arc::new(SequentialRouter::new()))
            .worker(Arc::new(BrokenWorker))
            .build()
            .unwrap();

        let history = graph.run_to_completion("anything").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[1].is_error);
        assert!(history[1].content.contains("deliberate failure"));
    }

    #[tokio::test]
    async fn test_step_limit_exact_decision_count() {
        let calls = Arc::new(AtomicUsize::new(0));
        let graph = TeamBuilder::new("t", Arc::new(StubbornRouter { calls: calls.clone() }))
            .worker(Arc::new(WebSearch::new()))
            .step_limit(7)
            .build()
            .unwrap();

        let err = graph.run_to_completion("loop forever").await.unwrap_err();
        assert!(matches!(err, EchelonError::StepLimit { limit: 7, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_nested_team_seeded_with_last_message_and_folded_back() {
        let inner = TeamBuilder::new("search_team", Arc::new(SequentialRouter::new()))
            .worker(Arc::new(WebSearch::new()))
            .build()
            .unwrap();

        let outer = TeamBuilder::new(
            "research_team",
            Arc::new(ScriptedRouter::new(vec![
                RouteDecision::to("search_team"),
                RouteDecision::finish(),
            ])),
        )
        .sub_team(inner)
        .build()
        .unwrap();

        let history = outer.run_to_completion("research AI agents").await.unwrap();
        // [user task, folded search_team result]
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].origin_node.as_deref(), Some("search_team"));
        assert!(history[1].content.contains("research AI agents"));
    }

    #[tokio::test]
    async fn test_progress_reports_leaf_then_subteam() {
        let inner = TeamBuilder::new("search_team", Arc::new(SequentialRouter::new()))
            .worker(Arc::new(WebSearch::new()))
            .build()
            .unwrap();
        let outer = TeamBuilder::new("research_team", Arc::new(SequentialRouter::new()))
            .sub_team(inner)
            .build()
            .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut history = vec![Message::user("go")];
        outer.run(&mut history, Some(&tx)).await.unwrap();
        drop(tx);

        let mut visits = Vec::new();
        while let Some(v) = rx.recv().await {
            visits.push(v.node);
        }
        assert_eq!(visits, vec!["searcher".to_string(), "search_team".to_string()]);
    }
}
