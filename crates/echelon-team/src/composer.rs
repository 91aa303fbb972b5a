use crate::graph::{Member, TeamGraph};
use crate::router::Router;
use crate::supervisor::SupervisorNode;
use echelon_core::{EchelonError, EchelonResult};
use echelon_workers::{research_pool, writing_pool, Worker, WorkerPool};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Maximum nesting depth of a hierarchy: top supervisor, team supervisors,
/// worker-level teams.
pub const MAX_DEPTH: usize = 3;

/// Default cap on supervisor decisions per graph.
pub const DEFAULT_STEP_LIMIT: usize = 25;

/// Bottom-up assembly of one team graph.
///
/// Leaf graphs are built first and handed to the next level up via
/// [`sub_team`](TeamBuilder::sub_team). Member names must be unique within a
/// graph; nesting beyond [`MAX_DEPTH`] levels is rejected at build time.
pub struct TeamBuilder {
    name: String,
    router: Arc<dyn Router>,
    members: Vec<(String, Member)>,
    step_limit: usize,
}

impl TeamBuilder {
    /// Starts a builder for a team with the given name and decision function.
    pub fn new(name: impl Into<String>, router: Arc<dyn Router>) -> Self {
        Self {
            name: name.into(),
            router,
            members: Vec::new(),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    /// Overrides the supervisor decision cap for this graph.
    pub fn step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    /// Adds a worker member, registered under the worker's own name.
    pub fn worker(mut self, worker: Arc<dyn Worker>) -> Self {
        let name = worker.name().to_string();
        self.members.push((name, Member::Worker(worker)));
        self
    }

    /// Adds every worker of a pool, in pool order.
    pub fn pool(mut self, pool: &WorkerPool) -> Self {
        for worker in pool.workers() {
            self = self.worker(worker.clone());
        }
        self
    }

    /// Adds a nested team, registered under the team's name.
    pub fn sub_team(mut self, graph: TeamGraph) -> Self {
        let name = graph.name().to_string();
        self.members.push((name, Member::SubTeam(graph)));
        self
    }

    /// Builds the graph, validating member names and nesting depth.
    pub fn build(self) -> EchelonResult<TeamGraph> {
        if self.members.is_empty() {
            return Err(EchelonError::Compose(format!(
                "team '{}' has no members",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for (name, _) in &self.members {
            if !seen.insert(name.clone()) {
                return Err(EchelonError::Compose(format!(
                    "duplicate member '{name}' in team '{}'",
                    self.name
                )));
            }
        }

        let member_names: Vec<String> = self.members.iter().map(|(n, _)| n.clone()).collect();
        let supervisor = SupervisorNode::new(self.name.clone(), member_names, self.router);
        supervisor.validate()?;

        let graph = TeamGraph::from_parts(self.name, supervisor, self.members, self.step_limit);
        if graph.depth() > MAX_DEPTH {
            return Err(EchelonError::Compose(format!(
                "team '{}' nests {} levels deep, maximum is {MAX_DEPTH}",
                graph.name(),
                graph.depth()
            )));
        }
        Ok(graph)
    }
}

/// Builds the standard three-level hierarchy:
///
/// ```text
/// team_hierarchy ─┬─ research_team ──────── search_team ─┬─ searcher
///                 │                                      └─ web_crawler
///                 └─ document_writing_team ─ writing_team ─┬─ writer
///                                                          ├─ notebook
///                                                          └─ chart_generator
/// ```
///
/// The same router instance drives every supervisor; routers are stateless
/// over the history they receive.
pub fn default_hierarchy(router: Arc<dyn Router>, step_limit: usize) -> EchelonResult<TeamGraph> {
    let search_team = TeamBuilder::new("search_team", router.clone())
        .pool(&research_pool())
        .step_limit(step_limit)
        .build()?;

    let research_team = TeamBuilder::new("research_team", router.clone())
        .sub_team(search_team)
        .step_limit(step_limit)
        .build()?;

    let writing_team = TeamBuilder::new("writing_team", router.clone())
        .pool(&writing_pool())
        .step_limit(step_limit)
        .build()?;

    let document_writing_team = TeamBuilder::new("document_writing_team", router.clone())
        .sub_team(writing_team)
        .step_limit(step_limit)
        .build()?;

    TeamBuilder::new("team_hierarchy", router)
        .sub_team(research_team)
        .sub_team(document_writing_team)
        .step_limit(step_limit)
        .build()
}

/// Human-readable display label for a node identifier.
///
/// Unknown identifiers are displayed as-is by callers.
pub fn display_name(node: &str) -> Option<&'static str> {
    match node {
        "supervisor" | "team_hierarchy" => Some("Supervisor"),
        "searcher" => Some("Searcher"),
        "web_crawler" => Some("Web Crawler"),
        "writer" => Some("Writer"),
        "notebook" => Some("Notebook"),
        "chart_generator" => Some("Chart Generator"),
        "research_team" => Some("Research Team"),
        "document_writing_team" => Some("Document Writing Team"),
        "search_team" => Some("Search Team"),
        "writing_team" => Some("Writing Team"),
        _ => None,
    }
}

/// Serializable description of one team graph, for the gateway's
/// hierarchy listing.
#[derive(Debug, Clone, Serialize)]
pub struct TeamDescription {
    /// The team's identifier.
    pub name: String,
    /// Display label.
    pub display: String,
    /// Nesting depth of this graph.
    pub depth: usize,
    /// Members in configuration order.
    pub members: Vec<MemberDescription>,
}

/// Serializable description of one member.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberDescription {
    /// A leaf worker capability.
    Worker {
        /// The worker's node identifier.
        name: String,
        /// Display label.
        display: String,
        /// The worker's self-description.
        description: String,
    },
    /// A nested team.
    Team(TeamDescription),
}

/// Describes a graph recursively.
pub fn describe(graph: &TeamGraph) -> TeamDescription {
    let members = graph
        .members()
        .iter()
        .map(|(name, member)| match member {
            Member::Worker(worker) => MemberDescription::Worker {
                name: name.clone(),
                display: display_name(name).unwrap_or(name.as_str()).to_string(),
                description: worker.description().to_string(),
            },
            Member::SubTeam(sub) => MemberDescription::Team(describe(sub)),
        })
        .collect();

    TeamDescription {
        name: graph.name().to_string(),
        display: display_name(graph.name()).unwrap_or("Supervisor").to_string(),
        depth: graph.depth(),
        members,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::router::SequentialRouter;
    use echelon_workers::{WebCrawler, WebSearch};

    #[test]
    fn test_duplicate_member_rejected() {
        let result = TeamBuilder::new("t", Arc::new(SequentialRouter::new()))
            .worker(Arc::new(WebSearch::new()))
            .worker(Arc::new(WebSearch::new()))
            .build();
        assert!(matches!(result, Err(EchelonError::Compose(_))));
    }

    #[test]
    fn test_empty_team_rejected() {
        let result = TeamBuilder::new("t", Arc::new(SequentialRouter::new())).build();
        assert!(matches!(result, Err(EchelonError::Compose(_))));
    }

    #[test]
    fn test_depth_enforced_at_build_time() {
        let router: Arc<dyn Router> = Arc::new(SequentialRouter::new());
        let level3 = TeamBuilder::new("l3", router.clone())
            .worker(Arc::new(WebSearch::new()))
            .build()
            .unwrap();
        let level2 = TeamBuilder::new("l2", router.clone())
            .sub_team(level3)
            .build()
            .unwrap();
        let level1 = TeamBuilder::new("l1", router.clone())
            .sub_team(level2)
            .build()
            .unwrap();
        assert_eq!(level1.depth(), 3);

        let too_deep = TeamBuilder::new("l0", router).sub_team(level1).build();
        assert!(matches!(too_deep, Err(EchelonError::Compose(_))));
    }

    #[test]
    fn test_default_hierarchy_shape() {
        let graph =
            default_hierarchy(Arc::new(SequentialRouter::new()), DEFAULT_STEP_LIMIT).unwrap();
        assert_eq!(graph.name(), "team_hierarchy");
        assert_eq!(graph.depth(), 3);
        assert_eq!(
            graph.member_names(),
            vec!["research_team", "document_writing_team"]
        );
    }

    #[test]
    fn test_describe_lists_nested_members() {
        let router: Arc<dyn Router> = Arc::new(SequentialRouter::new());
        let inner = TeamBuilder::new("search_team", router.clone())
            .worker(Arc::new(WebSearch::new()))
            .worker(Arc::new(WebCrawler::new()))
            .build()
            .unwrap();
        let outer = TeamBuilder::new("research_team", router)
            .sub_team(inner)
            .build()
            .unwrap();

        let desc = describe(&outer);
        assert_eq!(desc.name, "research_team");
        assert_eq!(desc.members.len(), 1);
        match &desc.members[0] {
            MemberDescription::Team(team) => {
                assert_eq!(team.name, "search_team");
                assert_eq!(team.members.len(), 2);
            }
            MemberDescription::Worker { .. } => panic!("expected nested team"),
        }
    }
}
