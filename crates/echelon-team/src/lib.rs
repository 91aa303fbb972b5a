//! Hierarchical team orchestration engine.
//!
//! A team graph is one supervisor plus its members: worker capabilities or
//! nested sub-teams. After a member executes, control always returns to the
//! supervisor, which decides the next step or terminates. Graphs nest up to
//! three levels; the task scheduler drives the root graph and converts its
//! progress into a finite sequence of execution events.
//!
//! # Main types
//!
//! - [`Router`] — The decision-function seam; picks the next member or FINISH.
//! - [`SupervisorNode`] — Resolves raw decisions with deterministic fallback.
//! - [`TeamGraph`] / [`Member`] — The repeat-until-FINISH execution loop.
//! - [`TeamBuilder`] — Bottom-up hierarchy assembly with uniqueness checks.
//! - [`TaskScheduler`] — Runs a task and emits [`echelon_core::ExecutionEvent`]s.
//! - [`Planner`] — Replaceable heuristic producing a cosmetic execution-plan
//!   preview; never part of routing.

/// Hierarchy assembly and the default three-level team tree.
pub mod composer;
/// Team graph state machine and member dispatch.
pub mod graph;
/// Execution-plan preview heuristics.
pub mod planner;
/// Routing decision interface and deterministic routers.
pub mod router;
/// Task scheduling and event emission.
pub mod scheduler;
/// Supervisor decision resolution.
pub mod supervisor;

pub use composer::{
    default_hierarchy, describe, display_name, MemberDescription, TeamBuilder, TeamDescription,
    DEFAULT_STEP_LIMIT, MAX_DEPTH,
};
pub use graph::{Member, NodeVisit, TeamGraph};
pub use planner::{KeywordPlanner, Planner};
pub use router::{RouteDecision, Router, ScriptedRouter, SequentialRouter, FINISH};
pub use scheduler::{SchedulerConfig, TaskScheduler};
pub use supervisor::{Route, SupervisorNode};
