//! Reconstruction of a state-transition graph from a clocked process.
//!
//! The process body is searched for a case statement dispatching on the state
//! register. Each branch names one or more states; every assignment of a
//! state name to the state register inside a branch becomes a transition
//! guarded by the conditions that enclose it.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::RESET_HINTS;
use crate::error::{ExtractionError, Result};
use crate::extract::{flat_text, COMMENT_KINDS};
use crate::ir::{HdlLanguage, StateMachineGraph, Transition};
use crate::parser::cst::Node;
use crate::parser::grammar;
use crate::parser::profile::LanguageProfile;
use crate::utils::{is_identifier_like, words};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsmOptions {
    /// Record a branch without any next-state assignment as an unconditional
    /// self-loop.
    pub record_implicit_holds: bool,
}

/// Reconstruct the state machine of `process`, or an empty graph when the
/// process has no recognizable state dispatch.
pub fn extract_fsm(
    process: Node<'_>,
    profile: &'static LanguageProfile,
    options: FsmOptions,
) -> StateMachineGraph {
    match try_reconstruct(process, profile, options) {
        Ok(graph) => graph,
        Err(e) => {
            debug!("No state machine in process at row {}: {}", process.start_row(), e);
            StateMachineGraph::default()
        }
    }
}

pub fn try_reconstruct(
    process: Node<'_>,
    profile: &'static LanguageProfile,
    options: FsmOptions,
) -> Result<StateMachineGraph> {
    let (case, states) = find_dispatch(process, profile).ok_or(ExtractionError::FsmPatternNotFound)?;
    let selector = case_selector(case);

    let mut targets: Vec<String> = Vec::new();
    if !selector.is_empty() {
        targets.push(selector.clone());
    }
    for (target, value) in assignments(process, profile) {
        if states.iter().any(|s| profile.same_name(s, &value))
            && !targets.iter().any(|t| profile.same_name(t, &target))
        {
            targets.push(target);
        }
    }

    let mut builder = GraphBuilder {
        profile,
        selector,
        targets,
        states,
        transitions: IndexSet::new(),
    };
    for item in case_items(case, profile) {
        for from in branch_states(item, profile) {
            let found = builder.walk(item, &from, &mut Vec::new());
            if found == 0 && options.record_implicit_holds {
                builder.transitions.insert(Transition::new(from.as_str(), from.as_str(), ""));
            }
        }
    }

    let initial_state = builder
        .reset_state(process, case)
        .or_else(|| builder.states.first().cloned());
    Ok(StateMachineGraph {
        state_signal: builder.selector,
        states: builder.states,
        initial_state,
        transitions: builder.transitions.into_iter().collect(),
    })
}

/// Wrap a bare process (or sequential statements) in a minimal unit, parse
/// it, and reconstruct the state machine of the first process found.
pub fn extract_fsm_from_source(text: &str, language: HdlLanguage) -> StateMachineGraph {
    let profile = language.profile();
    let handle = match grammar::load(language) {
        Ok(handle) => handle,
        Err(e) => {
            debug!("Cannot reconstruct state machine: {}", e);
            return StateMachineGraph::default();
        }
    };
    let tree = match handle.parse(&wrap_source(text, language)) {
        Ok(tree) => tree,
        Err(e) => {
            debug!("Cannot reconstruct state machine: {}", e);
            return StateMachineGraph::default();
        }
    };
    match tree.root().find_first(profile.process_kinds) {
        Some(process) => extract_fsm(process, profile, FsmOptions::default()),
        None => StateMachineGraph::default(),
    }
}

fn wrap_source(text: &str, language: HdlLanguage) -> String {
    match language {
        HdlLanguage::Vhdl => {
            let has_process = words(text).any(|w| w.eq_ignore_ascii_case("process"));
            if has_process {
                format!("architecture fsm_source of fsm_source is\nbegin\n{}\nend;\n", text)
            } else {
                format!(
                    "architecture fsm_source of fsm_source is\nbegin\nprocess\nbegin\n{}\nend process;\nend;\n",
                    text
                )
            }
        }
        HdlLanguage::Verilog => {
            let has_always = words(text).any(|w| w.starts_with("always"));
            if has_always {
                format!("module fsm_source;\n{}\nendmodule\n", text)
            } else {
                format!("module fsm_source;\nalways begin\n{}\nend\nendmodule\n", text)
            }
        }
    }
}

/// The case statement dispatching on the state register, with its states.
fn find_dispatch<'t>(
    process: Node<'t>,
    profile: &LanguageProfile,
) -> Option<(Node<'t>, IndexSet<String>)> {
    let mut fallback = None;
    for case in process.descendants().filter(|n| n.is_kind(profile.case_kinds)) {
        let Some(states) = state_choices(case, profile) else {
            continue;
        };
        let assigns_state = assignments(case, profile)
            .iter()
            .any(|(_, value)| states.iter().any(|s| profile.same_name(s, value)));
        if assigns_state {
            return Some((case, states));
        }
        if fallback.is_none() {
            fallback = Some((case, states));
        }
    }
    fallback
}

/// Alternatives of a case statement, in order.
fn case_items<'t>(case: Node<'t>, profile: &LanguageProfile) -> Vec<Node<'t>> {
    let holder = match profile.case_body_kind {
        Some(kind) => match case.child_by_kind(kind) {
            Some(body) => body,
            None => return Vec::new(),
        },
        None => case,
    };
    holder.children_by_kind(profile.case_item_kind).collect()
}

/// Expression a case statement dispatches on.
fn case_selector(case: Node<'_>) -> String {
    case.child_by_kind("case_expression")
        .and_then(|expr| expr.named_children().next())
        .map(flat_text)
        .unwrap_or_default()
}

fn choices(item: Node<'_>, profile: &LanguageProfile) -> Vec<String> {
    let mut out = Vec::new();
    for element in item.children_by_kind(profile.choice_kind) {
        let text = flat_text(element);
        // `when A | B` keeps its keyword inside the choice node
        let text = match text.split_once(' ') {
            Some((keyword, rest)) if keyword.eq_ignore_ascii_case("when") => rest,
            _ => text.as_str(),
        };
        out.extend(
            text.split(profile.choice_separator)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        );
    }
    out
}

fn is_catch_all(choice: &str, profile: &LanguageProfile) -> bool {
    profile.same_name(choice, profile.catch_all_choice)
}

/// State names of one branch, catch-all choices left out.
fn branch_states(item: Node<'_>, profile: &LanguageProfile) -> Vec<String> {
    choices(item, profile)
        .into_iter()
        .filter(|c| !is_catch_all(c, profile))
        .collect()
}

/// All branch choices when every one of them is a plain name.
fn state_choices(case: Node<'_>, profile: &LanguageProfile) -> Option<IndexSet<String>> {
    let mut states = IndexSet::new();
    for item in case_items(case, profile) {
        for choice in branch_states(item, profile) {
            if !is_identifier_like(&choice) {
                return None;
            }
            states.insert(choice);
        }
    }
    (!states.is_empty()).then_some(states)
}

/// `(target, value)` of every assignment at or below `node`.
fn assignments(node: Node<'_>, profile: &LanguageProfile) -> Vec<(String, String)> {
    node.descendants()
        .filter(|n| n.is_kind(profile.assignment_kinds))
        .filter_map(assignment_parts)
        .collect()
}

/// Target and assigned value; `a = b` wrapped in an `operator_assignment` is looked through.
fn assignment_parts(node: Node<'_>) -> Option<(String, String)> {
    let node = node.child_by_kind("operator_assignment").unwrap_or(node);
    let mut parts = node.named_children().filter(|n| !COMMENT_KINDS.contains(&n.kind()));
    let target = parts.next()?;
    let value = parts.last()?;
    Some((flat_text(target), flat_text(value)))
}

fn join_guards(guards: &[String]) -> String {
    guards.join(" and ")
}

fn negate(conditions: &[String]) -> String {
    format!("not ({})", conditions.join(" or "))
}

struct GraphBuilder {
    profile: &'static LanguageProfile,
    selector: String,
    /// Signals or variables holding the next state.
    targets: Vec<String>,
    states: IndexSet<String>,
    transitions: IndexSet<Transition>,
}

impl GraphBuilder {
    fn same(&self, a: &str, b: &str) -> bool {
        self.profile.same_name(a, b)
    }

    fn is_target(&self, name: &str) -> bool {
        self.targets.iter().any(|t| self.same(t, name))
    }

    /// Destination state of `target := value` taken in state `from`.
    fn destination(&mut self, target: &str, value: &str, from: &str) -> Option<String> {
        if !self.is_target(target) || !is_identifier_like(value) {
            return None;
        }
        if self.same(value, target) || self.same(value, &self.selector) {
            return Some(from.to_string());
        }
        if let Some(state) = self.states.iter().find(|s| self.same(s, value)) {
            return Some(state.clone());
        }
        self.states.insert(value.to_string());
        Some(value.to_string())
    }

    /// Record the transitions below `node`; returns how many assignments to
    /// the state register were found.
    fn walk(&mut self, node: Node<'_>, from: &str, guards: &mut Vec<String>) -> usize {
        node.children()
            .map(|child| self.walk_node(child, from, guards))
            .sum()
    }

    fn walk_node(&mut self, node: Node<'_>, from: &str, guards: &mut Vec<String>) -> usize {
        if node.is_kind(self.profile.assignment_kinds) {
            let Some((target, value)) = assignment_parts(node) else {
                return 0;
            };
            match self.destination(&target, &value, from) {
                Some(to) => {
                    self.transitions
                        .insert(Transition::new(from, to, join_guards(guards)));
                    1
                }
                None => 0,
            }
        } else if node.kind() == self.profile.if_kind {
            self.walk_if(node, from, guards)
        } else if node.is_kind(self.profile.case_kinds) {
            self.walk_case(node, from, guards)
        } else {
            self.walk(node, from, guards)
        }
    }

    fn walk_guarded(
        &mut self,
        node: Node<'_>,
        guard: String,
        from: &str,
        guards: &mut Vec<String>,
    ) -> usize {
        if guard.is_empty() {
            return self.walk_node(node, from, guards);
        }
        guards.push(guard);
        let found = self.walk_node(node, from, guards);
        guards.pop();
        found
    }

    /// An if statement with its elsif and else branches. A Verilog
    /// `else if` continues the same chain.
    fn walk_if(&mut self, node: Node<'_>, from: &str, guards: &mut Vec<String>) -> usize {
        let mut found = 0;
        let mut taken: Vec<String> = Vec::new();
        for clause in if_clauses(node, self.profile) {
            let guard = match clause.condition {
                Some(condition) => {
                    taken.push(condition.clone());
                    condition
                }
                None => negate(&taken),
            };
            for part in clause.bodies {
                found += self.walk_guarded(part, guard.clone(), from, guards);
            }
        }
        found
    }

    /// A case statement nested inside a state branch.
    fn walk_case(&mut self, node: Node<'_>, from: &str, guards: &mut Vec<String>) -> usize {
        let selector = case_selector(node);
        let items: Vec<(Node<'_>, Vec<String>)> = case_items(node, self.profile)
            .into_iter()
            .map(|item| (item, branch_states(item, self.profile)))
            .collect();
        let equals = |choices: &[String]| -> Vec<String> {
            choices
                .iter()
                .map(|c| format!("{} = {}", selector, c))
                .collect()
        };
        let every_choice: Vec<String> = items.iter().flat_map(|(_, c)| c.clone()).collect();

        let mut found = 0;
        for (item, item_choices) in &items {
            let label = if item_choices.is_empty() {
                if every_choice.is_empty() {
                    String::new()
                } else {
                    negate(&equals(every_choice.as_slice()))
                }
            } else if item_choices.len() == 1 {
                equals(item_choices.as_slice()).remove(0)
            } else {
                format!("({})", equals(item_choices.as_slice()).join(" or "))
            };
            found += self.walk_guarded(*item, label, from, guards);
        }
        found
    }

    /// State entered by the reset branch of the process, if one is recognizable.
    fn reset_state(&self, process: Node<'_>, case: Node<'_>) -> Option<String> {
        let if_nodes = process
            .descendants()
            .filter(|n| n.kind() == self.profile.if_kind && !is_within(*n, case));
        for if_node in if_nodes {
            let Some(first) = if_clauses(if_node, self.profile).into_iter().next() else {
                continue;
            };
            if !first.condition.as_deref().is_some_and(names_reset) {
                continue;
            }
            for part in first.bodies {
                for (target, value) in assignments(part, self.profile) {
                    if !self.is_target(&target) {
                        continue;
                    }
                    if let Some(state) = self.states.iter().find(|s| self.same(s, &value)) {
                        return Some(state.clone());
                    }
                }
            }
        }
        None
    }
}

/// A condition tests a reset when one of its identifiers has a reset name
/// as a whole `_`-separated part (`rst_n`, `sys_reset`, but not `burst_done`).
fn names_reset(condition: &str) -> bool {
    words(condition).any(|w| {
        w.split('_')
            .any(|part| RESET_HINTS.contains(&part.to_ascii_lowercase().as_str()))
    })
}

/// One branch of an if chain: `None` marks the final else.
struct IfClause<'t> {
    condition: Option<String>,
    bodies: Vec<Node<'t>>,
}

/// The if, elsif and else branches of an if statement, in order.
fn if_clauses<'t>(node: Node<'t>, profile: &LanguageProfile) -> Vec<IfClause<'t>> {
    match profile.language {
        HdlLanguage::Vhdl => vhdl_if_clauses(node),
        HdlLanguage::Verilog => verilog_if_clauses(node, profile),
    }
}

const VHDL_IF_PARTS: &[&str] = &["if_statement_body", "elsif_statement", "else_statement"];

fn vhdl_if_clauses(node: Node<'_>) -> Vec<IfClause<'_>> {
    let mut clauses = Vec::new();
    let mut current = Some(node);
    while let Some(clause) = current.take() {
        let condition = clause
            .named_children()
            .find(|c| !c.is_kind(VHDL_IF_PARTS) && !COMMENT_KINDS.contains(&c.kind()))
            .map(flat_text)
            .unwrap_or_default();
        clauses.push(IfClause {
            condition: Some(condition),
            bodies: clause.children_by_kind("if_statement_body").collect(),
        });
        if let Some(elsif) = clause.child_by_kind("elsif_statement") {
            current = Some(elsif);
        } else if let Some(otherwise) = clause.child_by_kind("else_statement") {
            clauses.push(IfClause {
                condition: None,
                bodies: otherwise.children_by_kind("if_statement_body").collect(),
            });
        }
    }
    clauses
}

fn verilog_if_clauses<'t>(node: Node<'t>, profile: &LanguageProfile) -> Vec<IfClause<'t>> {
    let mut clauses = Vec::new();
    let mut current = Some(node);
    while let Some(clause) = current.take() {
        let condition = clause
            .child_by_kind("cond_predicate")
            .map(flat_text)
            .unwrap_or_default();
        let mut branches = clause.children_by_kind("statement_or_null");
        clauses.push(IfClause {
            condition: Some(condition),
            bodies: branches.next().into_iter().collect(),
        });
        let Some(otherwise) = branches.next() else {
            break;
        };
        match single_statement(otherwise) {
            Some(nested) if nested.kind() == profile.if_kind => current = Some(nested),
            _ => clauses.push(IfClause {
                condition: None,
                bodies: vec![otherwise],
            }),
        }
    }
    clauses
}

/// The statement a chain of single-child statement wrappers resolves to.
fn single_statement(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    while matches!(current.kind(), "statement_or_null" | "statement" | "statement_item") {
        let mut named = current
            .named_children()
            .filter(|c| !COMMENT_KINDS.contains(&c.kind()));
        let only = named.next()?;
        if named.next().is_some() {
            return None;
        }
        current = only;
    }
    Some(current)
}

fn is_within(node: Node<'_>, ancestor: Node<'_>) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        if n == ancestor {
            return true;
        }
        current = n.parent();
    }
    false
}
