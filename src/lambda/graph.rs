use alloc::rc::Rc;
use std::collections::{HashMap, VecDeque};

use tracing::{debug, info, trace};

use super::{
    format,
    known::Registry,
    reduction::{is_normal, reducts},
    term::{Term, TermRef},
};

/// Upper bound for [`Budget::Auto`].
pub const AUTO_BUDGET_CAP: usize = 50;

/// How many terms an exploration may expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Budget {
    /// The square of the start term's size, capped at [`AUTO_BUDGET_CAP`].
    #[default]
    Auto,
    Limit(usize),
}

impl Budget {
    pub fn resolve(self, start: &Term) -> usize {
        match self {
            Budget::Auto => {
                let size = start.size();
                size.saturating_mul(size).min(AUTO_BUDGET_CAP)
            }
            Budget::Limit(limit) => limit,
        }
    }
}

#[derive(Debug)]
pub struct Node {
    /// Canonical key of the term.
    pub id: String,
    pub label: String,
    pub term: TermRef,
    /// Whether the term's reductions were followed. Unexplored nodes are
    /// the frontier left behind by a truncated exploration.
    pub explored: bool,
}

impl Node {
    fn new(id: String, term: TermRef) -> Self {
        Node {
            id,
            label: format::pretty(&term),
            term,
            explored: false,
        }
    }

    pub fn is_normal(&self) -> bool {
        is_normal(&self.term)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    /// Position of the contracted redex in the source's redex order.
    pub redex_index: usize,
    /// Distinguishes parallel edges between the same two nodes.
    pub key: String,
}

#[derive(Debug)]
pub struct ReductionGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    truncated: bool,
}

impl ReductionGraph {
    /// Nodes in discovery order; the start term comes first.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges grouped by source in expansion order, each group in redex order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Whether the budget ran out before every reachable term was expanded.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn outgoing<'g>(&'g self, id: &'g str) -> impl Iterator<Item = &'g Edge> + 'g {
        self.edges.iter().filter(move |edge| edge.source == id)
    }

    pub fn normal_forms(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.is_normal())
    }

    /// Rewrites every label with known terms replaced by their names.
    pub fn relabel(&mut self, registry: &mut Registry) {
        for node in &mut self.nodes {
            node.label = format::named(&node.term, registry);
        }
    }
}

/// Breadth-first search over single beta steps from `start`.
///
/// Terms are identified by their canonical key, so alpha-equivalent
/// reducts share a node. Expansion stops when nothing is left to expand
/// or after `budget` expansions, whichever comes first.
pub fn explore(start: &TermRef, budget: Budget) -> ReductionGraph {
    let limit = budget.resolve(start);

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut worklist = VecDeque::new();

    let start_key = format::key(start);
    index.insert(start_key.clone(), 0);
    nodes.push(Node::new(start_key, Rc::clone(start)));
    worklist.push_back(0);

    let mut expanded = 0;
    while expanded < limit {
        let Some(current) = worklist.pop_front() else {
            break;
        };
        expanded += 1;

        let term = Rc::clone(&nodes[current].term);
        let source = nodes[current].id.clone();
        nodes[current].explored = true;

        let steps = reducts(&term);
        trace!(node = %source, redexes = steps.len(), "expanding");

        for (redex_index, (reduced, _)) in steps.into_iter().enumerate() {
            let target = format::key(&reduced);
            if !index.contains_key(&target) {
                index.insert(target.clone(), nodes.len());
                worklist.push_back(nodes.len());
                nodes.push(Node::new(target.clone(), reduced));
            }

            edges.push(Edge {
                key: format!("{source}|{target}|{redex_index}"),
                source: source.clone(),
                target,
                redex_index,
            });
        }
    }

    let truncated = !worklist.is_empty();
    if truncated {
        info!(limit, pending = worklist.len(), "exploration budget exhausted");
    }
    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        expanded,
        truncated,
        "reduction graph explored"
    );

    ReductionGraph {
        nodes,
        edges,
        truncated,
    }
}

/// The first beta-normal term expanded in breadth-first order, if one is
/// reached within `budget` expansions.
pub fn normal_form(start: &TermRef, budget: Budget) -> Option<TermRef> {
    explore(start, budget)
        .normal_forms()
        .find(|node| node.explored)
        .map(|node| Rc::clone(&node.term))
}
