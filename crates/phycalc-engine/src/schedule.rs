//! Dependency graph over calculation units.
//!
//! Edges come from observed access sets: `a -> b` when `b` reads something
//! `a` writes. Writers of the same variable are chained in registration
//! order so the last-registered writer runs last and its value sticks,
//! unless the read edges already put the later writer first. Then the
//! chain link is dropped and the topological order decides the last writer.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;

use crate::context::Access;
use crate::error::EngineError;
use crate::unit::CalcUnit;

/// `(producer, consumer)` unit indices.
pub type Edge = (usize, usize);

/// An execution plan: unit names in order plus the edges that forced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    pub order: Vec<String>,
    pub edges: Vec<(String, String)>,
}

/// Derive unit edges from access sets. Writes to `forced` variables never
/// produce edges; the engine will not change those values.
pub fn dependency_edges(access: &[Access], forced: &HashSet<String>) -> BTreeSet<Edge> {
    let mut writers: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (idx, a) in access.iter().enumerate() {
        for w in &a.writes {
            if !forced.contains(w) {
                writers.entry(w.as_str()).or_default().push(idx);
            }
        }
    }

    let mut edges = BTreeSet::new();
    for (reader, a) in access.iter().enumerate() {
        for r in &a.reads {
            if let Some(ws) = writers.get(r.as_str()) {
                for &w in ws {
                    if w != reader {
                        edges.insert((w, reader));
                    }
                }
            }
        }
    }
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); access.len()];
    for &(a, b) in &edges {
        outgoing[a].push(b);
    }
    for ws in writers.values() {
        for pair in ws.windows(2) {
            let (earlier, later) = (pair[0], pair[1]);
            if edges.contains(&(earlier, later)) || reaches(&outgoing, later, earlier) {
                continue;
            }
            edges.insert((earlier, later));
            outgoing[earlier].push(later);
        }
    }
    edges
}

/// True if `to` can be reached from `from` along `outgoing`.
fn reaches(outgoing: &[Vec<usize>], from: usize, to: usize) -> bool {
    let mut seen = vec![false; outgoing.len()];
    let mut stack = vec![from];
    while let Some(idx) = stack.pop() {
        if idx == to {
            return true;
        }
        if std::mem::replace(&mut seen[idx], true) {
            continue;
        }
        stack.extend(outgoing[idx].iter().copied());
    }
    false
}

/// Kahn's algorithm with ties broken by registration order.
///
/// On a cycle, the error names only the units that lie on (or between)
/// cycles, not everything downstream of them.
pub fn topological_order(units: &[CalcUnit], edges: &BTreeSet<Edge>) -> Result<Vec<usize>, EngineError> {
    let n = units.len();
    let mut in_degree = vec![0usize; n];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(a, b) in edges {
        outgoing[a].push(b);
        in_degree[b] += 1;
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|i| in_degree[*i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(idx) = ready.pop_first() {
        order.push(idx);
        for &t in &outgoing[idx] {
            in_degree[t] -= 1;
            if in_degree[t] == 0 {
                ready.insert(t);
            }
        }
    }

    if order.len() == n {
        return Ok(order);
    }

    // Peel off stuck units that feed nothing else stuck; the rest is cyclic.
    let mut stuck: BTreeSet<usize> = (0..n).filter(|i| in_degree[*i] > 0).collect();
    loop {
        let leaves: Vec<usize> = stuck
            .iter()
            .copied()
            .filter(|i| !outgoing[*i].iter().any(|t| stuck.contains(t)))
            .collect();
        if leaves.is_empty() {
            break;
        }
        for leaf in leaves {
            stuck.remove(&leaf);
        }
    }
    Err(EngineError::CyclicDependency(
        stuck.into_iter().map(|i| units[i].name().to_string()).collect(),
    ))
}

/// True if some edge runs backwards in `order`.
pub fn violates(order: &[usize], edges: &BTreeSet<Edge>) -> bool {
    let mut position = vec![usize::MAX; order.len()];
    for (pos, &idx) in order.iter().enumerate() {
        if idx < position.len() {
            position[idx] = pos;
        }
    }
    edges.iter().any(|&(a, b)| match (position.get(a), position.get(b)) {
        (Some(pa), Some(pb)) => pa > pb,
        _ => false,
    })
}
