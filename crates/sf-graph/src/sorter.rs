//! Execution ordering of modules.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use sf_core::ModuleId;

use crate::error::{GraphError, GraphResult};
use crate::port::Connection;

/// Dependency graph over modules.
///
/// Vertices keep their insertion rank; independent modules come out of
/// [`Sorter::topological_order`] in that rank, so rebuilding from the same
/// inputs always yields the same order.
#[derive(Debug, Clone, Default)]
pub struct Sorter {
    vertices: Vec<ModuleId>,
    rank: HashMap<ModuleId, usize>,
    successors: Vec<Vec<usize>>,
    edges: HashSet<(usize, usize)>,
}

impl Sorter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure `module` takes part in the ordering, even without edges.
    pub fn add_vertex(&mut self, module: ModuleId) -> usize {
        if let Some(&r) = self.rank.get(&module) {
            return r;
        }
        let r = self.vertices.len();
        self.vertices.push(module);
        self.rank.insert(module, r);
        self.successors.push(Vec::new());
        r
    }

    /// Record that `from` must execute before `to`. Parallel edges collapse.
    pub fn add_edge(&mut self, from: ModuleId, to: ModuleId) {
        let a = self.add_vertex(from);
        let b = self.add_vertex(to);
        if self.edges.insert((a, b)) {
            self.successors[a].push(b);
        }
    }

    /// Add the producer-to-consumer edges of a connection.
    pub fn add_connection(&mut self, connection: &Connection) {
        for (from, to) in connection.edges() {
            self.add_edge(from, to);
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Modules ordered so that every edge source precedes its destination.
    ///
    /// Fails with [`GraphError::CyclicDependency`] naming the modules of
    /// one cycle.
    pub fn topological_order(&self) -> GraphResult<Vec<ModuleId>> {
        let n = self.vertices.len();
        let mut in_degree = vec![0usize; n];
        for succ in &self.successors {
            for &b in succ {
                in_degree[b] += 1;
            }
        }

        // Min-heap on rank gives the stable tie-break.
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(r, _)| Reverse(r))
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(r)) = ready.pop() {
            order.push(self.vertices[r]);
            for &b in &self.successors[r] {
                in_degree[b] -= 1;
                if in_degree[b] == 0 {
                    ready.push(Reverse(b));
                }
            }
        }

        if order.len() != n {
            return Err(GraphError::CyclicDependency {
                cycle: self.find_cycle(&in_degree),
            });
        }
        Ok(order)
    }

    /// Extract one cycle among the vertices Kahn's algorithm could not
    /// release. Every such vertex has a predecessor that is also stuck, so
    /// walking predecessors must revisit a vertex.
    fn find_cycle(&self, in_degree: &[usize]) -> Vec<ModuleId> {
        let n = self.vertices.len();
        let mut stuck_pred: Vec<Option<usize>> = vec![None; n];
        for (a, succ) in self.successors.iter().enumerate() {
            if in_degree[a] == 0 {
                continue;
            }
            for &b in succ {
                if in_degree[b] > 0 && stuck_pred[b].is_none() {
                    stuck_pred[b] = Some(a);
                }
            }
        }

        let Some(start) = (0..n).find(|&v| in_degree[v] > 0) else {
            return Vec::new();
        };

        let mut seen: HashMap<usize, usize> = HashMap::new();
        let mut path = Vec::new();
        let mut v = start;
        loop {
            if let Some(&pos) = seen.get(&v) {
                let mut cycle: Vec<ModuleId> =
                    path[pos..].iter().map(|&r| self.vertices[r]).collect();
                // Walked against the edges; report in edge order.
                cycle.reverse();
                return cycle;
            }
            seen.insert(v, path.len());
            path.push(v);
            match stuck_pred[v] {
                Some(p) => v = p,
                None => return path.iter().map(|&r| self.vertices[r]).collect(),
            }
        }
    }
}
