use crate::ids::TaskId;
use crate::task::Task;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Finish-to-start dependency graph of a task list.
///
/// Nodes carry the index of the task in the source slice. Edges run from a
/// predecessor to its dependent; predecessor ids that are not in the task
/// list produce no edge.
pub struct ScheduleDag {
    pub graph: DiGraph<usize, ()>,
    pub id_to_index: HashMap<TaskId, NodeIndex>,
}

impl ScheduleDag {
    pub fn build(tasks: &[Task]) -> Self {
        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(tasks.len(), tasks.len());
        let mut id_to_index: HashMap<TaskId, NodeIndex> = HashMap::with_capacity(tasks.len());

        // Add nodes first
        for (position, task) in tasks.iter().enumerate() {
            let node_ix = graph.add_node(position);
            id_to_index.insert(task.id.clone(), node_ix);
        }

        // Add edges: pred -> task
        for task in tasks {
            let Some(&to) = id_to_index.get(&task.id) else {
                continue;
            };
            for pred_id in &task.predecessors {
                if let Some(&from) = id_to_index.get(pred_id) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        Self { graph, id_to_index }
    }

    pub fn task_position(&self, node_ix: NodeIndex) -> usize {
        self.graph[node_ix]
    }

    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.id_to_index.contains_key(task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_predecessors_add_no_edges() {
        let tasks = vec![
            Task::new(1, "A", 2),
            Task::new(2, "B", 3).with_predecessors([1, 99]),
        ];
        let dag = ScheduleDag::build(&tasks);
        assert_eq!(dag.graph.node_count(), 2);
        assert_eq!(dag.graph.edge_count(), 1);
        assert!(!dag.contains(&TaskId::from(99)));
    }
}
