use crate::error::{ScheduleError, ScheduleResult};
use crate::graph::schedule_dag::ScheduleDag;
use crate::ids::TaskId;
use crate::task::Task;
use petgraph::algo::toposort;
use std::collections::HashMap;

/// Earliest start/finish offsets of one task, in days from project start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarlyTimes {
    pub early_start: i64,
    pub early_finish: i64,
}

pub struct ForwardPass<'a> {
    tasks: &'a [Task],
}

impl<'a> ForwardPass<'a> {
    pub fn new(tasks: &'a [Task]) -> Self {
        Self { tasks }
    }

    /// Computes early times for every task.
    ///
    /// Processing follows a topological order of the dependency graph, so the
    /// input order does not need to respect dependencies. A cycle, or a
    /// predecessor whose timing is not yet available when its dependent is
    /// reached, fails with [`ScheduleError::CycleOrOrdering`].
    pub fn execute(&self) -> ScheduleResult<HashMap<TaskId, EarlyTimes>> {
        let dag = ScheduleDag::build(self.tasks);

        let order = toposort(&dag.graph, None).map_err(|cycle| {
            let position = dag.task_position(cycle.node_id());
            ScheduleError::CycleOrOrdering {
                task_id: self.tasks[position].id.clone(),
            }
        })?;

        let mut results: HashMap<TaskId, EarlyTimes> = HashMap::with_capacity(self.tasks.len());
        for node_ix in order {
            let task = &self.tasks[dag.task_position(node_ix)];

            // Early start is max of all predecessor finishes
            let mut early_start = 0;
            for pred_id in &task.predecessors {
                if !dag.contains(pred_id) {
                    continue;
                }
                let Some(pred) = results.get(pred_id) else {
                    return Err(ScheduleError::CycleOrOrdering {
                        task_id: task.id.clone(),
                    });
                };
                early_start = early_start.max(pred.early_finish);
            }

            let early_finish = early_start.checked_add(task.duration_days).ok_or_else(|| {
                ScheduleError::format(format!(
                    "task {} finishes beyond the representable day range",
                    task.id
                ))
            })?;
            results.insert(
                task.id.clone(),
                EarlyTimes {
                    early_start,
                    early_finish,
                },
            );
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(results: &HashMap<TaskId, EarlyTimes>, id: i32) -> (i64, i64) {
        let t = results[&TaskId::from(id)];
        (t.early_start, t.early_finish)
    }

    #[test]
    fn resolves_tasks_listed_before_their_predecessors() {
        let tasks = vec![
            Task::new(3, "C", 4).with_predecessors([2]),
            Task::new(2, "B", 3).with_predecessors([1]),
            Task::new(1, "A", 2),
        ];
        let results = ForwardPass::new(&tasks).execute().unwrap();
        assert_eq!(times(&results, 1), (0, 2));
        assert_eq!(times(&results, 2), (2, 5));
        assert_eq!(times(&results, 3), (5, 9));
    }

    #[test]
    fn join_takes_latest_predecessor_finish() {
        let tasks = vec![
            Task::new(1, "T1", 2),
            Task::new(2, "T2", 3).with_predecessors([1]),
            Task::new(3, "T3", 1).with_predecessors([1]),
            Task::new(4, "T4", 2).with_predecessors([2, 3]),
        ];
        let results = ForwardPass::new(&tasks).execute().unwrap();
        assert_eq!(times(&results, 4), (5, 7));
    }

    #[test]
    fn two_task_cycle_is_reported() {
        let tasks = vec![
            Task::new("A", "A", 1).with_predecessors(["B"]),
            Task::new("B", "B", 1).with_predecessors(["A"]),
        ];
        let err = ForwardPass::new(&tasks).execute().unwrap_err();
        match err {
            ScheduleError::CycleOrOrdering { task_id } => {
                assert!(task_id.as_str() == "A" || task_id.as_str() == "B");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn finish_past_day_range_is_rejected() {
        let tasks = vec![
            Task::new(1, "Long", i64::MAX),
            Task::new(2, "After", 1).with_predecessors([1]),
        ];
        let err = ForwardPass::new(&tasks).execute().unwrap_err();
        assert!(matches!(err, ScheduleError::Format(_)), "got {err:?}");
    }
}
