//! Grouping of an operation list into moments: runs of operations that touch
//! disjoint qubits and registers and can be thought of as happening at once.
//!
//! Barrier operations (see [`Operation::is_barrier`]) always sit alone in a
//! moment placed after every earlier moment, and nothing scheduled after them
//! moves before them. Everything else goes into the earliest moment after the
//! last one that used any of its qubits or registers. Executing the moments in
//! order therefore gives the same result as executing the input in program
//! order.

use rustc_hash::FxHashMap;
use crate::operation::{ Operation, Resource };

/// Operations scheduled to run in the same time slice.
pub type Moment = Vec<Operation>;

/// An operation list together with its schedule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MomentScheduler {
    input_operations: Vec<Operation>,
    moments: Vec<Moment>,
}

impl MomentScheduler {
    /// Schedule `operations`. If `parallelize` is `false`, each operation gets
    /// a moment to itself.
    pub fn new(operations: Vec<Operation>, parallelize: bool) -> Self {
        let moments
            = if parallelize {
                let slots = assign_moments(&operations);
                let nmoments = slots.iter().max().map_or(0, |m| m + 1);
                let mut moments: Vec<Moment> = vec![Vec::new(); nmoments];
                operations.iter().zip(slots)
                    .for_each(|(op, m)| { moments[m].push(op.clone()); });
                moments
            } else {
                operations.iter().map(|op| vec![op.clone()]).collect()
            };
        Self { input_operations: operations, moments }
    }

    /// The operations in program order.
    pub fn input_operations(&self) -> &[Operation] { &self.input_operations }

    /// The scheduled moments.
    pub fn parallelized_operations(&self) -> &[Moment] { &self.moments }

    /// Number of moments.
    pub fn num_moments(&self) -> usize { self.moments.len() }

    /// Number of operations.
    pub fn num_operations(&self) -> usize { self.input_operations.len() }

    /// Iterate over the scheduled operations in execution order, paired with
    /// their time steps (positions in the flattened schedule).
    pub fn iter_timed(&self) -> impl Iterator<Item = (usize, &Operation)> + '_ {
        self.moments.iter().flatten().enumerate()
    }
}

fn assign_moments(operations: &[Operation]) -> Vec<usize> {
    let mut last_use: FxHashMap<Resource<'_>, usize> = FxHashMap::default();
    let mut floor: usize = 0;
    let mut nmoments: usize = 0;
    let mut slots: Vec<usize> = Vec::with_capacity(operations.len());
    for op in operations.iter() {
        if op.is_barrier() {
            let m = nmoments;
            nmoments += 1;
            floor = nmoments;
            slots.push(m);
            continue;
        }
        let resources = op.resources();
        let m
            = resources.iter()
            .filter_map(|r| last_use.get(r).map(|m| m + 1))
            .fold(floor, usize::max);
        resources.into_iter().for_each(|r| { last_use.insert(r, m); });
        nmoments = nmoments.max(m + 1);
        slots.push(m);
    }
    slots
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gate::Gate;

    fn gates(gates: &[Gate]) -> Vec<Operation> {
        gates.iter().copied().map(Operation::Gate).collect()
    }

    fn moments(gates_by_moment: &[&[Gate]]) -> Vec<Moment> {
        gates_by_moment.iter().map(|m| gates(m)).collect()
    }

    #[test]
    fn independent_gates_share_moments() {
        use Gate::*;
        let ops = gates(&[H(0), S(1), H(1), CX(0, 1), S(0)]);
        let sched = MomentScheduler::new(ops.clone(), true);
        assert_eq!(
            sched.parallelized_operations(),
            moments(&[&[H(0), S(1)], &[H(1)], &[CX(0, 1)], &[S(0)]]),
        );
        assert_eq!(sched.input_operations(), ops);
        assert_eq!(sched.iter_timed().count(), ops.len());

        let ops = gates(&[H(0), CX(0, 1), H(1), CX(1, 0), S(2)]);
        let sched = MomentScheduler::new(ops, true);
        assert_eq!(
            sched.parallelized_operations(),
            moments(&[&[H(0), S(2)], &[CX(0, 1)], &[H(1)], &[CX(1, 0)]]),
        );
    }

    #[test]
    fn cnot_ladder() {
        use Gate::*;
        let ops = gates(&[
            H(0), CX(0, 1), CX(1, 2), CX(0, 3), CX(1, 3), CX(0, 4), CX(2, 4),
            H(0), H(1), H(2),
        ]);
        let sched = MomentScheduler::new(ops.clone(), true);
        assert_eq!(
            sched.parallelized_operations(),
            moments(&[
                &[H(0)],
                &[CX(0, 1)],
                &[CX(1, 2), CX(0, 3)],
                &[CX(1, 3), CX(0, 4)],
                &[CX(2, 4), H(0), H(1)],
                &[H(2)],
            ]),
        );

        let sched = MomentScheduler::new(ops.clone(), false);
        assert_eq!(sched.num_moments(), ops.len());
        assert!(sched.parallelized_operations().iter().zip(&ops)
            .all(|(m, op)| m.len() == 1 && &m[0] == op));
    }

    #[test]
    fn measurements_are_isolated() {
        use Gate::*;
        let m0 = Operation::measurement(0);
        let m1 = Operation::measurement(1);
        let ops = vec![
            H(0).into(), CX(0, 1).into(), m0.clone(), X(0).into(), X(1).into(),
            m1.clone(),
        ];
        let sched = MomentScheduler::new(ops, true);
        assert_eq!(
            sched.parallelized_operations(),
            vec![
                vec![H(0).into()],
                vec![CX(0, 1).into()],
                vec![m0],
                vec![X(0).into(), X(1).into()],
                vec![m1],
            ],
        );
        assert!(
            sched.parallelized_operations().iter()
                .filter(|m| m.iter().any(|op| matches!(op, Operation::Measurement(_))))
                .all(|m| m.len() == 1)
        );
    }

    #[test]
    fn barriers_hold_back_later_operations() {
        use Gate::*;
        // H(2) does not touch qubit 0 but may not move ahead of the measurement
        let ops = vec![
            H(0).into(), Operation::measurement(0), H(2).into(),
            Operation::add_qubit(), H(1).into(),
        ];
        let sched = MomentScheduler::new(ops, true);
        let steps: Vec<(usize, String)>
            = sched.iter_timed().map(|(t, op)| (t, op.name().to_string())).collect();
        assert_eq!(sched.num_moments(), 5);
        assert_eq!(steps[1], (1, "Measurement".to_string()));
        assert_eq!(steps[3], (3, "AddQubit".to_string()));
    }

    #[test]
    fn registers_are_resources() {
        let create_a = Operation::create_register("a", 1);
        let create_b = Operation::create_register("b", 1);
        let rec_a = Operation::record_register("a");
        let rec_b = Operation::record_register("b");
        let ops = vec![
            create_a.clone(), create_b.clone(), rec_a.clone(), rec_b.clone(),
            rec_a.clone(),
        ];
        let sched = MomentScheduler::new(ops, true);
        assert_eq!(
            sched.parallelized_operations(),
            vec![vec![create_a, create_b], vec![rec_a.clone(), rec_b], vec![rec_a]],
        );

        // the controlling register orders a gate after the write to it
        let not = Operation::classical_not("a", Some(0), None).unwrap();
        let ctrl_x = Operation::from(Gate::X(3))
            .with_ccontrol("a", Some(0), None).unwrap();
        let ops = vec![Operation::create_register("a", 1), not, ctrl_x];
        let sched = MomentScheduler::new(ops, true);
        assert_eq!(sched.num_moments(), 3);
    }
}
