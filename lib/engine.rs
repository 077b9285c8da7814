//! The execution engine: schedules a list of [`Operation`]s into moments and
//! runs them against a [`Tableau`], a bank of classical registers, and any
//! Pauli frames being tracked, writing everything observable to a
//! [`DataStore`].
//!
//! ```
//! use clifford_engine::{ engine::{ Engine, EngineConfig }, gate::Gate, operation::Operation };
//!
//! let ops = vec![
//!     Operation::Gate(Gate::H(0)),
//!     Operation::Gate(Gate::CX(0, 1)),
//!     Operation::measurement(0),
//! ];
//! let mut engine = Engine::with_config(ops, 2, EngineConfig::default().with_seed(10)).unwrap();
//! engine.run().unwrap();
//! let (_, _, record) = engine.data_store().measurements.iter().next().unwrap();
//! assert!(record.is_random);
//! ```

use rand::{ rngs::StdRng, SeedableRng };
use rustc_hash::{ FxHashMap, FxHashSet };
use serde::{ Deserialize, Serialize };
use std::collections::BTreeSet;
use tracing::{ debug, trace };
use crate::{
    creg::{ ClassicalRegister, Registry },
    data_store::DataStore,
    error::{ CliffordError, SimResult },
    gate::Gate,
    moment::{ Moment, MomentScheduler },
    operation::{ Operation, TwoBitOp },
    pauli::SparsePauli,
    pauli_frame::{ Direction, PauliFrame },
    tableau::Tableau,
};

/// Run-time options for an [`Engine`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for measurement outcomes; drawn from system entropy if `None`.
    pub seed: Option<u64>,
    /// Whether to group independent operations into shared moments.
    pub parallelize: bool,
}

impl Default for EngineConfig {
    fn default() -> Self { Self { seed: None, parallelize: true } }
}

impl EngineConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallelize(mut self, parallelize: bool) -> Self {
        self.parallelize = parallelize;
        self
    }
}

// Replayed in reverse after the run to pull backward frames to their record
// points.
#[derive(Clone, Debug)]
enum FrameEvent {
    Gate(Gate),
    AddQubit(usize),
    DeleteQubit(usize),
    Create(PauliFrame),
    Record(String),
}

// A frame's value at its creation point and its current value.
#[derive(Clone, Debug)]
struct TrackedFrame {
    initial: PauliFrame,
    current: PauliFrame,
}

impl TrackedFrame {
    fn new(frame: &PauliFrame) -> Self {
        Self { initial: frame.clone(), current: frame.clone() }
    }
}

fn missing_register(name: &str) -> CliffordError {
    CliffordError::DanglingReference(format!(
        "An error has occured when trying to select the register, {}.", name
    ))
}

/// Check every register and frame reference against the operations that
/// precede (or, for backward frame records, follow) it.
fn check_references(operations: &[Operation], nqubits: usize) -> SimResult<()> {
    let mut registers: FxHashSet<&str> = FxHashSet::default();
    let mut created: FxHashSet<&str> = FxHashSet::default();
    let mut n = nqubits;
    for op in operations.iter() {
        if let Operation::CreateClassicalRegister { name, .. } = op.inner() {
            registers.insert(name.as_str());
        }
        for reg in op.registers() {
            if !registers.contains(reg) {
                return Err(missing_register(reg));
            }
        }
        match op.inner() {
            Operation::AddQubit { .. } => { n += 1; },
            Operation::DeleteQubit { .. } => { n = n.saturating_sub(1); },
            Operation::CreatePauliFrame(frame) => {
                if !created.insert(frame.id()) {
                    return Err(CliffordError::InvalidValue(
                        "CreatePauliFrame operations must have a unique \
                        PauliFrame id.".into()
                    ));
                }
                if frame.len() != n {
                    return Err(CliffordError::PauliFrameSize {
                        id: frame.id().to_string(),
                        size: frame.len(),
                        nqubits: n,
                    });
                }
            },
            _ => { },
        }
    }
    for (k, op) in operations.iter().enumerate() {
        let Operation::RecordPauliFrame(frame) = op else { continue; };
        let is_create = |op: &Operation| {
            matches!(op, Operation::CreatePauliFrame(f) if f.id() == frame.id())
        };
        match frame.direction() {
            Direction::Forward if !operations[..k].iter().any(is_create) => {
                return Err(CliffordError::DanglingReference(
                    "RecordPauliFrame operations must be preceded by a \
                    CreatePauliFrame operation.".into()
                ));
            },
            Direction::Backward if !operations[k + 1..].iter().any(is_create) => {
                return Err(CliffordError::DanglingReference(
                    "RecordPauliFrame operations on backward PauliFrames must be \
                    followed by a CreatePauliFrame operation.".into()
                ));
            },
            _ => { },
        }
    }
    Ok(())
}

/// Executes a scheduled list of operations on a stabilizer state.
///
/// Each call to [`Self::run`] starts again from ∣0…0⟩ on the initial number of
/// qubits with an empty register bank and data store.
#[derive(Clone, Debug)]
pub struct Engine {
    nqubits: usize,
    config: EngineConfig,
    schedule: MomentScheduler,
    tableau: Tableau,
    registry: Registry,
    data_store: DataStore,
    frames: FxHashMap<String, TrackedFrame>,
    frame_log: Vec<(usize, FrameEvent)>,
    has_backward_frames: bool,
    rng: StdRng,
}

impl Engine {
    /// Set up an engine with default options.
    ///
    /// Fails if an operation references a classical register or Pauli frame
    /// that is never created before it, or if a frame does not match the
    /// number of qubits at the point it is created.
    pub fn new(operations: Vec<Operation>, nqubits: usize) -> SimResult<Self> {
        Self::with_config(operations, nqubits, EngineConfig::default())
    }

    /// Like [`Self::new`], but with explicit options.
    pub fn with_config(
        operations: Vec<Operation>,
        nqubits: usize,
        config: EngineConfig,
    ) -> SimResult<Self>
    {
        check_references(&operations, nqubits)?;
        let has_backward_frames
            = operations.iter()
            .any(|op| {
                matches!(
                    op,
                    Operation::CreatePauliFrame(frame)
                        if frame.direction() == Direction::Backward
                )
            });
        let schedule = MomentScheduler::new(operations, config.parallelize);
        debug!(
            nqubits,
            noperations = schedule.num_operations(),
            nmoments = schedule.num_moments(),
            seed = ?config.seed,
            "scheduled operations"
        );
        let rng = Self::make_rng(config.seed);
        Ok(Self {
            nqubits,
            config,
            schedule,
            tableau: Tableau::new(nqubits),
            registry: Registry::new(),
            data_store: DataStore::new(),
            frames: FxHashMap::default(),
            frame_log: Vec::new(),
            has_backward_frames,
            rng,
        })
    }

    fn make_rng(seed: Option<u64>) -> StdRng {
        seed.map(StdRng::seed_from_u64).unwrap_or_else(StdRng::from_entropy)
    }

    /// Execute every scheduled operation in order.
    ///
    /// Stops at the first failing operation, after which the state of the
    /// engine is unspecified until the next call.
    pub fn run(&mut self) -> SimResult<()> {
        self.tableau = Tableau::new(self.nqubits);
        self.registry = Registry::new();
        self.data_store = DataStore::new();
        self.frames.clear();
        self.frame_log.clear();
        self.rng = Self::make_rng(self.config.seed);

        let schedule = std::mem::replace(
            &mut self.schedule, MomentScheduler::new(Vec::new(), false));
        let result
            = schedule.iter_timed()
            .try_for_each(|(t, op)| self.execute(t, op));
        self.schedule = schedule;
        result?;
        self.propagate_backward()?;
        debug!(
            nqubits = self.tableau.nqubits(),
            nmeasurements = self.data_store.measurements.iter().count(),
            nregisters = self.registry.len(),
            "run complete"
        );
        Ok(())
    }

    fn execute(&mut self, t: usize, op: &Operation) -> SimResult<()> {
        match op {
            Operation::Controlled { control, op: inner } => {
                let bit
                    = self.registry.select(&control.reg_name)?
                    .get(&control.bit)?;
                if bit == 1 {
                    self.execute(t, inner)
                } else {
                    trace!(time_step = t, op = %inner, control = %control, "control bit is 0; skipped");
                    Ok(())
                }
            },
            Operation::Gate(gate) => {
                trace!(time_step = t, op = %op, "gate");
                self.tableau.apply_gate(*gate)?;
                self.frames.values_mut()
                    .for_each(|f| { f.current.apply_gate(*gate); });
                self.log_frame_event(t, FrameEvent::Gate(*gate));
                Ok(())
            },
            Operation::Measurement(meas) => {
                let outcome
                    = self.tableau.measure(meas.qubit, meas.basis, &mut self.rng)?;
                trace!(
                    time_step = t,
                    qubit = meas.qubit,
                    basis = %meas.basis,
                    outcome = ?outcome,
                    "measurement"
                );
                self.data_store.record_measurement(t, &meas.label, outcome);
                if let Some(target) = &meas.target {
                    self.registry.select_mut(&target.reg_name)?
                        .set(&target.bit, outcome.is_1())?;
                }
                Ok(())
            },
            Operation::Reset { qubit, state } => {
                trace!(time_step = t, op = %op, "reset");
                self.tableau.reset(*qubit, *state, &mut self.rng)?;
                Ok(())
            },
            Operation::AddQubit { index } => {
                let idx = index.unwrap_or(self.tableau.nqubits());
                trace!(time_step = t, index = idx, "adding qubit");
                self.tableau.insert_qubit(idx)?;
                self.frames.values_mut()
                    .for_each(|f| { f.current.insert_qubit(idx); });
                self.log_frame_event(t, FrameEvent::AddQubit(idx));
                Ok(())
            },
            Operation::DeleteQubit { qubit } => {
                trace!(time_step = t, qubit, "deleting qubit");
                self.tableau.delete_qubit(*qubit, &mut self.rng)?;
                self.frames.values_mut()
                    .for_each(|f| { f.current.remove_qubit(*qubit); });
                self.log_frame_event(t, FrameEvent::DeleteQubit(*qubit));
                Ok(())
            },
            Operation::UpdateTableau { matrix, validate } => {
                trace!(time_step = t, op = %op, "replacing tableau");
                self.tableau.update(matrix.as_slice(), *validate)
            },
            Operation::CreateClassicalRegister { name, no_of_bits, bit_ids } => {
                trace!(time_step = t, op = %op, "creating register");
                let reg = ClassicalRegister::new(name, *no_of_bits, bit_ids.clone())?;
                self.registry.insert(reg)
            },
            Operation::ClassicalNot(bit) => {
                trace!(time_step = t, op = %op, "classical op");
                let reg = self.registry.select_mut(&bit.reg_name)?;
                let value = reg.get(&bit.bit)?;
                reg.set(&bit.bit, value == 0)
            },
            Operation::ClassicalAnd(operands) => {
                trace!(time_step = t, op = %op, "classical op");
                self.two_bit_op(operands, |a, b| a && b)
            },
            Operation::ClassicalOr(operands) => {
                trace!(time_step = t, op = %op, "classical op");
                self.two_bit_op(operands, |a, b| a || b)
            },
            Operation::RecordClassicalRegister { name } => {
                trace!(time_step = t, op = %op, "recording register");
                let snapshot = self.registry.select(name)?.snapshot(t);
                self.data_store.record_register(snapshot);
                Ok(())
            },
            Operation::CreatePauliFrame(frame) => {
                trace!(time_step = t, op = %op, "creating frame");
                let nqubits = self.tableau.nqubits();
                if frame.len() != nqubits {
                    return Err(CliffordError::PauliFrameSize {
                        id: frame.id().to_string(),
                        size: frame.len(),
                        nqubits,
                    });
                }
                match frame.direction() {
                    Direction::Forward => {
                        self.frames.insert(
                            frame.id().to_string(), TrackedFrame::new(frame));
                    },
                    Direction::Backward => {
                        self.frame_log.push((t, FrameEvent::Create(frame.clone())));
                    },
                }
                Ok(())
            },
            Operation::RecordPauliFrame(frame) => {
                trace!(time_step = t, op = %op, "recording frame");
                match frame.direction() {
                    Direction::Forward => {
                        let tracked
                            = self.frames.get(frame.id())
                            .ok_or_else(|| CliffordError::DanglingReference(
                                "RecordPauliFrame operations must be preceded by \
                                a CreatePauliFrame operation.".into()
                            ))?;
                        self.data_store.record_pauli_frame(
                            t, tracked.initial.clone(), tracked.current.clone());
                    },
                    Direction::Backward => {
                        self.frame_log.push(
                            (t, FrameEvent::Record(frame.id().to_string())));
                    },
                }
                Ok(())
            },
        }
    }

    fn log_frame_event(&mut self, t: usize, event: FrameEvent) {
        if self.has_backward_frames {
            self.frame_log.push((t, event));
        }
    }

    fn two_bit_op<F>(&mut self, operands: &TwoBitOp, f: F) -> SimResult<()>
    where F: Fn(bool, bool) -> bool
    {
        let input = self.registry.select(&operands.reg_name)?;
        let a = input.get(&operands.inputs[0])? == 1;
        let b = input.get(&operands.inputs[1])? == 1;
        self.registry.select_mut(&operands.output_reg_name)?
            .set(&operands.write, f(a, b))
    }

    // Gates act on unsigned frames as their own inverses, so backward
    // propagation is the forward rule applied to the log in reverse.
    fn propagate_backward(&mut self) -> SimResult<()> {
        let mut frames: FxHashMap<String, TrackedFrame> = FxHashMap::default();
        for (t, event) in std::mem::take(&mut self.frame_log).into_iter().rev() {
            match event {
                FrameEvent::Gate(gate) => {
                    frames.values_mut()
                        .for_each(|f| { f.current.apply_gate(gate); });
                },
                FrameEvent::AddQubit(idx) => {
                    frames.values_mut()
                        .for_each(|f| { f.current.remove_qubit(idx); });
                },
                FrameEvent::DeleteQubit(idx) => {
                    frames.values_mut()
                        .for_each(|f| { f.current.insert_qubit(idx); });
                },
                FrameEvent::Create(frame) => {
                    frames.insert(frame.id().to_string(), TrackedFrame::new(&frame));
                },
                FrameEvent::Record(id) => {
                    let tracked
                        = frames.get(&id)
                        .ok_or_else(|| CliffordError::DanglingReference(
                            "RecordPauliFrame operations on backward PauliFrames \
                            must be followed by a CreatePauliFrame operation."
                                .into()
                        ))?;
                    trace!(time_step = t, frame = %tracked.current, "backward frame recorded");
                    self.data_store.record_pauli_frame(
                        t, tracked.initial.clone(), tracked.current.clone());
                },
            }
        }
        Ok(())
    }

    /// Current number of qubits.
    pub fn nqubits(&self) -> usize { self.tableau.nqubits() }

    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn tableau(&self) -> &Tableau { &self.tableau }

    pub fn registry(&self) -> &Registry { &self.registry }

    pub fn data_store(&self) -> &DataStore { &self.data_store }

    /// The operations in program order.
    pub fn input_operations(&self) -> &[Operation] {
        self.schedule.input_operations()
    }

    /// The scheduled moments.
    pub fn parallelized_operations(&self) -> &[Moment] {
        self.schedule.parallelized_operations()
    }

    /// Signed stabilizer strings of the current state.
    pub fn stabilizer_set(&self) -> BTreeSet<String> {
        self.tableau.stabilizer_set()
    }

    /// Sparse form of each stabilizer of the current state.
    pub fn stabilizer_set_sparse_format(&self) -> Vec<SparsePauli> {
        self.tableau.stabilizer_set_sparse_format()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{ Rng, SeedableRng };
    use crate::{
        creg::BitSelector,
        gate::{ Basis, ResetState },
        operation::{ Measurement, TwoBitOp },
        pauli::{ Pauli, PauliOp },
        stab_array::is_subset_of_stabarray,
    };

    fn set(strs: &[&str]) -> BTreeSet<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    fn gates(gates: &[Gate]) -> Vec<Operation> {
        gates.iter().copied().map(Operation::Gate).collect()
    }

    fn run(ops: Vec<Operation>, nqubits: usize) -> Engine {
        let config = EngineConfig::default().with_seed(1234);
        let mut engine = Engine::with_config(ops, nqubits, config).unwrap();
        engine.run().unwrap();
        engine
    }

    fn random_gates(n: usize, count: usize, seed: u64) -> Vec<Operation> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count).map(|_| Operation::Gate(Gate::sample(n, true, &mut rng))).collect()
    }

    #[test]
    fn gate_sequences() {
        use Gate::*;
        let engine = run(gates(&[H(0), H(1), S(1), X(2)]), 3);
        assert_eq!(engine.stabilizer_set(), set(&["+X__", "+_Y_", "-__Z"]));

        let mut ops = gates(&[H(0), CX(0, 1)]);
        assert_eq!(run(ops.clone(), 2).stabilizer_set(), set(&["+XX", "+ZZ"]));
        ops.push(X(0).into());
        assert_eq!(run(ops.clone(), 2).stabilizer_set(), set(&["+XX", "-ZZ"]));
        ops.push(H(1).into());
        assert_eq!(run(ops.clone(), 2).stabilizer_set(), set(&["+XZ", "-ZX"]));
        ops.extend(gates(&[X(0), S(0), S(0)]));
        assert_eq!(run(ops, 2).stabilizer_set(), set(&["-XZ", "+ZX"]));

        let engine = run(gates(&[H(0), S(0), S(0), S(0), H(0), S(0)]), 1);
        assert_eq!(engine.stabilizer_set(), set(&["-X"]));
    }

    #[test]
    fn measurements_are_recorded_by_step() {
        let m = Measurement::new(0).with_label("m");
        let engine = run(vec![m.clone().into()], 1);
        let record = engine.data_store().measurements.get(0, "m").unwrap();
        assert_eq!((record.measurement_result, record.is_random), (0, false));

        let engine = run(vec![Gate::X(0).into(), m.clone().into()], 1);
        assert_eq!(engine.data_store().measurements.time_steps(), &[1]);
        assert_eq!(
            engine.data_store().measurements.get(1, "m").unwrap().measurement_result,
            1,
        );

        let ops = vec![
            Operation::measurement(0),
            Gate::X(1).into(),
            Operation::measurement(1),
        ];
        let engine = run(ops, 2);
        assert_eq!(engine.data_store().measurements.time_steps(), &[0, 2]);
    }

    #[test]
    fn out_of_range_qubit() {
        let mut engine = Engine::new(gates(&[Gate::H(3)]), 2).unwrap();
        assert!(matches!(
            engine.run(),
            Err(CliffordError::EngineRun { qubit: 3, nqubits: 2, .. }),
        ));
        let mut engine = Engine::new(vec![Operation::measurement(2)], 2).unwrap();
        assert!(matches!(engine.run(), Err(CliffordError::EngineRun { .. })));
    }

    #[test]
    fn seeded_runs_repeat() {
        let mut ops = gates(&[Gate::H(0), Gate::H(1), Gate::H(2)]);
        ops.extend((0..3).map(Operation::measurement));
        let mut engine = Engine::with_config(
            ops, 3, EngineConfig::default().with_seed(7)).unwrap();
        engine.run().unwrap();
        let first = engine.data_store().clone();
        engine.run().unwrap();
        assert_eq!(engine.data_store(), &first);
        assert!(first.measurements.iter().all(|(_, _, m)| m.is_random));
    }

    #[test]
    fn measurement_order_matters() {
        let program = |a: usize, b: usize| {
            let mut ops = gates(&[Gate::H(0), Gate::CX(0, 1)]);
            ops.push(Operation::measurement(a));
            ops.push(Gate::H(a).into());
            ops.push(Operation::measurement(b));
            ops
        };
        let ab = run(program(0, 1), 2);
        let ba = run(program(1, 0), 2);
        assert_ne!(ab.stabilizer_set(), ba.stabilizer_set());
        // the second measurement is fixed by the first
        for engine in [&ab, &ba] {
            let outcomes: Vec<bool>
                = engine.data_store().measurements.iter()
                .map(|(_, _, m)| m.is_random)
                .collect();
            assert_eq!(outcomes.iter().filter(|r| **r).count(), 1);
            assert!(
                engine.parallelized_operations().iter()
                    .filter(|moment| {
                        moment.iter().any(|op| matches!(op, Operation::Measurement(_)))
                    })
                    .all(|moment| moment.len() == 1)
            );
        }
    }

    #[test]
    fn resizing() {
        use Gate::*;
        let engine = run(vec![Operation::add_qubit()], 1);
        assert_eq!(engine.stabilizer_set(), set(&["+_Z", "+Z_"]));
        assert_eq!(engine.nqubits(), 2);

        let mut ops = gates(&[H(0), CX(0, 1)]);
        ops.push(Operation::add_qubit_at(1));
        ops.extend(gates(&[H(1), S(1)]));
        let engine = run(ops, 2);
        assert_eq!(engine.stabilizer_set(), set(&["+Z_Z", "+X_X", "+_Y_"]));

        let mut ops = gates(&[H(0), CX(0, 2)]);
        ops.push(Operation::delete_qubit(1));
        let engine = run(ops, 3);
        assert_eq!(engine.stabilizer_set(), set(&["+ZZ", "+XX"]));

        for seed in 0..5 {
            let mut ops = random_gates(5, 60, seed);
            ops.push(Operation::delete_qubit(seed as usize % 5));
            let engine = run(ops, 5);
            assert_eq!(engine.nqubits(), 4);
            assert!(engine.tableau().is_valid());
        }
    }

    #[test]
    fn resets_reach_their_targets() {
        let states = [
            ResetState::Zero, ResetState::One, ResetState::Plus,
            ResetState::Minus, ResetState::PlusI, ResetState::MinusI,
        ];
        for (seed, state) in states.into_iter().enumerate() {
            for q in 0..3 {
                let mut ops = random_gates(3, 40, seed as u64);
                ops.push(Operation::reset(q, state));
                let engine = run(ops, 3);
                let p = match state.basis() {
                    Basis::X => Pauli::X,
                    Basis::Y => Pauli::Y,
                    Basis::Z => Pauli::Z,
                };
                let mut target = PauliOp::single(3, q, p);
                target.set_sign(state.outcome());
                assert!(is_subset_of_stabarray(
                    &target, &engine.tableau().stabilizer_array()));
            }
        }
    }

    #[test]
    fn tableau_replacement() {
        let ops = vec![Operation::update_tableau(vec![vec![0, 1, 0], vec![1, 0, 0]], true)];
        let engine = run(ops, 1);
        assert_eq!(engine.stabilizer_set(), set(&["+X"]));
        assert_eq!(engine.tableau().destabilizers()[0].to_string(), "+Z");

        let big = vec![vec![0_u8; 5]; 4];
        let mut engine = Engine::new(vec![Operation::update_tableau(big, true)], 1).unwrap();
        assert!(matches!(engine.run(), Err(CliffordError::TableauSize { .. })));

        // an unchecked bad tableau is caught by the next measurement
        let bad = vec![vec![1, 0, 0], vec![1, 0, 0]];
        let ops = vec![Operation::update_tableau(bad, false), Operation::measurement(0)];
        let mut engine = Engine::new(ops, 1).unwrap();
        assert!(matches!(engine.run(), Err(CliffordError::InvalidTableau(_))));
    }

    #[test]
    fn classical_logic() {
        let ops = vec![
            Operation::create_register_with_ids("r", &["a", "b", "c"]),
            Operation::create_register("out", 2),
            Operation::classical_not("r", None, Some("a")).unwrap(),
            Operation::ClassicalOr(TwoBitOp::new(
                "r",
                [BitSelector::Order(0), BitSelector::Order(1)],
                BitSelector::Id("c".into()),
            )),
            Operation::ClassicalAnd(TwoBitOp::new(
                "r",
                [BitSelector::Order(0), BitSelector::Order(2)],
                BitSelector::Order(1),
            ).with_output_register("out")),
            Operation::ClassicalAnd(TwoBitOp::new(
                "r",
                [BitSelector::Order(0), BitSelector::Order(1)],
                BitSelector::Order(0),
            )),
            Operation::record_register("r"),
            Operation::record_register("out"),
        ];
        let engine = run(ops, 1);
        assert_eq!(engine.registry()["r"].bit_reg(), vec![0, 0, 1]);
        assert_eq!(engine.registry()["out"].bit_reg(), vec![0, 1]);
        assert_eq!(engine.registry().names().collect::<Vec<_>>(), vec!["r", "out"]);
        let cr = &engine.data_store().cr_records;
        assert_eq!(cr.len(), 2);
        let (_, _, snap) = cr.iter().find(|(_, name, _)| *name == "r").unwrap();
        assert_eq!(snap.reg[2], ("c".to_string(), 1));
    }

    #[test]
    fn bad_bit_selectors() {
        let ops = vec![
            Operation::create_register_with_ids("c3b_testreg_name", &["bit_1"]),
            Operation::classical_not("c3b_testreg_name", None, Some("bit_2")).unwrap(),
        ];
        let mut engine = Engine::new(ops, 1).unwrap();
        assert_eq!(
            engine.run().unwrap_err().to_string(),
            "The selected bit_id, bit_2, does not exist or is not valid in \
            c3b_testreg_name. The only available bit IDs in this register are: \
            ['bit_1']",
        );

        let ops = vec![
            Operation::create_register("r", 1),
            Operation::create_register("r", 1),
        ];
        let mut engine = Engine::new(ops, 1).unwrap();
        assert!(matches!(engine.run(), Err(CliffordError::ClassicalRegister(_))));
    }

    #[test]
    fn dangling_registers() {
        let ops = vec![Operation::record_register("non-existant_reg")];
        assert_eq!(
            Engine::new(ops, 1).unwrap_err().to_string(),
            "An error has occured when trying to select the register, \
            non-existant_reg.",
        );
        let ops = vec![
            Operation::from(Gate::X(0)).with_ccontrol("ctrl", Some(0), None).unwrap(),
            Operation::create_register("ctrl", 1),
        ];
        assert!(matches!(
            Engine::new(ops, 1),
            Err(CliffordError::DanglingReference(_)),
        ));
    }

    #[test]
    fn classical_control() {
        let measure_into_c = Measurement::new(0).with_label("m0")
            .with_target("c", Some(0), None).unwrap();
        let ops = vec![
            Operation::create_register("c", 1),
            Gate::X(0).into(),
            measure_into_c.into(),
            Operation::from(Gate::X(1)).with_ccontrol("c", Some(0), None).unwrap(),
            Operation::from(Measurement::new(1).with_label("m1")),
        ];
        let engine = run(ops, 2);
        let ms = &engine.data_store().measurements;
        let t1 = *ms.time_steps().last().unwrap();
        assert_eq!(ms.get(t1, "m1").unwrap().measurement_result, 1);
        assert_eq!(engine.registry()["c"].bit_reg(), vec![1]);

        // skipped creation surfaces when the register is used
        let ops = vec![
            Operation::create_register("c", 1),
            Operation::create_register("x", 1)
                .with_ccontrol("c", Some(0), None).unwrap(),
            Operation::record_register("x"),
        ];
        let mut engine = Engine::new(ops, 1).unwrap();
        assert_eq!(
            engine.run().unwrap_err(),
            CliffordError::ClassicalRegister(
                "An error has occured when trying to select the register, x.".into()),
        );
        assert!(engine.registry().get("x").is_none());
    }

    fn frame(s: &str) -> PauliFrame { PauliFrame::from_string(s).unwrap() }

    fn forward_record(engine: &Engine, id: &str) -> (PauliFrame, PauliFrame) {
        let records = &engine.data_store().pf_records.forward;
        let t = records.time_steps()[0];
        let record = records.get(t, id).unwrap();
        (record.initial_pauli_frame.clone(), record.recorded_pauli_frame.clone())
    }

    #[test]
    fn forward_frames() {
        use Gate::*;
        let pf = frame("XIZ");
        let steps: Vec<(Vec<Gate>, &str)> = vec![
            (vec![S(0), S(1), S(2)], "YIZ"),
            (vec![H(0), H(1), H(2)], "YIX"),
            (vec![CX(0, 1)], "YXX"),
            (vec![CZ(0, 2)], "XXY"),
            (vec![CX(1, 2)], "XYZ"),
            (vec![X(0), Y(1), Z(2)], "XYZ"),
        ];
        let mut body: Vec<Operation> = Vec::new();
        for (gs, expected) in steps.into_iter() {
            body.extend(gates(&gs));
            let mut ops = vec![Operation::create_pauli_frame(pf.clone())];
            ops.extend(body.iter().cloned());
            ops.push(Operation::record_pauli_frame(pf.clone()));
            let engine = run(ops, 3);
            let (initial, recorded) = forward_record(&engine, pf.id());
            assert_eq!(initial, pf);
            assert_eq!(recorded, frame(expected));
        }

        // measurements leave frames alone
        let ops = vec![
            Operation::create_pauli_frame(pf.clone()),
            Operation::measurement(0),
            Operation::record_pauli_frame(pf.clone()),
        ];
        assert_eq!(forward_record(&run(ops, 3), pf.id()).1, pf);
    }

    #[test]
    fn frames_follow_resizes() {
        let pf = frame("XIZ");
        let mut ops = vec![Operation::create_pauli_frame(pf.clone())];
        ops.push(Operation::add_qubit_at(1));
        ops.extend((0..4).map(|k| Operation::Gate(Gate::H(k))));
        ops.push(Operation::delete_qubit(3));
        ops.push(Operation::record_pauli_frame(pf.clone()));
        let (initial, recorded) = forward_record(&run(ops, 3), pf.id());
        assert_eq!(initial, pf);
        assert_eq!(recorded, frame("ZII"));
    }

    #[test]
    fn frames_match_stabilizers() {
        let n = 5;
        for seed in 0..3 {
            let pf = frame("ZIIII");
            let mut ops = vec![Operation::create_pauli_frame(pf.clone())];
            ops.extend(random_gates(n, 100, seed));
            ops.push(Operation::record_pauli_frame(pf.clone()));
            let engine = run(ops, n);
            let (_, recorded) = forward_record(&engine, pf.id());
            let stabs = engine.tableau().stabilizers();
            let stab0 = &stabs[0];
            assert_eq!(recorded.to_pauli_op(), if stab0.sign() { stab0.negated() } else { stab0.clone() });
        }
    }

    #[test]
    fn backward_frames_invert_forward_frames() {
        let n = 5;
        let mut rng = StdRng::seed_from_u64(99);
        let mut input = frame("ZZZZZ");
        for _ in 0..3 {
            let body = random_gates(n, 100, rng.gen());
            let mut ops = vec![Operation::create_pauli_frame(input.clone())];
            ops.extend(body.iter().cloned());
            ops.push(Operation::record_pauli_frame(input.clone()));
            let (_, output) = forward_record(&run(ops.clone(), n), input.id());

            let back = output.clone()
                .with_id("backward")
                .with_direction(Direction::Backward);
            let mut back_ops = vec![Operation::record_pauli_frame(back.clone())];
            back_ops.extend(ops);
            back_ops.push(Operation::create_pauli_frame(back.clone()));
            let engine = run(back_ops, n);
            let records = &engine.data_store().pf_records.backward;
            let t = records.time_steps()[0];
            assert_eq!(t, 0);
            let record = records.get(t, "backward").unwrap();
            assert_eq!(record.initial_pauli_frame, output);
            assert_eq!(record.recorded_pauli_frame, input);

            input = output.with_id(&format!("forward-{}", rng.gen::<u32>()));
        }
    }

    #[test]
    fn frame_construction_errors() {
        let n = 5;
        let pf = frame("ZZZZZ");
        assert_eq!(
            Engine::new(vec![Operation::record_pauli_frame(pf.clone())], n)
                .unwrap_err().to_string(),
            "RecordPauliFrame operations must be preceded by a CreatePauliFrame \
            operation.",
        );
        let ops = vec![
            Operation::create_pauli_frame(pf.clone()),
            Operation::create_pauli_frame(pf.clone()),
        ];
        assert_eq!(
            Engine::new(ops, n).unwrap_err().to_string(),
            "CreatePauliFrame operations must have a unique PauliFrame id.",
        );
        let short = frame("ZZZZ");
        assert_eq!(
            Engine::new(vec![Operation::create_pauli_frame(short.clone())], n)
                .unwrap_err().to_string(),
            format!(
                "Wrong size for the PauliFrame {}. It has size 4. It must have \
                the same length as the number of qubits in the system (5). Make \
                sure that you take into account resize operations.",
                short.id(),
            ),
        );
        let ops = vec![Operation::add_qubit_at(0), Operation::create_pauli_frame(pf.clone())];
        assert!(matches!(
            Engine::new(ops, n),
            Err(CliffordError::PauliFrameSize { size: 5, nqubits: 6, .. }),
        ));
        let ops = vec![Operation::delete_qubit(0), Operation::create_pauli_frame(pf.clone())];
        assert!(matches!(
            Engine::new(ops, n),
            Err(CliffordError::PauliFrameSize { size: 5, nqubits: 4, .. }),
        ));
        let back = pf.with_direction(Direction::Backward);
        assert!(matches!(
            Engine::new(vec![Operation::record_pauli_frame(back)], n),
            Err(CliffordError::DanglingReference(_)),
        ));
    }

    #[test]
    fn schedules() {
        use Gate::*;
        let ops = gates(&[H(0), S(1), H(1), CX(0, 1), S(0)]);
        let engine = Engine::new(ops.clone(), 2).unwrap();
        assert_eq!(engine.parallelized_operations().len(), 4);
        let config = EngineConfig::default().with_parallelize(false);
        let engine = Engine::with_config(ops.clone(), 2, config).unwrap();
        assert_eq!(engine.parallelized_operations().len(), 5);
        assert_eq!(engine.input_operations(), ops);
    }

    #[test]
    fn config_from_json() {
        let config: EngineConfig = serde_json::from_str(r#"{ "seed": 5 }"#).unwrap();
        assert_eq!(config, EngineConfig::default().with_seed(5));
        assert!(config.parallelize);
    }
}
