//! Append-only record of everything an engine run produces: measurement
//! outcomes, classical register snapshots, and Pauli frame records.
//!
//! Each kind of record is kept in a [`RecordSet`], which maps the string form
//! of a time step to the entries recorded at that step, keyed by label,
//! register name, or frame id. The time steps themselves are listed in the
//! order they were first written to.

use rustc_hash::FxHashMap;
use serde::{ Deserialize, Serialize };
use crate::{
    creg::ClassicalRegisterSnapshot,
    error::{ CliffordError, SimResult },
    pauli_frame::{ Direction, PauliFrame },
    tableau::Outcome,
};

/// Entries recorded at a single time step.
pub type StepRecords<T> = FxHashMap<String, T>;

/// Records of one kind, grouped by time step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet<T> {
    time_step: Vec<usize>,
    #[serde(flatten)]
    records: FxHashMap<String, StepRecords<T>>,
}

impl<T> Default for RecordSet<T> {
    fn default() -> Self {
        Self { time_step: Vec::new(), records: FxHashMap::default() }
    }
}

impl<T> RecordSet<T> {
    /// Time steps with at least one entry, in the order first written.
    pub fn time_steps(&self) -> &[usize] { &self.time_step }

    /// Number of time steps with at least one entry.
    pub fn len(&self) -> usize { self.time_step.len() }

    pub fn is_empty(&self) -> bool { self.time_step.is_empty() }

    /// Entries recorded at `time_step`.
    pub fn at(&self, time_step: usize) -> Option<&StepRecords<T>> {
        self.records.get(&time_step.to_string())
    }

    /// A single entry.
    pub fn get(&self, time_step: usize, key: &str) -> Option<&T> {
        self.at(time_step).and_then(|step| step.get(key))
    }

    /// Iterate over all entries in time-step order of first write.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, &T)> + '_ {
        self.time_step.iter()
            .flat_map(move |t| {
                self.records.get(&t.to_string()).into_iter()
                    .flat_map(move |step| {
                        step.iter().map(move |(k, v)| (*t, k.as_str(), v))
                    })
            })
    }

    fn insert(&mut self, time_step: usize, key: &str, entry: T) {
        let step = time_step.to_string();
        if !self.records.contains_key(&step) {
            self.time_step.push(time_step);
        }
        self.records.entry(step).or_default().insert(key.to_string(), entry);
    }
}

/// The outcome of a single measurement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub measurement_result: u8,
    pub is_random: bool,
}

impl From<Outcome> for MeasurementRecord {
    fn from(outcome: Outcome) -> Self {
        Self {
            measurement_result: outcome.bit(),
            is_random: outcome.is_random(),
        }
    }
}

/// A Pauli frame at its creation point and at its record point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauliFrameRecord {
    pub initial_pauli_frame: PauliFrame,
    pub recorded_pauli_frame: PauliFrame,
}

/// Pauli frame records for both propagation directions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauliFrameRecords {
    pub forward: RecordSet<PauliFrameRecord>,
    pub backward: RecordSet<PauliFrameRecord>,
}

impl PauliFrameRecords {
    pub fn get(&self, direction: Direction) -> &RecordSet<PauliFrameRecord> {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        }
    }

    fn get_mut(&mut self, direction: Direction)
        -> &mut RecordSet<PauliFrameRecord>
    {
        match direction {
            Direction::Forward => &mut self.forward,
            Direction::Backward => &mut self.backward,
        }
    }
}

/// Everything recorded during a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataStore {
    pub measurements: RecordSet<MeasurementRecord>,
    pub cr_records: RecordSet<ClassicalRegisterSnapshot>,
    pub pf_records: PauliFrameRecords,
}

impl DataStore {
    pub fn new() -> Self { Self::default() }

    /// Record a measurement outcome under its label.
    pub fn record_measurement(&mut self, time_step: usize, label: &str, outcome: Outcome) {
        self.measurements.insert(time_step, label, outcome.into());
    }

    /// Record a register snapshot under the register's name.
    pub fn record_register(&mut self, snapshot: ClassicalRegisterSnapshot) {
        let name = snapshot.name.clone();
        self.cr_records.insert(snapshot.time_step, &name, snapshot);
    }

    /// Record a Pauli frame under its id, filed by the direction of
    /// `initial`.
    pub fn record_pauli_frame(
        &mut self,
        time_step: usize,
        initial: PauliFrame,
        recorded: PauliFrame,
    ) {
        let id = initial.id().to_string();
        let record = PauliFrameRecord {
            initial_pauli_frame: initial,
            recorded_pauli_frame: recorded,
        };
        self.pf_records.get_mut(record.initial_pauli_frame.direction())
            .insert(time_step, &id, record);
    }

    /// Render the whole store as JSON.
    pub fn to_json(&self) -> SimResult<String> {
        serde_json::to_string(self)
            .map_err(|err| CliffordError::Serialization(err.to_string()))
    }
}
