//! The closed set of operations an [`Engine`][crate::engine::Engine] executes.
//!
//! Operations are plain values built once by the caller. Those that address a
//! classical bit do so through a register name plus a [`BitSelector`]; the
//! selectors are only resolved against the live registers at run time.

use std::fmt;
use uuid::Uuid;
use crate::{
    creg::BitSelector,
    error::{ CliffordError, SimResult },
    gate::{ Basis, Gate, ResetState },
    pauli_frame::PauliFrame,
};

/// A single bit of a named classical register.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitRef {
    pub reg_name: String,
    pub bit: BitSelector,
}

impl BitRef {
    pub fn new(reg_name: &str, bit: BitSelector) -> Self {
        Self { reg_name: reg_name.into(), bit }
    }

    /// Build from a register name and a pair of optional selectors, exactly
    /// one of which must be given.
    pub fn from_options(
        reg_name: &str,
        bit_order: Option<usize>,
        bit_id: Option<&str>,
    ) -> SimResult<Self>
    {
        let bit = BitSelector::from_options(bit_order, bit_id.map(String::from))?;
        Ok(Self::new(reg_name, bit))
    }
}

impl fmt::Display for BitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.reg_name, self.bit)
    }
}

/// A single-qubit measurement, optionally copying its outcome into a classical
/// bit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Measurement {
    pub qubit: usize,
    pub basis: Basis,
    pub label: String,
    pub target: Option<BitRef>,
}

impl Measurement {
    /// Measure `qubit` in the Z basis under a generated
    /// `"measurement_<uuid4>"` label.
    pub fn new(qubit: usize) -> Self {
        Self {
            qubit,
            basis: Basis::Z,
            label: format!("measurement_{}", Uuid::new_v4()),
            target: None,
        }
    }

    pub fn with_basis(mut self, basis: Basis) -> Self {
        self.basis = basis;
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.into();
        self
    }

    /// Also write the outcome into a classical bit.
    ///
    /// Fails unless exactly one of `bit_order` and `bit_id` is given.
    pub fn with_target(
        mut self,
        reg_name: &str,
        bit_order: Option<usize>,
        bit_id: Option<&str>,
    ) -> SimResult<Self>
    {
        self.target = Some(BitRef::from_options(reg_name, bit_order, bit_id)?);
        Ok(self)
    }
}

/// Operands of a classical AND or OR: two input bits of one register and an
/// output bit, possibly of another register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TwoBitOp {
    pub reg_name: String,
    pub inputs: [BitSelector; 2],
    pub output_reg_name: String,
    pub write: BitSelector,
}

impl TwoBitOp {
    /// Read and write within a single register.
    pub fn new(reg_name: &str, inputs: [BitSelector; 2], write: BitSelector)
        -> Self
    {
        Self {
            reg_name: reg_name.into(),
            inputs,
            output_reg_name: reg_name.into(),
            write,
        }
    }

    /// Write the result into another register.
    pub fn with_output_register(mut self, output_reg_name: &str) -> Self {
        self.output_reg_name = output_reg_name.into();
        self
    }

    /// Build from optional arguments.
    ///
    /// Exactly two input bits must be given, either all by order or all by ID,
    /// and exactly one write bit. The output register defaults to the input
    /// register.
    pub fn from_options(
        reg_name: &str,
        input_bit_order: Option<&[usize]>,
        input_bit_ids: Option<&[&str]>,
        write_bit_order: Option<usize>,
        write_bit_id: Option<&str>,
        output_reg_name: Option<&str>,
    ) -> SimResult<Self>
    {
        let inputs: Vec<BitSelector>
            = match (input_bit_order, input_bit_ids) {
                (Some(order), None) => {
                    order.iter().copied().map(BitSelector::Order).collect()
                },
                (None, Some(ids)) => {
                    ids.iter().copied().map(BitSelector::from).collect()
                },
                _ => {
                    return Err(CliffordError::InvalidValue(
                        "Exactly one of input_bit_order and input_bit_ids must \
                        be specified.".into()
                    ));
                },
            };
        let inputs: [BitSelector; 2]
            = inputs.try_into()
            .map_err(|_| CliffordError::InvalidValue(
                "Two-bit classical operations need exactly two input bits."
                    .into()
            ))?;
        let write = BitSelector::from_options(
            write_bit_order, write_bit_id.map(String::from))?;
        Ok(Self {
            reg_name: reg_name.into(),
            inputs,
            output_reg_name: output_reg_name.unwrap_or(reg_name).into(),
            write,
        })
    }
}

/// Something the engine can do in a single time step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Apply a Clifford gate.
    Gate(Gate),
    /// Measure a qubit.
    Measurement(Measurement),
    /// Reset a qubit to a Pauli eigenstate.
    Reset { qubit: usize, state: ResetState },
    /// Add a fresh ∣0⟩ qubit at `index`, or after the last qubit if `None`.
    AddQubit { index: Option<usize> },
    /// Measure out and remove a qubit.
    DeleteQubit { qubit: usize },
    /// Replace the whole tableau.
    UpdateTableau { matrix: Vec<Vec<u8>>, validate: bool },
    /// Create a register of zeroed bits.
    CreateClassicalRegister {
        name: String,
        no_of_bits: usize,
        bit_ids: Option<Vec<String>>,
    },
    /// Flip a bit.
    ClassicalNot(BitRef),
    /// Logical AND of two bits.
    ClassicalAnd(TwoBitOp),
    /// Logical OR of two bits.
    ClassicalOr(TwoBitOp),
    /// Store a snapshot of a register.
    RecordClassicalRegister { name: String },
    /// Start tracking a Pauli frame.
    CreatePauliFrame(PauliFrame),
    /// Store the current value of a tracked Pauli frame.
    RecordPauliFrame(PauliFrame),
    /// Execute `op` only if the `control` bit is 1.
    Controlled { control: BitRef, op: Box<Operation> },
}

impl From<Gate> for Operation {
    fn from(gate: Gate) -> Self { Self::Gate(gate) }
}

impl From<Measurement> for Operation {
    fn from(meas: Measurement) -> Self { Self::Measurement(meas) }
}

/// Something an operation reads or writes, used to order operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Resource<'a> {
    Qubit(usize),
    Register(&'a str),
}

impl Operation {
    /// Look up an operation by name, case-insensitively.
    ///
    /// Besides the gate names accepted by [`Gate::from_name`], this accepts
    /// `Measurement`, `Reset` (to ∣0⟩) and `DeleteQubit`, each on a single
    /// qubit.
    pub fn from_name(name: &str, qubits: &[usize]) -> SimResult<Self> {
        let single = |ctor: fn(usize) -> Self| match qubits {
            &[k] => Ok(ctor(k)),
            _ => Err(CliffordError::InvalidValue(format!(
                "{} acts on exactly one qubit", name
            ))),
        };
        match name.to_ascii_lowercase().as_str() {
            "measurement" | "measure" => {
                single(|k| Self::Measurement(Measurement::new(k)))
            },
            "reset" => {
                single(|k| Self::Reset { qubit: k, state: ResetState::Zero })
            },
            "deletequbit" => single(|k| Self::DeleteQubit { qubit: k }),
            _ => Gate::from_name(name, qubits).map(Self::Gate),
        }
    }

    pub fn measurement(qubit: usize) -> Self {
        Self::Measurement(Measurement::new(qubit))
    }

    pub fn reset(qubit: usize, state: ResetState) -> Self {
        Self::Reset { qubit, state }
    }

    /// Append a qubit after the last one.
    pub fn add_qubit() -> Self { Self::AddQubit { index: None } }

    /// Insert a qubit at `index`.
    pub fn add_qubit_at(index: usize) -> Self {
        Self::AddQubit { index: Some(index) }
    }

    pub fn delete_qubit(qubit: usize) -> Self { Self::DeleteQubit { qubit } }

    pub fn update_tableau(matrix: Vec<Vec<u8>>, validate: bool) -> Self {
        Self::UpdateTableau { matrix, validate }
    }

    /// Create a register with generated bit IDs.
    pub fn create_register(name: &str, no_of_bits: usize) -> Self {
        Self::CreateClassicalRegister {
            name: name.into(),
            no_of_bits,
            bit_ids: None,
        }
    }

    /// Create a register with the given bit IDs.
    pub fn create_register_with_ids(name: &str, bit_ids: &[&str]) -> Self {
        Self::CreateClassicalRegister {
            name: name.into(),
            no_of_bits: bit_ids.len(),
            bit_ids: Some(bit_ids.iter().map(|s| s.to_string()).collect()),
        }
    }

    /// Flip a bit. Fails unless exactly one of `bit_order` and `bit_id` is
    /// given.
    pub fn classical_not(
        reg_name: &str,
        bit_order: Option<usize>,
        bit_id: Option<&str>,
    ) -> SimResult<Self>
    {
        BitRef::from_options(reg_name, bit_order, bit_id).map(Self::ClassicalNot)
    }

    pub fn record_register(name: &str) -> Self {
        Self::RecordClassicalRegister { name: name.into() }
    }

    pub fn create_pauli_frame(frame: PauliFrame) -> Self {
        Self::CreatePauliFrame(frame)
    }

    pub fn record_pauli_frame(frame: PauliFrame) -> Self {
        Self::RecordPauliFrame(frame)
    }

    /// Make `self` conditional on a classical bit being 1.
    ///
    /// Fails unless exactly one of `bit_order` and `bit_id` is given, or if
    /// `self` involves a Pauli frame.
    pub fn with_ccontrol(
        self,
        reg_name: &str,
        bit_order: Option<usize>,
        bit_id: Option<&str>,
    ) -> SimResult<Self>
    {
        if self.is_pauli_frame_op() {
            return Err(CliffordError::InvalidValue(
                "Pauli frame operations cannot be classically controlled.".into()
            ));
        }
        let control = BitRef::from_options(reg_name, bit_order, bit_id)?;
        Ok(Self::Controlled { control, op: Box::new(self) })
    }

    /// Short name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gate(gate) => gate.name(),
            Self::Measurement(_) => "Measurement",
            Self::Reset { .. } => "Reset",
            Self::AddQubit { .. } => "AddQubit",
            Self::DeleteQubit { .. } => "DeleteQubit",
            Self::UpdateTableau { .. } => "UpdateTableau",
            Self::CreateClassicalRegister { .. } => "CreateClassicalRegister",
            Self::ClassicalNot(_) => "ClassicalNOT",
            Self::ClassicalAnd(_) => "ClassicalAND",
            Self::ClassicalOr(_) => "ClassicalOR",
            Self::RecordClassicalRegister { .. } => "RecordClassicalRegister",
            Self::CreatePauliFrame(_) => "CreatePauliFrame",
            Self::RecordPauliFrame(_) => "RecordPauliFrame",
            Self::Controlled { .. } => "ControlledOperation",
        }
    }

    /// The operation with any classical-control wrappers removed.
    pub fn inner(&self) -> &Self {
        match self {
            Self::Controlled { op, .. } => op.inner(),
            _ => self,
        }
    }

    /// `true` if `self` creates or records a Pauli frame, possibly under
    /// classical control.
    pub fn is_pauli_frame_op(&self) -> bool {
        matches!(self.inner(), Self::CreatePauliFrame(_) | Self::RecordPauliFrame(_))
    }

    /// `true` if `self` must sit alone in its moment, with every earlier
    /// operation before it and every later one after it.
    pub fn is_barrier(&self) -> bool {
        matches!(
            self.inner(),
            Self::Measurement(_)
            | Self::Reset { .. }
            | Self::AddQubit { .. }
            | Self::DeleteQubit { .. }
            | Self::UpdateTableau { .. }
            | Self::CreatePauliFrame(_)
            | Self::RecordPauliFrame(_)
        )
    }

    /// Qubits acted on.
    pub fn qubits(&self) -> Vec<usize> {
        match self.inner() {
            Self::Gate(gate) => gate.qubits(),
            Self::Measurement(meas) => vec![meas.qubit],
            Self::Reset { qubit, .. } | Self::DeleteQubit { qubit } => vec![*qubit],
            _ => Vec::new(),
        }
    }

    /// Names of the classical registers read or written, including those of
    /// any controlling bits.
    pub fn registers(&self) -> Vec<&str> {
        match self {
            Self::Measurement(meas) => {
                meas.target.iter().map(|t| t.reg_name.as_str()).collect()
            },
            Self::CreateClassicalRegister { name, .. }
            | Self::RecordClassicalRegister { name } => vec![name.as_str()],
            Self::ClassicalNot(bit) => vec![bit.reg_name.as_str()],
            Self::ClassicalAnd(op) | Self::ClassicalOr(op) => {
                vec![op.reg_name.as_str(), op.output_reg_name.as_str()]
            },
            Self::Controlled { control, op } => {
                let mut regs = op.registers();
                regs.insert(0, control.reg_name.as_str());
                regs
            },
            _ => Vec::new(),
        }
    }

    pub(crate) fn resources(&self) -> Vec<Resource<'_>> {
        self.qubits().into_iter().map(Resource::Qubit)
            .chain(self.registers().into_iter().map(Resource::Register))
            .collect()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gate(gate) => gate.fmt(f),
            Self::Measurement(meas) => {
                write!(f, "Measurement({}, basis={}", meas.qubit, meas.basis)?;
                if let Some(target) = &meas.target {
                    write!(f, ", target={}", target)?;
                }
                write!(f, ")")
            },
            Self::Reset { qubit, state } => write!(f, "Reset({}, {})", qubit, state),
            Self::AddQubit { index: Some(k) } => write!(f, "AddQubit({})", k),
            Self::AddQubit { index: None } => write!(f, "AddQubit()"),
            Self::DeleteQubit { qubit } => write!(f, "DeleteQubit({})", qubit),
            Self::UpdateTableau { matrix, validate } => write!(
                f, "UpdateTableau({}x{}, validate={})",
                matrix.len(), matrix.first().map_or(0, Vec::len), validate,
            ),
            Self::CreateClassicalRegister { name, no_of_bits, .. } => {
                write!(f, "CreateClassicalRegister({}, {})", name, no_of_bits)
            },
            Self::ClassicalNot(bit) => write!(f, "ClassicalNOT({})", bit),
            Self::ClassicalAnd(op) | Self::ClassicalOr(op) => write!(
                f, "{}({}[{}, {}] -> {}[{}])",
                self.name(),
                op.reg_name, op.inputs[0], op.inputs[1],
                op.output_reg_name, op.write,
            ),
            Self::RecordClassicalRegister { name } => {
                write!(f, "RecordClassicalRegister({})", name)
            },
            Self::CreatePauliFrame(frame) => {
                write!(f, "CreatePauliFrame({}, {})", frame.id(), frame.direction())
            },
            Self::RecordPauliFrame(frame) => {
                write!(f, "RecordPauliFrame({}, {})", frame.id(), frame.direction())
            },
            Self::Controlled { control, op } => write!(f, "if {}: {}", control, op),
        }
    }
}
