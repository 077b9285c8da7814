//! Error types for the engine and the stabilizer algebra beneath it.
//!
//! Variants fall into three groups: construction-time validation of operations
//! and arrays, runtime failures raised while the engine executes a schedule,
//! and violations of the algebraic invariants of stabilizer arrays.

use thiserror::Error;

/// Everything that can go wrong in this crate.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CliffordError {
    /// An operation or gate name does not correspond to anything the engine
    /// can dispatch.
    #[error("`{0}` is not a recognized operation")]
    InvalidOperation(String),

    /// A value failed construction-time validation.
    #[error("{0}")]
    InvalidValue(String),

    /// An operation references a register or Pauli frame that is never created
    /// before it in program order.
    #[error("{0}")]
    DanglingReference(String),

    /// A Pauli frame's width disagrees with the qubit count at its creation.
    #[error(
        "Wrong size for the PauliFrame {id}. It has size {size}. It must have \
        the same length as the number of qubits in the system ({nqubits}). \
        Make sure that you take into account resize operations."
    )]
    PauliFrameSize {
        /// Frame id.
        id: String,
        /// Width of the frame.
        size: usize,
        /// Qubit count at the frame's creation point.
        nqubits: usize,
    },

    /// A gate or measurement addresses a qubit outside the current register.
    #[error(
        "{op} acts on qubit {qubit} but the system only has {nqubits} qubits"
    )]
    EngineRun {
        /// Name of the offending operation.
        op: String,
        /// The out-of-range qubit index.
        qubit: usize,
        /// Current qubit count.
        nqubits: usize,
    },

    /// A replacement tableau has the wrong dimensions.
    #[error(
        "The tableau must have shape ({rows}, {cols}) for {nqubits} qubits, \
        but a tableau of shape ({got_rows}, {got_cols}) was given."
    )]
    TableauSize {
        /// Current qubit count.
        nqubits: usize,
        /// Expected number of rows.
        rows: usize,
        /// Expected number of columns.
        cols: usize,
        /// Number of rows given.
        got_rows: usize,
        /// Number of columns given (of the first row).
        got_cols: usize,
    },

    /// A tableau is malformed or does not describe a valid stabilizer state.
    #[error("{0}")]
    InvalidTableau(String),

    /// A classical register could not be created or selected.
    #[error("{0}")]
    ClassicalRegister(String),

    /// A classical bit selector does not resolve within its register.
    #[error("{0}")]
    ClassicalOperation(String),

    /// A stabilizer array contains anticommuting operators.
    #[error("{0}")]
    AntiCommutation(String),

    /// Recorded data could not be rendered.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for fallible operations in this crate.
pub type SimResult<T> = Result<T, CliffordError>;
