//! Execution engine for Clifford circuits on registers of qubits, using the
//! stabilizer tableau formalism.
//!
//! A program is a list of [`Operation`][operation::Operation]s: Clifford gates,
//! measurements, resets, qubit insertion and deletion, wholesale tableau
//! replacement, classical register logic, classically controlled variants of
//! all of these, and Pauli frames tracked forward or backward through the
//! circuit. An [`Engine`][engine::Engine] groups the program into moments and
//! executes it on a [`Tableau`][tableau::Tableau], recording measurement
//! outcomes, register snapshots, and frames in a
//! [`DataStore`][data_store::DataStore].
//!
//! Assumes all operations will be limited to Clifford-group transformations
//! (i.e. Hadamard, Pauli, singly controlled Pauli, or phase rotations that are
//! integer multiples of π/2).
//!
//! The crate logs through [`tracing`] and never installs a subscriber.

pub mod error;
pub mod pauli;
pub mod stab_array;
pub mod gate;
pub mod tableau;
pub mod creg;
pub mod pauli_frame;
pub mod operation;
pub mod moment;
pub mod data_store;
pub mod engine;
