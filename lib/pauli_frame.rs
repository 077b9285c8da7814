//! Pauli frames: unsigned Pauli strings carried alongside a simulation and
//! conjugated by its Clifford gates without ever being applied to the state.
//!
//! A frame created with [`Direction::Forward`] is pushed through the gates that
//! follow its creation point; one created with [`Direction::Backward`] is
//! pulled back through the gates that precede it. Since signs are dropped, each
//! Clifford gate here acts on a frame as its own inverse, so both directions
//! use the same per-gate rules and differ only in the order they are applied.

use std::{ fmt, str::FromStr };
use serde::{ Deserialize, Serialize };
use uuid::Uuid;
use crate::{
    error::{ CliffordError, SimResult },
    gate::Gate,
    pauli::{ Pauli, PauliOp, SparsePauli },
};

/// Propagation direction of a [`PauliFrame`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CliffordError;

    fn from_str(s: &str) -> SimResult<Self> {
        match s {
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            _ => Err(CliffordError::InvalidValue(format!(
                "Invalid direction '{}'. Must be 'forward' or 'backward'.", s
            ))),
        }
    }
}

/// An unsigned *n*-qubit Pauli string with an identity and a propagation
/// direction.
///
/// Equality compares only the Pauli content.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PauliFrame {
    id: String,
    x: Vec<bool>,
    z: Vec<bool>,
    direction: Direction,
}

impl PartialEq for PauliFrame {
    fn eq(&self, other: &Self) -> bool { self.x == other.x && self.z == other.z }
}

impl Eq for PauliFrame { }

impl PauliFrame {
    /// Build a forward frame from its *x* and *z* components, with a random
    /// UUIDv4 id.
    ///
    /// Fails if the two components have different lengths or contain anything
    /// other than 0 or 1.
    pub fn new(x: &[u8], z: &[u8]) -> SimResult<Self> {
        if x.len() != z.len() {
            return Err(CliffordError::InvalidValue(
                "The x and z components of a PauliFrame must have the same length."
                    .into()
            ));
        }
        if x.iter().chain(z).any(|b| *b > 1) {
            return Err(CliffordError::InvalidValue(
                "The x and z components of a PauliFrame should only contain 0s \
                and 1s.".into()
            ));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            x: x.iter().map(|b| *b == 1).collect(),
            z: z.iter().map(|b| *b == 1).collect(),
            direction: Direction::Forward,
        })
    }

    /// The identity frame on `n` qubits.
    pub fn identity(n: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            x: vec![false; n],
            z: vec![false; n],
            direction: Direction::Forward,
        }
    }

    /// Parse a string of `I`/`_`, `X`, `Y`, `Z` characters into a forward
    /// frame with a random id.
    pub fn from_string(s: &str) -> SimResult<Self> {
        let ops: Vec<Pauli>
            = s.chars()
            .map(Pauli::try_from)
            .collect::<SimResult<_>>()
            .map_err(|_| CliffordError::InvalidValue(
                format!("`{}` is not a valid Pauli string", s)
            ))?;
        let (x, z) = ops.into_iter().map(Pauli::to_xz).unzip();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            x,
            z,
            direction: Direction::Forward,
        })
    }

    /// Replace the id.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.into();
        self
    }

    /// Replace the direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn id(&self) -> &str { &self.id }

    pub fn direction(&self) -> Direction { self.direction }

    /// Number of qubits.
    pub fn len(&self) -> usize { self.x.len() }

    /// `true` if the frame covers no qubits.
    pub fn is_empty(&self) -> bool { self.x.is_empty() }

    pub fn x(&self) -> &[bool] { &self.x }

    pub fn z(&self) -> &[bool] { &self.z }

    /// Pauli on qubit `k`.
    ///
    /// *Panics if `k` is out of bounds.*
    pub fn get(&self, k: usize) -> Pauli { Pauli::from_xz(self.x[k], self.z[k]) }

    /// Iterate over the single-qubit Paulis.
    pub fn iter(&self) -> impl Iterator<Item = Pauli> + '_ {
        self.x.iter().zip(&self.z).map(|(x, z)| Pauli::from_xz(*x, *z))
    }

    /// The frame as a positive [`PauliOp`].
    pub fn to_pauli_op(&self) -> PauliOp { PauliOp::from_paulis(false, self.iter()) }

    /// Qubit indices acted on by each of *X*, *Y*, and *Z*.
    pub fn sparse_format(&self) -> SparsePauli { self.to_pauli_op().sparse_format() }

    /// Conjugate the frame by a gate, ignoring signs.
    ///
    /// Every gate is self-inverse on unsigned frames, so this serves both
    /// propagation directions. *Panics if the gate acts outside the frame.*
    pub fn apply_gate(&mut self, gate: Gate) -> &mut Self {
        match gate {
            Gate::I(_) | Gate::X(_) | Gate::Y(_) | Gate::Z(_) => { },
            Gate::H(k) => { std::mem::swap(&mut self.x[k], &mut self.z[k]); },
            Gate::S(k) | Gate::SInv(k) => { self.z[k] ^= self.x[k]; },
            Gate::CX(c, t) => {
                self.x[t] ^= self.x[c];
                self.z[c] ^= self.z[t];
            },
            Gate::CZ(a, b) => {
                self.z[a] ^= self.x[b];
                self.z[b] ^= self.x[a];
            },
            Gate::CY(c, t) => {
                self.apply_gate(Gate::S(t))
                    .apply_gate(Gate::CX(c, t))
                    .apply_gate(Gate::S(t));
            },
            Gate::Swap(a, b) => {
                self.x.swap(a, b);
                self.z.swap(a, b);
            },
        }
        self
    }

    /// Insert an identity at qubit index `idx`; qubits at `idx` and above
    /// shift up by one.
    pub fn insert_qubit(&mut self, idx: usize) -> &mut Self {
        let idx = idx.min(self.len());
        self.x.insert(idx, false);
        self.z.insert(idx, false);
        self
    }

    /// Remove qubit `idx`; qubits above it shift down.
    ///
    /// *Panics if `idx` is out of bounds.*
    pub fn remove_qubit(&mut self, idx: usize) -> &mut Self {
        self.x.remove(idx);
        self.z.remove(idx);
        self
    }
}

impl fmt::Display for PauliFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PauliFrame: ")?;
        self.iter().try_for_each(|p| p.fmt(f))
    }
}
