//! Gates whose operations belong to the *n*-qubit Clifford group, along with
//! the measurement bases and reset targets the engine understands.
//!
//! See also: <https://en.wikipedia.org/wiki/Clifford_gates>

use std::fmt;
use itertools::Itertools;
use rand::Rng;
use serde::{ Deserialize, Serialize };
use crate::error::{ CliffordError, SimResult };

/// Description of a single gate for a register of `N` qubits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gate {
    /// Identity
    I(usize),
    /// Hadamard
    H(usize),
    /// π rotation about X
    X(usize),
    /// π rotation about Y
    Y(usize),
    /// π rotation about Z
    Z(usize),
    /// π/2 rotation about Z
    S(usize),
    /// −π/2 rotation about Z
    SInv(usize),
    /// Z-controlled π rotation about X.
    ///
    /// The first qubit index is the control.
    CX(usize, usize),
    /// Z-controlled π rotation about Y.
    ///
    /// The first qubit index is the control.
    CY(usize, usize),
    /// Z-controlled π rotation about Z.
    ///
    /// The first qubit index is the control.
    CZ(usize, usize),
    /// Swap
    Swap(usize, usize),
}

impl Gate {
    /// Return `true` if `self` is `H`.
    pub fn is_h(&self) -> bool { matches!(self, Self::H(..)) }

    /// Return `true` if `self` is `S` or `SInv`.
    pub fn is_phase(&self) -> bool { matches!(self, Self::S(..) | Self::SInv(..)) }

    /// Return `true` if `self` is one of the Paulis (identity included).
    pub fn is_pauli(&self) -> bool {
        matches!(self, Self::I(..) | Self::X(..) | Self::Y(..) | Self::Z(..))
    }

    /// Return `true` if `self` acts on two qubits.
    pub fn is_two_qubit(&self) -> bool {
        matches!(self, Self::CX(..) | Self::CY(..) | Self::CZ(..) | Self::Swap(..))
    }

    /// Canonical name of the gate.
    pub fn name(&self) -> &'static str {
        match self {
            Self::I(..) => "I",
            Self::H(..) => "H",
            Self::X(..) => "X",
            Self::Y(..) => "Y",
            Self::Z(..) => "Z",
            Self::S(..) => "S",
            Self::SInv(..) => "S_DAG",
            Self::CX(..) => "CNOT",
            Self::CY(..) => "CY",
            Self::CZ(..) => "CZ",
            Self::Swap(..) => "SWAP",
        }
    }

    /// Qubit indices acted on, in argument order.
    pub fn qubits(&self) -> Vec<usize> {
        match *self {
            Self::I(k)
            | Self::H(k)
            | Self::X(k)
            | Self::Y(k)
            | Self::Z(k)
            | Self::S(k)
            | Self::SInv(k)
                => vec![k],
            Self::CX(a, b)
            | Self::CY(a, b)
            | Self::CZ(a, b)
            | Self::Swap(a, b)
                => vec![a, b],
        }
    }

    /// The gate with the same action on a relabeled register, where `f` maps
    /// old qubit indices to new ones.
    pub fn map_qubits<F>(&self, mut f: F) -> Self
    where F: FnMut(usize) -> usize
    {
        match *self {
            Self::I(k) => Self::I(f(k)),
            Self::H(k) => Self::H(f(k)),
            Self::X(k) => Self::X(f(k)),
            Self::Y(k) => Self::Y(f(k)),
            Self::Z(k) => Self::Z(f(k)),
            Self::S(k) => Self::S(f(k)),
            Self::SInv(k) => Self::SInv(f(k)),
            Self::CX(a, b) => Self::CX(f(a), f(b)),
            Self::CY(a, b) => Self::CY(f(a), f(b)),
            Self::CZ(a, b) => Self::CZ(f(a), f(b)),
            Self::Swap(a, b) => Self::Swap(f(a), f(b)),
        }
    }

    /// Look up a gate by name, case-insensitively, and bind it to qubits.
    ///
    /// Fails if the name is unknown, if the number of qubits does not match
    /// the gate, or if a two-qubit gate is given the same qubit twice.
    pub fn from_name(name: &str, qubits: &[usize]) -> SimResult<Self> {
        let key = name.to_ascii_uppercase();
        let single: Option<fn(usize) -> Self>
            = match key.as_str() {
                "I" | "IDENTITY" => Some(Self::I),
                "H" | "HADAMARD" => Some(Self::H),
                "X" => Some(Self::X),
                "Y" => Some(Self::Y),
                "Z" => Some(Self::Z),
                "S" | "PHASE" => Some(Self::S),
                "S_DAG" | "SDG" | "PHASEINV" => Some(Self::SInv),
                _ => None,
            };
        let double: Option<fn(usize, usize) -> Self>
            = match key.as_str() {
                "CNOT" | "CX" => Some(Self::CX),
                "CY" => Some(Self::CY),
                "CZ" => Some(Self::CZ),
                "SWAP" => Some(Self::Swap),
                _ => None,
            };
        match (single, double, qubits) {
            (Some(g), _, &[k]) => Ok(g(k)),
            (_, Some(g), &[a, b]) if a != b => Ok(g(a, b)),
            (_, Some(_), &[a, b]) => Err(CliffordError::InvalidValue(format!(
                "{} needs two distinct qubits, got ({}, {})", key, a, b
            ))),
            (Some(_), _, _) | (_, Some(_), _) => Err(CliffordError::InvalidValue(
                format!(
                    "{} cannot act on qubits [{}]",
                    key,
                    qubits.iter().join(", "),
                )
            )),
            (None, None, _) => Err(CliffordError::InvalidOperation(name.into())),
        }
    }

    /// Sample a random gate on a register of `n` qubits: a two-qubit gate
    /// (`CX`, `CZ`, `CY`, or `Swap`) on distinct random qubits with
    /// probability 1/2 when `n ≥ 2`, otherwise a random single-qubit gate.
    ///
    /// `S` and `SInv` are only drawn if `non_hermitian` is `true`.
    ///
    /// *Panics if `n == 0`.*
    pub fn sample<R>(n: usize, non_hermitian: bool, rng: &mut R) -> Self
    where R: Rng + ?Sized
    {
        if n >= 2 && rng.gen::<bool>() {
            let a = rng.gen_range(0..n);
            let b = (a + rng.gen_range(1..n)) % n;
            match rng.gen_range(0..4_usize) {
                0 => Self::CX(a, b),
                1 => Self::CZ(a, b),
                2 => Self::CY(a, b),
                _ => Self::Swap(a, b),
            }
        } else {
            let k = rng.gen_range(0..n);
            let m = if non_hermitian { 6 } else { 4 };
            match rng.gen_range(0..m) {
                0 => Self::H(k),
                1 => Self::X(k),
                2 => Self::Y(k),
                3 => Self::Z(k),
                4 => Self::S(k),
                _ => Self::SInv(k),
            }
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.qubits().iter().join(", "))
    }
}

/// Format the set of allowed values the way enum coercion errors report them.
fn invalid_enum(value: &str, enum_name: &str, allowed: &[&str]) -> CliffordError {
    CliffordError::InvalidValue(format!(
        "`{}` is an invalid input for enum `{}`. Only the following values are \
        allowed as an input: {}.",
        value.to_lowercase(),
        enum_name,
        allowed.join(", "),
    ))
}

/// A single-qubit measurement basis.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    X,
    Y,
    #[default]
    Z,
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Parse a measurement basis, case-insensitively.
pub fn parse_basis(s: &str) -> SimResult<Basis> {
    match s.to_ascii_lowercase().as_str() {
        "x" => Ok(Basis::X),
        "y" => Ok(Basis::Y),
        "z" => Ok(Basis::Z),
        _ => Err(invalid_enum(s, "Basis", &["x", "y", "z"])),
    }
}

/// The single-qubit Pauli eigenstates a qubit can be reset to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResetState {
    /// ∣0⟩, stabilized by +Z
    Zero,
    /// ∣1⟩, stabilized by −Z
    One,
    /// ∣+⟩, stabilized by +X
    Plus,
    /// ∣−⟩, stabilized by −X
    Minus,
    /// ∣+i⟩, stabilized by +Y
    PlusI,
    /// ∣−i⟩, stabilized by −Y
    MinusI,
}

impl ResetState {
    /// Basis in which `self` is an eigenstate.
    pub fn basis(self) -> Basis {
        match self {
            Self::Zero | Self::One => Basis::Z,
            Self::Plus | Self::Minus => Basis::X,
            Self::PlusI | Self::MinusI => Basis::Y,
        }
    }

    /// The measurement outcome (0 for eigenvalue +1, 1 for −1) that `self`
    /// corresponds to in its basis.
    pub fn outcome(self) -> bool {
        matches!(self, Self::One | Self::Minus | Self::MinusI)
    }

    /// String label, as accepted by [`parse_reset_state`].
    pub fn label(self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::PlusI => "+i",
            Self::MinusI => "-i",
        }
    }
}

impl fmt::Display for ResetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Parse a reset target state, case-insensitively.
pub fn parse_reset_state(s: &str) -> SimResult<ResetState> {
    match s.to_ascii_lowercase().as_str() {
        "0" => Ok(ResetState::Zero),
        "1" => Ok(ResetState::One),
        "+" => Ok(ResetState::Plus),
        "-" => Ok(ResetState::Minus),
        "+i" => Ok(ResetState::PlusI),
        "-i" => Ok(ResetState::MinusI),
        _ => Err(invalid_enum(
            s, "SingleQubitPauliEigenstate", &["0", "1", "+", "-", "+i", "-i"])),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{ rngs::StdRng, SeedableRng };

    #[test]
    fn names() {
        assert_eq!(Gate::from_name("cnot", &[0, 1]), Ok(Gate::CX(0, 1)));
        assert_eq!(Gate::from_name("PhaseInv", &[2]), Ok(Gate::SInv(2)));
        assert_eq!(Gate::from_name("hadamard", &[0]), Ok(Gate::H(0)));
        assert!(matches!(
            Gate::from_name("T", &[0]),
            Err(CliffordError::InvalidOperation(_)),
        ));
        assert!(matches!(
            Gate::from_name("CZ", &[1, 1]),
            Err(CliffordError::InvalidValue(_)),
        ));
        assert!(Gate::from_name("H", &[0, 1]).is_err());
        assert_eq!(Gate::CY(3, 1).to_string(), "CY(3, 1)");
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!(parse_basis("X"), Ok(Basis::X));
        assert_eq!(parse_reset_state("+I"), Ok(ResetState::PlusI));
        let err = parse_reset_state("2").unwrap_err();
        assert_eq!(
            err.to_string(),
            "`2` is an invalid input for enum `SingleQubitPauliEigenstate`. \
            Only the following values are allowed as an input: \
            0, 1, +, -, +i, -i."
        );
        assert_eq!(ResetState::MinusI.basis(), Basis::Y);
        assert!(ResetState::MinusI.outcome());
    }

    #[test]
    fn sampling_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(10546);
        for _ in 0..500 {
            let g = Gate::sample(3, false, &mut rng);
            assert!(g.qubits().iter().all(|k| *k < 3));
            assert!(!g.is_phase());
            if let [a, b] = g.qubits()[..] { assert_ne!(a, b); }
        }
        assert!(!Gate::sample(1, true, &mut rng).is_two_qubit());
    }
}
