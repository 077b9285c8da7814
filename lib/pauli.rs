//! Signed *n*-qubit Pauli operators in the binary symplectic representation.
//!
//! Each qubit's Pauli is encoded by an (*x*, *z*) bit pair: *I* = (0, 0),
//! *X* = (1, 0), *Z* = (0, 1), and *Y* = (1, 1). An operator on *n* qubits is
//! then a bit vector of length 2*n* + 1, with the last bit holding the sign (0
//! for +, 1 for −). Bits are packed into `u32` words the same way as the
//! tableau, so that rows can be moved between the two without unpacking.
//!
//! Commutation reduces to the symplectic inner product mod 2, and
//! multiplication to a bitwise XOR plus a mod-4 count of the factors of *i*
//! produced qubit by qubit (the *g* function of
//! [arXiv:quant-ph/0406196][tableau]).
//!
//! [tableau]: https://arxiv.org/abs/quant-ph/0406196

use std::{ fmt, str::FromStr };
use serde::{ Deserialize, Serialize };
use crate::error::{ CliffordError, SimResult };

pub(crate) const PW: [u32; 32] = [ // PW[i] = 2^i
    1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768,
    65536, 131072, 262144, 524288, 1048576, 2097152, 4194304, 8388608, 16777216,
    33554432, 67108864, 134217728, 268435456, 536870912, 1073741824, 2147483648
];

/// Number of `u32` words needed to pack `n` bits.
pub(crate) fn words(n: usize) -> usize { (n >> 5) + 1 }

/// Net exponent of *i* picked up when the Paulis packed in `(xa, za)` are
/// multiplied on the left of those packed in `(xb, zb)`, word by word.
pub(crate) fn g_word(xa: u32, za: u32, xb: u32, zb: u32) -> i32 {
    let (pa_x, pa_y, pa_z) = (xa & !za, xa & za, !xa & za);
    let (pb_x, pb_y, pb_z) = (xb & !zb, xb & zb, !xb & zb);
    let plus = (pa_x & pb_y) | (pa_y & pb_z) | (pa_z & pb_x);
    let minus = (pa_x & pb_z) | (pa_y & pb_x) | (pa_z & pb_y);
    plus.count_ones() as i32 - minus.count_ones() as i32
}

/// A single-qubit Pauli operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pauli {
    /// Identity
    I,
    /// σ<sub>*x*</sub>
    X,
    /// σ<sub>*y*</sub>
    Y,
    /// σ<sub>*z*</sub>
    Z,
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::I => write!(f, "{}", if f.alternate() { "I" } else { "_" }),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl Pauli {
    /// Return `true` if `self` and `other` commute.
    pub fn commutes_with(self, other: Self) -> bool {
        match (self, other) {
            (_, Self::I) => true,
            (Self::I, _) => true,
            (a, b) => a == b,
        }
    }

    /// Decode from an (*x*, *z*) bit pair.
    pub fn from_xz(x: bool, z: bool) -> Self {
        match (x, z) {
            (false, false) => Self::I,
            (true,  false) => Self::X,
            (true,  true ) => Self::Y,
            (false, true ) => Self::Z,
        }
    }

    /// Encode as an (*x*, *z*) bit pair.
    pub fn to_xz(self) -> (bool, bool) {
        match self {
            Self::I => (false, false),
            Self::X => (true,  false),
            Self::Y => (true,  true ),
            Self::Z => (false, true ),
        }
    }
}

impl TryFrom<char> for Pauli {
    type Error = CliffordError;

    fn try_from(c: char) -> SimResult<Self> {
        match c {
            'I' | 'i' | '_' => Ok(Self::I),
            'X' | 'x' => Ok(Self::X),
            'Y' | 'y' => Ok(Self::Y),
            'Z' | 'z' => Ok(Self::Z),
            _ => Err(CliffordError::InvalidValue(
                format!("`{}` is not a Pauli operator", c)
            )),
        }
    }
}

/// A signed Pauli operator on `n` qubits.
///
/// This is an immutable-in-spirit value type: equality is structural and
/// every in-place method preserves the width of the operator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PauliOp {
    pub(crate) n: usize,
    pub(crate) x: Vec<u32>,
    pub(crate) z: Vec<u32>,
    pub(crate) sign: bool,
}

impl PauliOp {
    /// The `+I` operator on `n` qubits.
    pub fn identity(n: usize) -> Self {
        let w = words(n);
        Self { n, x: vec![0; w], z: vec![0; w], sign: false }
    }

    /// `+P` acting on qubit `q` of `n` qubits, identity elsewhere.
    ///
    /// *Panics if `q >= n`.*
    pub fn single(n: usize, q: usize, p: Pauli) -> Self {
        let mut op = Self::identity(n);
        op.set(q, p);
        op
    }

    /// Build from a sign (`true` for −) and a sequence of single-qubit Paulis.
    pub fn from_paulis<I>(sign: bool, ops: I) -> Self
    where I: IntoIterator<Item = Pauli>
    {
        let ops: Vec<Pauli> = ops.into_iter().collect();
        let mut op = Self::identity(ops.len());
        ops.into_iter().enumerate().for_each(|(j, p)| op.set(j, p));
        op.sign = sign;
        op
    }

    /// Build from a raw bit row `[x_0..x_n, z_0..z_n, sign]`.
    ///
    /// Fails if the row length is even or any entry is not 0 or 1.
    pub fn from_bits(bits: &[u8]) -> SimResult<Self> {
        if bits.len() % 2 == 0 {
            return Err(CliffordError::InvalidValue(format!(
                "A signed Pauli operator needs 2n + 1 entries, got {}",
                bits.len(),
            )));
        }
        if bits.iter().any(|b| *b > 1) {
            return Err(CliffordError::InvalidValue(
                "The array should only contain 0s and 1s.".into()
            ));
        }
        let n = bits.len() / 2;
        let mut op = Self::identity(n);
        for j in 0..n {
            if bits[j] != 0 { op.x[j >> 5] |= PW[j & 31]; }
            if bits[n + j] != 0 { op.z[j >> 5] |= PW[j & 31]; }
        }
        op.sign = bits[2 * n] != 0;
        Ok(op)
    }

    /// Unpack into a raw bit row `[x_0..x_n, z_0..z_n, sign]`.
    pub fn to_bits(&self) -> Vec<u8> {
        let mut bits: Vec<u8> = vec![0; 2 * self.n + 1];
        for j in 0..self.n {
            bits[j] = u8::from(self.x_bit(j));
            bits[self.n + j] = u8::from(self.z_bit(j));
        }
        bits[2 * self.n] = u8::from(self.sign);
        bits
    }

    /// Number of qubits acted on.
    pub fn nqubits(&self) -> usize { self.n }

    /// `true` if the sign is −.
    pub fn sign(&self) -> bool { self.sign }

    /// Set the sign (`true` for −).
    pub fn set_sign(&mut self, sign: bool) { self.sign = sign; }

    /// Return a copy with the sign flipped.
    pub fn negated(&self) -> Self {
        let mut op = self.clone();
        op.sign = !op.sign;
        op
    }

    pub(crate) fn x_bit(&self, j: usize) -> bool {
        self.x[j >> 5] & PW[j & 31] != 0
    }

    pub(crate) fn z_bit(&self, j: usize) -> bool {
        self.z[j >> 5] & PW[j & 31] != 0
    }

    /// The Pauli acting on qubit `j`.
    ///
    /// *Panics if `j` is out of bounds.*
    pub fn get(&self, j: usize) -> Pauli {
        assert!(j < self.n, "qubit index {} out of bounds for {} qubits", j, self.n);
        Pauli::from_xz(self.x_bit(j), self.z_bit(j))
    }

    /// Replace the Pauli acting on qubit `j`.
    ///
    /// *Panics if `j` is out of bounds.*
    pub fn set(&mut self, j: usize, p: Pauli) {
        assert!(j < self.n, "qubit index {} out of bounds for {} qubits", j, self.n);
        let (xb, zb) = p.to_xz();
        let j5 = j >> 5;
        let pw = PW[j & 31];
        if xb { self.x[j5] |= pw; } else { self.x[j5] &= !pw; }
        if zb { self.z[j5] |= pw; } else { self.z[j5] &= !pw; }
    }

    /// Iterate over the single-qubit Paulis.
    pub fn iter(&self) -> impl Iterator<Item = Pauli> + '_ {
        (0..self.n).map(|j| self.get(j))
    }

    /// `true` if every bit, sign included, is zero.
    pub fn is_trivial(&self) -> bool {
        !self.sign && self.is_identity()
    }

    /// `true` if the operator is ±*I*.
    pub fn is_identity(&self) -> bool {
        self.x.iter().chain(self.z.iter()).all(|w| *w == 0)
    }

    /// Number of qubits acted on non-trivially.
    pub fn weight(&self) -> usize {
        self.x.iter().zip(&self.z)
            .map(|(x, z)| (x | z).count_ones() as usize)
            .sum()
    }

    /// `true` if `self` and `other` commute, i.e. their symplectic inner
    /// product vanishes mod 2.
    ///
    /// *Panics if the operators act on different numbers of qubits.*
    pub fn commutes_with(&self, other: &Self) -> bool {
        assert_eq!(self.n, other.n, "Pauli operators must act on the same qubits");
        let ones: u32
            = self.x.iter().zip(&self.z)
            .zip(other.x.iter().zip(&other.z))
            .map(|((xa, za), (xb, zb))| ((xa & zb) ^ (za & xb)).count_ones())
            .sum();
        ones % 2 == 0
    }

    /// `true` if `self` and `other` anticommute.
    pub fn anticommutes_with(&self, other: &Self) -> bool {
        !self.commutes_with(other)
    }

    /// Exponent of *i*, mod 4, in `source · self` including both signs.
    pub(crate) fn product_phase(&self, source: &Self) -> u8 {
        let e: i32
            = source.x.iter().zip(&source.z)
            .zip(self.x.iter().zip(&self.z))
            .map(|((xa, za), (xb, zb))| g_word(*xa, *za, *xb, *zb))
            .sum();
        let e = e + 2 * i32::from(self.sign) + 2 * i32::from(source.sign);
        e.rem_euclid(4) as u8
    }

    /// Left-multiply `self` by `source`, storing the product in `self`.
    ///
    /// The sign follows the mod-4 phase of the product. When the two operators
    /// anticommute the product carries a factor of ±*i*; that factor is
    /// dropped and only its real sign kept.
    ///
    /// *Panics if the operators act on different numbers of qubits.*
    pub fn rowsum(&mut self, source: &Self) {
        assert_eq!(self.n, source.n, "Pauli operators must act on the same qubits");
        let phase = self.product_phase(source);
        self.x.iter_mut().zip(&source.x).for_each(|(a, b)| { *a ^= b; });
        self.z.iter_mut().zip(&source.z).for_each(|(a, b)| { *a ^= b; });
        self.sign = phase & 2 != 0;
    }

    /// Plain bitwise XOR of `other` into `self`, sign bit included, with no
    /// phase tracking.
    pub fn xor_assign(&mut self, other: &Self) {
        assert_eq!(self.n, other.n, "Pauli operators must act on the same qubits");
        self.x.iter_mut().zip(&other.x).for_each(|(a, b)| { *a ^= b; });
        self.z.iter_mut().zip(&other.z).for_each(|(a, b)| { *a ^= b; });
        self.sign ^= other.sign;
    }

    /// Return a copy with a fresh identity inserted at qubit index `idx`;
    /// qubits at `idx` and above shift up by one.
    pub fn with_qubit_inserted(&self, idx: usize) -> Self {
        let mut ops: Vec<Pauli> = self.iter().collect();
        ops.insert(idx.min(self.n), Pauli::I);
        Self::from_paulis(self.sign, ops)
    }

    /// Return a copy with qubit `idx` removed; qubits above it shift down.
    pub fn with_qubit_removed(&self, idx: usize) -> Self {
        let ops = self.iter().enumerate()
            .filter_map(|(j, p)| (j != idx).then_some(p));
        Self::from_paulis(self.sign, ops)
    }

    /// Qubit indices acted on by each of *X*, *Y*, and *Z*.
    pub fn sparse_format(&self) -> SparsePauli {
        let mut sparse = SparsePauli {
            sign: if self.sign { '-' } else { '+' },
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
        };
        for (j, p) in self.iter().enumerate() {
            match p {
                Pauli::I => { },
                Pauli::X => sparse.x.push(j),
                Pauli::Y => sparse.y.push(j),
                Pauli::Z => sparse.z.push(j),
            }
        }
        sparse
    }
}

impl fmt::Display for PauliOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.sign { '-' } else { '+' })?;
        self.iter().try_for_each(|p| p.fmt(f))
    }
}

impl FromStr for PauliOp {
    type Err = CliffordError;

    /// Parse strings like `"+X_Z"`, `"-ZZ"`, or `"XIY"` (a missing sign means
    /// +). Identities may be written `I` or `_`.
    fn from_str(s: &str) -> SimResult<Self> {
        let (sign, body)
            = match s.chars().next() {
                Some('+') => (false, &s[1..]),
                Some('-') => (true, &s[1..]),
                _ => (false, s),
            };
        let ops: Vec<Pauli>
            = body.chars()
            .map(Pauli::try_from)
            .collect::<SimResult<_>>()
            .map_err(|_| CliffordError::InvalidValue(
                format!("`{}` is not a valid Pauli string", s)
            ))?;
        Ok(Self::from_paulis(sign, ops))
    }
}

impl From<PauliOp> for String {
    fn from(op: PauliOp) -> Self { op.to_string() }
}

impl TryFrom<String> for PauliOp {
    type Error = CliffordError;

    fn try_from(s: String) -> SimResult<Self> { s.parse() }
}

/// Sparse rendering of a signed Pauli operator: the qubits acted on by each
/// non-identity Pauli.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparsePauli {
    pub sign: char,
    #[serde(rename = "X")]
    pub x: Vec<usize>,
    #[serde(rename = "Y")]
    pub y: Vec<usize>,
    #[serde(rename = "Z")]
    pub z: Vec<usize>,
}
