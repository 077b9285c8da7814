//! *N*-qubit stabilizer states in the Gottesman-Knill tableau representation.
//!
//! States are identified not by complex amplitudes but by the *N* Pauli
//! operators that stabilize them. Each qubit's Pauli takes two bits to encode,
//! and every generator carries a sign, so a complete state fits in
//! *O*(*N*<sup>2</sup>) bits rather than the *O*(2<sup>*N*</sup>) of a state
//! vector. Following Aaronson and Gottesman[^1], the tableau also stores *N*
//! "destabilizers": the complementary operators that, together with the
//! stabilizers, generate the full *N*-qubit Pauli group, and that make
//! deterministic measurement outcomes computable in *O*(*N*<sup>2</sup>) time
//! without Gaussian elimination.
//!
//! Rows `0..N` are destabilizers, rows `N..2N` are stabilizers, and row `2N` is
//! a scratch row. Columns of the *x* and *z* bit matrices are packed into
//! `u32`s. The actions of the Clifford generators are bitwise operations on the
//! columns of those matrices.
//!
//! # Example
//! ```
//! use clifford_engine::{ tableau::Tableau, gate::Gate };
//!
//! // initialize a new state to ∣000⟩
//! let mut tab = Tableau::new(3);
//!
//! // generate a Bell state on qubits 0, 1
//! tab.apply_gate(Gate::H(0)).unwrap();
//! tab.apply_gate(Gate::CX(0, 1)).unwrap();
//!
//! println!("{}", tab);
//! // +Z__ | +XX_
//! // +_X_ | +ZZ_
//! // +__X | +__Z
//! assert!(tab.stabilizer_set().contains("+ZZ_"));
//! ```
//!
//! [^1]: [arXiv:quant-ph/0406196](https://arxiv.org/abs/quant-ph/0406196)

use std::{ collections::BTreeSet, fmt };
use nalgebra as na;
use rand::Rng;
use serde::{ Deserialize, Serialize };
use crate::{
    error::{ CliffordError, SimResult },
    gate::{ Basis, Gate, ResetState },
    pauli::{ g_word, words, Pauli, PauliOp, SparsePauli, PW },
    stab_array::{ self, StabArray },
};

/// A stabilizer state of a finite register of qubits, identified by its
/// stabilizer group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tableau {
    pub(crate) n: usize,
    // `x` and `z` are bit arrays of size (2n + 1) × n; for space efficiency,
    // the columns are packed into u32s
    pub(crate) x: na::DMatrix<u32>, // Pauli-X bits; size (2n + 1) × (floor(n / 32) + 1)
    pub(crate) z: na::DMatrix<u32>, // Pauli-Z bits; size (2n + 1) × (floor(n / 32) + 1)
    pub(crate) r: na::DVector<u8>, // Phases (0 for +1, 2 for -1); size 2n + 1
    pub(crate) over32: usize, // = floor(n / 32) + 1
    // false after a wholesale replacement that skipped the validity check
    pub(crate) validated: bool,
}

impl Tableau {
    /// Create a new stabilizer state of size `n` initialized to ∣0...0⟩.
    pub fn new(n: usize) -> Self {
        let over32: usize = words(n);
        let mut x: na::DMatrix<u32> = na::DMatrix::zeros(2 * n + 1, over32);
        let mut z: na::DMatrix<u32> = na::DMatrix::zeros(2 * n + 1, over32);
        let r: na::DVector<u8> = na::DVector::zeros(2 * n + 1);
        let mut j: usize;
        let iter
            = x.row_iter_mut().take(n)
            .chain(z.row_iter_mut().skip(n).take(n))
            .enumerate();
        for (i, mut row) in iter {
            if i < n {
                row[i >> 5] = PW[i & 31];
            } else {
                j = i - n;
                row[j >> 5] = PW[j & 31];
            }
        }
        Self { n, x, z, r, over32, validated: true }
    }

    /// Build from destabilizer and stabilizer rows, without checking validity.
    ///
    /// *Panics if the numbers of rows or their widths disagree.*
    pub(crate) fn from_rows(destabs: &[PauliOp], stabs: &[PauliOp]) -> Self {
        let n = stabs.len();
        assert_eq!(destabs.len(), n, "destabilizer and stabilizer counts differ");
        let over32 = words(n);
        let mut x: na::DMatrix<u32> = na::DMatrix::zeros(2 * n + 1, over32);
        let mut z: na::DMatrix<u32> = na::DMatrix::zeros(2 * n + 1, over32);
        let mut r: na::DVector<u8> = na::DVector::zeros(2 * n + 1);
        for (i, op) in destabs.iter().chain(stabs).enumerate() {
            assert_eq!(op.nqubits(), n, "row {} has the wrong width", i);
            for w in 0..over32 {
                x[(i, w)] = op.x[w];
                z[(i, w)] = op.z[w];
            }
            r[i] = 2 * u8::from(op.sign());
        }
        Self { n, x, z, r, over32, validated: true }
    }

    /// Build a validated tableau from a raw 2*n* × (2*n* + 1) bit matrix,
    /// destabilizers first.
    pub fn from_matrix<R>(matrix: &[R]) -> SimResult<Self>
    where R: AsRef<[u8]>
    {
        let n = matrix.len() / 2;
        let mut tab = Self::new(n);
        tab.update(matrix, true)?;
        Ok(tab)
    }

    /// Build a full tableau for the state stabilized by `stabs`, synthesizing
    /// a matching set of destabilizers.
    ///
    /// Fails if `stabs` is not an irreducible array of *n* stabilizers on *n*
    /// qubits.
    pub fn from_stabilizers(stabs: &StabArray) -> SimResult<Self> {
        let destabs = stab_array::find_destabilizers(stabs, &[])?;
        Ok(Self::from_rows(&destabs, stabs.rows()))
    }

    /// Number of qubits.
    pub fn nqubits(&self) -> usize { self.n }

    fn check_qubit(&self, op: &str, k: usize) -> SimResult<()> {
        if k >= self.n {
            Err(CliffordError::EngineRun { op: op.into(), qubit: k, nqubits: self.n })
        } else {
            Ok(())
        }
    }

    /// Apply a Hadamard gate to the `k`-th qubit.
    pub fn apply_h(&mut self, k: usize) -> &mut Self {
        if k >= self.n { return self; }
        self.apply_h_unchecked(k)
    }

    fn apply_h_unchecked(&mut self, k: usize) -> &mut Self {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        let mut tmp: u32;
        for ((x_i_k5, z_i_k5), r_i) in
            self.x.column_mut(k5).iter_mut()
                .zip(self.z.column_mut(k5).iter_mut())
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            tmp = *x_i_k5;
            *x_i_k5 ^= (*x_i_k5 ^ *z_i_k5) & pw;
            *z_i_k5 ^= (*z_i_k5 ^ tmp) & pw;
            if *x_i_k5 & pw != 0 && *z_i_k5 & pw != 0 { *r_i = (*r_i + 2) % 4; }
        }
        self
    }

    /// Apply an S gate (= Z(π/2)) to the `k`-th qubit.
    pub fn apply_s(&mut self, k: usize) -> &mut Self {
        if k >= self.n { return self; }
        self.apply_s_unchecked(k)
    }

    fn apply_s_unchecked(&mut self, k: usize) -> &mut Self {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        for ((x_i_k5, z_i_k5), r_i) in
            self.x.column(k5).iter()
                .zip(self.z.column_mut(k5).iter_mut())
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            if *x_i_k5 & pw != 0 && *z_i_k5 & pw != 0 { *r_i = (*r_i + 2) % 4; }
            *z_i_k5 ^= *x_i_k5 & pw;
        }
        self
    }

    /// Apply an S<sup>†</sup> gate (= Z(−π/2)) to the `k`-th qubit.
    pub fn apply_sinv(&mut self, k: usize) -> &mut Self {
        if k >= self.n { return self; }
        self.apply_sinv_unchecked(k)
    }

    fn apply_sinv_unchecked(&mut self, k: usize) -> &mut Self {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        for ((x_i_k5, z_i_k5), r_i) in
            self.x.column(k5).iter()
                .zip(self.z.column_mut(k5).iter_mut())
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            if *x_i_k5 & pw != 0 && *z_i_k5 & pw == 0 { *r_i = (*r_i + 2) % 4; }
            *z_i_k5 ^= *x_i_k5 & pw;
        }
        self
    }

    /// Apply an X gate to the `k`-th qubit.
    pub fn apply_x(&mut self, k: usize) -> &mut Self {
        if k >= self.n { return self; }
        self.apply_x_unchecked(k)
    }

    fn apply_x_unchecked(&mut self, k: usize) -> &mut Self {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        for (z_i_k5, r_i) in
            self.z.column(k5).iter()
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            if *z_i_k5 & pw != 0 { *r_i = (*r_i + 2) % 4; }
        }
        self
    }

    /// Apply a Y gate to the `k`-th qubit.
    pub fn apply_y(&mut self, k: usize) -> &mut Self {
        if k >= self.n { return self; }
        self.apply_y_unchecked(k)
    }

    fn apply_y_unchecked(&mut self, k: usize) -> &mut Self {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        for ((x_i_k5, z_i_k5), r_i) in
            self.x.column(k5).iter()
                .zip(self.z.column(k5).iter())
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            if (*x_i_k5 ^ *z_i_k5) & pw != 0 { *r_i = (*r_i + 2) % 4; }
        }
        self
    }

    /// Apply a Z gate to the `k`-th qubit.
    pub fn apply_z(&mut self, k: usize) -> &mut Self {
        if k >= self.n { return self; }
        self.apply_z_unchecked(k)
    }

    fn apply_z_unchecked(&mut self, k: usize) -> &mut Self {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        for (x_i_k5, r_i) in
            self.x.column(k5).iter()
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            if *x_i_k5 & pw != 0 { *r_i = (*r_i + 2) % 4; }
        }
        self
    }

    /// Apply a CNOT gate to the `b`-th qubit, with the `a`-th qubit as control.
    pub fn apply_cnot(&mut self, a: usize, b: usize) -> &mut Self {
        if a >= self.n || b >= self.n || a == b { return self; }
        self.apply_cnot_unchecked(a, b)
    }

    fn apply_cnot_unchecked(&mut self, a: usize, b: usize) -> &mut Self {
        let a5: usize = a >> 5;
        let b5: usize = b >> 5;
        let pwa: u32 = PW[a & 31];
        let pwb: u32 = PW[b & 31];
        let (mut xa, mut xb, mut za, mut zb): (bool, bool, bool, bool);
        for ((mut x_i, mut z_i), r_i) in
            self.x.row_iter_mut()
                .zip(self.z.row_iter_mut())
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            xa = x_i[a5] & pwa != 0;
            xb = x_i[b5] & pwb != 0;
            za = z_i[a5] & pwa != 0;
            zb = z_i[b5] & pwb != 0;
            if xa && zb && xb == za { *r_i = (*r_i + 2) % 4; }
            if xa { x_i[b5] ^= pwb; }
            if zb { z_i[a5] ^= pwa; }
        }
        self
    }

    /// Apply a CZ gate to the `a`-th and `b`-th qubits.
    pub fn apply_cz(&mut self, a: usize, b: usize) -> &mut Self {
        if a >= self.n || b >= self.n || a == b { return self; }
        self.apply_cz_unchecked(a, b)
    }

    fn apply_cz_unchecked(&mut self, a: usize, b: usize) -> &mut Self {
        self.apply_h_unchecked(b)
            .apply_cnot_unchecked(a, b)
            .apply_h_unchecked(b)
    }

    /// Apply a CY gate to the `b`-th qubit, with the `a`-th qubit as control.
    pub fn apply_cy(&mut self, a: usize, b: usize) -> &mut Self {
        if a >= self.n || b >= self.n || a == b { return self; }
        self.apply_cy_unchecked(a, b)
    }

    fn apply_cy_unchecked(&mut self, a: usize, b: usize) -> &mut Self {
        self.apply_sinv_unchecked(b)
            .apply_cnot_unchecked(a, b)
            .apply_s_unchecked(b)
    }

    /// Apply a SWAP gate to the `a`-th and `b`-th qubits.
    pub fn apply_swap(&mut self, a: usize, b: usize) -> &mut Self {
        if a >= self.n || b >= self.n || a == b { return self; }
        self.apply_swap_unchecked(a, b)
    }

    fn apply_swap_unchecked(&mut self, a: usize, b: usize) -> &mut Self {
        let a5: usize = a >> 5;
        let b5: usize = b >> 5;
        let pwa: u32 = PW[a & 31];
        let pwb: u32 = PW[b & 31];
        let mut tmp: u32;
        for (mut x_i, mut z_i) in
            self.x.row_iter_mut()
                .zip(self.z.row_iter_mut())
        {
            tmp = x_i[a5];
            x_i[a5] ^= (x_i[a5] & pwa) ^ (if x_i[b5] & pwb != 0 { pwa } else { 0 });
            x_i[b5] ^= (x_i[b5] & pwb) ^ (if tmp & pwa != 0 { pwb } else { 0 });
            tmp = z_i[a5];
            z_i[a5] ^= (z_i[a5] & pwa) ^ (if z_i[b5] & pwb != 0 { pwa } else { 0 });
            z_i[b5] ^= (z_i[b5] & pwb) ^ (if tmp & pwa != 0 { pwb } else { 0 });
        }
        self
    }

    /// Perform the action of a gate.
    ///
    /// Fails if any qubit index is out of bounds.
    pub fn apply_gate(&mut self, gate: Gate) -> SimResult<&mut Self> {
        for k in gate.qubits() { self.check_qubit(gate.name(), k)?; }
        let tab
            = match gate {
                Gate::I(_) => self,
                Gate::H(k) => self.apply_h_unchecked(k),
                Gate::X(k) => self.apply_x_unchecked(k),
                Gate::Y(k) => self.apply_y_unchecked(k),
                Gate::Z(k) => self.apply_z_unchecked(k),
                Gate::S(k) => self.apply_s_unchecked(k),
                Gate::SInv(k) => self.apply_sinv_unchecked(k),
                Gate::CX(a, b) => self.apply_cnot_unchecked(a, b),
                Gate::CY(a, b) => self.apply_cy_unchecked(a, b),
                Gate::CZ(a, b) => self.apply_cz_unchecked(a, b),
                Gate::Swap(a, b) => self.apply_swap_unchecked(a, b),
            };
        Ok(tab)
    }

    /// Perform a series of gates.
    pub fn apply_circuit<'a, I>(&mut self, gates: I) -> SimResult<&mut Self>
    where I: IntoIterator<Item = &'a Gate>
    {
        for g in gates.into_iter() { self.apply_gate(*g)?; }
        Ok(self)
    }

    pub(crate) fn row_copy(&mut self, a: usize, b: usize) -> &mut Self {
        // set row b equal to row a
        for (mut x__j, mut z__j) in
            self.x.column_iter_mut()
                .zip(self.z.column_iter_mut())
        {
            x__j[b] = x__j[a];
            z__j[b] = z__j[a];
        }
        self.r[b] = self.r[a];
        self
    }

    // set row k equal to the o-th observable (X_1, ..., X_n, Z_1, ..., Z_n)
    pub(crate) fn row_set(&mut self, o: usize, k: usize) -> &mut Self {
        let o5: usize;
        let o31: usize;
        self.x.fill_row(k, 0);
        self.z.fill_row(k, 0);
        self.r[k] = 0;
        if o < self.n {
            o5 = o >> 5;
            o31 = o & 31;
            self.x[(k, o5)] = PW[o31];
        } else {
            o5 = (o - self.n) >> 5;
            o31 = (o - self.n) & 31;
            self.z[(k, o5)] = PW[o31];
        }
        self
    }

    // return the phase (0, ..., 3) when row b's operator is left-multiplied by
    // row a's operator
    pub(crate) fn row_mul_phase(&self, a: usize, b: usize) -> u8 {
        let e: i32
            = self.x.row(a).iter().zip(self.z.row(a).iter())
            .zip(self.x.row(b).iter().zip(self.z.row(b).iter()))
            .map(|((xa, za), (xb, zb))| g_word(*xa, *za, *xb, *zb))
            .sum();
        (e + i32::from(self.r[b]) + i32::from(self.r[a])).rem_euclid(4) as u8
    }

    // left-multiply row b's operator by row a's operator and store the result
    // in row b; an imaginary phase (anticommuting rows) is dropped
    pub(crate) fn row_mul(&mut self, a: usize, b: usize) -> &mut Self {
        self.r[b] = self.row_mul_phase(a, b) & 2;
        for (mut x__j, mut z__j) in
            self.x.column_iter_mut()
                .zip(self.z.column_iter_mut())
        {
            x__j[b] ^= x__j[a];
            z__j[b] ^= z__j[a];
        }
        self
    }

    /// The operator held in row `i` (destabilizers first, then stabilizers,
    /// then the scratch row).
    ///
    /// *Panics if `i > 2n`.*
    pub fn row(&self, i: usize) -> PauliOp {
        PauliOp {
            n: self.n,
            x: self.x.row(i).iter().copied().collect(),
            z: self.z.row(i).iter().copied().collect(),
            sign: self.r[i] & 2 != 0,
        }
    }

    /// Destabilizer generators, in row order.
    pub fn destabilizers(&self) -> Vec<PauliOp> {
        (0..self.n).map(|i| self.row(i)).collect()
    }

    /// Stabilizer generators, in row order.
    pub fn stabilizers(&self) -> Vec<PauliOp> {
        (self.n..2 * self.n).map(|i| self.row(i)).collect()
    }

    /// Stabilizer generators as a [`StabArray`].
    pub fn stabilizer_array(&self) -> StabArray {
        StabArray::new_unchecked(self.n, self.stabilizers())
    }

    /// Stabilizer generators rendered as signed Pauli strings, e.g. `"+X_Z"`.
    pub fn stabilizer_set(&self) -> BTreeSet<String> {
        self.stabilizers().into_iter().map(|op| op.to_string()).collect()
    }

    /// Stabilizer generators in sparse format, in row order.
    pub fn stabilizer_set_sparse_format(&self) -> Vec<SparsePauli> {
        self.stabilizers().iter().map(|op| op.sparse_format()).collect()
    }

    /// The 2*n* × (2*n* + 1) bit matrix of the tableau, destabilizers first.
    pub fn to_matrix(&self) -> Vec<Vec<u8>> {
        (0..2 * self.n).map(|i| self.row(i).to_bits()).collect()
    }

    /// Like [`Self::to_matrix`], but including the scratch row.
    pub fn tableau_w_scratch(&self) -> Vec<Vec<u8>> {
        (0..=2 * self.n).map(|i| self.row(i).to_bits()).collect()
    }

    /// `true` if the rows generate the full Pauli group and the stabilizers
    /// pairwise commute.
    pub fn is_valid(&self) -> bool {
        let rows: Vec<PauliOp> = (0..2 * self.n).map(|i| self.row(i)).collect();
        stab_array::rows_form_valid_tableau(&rows)
    }

    /// `true` unless the tableau was replaced without validation and has not
    /// been checked since.
    pub fn is_validated(&self) -> bool { self.validated }

    /// Check a tableau that was replaced without validation.
    ///
    /// Fails with [`CliffordError::InvalidTableau`] if it is not valid.
    pub fn ensure_valid(&mut self) -> SimResult<()> {
        if !self.validated {
            if !self.is_valid() { return Err(invalid_state()); }
            self.validated = true;
        }
        Ok(())
    }

    /// Replace the whole tableau with a 2*n* × (2*n* + 1) bit matrix,
    /// destabilizers first.
    ///
    /// Fails if the shape is wrong or the matrix is not binary. If `validate`
    /// is `true`, also fails if the matrix is not a valid tableau; otherwise
    /// the check is deferred to the next operation that depends on it (see
    /// [`Self::ensure_valid`]).
    pub fn update<R>(&mut self, matrix: &[R], validate: bool) -> SimResult<()>
    where R: AsRef<[u8]>
    {
        let n = self.n;
        let got_rows = matrix.len();
        let got_cols = matrix.first().map(|row| row.as_ref().len()).unwrap_or(0);
        if got_rows != 2 * n || got_cols != 2 * n + 1 {
            return Err(CliffordError::TableauSize {
                nqubits: n,
                rows: 2 * n,
                cols: 2 * n + 1,
                got_rows,
                got_cols,
            });
        }
        if matrix.iter().any(|row| row.as_ref().len() != 2 * n + 1) {
            return Err(CliffordError::InvalidTableau(
                "All rows of the tableau must have the same length.".into()
            ));
        }
        let rows: Vec<PauliOp>
            = matrix.iter()
            .map(|row| PauliOp::from_bits(row.as_ref()))
            .collect::<SimResult<_>>()
            .map_err(|_| CliffordError::InvalidTableau(
                "The tableau should only contain 0s and 1s.".into()
            ))?;
        if validate && !stab_array::rows_form_valid_tableau(&rows) {
            return Err(invalid_state());
        }
        *self = Self::from_rows(&rows[..n], &rows[n..]);
        self.validated = validate;
        Ok(())
    }

    fn measure_z_unchecked<R>(&mut self, k: usize, rng: &mut R) -> Outcome
    where R: Rng + ?Sized
    {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        let rnd: Option<usize>
            = self.x.column(k5).iter()
            .take(2 * self.n)
            .skip(self.n)
            .position(|x_i_k5| *x_i_k5 & pw != 0);

        if let Some(p) = rnd {
            self.row_copy(p + self.n, p);
            self.row_set(k + self.n, p + self.n);
            self.r[p + self.n] = 2 * u8::from(rng.gen::<bool>());
            for i in 0..2 * self.n {
                if i != p && self.x[(i, k5)] & pw != 0 { self.row_mul(p, i); }
            }
            if self.r[p + self.n] != 0 {
                Outcome::Rand1
            } else {
                Outcome::Rand0
            }
        } else {
            let m: usize
                = self.x.column(k5).iter()
                .take(self.n)
                .position(|x_q_k5| x_q_k5 & pw != 0)
                .unwrap_or(0);
            self.row_copy(m + self.n, 2 * self.n);
            for i in m + 1..self.n {
                if self.x[(i, k5)] & pw != 0 {
                    self.row_mul(i + self.n, 2 * self.n);
                }
            }
            if self.r[2 * self.n] != 0 {
                Outcome::Det1
            } else {
                Outcome::Det0
            }
        }
    }

    /// Perform a projective measurement on a qubit `k` in the given basis,
    /// returning the outcome of the measurement.
    ///
    /// The measurement is either deterministic (when the qubit is already in
    /// an eigenstate of the basis) or random, in which case exactly one `bool`
    /// is drawn from `rng`. X- and Y-basis measurements rotate the basis onto
    /// Z, measure, and rotate back.
    ///
    /// Fails if `k` is out of bounds or if the tableau is invalid.
    pub fn measure<R>(&mut self, k: usize, basis: Basis, rng: &mut R)
        -> SimResult<Outcome>
    where R: Rng + ?Sized
    {
        self.check_qubit("Measurement", k)?;
        self.ensure_valid()?;
        let outcome
            = match basis {
                Basis::Z => self.measure_z_unchecked(k, rng),
                Basis::X => {
                    self.apply_h_unchecked(k);
                    let out = self.measure_z_unchecked(k, rng);
                    self.apply_h_unchecked(k);
                    out
                },
                Basis::Y => {
                    self.apply_sinv_unchecked(k).apply_h_unchecked(k);
                    let out = self.measure_z_unchecked(k, rng);
                    self.apply_h_unchecked(k).apply_s_unchecked(k);
                    out
                },
            };
        Ok(outcome)
    }

    /// Reset qubit `k` to a single-qubit Pauli eigenstate.
    ///
    /// The qubit is measured in the target's basis and, if the outcome does not
    /// match, a Pauli anticommuting with that basis is applied, so that
    /// afterwards the stabilizer group contains exactly the target's signed
    /// single-qubit operator.
    pub fn reset<R>(&mut self, k: usize, state: ResetState, rng: &mut R)
        -> SimResult<&mut Self>
    where R: Rng + ?Sized
    {
        self.check_qubit("Reset", k)?;
        let basis = state.basis();
        let outcome = self.measure(k, basis, rng)?;
        if outcome.is_1() != state.outcome() {
            match basis {
                Basis::Z => { self.apply_x_unchecked(k); },
                Basis::X | Basis::Y => { self.apply_z_unchecked(k); },
            }
        }
        Ok(self)
    }

    /// Insert a fresh qubit in ∣0⟩ at index `idx`; qubits at `idx` and above
    /// shift up by one.
    ///
    /// Fails if `idx > n`.
    pub fn insert_qubit(&mut self, idx: usize) -> SimResult<&mut Self> {
        if idx > self.n {
            return Err(CliffordError::EngineRun {
                op: "AddQubit".into(), qubit: idx, nqubits: self.n });
        }
        let validated = self.validated;
        let m = self.n + 1;
        let mut destabs: Vec<PauliOp>
            = self.destabilizers().iter()
            .map(|op| op.with_qubit_inserted(idx))
            .collect();
        let mut stabs: Vec<PauliOp>
            = self.stabilizers().iter()
            .map(|op| op.with_qubit_inserted(idx))
            .collect();
        destabs.insert(idx, PauliOp::single(m, idx, Pauli::X));
        stabs.insert(idx, PauliOp::single(m, idx, Pauli::Z));
        *self = Self::from_rows(&destabs, &stabs);
        self.validated = validated;
        Ok(self)
    }

    /// Append `k` fresh qubits in ∣0⟩.
    pub fn add_qubits(&mut self, k: usize) -> SimResult<&mut Self> {
        for _ in 0..k {
            self.insert_qubit(self.n)?;
        }
        Ok(self)
    }

    /// Remove qubit `q` from the register; qubits above it shift down.
    ///
    /// The qubit is first measured in the Z basis (drawing from `rng` if the
    /// outcome is random). The stabilizers are then recombined so that exactly
    /// one of them is ±Z on `q` and no other acts on `q`, and that
    /// stabilizer/destabilizer pair is dropped along with the qubit's columns.
    /// The remaining tableau is always valid.
    pub fn delete_qubit<R>(&mut self, q: usize, rng: &mut R)
        -> SimResult<&mut Self>
    where R: Rng + ?Sized
    {
        self.check_qubit("DeleteQubit", q)?;
        self.measure(q, Basis::Z, rng)?;
        let n = self.n;
        let q5: usize = q >> 5;
        let pw: u32 = PW[q & 31];
        let anti: Vec<usize>
            = (0..n).filter(|j| self.x[(*j, q5)] & pw != 0).collect();
        let Some((&p, rest)) = anti.split_first() else {
            return Err(invalid_state());
        };
        // collect ±Z_q into stabilizer p
        for &j in rest.iter() {
            self.row_mul(n + j, n + p);
            self.row_mul(p, j);
        }
        // clear qubit q from every other stabilizer
        for k in 0..n {
            if k != p && self.z[(n + k, q5)] & pw != 0 {
                self.row_mul(n + p, n + k);
                self.row_mul(k, p);
            }
        }
        let destabs: Vec<PauliOp>
            = (0..n).filter(|i| *i != p)
            .map(|i| self.row(i).with_qubit_removed(q))
            .collect();
        let stabs: Vec<PauliOp>
            = (0..n).filter(|i| *i != p)
            .map(|i| self.row(n + i).with_qubit_removed(q))
            .collect();
        *self = Self::from_rows(&destabs, &stabs);
        Ok(self)
    }
}

fn invalid_state() -> CliffordError {
    CliffordError::InvalidTableau(
        "The tableau is not valid: its rows must generate the full Pauli group \
        and its stabilizers must commute.".into()
    )
}

/// Return `true` if `a` and `b` have the same stabilizer group.
pub fn compare_stabilizer_set(a: &Tableau, b: &Tableau) -> bool {
    stab_array::equivalent(&a.stabilizer_array(), &b.stabilizer_array())
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for k in 0..self.n {
            write!(f, "{} | {}", self.row(k), self.row(self.n + k))?;
            if k < self.n - 1 { writeln!(f)?; }
        }
        Ok(())
    }
}

/// The result of a measurement, generated by [`Tableau::measure`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// A deterministic outcome resulting in ∣0⟩
    Det0,
    /// A deterministic outcome resulting in ∣1⟩
    Det1,
    /// A random outcome resulting in ∣0⟩
    Rand0,
    /// A random outcome resulting in ∣1⟩
    Rand1,
}

impl Outcome {
    /// Returns `true` if `self` is `Det0` or `Rand0`.
    pub fn is_0(&self) -> bool { matches!(self, Self::Det0 | Self::Rand0) }

    /// Returns `true` if `self` is `Det1` or `Rand1`.
    pub fn is_1(&self) -> bool { matches!(self, Self::Det1 | Self::Rand1) }

    /// Returns `true` if `self` is `Rand0` or `Rand1`.
    pub fn is_random(&self) -> bool { matches!(self, Self::Rand0 | Self::Rand1) }

    /// The outcome as a classical bit.
    pub fn bit(&self) -> u8 { u8::from(self.is_1()) }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{ rngs::StdRng, SeedableRng };

    fn set(ops: &[&str]) -> BTreeSet<String> {
        ops.iter().map(|s| s.to_string()).collect()
    }

    fn run(n: usize, gates: &[Gate]) -> Tableau {
        let mut tab = Tableau::new(n);
        tab.apply_circuit(gates).unwrap();
        tab
    }

    #[test]
    fn initial_state() {
        let tab = Tableau::new(3);
        assert_eq!(tab.stabilizer_set(), set(&["+Z__", "+_Z_", "+__Z"]));
        assert_eq!(
            tab.destabilizers().iter().map(|d| d.to_string()).collect::<Vec<_>>(),
            vec!["+X__", "+_X_", "+__X"],
        );
        assert!(tab.is_valid());
        assert_eq!(tab.tableau_w_scratch().len(), 7);
    }

    #[test]
    fn single_qubit_gates() {
        let tab = run(3, &[Gate::H(0), Gate::H(1), Gate::S(1), Gate::X(2)]);
        assert_eq!(tab.stabilizer_set(), set(&["+X__", "+_Y_", "-__Z"]));
        let tab = run(1, &[Gate::H(0), Gate::S(0), Gate::S(0), Gate::S(0), Gate::H(0), Gate::S(0)]);
        assert_eq!(tab.stabilizer_set(), set(&["-X"]));
        let tab = run(1, &[Gate::H(0), Gate::SInv(0)]);
        assert_eq!(tab.stabilizer_set(), set(&["-Y"]));
        for g in [Gate::X(0), Gate::Y(0), Gate::Z(0), Gate::H(0), Gate::I(0)] {
            assert_eq!(run(1, &[g, g]).stabilizer_set(), set(&["+Z"]));
        }
    }

    #[test]
    fn two_qubit_gates() {
        let bell = run(2, &[Gate::H(0), Gate::CX(0, 1)]);
        assert_eq!(bell.stabilizer_set(), set(&["+XX", "+ZZ"]));
        let tab = run(2, &[Gate::H(0), Gate::H(1), Gate::CZ(0, 1)]);
        assert_eq!(tab.stabilizer_set(), set(&["+XZ", "+ZX"]));
        let tab = run(2, &[Gate::H(0), Gate::CY(0, 1)]);
        assert_eq!(tab.stabilizer_set(), set(&["+XY", "+ZZ"]));
        let cy = run(2, &[Gate::H(0), Gate::S(0), Gate::CY(0, 1)]);
        let decomp = run(2, &[
            Gate::H(0), Gate::S(0),
            Gate::H(1), Gate::S(1), Gate::CX(0, 1), Gate::SInv(1), Gate::H(1),
        ]);
        assert_eq!(cy.stabilizer_set(), decomp.stabilizer_set());
        let tab = run(2, &[Gate::X(0), Gate::Swap(0, 1)]);
        assert_eq!(tab.stabilizer_set(), set(&["+Z_", "-_Z"]));
        assert!(matches!(
            Tableau::new(2).apply_gate(Gate::CX(0, 2)),
            Err(CliffordError::EngineRun { qubit: 2, nqubits: 2, .. }),
        ));
    }

    #[test]
    fn wide_registers() {
        let mut tab = Tableau::new(40);
        tab.apply_gate(Gate::H(35)).unwrap();
        tab.apply_gate(Gate::CX(35, 39)).unwrap();
        tab.apply_gate(Gate::Swap(39, 3)).unwrap();
        let mut rng = StdRng::seed_from_u64(10546);
        let a = tab.measure(35, Basis::Z, &mut rng).unwrap();
        let b = tab.measure(3, Basis::Z, &mut rng).unwrap();
        assert!(a.is_random());
        assert!(!b.is_random());
        assert_eq!(a.bit(), b.bit());
        assert!(tab.is_valid());
    }

    #[test]
    fn measurement_determinism() {
        let mut rng = StdRng::seed_from_u64(10546);
        let mut tab = Tableau::new(1);
        assert_eq!(tab.measure(0, Basis::Z, &mut rng).unwrap(), Outcome::Det0);
        tab.apply_x(0);
        assert_eq!(tab.measure(0, Basis::Z, &mut rng).unwrap(), Outcome::Det1);
        tab.apply_h(0);
        let out = tab.measure(0, Basis::Z, &mut rng).unwrap();
        assert!(out.is_random());
        let again = tab.measure(0, Basis::Z, &mut rng).unwrap();
        assert!(!again.is_random());
        assert_eq!(out.bit(), again.bit());
    }

    #[test]
    fn measurement_bases() {
        let mut rng = StdRng::seed_from_u64(10546);
        let mut tab = run(1, &[Gate::H(0)]);
        assert_eq!(tab.measure(0, Basis::X, &mut rng).unwrap(), Outcome::Det0);
        let mut tab = run(1, &[Gate::H(0), Gate::Z(0)]);
        assert_eq!(tab.measure(0, Basis::X, &mut rng).unwrap(), Outcome::Det1);
        let mut tab = run(1, &[Gate::H(0), Gate::S(0)]);
        assert_eq!(tab.measure(0, Basis::Y, &mut rng).unwrap(), Outcome::Det0);
        assert_eq!(tab.stabilizer_set(), set(&["+Y"]));
        let mut tab = Tableau::new(1);
        assert!(tab.measure(0, Basis::Y, &mut rng).unwrap().is_random());
        assert!(tab.measure(1, Basis::Z, &mut rng).is_err());
    }

    #[test]
    fn resets() {
        let mut rng = StdRng::seed_from_u64(10546);
        for (state, expected) in [
            (ResetState::Zero, "+Z"),
            (ResetState::One, "-Z"),
            (ResetState::Plus, "+X"),
            (ResetState::Minus, "-X"),
            (ResetState::PlusI, "+Y"),
            (ResetState::MinusI, "-Y"),
        ] {
            for prep in [Gate::I(0), Gate::H(0), Gate::X(0), Gate::S(0)] {
                let mut tab = run(1, &[Gate::H(0), prep]);
                tab.reset(0, state, &mut rng).unwrap();
                assert_eq!(tab.stabilizer_set(), set(&[expected]));
            }
        }
    }

    #[test]
    fn adding_qubits() {
        let mut tab = Tableau::new(1);
        tab.insert_qubit(1).unwrap();
        assert_eq!(tab.stabilizer_set(), set(&["+_Z", "+Z_"]));
        let mut tab = run(2, &[Gate::H(0), Gate::CX(0, 1)]);
        tab.insert_qubit(1).unwrap();
        tab.apply_gate(Gate::H(1)).unwrap().apply_gate(Gate::S(1)).unwrap();
        assert_eq!(tab.stabilizer_set(), set(&["+Z_Z", "+X_X", "+_Y_"]));
        tab.add_qubits(2).unwrap();
        assert_eq!(tab.nqubits(), 5);
        assert!(tab.stabilizer_set().contains("+____Z"));
        assert!(tab.is_valid());
        assert!(tab.insert_qubit(7).is_err());
    }

    #[test]
    fn deleting_qubits() {
        let mut rng = StdRng::seed_from_u64(10546);
        let mut tab = run(3, &[Gate::H(0), Gate::CX(0, 2)]);
        tab.delete_qubit(1, &mut rng).unwrap();
        assert_eq!(tab.stabilizer_set(), set(&["+ZZ", "+XX"]));
        let mut tab = run(2, &[Gate::H(0), Gate::CX(0, 1)]);
        tab.delete_qubit(0, &mut rng).unwrap();
        assert_eq!(tab.nqubits(), 1);
        assert!(tab.is_valid());
        let s = tab.stabilizer_set();
        assert!(s == set(&["+Z"]) || s == set(&["-Z"]));
        assert!(tab.delete_qubit(1, &mut rng).is_err());
    }

    #[test]
    fn replacing_the_tableau() {
        let mut rng = StdRng::seed_from_u64(10546);
        let bell = run(2, &[Gate::H(0), Gate::CX(0, 1)]);
        let mut tab = Tableau::new(2);
        tab.update(&bell.to_matrix(), true).unwrap();
        assert_eq!(tab, bell);
        assert!(matches!(
            tab.update(&Tableau::new(1).to_matrix(), true),
            Err(CliffordError::TableauSize { rows: 4, cols: 5, got_rows: 2, got_cols: 3, .. }),
        ));
        let mut bad = bell.to_matrix();
        bad[3] = bad[2].clone();
        assert!(matches!(tab.update(&bad, true), Err(CliffordError::InvalidTableau(_))));
        bad[0][0] = 2;
        assert!(matches!(tab.update(&bad, false), Err(CliffordError::InvalidTableau(_))));
        bad[0][0] = 0;
        tab.update(&bad, false).unwrap();
        assert!(!tab.is_validated());
        assert!(matches!(
            tab.measure(0, Basis::Z, &mut rng),
            Err(CliffordError::InvalidTableau(_)),
        ));
    }

    #[test]
    fn tableau_from_stabilizers() {
        let stabs = StabArray::from_strs(&["+XXX", "-ZZ_", "+_ZZ"]).unwrap();
        let tab = Tableau::from_stabilizers(&stabs).unwrap();
        assert!(tab.is_valid());
        assert_eq!(tab.stabilizers(), stabs.rows());
        let ghz = run(3, &[Gate::H(0), Gate::CX(0, 1), Gate::CX(1, 2), Gate::X(0)]);
        assert!(compare_stabilizer_set(&tab, &ghz));
        assert!(!compare_stabilizer_set(&tab, &Tableau::new(3)));
        assert!(Tableau::from_stabilizers(&StabArray::from_strs(&["+Z_"]).unwrap()).is_err());
    }

    #[test]
    fn sparse_views() {
        let tab = run(2, &[Gate::H(0), Gate::CX(0, 1), Gate::S(0)]);
        let sparse = tab.stabilizer_set_sparse_format();
        assert_eq!(sparse[0].y, vec![0]);
        assert_eq!(sparse[0].x, vec![1]);
        assert_eq!(sparse[1].z, vec![0, 1]);
        assert_eq!(tab.to_string(), "+Z_ | +YX\n+_X | +ZZ");
    }
}
