//! Ordered arrays of mutually commuting signed Pauli operators, and the GF(2)
//! linear algebra that acts on them.
//!
//! A [`StabArray`] is the row-list counterpart of the packed tableau: each row
//! is a [`PauliOp`] viewed as the bit vector `[x | z | sign]`. Elimination runs
//! over all 2*n* + 1 columns, so a row that reduces to −*I* keeps its pivot in
//! the sign column and is never mistaken for a trivial one. Row operations are
//! true Pauli products ([`PauliOp::rowsum`]), so the reduced rows generate the
//! same signed group as the input.

use std::{ fmt, ops::Index };
use itertools::Itertools;
use nalgebra as na;
use crate::{
    error::{ CliffordError, SimResult },
    pauli::{ Pauli, PauliOp },
};

/// Records which input rows were multiplied together to produce each output
/// row of an elimination: entry (*i*, *j*) is 1 if output row *i* contains
/// input row *j*.
pub type Bookkeeping = na::DMatrix<u8>;

/// An ordered set of mutually commuting signed Pauli operators on the same
/// number of qubits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StabArray {
    pub(crate) n: usize,
    pub(crate) rows: Vec<PauliOp>,
}

impl StabArray {
    /// An array with no rows and no qubits.
    pub fn trivial() -> Self { Self { n: 0, rows: Vec::new() } }

    /// An array with no rows acting on `n` qubits.
    pub fn empty(n: usize) -> Self { Self { n, rows: Vec::new() } }

    /// Collect operators into a new array.
    ///
    /// Fails if the operators act on different numbers of qubits or if any
    /// pair of them anticommutes.
    pub fn new(rows: Vec<PauliOp>) -> SimResult<Self> {
        let n = rows.first().map(|op| op.nqubits()).unwrap_or(0);
        if rows.iter().any(|op| op.nqubits() != n) {
            return Err(CliffordError::InvalidValue(
                "All Pauli operators must act on the same number of qubits."
                    .into()
            ));
        }
        if rows.iter().tuple_combinations().any(|(a, b)| a.anticommutes_with(b)) {
            return Err(CliffordError::AntiCommutation(
                "StabArray should only contain commuting operators.".into()
            ));
        }
        Ok(Self { n, rows })
    }

    /// Parse each string as a [`PauliOp`] and collect them into a new array.
    pub fn from_strs<S>(ops: &[S]) -> SimResult<Self>
    where S: AsRef<str>
    {
        let rows
            = ops.iter()
            .map(|s| s.as_ref().parse())
            .collect::<SimResult<Vec<PauliOp>>>()?;
        Self::new(rows)
    }

    /// Build from a matrix of raw bit rows, each `[x | z | sign]`.
    ///
    /// Fails if the rows have different lengths, contain anything other than 0
    /// and 1, or anticommute.
    pub fn from_bits<R>(bits: &[R]) -> SimResult<Self>
    where R: AsRef<[u8]>
    {
        let ncols = bits.first().map(|row| row.as_ref().len()).unwrap_or(1);
        if bits.iter().any(|row| row.as_ref().len() != ncols) {
            return Err(CliffordError::InvalidValue(
                "The array has to be 2 dimensional".into()
            ));
        }
        let rows
            = bits.iter()
            .map(|row| PauliOp::from_bits(row.as_ref()))
            .collect::<SimResult<Vec<PauliOp>>>()?;
        let mut arr = Self::new(rows)?;
        arr.n = ncols / 2;
        Ok(arr)
    }

    pub(crate) fn new_unchecked(n: usize, rows: Vec<PauliOp>) -> Self {
        Self { n, rows }
    }

    /// Number of qubits.
    pub fn nqubits(&self) -> usize { self.n }

    /// Number of rows.
    pub fn nstabs(&self) -> usize { self.rows.len() }

    /// `true` if there are no rows.
    pub fn is_trivial(&self) -> bool { self.rows.is_empty() }

    /// `true` if no row is a product of the others (up to sign).
    pub fn is_irreducible(&self) -> bool {
        reduce(self).nstabs() == self.nstabs()
    }

    /// The rows, in order.
    pub fn rows(&self) -> &[PauliOp] { &self.rows }

    /// Iterate over the rows.
    pub fn iter(&self) -> std::slice::Iter<'_, PauliOp> { self.rows.iter() }

    /// Rows rendered as signed Pauli strings.
    pub fn as_paulistrings(&self) -> Vec<String> {
        self.rows.iter().map(|op| op.to_string()).collect()
    }

    /// Rows as raw bit vectors.
    pub fn to_bits(&self) -> Vec<Vec<u8>> {
        self.rows.iter().map(|op| op.to_bits()).collect()
    }

    /// Consume `self`, returning the rows.
    pub fn into_rows(self) -> Vec<PauliOp> { self.rows }
}

impl Index<usize> for StabArray {
    type Output = PauliOp;

    fn index(&self, i: usize) -> &PauliOp { &self.rows[i] }
}

impl<'a> IntoIterator for &'a StabArray {
    type Item = &'a PauliOp;
    type IntoIter = std::slice::Iter<'a, PauliOp>;

    fn into_iter(self) -> Self::IntoIter { self.rows.iter() }
}

impl fmt::Display for StabArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StabArray([{}])",
            self.rows.iter().map(|op| format!("'{}'", op)).join(", "),
        )
    }
}

// value of the k-th column of a row viewed as [x | z | sign]
fn col_bit(op: &PauliOp, k: usize) -> bool {
    let n = op.nqubits();
    if k < n {
        op.x_bit(k)
    } else if k < 2 * n {
        op.z_bit(k - n)
    } else {
        op.sign()
    }
}

/// Row-reduce to echelon form over GF(2), returning the reduced array along
/// with its bookkeeping matrix.
///
/// Columns are scanned left to right. For each, the first row at or below the
/// current pivot row with a 1 in that column is swapped into the pivot
/// position and multiplied into every other row with a 1 there.
pub fn bge_with_bookkeeping(arr: &StabArray) -> (StabArray, Bookkeeping) {
    let mut rows: Vec<PauliOp> = arr.rows.clone();
    let m = rows.len();
    let ncols = 2 * arr.n + 1;
    let mut bk: Bookkeeping = na::DMatrix::identity(m, m);
    let mut h: usize = 0;
    let mut k: usize = 0;
    while h < m && k < ncols {
        match (h..m).find(|i| col_bit(&rows[*i], k)) {
            None => { k += 1; },
            Some(i_max) => {
                rows.swap(h, i_max);
                bk.swap_rows(h, i_max);
                let pivot = rows[h].clone();
                for i in 0..m {
                    if i == h || !col_bit(&rows[i], k) { continue; }
                    rows[i].rowsum(&pivot);
                    for j in 0..m { bk[(i, j)] ^= bk[(h, j)]; }
                }
                h += 1;
                k += 1;
            },
        }
    }
    (StabArray::new_unchecked(arr.n, rows), bk)
}

/// Row-reduce to echelon form over GF(2).
pub fn bge(arr: &StabArray) -> StabArray { bge_with_bookkeeping(arr).0 }

/// Row-reduce and drop all trivial rows, also returning the bookkeeping matrix
/// of the elimination (whose rows for dropped operators are kept).
pub fn reduce_with_bookkeeping(arr: &StabArray) -> (StabArray, Bookkeeping) {
    let (reduced, bk) = bge_with_bookkeeping(arr);
    let rows = reduced.rows.into_iter().filter(|op| !op.is_trivial()).collect();
    (StabArray::new_unchecked(arr.n, rows), bk)
}

/// Row-reduce and drop all trivial rows.
pub fn reduce(arr: &StabArray) -> StabArray { reduce_with_bookkeeping(arr).0 }

/// Invert a bookkeeping matrix over GF(2), so that its rows express the
/// original rows as products of the reduced ones.
///
/// Fails if the matrix is not square or not invertible.
pub fn invert_bookkeeping_matrix(bk: &Bookkeeping) -> SimResult<Bookkeeping> {
    let m = bk.nrows();
    if bk.ncols() != m {
        return Err(CliffordError::InvalidValue(
            "A bookkeeping matrix must be square.".into()
        ));
    }
    let mut a: Bookkeeping = bk.map(|b| b & 1);
    let mut inv: Bookkeeping = na::DMatrix::identity(m, m);
    for c in 0..m {
        let p
            = (c..m).find(|r| a[(*r, c)] != 0)
            .ok_or_else(|| CliffordError::InvalidValue(
                "The bookkeeping matrix is not invertible over GF(2).".into()
            ))?;
        a.swap_rows(c, p);
        inv.swap_rows(c, p);
        for r in 0..m {
            if r == c || a[(r, c)] == 0 { continue; }
            for j in 0..m {
                a[(r, j)] ^= a[(c, j)];
                inv[(r, j)] ^= inv[(c, j)];
            }
        }
    }
    Ok(inv)
}

/// `true` if both arrays act on the same number of qubits and generate the
/// same signed group, i.e. have bit-identical reduced forms.
pub fn equivalent(a: &StabArray, b: &StabArray) -> bool {
    a.n == b.n && reduce(a).rows == reduce(b).rows
}

/// Concatenate two or more arrays into one.
///
/// Fails if fewer than two arrays are given, if they act on different numbers
/// of qubits, or if operators from different arrays anticommute.
pub fn merge_stabarrays(arrs: &[StabArray]) -> SimResult<StabArray> {
    if arrs.len() < 2 {
        return Err(CliffordError::InvalidValue(
            "At least two StabArrays are needed to merge them.".into()
        ));
    }
    if arrs.iter().any(|arr| arr.n != arrs[0].n) {
        return Err(CliffordError::InvalidValue(
            "The StabArrays should have the same number of qubits.".into()
        ));
    }
    let clash
        = arrs.iter().tuple_combinations()
        .any(|(a, b)| {
            a.iter().cartesian_product(b.iter())
                .any(|(p, q)| p.anticommutes_with(q))
        });
    if clash {
        return Err(CliffordError::AntiCommutation(
            "The StabArrays should only contain commuting operators.".into()
        ));
    }
    let rows = arrs.iter().flat_map(|arr| arr.rows.iter().cloned()).collect();
    Ok(StabArray::new_unchecked(arrs[0].n, rows))
}

// GF(2) rank of the Pauli parts (signs ignored) of a set of rows
fn symplectic_rank(rows: &[PauliOp]) -> usize {
    let Some(n) = rows.first().map(|op| op.nqubits()) else { return 0; };
    let mut rows: Vec<PauliOp> = rows.to_vec();
    let m = rows.len();
    let mut rank: usize = 0;
    for k in 0..2 * n {
        if rank == m { break; }
        if let Some(p) = (rank..m).find(|i| col_bit(&rows[*i], k)) {
            rows.swap(rank, p);
            let pivot = rows[rank].clone();
            for row in rows.iter_mut().skip(rank + 1) {
                if col_bit(row, k) { row.xor_assign(&pivot); }
            }
            rank += 1;
        }
    }
    rank
}

/// `true` if the rows, all acting on `n` qubits, are exactly 2*n* independent
/// operators and hence generate the full *n*-qubit Pauli group.
pub fn tableau_generates_pauli_group(rows: &[PauliOp]) -> bool {
    let n = rows.first().map(|op| op.nqubits()).unwrap_or(0);
    rows.len() == 2 * n
        && rows.iter().all(|op| op.nqubits() == n)
        && symplectic_rank(rows) == 2 * n
}

/// `true` if a raw 2*n* × (2*n* + 1) bit matrix (destabilizers first) is a
/// valid tableau: it generates the full Pauli group and its stabilizer half
/// pairwise commutes.
pub fn is_tableau_valid<R>(bits: &[R]) -> bool
where R: AsRef<[u8]>
{
    let Ok(rows)
        = bits.iter()
        .map(|row| PauliOp::from_bits(row.as_ref()))
        .collect::<SimResult<Vec<PauliOp>>>()
        else { return false; };
    rows_form_valid_tableau(&rows)
}

pub(crate) fn rows_form_valid_tableau(rows: &[PauliOp]) -> bool {
    let n = rows.len() / 2;
    rows.iter().all(|op| op.nqubits() == n)
        && tableau_generates_pauli_group(rows)
        && rows[n..].iter().tuple_combinations()
            .all(|(a, b)| a.commutes_with(b))
}

/// `true` if `op`, sign included, belongs to the group generated by `arr`.
pub fn is_subset_of_stabarray(op: &PauliOp, arr: &StabArray) -> bool {
    if op.nqubits() != arr.n || arr.iter().any(|s| s.anticommutes_with(op)) {
        return false;
    }
    let mut rows = arr.rows.clone();
    rows.push(op.clone());
    let extended = StabArray::new_unchecked(arr.n, rows);
    reduce(&extended).nstabs() == reduce(arr).nstabs()
}

const ANTICOMMUTING_PAIRS: [(Pauli, Pauli); 6] = [
    (Pauli::X, Pauli::Z),
    (Pauli::X, Pauli::Y),
    (Pauli::Z, Pauli::X),
    (Pauli::Z, Pauli::Y),
    (Pauli::Y, Pauli::X),
    (Pauli::Y, Pauli::Z),
];

/// Construct a destabilizer array for a full, irreducible stabilizer array.
///
/// The returned operators `d` satisfy: `d[i]` anticommutes with `stabs[i]` and
/// commutes with every other stabilizer, and `d` together with `stabs`
/// generates the full Pauli group. Any operators in `partial` (each of which
/// must anticommute with exactly one stabilizer, all of them distinct) are
/// kept verbatim at the index of the stabilizer they anticommute with.
///
/// The destabilizers are not guaranteed to commute among themselves.
pub fn find_destabilizers(stabs: &StabArray, partial: &[PauliOp])
    -> SimResult<Vec<PauliOp>>
{
    let n = stabs.n;
    let nrows = stabs.nstabs();
    let reduced = reduce(stabs);
    if reduced.nstabs() != nrows {
        return Err(CliffordError::InvalidValue(
            "The StabArray should correspond to an irreducible set of \
            stabilizers.".into()
        ));
    }
    if nrows != n {
        return Err(CliffordError::InvalidValue(format!(
            "The StabArray should describe a full state, i.e. the number of \
            stabilizers ({}) should be equal to the number of qubits ({}).",
            nrows, n,
        )));
    }
    if partial.iter().any(|d| d.nqubits() != n) {
        return Err(CliffordError::InvalidValue(
            "The partial destabilizer array must have the same number of qubits \
            as the stabilizer array.".into()
        ));
    }
    let mut partial_idx: Vec<usize> = Vec::with_capacity(partial.len());
    for d in partial.iter() {
        let hits: Vec<usize>
            = stabs.iter().enumerate()
            .filter_map(|(i, s)| d.anticommutes_with(s).then_some(i))
            .collect();
        match hits[..] {
            [i] => { partial_idx.push(i); },
            _ => {
                return Err(CliffordError::InvalidValue(
                    "Each operator of the partial destabilizer array must \
                    anti-commute with exactly one stabilizer.".into()
                ));
            },
        }
    }
    if partial_idx.iter().duplicates().next().is_some() {
        return Err(CliffordError::InvalidValue(
            "Each operator of the partial destabilizer array must anti-commute \
            with a different stabilizer.".into()
        ));
    }

    // leading column of each reduced row; a pivot in the sign column means
    // the rows only generate the group up to sign
    let char_idx: Vec<usize>
        = reduced.iter()
        .map(|op| (0..2 * n + 1).find(|k| col_bit(op, *k)).unwrap_or(2 * n))
        .collect();
    if char_idx.iter().any(|k| *k >= 2 * n) {
        return Err(CliffordError::InvalidValue(
            "The StabArray should correspond to an irreducible set of \
            stabilizers.".into()
        ));
    }

    // seed one single-qubit Pauli per leftover column
    let leftover: Vec<usize>
        = (0..2 * n).filter(|k| !char_idx.contains(k)).collect();
    let mut d: Vec<PauliOp> = vec![PauliOp::identity(n); nrows];
    for (row, col) in leftover.iter().enumerate() {
        if *col < n {
            d[row].set(*col, Pauli::X);
        } else {
            d[row].set(*col - n, Pauli::Z);
        }
    }
    let row_qubit: Vec<usize> = leftover.iter().map(|col| col % n).collect();
    let doubly: Vec<(usize, usize)>
        = (0..n)
        .filter_map(|q| {
            let rows: Vec<usize>
                = row_qubit.iter().positions(|rq| *rq == q).collect();
            match rows[..] {
                [r1, r2] => Some((r1, r2)),
                _ => None,
            }
        })
        .collect();
    let unindexed: Vec<usize>
        = (0..n).filter(|q| !row_qubit.contains(q)).collect();
    if doubly.len() != unindexed.len() {
        return Err(CliffordError::InvalidValue(
            "The StabArray should correspond to an irreducible set of \
            stabilizers.".into()
        ));
    }

    // make the two rows seeded on each doubly indexed qubit commute through an
    // unindexed one, keeping the first choice that still spans the group
    for (q, (r1, r2)) in unindexed.into_iter().zip(doubly) {
        for (p1, p2) in ANTICOMMUTING_PAIRS {
            d[r1].set(q, p1);
            d[r2].set(q, p2);
            let spans
                = tableau_generates_pauli_group(
                    &d.iter().chain(stabs.iter()).cloned().collect::<Vec<_>>());
            if spans { break; }
        }
    }

    // enforce {d_i, s_i} = 0 and [d_j, s_i] = 0 for j != i
    for i in 0..nrows {
        let s = &stabs.rows[i];
        let mut anti: Vec<usize>
            = (0..nrows).filter(|j| d[*j].anticommutes_with(s)).collect();
        if let Some(pos) = anti.iter().position(|j| *j == i) {
            anti.remove(pos);
        } else {
            let pos
                = anti.iter().position(|j| *j > i)
                .ok_or_else(|| CliffordError::InvalidValue(format!(
                    "No destabilizer can be paired with stabilizer {}", s
                )))?;
            let j_swap = anti.remove(pos);
            d.swap(i, j_swap);
        }
        let di = d[i].clone();
        anti.into_iter().for_each(|j| { d[j].xor_assign(&di); });
    }

    // splice in the partial destabilizers, then repair the rows they break
    if !partial.is_empty() {
        for (op, idx) in partial.iter().zip(&partial_idx) {
            d[*idx] = op.clone();
        }
        for i in (0..nrows).filter(|i| !partial_idx.contains(i)) {
            for j in 0..nrows {
                if d[i].anticommutes_with(&d[j]) {
                    d[i].xor_assign(&stabs.rows[j]);
                }
            }
        }
    }
    Ok(d)
}
