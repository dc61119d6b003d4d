/*****************************************************************************************[clause.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use {
    crate::intmap::{AsIndex, IntMap, IntMapBool},
    std::{fmt, mem, ops, u32},
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var(u32);

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == !0 {
            write!(f, "UNDEF")
        } else {
            write!(f, "{}", self.0 + 1)
        }
    }
}

impl Var {
    pub const UNDEF: Var = Var(!0);
    #[inline(always)]
    pub(crate) fn from_idx(idx: u32) -> Self {
        debug_assert!(idx < u32::MAX / 2, "Var::from_idx: index too large");
        Var(idx)
    }
    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.0
    }

    /// Variable with DIMACS number `v` (starting at 1).
    #[inline]
    pub fn from_dimacs(v: u32) -> Self {
        debug_assert!(v > 0, "Var::from_dimacs: variables start at 1");
        Var::from_idx(v - 1)
    }
}

impl AsIndex for Var {
    fn as_index(self) -> usize {
        self.0 as usize
    }
    fn from_index(index: usize) -> Self {
        Var(index as u32)
    }
}

pub type VMap<V> = IntMap<Var, V>;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Lit(u32);

impl Lit {
    pub const UNDEF: Lit = Lit(!1);
    pub const ERROR: Lit = Lit(!0);

    #[inline(always)]
    pub fn new(var: Var, sign: bool) -> Self {
        Lit(var.0 * 2 + (!sign) as u32)
    }
    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.0
    }
    #[inline(always)]
    pub fn sign(&self) -> bool {
        (self.0 & 1) == 0
    }
    #[inline(always)]
    pub fn var(&self) -> Var {
        Var(self.0 >> 1)
    }

    /// `lit.apply_sign(b)` keeps the same sign if `b==true`, flips sign otherwise
    ///
    /// ```
    /// use gbcsat::*;
    /// let mut sat = BasicSolver::default();
    /// let lit1 = Lit::new(sat.new_var_default(), true);
    /// assert_eq!(lit1, lit1.apply_sign(true));
    /// assert_eq!(!lit1, lit1.apply_sign(false));
    /// ```
    #[inline(always)]
    pub fn apply_sign(&self, sign: bool) -> Lit {
        if sign {
            *self
        } else {
            !*self
        }
    }

    /// Literal from a signed, non-zero DIMACS integer.
    ///
    /// ```
    /// use gbcsat::Lit;
    /// let l = Lit::from_dimacs(-3);
    /// assert!(!l.sign());
    /// assert_eq!(l.var().idx(), 2);
    /// assert_eq!(l.to_dimacs(), -3);
    /// ```
    #[inline]
    pub fn from_dimacs(i: i32) -> Self {
        debug_assert_ne!(i, 0, "0 is not a literal");
        Lit::new(Var::from_dimacs(i.unsigned_abs()), i > 0)
    }

    /// Signed DIMACS integer for this literal.
    #[inline]
    pub fn to_dimacs(&self) -> i32 {
        let v = (self.var().idx() + 1) as i32;
        if self.sign() {
            v
        } else {
            -v
        }
    }
}

impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == !0 {
            write!(f, "ERROR")
        } else if self.0 == !1 {
            write!(f, "UNDEF")
        } else {
            write!(f, "{}{:?}", if self.sign() { "" } else { "-" }, self.var())
        }
    }
}

impl ops::Not for Lit {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        Lit(self.0 ^ 1)
    }
}
impl ops::BitXor<bool> for Lit {
    type Output = Self;
    fn bitxor(self, rhs: bool) -> Self {
        Lit(self.0 ^ rhs as u32)
    }
}

impl AsIndex for Lit {
    #[inline(always)]
    fn as_index(self) -> usize {
        self.0 as usize
    }
    #[inline(always)]
    fn from_index(index: usize) -> Self {
        Lit(index as u32)
    }
}

pub type LMap<V> = IntMap<Lit, V>;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy)]
/// A ternary boolean (true, false, undefined) used for partial assignments.
pub struct lbool(u8);

impl fmt::Debug for lbool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == 0 {
            write!(f, "TRUE")
        } else if self.0 == 1 {
            write!(f, "FALSE")
        } else if self.0 <= 3 {
            write!(f, "UNDEF")
        } else {
            // unreachable
            write!(f, "lbool({})", self.0)
        }
    }
}
impl Default for lbool {
    fn default() -> Self {
        lbool(0)
    }
}

impl lbool {
    pub const TRUE: lbool = lbool(0);
    pub const FALSE: lbool = lbool(1);
    pub const UNDEF: lbool = lbool(2);
    pub fn from_u8(v: u8) -> Self {
        debug_assert!(v == (v & 3), "lbool::from_u8: invalid value");
        lbool(v)
    }
    #[inline(always)]
    pub fn new(v: bool) -> Self {
        lbool((!v) as u8)
    }
    #[inline(always)]
    pub fn to_u8(&self) -> u8 {
        self.0
    }
}

// from minisat:
// bool operator == (lbool b) const { return ((b.value&2) & (value&2)) | (!(b.value&2)&(value == b.value)); }
impl PartialEq for lbool {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.0 == rhs.0 || (self.0 & rhs.0 & 2) != 0
    }
}

impl Eq for lbool {}

impl ops::Neg for lbool {
    type Output = lbool;

    /// Negation of a `lbool`
    fn neg(self) -> Self {
        lbool(self.0 ^ 1)
    }
}

impl ops::BitXor<bool> for lbool {
    type Output = lbool;

    /// Xor of a lbool with a boolean.
    fn bitxor(self, rhs: bool) -> Self {
        lbool(self.0 ^ rhs as u8)
    }
}

impl From<bool> for lbool {
    fn from(x: bool) -> Self {
        if x {
            lbool::TRUE
        } else {
            lbool::FALSE
        }
    }
}

/// The source of a clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Axiom,
    Learnt,
    /// Globally blocked clause found by the discovery pass
    Gbc,
}

/// Anything that can be considered as a list of literals.
pub trait ClauseIterable: fmt::Debug {
    fn items(&self) -> &[Lit];
}

/// Any iterable clause can be printed in DIMACS
impl<T: ClauseIterable> display::Print for T {
    // display as DIMACS
    fn fmt_dimacs(&self, out: &mut fmt::Formatter) -> fmt::Result {
        for &lit in self.items().iter() {
            write!(out, "{} ", lit.to_dimacs())?;
        }
        write!(out, "0")?;
        Ok(())
    }
}

impl<'a> ClauseIterable for &'a [Lit] {
    fn items(&self) -> &[Lit] {
        self
    }
}

impl ClauseIterable for Vec<Lit> {
    fn items(&self) -> &[Lit] {
        self
    }
}

impl ClauseIterable for Clause {
    fn items(&self) -> &[Lit] {
        &self.lits
    }
}

/// A clause stored in the `ClauseAllocator`.
#[derive(Debug, Clone)]
pub(crate) struct Clause {
    lits: Vec<Lit>,
    kind: Kind,
    removed: bool,
    activity: f32,
    reloced: Option<CRef>,
}

impl Clause {
    #[inline(always)]
    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }
    #[inline(always)]
    pub fn lits_mut(&mut self) -> &mut [Lit] {
        &mut self.lits
    }
    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.lits.len() as u32
    }
    #[inline(always)]
    pub fn kind(&self) -> Kind {
        self.kind
    }
    #[inline(always)]
    pub fn learnt(&self) -> bool {
        self.kind == Kind::Learnt
    }
    #[inline(always)]
    pub fn removed(&self) -> bool {
        self.removed
    }
    #[inline(always)]
    pub fn reloced(&self) -> bool {
        self.reloced.is_some()
    }
    #[inline(always)]
    pub fn activity(&self) -> f32 {
        debug_assert!(self.learnt());
        self.activity
    }
    #[inline(always)]
    pub fn set_activity(&mut self, activity: f32) {
        debug_assert!(self.learnt());
        self.activity = activity;
    }
    #[inline(always)]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Lit> {
        self.lits.iter()
    }
    pub fn shrink(&mut self, new_size: u32) {
        debug_assert!(2 <= new_size);
        debug_assert!(new_size <= self.size());
        self.lits.truncate(new_size as usize);
    }

    /// Space used by this clause, in allocator units
    #[inline]
    fn units(&self) -> u32 {
        1 + self.size()
    }
}

impl ops::Index<u32> for Clause {
    type Output = Lit;
    #[inline(always)]
    fn index(&self, index: u32) -> &Self::Output {
        &self.lits[index as usize]
    }
}
impl ops::IndexMut<u32> for Clause {
    #[inline(always)]
    fn index_mut(&mut self, index: u32) -> &mut Self::Output {
        &mut self.lits[index as usize]
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
/// A reference to some clause in a `ClauseAllocator`
pub(crate) struct CRef(u32);

impl CRef {
    pub const UNDEF: CRef = CRef(!0);
}

#[derive(Debug)]
/// Main clause allocator. It stores clauses by index and keeps track of
/// how much space is taken by removed clauses, so that a collection
/// can be triggered.
pub struct ClauseAllocator {
    clauses: Vec<Clause>,
    len: u32,
    wasted: u32,
}

impl ClauseAllocator {
    pub const UNIT_SIZE: u32 = 32;
    pub fn with_start_cap(start_cap: u32) -> Self {
        Self {
            clauses: Vec::with_capacity(start_cap as usize / 4),
            len: 0,
            wasted: 0,
        }
    }
    pub fn new() -> Self {
        Self::with_start_cap(1024)
    }
    /// Used space, in units (one per literal plus one per clause)
    #[inline(always)]
    pub fn len(&self) -> u32 {
        self.len
    }
    pub fn wasted(&self) -> u32 {
        self.wasted
    }

    pub(crate) fn alloc(&mut self, lits: &[Lit], kind: Kind) -> CRef {
        let cr = CRef(self.clauses.len() as u32);
        let c = Clause {
            lits: lits.to_vec(),
            kind,
            removed: false,
            activity: 0.0,
            reloced: None,
        };
        self.len += c.units();
        self.clauses.push(c);
        cr
    }

    /// Mark `cr` as removed. Its literals stay readable until the next collection.
    pub(crate) fn free(&mut self, cr: CRef) {
        let c = &mut self.clauses[cr.0 as usize];
        debug_assert!(!c.removed);
        c.removed = true;
        self.wasted += c.units();
    }

    pub fn free_amount(&mut self, size: u32) {
        self.wasted += size;
    }

    /// Relocate clause `cr` into allocator `to`.
    ///
    /// post condition: `*cr` now contains the index of the copy in `to`
    pub(crate) fn reloc(&mut self, cr: &mut CRef, to: &mut ClauseAllocator) {
        let c = &mut self.clauses[cr.0 as usize];
        if let Some(new_cr) = c.reloced {
            *cr = new_cr;
            return;
        }
        let new_cr = CRef(to.clauses.len() as u32);
        let moved = Clause {
            lits: mem::take(&mut c.lits),
            kind: c.kind,
            removed: c.removed,
            activity: c.activity,
            reloced: None,
        };
        c.reloced = Some(new_cr);
        to.len += moved.units();
        to.clauses.push(moved);
        *cr = new_cr;
    }

    #[inline(always)]
    pub(crate) fn get_ref(&self, cr: CRef) -> &Clause {
        &self.clauses[cr.0 as usize]
    }

    #[inline(always)]
    pub(crate) fn get_mut(&mut self, cr: CRef) -> &mut Clause {
        &mut self.clauses[cr.0 as usize]
    }
}

/// Predicate that decides whether a value `V` is deleted or not
pub trait DeletePred<V> {
    fn deleted(&self, v: &V) -> bool;
}

pub type OccVec<V> = Vec<V>;

#[derive(Debug, Clone)]
/// List of occurrences of objects of type `K` (e.g. literals) in values
/// of type `V` (e.g. clauses)
pub struct OccListsData<K: AsIndex, V> {
    occs: IntMap<K, OccVec<V>>,
    dirty: IntMapBool<K>,
    dirties: Vec<K>, // to know what keys to examine in `clean_all_pred`
}

impl<K: AsIndex, V> OccListsData<K, V> {
    pub fn new() -> Self {
        Self {
            occs: IntMap::new(),
            dirty: IntMapBool::new(),
            dirties: Vec::new(),
        }
    }

    /// Initialize occurrence list for the given `idx`
    pub fn init(&mut self, idx: K) {
        self.occs.reserve_default(idx);
        self.occs[idx].clear();
        self.dirty.reserve(idx);
    }

    /// `oclist.lookup_mut_pred(idx, p)` returns an up-to-date list of occurrences
    /// for `idx`. It will clean up the occurrence list with `p` if it's dirty.
    pub fn lookup_mut_pred<P: DeletePred<V>>(&mut self, idx: K, pred: &P) -> &mut OccVec<V> {
        if self.dirty[idx] {
            self.clean_pred(idx, pred);
        }
        &mut self.occs[idx]
    }

    /// Cleanup entries marked as `dirty` (remove elements for which the predicate
    /// specifies they're deleted)
    pub fn clean_all_pred<P: DeletePred<V>>(&mut self, pred: &P) {
        for &x in &self.dirties {
            // Dirties may contain duplicates so check here if a variable is already cleaned:
            if self.dirty[x] {
                self.occs[x].retain(|x| !pred.deleted(x));
                self.dirty.set(x, false);
            }
        }
        self.dirties.clear();
    }

    /// Cleanup entry at `idx`
    pub fn clean_pred<P: DeletePred<V>>(&mut self, idx: K, pred: &P) {
        self.occs[idx].retain(|x| !pred.deleted(x));
        self.dirty.set(idx, false);
    }

    /// Mark index `K` as dirty, so it can be cleaned up later
    pub fn smudge(&mut self, idx: K) {
        if !self.dirty[idx] {
            self.dirty.insert(idx);
            self.dirties.push(idx);
        }
    }
}

impl<K: AsIndex, V> ops::Index<K> for OccListsData<K, V> {
    type Output = OccVec<V>;
    fn index(&self, index: K) -> &Self::Output {
        &self.occs[index]
    }
}
impl<K: AsIndex, V> ops::IndexMut<K> for OccListsData<K, V> {
    fn index_mut(&mut self, index: K) -> &mut Self::Output {
        &mut self.occs[index]
    }
}

/// Generic interface for objects printable in DIMACS
pub mod display {
    use std::fmt;

    /// Objects that can be printed in DIMACS syntax
    pub trait Print: Sized {
        fn fmt_dimacs(&self, out: &mut fmt::Formatter) -> fmt::Result;

        /// Any type implementing `T` can  be used in a format string by
        /// just using `x.pp_dimacs()` instead of `x`.
        ///
        /// ```
        /// use gbcsat::*;
        /// let v: Vec<Lit> = vec![Lit::from_dimacs(1), Lit::from_dimacs(-2)];
        /// assert_eq!(format!("{}", v.pp_dimacs()), "1 -2 0");
        /// ```
        fn pp_dimacs(&self) -> PrintWrapper<Self> {
            PrintWrapper(&self)
        }
    }

    /// A wrapper that can be used to display objects in format strings
    pub struct PrintWrapper<'a, T: 'a + Print>(&'a T);

    // Whenever `T` is printable in DIMACS, its wrapper implements Display
    impl<'a, T: Print> fmt::Display for PrintWrapper<'a, T> {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            self.0.fmt_dimacs(out)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_eq() {
        for i in 0..4 {
            let a = lbool::from_u8(i);
            for j in 0..4 {
                let b = lbool::from_u8(j);
                let are_eq = (i == 0 && j == 0) || (i == 1 && j == 1) || (i >= 2 && j >= 2);
                assert_eq!(are_eq, a == b, "{:?}[{}] == {:?}[{}]", a, i, b, j);
            }
        }
    }

    #[test]
    fn test_not() {
        assert_eq!(-lbool::TRUE, lbool::FALSE);
        assert_eq!(-lbool::FALSE, lbool::TRUE);
        assert_eq!(-lbool::UNDEF, lbool::UNDEF);
    }

    #[test]
    fn test_bitxor() {
        assert_eq!(lbool::TRUE ^ true, lbool::FALSE);
        assert_eq!(lbool::TRUE ^ false, lbool::TRUE);
        assert_eq!(lbool::FALSE ^ true, lbool::TRUE);
        assert_eq!(lbool::UNDEF ^ true, lbool::UNDEF);
    }

    #[test]
    fn test_dimacs_lits() {
        for &i in &[1, -1, 2, -7, 1000] {
            let lit = Lit::from_dimacs(i);
            assert_eq!(lit.to_dimacs(), i);
            assert_eq!(lit.sign(), i > 0);
            assert_eq!((!lit).to_dimacs(), -i);
        }
        assert_eq!(Lit::from_dimacs(4).var(), Var::from_dimacs(4));
        assert_eq!(format!("{:?}", Lit::from_dimacs(-4)), "-4");
    }

    #[test]
    fn test_reloc_keeps_lits() {
        let lits = |v: &[i32]| v.iter().map(|&i| Lit::from_dimacs(i)).collect::<Vec<_>>();
        let mut ca = ClauseAllocator::new();
        let c1 = ca.alloc(&lits(&[1, 2, 3]), Kind::Axiom);
        let c2 = ca.alloc(&lits(&[-1, 4]), Kind::Learnt);
        let mut c3 = ca.alloc(&lits(&[2, -4]), Kind::Gbc);
        assert_eq!(ca.len(), 10);
        ca.free(c1);
        assert_eq!(ca.wasted(), 4);
        assert_eq!(ca.get_ref(c1).lits(), &lits(&[1, 2, 3])[..]);

        let mut to = ClauseAllocator::new();
        let mut c2a = c2;
        let mut c2b = c2;
        ca.reloc(&mut c3, &mut to);
        ca.reloc(&mut c2a, &mut to);
        ca.reloc(&mut c2b, &mut to);
        assert_eq!(c2a, c2b, "second relocation follows the forward pointer");
        assert_eq!(to.len(), 6);
        assert_eq!(to.wasted(), 0);
        assert_eq!(to.get_ref(c3).lits(), &lits(&[2, -4])[..]);
        assert_eq!(to.get_ref(c3).kind(), Kind::Gbc);
        assert!(to.get_ref(c2a).learnt());
    }
}
