/*****************************************************************************************[gbc/marks.rs]
Copyright (c) 2026, gbcsat contributors

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

//! Per-literal marks, cleared in O(1) by bumping an epoch.

use crate::clause::Lit;

/// A mark table indexed by literal.
///
/// A literal is marked iff its stamp equals the current epoch. Marks can
/// only be set through a [`MarkScope`], and dropping the scope clears them.
#[derive(Debug)]
pub(crate) struct MarkStore {
    stamps: Vec<u32>,
    epoch: u32,
}

/// Marks that live as long as this guard.
pub(crate) struct MarkScope<'a> {
    store: &'a mut MarkStore,
}

impl MarkStore {
    pub(crate) fn new() -> Self {
        MarkStore {
            stamps: Vec::new(),
            epoch: 1,
        }
    }

    /// Open a marking scope. All marks are released when it is dropped.
    pub(crate) fn scope(&mut self) -> MarkScope {
        MarkScope { store: self }
    }

    /// No literal is marked.
    pub(crate) fn is_clear(&self) -> bool {
        self.stamps.iter().all(|&s| s != self.epoch)
    }

    fn release(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            // stamps from 2^32 epochs ago would look fresh
            for s in self.stamps.iter_mut() {
                *s = 0;
            }
            self.epoch = 1;
        }
    }
}

impl<'a> MarkScope<'a> {
    #[inline]
    pub(crate) fn is_marked(&self, lit: Lit) -> bool {
        self.store
            .stamps
            .get(lit.idx() as usize)
            .map_or(false, |&s| s == self.store.epoch)
    }

    /// Mark `lit`. Returns `false` if it was already marked.
    #[inline]
    pub(crate) fn mark(&mut self, lit: Lit) -> bool {
        let i = lit.idx() as usize;
        if i >= self.store.stamps.len() {
            self.store.stamps.resize(i + 1, 0);
        }
        let epoch = self.store.epoch;
        let s = &mut self.store.stamps[i];
        if *s == epoch {
            false
        } else {
            *s = epoch;
            true
        }
    }
}

impl<'a> Drop for MarkScope<'a> {
    fn drop(&mut self) {
        self.store.release();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_marks_released() {
        let l1 = Lit::from_dimacs(3);
        let l2 = Lit::from_dimacs(-3);
        let mut store = MarkStore::new();
        {
            let mut m = store.scope();
            assert!(m.mark(l1));
            assert!(!m.mark(l1));
            assert!(m.is_marked(l1));
            assert!(!m.is_marked(l2));
        }
        assert!(store.is_clear());
        let m = store.scope();
        assert!(!m.is_marked(l1));
    }

    #[test]
    fn test_released_on_early_exit() {
        fn find_dup(store: &mut MarkStore, lits: &[Lit]) -> Option<Lit> {
            let mut m = store.scope();
            for &l in lits {
                if !m.mark(l) {
                    return Some(l);
                }
            }
            None
        }
        let mut store = MarkStore::new();
        let lits: Vec<Lit> = [1, 2, 1, 5].iter().map(|&i| Lit::from_dimacs(i)).collect();
        assert_eq!(find_dup(&mut store, &lits), Some(Lit::from_dimacs(1)));
        assert!(store.is_clear());
    }

    #[test]
    fn test_epoch_wraparound() {
        let mut store = MarkStore::new();
        store.epoch = u32::MAX;
        {
            let mut m = store.scope();
            m.mark(Lit::from_dimacs(1));
        }
        assert_eq!(store.epoch, 1);
        assert!(store.is_clear());
    }
}
