/*****************************************************************************************[intmap.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2011, Niklas Sorensson (MiniSat)
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

use bit_vec::BitVec;
use std::cmp;
use std::iter;
use std::marker::PhantomData;
use std::ops;

/// Keys that map densely onto `0..n`
pub trait AsIndex: Copy {
    fn as_index(self) -> usize;
    fn from_index(index: usize) -> Self;
}

/// Dense map from `K` to `V`, backed by a vector
#[derive(Debug, Clone)]
pub struct IntMap<K: AsIndex, V> {
    map: Vec<V>,
    _marker: PhantomData<fn(K)>, // contravariance
}

impl<K: AsIndex, V> Default for IntMap<K, V> {
    fn default() -> Self {
        Self {
            map: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<K: AsIndex, V> IntMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }
    #[inline]
    pub fn has(&self, k: K) -> bool {
        k.as_index() < self.map.len()
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }
    pub fn reserve(&mut self, key: K, pad: V)
    where
        V: Clone,
    {
        let index = key.as_index();
        if index >= self.map.len() {
            self.map.resize(index + 1, pad);
        }
    }
    pub fn reserve_default(&mut self, key: K)
    where
        V: Default,
    {
        let index = key.as_index();
        if index >= self.map.len() {
            let len = index + 1 - self.map.len();
            self.map.extend((0..len).map(|_| V::default()));
        }
    }
    pub fn insert_default(&mut self, key: K, val: V)
    where
        V: Default,
    {
        self.reserve_default(key);
        self[key] = val;
    }

    /// Value at `k`, if `k` has been reserved
    #[inline]
    pub fn get(&self, k: K) -> Option<&V> {
        self.map.get(k.as_index())
    }

    /// Clear content, keep internal buffers. Does not allocate.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn iter(&self) -> impl iter::Iterator<Item = (K, &V)> {
        self.map
            .iter()
            .enumerate()
            .map(|(k, v)| (K::from_index(k), v))
    }
    pub fn iter_mut(&mut self) -> impl iter::Iterator<Item = (K, &mut V)> {
        self.map
            .iter_mut()
            .enumerate()
            .map(|(k, v)| (K::from_index(k), v))
    }
}

impl<K: AsIndex, V> ops::Index<K> for IntMap<K, V> {
    type Output = V;
    #[inline]
    fn index(&self, index: K) -> &Self::Output {
        &self.map[index.as_index()]
    }
}
impl<K: AsIndex, V> ops::IndexMut<K> for IntMap<K, V> {
    #[inline]
    fn index_mut(&mut self, index: K) -> &mut Self::Output {
        &mut self.map[index.as_index()]
    }
}

/// Dense set of keys, one bit per key
#[derive(Debug, Clone)]
pub struct IntMapBool<K: AsIndex> {
    map: BitVec,
    _marker: PhantomData<fn(K)>, // contravariance
}

impl<K: AsIndex> Default for IntMapBool<K> {
    fn default() -> Self {
        IntMapBool::new()
    }
}

impl<K: AsIndex> ops::Index<K> for IntMapBool<K> {
    type Output = bool;
    #[inline]
    fn index(&self, index: K) -> &Self::Output {
        &self.map[index.as_index()]
    }
}

impl<K: AsIndex> IntMapBool<K> {
    pub fn new() -> Self {
        Self {
            map: BitVec::new(),
            _marker: PhantomData::default(),
        }
    }
    #[inline]
    pub fn has(&self, k: K) -> bool {
        k.as_index() < self.map.len()
    }
    #[inline]
    pub fn set(&mut self, k: K, b: bool) {
        self.map.set(k.as_index(), b);
    }
    pub fn reserve(&mut self, key: K) {
        let index = key.as_index();
        let len = self.map.len();
        if index >= len {
            self.map.grow(index - len + 1, false);
        }
    }
    #[inline]
    pub fn insert(&mut self, key: K) {
        self.reserve(key);
        self.map.set(key.as_index(), true);
    }
}

/// Storage for a binary heap over keys `K`; the ordering is supplied
/// when the heap is promoted to a `Heap`.
#[derive(Debug, Clone)]
pub struct HeapData<K: AsIndex> {
    heap: Vec<K>,
    indices: IntMap<K, i32>,
}

impl<K: AsIndex> Default for HeapData<K> {
    fn default() -> Self {
        Self {
            heap: Vec::new(),
            indices: IntMap::new(),
        }
    }
}

impl<K: AsIndex> HeapData<K> {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.heap.len()
    }
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    pub fn in_heap(&self, k: K) -> bool {
        self.indices.has(k) && self.indices[k] >= 0
    }

    pub fn promote<Comp: Comparator<K>>(&mut self, comp: Comp) -> Heap<K, Comp> {
        Heap { data: self, comp }
    }
}

impl<K: AsIndex> ops::Index<usize> for HeapData<K> {
    type Output = K;
    fn index(&self, index: usize) -> &Self::Output {
        &self.heap[index]
    }
}

pub trait Comparator<T: ?Sized> {
    fn cmp(&self, lhs: &T, rhs: &T) -> cmp::Ordering;
    fn lt(&self, lhs: &T, rhs: &T) -> bool {
        self.cmp(lhs, rhs) == cmp::Ordering::Less
    }
}

/// A min-heap view over some `HeapData`
#[derive(Debug)]
pub struct Heap<'a, K: AsIndex + 'a, Comp: Comparator<K>> {
    data: &'a mut HeapData<K>,
    comp: Comp,
}

impl<'a, K: AsIndex + 'a, Comp: Comparator<K>> ops::Deref for Heap<'a, K, Comp> {
    type Target = HeapData<K>;
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
impl<'a, K: AsIndex + 'a, Comp: Comparator<K>> ops::DerefMut for Heap<'a, K, Comp> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl<'a, K: AsIndex + 'a, Comp: Comparator<K>> Heap<'a, K, Comp> {
    fn percolate_up(&mut self, mut i: u32) {
        let x = self.heap[i as usize];
        let mut p = parent_index(i);

        while i != 0 && self.comp.lt(&x, &self.heap[p as usize]) {
            let moved = self.heap[p as usize];
            self.heap[i as usize] = moved;
            self.indices[moved] = i as i32;
            i = p;
            p = parent_index(p);
        }
        self.heap[i as usize] = x;
        self.indices[x] = i as i32;
    }

    fn percolate_down(&mut self, mut i: u32) {
        let x = self.heap[i as usize];
        let n = self.heap.len();
        while (left_index(i) as usize) < n {
            let (l, r) = (left_index(i), right_index(i));
            let child = if (r as usize) < n
                && self.comp.lt(&self.heap[r as usize], &self.heap[l as usize])
            {
                r
            } else {
                l
            };
            if !self.comp.lt(&self.heap[child as usize], &x) {
                break;
            }
            let moved = self.heap[child as usize];
            self.heap[i as usize] = moved;
            self.indices[moved] = i as i32;
            i = child;
        }
        self.heap[i as usize] = x;
        self.indices[x] = i as i32;
    }

    /// `k`'s key decreased, move it up
    pub fn decrease(&mut self, k: K) {
        debug_assert!(self.in_heap(k));
        let k_index = self.indices[k];
        self.percolate_up(k_index as u32);
    }

    pub fn insert(&mut self, k: K) {
        self.indices.reserve(k, -1);
        debug_assert!(!self.in_heap(k));

        self.indices[k] = self.heap.len() as i32;
        self.heap.push(k);
        let k_index = self.indices[k];
        self.percolate_up(k_index as u32);
    }

    /// Remove and return the smallest element.
    ///
    /// Panics if the heap is empty.
    pub fn remove_min(&mut self) -> K {
        let x = *self.heap.first().expect("heap is empty");
        let lastval = *self.heap.last().expect("heap is empty");
        self.heap[0] = lastval;
        self.indices[lastval] = 0;
        self.indices[x] = -1;
        self.heap.pop();
        if self.heap.len() > 1 {
            self.percolate_down(0);
        }
        x
    }

    /// Rebuild the heap from scratch, using the elements in 'ns':
    pub fn build(&mut self, ns: &[K]) {
        {
            let data = &mut self.data;
            for &x in &data.heap {
                data.indices[x] = -1;
            }
        }
        self.heap.clear();

        for (i, &x) in ns.iter().enumerate() {
            self.indices.reserve(x, -1);
            self.indices[x] = i as i32;
            self.heap.push(x);
        }

        let mut i = self.heap.len() as i32 / 2 - 1;
        while i >= 0 {
            self.percolate_down(i as u32);
            i -= 1;
        }
    }
}

#[inline(always)]
fn left_index(i: u32) -> u32 {
    i * 2 + 1
}
#[inline(always)]
fn right_index(i: u32) -> u32 {
    (i + 1) * 2
}
#[inline(always)]
fn parent_index(i: u32) -> u32 {
    (i.wrapping_sub(1)) >> 1
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clause::Var;

    struct ByWeight<'a>(&'a IntMap<Var, u32>);

    impl<'a> Comparator<Var> for ByWeight<'a> {
        fn cmp(&self, a: &Var, b: &Var) -> cmp::Ordering {
            self.0[*a].cmp(&self.0[*b])
        }
    }

    #[test]
    fn test_heap_order() {
        let mut w: IntMap<Var, u32> = IntMap::new();
        let weights = [5, 3, 9, 1, 7, 3];
        for (i, &x) in weights.iter().enumerate() {
            w.insert_default(Var::from_idx(i as u32), x);
        }
        let mut data = HeapData::new();
        {
            let mut h = data.promote(ByWeight(&w));
            for i in 0..weights.len() {
                h.insert(Var::from_idx(i as u32));
            }
        }
        assert_eq!(data.len(), weights.len());
        let mut out = vec![];
        {
            let mut h = data.promote(ByWeight(&w));
            while !h.is_empty() {
                out.push(w[h.remove_min()]);
            }
        }
        assert_eq!(out, vec![1, 3, 3, 5, 7, 9]);
        assert!(!data.in_heap(Var::from_idx(0)));
    }

    #[test]
    fn test_heap_build_and_decrease() {
        let mut w: IntMap<Var, u32> = IntMap::new();
        for i in 0..4 {
            w.insert_default(Var::from_idx(i), 10 + i);
        }
        let vars: Vec<Var> = (0..4).map(Var::from_idx).collect();
        let mut data = HeapData::new();
        data.promote(ByWeight(&w)).build(&vars);
        w[Var::from_idx(3)] = 0;
        let mut h = data.promote(ByWeight(&w));
        h.decrease(Var::from_idx(3));
        assert_eq!(h.remove_min(), Var::from_idx(3));
        assert_eq!(h.remove_min(), Var::from_idx(0));
    }

    #[test]
    fn test_intmap_bool() {
        let mut m: IntMapBool<Var> = IntMapBool::new();
        m.insert(Var::from_idx(9));
        assert!(m.has(Var::from_idx(3)));
        assert!(!m[Var::from_idx(3)]);
        assert!(m[Var::from_idx(9)]);
        m.set(Var::from_idx(9), false);
        assert!(!m[Var::from_idx(9)]);
    }
}
