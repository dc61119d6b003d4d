//! Pseudo-random numbers and restart sequences, shared by the solver
//! and the discovery pass.

/// Finite subsequences of the Luby-sequence:
///
/// > 0: 1
/// > 1: 1 1 2
/// > 2: 1 1 2 1 1 2 4
/// > 3: 1 1 2 1 1 2 4 1 1 2 1 1 2 4 8
/// ...
pub(crate) fn luby(y: f64, mut x: i32) -> f64 {
    // Find the finite subsequence that contains index 'x', and the
    // size of that subsequence:
    let mut size = 1;
    let mut seq = 0;
    while size < x + 1 {
        seq += 1;
        size = 2 * size + 1;
    }

    while size - 1 != x {
        size = (size - 1) >> 1;
        seq -= 1;
        x %= size;
    }

    f64::powi(y, seq)
}

/// Generate a random double in `[0, 1)`:
pub(crate) fn drand(seed: &mut f64) -> f64 {
    *seed *= 1389796.0;
    let q = (*seed / 2147483647.0) as i32;
    *seed -= q as f64 * 2147483647.0;
    *seed / 2147483647.0
}

/// Generate a random integer in `[0, size)`:
pub(crate) fn irand(seed: &mut f64, size: i32) -> i32 {
    (drand(seed) * size as f64) as i32
}

/// Fisher-Yates shuffle driven by `drand`.
pub(crate) fn shuffle<T>(v: &mut [T], seed: &mut f64) {
    for i in (1..v.len()).rev() {
        let j = irand(seed, i as i32 + 1) as usize;
        v.swap(i, j);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_luby() {
        let seq: Vec<f64> = (0..7).map(|i| luby(2.0, i)).collect();
        assert_eq!(seq, vec![1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_irand_range() {
        let mut seed = 91648253.0;
        for _ in 0..1000 {
            let x = irand(&mut seed, 7);
            assert!(x >= 0 && x < 7);
        }
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut seed = 42.0;
        let mut v: Vec<u32> = (0..20).collect();
        shuffle(&mut v, &mut seed);
        let mut sorted = v.clone();
        sorted.sort();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());

        let mut seed2 = 42.0;
        let mut w: Vec<u32> = (0..20).collect();
        shuffle(&mut w, &mut seed2);
        assert_eq!(v, w, "same seed, same order");
    }
}
