/// Euclidean norm of `v`, computed without overflow / underflow of the squares
///
/// The components are divided by the largest magnitude before being squared and summed:
/// ```math
/// ||v|| = m \sqrt{\sum_i (v_i / m)^2}, \quad m = \max_i |v_i|
/// ```
#[must_use]
pub fn length_robust(v: &[f64]) -> f64 {
    let max = v.iter().fold(0.0_f64, |m, &x| m.max(x.abs()));
    if max == 0.0 {
        return 0.0;
    }
    let sum = v
        .iter()
        .map(|&x| {
            let r = x / max;
            r * r
        })
        .sum::<f64>();
    max * sum.sqrt()
}

/// Return the permutation `perm` such that `keys[perm[0]] >= keys[perm[1]] >= ...`
///
/// The sort is stable: equal keys keep their input order.
#[must_use]
pub fn sort_descending_with_permutation(keys: &[f64]) -> Vec<usize> {
    let mut perm = (0..keys.len()).collect::<Vec<_>>();
    perm.sort_by(|&i, &j| keys[j].total_cmp(&keys[i]));
    perm
}

/// Inverse of a permutation: `inv[perm[i]] = i`
#[must_use]
pub fn invert_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (i, &j) in perm.iter().enumerate() {
        inv[j] = i;
    }
    inv
}
