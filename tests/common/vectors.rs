use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate `n` random vectors of dimension `dims` with uniform f32 values in [-1, 1].
pub fn random_vectors(n: usize, dims: usize) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n)
        .map(|_| (0..dims).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

/// `n` vectors of dimension `dims` whose components all equal `value`.
/// Keeps expected wire lines easy to build by hand.
pub fn constant_vectors(n: usize, dims: usize, value: f32) -> Vec<Vec<f32>> {
    vec![vec![value; dims]; n]
}

/// Expected `WRITE` line for `count` vectors of dimension 1 holding `1.0`.
pub fn write_line_of_ones(count: usize) -> String {
    let mut line = String::from("WRITE");
    for _ in 0..count {
        line.push_str(" [1]");
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_vectors() {
        let vecs = random_vectors(10, 128);
        assert_eq!(vecs.len(), 10);
        assert_eq!(vecs[0].len(), 128);
        assert!(vecs.iter().flatten().all(|v| (-1.0..1.0).contains(v)));
    }

    #[test]
    fn test_write_line_of_ones() {
        assert_eq!(write_line_of_ones(2), "WRITE [1] [1]\n");
    }
}
