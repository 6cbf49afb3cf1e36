/// Squared Euclidean distance. Callers guarantee equal lengths.
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_l2_basics() {
        assert_eq!(squared_l2(&[1.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((squared_l2(&[1.0, 0.0], &[0.9, 0.1]) - 0.02).abs() < 1e-6);
        assert_eq!(squared_l2(&[0.0, 0.0, 0.0], &[1.0, 2.0, 2.0]), 9.0);
    }
}
