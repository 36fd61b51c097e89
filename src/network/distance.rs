/// Index distance between positions `a` and `b` on a ring of `n` positions.
#[must_use]
pub fn circle_distance(a: usize, b: usize, n: usize) -> usize {
    let d = a.abs_diff(b) % n.max(1);
    d.min(n - d)
}

/// Euclidean distance between two cells of a periodic `rows x cols` lattice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn square_distance(a: (usize, usize), b: (usize, usize), rows: usize, cols: usize) -> f64 {
    let x = circle_distance(a.0, b.0, rows) as f64;
    let y = circle_distance(a.1, b.1, cols) as f64;
    x.hypot(y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_distance_wraps() {
        assert_eq!(circle_distance(0, 1, 10), 1);
        assert_eq!(circle_distance(0, 9, 10), 1);
        assert_eq!(circle_distance(2, 7, 10), 5);
        assert_eq!(circle_distance(8, 3, 10), 5);
        assert_eq!(circle_distance(4, 4, 10), 0);
    }

    #[test]
    fn square_distance_wraps() {
        assert!((square_distance((0, 0), (0, 1), 4, 4) - 1.0).abs() < 1e-12);
        assert!((square_distance((0, 0), (3, 0), 4, 4) - 1.0).abs() < 1e-12);
        assert!((square_distance((0, 0), (1, 1), 4, 4) - 2f64.sqrt()).abs() < 1e-12);
    }
}
