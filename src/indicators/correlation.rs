// =============================================================================
// Pairwise Pearson Correlation
// =============================================================================
//
// Each column is one symbol's close series aligned on a shared date index
// (missing days are `None`).  Every pair is correlated over the rows where
// both columns are present.
// =============================================================================

use crate::errors::{EngineError, EngineResult};

/// Square correlation matrix of `columns`.
///
/// An entry is `None` when the pair shares fewer than two rows or either side
/// has zero variance over the shared rows.  The diagonal follows the same rule
/// (a constant column has no defined self-correlation).
///
/// # Errors
/// `InvalidInput` when there are no columns or the columns differ in length.
pub fn correlation_matrix(columns: &[Vec<Option<f64>>]) -> EngineResult<Vec<Vec<Option<f64>>>> {
    let first = columns
        .first()
        .ok_or_else(|| EngineError::invalid("correlation: no columns"))?;
    if let Some(bad) = columns.iter().position(|c| c.len() != first.len()) {
        return Err(EngineError::invalid(format!(
            "correlation: column {bad} has length {}, expected {}",
            columns[bad].len(),
            first.len()
        )));
    }

    let n = columns.len();
    let mut matrix = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&columns[i], &columns[j]);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    Ok(matrix)
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(xs: &[f64]) -> Vec<Option<f64>> {
        xs.iter().map(|v| Some(*v)).collect()
    }

    #[test]
    fn perfectly_correlated_and_anti_correlated() {
        let a = col(&[1.0, 2.0, 3.0, 4.0]);
        let b = col(&[2.0, 4.0, 6.0, 8.0]);
        let c = col(&[4.0, 3.0, 2.0, 1.0]);
        let m = correlation_matrix(&[a, b, c]).unwrap();

        assert!((m[0][0].unwrap() - 1.0).abs() < 1e-12);
        assert!((m[0][1].unwrap() - 1.0).abs() < 1e-12);
        assert!((m[0][2].unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(m[1][2], m[2][1]);
    }

    #[test]
    fn missing_rows_are_skipped_pairwise() {
        let a = vec![Some(1.0), Some(2.0), None, Some(4.0)];
        let b = vec![Some(10.0), Some(20.0), Some(999.0), Some(40.0)];
        let m = correlation_matrix(&[a, b]).unwrap();
        assert!((m[0][1].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_has_no_correlation() {
        let m = correlation_matrix(&[col(&[5.0, 5.0, 5.0]), col(&[1.0, 2.0, 3.0])]).unwrap();
        assert_eq!(m[0][0], None);
        assert_eq!(m[0][1], None);
        assert!(m[1][1].is_some());
    }

    #[test]
    fn too_few_shared_rows() {
        let a = vec![Some(1.0), None];
        let b = vec![None, Some(2.0)];
        let m = correlation_matrix(&[a, b]).unwrap();
        assert_eq!(m[0][1], None);
    }

    #[test]
    fn invalid_inputs() {
        assert!(correlation_matrix(&[]).is_err());
        assert!(matches!(
            correlation_matrix(&[col(&[1.0, 2.0]), col(&[1.0])]),
            Err(EngineError::InvalidInput(_))
        ));
    }
}
