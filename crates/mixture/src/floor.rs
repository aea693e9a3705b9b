use super::*;
use emgmm_core::*;

/// Minimum permitted variance per feature dimension.
///
/// Every M-step clamps component variances to this floor, which keeps a
/// component from collapsing onto a single record.
#[derive(Debug, Clone, PartialEq)]
pub struct VarianceFloor(Vec<Feature>);

impl VarianceFloor {
    /// No flooring at all. Useful for tests and for pre-floored models.
    pub fn zero(dim: usize) -> Self {
        Self(vec![0.; dim])
    }
    /// `factor × variance[j]` for every dimension.
    pub fn scaled(moments: &Moments, factor: f64) -> Self {
        Self(moments.variance().iter().map(|v| v * factor).collect())
    }
    /// Floor derived from the dataset itself with the default factor.
    pub fn from_records(records: &[Vec<Feature>], dim: usize) -> Result<Self> {
        Moments::from_records(records, dim)?
            .nondegenerate()
            .map(|ref m| Self::scaled(m, VARIANCE_FLOOR_FACTOR))
    }
    /// Floor derived from a global merge, `factor × variance[j]`.
    pub fn from_statistics(stats: &SufficientStatistics, factor: f64) -> Result<Self> {
        Moments::from_statistics(stats)?
            .nondegenerate()
            .map(|ref m| Self::scaled(m, factor))
    }
    pub fn dim(&self) -> usize {
        self.0.len()
    }
    pub fn get(&self, j: usize) -> Feature {
        self.0[j]
    }
    pub fn as_slice(&self) -> &[Feature] {
        &self.0
    }
}

impl From<Vec<Feature>> for VarianceFloor {
    fn from(floor: Vec<Feature>) -> Self {
        Self(floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_is_fraction_of_data_variance() {
        let records = vec![vec![0., 0.], vec![2., 4.], vec![4., 8.]];
        let floor = VarianceFloor::from_records(&records, 2).unwrap();
        assert_eq!(floor.dim(), 2);
        assert!((floor.get(0) - 4. * VARIANCE_FLOOR_FACTOR).abs() < 1e-12);
        assert!((floor.get(1) - 16. * VARIANCE_FLOOR_FACTOR).abs() < 1e-12);
    }

    #[test]
    fn constant_feature_has_no_floor() {
        let records = vec![vec![1., 3.], vec![2., 3.]];
        assert!(matches!(
            VarianceFloor::from_records(&records, 2),
            Err(Error::ZeroVariance { dimension: 1 })
        ));
    }
}
