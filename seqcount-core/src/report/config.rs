use crate::consensus::MixtureCutoff;
use crate::error::{SeqError, SeqResult};

pub const DEFAULT_MIXTURE_CUTOFFS: [f64; 6] = [0.01, 0.02, 0.05, 0.1, 0.2, 0.25];
pub const DEFAULT_CONSENSUS_MIN_COVERAGE: u64 = 100;
pub const GAP_OPEN_COORD: f32 = 40.0;
pub const GAP_EXTEND_COORD: f32 = 10.0;
pub const DEFAULT_OVERLAP_REGION: &str = "V3LOOP";
pub const DEFAULT_G2P_SEED: &str = "HIV1B-G2P";

/// Tunables for a counting run.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    /// Consensus mixture cutoffs, reported after `MAX`.
    pub mixture_cutoffs: Vec<f64>,
    pub consensus_min_coverage: u64,
    pub gap_open: f32,
    pub gap_extend: f32,
    /// Region mapped in the main stream only to supply overlap counts.
    pub overlap_region: String,
    /// Seed of the second stream, whose reference stands in for its remap
    /// consensus.
    pub g2p_seed: String,
    /// Bytes between progress notifications; 1% of the input when unset.
    pub progress_interval: Option<u64>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            mixture_cutoffs: DEFAULT_MIXTURE_CUTOFFS.to_vec(),
            consensus_min_coverage: DEFAULT_CONSENSUS_MIN_COVERAGE,
            gap_open: GAP_OPEN_COORD,
            gap_extend: GAP_EXTEND_COORD,
            overlap_region: DEFAULT_OVERLAP_REGION.to_string(),
            g2p_seed: DEFAULT_G2P_SEED.to_string(),
            progress_interval: None,
        }
    }
}

impl ReportConfig {
    pub fn validate(&self) -> SeqResult<()> {
        if let Some(bad) = self
            .mixture_cutoffs
            .iter()
            .find(|c| !(0.0..=1.0).contains(*c))
        {
            return Err(SeqError::InvalidConfig {
                msg: format!("mixture cutoff {bad} is outside 0..=1"),
            });
        }
        if !(self.gap_open.is_finite() && self.gap_open >= 0.0)
            || !(self.gap_extend.is_finite() && self.gap_extend >= 0.0)
        {
            return Err(SeqError::InvalidConfig {
                msg: format!(
                    "gap penalties must be non-negative, got {}/{}",
                    self.gap_open, self.gap_extend
                ),
            });
        }
        Ok(())
    }

    /// `MAX` followed by the configured fractions.
    pub fn cutoffs(&self) -> Vec<MixtureCutoff> {
        std::iter::once(MixtureCutoff::Max)
            .chain(self.mixture_cutoffs.iter().map(|&c| MixtureCutoff::Fraction(c)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_comes_first() {
        let cutoffs = ReportConfig::default().cutoffs();
        assert_eq!(cutoffs.len(), 7);
        assert_eq!(cutoffs[0], MixtureCutoff::Max);
        assert_eq!(cutoffs[1], MixtureCutoff::Fraction(0.01));
    }

    #[test]
    fn rejects_bad_values() {
        let config = ReportConfig {
            mixture_cutoffs: vec![1.5],
            ..ReportConfig::default()
        };
        assert!(config.validate().is_err());
        let config = ReportConfig {
            gap_open: -1.0,
            ..ReportConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(ReportConfig::default().validate().is_ok());
    }
}
