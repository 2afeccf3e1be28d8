use log::debug;

use super::metrics::{Metric, Summary};
use super::smooth::Smoother;
use crate::error::Result;
use crate::profile::operations::scale_counts;
use crate::profile::Profile;

/// Which transformations to apply before measuring a distance
#[derive(Debug, Clone, Default)]
pub struct DistanceConfig {
    /// Balance both profiles over reverse complements
    pub balance: bool,
    /// Keep only counts that are non-zero in both profiles
    pub positive: bool,
    /// Smooth the pair before measuring
    pub smooth: bool,
    pub summary: Summary,
    pub threshold: f64,
    /// Scale both profiles to equal totals
    pub scale: bool,
    /// Scale the larger profile down instead of the smaller one up
    pub down: bool,
    pub metric: Metric,
}

/// Distance between two profiles under a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct ProfileDistance {
    config: DistanceConfig,
}

impl ProfileDistance {
    pub fn new(config: DistanceConfig) -> Self {
        debug!("Distance configuration: {:?}", config);
        ProfileDistance { config }
    }

    pub fn config(&self) -> &DistanceConfig {
        &self.config
    }

    /// Distance between `left` and `right`; neither input is modified
    pub fn distance(&self, left: &Profile, right: &Profile) -> Result<f64> {
        left.check_compatible(right)?;
        let config = &self.config;

        let (mut left, mut right) = if config.balance {
            (left.balance(), right.balance())
        } else {
            (left.clone(), right.clone())
        };

        if config.positive {
            (left, right) = left.positive(&right)?;
        }

        if config.smooth {
            let smoother = Smoother::new(config.summary.clone(), config.threshold);
            (left, right) = smoother.smooth_profiles(&left, &right)?;
        }

        let (left, right) = if config.scale {
            scale_counts(&left.to_f64(), &right.to_f64(), config.down)
        } else {
            (left.to_f64(), right.to_f64())
        };

        config.metric.distance(&left, &right)
    }
}
