//! Occupancy update strategy selection

use serde::{Deserialize, Serialize};

use super::bayes::{BayesParams, BayesUpdater};
use super::grid_spec::GridSpec;
use super::himm::{HimmParams, HimmUpdater};
use crate::common::OccupancyUpdater;

/// Which occupancy update runs for every beam. Fixed when the grid store is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateAlgorithm {
    #[default]
    Himm,
    Bayes,
}

impl UpdateAlgorithm {
    /// Build the updater for this algorithm over `spec`
    pub fn build(
        self,
        spec: GridSpec,
        himm: HimmParams,
        bayes: BayesParams,
    ) -> Box<dyn OccupancyUpdater> {
        match self {
            UpdateAlgorithm::Himm => Box::new(HimmUpdater::new(spec, himm)),
            UpdateAlgorithm::Bayes => Box::new(BayesUpdater::new(spec, bayes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_dispatches_on_algorithm() {
        let spec = GridSpec::default();
        let himm = UpdateAlgorithm::Himm.build(spec, HimmParams::default(), BayesParams::default());
        assert_eq!(himm.name(), "himm");
        assert_eq!(himm.value_range(), (0.0, 15.0));
        assert_eq!(himm.initial_value(), 7.5);

        let bayes = UpdateAlgorithm::Bayes.build(spec, HimmParams::default(), BayesParams::default());
        assert_eq!(bayes.name(), "bayes");
        assert_eq!(bayes.value_range(), (0.0, 1.0));
        assert_eq!(bayes.initial_value(), 0.5);
    }
}
