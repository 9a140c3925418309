use crate::advice::AdviceGenerator;
use crate::estimation::EcoEstimator;
use std::sync::Arc;

/// Shared by every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    estimator: Arc<EcoEstimator>,
    advisor: AdviceGenerator,
}

impl AppState {
    pub fn new(estimator: Arc<EcoEstimator>, advisor: AdviceGenerator) -> Self {
        Self { estimator, advisor }
    }

    pub fn estimator(&self) -> &Arc<EcoEstimator> {
        &self.estimator
    }

    pub fn advisor(&self) -> &AdviceGenerator {
        &self.advisor
    }
}
