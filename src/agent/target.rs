use log::debug;

use crate::error::{DdqnError, Result};
use crate::network::FunctionApproximator;

/// Frozen copy of the online network, refreshed every `period` learning calls.
///
/// The wrapped network is kept in inference mode at all times and is only
/// ever changed by a full parameter copy from the online network.
#[derive(Clone, Debug)]
pub struct TargetNetwork<F> {
    network: F,
    period: usize,
    synchronizations: usize,
}

impl<F: FunctionApproximator> TargetNetwork<F> {
    /// Take ownership of an independently built `network` and make it an exact copy of `online`.
    ///
    /// Fails with `Configuration` if the two are not structurally identical and
    /// with `InvalidParameter` if `period` is zero.
    pub fn new(online: &F, network: F, period: usize) -> Result<Self> {
        if period == 0 {
            return Err(DdqnError::invalid_parameter("target_update_rate", "must be at least 1"));
        }
        let mut target = TargetNetwork { network, period, synchronizations: 0 };
        target.synchronize(online)?;
        Ok(target)
    }

    fn check_compatible(&self, online: &F) -> Result<()> {
        if !self.network.is_compatible_with(online) {
            return Err(DdqnError::Configuration(format!(
                "target network layout {:?} does not match online layout {:?}",
                self.network.parameters().shapes(),
                online.parameters().shapes(),
            )));
        }
        Ok(())
    }

    /// Overwrite every target parameter with the online network's.
    ///
    /// Fails with `Configuration`, leaving the target untouched, if `online`
    /// has a different layout.
    pub fn synchronize(&mut self, online: &F) -> Result<()> {
        self.check_compatible(online)?;
        self.network.copy_parameters_from(online);
        self.network.set_inference_mode(true);
        self.synchronizations += 1;
        Ok(())
    }

    /// Synchronize iff `step` is a multiple of the period. Returns whether it did.
    pub fn maybe_synchronize(&mut self, online: &F, step: usize) -> Result<bool> {
        if step % self.period != 0 {
            return Ok(false);
        }
        self.synchronize(online)?;
        debug!("target network synchronized at learning step {}", step);
        Ok(true)
    }

    pub fn network(&self) -> &F {
        &self.network
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub(crate) fn set_period(&mut self, period: usize) -> Result<()> {
        if period == 0 {
            return Err(DdqnError::invalid_parameter("target_update_rate", "must be at least 1"));
        }
        self.period = period;
        Ok(())
    }

    /// Number of synchronizations since construction, including the initial copy.
    pub fn synchronizations(&self) -> usize {
        self.synchronizations
    }

    /// Line appended to the hyperparameter record.
    pub fn hyperparameter_record(&self) -> String {
        format!("target_update_rate: {}\n", self.period)
    }
}
