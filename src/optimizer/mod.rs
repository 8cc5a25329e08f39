//! Gradient-based optimizers bound to the online network's parameters.
//!
//! Stateful optimizers keep one slot per layer, addressed by the layer index
//! passed to [`Optimizer::update`], so their state lines up with the network
//! they were built from.

use ndarray::{Array1, Array2};
use serde::{Serialize, Deserialize};

use crate::error::{DdqnError, Result};
use crate::parameters::{LayerGradients, Parameters};

pub trait Optimizer {
    /// Apply one update to layer `layer`.
    fn update(
        &mut self,
        layer: usize,
        weights: &mut Array2<f32>,
        biases: &mut Array1<f32>,
        gradients: &LayerGradients,
        learning_rate: f32,
    ) -> Result<()>;

    /// Called once after every layer has been updated.
    fn end_step(&mut self) {}
}

/// Serializable choice of optimizer, part of the agent configuration.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum OptimizerConfig {
    Sgd,
    Adam { beta1: f32, beta2: f32, epsilon: f32 },
    RmsProp { beta: f32, epsilon: f32 },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Adam { beta1: 0.9, beta2: 0.999, epsilon: 1e-8 }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        let in_unit = |v: f32| (0.0..1.0).contains(&v);
        match *self {
            OptimizerConfig::Sgd => Ok(()),
            OptimizerConfig::Adam { beta1, beta2, epsilon } => {
                if !in_unit(beta1) || !in_unit(beta2) {
                    return Err(DdqnError::invalid_parameter("optimizer", "Adam betas must be in [0, 1)"));
                }
                if !(epsilon > 0.0) {
                    return Err(DdqnError::invalid_parameter("optimizer", "epsilon must be positive"));
                }
                Ok(())
            }
            OptimizerConfig::RmsProp { beta, epsilon } => {
                if !in_unit(beta) {
                    return Err(DdqnError::invalid_parameter("optimizer", "RMSProp beta must be in [0, 1)"));
                }
                if !(epsilon > 0.0) {
                    return Err(DdqnError::invalid_parameter("optimizer", "epsilon must be positive"));
                }
                Ok(())
            }
        }
    }

    /// Build an optimizer whose state matches `parameters`.
    pub fn build(&self, parameters: &Parameters) -> OptimizerWrapper {
        match *self {
            OptimizerConfig::Sgd => OptimizerWrapper::SGD(SGD::new()),
            OptimizerConfig::Adam { beta1, beta2, epsilon } => {
                OptimizerWrapper::Adam(Adam::new(parameters, beta1, beta2, epsilon))
            }
            OptimizerConfig::RmsProp { beta, epsilon } => {
                OptimizerWrapper::RMSProp(RMSProp::new(parameters, beta, epsilon))
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
    RMSProp(RMSProp),
}

impl OptimizerWrapper {
    /// Fails unless the optimizer's per-layer state has the shapes of `parameters`.
    pub fn ensure_compatible(&self, parameters: &Parameters) -> Result<()> {
        let expected = parameters.shapes();
        let actual = match self {
            OptimizerWrapper::SGD(_) => return Ok(()),
            OptimizerWrapper::Adam(adam) => state_shapes(&adam.m_weights, &adam.m_biases),
            OptimizerWrapper::RMSProp(rms) => state_shapes(&rms.v_weights, &rms.v_biases),
        };
        if expected != actual {
            return Err(DdqnError::shape_mismatch(format!("{:?}", expected), format!("{:?}", actual)));
        }
        Ok(())
    }
}

impl Optimizer for OptimizerWrapper {
    fn update(
        &mut self,
        layer: usize,
        weights: &mut Array2<f32>,
        biases: &mut Array1<f32>,
        gradients: &LayerGradients,
        learning_rate: f32,
    ) -> Result<()> {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update(layer, weights, biases, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update(layer, weights, biases, gradients, learning_rate),
            OptimizerWrapper::RMSProp(optimizer) => optimizer.update(layer, weights, biases, gradients, learning_rate),
        }
    }

    fn end_step(&mut self) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.end_step(),
            OptimizerWrapper::Adam(optimizer) => optimizer.end_step(),
            OptimizerWrapper::RMSProp(optimizer) => optimizer.end_step(),
        }
    }
}

fn state_shapes(weights: &[Array2<f32>], biases: &[Array1<f32>]) -> Vec<((usize, usize), usize)> {
    weights.iter().zip(biases).map(|(w, b)| (w.dim(), b.len())).collect()
}

fn check_gradients(weights: &Array2<f32>, biases: &Array1<f32>, gradients: &LayerGradients) -> Result<()> {
    if gradients.weights.dim() != weights.dim() || gradients.biases.len() != biases.len() {
        return Err(DdqnError::shape_mismatch(
            format!("{:?} / {}", weights.dim(), biases.len()),
            format!("{:?} / {}", gradients.weights.dim(), gradients.biases.len()),
        ));
    }
    Ok(())
}

fn check_slot(layer: usize, slots: usize) -> Result<()> {
    if layer >= slots {
        return Err(DdqnError::shape_mismatch(
            format!("layer index < {}", slots),
            layer.to_string(),
        ));
    }
    Ok(())
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Optimizer for SGD {
    fn update(
        &mut self,
        _layer: usize,
        weights: &mut Array2<f32>,
        biases: &mut Array1<f32>,
        gradients: &LayerGradients,
        learning_rate: f32,
    ) -> Result<()> {
        check_gradients(weights, biases, gradients)?;
        weights.zip_mut_with(&gradients.weights, |w, &g| *w -= learning_rate * g);
        biases.zip_mut_with(&gradients.biases, |b, &g| *b -= learning_rate * g);
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    m_weights: Vec<Array2<f32>>,
    v_weights: Vec<Array2<f32>>,
    m_biases: Vec<Array1<f32>>,
    v_biases: Vec<Array1<f32>>,
    /// Time step used for bias correction, starting at 1
    pub t: usize,
}

impl Adam {
    pub fn new(parameters: &Parameters, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        let zeros_w = || parameters.layers.iter().map(|l| Array2::zeros(l.weights.dim())).collect::<Vec<_>>();
        let zeros_b = || parameters.layers.iter().map(|l| Array1::zeros(l.biases.len())).collect::<Vec<_>>();

        Adam {
            beta1,
            beta2,
            epsilon,
            m_weights: zeros_w(),
            v_weights: zeros_w(),
            m_biases: zeros_b(),
            v_biases: zeros_b(),
            t: 1,
        }
    }

    pub fn default(parameters: &Parameters) -> Self {
        Self::new(parameters, 0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn update(
        &mut self,
        layer: usize,
        weights: &mut Array2<f32>,
        biases: &mut Array1<f32>,
        gradients: &LayerGradients,
        learning_rate: f32,
    ) -> Result<()> {
        check_slot(layer, self.m_weights.len())?;
        check_gradients(weights, biases, gradients)?;
        if self.m_weights[layer].dim() != weights.dim() || self.m_biases[layer].len() != biases.len() {
            return Err(DdqnError::shape_mismatch(
                format!("{:?}", self.m_weights[layer].dim()),
                format!("{:?}", weights.dim()),
            ));
        }

        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let correction1 = 1.0 - beta1.powi(self.t as i32);
        let correction2 = 1.0 - beta2.powi(self.t as i32);
        let step = |param: &mut f32, m: &mut f32, v: &mut f32, g: f32| {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            let m_hat = *m / correction1;
            let v_hat = *v / correction2;
            *param -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
        };

        ndarray::Zip::from(weights)
            .and(&mut self.m_weights[layer])
            .and(&mut self.v_weights[layer])
            .and(&gradients.weights)
            .for_each(|w, m, v, &g| step(w, m, v, g));
        ndarray::Zip::from(biases)
            .and(&mut self.m_biases[layer])
            .and(&mut self.v_biases[layer])
            .and(&gradients.biases)
            .for_each(|b, m, v, &g| step(b, m, v, g));
        Ok(())
    }

    fn end_step(&mut self) {
        self.t += 1;
    }
}

/// RMSProp optimizer
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RMSProp {
    pub beta: f32,
    pub epsilon: f32,
    v_weights: Vec<Array2<f32>>,
    v_biases: Vec<Array1<f32>>,
}

impl RMSProp {
    pub fn new(parameters: &Parameters, beta: f32, epsilon: f32) -> Self {
        RMSProp {
            beta,
            epsilon,
            v_weights: parameters.layers.iter().map(|l| Array2::zeros(l.weights.dim())).collect(),
            v_biases: parameters.layers.iter().map(|l| Array1::zeros(l.biases.len())).collect(),
        }
    }

    pub fn default(parameters: &Parameters) -> Self {
        Self::new(parameters, 0.9, 1e-8)
    }
}

impl Optimizer for RMSProp {
    fn update(
        &mut self,
        layer: usize,
        weights: &mut Array2<f32>,
        biases: &mut Array1<f32>,
        gradients: &LayerGradients,
        learning_rate: f32,
    ) -> Result<()> {
        check_slot(layer, self.v_weights.len())?;
        check_gradients(weights, biases, gradients)?;
        if self.v_weights[layer].dim() != weights.dim() || self.v_biases[layer].len() != biases.len() {
            return Err(DdqnError::shape_mismatch(
                format!("{:?}", self.v_weights[layer].dim()),
                format!("{:?}", weights.dim()),
            ));
        }

        let (beta, epsilon) = (self.beta, self.epsilon);
        let step = |param: &mut f32, v: &mut f32, g: f32| {
            *v = beta * *v + (1.0 - beta) * g * g;
            *param -= learning_rate * g / (v.sqrt() + epsilon);
        };

        ndarray::Zip::from(weights)
            .and(&mut self.v_weights[layer])
            .and(&gradients.weights)
            .for_each(|w, v, &g| step(w, v, g));
        ndarray::Zip::from(biases)
            .and(&mut self.v_biases[layer])
            .and(&gradients.biases)
            .for_each(|b, v, &g| step(b, v, g));
        Ok(())
    }
}
