//! Output types for epistemic networks.
//!
//! An epistemic network evaluated at one input batch and one index draw
//! produces either a plain prediction array or a prediction split into a
//! trainable component and a fixed prior contribution. Consumers should
//! only ever call [`Output::preds`]; the uniform accessor is the reason
//! this wrapper exists.
//!
//! The prior term is held constant with respect to optimization: networks
//! that produce one keep the prior-generating parameters inside the
//! network value itself, outside the trainable parameter structure, so no
//! optimizer step can reach `preds` through `prior`.

use std::collections::HashMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Prediction split into a trainable part and a fixed additive prior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputWithPrior {
    /// Trainable component of the prediction.
    pub train: Array2<f64>,
    /// Fixed prior contribution, broadcast against `train` when summed.
    pub prior: Array2<f64>,
    /// Auxiliary diagnostic outputs keyed by label.
    pub extra: HashMap<String, Array2<f64>>,
}

impl OutputWithPrior {
    /// Wrap a trainable prediction with a zero prior and no extras.
    ///
    /// The prior defaults to a fresh `(1, 1)` zero array, the minimal
    /// shape that broadcasts against any `train` batch.
    pub fn new(train: Array2<f64>) -> Self {
        Self {
            train,
            prior: Array2::zeros((1, 1)),
            extra: HashMap::new(),
        }
    }

    /// Replace the prior contribution.
    pub fn with_prior(mut self, prior: Array2<f64>) -> Self {
        self.prior = prior;
        self
    }

    /// Attach an auxiliary diagnostic output.
    pub fn with_extra(mut self, label: impl Into<String>, value: Array2<f64>) -> Self {
        self.extra.insert(label.into(), value);
        self
    }

    /// Combined prediction: `train + prior`, broadcasting the prior.
    pub fn preds(&self) -> Array2<f64> {
        &self.train + &self.prior
    }
}

/// Output of one epistemic network evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// A single prediction array.
    Plain(Array2<f64>),
    /// A prediction with a fixed additive prior.
    WithPrior(OutputWithPrior),
}

impl Output {
    /// The prediction consumers should use, defined for both shapes.
    ///
    /// Identity for [`Output::Plain`]; `train + prior` for
    /// [`Output::WithPrior`].
    pub fn preds(&self) -> Array2<f64> {
        match self {
            Output::Plain(array) => array.clone(),
            Output::WithPrior(output) => output.preds(),
        }
    }

    /// The trainable component of the prediction.
    pub fn train(&self) -> &Array2<f64> {
        match self {
            Output::Plain(array) => array,
            Output::WithPrior(output) => &output.train,
        }
    }

    /// The prior contribution, if this output carries one.
    pub fn prior(&self) -> Option<&Array2<f64>> {
        match self {
            Output::Plain(_) => None,
            Output::WithPrior(output) => Some(&output.prior),
        }
    }

    /// Auxiliary diagnostic outputs, empty for plain outputs.
    pub fn extra(&self) -> Option<&HashMap<String, Array2<f64>>> {
        match self {
            Output::Plain(_) => None,
            Output::WithPrior(output) => Some(&output.extra),
        }
    }
}

impl From<Array2<f64>> for Output {
    fn from(array: Array2<f64>) -> Self {
        Output::Plain(array)
    }
}

impl From<OutputWithPrior> for Output {
    fn from(output: OutputWithPrior) -> Self {
        Output::WithPrior(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn plain_preds_is_identity() {
        let array = array![[1.0, 2.0], [3.0, 4.0]];
        let output = Output::Plain(array.clone());
        assert_eq!(output.preds(), array);
    }

    #[test]
    fn with_prior_preds_adds_elementwise() {
        let train = array![[1.0, 2.0], [3.0, 4.0]];
        let prior = array![[0.5, -0.5], [1.0, -1.0]];
        let output = OutputWithPrior::new(train.clone()).with_prior(prior.clone());
        assert_eq!(output.preds(), &train + &prior);
    }

    #[test]
    fn default_prior_is_minimal_zero() {
        let output = OutputWithPrior::new(array![[1.0, 2.0]]);
        assert_eq!(output.prior, Array2::zeros((1, 1)));
        assert!(output.extra.is_empty());
        // Zero prior of shape (1,1) broadcasts to a no-op.
        assert_eq!(output.preds(), array![[1.0, 2.0]]);
    }

    #[test]
    fn default_fields_are_fresh_per_construction() {
        let mut first = OutputWithPrior::new(array![[0.0]]);
        first.prior[[0, 0]] = 9.0;
        first.extra.insert("h".into(), array![[1.0]]);

        let second = OutputWithPrior::new(array![[0.0]]);
        assert_eq!(second.prior[[0, 0]], 0.0);
        assert!(second.extra.is_empty());
    }

    #[test]
    fn broadcast_prior_applies_per_row() {
        let train = array![[1.0, 1.0], [2.0, 2.0]];
        let prior = array![[10.0, 20.0]];
        let output = OutputWithPrior::new(train).with_prior(prior);
        assert_eq!(output.preds(), array![[11.0, 21.0], [12.0, 22.0]]);
    }

    #[test]
    fn extra_round_trips_through_builder() {
        let output = OutputWithPrior::new(array![[0.0]])
            .with_extra("hidden", array![[1.0, 2.0]])
            .with_extra("logits", array![[3.0]]);
        assert_eq!(output.extra.len(), 2);
        assert_eq!(output.extra["hidden"], array![[1.0, 2.0]]);
    }

    #[test]
    fn uniform_accessor_across_shapes() {
        let plain = Output::from(array![[1.0]]);
        let with_prior = Output::from(OutputWithPrior::new(array![[1.0]]));
        assert_eq!(plain.preds(), with_prior.preds());
        assert!(plain.prior().is_none());
        assert!(with_prior.prior().is_some());
    }
}
