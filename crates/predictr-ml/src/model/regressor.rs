//! Stacked LSTM regressor mapping a window of scaled closes to the next one.

use ndarray::{s, Array1, Array2, Axis, Ix1, Ix2};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::adam::{Adam, Moments};
use super::early_stopping::{EarlyStopping, EpochVerdict};
use super::lstm::{LstmGradients, LstmLayer};
use crate::window::Windows;

/// Linear output layer on the last hidden state.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseHead {
    weights: Array1<f64>,
    bias: Array1<f64>,
}

struct HeadGradients {
    weights: Array1<f64>,
    bias: Array1<f64>,
}

impl DenseHead {
    fn new<R: Rng>(input_size: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (input_size + 1) as f64).sqrt();
        Self {
            weights: Array1::from_shape_fn(input_size, |_| rng.gen_range(-limit..limit)),
            bias: Array1::zeros(1),
        }
    }

    pub(crate) fn from_parameters(weights: Array1<f64>, bias: f64) -> Self {
        Self {
            weights,
            bias: Array1::from_elem(1, bias),
        }
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias[0]
    }

    fn forward(&self, hidden: &Array2<f64>) -> Array1<f64> {
        hidden.dot(&self.weights) + self.bias[0]
    }

    fn backward(&self, hidden: &Array2<f64>, d_out: &Array1<f64>) -> (HeadGradients, Array2<f64>) {
        let grads = HeadGradients {
            weights: hidden.t().dot(d_out),
            bias: Array1::from_elem(1, d_out.sum()),
        };
        let d_hidden = d_out
            .view()
            .insert_axis(Axis(1))
            .dot(&self.weights.view().insert_axis(Axis(0)));
        (grads, d_hidden)
    }
}

/// Training hyperparameters for [`SequenceRegressor::fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub epochs: u32,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Inverted dropout after every recurrent layer; training only.
    pub dropout: f64,
    pub patience: u32,
    pub min_delta: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    pub epochs_run: u32,
    /// Training loss of the weights kept after fitting.
    pub best_loss: Option<f64>,
    pub loss_history: Vec<f64>,
    pub stopped_early: bool,
}

/// `layers` stacked LSTMs of equal width followed by a [`DenseHead`].
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceRegressor {
    layers: Vec<LstmLayer>,
    head: DenseHead,
}

impl SequenceRegressor {
    /// Randomly initialized network for univariate input.
    pub fn new<R: Rng>(hidden_size: usize, layers: usize, rng: &mut R) -> Self {
        let mut stack = Vec::with_capacity(layers.max(1));
        stack.push(LstmLayer::new(1, hidden_size, rng));
        for _ in 1..layers {
            stack.push(LstmLayer::new(hidden_size, hidden_size, rng));
        }
        let head = DenseHead::new(hidden_size, rng);
        Self {
            layers: stack,
            head,
        }
    }

    /// Assemble a network from stored parts, checking that they chain.
    pub(crate) fn from_parts(layers: Vec<LstmLayer>, head: DenseHead) -> Option<Self> {
        let first = layers.first()?;
        if first.input_size() != 1 {
            return None;
        }
        let chained = layers
            .windows(2)
            .all(|pair| pair[1].input_size() == pair[0].hidden_size());
        let top = layers.last()?.hidden_size();
        (chained && head.weights.len() == top).then_some(Self { layers, head })
    }

    pub fn layers(&self) -> &[LstmLayer] {
        &self.layers
    }

    pub fn head(&self) -> &DenseHead {
        &self.head
    }

    /// Predict one value per row of `inputs` (`batch x time_steps`).
    pub fn predict_batch(&self, inputs: &Array2<f64>) -> Array1<f64> {
        let mut sequence = to_steps(inputs);
        for layer in &self.layers {
            sequence = layer.forward(&sequence);
        }
        match sequence.last() {
            Some(hidden) => self.head.forward(hidden),
            None => Array1::from_elem(inputs.nrows(), self.head.bias()),
        }
    }

    /// Predict the value following `window`.
    pub fn predict_next(&self, window: &[f64]) -> f64 {
        let inputs = Array2::from_shape_fn((1, window.len()), |(_, t)| window[t]);
        self.predict_batch(&inputs)[0]
    }

    /// Mini-batch training with shuffling, Adam and early stopping on the
    /// epoch's mean training loss. The best weights seen are restored.
    pub fn fit<R: Rng>(&mut self, windows: &Windows, options: &FitOptions, rng: &mut R) -> FitSummary {
        let samples = windows.len();
        let batch_size = options.batch_size.max(1);
        let mut optimizer = OptimizerState::new(self, options.learning_rate);
        let mut stopping = EarlyStopping::new(options.patience, options.min_delta);
        let mut best = self.clone();
        let mut order: Vec<usize> = (0..samples).collect();
        let mut loss_history = Vec::new();
        let mut stopped_early = false;

        for epoch in 1..=options.epochs {
            order.shuffle(rng);
            let mut weighted_loss = 0.0;
            for chunk in order.chunks(batch_size) {
                let inputs = windows.inputs.select(Axis(0), chunk);
                let targets = windows.targets.select(Axis(0), chunk);
                let loss =
                    self.train_batch(&inputs, &targets, options.dropout, rng, &mut optimizer);
                weighted_loss += loss * chunk.len() as f64;
            }

            let epoch_loss = weighted_loss / samples.max(1) as f64;
            loss_history.push(epoch_loss);
            debug!(epoch, loss = epoch_loss, "epoch finished");

            match stopping.observe(epoch, epoch_loss) {
                EpochVerdict::Improved => best = self.clone(),
                EpochVerdict::Continue => {}
                EpochVerdict::Stop => {
                    stopped_early = true;
                    break;
                }
            }
        }

        if stopping.best_loss().is_some() {
            *self = best;
        }

        FitSummary {
            epochs_run: u32::try_from(loss_history.len()).unwrap_or(u32::MAX),
            best_loss: stopping.best_loss(),
            loss_history,
            stopped_early,
        }
    }

    fn train_batch<R: Rng>(
        &mut self,
        inputs: &Array2<f64>,
        targets: &Array1<f64>,
        dropout: f64,
        rng: &mut R,
        optimizer: &mut OptimizerState,
    ) -> f64 {
        let batch = targets.len();
        let mut sequence = to_steps(inputs);
        let mut traces = Vec::with_capacity(self.layers.len());
        let mut masks = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let (outputs, caches) = layer.forward_traced(&sequence);
            let mask = dropout_masks(outputs.len(), (batch, layer.hidden_size()), dropout, rng);
            sequence = apply_masks(outputs, mask.as_deref());
            traces.push(caches);
            masks.push(mask);
        }

        let Some(last_hidden) = sequence.last() else {
            return 0.0;
        };
        let errors = self.head.forward(last_hidden) - targets;
        let loss = errors.mapv(|e| e * e).mean().unwrap_or(0.0);
        let d_predictions = errors * (2.0 / batch.max(1) as f64);
        let (head_grads, d_hidden) = self.head.backward(last_hidden, &d_predictions);

        let mut grad_outputs: Vec<Array2<f64>> = sequence
            .iter()
            .map(|hidden| Array2::zeros(hidden.raw_dim()))
            .collect();
        if let Some(last) = grad_outputs.last_mut() {
            *last = d_hidden;
        }

        let mut layer_grads = Vec::with_capacity(self.layers.len());
        for (index, layer) in self.layers.iter().enumerate().rev() {
            if let Some(mask) = &masks[index] {
                for (grad, keep) in grad_outputs.iter_mut().zip(mask) {
                    *grad *= keep;
                }
            }
            let mut grads = layer.zero_gradients();
            grad_outputs = layer.backward(&traces[index], &grad_outputs, &mut grads);
            layer_grads.push(grads);
        }
        layer_grads.reverse();

        optimizer.apply(self, &layer_grads, &head_grads);
        loss
    }
}

struct OptimizerState {
    adam: Adam,
    layers: Vec<(Moments<Ix2>, Moments<Ix1>)>,
    head_weights: Moments<Ix1>,
    head_bias: Moments<Ix1>,
}

impl OptimizerState {
    fn new(model: &SequenceRegressor, learning_rate: f64) -> Self {
        Self {
            adam: Adam::new(learning_rate),
            layers: model
                .layers
                .iter()
                .map(|layer| (Moments::like(layer.weights()), Moments::like(layer.bias())))
                .collect(),
            head_weights: Moments::like(&model.head.weights),
            head_bias: Moments::like(&model.head.bias),
        }
    }

    fn apply(
        &mut self,
        model: &mut SequenceRegressor,
        layer_grads: &[LstmGradients],
        head_grads: &HeadGradients,
    ) {
        self.adam.tick();
        for ((layer, grads), (weight_moments, bias_moments)) in model
            .layers
            .iter_mut()
            .zip(layer_grads)
            .zip(self.layers.iter_mut())
        {
            let (weights, bias) = layer.parameters_mut();
            self.adam.update(weights, &grads.weights, weight_moments);
            self.adam.update(bias, &grads.bias, bias_moments);
        }
        self.adam
            .update(&mut model.head.weights, &head_grads.weights, &mut self.head_weights);
        self.adam
            .update(&mut model.head.bias, &head_grads.bias, &mut self.head_bias);
    }
}

/// Split `batch x steps` into one `batch x 1` matrix per step.
fn to_steps(inputs: &Array2<f64>) -> Vec<Array2<f64>> {
    (0..inputs.ncols())
        .map(|t| inputs.slice(s![.., t..t + 1]).to_owned())
        .collect()
}

fn dropout_masks<R: Rng>(
    steps: usize,
    shape: (usize, usize),
    rate: f64,
    rng: &mut R,
) -> Option<Vec<Array2<f64>>> {
    if rate <= 0.0 {
        return None;
    }
    let scale = 1.0 / (1.0 - rate);
    Some(
        (0..steps)
            .map(|_| {
                Array2::from_shape_fn(shape, |_| {
                    if rng.gen::<f64>() < rate {
                        0.0
                    } else {
                        scale
                    }
                })
            })
            .collect(),
    )
}

fn apply_masks(outputs: Vec<Array2<f64>>, masks: Option<&[Array2<f64>]>) -> Vec<Array2<f64>> {
    match masks {
        Some(masks) => outputs
            .into_iter()
            .zip(masks)
            .map(|(output, mask)| output * mask)
            .collect(),
        None => outputs,
    }
}
