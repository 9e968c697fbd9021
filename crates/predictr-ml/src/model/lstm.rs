//! LSTM layer with full backpropagation through time.

use ndarray::{s, Array1, Array2, Axis};
use rand::Rng;

/// One LSTM layer.
///
/// Gate weights are stacked row-wise in the order input, forget, cell
/// candidate, output and act on `[x_t, h_{t-1}]`, so `weights` has shape
/// `(4 * hidden, input + hidden)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LstmLayer {
    input_size: usize,
    hidden_size: usize,
    weights: Array2<f64>,
    bias: Array1<f64>,
}

/// Activations kept from the forward pass for one time step.
#[derive(Debug, Clone)]
pub(crate) struct StepCache {
    z: Array2<f64>,
    input_gate: Array2<f64>,
    forget_gate: Array2<f64>,
    candidate: Array2<f64>,
    output_gate: Array2<f64>,
    c_prev: Array2<f64>,
    tanh_c: Array2<f64>,
}

/// Accumulated parameter gradients for one layer.
#[derive(Debug, Clone)]
pub(crate) struct LstmGradients {
    pub(crate) weights: Array2<f64>,
    pub(crate) bias: Array1<f64>,
}

impl LstmLayer {
    /// Uniform `±1/sqrt(hidden)` weights; forget-gate bias starts at 1.
    pub fn new<R: Rng>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        let limit = 1.0 / (hidden_size.max(1) as f64).sqrt();
        let weights = Array2::from_shape_fn((4 * hidden_size, input_size + hidden_size), |_| {
            rng.gen_range(-limit..limit)
        });
        let mut bias = Array1::zeros(4 * hidden_size);
        bias.slice_mut(s![hidden_size..2 * hidden_size]).fill(1.0);

        Self {
            input_size,
            hidden_size,
            weights,
            bias,
        }
    }

    /// Rebuild a layer from stored parameters. Shapes must already agree.
    pub(crate) fn from_parameters(
        input_size: usize,
        hidden_size: usize,
        weights: Array2<f64>,
        bias: Array1<f64>,
    ) -> Option<Self> {
        let shape_ok = weights.dim() == (4 * hidden_size, input_size + hidden_size)
            && bias.len() == 4 * hidden_size;
        shape_ok.then_some(Self {
            input_size,
            hidden_size,
            weights,
            bias,
        })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn bias(&self) -> &Array1<f64> {
        &self.bias
    }

    pub(crate) fn parameters_mut(&mut self) -> (&mut Array2<f64>, &mut Array1<f64>) {
        (&mut self.weights, &mut self.bias)
    }

    pub(crate) fn zero_gradients(&self) -> LstmGradients {
        LstmGradients {
            weights: Array2::zeros(self.weights.raw_dim()),
            bias: Array1::zeros(self.bias.len()),
        }
    }

    /// Run the sequence and return the hidden state of every step.
    ///
    /// Each element of `inputs` is a `(batch, input_size)` slice of one step.
    pub fn forward(&self, inputs: &[Array2<f64>]) -> Vec<Array2<f64>> {
        self.run(inputs, None)
    }

    pub(crate) fn forward_traced(
        &self,
        inputs: &[Array2<f64>],
    ) -> (Vec<Array2<f64>>, Vec<StepCache>) {
        let mut caches = Vec::with_capacity(inputs.len());
        let outputs = self.run(inputs, Some(&mut caches));
        (outputs, caches)
    }

    fn run(
        &self,
        inputs: &[Array2<f64>],
        mut caches: Option<&mut Vec<StepCache>>,
    ) -> Vec<Array2<f64>> {
        let batch = inputs.first().map_or(0, Array2::nrows);
        let hidden = self.hidden_size;
        let mut h = Array2::zeros((batch, hidden));
        let mut c = Array2::zeros((batch, hidden));
        let mut outputs = Vec::with_capacity(inputs.len());

        for x in inputs {
            let mut z = Array2::zeros((batch, self.input_size + hidden));
            z.slice_mut(s![.., ..self.input_size]).assign(x);
            z.slice_mut(s![.., self.input_size..]).assign(&h);

            let a = z.dot(&self.weights.t()) + &self.bias;
            let input_gate = a.slice(s![.., ..hidden]).mapv(sigmoid);
            let forget_gate = a.slice(s![.., hidden..2 * hidden]).mapv(sigmoid);
            let candidate = a.slice(s![.., 2 * hidden..3 * hidden]).mapv(f64::tanh);
            let output_gate = a.slice(s![.., 3 * hidden..]).mapv(sigmoid);

            let c_next = &forget_gate * &c + &input_gate * &candidate;
            let tanh_c = c_next.mapv(f64::tanh);
            h = &output_gate * &tanh_c;

            if let Some(caches) = caches.as_deref_mut() {
                caches.push(StepCache {
                    z,
                    input_gate,
                    forget_gate,
                    candidate,
                    output_gate,
                    c_prev: c,
                    tanh_c,
                });
            }
            c = c_next;
            outputs.push(h.clone());
        }

        outputs
    }

    /// Backpropagate `grad_outputs` (loss gradient w.r.t. each step's hidden
    /// state) through the whole sequence, accumulating into `grads` and
    /// returning the gradient w.r.t. each step's input.
    pub(crate) fn backward(
        &self,
        caches: &[StepCache],
        grad_outputs: &[Array2<f64>],
        grads: &mut LstmGradients,
    ) -> Vec<Array2<f64>> {
        let hidden = self.hidden_size;
        let batch = grad_outputs.first().map_or(0, Array2::nrows);
        let mut dh_next = Array2::<f64>::zeros((batch, hidden));
        let mut dc_next = Array2::<f64>::zeros((batch, hidden));
        let mut grad_inputs = vec![Array2::zeros((batch, self.input_size)); caches.len()];

        for (t, cache) in caches.iter().enumerate().rev() {
            let dh = &grad_outputs[t] + &dh_next;
            let d_output = &dh * &cache.tanh_c;
            let dc = &dc_next
                + &(&dh * &cache.output_gate * &cache.tanh_c.mapv(|v| 1.0 - v * v));
            let d_forget = &dc * &cache.c_prev;
            let d_input = &dc * &cache.candidate;
            let d_candidate = &dc * &cache.input_gate;
            dc_next = &dc * &cache.forget_gate;

            let mut da = Array2::zeros((batch, 4 * hidden));
            da.slice_mut(s![.., ..hidden])
                .assign(&(d_input * &cache.input_gate.mapv(sigmoid_slope)));
            da.slice_mut(s![.., hidden..2 * hidden])
                .assign(&(d_forget * &cache.forget_gate.mapv(sigmoid_slope)));
            da.slice_mut(s![.., 2 * hidden..3 * hidden])
                .assign(&(d_candidate * &cache.candidate.mapv(|v| 1.0 - v * v)));
            da.slice_mut(s![.., 3 * hidden..])
                .assign(&(d_output * &cache.output_gate.mapv(sigmoid_slope)));

            grads.weights += &da.t().dot(&cache.z);
            grads.bias += &da.sum_axis(Axis(0));

            let dz = da.dot(&self.weights);
            grad_inputs[t] = dz.slice(s![.., ..self.input_size]).to_owned();
            dh_next = dz.slice(s![.., self.input_size..]).to_owned();
        }

        grad_inputs
    }
}

fn sigmoid(v: f64) -> f64 {
    if v >= 0.0 {
        1.0 / (1.0 + (-v).exp())
    } else {
        let e = v.exp();
        e / (1.0 + e)
    }
}

/// Derivative of the sigmoid expressed through its output.
fn sigmoid_slope(s: f64) -> f64 {
    s * (1.0 - s)
}
