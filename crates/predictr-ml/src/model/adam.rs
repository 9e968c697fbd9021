//! Adam optimizer over `ndarray` parameters.
//!
//! ```text
//! m = beta1 * m + (1 - beta1) * g
//! v = beta2 * v + (1 - beta2) * g^2
//! p = p - lr * m_hat / (sqrt(v_hat) + epsilon)
//! ```

use ndarray::{Array, Dimension, Zip};

/// First and second moment estimates for one parameter tensor.
#[derive(Debug, Clone)]
pub(crate) struct Moments<D: Dimension> {
    m: Array<f64, D>,
    v: Array<f64, D>,
}

impl<D: Dimension> Moments<D> {
    pub(crate) fn like(param: &Array<f64, D>) -> Self {
        Self {
            m: Array::zeros(param.raw_dim()),
            v: Array::zeros(param.raw_dim()),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: i32,
}

impl Adam {
    pub(crate) fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            t: 0,
        }
    }

    /// Advance the timestep; call once per batch before any `update`.
    pub(crate) fn tick(&mut self) {
        self.t = self.t.saturating_add(1);
    }

    pub(crate) fn update<D: Dimension>(
        &self,
        param: &mut Array<f64, D>,
        grad: &Array<f64, D>,
        moments: &mut Moments<D>,
    ) {
        let t = self.t.max(1);
        let bias_correction1 = 1.0 - self.beta1.powi(t);
        let bias_correction2 = 1.0 - self.beta2.powi(t);
        let (beta1, beta2) = (self.beta1, self.beta2);
        let step = self.learning_rate;
        let epsilon = self.epsilon;

        Zip::from(param)
            .and(grad)
            .and(&mut moments.m)
            .and(&mut moments.v)
            .for_each(|p, &g, m, v| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                let m_hat = *m / bias_correction1;
                let v_hat = *v / bias_correction2;
                *p -= step * m_hat / (v_hat.sqrt() + epsilon);
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn first_step_moves_each_parameter_by_the_learning_rate() {
        let mut adam = Adam::new(0.01);
        let mut param = array![1.0, -2.0, 3.0];
        let grad = array![0.5, -0.25, 4.0];
        let mut moments = Moments::like(&param);

        adam.tick();
        adam.update(&mut param, &grad, &mut moments);

        // With bias correction the first step is lr * sign(g).
        let expected = [0.99, -1.99, 2.99];
        for (p, e) in param.iter().zip(expected) {
            assert!((p - e).abs() < 1e-6, "{p} vs {e}");
        }
    }

    #[test]
    fn repeated_steps_minimize_a_quadratic() {
        let mut adam = Adam::new(0.1);
        let mut param = array![[5.0, -3.0]];
        let mut moments = Moments::like(&param);

        for _ in 0..500 {
            let grad = param.mapv(|p| 2.0 * p);
            adam.tick();
            adam.update(&mut param, &grad, &mut moments);
        }

        assert!(param.iter().all(|p| p.abs() < 0.1));
    }
}
