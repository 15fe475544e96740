//! Placeholder craft classifier.
//!
//! Stands in for a trained model. Confidences are random but shaped like a
//! ranked softmax output: one dominant class followed by a decaying tail.

use super::ModelError;
use ndarray::Array4;
use rand::Rng;
use rand::seq::SliceRandom;
use shared::{ClassPrediction, CraftClass, ModelInfo};

pub const MODEL_VERSION: &str = "1.0.0-placeholder";
pub const MODEL_TYPE: &str = "placeholder";

/// Lower bound of every random draw.
const MIN_DRAW: f64 = 0.01;
/// Share of the remaining budget available to the first class.
const LEAD_SHARE: f64 = 0.8;
/// Share of the remaining budget available to every later class but the last.
const TAIL_SHARE: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct Prediction {
    /// Sorted by confidence, highest first.
    pub predictions: Vec<ClassPrediction>,
    pub model_version: String,
}

impl Prediction {
    pub fn top(&self) -> &ClassPrediction {
        &self.predictions[0]
    }
}

#[derive(Debug)]
pub struct CraftClassifier {
    version: String,
    classes: Vec<CraftClass>,
    loaded: bool,
}

impl Default for CraftClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CraftClassifier {
    pub fn new() -> Self {
        Self {
            version: MODEL_VERSION.to_string(),
            classes: CraftClass::all(),
            loaded: false,
        }
    }

    pub fn load(&mut self) {
        log::info!("Loading placeholder craft model...");
        self.loaded = true;
        log::info!("Model loaded successfully (version: {})", self.version);
    }

    #[allow(dead_code)]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn predict(&self, input: &Array4<f32>) -> Result<Prediction, ModelError> {
        self.predict_with_rng(input, &mut rand::rng())
    }

    pub fn predict_with_rng<R: Rng + ?Sized>(
        &self,
        input: &Array4<f32>,
        rng: &mut R,
    ) -> Result<Prediction, ModelError> {
        if !self.loaded {
            return Err(ModelError::NotLoaded);
        }
        let shape = input.shape();
        if shape[0] != 1 || shape[1] != 3 {
            return Err(ModelError::InvalidInput(format!(
                "expected tensor of shape [1, 3, H, W], got {:?}",
                shape
            )));
        }

        let mut order = self.classes.clone();
        order.shuffle(rng);

        let confidences = allocate_confidences(order.len(), |low, high| uniform(rng, low, high));
        let mut predictions: Vec<ClassPrediction> = order
            .into_iter()
            .zip(confidences)
            .map(|(class, confidence)| ClassPrediction {
                class,
                confidence: round4(confidence),
            })
            .collect();
        predictions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        Ok(Prediction {
            predictions,
            model_version: self.version.clone(),
        })
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            version: self.version.clone(),
            classes: self.classes.clone(),
            num_classes: self.classes.len(),
            is_loaded: self.loaded,
            model_type: MODEL_TYPE.to_string(),
        }
    }
}

/// Splits a budget of 1.0 across `count` slots in draw order.
///
/// Each slot but the last takes `draw(MIN_DRAW, cap)` from the remaining
/// budget; the last slot gets whatever is left, which is not floored at zero.
fn allocate_confidences<F>(count: usize, mut draw: F) -> Vec<f64>
where
    F: FnMut(f64, f64) -> f64,
{
    let mut remaining = 1.0;
    let mut confidences = Vec::with_capacity(count);
    for i in 0..count {
        if i + 1 == count {
            confidences.push(remaining);
        } else {
            let share = if i == 0 { LEAD_SHARE } else { TAIL_SHARE };
            let confidence = draw(MIN_DRAW, remaining * share);
            remaining -= confidence;
            confidences.push(confidence);
        }
    }
    confidences
}

/// `a + (b - a) * U[0, 1)`; valid when `b < a` as well.
fn uniform<R: Rng + ?Sized>(rng: &mut R, a: f64, b: f64) -> f64 {
    a + (b - a) * rng.random::<f64>()
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
