use serde::{Deserialize, Serialize};

/// A model score paired with the domain it was computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub domain: String,
    /// Raw model output; conceptually the probability the domain is DGA-generated.
    pub probability: f32,
}

impl Prediction {
    /// Zip domains with their scores. Both slices must be in input order.
    pub fn zip<S: AsRef<str>>(domains: &[S], scores: &[f32]) -> Vec<Self> {
        domains
            .iter()
            .zip(scores)
            .map(|(domain, &probability)| Self {
                domain: domain.as_ref().to_string(),
                probability,
            })
            .collect()
    }
}
