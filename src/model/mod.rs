use ndarray::{Array1, ArrayView2};

use crate::error::Result;
use crate::parsing::Dataset;

pub mod forest;
pub mod tree;

pub trait Model {
    fn fit(&mut self, dataset: &Dataset) -> Result<()>;
    fn predict(&self, inputs: &ArrayView2<f64>) -> Array1<f64>;
}
