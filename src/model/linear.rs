//! Linear models: least-squares regression and logistic classification.
//!
//! Coefficients are stored as `n_targets × n_features`, matching the layout
//! scikit-learn exports for `coef_`.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::{Model, ModelError, Prediction};

/// Affine decision function shared by both models.
#[derive(Debug, Clone)]
struct Affine {
    coefficients: Array2<f64>,
    intercept: Array1<f64>,
}

impl Affine {
    fn new(coefficients: Array2<f64>, intercept: Array1<f64>) -> Result<Self, String> {
        if coefficients.nrows() == 0 || coefficients.ncols() == 0 {
            return Err("coefficients must be a non-empty matrix".to_string());
        }
        if intercept.len() != coefficients.nrows() {
            return Err(format!(
                "intercept has {} values but coefficients have {} rows",
                intercept.len(),
                coefficients.nrows()
            ));
        }
        if coefficients.iter().chain(intercept.iter()).any(|x| !x.is_finite()) {
            return Err("coefficients and intercept must be finite".to_string());
        }
        Ok(Self {
            coefficients,
            intercept,
        })
    }

    fn n_features(&self) -> usize {
        self.coefficients.ncols()
    }

    fn n_targets(&self) -> usize {
        self.coefficients.nrows()
    }

    fn check_width(&self, input: &ArrayView2<'_, f64>) -> Result<(), ModelError> {
        if input.ncols() != self.n_features() {
            return Err(ModelError::ShapeMismatch {
                expected: self.n_features(),
                got: input.ncols(),
            });
        }
        Ok(())
    }

    /// `intercept + x · w`, accumulated left to right over the features.
    fn score(&self, row: ArrayView1<'_, f64>, target: usize) -> f64 {
        row.iter()
            .zip(self.coefficients.row(target).iter())
            .fold(self.intercept[target], |acc, (x, w)| acc + x * w)
    }

    fn decision_function(&self, input: ArrayView2<'_, f64>) -> Array2<f64> {
        Array2::from_shape_fn((input.nrows(), self.n_targets()), |(r, t)| {
            self.score(input.row(r), t)
        })
    }
}

/// Ordinary linear regression.
///
/// Single-target models return a 1-D prediction, multi-target models a 2-D one.
#[derive(Debug, Clone)]
pub struct LinearRegression {
    affine: Affine,
}

impl LinearRegression {
    pub fn new(coefficients: Array2<f64>, intercept: Array1<f64>) -> Result<Self, String> {
        Ok(Self {
            affine: Affine::new(coefficients, intercept)?,
        })
    }

    pub fn n_targets(&self) -> usize {
        self.affine.n_targets()
    }
}

impl Model for LinearRegression {
    fn predict(&self, input: ArrayView2<'_, f64>) -> Result<Prediction, ModelError> {
        self.affine.check_width(&input)?;
        let scores = self.affine.decision_function(input);
        if self.n_targets() == 1 {
            Ok(Prediction::Vector(scores.column(0).to_owned()))
        } else {
            Ok(Prediction::Matrix(scores))
        }
    }

    fn n_features(&self) -> usize {
        self.affine.n_features()
    }

    fn kind(&self) -> &'static str {
        "linear_regression"
    }
}

/// Logistic regression classifier returning class labels.
///
/// One coefficient row means a binary model thresholded at zero; otherwise
/// the label of the highest-scoring row wins (first on ties).
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    affine: Affine,
    classes: Vec<f64>,
}

impl LogisticRegression {
    pub fn new(
        coefficients: Array2<f64>,
        intercept: Array1<f64>,
        classes: Vec<f64>,
    ) -> Result<Self, String> {
        let affine = Affine::new(coefficients, intercept)?;
        let expected = if affine.n_targets() == 1 {
            2
        } else {
            affine.n_targets()
        };
        if classes.len() != expected {
            return Err(format!(
                "expected {expected} class labels, found {}",
                classes.len()
            ));
        }
        if classes.iter().any(|c| !c.is_finite()) {
            return Err("class labels must be finite".to_string());
        }
        Ok(Self { affine, classes })
    }

    fn label_for(&self, scores: ArrayView1<'_, f64>) -> f64 {
        if scores.len() == 1 {
            return self.classes[usize::from(scores[0] > 0.0)];
        }
        let mut best = 0;
        for (i, s) in scores.iter().enumerate().skip(1) {
            if *s > scores[best] {
                best = i;
            }
        }
        self.classes[best]
    }
}

impl Model for LogisticRegression {
    fn predict(&self, input: ArrayView2<'_, f64>) -> Result<Prediction, ModelError> {
        self.affine.check_width(&input)?;
        let scores = self.affine.decision_function(input);
        let labels: Array1<f64> = scores.outer_iter().map(|row| self.label_for(row)).collect();
        Ok(Prediction::Vector(labels))
    }

    fn n_features(&self) -> usize {
        self.affine.n_features()
    }

    fn kind(&self) -> &'static str {
        "logistic_regression"
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_sum_model() {
        let model = LinearRegression::new(array![[1.0, 1.0, 1.0]], array![0.0]).unwrap();
        let out = model.predict(array![[1.0, 2.5, 3.3]].view()).unwrap();
        assert_eq!(out, Prediction::Vector(array![6.8]));
    }

    #[test]
    fn test_multi_target_is_matrix() {
        let model =
            LinearRegression::new(array![[1.0, 0.0], [0.0, 2.0]], array![0.5, -1.0]).unwrap();
        let out = model.predict(array![[3.0, 4.0]].view()).unwrap();
        assert_eq!(out, Prediction::Matrix(array![[3.5, 7.0]]));
    }

    #[test]
    fn test_shape_mismatch() {
        let model = LinearRegression::new(array![[1.0, 1.0]], array![0.0]).unwrap();
        let err = model.predict(array![[1.0, 2.0, 3.0]].view()).unwrap_err();
        assert_eq!(
            err,
            ModelError::ShapeMismatch {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn test_rejects_bad_intercept() {
        assert!(LinearRegression::new(array![[1.0, 1.0]], array![0.0, 1.0]).is_err());
        assert!(LinearRegression::new(Array2::zeros((1, 0)), array![0.0]).is_err());
    }

    #[test]
    fn test_binary_logistic() {
        let model =
            LogisticRegression::new(array![[1.0, -1.0]], array![0.0], vec![0.0, 1.0]).unwrap();
        let out = model
            .predict(array![[2.0, 1.0], [1.0, 2.0], [1.0, 1.0]].view())
            .unwrap();
        // A zero score falls on the negative class.
        assert_eq!(out, Prediction::Vector(array![1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_multiclass_logistic_argmax() {
        let model = LogisticRegression::new(
            array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]],
            array![0.0, 0.0, 0.0],
            vec![10.0, 20.0, 30.0],
        )
        .unwrap();
        let out = model.predict(array![[0.0, 5.0], [3.0, 3.0]].view()).unwrap();
        assert_eq!(out, Prediction::Vector(array![20.0, 10.0]));
    }

    #[test]
    fn test_logistic_class_count_checked() {
        let err = LogisticRegression::new(array![[1.0]], array![0.0], vec![0.0]).unwrap_err();
        assert!(err.contains("expected 2 class labels"));
    }
}
