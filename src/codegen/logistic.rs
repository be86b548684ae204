use super::linear::weighted_sum;
use super::writer::CWriter;
use super::header;
use crate::error::{Error, Result};
use crate::model::ModelFamily;

/// Sigmoid helper, decision function, and a thresholded `predict`.
///
/// The class boundary is `sigmoid(z) >= 0.5f`: a probability of exactly one
/// half is class 1.
pub(super) fn generate(intercept: f64, coefficients: &[f64]) -> Result<String> {
    if coefficients.is_empty() {
        return Err(Error::EmptyCoefficients);
    }
    let n = coefficients.len();

    let mut w = CWriter::new();
    header(
        &mut w,
        &format!("{}, {} features", ModelFamily::Logistic, n),
        "Parameters",
    );
    w.blank();
    w.line("#include <math.h>");
    w.blank();

    w.open("float sigmoid(float z) {");
    w.line("return 1.0f / (1.0f + expf(-z));");
    w.close("}");
    w.blank();

    weighted_sum(
        &mut w,
        "float decision_function(const float *x) {",
        "z",
        intercept,
        coefficients,
    )?;
    w.line("return z;");
    w.close("}");
    w.blank();

    w.open("int predict(const float *x) {");
    w.line("return sigmoid(decision_function(x)) >= 0.5f ? 1 : 0;");
    w.close("}");

    Ok(w.finish())
}
