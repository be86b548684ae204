use super::literal::{float_list, float_literal};
use super::writer::CWriter;
use super::header;
use crate::error::{Error, Result};
use crate::model::ModelFamily;

/// `float predict(const float *x)` computing `intercept + Σ coef[i] * x[i]`.
pub(super) fn generate(intercept: f64, coefficients: &[f64]) -> Result<String> {
    if coefficients.is_empty() {
        return Err(Error::EmptyCoefficients);
    }
    let n = coefficients.len();

    let mut w = CWriter::new();
    header(
        &mut w,
        &format!("{}, {} features", ModelFamily::Linear, n),
        "Parameters",
    );
    w.blank();
    weighted_sum(&mut w, "float predict(const float *x) {", "result", intercept, coefficients)?;
    w.line("return result;");
    w.close("}");

    Ok(w.finish())
}

/// Open a function and accumulate `intercept + Σ coef[i] * x[i]` into `acc`.
/// The caller emits the return and closes the function.
pub(super) fn weighted_sum(
    w: &mut CWriter,
    signature: &str,
    acc: &str,
    intercept: f64,
    coefficients: &[f64],
) -> Result<()> {
    let n = coefficients.len();
    w.open(signature);
    w.line(&format!(
        "static const float coefficients[{}] = {{{}}};",
        n,
        float_list(coefficients)?
    ));
    w.line(&format!("float {} = {};", acc, float_literal(intercept)?));
    w.open(&format!("for (int i = 0; i < {}; i++) {{", n));
    w.line(&format!("{} += coefficients[i] * x[i];", acc));
    w.close("}");
    Ok(())
}
