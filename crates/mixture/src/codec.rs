use super::*;
use emgmm_core::*;

/// Plain-text parameter layout.
///
/// ```text
/// w_0 … w_{K-1}
/// μ_0,0 … μ_0,D-1        ┐
/// …                      │ K mean lines
/// μ_K-1,0 … μ_K-1,D-1    ┘
/// σ²_0,0 … σ²_0,D-1      ┐
/// …                      │ K variance lines
/// σ²_K-1,0 … σ²_K-1,D-1  ┘
/// ```
///
/// Values are written with [`PARAMETER_DECIMALS`] decimal places, so
/// decoding reproduces every parameter to within [`PARAMETER_TOLERANCE`].
/// A positive weight or variance that would round to zero at that precision is
/// written in exponent form instead, keeping it positive on decode.
impl Mixture {
    pub fn encode(&self) -> String {
        let line = |xs: &[Feature], positive: bool| {
            xs.iter()
                .map(|x| {
                    let fixed = format!("{:.*}", PARAMETER_DECIMALS, x);
                    match positive && *x > 0. && fixed.parse::<Feature>() == Ok(0.) {
                        true => format!("{:.*e}", PARAMETER_DECIMALS, x),
                        false => fixed,
                    }
                })
                .collect::<Vec<String>>()
                .join(" ")
        };
        std::iter::once(line(self.weights(), true))
            .chain(self.means().iter().map(|m| line(m.as_slice(), false)))
            .chain(self.variances().iter().map(|v| line(v.as_slice(), true)))
            .map(|l| l + "\n")
            .collect()
    }

    /// Parses parameters for a model of known shape.
    ///
    /// Every line must hold exactly the expected number of finite reals;
    /// weights must be non-negative and variances positive. Trailing blank
    /// lines are tolerated, anything else beyond the last variance line is not.
    pub fn decode(text: &str, dim: usize, components: usize) -> Result<Self> {
        if dim == 0 || components == 0 {
            return Err(Error::InvalidShape { dim, components });
        }
        let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));
        let mut next = |width: usize, what: &str| -> Result<Vec<Feature>> {
            let (n, line) = lines.next().ok_or_else(|| Error::MalformedParameterFile {
                line: 0,
                reason: format!("missing {} line", what),
            })?;
            parse(n, line, width)
        };
        let weights = next(components, "weight")?;
        let means = (0..components)
            .map(|_| next(dim, "mean"))
            .collect::<Result<Vec<Vec<Feature>>>>()?;
        let variances = (0..components)
            .map(|_| next(dim, "variance"))
            .collect::<Result<Vec<Vec<Feature>>>>()?;
        drop(next);
        if let Some((n, _)) = lines.find(|(_, l)| !l.trim().is_empty()) {
            return Err(Error::MalformedParameterFile {
                line: n,
                reason: "unexpected content after variances".into(),
            });
        }
        if let Some(i) = weights.iter().position(|w| *w < 0.) {
            return Err(Error::MalformedParameterFile {
                line: 1,
                reason: format!("negative weight for component {}", i),
            });
        }
        if let Some((i, _)) = variances
            .iter()
            .enumerate()
            .find(|(_, row)| row.iter().any(|v| !(*v > 0.)))
        {
            return Err(Error::MalformedParameterFile {
                line: 2 + components + i,
                reason: "variances must be positive".into(),
            });
        }
        Self::from_parts(weights, means, variances)
    }
}

/// Splits one line into exactly `width` finite reals.
fn parse(n: usize, line: &str, width: usize) -> Result<Vec<Feature>> {
    let tokens = line.split_whitespace().collect::<Vec<&str>>();
    if tokens.len() != width {
        return Err(Error::MalformedParameterFile {
            line: n,
            reason: format!("expected {} values, found {}", width, tokens.len()),
        });
    }
    tokens
        .into_iter()
        .map(|token| match token.parse::<Feature>() {
            Ok(x) if x.is_finite() => Ok(x),
            _ => Err(Error::MalformedParameterFile {
                line: n,
                reason: format!("not a finite real: {:?}", token),
            }),
        })
        .collect()
}
