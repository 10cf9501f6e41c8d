use std::str::FromStr;

use crate::dataset::Channel;

pub fn channel_parser(s: &str) -> Result<Channel, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Channel string cannot be empty".to_string());
    }

    match s.to_ascii_lowercase().as_str() {
        "voltage" | "v" => return Ok(Channel::Voltage),
        "current" | "i" => return Ok(Channel::Current),
        _ => {}
    }

    let index_str = s
        .strip_prefix("therm_")
        .or_else(|| s.strip_prefix("therm"))
        .unwrap_or(s);
    index_str
        .parse::<usize>()
        .map(Channel::Thermistor)
        .map_err(|_| format!("Invalid channel '{}': expected voltage, current or a thermistor index", s))
}

pub fn positive_parser(s: &str) -> Result<f64, String> {
    let s = s.trim();
    f64::from_str(s)
        .map_err(|e| format!("Invalid value '{}': {}", s, e))
        .and_then(|v| {
            if v.is_finite() && v > 0.0 {
                Ok(v)
            } else {
                Err(format!("Value must be positive, got {}", v))
            }
        })
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `start, start + step, ...` up to but excluding `stop`.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || stop <= start {
        return Vec::new();
    }
    let n = ((stop - start) / step).ceil() as usize;
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// Moving average with valid-convolution semantics: output `j` averages
/// `values[j..j + window]`, so the result has `len - window + 1` entries and
/// is empty when the window does not fit.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || window > values.len() {
        return Vec::new();
    }

    let w = window as f64;
    let mut out = Vec::with_capacity(values.len() - window + 1);
    let mut sum: f64 = values[..window].iter().sum();
    out.push(sum / w);
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        out.push(sum / w);
    }
    out
}

/// Rolling root-mean-square over `window` samples (valid semantics).
pub fn rolling_rms(values: &[f64], window: usize) -> Vec<f64> {
    let squares: Vec<f64> = values.iter().map(|&x| x * x).collect();
    rolling_mean(&squares, window)
        .into_iter()
        .map(|ms| ms.max(0.0).sqrt())
        .collect()
}

/// Index range `[lo, hi)` covered by a centred kernel of width `window` at
/// output position `i`, clipped to `len`. Matches the alignment of a
/// same-length convolution.
fn centred_span(i: usize, window: usize, len: usize) -> (usize, usize) {
    let lo = i.saturating_sub(window / 2);
    let hi = (i + (window - 1) / 2 + 1).min(len);
    (lo, hi)
}

/// Same-length centred moving average. Near the edges only the samples under
/// the kernel are averaged.
pub fn centred_moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return values.to_vec();
    }

    let mut prefix = Vec::with_capacity(values.len() + 1);
    prefix.push(0.0);
    for &v in values {
        let last = *prefix.last().unwrap_or(&0.0);
        prefix.push(last + v);
    }

    (0..values.len())
        .map(|i| {
            let (lo, hi) = centred_span(i, window, values.len());
            (prefix[hi] - prefix[lo]) / (hi - lo) as f64
        })
        .collect()
}

/// Same-length centred convolution with a constant kernel of `weight`,
/// zero padded at the edges. No normalisation is applied.
pub fn centred_box_sum(values: &[f64], window: usize, weight: f64) -> Vec<f64> {
    if window == 0 {
        return vec![0.0; values.len()];
    }

    (0..values.len())
        .map(|i| {
            let (lo, hi) = centred_span(i, window, values.len());
            values[lo..hi].iter().sum::<f64>() * weight
        })
        .collect()
}
