//! Trend removal for analysis windows

use crate::config::DetrendMode;

/// Remove a constant offset or a least-squares linear trend in place.
///
/// One mode per call; the cascade never mixes modes within a window.
pub fn detrend(data: &mut [f32], mode: DetrendMode) {
    if data.len() < 2 {
        return;
    }

    match mode {
        DetrendMode::Constant => {
            let mean = (data.iter().map(|&x| x as f64).sum::<f64>() / data.len() as f64) as f32;
            for x in data.iter_mut() {
                *x -= mean;
            }
        }
        DetrendMode::Linear => {
            // Least-squares line over sample indices, f64 accumulators to
            // keep long windows exact
            let n = data.len() as f64;
            let t_mean = (n - 1.0) / 2.0;
            let x_mean = data.iter().map(|&x| x as f64).sum::<f64>() / n;

            let mut covariance = 0.0f64;
            for (i, &x) in data.iter().enumerate() {
                covariance += (i as f64 - t_mean) * (x as f64 - x_mean);
            }
            // sum of (i - t_mean)^2 has a closed form
            let t_variance = n * (n * n - 1.0) / 12.0;
            let slope = covariance / t_variance;

            for (i, x) in data.iter_mut().enumerate() {
                *x -= (x_mean + slope * (i as f64 - t_mean)) as f32;
            }
        }
    }
}
