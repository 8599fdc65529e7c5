// Stats module - per-frame track summaries
//
// Tracks are summarised by their mean and population standard deviation
// across frames. Accumulation is done in f64.

/// Mean and population standard deviation of a track
///
/// Empty tracks summarise to `(0.0, 0.0)`.
pub fn mean_std<I>(values: I) -> (f32, f32)
where
    I: IntoIterator<Item = f32>,
{
    let values: Vec<f64> = values.into_iter().map(f64::from).collect();
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean as f32, variance.sqrt() as f32)
}
