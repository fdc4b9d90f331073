/// Summary statistics over light curve flux
use crate::domain::{Series, Statistics};
use crate::errors::{ApiResult, PipelineError};

/// Median of the values, NaN entries skipped.
///
/// Even-length inputs average the two middle values. Returns `None` when no
/// value survives filtering.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if valid.is_empty() {
        return None;
    }

    valid.sort_by(|a, b| a.total_cmp(b));

    let mid = valid.len() / 2;
    let value = if valid.len() % 2 == 0 {
        (valid[mid - 1] + valid[mid]) / 2.0
    } else {
        valid[mid]
    };
    Some(value)
}

/// Summarize a series, failing when every sample is missing
pub fn summarize(series: &Series, target: &str) -> ApiResult<Statistics> {
    let fluxes: Vec<f64> = series.fluxes().collect();
    let median_flux =
        median(&fluxes).ok_or_else(|| PipelineError::EmptySeries(target.to_string()))?;

    Ok(Statistics {
        median_flux,
        usable_samples: fluxes.len(),
        missing_samples: series.len() - fluxes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Sample, Segment};

    fn series_of(fluxes: &[Option<f64>]) -> Series {
        let samples = fluxes
            .iter()
            .enumerate()
            .map(|(i, f)| Sample::new(i as f64, *f))
            .collect();
        Series::concat(vec![Segment::new("test", samples).unwrap()])
    }

    #[test]
    fn test_median_single_value() {
        assert_eq!(median(&[3.5]), Some(3.5));
    }

    #[test]
    fn test_median_even_count_averages_middle() {
        assert_eq!(median(&[2.0, 1.0]), Some(1.5));
    }

    #[test]
    fn test_median_odd_count() {
        assert_eq!(median(&[5.0, 1.0, 4.0, 2.0, 3.0]), Some(3.0));
    }

    #[test]
    fn test_median_skips_nan() {
        assert_eq!(median(&[f64::NAN, 1.0, 3.0]), Some(2.0));
        assert_eq!(median(&[f64::NAN]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_summarize_ignores_missing() {
        let series = series_of(&[Some(1.0), None, Some(3.0), Some(f64::NAN), Some(2.0)]);
        let stats = summarize(&series, "TIC 1").unwrap();

        assert_eq!(stats.median_flux, 2.0);
        assert_eq!(stats.usable_samples, 3);
        assert_eq!(stats.missing_samples, 2);
    }

    #[test]
    fn test_summarize_missing_is_not_zero() {
        // treating the gaps as zero would pull the median down to 0.0
        let series = series_of(&[Some(4.0), None, None, None, Some(6.0)]);
        assert_eq!(summarize(&series, "TIC 1").unwrap().median_flux, 5.0);
    }

    #[test]
    fn test_summarize_all_missing_fails() {
        let series = series_of(&[None, Some(f64::NAN), None]);
        assert!(matches!(
            summarize(&series, "TIC 1"),
            Err(PipelineError::EmptySeries(t)) if t == "TIC 1"
        ));
    }

    #[test]
    fn test_summarize_empty_series_fails() {
        assert!(matches!(
            summarize(&Series::default(), "TIC 1"),
            Err(PipelineError::EmptySeries(_))
        ));
    }
}
