//! Forecast model
//!
//! Pure functions behind the `ewma-lr-v2` model: a weighted congestion
//! score per bucket, an ordinary least-squares trend over the lookback
//! window, an EWMA blend of extrapolation and current observation, and a
//! time-of-day multiplier. Everything is computed in f64 and only the
//! final score is clamped.

/// Speed at which the speed term contributes zero congestion (km/h).
pub const MAX_SPEED_KMH: f64 = 90.0;

/// Flow rate that saturates the flow term (vehicles/min).
pub const MAX_FLOW_RATE: f64 = 120.0;

/// EWMA blending factor (higher = more weight on the extrapolation).
pub const EWMA_ALPHA: f64 = 0.7;

/// Samples at which sample confidence saturates.
const CONFIDENCE_SATURATION_SAMPLES: f64 = 50.0;

/// One aggregated bucket positioned inside the lookback window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketPoint {
    /// Minutes since the window start
    pub offset_min: f64,
    pub avg_speed: f64,
    pub avg_occupancy: f64,
    pub avg_flow: f64,
}

/// Final score and confidence for one road.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadForecast {
    /// In [0, 1], rounded to 3 decimals
    pub congestion_score: f64,
    /// In [0, 1], rounded to 2 decimals
    pub confidence: f64,
}

/// Weighted congestion score from bucket aggregates, clamped to [0, 1].
pub fn congestion_score(avg_speed: f64, avg_occupancy: f64, avg_flow: f64) -> f64 {
    let speed_score = 1.0 - (avg_speed / MAX_SPEED_KMH);
    let occupancy_score = avg_occupancy;
    let flow_score = avg_flow / MAX_FLOW_RATE;

    clamp01(0.4 * speed_score + 0.4 * occupancy_score + 0.2 * flow_score)
}

/// Exponentially weighted blend of extrapolated and current values.
pub fn ewma(predicted: f64, current: f64, alpha: f64) -> f64 {
    alpha * predicted + (1.0 - alpha) * current
}

/// Time-of-day congestion multiplier.
pub fn rush_hour_factor(hour: u32) -> f64 {
    match hour {
        7..9 | 17..19 => 1.15,
        21.. | ..6 => 0.85,
        _ => 1.0,
    }
}

/// Ordinary least-squares fit of `y = slope * x + intercept`.
///
/// Degenerate inputs (fewer than two points, or no variance in x) fall
/// back to a flat line through the first observation.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    if xs.len() < 2 || ys.len() < 2 {
        return (0.0, ys.first().copied().unwrap_or(0.0));
    }

    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        covariance += (x - x_mean) * (y - y_mean);
        variance += (x - x_mean) * (x - x_mean);
    }

    if variance == 0.0 {
        return (0.0, ys[0]);
    }

    let slope = covariance / variance;
    (slope, y_mean - slope * x_mean)
}

/// Forecast one road from its ordered buckets.
///
/// With at least two buckets the trend is extrapolated to
/// `lookback + horizon` minutes past the window start and blended with the
/// newest observation; a single bucket carries its own score forward. The
/// rush multiplier applies in both paths and the result is clamped.
pub fn forecast_road(
    buckets: &[BucketPoint],
    total_samples: i64,
    lookback_min: i64,
    horizon_min: i32,
    hour: u32,
) -> Option<RoadForecast> {
    let last = buckets.last()?;
    let current = congestion_score(last.avg_speed, last.avg_occupancy, last.avg_flow);

    let distinct_offsets = buckets
        .windows(2)
        .any(|pair| pair[0].offset_min != pair[1].offset_min);

    let (blended, trend_stability) = if buckets.len() >= 2 && distinct_offsets {
        let xs: Vec<f64> = buckets.iter().map(|b| b.offset_min).collect();
        let ys: Vec<f64> = buckets
            .iter()
            .map(|b| congestion_score(b.avg_speed, b.avg_occupancy, b.avg_flow))
            .collect();

        let (slope, intercept) = fit_line(&xs, &ys);
        let future_x = lookback_min as f64 + f64::from(horizon_min);
        let predicted = slope * future_x + intercept;

        // Steep trends mean volatile data, so discount confidence.
        let stability = (1.0 - slope.abs() * 10.0).max(0.3);

        (ewma(predicted, current, EWMA_ALPHA), stability)
    } else {
        (current, 0.5)
    };

    let final_score = clamp01(blended * rush_hour_factor(hour));

    let sample_confidence = (total_samples as f64 / CONFIDENCE_SATURATION_SAMPLES).min(1.0);
    let confidence = sample_confidence * trend_stability;

    Some(RoadForecast {
        congestion_score: round_to(final_score, 1000.0),
        confidence: round_to(confidence, 100.0),
    })
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

fn round_to(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(offset_min: f64, speed: f64, occupancy: f64, flow: f64) -> BucketPoint {
        BucketPoint {
            offset_min,
            avg_speed: speed,
            avg_occupancy: occupancy,
            avg_flow: flow,
        }
    }

    /// Buckets whose congestion scores land exactly on `ys`: zero out the
    /// speed/flow terms and let occupancy carry the score.
    fn buckets_with_scores(ys: &[f64]) -> Vec<BucketPoint> {
        ys.iter()
            .enumerate()
            .map(|(i, y)| bucket(i as f64 * 5.0, MAX_SPEED_KMH, y / 0.4, 0.0))
            .collect()
    }

    #[test]
    fn test_congestion_score_ranges() {
        let cases = [
            (80.0, 0.1, 20.0, 0.0, 0.15),  // free flow
            (10.0, 0.9, 100.0, 0.85, 1.0), // heavy congestion
            (45.0, 0.5, 60.0, 0.3, 0.6),   // moderate
            (0.0, 0.0, 0.0, 0.4, 0.4),     // zero values
            (MAX_SPEED_KMH, 0.0, 0.0, 0.0, 0.01),
        ];
        for (speed, occ, flow, lo, hi) in cases {
            let score = congestion_score(speed, occ, flow);
            assert!(
                (lo..=hi).contains(&score),
                "congestion({speed}, {occ}, {flow}) = {score}, want [{lo}, {hi}]"
            );
        }
    }

    #[test]
    fn test_congestion_score_clamped() {
        assert_eq!(congestion_score(0.0, 1.5, 200.0), 1.0);
        assert_eq!(congestion_score(200.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_congestion_score_weights() {
        let score = congestion_score(45.0, 0.5, 60.0);
        assert!((score - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_ewma_laws() {
        assert_eq!(ewma(0.8, 0.3, 1.0), 0.8);
        assert_eq!(ewma(0.8, 0.3, 0.0), 0.3);
        assert!((ewma(0.8, 0.2, 0.5) - 0.5).abs() < 1e-12);
        assert!((ewma(1.0, 0.0, 0.7) - 0.7).abs() < 1e-12);
        // ewma(x, x, alpha) = x for any alpha
        for alpha in [0.0, 0.3, 0.7, 1.0] {
            assert!((ewma(0.5, 0.5, alpha) - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rush_hour_factor_exhaustive() {
        for hour in 0..24 {
            let want = match hour {
                7 | 8 | 17 | 18 => 1.15,
                21 | 22 | 23 | 0 | 1 | 2 | 3 | 4 | 5 => 0.85,
                _ => 1.0,
            };
            assert_eq!(rush_hour_factor(hour), want, "hour {hour}");
        }
    }

    #[test]
    fn test_fit_line_recovers_linear_series() {
        let xs = [0.0, 5.0, 10.0, 15.0, 20.0, 25.0];
        let ys = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let (slope, intercept) = fit_line(&xs, &ys);
        assert!((slope - 0.02).abs() < 0.001);
        assert!((intercept - 0.1).abs() < 0.001);

        // Extrapolation at x=60: y = 0.02*60 + 0.1 = 1.3
        assert!((slope * 60.0 + intercept - 1.3).abs() < 0.01);
    }

    #[test]
    fn test_fit_line_constant_series() {
        let xs = [0.0, 5.0, 10.0, 15.0, 20.0, 25.0];
        let ys = [0.5; 6];
        let (slope, intercept) = fit_line(&xs, &ys);
        assert!(slope.abs() < 1e-12);
        assert!((intercept - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_fit_line_negative_trend() {
        let xs = [0.0, 5.0, 10.0, 15.0, 20.0, 25.0];
        let ys = [0.9, 0.8, 0.7, 0.6, 0.5, 0.4];
        let (slope, _) = fit_line(&xs, &ys);
        assert!(slope < 0.0);
    }

    #[test]
    fn test_fit_line_degenerate_inputs() {
        assert_eq!(fit_line(&[5.0], &[0.6]), (0.0, 0.6));
        assert_eq!(fit_line(&[], &[]), (0.0, 0.0));
        // No variance in x
        assert_eq!(fit_line(&[3.0, 3.0], &[0.2, 0.8]), (0.0, 0.2));
    }

    #[test]
    fn test_forecast_increasing_trend_at_noon() {
        // ys = [0.2, 0.3, 0.35, 0.4, 0.45, 0.5] over xs = 0..25 step 5:
        // slope ~ 0.0117, intercept ~ 0.2119, predicted(60) ~ 0.915,
        // blended ~ 0.79, final ~ 0.79 at hour 12.
        let buckets = buckets_with_scores(&[0.2, 0.3, 0.35, 0.4, 0.45, 0.5]);
        let forecast = forecast_road(&buckets, 60, 30, 30, 12).unwrap();

        assert!(forecast.congestion_score > 0.5, "must exceed current 0.5");
        assert!((forecast.congestion_score - 0.80).abs() < 0.02);
        assert!(forecast.confidence > 0.0 && forecast.confidence <= 1.0);
    }

    #[test]
    fn test_forecast_decreasing_trend_predicts_lower() {
        let buckets = buckets_with_scores(&[0.8, 0.7, 0.65, 0.6, 0.55, 0.5]);
        let forecast = forecast_road(&buckets, 60, 30, 30, 12).unwrap();
        assert!(forecast.congestion_score < 0.5);
    }

    #[test]
    fn test_forecast_flat_series_in_rush_hour() {
        // Flat 0.4 series at hour 8: blended = 0.4, final = 0.4 * 1.15.
        let buckets = buckets_with_scores(&[0.4; 6]);
        let forecast = forecast_road(&buckets, 60, 30, 30, 8).unwrap();
        assert!((forecast.congestion_score - 0.46).abs() < 1e-9);
    }

    #[test]
    fn test_forecast_always_clamped() {
        // Steep upward trend extrapolates past 1.0 and rush hour boosts it
        // further; the final score must stay in [0, 1].
        let buckets = buckets_with_scores(&[0.5, 0.6, 0.7, 0.8, 0.9, 1.0]);
        let forecast = forecast_road(&buckets, 300, 30, 30, 8).unwrap();
        assert!(forecast.congestion_score <= 1.0);
        assert!(forecast.congestion_score >= 0.0);
    }

    #[test]
    fn test_forecast_single_bucket_path() {
        let buckets = buckets_with_scores(&[0.6]);
        let forecast = forecast_road(&buckets, 10, 30, 30, 12).unwrap();
        // current * 1.0, stability 0.5, sample confidence 10/50
        assert!((forecast.congestion_score - 0.6).abs() < 1e-9);
        assert!((forecast.confidence - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_forecast_no_buckets() {
        assert!(forecast_road(&[], 0, 30, 30, 12).is_none());
    }

    #[test]
    fn test_confidence_saturates_at_fifty_samples() {
        let buckets = buckets_with_scores(&[0.4; 6]);
        let at_50 = forecast_road(&buckets, 50, 30, 30, 12).unwrap();
        let at_500 = forecast_road(&buckets, 500, 30, 30, 12).unwrap();
        assert_eq!(at_50.confidence, at_500.confidence);
        assert_eq!(at_50.confidence, 1.0); // flat series: stability 1.0
    }
}
