//! Terminal rendering

use super::Report;
use std::fmt;

const BAR_WIDTH: usize = 30;

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "  Health Prediction Results")?;
        writeln!(f, "{}", "=".repeat(50))?;

        let p = &self.best_params;
        writeln!(
            f,
            "\nBest Parameters: learning_rate={}, max_depth={}, n_estimators={} (CV R² {:.4})",
            p.learning_rate, p.max_depth, p.n_estimators, self.best_cv_score
        )?;
        writeln!(f, "Mean Squared Error: {:.4}", self.test_metrics.mse)?;
        writeln!(f, "R² Score: {:.4}", self.test_metrics.r2)?;
        writeln!(f, "Predicted Health Score: {:.2}", self.predicted_score)?;

        writeln!(f, "\nFeature Importances")?;
        writeln!(f, "{}", "-".repeat(40))?;
        for item in &self.feature_importances {
            let filled = (item.importance.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
            writeln!(
                f,
                "{:<20} {:>6.3} {}",
                item.feature,
                item.importance,
                "#".repeat(filled)
            )?;
        }

        writeln!(f, "\nPrediction vs Actual ({} test rows)", self.predictions.len())?;
        writeln!(f, "{}", "-".repeat(40))?;
        writeln!(f, "{:>12} {:>12} {:>10}", "Actual", "Predicted", "Error")?;
        for point in &self.predictions {
            writeln!(
                f,
                "{:>12.2} {:>12.2} {:>10.2}",
                point.actual,
                point.predicted,
                point.predicted - point.actual
            )?;
        }

        let s = &self.summary;
        writeln!(
            f,
            "\nRows: {} read, {} dropped, {} engineered ({} train / {} test)",
            s.rows_read, s.rows_dropped, s.rows_engineered, s.train_rows, s.test_rows
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::report::fixtures::sample_report;

    #[test]
    fn test_sections_in_order() {
        let text = sample_report().to_string();

        let order = [
            "Best Parameters",
            "Mean Squared Error",
            "R² Score",
            "Predicted Health Score: 78.25",
            "Feature Importances",
            "Prediction vs Actual",
        ];
        let positions: Vec<usize> = order.iter().map(|s| text.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
