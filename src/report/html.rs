//! Self-contained HTML page with inline SVG charts

use super::Report;
use std::fmt::{self, Write as _};

const CHART_WIDTH: f64 = 640.0;
const CHART_HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 60.0;
const TICKS: usize = 5;

/// Viridis stops, dark to light
const VIRIDIS: [&str; 9] = [
    "#440154", "#472d7b", "#3b528b", "#2c728e", "#21918c", "#28ae80", "#5ec962", "#addc30", "#fde725",
];

const STYLE: &str = "body{font-family:sans-serif;max-width:760px;margin:2rem auto;color:#262730}\
h1{font-size:1.8rem}h2{font-size:1.3rem;margin-top:2rem}\
.metric{margin:.3rem 0}.metric b{display:inline-block;min-width:12rem}\
svg text{font-size:11px;fill:#444}";

/// Render the report as a complete HTML document
pub fn render_html(report: &Report) -> String {
    let mut out = String::new();
    // Writing into a String only fails if a Display impl does
    match write_page(&mut out, report) {
        Ok(()) => out,
        Err(fmt::Error) => String::new(),
    }
}

fn write_page(out: &mut String, report: &Report) -> fmt::Result {
    let p = &report.best_params;

    write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Health Prediction Results</title>\n<style>{}</style>\n</head>\n<body>\n\
         <h1>Health Prediction Results</h1>\n",
        STYLE
    )?;

    writeln!(
        out,
        "<p class=\"metric\"><b>Best Parameters:</b> learning_rate={}, max_depth={}, n_estimators={}</p>",
        p.learning_rate, p.max_depth, p.n_estimators
    )?;
    writeln!(
        out,
        "<p class=\"metric\"><b>Mean Squared Error:</b> {:.4}</p>",
        report.test_metrics.mse
    )?;
    writeln!(out, "<p class=\"metric\"><b>R² Score:</b> {:.4}</p>", report.test_metrics.r2)?;
    writeln!(
        out,
        "<p class=\"metric\"><b>Predicted Health Score:</b> {:.2}</p>",
        report.predicted_score
    )?;

    out.push_str("<h2>Feature Importances</h2>\n");
    importance_chart(out, report)?;
    out.push_str("<h2>Prediction vs Actual</h2>\n");
    scatter_chart(out, report)?;
    out.push_str("</body>\n</html>\n");

    Ok(())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn viridis(i: usize, n: usize) -> &'static str {
    if n <= 1 {
        return VIRIDIS[0];
    }
    VIRIDIS[i * (VIRIDIS.len() - 1) / (n - 1)]
}

fn svg_open(out: &mut String, label: &str) -> fmt::Result {
    writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {w} {h}\" width=\"{w}\" height=\"{h}\" role=\"img\" aria-label=\"{label}\">",
        w = CHART_WIDTH,
        h = CHART_HEIGHT,
        label = label
    )
}

fn plot_width() -> f64 {
    CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

/// Linear map from `[lo, hi]` onto `[start, start + len]`
fn scale(v: f64, lo: f64, hi: f64, start: f64, len: f64) -> f64 {
    if hi > lo {
        start + (v - lo) / (hi - lo) * len
    } else {
        start + len / 2.0
    }
}

fn importance_chart(out: &mut String, report: &Report) -> fmt::Result {
    svg_open(out, "Feature importance bar chart")?;

    let n = report.feature_importances.len();
    let max = report
        .feature_importances
        .iter()
        .map(|f| f.importance)
        .fold(0.0_f64, f64::max);
    let y_max = if max > 0.0 { max } else { 1.0 };
    let base_y = MARGIN_TOP + plot_height();

    y_axis(out, 0.0, y_max, |v| base_y - v / y_max * plot_height())?;

    let slot = plot_width() / n.max(1) as f64;
    for (i, item) in report.feature_importances.iter().enumerate() {
        let height = item.importance.max(0.0) / y_max * plot_height();
        let x = MARGIN_LEFT + i as f64 * slot + slot * 0.1;
        writeln!(
            out,
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"><title>{}: {:.3}</title></rect>",
            x,
            base_y - height,
            slot * 0.8,
            height,
            viridis(i, n),
            escape(&item.feature),
            item.importance
        )?;
        writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{}</text>",
            x + slot * 0.4,
            base_y + 16.0,
            escape(&item.feature)
        )?;
    }

    out.push_str("</svg>\n");
    Ok(())
}

fn scatter_chart(out: &mut String, report: &Report) -> fmt::Result {
    svg_open(out, "Predicted versus actual sleepscore")?;

    let (a_lo, a_hi) = report.actual_range().unwrap_or((0.0, 1.0));
    let (p_lo, p_hi) = report
        .predictions
        .iter()
        .fold((a_lo, a_hi), |(lo, hi), p| (lo.min(p.predicted), hi.max(p.predicted)));

    let to_x = |v: f64| scale(v, a_lo, a_hi, MARGIN_LEFT, plot_width());
    let to_y = |v: f64| MARGIN_TOP + plot_height() - (scale(v, p_lo, p_hi, 0.0, plot_height()));

    y_axis(out, p_lo, p_hi, to_y)?;
    x_axis(out, a_lo, a_hi, to_x)?;

    for point in &report.predictions {
        writeln!(
            out,
            "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"4\" fill=\"#1f77b4\" fill-opacity=\"0.5\"/>",
            to_x(point.actual),
            to_y(point.predicted)
        )?;
    }

    writeln!(
        out,
        "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"red\" stroke-dasharray=\"6,4\"/>",
        to_x(a_lo),
        to_y(a_lo),
        to_x(a_hi),
        to_y(a_hi)
    )?;

    writeln!(
        out,
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">Actual Sleepscore</text>",
        MARGIN_LEFT + plot_width() / 2.0,
        CHART_HEIGHT - 12.0
    )?;
    writeln!(
        out,
        "<text x=\"16\" y=\"{:.1}\" text-anchor=\"middle\" transform=\"rotate(-90 16 {:.1})\">Predicted Sleepscore</text>",
        MARGIN_TOP + plot_height() / 2.0,
        MARGIN_TOP + plot_height() / 2.0
    )?;

    out.push_str("</svg>\n");
    Ok(())
}

fn ticks(lo: f64, hi: f64) -> impl Iterator<Item = f64> {
    (0..=TICKS).map(move |i| lo + (hi - lo) * i as f64 / TICKS as f64)
}

fn y_axis(out: &mut String, lo: f64, hi: f64, to_y: impl Fn(f64) -> f64) -> fmt::Result {
    let base_y = MARGIN_TOP + plot_height();
    writeln!(
        out,
        "<line x1=\"{x:.1}\" y1=\"{top:.1}\" x2=\"{x:.1}\" y2=\"{base:.1}\" stroke=\"#888\"/>",
        x = MARGIN_LEFT,
        top = MARGIN_TOP,
        base = base_y
    )?;
    writeln!(
        out,
        "<line x1=\"{:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#888\"/>",
        MARGIN_LEFT,
        MARGIN_LEFT + plot_width(),
        y = base_y
    )?;
    for v in ticks(lo, hi) {
        writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">{:.2}</text>",
            MARGIN_LEFT - 6.0,
            to_y(v) + 4.0,
            v
        )?;
    }
    Ok(())
}

fn x_axis(out: &mut String, lo: f64, hi: f64, to_x: impl Fn(f64) -> f64) -> fmt::Result {
    let base_y = MARGIN_TOP + plot_height();
    for v in ticks(lo, hi) {
        writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{:.1}</text>",
            to_x(v),
            base_y + 16.0,
            v
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::sample_report;

    #[test]
    fn test_page_sections_in_order() {
        let html = render_html(&sample_report());

        let order = [
            "Best Parameters",
            "Mean Squared Error",
            "R² Score",
            "Predicted Health Score",
            "<h2>Feature Importances</h2>",
            "<h2>Prediction vs Actual</h2>",
        ];
        let positions: Vec<usize> = order.iter().map(|s| html.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_charts() {
        let report = sample_report();
        let html = render_html(&report);

        assert_eq!(html.matches("<rect").count(), report.feature_importances.len());
        assert_eq!(html.matches("<circle").count(), report.predictions.len());
        assert!(html.contains("stroke=\"red\" stroke-dasharray"));
        assert!(html.contains("Actual Sleepscore"));
        assert!(html.contains("Predicted Sleepscore"));
        assert!(html.contains(VIRIDIS[0]));
        assert!(html.contains(VIRIDIS[8]));
    }

    #[test]
    fn test_page_writer_returns_ok() {
        let mut out = String::new();
        assert!(write_page(&mut out, &sample_report()).is_ok());
        assert_eq!(out, render_html(&sample_report()));
        assert!(out.ends_with("</html>\n"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b & \"c\">"), "a&lt;b &amp; &quot;c&quot;&gt;");
    }

    #[test]
    fn test_scale_degenerate_range() {
        assert_eq!(scale(5.0, 5.0, 5.0, 10.0, 100.0), 60.0);
        assert_eq!(scale(7.5, 5.0, 10.0, 0.0, 100.0), 50.0);
    }
}
