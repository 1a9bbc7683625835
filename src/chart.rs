use svg;

use crate::models::TrendBucket;

struct Point {
    x: f64,
    y: f64,
}

struct SeriesStyle {
    stroke_color: &'static str,
    fill_color: &'static str,
}

const CREATED_COLOR: &str = "#4A90E2";
const RESOLVED_COLOR: &str = "#2ECC71";

pub struct TrendChart {
    width: i32,
    height: i32,
    margin: i32,
}

impl TrendChart {
    pub fn new(width: i32, height: i32, margin: i32) -> Self {
        TrendChart {
            width,
            height,
            margin,
        }
    }

    // Created and resolved counts per bucket as two stacked line series,
    // sharing one vertical scale.
    pub fn render(&self, buckets: &[TrendBucket]) -> String {
        let created: Vec<f64> = buckets.iter().map(|b| b.count as f64).collect();
        let resolved: Vec<f64> = buckets.iter().map(|b| b.resolved as f64).collect();
        let max_value = created
            .iter()
            .chain(resolved.iter())
            .fold(0.0f64, |acc, v| acc.max(*v));

        let series = vec![
            (
                self.scale(&created, max_value),
                SeriesStyle {
                    stroke_color: CREATED_COLOR,
                    fill_color: CREATED_COLOR,
                },
            ),
            (
                self.scale(&resolved, max_value),
                SeriesStyle {
                    stroke_color: RESOLVED_COLOR,
                    fill_color: RESOLVED_COLOR,
                },
            ),
        ];
        self.render_line_series(series)
    }

    fn scale(&self, values: &[f64], max_value: f64) -> Vec<Point> {
        let step = self.width as f64 / (values.len().max(2) - 1) as f64;
        values
            .iter()
            .enumerate()
            .map(|(index, value)| Point {
                x: index as f64 * step,
                y: if max_value == 0.0 {
                    self.height as f64
                } else {
                    self.height as f64 - value / max_value * self.height as f64
                },
            })
            .collect()
    }

    fn render_line_series(&self, series: Vec<(Vec<Point>, SeriesStyle)>) -> String {
        let mut document = svg::Document::new()
            .set(
                "viewBox",
                (
                    -self.margin,
                    -self.margin,
                    self.width + 2 * self.margin,
                    self.height + 2 * self.margin,
                ),
            )
            .set("width", self.width + 2 * self.margin)
            .set("height", self.height + 2 * self.margin);

        for (points, style) in series {
            if !points.is_empty() {
                document = document.add(self.filled_area(&points, style.fill_color));
                document = document.add(self.line_path(&points, style.stroke_color));
            }
        }

        document.to_string()
    }

    fn line_path(&self, points: &[Point], color: &str) -> svg::node::element::Path {
        let mut path_data = svg::node::element::path::Data::new();
        if let Some(first) = points.first() {
            path_data = path_data.move_to((first.x, first.y));
            for point in points {
                path_data = path_data.line_to((point.x, point.y));
            }
        }
        svg::node::element::Path::new()
            .set("d", path_data)
            .set("stroke", color)
            .set("stroke-width", "2")
            .set("fill", "none")
    }

    fn filled_area(&self, points: &[Point], color: &str) -> svg::node::element::Path {
        let mut path_data = svg::node::element::path::Data::new();
        if let Some(first) = points.first() {
            path_data = path_data.move_to((first.x, self.height as f64));
            path_data = path_data.line_to((first.x, first.y));
            for point in points {
                path_data = path_data.line_to((point.x, point.y));
            }
            if let Some(last) = points.last() {
                path_data = path_data.line_to((last.x, self.height as f64));
            }
            path_data = path_data.close();
        }
        svg::node::element::Path::new()
            .set("d", path_data)
            .set("fill", color)
            .set("fill-opacity", "0.5")
            .set("stroke", "none")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(period: &str, count: usize, resolved: usize) -> TrendBucket {
        TrendBucket {
            period: period.to_string(),
            count,
            story_points: 0.0,
            resolved,
        }
    }

    #[test]
    fn render_draws_a_path_per_series() {
        let chart = TrendChart::new(600, 200, 20);
        let svg_content = chart.render(&[
            bucket("2024-W01", 4, 1),
            bucket("2024-W02", 7, 3),
            bucket("2024-W03", 2, 2),
        ]);

        assert!(svg_content.starts_with("<svg"));
        assert!(svg_content.contains(CREATED_COLOR));
        assert!(svg_content.contains(RESOLVED_COLOR));
        assert_eq!(svg_content.matches("stroke-width").count(), 2);
    }

    #[test]
    fn empty_buckets_render_an_empty_document() {
        let chart = TrendChart::new(600, 200, 20);
        let svg_content = chart.render(&[]);
        assert!(!svg_content.contains("<path"));
    }
}
