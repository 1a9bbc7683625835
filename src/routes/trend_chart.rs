use crate::aggregate::{self, TrendPeriod};
use crate::chart::TrendChart;
use crate::AppState;

pub async fn trend_svg(
    axum::extract::State(state): axum::extract::State<AppState>,
    axum::extract::Path(period): axum::extract::Path<String>,
) -> impl axum::response::IntoResponse {
    let issues = state.store.snapshot().await;
    let period = TrendPeriod::parse(period.trim_end_matches(".svg")).unwrap_or(TrendPeriod::Week);
    let buckets = aggregate::creation_trend(&issues, period);
    let svg_content = TrendChart::new(600, 200, 20).render(&buckets);

    (
        [(axum::http::header::CONTENT_TYPE, "image/svg+xml")],
        svg_content,
    )
}
