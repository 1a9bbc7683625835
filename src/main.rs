mod aggregate;
mod chart;
mod collector;
mod fetcher;
mod filter;
mod jira_client;
mod models;
mod normalize;
mod routes;
mod store;
mod transport;

use std::sync::Arc;

use collector::collect_data;
use jira_client::JiraClient;
use store::IssueStore;

#[derive(Clone)]
struct AppState {
    store: Arc<IssueStore>,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let store = Arc::new(IssueStore::new());

    let collector_store = store.clone();
    tokio::spawn(async move {
        run_data_collector(collector_store).await;
    });

    let state = AppState { store };

    let app = axum::Router::new()
        .route("/", axum::routing::get(routes::root::root))
        .route("/api/issues", axum::routing::get(routes::stats::issues))
        .route("/api/filters", axum::routing::get(routes::stats::filter_options))
        .route("/api/stats/summary", axum::routing::get(routes::stats::summary))
        .route("/api/dashboard", axum::routing::post(routes::stats::dashboard))
        .route("/api/trend/creation", axum::routing::get(routes::stats::creation_trend))
        .route("/api/trend/resolution", axum::routing::get(routes::stats::resolution_trend))
        .route("/charts/trend/{period}", axum::routing::get(routes::trend_chart::trend_svg))
        .nest_service("/static", tower_http::services::ServeDir::new("static"))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("Could not bind to port 8080");
    axum::serve(listener, app)
        .await
        .expect("Could not start server");
}

async fn run_data_collector(store: Arc<IssueStore>) {
    let jira_client = JiraClient::new();
    let interval_minutes = std::env::var("REFRESH_INTERVAL_MINUTES")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(10);
    loop {
        if let Err(e) = collect_data(&jira_client, &store).await {
            println!("Error collecting data: {}", e);
        }

        println!("Sleeping for {} minutes...", interval_minutes);
        tokio::time::sleep(tokio::time::Duration::from_secs(interval_minutes * 60)).await;
    }
}
