use std::sync::Arc;

use axum::extract::State;

use crate::AppState;

/// Handler for the route listing (GET / and GET /home)
pub async fn index_handler(State(state): State<Arc<AppState>>) -> String {
    format!(
        "Available Routes:\n\
         {base}/api/v1.0/precipitation\n\
         {base}/api/v1.0/stations\n\
         {base}/api/v1.0/tobs\n\
         {base}/api/v1.0/{{start_date}}\n\
         {base}/api/v1.0/{{start_date}}/{{end_date}}\n\
         {base}/docs\n",
        base = state.remote_url
    )
}
