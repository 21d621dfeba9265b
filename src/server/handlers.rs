use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::entities::{DailySummary, TimeStore};

use super::{error::ReportError, AppState};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDataBody {
    pub user_id: String,
    #[serde(default)]
    pub time_data: TimeStore,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SaveDataResponse {
    pub success: bool,
}

pub async fn save_data(
    State(state): State<AppState>,
    Json(body): Json<SaveDataBody>,
) -> Result<Json<SaveDataResponse>, ReportError> {
    info!("Saving {} days for {}", body.time_data.0.len(), body.user_id);
    state.users.save(&body.user_id, body.time_data).await?;
    Ok(Json(SaveDataResponse { success: true }))
}

pub async fn get_data(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<TimeStore>, ReportError> {
    Ok(Json(state.users.time_data(&user_id).await?))
}

pub async fn weekly_report(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<DailySummary>>, ReportError> {
    Ok(Json(state.users.weekly_report(&user_id).await?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{
        server::{router, users::UserRepository, AppState},
        storage::document_store::MemoryDocumentStore,
    };

    fn app() -> Router {
        router(AppState {
            users: UserRepository::new(Arc::new(MemoryDocumentStore::new())),
        })
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn save(body: Value) -> Request<Body> {
        Request::post("/api/save-data")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn it_should_return_404_for_unknown_users() {
        let app = app();

        let (status, json) = send(&app, get("/api/get-data/unknown")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, json!({ "error": "User not found" }));

        let (status, json) = send(&app, get("/api/weekly-report/unknown")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, json!({ "error": "User not found" }));
    }

    #[tokio::test]
    async fn it_should_save_and_return_time_data() {
        let app = app();
        let day = json!({
            "productive": 120,
            "unproductive": 300,
            "neutral": 0,
            "domains": {
                "github.com": { "time": 120, "productive": true },
                "facebook.com": { "time": 300, "productive": false }
            }
        });

        let (status, json) = send(
            &app,
            save(json!({ "userId": "u-1", "timeData": { "2018-07-04": day.clone() } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "success": true }));

        let (status, json) = send(&app, get("/api/get-data/u-1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "2018-07-04": day }));
    }

    #[tokio::test]
    async fn it_should_replace_days_sent_twice() {
        let app = app();
        send(
            &app,
            save(json!({ "userId": "u-1", "timeData": {
                "2018-07-04": { "productive": 10, "unproductive": 5, "neutral": 1, "domains": {} },
                "2018-07-05": { "productive": 1, "unproductive": 1, "neutral": 1, "domains": {} }
            }})),
        )
        .await;
        send(
            &app,
            save(json!({ "userId": "u-1", "timeData": {
                "2018-07-05": { "neutral": 9 }
            }})),
        )
        .await;

        let (status, json) = send(&app, get("/api/weekly-report/u-1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!([
                { "date": "2018-07-04", "productive": 10, "unproductive": 5, "neutral": 1 },
                { "date": "2018-07-05", "productive": 0, "unproductive": 0, "neutral": 9 }
            ])
        );
    }

    #[tokio::test]
    async fn it_should_read_null_totals_as_zero() {
        let app = app();
        let (status, _) = send(
            &app,
            save(json!({ "userId": "u-2", "timeData": {
                "2018-07-04": { "productive": 4, "unproductive": null, "neutral": null }
            }})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = send(&app, get("/api/weekly-report/u-2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!([{ "date": "2018-07-04", "productive": 4, "unproductive": 0, "neutral": 0 }])
        );
    }

    #[tokio::test]
    async fn it_should_reject_malformed_bodies() {
        let app = app();
        let request = Request::post("/api/save-data")
            .header("content-type", "application/json")
            .body(Body::from("not-json"))
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert!(status.is_client_error());

        let (status, _) = send(&app, save(json!({ "timeData": {} }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
