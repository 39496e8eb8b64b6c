//! Local client behaviour against a mock frame.

mod support;

use axum::extract::{Multipart, Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use meural_client::{ClientConfig, LocalClient, MediaId, MeuralError, Orientation, UploadOutcome};
use serde_json::json;

use support::{Recorder, closed_address, serve};

fn client_for(addr: std::net::SocketAddr) -> LocalClient {
    LocalClient::new(
        reqwest::Client::new(),
        &addr.to_string(),
        "Hall",
        &ClientConfig::default(),
    )
}

/// Frames answer with JSON labelled as HTML.
fn html_json(body: serde_json::Value) -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/html")], body.to_string())
}

#[tokio::test]
async fn should_report_device_turned_off_when_connection_is_refused() {
    let client = client_for(closed_address().await);

    let err = client.get_sleep().await.unwrap_err();
    assert!(matches!(err, MeuralError::DeviceTurnedOff(_)));
    assert!(err.is_device_off());

    let err = client.key_right().await.unwrap_err();
    assert!(err.is_device_off());
}

#[tokio::test]
async fn should_parse_json_served_with_wrong_content_type() {
    let router = Router::new().route(
        "/remote/control_check/sleep/",
        get(|| async { html_json(json!({ "status": "pass", "response": true })) }),
    );
    let client = client_for(serve(router).await);

    assert!(client.get_sleep().await.unwrap());
}

#[tokio::test]
async fn should_propagate_http_status_errors_unchanged() {
    let router = Router::new().route(
        "/remote/control_check/system/",
        get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let client = client_for(serve(router).await);

    let err = client.get_system().await.unwrap_err();
    assert!(matches!(err, MeuralError::Http(_)));
    assert_eq!(err.status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
}

#[tokio::test]
async fn should_decode_gallery_status_and_items() {
    let router = Router::new()
        .route(
            "/remote/get_gallery_status_json/",
            get(|| async {
                html_json(json!({ "status": "pass", "response": {
                    "current_gallery": "154",
                    "current_gallery_name": "Impressionists",
                    "current_item": "8812"
                }}))
            }),
        )
        .route(
            "/remote/get_frame_items_by_gallery_json/{id}",
            get(|Path(id): Path<String>| async move {
                html_json(json!({ "status": "pass", "response": [
                    { "id": 8812, "title": format!("first of {id}") },
                    { "id": 8813, "title": "second" }
                ]}))
            }),
        );
    let client = client_for(serve(router).await);

    let status = client.get_gallery_status().await.unwrap();
    assert_eq!(status.current_gallery, MediaId::from(154));
    assert_eq!(status.current_gallery_name, "Impressionists");
    assert!(!status.is_sd_card_gallery());

    let items = client
        .get_items_by_gallery(&status.current_gallery)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, MediaId::from("8812"));
    assert_eq!(items[0].title.as_deref(), Some("first of 154"));
}

#[tokio::test]
async fn should_build_command_paths() {
    let recorder = Recorder::default();
    let router = Router::new()
        .route(
            "/remote/control_command/set_backlight/{level}/",
            get(|State(r): State<Recorder>, Path(level): Path<u8>| async move {
                r.push(format!("backlight:{level}"));
                html_json(json!({ "status": "pass", "response": null }))
            }),
        )
        .route(
            "/remote/control_command/set_orientation/{value}",
            get(|State(r): State<Recorder>, Path(value): Path<String>| async move {
                r.push(format!("orientation:{value}"));
                html_json(json!({ "status": "pass", "response": null }))
            }),
        )
        .route(
            "/remote/control_command/change_gallery/{id}",
            get(|State(r): State<Recorder>, Path(id): Path<String>| async move {
                r.push(format!("gallery:{id}"));
                html_json(json!({ "status": "pass", "response": null }))
            }),
        )
        .with_state(recorder.clone());
    let client = client_for(serve(router).await);

    client.set_backlight(35).await.unwrap();
    client.set_orientation(Orientation::Portrait).await.unwrap();
    client.change_gallery(&MediaId::from(3)).await.unwrap();

    assert_eq!(
        recorder.entries(),
        vec!["backlight:35", "orientation:portrait", "gallery:3"]
    );
}

// ---------------------------------------------------------------------------
// postcard
// ---------------------------------------------------------------------------

async fn accept_postcard(
    State(recorder): State<Recorder>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        recorder.push(format!("{name}:{content_type}"));
    }
    html_json(json!({ "status": "pass", "response": "displaying" }))
}

#[tokio::test]
async fn should_send_jpg_postcard_as_jpeg() {
    let recorder = Recorder::default();
    let router = Router::new()
        .route("/art.jpg", get(|| async { vec![1_u8, 2, 3] }))
        .route("/remote/postcard", post(accept_postcard))
        .with_state(recorder.clone());
    let addr = serve(router).await;
    let client = client_for(addr);

    let outcome = client
        .send_postcard(&format!("http://{addr}/art.jpg"), "image/jpg")
        .await
        .unwrap();

    assert_eq!(outcome, UploadOutcome::Accepted);
    assert_eq!(recorder.entries(), vec!["photo:image/jpeg"]);
}

#[tokio::test]
async fn should_return_rejected_outcome_when_frame_refuses_postcard() {
    let router = Router::new()
        .route("/art.png", get(|| async { vec![1_u8, 2, 3] }))
        .route(
            "/remote/postcard",
            post(|| async { html_json(json!({ "status": "fail", "response": "unsupported" })) }),
        );
    let addr = serve(router).await;
    let client = client_for(addr);

    let outcome = client
        .send_postcard(&format!("http://{addr}/art.png"), "image/png")
        .await
        .unwrap();

    assert!(!outcome.is_accepted());
    assert_eq!(
        outcome,
        UploadOutcome::Rejected {
            status: "fail".to_string(),
            response: json!("unsupported"),
        }
    );
}
