//! In-process fake EmotiCat backend for HTTP-level tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use serde_json::{Value, json};

use emoticat::config::Config;

#[derive(Default)]
pub struct MockState {
    pub image_fetches: AtomicUsize,
    pub analyze_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub pet_requests: AtomicUsize,
    /// Label returned by the analysis endpoint
    pub analyze_label: Mutex<String>,
    pub embed_details: AtomicBool,
    pub authorization: Mutex<Vec<Option<String>>>,
    pub pets: Mutex<Vec<Value>>,
    pub last_pet_fields: Mutex<Vec<String>>,
    pub last_pet_image: Mutex<Option<Vec<u8>>>,
}

impl MockState {
    pub fn set_label(&self, label: &str) {
        *self.analyze_label.lock().unwrap() = label.to_string();
    }

    pub fn add_pet(&self, id: i64, name: &str) {
        self.pets.lock().unwrap().push(json!({
            "id": id,
            "name": name,
            "breed": "Tabby",
            "birthday": "2020-03-14T00:00:00.000Z",
            "imageKey": format!("pets/{id}.jpg"),
            "emotionHistory": []
        }));
    }

    /// Append a history entry with `label` as stored server side
    pub fn add_record(&self, id: i64, label: &str, timestamp: i64) {
        let mut pets = self.pets.lock().unwrap();
        if let Some(pet) = pets.iter_mut().find(|p| p["id"] == id)
            && let Some(history) = pet["emotionHistory"].as_array_mut()
        {
            history.push(json!({
                "image": format!("analyzed/{timestamp}.jpg"),
                "emotion": label,
                "emotionText": format!("Feeling {label}"),
                "tipsAndRecs": [],
                "timestamp": timestamp
            }));
        }
    }

    fn record_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.authorization.lock().unwrap().push(value);
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        state.set_label("Happy");

        let app = Router::new()
            .route("/pet-image/{*key}", get(pet_image))
            .route("/analyze-cat", post(analyze))
            .route("/get-emotion-details", post(emotion_details))
            .route("/pets", get(list_pets).post(create_pet))
            .route("/pets/{id}", get(get_pet).delete(delete_pet))
            .route("/login", post(login))
            .route("/register", post(login))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Client configuration pointing at this backend, storing under `data_dir`
    pub fn config(&self, data_dir: &std::path::Path) -> Config {
        Config::for_base_url(&self.base_url, data_dir)
    }
}

/// Small PNG photo
pub fn photo() -> Vec<u8> {
    let img = image::RgbImage::from_fn(48, 32, |x, y| image::Rgb([x as u8 * 5, y as u8 * 7, 90]));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

async fn pet_image(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    state.record_auth(&headers);
    state.image_fetches.fetch_add(1, Ordering::SeqCst);
    if key.starts_with("missing") {
        return (StatusCode::NOT_FOUND, "no such image").into_response();
    }
    format!("image:{key}").into_response()
}

async fn analyze(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record_auth(&headers);
    let call = state.analyze_calls.fetch_add(1, Ordering::SeqCst) + 1;

    let image = body["image"].as_str().unwrap_or_default();
    let Ok(jpeg) = base64::engine::general_purpose::STANDARD.decode(image) else {
        return (StatusCode::BAD_REQUEST, "image is not base64").into_response();
    };
    if !jpeg.starts_with(&[0xFF, 0xD8]) || body["petId"].as_i64().is_none() {
        return (StatusCode::BAD_REQUEST, "expected a JPEG and a pet id").into_response();
    }

    let label = state.analyze_label.lock().unwrap().clone();
    if label.starts_with("ERROR:") {
        return Json(json!({ "message": label })).into_response();
    }

    let mut response = json!({
        "message": label,
        "imageKey": format!("analyzed/{call}.jpg"),
    });
    if state.embed_details.load(Ordering::SeqCst) {
        response["emotionDetails"] = json!({
            "description": format!("Embedded description for {label}"),
            "tipsAndRecs": ["Embedded tip"]
        });
    }
    Json(response).into_response()
}

async fn emotion_details(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.detail_calls.fetch_add(1, Ordering::SeqCst);
    let emotion = body["emotion"].as_str().unwrap_or_default();
    Json(json!({
        "description": format!("Your cat is feeling {emotion}"),
        "tipsAndRecs": ["Offer a quiet spot", "Keep play sessions short"]
    }))
}

async fn list_pets(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Json<Value> {
    state.record_auth(&headers);
    state.pet_requests.fetch_add(1, Ordering::SeqCst);
    Json(Value::Array(state.pets.lock().unwrap().clone()))
}

async fn get_pet(State(state): State<Arc<MockState>>, Path(id): Path<i64>) -> Response {
    state.pet_requests.fetch_add(1, Ordering::SeqCst);
    let pets = state.pets.lock().unwrap();
    match pets.iter().find(|p| p["id"] == id) {
        Some(pet) => Json(json!({ "pet": pet })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_pet(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Response {
    state.pet_requests.fetch_add(1, Ordering::SeqCst);

    let mut fields = Vec::new();
    let mut name = String::new();
    let mut breed = Value::Null;
    let mut birthday = Value::Null;
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap_or_default();
        match field_name.as_str() {
            "name" => name = String::from_utf8_lossy(&bytes).to_string(),
            "breed" => breed = json!(String::from_utf8_lossy(&bytes)),
            "birthday" => birthday = json!(String::from_utf8_lossy(&bytes)),
            "image" => *state.last_pet_image.lock().unwrap() = Some(bytes.to_vec()),
            _ => {}
        }
        fields.push(field_name);
    }
    *state.last_pet_fields.lock().unwrap() = fields;

    let mut pets = state.pets.lock().unwrap();
    let id = 100 + pets.len() as i64;
    let pet = json!({
        "id": id,
        "name": name,
        "breed": breed,
        "birthday": birthday,
        "image_key": format!("pets/{id}.jpg"),
        "emotionHistory": []
    });
    pets.push(pet.clone());
    (StatusCode::CREATED, Json(json!({ "pet": pet }))).into_response()
}

async fn delete_pet(State(state): State<Arc<MockState>>, Path(id): Path<i64>) -> StatusCode {
    state.pet_requests.fetch_add(1, Ordering::SeqCst);
    state.pets.lock().unwrap().retain(|p| p["id"] != id);
    StatusCode::NO_CONTENT
}

async fn login(Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    if body["password"].as_str() != Some("whiskers") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid credentials" })))
            .into_response();
    }
    Json(json!({ "token": format!("tok-{username}"), "username": username })).into_response()
}
