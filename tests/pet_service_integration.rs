//! Pet CRUD, auth and mood summaries against the HTTP backend

mod common;

use std::sync::atomic::Ordering;

use chrono::NaiveDate;
use common::{MockBackend, photo};
use emoticat::AppContext;
use emoticat::errors::{ApiError, AppError};
use emoticat::models::PetForm;

#[tokio::test]
async fn add_pet_without_image_is_rejected_locally() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let context = AppContext::initialize(backend.config(dir.path())).await.unwrap();

    let form = PetForm {
        name: "Mochi".to_string(),
        breed: Some("Tabby".to_string()),
        ..PetForm::default()
    };
    let err = context.pet_service.add_pet(form).await.unwrap_err();

    assert!(matches!(err, AppError::Validation { .. }));
    assert_eq!(backend.state.pet_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn add_pet_sends_multipart_with_profile_jpeg() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let context = AppContext::initialize(backend.config(dir.path())).await.unwrap();

    let form = PetForm {
        name: "Mochi".to_string(),
        breed: Some("Tabby".to_string()),
        birthday: NaiveDate::from_ymd_opt(2021, 4, 2),
        image: Some(photo()),
    };
    let pet = context.pet_service.add_pet(form).await.unwrap();

    assert_eq!(pet.id, 100);
    assert_eq!(pet.name, "Mochi");
    assert_eq!(pet.birthday, NaiveDate::from_ymd_opt(2021, 4, 2));
    assert!(context.pets.contains(100).await);

    let fields = backend.state.last_pet_fields.lock().unwrap().clone();
    assert_eq!(fields, vec!["name", "breed", "birthday", "image"]);

    let jpeg = backend.state.last_pet_image.lock().unwrap().clone().unwrap();
    let decoded = image::load_from_memory(&jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (384, 384));
}

#[tokio::test]
async fn list_cache_and_removal() {
    let backend = MockBackend::start().await;
    backend.state.add_pet(1, "Mochi");
    backend.state.add_pet(2, "Tofu");
    let dir = tempfile::tempdir().unwrap();
    let context = AppContext::initialize(backend.config(dir.path())).await.unwrap();

    let pets = context.pet_service.list_pets(false).await.unwrap();
    assert_eq!(pets.len(), 2);
    assert_eq!(pets[0].birthday, NaiveDate::from_ymd_opt(2020, 3, 14));
    context.pet_service.list_pets(false).await.unwrap();
    assert_eq!(backend.state.pet_requests.load(Ordering::SeqCst), 1);

    context.pet_service.remove_pet(2).await.unwrap();
    let pets = context.pet_service.list_pets(false).await.unwrap();
    assert_eq!(pets.len(), 1);
    assert_eq!(backend.state.pet_requests.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn missing_pet_is_a_status_error() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let context = AppContext::initialize(backend.config(dir.path())).await.unwrap();

    let err = context.pet_service.pet_details(404).await.unwrap_err();
    assert!(matches!(err, AppError::Api(ApiError::Status { status: 404, .. })));
}

#[tokio::test]
async fn login_persists_session_across_restart() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();

    let context = AppContext::initialize(backend.config(dir.path())).await.unwrap();
    assert!(context.auth.login("mochi_owner", "nope").await.is_err());
    context.auth.login("mochi_owner", "whiskers").await.unwrap();

    let restarted = AppContext::initialize(backend.config(dir.path())).await.unwrap();
    assert_eq!(
        restarted.session.bearer().await.as_deref(),
        Some("tok-mochi_owner")
    );

    restarted.pet_service.list_pets(true).await.unwrap();
    let seen = backend.state.authorization.lock().unwrap().clone();
    assert_eq!(seen.last().unwrap().as_deref(), Some("Bearer tok-mochi_owner"));

    restarted.auth.logout().await.unwrap();
    restarted.pet_service.list_pets(true).await.unwrap();
    let seen = backend.state.authorization.lock().unwrap().clone();
    assert_eq!(seen.last().unwrap(), &None);
}
