//! Orphaned-picture sweeps over in-memory stores.

mod support;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use rstest::rstest;
use serde_json::Value;

use profile_registry::domain::{
    ContentType, EmailAddress, FirstName, NewUser, PasswordHash, PhoneNumber, ProfilePicture,
    ReconciliationReport, UserId,
};
use profile_registry::server::{build_reconciler, sweep_once};
use support::{PNG_BYTES, Stores, ana_form, fast_retry, init_app};

fn png() -> ProfilePicture {
    ProfilePicture::new(
        PNG_BYTES.to_vec(),
        Some(ContentType::new("image/png").expect("valid content type")),
    )
    .expect("non-empty picture")
}

fn seeded_user(name: &str) -> NewUser {
    NewUser {
        first_name: FirstName::new(name).expect("valid first name"),
        email: EmailAddress::new(format!("{}@x.com", name.to_lowercase())).expect("valid email"),
        phone: PhoneNumber::new("555").expect("valid phone"),
        password_hash: PasswordHash::new("plain$p").expect("valid hash"),
    }
}

#[rstest]
#[actix_web::test]
async fn sweep_removes_only_orphaned_pictures() {
    let stores = Stores::default();
    let owner = stores.users.seed(seeded_user("Ana"));
    stores.pictures.seed(owner, png());
    let orphan = UserId::new(99).expect("positive id");
    stores.pictures.seed(orphan, png());

    let report = sweep_once(&build_reconciler(&stores.ports(), &fast_retry())).await;

    assert_eq!(
        report,
        Some(ReconciliationReport {
            scanned: 2,
            removed: 1,
            failed: 0,
        })
    );
    assert!(stores.pictures.contains(owner));
    assert!(!stores.pictures.contains(orphan));
}

#[rstest]
#[actix_web::test]
async fn late_picture_write_after_rollback_is_swept() {
    let stores = Stores::default();
    let app = init_app(&stores).await;
    stores.pictures.fail_puts(true);
    let response = test::call_service(&app, ana_form().into_request("/register").to_request()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    // The rolled-back user had id 1; a delayed write now lands for it.
    let rolled_back = UserId::new(1).expect("positive id");
    stores.pictures.seed(rolled_back, png());

    let report = sweep_once(&build_reconciler(&stores.ports(), &fast_retry()))
        .await
        .expect("sweep succeeds");
    assert_eq!(report.removed, 1);
    assert_eq!(stores.pictures.len(), 0);

    let listed: Value =
        test::call_and_read_body_json(&app, TestRequest::get().uri("/users").to_request()).await;
    assert_eq!(listed, Value::Array(Vec::new()));
}

#[rstest]
#[actix_web::test]
async fn sweep_with_no_pictures_reports_nothing() {
    let stores = Stores::default();
    stores.users.seed(seeded_user("Ana"));

    let report = sweep_once(&build_reconciler(&stores.ports(), &fast_retry())).await;

    assert_eq!(report, Some(ReconciliationReport::default()));
}
