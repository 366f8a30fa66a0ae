use paymentsvc::application::lifecycle::PaymentService;
use paymentsvc::domain::payment::{PaymentRequest, PaymentStatus};
use paymentsvc::error::{PaymentError, PaymentRef, StoreError};
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

mod common;
use common::{CountingStore, UnavailableStore};

fn card_request(order_id: Uuid) -> PaymentRequest {
    PaymentRequest {
        order_id: Some(order_id),
        amount: dec!(9.90),
        method: "CARD".to_string(),
    }
}

#[tokio::test]
async fn test_create_scenario() {
    let store = Arc::new(CountingStore::new());
    let service = PaymentService::new(store.clone());
    let order = Uuid::new_v4();

    let first = service.create(card_request(order)).await.unwrap();
    assert_eq!(first.status, PaymentStatus::Pending);
    assert_eq!(first.amount.value(), dec!(9.90));
    assert_eq!(first.order_id, order);

    let second = service.create(card_request(order)).await.unwrap_err();
    match second {
        PaymentError::AlreadyExists {
            order_id,
            payment_id,
        } => {
            assert_eq!(order_id, order);
            assert_eq!(payment_id, first.id);
        }
        other => panic!("expected AlreadyExists, got {other:?}"),
    }

    // the duplicate is caught before any insert is attempted
    assert_eq!(store.inserts(), 1);
    assert_eq!(service.get_by_order_id(order).await.unwrap(), first);
}

#[tokio::test]
async fn test_process_twice_writes_once() {
    let store = Arc::new(CountingStore::new());
    let service = PaymentService::new(store.clone());
    let created = service.create(card_request(Uuid::new_v4())).await.unwrap();

    let first = service.process(created.id).await.unwrap();
    assert_eq!(first.status, PaymentStatus::Successful);
    assert_eq!(store.updates(), 1);

    let second = service.process(created.id).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(store.updates(), 1);
}

#[tokio::test]
async fn test_process_leaves_failed_payment_alone() {
    let store = Arc::new(CountingStore::new());
    let service = PaymentService::new(store.clone());
    let created = service.create(card_request(Uuid::new_v4())).await.unwrap();
    let failed = service
        .update_status(created.id, PaymentStatus::Failed)
        .await
        .unwrap();

    let result = service.process(created.id).await.unwrap();

    assert_eq!(result.status, PaymentStatus::Failed);
    assert_eq!(result.updated_on, failed.updated_on);
    assert_eq!(store.updates(), 1);
}

#[tokio::test]
async fn test_direct_update_leaves_terminal_state() {
    let store = Arc::new(CountingStore::new());
    let service = PaymentService::new(store);
    let created = service.create(card_request(Uuid::new_v4())).await.unwrap();
    let processed = service.process(created.id).await.unwrap();
    assert_eq!(processed.status, PaymentStatus::Successful);

    let failed = service
        .update_status(created.id, PaymentStatus::Failed)
        .await
        .unwrap();
    assert_eq!(failed.status, PaymentStatus::Failed);
    assert!(failed.updated_on >= processed.updated_on);

    let pending_again = service
        .update_status(created.id, PaymentStatus::Pending)
        .await
        .unwrap();
    assert_eq!(pending_again.status, PaymentStatus::Pending);
    assert_eq!(pending_again.created_on, created.created_on);
    assert_eq!(pending_again.amount, created.amount);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let service = PaymentService::new(Arc::new(CountingStore::new()));
    let unknown = Uuid::new_v4();

    assert!(matches!(
        service.get(unknown).await,
        Err(PaymentError::NotFound(PaymentRef::Id(id))) if id == unknown
    ));
    assert!(matches!(
        service.process(unknown).await,
        Err(PaymentError::NotFound(_))
    ));
    assert!(matches!(
        service.update_status(unknown, PaymentStatus::Successful).await,
        Err(PaymentError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_not_found_message() {
    let service = PaymentService::new(Arc::new(CountingStore::new()));
    let order = Uuid::new_v4();

    let err = service.get_by_order_id(order).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("Payment for order [{order}] not found.")
    );
}

#[tokio::test]
async fn test_validation_errors_do_not_touch_store() {
    let store = Arc::new(CountingStore::new());
    let service = PaymentService::new(store.clone());

    for request in [
        PaymentRequest {
            order_id: None,
            amount: dec!(1),
            method: "CARD".to_string(),
        },
        PaymentRequest {
            order_id: Some(Uuid::new_v4()),
            amount: dec!(0),
            method: "CARD".to_string(),
        },
        PaymentRequest {
            order_id: Some(Uuid::new_v4()),
            amount: dec!(1),
            method: String::new(),
        },
    ] {
        assert!(matches!(
            service.create(request).await,
            Err(PaymentError::ValidationError(_))
        ));
    }

    assert_eq!(store.inserts(), 0);
}

#[tokio::test]
async fn test_store_failures_propagate_unchanged() {
    let service = PaymentService::new(Arc::new(UnavailableStore));

    assert!(matches!(
        service.create(card_request(Uuid::new_v4())).await,
        Err(PaymentError::Store(StoreError::Unavailable(_)))
    ));
    assert!(matches!(
        service.get(Uuid::new_v4()).await,
        Err(PaymentError::Store(StoreError::Unavailable(_)))
    ));
    assert!(matches!(
        service.process(Uuid::new_v4()).await,
        Err(PaymentError::Store(StoreError::Unavailable(_)))
    ));
}
