use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use backoffice_engine::{
    db_types::OrderStatusType,
    helpers::encode_hex,
    CheckoutApiError,
    OrderFlowApi,
};
use bo_common::{Paise, Secret};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;

use super::mocks::*;
use crate::{
    config::PaymentConfig,
    integrations::{GatewayError, GatewayOrder},
    routes::{CreateGatewayOrderRoute, VerifyPaymentRoute},
};

const GATEWAY_SECRET: &str = "s3cret";

fn sign(gateway_order_id: &str, gateway_payment_id: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(GATEWAY_SECRET.as_bytes()).unwrap();
    mac.update(format!("{gateway_order_id}|{gateway_payment_id}").as_bytes());
    encode_hex(&mac.finalize().into_bytes())
}

fn configure_app(orders_mock: MockBackend, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let payment_config = PaymentConfig {
            api_url: "http://gateway.invalid".to_string(),
            key_id: "key_id".to_string(),
            key_secret: Secret::new(GATEWAY_SECRET.to_string()),
        };
        cfg.app_data(web::Data::new(OrderFlowApi::new(orders_mock)))
            .app_data(web::Data::new(gateway))
            .app_data(web::Data::new(payment_config))
            .service(
                web::scope("/payment")
                    .service(CreateGatewayOrderRoute::<MockGateway>::new())
                    .service(VerifyPaymentRoute::<MockBackend>::new()),
            );
    }
}

async fn send(orders_mock: MockBackend, gateway: MockGateway, req: TestRequest) -> (StatusCode, String) {
    backoffice_engine::test_utils::prepare_env();
    let app = App::new().configure(configure_app(orders_mock, gateway));
    let app = test::init_service(app).await;
    let (_, res) = test::call_service(&app, req.to_request()).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

#[actix_web::test]
async fn a_valid_signature_marks_the_order_paid() {
    let mut orders_mock = MockBackend::new();
    orders_mock
        .expect_mark_order_paid()
        .withf(|order_id, payment_id| *order_id == 42 && payment_id == "pay_1")
        .returning(|order_id, payment_id| {
            let mut order = make_order(order_id, "u1", 17_000, OrderStatusType::Paid);
            order.payment_id = Some(payment_id.to_string());
            Ok(order)
        });
    let req = TestRequest::post().uri("/payment/verify").set_json(json!({
        "gateway_order_id": "order_1",
        "gateway_payment_id": "pay_1",
        "signature": sign("order_1", "pay_1"),
        "order_id": 42,
    }));
    let (status, body) = send(orders_mock, MockGateway::new(), req).await;
    assert!(status.is_success());
    assert!(body.contains("Payment verified successfully"), "was: {body}");
}

#[actix_web::test]
async fn a_forged_signature_never_touches_the_order() {
    let mut orders_mock = MockBackend::new();
    orders_mock.expect_mark_order_paid().times(0);
    let req = TestRequest::post().uri("/payment/verify").set_json(json!({
        "gateway_order_id": "order_1",
        "gateway_payment_id": "pay_1",
        "signature": "deadbeef",
        "order_id": 42,
    }));
    let (status, body) = send(orders_mock, MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid signature"), "was: {body}");
}

#[actix_web::test]
async fn a_repeated_callback_reports_success_without_a_second_transition() {
    let mut orders_mock = MockBackend::new();
    orders_mock
        .expect_mark_order_paid()
        .returning(|order_id, _| Err(CheckoutApiError::PaymentAlreadyConfirmed(order_id)));
    let req = TestRequest::post().uri("/payment/verify").set_json(json!({
        "gateway_order_id": "order_1",
        "gateway_payment_id": "pay_1",
        "signature": sign("order_1", "pay_1"),
        "order_id": 42,
    }));
    let (status, body) = send(orders_mock, MockGateway::new(), req).await;
    assert!(status.is_success());
    assert!(body.contains("Payment already confirmed."), "was: {body}");
}

#[actix_web::test]
async fn creating_a_gateway_order_converts_to_the_minor_unit() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_order()
        .withf(|amount, currency| *amount == Paise::from(49_900) && currency == "INR")
        .returning(|amount, currency| {
            Ok(GatewayOrder {
                id: "order_gw_1".to_string(),
                amount: amount.value(),
                currency: currency.to_string(),
                receipt: "receipt_1".to_string(),
                status: "created".to_string(),
            })
        });
    let req = TestRequest::post().uri("/payment/create-order").set_json(json!({ "amount": 499 }));
    let (status, body) = send(MockBackend::new(), gateway, req).await;
    assert!(status.is_success());
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["order"]["id"], "order_gw_1");
    assert_eq!(value["order"]["amount"], 49_900);
}

#[actix_web::test]
async fn a_missing_amount_is_a_bad_request() {
    let req = TestRequest::post().uri("/payment/create-order").set_json(json!({}));
    let (status, body) = send(MockBackend::new(), MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Amount is required"), "was: {body}");
}

#[actix_web::test]
async fn gateway_failures_surface_as_server_errors() {
    let mut gateway = MockGateway::new();
    gateway.expect_create_order().returning(|_, _| {
        Err(GatewayError::ApiError { status: 503, message: "gateway down".to_string() })
    });
    let req = TestRequest::post().uri("/payment/create-order").set_json(json!({ "amount": 10 }));
    let (status, _) = send(MockBackend::new(), gateway, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
