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
    db_types::{AccountId, Cart, CartLine, OrderItem, OrderStatusType, OrderWithItems, Principal, Role},
    AuthApi,
    CartApi,
    CheckoutApiError,
    OrderFlowApi,
};
use bo_common::Paise;
use serde_json::{json, Value};

use super::mocks::*;
use crate::{
    middleware::AuthnMiddlewareFactory,
    routes::{AddToCartRoute, GetCartRoute, MyOrdersRoute, PlaceOrderRoute},
};

fn configure_app(
    cart_mock: MockBackend,
    orders_mock: MockBackend,
    resolver_mock: MockBackend,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let authn = AuthnMiddlewareFactory::new(AuthApi::new(resolver_mock), test_verifier());
        cfg.app_data(web::Data::new(CartApi::new(cart_mock)))
            .app_data(web::Data::new(OrderFlowApi::new(orders_mock)))
            .service(
                web::scope("/cart")
                    .wrap(authn.clone())
                    .service(AddToCartRoute::<MockBackend>::new())
                    .service(GetCartRoute::<MockBackend>::new()),
            )
            .service(
                web::scope("/orders")
                    .wrap(authn)
                    .service(PlaceOrderRoute::<MockBackend>::new())
                    .service(MyOrdersRoute::<MockBackend>::new()),
            );
    }
}

/// A resolver mock that resolves every id to the given user principal.
fn resolver_for(user: backoffice_engine::db_types::User) -> MockBackend {
    let mut resolver = MockBackend::new();
    resolver.expect_fetch_staff_by_id().returning(|_| Ok(None));
    resolver.expect_fetch_user_by_id().returning(move |_| Ok(Some(user.clone())));
    resolver
}

async fn send(
    cart_mock: MockBackend,
    orders_mock: MockBackend,
    resolver_mock: MockBackend,
    req: TestRequest,
) -> (StatusCode, String) {
    backoffice_engine::test_utils::prepare_env();
    let app = App::new().configure(configure_app(cart_mock, orders_mock, resolver_mock));
    let app = test::init_service(app).await;
    // Middleware that rejects a request returns `Err(actix_web::Error)`; in production the HTTP
    // dispatcher renders it via `ResponseError`, but `test::call_service` would panic on it, so
    // render the error response here the same way the dispatcher does.
    let res = match test::try_call_service(&app, req.to_request()).await {
        Ok(res) => res.into_parts().1,
        Err(err) => err.error_response(),
    };
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

fn sample_cart(user: &str) -> Cart {
    Cart {
        user_id: AccountId(user.to_string()),
        items: vec![CartLine {
            product_id: 7,
            product_name: "Tea".to_string(),
            unit_price: Paise::from(4_500),
            quantity: 2,
        }],
    }
}

#[actix_web::test]
async fn cart_mutation_without_a_token_is_unauthorized() {
    let req = TestRequest::post().uri("/cart/add").set_json(json!({ "product_id": 7, "quantity": 2 }));
    let (status, _) = send(MockBackend::new(), MockBackend::new(), MockBackend::new(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn adding_to_ones_own_cart_succeeds() {
    let user = make_user("u1", Role::User);
    let token = token_for(&Principal::User(user.clone()));
    let mut cart_mock = MockBackend::new();
    cart_mock
        .expect_add_cart_item()
        .withf(|user_id, product_id, quantity| user_id.as_str() == "u1" && *product_id == 7 && *quantity == 2)
        .returning(|user_id, _, _| Ok(sample_cart_for(user_id)));
    let req = TestRequest::post()
        .uri("/cart/add")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "product_id": 7, "quantity": 2 }));
    let (status, body) = send(cart_mock, MockBackend::new(), resolver_for(user), req).await;
    assert!(status.is_success());
    assert!(body.contains("Item added to cart successfully"), "was: {body}");
    assert!(body.contains("Tea"), "was: {body}");
}

fn sample_cart_for(user_id: &AccountId) -> Cart {
    sample_cart(user_id.as_str())
}

#[actix_web::test]
async fn acting_on_another_users_cart_is_forbidden() {
    let user = make_user("u1", Role::User);
    let token = token_for(&Principal::User(user.clone()));
    let req = TestRequest::post()
        .uri("/cart/add")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "user_id": "someone-else", "product_id": 7, "quantity": 2 }));
    let (status, _) = send(MockBackend::new(), MockBackend::new(), resolver_for(user), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admins_may_read_any_cart() {
    let admin = make_user("a1", Role::Admin);
    let token = token_for(&Principal::User(admin.clone()));
    let mut cart_mock = MockBackend::new();
    cart_mock.expect_fetch_cart().returning(|user_id| Ok(sample_cart_for(user_id)));
    let req = TestRequest::get().uri("/cart/u9").insert_header(("Authorization", format!("Bearer {token}")));
    let (status, body) = send(cart_mock, MockBackend::new(), resolver_for(admin), req).await;
    assert!(status.is_success());
    assert!(body.contains("\"user_id\":\"u9\""), "was: {body}");
}

#[actix_web::test]
async fn placing_an_order_ignores_client_supplied_prices() {
    let user = make_user("u1", Role::User);
    let token = token_for(&Principal::User(user.clone()));
    let mut orders_mock = MockBackend::new();
    orders_mock.expect_checkout().returning(|user_id, method, _| {
        let order = OrderWithItems {
            order: {
                let mut o = make_order(1, user_id.as_str(), 17_000, OrderStatusType::Pending);
                o.payment_method = method;
                o
            },
            items: vec![OrderItem {
                product_id: 7,
                product_name: "Tea".to_string(),
                quantity: 2,
                unit_price: Paise::from(8_500),
            }],
        };
        Ok(order)
    });
    // The request tries to dictate a one-paisa total; no such field even exists on the wire contract.
    let req = TestRequest::post()
        .uri("/orders/place/u1")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "payment_method": "COD", "price": 1, "total_amount": 1 }));
    let (status, body) = send(MockBackend::new(), orders_mock, resolver_for(user), req).await;
    assert!(status.is_success());
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["order"]["total_amount"], 17_000);
    assert_eq!(value["order"]["status"], "Pending");
}

#[actix_web::test]
async fn placing_an_order_with_an_empty_cart_fails() {
    let user = make_user("u1", Role::User);
    let token = token_for(&Principal::User(user.clone()));
    let mut orders_mock = MockBackend::new();
    orders_mock.expect_checkout().returning(|_, _, _| Err(CheckoutApiError::EmptyCart));
    let req = TestRequest::post()
        .uri("/orders/place/u1")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "payment_method": "COD" }));
    let (status, body) = send(MockBackend::new(), orders_mock, resolver_for(user), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Cart is empty"), "was: {body}");
}

#[actix_web::test]
async fn unknown_payment_methods_are_rejected() {
    let user = make_user("u1", Role::User);
    let token = token_for(&Principal::User(user.clone()));
    let req = TestRequest::post()
        .uri("/orders/place/u1")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "payment_method": "barter" }));
    let (status, body) = send(MockBackend::new(), MockBackend::new(), resolver_for(user), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid payment method"), "was: {body}");
}

#[actix_web::test]
async fn users_see_only_their_own_orders() {
    let user = make_user("u1", Role::User);
    let token = token_for(&Principal::User(user.clone()));
    let mut orders_mock = MockBackend::new();
    orders_mock.expect_fetch_orders_for_user().returning(|user_id| {
        Ok(vec![OrderWithItems {
            order: make_order(3, user_id.as_str(), 5_000, OrderStatusType::Paid),
            items: vec![],
        }])
    });
    let own = TestRequest::get().uri("/orders/u1").insert_header(("Authorization", format!("Bearer {token}")));
    let (status, body) = send(MockBackend::new(), orders_mock, resolver_for(user.clone()), own).await;
    assert!(status.is_success());
    assert!(body.contains("\"orders\""), "was: {body}");

    let foreign = TestRequest::get().uri("/orders/u2").insert_header(("Authorization", format!("Bearer {token}")));
    let (status, _) = send(MockBackend::new(), MockBackend::new(), resolver_for(user), foreign).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
