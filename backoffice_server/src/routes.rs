//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, etc.) must be expressed as futures or asynchronous functions. Async handlers get executed
//! concurrently by worker threads and thus don't block execution.

use actix_web::{get, http::header, web, HttpResponse, Responder};
use backoffice_engine::{
    db_types::{AccountId, PaymentMethod, Role},
    helpers::verify_payment_signature,
    traits::{AuthManagement, CartManagement, CheckoutDatabase},
    AuthApi,
    CartApi,
    CheckoutApiError,
    OrderFlowApi,
    ProfileChanges,
};
use bo_common::{Paise, DEFAULT_CURRENCY_CODE};
use log::*;
use reqwest::Url;
use serde_json::json;

use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::{PaymentConfig, PublicUrls},
    data_objects::{
        CartItemRequest,
        CartRemoveRequest,
        CreateGatewayOrderRequest,
        ForgotPasswordRequest,
        GoogleCallbackQuery,
        JsonResponse,
        LoginRequest,
        LoginResponse,
        PlaceOrderRequest,
        RegisterRequest,
        RequestIdentity,
        ResetPasswordRequest,
        UpdateProfileRequest,
        VerifyPaymentRequest,
    },
    errors::ServerError,
    helpers::{assert_self_or_admin, redirect_for_role},
    integrations::{GoogleOAuthClient, Mailer, PaymentGateway},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+ requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------

route!(register => Post "/register" impl AuthManagement, Mailer);
/// Route handler for self-registration.
///
/// The welcome email is a non-critical side effect: it is sent in the background and a failure never fails the
/// registration itself.
pub async fn register<B, M>(
    api: web::Data<AuthApi<B>>,
    mailer: web::Data<M>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: AuthManagement,
    M: Mailer + 'static,
{
    let RegisterRequest { email, password } = body.into_inner();
    let user = api.register(&email, &password).await?;
    let to = user.email.clone();
    actix_web::rt::spawn(async move {
        let (subject, html) = crate::integrations::messages::welcome();
        if let Err(e) = mailer.send(&to, subject, &html).await {
            error!("📧️ Welcome email to {to} failed: {e}");
        }
    });
    Ok(HttpResponse::Created().json(JsonResponse::success("User registered successfully")))
}

route!(login => Post "/login" impl AuthManagement);
/// Route handler for the login endpoint.
///
/// Users and staff share this endpoint; the user store is checked first. A successful login returns a bearer token
/// (valid for one day, no refresh), the resolved identity, and the client route to land on.
pub async fn login<B: AuthManagement>(
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ServerError> {
    let LoginRequest { email, password } = body.into_inner();
    let principal = api.login(&email, &password).await?;
    let token =
        signer.issue_access_token(&principal).map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))?;
    let user = RequestIdentity::from_principal(&principal);
    let redirect = redirect_for_role(user.role).to_string();
    debug!("💻️ Issued access token for {}", user.email);
    Ok(HttpResponse::Ok().json(LoginResponse {
        success: true,
        message: format!("{} login successful", user.role),
        token,
        user,
        redirect,
    }))
}

route!(forgot_password => Post "/forgot-password" impl AuthManagement, Mailer);
/// Route handler for the forgot-password endpoint.
///
/// The response is identical whether or not the email belongs to an account, so the endpoint cannot be used to
/// enumerate accounts.
pub async fn forgot_password<B, M>(
    api: web::Data<AuthApi<B>>,
    mailer: web::Data<M>,
    urls: web::Data<PublicUrls>,
    body: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: AuthManagement,
    M: Mailer + 'static,
{
    let email = body.into_inner().email;
    if let Some(token) = api.request_password_reset(&email).await? {
        let reset_url = Url::parse_with_params(
            &format!("{}/reset-password", urls.client_url),
            &[("token", token.as_str()), ("email", email.trim().to_lowercase().as_str())],
        )
        .map_err(|e| ServerError::Unspecified(e.to_string()))?;
        let (subject, html) = crate::integrations::messages::password_reset(reset_url.as_str());
        // The reset link only exists in this email, so a failed send must surface.
        mailer.send(email.trim().to_lowercase().as_str(), subject, &html).await?;
    }
    Ok(HttpResponse::Ok().json(JsonResponse::success("If that email is registered, a reset link has been sent.")))
}

route!(reset_password => Post "/reset-password" impl AuthManagement);
pub async fn reset_password<B: AuthManagement>(
    api: web::Data<AuthApi<B>>,
    body: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, ServerError> {
    let ResetPasswordRequest { token, email, password } = body.into_inner();
    api.reset_password(&email, &token, &password).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Password reset successful")))
}

//----------------------------------------------   External login  ----------------------------------------------------

#[get("/google")]
/// Kick off the Google OAuth handshake. The `state` parameter is a short-lived signed token rather than a
/// server-side session, so the callback can be validated statelessly.
pub async fn google_start(
    client: web::Data<GoogleOAuthClient>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let nonce = backoffice_engine::helpers::new_account_id();
    let state = signer.issue_state_token(&nonce).map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))?;
    let url = client.authorize_url(&state).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    Ok(HttpResponse::Found().insert_header((header::LOCATION, url)).finish())
}

route!(google_callback => Get "/google/callback" impl AuthManagement);
/// Route handler for the Google OAuth callback.
///
/// The callback mints the same access token used everywhere else; there is no parallel session-based
/// authorization path. Any failure redirects back to the client's login page.
pub async fn google_callback<B: AuthManagement>(
    api: web::Data<AuthApi<B>>,
    client: web::Data<GoogleOAuthClient>,
    signer: web::Data<TokenIssuer>,
    verifier: web::Data<TokenVerifier>,
    urls: web::Data<PublicUrls>,
    query: web::Query<GoogleCallbackQuery>,
) -> Result<HttpResponse, ServerError> {
    let query = query.into_inner();
    let failure_redirect = format!("{}/login?error=google", urls.client_url);
    let result = google_login(api.as_ref(), client.as_ref(), signer.as_ref(), verifier.as_ref(), query).await;
    match result {
        Ok((token, identity)) => {
            let user_json = serde_json::to_string(&identity).map_err(|e| ServerError::Unspecified(e.to_string()))?;
            let url = Url::parse_with_params(
                &format!("{}/google-success", urls.client_url),
                &[("token", token.as_str()), ("user", user_json.as_str())],
            )
            .map_err(|e| ServerError::Unspecified(e.to_string()))?;
            Ok(HttpResponse::Found().insert_header((header::LOCATION, url.to_string())).finish())
        },
        Err(e) => {
            warn!("💻️ External login failed: {e}");
            Ok(HttpResponse::Found().insert_header((header::LOCATION, failure_redirect)).finish())
        },
    }
}

async fn google_login<B: AuthManagement>(
    api: &AuthApi<B>,
    client: &GoogleOAuthClient,
    signer: &TokenIssuer,
    verifier: &TokenVerifier,
    query: GoogleCallbackQuery,
) -> Result<(String, RequestIdentity), ServerError> {
    if let Some(error) = query.error {
        return Err(ServerError::InvalidRequestBody(format!("Provider returned an error: {error}")));
    }
    let state = query.state.ok_or_else(|| ServerError::InvalidRequestBody("Missing state".to_string()))?;
    verifier.verify_state_token(&state).map_err(ServerError::AuthenticationError)?;
    let code = query.code.ok_or_else(|| ServerError::InvalidRequestBody("Missing authorization code".to_string()))?;
    let profile = client.fetch_profile(&code).await.map_err(|e| ServerError::UpstreamError(e.to_string()))?;
    let principal = api.resolve_google(&profile).await?;
    let token =
        signer.issue_access_token(&principal).map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))?;
    Ok((token, RequestIdentity::from_principal(&principal)))
}

//----------------------------------------------   User profiles  ----------------------------------------------------

route!(get_user => Get "/{id}" impl AuthManagement);
/// Fetch a user profile. Only the owner or an admin may read it.
pub async fn get_user<B: AuthManagement>(
    identity: RequestIdentity,
    path: web::Path<AccountId>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    assert_self_or_admin(&identity, &id)?;
    let user = api.fetch_user(&id).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "user": user })))
}

route!(update_user => Put "/update/{id}" impl AuthManagement);
/// Update a user profile. Gated to owner-or-admin; the password, when supplied, is re-hashed.
pub async fn update_user<B: AuthManagement>(
    identity: RequestIdentity,
    path: web::Path<AccountId>,
    api: web::Data<AuthApi<B>>,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    assert_self_or_admin(&identity, &id)?;
    let UpdateProfileRequest { name, phone, pincode, store_name, store_address, landmark, password } =
        body.into_inner();
    let changes = ProfileChanges { name, phone, pincode, store_name, store_address, landmark, password };
    let user = api.update_profile(&id, changes).await?;
    debug!("💻️ Profile updated for {}", user.email);
    Ok(HttpResponse::Ok().json(json!({ "success": true, "user": user })))
}

route!(verify_user => Put "/verify/{id}" impl AuthManagement requires [Role::Admin]);
pub async fn verify_user<B: AuthManagement>(
    path: web::Path<AccountId>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let user = api.toggle_verification(&id).await?;
    let message = format!("User {} successfully", if user.is_verified { "verified" } else { "unverified" });
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": message, "user": user })))
}

route!(list_users => Get "" impl AuthManagement requires [Role::Admin]);
pub async fn list_users<B: AuthManagement>(api: web::Data<AuthApi<B>>) -> Result<HttpResponse, ServerError> {
    let users = api.list_users().await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "users": users })))
}

route!(count_users => Get "/count" impl AuthManagement requires [Role::Admin]);
pub async fn count_users<B: AuthManagement>(api: web::Data<AuthApi<B>>) -> Result<HttpResponse, ServerError> {
    let total = api.count_users().await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "totalUsers": total })))
}

//----------------------------------------------   Cart  ----------------------------------------------------

route!(add_to_cart => Post "/add" impl CartManagement);
/// Add an item to a cart.
///
/// Everyone operates on their own cart; admins may supply a `user_id` to act on another principal's cart. This is
/// a bearer-token gate that the original service lacked.
pub async fn add_to_cart<B: CartManagement>(
    identity: RequestIdentity,
    api: web::Data<CartApi<B>>,
    body: web::Json<CartItemRequest>,
) -> Result<HttpResponse, ServerError> {
    let CartItemRequest { user_id, product_id, quantity } = body.into_inner();
    let target = user_id.unwrap_or_else(|| identity.id.clone());
    assert_self_or_admin(&identity, &target)?;
    let cart = api.add_item(&target, product_id, quantity).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Item added to cart successfully",
        "cart": cart,
    })))
}

route!(get_cart => Get "/{user_id}" impl CartManagement);
pub async fn get_cart<B: CartManagement>(
    identity: RequestIdentity,
    path: web::Path<AccountId>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    assert_self_or_admin(&identity, &user_id)?;
    let cart = api.get_cart(&user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "cart": cart })))
}

route!(update_cart => Put "/update" impl CartManagement);
pub async fn update_cart<B: CartManagement>(
    identity: RequestIdentity,
    api: web::Data<CartApi<B>>,
    body: web::Json<CartItemRequest>,
) -> Result<HttpResponse, ServerError> {
    let CartItemRequest { user_id, product_id, quantity } = body.into_inner();
    let target = user_id.unwrap_or_else(|| identity.id.clone());
    assert_self_or_admin(&identity, &target)?;
    let cart = api.update_item(&target, product_id, quantity).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Cart updated successfully", "cart": cart })))
}

route!(remove_from_cart => Delete "/remove" impl CartManagement);
pub async fn remove_from_cart<B: CartManagement>(
    identity: RequestIdentity,
    api: web::Data<CartApi<B>>,
    body: web::Json<CartRemoveRequest>,
) -> Result<HttpResponse, ServerError> {
    let CartRemoveRequest { user_id, product_id } = body.into_inner();
    let target = user_id.unwrap_or_else(|| identity.id.clone());
    assert_self_or_admin(&identity, &target)?;
    let cart = api.remove_item(&target, product_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Item removed from cart", "cart": cart })))
}

route!(clear_cart => Delete "/clear/{user_id}" impl CartManagement);
pub async fn clear_cart<B: CartManagement>(
    identity: RequestIdentity,
    path: web::Path<AccountId>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    assert_self_or_admin(&identity, &user_id)?;
    api.clear(&user_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Cart cleared successfully")))
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(place_order => Post "/place/{user_id}" impl CheckoutDatabase);
/// Convert a cart into an order.
///
/// The unit prices and total come from the catalog inside the checkout transaction; anything price-like in the
/// request body is ignored by construction.
pub async fn place_order<B: CheckoutDatabase>(
    identity: RequestIdentity,
    path: web::Path<AccountId>,
    api: web::Data<OrderFlowApi<B>>,
    body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    assert_self_or_admin(&identity, &user_id)?;
    let PlaceOrderRequest { payment_method, payment_id } = body.into_inner();
    let method = parse_payment_method(payment_method.as_deref())?;
    let order = api.place_order(&user_id, method, payment_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Order placed successfully", "order": order })))
}

fn parse_payment_method(value: Option<&str>) -> Result<PaymentMethod, ServerError> {
    match value {
        None => Ok(PaymentMethod::Cod),
        Some(s) if s.eq_ignore_ascii_case("cod") => Ok(PaymentMethod::Cod),
        Some(s) if s.eq_ignore_ascii_case("online") => Ok(PaymentMethod::Online),
        Some(s) => Err(ServerError::InvalidRequestBody(format!("Invalid payment method: {s}"))),
    }
}

route!(my_orders => Get "/{user_id}" impl CheckoutDatabase);
pub async fn my_orders<B: CheckoutDatabase>(
    identity: RequestIdentity,
    path: web::Path<AccountId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    assert_self_or_admin(&identity, &user_id)?;
    let orders = api.orders_for_user(&user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "orders": orders })))
}

//----------------------------------------------  Check Token  ----------------------------------------------------

route!(check_token => Get "" requires [Role::Admin, Role::Staff, Role::User]);
pub async fn check_token(identity: RequestIdentity) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET check_token for {}", identity.email);
    Ok(HttpResponse::Ok().body("Token is valid."))
}

//----------------------------------------------   Payments  ----------------------------------------------------

route!(create_gateway_order => Post "/create-order" impl PaymentGateway);
/// Create a gateway-side order for client-side capture. The amount arrives in rupees and is converted to paise
/// before it reaches the gateway; an upstream failure fails this call (checkout cannot proceed without it).
pub async fn create_gateway_order<G: PaymentGateway>(
    gateway: web::Data<G>,
    body: web::Json<CreateGatewayOrderRequest>,
) -> Result<HttpResponse, ServerError> {
    let CreateGatewayOrderRequest { amount, currency } = body.into_inner();
    let amount = amount.ok_or_else(|| ServerError::InvalidRequestBody("Amount is required".to_string()))?;
    if amount <= 0 {
        return Err(ServerError::InvalidRequestBody("Amount must be a positive integer".to_string()));
    }
    let currency = currency.unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
    let order = gateway.create_order(Paise::from_rupees(amount), &currency).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}

route!(verify_payment => Post "/verify" impl CheckoutDatabase);
/// Verify a payment-capture callback and attach the payment to its order.
///
/// The signature is recomputed as HMAC-SHA256 over `"{gateway_order_id}|{gateway_payment_id}"` and compared in
/// constant time. Verification alone never marks anything paid: the transition happens against the explicit
/// `order_id`, and a repeated callback for an already-paid order is reported as success without a second
/// transition.
pub async fn verify_payment<B: CheckoutDatabase>(
    api: web::Data<OrderFlowApi<B>>,
    config: web::Data<PaymentConfig>,
    body: web::Json<VerifyPaymentRequest>,
) -> Result<HttpResponse, ServerError> {
    let VerifyPaymentRequest { gateway_order_id, gateway_payment_id, signature, order_id } = body.into_inner();
    let valid =
        verify_payment_signature(&gateway_order_id, &gateway_payment_id, &signature, config.key_secret.reveal());
    if !valid {
        warn!("💳️ Invalid payment signature for order #{order_id}");
        return Err(ServerError::InvalidRequestBody("Invalid signature".to_string()));
    }
    match api.confirm_payment(order_id, &gateway_payment_id).await {
        Ok(_) => Ok(HttpResponse::Ok().json(JsonResponse::success("Payment verified successfully"))),
        Err(CheckoutApiError::PaymentAlreadyConfirmed(_)) => {
            info!("💳️ Payment for order #{order_id} was already confirmed.");
            Ok(HttpResponse::Ok().json(JsonResponse::success("Payment already confirmed.")))
        },
        Err(e) => {
            debug!("💳️ Could not confirm payment. {e}");
            Err(e.into())
        },
    }
}
