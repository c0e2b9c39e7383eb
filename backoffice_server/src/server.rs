use std::time::Duration;

use actix_cors::Cors;
use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use backoffice_engine::{AuthApi, CartApi, OrderFlowApi, SqliteDatabase, StaffApi};
use log::info;

use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::{PublicUrls, ServerConfig},
    errors::ServerError,
    integrations::{GoogleOAuthClient, HttpPaymentGateway, MailApiClient},
    middleware::AuthnMiddlewareFactory,
    routes::{
        google_start,
        health,
        AddToCartRoute,
        CheckTokenRoute,
        ClearCartRoute,
        CountUsersRoute,
        CreateGatewayOrderRoute,
        ForgotPasswordRoute,
        GetCartRoute,
        GetUserRoute,
        GoogleCallbackRoute,
        ListUsersRoute,
        LoginRoute,
        MyOrdersRoute,
        PlaceOrderRoute,
        RegisterRoute,
        RemoveFromCartRoute,
        ResetPasswordRoute,
        UpdateCartRoute,
        UpdateUserRoute,
        VerifyPaymentRoute,
        VerifyUserRoute,
    },
    staff_routes::{
        ApplyResignationRoute,
        ApproveStaffRoute,
        CheckSubmittedRoute,
        CountStaffRoute,
        DeleteStaffRoute,
        InviteStaffRoute,
        ListResignationsRoute,
        ListStaffRoute,
        ProcessResignationRoute,
        StaffMeRoute,
        StaffRegisterRoute,
        StaffStatusRoute,
        StaffUpdateRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    // The system is unusable without at least one admin, so one is ensured at startup.
    let auth_api = AuthApi::new(db.clone());
    auth_api
        .ensure_admin_account(&config.admin.email, config.admin.password.reveal())
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("💻️ Database ready at {}", db.url());
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let (host, port) = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let auth_api = AuthApi::new(db.clone());
        let staff_api = StaffApi::new(db.clone());
        let cart_api = CartApi::new(db.clone());
        let orders_api = OrderFlowApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let verifier = TokenVerifier::new(&config.auth);
        let authn = AuthnMiddlewareFactory::new(AuthApi::new(db.clone()), verifier.clone());
        let mailer = MailApiClient::new(config.mail.clone()).expect("Failed to initialize mail client");
        let gateway =
            HttpPaymentGateway::new(config.payment.clone()).expect("Failed to initialize payment gateway client");
        let google = GoogleOAuthClient::new(config.google.clone()).expect("Failed to initialize Google OAuth client");
        let urls = PublicUrls::from_config(&config);
        let cors = if config.permissive_cors {
            Cors::permissive()
        } else {
            config
                .allowed_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
                .allow_any_method()
                .allow_any_header()
                .supports_credentials()
        };

        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("bo::access_log"))
            .wrap(cors)
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(staff_api))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(verifier))
            .app_data(web::Data::new(mailer))
            .app_data(web::Data::new(gateway))
            .app_data(web::Data::new(google))
            .app_data(web::Data::new(urls))
            .app_data(web::Data::new(config.payment.clone()));

        let auth_scope = web::scope("/auth")
            .service(RegisterRoute::<SqliteDatabase, MailApiClient>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(ForgotPasswordRoute::<SqliteDatabase, MailApiClient>::new())
            .service(ResetPasswordRoute::<SqliteDatabase>::new())
            .service(google_start)
            .service(GoogleCallbackRoute::<SqliteDatabase>::new())
            .service(
                web::scope("/user")
                    .wrap(authn.clone())
                    .service(UpdateUserRoute::<SqliteDatabase>::new())
                    .service(VerifyUserRoute::<SqliteDatabase>::new())
                    .service(GetUserRoute::<SqliteDatabase>::new()),
            )
            .service(
                web::scope("/users")
                    .wrap(authn.clone())
                    .service(CountUsersRoute::<SqliteDatabase>::new())
                    .service(ListUsersRoute::<SqliteDatabase>::new()),
            );

        let staff_scope = web::scope("/staff")
            .service(StaffRegisterRoute::<SqliteDatabase>::new())
            .service(CheckSubmittedRoute::<SqliteDatabase>::new())
            .service(
                web::scope("")
                    .wrap(authn.clone())
                    .service(InviteStaffRoute::<SqliteDatabase, MailApiClient>::new())
                    .service(ApproveStaffRoute::<SqliteDatabase, MailApiClient>::new())
                    .service(StaffStatusRoute::<SqliteDatabase>::new())
                    .service(StaffMeRoute::<SqliteDatabase>::new())
                    .service(StaffUpdateRoute::<SqliteDatabase>::new())
                    .service(CountStaffRoute::<SqliteDatabase>::new())
                    .service(ListStaffRoute::<SqliteDatabase>::new())
                    .service(DeleteStaffRoute::<SqliteDatabase>::new()),
            );

        let resignations_scope = web::scope("/resignations")
            .wrap(authn.clone())
            .service(ApplyResignationRoute::<SqliteDatabase>::new())
            .service(ListResignationsRoute::<SqliteDatabase>::new())
            .service(ProcessResignationRoute::<SqliteDatabase>::new());

        let cart_scope = web::scope("/cart")
            .wrap(authn.clone())
            .service(AddToCartRoute::<SqliteDatabase>::new())
            .service(UpdateCartRoute::<SqliteDatabase>::new())
            .service(RemoveFromCartRoute::<SqliteDatabase>::new())
            .service(ClearCartRoute::<SqliteDatabase>::new())
            .service(GetCartRoute::<SqliteDatabase>::new());

        let orders_scope = web::scope("/orders")
            .wrap(authn.clone())
            .service(PlaceOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new());

        let payment_scope = web::scope("/payment")
            .service(CreateGatewayOrderRoute::<HttpPaymentGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase>::new());

        app.service(health)
            .service(web::scope("/check-token").wrap(authn.clone()).service(CheckTokenRoute::new()))
            .service(auth_scope)
            .service(staff_scope)
            .service(resignations_scope)
            .service(cart_scope)
            .service(orders_scope)
            .service(payment_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
