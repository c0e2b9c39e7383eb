/// Load `.env` and initialise logging for a test run. Safe to call repeatedly.
pub fn prepare_env() {
    dotenvy::dotenv().ok();
    let _ = env_logger::try_init();
}
