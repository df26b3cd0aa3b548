use lms_admin::config::AppConfig;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    if let Err(e) = lms_admin::run(config).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
