use hostel_desk_backend::error::AppError;
use hostel_desk_backend::run_server;
use hostel_desk_backend::telemetry::setup_telemetry;
use hostel_desk_config::get_config;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = get_config()?;
    setup_telemetry(config.log_filter.as_deref());
    run_server(config).await
}
