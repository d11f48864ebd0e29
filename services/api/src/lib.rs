mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use egov_services::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
