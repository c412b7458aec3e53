mod cli;
mod export;
mod infra;
mod routes;
mod server;

use admission_portal::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
