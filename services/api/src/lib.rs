mod cli;
mod cors;
mod demo;
mod infra;
mod routes;
mod server;

use devnet_forms::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
