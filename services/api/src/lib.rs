mod allocate;
mod cli;
mod infra;
mod routes;
mod server;

use salsa_raffle::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
