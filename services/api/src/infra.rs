use metrics_exporter_prometheus::PrometheusHandle;
use salsa_raffle::config::RaffleConfig;
use salsa_raffle::error::AppError;
use salsa_raffle::workflows::raffle::RaffleService;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Build the raffle service from the configured catalog.
pub(crate) fn raffle_service(config: &RaffleConfig) -> Result<RaffleService, AppError> {
    let catalog = config.catalog()?;
    info!(
        levels = catalog.len(),
        capacity_per_role = config.capacity_per_role,
        "class catalog loaded"
    );
    Ok(RaffleService::new(catalog))
}
