use crate::inference::{InferenceGateway, Recovered};

use super::DatasetStore;

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Asks the model for a narrative summary of everything collected so far.
pub async fn generate_report(store: &DatasetStore, gateway: &InferenceGateway) -> Recovered<String> {
    let items = store.items();
    log_info!("Generating dataset report over {} items", items.len());
    gateway.report(&items).await
}
