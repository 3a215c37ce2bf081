//! The grill client seam
//!
//! The cloud client lives outside this crate. Entities only ever read from it
//! and ask it to change the cook timer; everything else goes out as service
//! calls through the dispatcher.

use async_trait::async_trait;
use std::sync::Arc;
use traeger_core::{
    Accessory, GrillData, GrillDetails, GrillFeatures, GrillLimits, GrillSnapshot, TraegerResult,
};

/// Invoked by the client whenever new telemetry for a grill arrived
pub type UpdateCallback = Arc<dyn Fn() + Send + Sync>;

#[async_trait]
pub trait GrillClient: Send + Sync {
    /// Every grill on the account
    fn grills(&self) -> Vec<GrillDetails>;

    fn grill_details(&self, grill_id: &str) -> Option<GrillDetails>;

    /// Latest snapshot, `None` until the first telemetry push
    fn grill_state(&self, grill_id: &str) -> Option<GrillSnapshot>;

    fn grill_limits(&self, grill_id: &str) -> Option<GrillLimits>;

    fn grill_features(&self, grill_id: &str) -> Option<GrillFeatures>;

    /// Sensor ids of the accessories currently reported
    fn accessory_ids(&self, grill_id: &str) -> Vec<String>;

    fn accessory(&self, grill_id: &str, sensor_id: &str) -> Option<Accessory>;

    fn register_update_callback(&self, grill_id: &str, callback: UpdateCallback);

    async fn set_timer_seconds(&self, grill_id: &str, seconds: i64) -> TraegerResult<()>;

    async fn reset_timer(&self, grill_id: &str) -> TraegerResult<()>;
}

/// Read everything an evaluation needs in one go
pub fn grill_data(client: &dyn GrillClient, grill_id: &str) -> GrillData {
    let accessories = client
        .accessory_ids(grill_id)
        .into_iter()
        .filter_map(|id| client.accessory(grill_id, &id).map(|a| (id, a)))
        .collect();

    GrillData {
        grill_id: grill_id.to_string(),
        details: client.grill_details(grill_id),
        snapshot: client.grill_state(grill_id),
        limits: client.grill_limits(grill_id),
        features: client.grill_features(grill_id),
        accessories,
    }
}
