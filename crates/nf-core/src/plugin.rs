//! Host-facing plugin object.
//!
//! The host may call [`NodeFeaturesPlugin::node_state`] from several
//! threads at once. The parsed record lives in a [`FeatureCache`]; check,
//! parse and render happen under its lock as one critical section, and
//! [`NodeFeaturesPlugin::reconfig`] drops the record under the same lock.

use std::sync::{Mutex, MutexGuard, PoisonError};

use nf_common::Result;
use nf_config::EngineConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info, warn};

use crate::cpuinfo::{CpuFeatureExtractor, CpuFeatures};
use crate::features::{append_optional, is_owned, job_xlate, render, reorder, xlate};
use crate::logging::{event_names, Stage};

#[cfg(feature = "pci")]
use crate::pci::{PciBus, PciDeviceMatcher, SysfsPciBus};

/// Human-readable plugin name.
pub const PLUGIN_NAME: &str = "node_features cpuinfo plugin";

/// Plugin type string the host selects us by.
pub const PLUGIN_TYPE: &str = "node_features/cpuinfo";

/// Lazily populated, explicitly invalidated [`CpuFeatures`] record.
#[derive(Debug, Default)]
pub struct FeatureCache {
    slot: Mutex<Option<CpuFeatures>>,
}

impl FeatureCache {
    pub fn new() -> Self {
        Self::default()
    }

    // The slot is only ever replaced whole, so a poisoned lock still holds
    // either a complete record or nothing.
    fn lock(&self) -> MutexGuard<'_, Option<CpuFeatures>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop the cached record; the next access parses again.
    pub fn invalidate(&self) {
        let mut slot = self.lock();
        if slot.take().is_some() {
            debug!(event = event_names::CACHE_INVALIDATED, "feature cache invalidated");
        }
    }

    pub fn is_populated(&self) -> bool {
        self.lock().is_some()
    }

    /// Populate the record if needed, then hand it to `use_record`.
    ///
    /// The lock is held across all three steps. When `populate` fails the
    /// cache stays empty and the error is returned.
    pub fn ensure_populated<T>(
        &self,
        populate: impl FnOnce() -> Result<CpuFeatures>,
        use_record: impl FnOnce(&CpuFeatures) -> T,
    ) -> Result<T> {
        let mut slot = self.lock();
        let features = match slot.take() {
            Some(features) => features,
            None => populate()?,
        };
        let out = use_record(&features);
        *slot = Some(features);
        Ok(out)
    }
}

/// Fields of a host node-update request that this plugin looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeUpdateRequest {
    pub node_names: Option<String>,
    pub features: Option<String>,
    pub features_act: Option<String>,
}

/// The host's node-features plugin interface.
///
/// Feature lists are comma-joined; job constraints are `&`-joined. `None`
/// stands for an absent list and is kept distinct from an empty one in
/// outputs.
pub trait NodeFeaturesPlugin: Send + Sync {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn plugin_type(&self) -> &'static str {
        PLUGIN_TYPE
    }

    /// Plugin load.
    fn init(&self) -> Result<()>;

    /// Plugin unload; releases cached state.
    fn fini(&self) -> Result<()>;

    /// Configuration reload; cached state is recomputed on next use.
    fn reconfig(&self) -> Result<()>;

    /// Append this node's features to the available and active lists.
    fn node_state(&self, avail: &mut Option<String>, active: &mut Option<String>);

    /// Reduce a job constraint to the features this plugin owns.
    fn job_xlate(&self, job_features: Option<&str>) -> Option<String>;

    /// Replace our stale features in `orig_features` with `new_features`.
    fn node_xlate(
        &self,
        new_features: Option<&str>,
        orig_features: Option<&str>,
        avail_features: Option<&str>,
    ) -> Option<String>;

    /// Reorder a feature list.
    fn node_xlate2(&self, new_features: Option<&str>) -> Option<String>;

    /// Whether `feature` belongs to this plugin.
    fn changeable_feature(&self, feature: &str) -> bool;

    /// Older spelling of [`changeable_feature`](Self::changeable_feature).
    fn changible_feature(&self, feature: &str) -> bool {
        self.changeable_feature(feature)
    }

    /// Semantic check of a job's feature request. Everything is accepted.
    fn job_valid(&self, job_features: Option<&str>) -> Result<()> {
        debug!(job_features, "job_valid");
        Ok(())
    }

    /// Apply a job's required features to this node. Nothing to do.
    fn node_set(&self, active_features: Option<&str>) -> Result<()> {
        debug!(active_features, "node_set");
        Ok(())
    }

    /// Update features on the nodes in `node_bitmap`. Nothing to do.
    fn node_update(&self, active_features: Option<&str>, node_bitmap: &[bool]) -> Result<()> {
        debug!(active_features, nodes = node_bitmap.len(), "node_update");
        Ok(())
    }

    /// Whether a node-update request should go through this plugin.
    fn node_update_valid(&self, request: &NodeUpdateRequest) -> bool {
        debug!(
            node_names = request.node_names.as_deref(),
            features = request.features.as_deref(),
            features_act = request.features_act.as_deref(),
            "node_update_valid"
        );
        false
    }

    /// Refresh features for `node_list` on the controller. Nothing to do.
    fn get_node(&self, node_list: Option<&str>) -> Result<()> {
        debug!(node_list, "get_node");
        Ok(())
    }

    /// Whether changing features requires a node reboot/power cycle.
    fn node_power(&self) -> bool {
        false
    }

    /// Whether `uid` may request feature changes.
    fn user_update(&self, uid: u32) -> bool {
        debug!(uid, "user_update");
        false
    }

    /// Seconds a feature change takes to apply.
    fn boot_time(&self) -> u32 {
        0
    }

    /// Weight added to nodes that would need a reboot.
    fn reboot_weight(&self) -> u32 {
        0
    }

    /// Nodes this plugin applies to: all of them.
    fn get_node_bitmap(&self, node_count: usize) -> Vec<bool> {
        vec![true; node_count]
    }

    /// Count of nodes in `active_bitmap` this plugin overlaps with.
    fn overlap(&self, active_bitmap: &[bool]) -> usize {
        active_bitmap.iter().filter(|&&set| set).count()
    }

    /// Per-step setup. Nothing to do.
    fn step_config(&self, _mem_sort: bool, _numa_bitmap: &[bool]) {}
}

/// The cpuinfo node-features plugin.
pub struct CpuinfoPlugin {
    config: EngineConfig,
    extractor: CpuFeatureExtractor,
    cache: FeatureCache,
    #[cfg(feature = "pci")]
    pci_bus: Box<dyn PciBus + Send + Sync>,
}

impl std::fmt::Debug for CpuinfoPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuinfoPlugin")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl CpuinfoPlugin {
    pub fn new(config: EngineConfig) -> Self {
        CpuinfoPlugin {
            extractor: CpuFeatureExtractor::new().with_chunk_size(config.chunk_size),
            cache: FeatureCache::new(),
            #[cfg(feature = "pci")]
            pci_bus: Box::new(SysfsPciBus::new(config.pci.sysfs_root.clone())),
            config,
        }
    }

    /// Enumerate devices from `bus` instead of sysfs.
    #[cfg(feature = "pci")]
    pub fn with_pci_bus(mut self, bus: impl PciBus + Send + Sync + 'static) -> Self {
        self.pci_bus = Box::new(bus);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &FeatureCache {
        &self.cache
    }

    /// The cached record, parsing it first if needed.
    pub fn snapshot(&self) -> Result<CpuFeatures> {
        self.cache.ensure_populated(|| self.extract(), CpuFeatures::clone)
    }

    /// Render this node's feature list, parsing first if needed.
    pub fn rendered_features(&self) -> Result<Option<String>> {
        self.cache.ensure_populated(
            || self.extract(),
            |features| {
                let _span = debug_span!("render", stage = %Stage::Render).entered();
                render(features, self.pci_features().as_deref())
            },
        )
    }

    fn extract(&self) -> Result<CpuFeatures> {
        let path = &self.config.cpuinfo_path;
        debug!(event = event_names::EXTRACT_STARTED, path = %path.display(), "parsing cpuinfo");
        match self.extractor.extract_file(path) {
            Ok(features) => {
                info!(
                    event = event_names::EXTRACT_FINISHED,
                    path = %path.display(),
                    vendor = features.vendor_id(),
                    model = features.model_name(),
                    "cpuinfo parsed"
                );
                Ok(features)
            }
            Err(err) => {
                warn!(
                    event = event_names::EXTRACT_FAILED,
                    path = %path.display(),
                    code = err.code(),
                    error = %err,
                    "cpuinfo parse failed"
                );
                Err(err)
            }
        }
    }

    /// PCI features for this node; failures count as none.
    #[cfg(feature = "pci")]
    pub fn pci_features(&self) -> Option<String> {
        if !self.config.pci.enabled {
            return None;
        }
        let matcher = PciDeviceMatcher::from_settings(&self.config.pci);
        match matcher.match_devices(self.pci_bus.as_ref()) {
            Ok(list) => list,
            Err(err) => {
                warn!(event = event_names::PCI_FAILED, error = %err, "PCI lookup failed");
                None
            }
        }
    }

    #[cfg(not(feature = "pci"))]
    pub fn pci_features(&self) -> Option<String> {
        None
    }
}

impl NodeFeaturesPlugin for CpuinfoPlugin {
    fn init(&self) -> Result<()> {
        let _span = debug_span!("init", stage = %Stage::Init).entered();
        debug!(event = event_names::PLUGIN_INIT, plugin = PLUGIN_TYPE, "init");
        Ok(())
    }

    fn fini(&self) -> Result<()> {
        debug!(event = event_names::PLUGIN_FINI, plugin = PLUGIN_TYPE, "fini");
        self.cache.invalidate();
        Ok(())
    }

    fn reconfig(&self) -> Result<()> {
        debug!("reconfig");
        self.cache.invalidate();
        Ok(())
    }

    fn node_state(&self, avail: &mut Option<String>, active: &mut Option<String>) {
        debug!(
            event = event_names::NODE_STATE,
            avail = avail.as_deref(),
            active = active.as_deref(),
            "node_state"
        );
        // Failure is already logged; the node simply contributes nothing.
        if let Ok(Some(features)) = self.rendered_features() {
            if !features.is_empty() {
                append_optional(avail, &features);
                append_optional(active, &features);
            }
        }
    }

    fn job_xlate(&self, job_features: Option<&str>) -> Option<String> {
        job_xlate(job_features)
    }

    fn node_xlate(
        &self,
        new_features: Option<&str>,
        orig_features: Option<&str>,
        avail_features: Option<&str>,
    ) -> Option<String> {
        xlate(new_features, orig_features, avail_features)
    }

    fn node_xlate2(&self, new_features: Option<&str>) -> Option<String> {
        debug!(new_features, "node_xlate2");
        reorder(new_features)
    }

    fn changeable_feature(&self, feature: &str) -> bool {
        debug!(feature, "changeable_feature");
        is_owned(feature)
    }
}
