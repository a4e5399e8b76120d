pub mod asset;
pub mod renderer;
pub mod scene;
pub mod settings;

use renderer::BatchManager;
use scene::Scene;
use settings::BatchSettings;

pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

/// Batches `scene` once with settings from `batch_settings.json` and logs what came out.
pub fn run(scene: &mut Scene) -> BatchManager {
    let settings = BatchSettings::load();
    log::info!(
        "Batching with {} vertices / {} indices per batch",
        settings.vertex_limit,
        settings.index_limit
    );

    let mut manager = BatchManager::new(settings);
    let added = manager.add_all(scene);
    let ready = manager.prepare(scene);
    let stats = manager.stats();

    log::info!(
        "{} entities in {} batches ({} ready): {} merged, {} unmerged, {} vertices, {} indices",
        added,
        stats.active_batches,
        ready,
        stats.merged_members,
        stats.pass_through_members,
        stats.vertices,
        stats.indices
    );
    let draw_list = manager.draw_list();
    for item in &draw_list {
        if let renderer::DrawItem::Single { entity, batch } = item {
            log::debug!(
                "{} drawn unmerged from {}",
                scene
                    .name_of(*entity)
                    .unwrap_or_else(|| format!("{:?}", entity)),
                batch
            );
        }
    }
    log::info!("{} draw calls", draw_list.len());

    manager
}
