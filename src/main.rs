mod demo_scenes;

use demo_scenes::DemoScene;

const ACTIVE_SCENE: DemoScene = DemoScene::Grid { size: 24 };

fn main() {
    geometry_batcher::init_logging();
    log::info!("Starting geometry batcher demo: {:?}", ACTIVE_SCENE);

    let mut scene = ACTIVE_SCENE.build();
    let mut manager = geometry_batcher::run(&mut scene);

    let evicted = demo_scenes::disable_every_nth(&mut scene, 3);
    manager.prepare(&scene);
    let stats = manager.stats();
    log::info!(
        "After disabling {} entities: {} batches, {} pooled, {} draw calls",
        evicted,
        stats.active_batches,
        stats.pooled_batches,
        manager.draw_list().len()
    );
}
