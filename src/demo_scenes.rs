use geometry_batcher::asset::primitives::{cube_mesh, quad_mesh, triangle_mesh};
use geometry_batcher::asset::MeshData;
use geometry_batcher::renderer::{Material, RenderData, ShaderType};
use geometry_batcher::scene::{Scene, Transform};
use glam::{Quat, Vec3};
use hecs::Entity;
use log::info;

#[allow(dead_code)]
#[derive(Clone, Copy, Debug)]
pub enum DemoScene {
    /// size x size cubes, with a few unmergeable ones mixed in.
    Grid { size: i32 },
    /// Small props sharing one material.
    Props { count: u32 },
}

impl DemoScene {
    pub fn build(self) -> Scene {
        let mut scene = Scene::new();
        match self {
            DemoScene::Grid { size } => setup_grid_scene(&mut scene, size),
            DemoScene::Props { count } => setup_props_scene(&mut scene, count),
        }
        scene
    }
}

fn setup_grid_scene(scene: &mut Scene, size: i32) {
    let cube = scene.add_mesh(cube_mesh());
    let empty = scene.add_mesh(MeshData::default());
    let half = size as f32 * 0.5;

    for x in 0..size {
        for z in 0..size {
            let position = Vec3::new(x as f32 - half, 0.0, z as f32 - half) * 1.5;
            let transform = Transform::from_trs(
                position,
                Quat::from_rotation_y((x * z) as f32 * 0.1),
                Vec3::splat(0.8),
            );

            let render_data = match (x + z) % 11 {
                0 => RenderData::new(cube, Material::white().with_shader(ShaderType::Lit)),
                5 => RenderData::new(cube, Material::red()).without_batching(),
                _ => RenderData::new(cube, Material::white()),
            };

            scene
                .builder()
                .with_name(format!("cube_{x}_{z}"))
                .with_transform(transform)
                .with_render_data(render_data)
                .enabled(true)
                .spawn();
        }
    }

    // Marker with no geometry; ends up unmerged in a batch of its own
    scene
        .builder()
        .with_name("spawn_point")
        .with_mesh(empty, Material::white())
        .spawn();

    info!("Built grid scene with {} cubes", size * size);
}

fn setup_props_scene(scene: &mut Scene, count: u32) {
    let quad = scene.add_mesh(quad_mesh());
    let triangle = scene.add_mesh(triangle_mesh());

    for i in 0..count {
        let mesh = if i % 2 == 0 { quad } else { triangle };
        let angle = i as f32 * 0.35;
        let position = Vec3::new(angle.cos(), i as f32 * 0.05, angle.sin()) * 4.0;
        scene.spawn_drawable(
            mesh,
            Material::green(),
            Transform::from_translation(position),
        );
    }

    info!("Built props scene with {} props", count);
}

/// Disables every `n`th drawable and returns how many were switched off.
pub fn disable_every_nth(scene: &mut Scene, n: usize) -> usize {
    let entities: Vec<Entity> = scene
        .world
        .query::<&RenderData>()
        .iter()
        .map(|(entity, _)| entity)
        .step_by(n.max(1))
        .collect();

    for &entity in &entities {
        scene.set_enabled(entity, false);
    }
    entities.len()
}
