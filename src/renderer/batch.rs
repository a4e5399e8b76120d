// renderer/batch.rs
//
// A batch merges the geometry of many small drawables into one vertex/index
// buffer pair. Each merged member owns a transform slot; every vertex it
// contributes carries that slot in `matrix_indices`, so the shader can pick the
// right model matrix from the slot table. Members that cannot be merged are
// still registered here but are drawn individually.

use super::material::{DrawFlags, Material};
use super::pool::{BatchId, BatchReclaim};
use crate::asset::{Mesh, MeshData, MATRIX_INDEX_ATTRIBUTE, TEXCOORD_ATTRIBUTE};
use crate::scene::Scene;
use glam::{Mat4, Vec2, Vec3};
use hecs::Entity;
use std::collections::{HashMap, HashSet};

/// Largest vertex count addressable by the `u16` combined index buffer.
pub const MAX_VERTEX_LIMIT: usize = u16::MAX as usize + 1;

/// Why a member is drawn on its own instead of through the merged buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassThroughReason {
    OptedOut,
    IncompatibleShader,
    EmptyMesh,
    Oversized,
    /// Indices point past the mesh's own vertices.
    MalformedMesh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberRoute {
    Merged,
    PassThrough(PassThroughReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub entity: Entity,
    pub route: MemberRoute,
}

impl Member {
    pub fn is_merged(&self) -> bool {
        self.route == MemberRoute::Merged
    }
}

/// Lifecycle of a batch instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Accumulating,
    Dirty,
    Ready,
    Pooled,
}

/// Render state shared by every merged member, captured from the first one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTemplate {
    pub material: Material,
    pub draw_flags: DrawFlags,
    mesh_attached: bool,
}

impl RenderTemplate {
    fn new(material: Material, draw_flags: DrawFlags) -> Self {
        Self {
            material,
            draw_flags,
            mesh_attached: false,
        }
    }

    /// Whether the combined mesh has been materialized for this template.
    pub fn is_ready(&self) -> bool {
        self.mesh_attached
    }
}

/// Everything the submission path needs for one merged draw.
#[derive(Debug, Clone, Copy)]
pub struct MergedDraw<'a> {
    pub batch: BatchId,
    pub template: &'a RenderTemplate,
    pub mesh: &'a Mesh,
    pub matrices: &'a [Mat4],
}

impl MergedDraw<'_> {
    /// Slot table as raw bytes, 64 per matrix.
    pub fn matrix_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.matrices)
    }
}

/// Eligibility facts about a candidate, read once from the scene.
struct Candidate {
    batching: bool,
    shader_compatible: bool,
    vertex_count: usize,
    index_count: usize,
    well_formed: bool,
    material: Material,
    draw_flags: DrawFlags,
}

impl Candidate {
    fn resolve(scene: &Scene, entity: Entity) -> Option<Self> {
        let render_data = scene.render_data(entity)?;
        let (vertex_count, index_count, well_formed) = scene
            .assets
            .meshes
            .get(render_data.mesh)
            .map_or((0, 0, true), |mesh| {
                (mesh.vertex_count(), mesh.index_count(), mesh.indices_in_range())
            });

        Some(Self {
            batching: render_data.batching,
            shader_compatible: render_data.uses_merge_compatible_shaders(),
            vertex_count,
            index_count,
            well_formed,
            material: render_data.material(),
            draw_flags: render_data.draw_flags,
        })
    }
}

pub struct Batch {
    id: BatchId,
    vertex_limit: usize,
    index_limit: usize,

    draw_count: u32,
    vertex_count: usize,
    index_count: usize,
    index_offset: u32,
    mesh_initialized: bool,
    batch_dirty: bool,
    not_batched: bool,
    pooled: bool,
    rebuilds: u64,

    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    tex_coords: Vec<Vec2>,
    indices: Vec<u16>,
    matrix_indices: Vec<u32>,

    matrices: Vec<Mat4>,
    slots: HashMap<Entity, u32>,
    members: Vec<Member>,
    member_set: HashSet<Entity>,

    template: Option<RenderTemplate>,
    mesh: Mesh,
}

impl Batch {
    /// Creates an empty batch. Both limits must be positive; the vertex limit
    /// is clamped to what a `u16` index can address.
    pub fn new(id: BatchId, vertex_limit: usize, index_limit: usize) -> Self {
        debug_assert!(vertex_limit > 0 && index_limit > 0);
        let vertex_limit = vertex_limit.min(MAX_VERTEX_LIMIT);

        Self {
            id,
            vertex_limit,
            index_limit,
            draw_count: 0,
            vertex_count: 0,
            index_count: 0,
            index_offset: 0,
            mesh_initialized: false,
            batch_dirty: false,
            not_batched: false,
            pooled: false,
            rebuilds: 0,
            vertices: Vec::with_capacity(vertex_limit),
            normals: Vec::with_capacity(vertex_limit),
            tex_coords: Vec::with_capacity(vertex_limit),
            indices: Vec::with_capacity(index_limit),
            matrix_indices: Vec::with_capacity(vertex_limit),
            matrices: Vec::new(),
            slots: HashMap::new(),
            members: Vec::new(),
            member_set: HashSet::new(),
            template: None,
            mesh: Mesh::new(),
        }
    }

    /// Offers `entity` to this batch.
    ///
    /// Returns true when the entity is now handled by this batch, either merged
    /// or as a pass-through member. False means the caller should try another
    /// batch; nothing in this batch or the scene was changed in that case.
    /// Offering an existing member again refreshes its slot matrix.
    pub fn add(&mut self, scene: &mut Scene, entity: Entity) -> bool {
        if self.pooled {
            log::warn!("{} is pooled, refusing {:?}", self.id, entity);
            return false;
        }

        if self.member_set.contains(&entity) {
            self.update_transform(scene, entity);
            return true;
        }

        let Some(candidate) = Candidate::resolve(scene, entity) else {
            log::warn!("Entity {:?} has no render data, not batching it", entity);
            return false;
        };

        if !candidate.batching {
            self.admit_pass_through(scene, entity, PassThroughReason::OptedOut);
            return true;
        }

        if !candidate.shader_compatible {
            self.admit_pass_through(scene, entity, PassThroughReason::IncompatibleShader);
            return true;
        }

        if !candidate.well_formed {
            log::warn!(
                "Mesh of {:?} indexes past its {} vertices, drawing it unmerged",
                entity,
                candidate.vertex_count
            );
            self.admit_pass_through(scene, entity, PassThroughReason::MalformedMesh);
            return true;
        }

        if candidate.index_count == 0
            || !self.has_room_for(candidate.vertex_count, candidate.index_count)
        {
            if self.draw_count > 0 {
                log::trace!(
                    "{} full ({}/{} indices), rejecting {:?} with {} indices",
                    self.id,
                    self.index_count,
                    self.index_limit,
                    entity,
                    candidate.index_count
                );
                return false;
            }

            let reason = if candidate.index_count == 0 {
                PassThroughReason::EmptyMesh
            } else {
                PassThroughReason::Oversized
            };
            self.not_batched = true;
            self.admit_pass_through(scene, entity, reason);
            return true;
        }

        // Unmerged-only batches never take geometry
        if self.not_batched {
            log::trace!("{} draws members unmerged, rejecting {:?}", self.id, entity);
            return false;
        }

        if self.draw_count == 0 && self.template.is_none() {
            self.template = Some(RenderTemplate::new(
                candidate.material,
                candidate.draw_flags,
            ));
        }

        self.register(scene, entity, MemberRoute::Merged);
        match scene.mesh_of(entity) {
            Some(mesh) => {
                self.assign_slot(entity, scene.model_matrix(entity));
                self.append_mesh(mesh);
            }
            None => log::warn!("Mesh of {:?} vanished during admission", entity),
        }
        true
    }

    fn has_room_for(&self, vertex_count: usize, index_count: usize) -> bool {
        self.index_count + index_count <= self.index_limit
            && self.vertex_count + vertex_count <= self.vertex_limit
    }

    fn admit_pass_through(&mut self, scene: &mut Scene, entity: Entity, reason: PassThroughReason) {
        log::trace!("{} takes {:?} as pass-through ({:?})", self.id, entity, reason);
        self.register(scene, entity, MemberRoute::PassThrough(reason));
    }

    fn register(&mut self, scene: &mut Scene, entity: Entity, route: MemberRoute) {
        if self.member_set.insert(entity) {
            self.members.push(Member { entity, route });
        }
        if let Some(mut render_data) = scene.render_data_mut(entity) {
            render_data.set_batch(self.id);
        }
    }

    fn assign_slot(&mut self, entity: Entity, matrix: Mat4) {
        self.slots.insert(entity, self.draw_count);
        self.matrices.push(matrix);
    }

    /// Appends one member's geometry, tagging its vertices with the current
    /// slot. Capacity must have been checked by the caller.
    fn append_mesh(&mut self, mesh: &MeshData) {
        debug_assert!(mesh.indices_in_range(), "malformed mesh reached the accumulator");
        let slot = self.draw_count;
        let vertex_count = mesh.vertex_count();

        self.vertices.extend_from_slice(&mesh.vertices);
        self.matrix_indices
            .extend(std::iter::repeat(slot).take(vertex_count));
        self.tex_coords.extend(
            (0..vertex_count).map(|i| mesh.tex_coords.get(i).copied().unwrap_or(Vec2::ZERO)),
        );

        // Normals are optional per source mesh
        if !mesh.normals.is_empty() {
            self.normals.extend_from_slice(&mesh.normals);
        }

        let offset = self.index_offset;
        self.indices
            .extend(mesh.indices.iter().map(|&index| (u32::from(index) + offset) as u16));

        self.index_count += mesh.index_count();
        self.vertex_count += vertex_count;
        self.index_offset += vertex_count as u32;
        self.draw_count += 1;
        self.mesh_initialized = false;
    }

    /// Overwrites the slot matrix of a merged member with its current transform.
    /// Returns false if the entity owns no slot here.
    pub fn update_transform(&mut self, scene: &Scene, entity: Entity) -> bool {
        match self.slots.get(&entity) {
            Some(&slot) => {
                self.matrices[slot as usize] = scene.model_matrix(entity);
                true
            }
            None => false,
        }
    }

    /// Re-reads every merged member's transform into its slot. Geometry is untouched.
    pub fn refresh_transforms(&mut self, scene: &Scene) {
        for (&entity, &slot) in &self.slots {
            self.matrices[slot as usize] = scene.model_matrix(entity);
        }
    }

    /// Drops members that were disabled, lost their owner or were despawned.
    ///
    /// Returns true when anything was removed; the buffers may then reference
    /// a stale slot and the batch is marked dirty.
    pub fn sweep_disabled(&mut self, scene: &Scene) -> bool {
        let stale: Vec<Entity> = self
            .members
            .iter()
            .map(|member| member.entity)
            .filter(|&entity| !scene.is_renderable(entity))
            .collect();

        if stale.is_empty() {
            return false;
        }

        for &entity in &stale {
            if let Some(mut render_data) = scene.render_data_mut(entity) {
                render_data.clear_batch(self.id);
            }
            self.member_set.remove(&entity);
        }
        self.members
            .retain(|member| !stale.contains(&member.entity));

        log::debug!(
            "{} evicted {} member(s), {} left",
            self.id,
            stale.len(),
            self.members.len()
        );
        self.batch_dirty = true;
        true
    }

    /// Rebuilds every buffer and slot from the registry, in registration order.
    pub fn regenerate(&mut self, scene: &Scene) {
        self.clear_data();
        self.rebuilds += 1;

        for i in 0..self.members.len() {
            let member = self.members[i];
            if !member.is_merged() {
                continue;
            }

            let Some(mesh) = scene.mesh_of(member.entity) else {
                log::warn!("{:?} lost its mesh, skipping it in {}", member.entity, self.id);
                continue;
            };
            if mesh.index_count() == 0 {
                continue;
            }
            if !mesh.indices_in_range() {
                log::warn!(
                    "{:?} now has a malformed mesh, drawing it unmerged",
                    member.entity
                );
                self.members[i].route = MemberRoute::PassThrough(PassThroughReason::MalformedMesh);
                continue;
            }
            if !self.has_room_for(mesh.vertex_count(), mesh.index_count()) {
                log::warn!(
                    "{:?} no longer fits in {}, drawing it unmerged",
                    member.entity,
                    self.id
                );
                self.members[i].route = MemberRoute::PassThrough(PassThroughReason::Oversized);
                continue;
            }

            self.assign_slot(member.entity, scene.model_matrix(member.entity));
            self.append_mesh(mesh);
        }

        log::trace!(
            "{} regenerated: {} draws, {} vertices, {} indices",
            self.id,
            self.draw_count,
            self.vertex_count,
            self.index_count
        );
    }

    /// Forces a rebuild on the next [`prepare_for_draw`](Self::prepare_for_draw).
    pub fn mark_dirty(&mut self) {
        self.batch_dirty = true;
    }

    /// Per-frame refresh.
    ///
    /// Evicts dead members, rebuilds when needed and materializes the combined
    /// mesh. A batch left without members is cleared and handed to `pool`
    /// exactly once, and reports [`BatchState::Pooled`].
    pub fn prepare_for_draw(&mut self, scene: &Scene, pool: &mut dyn BatchReclaim) -> BatchState {
        if self.pooled {
            return BatchState::Pooled;
        }

        let modified = self.sweep_disabled(scene);

        if self.members.is_empty() {
            log::debug!("{} is empty, returning it to the pool", self.id);
            self.reset();
            pool.reclaim(self.id);
            return BatchState::Pooled;
        }

        if modified || self.batch_dirty {
            self.regenerate(scene);
        }
        self.batch_dirty = false;

        if !self.mesh_initialized {
            self.mesh_init();
        }

        BatchState::Ready
    }

    fn mesh_init(&mut self) {
        self.mesh.set_vertices(&self.vertices);
        self.mesh.set_normals(&self.normals);
        self.mesh.set_vec2_vector(TEXCOORD_ATTRIBUTE, &self.tex_coords);
        self.mesh.set_indices(&self.indices);
        self.mesh.set_float_vector(
            MATRIX_INDEX_ATTRIBUTE,
            self.matrix_indices.iter().map(|&slot| slot as f32),
        );

        if let Some(template) = &mut self.template {
            template.mesh_attached = true;
        }
        self.mesh_initialized = true;
    }

    fn clear_data(&mut self) {
        self.vertex_count = 0;
        self.index_count = 0;
        self.index_offset = 0;
        self.draw_count = 0;
        self.slots.clear();
        self.matrix_indices.clear();
        self.matrices.clear();
        self.tex_coords.clear();
        self.vertices.clear();
        self.normals.clear();
        self.indices.clear();
        self.mesh_initialized = false;
        self.batch_dirty = false;
    }

    /// Clears everything, keeping allocations, and marks the batch pooled.
    pub(crate) fn reset(&mut self) {
        self.clear_data();
        self.members.clear();
        self.member_set.clear();
        self.template = None;
        self.not_batched = false;
        self.mesh.clear();
        self.pooled = true;
    }

    /// Reactivates a pooled batch under a new id.
    pub(crate) fn reassign(&mut self, id: BatchId) {
        debug_assert!(self.pooled, "reassigning a live batch");
        self.id = id;
        self.pooled = false;
    }

    pub fn state(&self) -> BatchState {
        if self.pooled {
            BatchState::Pooled
        } else if self.batch_dirty {
            BatchState::Dirty
        } else if self.mesh_initialized {
            BatchState::Ready
        } else {
            BatchState::Accumulating
        }
    }

    /// Merged draw for this batch, once it is ready and holds geometry.
    pub fn merged_draw(&self) -> Option<MergedDraw<'_>> {
        if self.draw_count == 0 || !self.mesh_initialized {
            return None;
        }
        let template = self.template.as_ref().filter(|t| t.is_ready())?;
        Some(MergedDraw {
            batch: self.id,
            template,
            mesh: &self.mesh,
            matrices: &self.matrices,
        })
    }

    pub fn pass_through_members(&self) -> impl Iterator<Item = Entity> + '_ {
        self.members
            .iter()
            .filter(|member| !member.is_merged())
            .map(|member| member.entity)
    }

    pub fn merged_members(&self) -> impl Iterator<Item = Entity> + '_ {
        self.members
            .iter()
            .filter(|member| member.is_merged())
            .map(|member| member.entity)
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn vertex_limit(&self) -> usize {
        self.vertex_limit
    }

    pub fn index_limit(&self) -> usize {
        self.index_limit
    }

    pub fn draw_count(&self) -> u32 {
        self.draw_count
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn index_offset(&self) -> u32 {
        self.index_offset
    }

    pub fn is_mesh_initialized(&self) -> bool {
        self.mesh_initialized
    }

    pub fn is_dirty(&self) -> bool {
        self.batch_dirty
    }

    /// True once an unmergeable member landed in this batch while it held no geometry.
    pub fn not_batched(&self) -> bool {
        self.not_batched
    }

    pub fn is_pooled(&self) -> bool {
        self.pooled
    }

    /// How many times the rebuild engine ran on this instance.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.member_set.contains(&entity)
    }

    pub fn slot_of(&self, entity: Entity) -> Option<u32> {
        self.slots.get(&entity).copied()
    }

    pub fn template(&self) -> Option<&RenderTemplate> {
        self.template.as_ref()
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn tex_coords(&self) -> &[Vec2] {
        &self.tex_coords
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn matrix_indices(&self) -> &[u32] {
        &self.matrix_indices
    }

    pub fn matrices(&self) -> &[Mat4] {
        &self.matrices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::primitives::{quad_mesh, triangle_mesh};
    use crate::renderer::material::ShaderType;
    use crate::renderer::RenderData;
    use crate::scene::Transform;

    fn batch(vertices: usize, indices: usize) -> Batch {
        Batch::new(BatchId::new(0, 0), vertices, indices)
    }

    fn spawn(scene: &mut Scene, mesh: MeshData, x: f32) -> Entity {
        let handle = scene.add_mesh(mesh);
        scene.spawn_drawable(
            handle,
            Material::white(),
            Transform::from_translation(Vec3::new(x, 0.0, 0.0)),
        )
    }

    #[test]
    fn append_mesh_offsets_indices_and_tags_slots() {
        let mut b = batch(64, 64);
        b.append_mesh(&triangle_mesh());
        b.append_mesh(&quad_mesh());

        assert_eq!(b.draw_count(), 2);
        assert_eq!(b.vertex_count(), 7);
        assert_eq!(b.index_offset(), 7);
        assert_eq!(b.index_count(), 9);
        assert_eq!(&b.indices()[..3], &[0, 1, 2]);
        assert_eq!(&b.indices()[3..], &[3, 4, 5, 3, 5, 6]);
        assert_eq!(b.matrix_indices(), &[0, 0, 0, 1, 1, 1, 1]);
        assert!(!b.is_mesh_initialized());
    }

    #[test]
    fn append_mesh_passes_normals_through_and_pads_tex_coords() {
        let mut b = batch(64, 64);
        let bare = MeshData::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]);
        b.append_mesh(&bare);
        b.append_mesh(&quad_mesh());

        assert_eq!(b.normals().len(), 4);
        assert_eq!(b.tex_coords().len(), 7);
        assert_eq!(&b.tex_coords()[..3], &[Vec2::ZERO; 3]);
    }

    #[test]
    fn opted_out_member_is_pass_through() {
        let mut scene = Scene::new();
        let mesh = scene.add_mesh(quad_mesh());
        let e = scene
            .builder()
            .with_render_data(RenderData::new(mesh, Material::white()).without_batching())
            .spawn();

        let mut b = batch(64, 64);
        assert!(b.add(&mut scene, e));
        assert_eq!(b.members()[0].route, MemberRoute::PassThrough(PassThroughReason::OptedOut));
        assert_eq!(b.draw_count(), 0);
        assert!(b.vertices().is_empty());
        assert!(b.slot_of(e).is_none());
        assert!(!b.not_batched());
        assert_eq!(scene.batch_of(e), Some(b.id()));
    }

    #[test]
    fn incompatible_shader_is_pass_through() {
        let mut scene = Scene::new();
        let mesh = scene.add_mesh(quad_mesh());
        let e = scene.spawn_drawable(
            mesh,
            Material::white().with_shader(ShaderType::Lit),
            Transform::IDENTITY,
        );

        let mut b = batch(64, 64);
        assert!(b.add(&mut scene, e));
        assert_eq!(
            b.members()[0].route,
            MemberRoute::PassThrough(PassThroughReason::IncompatibleShader)
        );
        assert!(b.indices().is_empty());
        assert!(b.template().is_none());
    }

    #[test]
    fn first_merged_member_sets_template() {
        let mut scene = Scene::new();
        let mesh = scene.add_mesh(quad_mesh());
        let red = scene.spawn_drawable(mesh, Material::red(), Transform::IDENTITY);
        let blue = scene.spawn_drawable(mesh, Material::blue(), Transform::IDENTITY);

        let mut b = batch(64, 64);
        assert!(b.add(&mut scene, red));
        assert!(b.add(&mut scene, blue));
        let template = b.template().copied().unwrap();
        assert_eq!(template.material, Material::red());
        assert!(!template.is_ready());
    }

    #[test]
    fn rejection_leaves_no_trace() {
        let mut scene = Scene::new();
        let a = spawn(&mut scene, quad_mesh(), 0.0);
        let b_entity = spawn(&mut scene, quad_mesh(), 1.0);

        let mut b = batch(8, 6);
        assert!(b.add(&mut scene, a));
        let indices = b.indices().to_vec();

        assert!(!b.add(&mut scene, b_entity));
        assert_eq!(b.member_count(), 1);
        assert_eq!(b.matrices().len(), 1);
        assert!(b.slot_of(b_entity).is_none());
        assert_eq!(b.indices(), &indices[..]);
        assert_eq!(scene.batch_of(b_entity), None);
        assert!(scene.render_data(b_entity).unwrap().batching);
    }

    #[test]
    fn vertex_capacity_is_enforced() {
        let mut scene = Scene::new();
        let a = spawn(&mut scene, quad_mesh(), 0.0);
        let c = spawn(&mut scene, triangle_mesh(), 1.0);

        let mut b = batch(6, 64);
        assert!(b.add(&mut scene, a));
        assert!(!b.add(&mut scene, c));
        assert!(b.vertex_count() <= b.vertex_limit());
    }

    #[test]
    fn oversized_first_member_becomes_pass_through() {
        let mut scene = Scene::new();
        let e = spawn(&mut scene, quad_mesh(), 0.0);

        let mut b = batch(64, 3);
        assert!(b.add(&mut scene, e));
        assert!(b.not_batched());
        assert_eq!(b.members()[0].route, MemberRoute::PassThrough(PassThroughReason::Oversized));
        assert!(b.vertices().is_empty());
    }

    #[test]
    fn unmerged_only_batch_rejects_fitting_geometry() {
        let mut scene = Scene::new();
        let quad = spawn(&mut scene, quad_mesh(), 0.0);
        let triangle = spawn(&mut scene, triangle_mesh(), 1.0);
        let mesh = scene.add_mesh(quad_mesh());
        let lit = scene.spawn_drawable(
            mesh,
            Material::white().with_shader(ShaderType::Lit),
            Transform::IDENTITY,
        );

        let mut b = batch(64, 3);
        assert!(b.add(&mut scene, quad));
        assert!(b.not_batched());

        assert!(!b.add(&mut scene, triangle));
        assert_eq!(scene.batch_of(triangle), None);
        assert!(b.add(&mut scene, lit));

        let mut reclaimed: Vec<BatchId> = Vec::new();
        assert_eq!(b.prepare_for_draw(&scene, &mut reclaimed), BatchState::Ready);
        assert_eq!(b.draw_count(), 0);
        assert!(b.merged_draw().is_none());
        assert_eq!(b.pass_through_members().count(), 2);
    }

    #[test]
    fn malformed_mesh_is_drawn_unmerged() {
        let mut scene = Scene::new();
        let good = spawn(&mut scene, triangle_mesh(), 0.0);
        let broken = spawn(
            &mut scene,
            MeshData::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 7]),
            1.0,
        );

        let mut b = batch(64, 64);
        assert!(b.add(&mut scene, good));
        assert!(b.add(&mut scene, broken));
        assert_eq!(
            b.members()[1].route,
            MemberRoute::PassThrough(PassThroughReason::MalformedMesh)
        );
        assert_eq!(b.draw_count(), 1);
        assert!(b.indices().iter().all(|&index| usize::from(index) < b.vertex_count()));
    }

    #[test]
    fn rebuild_demotes_member_whose_mesh_went_bad() {
        let mut scene = Scene::new();
        let a = spawn(&mut scene, triangle_mesh(), 0.0);
        let c = spawn(&mut scene, quad_mesh(), 1.0);

        let mut b = batch(64, 64);
        b.add(&mut scene, a);
        b.add(&mut scene, c);

        let handle = scene.render_data(a).unwrap().mesh;
        scene.assets.meshes.get_mut(handle).unwrap().indices = vec![0, 1, 9];
        b.regenerate(&scene);

        assert_eq!(
            b.members()[0].route,
            MemberRoute::PassThrough(PassThroughReason::MalformedMesh)
        );
        assert_eq!(b.draw_count(), 1);
        assert_eq!(b.slot_of(c), Some(0));
        assert_eq!(b.indices(), &[0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn readding_member_updates_slot_in_place() {
        let mut scene = Scene::new();
        let a = spawn(&mut scene, quad_mesh(), 0.0);
        let c = spawn(&mut scene, triangle_mesh(), 1.0);

        let mut b = batch(64, 64);
        assert!(b.add(&mut scene, a));
        assert!(b.add(&mut scene, c));
        let indices = b.indices().to_vec();

        let moved = Transform::from_translation(Vec3::new(0.0, 9.0, 0.0));
        scene.set_transform(c, moved);
        assert!(b.add(&mut scene, c));

        assert_eq!(b.member_count(), 2);
        assert_eq!(b.draw_count(), 2);
        assert_eq!(b.matrices()[1], moved.matrix());
        assert_eq!(b.indices(), &indices[..]);
    }

    #[test]
    fn refresh_transforms_rereads_every_slot() {
        let mut scene = Scene::new();
        let a = spawn(&mut scene, quad_mesh(), 0.0);
        let c = spawn(&mut scene, quad_mesh(), 1.0);

        let mut b = batch(64, 64);
        b.add(&mut scene, a);
        b.add(&mut scene, c);

        let moved = Transform::from_translation(Vec3::splat(3.0));
        scene.set_transform(a, moved);
        scene.set_transform(c, moved);
        b.refresh_transforms(&scene);
        assert!(b.matrices().iter().all(|m| *m == moved.matrix()));
    }

    #[test]
    fn sweep_clears_back_reference_and_marks_dirty() {
        let mut scene = Scene::new();
        let a = spawn(&mut scene, quad_mesh(), 0.0);
        let c = spawn(&mut scene, quad_mesh(), 1.0);

        let mut b = batch(64, 64);
        b.add(&mut scene, a);
        b.add(&mut scene, c);
        assert!(!b.sweep_disabled(&scene));

        scene.set_enabled(a, false);
        assert!(b.sweep_disabled(&scene));
        assert!(!b.contains(a));
        assert!(b.is_dirty());
        assert_eq!(b.state(), BatchState::Dirty);
        assert_eq!(scene.batch_of(a), None);
        assert_eq!(scene.batch_of(c), Some(b.id()));
        // geometry is left for the rebuild
        assert_eq!(b.draw_count(), 2);
    }

    #[test]
    fn regenerate_skips_pass_through_members() {
        let mut scene = Scene::new();
        let mesh = scene.add_mesh(quad_mesh());
        let lit = scene.spawn_drawable(
            mesh,
            Material::white().with_shader(ShaderType::Lit),
            Transform::IDENTITY,
        );
        let merged = scene.spawn_drawable(mesh, Material::white(), Transform::IDENTITY);

        let mut b = batch(64, 64);
        b.add(&mut scene, lit);
        b.add(&mut scene, merged);
        b.regenerate(&scene);

        assert_eq!(b.draw_count(), 1);
        assert_eq!(b.slot_of(merged), Some(0));
        assert_eq!(b.pass_through_members().collect::<Vec<_>>(), vec![lit]);
    }

    #[test]
    fn prepare_materializes_named_attributes() {
        let mut scene = Scene::new();
        let a = spawn(&mut scene, triangle_mesh(), 0.0);
        let c = spawn(&mut scene, triangle_mesh(), 1.0);

        let mut b = batch(64, 64);
        b.add(&mut scene, a);
        b.add(&mut scene, c);

        let mut reclaimed: Vec<BatchId> = Vec::new();
        assert_eq!(b.prepare_for_draw(&scene, &mut reclaimed), BatchState::Ready);
        assert_eq!(b.state(), BatchState::Ready);
        assert!(reclaimed.is_empty());

        let mesh = b.mesh();
        assert_eq!(mesh.vertices(), b.vertices());
        assert_eq!(mesh.indices(), b.indices());
        assert_eq!(
            mesh.float_vector(MATRIX_INDEX_ATTRIBUTE),
            Some(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0][..])
        );
        assert_eq!(mesh.vec2_vector(TEXCOORD_ATTRIBUTE).map(<[Vec2]>::len), Some(6));

        let draw = b.merged_draw().unwrap();
        assert!(draw.template.is_ready());
        assert_eq!(draw.matrices.len(), 2);
        assert_eq!(draw.matrix_bytes().len(), 2 * 64);
    }

    #[test]
    fn pooled_batch_refuses_members() {
        let mut scene = Scene::new();
        let e = spawn(&mut scene, quad_mesh(), 0.0);

        let mut b = batch(64, 64);
        b.reset();
        assert_eq!(b.state(), BatchState::Pooled);
        assert!(!b.add(&mut scene, e));

        b.reassign(BatchId::new(0, 1));
        assert_eq!(b.state(), BatchState::Accumulating);
        assert!(b.add(&mut scene, e));
        assert_eq!(scene.batch_of(e), Some(BatchId::new(0, 1)));
    }

    #[test]
    fn missing_entity_is_rejected() {
        let mut scene = Scene::new();
        let e = spawn(&mut scene, quad_mesh(), 0.0);
        scene.despawn(e);

        let mut b = batch(64, 64);
        assert!(!b.add(&mut scene, e));
        assert_eq!(b.member_count(), 0);
    }

    #[test]
    fn vertex_limit_is_clamped_to_u16_range() {
        let b = batch(1 << 20, 64);
        assert_eq!(b.vertex_limit(), MAX_VERTEX_LIMIT);
    }
}
