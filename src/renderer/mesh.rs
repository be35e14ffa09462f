use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::geometry::{self, MeshData};
use crate::scene::MeshId;

/// A mesh uploaded to the GPU: vertex and index buffers plus the draw count.
pub struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl Mesh {
    pub fn upload(device: &wgpu::Device, data: &MeshData, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }

    /// Issue the draw using whatever bind state the pass currently holds.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// All procedural scene meshes, built once at startup and keyed by `MeshId`.
pub struct MeshRegistry {
    meshes: HashMap<MeshId, Mesh>,
}

impl MeshRegistry {
    pub fn build(device: &wgpu::Device) -> Self {
        let mut meshes = HashMap::new();
        for (id, data, label) in [
            (MeshId::Island, geometry::island(), "island"),
            (MeshId::TreeSmall, geometry::tree_small(), "tree_small"),
            (MeshId::TreeLarge, geometry::tree_large(), "tree_large"),
            (MeshId::Hedge, geometry::hedge(), "hedge"),
            (MeshId::Tulip, geometry::tulip(), "tulip"),
            (MeshId::Bench, geometry::bench(), "bench"),
            (MeshId::Bird, geometry::bird(), "bird"),
        ] {
            meshes.insert(id, Mesh::upload(device, &data, label));
        }
        Self { meshes }
    }

    pub fn get(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(&id)
    }
}
