//! Growable GPU buffers for geometry that changes every frame

use bytemuck::Pod;

const MIN_CAPACITY: u64 = 4096;

/// A GPU buffer rewritten from CPU data, reallocated when too small
pub struct DynamicBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    usage: wgpu::BufferUsages,
    label: &'static str,
    len: u32,
}

impl DynamicBuffer {
    pub fn new(device: &wgpu::Device, label: &'static str, usage: wgpu::BufferUsages) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        Self {
            buffer: create(device, label, usage, MIN_CAPACITY),
            capacity: MIN_CAPACITY,
            usage,
            label,
            len: 0,
        }
    }

    /// Replace the contents with `data`
    pub fn write<T: Pod>(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let required = bytes.len() as u64;
        if required > self.capacity {
            self.capacity = grown_capacity(self.capacity, required);
            self.buffer = create(device, self.label, self.usage, self.capacity);
            log::debug!("Grew {} to {} bytes", self.label, self.capacity);
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.len = data.len() as u32;
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Number of elements written last
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn create(
    device: &wgpu::Device,
    label: &str,
    usage: wgpu::BufferUsages,
    size: u64,
) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation: false,
    })
}

/// Next power of two that fits `required`, never below the current capacity
fn grown_capacity(current: u64, required: u64) -> u64 {
    required.next_power_of_two().max(current).max(MIN_CAPACITY)
}

/// Vertex and index buffers for one indexed triangle list
pub struct MeshBuffers {
    pub vertices: DynamicBuffer,
    pub indices: DynamicBuffer,
}

impl MeshBuffers {
    pub fn new(device: &wgpu::Device, label: &'static str) -> Self {
        Self {
            vertices: DynamicBuffer::new(device, label, wgpu::BufferUsages::VERTEX),
            indices: DynamicBuffer::new(device, label, wgpu::BufferUsages::INDEX),
        }
    }

    pub fn upload<V: Pod>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        vertices: &[V],
        indices: &[u32],
    ) {
        self.vertices.write(device, queue, vertices);
        self.indices.write(device, queue, indices);
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len()
    }

    /// Bind and draw into an open render pass
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.indices.is_empty() {
            return;
        }
        pass.set_vertex_buffer(0, self.vertices.buffer().slice(..));
        pass.set_index_buffer(self.indices.buffer().slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count(), 0, 0..1);
    }
}
