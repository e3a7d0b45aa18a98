//! Per-window render targets: multisampled color and depth

/// Depth format shared by the scene and shadow passes
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Color and depth attachments sized to the surface
pub struct FrameTargets {
    format: wgpu::TextureFormat,
    sample_count: u32,
    size: (u32, u32),
    msaa_view: Option<wgpu::TextureView>,
    depth_view: wgpu::TextureView,
}

impl FrameTargets {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Self {
        let size = (width.max(1), height.max(1));
        Self {
            format,
            sample_count,
            size,
            msaa_view: create_msaa(device, format, size, sample_count),
            depth_view: create_depth(device, size, sample_count),
        }
    }

    /// Recreate the attachments if the size changed
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let size = (width.max(1), height.max(1));
        if size != self.size {
            self.size = size;
            self.msaa_view = create_msaa(device, self.format, size, self.sample_count);
            self.depth_view = create_depth(device, size, self.sample_count);
        }
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Color attachment drawing toward `surface`
    ///
    /// With multisampling the pass draws into the multisampled texture and,
    /// when `resolve` is set, resolves into the surface at the end.
    pub fn color_attachment<'a>(
        &'a self,
        surface: &'a wgpu::TextureView,
        load: wgpu::LoadOp<wgpu::Color>,
        resolve: bool,
    ) -> wgpu::RenderPassColorAttachment<'a> {
        let (view, resolve_target) = match &self.msaa_view {
            Some(msaa) => (msaa, if resolve { Some(surface) } else { None }),
            None => (surface, None),
        };
        wgpu::RenderPassColorAttachment {
            view,
            resolve_target,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        }
    }
}

fn create_msaa(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    size: (u32, u32),
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    if sample_count <= 1 {
        return None;
    }
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("MSAA Color Texture"),
        size: wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}

fn create_depth(device: &wgpu::Device, size: (u32, u32), sample_count: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
