use std::sync::Arc;
use derive_more::*;
use winit::window::Window;
use wgpu::*;
use crate::graphics::TargetInfo;

/**
 * Stores WGPU primitives needed to do any and all graphics operations.
 * Owns the window so that the surface never outlives it.
 */
pub struct GraphicsState {
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
    surface: Surface,
    surface_config: SurfaceConfiguration,
    depth_format: TextureFormat,
    depth_view: TextureView,
    max_dimension: u32,
    sample_count: u32,
    msaa_view: Option<TextureView>,
    window: Arc<Window>,
}

impl GraphicsState {

    pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

    /// Creates a surface for the window. A `sample_count` above 1 renders through a multisampled target.
    pub fn new(window: Arc<Window>, sample_count: u32) -> Result<Self, GraphicsError> {
        let instance = wgpu::Instance::new(InstanceDescriptor::default());
        let surface = unsafe { instance.create_surface(window.as_ref()) }
            .map_err(|source| GraphicsError::CreateSurface { source })?;
        let adapter = instance.request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        });
        let adapter = pollster::block_on(adapter).ok_or(GraphicsError::AdapterNotFound)?;
        let device_queue = adapter.request_device(&DeviceDescriptor::default(), None);
        let (device, queue) = pollster::block_on(device_queue)
            .map_err(|source| GraphicsError::RequestDevice { source })?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities.formats
            .iter()
            .copied()
            .find(TextureFormat::is_srgb)
            .or_else(|| capabilities.formats.first().copied())
            .unwrap_or(TextureFormat::Bgra8UnormSrgb);
        let max_dimension = device.limits().max_texture_dimension_2d;
        let window_size = window.inner_size();
        let (width, height) = clamp_surface_size(window_size.width, window_size.height, max_dimension);
        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: PresentMode::Fifo,
            alpha_mode: CompositeAlphaMode::Auto,
            view_formats: vec![],
        };
        surface.configure(&device, &surface_config);
        let (width, height) = (surface_config.width, surface_config.height);
        let depth_view = create_attachment(&device, width, height, Self::DEPTH_FORMAT, sample_count, "depth_texture");
        let msaa_view = (sample_count > 1).then(|| create_attachment(&device, width, height, format, sample_count, "msaa_texture"));
        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            surface,
            surface_config,
            depth_format: Self::DEPTH_FORMAT,
            depth_view,
            max_dimension,
            sample_count,
            msaa_view,
            window,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Current texture view to render on.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Convenience method for getting the surface's size in pixels.
    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Format of the surface's texture.
    pub fn surface_format(&self) -> TextureFormat {
        self.surface_config.format
    }

    /// Texture view of the depth buffer.
    pub fn depth_view(&self) -> &TextureView {
        &self.depth_view
    }

    /// Multisampled color target, resolved into the surface texture.
    pub fn msaa_view(&self) -> Option<&TextureView> {
        self.msaa_view.as_ref()
    }

    pub fn target_info(&self) -> TargetInfo {
        TargetInfo {
            color_format: self.surface_config.format,
            depth_format: self.depth_format,
            sample_count: self.sample_count,
        }
    }

    /// Resizes pixel size of surface, within the device's texture size limit.
    /// Commonly invoked when window size changes.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = clamp_surface_size(width, height, self.max_dimension);
        if (width, height) == self.surface_size() {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.reconfigure();
    }

    /// Reconfigures the surface after it was lost or became outdated.
    pub fn reconfigure(&mut self) {
        let (width, height) = self.surface_size();
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_attachment(&self.device, width, height, self.depth_format, self.sample_count, "depth_texture");
        if self.sample_count > 1 {
            let format = self.surface_config.format;
            self.msaa_view = Some(create_attachment(&self.device, width, height, format, self.sample_count, "msaa_texture"));
        }
    }
}

/// Keeps both dimensions between 1 and `max_dimension`.
fn clamp_surface_size(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max_dimension = max_dimension.max(1);
    if width > max_dimension || height > max_dimension {
        log::warn!("Surface {width}x{height} exceeds the {max_dimension}px texture limit, clamping");
    }
    (width.clamp(1, max_dimension), height.clamp(1, max_dimension))
}

fn create_attachment(
    device: &Device,
    width: u32,
    height: u32,
    format: TextureFormat,
    sample_count: u32,
    label: &'static str,
) -> TextureView {
    let texture = device.create_texture(&TextureDescriptor {
        label: Some(label),
        size: Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: TextureDimension::D2,
        format,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&TextureViewDescriptor::default())
}

#[derive(Error, Display, Debug)]
pub enum GraphicsError {
    #[display(fmt="failed to create surface: {source}")]
    CreateSurface { source: CreateSurfaceError },
    #[display(fmt="no compatible graphics adapter found")]
    AdapterNotFound,
    #[display(fmt="failed to request device: {source}")]
    RequestDevice { source: RequestDeviceError },
}


#[cfg(test)]
mod test {
    use super::clamp_surface_size;

    #[test]
    fn surface_size_stays_within_limits() {
        assert_eq!((8192, 4096), clamp_surface_size(10240, 4096, 8192));
        assert_eq!((1, 1), clamp_surface_size(0, 0, 8192));
        assert_eq!((800, 600), clamp_surface_size(800, 600, 8192));
    }
}
