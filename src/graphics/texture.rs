use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use fxhash::FxHashMap;
use wgpu::*;

/**
 * Shareable handle to a texture image that may still be decoding.
 * Clones refer to the same slot.
 */
#[derive(Clone)]
pub struct Texture {
    path: Arc<PathBuf>,
    slot: Arc<RwLock<TextureSlot>>,
}

impl Texture {

    /// A texture whose image is already available.
    pub fn from_image(path: impl Into<PathBuf>, image: TextureImage) -> Self {
        Self {
            path: Arc::new(path.into()),
            slot: Arc::new(RwLock::new(TextureSlot::Loaded(Arc::new(image)))),
        }
    }

    fn loading(path: PathBuf) -> Self {
        Self {
            path: Arc::new(path),
            slot: Arc::new(RwLock::new(TextureSlot::Loading)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identity of the underlying slot, shared by all clones.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.slot) as usize
    }

    pub fn status(&self) -> TextureStatus {
        match &*self.slot.read().unwrap_or_else(PoisonError::into_inner) {
            TextureSlot::Loading => TextureStatus::Loading,
            TextureSlot::Loaded(_) => TextureStatus::Loaded,
            TextureSlot::Failed => TextureStatus::Failed,
        }
    }

    /// Decoded image, if loading finished successfully.
    pub fn image(&self) -> Option<Arc<TextureImage>> {
        match &*self.slot.read().unwrap_or_else(PoisonError::into_inner) {
            TextureSlot::Loaded(image) => Some(image.clone()),
            _ => None,
        }
    }

    fn finish(&self, slot: TextureSlot) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = slot;
    }
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("path", &self.path)
            .field("status", &self.status())
            .finish()
    }
}

enum TextureSlot {
    Loading,
    Loaded(Arc<TextureImage>),
    Failed,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TextureStatus {
    Loading,
    Loaded,
    Failed,
}

/// Decoded RGBA8 pixels.
#[derive(Clone, PartialEq, Debug)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    /// 1x1 image of a single color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self { width: 1, height: 1, pixels: rgba.to_vec() }
    }
}

/**
 * Loads textures relative to an asset root.
 * Decoding happens on the rayon pool, and callers get a handle back immediately.
 */
#[derive(Clone, Debug)]
pub struct TextureLoader {
    root: PathBuf,
}

impl TextureLoader {

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Texture {
        let path = self.root.join(path);
        let texture = Texture::loading(path.clone());
        let slot = texture.clone();
        rayon::spawn(move || {
            match image::open(&path) {
                Ok(image) => {
                    let image = image.to_rgba8();
                    let (width, height) = image.dimensions();
                    log::debug!("Loaded texture {} ({width}x{height})", path.display());
                    slot.finish(TextureSlot::Loaded(Arc::new(TextureImage {
                        width,
                        height,
                        pixels: image.into_raw(),
                    })));
                },
                Err(err) => {
                    log::warn!("Failed to load texture {}: {err}", path.display());
                    slot.finish(TextureSlot::Failed);
                },
            }
        });
        texture
    }
}


/**
 * GPU copies of [`Texture`]s, uploaded once their images finish decoding.
 */
pub struct GpuTextures {
    views: UploadCache<TextureView>,
    white: TextureView,
    black: TextureView,
    pub(crate) sampler: Sampler,
}

/**
 * Per-texture uploads keyed by slot and color space, so a texture used both as a
 * color map and as a data map gets one upload of each format.
 */
pub(crate) struct UploadCache<V> {
    entries: FxHashMap<(usize, bool), Upload<V>>,
}

struct Upload<V> {
    // Keeps the slot alive so its id is not reused.
    _texture: Texture,
    value: V,
}

impl<V> Default for UploadCache<V> {
    fn default() -> Self {
        Self { entries: FxHashMap::default() }
    }
}

impl<V> UploadCache<V> {

    /// Cached upload, or a new one made from the texture's image if it finished loading.
    pub fn get_or_upload(&mut self, texture: &Texture, srgb: bool, upload: impl FnOnce(&TextureImage) -> V) -> Option<&V> {
        let key = (texture.id(), srgb);
        if !self.entries.contains_key(&key) {
            let image = texture.image()?;
            let value = upload(&image);
            self.entries.insert(key, Upload { _texture: texture.clone(), value });
        }
        self.entries.get(&key).map(|entry| &entry.value)
    }

    pub fn get(&self, texture: &Texture, srgb: bool) -> Option<&V> {
        self.entries.get(&(texture.id(), srgb)).map(|entry| &entry.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl GpuTextures {

    pub fn new(device: &Device, queue: &Queue) -> Self {
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("material_sampler"),
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Nearest,
            ..Default::default()
        });
        Self {
            views: UploadCache::default(),
            white: upload(device, queue, &TextureImage::solid([255; 4]), false),
            black: upload(device, queue, &TextureImage::solid([0, 0, 0, 255]), false),
            sampler,
        }
    }

    /**
     * View of a texture if its image is available, uploading it on first use.
     * Color textures are sampled as sRGB, data textures (roughness, height...) as linear.
     */
    pub fn view(&mut self, texture: &Texture, srgb: bool, device: &Device, queue: &Queue) -> Option<&TextureView> {
        self.views.get_or_upload(texture, srgb, |image| upload(device, queue, image, srgb))
    }

    /// View uploaded by an earlier [`GpuTextures::view`] with the same `srgb`.
    pub fn get(&self, texture: &Texture, srgb: bool) -> Option<&TextureView> {
        self.views.get(texture, srgb)
    }

    pub fn white(&self) -> &TextureView {
        &self.white
    }

    pub fn black(&self) -> &TextureView {
        &self.black
    }
}

fn upload(device: &Device, queue: &Queue, image: &TextureImage, srgb: bool) -> TextureView {
    let size = Extent3d {
        width: image.width.max(1),
        height: image.height.max(1),
        depth_or_array_layers: 1,
    };
    let format = if srgb { TextureFormat::Rgba8UnormSrgb } else { TextureFormat::Rgba8Unorm };
    let texture = device.create_texture(&TextureDescriptor {
        label: Some("material_texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: Origin3d::ZERO,
            aspect: TextureAspect::All,
        },
        &image.pixels,
        ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * size.width),
            rows_per_image: Some(size.height),
        },
        size,
    );
    texture.create_view(&TextureViewDescriptor::default())
}


#[cfg(test)]
mod test {
    use std::time::{Duration, Instant};
    use super::{Texture, TextureImage, TextureLoader, TextureStatus, UploadCache};

    fn wait(texture: &Texture) -> TextureStatus {
        let start = Instant::now();
        while texture.status() == TextureStatus::Loading && start.elapsed() < Duration::from_secs(10) {
            std::thread::sleep(Duration::from_millis(5));
        }
        texture.status()
    }

    #[test]
    fn uploads_are_per_color_space() {
        let texture = Texture::from_image("map.png", TextureImage::solid([255; 4]));
        let mut cache = UploadCache::default();
        assert_eq!(Some(&"srgb"), cache.get_or_upload(&texture, true, |_| "srgb"));
        assert_eq!(Some(&"linear"), cache.get_or_upload(&texture, false, |_| "linear"));
        assert_eq!(Some(&"srgb"), cache.get_or_upload(&texture.clone(), true, |_| "again"));
        assert_eq!(Some(&"linear"), cache.get(&texture, false));
        assert_eq!(2, cache.len());
    }

    #[test]
    fn unloaded_textures_are_not_cached() {
        // Loading or failed, the file does not exist either way.
        let texture = TextureLoader::new(std::env::temp_dir()).load("scene_demos_unloaded_texture.png");
        let mut cache = UploadCache::default();
        assert_eq!(None, cache.get_or_upload(&texture, true, |_| 0));
        assert_eq!(0, cache.len());
    }

    #[test]
    fn missing_file_fails() {
        let loader = TextureLoader::new(std::env::temp_dir());
        let texture = loader.load("scene_demos_missing_texture.png");
        assert_eq!(TextureStatus::Failed, wait(&texture));
        assert!(texture.image().is_none());
    }

    #[test]
    fn decodes_png() {
        let dir = std::env::temp_dir();
        let file = format!("scene_demos_texture_{}.png", std::process::id());
        let mut img = image::RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, image::Rgba([0, 0, 255, 128]));
        img.save(dir.join(&file)).unwrap();

        let loader = TextureLoader::new(&dir);
        let texture = loader.load(&file);
        let clone = texture.clone();
        assert_eq!(TextureStatus::Loaded, wait(&texture));
        let image = clone.image().unwrap();
        assert_eq!((2, 1), (image.width, image.height));
        assert_eq!(vec![255, 0, 0, 255, 0, 0, 255, 128], image.pixels);
        assert_eq!(texture, clone);
        let _ = std::fs::remove_file(dir.join(&file));
    }
}
