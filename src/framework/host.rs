/// Environment a demo runs in: a sized container and a frame scheduler.
pub trait Host {
    /// Size of the container in logical pixels.
    fn client_size(&self) -> (u32, u32);
    /// Physical pixels per logical pixel.
    fn pixel_ratio(&self) -> f64;
    /// Schedules another frame.
    fn request_frame(&mut self);
}

/// Host with a fixed size that only counts frame requests.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct StaticHost {
    width: u32,
    height: u32,
    pixel_ratio: f64,
    frame_requests: u64,
}

impl StaticHost {

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: 1.0,
            frame_requests: 0,
        }
    }

    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn frame_requests(&self) -> u64 {
        self.frame_requests
    }
}

impl Host for StaticHost {
    fn client_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn request_frame(&mut self) {
        self.frame_requests += 1;
    }
}
