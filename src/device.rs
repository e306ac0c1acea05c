//! Camera boundary. Acquisition itself lives outside the engine; these calls
//! may block and are always made from blocking worker threads.

use anyhow::Result;
use image::DynamicImage;

pub trait FrameSource: Send + Sync {
    /// Current viewfinder frame, used for guidance sampling.
    fn sample_frame(&self) -> Result<DynamicImage>;

    /// Full-resolution still as an encoded image payload.
    fn capture_still(&self) -> Result<Vec<u8>>;
}
