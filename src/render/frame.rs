use std::sync::Arc;

use crate::render::capture::PixelCapture;
use crate::render::feedback::{CompositeParams, FeedbackCompositor};
use crate::runtime::history::FramePixels;

/// One tick's worth of rendering against the surface: a command encoder plus
/// the acquired surface texture.
///
/// Feedback/trail ordering lives here: [`Frame::composite_feedback`] first,
/// the mode's own drawing after it, [`Frame::capture_feedback`] last, all
/// before [`Frame::submit`]. Composing the other way round collapses the
/// trail into a flat color.
///
/// Both capture paths copy out of the surface texture, so the surface must
/// be configured with `COPY_SRC` in addition to `RENDER_ATTACHMENT`.
pub struct Frame {
    surface_view: wgpu::TextureView,
    encoder: Option<wgpu::CommandEncoder>,
    output: Option<wgpu::SurfaceTexture>,
    queue: Arc<wgpu::Queue>,
}

impl Frame {
    pub fn new(
        device: &wgpu::Device,
        queue: Arc<wgpu::Queue>,
        output: wgpu::SurfaceTexture,
    ) -> Self {
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("strata-frame-encoder"),
            });

        Self {
            surface_view,
            encoder: Some(encoder),
            output: Some(output),
            queue,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.surface_view
    }

    /// The backing surface texture; what pixel capture and the feedback slot
    /// read from.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.output.as_ref().expect("frame already submitted").texture
    }

    pub fn size(&self) -> [u32; 2] {
        let size = self.texture().size();
        [size.width, size.height]
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture().format()
    }

    pub fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        self.encoder
            .as_mut()
            .expect("frame command encoder already submitted")
    }

    /// Draws the previously captured frame under whatever this tick is about
    /// to render. Call before any new drawing.
    pub fn composite_feedback(
        &mut self,
        device: &wgpu::Device,
        compositor: &FeedbackCompositor,
        params: CompositeParams,
    ) {
        let size = self.size();
        let encoder = self
            .encoder
            .as_mut()
            .expect("frame command encoder already submitted");

        compositor.composite_last_frame(
            device,
            &self.queue,
            encoder,
            &self.surface_view,
            size,
            params,
        );
    }

    /// Snapshots this tick's output into the feedback slot. Call after all
    /// drawing for the tick.
    pub fn capture_feedback(
        &mut self,
        device: &wgpu::Device,
        compositor: &mut FeedbackCompositor,
    ) {
        let texture =
            &self.output.as_ref().expect("frame already submitted").texture;
        let encoder = self
            .encoder
            .as_mut()
            .expect("frame command encoder already submitted");

        compositor.capture_current_frame(device, encoder, texture);
    }

    /// Reads this tick's output back to the CPU for the history store.
    /// Synchronous; see [`PixelCapture`] for the failure contract.
    pub fn capture_pixels(
        &mut self,
        device: &wgpu::Device,
        capture: &mut dyn PixelCapture,
    ) -> Option<FramePixels> {
        let texture =
            &self.output.as_ref().expect("frame already submitted").texture;
        capture.capture(device, &self.queue, texture)
    }

    pub fn submit(mut self) {
        let encoder = self
            .encoder
            .take()
            .expect("frame command encoder already submitted");

        self.queue.submit(Some(encoder.finish()));

        if let Some(output) = self.output.take() {
            output.present();
        }
    }
}
