//! GPU pixel readback behind a trait so the history core never depends on a
//! live rendering context; tests supply synthetic buffers instead.

use std::sync::mpsc;

use log::{error, warn};

use crate::runtime::history::FramePixels;

/// Reads the current contents of a rendered texture into a CPU-side RGBA
/// buffer. Implementations must absorb every failure: on any error they log
/// and return `None` so the caller can still record control state.
pub trait PixelCapture {
    fn capture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source: &wgpu::Texture,
    ) -> Option<FramePixels>;
}

/// Synchronous wgpu readback: copy into a row-padded `MAP_READ` buffer,
/// block on the map, then strip padding while flipping rows so the result
/// has a top-left origin. The readback buffer is reused across calls and
/// recreated when the source resolution changes.
///
/// The source texture must carry `COPY_SRC` usage.
#[derive(Default)]
pub struct WgpuPixelCapture {
    buffer: Option<ReadbackBuffer>,
}

struct ReadbackBuffer {
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
}

impl WgpuPixelCapture {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_buffer(
        &mut self,
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> &ReadbackBuffer {
        let fits = self
            .buffer
            .as_ref()
            .is_some_and(|b| b.width == width && b.height == height);

        if !fits {
            let unpadded_bytes_per_row = width * 4;
            let padded_bytes_per_row = unpadded_bytes_per_row
                + compute_row_padding(unpadded_bytes_per_row);

            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("strata-capture-readback"),
                size: (padded_bytes_per_row as u64) * (height as u64),
                usage: wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            });

            self.buffer = Some(ReadbackBuffer {
                buffer,
                width,
                height,
                padded_bytes_per_row,
            });
        }

        self.buffer.as_ref().unwrap()
    }
}

impl PixelCapture for WgpuPixelCapture {
    fn capture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source: &wgpu::Texture,
    ) -> Option<FramePixels> {
        let format = source.format();
        let Some(channel_order) = channel_order_for(format) else {
            warn!("capture skipped: unsupported source format {:?}", format);
            return None;
        };

        let size = source.size();
        let width = size.width;
        let height = size.height;
        if width == 0 || height == 0 {
            warn!("capture skipped: zero-sized source texture");
            return None;
        }

        let readback = self.ensure_buffer(device, width, height);
        let padded_bytes_per_row = readback.padded_bytes_per_row;

        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("strata-capture"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: source,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        queue.submit(Some(encoder.finish()));

        let slice = readback.buffer.slice(..);
        let (map_tx, map_rx) = mpsc::sync_channel(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = map_tx.send(result);
        });

        if device.poll(wgpu::PollType::Wait).is_err() {
            error!("capture failed: device poll error");
            return None;
        }

        match map_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!("capture failed: buffer mapping error: {:?}", err);
                return None;
            }
            Err(_) => {
                error!("capture failed: buffer map channel disconnected");
                return None;
            }
        }

        let data = slice.get_mapped_range();
        let pixels = unpad_and_flip(
            &data,
            width,
            height,
            padded_bytes_per_row,
            channel_order,
        );
        drop(data);
        readback.buffer.unmap();

        Some(pixels)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ChannelOrder {
    Rgba,
    Bgra,
}

fn channel_order_for(format: wgpu::TextureFormat) -> Option<ChannelOrder> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm
        | wgpu::TextureFormat::Rgba8UnormSrgb => Some(ChannelOrder::Rgba),
        wgpu::TextureFormat::Bgra8Unorm
        | wgpu::TextureFormat::Bgra8UnormSrgb => Some(ChannelOrder::Bgra),
        _ => None,
    }
}

/// Strips row padding and flips vertically (GPU bottom-left origin to image
/// top-left origin), swizzling BGRA sources to RGBA.
fn unpad_and_flip(
    data: &[u8],
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
    channel_order: ChannelOrder,
) -> FramePixels {
    let unpadded_bytes_per_row = (width * 4) as usize;
    let padded_bytes_per_row = padded_bytes_per_row as usize;

    let mut out = Vec::with_capacity(unpadded_bytes_per_row * height as usize);

    for row in (0..height as usize).rev() {
        let start = row * padded_bytes_per_row;
        let row_bytes = &data[start..start + unpadded_bytes_per_row];

        match channel_order {
            ChannelOrder::Rgba => out.extend_from_slice(row_bytes),
            ChannelOrder::Bgra => {
                for px in row_bytes.chunks_exact(4) {
                    out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                }
            }
        }
    }

    FramePixels {
        width,
        height,
        data: out,
    }
}

fn compute_row_padding(unpadded_bytes_per_row: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let rem = unpadded_bytes_per_row % align;
    if rem == 0 { 0 } else { align - rem }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpad_and_flip_reorders_rows_top_down() {
        // 2x2, 8-byte rows padded to 12. Bottom GPU row should come out on
        // top.
        let mut data = vec![0u8; 24];
        data[0..8].copy_from_slice(&[1, 1, 1, 1, 2, 2, 2, 2]);
        data[12..20].copy_from_slice(&[3, 3, 3, 3, 4, 4, 4, 4]);

        let pixels = unpad_and_flip(&data, 2, 2, 12, ChannelOrder::Rgba);

        assert_eq!(pixels.width, 2);
        assert_eq!(pixels.height, 2);
        assert_eq!(
            pixels.data,
            vec![3, 3, 3, 3, 4, 4, 4, 4, 1, 1, 1, 1, 2, 2, 2, 2]
        );
    }

    #[test]
    fn bgra_sources_are_swizzled_to_rgba() {
        let data = vec![10, 20, 30, 40];
        let pixels = unpad_and_flip(&data, 1, 1, 4, ChannelOrder::Bgra);
        assert_eq!(pixels.data, vec![30, 20, 10, 40]);
    }

    #[test]
    fn row_padding_aligns_to_copy_requirement() {
        assert_eq!(compute_row_padding(256), 0);
        assert_eq!(compute_row_padding(260), 252);
        assert_eq!(compute_row_padding(8), 248);
    }
}
