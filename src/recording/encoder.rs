//! H.264 encoder wrapper using openh264

use openh264::encoder::{Encoder, FrameType};
use openh264::formats::YUVBuffer;

use super::config::VideoSettings;
use crate::errors::MuxError;

/// H.264 encoder producing Annex B access units
pub struct H264Encoder {
    encoder: Encoder,
    width: u32,
    height: u32,
    frame_count: u64,
    keyframe_every: u64,
}

impl H264Encoder {
    /// Create an encoder for the given video settings
    ///
    /// Dimensions come from the YUV source at encode time; the settings
    /// decide the input size checked here and how often an IDR is forced.
    pub fn new(settings: &VideoSettings) -> Result<Self, MuxError> {
        let encoder = Encoder::new()
            .map_err(|e| MuxError::Encoding(format!("Failed to create encoder: {}", e)))?;

        let keyframe_every =
            (settings.expected_fps * settings.max_keyframe_interval.as_secs_f64()).round() as u64;

        Ok(Self {
            encoder,
            width: settings.width,
            height: settings.height,
            frame_count: 0,
            keyframe_every: keyframe_every.max(1),
        })
    }

    /// Encode an RGB24 frame
    pub fn encode_rgb(&mut self, rgb_data: &[u8]) -> Result<EncodedFrame, MuxError> {
        let expected_size = (self.width * self.height * 3) as usize;
        if rgb_data.len() != expected_size {
            return Err(MuxError::Encoding(format!(
                "Invalid frame size: expected {} bytes, got {}",
                expected_size,
                rgb_data.len()
            )));
        }

        let yuv = rgb_to_yuv420(rgb_data, self.width, self.height);
        let yuv_buffer = YUVBuffer::from_vec(yuv, self.width as usize, self.height as usize);

        if self.frame_count > 0 && self.frame_count % self.keyframe_every == 0 {
            self.encoder.force_intra_frame();
        }

        let bitstream = self
            .encoder
            .encode(&yuv_buffer)
            .map_err(|e| MuxError::Encoding(format!("Encoding failed: {}", e)))?;

        self.frame_count += 1;

        let is_keyframe = matches!(bitstream.frame_type(), FrameType::IDR | FrameType::I);
        Ok(EncodedFrame {
            data: bitstream.to_vec(),
            is_keyframe,
        })
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Result of encoding a single frame
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Annex B bitstream with start codes
    pub data: Vec<u8>,
    pub is_keyframe: bool,
}

/// Convert RGB24 to planar YUV420 (BT.601)
fn rgb_to_yuv420(rgb: &[u8], width: u32, height: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;

    let y_size = w * h;
    let uv_size = (w / 2) * (h / 2);
    let mut yuv = vec![0u8; y_size + uv_size * 2];

    let (y_plane, uv_planes) = yuv.split_at_mut(y_size);
    let (u_plane, v_plane) = uv_planes.split_at_mut(uv_size);

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) * 3;
            let r = rgb[idx] as i32;
            let g = rgb[idx + 1] as i32;
            let b = rgb[idx + 2] as i32;

            let luma = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
            y_plane[y * w + x] = luma.clamp(0, 255) as u8;

            if y % 2 == 0 && x % 2 == 0 && x / 2 < w / 2 && y / 2 < h / 2 {
                let uv_idx = (y / 2) * (w / 2) + (x / 2);
                let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
                let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
                u_plane[uv_idx] = u.clamp(0, 255) as u8;
                v_plane[uv_idx] = v.clamp(0, 255) as u8;
            }
        }
    }

    yuv
}
