// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A simple image type with 8-bit alpha and 32-bit pixel formats.

use crate::error::{Error, Result};
use alloc::vec::Vec;

/// Pixel format of an [`Image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// 8-bit alpha only.
    A8,
    /// 32-bit premultiplied ARGB, stored as a little-endian `0xAARRGGBB` word.
    Prgb32,
    /// 32-bit RGB, stored like [`Format::Prgb32`]; the alpha byte is always `0xFF`.
    Xrgb32,
}

impl Format {
    /// Bytes per pixel.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::A8 => 1,
            Self::Prgb32 | Self::Xrgb32 => 4,
        }
    }

    /// Returns `true` if the format stores an alpha channel.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        !matches!(self, Self::Xrgb32)
    }
}

/// A pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    stride: usize,
    format: Format,
    data: Vec<u8>,
}

/// The largest width or height accepted for an image.
pub const MAX_IMAGE_SIZE: u32 = 65535;

impl Image {
    /// Creates a new image with all pixels initialized to zero.
    ///
    /// For [`Format::Xrgb32`] pixels are initialized to opaque black.
    pub fn new(width: u32, height: u32, format: Format) -> Result<Self> {
        if width == 0 || height == 0 || width > MAX_IMAGE_SIZE || height > MAX_IMAGE_SIZE {
            return Err(Error::InvalidArgument("image size out of range"));
        }

        let stride = width as usize * format.bytes_per_pixel();
        let len = stride * height as usize;
        let mut data = Vec::new();
        data.try_reserve_exact(len)?;
        data.resize(len, 0);

        let mut image = Self {
            width,
            height,
            stride,
            format,
            data,
        };
        if format == Format::Xrgb32 {
            image.fill(0xFF00_0000);
        }
        Ok(image)
    }

    /// Creates an image from raw bytes with a tightly packed stride.
    pub fn from_data(width: u32, height: u32, format: Format, data: Vec<u8>) -> Result<Self> {
        let stride = width as usize * format.bytes_per_pixel();
        if width == 0 || height == 0 || data.len() != stride * height as usize {
            return Err(Error::InvalidArgument("image data doesn't match its size"));
        }
        Ok(Self {
            width,
            height,
            stride,
            format,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The pixel format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// The raw bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The raw bytes, mutably.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Bytes of row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.stride]
    }

    /// Reads a pixel as a `0xAARRGGBB` word. A8 pixels are returned in the alpha byte.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        let offset = y as usize * self.stride + x as usize * self.format.bytes_per_pixel();
        match self.format {
            Format::A8 => u32::from(self.data[offset]) << 24,
            Format::Prgb32 | Format::Xrgb32 => {
                let bytes = &self.data[offset..offset + 4];
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
            }
        }
    }

    /// Writes a pixel given as a `0xAARRGGBB` word.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: u32) {
        let offset = y as usize * self.stride + x as usize * self.format.bytes_per_pixel();
        match self.format {
            Format::A8 => self.data[offset] = (value >> 24) as u8,
            Format::Prgb32 => self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes()),
            Format::Xrgb32 => self.data[offset..offset + 4]
                .copy_from_slice(&(value | 0xFF00_0000).to_le_bytes()),
        }
    }

    /// Sets every pixel to `value`, given as a `0xAARRGGBB` word.
    pub fn fill(&mut self, value: u32) {
        match self.format {
            Format::A8 => self.data.fill((value >> 24) as u8),
            Format::Prgb32 | Format::Xrgb32 => {
                let value = if self.format == Format::Xrgb32 {
                    value | 0xFF00_0000
                } else {
                    value
                };
                let px: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut self.data);
                px.fill(value.to_le_bytes());
            }
        }
    }
}
