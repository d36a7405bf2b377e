// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Splitting a single mutable buffer into bands that can be accessed concurrently.

use alloc::vec::Vec;

#[derive(Debug)]
pub(crate) struct Regions<'a> {
    regions: Vec<Region<'a>>,
}

impl<'a> Regions<'a> {
    /// Splits `buffer` into bands of `band_height` rows.
    ///
    /// The last band is shorter if `height` isn't a multiple of `band_height`.
    pub(crate) fn new(
        width: u32,
        height: u32,
        stride: usize,
        band_height: u32,
        buffer: &'a mut [u8],
    ) -> Self {
        debug_assert!(buffer.len() >= stride * height as usize);

        let buffer = &mut buffer[..stride * height as usize];
        let regions = buffer
            .chunks_mut(stride * band_height as usize)
            .enumerate()
            .map(|(index, data)| Region {
                index,
                y0: index as u32 * band_height,
                height: (data.len() / stride) as u32,
                width,
                stride,
                data,
            })
            .collect();

        Self { regions }
    }

    /// Number of bands.
    pub(crate) fn len(&self) -> usize {
        self.regions.len()
    }

    /// Apply the given function to each region, top to bottom.
    pub(crate) fn update_regions(&mut self, func: impl FnMut(&mut Region<'_>)) {
        self.regions.iter_mut().for_each(func);
    }

    pub(crate) fn into_regions(self) -> Vec<Region<'a>> {
        self.regions
    }
}

/// The rows of one band.
#[derive(Default, Debug)]
pub(crate) struct Region<'a> {
    /// Band index.
    pub(crate) index: usize,
    /// First row of the band in the destination.
    pub(crate) y0: u32,
    /// Number of rows.
    pub(crate) height: u32,
    /// Width of a row in pixels.
    pub(crate) width: u32,
    stride: usize,
    data: &'a mut [u8],
}

impl Region<'_> {
    /// One past the last row of the band in the destination.
    #[inline]
    pub(crate) fn y1(&self) -> u32 {
        self.y0 + self.height
    }

    /// Row `y`, relative to the first row of the band.
    #[inline]
    pub(crate) fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        &mut self.data[start..start + self.stride]
    }
}
