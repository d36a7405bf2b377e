// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The rendering context.

use crate::batch::RenderBatch;
use crate::command::{CommandSource, Payload, RenderCommand, RenderCommandFlags};
use crate::config::ContextCreateInfo;
use crate::dispatch::single_threaded::SingleThreadedDispatcher;
use crate::dispatch::Dispatcher;
use crate::fine::comp_op::CompOp;
use crate::fine::pipe::{FillType, PipeLookupCache, PipeSignature};
use crate::fine::simplify::{simplify, SourceInfo};
use crate::job::{JobGeometry, RenderJob};
use crate::resolver::FillRule;
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use rasterpipe_common::edge_builder::EdgeBuilder;
use rasterpipe_common::error::{Error, ErrorFlags, Result};
use rasterpipe_common::fetch::{FetchData, FetchKind};
use rasterpipe_common::fetch_pool::{FetchDataId, FetchDataPool};
use rasterpipe_common::geometry::{BoxI, Point, Rect, RectI, Transform};
use rasterpipe_common::image::{Format, Image};
use rasterpipe_common::math::{fixed_from_f64, FIXED_MASK, FIXED_SHIFT};
use rasterpipe_common::paint::Style;
use rasterpipe_common::path::Path;

/// State that [`RasterContext::save`] and [`RasterContext::restore`] operate on.
#[derive(Debug, Clone)]
struct ContextState {
    comp_op: CompOp,
    global_alpha: f64,
    fill_rule: FillRule,
    style: Style,
    transform: Transform,
    /// Clip box in destination pixels.
    clip: BoxI,
}

/// The source a style resolves to.
#[derive(Debug, Clone, Copy)]
enum StyleSource {
    Solid(u32),
    Fetch {
        id: FetchDataId,
        kind: FetchKind,
        opaque: bool,
    },
}

/// The resolved source of the current style.
#[derive(Debug, Clone, Copy)]
enum StyleCache {
    /// The style or the transform changed since it was resolved.
    Stale,
    /// The style renders nothing.
    Nothing,
    /// A source; fetch data holds one reference owned by the context.
    Source(StyleSource),
}

/// What a fill covers.
#[derive(Debug)]
enum Geometry<'a> {
    /// A box in destination pixels.
    BoxA(BoxI),
    /// A box in 24.8 fixed point.
    BoxU(BoxI),
    /// A polygon in user space.
    Polygon(&'a [Point]),
    /// A path in user space.
    Path(&'a Path),
    /// A box in destination pixels, masked by an image placed at `offset`.
    MaskA {
        bx: BoxI,
        mask: Arc<Image>,
        offset: (i32, i32),
    },
}

/// Records fills into a batch and renders them into its target image.
///
/// Fills are recorded as commands and only rendered when the context is
/// [flushed](Self::flush), or when the number of recorded commands reaches
/// [`ContextCreateInfo::command_queue_limit`].
///
/// Errors found while recording are returned right away and the offending
/// fill is dropped. Errors found while rendering don't stop the batch, the
/// affected fills are rendered partially and the error is returned by the
/// next call to [`flush`](Self::flush).
#[derive(Debug)]
pub struct RasterContext {
    target: Image,
    info: ContextCreateInfo,
    dispatcher: Box<dyn Dispatcher>,
    batch: RenderBatch,
    fetch_pool: FetchDataPool,
    pipe_cache: PipeLookupCache,
    state: ContextState,
    saved_states: Vec<ContextState>,
    style_cache: StyleCache,
    /// Errors of batches flushed automatically.
    pending_errors: ErrorFlags,
}

impl RasterContext {
    /// Creates a context rendering into `target`.
    pub fn new(target: Image, info: ContextCreateInfo) -> Result<Self> {
        info.validate()?;
        let dispatcher = create_dispatcher(target.width(), &info)?;
        let clip = BoxI::new(0, 0, target.width() as i32, target.height() as i32);

        Ok(Self {
            target,
            info,
            dispatcher,
            batch: RenderBatch::default(),
            fetch_pool: FetchDataPool::new(),
            pipe_cache: PipeLookupCache::default(),
            state: ContextState {
                comp_op: CompOp::default(),
                global_alpha: 1.0,
                fill_rule: FillRule::default(),
                style: Style::default(),
                transform: Transform::IDENTITY,
                clip,
            },
            saved_states: Vec::new(),
            style_cache: StyleCache::Stale,
            pending_errors: ErrorFlags::NONE,
        })
    }

    /// The image rendered into. Recorded fills show up after a flush.
    pub fn target(&self) -> &Image {
        &self.target
    }

    /// Returns the target image, dropping unflushed fills.
    pub fn into_target(self) -> Image {
        self.target
    }

    /// The options the context was created with.
    pub fn create_info(&self) -> &ContextCreateInfo {
        &self.info
    }

    /// Width of the target in pixels.
    pub fn width(&self) -> u32 {
        self.target.width()
    }

    /// Height of the target in pixels.
    pub fn height(&self) -> u32 {
        self.target.height()
    }

    pub fn comp_op(&self) -> CompOp {
        self.state.comp_op
    }

    pub fn set_comp_op(&mut self, comp_op: CompOp) {
        self.state.comp_op = comp_op;
    }

    pub fn global_alpha(&self) -> f64 {
        self.state.global_alpha
    }

    /// Sets the opacity of subsequent fills, clamped to `[0, 1]`.
    ///
    /// Fills with an opacity of 0 aren't recorded.
    pub fn set_global_alpha(&mut self, alpha: f64) {
        self.state.global_alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
    }

    pub fn fill_rule(&self) -> FillRule {
        self.state.fill_rule
    }

    pub fn set_fill_rule(&mut self, fill_rule: FillRule) {
        self.state.fill_rule = fill_rule;
    }

    pub fn fill_style(&self) -> &Style {
        &self.state.style
    }

    pub fn set_fill_style(&mut self, style: impl Into<Style>) {
        self.state.style = style.into();
        self.invalidate_style();
    }

    pub fn transform(&self) -> &Transform {
        &self.state.transform
    }

    /// Sets the transform from user space to destination pixels.
    pub fn set_transform(&mut self, transform: Transform) {
        self.state.transform = transform;
        self.invalidate_style();
    }

    /// Applies `transform` before the current transform.
    pub fn apply_transform(&mut self, transform: &Transform) {
        self.set_transform(self.state.transform.concat(transform));
    }

    pub fn reset_transform(&mut self) {
        self.set_transform(Transform::IDENTITY);
    }

    /// Intersects the clip box with `rect`, given in destination pixels.
    pub fn clip_to_rect(&mut self, rect: &RectI) {
        self.state.clip = self.state.clip.intersect(&rect.to_box());
    }

    /// Restores the clip box of the last saved state, or the whole target if
    /// there is none.
    pub fn restore_clip(&mut self) {
        self.state.clip = self
            .saved_states
            .last()
            .map_or_else(|| self.full_box(), |state| state.clip);
    }

    /// Pushes the current state.
    pub fn save(&mut self) -> Result<()> {
        self.saved_states.try_reserve(1)?;
        self.saved_states.push(self.state.clone());
        Ok(())
    }

    /// Pops the state pushed by the last [`save`](Self::save).
    pub fn restore(&mut self) -> Result<()> {
        let state = self
            .saved_states
            .pop()
            .ok_or(Error::InvalidArgument("no saved state to restore"))?;
        self.state = state;
        self.invalidate_style();
        Ok(())
    }

    /// Fills the clip box.
    pub fn fill_all(&mut self) -> Result<()> {
        self.fill_with_style(Geometry::BoxA(self.state.clip))
    }

    /// Fills a rectangle with integer coordinates.
    pub fn fill_rect_i(&mut self, rect: &RectI) -> Result<()> {
        let geometry = self.rect_i_geometry(rect);
        match geometry {
            Some(geometry) => self.fill_with_style(geometry),
            None => self.fill_rect(&rect_i_to_rect(rect)),
        }
    }

    /// Fills a rectangle.
    pub fn fill_rect(&mut self, rect: &Rect) -> Result<()> {
        match self.rect_to_fixed(rect)? {
            Some(bx) => self.fill_with_style(Geometry::BoxU(bx)),
            None => self.fill_with_style(Geometry::Polygon(&rect.corners())),
        }
    }

    /// Fills a polygon. The polygon is closed implicitly.
    pub fn fill_polygon(&mut self, points: &[Point]) -> Result<()> {
        self.fill_with_style(Geometry::Polygon(points))
    }

    /// Fills a path made of line segments.
    pub fn fill_path(&mut self, path: &Path) -> Result<()> {
        self.fill_with_style(Geometry::Path(path))
    }

    /// Clears the clip box to transparent, or to opaque black on targets
    /// without alpha.
    pub fn clear_all(&mut self) -> Result<()> {
        self.record(
            Geometry::BoxA(self.state.clip),
            CompOp::Clear,
            255,
            StyleSource::Solid(0),
        )
    }

    /// Clears a rectangle with integer coordinates.
    pub fn clear_rect(&mut self, rect: &RectI) -> Result<()> {
        let corners;
        let geometry = match self.rect_i_geometry(rect) {
            Some(geometry) => geometry,
            None => {
                let rect = rect_i_to_rect(rect);
                match self.rect_to_fixed(&rect)? {
                    Some(bx) => Geometry::BoxU(bx),
                    None => {
                        corners = rect.corners();
                        Geometry::Polygon(&corners)
                    }
                }
            }
        };
        self.record(geometry, CompOp::Clear, 255, StyleSource::Solid(0))
    }

    /// Composites `image` with its top-left corner at `(x, y)`.
    ///
    /// The translation of the current transform is applied, and other
    /// transforms aren't supported.
    pub fn blit_image(&mut self, x: i32, y: i32, image: Arc<Image>) -> Result<()> {
        let (x, y) = self.translate_origin(x, y)?;
        if image.width() == 0 || image.height() == 0 {
            return Ok(());
        }
        let bx = BoxI::new(
            x,
            y,
            x.saturating_add(image.width() as i32),
            y.saturating_add(image.height() as i32),
        );

        let data = FetchData::from_image(image, x, y);
        let source = StyleSource::Fetch {
            kind: data.kind(),
            opaque: data.is_opaque(),
            id: self.fetch_pool.alloc(data, 1)?,
        };
        let result = self.record(Geometry::BoxA(bx), self.state.comp_op, self.alpha(), source);
        if let StyleSource::Fetch { id, .. } = source {
            self.fetch_pool.release(id);
        }
        result
    }

    /// Fills the area of `mask` with its top-left corner at `(x, y)`, using
    /// the alpha of `mask` as coverage.
    ///
    /// `mask` must be an A8 or PRGB32 image. The translation of the current
    /// transform is applied, and other transforms aren't supported.
    pub fn fill_mask(&mut self, x: i32, y: i32, mask: Arc<Image>) -> Result<()> {
        if mask.format() == Format::Xrgb32 {
            return Err(Error::InvalidArgument("masks must have an alpha channel"));
        }
        let (x, y) = self.translate_origin(x, y)?;
        let bx = BoxI::new(
            x,
            y,
            x.saturating_add(mask.width() as i32),
            y.saturating_add(mask.height() as i32),
        );
        self.fill_with_style(Geometry::MaskA {
            bx,
            mask,
            offset: (x, y),
        })
    }

    /// Renders every recorded fill.
    ///
    /// Returns the errors found while rendering this batch and the batches
    /// flushed automatically since the last call.
    pub fn flush(&mut self) -> Result<()> {
        let flags = self.run_batch() | core::mem::take(&mut self.pending_errors);
        flags.to_result()
    }

    /// Flushes and releases the resources held for the current style.
    ///
    /// The context can still be used afterwards.
    pub fn end(&mut self) -> Result<()> {
        let result = self.flush();
        self.invalidate_style();
        log::debug!(
            "context ended, {} fetch data slots still live",
            self.fetch_pool.live_count()
        );
        result
    }

    /// Number of fetch data objects currently alive.
    pub fn live_fetch_data(&self) -> usize {
        self.fetch_pool.live_count()
    }

    /// Number of recorded commands that haven't been rendered yet.
    pub fn pending_commands(&self) -> usize {
        self.batch.commands().len()
    }

    fn full_box(&self) -> BoxI {
        BoxI::new(0, 0, self.target.width() as i32, self.target.height() as i32)
    }

    fn alpha(&self) -> u8 {
        (self.state.global_alpha * 255.0).round() as u8
    }

    fn translate_origin(&self, x: i32, y: i32) -> Result<(i32, i32)> {
        let t = &self.state.transform;
        if !t.is_translation() || t.0[4].fract() != 0.0 || t.0[5].fract() != 0.0 {
            return Err(Error::InvalidArgument(
                "images can only be placed with an integer translation",
            ));
        }
        Ok((
            x.saturating_add(t.0[4] as i32),
            y.saturating_add(t.0[5] as i32),
        ))
    }

    /// A box in destination pixels, if the current transform keeps `rect`
    /// pixel-aligned.
    fn rect_i_geometry(&self, rect: &RectI) -> Option<Geometry<'static>> {
        let t = &self.state.transform;
        if t.is_translation() && t.0[4].fract() == 0.0 && t.0[5].fract() == 0.0 {
            let (tx, ty) = (t.0[4] as i32, t.0[5] as i32);
            let bx = rect.to_box();
            Some(Geometry::BoxA(BoxI::new(
                bx.x0.saturating_add(tx),
                bx.y0.saturating_add(ty),
                bx.x1.saturating_add(tx),
                bx.y1.saturating_add(ty),
            )))
        } else {
            None
        }
    }

    /// The fixed-point box `rect` maps to, or `None` if the current transform
    /// rotates or skews it.
    fn rect_to_fixed(&self, rect: &Rect) -> Result<Option<BoxI>> {
        if !rect.is_finite() {
            return Err(Error::InvalidGeometry);
        }
        let t = &self.state.transform;
        if !t.is_axis_aligned() {
            return Ok(None);
        }
        let r = t.apply_rect(rect);
        if !r.is_finite() {
            return Err(Error::InvalidGeometry);
        }
        Ok(Some(BoxI::new(
            fixed_from_f64(r.x0),
            fixed_from_f64(r.y0),
            fixed_from_f64(r.x1),
            fixed_from_f64(r.y1),
        )))
    }

    fn fill_with_style(&mut self, geometry: Geometry<'_>) -> Result<()> {
        let alpha = self.alpha();
        if alpha == 0 {
            return Ok(());
        }
        let Some(source) = self.style_source()? else {
            return Ok(());
        };
        self.record(geometry, self.state.comp_op, alpha, source)
    }

    /// Resolves the current style, creating its fetch data if needed.
    fn style_source(&mut self) -> Result<Option<StyleSource>> {
        if let StyleCache::Stale = self.style_cache {
            self.style_cache = match &self.state.style {
                Style::Solid(color) => StyleCache::Source(StyleSource::Solid(color.premultiply())),
                Style::Pattern(pattern)
                    if pattern.image.width() == 0 || pattern.image.height() == 0 =>
                {
                    StyleCache::Nothing
                }
                style => match FetchData::new(style, &self.state.transform) {
                    Some(data) => StyleCache::Source(StyleSource::Fetch {
                        kind: data.kind(),
                        opaque: data.is_opaque(),
                        id: self.fetch_pool.alloc(data, 1)?,
                    }),
                    None => StyleCache::Nothing,
                },
            };
        }
        Ok(match self.style_cache {
            StyleCache::Source(source) => Some(source),
            StyleCache::Stale | StyleCache::Nothing => None,
        })
    }

    fn invalidate_style(&mut self) {
        if let StyleCache::Source(StyleSource::Fetch { id, .. }) = self.style_cache {
            self.fetch_pool.release(id);
        }
        self.style_cache = StyleCache::Stale;
    }

    fn record(
        &mut self,
        geometry: Geometry<'_>,
        comp_op: CompOp,
        alpha: u8,
        source: StyleSource,
    ) -> Result<()> {
        if alpha == 0 {
            return Ok(());
        }
        let format = self.target.format();
        let info = match source {
            StyleSource::Solid(color) => SourceInfo::solid(color),
            StyleSource::Fetch { opaque, .. } => SourceInfo {
                opaque,
                solid: None,
            },
        };
        let Some(simplified) = simplify(comp_op.into(), format, info) else {
            return Ok(());
        };
        let (source, fetch_kind) = match (simplified.solid_override, source) {
            (Some(color), _) | (None, StyleSource::Solid(color)) => {
                (CommandSource::Solid(color), None)
            }
            (None, StyleSource::Fetch { id, kind, .. }) => (CommandSource::FetchData(id), Some(kind)),
        };

        if self.batch.commands().len() >= self.info.command_queue_limit {
            log::debug!("command queue is full, flushing");
            let flags = self.run_batch();
            self.pending_errors |= flags;
        }

        let Some((payload, fill_type)) = self.build_payload(geometry)? else {
            return Ok(());
        };
        let dispatch = self.pipe_cache.get(PipeSignature {
            dst_format: format,
            fetch_kind,
            comp_op: simplified.op,
            fill_type,
        });
        let flags = match source {
            CommandSource::FetchData(_) => RenderCommandFlags::RETAINS_FETCH_DATA,
            CommandSource::Solid(_) => RenderCommandFlags::empty(),
        };
        self.batch.push_command(RenderCommand {
            payload,
            alpha,
            source,
            flags,
            dispatch,
        })?;
        if let CommandSource::FetchData(id) = source {
            self.fetch_pool.retain(id);
        }
        Ok(())
    }

    /// Clips `geometry` and turns it into a payload, or returns `None` if
    /// nothing is left to fill.
    fn build_payload(&mut self, geometry: Geometry<'_>) -> Result<Option<(Payload, FillType)>> {
        let clip = self.state.clip;
        match geometry {
            Geometry::BoxA(bx) => {
                let bx = bx.intersect(&clip);
                Ok((!bx.is_empty()).then_some((Payload::FillBoxA { bx }, FillType::BoxA)))
            }
            Geometry::BoxU(bx) => {
                let bx = bx.intersect(&clip.to_fixed());
                if bx.is_empty() {
                    Ok(None)
                } else if (bx.x0 | bx.y0 | bx.x1 | bx.y1) & FIXED_MASK == 0 {
                    let bx = BoxI::new(
                        bx.x0 >> FIXED_SHIFT,
                        bx.y0 >> FIXED_SHIFT,
                        bx.x1 >> FIXED_SHIFT,
                        bx.y1 >> FIXED_SHIFT,
                    );
                    Ok(Some((Payload::FillBoxA { bx }, FillType::BoxA)))
                } else {
                    Ok(Some((Payload::FillBoxU { bx }, FillType::Mask)))
                }
            }
            Geometry::MaskA { bx, mask, offset } => {
                let bx = bx.intersect(&clip);
                Ok((!bx.is_empty()).then_some((
                    Payload::FillBoxMaskA { bx, mask, offset },
                    FillType::Mask,
                )))
            }
            Geometry::Polygon(points) => {
                let defer = points.len() > self.info.job_threshold;
                self.build_analytic(JobGeometryRef::Polygon(points), defer)
            }
            Geometry::Path(path) => {
                let defer = path.point_count() > self.info.job_threshold;
                self.build_analytic(JobGeometryRef::Path(path), defer)
            }
        }
    }

    fn build_analytic(
        &mut self,
        geometry: JobGeometryRef<'_>,
        defer: bool,
    ) -> Result<Option<(Payload, FillType)>> {
        if self.state.clip.is_empty() {
            return Ok(None);
        }
        let clip = self.state.clip.to_fixed();
        let band_height = self.info.band_height;
        let point_limit = self.info.edge_storage_limit;
        let transform = self.state.transform;

        let edge_slot = if defer && self.info.thread_count != 0 {
            // Checked here, so a job only fails when it runs out of memory.
            if !geometry.is_finite() {
                return Err(Error::InvalidGeometry);
            }
            let edge_slot = self.batch.add_edge_slot(None)?;
            self.batch.push_job(RenderJob {
                geometry: geometry.into_job_geometry()?,
                transform,
                clip,
                band_height,
                point_limit,
                edge_slot,
            })?;
            edge_slot
        } else {
            let mut builder = EdgeBuilder::new(clip, band_height).with_point_limit(point_limit);
            match geometry {
                JobGeometryRef::Polygon(points) => builder.add_points(points, &transform)?,
                JobGeometryRef::Path(path) => builder.add_path(path, &transform)?,
            }
            let storage = builder.finish()?;
            if storage.is_empty() {
                return Ok(None);
            }
            self.batch.add_edge_slot(Some(storage))?
        };

        let payload = Payload::FillAnalytic {
            edge_slot,
            fill_rule: self.state.fill_rule,
            state_slot: self.batch.add_state_slot(),
        };
        Ok(Some((payload, FillType::Analytic)))
    }

    /// Renders the batch and releases what its commands retained.
    fn run_batch(&mut self) -> ErrorFlags {
        if self.batch.is_empty() {
            return ErrorFlags::NONE;
        }

        log::debug!(
            "rendering a batch of {} commands and {} jobs",
            self.batch.commands().len(),
            self.batch.jobs().len()
        );
        let flags = self
            .dispatcher
            .run_batch(&self.batch, &self.fetch_pool, &mut self.target);
        self.batch.finalize(&mut self.fetch_pool);
        if flags.is_empty() {
            log::debug!("batch done");
        } else {
            log::warn!("batch done with errors: {flags:?}");
        }
        flags
    }
}

/// Borrowed geometry of an analytic fill.
#[derive(Debug, Clone, Copy)]
enum JobGeometryRef<'a> {
    Polygon(&'a [Point]),
    Path(&'a Path),
}

impl JobGeometryRef<'_> {
    fn is_finite(&self) -> bool {
        match self {
            Self::Polygon(points) => points.iter().all(|p| p.is_finite()),
            Self::Path(path) => path.is_finite(),
        }
    }

    fn into_job_geometry(self) -> Result<JobGeometry> {
        Ok(match self {
            Self::Polygon(points) => {
                let mut owned = Vec::new();
                owned.try_reserve_exact(points.len())?;
                owned.extend_from_slice(points);
                JobGeometry::Polygon(owned)
            }
            Self::Path(path) => JobGeometry::Path(path.clone()),
        })
    }
}

fn rect_i_to_rect(rect: &RectI) -> Rect {
    Rect::new(
        f64::from(rect.x),
        f64::from(rect.y),
        f64::from(rect.x) + f64::from(rect.w),
        f64::from(rect.y) + f64::from(rect.h),
    )
}

fn create_dispatcher(width: u32, info: &ContextCreateInfo) -> Result<Box<dyn Dispatcher>> {
    if info.thread_count == 0 {
        return Ok(Box::new(SingleThreadedDispatcher::new(
            width,
            info.band_height,
            info.work_zone_limit,
        )?));
    }

    #[cfg(feature = "multithreading")]
    {
        Ok(Box::new(
            crate::dispatch::multi_threaded::MultiThreadedDispatcher::new(
                width,
                info.band_height,
                info.thread_count,
                info.work_zone_limit,
            )?,
        ))
    }

    #[cfg(not(feature = "multithreading"))]
    {
        log::warn!(
            "{} threads requested without multithreading support, rendering synchronously",
            info.thread_count
        );
        Ok(Box::new(SingleThreadedDispatcher::new(
            width,
            info.band_height,
            info.work_zone_limit,
        )?))
    }
}
