//! Full page screenshots.
//!
//! WebDriver only captures the viewport. [`take_full_page`] scrolls the
//! top-level document one viewport at a time, captures each segment and
//! stitches them vertically. The last segment overlaps the previous one
//! whenever the page height is not a multiple of the viewport height; its
//! top rows are cropped so no content appears twice.
//!
//! If the session is inside an iframe it is switched to the top-level
//! document for the capture. Frame selection and the document overflow
//! style are restored afterwards, on success and on failure.

use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use serde::Deserialize;
use std::io::Cursor;

use crate::config::ScreenshotConfig;
use crate::driver::{value_to_string, Driver};
use crate::result::{SelenideError, SelenideResult};
use crate::wait::hard_wait;

/// Viewport and page size in device pixels
pub const VIEWPORT_METRICS_JS: &str = "return { \
devicePixelRatio: window.devicePixelRatio, \
innerHeight: window.innerHeight * window.devicePixelRatio, \
pageWidth: document.body.scrollWidth * window.devicePixelRatio, \
pageHeight: document.body.scrollHeight * window.devicePixelRatio };";

/// Hide document scrollbars, returning the previous overflow style
pub const HIDE_SCROLLBARS_JS: &str = "var previous = document.documentElement.style.overflow; \
document.documentElement.style.overflow = 'hidden'; \
return previous;";

/// Browser window measurements
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportMetrics {
    /// CSS to device pixel ratio
    pub device_pixel_ratio: f64,
    /// Viewport height in device pixels
    pub inner_height: f64,
    /// Document width in device pixels
    pub page_width: f64,
    /// Document height in device pixels
    pub page_height: f64,
}

/// How many viewport captures a page needs and how to align them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapturePlan {
    /// Number of viewport captures
    pub segments: u32,
    /// Rows of the last capture already covered by the previous one
    pub delta: u32,
    /// Scroll distance between captures in CSS pixels
    pub scroll_step: f64,
}

impl CapturePlan {
    /// Plan captures for the given metrics
    pub fn from_metrics(metrics: &ViewportMetrics) -> SelenideResult<Self> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(metrics.inner_height) || !usable(metrics.device_pixel_ratio) {
            return Err(SelenideError::Screenshot {
                message: format!("unusable viewport metrics: {metrics:?}"),
            });
        }
        let inner = (metrics.inner_height.round() as u32).max(1);
        let page = metrics.page_height.max(0.0).round() as u32;
        let segments = page.div_ceil(inner).max(1);
        Ok(Self {
            segments,
            delta: (inner * segments).saturating_sub(page),
            scroll_step: metrics.inner_height / metrics.device_pixel_ratio,
        })
    }

    /// Script scrolling to segment `index`
    #[must_use]
    pub fn scroll_script(&self, index: u32) -> String {
        format!("window.scrollTo(0, {});", self.scroll_step * f64::from(index))
    }

    /// Whether segment `index` must lose its top `delta` rows
    #[must_use]
    pub const fn crops(&self, index: u32) -> bool {
        self.segments > 1 && index + 1 == self.segments && self.delta > 0
    }
}

/// Capture the whole document as one PNG
pub async fn take_full_page<D: Driver>(
    driver: &D,
    config: &ScreenshotConfig,
) -> SelenideResult<Vec<u8>> {
    let frame = driver.frame_element().await?;
    if frame.is_some() {
        driver.switch_to_default_content().await?;
    }

    let mut overflow = None;
    let captured = async {
        if config.hide_scrollbars {
            let previous = driver.execute_script(HIDE_SCROLLBARS_JS, &[]).await?;
            overflow = Some(value_to_string(&previous).unwrap_or_default());
        }
        capture_segments(driver, config.settle_delay_ms).await
    }
    .await;

    let restored = restore(driver, overflow.as_deref(), frame.as_ref()).await;
    let png = captured?;
    restored?;
    tracing::debug!(bytes = png.len(), "full page screenshot taken");
    Ok(png)
}

async fn capture_segments<D: Driver>(driver: &D, settle_delay_ms: u64) -> SelenideResult<Vec<u8>> {
    let metrics: ViewportMetrics =
        serde_json::from_value(driver.execute_script(VIEWPORT_METRICS_JS, &[]).await?).map_err(
            |e| SelenideError::Screenshot {
                message: format!("Failed to read viewport metrics: {e}"),
            },
        )?;
    let plan = CapturePlan::from_metrics(&metrics)?;
    tracing::trace!(?metrics, ?plan, "capturing full page");

    let mut segments = Vec::with_capacity(plan.segments as usize);
    for index in 0..plan.segments {
        driver.execute_script(&plan.scroll_script(index), &[]).await?;
        hard_wait(settle_delay_ms).await;
        let segment = decode(&driver.take_screenshot().await?)?;
        if plan.crops(index) {
            segments.push(crop_top(&segment, plan.delta));
        } else {
            segments.push(segment);
        }
    }
    stitch(&segments)
}

/// Restore overflow then frame; the first failure is reported
async fn restore<D: Driver>(
    driver: &D,
    overflow: Option<&str>,
    frame: Option<&D::Element>,
) -> SelenideResult<()> {
    let mut result = Ok(());
    if let Some(previous) = overflow {
        let script = format!(
            "document.documentElement.style.overflow = {};",
            serde_json::to_string(previous)?
        );
        result = driver.execute_script(&script, &[]).await.map(|_| ());
    }
    if let Some(frame) = frame {
        let switched = driver.switch_to_frame(frame).await;
        result = result.and(switched);
    }
    result
}

fn decode(png: &[u8]) -> SelenideResult<DynamicImage> {
    image::load_from_memory(png).map_err(|e| SelenideError::Screenshot {
        message: format!("Failed to decode screenshot: {e}"),
    })
}

fn crop_top(image: &DynamicImage, rows: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    let rows = rows.min(height);
    image.crop_imm(0, rows, width, height - rows)
}

/// Stack images top to bottom and encode as PNG
pub fn stitch(segments: &[DynamicImage]) -> SelenideResult<Vec<u8>> {
    let width = segments.iter().map(DynamicImage::width).max().unwrap_or(0);
    let height = segments.iter().map(DynamicImage::height).sum();
    let mut canvas = RgbaImage::new(width, height);
    let mut top: i64 = 0;
    for segment in segments {
        image::imageops::replace(&mut canvas, &segment.to_rgba8(), 0, top);
        top += i64::from(segment.height());
    }

    let mut png = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| SelenideError::Screenshot {
            message: format!("Failed to encode PNG: {e}"),
        })?;
    Ok(png)
}
