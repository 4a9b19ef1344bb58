//! Browser entry point.
//!
//! ```ignore
//! let browser = Browser::new(WebDriverClient::new_session(url, caps).await?);
//! browser.element("#login").click().await?;
//! browser.all("li.todo").should(have::size(3)).await?;
//! ```

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::by::By;
use crate::config::Configuration;
use crate::driver::Driver;
use crate::element::{Collection, Element};
use crate::locator::Locator;
use crate::result::SelenideResult;
use crate::screenshot;

/// A driver plus the defaults every handle inherits
pub struct Browser<D: Driver> {
    driver: Arc<D>,
    config: Configuration,
}

impl<D: Driver> Browser<D> {
    /// Wrap a driver with the default configuration
    pub fn new(driver: D) -> Self {
        Self::from_arc(Arc::new(driver))
    }

    /// Wrap a shared driver with the default configuration
    pub fn from_arc(driver: Arc<D>) -> Self {
        Self {
            driver,
            config: Configuration::default(),
        }
    }

    /// Replace the configuration after checking it
    pub fn with_config(mut self, config: Configuration) -> SelenideResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Shared driver
    #[must_use]
    pub const fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// Current configuration
    #[must_use]
    pub const fn config(&self) -> &Configuration {
        &self.config
    }

    /// Lazy handle to the first element matching `by`
    #[must_use]
    pub fn element(&self, by: impl Into<By>) -> Element<D> {
        Element::new(
            Arc::clone(&self.driver),
            Locator::Element { by: by.into() },
            self.config.policy(),
        )
    }

    /// Lazy handle to all elements matching `by`
    #[must_use]
    pub fn all(&self, by: impl Into<By>) -> Collection<D> {
        Collection::new(
            Arc::clone(&self.driver),
            Locator::All { by: by.into() },
            self.config.policy(),
        )
    }

    /// Run a script in the current browsing context
    pub async fn execute_script(&self, script: &str) -> SelenideResult<Value> {
        self.driver.execute_script(script, &[]).await
    }

    /// Capture the whole document as PNG
    pub async fn take_full_page_screenshot(&self) -> SelenideResult<Vec<u8>> {
        screenshot::take_full_page(self.driver.as_ref(), &self.config.screenshot).await
    }

    /// Capture the whole document and write it as PNG
    pub async fn save_screenshot(&self, path: impl AsRef<Path>) -> SelenideResult<()> {
        let png = self.take_full_page_screenshot().await?;
        tokio::fs::write(path.as_ref(), png).await?;
        tracing::info!(path = %path.as_ref().display(), "screenshot saved");
        Ok(())
    }
}

impl<D: Driver> Clone for Browser<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            config: self.config,
        }
    }
}

impl<D: Driver> std::fmt::Debug for Browser<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Browser")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement};
    use crate::result::SelenideError;
    use crate::{be, have};
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Vec::new();
        RgbaImage::new(width, height)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_handles_inherit_configuration() {
        let browser = Browser::new(MockDriver::new())
            .with_config(Configuration::new().with_timeout(750).with_poll_interval(50))
            .unwrap();
        let element = browser.element("a");
        assert_eq!(element.policy().timeout_ms, 750);
        assert_eq!(element.policy().poll_interval_ms, 50);
        assert_eq!(browser.all("li").get(1).policy().timeout_ms, 750);
    }

    #[test]
    fn test_with_config_rejects_invalid_policy() {
        let err = Browser::new(MockDriver::new())
            .with_config(Configuration::new().with_timeout(50).with_poll_interval(100))
            .unwrap_err();
        assert!(matches!(err, SelenideError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_factories_render_locators() {
        let browser = Browser::new(MockDriver::new());
        assert_eq!(
            browser.element(By::xpath("//h1")).to_string(),
            "browser.element(By(xpath, //h1))"
        );
        assert_eq!(browser.all("li").to_string(), "browser.all(By(css selector, li))");
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_flow() {
        let driver = Arc::new(MockDriver::new());
        let browser = Browser::from_arc(Arc::clone(&driver));
        let input = driver.add(MockElement::new("input").matching(By::name("q")));
        driver.add(MockElement::new("li").appearing_after(std::time::Duration::from_millis(300)));

        browser
            .element(By::name("q"))
            .should(be::enabled())
            .await
            .unwrap()
            .set_value("rust")
            .await
            .unwrap();
        browser.all("li").should(have::size_greater_than(0)).await.unwrap();
        assert_eq!(driver.value_of(&input).as_deref(), Some("rust"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_screenshot() {
        let driver = MockDriver::new();
        driver.on_script(
            "devicePixelRatio",
            serde_json::json!({"devicePixelRatio": 1, "innerHeight": 5, "pageWidth": 4, "pageHeight": 5}),
        );
        driver.push_screenshot(png(4, 5));
        let browser = Browser::new(driver);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        browser.save_screenshot(&path).await.unwrap();
        let saved = image::open(&path).unwrap();
        assert_eq!((saved.width(), saved.height()), (4, 5));
    }

    #[tokio::test]
    async fn test_execute_script() {
        let driver = MockDriver::new();
        driver.on_script("document.title", serde_json::json!("Home"));
        let browser = Browser::new(driver);
        assert_eq!(
            browser.execute_script("return document.title;").await.unwrap(),
            serde_json::json!("Home")
        );
    }
}
