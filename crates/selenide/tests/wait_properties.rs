//! Timing and failure properties of the wait engine, observed through the
//! public API against a mock page on a paused clock.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use selenide::prelude::*;
use selenide::screenshot::{CapturePlan, ViewportMetrics};
use selenide::{MockDriver, MockElement};
use tokio::time::Instant;

fn browser(timeout_ms: u64, poll_ms: u64) -> (Arc<MockDriver>, Browser<MockDriver>) {
    let driver = Arc::new(MockDriver::new());
    let browser = Browser::from_arc(Arc::clone(&driver))
        .with_config(
            Configuration::new()
                .with_timeout(timeout_ms)
                .with_poll_interval(poll_ms),
        )
        .unwrap();
    (driver, browser)
}

// === Elapsed time ===

#[tokio::test(start_paused = true)]
async fn satisfied_condition_returns_without_waiting() {
    let (driver, browser) = browser(4000, 100);
    driver.add(MockElement::new("h1").with_text("Welcome"));

    let start = Instant::now();
    browser.element("h1").should(have::text("Welcome")).await.unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn unsatisfied_condition_times_out_within_one_poll() {
    let (_driver, browser) = browser(300, 100);

    let start = Instant::now();
    let err = browser.element("#missing").should(be::visible()).await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, SelenideError::Timeout { .. }));
    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed < Duration::from_millis(400));
}

#[tokio::test(start_paused = true)]
async fn late_element_is_picked_up_on_next_poll() {
    let (driver, browser) = browser(500, 50);
    driver.add(MockElement::new("button").appearing_after(Duration::from_millis(150)));

    let start = Instant::now();
    browser.element("button").click().await.unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(150));
    assert!(elapsed <= Duration::from_millis(250));
    assert_eq!(driver.call_count("click"), 1);
}

// === Failure reporting ===

#[tokio::test(start_paused = true)]
async fn timeout_message_names_locator_chain() {
    let (_driver, browser) = browser(300, 100);

    let err = browser
        .element("form")
        .element(By::name("email"))
        .should(be::visible())
        .await
        .unwrap_err();
    let message = err.to_string();

    assert!(message.starts_with("Timed out after 300ms"), "{message}");
    assert!(
        message.contains(
            r#"browser.element(By(css selector, form)).element(By(css selector, [name="email"]))"#
        ),
        "{message}"
    );
}

#[tokio::test(start_paused = true)]
async fn transport_failure_aborts_first_attempt() {
    let (driver, browser) = browser(1000, 100);
    driver.fail_transport("connection reset");

    let start = Instant::now();
    let err = browser.element("a").click().await.unwrap_err();

    assert!(matches!(err, SelenideError::Transport { .. }));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn malformed_selector_aborts_first_attempt() {
    let (driver, browser) = browser(1000, 100);
    driver.reject_selector("[[");

    let start = Instant::now();
    let err = browser.element("[[").click().await.unwrap_err();

    assert!(matches!(err, SelenideError::InvalidLocator { .. }), "{err:?}");
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(driver.call_count("find_elements"), 1);
}

#[tokio::test(start_paused = true)]
async fn index_beyond_collection_is_not_retried() {
    let (driver, browser) = browser(1000, 100);
    for _ in 0..3 {
        driver.add(MockElement::new("li"));
    }

    let start = Instant::now();
    let err = browser.all("li").get(5).click().await.unwrap_err();

    match err {
        SelenideError::IndexOutOfRange { index, len, .. } => {
            assert_eq!((index, len), (5, 3));
        }
        other => panic!("expected IndexOutOfRange, got {other:?}"),
    }
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(driver.call_count("find_elements"), 1);
}

// === Page changes during a wait ===

#[tokio::test(start_paused = true)]
async fn text_change_is_picked_up_mid_wait() {
    let (driver, browser) = browser(1000, 100);
    let heading = driver.add(MockElement::new("h1").with_text("Loading"));

    let title = browser.element("h1");
    let start = Instant::now();
    let (_, waited) = tokio::join!(
        async {
            tokio::time::sleep(Duration::from_millis(120)).await;
            driver.set_text(&heading, "Ready");
        },
        title.should(have::exact_text("Ready")),
    );

    waited.unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn click_waits_for_element_to_become_enabled() {
    let (driver, browser) = browser(1000, 100);
    let button = driver.add(MockElement::new("button").disabled());

    let submit = browser.element("button");
    let start = Instant::now();
    let (_, clicked) = tokio::join!(
        async {
            tokio::time::sleep(Duration::from_millis(250)).await;
            driver.set_enabled(&button, true);
        },
        submit.click(),
    );

    clicked.unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(300));
    assert_eq!(driver.call_count("click"), 1);
}

#[tokio::test(start_paused = true)]
async fn hiding_an_element_satisfies_hidden() {
    let (driver, browser) = browser(1000, 100);
    let banner = driver.add(MockElement::new("aside"));
    browser.element("aside").should(be::visible()).await.unwrap();

    driver.set_displayed(&banner, false);
    let start = Instant::now();
    browser.element("aside").should(be::hidden()).await.unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn set_value_clears_before_typing() {
    let (driver, browser) = browser(1000, 100);
    let input = driver.add(MockElement::new("input").with_value("old"));

    browser.element("input").set_value("rust").await.unwrap();

    let on_input: Vec<_> = driver
        .call_history()
        .into_iter()
        .filter(|call| call.element == Some(input))
        .map(|call| (call.method, call.argument))
        .collect();
    assert_eq!(on_input, vec![("clear", None), ("send_keys", Some("rust".to_string()))]);
    assert_eq!(driver.value_of(&input).as_deref(), Some("rust"));
}

// === Locators ===

#[tokio::test]
async fn resolving_twice_gives_the_same_answer() {
    let (driver, browser) = browser(1000, 100);
    driver.add(MockElement::new("li").with_text("one"));
    driver.add(MockElement::new("li").with_text("two"));

    let items = browser.all("li").filtered_by(have::text("o"));
    let first = items.find_all().await.unwrap();
    let second = items.find_all().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(items.to_string(), items.clone().to_string());
}

// === Screenshot planning ===

#[test]
fn tall_page_plan_crops_the_overlap() {
    let plan = CapturePlan::from_metrics(&ViewportMetrics {
        device_pixel_ratio: 1.0,
        inner_height: 1000.0,
        page_width: 800.0,
        page_height: 2500.0,
    })
    .unwrap();

    assert_eq!(plan.segments, 3);
    assert_eq!(plan.delta, 500);
    assert!(plan.crops(2));
    assert!(!plan.crops(1));
}

proptest! {
    /// Segments always cover the page without a full spare viewport.
    #[test]
    fn prop_plan_covers_page(inner in 1u32..4000, page in 1u32..50_000) {
        let plan = CapturePlan::from_metrics(&ViewportMetrics {
            device_pixel_ratio: 1.0,
            inner_height: f64::from(inner),
            page_width: 100.0,
            page_height: f64::from(page),
        })
        .unwrap();

        let covered = u64::from(plan.segments) * u64::from(inner);
        prop_assert!(covered >= u64::from(page));
        prop_assert!(plan.delta < inner);
        prop_assert_eq!(covered - u64::from(plan.delta), u64::from(page));
    }
}
