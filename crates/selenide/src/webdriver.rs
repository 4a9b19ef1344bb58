//! W3C WebDriver client.
//!
//! Speaks the JSON wire format of the W3C WebDriver recommendation over
//! HTTP, so it works against chromedriver, geckodriver, Selenium Grid and
//! anything else exposing the standard endpoints.
//!
//! Driver error codes are classified into [`SelenideError`] variants:
//!
//! | W3C error                        | Variant           |
//! |----------------------------------|-------------------|
//! | `no such element`                | `NoSuchElement`   |
//! | `stale element reference`        | `StaleReference`  |
//! | `element not interactable`       | `NotInteractable` |
//! | `element click intercepted`      | `NotInteractable` |
//! | `invalid selector`               | `InvalidLocator`  |
//! | `invalid argument`               | `InvalidLocator`  |
//! | anything else, HTTP failures     | `Transport`       |

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::by::By;
use crate::driver::{Driver, FRAME_ELEMENT_JS};
use crate::result::{SelenideError, SelenideResult};

/// JSON key identifying a web element reference
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4fb3ffe0bac8";

/// Remote element handle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WebElementRef(pub String);

impl WebElementRef {
    /// Wire representation
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({ ELEMENT_KEY: self.0 })
    }

    /// Parse a wire representation
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|id| Self(id.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

/// Map a W3C error code to a selenide error
#[must_use]
pub fn classify_error(code: &str, message: &str) -> SelenideError {
    let message = if message.is_empty() {
        code.to_string()
    } else {
        format!("{code}: {message}")
    };
    match code {
        "no such element" => SelenideError::NoSuchElement { message },
        "stale element reference" => SelenideError::StaleReference { message },
        "element not interactable" | "element click intercepted" => {
            SelenideError::NotInteractable { message }
        }
        "invalid selector" | "invalid argument" => SelenideError::InvalidLocator { message },
        _ => SelenideError::Transport { message },
    }
}

/// HTTP client for one WebDriver session
#[derive(Debug, Clone)]
pub struct WebDriverClient {
    http: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl WebDriverClient {
    /// Use an existing session
    #[must_use]
    pub fn attach(base_url: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_id: session_id.into(),
        }
    }

    /// Start a session with the given `alwaysMatch` capabilities
    pub async fn new_session(base_url: impl Into<String>, capabilities: Value) -> SelenideResult<Self> {
        let mut client = Self::attach(base_url, String::new());
        let body = json!({ "capabilities": { "alwaysMatch": capabilities } });
        let url = client.endpoint(&["session"])?;
        let value = client.send(Method::POST, url, Some(body)).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| SelenideError::transport(format!("no sessionId in {value}")))?;
        client.session_id = session_id.to_string();
        tracing::info!(session_id, "webdriver session started");
        Ok(client)
    }

    /// Replace the HTTP client (proxies, timeouts)
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Session identifier
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// End the session and close the browser
    pub async fn delete_session(&self) -> SelenideResult<()> {
        self.command(Method::DELETE, &[], None).await?;
        tracing::info!(session_id = %self.session_id, "webdriver session deleted");
        Ok(())
    }

    /// Load a URL in the current browsing context
    pub async fn navigate_to(&self, url: &str) -> SelenideResult<()> {
        self.command(Method::POST, &["url"], Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    /// Base URL extended by percent-encoded path segments
    fn endpoint(&self, segments: &[&str]) -> SelenideResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SelenideError::transport(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| SelenideError::transport(format!("{}: not a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn command(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> SelenideResult<Value> {
        let mut path = vec!["session", self.session_id.as_str()];
        path.extend_from_slice(segments);
        let url = self.endpoint(&path)?;
        self.send(method, url, body).await
    }

    async fn send(&self, method: Method, url: Url, body: Option<Value>) -> SelenideResult<Value> {
        tracing::trace!(%method, %url, "webdriver command");
        let mut request = self.http.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| SelenideError::transport(format!("{url}: {e}")))?;
        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| SelenideError::transport(format!("{url}: invalid response ({status}): {e}")))?;
        let value = payload.get("value").cloned().unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(value);
        }
        match serde_json::from_value::<WireError>(value) {
            Ok(wire) => Err(classify_error(&wire.error, &wire.message)),
            Err(_) => Err(SelenideError::transport(format!("{url}: HTTP {status}"))),
        }
    }

    async fn element_command(
        &self,
        method: Method,
        element: &WebElementRef,
        action: &[&str],
        body: Option<Value>,
    ) -> SelenideResult<Value> {
        let mut path = vec!["element", element.0.as_str()];
        path.extend_from_slice(action);
        self.command(method, &path, body).await
    }

    async fn pointer(&self, element: &WebElementRef, button: u8, clicks: usize) -> SelenideResult<()> {
        let mut actions = vec![json!({
            "type": "pointerMove",
            "duration": 0,
            "origin": element.to_json(),
            "x": 0,
            "y": 0,
        })];
        for _ in 0..clicks {
            actions.push(json!({ "type": "pointerDown", "button": button }));
            actions.push(json!({ "type": "pointerUp", "button": button }));
        }
        let body = json!({
            "actions": [{
                "type": "pointer",
                "id": "mouse",
                "parameters": { "pointerType": "mouse" },
                "actions": actions,
            }]
        });
        self.command(Method::POST, &["actions"], Some(body)).await?;
        Ok(())
    }
}

fn element_list(value: &Value) -> SelenideResult<Vec<WebElementRef>> {
    value
        .as_array()
        .ok_or_else(|| SelenideError::transport(format!("expected element list, got {value}")))?
        .iter()
        .map(|v| {
            WebElementRef::from_json(v)
                .ok_or_else(|| SelenideError::transport(format!("not an element reference: {v}")))
        })
        .collect()
}

#[async_trait]
impl Driver for WebDriverClient {
    type Element = WebElementRef;

    async fn find_elements(
        &self,
        by: &By,
        scope: Option<&WebElementRef>,
    ) -> SelenideResult<Vec<WebElementRef>> {
        let body = Some(serde_json::to_value(by)?);
        let value = match scope {
            Some(parent) => {
                self.element_command(Method::POST, parent, &["elements"], body)
                    .await?
            }
            None => self.command(Method::POST, &["elements"], body).await?,
        };
        element_list(&value)
    }

    async fn execute_script(&self, script: &str, args: &[WebElementRef]) -> SelenideResult<Value> {
        let args: Vec<Value> = args.iter().map(WebElementRef::to_json).collect();
        self.command(
            Method::POST,
            &["execute", "sync"],
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn take_screenshot(&self) -> SelenideResult<Vec<u8>> {
        let value = self.command(Method::GET, &["screenshot"], None).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| SelenideError::transport("screenshot is not a string"))?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| SelenideError::Screenshot {
                message: format!("Failed to decode base64: {e}"),
            })
    }

    async fn switch_to_frame(&self, frame: &WebElementRef) -> SelenideResult<()> {
        self.command(Method::POST, &["frame"], Some(json!({ "id": frame.to_json() })))
            .await?;
        Ok(())
    }

    async fn switch_to_default_content(&self) -> SelenideResult<()> {
        self.command(Method::POST, &["frame"], Some(json!({ "id": null })))
            .await?;
        Ok(())
    }

    async fn frame_element(&self) -> SelenideResult<Option<WebElementRef>> {
        let value = self.execute_script(FRAME_ELEMENT_JS, &[]).await?;
        Ok(WebElementRef::from_json(&value))
    }

    async fn click(&self, element: &WebElementRef) -> SelenideResult<()> {
        self.element_command(Method::POST, element, &["click"], Some(json!({})))
            .await?;
        Ok(())
    }

    async fn double_click(&self, element: &WebElementRef) -> SelenideResult<()> {
        self.pointer(element, 0, 2).await
    }

    async fn context_click(&self, element: &WebElementRef) -> SelenideResult<()> {
        self.pointer(element, 2, 1).await
    }

    async fn hover(&self, element: &WebElementRef) -> SelenideResult<()> {
        self.pointer(element, 0, 0).await
    }

    async fn send_keys(&self, element: &WebElementRef, text: &str) -> SelenideResult<()> {
        self.element_command(Method::POST, element, &["value"], Some(json!({ "text": text })))
            .await?;
        Ok(())
    }

    async fn clear(&self, element: &WebElementRef) -> SelenideResult<()> {
        self.element_command(Method::POST, element, &["clear"], Some(json!({})))
            .await?;
        Ok(())
    }

    async fn is_displayed(&self, element: &WebElementRef) -> SelenideResult<bool> {
        let value = self
            .element_command(Method::GET, element, &["displayed"], None)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, element: &WebElementRef) -> SelenideResult<bool> {
        let value = self
            .element_command(Method::GET, element, &["enabled"], None)
            .await?;
        Ok(value.as_bool().unwrap_or(true))
    }

    async fn text(&self, element: &WebElementRef) -> SelenideResult<String> {
        let value = self.element_command(Method::GET, element, &["text"], None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(&self, element: &WebElementRef, name: &str) -> SelenideResult<Option<String>> {
        let value = self
            .element_command(Method::GET, element, &["attribute", name], None)
            .await?;
        Ok(crate::driver::value_to_string(&value))
    }

    async fn value(&self, element: &WebElementRef) -> SelenideResult<Option<String>> {
        let value = self
            .element_command(Method::GET, element, &["property", "value"], None)
            .await?;
        Ok(crate::driver::value_to_string(&value))
    }
}
