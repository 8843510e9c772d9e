use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::Response;
use wee_engine::{AssetError, Fetch, FetchCallback};

/// [`Fetch`] over the browser's `fetch()`, relative to a base URL.
#[derive(Debug, Clone, Default)]
pub struct WebFetch {
    base: String,
}

impl WebFetch {
    /// Paths are resolved against `base` (e.g. `"assets/"`); empty means
    /// relative to the page.
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl Fetch for WebFetch {
    fn fetch(&self, path: &str, done: FetchCallback) {
        let url = self.url(path);
        let path = path.to_string();
        spawn_local(async move {
            let result = fetch_bytes(&url).await.map_err(|e| AssetError::Fetch {
                path,
                reason: describe(&e),
            });
            done(result);
        });
    }
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
    }
    let buffer = JsFuture::from(response.array_buffer()?).await?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

fn describe(error: &JsValue) -> String {
    error.as_string().unwrap_or_else(|| format!("{:?}", error))
}
