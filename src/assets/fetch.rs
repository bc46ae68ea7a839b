use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use super::manifest::{AssetManifest, ThemeError};

fn js_error(value: JsValue) -> ThemeError {
    ThemeError::unavailable(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

/// 通过浏览器 `fetch` 读取素材清单。网络或解析失败统一归为 `AssetSourceUnavailable`。
pub async fn fetch_manifest(url: &str) -> Result<AssetManifest, ThemeError> {
    let window = web_sys::window().ok_or_else(|| ThemeError::unavailable("no window available"))?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(js_error)?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| ThemeError::unavailable("fetch did not return a Response"))?;
    if !response.ok() {
        return Err(ThemeError::unavailable(format!(
            "{url} responded with status {}",
            response.status()
        )));
    }

    let body = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    let body = body
        .as_string()
        .ok_or_else(|| ThemeError::unavailable("manifest body is not text"))?;
    AssetManifest::from_json(&body)
}
