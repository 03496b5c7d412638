//! HTTP 传输层
//!
//! 基于 `gloo-net` 的 fetch 封装，实现核心库的 `HttpClient`。

use async_trait::async_trait;
use gloo_net::http::{Method, RequestBuilder};
use unievent::request::HttpMethod;
use unievent::{
    ClientError, ClientResult, HttpClient, HttpRequest, HttpResponse, MultipartForm, PartValue,
    RequestBody,
};
use web_sys::FormData;

const NETWORK_ERROR: &str = "Eroare de conexiune. Verifică serverul.";

fn method(m: HttpMethod) -> Method {
    match m {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// 转成浏览器的 `FormData`，文件字段以 Blob 附带文件名
fn form_data(form: &MultipartForm) -> ClientResult<FormData> {
    let build_err = |e: wasm_bindgen::JsValue| {
        tracing::error!(error = ?e, "building form data failed");
        ClientError::network(NETWORK_ERROR).in_op("fetch.form")
    };

    let data = FormData::new().map_err(build_err)?;
    for (name, value) in form.parts() {
        match value {
            PartValue::Text(text) => data.append_with_str(name, text).map_err(build_err)?,
            PartValue::File(file) => {
                let blob = gloo_file::Blob::new_with_options(
                    file.bytes.as_slice(),
                    Some(file.content_type.as_str()),
                );
                let blob: web_sys::Blob = blob.into();
                data.append_with_blob_and_filename(name, &blob, &file.file_name)
                    .map_err(build_err)?
            }
        }
    }
    Ok(data)
}

/// 浏览器 fetch 客户端
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchHttpClient;

#[async_trait(?Send)]
impl HttpClient for FetchHttpClient {
    async fn send(&self, req: HttpRequest) -> ClientResult<HttpResponse> {
        let mut builder = RequestBuilder::new(&req.url).method(method(req.method));
        for (key, value) in &req.headers {
            builder = builder.header(key, value);
        }

        let request = match &req.body {
            Some(RequestBody::Json(body)) => builder.body(body.as_str()),
            Some(RequestBody::Multipart(form)) => builder.body(form_data(form)?),
            None => builder.build(),
        }
        .map_err(|e| {
            tracing::error!(url = %req.url, error = %e, "request build failed");
            ClientError::network(NETWORK_ERROR).in_op("fetch.build")
        })?;

        let response = request.send().await.map_err(|e| {
            tracing::warn!(url = %req.url, error = %e, "fetch failed");
            ClientError::network(NETWORK_ERROR).in_op("fetch.send")
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::warn!(url = %req.url, error = %e, "reading response body failed");
            ClientError::network(NETWORK_ERROR).in_op("fetch.read_body")
        })?;

        Ok(HttpResponse { status, body })
    }
}
