//! `<input type="file">` 的读取

use unievent::request::FileUpload;
use wasm_bindgen::JsCast;

/// 事件目标里选中的第一个文件
pub fn selected_file(ev: &web_sys::Event) -> Option<gloo_file::File> {
    let input = ev.target()?.dyn_into::<web_sys::HtmlInputElement>().ok()?;
    let file = input.files()?.get(0)?;
    Some(gloo_file::File::from(file))
}

/// 读入内存，读取失败只记录日志
pub async fn read_upload(file: gloo_file::File) -> Option<FileUpload> {
    match gloo_file::futures::read_as_bytes(&file).await {
        Ok(bytes) => Some(FileUpload::new(file.name(), file.raw_mime_type(), bytes)),
        Err(e) => {
            tracing::warn!(file = %file.name(), error = %e, "failed to read selected file");
            None
        }
    }
}
