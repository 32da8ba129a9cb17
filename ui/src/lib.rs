mod app;
mod channel;
mod composer;
mod feed;
mod home;
mod shared;
mod subscriptions;
mod watch;
mod widgets;

pub use app::{parse_user, ClipprApp};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// WASM初期化とパニックフック設定
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    // パニック時にコンソールにスタックトレースを表示
    console_error_panic_hook::set_once();

    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::error_1(&format!("Failed to init logger: {}", e).into());
    }

    log::info!("ClipprX WASM initialized");
}

/// Webアプリケーションのエントリーポイント
///
/// `token` と `user_json` はホスト側のセッションから渡される。
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn start_app(
    canvas_id: String,
    base_url: String,
    token: Option<String>,
    user_json: Option<String>,
) -> Result<(), JsValue> {
    use std::rc::Rc;

    use clipprx_core::api::fetch::FetchTransport;
    use clipprx_core::api::ApiConfig;
    use clipprx_core::CoreHandle;
    use wasm_bindgen::JsCast;

    let document = web_sys::window()
        .ok_or("No window")?
        .document()
        .ok_or("No document")?;

    let canvas = document
        .get_element_by_id(&canvas_id)
        .ok_or("Canvas not found")?
        .dyn_into::<web_sys::HtmlCanvasElement>()?;

    let config = ApiConfig::new(&base_url)?.with_token(token);
    let core = CoreHandle::new(Rc::new(FetchTransport::new(config)));
    let current_user = parse_user(user_json.as_deref());

    let web_options = eframe::WebOptions::default();

    eframe::WebRunner::new()
        .start(
            canvas,
            web_options,
            Box::new(move |cc| {
                let mut style = (*cc.egui_ctx.style()).clone();
                style.spacing.item_spacing = egui::vec2(10.0, 10.0);
                style.spacing.button_padding = egui::vec2(12.0, 6.0);
                cc.egui_ctx.set_style(style);

                Ok(Box::new(ClipprApp::new(cc.egui_ctx.clone(), core, current_user)))
            }),
        )
        .await?;

    Ok(())
}
