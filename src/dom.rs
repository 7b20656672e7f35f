use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// Attach `handler` to `event` on the element with `element_id`, if present.
pub fn add_listener(
    document: &web::Document,
    element_id: &str,
    event: &str,
    mut handler: impl FnMut() + 'static,
) {
    let Some(el) = document.get_element_by_id(element_id) else {
        log::warn!("[dom] missing #{element_id}");
        return;
    };
    let closure = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);
    _ = el.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    closure.forget();
}

#[inline]
pub fn add_click_listener(document: &web::Document, element_id: &str, handler: impl FnMut() + 'static) {
    add_listener(document, element_id, "click", handler);
}

pub fn add_window_listener(event: &str, mut handler: impl FnMut() + 'static) {
    let Some(window) = web::window() else {
        return;
    };
    let closure = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);
    _ = window.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Current value of an `<input>` element.
pub fn input_value(document: &web::Document, element_id: &str) -> Option<String> {
    document
        .get_element_by_id(element_id)?
        .dyn_into::<web::HtmlInputElement>()
        .ok()
        .map(|input| input.value())
}

pub fn select_value(document: &web::Document, element_id: &str) -> Option<String> {
    document
        .get_element_by_id(element_id)?
        .dyn_into::<web::HtmlSelectElement>()
        .ok()
        .map(|select| select.value())
}

/// First file chosen in an `<input type="file">`.
pub fn selected_file(document: &web::Document, element_id: &str) -> Option<web::File> {
    document
        .get_element_by_id(element_id)?
        .dyn_into::<web::HtmlInputElement>()
        .ok()?
        .files()?
        .get(0)
}

/// Open the file picker of an `<input type="file">`.
pub fn click(document: &web::Document, element_id: &str) {
    if let Some(el) = document
        .get_element_by_id(element_id)
        .and_then(|el| el.dyn_into::<web::HtmlElement>().ok())
    {
        el.click();
    }
}

pub fn set_text(document: &web::Document, element_id: &str, text: &str) {
    if let Some(el) = document.get_element_by_id(element_id) {
        el.set_text_content(Some(text));
    }
}
