//! interop.rs
//!
//! Load Stripe.js v3 at runtime (no inline JS), either as a future or as a
//! Yew hook.
//!
//! # Overview
//! `load_stripejs()` injects a single
//! `<script id="stripejs-sdk" src="https://js.stripe.com/v3/" defer>`
//! into `<head>` on first use and resolves once `window.Stripe` exists.
//! `use_stripejs()` wraps it for components: it returns `false` until the
//! script’s `load` event fires, then `true` on every subsequent call.
//!
//! # Usage
//! ```rust,ignore
//! use yew::prelude::*;
//! use yew_stripe_payment_request::use_stripejs;
//!
//! #[function_component(App)]
//! fn app() -> Html {
//!     let stripe_ready = use_stripejs();
//!     html! {
//!         if stripe_ready {
//!             <p>{"✅ Stripe.js loaded"}</p>
//!         } else {
//!             <p>{"⏳ Loading Stripe.js..."}</p>
//!         }
//!     }
//! }
//! ```

use gloo_utils::{document, window};
use wasm_bindgen::{prelude::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::js_sys::{Function, Promise, Reflect};
use web_sys::{Document, HtmlScriptElement};
use yew::functional::hook; // required for custom hooks marked #[hook]
use yew::prelude::*;

pub const STRIPE_JS_URL: &str = "https://js.stripe.com/v3/";
const SCRIPT_ID: &str = "stripejs-sdk";

/// `true` once `window.Stripe` is defined.
pub fn stripejs_loaded() -> bool {
    Reflect::has(&window(), &JsValue::from_str("Stripe")).unwrap_or(false)
}

/// Records how our `<script>` tag's load ended: `"loaded"` or `"error"`.
const STATE_ATTR: &str = "data-load-state";

/// Inject Stripe.js if needed and wait for it to load.
///
/// Concurrent callers share the same `<script>` tag; each waits on its
/// `load` event. A tag whose earlier load failed is replaced.
///
/// # Errors
///
/// Returns the DOM exception if the script cannot be created or observed,
/// the `error` event if the script fails to load, or an error if the script
/// loaded without defining `window.Stripe`.
pub async fn load_stripejs() -> Result<(), JsValue> {
    if stripejs_loaded() {
        return Ok(());
    }

    let document = document();
    let script = match reusable_script(&document)? {
        Some(script) => script,
        None => inject_script(&document)?,
    };

    if script.get_attribute(STATE_ATTR).as_deref() == Some("loaded") {
        return Err(JsValue::from_str("Stripe.js loaded but window.Stripe is undefined"));
    }

    let mut registered = Ok(());
    let loaded = Promise::new(&mut |resolve: Function, reject: Function| {
        registered = script
            .add_event_listener_with_callback("load", &resolve)
            .and_then(|()| script.add_event_listener_with_callback("error", &reject));
    });
    registered?;

    // The tag may have finished loading between the check above and now.
    if stripejs_loaded() {
        return Ok(());
    }
    JsFuture::from(loaded).await.map(|_| ())
}

/// The existing `stripejs-sdk` tag, unless its load already failed, in which
/// case it is removed so a fresh one can be injected.
pub(crate) fn reusable_script(document: &Document) -> Result<Option<HtmlScriptElement>, JsValue> {
    let Some(existing) = document.get_element_by_id(SCRIPT_ID) else {
        return Ok(None);
    };
    if existing.get_attribute(STATE_ATTR).as_deref() == Some("error") {
        existing.remove();
        return Ok(None);
    }
    Ok(Some(existing.dyn_into()?))
}

fn inject_script(document: &Document) -> Result<HtmlScriptElement, JsValue> {
    let script: HtmlScriptElement = document.create_element("script")?.dyn_into()?;
    script.set_id(SCRIPT_ID);
    script.set_src(STRIPE_JS_URL);
    script.set_defer(true);

    for (event, state) in [("load", "loaded"), ("error", "error")] {
        let tag = script.clone();
        let record = leak_closure(move |_| {
            let _ = tag.set_attribute(STATE_ATTR, state);
        });
        script.add_event_listener_with_callback(event, &record)?;
    }

    document
        .head()
        .ok_or_else(|| JsValue::from_str("document has no <head>"))?
        .append_child(&script)?;
    Ok(script)
}

/// Custom hook: load Stripe.js v3 exactly once and track readiness.
///
/// # Returns
/// - `false` while the `<script>` is being fetched & parsed.
/// - `true` once `window.Stripe` exists (script loaded & parsed).
///
/// All components using `use_stripejs()` will share the same script
/// insertion logic and state.
#[hook]
pub fn use_stripejs() -> bool {
    let loaded = use_state(stripejs_loaded);

    {
        let loaded = loaded.clone();
        use_effect_with((), move |_| {
            if !*loaded {
                wasm_bindgen_futures::spawn_local(async move {
                    match load_stripejs().await {
                        Ok(()) => loaded.set(true),
                        Err(err) => log::error!("failed to load Stripe.js: {err:?}"),
                    }
                });
            }
            || ()
        });
    }

    *loaded
}

/// Leak a one-shot closure as a JS function, for callbacks that must outlive
/// the Rust scope that registered them.
pub(crate) fn leak_closure(f: impl FnMut(JsValue) + 'static) -> Function {
    let closure = Closure::<dyn FnMut(JsValue)>::new(f);
    let function = closure.as_ref().unchecked_ref::<Function>().clone();
    closure.forget();
    function
}
