use js_sys::{Function, JSON};
use serde::Serialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use vial_motion_core::{
    header_shadow, intersection_ratio as core_intersection_ratio, parse_slide_deck_json,
    CarouselId, Config, ElementHandle, EngineId, HeroTransform, HostEvent, LayoutSnapshot,
    MotionError, Outputs, Rect, RevealTracker, SamplerCfg, Stage, TrackedPair, VideoGate,
};

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn motion_err(e: MotionError) -> JsError {
    JsError::new(&e.to_string())
}

/// Plain objects instead of `Map`s, so flattened outputs read like the rest.
fn to_js<T: Serialize>(value: &T, what: &str) -> Result<JsValue, JsError> {
    value
        .serialize(&swb::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("{what} error: {e}")))
}

/// Accepts either a layout snapshot object or a zero-argument callback that
/// returns one, so the page can measure lazily.
fn read_layout(layout: JsValue) -> Result<LayoutSnapshot, JsError> {
    let value = match layout.dyn_into::<Function>() {
        Ok(f) => f
            .call0(&JsValue::UNDEFINED)
            .map_err(|e| JsError::new(&format!("layout callback threw: {:?}", e)))?,
        Err(value) => value,
    };
    if jsvalue_is_undefined_or_null(&value) {
        return Err(JsError::new("layout is null/undefined"));
    }
    // rects are keyed by numeric handles; serde_json reads those from object keys
    let s = JSON::stringify(&value)
        .map_err(|e| JsError::new(&format!("layout stringify error: {:?}", e)))?
        .as_string()
        .ok_or_else(|| JsError::new("layout: stringify produced non-string"))?;
    serde_json::from_str(&s).map_err(|e| JsError::new(&format!("layout error: {e}")))
}

#[wasm_bindgen]
pub struct VialMotion {
    core: Stage,
    /// Last layout seen by `frame`, reused by `dispatch` when the page passes none.
    layout: LayoutSnapshot,
}

#[wasm_bindgen]
impl VialMotion {
    /// Create a stage. Pass a JSON config object or undefined/null for defaults.
    /// Example:
    ///   new VialMotion({ carousel: { autoplay_duration_ms: 8000 } })
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<VialMotion, JsError> {
        console_error_panic_hook::set_once();

        let cfg: Config = if jsvalue_is_undefined_or_null(&config) {
            Config::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };

        Ok(VialMotion {
            core: Stage::new(cfg),
            layout: LayoutSnapshot::default(),
        })
    }

    /// Start a scroll progress sampler on `element`. Missing thresholds fall
    /// back to the configured sampler section. Returns the sampler id.
    #[wasm_bindgen(js_name = add_sampler)]
    pub fn add_sampler(
        &mut self,
        element: u32,
        start: Option<f64>,
        end: Option<f64>,
    ) -> Result<u32, JsError> {
        let cfg = match (start, end) {
            (None, None) => None,
            (start, end) => {
                let base = self.core.config().sampler;
                Some(SamplerCfg::new(
                    start.unwrap_or(base.start),
                    end.unwrap_or(base.end),
                ))
            }
        };
        let id = self
            .core
            .add_sampler(ElementHandle(element), cfg)
            .map_err(motion_err)?;
        Ok(id.0)
    }

    /// Start a carousel on `root`. `slides` is an array of slides or
    /// `{ slides: [...] }`, using the page's field names (`imgSrc`, `accent`).
    #[wasm_bindgen(js_name = add_carousel)]
    pub fn add_carousel(&mut self, root: u32, slides: JsValue) -> Result<u32, JsError> {
        if jsvalue_is_undefined_or_null(&slides) {
            return Err(JsError::new("add_carousel: slides is null/undefined"));
        }
        // Stringify so the core deck parser handles both shapes and the aliases
        let s = JSON::stringify(&slides)
            .map_err(|e| JsError::new(&format!("add_carousel stringify error: {:?}", e)))?
            .as_string()
            .ok_or_else(|| JsError::new("add_carousel: stringify produced non-string"))?;
        let deck = parse_slide_deck_json(&s).map_err(motion_err)?;
        let id = self
            .core
            .add_carousel(ElementHandle(root), deck)
            .map_err(motion_err)?;
        Ok(id.0)
    }

    /// Start a parallax field over `[{ row, icon }, ...]` element pairs.
    #[wasm_bindgen(js_name = add_parallax)]
    pub fn add_parallax(&mut self, pairs: JsValue) -> Result<u32, JsError> {
        let pairs: Vec<TrackedPair> = if jsvalue_is_undefined_or_null(&pairs) {
            Vec::new()
        } else {
            swb::from_value(pairs).map_err(|e| JsError::new(&format!("pairs error: {e}")))?
        };
        Ok(self.core.add_parallax(pairs).0)
    }

    /// Run one animation frame at the host timestamp. `layout` is a snapshot
    /// object or a callback returning one. Returns Outputs JSON.
    #[wasm_bindgen]
    pub fn frame(&mut self, now_ms: f64, layout: JsValue) -> Result<JsValue, JsError> {
        self.layout = read_layout(layout)?;
        let out: &Outputs = self.core.frame(now_ms, &self.layout);
        to_js(out, "outputs")
    }

    /// Forward a host event, e.g. `{ type: "touch_move", target: 3, x: 120 }`.
    /// Without a layout the one from the last frame is used.
    #[wasm_bindgen]
    pub fn dispatch(&mut self, event: JsValue, layout: JsValue) -> Result<(), JsError> {
        let event: HostEvent =
            swb::from_value(event).map_err(|e| JsError::new(&format!("event error: {e}")))?;
        if !jsvalue_is_undefined_or_null(&layout) {
            self.layout = read_layout(layout)?;
        }
        self.core.dispatch(&event, &self.layout);
        Ok(())
    }

    #[wasm_bindgen(js_name = carousel_next)]
    pub fn carousel_next(&mut self, id: u32) -> Result<u32, JsError> {
        let index = self.core.carousel_next(CarouselId(id)).map_err(motion_err)?;
        Ok(index as u32)
    }

    #[wasm_bindgen(js_name = carousel_previous)]
    pub fn carousel_previous(&mut self, id: u32) -> Result<u32, JsError> {
        let index = self
            .core
            .carousel_previous(CarouselId(id))
            .map_err(motion_err)?;
        Ok(index as u32)
    }

    /// Jump to a slide; negative and oversized indices wrap.
    #[wasm_bindgen(js_name = carousel_go_to)]
    pub fn carousel_go_to(&mut self, id: u32, index: i32) -> Result<u32, JsError> {
        let index = self
            .core
            .carousel_go_to(CarouselId(id), i64::from(index))
            .map_err(motion_err)?;
        Ok(index as u32)
    }

    /// Stop an engine, given as `{ kind: "carousel", id: 0 }`. Safe to repeat.
    #[wasm_bindgen]
    pub fn stop(&mut self, engine: JsValue) -> Result<(), JsError> {
        let engine: EngineId =
            swb::from_value(engine).map_err(|e| JsError::new(&format!("engine id error: {e}")))?;
        self.core.stop(engine).map_err(motion_err)
    }

    /// Stop and forget an engine.
    #[wasm_bindgen]
    pub fn remove(&mut self, engine: JsValue) -> Result<(), JsError> {
        let engine: EngineId =
            swb::from_value(engine).map_err(|e| JsError::new(&format!("engine id error: {e}")))?;
        self.core.remove(engine).map_err(motion_err)
    }

    /// Stop everything, e.g. when the page unmounts.
    #[wasm_bindgen]
    pub fn teardown(&mut self) {
        self.core.teardown();
    }

    /// Hero card transform for a sampler progress value.
    #[wasm_bindgen(js_name = hero_transform)]
    pub fn hero_transform(&self, progress: f64) -> Result<JsValue, JsError> {
        let t = HeroTransform::from_progress(progress, &self.core.config().effects.hero);
        to_js(&t, "hero")
    }

    /// Whether the sticky header should carry its shadow at this page offset.
    #[wasm_bindgen(js_name = header_shadow)]
    pub fn header_shadow(&self, scroll_y: f64) -> bool {
        header_shadow(scroll_y, self.core.config().effects.header_shadow_offset)
    }

    /// Video gate configured from the effects section.
    #[wasm_bindgen(js_name = video_gate)]
    pub fn video_gate(&self) -> VialVideoGate {
        let fx = &self.core.config().effects;
        VialVideoGate {
            inner: VideoGate::new(fx.video_play_threshold, fx.video_rewind_on_pause),
        }
    }

    /// Reveal tracker configured from the effects section.
    #[wasm_bindgen(js_name = reveal_tracker)]
    pub fn reveal_tracker(&self) -> VialReveal {
        VialReveal {
            inner: RevealTracker::new(self.core.config().effects.reveal_threshold),
        }
    }
}

/// Plays/pauses the hero video on progress transitions.
#[wasm_bindgen]
pub struct VialVideoGate {
    inner: VideoGate,
}

#[wasm_bindgen]
impl VialVideoGate {
    /// Returns `"play"`, `{ pause: { rewind } }` or undefined when nothing changed.
    #[wasm_bindgen]
    pub fn update(&mut self, progress: f64) -> Result<JsValue, JsError> {
        match self.inner.update(progress) {
            Some(cmd) => to_js(&cmd, "video"),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    #[wasm_bindgen(js_name = is_playing)]
    pub fn is_playing(&self) -> bool {
        self.inner.is_playing()
    }
}

/// Reveal-on-scroll toggle for one block.
#[wasm_bindgen]
pub struct VialReveal {
    inner: RevealTracker,
}

#[wasm_bindgen]
impl VialReveal {
    /// Feed an intersection ratio; returns the new visibility when it changed.
    #[wasm_bindgen]
    pub fn update(&mut self, ratio: f64) -> Option<bool> {
        self.inner.update(ratio)
    }

    #[wasm_bindgen(js_name = is_visible)]
    pub fn is_visible(&self) -> bool {
        self.inner.is_visible()
    }
}

/// Fraction of an element (top/height in viewport coordinates) that is on screen.
#[wasm_bindgen]
pub fn intersection_ratio(top: f64, height: f64, viewport_height: f64) -> f64 {
    core_intersection_ratio(Rect::new(top, height), viewport_height)
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
