use crate::Mode;
#[cfg(feature = "debug")]
use serde_json::json;

#[cfg(feature = "debug")]
thread_local!(
    static DEBUG_FRAME: std::cell::RefCell<Vec<serde_json::Value>> = Default::default();
);

#[allow(unused)]
pub(crate) fn debug_interval(time_s: f64, density: f64, flow: f64, sample_count: u32) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "interval",
            "time": time_s,
            "density": density,
            "flow": flow,
            "samples": sample_count,
        }))
    })
}

#[allow(unused)]
pub(crate) fn debug_transition(time_s: f64, density: f64, from: Mode, to: Mode) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "transition",
            "time": time_s,
            "density": density,
            "from": from.to_string(),
            "to": to.to_string(),
        }))
    })
}

#[cfg(feature = "debug")]
pub fn take_debug_frame() -> serde_json::Value {
    json!(DEBUG_FRAME.with(|frame| frame.take()))
}
