use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn run_scenario(json: &str) -> Result<String, JsValue> {
    crate::run_scenario_json(json).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn run_scenario_report(json: &str) -> Result<String, JsValue> {
    crate::run_scenario_report(json).map_err(|e| JsValue::from_str(&e.to_string()))
}
