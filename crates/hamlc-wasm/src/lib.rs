//! WASM bindings for the hamlc compiler.
//!
//! Exposes `compile()` and `check()` to JavaScript via wasm-bindgen.
//! Options are a plain object such as `{ target: "jinja", cache: false }`;
//! missing fields take their defaults. With `cache` on, outputs are memoized
//! for the lifetime of the module.

use std::sync::{Arc, LazyLock};

use hamlc_codegen::{Compiler, CompilerOutput, Options, OutputCache};
use wasm_bindgen::prelude::*;

/// Outputs memoized across calls with `cache` set.
static CACHE: LazyLock<Arc<OutputCache>> = LazyLock::new(|| Arc::new(OutputCache::new()));

/// Compile hamlc source to HTML for the target named in `options`.
///
/// Throws a JS error if the options are malformed or compilation fails.
#[wasm_bindgen]
pub fn compile(source: &str, options: JsValue) -> Result<String, JsError> {
    let options = read_options(options)?;
    let output = compile_source(source, &options).map_err(|e| JsError::new(&e))?;
    Ok(output.html.clone())
}

/// Compile without keeping the output and return the warnings as an array
/// of strings.
#[wasm_bindgen]
pub fn check(source: &str, options: JsValue) -> Result<js_sys::Array, JsError> {
    let options = read_options(options)?;
    let output = compile_source(source, &options).map_err(|e| JsError::new(&e))?;

    let warnings = js_sys::Array::new();
    for warning in warning_messages(&output) {
        warnings.push(&JsValue::from_str(&warning));
    }
    Ok(warnings)
}

/// Get the compiler version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn read_options(options: JsValue) -> Result<Options, JsError> {
    if options.is_undefined() || options.is_null() {
        return Ok(Options::default());
    }
    serde_wasm_bindgen::from_value(options).map_err(|e| JsError::new(&format!("Invalid options: {e}")))
}

fn compile_source(source: &str, options: &Options) -> Result<Arc<CompilerOutput>, String> {
    Compiler::new(options.clone())
        .with_cache(Arc::clone(&CACHE))
        .compile(source)
        .map_err(|e| e.to_string())
}

fn warning_messages(output: &CompilerOutput) -> Vec<String> {
    output.warnings.iter().map(ToString::to_string).collect()
}
