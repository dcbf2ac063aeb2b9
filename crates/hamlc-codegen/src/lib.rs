//! hamlc Code Generator
//!
//! Renders a parsed template into HTML interleaved with the control and
//! output syntax of a target template engine.
//!
//! ```text
//! source → Parser::parse() → Document → Renderer + Target → CompilerOutput { html, warnings }
//! ```
//!
//! # Examples
//!
//! ```
//! use hamlc_codegen::{compile, Options, TargetKind};
//!
//! let options = Options {
//!     target: TargetKind::Jinja,
//!     ..Options::default()
//! };
//! let output = compile("%ul\n  - for x in xs\n    %li= x", &options).unwrap();
//! assert_eq!(
//!     output.html,
//!     "<ul>\n  {% for x in xs %}\n    <li>{{ x }}</li>\n  {% endfor %}\n</ul>\n"
//! );
//! ```

pub mod attributes;
pub mod cache;
pub mod render;
pub mod target;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hamlc_parser::{EvalError, Evaluator, LiteralEvaluator, ParseError, Parser};
use serde::Deserialize;

pub use cache::OutputCache;
pub use render::{RenderResult, Renderer};
pub use target::{BlockOutput, DefaultTarget, Jinja, Rule, Target, TargetKind, Tornado, Underscore};

/// The compiled output of one template.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerOutput {
    pub html: String,
    /// Control lines the target has no rule for.
    pub warnings: Vec<Warning>,
}

/// A control keyword the target has no rule for. The line is still emitted,
/// wrapped in the target's statement delimiters, without a closing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub keyword: String,
    pub line: usize,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: no rule for control keyword `{}`; emitted without a closing line",
            self.line, self.keyword
        )
    }
}

/// Code generation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodegenError {
    #[error(transparent)]
    Grammar(#[from] ParseError),

    #[error(transparent)]
    Evaluation(#[from] EvalError),

    #[error("Codegen error at line {line}: {message}")]
    Target { message: String, line: usize },

    #[error("Codegen error at line {line}: attribute clause did not evaluate to a mapping")]
    Mapping { line: usize },
}

/// Cache namespace of compilers using [`LiteralEvaluator`].
const LITERAL_NAMESPACE: u64 = 0;

/// Next cache namespace for a compiler with a custom evaluator.
static NEXT_NAMESPACE: AtomicU64 = AtomicU64::new(LITERAL_NAMESPACE + 1);

/// Compiler options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    pub target: TargetKind,
    /// Whether a [`Compiler`] built from these options memoizes outputs.
    /// The free [`compile`] function ignores it.
    pub cache: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            target: TargetKind::Default,
            cache: true,
        }
    }
}

/// Compile `source` with the default evaluator. Never caches; see
/// [`Compiler`] for memoized compiles.
pub fn compile(source: &str, options: &Options) -> Result<CompilerOutput, CodegenError> {
    let mut target = options.target.create();
    compile_with(source, target.as_mut(), &LiteralEvaluator)
}

/// Compile `source` with an explicit backend and evaluator.
pub fn compile_with(
    source: &str,
    target: &mut dyn Target,
    evaluator: &dyn Evaluator,
) -> Result<CompilerOutput, CodegenError> {
    let document = Parser::parse(source)?;
    tracing::debug!(target_name = target.name(), nodes = document.len(), "compiling");

    let mut renderer = Renderer::new(target, evaluator);
    let html = renderer.render(&document)?;

    Ok(CompilerOutput {
        html,
        warnings: renderer.into_warnings(),
    })
}

/// A configured compiler: options, an evaluator, and an optional shared
/// output cache.
///
/// Compilers sharing a cache only see each other's outputs when they
/// evaluate with the same evaluator: every [`Compiler::with_evaluator`] call
/// moves the compiler into a cache namespace of its own.
pub struct Compiler {
    options: Options,
    evaluator: Box<dyn Evaluator + Send + Sync>,
    namespace: u64,
    cache: Option<Arc<OutputCache>>,
}

impl Compiler {
    /// A compiler using [`LiteralEvaluator`]. When `options.cache` is set it
    /// gets a cache of its own.
    pub fn new(options: Options) -> Self {
        let cache = options.cache.then(|| Arc::new(OutputCache::new()));
        Self {
            options,
            evaluator: Box::new(LiteralEvaluator),
            namespace: LITERAL_NAMESPACE,
            cache,
        }
    }

    pub fn with_evaluator(mut self, evaluator: impl Evaluator + Send + Sync + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self.namespace = NEXT_NAMESPACE.fetch_add(1, Ordering::Relaxed);
        self
    }

    /// Use `cache`, possibly shared with other compilers, instead of the
    /// compiler's own. Ignored when `options.cache` is off.
    pub fn with_cache(mut self, cache: Arc<OutputCache>) -> Self {
        if self.options.cache {
            self.cache = Some(cache);
        }
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn cache(&self) -> Option<&Arc<OutputCache>> {
        self.cache.as_ref()
    }

    /// Compile `source`, returning the cached output when there is one.
    pub fn compile(&self, source: &str) -> Result<Arc<CompilerOutput>, CodegenError> {
        let Some(cache) = &self.cache else {
            return self.compile_uncached(source).map(Arc::new);
        };

        let key = OutputCache::key(self.namespace, self.options.target, source);
        if let Some(output) = cache.get(key) {
            tracing::debug!(key, "cache hit");
            return Ok(output);
        }

        tracing::debug!(key, "cache miss");
        let output = Arc::new(self.compile_uncached(source)?);
        cache.insert(key, Arc::clone(&output));
        Ok(output)
    }

    fn compile_uncached(&self, source: &str) -> Result<CompilerOutput, CodegenError> {
        let mut target = self.options.target.create();
        compile_with(source, target.as_mut(), &*self.evaluator)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(Options::default())
    }
}
