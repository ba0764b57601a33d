use rayon::prelude::*;

use crate::document::doc::Document;
use crate::foundation::error::{StrataError, StrataResult};
use crate::render::composite::{RenderOptions, RenderOutput, render_document};

/// Caller-side parallelism for rendering many documents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderThreading {
    /// Render on a worker pool instead of the calling thread.
    pub parallel: bool,
    /// Worker count for the dedicated pool; `None` lets rayon decide.
    pub threads: Option<usize>,
}

/// Render independent documents, optionally in parallel.
///
/// Each document is rendered exactly as [`render_document`] would; output order matches input
/// order.
#[tracing::instrument(skip(docs, opts), fields(documents = docs.len()))]
pub fn render_documents(
    docs: &[Document],
    opts: &RenderOptions,
    threading: &RenderThreading,
) -> StrataResult<Vec<RenderOutput>> {
    if !threading.parallel {
        return Ok(docs.iter().map(|d| render_document(d, opts)).collect());
    }

    let pool = build_thread_pool(threading.threads)?;
    Ok(pool.install(|| {
        docs.par_iter()
            .map(|d| render_document(d, opts))
            .collect::<Vec<_>>()
    }))
}

fn build_thread_pool(threads: Option<usize>) -> StrataResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(StrataError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| StrataError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/batch.rs"]
mod tests;
