//! Boolean path operations through an external geometry kernel.
//!
//! The kernel is loaded lazily on first use. A failed load is logged and
//! retried on the next call; every failure surfaces as `None` so callers
//! leave their state untouched. One operation per tool/asset/content key
//! may be in flight at a time; a duplicate request resolves to `None`
//! immediately.

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use vs_core::AssetId;
use vs_core::path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    Union,
    Subtract,
    Intersect,
    Exclude,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BooleanOp::Union => "union",
            BooleanOp::Subtract => "subtract",
            BooleanOp::Intersect => "intersect",
            BooleanOp::Exclude => "exclude",
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("geometry kernel failed to load: {0}")]
    Load(String),
    #[error("path data is empty or invalid")]
    InvalidPath,
    #[error("{op} failed: {reason}")]
    Operation { op: BooleanOp, reason: String },
}

/// A 2D geometry kernel working on path data strings.
pub trait GeometryKernel: Send + Sync {
    fn unite(&self, a: &str, b: &str) -> Result<String, KernelError>;
    fn subtract(&self, a: &str, b: &str) -> Result<String, KernelError>;
    fn intersect(&self, a: &str, b: &str) -> Result<String, KernelError>;
    fn exclude(&self, a: &str, b: &str) -> Result<String, KernelError>;

    fn apply(&self, a: &str, b: &str, op: BooleanOp) -> Result<String, KernelError> {
        match op {
            BooleanOp::Union => self.unite(a, b),
            BooleanOp::Subtract => self.subtract(a, b),
            BooleanOp::Intersect => self.intersect(a, b),
            BooleanOp::Exclude => self.exclude(a, b),
        }
    }
}

/// Produces the kernel (script load, dynamic library, remote service…).
pub trait KernelLoader: Send + Sync {
    fn load(&self) -> impl Future<Output = Result<Arc<dyn GeometryKernel>, KernelError>> + Send;
}

/// Dedup key for an in-flight operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    pub tool: String,
    pub asset: AssetId,
    pub content_hash: u64,
}

impl OperationKey {
    pub fn new(tool: &str, asset: AssetId, content: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Self {
            tool: tool.to_string(),
            asset,
            content_hash: hasher.finish(),
        }
    }
}

/// Removes its key from the in-flight set when the operation ends or its
/// future is dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<OperationKey>>,
    key: OperationKey,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

pub struct BooleanBridge<L> {
    loader: L,
    kernel: OnceCell<Arc<dyn GeometryKernel>>,
    in_flight: Mutex<HashSet<OperationKey>>,
}

impl<L: KernelLoader> BooleanBridge<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            kernel: OnceCell::new(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.kernel.initialized()
    }

    pub fn is_in_flight(&self, key: &OperationKey) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    async fn kernel(&self) -> Option<Arc<dyn GeometryKernel>> {
        match self.kernel.get_or_try_init(|| self.loader.load()).await {
            Ok(kernel) => Some(Arc::clone(kernel)),
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }

    /// Combine two paths. `None` if the kernel is unavailable, either path
    /// is empty, or the kernel rejects the operation.
    pub async fn perform_boolean_operation(&self, a: &str, b: &str, op: BooleanOp) -> Option<String> {
        if path::parse(a).is_empty() || path::parse(b).is_empty() {
            log::warn!("{op}: {}", KernelError::InvalidPath);
            return None;
        }
        let kernel = self.kernel().await?;
        match kernel.apply(a, b, op) {
            Ok(result) => {
                log::debug!("{op} produced {} bytes of path data", result.len());
                Some(result)
            }
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }

    /// Left-fold `op` across `paths`: `((p0 op p1) op p2) …`. Stops at the
    /// first failing step. A single path is returned unchanged.
    pub async fn perform_boolean_operation_multiple(&self, paths: &[&str], op: BooleanOp) -> Option<String> {
        let (first, rest) = paths.split_first()?;
        let mut acc = (*first).to_string();
        for next in rest {
            acc = self.perform_boolean_operation(&acc, next, op).await?;
        }
        Some(acc)
    }

    /// Combine the first two `<path d>` elements of an SVG document. The
    /// first path receives the result and the second is removed; any
    /// further paths are left alone. `None` leaves the markup unchanged.
    pub async fn apply_to_svg(&self, tool: &str, asset: AssetId, svg: &str, op: BooleanOp) -> Option<String> {
        let key = OperationKey::new(tool, asset, svg);
        let _guard = {
            let mut set = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if !set.insert(key.clone()) {
                log::debug!("{op} on {asset} already in flight");
                return None;
            }
            InFlight {
                set: &self.in_flight,
                key,
            }
        };

        let targets = first_two_paths(svg)?;
        let result = self
            .perform_boolean_operation(&targets.first_d, &targets.second_d, op)
            .await?;

        let mut out = String::with_capacity(svg.len());
        out.push_str(&svg[..targets.first_value.start]);
        out.push_str(&result);
        out.push_str(&svg[targets.first_value.end..targets.second_element.start]);
        out.push_str(&svg[targets.second_element.end..]);
        Some(out)
    }
}

/// Byte ranges of the two operands inside the source markup.
struct PathTargets {
    first_d: String,
    first_value: std::ops::Range<usize>,
    second_d: String,
    second_element: std::ops::Range<usize>,
}

fn first_two_paths(svg: &str) -> Option<PathTargets> {
    let doc = match roxmltree::Document::parse(svg) {
        Ok(doc) => doc,
        Err(err) => {
            log::warn!("cannot read SVG for boolean operation: {err}");
            return None;
        }
    };
    let mut paths = doc
        .descendants()
        .filter(|n| n.has_tag_name("path"))
        .filter_map(|n| n.attributes().find(|a| a.name() == "d").map(|d| (n, d)));

    let (_, first) = paths.next()?;
    let Some((second_node, second)) = paths.next() else {
        log::warn!("boolean operation needs two paths");
        return None;
    };
    Some(PathTargets {
        first_d: first.value().to_string(),
        first_value: first.range_value(),
        second_d: second.value().to_string(),
        second_element: second_node.range(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Joins operands so results are easy to assert on.
    struct Concat;

    impl GeometryKernel for Concat {
        fn unite(&self, a: &str, b: &str) -> Result<String, KernelError> {
            Ok(format!("{a} {b}"))
        }
        fn subtract(&self, a: &str, _b: &str) -> Result<String, KernelError> {
            Ok(a.to_string())
        }
        fn intersect(&self, _a: &str, _b: &str) -> Result<String, KernelError> {
            Err(KernelError::Operation {
                op: BooleanOp::Intersect,
                reason: "disjoint".into(),
            })
        }
        fn exclude(&self, _a: &str, b: &str) -> Result<String, KernelError> {
            Ok(b.to_string())
        }
    }

    /// Fails the first `failures` loads, then succeeds.
    struct Flaky {
        failures: usize,
        attempts: AtomicUsize,
    }

    impl KernelLoader for Flaky {
        async fn load(&self) -> Result<Arc<dyn GeometryKernel>, KernelError> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if n < self.failures {
                Err(KernelError::Load("script blocked".into()))
            } else {
                Ok(Arc::new(Concat))
            }
        }
    }

    fn bridge(failures: usize) -> BooleanBridge<Flaky> {
        BooleanBridge::new(Flaky {
            failures,
            attempts: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn unite_two_paths() {
        let b = bridge(0);
        let out = b.perform_boolean_operation("M0 0L1 1", "M2 2L3 3", BooleanOp::Union).await;
        assert_eq!(out.as_deref(), Some("M0 0L1 1 M2 2L3 3"));
        assert!(b.is_loaded());
    }

    #[tokio::test]
    async fn kernel_failure_is_none() {
        let b = bridge(0);
        assert_eq!(b.perform_boolean_operation("M0 0L1 1", "M2 2L3 3", BooleanOp::Intersect).await, None);
        assert_eq!(b.perform_boolean_operation("", "M2 2L3 3", BooleanOp::Union).await, None);
    }

    #[tokio::test]
    async fn load_is_retried_after_failure() {
        let b = bridge(1);
        assert_eq!(b.perform_boolean_operation("M0 0L1 1", "M2 2L3 3", BooleanOp::Subtract).await, None);
        assert!(!b.is_loaded());
        let out = b.perform_boolean_operation("M0 0L1 1", "M2 2L3 3", BooleanOp::Subtract).await;
        assert_eq!(out.as_deref(), Some("M0 0L1 1"));
        assert_eq!(b.loader.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn multiple_left_folds_and_short_circuits() {
        let b = bridge(0);
        let out = b
            .perform_boolean_operation_multiple(&["M0 0L1 0", "M0 1L1 1", "M0 2L1 2"], BooleanOp::Union)
            .await;
        assert_eq!(out.as_deref(), Some("M0 0L1 0 M0 1L1 1 M0 2L1 2"));

        let out = b
            .perform_boolean_operation_multiple(&["M0 0L1 0", "M0 1L1 1", "M0 2L1 2"], BooleanOp::Intersect)
            .await;
        assert_eq!(out, None);
        assert_eq!(b.perform_boolean_operation_multiple(&[], BooleanOp::Union).await, None);
        assert_eq!(
            b.perform_boolean_operation_multiple(&["M0 0L1 0"], BooleanOp::Union).await.as_deref(),
            Some("M0 0L1 0")
        );
    }

    #[tokio::test]
    async fn svg_rewrite_replaces_first_and_drops_second() {
        let b = bridge(0);
        let svg = r#"<svg><path id="a" d="M0 0L1 1"/><path d="M2 2L3 3"/><path d="M9 9L8 8"/></svg>"#;
        let out = b
            .apply_to_svg("boolean", AssetId::intern("bool_svg"), svg, BooleanOp::Exclude)
            .await;
        assert_eq!(
            out.as_deref(),
            Some(r#"<svg><path id="a" d="M2 2L3 3"/><path d="M9 9L8 8"/></svg>"#)
        );
    }

    #[tokio::test]
    async fn svg_with_one_path_is_none() {
        let b = bridge(0);
        let svg = r#"<svg><path d="M0 0L1 1"/></svg>"#;
        assert_eq!(b.apply_to_svg("boolean", AssetId::intern("bool_one"), svg, BooleanOp::Union).await, None);
    }

    #[tokio::test]
    async fn duplicate_request_is_dropped_while_in_flight() {
        let b = bridge(0);
        let svg = r#"<svg><path d="M0 0L1 1"/><path d="M2 2L3 3"/></svg>"#;
        let asset = AssetId::intern("bool_dedup");
        let (first, second) = tokio::join!(
            b.apply_to_svg("boolean", asset, svg, BooleanOp::Union),
            b.apply_to_svg("boolean", asset, svg, BooleanOp::Union),
        );
        assert!(first.is_some());
        assert_eq!(second, None);
        assert!(!b.is_in_flight(&OperationKey::new("boolean", asset, svg)));
    }
}
