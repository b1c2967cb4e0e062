//! PyO3 wrapper for the analyzer
//!
//! Exposes a synchronous `Analyzer` to Python. Requests and results cross
//! the boundary as JSON strings.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::sync::Arc;

use crate::config::AnalyzerSettings;
use crate::pipeline::{AnalysisError, Analyzer as RustAnalyzer};
use crate::policy::{PolicySnapshot, PolicyStore};
use crate::screening::WatchlistScreener;
use crate::store::InMemoryResultStore;

/// Python wrapper for the risk analyzer
///
/// # Example (from Python)
///
/// ```python
/// from cryptopix_risk_core import Analyzer
///
/// analyzer = Analyzer(open("policy.json").read(), open("watchlist.json").read())
/// result = json.loads(analyzer.analyze(request_json))
/// print(result["suggested_action"], result["message"])
/// ```
#[pyclass(name = "Analyzer")]
pub struct PyAnalyzer {
    inner: RustAnalyzer,
    runtime: tokio::runtime::Runtime,
}

#[pymethods]
impl PyAnalyzer {
    /// Build an analyzer from policy and watchlist JSON
    ///
    /// Settings come from the `CRYPTOPIX_*` environment variables. Results
    /// are kept in memory for the lifetime of the object.
    ///
    /// # Errors
    ///
    /// Raises ValueError if the policy, watchlist or settings are invalid.
    #[new]
    fn new(policy_json: &str, watchlist_json: &str) -> PyResult<Self> {
        let loaded = PolicySnapshot::from_json(policy_json)
            .map_err(|e| PyErr::new::<PyValueError, _>(format!("Invalid policy: {}", e)))?;
        let screener = WatchlistScreener::from_json(watchlist_json)
            .map_err(|e| PyErr::new::<PyValueError, _>(format!("Invalid watchlist: {}", e)))?;
        let settings = AnalyzerSettings::from_env()
            .map_err(|e| PyErr::new::<PyValueError, _>(format!("Invalid settings: {}", e)))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_time()
            .build()
            .map_err(|e| PyErr::new::<PyRuntimeError, _>(format!("Failed to start runtime: {}", e)))?;

        let inner = RustAnalyzer::new(
            Arc::new(screener),
            Arc::new(PolicyStore::new(loaded.snapshot)),
            Arc::new(InMemoryResultStore::new()),
            settings,
        );

        Ok(PyAnalyzer { inner, runtime })
    }

    /// Analyze one transaction request
    ///
    /// # Returns
    ///
    /// The analysis result as a JSON string
    ///
    /// # Errors
    ///
    /// Raises ValueError for an invalid request, RuntimeError if screening
    /// is unavailable (retry the request).
    fn analyze(&self, py: Python<'_>, request_json: &str) -> PyResult<String> {
        let outcome = py
            .allow_threads(|| self.runtime.block_on(self.inner.analyze_json(request_json)))
            .map_err(|e| match e {
                AnalysisError::Validation(_) => PyErr::new::<PyValueError, _>(e.to_string()),
                AnalysisError::UpstreamUnavailable(_) => PyErr::new::<PyRuntimeError, _>(e.to_string()),
            })?;

        serde_json::to_string(&outcome.result)
            .map_err(|e| PyErr::new::<PyRuntimeError, _>(format!("Failed to encode result: {}", e)))
    }

    /// Fingerprint of the policy currently loaded
    fn policy_fingerprint(&self) -> String {
        self.inner.policies().snapshot().fingerprint()
    }
}
