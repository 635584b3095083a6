//! Named Python capabilities made available to generated code.
//!
//! The registry is a fixed table built once at startup. Core entries are
//! always imported; optional entries are probed against the interpreter and
//! dropped when their module cannot be imported. The registry renders the
//! prelude that every execution runs before the generated code.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::errors::{AppError, AppResult};

/// Environment variables carrying per-run injected values.
pub const ENV_STUDENT_EMAIL: &str = "QUIZ_SOLVER_STUDENT_EMAIL";
pub const ENV_STUDENT_SECRET: &str = "QUIZ_SOLVER_STUDENT_SECRET";
pub const ENV_QUIZ_URL: &str = "QUIZ_SOLVER_QUIZ_URL";

/// Marker the prelude writes to stderr before an exception summary.
pub const ERROR_MARKER: &str = "__SOLUTION_ERROR__";

const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    /// Name bound in the execution namespace.
    pub alias: &'static str,
    /// Module to import.
    pub module: &'static str,
    /// Attribute taken from the module instead of the module itself.
    pub attribute: Option<&'static str>,
    pub optional: bool,
}

impl Capability {
    const fn core(alias: &'static str, module: &'static str) -> Self {
        Self {
            alias,
            module,
            attribute: None,
            optional: false,
        }
    }

    const fn optional(alias: &'static str, module: &'static str) -> Self {
        Self {
            alias,
            module,
            attribute: None,
            optional: true,
        }
    }

    const fn optional_attr(
        alias: &'static str,
        module: &'static str,
        attribute: &'static str,
    ) -> Self {
        Self {
            alias,
            module,
            attribute: Some(attribute),
            optional: true,
        }
    }

    fn import_expr(&self) -> String {
        match self.attribute {
            Some(attr) => format!("getattr(importlib.import_module({:?}), {:?})", self.module, attr),
            None => format!("importlib.import_module({:?})", self.module),
        }
    }
}

const DEFAULT_CAPABILITIES: &[Capability] = &[
    // Standard library
    Capability::core("json", "json"),
    Capability::core("csv", "csv"),
    Capability::core("base64", "base64"),
    Capability::core("re", "re"),
    Capability::core("io", "io"),
    // Data processing and networking
    Capability::optional("requests", "requests"),
    Capability::optional("pd", "pandas"),
    Capability::optional("pandas", "pandas"),
    Capability::optional("np", "numpy"),
    Capability::optional("numpy", "numpy"),
    Capability::optional_attr("BeautifulSoup", "bs4", "BeautifulSoup"),
    // Documents
    Capability::optional("PyPDF2", "PyPDF2"),
    Capability::optional("pdfplumber", "pdfplumber"),
    Capability::optional("openpyxl", "openpyxl"),
    Capability::optional_attr("Document", "docx", "Document"),
    Capability::optional_attr("Presentation", "pptx", "Presentation"),
    // Images
    Capability::optional("Image", "PIL.Image"),
    Capability::optional("PIL", "PIL"),
    Capability::optional("cv2", "cv2"),
    // Visualization
    Capability::optional("matplotlib", "matplotlib"),
    Capability::optional("plt", "matplotlib.pyplot"),
    Capability::optional("sns", "seaborn"),
    Capability::optional("seaborn", "seaborn"),
    Capability::optional("plotly", "plotly"),
    Capability::optional("go", "plotly.graph_objects"),
    // Analysis
    Capability::optional("stats", "scipy.stats"),
    Capability::optional("scipy", "scipy"),
    Capability::optional("nx", "networkx"),
    Capability::optional("gpd", "geopandas"),
    // Browser automation
    Capability::optional("webdriver", "selenium.webdriver"),
    Capability::optional_attr("By", "selenium.webdriver.common.by", "By"),
    Capability::optional_attr("WebDriverWait", "selenium.webdriver.support.ui", "WebDriverWait"),
    Capability::optional("EC", "selenium.webdriver.support.expected_conditions"),
    Capability::optional_attr("ChromeOptions", "selenium.webdriver.chrome.options", "Options"),
    Capability::optional_attr("sync_playwright", "playwright.sync_api", "sync_playwright"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityRegistry {
    entries: Vec<Capability>,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self {
            entries: DEFAULT_CAPABILITIES.to_vec(),
        }
    }
}

impl CapabilityRegistry {
    pub fn new(entries: Vec<Capability>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Capability] {
        &self.entries
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.iter().any(|c| c.alias == alias)
    }

    /// Drops optional entries whose alias is listed as unavailable.
    pub fn without_unavailable(mut self, unavailable: &[String]) -> Self {
        self.entries
            .retain(|c| !(c.optional && unavailable.iter().any(|u| u == c.alias)));
        self
    }

    /// Asks the interpreter which optional entries cannot be imported and
    /// returns a registry without them.
    pub async fn probe(self, python_cmd: &str) -> AppResult<Self> {
        let mut script = String::from("import importlib, json\nmissing = []\n");
        for cap in self.entries.iter().filter(|c| c.optional) {
            script.push_str(&format!(
                "try:\n    {}\nexcept Exception:\n    missing.append({:?})\n",
                cap.import_expr(),
                cap.alias
            ));
        }
        script.push_str("print(json.dumps(missing))\n");

        let child = Command::new(python_cmd)
            .arg("-c")
            .arg(&script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AppError::ExecutionError(format!("Failed to start '{}': {}", python_cmd, e))
            })?;

        let output = tokio::time::timeout(PROBE_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| AppError::ExecutionError("Capability probe timed out".to_string()))?
            .map_err(|e| AppError::ExecutionError(format!("Capability probe failed: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let missing: Vec<String> = stdout
            .lines()
            .rev()
            .find_map(|line| serde_json::from_str(line.trim()).ok())
            .ok_or_else(|| {
                AppError::ExecutionError(format!(
                    "Capability probe produced no result: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ))
            })?;

        for alias in &missing {
            log::warn!("Optional capability '{}' is unavailable and will be omitted", alias);
        }
        let registry = self.without_unavailable(&missing);
        log::info!(
            "Execution environment ready with {} capabilities",
            registry.entries.len()
        );
        Ok(registry)
    }

    /// Python source that builds the namespace, injects per-run values from
    /// the environment, and executes the solution read from stdin.
    pub fn render_prelude(&self) -> String {
        let mut src = String::from(
            "import importlib, os, sys, traceback\n\
             _namespace = {'__name__': '__main__', '__builtins__': __builtins__}\n",
        );

        for cap in &self.entries {
            if cap.optional {
                src.push_str(&format!(
                    "try:\n    _namespace[{:?}] = {}\nexcept Exception:\n    pass\n",
                    cap.alias,
                    cap.import_expr()
                ));
            } else {
                src.push_str(&format!(
                    "_namespace[{:?}] = {}\n",
                    cap.alias,
                    cap.import_expr()
                ));
            }
        }
        if self.contains("matplotlib") {
            src.push_str(
                "try:\n    _namespace['matplotlib'].use('Agg')\nexcept Exception:\n    pass\n",
            );
        }

        src.push_str(&format!(
            "_namespace['STUDENT_EMAIL'] = os.environ.get({:?}, '')\n\
             _namespace['STUDENT_SECRET'] = os.environ.get({:?}, '')\n\
             _namespace['QUIZ_URL'] = os.environ.get({:?}, '')\n",
            ENV_STUDENT_EMAIL, ENV_STUDENT_SECRET, ENV_QUIZ_URL
        ));

        src.push_str(&format!(
            "_source = sys.stdin.read()\n\
             try:\n    exec(compile(_source, '<solution>', 'exec'), _namespace)\n\
             except Exception as _exc:\n    \
             sys.stdout.flush()\n    \
             sys.stderr.write('{marker} %s: %s\\n' % (type(_exc).__name__, _exc))\n    \
             traceback.print_exc()\n    \
             sys.exit(1)\n",
            marker = ERROR_MARKER
        ));
        src
    }
}
