//! Per-session assembly of every test case's generated configuration.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::capabilities::CapabilityStore;
use crate::error::Result;
use crate::generator::{self, GenContext, GenType, ParamSet, skip_marker};
use crate::regulatory::RegulatoryValidator;
use crate::template::{TemplateSet, TestTemplate};

/// Generated configuration: test-case name to ordered parameter sets.
pub type TestConfigs = BTreeMap<String, Vec<ParamSet>>;

/// Key carried by the marker row of a test case that failed to generate.
pub const CONFIG_ERROR_KEY: &str = "config_error";

/// Runs the generators over a loaded template set.
///
/// Pure with respect to its inputs: the template set and rule table are
/// read-only, capability snapshots are passed per call.
#[derive(Debug, Clone)]
pub struct ConfigAssembler {
    templates: TemplateSet,
    regulatory: RegulatoryValidator,
    gen_type: GenType,
    tests: Option<Vec<String>>,
}

impl ConfigAssembler {
    pub fn new(templates: TemplateSet, regulatory: RegulatoryValidator) -> Self {
        ConfigAssembler {
            templates,
            regulatory,
            gen_type: GenType::default(),
            tests: None,
        }
    }

    pub fn with_gen_type(mut self, gen_type: GenType) -> Self {
        self.gen_type = gen_type;
        self
    }

    /// Restrict generation to the named test cases.
    pub fn with_tests(mut self, tests: Vec<String>) -> Self {
        self.tests = Some(tests);
        self
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Generate every selected test case.
    ///
    /// A test case whose template or role data is malformed becomes a single
    /// marker row carrying the error and a skip. Missing rule or capability
    /// data aborts the whole run.
    pub fn get_test_configs(&self, dut: &CapabilityStore, reference: &CapabilityStore) -> Result<TestConfigs> {
        let ctx = GenContext::new(dut, reference, &self.regulatory, self.gen_type)?;
        let mut configs = TestConfigs::new();
        for name in self.templates.names() {
            if let Some(tests) = &self.tests
                && !tests.iter().any(|t| t == name)
            {
                continue;
            }
            let Some(record) = self.templates.get(name) else {
                continue;
            };
            let rows = match generate_case(&ctx, name, record) {
                Ok(rows) => rows,
                Err(e) if !e.is_fatal() => {
                    log::error!("{name}: {e}");
                    vec![error_marker(&e.to_string())]
                }
                Err(e) => return Err(e),
            };
            log::debug!("{name}: {} configuration(s)", rows.len());
            configs.insert(name.to_string(), rows);
        }
        Ok(configs)
    }
}

/// Parse and generate one test case.
pub fn generate_case(ctx: &GenContext<'_>, name: &str, record: &Value) -> Result<Vec<ParamSet>> {
    let template = TestTemplate::parse(name, record)?;
    if let Some(msg) = template.whole_case_ignore() {
        log::debug!("{name}: ignored: {msg}");
        return Ok(vec![skip_marker(&msg)]);
    }
    generator::generate(ctx, &template)
}

/// Marker row for a test case that failed to generate.
pub fn error_marker(msg: &str) -> ParamSet {
    let mut row = skip_marker(msg);
    row.insert(CONFIG_ERROR_KEY.to_string(), Value::String(msg.to_string()));
    row
}
