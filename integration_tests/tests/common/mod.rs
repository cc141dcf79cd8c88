#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use source_tracking::{CellId, FlowNetwork, Label, Routing};

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkFixture {
    pub description: String,
    pub receivers: Vec<CellId>,
    #[serde(default)]
    pub core: Option<Vec<bool>>,
    pub labels: Vec<i64>,
    #[serde(default)]
    pub expected: Expectations,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Expectations {
    pub hsd_upstr: BTreeMap<CellId, Vec<Label>>,
    pub flow_accum: BTreeMap<CellId, u32>,
    pub sorted_fractions: BTreeMap<CellId, Vec<f64>>,
}

impl NetworkFixture {
    pub fn network(&self) -> FlowNetwork {
        let network = FlowNetwork::new(Routing::Single(self.receivers.clone()));
        match &self.core {
            Some(core) => network.with_core_mask(core.clone()),
            None => network,
        }
    }
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn load_fixture(name: &str) -> Result<NetworkFixture> {
    let path = fixture_path(name);
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("reading fixture {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing fixture {}", path.display()))
}
