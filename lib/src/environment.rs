//! Environment setting loader: constraint flags and the processor scenarios
//! the simulation sweeps over.

use std::fs;

use roxmltree::{Document, Node};

use crate::error::{Error, Result};
use crate::processor::Processor;

/// Parsed environment setting. Each `<scenario>` element yields one list of
/// processors; the `<constraint>` element carries the global flags.
pub struct EnvironmentSetting {
    pub has_port_constraint: bool,
    pub add_pseudo_task: bool,
    pub use_mock_data: bool,
    pub scenarios: Vec<Vec<Processor>>,
}

impl EnvironmentSetting {
    pub fn load(environment_setting_path: &str) -> Result<Self> {
        let content = fs::read_to_string(environment_setting_path).map_err(|error| {
            Error::EnvironmentParse(format!("{}: {}", environment_setting_path, error))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let document = Document::parse(content)
            .map_err(|error| Error::EnvironmentParse(error.to_string()))?;

        let mut has_port_constraint = false;
        let mut add_pseudo_task = false;
        let mut use_mock_data = false;
        let mut scenarios = Vec::new();

        for element in document.root_element().children().filter(Node::is_element) {
            match element.tag_name().name() {
                "constraint" => {
                    has_port_constraint = element.attribute("portConstraint") == Some("true");
                    add_pseudo_task = element.attribute("pseudoTask") == Some("true");
                    use_mock_data = element.attribute("mockData") == Some("true");
                }
                "scenario" => {
                    let mut processors = Vec::new();
                    for device in element.children().filter(Node::is_element) {
                        let device_name = device.attribute("name").ok_or_else(|| {
                            Error::EnvironmentParse(
                                "device element is missing the name attribute".to_string(),
                            )
                        })?;
                        for (index, specification) in
                            device.children().filter(Node::is_element).enumerate()
                        {
                            let mips = numeric_attribute(&specification, "mips")?;
                            let bandwidth = numeric_attribute(&specification, "bandwidth")?;
                            let cost_per_mips = numeric_attribute(&specification, "cost")?;
                            processors.push(Processor::new(
                                processors.len(),
                                format!("{}-{}", device_name, index),
                                mips,
                                bandwidth,
                                cost_per_mips,
                            ));
                        }
                    }
                    if processors.is_empty() {
                        return Err(Error::EnvironmentParse(
                            "scenario contains no processors".to_string(),
                        ));
                    }
                    scenarios.push(processors);
                }
                _ => {}
            }
        }

        Ok(Self {
            has_port_constraint,
            add_pseudo_task,
            use_mock_data,
            scenarios,
        })
    }
}

fn numeric_attribute(node: &Node<'_, '_>, name: &str) -> Result<f64> {
    let value = node.attribute(name).ok_or_else(|| {
        Error::EnvironmentParse(format!("missing {} attribute on {}", name, node.tag_name().name()))
    })?;
    value.parse().map_err(|_| {
        Error::EnvironmentParse(format!("non-numeric {} attribute: {}", name, value))
    })
}
