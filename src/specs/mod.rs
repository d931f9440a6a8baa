// The output configuration of a project is stored in an <Outputs> block:
//
// <Outputs timeUnit="h" flushInterval="30 s" cacheLimit="10485760">
//   <Grids>
//     <OutputGrid name="hourly">
//       <Interval start="0 d" end="365 d" stepSize="1 h"/>
//     </OutputGrid>
//   </Grids>
//   <ObjectLists>
//     <ObjectList name="All zones" referenceType="Zone" ids="*"/>
//   </ObjectLists>
//   <Definitions>
//     <OutputDefinition quantity="AirTemperature" gridName="hourly"
//                       objectListName="All zones" timeType="None"/>
//   </Definitions>
// </Outputs>
//
// ·         timeUnit:  unit of the time column (default: h)
// ·         flushInterval:  maximum wall-clock delay between file writes (default: 30 s)
// ·         cacheLimit:  flush once all cached rows together exceed this many bytes (default: 10 MiB)
// ·         Interval:  start, end and stepSize are all OPTIONAL, see the schedule module
// ·         ObjectList:  ids is an id group ("*", "1,4", "1-10"); filterKind is OPTIONAL
// ·         OutputDefinition:  timeType is one of None, Mean, Integral (default: None); fileName is OPTIONAL

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    errors::{ErrorContext, OutputError},
    filter::EntityFilter,
    output::FlushPolicy,
    request::Request,
    schedule::Schedule,
    units::Parameter,
};

fn default_time_unit() -> String {
    "h".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grids {
    #[serde(rename = "OutputGrid", default)]
    pub items: Vec<Schedule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectLists {
    #[serde(rename = "ObjectList", default)]
    pub items: Vec<EntityFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definitions {
    #[serde(rename = "OutputDefinition", default)]
    pub items: Vec<Request>,
}

/// Everything the output engine is configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Outputs")]
pub struct OutputSpec {
    /// Unit of the time column of all output files.
    #[serde(rename = "@timeUnit", default = "default_time_unit")]
    pub time_unit: String,
    #[serde(rename = "@flushInterval", default, skip_serializing_if = "Option::is_none")]
    pub flush_interval: Option<Parameter>,
    /// In bytes.
    #[serde(rename = "@cacheLimit", default, skip_serializing_if = "Option::is_none")]
    pub cache_limit: Option<usize>,
    #[serde(rename = "Grids", default)]
    pub grids: Grids,
    #[serde(rename = "ObjectLists", default)]
    pub object_lists: ObjectLists,
    #[serde(rename = "Definitions", default)]
    pub definitions: Definitions,
}

impl Default for OutputSpec {
    fn default() -> Self {
        OutputSpec {
            time_unit: default_time_unit(),
            flush_interval: None,
            cache_limit: None,
            grids: Grids::default(),
            object_lists: ObjectLists::default(),
            definitions: Definitions::default(),
        }
    }
}

impl OutputSpec {
    pub fn new<S: Into<String>>(time_unit: S) -> Self {
        OutputSpec {
            time_unit: time_unit.into(),
            ..Default::default()
        }
    }

    pub fn with_grid(mut self, grid: Schedule) -> Self {
        self.grids.items.push(grid);
        self
    }

    pub fn with_object_list(mut self, filter: EntityFilter) -> Self {
        self.object_lists.items.push(filter);
        self
    }

    pub fn with_definition(mut self, request: Request) -> Self {
        self.definitions.items.push(request);
        self
    }

    /// Parses an `<Outputs>` document.
    pub fn from_xml_str(xml: &str) -> Result<OutputSpec, OutputError> {
        quick_xml::de::from_str(xml).map_err(|e| OutputError::Config {
            message: e.to_string(),
            context: ErrorContext::new().with_parsing("<Outputs>"),
        })
    }

    /// Reads and parses an `<Outputs>` document from a file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<OutputSpec, OutputError> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path).map_err(|e| OutputError::io(path, e))?;
        quick_xml::de::from_str(&xml).map_err(|e| OutputError::Config {
            message: e.to_string(),
            context: ErrorContext::with_file_path(path),
        })
    }

    /// The flush policy, with defaults for unset values.
    pub fn flush_policy(&self) -> Result<FlushPolicy, OutputError> {
        let mut policy = FlushPolicy::default();
        if let Some(interval) = self.flush_interval {
            let seconds = interval.value_in_base();
            if !interval.unit.is_time() || !seconds.is_finite() || seconds < 0.0 {
                return Err(OutputError::Config {
                    message: format!("Invalid flush interval '{}'", interval),
                    context: ErrorContext::new(),
                });
            }
            policy.max_delay = Duration::from_secs_f64(seconds);
        }
        if let Some(limit) = self.cache_limit {
            policy.max_cache_bytes = limit;
        }
        Ok(policy)
    }
}
