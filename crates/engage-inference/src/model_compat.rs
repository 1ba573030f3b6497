//! Keras model config compatibility fixes.
//!
//! Models saved by older Keras versions carry config fields newer loaders
//! reject: `BatchNormalization.axis` stored as a list, and the removed
//! `LSTM.time_major` flag. [`fix_keras_config`] rewrites both in place so the
//! model can be re-exported.

use serde_json::Value;

/// A `BatchNormalization` axis rewritten from a list to a scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisFix {
    pub layer: String,
    pub from: Value,
    pub to: Value,
}

/// Changes made by [`fix_keras_config`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompatReport {
    pub batch_norm_axes: Vec<AxisFix>,
    /// Names of LSTM layers `time_major` was removed from
    pub lstm_time_major: Vec<String>,
}

impl CompatReport {
    pub fn is_empty(&self) -> bool {
        self.batch_norm_axes.is_empty() && self.lstm_time_major.is_empty()
    }

    pub fn total(&self) -> usize {
        self.batch_norm_axes.len() + self.lstm_time_major.len()
    }
}

/// Recursively fix every layer config found under `config`.
pub fn fix_keras_config(config: &mut Value) -> CompatReport {
    let mut report = CompatReport::default();
    visit(config, &mut report);
    report
}

fn visit(value: &mut Value, report: &mut CompatReport) {
    match value {
        Value::Object(obj) => {
            let class_name = obj.get("class_name").and_then(Value::as_str).map(str::to_owned);

            if let Some(layer_config) = obj.get_mut("config").and_then(Value::as_object_mut) {
                let layer = layer_config
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("unnamed")
                    .to_string();

                match class_name.as_deref() {
                    Some("BatchNormalization") => {
                        let axes = match layer_config.get("axis") {
                            Some(Value::Array(axes)) => Some(axes.clone()),
                            _ => None,
                        };
                        if let Some(axes) = axes {
                            let to = axes.first().cloned().unwrap_or_else(|| Value::from(-1));
                            let from = Value::Array(axes);
                            layer_config.insert("axis".to_string(), to.clone());
                            report.batch_norm_axes.push(AxisFix { layer, from, to });
                        }
                    }
                    Some("LSTM") => {
                        if layer_config.remove("time_major").is_some() {
                            report.lstm_time_major.push(layer);
                        }
                    }
                    _ => {}
                }
            }

            for child in obj.values_mut() {
                visit(child, report);
            }
        }
        Value::Array(items) => {
            for item in items {
                visit(item, report);
            }
        }
        _ => {}
    }
}
