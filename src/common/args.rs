use crate::common::{
    bindings::MethodSet,
    error::{Error, Result},
};

use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::Value;

/// Positional arguments of one method call, already checked against the method's arity.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Args<'a> {
    values: &'a [Value],
}

impl<'a> Args<'a> {
    /// Check the argument count against `min..=max` before any work is done.
    pub(crate) fn new(
        values: &'a [Value],
        (min, max): (usize, usize),
        usage: &'static str,
    ) -> Result<Self> {
        if values.len() < min || values.len() > max {
            return Err(Error::Usage(usage));
        }
        Ok(Self { values })
    }

    /// Arguments of `method`, checked against its signature.
    pub(crate) fn of<M: MethodSet>(method: M, values: &'a [Value]) -> Result<Self> {
        let (usage, arity) = method.signature();
        Self::new(values, arity, usage)
    }

    pub(crate) fn value(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    /// Host strings; scalars are rendered the way a scripting runtime would.
    pub(crate) fn string(&self, index: usize, name: &str) -> Result<String> {
        self.optional_string(index, name)?
            .ok_or_else(|| Error::invalid(format!("{name} is required")))
    }

    pub(crate) fn optional_string(&self, index: usize, name: &str) -> Result<Option<String>> {
        self.value(index).map(|value| scalar_text(value, name)).transpose()
    }

    pub(crate) fn int(&self, index: usize, name: &str) -> Result<i32> {
        self.optional_int(index, name)?
            .ok_or_else(|| Error::invalid(format!("{name} must be an integer")))
    }

    pub(crate) fn optional_int(&self, index: usize, name: &str) -> Result<Option<i32>> {
        self.value(index).map(|value| integer(value, name)).transpose()
    }

    pub(crate) fn optional_bool(&self, index: usize, name: &str) -> Result<Option<bool>> {
        self.value(index).map(|value| boolean(value, name)).transpose()
    }

    pub(crate) fn bytes(&self, index: usize, name: &str) -> Result<Vec<u8>> {
        let text = self.string(index, name)?;
        decode_base64(&text, name)
    }

    pub(crate) fn list(&self, index: usize, name: &str) -> Result<&'a [Value]> {
        match self.value(index) {
            Some(Value::Array(values)) => Ok(values),
            _ => Err(Error::invalid(format!("{name} must be a list"))),
        }
    }

    pub(crate) fn string_list(&self, index: usize, name: &str) -> Result<Vec<String>> {
        self.list(index, name)?
            .iter()
            .map(|value| scalar_text(value, name))
            .collect()
    }

    pub(crate) fn dict(&self, index: usize, name: &str) -> Result<&'a serde_json::Map<String, Value>> {
        match self.value(index) {
            Some(Value::Object(map)) => Ok(map),
            _ => Err(Error::invalid(format!("error reading {name}"))),
        }
    }
}

pub(crate) fn scalar_text(value: &Value, name: &str) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        _ => Err(Error::invalid(format!("{name} must be a scalar"))),
    }
}

pub(crate) fn integer(value: &Value, name: &str) -> Result<i32> {
    let parsed = match value {
        Value::Number(number) => number.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| Error::invalid(format!("{name} must be an integer")))
}

pub(crate) fn boolean(value: &Value, name: &str) -> Result<bool> {
    let parsed = match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_i64().map(|n| n != 0),
        Value::String(text) => match text.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| Error::invalid(format!("{name} must be a boolean")))
}

pub(crate) fn decode_base64(text: &str, name: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|err| Error::invalid(format!("{name} must be base64: {err}")))
}

pub(crate) fn encode_base64(bytes: impl AsRef<[u8]>) -> Value {
    Value::String(STANDARD.encode(bytes))
}
