use crate::common::{
    args,
    error::{Error, Result},
};

use aws_sdk_dynamodb::{primitives::Blob, types};
use serde::de;
use serde_json::{Map, Number, Value, json};
use std::{collections, fmt, str::FromStr};

/// Item as exchanged with DynamoDB.
pub type Item = collections::HashMap<String, types::AttributeValue>;

/// Type tag of a host-side attribute value.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Tag {
    /// String.
    S,
    /// Number, kept as decimal text.
    N,
    /// Binary, base64 on the host side.
    B,
    /// Boolean.
    Bool,
    /// Null marker.
    Null,
    /// Map of named attribute values.
    M,
    /// Ordered list of attribute values.
    L,
    /// String set.
    Ss,
    /// Number set.
    Ns,
    /// Binary set.
    Bs,
}

impl Tag {
    /// The tag as written by the host.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::N => "N",
            Self::B => "B",
            Self::Bool => "BOOL",
            Self::Null => "NULL",
            Self::M => "M",
            Self::L => "L",
            Self::Ss => "SS",
            Self::Ns => "NS",
            Self::Bs => "BS",
        }
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "S" => Ok(Self::S),
            "N" => Ok(Self::N),
            "B" => Ok(Self::B),
            "BOOL" => Ok(Self::Bool),
            "NULL" => Ok(Self::Null),
            "M" => Ok(Self::M),
            "L" => Ok(Self::L),
            "SS" => Ok(Self::Ss),
            "NS" => Ok(Self::Ns),
            "BS" => Ok(Self::Bs),
            _ => Err(Error::invalid(format!("unknown attribute type \"{tag}\""))),
        }
    }
}

/// Encode a host `[tag, payload]` pair.
///
/// ```rust
/// use aws_sdk_bindings::dynamodb::attribute_value;
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use serde_json::json;
///
/// let value = attribute_value::encode(&json!(["N", "30"])).unwrap();
/// assert_eq!(value, AttributeValue::N("30".to_string()));
/// ```
pub fn encode(value: &Value) -> Result<types::AttributeValue> {
    let (tag, payload) = match value {
        Value::Array(pair) if pair.len() == 2 => (&pair[0], &pair[1]),
        _ => {
            return Err(Error::invalid(format!(
                "attribute value must be a [type value] pair, got {value}"
            )));
        }
    };
    let tag: Tag = args::scalar_text(tag, "attribute type")?.parse()?;
    let attribute = match tag {
        Tag::S => types::AttributeValue::S(args::scalar_text(payload, "S")?),
        Tag::N => types::AttributeValue::N(args::scalar_text(payload, "N")?),
        Tag::B => types::AttributeValue::B(blob(payload, "B")?),
        Tag::Bool => types::AttributeValue::Bool(args::boolean(payload, "BOOL")?),
        Tag::Null => types::AttributeValue::Null(true),
        Tag::M => types::AttributeValue::M(encode_map(payload)?),
        Tag::L => types::AttributeValue::L(
            elements(payload, "L")?
                .iter()
                .map(encode)
                .collect::<Result<_>>()?,
        ),
        Tag::Ss => types::AttributeValue::Ss(texts(payload, "SS")?),
        Tag::Ns => types::AttributeValue::Ns(texts(payload, "NS")?),
        Tag::Bs => types::AttributeValue::Bs(
            elements(payload, "BS")?
                .iter()
                .map(|value| blob(value, "BS"))
                .collect::<Result<_>>()?,
        ),
    };
    Ok(attribute)
}

/// Encode a map payload: a flat `[key, value, ...]` list or a dict.
///
/// A repeated key keeps its last value.
pub fn encode_map(payload: &Value) -> Result<Item> {
    let mut item = Item::new();
    let mut insert = |key: String, value: &Value| -> Result<()> {
        let value = encode(value)?;
        if item.insert(key, value).is_some() {
            #[cfg(feature = "tracing")]
            tracing::debug!("duplicate key in map, keeping the last value");
        }
        Ok(())
    };
    match payload {
        Value::Object(map) => {
            for (key, value) in map {
                insert(key.clone(), value)?;
            }
        }
        Value::Array(flat) if flat.len() % 2 == 0 => {
            for pair in flat.chunks_exact(2) {
                insert(args::scalar_text(&pair[0], "map key")?, &pair[1])?;
            }
        }
        Value::Array(_) => {
            return Err(Error::invalid(
                "map payload must alternate keys and values",
            ));
        }
        _ => return Err(Error::invalid("map payload must be a list or a dict")),
    }
    Ok(item)
}

/// Decode to the type-preserving `[tag, payload]` form.
pub fn decode(attribute: &types::AttributeValue) -> Result<Value> {
    let (tag, payload) = match attribute {
        types::AttributeValue::S(text) => (Tag::S, json!(text)),
        types::AttributeValue::N(number) => (Tag::N, json!(number)),
        types::AttributeValue::B(bytes) => (Tag::B, args::encode_base64(bytes)),
        types::AttributeValue::Bool(flag) => (Tag::Bool, json!(flag)),
        types::AttributeValue::Null(_) => (Tag::Null, json!(true)),
        types::AttributeValue::M(map) => (Tag::M, Value::Array(decode_map(map)?)),
        types::AttributeValue::L(list) => (
            Tag::L,
            Value::Array(list.iter().map(decode).collect::<Result<_>>()?),
        ),
        types::AttributeValue::Ss(texts) => (Tag::Ss, json!(texts)),
        types::AttributeValue::Ns(numbers) => (Tag::Ns, json!(numbers)),
        types::AttributeValue::Bs(blobs) => (
            Tag::Bs,
            Value::Array(blobs.iter().map(args::encode_base64).collect()),
        ),
        _ => return Err(Error::invalid("unsupported attribute value")),
    };
    Ok(json!([tag.as_str(), payload]))
}

/// Decode a map to a flat `[key, value, ...]` list, keys sorted.
fn decode_map(map: &Item) -> Result<Vec<Value>> {
    let sorted: collections::BTreeMap<_, _> = map.iter().collect();
    let mut flat = Vec::with_capacity(map.len() * 2);
    for (key, value) in sorted {
        flat.push(Value::String(key.clone()));
        flat.push(decode(value)?);
    }
    Ok(flat)
}

/// Encode an item dict of `attribute -> [tag, payload]`.
pub fn encode_item(value: &Value) -> Result<Item> {
    encode_map(value)
}

/// Decode an item to a dict of `attribute -> [tag, payload]`, keys sorted.
pub fn decode_item(item: &Item) -> Result<Value> {
    let sorted: collections::BTreeMap<_, _> = item.iter().collect();
    let mut map = Map::new();
    for (key, value) in sorted {
        map.insert(key.clone(), decode(value)?);
    }
    Ok(Value::Object(map))
}

/// Plain host value: numbers as JSON numbers, binary as byte lists, NULL as null.
///
/// Integers that fit 64 bits stay integers and other finite numbers become `f64`.
/// Integers wider than 64 bits are returned as their decimal text so no digit is lost.
/// A number with no finite `f64` value (`NaN`, `1e400`) is an argument error.
pub fn simplify(item: Item) -> Result<Value> {
    let simple: Simple = serde_dynamo::from_item(exact_item(item)?)?;
    Ok(simple.0)
}

fn exact_item(item: Item) -> Result<Item> {
    item.into_iter()
        .map(|(name, value)| -> Result<_> { Ok((name, exact(value)?)) })
        .collect()
}

/// Rewrite numbers `f64` cannot hold before they reach the deserializer.
fn exact(value: types::AttributeValue) -> Result<types::AttributeValue> {
    let value = match value {
        types::AttributeValue::N(text) => exact_number(text)?,
        // a number set holding wide integers simplifies to a mixed list
        types::AttributeValue::Ns(numbers) => types::AttributeValue::L(
            numbers.into_iter().map(exact_number).collect::<Result<_>>()?,
        ),
        types::AttributeValue::L(values) => {
            types::AttributeValue::L(values.into_iter().map(exact).collect::<Result<_>>()?)
        }
        types::AttributeValue::M(map) => types::AttributeValue::M(exact_item(map)?),
        other => other,
    };
    Ok(value)
}

fn exact_number(text: String) -> Result<types::AttributeValue> {
    if text.parse::<i64>().is_ok() || text.parse::<u64>().is_ok() {
        return Ok(types::AttributeValue::N(text));
    }
    match text.parse::<f64>() {
        Ok(number) if !number.is_finite() => Err(Error::invalid(format!(
            "number \"{text}\" has no finite value"
        ))),
        Ok(_) if is_integer_literal(&text) => Ok(types::AttributeValue::S(text)),
        Ok(_) => Ok(types::AttributeValue::N(text)),
        Err(_) => Err(Error::invalid(format!("\"{text}\" is not a number"))),
    }
}

fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

fn elements<'a>(payload: &'a Value, tag: &str) -> Result<&'a [Value]> {
    match payload {
        Value::Array(values) => Ok(values),
        _ => Err(Error::invalid(format!("{tag} payload must be a list"))),
    }
}

fn texts(payload: &Value, tag: &str) -> Result<Vec<String>> {
    elements(payload, tag)?
        .iter()
        .map(|value| args::scalar_text(value, tag))
        .collect()
}

fn blob(payload: &Value, tag: &str) -> Result<Blob> {
    let text = args::scalar_text(payload, tag)?;
    Ok(Blob::new(args::decode_base64(&text, tag)?))
}

/// Host value deserialized from an item, accepting raw bytes.
struct Simple(Value);

impl<'de> de::Deserialize<'de> for Simple {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(SimpleVisitor).map(Simple)
    }
}

struct SimpleVisitor;

impl<'de> de::Visitor<'de> for SimpleVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a DynamoDB attribute value")
    }

    fn visit_bool<E>(self, value: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(value))
    }

    fn visit_i64<E>(self, value: i64) -> std::result::Result<Value, E> {
        Ok(Value::Number(value.into()))
    }

    fn visit_u64<E>(self, value: u64) -> std::result::Result<Value, E> {
        Ok(Value::Number(value.into()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Value, E> {
        Number::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| E::custom(format!("number {value} has no finite value")))
    }

    fn visit_str<E>(self, value: &str) -> std::result::Result<Value, E> {
        Ok(Value::String(value.to_string()))
    }

    fn visit_string<E>(self, value: String) -> std::result::Result<Value, E> {
        Ok(Value::String(value))
    }

    fn visit_bytes<E>(self, value: &[u8]) -> std::result::Result<Value, E> {
        Ok(json!(value))
    }

    fn visit_byte_buf<E>(self, value: Vec<u8>) -> std::result::Result<Value, E> {
        Ok(json!(value))
    }

    fn visit_unit<E>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: de::Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Value, D::Error> {
        de::Deserialize::deserialize(deserializer).map(|Simple(value)| value)
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Value, A::Error> {
        let mut values = Vec::with_capacity(seq.size_hint().unwrap_or_default());
        while let Some(Simple(value)) = seq.next_element()? {
            values.push(value);
        }
        Ok(Value::Array(values))
    }

    fn visit_map<A: de::MapAccess<'de>>(self, mut access: A) -> std::result::Result<Value, A::Error> {
        let mut sorted = collections::BTreeMap::new();
        while let Some((key, Simple(value))) = access.next_entry::<String, Simple>()? {
            sorted.insert(key, value);
        }
        Ok(Value::Object(sorted.into_iter().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::string(json!(["S", "Alice"]), types::AttributeValue::S("Alice".to_string()))]
    #[case::number_text(json!(["N", "30"]), types::AttributeValue::N("30".to_string()))]
    #[case::number_value(json!(["N", 1.5]), types::AttributeValue::N("1.5".to_string()))]
    #[case::number_unchecked(json!(["N", "abc"]), types::AttributeValue::N("abc".to_string()))]
    #[case::bool(json!(["BOOL", true]), types::AttributeValue::Bool(true))]
    #[case::bool_word(json!(["BOOL", "false"]), types::AttributeValue::Bool(false))]
    #[case::null(json!(["NULL", 1]), types::AttributeValue::Null(true))]
    #[case::binary(json!(["B", "aGVsbG8="]), types::AttributeValue::B(Blob::new("hello")))]
    #[case::string_set(
        json!(["SS", ["a", "b"]]),
        types::AttributeValue::Ss(vec!["a".to_string(), "b".to_string()])
    )]
    #[case::number_set(
        json!(["NS", [1, "2"]]),
        types::AttributeValue::Ns(vec!["1".to_string(), "2".to_string()])
    )]
    #[case::binary_set(
        json!(["BS", ["AQI="]]),
        types::AttributeValue::Bs(vec![Blob::new(vec![1, 2])])
    )]
    #[case::list(
        json!(["L", [["S", "a"], ["N", "1"], ["BOOL", true]]]),
        types::AttributeValue::L(
            vec![
                types::AttributeValue::S(
                    "a".to_string()
                ),
                types::AttributeValue::N(
                    "1".to_string()
                ),
                types::AttributeValue::Bool(true),
            ]
        )
    )]
    #[case::flat_map(
        json!(["M", ["name", ["S", "Alice"], "age", ["N", "30"]]]),
        types::AttributeValue::M(
            collections::HashMap::from(
                [
                    (
                        "name".to_string(),
                        types::AttributeValue::S(
                            "Alice".to_string()
                        )
                    ),
                    (
                        "age".to_string(),
                        types::AttributeValue::N(
                            "30".to_string()
                        )
                    ),
                ]
            )
        )
    )]
    #[case::dict_map(
        json!(["M", {"tags": ["L", []]}]),
        types::AttributeValue::M(
            collections::HashMap::from(
                [(
                    "tags".to_string(),
                    types::AttributeValue::L(vec![])
                )]
            )
        )
    )]
    fn test_encode(#[case] value: Value, #[case] expected: types::AttributeValue) {
        let actual = encode(&value).unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::not_a_pair(json!(["S"]))]
    #[case::three_elements(json!(["S", "a", "b"]))]
    #[case::scalar(json!("S"))]
    #[case::unknown_tag(json!(["X", "a"]))]
    #[case::odd_map(json!(["M", ["a", ["S", "b"], "c"]]))]
    #[case::list_not_a_list(json!(["L", "a"]))]
    #[case::bad_base64(json!(["B", "not base64!"]))]
    #[case::bad_bool(json!(["BOOL", "maybe"]))]
    #[case::nested_error(json!(["L", [["S", "a"], ["Q", "b"]]]))]
    fn test_encode_rejects(#[case] value: Value) {
        assert!(matches!(encode(&value), Err(Error::InvalidArgument(_))));
    }

    #[rstest]
    #[case::string(json!(["S", "a"]))]
    #[case::number(json!(["N", "-12.5"]))]
    #[case::bool(json!(["BOOL", false]))]
    #[case::null(json!(["NULL", true]))]
    #[case::binary(json!(["B", "AAEC"]))]
    #[case::sets(json!(["L", [["SS", ["x"]], ["NS", ["1", "2"]], ["BS", ["AA=="]]]]))]
    #[case::list(json!(["L", [["S", "a"], ["N", "1"], ["BOOL", true]]]))]
    #[case::map(json!(["M", ["age", ["N", "30"], "name", ["S", "Alice"]]]))]
    #[case::nested(
        json!(["M", ["a", ["L", [["M", ["b", ["L", [["NULL", true]]]]]]], "c", ["M", []]]])
    )]
    fn test_decode_reverses_encode(#[case] value: Value) {
        let actual = decode(&encode(&value).unwrap()).unwrap();
        assert_eq!(actual, value);
    }

    #[test]
    fn test_decode_map_sorts_keys() {
        let value = json!(["M", ["name", ["S", "Alice"], "age", ["N", "30"]]]);
        let actual = decode(&encode(&value).unwrap()).unwrap();
        assert_eq!(
            actual,
            json!(["M", ["age", ["N", "30"], "name", ["S", "Alice"]]])
        );
    }

    #[rstest]
    #[case::flat(json!(["M", ["a", ["S", "first"], "a", ["S", "last"]]]))]
    #[case::nested(json!(["M", ["a", ["N", "1"], "b", ["BOOL", true], "a", ["S", "last"]]]))]
    fn test_duplicate_map_key_keeps_last(#[case] value: Value) {
        let types::AttributeValue::M(map) = encode(&value).unwrap() else {
            panic!("expected a map");
        };
        assert_eq!(map.get("a"), Some(&types::AttributeValue::S("last".to_string())));
    }

    #[test]
    fn test_item_round_trip() {
        let value = json!({
            "id": ["S", "1"],
            "scores": ["L", [["N", "1"], ["N", "2"]]],
        });
        let item = encode_item(&value).unwrap();
        assert_eq!(item.len(), 2);
        assert_eq!(decode_item(&item).unwrap(), value);
    }

    #[rstest]
    #[case::scalars(
        json!({"name": ["S", "Alice"], "active": ["BOOL", true], "gone": ["NULL", true]}),
        json!({"active": true, "gone": null, "name": "Alice"})
    )]
    #[case::numbers(
        json!({"int": ["N", "30"], "neg": ["N", "-7"], "big": ["N", "18446744073709551615"], "frac": ["N", "2.5"]}),
        json!({"big": 18446744073709551615u64, "frac": 2.5, "int": 30, "neg": -7})
    )]
    #[case::binary(json!({"data": ["B", "AQI="]}), json!({"data": [1, 2]}))]
    #[case::nested(
        json!({"profile": ["M", ["tags", ["SS", ["a"]], "scores", ["L", [["N", "1"]]]]]}),
        json!({"profile": {"scores": [1], "tags": ["a"]}})
    )]
    fn test_simplify(#[case] typed: Value, #[case] expected: Value) {
        let actual = simplify(encode_item(&typed).unwrap()).unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::wide_integer(
        json!({"wide": ["N", "123456789012345678901234567890"]}),
        json!({"wide": "123456789012345678901234567890"})
    )]
    #[case::wide_negative(
        json!({"wide": ["N", "-98765432109876543210"]}),
        json!({"wide": "-98765432109876543210"})
    )]
    #[case::wide_in_list(
        json!({"ids": ["L", [["N", "1"], ["N", "340282366920938463463374607431768211456"]]]}),
        json!({"ids": [1, "340282366920938463463374607431768211456"]})
    )]
    #[case::wide_in_number_set(
        json!({"ids": ["NS", ["7", "18446744073709551616"]]}),
        json!({"ids": [7, "18446744073709551616"]})
    )]
    #[case::exponent_stays_float(json!({"big": ["N", "1e300"]}), json!({"big": 1e300}))]
    fn test_simplify_keeps_wide_integers_exact(#[case] typed: Value, #[case] expected: Value) {
        let actual = simplify(encode_item(&typed).unwrap()).unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::overflow(json!({"big": ["N", "1e400"]}))]
    #[case::nan(json!({"nan": ["N", "NaN"]}))]
    #[case::infinity(json!({"inf": ["N", "-inf"]}))]
    #[case::nested_nan(json!({"m": ["M", ["x", ["N", "NaN"]]]}))]
    #[case::not_a_number(json!({"n": ["N", "abc"]}))]
    fn test_simplify_rejects_numbers_without_finite_value(#[case] typed: Value) {
        let actual = simplify(encode_item(&typed).unwrap());
        assert!(matches!(actual, Err(Error::InvalidArgument(_))));
    }
}
