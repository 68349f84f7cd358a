use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Requested side of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionSide {
    #[default]
    Call,
    Put,
}

impl OptionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionSide::Call => "call",
            OptionSide::Put => "put",
        }
    }
}

impl FromStr for OptionSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(OptionSide::Call),
            "put" | "p" => Ok(OptionSide::Put),
            other => Err(format!("option_side must be 'call' or 'put', got '{}'", other)),
        }
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

impl RiskProfile {
    /// Unknown profile names fall back to balanced
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "conservative" => RiskProfile::Conservative,
            "aggressive" => RiskProfile::Aggressive,
            _ => RiskProfile::Balanced,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskProfile::Conservative => "conservative",
            RiskProfile::Balanced => "balanced",
            RiskProfile::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Option type as resolved from a snapshot row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionType {
    Call,
    Put,
    /// A type was present but is neither call nor put
    Other(String),
    Unknown,
}

impl OptionType {
    fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" => OptionType::Unknown,
            "call" | "c" => OptionType::Call,
            "put" | "p" => OptionType::Put,
            other => OptionType::Other(other.to_string()),
        }
    }

    /// `true` when the type is known and differs from the requested side
    pub fn excludes(&self, side: OptionSide) -> bool {
        match (self, side) {
            (OptionType::Unknown, _) => false,
            (OptionType::Call, OptionSide::Call) | (OptionType::Put, OptionSide::Put) => false,
            _ => true,
        }
    }
}

/// How records are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// Side filter plus profile-weighted score
    Profile { side: OptionSide, profile: RiskProfile },
    /// No filtering: `volume*fmv + oi*10 + iv`
    Legacy,
}

impl Default for ScoringMode {
    fn default() -> Self {
        ScoringMode::Profile {
            side: OptionSide::Call,
            profile: RiskProfile::Balanced,
        }
    }
}

/// One option-contract snapshot row, kept verbatim so it serializes back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionRecord(Map<String, Value>);

impl OptionRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn nested(&self, section: &str, key: &str) -> Option<&Value> {
        self.0.get(section).and_then(|s| s.get(key))
    }

    pub fn details(&self, key: &str) -> Option<&Value> {
        self.nested("details", key)
    }

    pub fn day(&self, key: &str) -> Option<&Value> {
        self.nested("day", key)
    }

    pub fn greeks(&self, key: &str) -> Option<&Value> {
        self.nested("greeks", key)
    }

    pub fn option_type(&self) -> OptionType {
        let raw = first_truthy([
            self.get("option_type"),
            self.details("option_type"),
            self.details("contract_type"),
            self.get("type"),
        ]);

        match raw {
            Some(Value::String(s)) => OptionType::from_raw(s),
            Some(other) => OptionType::from_raw(&other.to_string()),
            None => OptionType::Unknown,
        }
    }

    pub fn volume(&self) -> f64 {
        as_float(self.day("volume"))
    }

    pub fn implied_volatility(&self) -> f64 {
        as_float(self.get("implied_volatility"))
    }

    pub fn fair_market_value(&self) -> f64 {
        as_float(self.get("fmv"))
    }

    pub fn open_interest(&self) -> f64 {
        as_float(self.get("open_interest"))
    }

    pub fn bid(&self) -> f64 {
        as_float(first_truthy([self.get("bid"), self.details("bid")]))
    }

    pub fn ask(&self) -> f64 {
        as_float(first_truthy([self.get("ask"), self.details("ask")]))
    }

    pub fn delta(&self) -> f64 {
        as_float(self.greeks("delta"))
    }

    pub fn gamma(&self) -> f64 {
        as_float(self.greeks("gamma"))
    }

    pub fn ticker(&self) -> Option<&Value> {
        first_truthy([self.details("ticker"), self.get("symbol"), self.get("ticker")])
    }

    pub fn expiration_date(&self) -> Option<&Value> {
        first_truthy([self.details("expiration_date"), self.get("expiration_date")])
    }

    pub fn strike_price(&self) -> Option<&Value> {
        first_truthy([self.details("strike_price"), self.get("strike_price")])
    }
}

/// First value that is present and not "empty" (null, false, 0, "", [], {}).
pub fn first_truthy<'a, const N: usize>(candidates: [Option<&'a Value>; N]) -> Option<&'a Value> {
    candidates.into_iter().flatten().find(|v| is_truthy(v))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Coerce any JSON value to a finite float; anything unusable becomes 0.0.
pub fn as_float(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        Some(Value::Bool(true)) => 1.0,
        _ => 0.0,
    };

    if parsed.is_finite() { parsed } else { 0.0 }
}

/// Snapshot payload, decoded once at the normalization boundary
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `{"results": [...]}`
    Results(Vec<Value>),
    /// A bare top-level array
    Array(Vec<Value>),
    Other,
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut obj) => match obj.remove("results") {
                Some(Value::Array(rows)) => Payload::Results(rows),
                _ => Payload::Other,
            },
            Value::Array(rows) => Payload::Array(rows),
            _ => Payload::Other,
        }
    }
}

impl Payload {
    pub fn rows(&self) -> &[Value] {
        match self {
            Payload::Results(rows) | Payload::Array(rows) => rows,
            Payload::Other => &[],
        }
    }

    /// Row count before non-record entries are dropped
    pub fn raw_count(&self) -> usize {
        self.rows().len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub score: f64,
    pub record: OptionRecord,
}

/// Parameters for one screener query, already normalized
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParameters {
    pub symbol: String,
    pub option_side: OptionSide,
    pub risk_profile: RiskProfile,
    pub max_signals: i64,
}

impl RequestParameters {
    pub fn scoring_mode(&self) -> ScoringMode {
        ScoringMode::Profile {
            side: self.option_side,
            profile: self.risk_profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> OptionRecord {
        match value {
            Value::Object(map) => OptionRecord::new(map),
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn test_as_float_tolerates_bad_input() {
        assert_eq!(as_float(None), 0.0);
        assert_eq!(as_float(Some(&Value::Null)), 0.0);
        assert_eq!(as_float(Some(&json!("abc"))), 0.0);
        assert_eq!(as_float(Some(&json!(" 1.5 "))), 1.5);
        assert_eq!(as_float(Some(&json!(3))), 3.0);
        assert_eq!(as_float(Some(&json!("NaN"))), 0.0);
        assert_eq!(as_float(Some(&json!({"a": 1}))), 0.0);
    }

    #[test]
    fn test_option_type_priority() {
        let r = record(json!({
            "option_type": "PUT",
            "details": {"option_type": "call", "contract_type": "call"},
            "type": "call"
        }));
        assert_eq!(r.option_type(), OptionType::Put);

        let r = record(json!({"details": {"contract_type": "c"}, "type": "put"}));
        assert_eq!(r.option_type(), OptionType::Call);

        let r = record(json!({"option_type": "", "type": "P"}));
        assert_eq!(r.option_type(), OptionType::Put);

        let r = record(json!({"type": "straddle"}));
        assert_eq!(r.option_type(), OptionType::Other("straddle".to_string()));

        let r = record(json!({"ticker": "X"}));
        assert_eq!(r.option_type(), OptionType::Unknown);
    }

    #[test]
    fn test_option_type_excludes() {
        assert!(!OptionType::Unknown.excludes(OptionSide::Put));
        assert!(!OptionType::Call.excludes(OptionSide::Call));
        assert!(OptionType::Call.excludes(OptionSide::Put));
        assert!(OptionType::Other("x".into()).excludes(OptionSide::Call));
    }

    #[test]
    fn test_bid_falls_back_to_details() {
        let r = record(json!({"bid": 0, "details": {"bid": 1.2, "ask": "1.4"}}));
        assert_eq!(r.bid(), 1.2);
        assert_eq!(r.ask(), 1.4);
    }

    #[test]
    fn test_payload_shapes() {
        let p = Payload::from(json!({"results": [{"a": 1}, 2], "status": "OK"}));
        assert_eq!(p.raw_count(), 2);

        let p = Payload::from(json!([{"a": 1}]));
        assert_eq!(p, Payload::Array(vec![json!({"a": 1})]));

        assert_eq!(Payload::from(json!({"status": "OK"})), Payload::Other);
        assert_eq!(Payload::from(json!({"results": "nope"})).raw_count(), 0);
        assert_eq!(Payload::from(json!(42)), Payload::Other);
    }

    #[test]
    fn test_side_and_profile_parsing() {
        assert_eq!("PUT".parse::<OptionSide>(), Ok(OptionSide::Put));
        assert!("both".parse::<OptionSide>().is_err());
        assert_eq!(RiskProfile::parse("Aggressive"), RiskProfile::Aggressive);
        assert_eq!(RiskProfile::parse("yolo"), RiskProfile::Balanced);
    }
}
