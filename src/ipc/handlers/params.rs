use crate::catalog::{REGULATION_YEARS, SEMESTERS};
use crate::ipc::error::err;
use crate::ipc::types::Request;
use serde_json::json;
use std::ops::RangeInclusive;

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_int_in<T>(req: &Request, key: &str, range: RangeInclusive<T>) -> Result<T, serde_json::Value>
where
    T: TryFrom<i64> + PartialOrd + std::fmt::Display + Copy,
{
    let raw = req.params.get(key).and_then(|v| {
        v.as_i64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
    });
    let Some(n) = raw else {
        return Err(err(&req.id, "bad_params", format!("missing {}", key), None));
    };
    match T::try_from(n) {
        Ok(v) if range.contains(&v) => Ok(v),
        _ => Err(err(
            &req.id,
            "bad_params",
            format!("{} must be between {} and {}", key, range.start(), range.end()),
            Some(json!({ key: n })),
        )),
    }
}

pub fn regulation(req: &Request) -> Result<u16, serde_json::Value> {
    required_int_in(req, "regulation", REGULATION_YEARS)
}

pub fn semester(req: &Request) -> Result<u8, serde_json::Value> {
    required_int_in(req, "semester", SEMESTERS)
}
