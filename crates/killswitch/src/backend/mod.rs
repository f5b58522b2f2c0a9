//! Wire-level plumbing for the two backend services: addressing constants,
//! thin typed call helpers, and strict reply decoding.

pub(crate) mod hal;
pub(crate) mod rfkill;

use serde_json::Value;

use crate::error::{KillswitchError, SwitchResult};

fn arg<'a>(args: &'a [Value], index: usize, what: &str) -> SwitchResult<&'a Value> {
    args.get(index)
        .ok_or_else(|| KillswitchError::Remote(format!("missing {what} at position {index}")))
}

pub(crate) fn str_arg<'a>(args: &'a [Value], index: usize, what: &str) -> SwitchResult<&'a str> {
    arg(args, index, what)?
        .as_str()
        .ok_or_else(|| KillswitchError::Remote(format!("expected string for {what}")))
}

pub(crate) fn u64_arg(args: &[Value], index: usize, what: &str) -> SwitchResult<u64> {
    arg(args, index, what)?
        .as_u64()
        .ok_or_else(|| KillswitchError::Remote(format!("expected unsigned integer for {what}")))
}

pub(crate) fn i64_arg(args: &[Value], index: usize, what: &str) -> SwitchResult<i64> {
    arg(args, index, what)?
        .as_i64()
        .ok_or_else(|| KillswitchError::Remote(format!("expected integer for {what}")))
}

pub(crate) fn bool_arg(args: &[Value], index: usize, what: &str) -> SwitchResult<bool> {
    arg(args, index, what)?
        .as_bool()
        .ok_or_else(|| KillswitchError::Remote(format!("expected boolean for {what}")))
}

pub(crate) fn array_arg<'a>(
    args: &'a [Value],
    index: usize,
    what: &str,
) -> SwitchResult<&'a Vec<Value>> {
    arg(args, index, what)?
        .as_array()
        .ok_or_else(|| KillswitchError::Remote(format!("expected array for {what}")))
}
