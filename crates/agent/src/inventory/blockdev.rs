use crate::error::AgentError;
use crate::process;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    pub name: String,
    pub model: String,
    pub size: u64,
    pub rotational: bool,
}

pub async fn list_block_devices() -> Result<Vec<BlockDevice>, AgentError> {
    let output = process::run_ok(
        &["lsblk", "-PbdioKNAME,MODEL,SIZE,ROTA,TYPE"],
        false,
    )
    .await?;
    parse_lsblk(&output.stdout_string())
}

/// Parses `lsblk -P` output: one line per device, `KEY="value"` pairs
/// separated by whitespace, quoted the way a POSIX shell would quote a
/// word (so a value may itself contain spaces between the quotes).
fn parse_lsblk(output: &str) -> Result<Vec<BlockDevice>, AgentError> {
    let mut devices = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields = parse_key_value_line(line)?;

        if fields.get("TYPE").map(String::as_str) != Some("disk") {
            continue;
        }

        let kname = fields.get("KNAME").ok_or_else(|| {
            AgentError::InvalidCommandParams("lsblk output missing KNAME".into())
        })?;
        let model = fields.get("MODEL").ok_or_else(|| {
            AgentError::InvalidCommandParams("lsblk output missing MODEL".into())
        })?;
        let size_str = fields.get("SIZE").ok_or_else(|| {
            AgentError::InvalidCommandParams("lsblk output missing SIZE".into())
        })?;
        let rota_str = fields.get("ROTA").ok_or_else(|| {
            AgentError::InvalidCommandParams("lsblk output missing ROTA".into())
        })?;

        let size: u64 = size_str.parse().map_err(|_| {
            AgentError::InvalidCommandParams(format!("lsblk SIZE not a number: {size_str}"))
        })?;
        let rotational = rota_str == "1";

        devices.push(BlockDevice {
            name: format!("/dev/{kname}"),
            model: model.clone(),
            size,
            rotational,
        });
    }

    Ok(devices)
}

fn parse_key_value_line(line: &str) -> Result<HashMap<String, String>, AgentError> {
    let mut fields = HashMap::new();
    let mut chars = line.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        if ch.is_whitespace() {
            continue;
        }
        // KEY="value" — find '=' then the quoted value.
        let key_end = line[start..]
            .find('=')
            .map(|idx| start + idx)
            .ok_or_else(|| {
                AgentError::InvalidCommandParams(format!("malformed lsblk line: {line}"))
            })?;
        let key = line[start..key_end].to_string();

        let rest = &line[key_end + 1..];
        if !rest.starts_with('"') {
            return Err(AgentError::InvalidCommandParams(format!(
                "malformed lsblk line: {line}"
            )));
        }
        let value_start = key_end + 2;
        let closing = line[value_start..].find('"').ok_or_else(|| {
            AgentError::InvalidCommandParams(format!("unterminated quote in lsblk line: {line}"))
        })?;
        let value = line[value_start..value_start + closing].to_string();

        fields.insert(key, value);

        // Advance the outer char iterator past the consumed span.
        while let Some((idx, _)) = chars.peek() {
            if *idx < value_start + closing + 1 {
                chars.next();
            } else {
                break;
            }
        }
    }

    Ok(fields)
}
