use super::Memory;
use crate::error::AgentError;

pub async fn read_memory() -> Result<Memory, AgentError> {
    let raw = tokio::fs::read_to_string("/proc/meminfo").await?;
    let total_bytes = parse_meminfo(&raw).ok_or_else(|| {
        AgentError::InvalidCommandParams("/proc/meminfo missing MemTotal".into())
    })?;
    Ok(Memory { total_bytes })
}

/// `MemTotal:       32859140 kB` → bytes.
fn parse_meminfo(raw: &str) -> Option<u64> {
    for line in raw.lines() {
        let Some(rest) = line.strip_prefix("MemTotal:") else {
            continue;
        };
        let kb: u64 = rest.trim().trim_end_matches("kB").trim().parse().ok()?;
        return Some(kb * 1024);
    }
    None
}
