use super::CpuInfo;
use crate::error::AgentError;

pub async fn read_cpu_info() -> Result<CpuInfo, AgentError> {
    let raw = tokio::fs::read_to_string("/proc/cpuinfo").await?;
    let (model_name, frequency_mhz) = parse_cpuinfo(&raw);
    Ok(CpuInfo {
        model_name,
        frequency_mhz,
        count: num_cpus::get() as u32,
    })
}

/// Scans for the first `model name` and `cpu MHz` rows (first match
/// only — every logical core repeats the same fields).
fn parse_cpuinfo(raw: &str) -> (String, String) {
    let mut model_name = String::new();
    let mut frequency_mhz = String::new();

    for line in raw.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().to_string();

        if key == "model name" && model_name.is_empty() {
            model_name = value;
        } else if key == "cpu MHz" && frequency_mhz.is_empty() {
            frequency_mhz = value;
        }

        if !model_name.is_empty() && !frequency_mhz.is_empty() {
            break;
        }
    }

    (model_name, frequency_mhz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_model_name_and_frequency() {
        let raw = concat!(
            "processor\t: 0\n",
            "model name\t: Intel(R) Xeon(R) Gold 6248R\n",
            "cpu MHz\t\t: 3000.123\n",
            "\n",
            "processor\t: 1\n",
            "model name\t: Intel(R) Xeon(R) Gold 6248R\n",
            "cpu MHz\t\t: 2999.001\n",
        );
        let (model, mhz) = parse_cpuinfo(raw);
        assert_eq!(model, "Intel(R) Xeon(R) Gold 6248R");
        assert_eq!(mhz, "3000.123");
    }

    #[test]
    fn missing_fields_yield_empty_strings() {
        let (model, mhz) = parse_cpuinfo("processor\t: 0\n");
        assert!(model.is_empty());
        assert!(mhz.is_empty());
    }
}
